//! Presentation collaborators
//!
//! The simulation never draws anything. A `Renderer` owns the visuals and
//! hands back opaque handles; a `Hud` receives the numbers shown to the
//! player. Both are driven by `crate::game::Game`.

pub mod headless;
pub mod recording;

pub use headless::{LogHud, NullRenderer};
pub use recording::{RecordingHud, RecordingRenderer};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::sim::GameState;

/// What a visual represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VisualKind {
    Player,
    Section,
    Obstacle,
}

/// Opaque reference to a visual owned by a renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VisualHandle(pub u64);

/// Everything needed to draw one frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub tick: u64,
    pub player: Vec3,
    pub camera: Vec3,
    pub look_at: Vec3,
    pub speed: f32,
    pub distance: f32,
}

impl Frame {
    pub fn capture(state: &GameState) -> Self {
        Self {
            tick: state.time_ticks,
            player: state.player.pos,
            camera: state.camera.pos,
            look_at: state.camera.look_at,
            speed: state.speed,
            distance: state.distance,
        }
    }
}

/// Owner of all visual resources
pub trait Renderer {
    /// Create a visual of `kind` centered at `pose` with extents `size`
    fn create_visual(&mut self, kind: VisualKind, pose: Vec3, size: Vec3) -> VisualHandle;

    fn update_visual_opacity(&mut self, handle: VisualHandle, opacity: f32);

    /// Release a visual. Unknown or already released handles must be ignored.
    fn dispose_visual(&mut self, handle: VisualHandle);

    fn render(&mut self, frame: &Frame);
}

/// Score/speed display
pub trait Hud {
    /// Called once per completed tick with rounded speed and floored distance
    fn report(&mut self, speed: u32, distance: u64);
}
