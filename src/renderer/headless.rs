//! Headless collaborators for native runs

use std::collections::HashSet;

use glam::Vec3;

use super::{Frame, Hud, Renderer, VisualHandle, VisualKind};

/// Renderer that draws nothing but still tracks handle lifetimes
#[derive(Debug, Default)]
pub struct NullRenderer {
    next_handle: u64,
    live: HashSet<VisualHandle>,
    frames: u64,
}

impl NullRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Visuals created and not yet disposed
    pub fn live_visuals(&self) -> usize {
        self.live.len()
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

impl Renderer for NullRenderer {
    fn create_visual(&mut self, _kind: VisualKind, _pose: Vec3, _size: Vec3) -> VisualHandle {
        self.next_handle += 1;
        let handle = VisualHandle(self.next_handle);
        self.live.insert(handle);
        handle
    }

    fn update_visual_opacity(&mut self, _handle: VisualHandle, _opacity: f32) {}

    fn dispose_visual(&mut self, handle: VisualHandle) {
        self.live.remove(&handle);
    }

    fn render(&mut self, _frame: &Frame) {
        self.frames += 1;
    }
}

/// HUD that logs score milestones
#[derive(Debug, Clone)]
pub struct LogHud {
    /// Log every time the distance crosses a multiple of this
    pub every: u64,
    last_bucket: u64,
}

impl LogHud {
    pub fn new(every: u64) -> Self {
        Self {
            every: every.max(1),
            last_bucket: 0,
        }
    }
}

impl Default for LogHud {
    fn default() -> Self {
        Self::new(100)
    }
}

impl Hud for LogHud {
    fn report(&mut self, speed: u32, distance: u64) {
        let bucket = distance / self.every;
        if bucket > self.last_bucket {
            self.last_bucket = bucket;
            log::info!("Distance {} (speed {})", distance, speed);
        }
    }
}
