//! Lane Runner - A three-lane endless runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (track generation, motion, collisions, session state)
//! - `renderer`: Collaborator interfaces for visuals and HUD, plus headless implementations
//! - `game`: Driver that owns a session and forwards simulation events to the collaborators
//! - `settings`: Data-driven game balance

pub mod game;
pub mod renderer;
pub mod settings;
pub mod sim;

pub use game::Game;
pub use settings::{Difficulty, Settings, SettingsError};

/// Game configuration constants
pub mod consts {
    use glam::Vec3;

    /// Number of lanes on the track
    pub const LANE_COUNT: usize = 3;
    /// World x coordinate of each lane, left to right
    pub const LANE_X: [f32; LANE_COUNT] = [-2.5, 0.0, 2.5];
    /// Lane the player starts in
    pub const CENTER_LANE: usize = 1;
    /// Total width of the track surface
    pub const TRACK_WIDTH: f32 = 7.5;

    /// Longitudinal length of one track section
    pub const SECTION_LENGTH: f32 = 40.0;
    /// Sections created at session start
    pub const VISIBLE_SECTIONS: usize = 4;
    /// Live sections allowed beyond the visible window before eviction
    pub const EXTRA_LIVE_SECTIONS: usize = 2;
    /// Spawn a new section when the track ends closer than this many section lengths
    pub const LOOKAHEAD_SECTIONS: f32 = 1.5;
    /// Opacity lost per second by a fading section
    pub const FADE_RATE: f32 = 0.8;

    /// Largest step a single frame may take (seconds)
    pub const MAX_FRAME_DT: f32 = 0.05;

    /// Player cube edge length
    pub const PLAYER_SIZE: f32 = 1.0;
    /// Player center height (resting on the track)
    pub const PLAYER_Y: f32 = PLAYER_SIZE / 2.0;

    /// Speed at session start (units/s)
    pub const BASE_SPEED: f32 = 8.0;
    /// Speed gained per millisecond of play
    pub const SPEED_UP_RATE: f32 = 0.0005;

    /// Fraction of the remaining lateral gap closed per tick
    pub const LATERAL_SMOOTHING: f32 = 0.2;
    /// Fraction of the remaining camera gap closed per tick
    pub const CAMERA_SMOOTHING: f32 = 0.1;
    /// Camera rest position relative to the player (above and behind)
    pub const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 4.0, -8.0);
    /// Point the camera looks at relative to the player (above and ahead)
    pub const CAMERA_LOOK_AHEAD: Vec3 = Vec3::new(0.0, 1.0, 6.0);

    /// Chance a slot spawns a clustered group instead of per-lane obstacles
    pub const GROUP_PROB: f64 = 0.3;
    /// Base chance an obstacle appears in a lane
    pub const OBSTACLE_PROB: f64 = 0.45;
    /// Chance a lane inside a cluster is considered at all
    pub const CLUSTER_INCLUSION_PROB: f64 = 0.85;
}

/// World x coordinate of a lane index (clamped into range)
#[inline]
pub fn lane_x(index: usize) -> f32 {
    consts::LANE_X[index.min(consts::LANE_COUNT - 1)]
}

/// Move `current` a fixed fraction of the way toward `target`
#[inline]
pub fn approach(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor
}
