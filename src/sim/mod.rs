//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable iteration order (insertion order of sections and obstacles)
//! - No rendering or platform dependencies; presentation learns about
//!   changes through `GameEvent`s

pub mod autopilot;
pub mod collision;
pub mod obstacles;
pub mod state;
pub mod tick;
pub mod track;

pub use collision::{Aabb, CollisionHit, first_hit};
pub use obstacles::{ObstacleGenerator, Placement};
pub use state::{
    Camera, GameEvent, GamePhase, GameState, Intent, Lane, Obstacle, ObstacleId, Player, Section,
    SectionId, SectionState,
};
pub use tick::{TickOutcome, clamp_dt, tick};
pub use track::SectionManager;
