//! Per-frame simulation tick
//!
//! Advances the session by one frame in a fixed order: speed, distance,
//! motion, camera, track upkeep, fading, then collision.

use serde::{Deserialize, Serialize};

use super::autopilot;
use super::collision::{CollisionHit, first_hit};
use super::state::{GameEvent, GamePhase, GameState, ObstacleId};

/// What happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TickOutcome {
    /// Tick completed; the frame should be rendered
    Continue,
    /// The player hit an obstacle this tick; the run is over
    GameOver { obstacle: ObstacleId },
    /// The session was already over or closed; nothing moved
    Halted,
}

/// Clamp a wall-clock frame time into a safe simulation step
pub fn clamp_dt(elapsed: f32, max_dt: f32) -> f32 {
    if elapsed.is_finite() {
        elapsed.clamp(0.0, max_dt)
    } else {
        0.0
    }
}

/// Advance the session by `elapsed` seconds of wall time
pub fn tick(state: &mut GameState, elapsed: f32) -> TickOutcome {
    // Events only live until the next tick
    state.clear_events();

    // Don't tick once the run is over or the session was torn down
    if state.phase != GamePhase::Running {
        return TickOutcome::Halted;
    }

    let dt = clamp_dt(elapsed, state.settings.max_dt);
    state.time_ticks += 1;

    if state.intent.autopilot {
        autopilot::steer(state);
    }

    // Progressive difficulty, then any explicit boost
    let settings = &state.settings;
    let boost = state.intent.take_speed_delta();
    state.speed = (state.speed + settings.speed_up_rate * dt * 1000.0 + boost)
        .clamp(settings.min_speed, settings.max_speed);

    let travel = state.speed * dt;
    state.distance += travel;
    state.player.pos.z += travel;

    let lateral_smoothing = settings.lateral_smoothing;
    let camera_smoothing = settings.camera_smoothing;
    state
        .player
        .steer_toward(state.intent.target_lane, lateral_smoothing);
    state.camera.follow(state.player.pos, camera_smoothing);

    let player_z = state.player.pos.z;
    let (track, rng, events) = state.track_parts();
    track.ensure_ahead(player_z, rng, events);
    track.tick_fade(dt, events);

    if let Some(CollisionHit { obstacle, section }) = first_hit(&state.player.aabb(), &state.track)
    {
        state.phase = GamePhase::GameOver;
        state.overlay_visible = true;
        let score = state.score();
        state.push_event(GameEvent::Collision { obstacle, section });
        state.push_event(GameEvent::GameOver { score });
        log::info!(
            "Game over: hit obstacle {} in section {} at distance {} (speed {:.1})",
            obstacle,
            section,
            score,
            state.speed
        );
        return TickOutcome::GameOver { obstacle };
    }

    TickOutcome::Continue
}
