//! Idle/demo mode: steer toward the lane with the most clear road ahead
//!
//! The autopilot only writes the intent, exactly like a player would.

use super::state::{GameState, Intent, Lane};
use super::track::SectionManager;

/// How far ahead (in seconds of travel) the autopilot looks
const HORIZON_SECS: f32 = 3.0;
/// Never look less than this far ahead
const MIN_HORIZON: f32 = 12.0;

/// Distance from `z` to the nearest obstacle ahead in `lane`, up to `horizon`
pub fn clearance(track: &SectionManager, lane: Lane, z: f32, horizon: f32) -> f32 {
    track
        .collidable_sections()
        .flat_map(|s| s.obstacles.iter())
        .filter(|o| o.lane == lane)
        // Obstacles still overlapping the player count as zero clearance
        .map(|o| o.pos.z + o.size / 2.0 - z)
        .filter(|d| *d >= 0.0)
        .fold(horizon, f32::min)
}

/// Lane the autopilot wants to be in
pub fn choose_lane(state: &GameState) -> Lane {
    let z = state.player.pos.z;
    let horizon = (state.speed * HORIZON_SECS).max(MIN_HORIZON);
    let current = state.intent.target_lane;

    let mut best = current;
    let mut best_clearance = clearance(&state.track, current, z, horizon);
    for lane in Lane::ALL {
        let c = clearance(&state.track, lane, z, horizon);
        // Prefer staying put, then the closer lane
        let closer = lane.index().abs_diff(current.index()) < best.index().abs_diff(current.index());
        if c > best_clearance || (c == best_clearance && closer) {
            best = lane;
            best_clearance = c;
        }
    }
    best
}

/// Move the intent one lane toward the autopilot's pick
pub fn steer(state: &mut GameState) {
    let wanted = choose_lane(state);
    let intent: &mut Intent = &mut state.intent;
    if wanted < intent.target_lane {
        intent.move_left();
    } else if wanted > intent.target_lane {
        intent.move_right();
    }
}
