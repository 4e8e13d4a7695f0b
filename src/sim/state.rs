//! Game state and core simulation types
//!
//! Everything a session needs to resume deterministically lives here,
//! including the RNG.

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Deserializer, Serialize};

use super::collision::Aabb;
use super::track::SectionManager;
use crate::consts::*;
use crate::settings::{Settings, SettingsError};
use crate::{approach, lane_x};

pub type SectionId = u32;
pub type ObstacleId = u32;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Simulation advancing every tick
    Running,
    /// Run ended by a collision; ticking is halted until restart
    GameOver,
    /// Session torn down; its track is gone and it never ticks again
    Closed,
}

/// One of the three lanes, always in range
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Lane(u8);

impl TryFrom<u8> for Lane {
    type Error = String;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Lane::new(index as usize)
            .ok_or_else(|| format!("lane {index} out of range 0..{LANE_COUNT}"))
    }
}

impl From<Lane> for u8 {
    fn from(lane: Lane) -> u8 {
        lane.0
    }
}

impl Lane {
    pub const LEFT: Lane = Lane(0);
    pub const CENTER: Lane = Lane(CENTER_LANE as u8);
    pub const RIGHT: Lane = Lane((LANE_COUNT - 1) as u8);
    pub const ALL: [Lane; LANE_COUNT] = [Lane::LEFT, Lane::CENTER, Lane::RIGHT];

    pub fn new(index: usize) -> Option<Self> {
        (index < LANE_COUNT).then_some(Lane(index as u8))
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// World x coordinate of this lane
    pub fn x(self) -> f32 {
        lane_x(self.index())
    }

    /// One lane to the left, staying put at the edge
    pub fn left(self) -> Self {
        Lane(self.0.saturating_sub(1))
    }

    /// One lane to the right, staying put at the edge
    pub fn right(self) -> Self {
        Lane((self.0 + 1).min(Lane::RIGHT.0))
    }
}

/// A static hazard owned by a section
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: ObstacleId,
    pub lane: Lane,
    /// Center of the cube
    pub pos: Vec3,
    /// Cube edge length
    pub size: f32,
    pub opacity: f32,
}

impl Obstacle {
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_size(self.pos, self.size)
    }
}

/// Lifecycle of a track section
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SectionState {
    /// Part of the contiguous track window
    Live,
    /// Evicted from the window; still collidable while it fades out
    Fading { level: f32 },
    /// Fully faded; visuals released, about to be dropped
    Disposed,
}

/// A fixed-length slice of track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: SectionId,
    pub start: f32,
    pub end: f32,
    pub state: SectionState,
    pub opacity: f32,
    /// Obstacles in insertion order
    pub obstacles: Vec<Obstacle>,
}

impl Section {
    pub fn is_live(&self) -> bool {
        self.state == SectionState::Live
    }

    pub fn is_fading(&self) -> bool {
        matches!(self.state, SectionState::Fading { .. })
    }

    pub fn length(&self) -> f32 {
        self.end - self.start
    }

    /// Center of the section's floor, used to place its visual
    pub fn center(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, (self.start + self.end) / 2.0)
    }

    pub fn obstacle_ids(&self) -> Vec<ObstacleId> {
        self.obstacles.iter().map(|o| o.id).collect()
    }
}

/// The player's runner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec3,
    pub size: f32,
}

impl Default for Player {
    fn default() -> Self {
        Self {
            pos: Vec3::new(Lane::CENTER.x(), PLAYER_Y, 0.0),
            size: PLAYER_SIZE,
        }
    }
}

impl Player {
    /// Bounding box at the current pose
    pub fn aabb(&self) -> Aabb {
        Aabb::from_center_size(self.pos, self.size)
    }

    /// Glide toward the target lane instead of snapping to it
    pub fn steer_toward(&mut self, lane: Lane, smoothing: f32) {
        self.pos.x = approach(self.pos.x, lane.x(), smoothing);
    }
}

/// Chase camera
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Camera {
    pub pos: Vec3,
    pub target: Vec3,
    pub look_at: Vec3,
}

impl Camera {
    /// Camera at rest behind the given player position
    pub fn behind(player_pos: Vec3) -> Self {
        Self {
            pos: player_pos + CAMERA_OFFSET,
            target: player_pos + CAMERA_OFFSET,
            look_at: player_pos + CAMERA_LOOK_AHEAD,
        }
    }

    pub fn follow(&mut self, player_pos: Vec3, smoothing: f32) {
        self.target = player_pos + CAMERA_OFFSET;
        self.pos = self.pos.lerp(self.target, smoothing);
        self.look_at = player_pos + CAMERA_LOOK_AHEAD;
    }
}

/// Pending player requests, consumed by the next tick
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Intent {
    pub target_lane: Lane,
    /// Accumulated boost, applied once and then cleared
    pub speed_delta: f32,
    /// Let the autopilot choose lanes
    pub autopilot: bool,
}

impl Default for Intent {
    fn default() -> Self {
        Self {
            target_lane: Lane::CENTER,
            speed_delta: 0.0,
            autopilot: false,
        }
    }
}

impl Intent {
    pub fn move_left(&mut self) {
        self.target_lane = self.target_lane.left();
    }

    pub fn move_right(&mut self) {
        self.target_lane = self.target_lane.right();
    }

    pub fn recenter(&mut self) {
        self.target_lane = Lane::CENTER;
    }

    pub fn boost(&mut self, delta: f32) {
        if delta.is_finite() {
            self.speed_delta += delta;
        }
    }

    pub fn take_speed_delta(&mut self) -> f32 {
        std::mem::take(&mut self.speed_delta)
    }
}

/// Something the presentation side needs to know about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    SectionSpawned {
        section: SectionId,
        center: Vec3,
        length: f32,
    },
    ObstacleSpawned {
        obstacle: ObstacleId,
        section: SectionId,
        pos: Vec3,
        size: f32,
    },
    SectionEvicted {
        section: SectionId,
    },
    /// New opacity for a fading section and all of its obstacles
    OpacityChanged {
        section: SectionId,
        obstacles: Vec<ObstacleId>,
        opacity: f32,
    },
    /// Visuals for the section and its obstacles must be released
    SectionDisposed {
        section: SectionId,
        obstacles: Vec<ObstacleId>,
    },
    Collision {
        obstacle: ObstacleId,
        section: SectionId,
    },
    GameOver {
        score: u64,
    },
}

/// Complete session state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Session seed for reproducibility
    pub seed: u64,
    #[serde(deserialize_with = "validated_settings")]
    pub settings: Settings,
    rng: Pcg32,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Whether the game-over overlay is shown (presentation only)
    pub overlay_visible: bool,
    pub speed: f32,
    /// Cumulative distance travelled; the score
    pub distance: f32,
    pub player: Player,
    pub camera: Camera,
    pub intent: Intent,
    pub track: SectionManager,
    /// Events recorded since the last tick began; the driver drains them
    /// after every tick, and the next tick discards whatever was left
    #[serde(skip)]
    events: Vec<GameEvent>,
}

/// Saved sessions go through the same checks as fresh settings
fn validated_settings<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Settings, D::Error> {
    let settings = Settings::deserialize(deserializer)?;
    settings.validate().map_err(serde::de::Error::custom)?;
    Ok(settings)
}

impl GameState {
    /// Create a new session. Invalid settings are a programming error.
    pub fn new(seed: u64, settings: Settings) -> Self {
        match Self::try_new(seed, settings) {
            Ok(state) => state,
            Err(e) => panic!("invalid game settings: {e}"),
        }
    }

    /// Create a new session, reporting invalid settings
    pub fn try_new(seed: u64, settings: Settings) -> Result<Self, SettingsError> {
        settings.validate()?;

        let player = Player::default();
        let camera = Camera::behind(player.pos);
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            phase: GamePhase::Running,
            overlay_visible: false,
            speed: settings.base_speed,
            distance: 0.0,
            player,
            camera,
            intent: Intent::default(),
            track: SectionManager::new(&settings),
            events: Vec::new(),
            settings,
        };

        state
            .track
            .reset(&mut state.rng, &mut state.events);

        log::info!(
            "Session started with seed {} ({} sections, {} obstacles)",
            seed,
            state.track.live_count(),
            state.track.obstacle_count()
        );
        Ok(state)
    }

    /// Score shown to the player
    pub fn score(&self) -> u64 {
        self.distance.max(0.0).floor() as u64
    }

    /// Speed shown to the player
    pub fn display_speed(&self) -> u32 {
        self.speed.max(0.0).round() as u32
    }

    pub fn is_running(&self) -> bool {
        self.phase == GamePhase::Running
    }

    pub fn request_lane_left(&mut self) {
        self.intent.move_left();
    }

    pub fn request_lane_right(&mut self) {
        self.intent.move_right();
    }

    pub fn request_recenter(&mut self) {
        self.intent.recenter();
    }

    pub fn request_boost(&mut self, delta: f32) {
        self.intent.boost(delta);
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        self.intent.autopilot = enabled;
    }

    /// Hide the game-over overlay; the session stays over
    pub fn dismiss_overlay(&mut self) {
        self.overlay_visible = false;
    }

    /// Draw the seed for the session that replaces this one
    pub fn next_session_seed(&mut self) -> u64 {
        self.rng.random()
    }

    /// Release every section, recording disposal events. The session is
    /// closed afterwards; only a new session runs again.
    pub fn teardown(&mut self) {
        self.track.teardown(&mut self.events);
        self.phase = GamePhase::Closed;
    }

    /// Take all pending events in the order they happened
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn pending_events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Split borrow for the tick: track, RNG and event sink together
    pub(crate) fn track_parts(&mut self) -> (&mut SectionManager, &mut Pcg32, &mut Vec<GameEvent>) {
        (&mut self.track, &mut self.rng, &mut self.events)
    }

    pub(crate) fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub(crate) fn clear_events(&mut self) {
        self.events.clear();
    }
}
