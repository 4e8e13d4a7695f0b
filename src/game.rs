//! Session driver
//!
//! Owns the single active `GameState`, runs one tick per displayed frame and
//! turns simulation events into renderer calls. Every visual it creates is
//! released again on restart, shutdown or drop.

use std::collections::HashMap;
use std::iter;

use glam::Vec3;

use crate::consts::{PLAYER_SIZE, TRACK_WIDTH};
use crate::renderer::{Frame, Hud, Renderer, VisualHandle, VisualKind};
use crate::settings::Settings;
use crate::sim::{GameEvent, GameState, ObstacleId, SectionId, TickOutcome, tick};

/// Thickness of a section's floor visual
const SECTION_THICKNESS: f32 = 0.1;

/// Simulation entity a visual belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum VisualKey {
    Player,
    Section(SectionId),
    Obstacle(ObstacleId),
}

/// Game instance holding the session and its collaborators
pub struct Game<R: Renderer, H: Hud> {
    state: GameState,
    renderer: R,
    hud: H,
    visuals: HashMap<VisualKey, VisualHandle>,
}

impl<R: Renderer, H: Hud> Game<R, H> {
    /// Start the first session. Invalid settings are a programming error.
    pub fn new(seed: u64, settings: Settings, renderer: R, hud: H) -> Self {
        let mut game = Self {
            state: GameState::new(seed, settings),
            renderer,
            hud,
            visuals: HashMap::new(),
        };
        game.attach_session();
        game
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn hud(&self) -> &H {
        &self.hud
    }

    /// Number of visuals this game currently owns
    pub fn visual_count(&self) -> usize {
        self.visuals.len()
    }

    /// Run one display frame
    pub fn frame(&mut self, elapsed: f32) -> TickOutcome {
        let outcome = tick(&mut self.state, elapsed);
        self.sync_visuals();

        // A frame that ended the run is not drawn
        if outcome == TickOutcome::Continue {
            self.renderer.render(&Frame::capture(&self.state));
            self.hud
                .report(self.state.display_speed(), self.state.score());
        }
        outcome
    }

    /// Throw the current session away and start a fresh one
    pub fn start_new_session(&mut self) {
        let seed = self.state.next_session_seed();
        let settings = self.state.settings.clone();
        self.release_all();
        self.state = GameState::new(seed, settings);
        log::info!("Session restarted with seed {}", seed);
        self.attach_session();
    }

    /// Hide the game-over overlay without restarting
    pub fn dismiss_game_over_overlay(&mut self) {
        self.state.dismiss_overlay();
    }

    pub fn request_lane_left(&mut self) {
        self.state.request_lane_left();
    }

    pub fn request_lane_right(&mut self) {
        self.state.request_lane_right();
    }

    pub fn request_recenter(&mut self) {
        self.state.request_recenter();
    }

    pub fn request_boost(&mut self, delta: f32) {
        self.state.request_boost(delta);
    }

    pub fn set_autopilot(&mut self, enabled: bool) {
        self.state.set_autopilot(enabled);
    }

    /// Release every visual and close the session. Safe to call more than
    /// once; later frames are halted until `start_new_session`.
    pub fn shutdown(&mut self) {
        self.release_all();
    }

    fn attach_session(&mut self) {
        let handle = self.renderer.create_visual(
            VisualKind::Player,
            self.state.player.pos,
            Vec3::splat(PLAYER_SIZE),
        );
        self.visuals.insert(VisualKey::Player, handle);
        self.sync_visuals();
    }

    fn release_all(&mut self) {
        self.state.teardown();
        self.sync_visuals();
        for (_, handle) in self.visuals.drain() {
            self.renderer.dispose_visual(handle);
        }
    }

    /// Apply pending simulation events to the renderer
    fn sync_visuals(&mut self) {
        for event in self.state.drain_events() {
            match event {
                GameEvent::SectionSpawned {
                    section,
                    center,
                    length,
                } => {
                    let handle = self.renderer.create_visual(
                        VisualKind::Section,
                        center,
                        Vec3::new(TRACK_WIDTH, SECTION_THICKNESS, length),
                    );
                    self.visuals.insert(VisualKey::Section(section), handle);
                }
                GameEvent::ObstacleSpawned {
                    obstacle, pos, size, ..
                } => {
                    let handle =
                        self.renderer
                            .create_visual(VisualKind::Obstacle, pos, Vec3::splat(size));
                    self.visuals.insert(VisualKey::Obstacle(obstacle), handle);
                }
                GameEvent::OpacityChanged {
                    section,
                    obstacles,
                    opacity,
                } => {
                    for key in section_keys(section, &obstacles) {
                        if let Some(&handle) = self.visuals.get(&key) {
                            self.renderer.update_visual_opacity(handle, opacity);
                        }
                    }
                }
                GameEvent::SectionDisposed { section, obstacles } => {
                    for key in section_keys(section, &obstacles) {
                        match self.visuals.remove(&key) {
                            Some(handle) => self.renderer.dispose_visual(handle),
                            None => log::warn!("No visual to dispose for {:?}", key),
                        }
                    }
                }
                GameEvent::Collision { obstacle, section } => {
                    log::debug!("Collision with obstacle {} (section {})", obstacle, section);
                }
                GameEvent::SectionEvicted { .. } | GameEvent::GameOver { .. } => {}
            }
        }
    }
}

impl<R: Renderer, H: Hud> Drop for Game<R, H> {
    fn drop(&mut self) {
        self.release_all();
    }
}

fn section_keys(section: SectionId, obstacles: &[ObstacleId]) -> impl Iterator<Item = VisualKey> {
    iter::once(VisualKey::Section(section))
        .chain(obstacles.iter().map(|&id| VisualKey::Obstacle(id)))
}
