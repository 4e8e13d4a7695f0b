//! Track section lifecycle
//!
//! Sections are kept in one queue ordered by position. Fading sections are
//! always the oldest, so the queue is a (possibly empty) run of fading
//! sections followed by the contiguous live window.

use std::collections::VecDeque;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

use super::obstacles::ObstacleGenerator;
use super::state::{GameEvent, Obstacle, ObstacleId, Section, SectionId, SectionState};
use crate::settings::Settings;

/// Owns every section and obstacle on the track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionManager {
    #[serde(deserialize_with = "checked_generator")]
    generator: ObstacleGenerator,
    section_length: f32,
    visible_sections: usize,
    live_capacity: usize,
    lookahead_distance: f32,
    clear_sections: usize,
    fade_rate: f32,
    sections: VecDeque<Section>,
    next_section_id: SectionId,
    next_obstacle_id: ObstacleId,
}

fn checked_generator<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<ObstacleGenerator, D::Error> {
    let generator = ObstacleGenerator::deserialize(deserializer)?;
    generator.check().map_err(serde::de::Error::custom)?;
    Ok(generator)
}

impl SectionManager {
    pub fn new(settings: &Settings) -> Self {
        Self {
            generator: ObstacleGenerator::from_settings(settings),
            section_length: settings.section_length,
            visible_sections: settings.visible_sections,
            live_capacity: settings.live_capacity(),
            lookahead_distance: settings.lookahead_distance(),
            clear_sections: settings.clear_sections,
            fade_rate: settings.fade_rate,
            sections: VecDeque::new(),
            next_section_id: 1,
            next_obstacle_id: 1,
        }
    }

    /// Drop everything and lay down the initial window starting at z = 0
    pub fn reset(&mut self, rng: &mut impl Rng, events: &mut Vec<GameEvent>) {
        self.teardown(events);
        let mut end = 0.0;
        for i in 0..self.visible_sections {
            let populate = i >= self.clear_sections;
            self.spawn_section(end, populate, rng, events);
            end += self.section_length;
        }
    }

    /// Append a populated section at `after_end`, evicting the oldest live
    /// section if the window overflows
    pub fn spawn_next(
        &mut self,
        after_end: f32,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) -> SectionId {
        self.spawn_section(after_end, true, rng, events)
    }

    fn spawn_section(
        &mut self,
        start: f32,
        populate: bool,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) -> SectionId {
        let id = self.next_section_id;
        self.next_section_id += 1;

        let mut section = Section {
            id,
            start,
            end: start + self.section_length,
            state: SectionState::Live,
            opacity: 1.0,
            obstacles: Vec::new(),
        };
        events.push(GameEvent::SectionSpawned {
            section: id,
            center: section.center(),
            length: section.length(),
        });

        if populate {
            for placement in self.generator.generate(start, self.section_length, rng) {
                let obstacle = Obstacle {
                    id: self.next_obstacle_id,
                    lane: placement.lane,
                    // Resting on the track surface
                    pos: Vec3::new(placement.lane.x(), placement.size / 2.0, placement.z),
                    size: placement.size,
                    opacity: 1.0,
                };
                self.next_obstacle_id += 1;
                events.push(GameEvent::ObstacleSpawned {
                    obstacle: obstacle.id,
                    section: id,
                    pos: obstacle.pos,
                    size: obstacle.size,
                });
                section.obstacles.push(obstacle);
            }
        }

        log::debug!(
            "Spawned section {} [{}, {}) with {} obstacles",
            id,
            section.start,
            section.end,
            section.obstacles.len()
        );
        self.sections.push_back(section);

        if self.live_count() > self.live_capacity {
            self.evict_oldest(events);
        }
        id
    }

    /// Move the oldest live section into the fading set
    fn evict_oldest(&mut self, events: &mut Vec<GameEvent>) {
        if let Some(section) = self.sections.iter_mut().find(|s| s.is_live()) {
            section.state = SectionState::Fading { level: 1.0 };
            log::debug!("Evicted section {} [{}, {})", section.id, section.start, section.end);
            events.push(GameEvent::SectionEvicted {
                section: section.id,
            });
        }
    }

    /// Spawn at most one section if the track ends too close to the player
    pub fn ensure_ahead(
        &mut self,
        player_z: f32,
        rng: &mut impl Rng,
        events: &mut Vec<GameEvent>,
    ) -> Option<SectionId> {
        let end = self.farthest_end()?;
        (end - player_z < self.lookahead_distance).then(|| self.spawn_next(end, rng, events))
    }

    /// Advance fading sections; fully faded ones are disposed and removed
    pub fn tick_fade(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let step = self.fade_rate * dt;
        for section in self.sections.iter_mut() {
            let SectionState::Fading { level } = section.state else {
                continue;
            };
            let level = level - step;
            let opacity = level.max(0.0);

            section.opacity = opacity;
            for obstacle in section.obstacles.iter_mut() {
                obstacle.opacity = opacity;
            }
            events.push(GameEvent::OpacityChanged {
                section: section.id,
                obstacles: section.obstacle_ids(),
                opacity,
            });

            if level <= 0.0 {
                section.state = SectionState::Disposed;
                log::debug!("Disposed section {}", section.id);
                events.push(GameEvent::SectionDisposed {
                    section: section.id,
                    obstacles: section.obstacle_ids(),
                });
            } else {
                section.state = SectionState::Fading { level };
            }
        }
        self.sections.retain(|s| s.state != SectionState::Disposed);
    }

    /// Release every section, live or fading
    pub fn teardown(&mut self, events: &mut Vec<GameEvent>) {
        for section in self.sections.drain(..) {
            events.push(GameEvent::SectionDisposed {
                section: section.id,
                obstacles: section.obstacle_ids(),
            });
        }
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn section(&self, id: SectionId) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn live(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.is_live())
    }

    pub fn fading(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter().filter(|s| s.is_fading())
    }

    /// Live sections then fading sections, each in insertion order
    pub fn collidable_sections(&self) -> impl Iterator<Item = &Section> {
        self.live().chain(self.fading())
    }

    pub fn live_count(&self) -> usize {
        self.live().count()
    }

    pub fn fading_count(&self) -> usize {
        self.fading().count()
    }

    pub fn obstacle_count(&self) -> usize {
        self.sections.iter().map(|s| s.obstacles.len()).sum()
    }

    /// End of the farthest live section
    pub fn farthest_end(&self) -> Option<f32> {
        self.live().last().map(|s| s.end)
    }

    /// Live intervals are gap-free and strictly increasing
    pub fn live_chain_is_contiguous(&self) -> bool {
        let live: Vec<&Section> = self.live().collect();
        live.iter().all(|s| s.start < s.end)
            && live.windows(2).all(|pair| pair[0].end == pair[1].start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn manager() -> (SectionManager, Pcg32, Vec<GameEvent>) {
        let mut track = SectionManager::new(&Settings::default());
        let mut rng = Pcg32::seed_from_u64(2024);
        let mut events = Vec::new();
        track.reset(&mut rng, &mut events);
        (track, rng, events)
    }

    #[test]
    fn test_initial_window() {
        let (track, _, _) = manager();
        assert_eq!(track.live_count(), VISIBLE_SECTIONS);
        assert_eq!(track.fading_count(), 0);
        assert_eq!(track.farthest_end(), Some(SECTION_LENGTH * VISIBLE_SECTIONS as f32));
        assert!(track.live_chain_is_contiguous());
        // Opening section is a clear runway
        assert!(track.sections().next().unwrap().obstacles.is_empty());
    }

    #[test]
    fn test_restored_generator_is_checked() {
        let (track, _, _) = manager();
        let mut json = serde_json::to_value(&track).unwrap();
        assert!(serde_json::from_value::<SectionManager>(json.clone()).is_ok());
        json["generator"]["obstacle_prob"] = serde_json::json!(-0.5);
        let err = serde_json::from_value::<SectionManager>(json).unwrap_err();
        assert!(err.to_string().contains("obstacle_prob"), "{err}");
    }

    #[test]
    fn test_spawn_next_appends_contiguously() {
        let (mut track, mut rng, mut events) = manager();
        let end = track.farthest_end().unwrap();
        let id = track.spawn_next(end, &mut rng, &mut events);
        let section = track.section(id).unwrap();
        assert_eq!(section.start, end);
        assert_eq!(section.end, end + SECTION_LENGTH);
        assert!(track.live_chain_is_contiguous());
    }

    #[test]
    fn test_eviction_is_fifo() {
        let (mut track, mut rng, mut events) = manager();
        let first_ids: Vec<SectionId> = track.live().map(|s| s.id).collect();

        // Fill up to capacity without evicting
        for _ in 0..EXTRA_LIVE_SECTIONS {
            let end = track.farthest_end().unwrap();
            track.spawn_next(end, &mut rng, &mut events);
        }
        assert_eq!(track.fading_count(), 0);

        for (n, expected) in first_ids.iter().enumerate() {
            events.clear();
            let end = track.farthest_end().unwrap();
            track.spawn_next(end, &mut rng, &mut events);
            assert_eq!(track.live_count(), VISIBLE_SECTIONS + EXTRA_LIVE_SECTIONS);
            assert_eq!(track.fading_count(), n + 1);
            assert!(events.contains(&GameEvent::SectionEvicted { section: *expected }));
            assert_eq!(
                track.fading().last().map(|s| s.id),
                Some(*expected),
                "oldest live section must be evicted first"
            );
            assert!(track.live_chain_is_contiguous());
        }
    }

    #[test]
    fn test_ensure_ahead_spawns_only_when_close() {
        let (mut track, mut rng, mut events) = manager();
        let end = track.farthest_end().unwrap();
        let threshold = LOOKAHEAD_SECTIONS * SECTION_LENGTH;

        assert!(track.ensure_ahead(end - threshold, &mut rng, &mut events).is_none());
        assert!(track.ensure_ahead(end - threshold + 0.1, &mut rng, &mut events).is_some());
        // One spawn per call, even when far behind
        let before = track.live_count();
        track.ensure_ahead(end + 500.0, &mut rng, &mut events);
        assert_eq!(track.live_count(), before + 1);
    }

    #[test]
    fn test_fade_reaches_zero_then_disposes() {
        let (mut track, mut rng, mut events) = manager();
        for _ in 0..=EXTRA_LIVE_SECTIONS {
            let end = track.farthest_end().unwrap();
            track.spawn_next(end, &mut rng, &mut events);
        }
        let fading_id = track.fading().next().unwrap().id;
        events.clear();

        let mut last = 1.0;
        let mut saw_zero = false;
        for _ in 0..100 {
            track.tick_fade(0.05, &mut events);
            match track.section(fading_id) {
                Some(section) => {
                    assert!(section.opacity <= last);
                    assert!(section.obstacles.iter().all(|o| o.opacity == section.opacity));
                    last = section.opacity;
                }
                None => break,
            }
        }
        for event in &events {
            if let GameEvent::OpacityChanged { section, opacity, .. } = event {
                assert_eq!(*section, fading_id);
                if *opacity == 0.0 {
                    saw_zero = true;
                }
            }
        }
        assert!(saw_zero, "opacity must hit exactly zero before removal");
        assert!(track.section(fading_id).is_none());
        assert!(matches!(
            events.last(),
            Some(GameEvent::SectionDisposed { section, .. }) if *section == fading_id
        ));
        assert_eq!(track.fading_count(), 0);
    }

    #[test]
    fn test_teardown_disposes_everything() {
        let (mut track, _, mut events) = manager();
        events.clear();
        track.teardown(&mut events);
        assert_eq!(track.sections().count(), 0);
        assert_eq!(events.len(), VISIBLE_SECTIONS);
        assert!(events
            .iter()
            .all(|e| matches!(e, GameEvent::SectionDisposed { .. })));
    }

    #[test]
    fn test_obstacle_ids_unique() {
        let (mut track, mut rng, mut events) = manager();
        for _ in 0..10 {
            let end = track.farthest_end().unwrap();
            track.spawn_next(end, &mut rng, &mut events);
        }
        let mut ids: Vec<ObstacleId> = track
            .sections()
            .flat_map(|s| s.obstacles.iter().map(|o| o.id))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }
}
