//! Procedural obstacle placement for one track section
//!
//! The generator is stateless: the same RNG draws always produce the same
//! layout, independent of what earlier sections contained.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::Lane;
use crate::consts::LANE_COUNT;
use crate::settings::Settings;

/// Where a single obstacle goes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub lane: Lane,
    /// Absolute forward coordinate
    pub z: f32,
    /// Cube edge length
    pub size: f32,
}

/// Obstacle layout rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleGenerator {
    pub min_slots: u32,
    pub max_slots: u32,
    pub slot_margin: f32,
    pub slot_jitter: f32,
    pub group_prob: f64,
    pub obstacle_prob: f64,
    pub cluster_inclusion_prob: f64,
    pub min_size: f32,
    pub max_size: f32,
}

impl ObstacleGenerator {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            min_slots: settings.min_slots,
            max_slots: settings.max_slots,
            slot_margin: settings.slot_margin,
            slot_jitter: settings.slot_jitter,
            group_prob: settings.group_prob,
            obstacle_prob: settings.obstacle_prob,
            cluster_inclusion_prob: settings.cluster_inclusion_prob,
            min_size: settings.min_obstacle_size,
            max_size: settings.max_obstacle_size,
        }
    }

    /// Reject layouts `generate` cannot draw from. Settings validation
    /// covers the same ground; this guards generators restored from a save.
    pub fn check(&self) -> Result<(), String> {
        if self.min_slots > self.max_slots {
            return Err(format!(
                "min_slots {} exceeds max_slots {}",
                self.min_slots, self.max_slots
            ));
        }
        for (name, p) in [
            ("group_prob", self.group_prob),
            ("obstacle_prob", self.obstacle_prob),
            ("cluster_inclusion_prob", self.cluster_inclusion_prob),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("{name} {p} is not a probability"));
            }
        }
        if !(self.min_size > 0.0
            && self.min_size <= self.max_size
            && self.max_size / 2.0 <= self.slot_margin)
        {
            return Err(format!(
                "obstacle sizes {}..={} do not fit margin {}",
                self.min_size, self.max_size, self.slot_margin
            ));
        }
        if !(self.slot_jitter >= 0.0) {
            return Err(format!("slot_jitter {} is negative", self.slot_jitter));
        }
        Ok(())
    }

    /// Longitudinal slot positions for a section, evenly spaced between the margins
    pub fn slot_positions(&self, start: f32, length: f32, count: u32) -> Vec<f32> {
        let first = start + self.slot_margin;
        let last = start + length - self.slot_margin;
        match count {
            0 => Vec::new(),
            1 => vec![(first + last) / 2.0],
            n => {
                let step = (last - first) / (n - 1) as f32;
                (0..n).map(|i| first + step * i as f32).collect()
            }
        }
    }

    /// Generate placements for the section `[start, start + length)`
    pub fn generate(&self, start: f32, length: f32, rng: &mut impl Rng) -> Vec<Placement> {
        let count = rng.random_range(self.min_slots..=self.max_slots);
        let mut placements = Vec::new();

        for slot_z in self.slot_positions(start, length, count) {
            if rng.random_bool(self.group_prob) {
                self.place_cluster(slot_z, rng, &mut placements);
            } else {
                self.place_independent(slot_z, start, length, rng, &mut placements);
            }
        }

        placements
    }

    /// A group spanning one or two adjacent lanes at the same z
    fn place_cluster(&self, z: f32, rng: &mut impl Rng, out: &mut Vec<Placement>) {
        let width = rng.random_range(1..=2usize);
        let first_lane = rng.random_range(0..=LANE_COUNT - width);

        for index in first_lane..first_lane + width {
            if !rng.random_bool(self.cluster_inclusion_prob) {
                continue;
            }
            if !rng.random_bool(self.obstacle_prob) {
                continue;
            }
            if let Some(lane) = Lane::new(index) {
                out.push(Placement {
                    lane,
                    z,
                    size: self.random_size(rng),
                });
            }
        }
    }

    /// Each lane rolls on its own, with a little longitudinal jitter
    fn place_independent(
        &self,
        z: f32,
        start: f32,
        length: f32,
        rng: &mut impl Rng,
        out: &mut Vec<Placement>,
    ) {
        for lane in Lane::ALL {
            if !rng.random_bool(self.obstacle_prob) {
                continue;
            }
            let jitter = if self.slot_jitter > 0.0 {
                rng.random_range(-self.slot_jitter..=self.slot_jitter)
            } else {
                0.0
            };
            let size = self.random_size(rng);
            let half = size / 2.0;
            // Keep the whole cube inside its section
            let jittered = (z + jitter).clamp(start + half, start + length - half);
            out.push(Placement {
                lane,
                z: jittered,
                size,
            });
        }
    }

    fn random_size(&self, rng: &mut impl Rng) -> f32 {
        if self.max_size > self.min_size {
            rng.random_range(self.min_size..=self.max_size)
        } else {
            self.min_size
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn generator() -> ObstacleGenerator {
        ObstacleGenerator::from_settings(&Settings::default())
    }

    #[test]
    fn test_slots_evenly_spaced_inside_margins() {
        let slots = generator().slot_positions(100.0, 40.0, 5);
        assert_eq!(slots.len(), 5);
        assert!((slots[0] - 104.0).abs() < 1e-4);
        assert!((slots[4] - 136.0).abs() < 1e-4);
        let step = slots[1] - slots[0];
        for pair in slots.windows(2) {
            assert!((pair[1] - pair[0] - step).abs() < 1e-4);
        }
    }

    #[test]
    fn test_check_accepts_defaults_and_rejects_bad_probability() {
        assert!(generator().check().is_ok());
        let bad = ObstacleGenerator {
            group_prob: 1.5,
            ..generator()
        };
        assert!(bad.check().unwrap_err().contains("group_prob"));
        let inverted = ObstacleGenerator {
            min_slots: 7,
            ..generator()
        };
        assert!(inverted.check().is_err());
    }

    #[test]
    fn test_single_slot_is_centered() {
        let slots = generator().slot_positions(0.0, 40.0, 1);
        assert_eq!(slots, vec![20.0]);
    }

    #[test]
    fn test_same_seed_same_layout() {
        let generator = generator();
        let a = generator.generate(40.0, 40.0, &mut Pcg32::seed_from_u64(9));
        let b = generator.generate(40.0, 40.0, &mut Pcg32::seed_from_u64(9));
        assert_eq!(a, b);
    }

    #[test]
    fn test_placements_stay_inside_section() {
        let generator = generator();
        let mut rng = Pcg32::seed_from_u64(1234);
        for i in 0..200 {
            let start = i as f32 * 40.0;
            for p in generator.generate(start, 40.0, &mut rng) {
                assert!(p.z - p.size / 2.0 >= start, "{p:?} before {start}");
                assert!(p.z + p.size / 2.0 <= start + 40.0, "{p:?} past end");
                assert!(p.size >= 0.8 && p.size <= 1.4);
                assert!(p.lane.index() < LANE_COUNT);
            }
        }
    }

    #[test]
    fn test_zero_probability_gives_clear_section() {
        let generator = ObstacleGenerator {
            obstacle_prob: 0.0,
            ..generator()
        };
        let mut rng = Pcg32::seed_from_u64(5);
        for _ in 0..50 {
            assert!(generator.generate(0.0, 40.0, &mut rng).is_empty());
        }
    }

    #[test]
    fn test_clusters_are_adjacent_lanes_at_one_z() {
        let generator = ObstacleGenerator {
            group_prob: 1.0,
            obstacle_prob: 1.0,
            cluster_inclusion_prob: 1.0,
            ..generator()
        };
        let mut rng = Pcg32::seed_from_u64(77);
        let placements = generator.generate(0.0, 40.0, &mut rng);

        let mut slot_zs: Vec<f32> = placements.iter().map(|p| p.z).collect();
        slot_zs.dedup_by(|a, b| (*a - *b).abs() < 1e-4);
        assert!((4..=6).contains(&slot_zs.len()));

        for z in slot_zs {
            let lanes: Vec<usize> = placements
                .iter()
                .filter(|p| (p.z - z).abs() < 1e-4)
                .map(|p| p.lane.index())
                .collect();
            assert!(!lanes.is_empty() && lanes.len() <= 2);
            if lanes.len() == 2 {
                assert_eq!(lanes[1] - lanes[0], 1);
            }
        }
    }

    #[test]
    fn test_slot_count_within_range() {
        let generator = ObstacleGenerator {
            group_prob: 0.0,
            obstacle_prob: 1.0,
            slot_jitter: 0.0,
            ..generator()
        };
        let mut rng = Pcg32::seed_from_u64(3);
        for _ in 0..50 {
            // Every independent slot fills all three lanes
            let n = generator.generate(0.0, 40.0, &mut rng).len();
            assert!(n % 3 == 0);
            assert!((4 * 3..=6 * 3).contains(&n));
        }
    }
}
