//! Collision detection between the player and track obstacles
//!
//! Everything is an axis-aligned box. The player's box is rebuilt from its
//! pose every tick; obstacle boxes are derived from their (fixed) pose.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::state::{ObstacleId, SectionId};
use super::track::SectionManager;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    /// Cube of edge `size` centered on `center`
    pub fn from_center_size(center: Vec3, size: f32) -> Self {
        let half = Vec3::splat(size.abs() / 2.0);
        Self {
            min: center - half,
            max: center + half,
        }
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) / 2.0
    }

    /// Strict overlap; boxes that only touch faces do not intersect
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }
}

/// The obstacle blamed for ending the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollisionHit {
    pub obstacle: ObstacleId,
    pub section: SectionId,
}

/// First obstacle overlapping `player`.
///
/// Live sections are checked before fading ones, each in insertion order, so
/// the same layout always blames the same obstacle.
pub fn first_hit(player: &Aabb, track: &SectionManager) -> Option<CollisionHit> {
    track
        .collidable_sections()
        .flat_map(|section| {
            section
                .obstacles
                .iter()
                .map(move |obstacle| (section.id, obstacle))
        })
        .find(|(_, obstacle)| player.intersects(&obstacle.aabb()))
        .map(|(section, obstacle)| CollisionHit {
            obstacle: obstacle.id,
            section,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlapping_boxes_intersect() {
        let a = Aabb::from_center_size(Vec3::ZERO, 1.0);
        let b = Aabb::from_center_size(Vec3::new(0.5, 0.0, 0.5), 1.0);
        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
    }

    #[test]
    fn test_touching_faces_do_not_intersect() {
        let a = Aabb::from_center_size(Vec3::ZERO, 1.0);
        let b = Aabb::from_center_size(Vec3::new(1.0, 0.0, 0.0), 1.0);
        assert!(!a.intersects(&b));
    }

    #[test]
    fn test_separated_on_one_axis_is_miss() {
        let a = Aabb::from_center_size(Vec3::ZERO, 1.0);
        // Same x/y, far apart on z
        let b = Aabb::from_center_size(Vec3::new(0.0, 0.0, 5.0), 1.0);
        assert!(!a.intersects(&b));
        // Adjacent lanes never overlap with default geometry
        let c = Aabb::from_center_size(Vec3::new(2.5, 0.0, 0.0), 1.4);
        assert!(!a.intersects(&c));
    }

    #[test]
    fn test_new_orders_corners() {
        let aabb = Aabb::new(Vec3::ONE, Vec3::ZERO);
        assert_eq!(aabb.min, Vec3::ZERO);
        assert_eq!(aabb.max, Vec3::ONE);
        assert_eq!(aabb.center(), Vec3::splat(0.5));
    }
}
