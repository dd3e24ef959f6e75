//! Random spawn placement around a reference point.
//!
//! Samples are uniform over a disk, dropped onto whatever ground the host reports, and accepted
//! once they keep `min_separation` from every position already taken. When the attempt budget
//! runs out the last sample is returned anyway and flagged as invalid; callers spawn there rather
//! than failing the whole session.

use std::f32::consts::TAU;

use bevy::log::warn;
use bevy::math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::host::GroundProbe;

/// Height added above a ground hit so spawned objects do not clip into the surface.
pub const GROUND_CLEARANCE: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementConstraint {
    pub spawn_radius: f32,
    pub min_separation: f32,
    pub max_attempts: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec3,
    /// Samples drawn, including the accepted one.
    pub attempts: u32,
    /// `false` when the budget ran out and `position` may violate the separation.
    pub valid: bool,
}

pub struct PlacementPlanner {
    rng: StdRng,
}

impl PlacementPlanner {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    pub fn find_position(
        &mut self,
        center: Vec3,
        constraint: &PlacementConstraint,
        existing: &[Vec3],
        ground: &dyn GroundProbe,
    ) -> Placement {
        let budget = constraint.max_attempts.max(1);
        let mut position = center;
        let mut attempts = 0;

        while attempts < budget {
            position = self.sample(center, constraint.spawn_radius, ground);
            attempts += 1;
            let clear = existing
                .iter()
                .all(|taken| taken.distance(position) >= constraint.min_separation);
            if clear {
                return Placement {
                    position,
                    attempts,
                    valid: true,
                };
            }
        }

        warn!(
            "No spawn position {:.2}m apart found after {} attempts; using last sample {:?}",
            constraint.min_separation, attempts, position
        );
        Placement {
            position,
            attempts,
            valid: false,
        }
    }

    /// Random phase in [0, 2π), used to desynchronise float motion.
    pub fn phase(&mut self) -> f32 {
        self.rng.gen_range(0.0..TAU)
    }

    pub fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    fn sample(&mut self, center: Vec3, radius: f32, ground: &dyn GroundProbe) -> Vec3 {
        // sqrt keeps the density uniform over the disk rather than clustered at the center.
        let distance = radius.max(0.0) * self.rng.gen::<f32>().sqrt();
        let angle = self.rng.gen_range(0.0..TAU);
        let flat = center + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance);

        match ground.probe_ground(flat) {
            Some(hit) => hit + Vec3::Y * GROUND_CLEARANCE,
            None => Vec3::new(flat.x, center.y, flat.z),
        }
    }
}
