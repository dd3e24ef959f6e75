//! Idle bobbing and spinning for collectibles.

use bevy::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

const MIN_EFFECT: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatMotion {
    pub speed: f32,
    pub height: f32,
    pub rotation_enabled: bool,
    /// Degrees per second.
    pub rotation_speed: f32,
    pub axis: Vec3,
    /// Per-entity offset into the sine so neighbours do not bob in lockstep.
    pub phase: f32,
}

impl FloatMotion {
    pub fn vertical_offset(&self, time: f32) -> f32 {
        if self.height <= MIN_EFFECT {
            return 0.0;
        }
        ((time + self.phase) * self.speed).sin() * self.height
    }

    pub fn spin(&self, time: f32) -> Quat {
        if !self.rotation_enabled || self.rotation_speed <= MIN_EFFECT {
            return Quat::IDENTITY;
        }
        let axis = self.axis.try_normalize().unwrap_or(Vec3::Y);
        Quat::from_axis_angle(axis, (self.rotation_speed * time).to_radians())
    }
}

/// Per-prefab tweaks layered over the configured defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatOverrides {
    pub speed: Option<f32>,
    pub height: Option<f32>,
    pub rotation_enabled: Option<bool>,
    pub rotation_speed: Option<f32>,
    pub axis: Option<Vec3>,
}

impl FloatOverrides {
    pub fn resolve(&self, default_speed: f32, default_height: f32, phase: f32) -> FloatMotion {
        FloatMotion {
            speed: self.speed.unwrap_or(default_speed),
            height: self.height.unwrap_or(default_height),
            rotation_enabled: self.rotation_enabled.unwrap_or(true),
            rotation_speed: self.rotation_speed.unwrap_or(20.0),
            axis: self.axis.unwrap_or(Vec3::Y),
            phase,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_stays_within_height() {
        let motion = FloatOverrides::default().resolve(0.5, 0.1, 1.3);
        for step in 0..200 {
            let offset = motion.vertical_offset(step as f32 * 0.137);
            assert!(offset.abs() <= 0.1 + f32::EPSILON);
        }
    }

    #[test]
    fn flat_settings_disable_motion() {
        let overrides = FloatOverrides {
            height: Some(0.0),
            rotation_enabled: Some(false),
            ..Default::default()
        };
        let motion = overrides.resolve(0.5, 0.1, 0.0);
        assert_eq!(motion.vertical_offset(3.0), 0.0);
        assert_eq!(motion.spin(3.0), Quat::IDENTITY);
    }
}
