//! Kinematic player movement for the platform game: joystick input relative to the camera,
//! gravity with ground snapping, and clamping to the map boundary.

use bevy::math::{Quat, Vec2, Vec3};

use crate::boundary::BoundaryRegion;
use crate::config::MovementSettings;
use crate::entity::EntityId;
use crate::host::{CharacterMover, GroundProbe, InputAxis, Pose};

const SKIN: f32 = 0.001;
const DEAD_ZONE: f32 = 0.01;

/// Moves a point without forces, clamped to an optional boundary.
#[derive(Debug, Clone)]
pub struct KinematicMover {
    position: Vec3,
    enabled: bool,
    boundary: Option<BoundaryRegion>,
}

impl KinematicMover {
    pub fn new(position: Vec3, boundary: Option<BoundaryRegion>) -> Self {
        Self {
            position,
            enabled: true,
            boundary,
        }
    }
}

impl CharacterMover for KinematicMover {
    fn move_by(&mut self, displacement: Vec3) -> Vec3 {
        if !self.enabled {
            return self.position;
        }
        let target = self.position + displacement;
        self.position = match &self.boundary {
            Some(boundary) => boundary.clamp(target),
            None => target,
        };
        self.position
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn enable(&mut self) {
        self.enabled = true;
    }

    fn disable(&mut self) {
        self.enabled = false;
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn reset(&mut self) {
        self.enabled = false;
        self.boundary = None;
    }
}

/// The player avatar's controller state. Owned by the mode controller for the length of one
/// platform session.
pub struct PlatformPlayer {
    pub entity: EntityId,
    pub joystick_id: u32,
    mover: Box<dyn CharacterMover + Send + Sync>,
    vertical_speed: f32,
    grounded: bool,
    facing: Quat,
    active: bool,
}

impl PlatformPlayer {
    pub fn new(entity: EntityId, joystick_id: u32, mover: Box<dyn CharacterMover + Send + Sync>) -> Self {
        Self {
            entity,
            joystick_id,
            mover,
            vertical_speed: 0.0,
            grounded: false,
            facing: Quat::IDENTITY,
            active: true,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.mover.position()
    }

    pub fn facing(&self) -> Quat {
        self.facing
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn is_active(&self) -> bool {
        self.active && self.mover.is_enabled()
    }

    /// Advances one frame and returns the new position.
    pub fn step(
        &mut self,
        input: &dyn InputAxis,
        camera: Option<Pose>,
        ground: &dyn GroundProbe,
        settings: &MovementSettings,
        dt: f32,
    ) -> Vec3 {
        if !self.is_active() || dt <= 0.0 {
            return self.position();
        }

        let direction = planar_direction(input.axis(self.joystick_id), camera);
        if direction.length() > DEAD_ZONE {
            let direction = direction.normalize();
            self.mover.move_by(direction * settings.move_speed * dt);
            let target = Quat::from_rotation_arc(Vec3::NEG_Z, direction);
            let blend = (settings.turn_rate * dt).clamp(0.0, 1.0);
            self.facing = self.facing.slerp(target, blend);
        }

        self.apply_gravity(ground, settings, dt);
        self.position()
    }

    fn apply_gravity(&mut self, ground: &dyn GroundProbe, settings: &MovementSettings, dt: f32) {
        let position = self.position();
        let floor = ground.probe_ground(position).map(|hit| hit.y);

        self.grounded = floor.is_some_and(|y| position.y - y <= settings.ground_probe_slack);
        if self.grounded && self.vertical_speed < 0.0 {
            self.vertical_speed = settings.grounded_velocity;
        } else {
            self.vertical_speed += settings.gravity * dt;
        }

        let mut drop = self.vertical_speed * dt;
        if let Some(y) = floor {
            // Never tunnel below the surface we are standing over.
            let lowest = y + SKIN - position.y;
            if drop < lowest {
                drop = lowest;
                self.vertical_speed = self.vertical_speed.max(0.0);
                self.grounded = true;
            }
        }
        self.mover.move_by(Vec3::new(0.0, drop, 0.0));
    }

    /// Stops the avatar and releases the mover.
    pub fn reset(&mut self) {
        self.active = false;
        self.vertical_speed = 0.0;
        self.grounded = false;
        self.mover.reset();
    }
}

/// Joystick axis to a horizontal world direction: camera-relative when a pose is known, raw x/z
/// otherwise.
fn planar_direction(axis: Vec2, camera: Option<Pose>) -> Vec3 {
    match camera {
        Some(pose) => pose.flat_forward() * axis.y + pose.flat_right() * axis.x,
        None => Vec3::new(axis.x, 0.0, axis.y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::FlatGround;

    struct Stick(Vec2);

    impl InputAxis for Stick {
        fn axis(&self, id: u32) -> Vec2 {
            if id == 1 {
                self.0
            } else {
                Vec2::ZERO
            }
        }
    }

    fn player_at(position: Vec3, boundary: Option<BoundaryRegion>) -> PlatformPlayer {
        PlatformPlayer::new(EntityId(0), 1, Box::new(KinematicMover::new(position, boundary)))
    }

    #[test]
    fn pushes_along_camera_forward() {
        let mut player = player_at(Vec3::ZERO, None);
        let camera = Pose::new(Vec3::new(0.0, 1.5, 2.0), Vec3::new(1.0, -0.3, 0.0));
        let ground = FlatGround::at(0.0);

        let after = player.step(&Stick(Vec2::Y), Some(camera), &ground, &MovementSettings::default(), 0.5);

        assert!((after.x - 1.5).abs() < 1e-4, "moved {after:?}");
        assert!(after.z.abs() < 1e-4);
        assert!(player.is_grounded());
    }

    #[test]
    fn ignores_other_joysticks_and_dead_zone() {
        let mut player = player_at(Vec3::ZERO, None);
        let ground = FlatGround::at(0.0);
        let mut settings = MovementSettings::default();
        settings.gravity = 0.0;

        let mut other = PlatformPlayer::new(EntityId(1), 2, Box::new(KinematicMover::new(Vec3::ZERO, None)));
        let moved = other.step(&Stick(Vec2::X), None, &ground, &settings, 1.0);
        assert!(moved.x.abs() < 1e-4);

        let nudged = player.step(&Stick(Vec2::splat(0.001)), None, &ground, &settings, 1.0);
        assert!(nudged.x.abs() < 1e-4);
    }

    #[test]
    fn falls_onto_the_map_and_stays_inside_bounds() {
        let boundary = BoundaryRegion::from_bounds(Vec3::new(0.0, -0.5, 0.0), Vec2::new(4.0, 4.0));
        let mut player = player_at(Vec3::new(0.0, 0.0, 0.0), Some(boundary));
        let ground = FlatGround::at(-0.5);
        let settings = MovementSettings::default();

        for _ in 0..120 {
            player.step(&Stick(Vec2::X), None, &ground, &settings, 1.0 / 30.0);
        }

        let position = player.position();
        assert!((position.x - 2.0).abs() < 1e-4, "clamped at the edge: {position:?}");
        assert!(position.y >= -0.5);
        assert!(position.y < -0.4);
        assert!(player.is_grounded());
    }

    #[test]
    fn reset_freezes_the_player() {
        let mut player = player_at(Vec3::ZERO, None);
        player.reset();
        let after = player.step(&Stick(Vec2::X), None, &FlatGround::at(-1.0), &MovementSettings::default(), 1.0);
        assert_eq!(after, Vec3::ZERO);
        assert!(!player.is_active());
    }
}
