//! Stand-in for AR tracking. A 3D camera the user walks around with the arrow keys (Q/E turn);
//! its transform is published every frame as the pose the controller places content against.

use bevy::prelude::*;

use crate::host::{Pose, PoseSource};
use crate::state::GameSet;

const WALK_SPEED: f32 = 1.5;
const TURN_SPEED: f32 = 1.2;
/// Exponential smoothing toward the walk target, like a tracked device settling.
const FOLLOW_SPEED: f32 = 8.0;

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraPose>()
            .add_systems(Startup, spawn_ar_camera)
            .add_systems(
                Update,
                (walk_ar_camera, publish_camera_pose)
                    .chain()
                    .in_set(GameSet::Input),
            );
    }
}

#[derive(Component)]
pub struct ArCamera {
    target: Vec3,
}

/// Latest tracked camera pose; `None` until tracking starts.
#[derive(Resource, Default, Debug, Clone, Copy)]
pub struct CameraPose(pub Option<Pose>);

impl PoseSource for CameraPose {
    fn current_camera_pose(&self) -> Pose {
        self.0.unwrap_or(Pose::new(Vec3::ZERO, Vec3::NEG_Z))
    }
}

fn spawn_ar_camera(mut commands: Commands) {
    let start = Vec3::new(0.0, 1.5, 3.0);
    commands.spawn((
        Name::new("ArCamera"),
        Camera3dBundle {
            transform: Transform::from_translation(start).looking_at(Vec3::ZERO, Vec3::Y),
            ..default()
        },
        ArCamera { target: start },
    ));
}

fn walk_ar_camera(
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
    mut cameras: Query<(&mut Transform, &mut ArCamera)>,
) {
    let Ok((mut transform, mut camera)) = cameras.get_single_mut() else {
        return;
    };
    let dt = time.delta_seconds();

    let mut turn = 0.0;
    if keyboard.pressed(KeyCode::KeyQ) {
        turn += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyE) {
        turn -= 1.0;
    }
    if turn != 0.0 {
        transform.rotate_y(turn * TURN_SPEED * dt);
    }

    let forward = Vec3::new(transform.forward().x, 0.0, transform.forward().z).normalize_or_zero();
    let right = Vec3::new(transform.right().x, 0.0, transform.right().z).normalize_or_zero();
    let mut walk = Vec3::ZERO;
    if keyboard.pressed(KeyCode::ArrowUp) {
        walk += forward;
    }
    if keyboard.pressed(KeyCode::ArrowDown) {
        walk -= forward;
    }
    if keyboard.pressed(KeyCode::ArrowRight) {
        walk += right;
    }
    if keyboard.pressed(KeyCode::ArrowLeft) {
        walk -= right;
    }
    camera.target += walk.normalize_or_zero() * WALK_SPEED * dt;

    let lerp_t = 1.0 - f32::exp(-FOLLOW_SPEED * dt);
    transform.translation = transform.translation.lerp(camera.target, lerp_t);
}

fn publish_camera_pose(cameras: Query<&Transform, With<ArCamera>>, mut pose: ResMut<CameraPose>) {
    let tracked = cameras
        .get_single()
        .ok()
        .map(|transform| Pose::new(transform.translation, *transform.forward()));
    if pose.0 != tracked {
        pose.0 = tracked;
    }
}
