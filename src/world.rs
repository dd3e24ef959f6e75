//! Draws the controller's entity pool and the viewer's models. Every pooled entry gets one mesh
//! entity tagged with `PoolLink`, every viewed model one tagged with `ViewerLink`; transforms and
//! visibility are copied over each frame and links whose source is gone are despawned.

use bevy::prelude::*;
use bevy::utils::HashSet;

use crate::config::GameSettings;
use crate::controller::GameModeController;
use crate::entity::{EntityId, EntityKind, SpawnedEntity};
use crate::host::{FlatGround, GroundProbe};
use crate::scanning::SimulatedMarkers;
use crate::state::GameSet;
use crate::viewer::{ModelViewer, ViewedModel};

/// Size of a viewer model at scale 1.0.
const MODEL_SIZE: f32 = 2.0;
const MARKER_SIZE: f32 = 0.3;

pub struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<DetectedGround>()
            .add_systems(Startup, (load_world_assets, spawn_surroundings, spawn_markers))
            .add_systems(
                Update,
                (sync_pool_entities, sync_viewer_models).in_set(GameSet::Presentation),
            );
    }
}

/// The detected floor plane.
#[derive(Resource, Debug, Clone, Copy)]
pub struct DetectedGround(pub FlatGround);

impl Default for DetectedGround {
    fn default() -> Self {
        Self(FlatGround::at(0.0))
    }
}

impl GroundProbe for DetectedGround {
    fn probe_ground(&self, position: Vec3) -> Option<Vec3> {
        self.0.probe_ground(position)
    }
}

/// Links a render entity to its pool entry.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolLink(pub EntityId);

/// Links a render entity to the viewer model on marker `0`.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct ViewerLink(pub String);

#[derive(Resource)]
struct WorldAssets {
    collectible: (Handle<Mesh>, Handle<StandardMaterial>),
    banana: (Handle<Mesh>, Handle<StandardMaterial>),
    map: (Handle<Mesh>, Handle<StandardMaterial>),
    player: (Handle<Mesh>, Handle<StandardMaterial>),
    model: (Handle<Mesh>, Handle<StandardMaterial>),
}

fn load_world_assets(
    mut commands: Commands,
    settings: Res<GameSettings>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let bounds = settings.platform.map_bounds;
    let mut shape = |mesh: Mesh, color: Color| (meshes.add(mesh), materials.add(color));

    let assets = WorldAssets {
        collectible: shape(Sphere::new(0.12).into(), Color::srgb(0.9, 0.3, 0.5)),
        banana: shape(Capsule3d::new(0.06, 0.18).into(), Color::srgb(0.95, 0.85, 0.2)),
        map: shape(
            Cuboid::new(bounds.x, 0.1, bounds.y).into(),
            Color::srgb(0.2, 0.45, 0.2),
        ),
        player: shape(Capsule3d::new(0.15, 0.3).into(), Color::srgb(0.45, 0.3, 0.15)),
        model: shape(
            Cylinder::new(MODEL_SIZE / 2.0, MODEL_SIZE).into(),
            Color::srgb(0.6, 0.35, 0.75),
        ),
    };
    commands.insert_resource(assets);
}

fn spawn_surroundings(mut commands: Commands) {
    commands.spawn((
        Name::new("Sun"),
        DirectionalLightBundle {
            directional_light: DirectionalLight {
                illuminance: 8_000.0,
                shadows_enabled: true,
                ..default()
            },
            transform: Transform::from_xyz(2.0, 6.0, 3.0).looking_at(Vec3::ZERO, Vec3::Y),
            ..default()
        },
    ));
}

/// Printed markers for the desktop tracking stand-in.
fn spawn_markers(
    mut commands: Commands,
    markers: Option<Res<SimulatedMarkers>>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let Some(markers) = markers else {
        return;
    };
    let mesh = meshes.add(Plane3d::default().mesh().size(MARKER_SIZE, MARKER_SIZE).build());
    let material = materials.add(Color::srgb(0.1, 0.1, 0.1));
    for marker in markers.placements() {
        commands.spawn((
            Name::new(format!("Marker {}", marker.qr_code)),
            PbrBundle {
                mesh: mesh.clone(),
                material: material.clone(),
                transform: Transform::from_translation(marker.position + Vec3::Y * 0.005),
                ..default()
            },
        ));
    }
}

impl WorldAssets {
    fn for_entity(
        &self,
        entity: &SpawnedEntity,
        controller: &GameModeController,
    ) -> (Handle<Mesh>, Handle<StandardMaterial>) {
        let pair = match entity.kind {
            EntityKind::CollectibleObject => &self.collectible,
            EntityKind::Banana => &self.banana,
            EntityKind::PlatformElement if controller.map_entity() == Some(entity.id) => &self.map,
            EntityKind::PlatformElement => &self.player,
        };
        pair.clone()
    }
}

fn visibility_of(entity: &SpawnedEntity) -> Visibility {
    if entity.active {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

fn transform_of(entity: &SpawnedEntity, time: f32) -> Transform {
    let mut transform = Transform::from_translation(entity.position).with_rotation(entity.rotation);
    if let Some(motion) = entity.float {
        transform.translation.y += motion.vertical_offset(time);
        transform.rotation = entity.rotation * motion.spin(time);
    }
    transform
}

fn sync_pool_entities(
    mut commands: Commands,
    time: Res<Time>,
    controller: Res<GameModeController>,
    assets: Option<Res<WorldAssets>>,
    mut linked: Query<(Entity, &PoolLink, &mut Transform, &mut Visibility)>,
) {
    let Some(assets) = assets else {
        return;
    };
    let now = time.elapsed_seconds();
    let pool = controller.pool();
    let mut seen = HashSet::default();

    for (entity, PoolLink(id), mut transform, mut visibility) in &mut linked {
        match pool.get(*id) {
            Some(spawned) => {
                *transform = transform_of(spawned, now);
                *visibility = visibility_of(spawned);
                seen.insert(*id);
            }
            None => commands.entity(entity).despawn_recursive(),
        }
    }

    for spawned in pool.iter().filter(|spawned| !seen.contains(&spawned.id)) {
        let (mesh, material) = assets.for_entity(spawned, &controller);
        commands.spawn((
            PoolLink(spawned.id),
            Name::new(format!("{} {}", spawned.name, spawned.id)),
            PbrBundle {
                mesh,
                material,
                transform: transform_of(spawned, now),
                visibility: visibility_of(spawned),
                ..default()
            },
        ));
    }
}

fn model_transform(model: &ViewedModel) -> Transform {
    Transform::from_translation(model.position)
        .with_rotation(model.rotation)
        .with_scale(Vec3::splat(model.scale))
}

fn model_visibility(model: &ViewedModel) -> Visibility {
    if model.visible {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

fn sync_viewer_models(
    mut commands: Commands,
    viewer: Option<Res<ModelViewer>>,
    assets: Option<Res<WorldAssets>>,
    mut linked: Query<(Entity, &ViewerLink, &mut Transform, &mut Visibility)>,
) {
    let (Some(viewer), Some(assets)) = (viewer, assets) else {
        return;
    };
    let mut seen = HashSet::default();

    for (entity, ViewerLink(code), mut transform, mut visibility) in &mut linked {
        match viewer.model(code) {
            Some(model) => {
                *transform = model_transform(model);
                *visibility = model_visibility(model);
                seen.insert(code.clone());
            }
            None => commands.entity(entity).despawn_recursive(),
        }
    }

    for model in viewer.models().filter(|model| !seen.contains(&model.qr_code)) {
        let (mesh, material) = assets.model.clone();
        commands.spawn((
            ViewerLink(model.qr_code.clone()),
            Name::new(model.prefab.clone()),
            PbrBundle {
                mesh,
                material,
                transform: model_transform(model),
                visibility: model_visibility(model),
                ..default()
            },
        ));
    }
}
