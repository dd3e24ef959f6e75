use std::fs;
use std::path::{Path, PathBuf};

use bevy::log::{error, info};
use bevy::math::{Vec2, Vec3};
use bevy::prelude::{App, Plugin, Resource};
use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::error::ConfigError;
use crate::float::FloatOverrides;
use crate::placement::PlacementConstraint;

pub const SETTINGS_PATH: &str = "assets/game_settings.ron";

/// Inserts `GameSettings` read from `path` unless the app already has them. Added after the log
/// plugin so a broken file is reported.
pub struct SettingsPlugin {
    pub path: PathBuf,
}

impl SettingsPlugin {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl Plugin for SettingsPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<GameSettings>() {
            app.insert_resource(GameSettings::load_or_default(&self.path));
        }
    }
}

/// Static configuration loaded once at startup. Missing fields take their defaults, so a settings
/// file only needs to list what it changes.
#[derive(Resource, Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
#[serde(default)]
pub struct GameSettings {
    pub object_search: ObjectSearchSettings,
    pub platform: PlatformSettings,
    pub movement: MovementSettings,
    pub viewer: ViewerSettings,
    /// Fixed RNG seed for reproducible placement. Entropy when unset.
    pub seed: Option<u64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ObjectSearchSettings {
    pub objects_to_spawn: u32,
    pub spawn_radius: f32,
    pub min_separation: f32,
    pub max_attempts: u32,
    pub item_value: u32,
    /// Seconds between timer text refreshes.
    pub timer_refresh_interval: f32,
    pub float_speed: f32,
    pub float_height: f32,
    pub catalog: Vec<PrefabSettings>,
}

/// One spawnable model. The kind is declared here, never guessed from the name.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct PrefabSettings {
    pub name: String,
    pub kind: EntityKind,
    #[serde(default)]
    pub float: FloatOverrides,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct PlatformSettings {
    pub map_prefab: Option<String>,
    pub player_prefab: Option<String>,
    pub banana_prefab: Option<String>,
    pub joystick_id: u32,
    pub placement_distance: f32,
    pub placement_height: f32,
    /// Euler angles in degrees.
    pub map_rotation: Vec3,
    pub map_bounds: Vec2,
    pub player_spawn_offset: Vec3,
    pub total_bananas: u32,
    pub banana_offsets: Vec<Vec3>,
    pub banana_value: u32,
    /// Horizontal reach for banana pickup.
    pub pickup_radius: f32,
    /// Vertical reach above the player's feet for banana pickup.
    pub player_height: f32,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MovementSettings {
    pub move_speed: f32,
    pub gravity: f32,
    /// Vertical speed held while standing, keeps the mover pressed onto the ground.
    pub grounded_velocity: f32,
    pub turn_rate: f32,
    /// Extra reach below the feet that still counts as standing.
    pub ground_probe_slack: f32,
}

/// The marker-triggered model viewer.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ViewerSettings {
    /// Seconds a model stays visible after its marker stops tracking.
    pub tracking_timeout: f32,
    /// Degrees of rotation per pixel dragged.
    pub rotation_speed: f32,
    /// Scale change per pixel of pinch spread.
    pub scale_speed: f32,
    /// Scale limits as multiples of the model's initial scale.
    pub min_scale: f32,
    pub max_scale: f32,
    /// Part buttons available on the info panel.
    pub part_buttons: usize,
    pub models: Vec<ModelInfo>,
    /// Where the desktop build pretends printed markers are.
    pub markers: Vec<MarkerPlacement>,
    /// Distance at which the desktop build starts tracking a marker.
    pub marker_range: f32,
}

/// A model shown when the marker named `qr_code` is recognised.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ModelInfo {
    pub qr_code: String,
    pub prefab: String,
    pub display_name: String,
    #[serde(default)]
    pub general_info: String,
    #[serde(default = "default_model_scale")]
    pub initial_scale: f32,
    /// Euler angles in degrees.
    #[serde(default)]
    pub initial_rotation: Vec3,
    #[serde(default)]
    pub parts: Vec<ModelPart>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ModelPart {
    pub name: String,
    pub info: String,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct MarkerPlacement {
    pub qr_code: String,
    pub position: Vec3,
}

fn default_model_scale() -> f32 {
    0.1
}

impl Default for ObjectSearchSettings {
    fn default() -> Self {
        Self {
            objects_to_spawn: 5,
            spawn_radius: 2.0,
            min_separation: 1.0,
            max_attempts: 50,
            item_value: 10,
            timer_refresh_interval: 0.1,
            float_speed: 0.5,
            float_height: 0.1,
            catalog: vec![
                PrefabSettings::collectible("Toucan"),
                PrefabSettings::collectible("Hummingbird"),
                PrefabSettings {
                    name: "Orchid".to_owned(),
                    kind: EntityKind::CollectibleObject,
                    float: FloatOverrides {
                        height: Some(0.05),
                        rotation_speed: Some(45.0),
                        ..FloatOverrides::default()
                    },
                },
                PrefabSettings {
                    name: "Banana".to_owned(),
                    kind: EntityKind::Banana,
                    float: FloatOverrides::default(),
                },
            ],
        }
    }
}

impl Default for PlatformSettings {
    fn default() -> Self {
        Self {
            map_prefab: Some("JungleMap".to_owned()),
            player_prefab: Some("Monkey".to_owned()),
            banana_prefab: Some("Banana".to_owned()),
            joystick_id: 1,
            placement_distance: 1.0,
            placement_height: -0.5,
            map_rotation: Vec3::ZERO,
            map_bounds: Vec2::new(4.0, 4.0),
            player_spawn_offset: Vec3::new(0.0, 0.5, 0.0),
            total_bananas: 3,
            banana_offsets: vec![
                Vec3::new(-1.5, 0.5, -1.5),
                Vec3::new(1.5, 0.5, -1.5),
                Vec3::new(0.0, 0.5, 1.5),
            ],
            banana_value: 1,
            pickup_radius: 0.3,
            player_height: 1.8,
        }
    }
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            tracking_timeout: 1.5,
            rotation_speed: 0.5,
            scale_speed: 0.01,
            min_scale: 0.5,
            max_scale: 2.0,
            part_buttons: 4,
            models: vec![ModelInfo {
                qr_code: "orchid_marker".to_owned(),
                prefab: "OrchidModel".to_owned(),
                display_name: "Orchid".to_owned(),
                general_info: "Epiphytic flowering plant.".to_owned(),
                initial_scale: default_model_scale(),
                initial_rotation: Vec3::ZERO,
                parts: vec![
                    ModelPart {
                        name: "Petal".to_owned(),
                        info: "Attracts pollinators.".to_owned(),
                    },
                    ModelPart {
                        name: "Root".to_owned(),
                        info: "Aerial roots absorb moisture from the air.".to_owned(),
                    },
                ],
            }],
            markers: vec![MarkerPlacement {
                qr_code: "orchid_marker".to_owned(),
                position: Vec3::new(0.0, 0.0, -1.5),
            }],
            marker_range: 3.0,
        }
    }
}

impl Default for MovementSettings {
    fn default() -> Self {
        Self {
            move_speed: 3.0,
            gravity: -9.81,
            grounded_velocity: -2.0,
            turn_rate: 10.0,
            ground_probe_slack: 0.2,
        }
    }
}

impl PrefabSettings {
    pub fn collectible(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            kind: EntityKind::CollectibleObject,
            float: FloatOverrides::default(),
        }
    }
}

impl ObjectSearchSettings {
    pub fn placement(&self) -> PlacementConstraint {
        PlacementConstraint {
            spawn_radius: self.spawn_radius,
            min_separation: self.min_separation,
            max_attempts: self.max_attempts,
        }
    }

    /// Catalog entries allowed in the object search. Bananas are filtered by kind.
    pub fn collectible_prefabs(&self) -> Vec<&PrefabSettings> {
        self.catalog
            .iter()
            .filter(|prefab| prefab.kind == EntityKind::CollectibleObject)
            .collect()
    }
}

impl PlatformSettings {
    /// Bananas actually spawned: the configured total, capped by the available offsets.
    pub fn banana_count(&self) -> u32 {
        self.total_bananas.min(self.banana_offsets.len() as u32)
    }
}

impl GameSettings {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ron::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(settings) => {
                info!("Loaded game settings from {}", path.display());
                settings
            }
            Err(err) => {
                error!("{err}");
                error!("Using default GameSettings");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_keep_defaults() {
        let settings: GameSettings = ron::from_str(
            "(object_search: (objects_to_spawn: 8), platform: (map_prefab: None), seed: Some(9))",
        )
        .unwrap();

        assert_eq!(settings.object_search.objects_to_spawn, 8);
        assert_eq!(settings.object_search.spawn_radius, 2.0);
        assert_eq!(settings.platform.map_prefab, None);
        assert_eq!(settings.platform.total_bananas, 3);
        assert_eq!(settings.seed, Some(9));
    }

    #[test]
    fn catalog_filters_bananas_by_kind() {
        let settings = ObjectSearchSettings::default();
        let names: Vec<_> = settings
            .collectible_prefabs()
            .into_iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["Toucan", "Hummingbird", "Orchid"]);
    }

    #[test]
    fn banana_count_is_capped_by_offsets() {
        let platform = PlatformSettings {
            total_bananas: 10,
            ..PlatformSettings::default()
        };
        assert_eq!(platform.banana_count(), 3);
    }

    #[test]
    fn shipped_settings_parse() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/assets/game_settings.ron");
        let settings = GameSettings::load(path).unwrap();
        assert_eq!(settings.object_search.catalog.len(), 4);
        assert_eq!(settings.platform.banana_offsets.len(), 3);
        assert_eq!(settings.viewer.models.len(), 2);
        assert_eq!(settings.viewer.markers.len(), 2);
        assert_eq!(settings.seed, None);
    }

    #[test]
    fn model_entries_default_their_scale_and_parts() {
        let settings: ViewerSettings = ron::from_str(
            r#"(models: [(qr_code: "fern", prefab: "FernModel", display_name: "Fern")])"#,
        )
        .unwrap();

        let fern = &settings.models[0];
        assert_eq!(fern.initial_scale, 0.1);
        assert!(fern.parts.is_empty());
        assert_eq!(settings.tracking_timeout, 1.5);
        assert_eq!(settings.markers.len(), 1, "unlisted fields keep their defaults");
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let err = GameSettings::load("does/not/exist.ron").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
