//! Application entry point: configures the window, loads settings and hands over to
//! `GardenQuestPlugin`.

use bevy::prelude::*;
use bevy::window::{Window, WindowResizeConstraints, WindowResolution};

use garden_ar::config::{SettingsPlugin, SETTINGS_PATH};
use garden_ar::GardenQuestPlugin;

fn main() {
    let primary_window = Window {
        title: "Garden AR".to_string(),
        resolution: WindowResolution::new(1280.0, 720.0),
        resizable: true,
        resize_constraints: WindowResizeConstraints {
            min_width: 640.0,
            min_height: 360.0,
            max_width: f32::INFINITY,
            max_height: f32::INFINITY,
        },
        ..default()
    };

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.55, 0.7, 0.85)))
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(primary_window),
            ..default()
        }))
        // Settings must exist before the controller is built from them.
        .add_plugins(SettingsPlugin::new(SETTINGS_PATH))
        .add_plugins(GardenQuestPlugin)
        .run();
}
