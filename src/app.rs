//! High-level plugin composition.
//!
//! `GardenQuestPlugin` registers every subsystem and orders the update schedule as
//! input, then the mode controller, then presentation.

use bevy::prelude::*;

use crate::audio::GameAudioPlugin;
use crate::camera::CameraPlugin;
use crate::controller::ControllerEvent;
use crate::input::InputPlugin;
use crate::mode::{ModeEvent, ModePlugin};
use crate::scanning::ViewerPlugin;
use crate::state::GameSet;
use crate::ui::UiPlugin;
use crate::world::WorldPlugin;

pub struct GardenQuestPlugin;

impl Plugin for GardenQuestPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            ModePlugin,      // Controller resource, requests and events.
            ViewerPlugin,    // Marker-triggered model viewer.
            CameraPlugin,    // Tracked camera pose.
            InputPlugin,     // Hotkeys, joystick, taps.
            WorldPlugin,     // Meshes for pooled entities.
            UiPlugin,        // HUD panels.
            GameAudioPlugin, // Collection cues.
        ))
        .configure_sets(
            Update,
            (GameSet::Input, GameSet::Modes, GameSet::Presentation).chain(),
        )
        .add_systems(Update, log_mode_events.in_set(GameSet::Presentation));
    }
}

fn log_mode_events(mut events: EventReader<ModeEvent>) {
    for ModeEvent(event) in events.read() {
        match event {
            ControllerEvent::EntryAborted { mode, reason } => {
                warn!("{} started without all of its content: {reason}", mode.label());
            }
            ControllerEvent::RecordsChecked(outcome) if outcome.new_high_score => {
                info!("New high score: {}", outcome.score);
            }
            other => debug!("{other:?}"),
        }
    }
}
