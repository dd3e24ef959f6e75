//! Sound cues for collection and completion. Handles are loaded once and kept in `AudioHandles`.

use bevy::prelude::*;

use crate::controller::ControllerEvent;
use crate::mode::ModeEvent;
use crate::state::GameSet;

pub const FOUND_CUE: &str = "audio/found.wav";
pub const COMPLETE_CUE: &str = "audio/complete.wav";

pub struct GameAudioPlugin;

impl Plugin for GameAudioPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AudioHandles>()
            .add_systems(Startup, load_audio_handles)
            .add_systems(Update, play_mode_cues.in_set(GameSet::Presentation));
    }
}

#[derive(Resource, Default)]
pub struct AudioHandles {
    pub found: Option<Handle<AudioSource>>,
    pub complete: Option<Handle<AudioSource>>,
}

fn load_audio_handles(asset_server: Res<AssetServer>, mut handles: ResMut<AudioHandles>) {
    handles.found = Some(asset_server.load(FOUND_CUE));
    handles.complete = Some(asset_server.load(COMPLETE_CUE));
    debug!("Queued audio cues {FOUND_CUE} and {COMPLETE_CUE}");
}

fn play_mode_cues(mut commands: Commands, mut events: EventReader<ModeEvent>, handles: Res<AudioHandles>) {
    for ModeEvent(event) in events.read() {
        let cue = match event {
            ControllerEvent::Collected { .. } => handles.found.clone(),
            ControllerEvent::SessionCompleted { .. } => handles.complete.clone(),
            _ => None,
        };
        if let Some(source) = cue {
            commands.spawn(AudioBundle {
                source,
                settings: PlaybackSettings::DESPAWN,
            });
        }
    }
}
