//! Bevy side of the mode controller. Requests arrive as events, the controller runs inside a
//! single exclusive borrow of its collaborators, and whatever it reports goes back out as
//! `ModeEvent`s. `State<GameMode>` follows the controller so other plugins can use
//! `OnEnter`/`OnExit`.

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::camera::CameraPose;
use crate::config::GameSettings;
use crate::controller::{ControllerEvent, GameModeController};
use crate::entity::EntityId;
use crate::host::{Host, PoseSource};
use crate::input::JoystickAxes;
use crate::state::{GameMode, GameSet};
use crate::store::RonFileStore;
use crate::ui::{flush_hud, HudState};
use crate::world::DetectedGround;

pub const RECORDS_PATH: &str = "records.ron";

pub struct ModePlugin;

impl Plugin for ModePlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<RonFileStore>() {
            app.insert_resource(RonFileStore::open_or_empty(RECORDS_PATH));
        }

        app.init_state::<GameMode>()
            .init_resource::<GameSettings>()
            .init_resource::<GameModeController>()
            .init_resource::<HudState>()
            .init_resource::<CameraPose>()
            .init_resource::<DetectedGround>()
            .init_resource::<JoystickAxes>()
            .add_event::<ModeRequest>()
            .add_event::<TapRequest>()
            .add_event::<ModeEvent>()
            .add_systems(
                Update,
                (apply_mode_requests, advance_controller, publish_controller_events)
                    .chain()
                    .in_set(GameSet::Modes),
            );
    }
}

/// Something asked for a different mode.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    Enter(GameMode),
    /// Back to the menu without touching records.
    Cancel,
    /// Finish the session, check records and show results.
    Complete,
}

/// The player tapped a pooled entity.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct TapRequest(pub EntityId);

#[derive(Event, Debug, Clone, PartialEq)]
pub struct ModeEvent(pub ControllerEvent);

impl FromWorld for GameModeController {
    fn from_world(world: &mut World) -> Self {
        let settings = world
            .get_resource::<GameSettings>()
            .cloned()
            .unwrap_or_default();
        GameModeController::new(settings)
    }
}

/// Every collaborator the controller needs, borrowed for one system run.
#[derive(SystemParam)]
pub struct HostParams<'w> {
    pose: Res<'w, CameraPose>,
    ground: Res<'w, DetectedGround>,
    input: Res<'w, JoystickAxes>,
    ui: ResMut<'w, HudState>,
    store: ResMut<'w, RonFileStore>,
}

impl HostParams<'_> {
    /// Borrows the HUD without change detection; call `flush_ui` once the host is dropped.
    pub fn host(&mut self) -> Host<'_> {
        Host {
            pose: self.pose.0.as_ref().map(|pose| pose as &dyn PoseSource),
            ground: &*self.ground,
            input: &*self.input,
            ui: self.ui.bypass_change_detection(),
            store: &mut *self.store,
        }
    }

    /// Marks `HudState` changed only if the controller wrote something new to it.
    pub fn flush_ui(&mut self) {
        flush_hud(&mut self.ui);
    }
}

pub(crate) fn apply_mode_requests(
    mut requests: EventReader<ModeRequest>,
    mut taps: EventReader<TapRequest>,
    mut controller: ResMut<GameModeController>,
    mut params: HostParams,
) {
    if requests.is_empty() && taps.is_empty() {
        return;
    }
    let mut host = params.host();

    for request in requests.read() {
        let result = match *request {
            ModeRequest::Enter(mode) => controller.request_mode(mode, &mut host),
            ModeRequest::Cancel => controller.cancel_current_mode(&mut host),
            ModeRequest::Complete => controller.complete_current_mode(&mut host).map(|_| ()),
        };
        if let Err(err) = result {
            warn!("{err}");
        }
    }

    for TapRequest(id) in taps.read() {
        controller.tap(*id, &mut host);
    }
    params.flush_ui();
}

fn advance_controller(
    time: Res<Time>,
    mut controller: ResMut<GameModeController>,
    mut params: HostParams,
) {
    controller.advance(time.delta_seconds(), &mut params.host());
    params.flush_ui();
}

fn publish_controller_events(
    mut controller: ResMut<GameModeController>,
    mut events: EventWriter<ModeEvent>,
    mut next_mode: ResMut<NextState<GameMode>>,
) {
    for event in controller.drain_events() {
        if let ControllerEvent::ModeChanged { to, .. } = event {
            next_mode.set(to);
        }
        events.send(ModeEvent(event));
    }
}
