//! Bevy side of the model viewer. `ViewerRequest`s drive `ModelViewer`, and `SimulatedMarkers`
//! stands in for image tracking: a marker is tracked while the camera is close to it and facing
//! it.

use bevy::prelude::*;
use bevy::utils::HashMap;

use crate::camera::CameraPose;
use crate::config::{GameSettings, MarkerPlacement};
use crate::controller::GameModeController;
use crate::host::{ImageChanges, Pose, TrackedImage, TrackedImageSource, TrackingState};
use crate::mode::{apply_mode_requests, ModeRequest};
use crate::state::{GameMode, GameSet};
use crate::ui::{flush_hud, HudState};
use crate::viewer::ModelViewer;

/// Cosine of the half-angle within which the camera sees a marker.
const VIEW_CONE_COS: f32 = 0.8;

pub struct ViewerPlugin;

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<GameSettings>()
            .init_resource::<HudState>()
            .init_resource::<CameraPose>()
            .init_resource::<ModelViewer>()
            .init_resource::<SimulatedMarkers>()
            .add_event::<ViewerRequest>()
            .add_event::<ModeRequest>()
            .add_systems(
                Update,
                (apply_viewer_requests, observe_markers, advance_viewer)
                    .chain()
                    .in_set(GameSet::Modes)
                    .before(apply_mode_requests),
            );
    }
}

#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub enum ViewerRequest {
    Open,
    Close,
    SelectPart(usize),
    ClearPart,
    /// Start of a drag or pinch on the model in view.
    Grab,
    /// Drag by this many pixels, y up.
    Drag(Vec2),
    /// Pinch spread in pixels; negative pinches in.
    Spread(f32),
    Release,
}

impl FromWorld for ModelViewer {
    fn from_world(world: &mut World) -> Self {
        let settings = world
            .get_resource::<GameSettings>()
            .map(|settings| settings.viewer.clone())
            .unwrap_or_default();
        ModelViewer::new(settings)
    }
}

/// Desktop marker tracking. Queues the same added/updated changes an AR session reports.
#[derive(Resource, Debug)]
pub struct SimulatedMarkers {
    placements: Vec<MarkerPlacement>,
    scanning: bool,
    known: HashMap<String, TrackingState>,
    pending: ImageChanges,
}

impl FromWorld for SimulatedMarkers {
    fn from_world(world: &mut World) -> Self {
        let placements = world
            .get_resource::<GameSettings>()
            .map(|settings| settings.viewer.markers.clone())
            .unwrap_or_default();
        SimulatedMarkers::new(placements)
    }
}

impl SimulatedMarkers {
    pub fn new(placements: Vec<MarkerPlacement>) -> Self {
        Self {
            placements,
            scanning: false,
            known: HashMap::default(),
            pending: ImageChanges::default(),
        }
    }

    pub fn placements(&self) -> &[MarkerPlacement] {
        &self.placements
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Compares what the camera sees now with what was tracked before and queues the difference.
    pub fn observe(&mut self, pose: Option<Pose>, range: f32) {
        if !self.scanning {
            return;
        }
        for marker in &self.placements {
            let seen = pose.is_some_and(|pose| sees(&pose, marker.position, range));
            let image = |state| TrackedImage {
                name: marker.qr_code.clone(),
                position: marker.position,
                rotation: Quat::IDENTITY,
                state,
            };

            match (seen, self.known.get(&marker.qr_code).copied()) {
                (true, previous) => {
                    if previous.is_none() {
                        self.pending.added.push(image(TrackingState::Tracking));
                    }
                    self.known.insert(marker.qr_code.clone(), TrackingState::Tracking);
                    self.pending.updated.push(image(TrackingState::Tracking));
                }
                (false, Some(TrackingState::Tracking)) => {
                    self.known.insert(marker.qr_code.clone(), TrackingState::Limited);
                    self.pending.updated.push(image(TrackingState::Limited));
                }
                _ => {}
            }
        }
    }
}

impl TrackedImageSource for SimulatedMarkers {
    fn take_changes(&mut self) -> ImageChanges {
        std::mem::take(&mut self.pending)
    }

    fn tracking_state(&self, name: &str) -> TrackingState {
        self.known.get(name).copied().unwrap_or(TrackingState::None)
    }

    fn set_scanning(&mut self, enabled: bool) {
        self.scanning = enabled;
        if !enabled {
            self.pending = ImageChanges::default();
        }
    }

    fn reset_session(&mut self) {
        self.known.clear();
        self.pending = ImageChanges::default();
    }
}

fn sees(pose: &Pose, target: Vec3, range: f32) -> bool {
    let offset = target - pose.position;
    let distance = offset.length();
    if distance > range {
        return false;
    }
    distance <= f32::EPSILON || (offset / distance).dot(pose.forward.normalize_or_zero()) >= VIEW_CONE_COS
}

fn apply_viewer_requests(
    mut requests: EventReader<ViewerRequest>,
    mut modes: EventReader<ModeRequest>,
    controller: Option<Res<GameModeController>>,
    mut viewer: ResMut<ModelViewer>,
    mut markers: ResMut<SimulatedMarkers>,
    mut hud: ResMut<HudState>,
) {
    let entering_mode = modes
        .read()
        .any(|request| matches!(request, ModeRequest::Enter(_)));
    if requests.is_empty() && !entering_mode {
        return;
    }

    let viewer = viewer.as_mut();
    let markers = markers.as_mut();
    let ui = hud.bypass_change_detection();

    for request in requests.read() {
        match *request {
            ViewerRequest::Open => {
                let mode = controller.as_ref().map_or(GameMode::Idle, |c| c.current());
                if mode == GameMode::Idle {
                    viewer.open(markers, ui);
                } else {
                    warn!("The model viewer opens from the menu; {:?} is running", mode);
                }
            }
            ViewerRequest::Close => viewer.close(markers, ui),
            ViewerRequest::SelectPart(index) => {
                viewer.select_part(index, ui);
            }
            ViewerRequest::ClearPart => viewer.reset_part_selection(ui),
            ViewerRequest::Grab => {
                viewer.begin_manipulation();
            }
            ViewerRequest::Drag(delta) => viewer.rotate(delta),
            ViewerRequest::Spread(pixels) => viewer.spread(pixels),
            ViewerRequest::Release => viewer.end_manipulation(),
        }
    }

    if entering_mode {
        viewer.close(markers, ui);
    }
    flush_hud(&mut hud);
}

fn observe_markers(
    pose: Res<CameraPose>,
    settings: Res<GameSettings>,
    mut markers: ResMut<SimulatedMarkers>,
) {
    if markers.is_scanning() {
        markers.observe(pose.0, settings.viewer.marker_range);
    }
}

fn advance_viewer(
    time: Res<Time>,
    mut viewer: ResMut<ModelViewer>,
    mut markers: ResMut<SimulatedMarkers>,
    mut hud: ResMut<HudState>,
) {
    viewer.update(
        time.delta_seconds(),
        markers.as_mut(),
        hud.bypass_change_detection(),
    );
    flush_hud(&mut hud);
}
