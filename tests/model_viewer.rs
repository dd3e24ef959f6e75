mod common;

use std::collections::HashMap;

use bevy::math::{Quat, Vec2, Vec3};
use common::RecordingUi;
use garden_ar::config::{ModelInfo, ModelPart, ViewerSettings};
use garden_ar::host::{ImageChanges, Panel, TrackedImage, TrackedImageSource, TrackingState};
use garden_ar::viewer::ModelViewer;

const FRAME: f32 = 0.1;

/// Marker tracking the test drives by hand.
#[derive(Default)]
struct ScriptedImages {
    states: HashMap<String, TrackingState>,
    pending: ImageChanges,
    scanning: bool,
    resets: u32,
}

fn image(name: &str, position: Vec3, state: TrackingState) -> TrackedImage {
    TrackedImage {
        name: name.to_owned(),
        position,
        rotation: Quat::IDENTITY,
        state,
    }
}

impl ScriptedImages {
    fn show(&mut self, name: &str, position: Vec3) {
        let tracked = image(name, position, TrackingState::Tracking);
        if !self.states.contains_key(name) {
            self.pending.added.push(tracked.clone());
        }
        self.states.insert(name.to_owned(), TrackingState::Tracking);
        self.pending.updated.push(tracked);
    }

    fn lose(&mut self, name: &str) {
        self.states.insert(name.to_owned(), TrackingState::Limited);
        self.pending
            .updated
            .push(image(name, Vec3::ZERO, TrackingState::Limited));
    }

    fn remove(&mut self, name: &str) {
        self.states.remove(name);
        self.pending.removed.push(name.to_owned());
    }
}

impl TrackedImageSource for ScriptedImages {
    fn take_changes(&mut self) -> ImageChanges {
        std::mem::take(&mut self.pending)
    }

    fn tracking_state(&self, name: &str) -> TrackingState {
        self.states.get(name).copied().unwrap_or(TrackingState::None)
    }

    fn set_scanning(&mut self, enabled: bool) {
        self.scanning = enabled;
    }

    fn reset_session(&mut self) {
        self.resets += 1;
        self.states.clear();
        self.pending = ImageChanges::default();
    }
}

fn settings() -> ViewerSettings {
    ViewerSettings {
        models: vec![
            ModelInfo {
                qr_code: "orchid".to_owned(),
                prefab: "OrchidModel".to_owned(),
                display_name: "Orchid".to_owned(),
                general_info: "A flowering plant.".to_owned(),
                initial_scale: 0.1,
                initial_rotation: Vec3::new(0.0, 90.0, 0.0),
                parts: vec![
                    ModelPart {
                        name: "Petal".to_owned(),
                        info: "Attracts pollinators.".to_owned(),
                    },
                    ModelPart {
                        name: "Root".to_owned(),
                        info: "Absorbs moisture.".to_owned(),
                    },
                ],
            },
            ModelInfo {
                qr_code: "toucan".to_owned(),
                prefab: "ToucanModel".to_owned(),
                display_name: "Toucan".to_owned(),
                general_info: "A fruit-eating bird.".to_owned(),
                initial_scale: 0.2,
                initial_rotation: Vec3::ZERO,
                parts: Vec::new(),
            },
        ],
        ..ViewerSettings::default()
    }
}

fn opened() -> (ModelViewer, ScriptedImages, RecordingUi) {
    let mut viewer = ModelViewer::new(settings());
    let mut images = ScriptedImages::default();
    let mut ui = RecordingUi::default();
    viewer.open(&mut images, &mut ui);
    (viewer, images, ui)
}

fn current_code(viewer: &ModelViewer) -> Option<&str> {
    viewer.current().map(|model| model.qr_code.as_str())
}

#[test]
fn recognised_marker_shows_its_model_and_card() {
    let (mut viewer, mut images, mut ui) = opened();
    assert!(viewer.is_scanning());
    assert!(images.scanning);
    assert_eq!(images.resets, 1);
    assert!(!ui.is_shown(Panel::Menu));
    assert!(ui.is_shown(Panel::ModelInfo));
    assert!(ui.is_shown(Panel::BackButton));

    let spot = Vec3::new(0.5, 0.0, -1.0);
    images.show("orchid", spot);
    images.show("unregistered", Vec3::ZERO);
    viewer.update(FRAME, &mut images, &mut ui);

    let orchid = viewer.model("orchid").unwrap();
    assert_eq!(orchid.position, spot);
    assert_eq!(orchid.scale, 0.1);
    assert!(orchid.visible);
    assert!(orchid.rotation.angle_between(Quat::from_rotation_y(90f32.to_radians())) < 1e-4);
    assert!(viewer.model("unregistered").is_none());
    assert_eq!(current_code(&viewer), Some("orchid"));

    let card = ui.card.clone().unwrap();
    assert_eq!(card.title, "Orchid");
    assert_eq!(card.info, "A flowering plant.");
    assert_eq!(card.parts, vec!["Petal", "Root"]);
    assert_eq!(card.highlighted, None);
}

#[test]
fn model_hides_after_tracking_timeout() {
    let (mut viewer, mut images, mut ui) = opened();
    images.show("orchid", Vec3::ZERO);
    viewer.update(FRAME, &mut images, &mut ui);

    images.lose("orchid");
    for _ in 0..14 {
        viewer.update(FRAME, &mut images, &mut ui);
    }
    assert!(viewer.model("orchid").unwrap().visible, "1.4s is inside the timeout");
    assert_eq!(current_code(&viewer), Some("orchid"));

    viewer.update(0.2, &mut images, &mut ui);
    assert!(!viewer.model("orchid").unwrap().visible);
    assert_eq!(current_code(&viewer), None);
    assert_eq!(ui.card, None);

    images.show("orchid", Vec3::ZERO);
    viewer.update(FRAME, &mut images, &mut ui);
    assert!(viewer.model("orchid").unwrap().visible);
    assert_eq!(ui.card.as_ref().map(|card| card.title.as_str()), Some("Orchid"));
}

#[test]
fn each_model_times_out_on_its_own() {
    let (mut viewer, mut images, mut ui) = opened();
    images.show("orchid", Vec3::ZERO);
    images.show("toucan", Vec3::X);
    viewer.update(FRAME, &mut images, &mut ui);

    images.lose("orchid");
    for _ in 0..20 {
        images.show("toucan", Vec3::X);
        viewer.update(FRAME, &mut images, &mut ui);
    }

    assert!(!viewer.model("orchid").unwrap().visible);
    assert!(viewer.model("toucan").unwrap().visible);
    assert_eq!(current_code(&viewer), Some("toucan"));
}

#[test]
fn part_selection_swaps_the_info_text() {
    let mut closed = ModelViewer::new(settings());
    assert!(!closed.select_part(0, &mut RecordingUi::default()));

    let (mut viewer, mut images, mut ui) = opened();
    images.show("orchid", Vec3::ZERO);
    viewer.update(FRAME, &mut images, &mut ui);

    assert!(viewer.select_part(1, &mut ui));
    let card = ui.card.clone().unwrap();
    assert_eq!(card.info, "Absorbs moisture.");
    assert_eq!(card.highlighted, Some(1));

    assert!(!viewer.select_part(5, &mut ui));
    assert_eq!(viewer.selected_part(), Some(1));

    viewer.reset_part_selection(&mut ui);
    let card = ui.card.clone().unwrap();
    assert_eq!(card.info, "A flowering plant.");
    assert_eq!(card.highlighted, None);

    // A different model in view starts without a selection.
    viewer.select_part(0, &mut ui);
    images.show("toucan", Vec3::X);
    viewer.update(FRAME, &mut images, &mut ui);
    assert_eq!(current_code(&viewer), Some("toucan"));
    assert_eq!(viewer.selected_part(), None);
    let card = ui.card.clone().unwrap();
    assert_eq!(card.title, "Toucan");
    assert!(card.parts.is_empty());
    assert!(!viewer.select_part(0, &mut ui));
}

#[test]
fn manual_rotation_and_scale_survive_marker_updates() {
    let (mut viewer, mut images, mut ui) = opened();
    let first = Vec3::new(0.0, 0.0, -1.0);
    let moved = Vec3::new(0.3, 0.0, -1.2);
    images.show("orchid", first);
    viewer.update(FRAME, &mut images, &mut ui);

    assert!(viewer.begin_manipulation());
    // 180 px left at 0.5 deg/px turns another 90 degrees about the model's up axis.
    viewer.rotate(Vec2::new(-180.0, 0.0));
    images.show("orchid", moved);
    viewer.update(FRAME, &mut images, &mut ui);
    assert_eq!(viewer.model("orchid").unwrap().position, first, "held models ignore the marker");

    viewer.end_manipulation();
    images.show("orchid", moved);
    viewer.update(FRAME, &mut images, &mut ui);
    let orchid = viewer.model("orchid").unwrap();
    assert_eq!(orchid.position, moved);
    assert!(orchid.rotation.angle_between(Quat::from_rotation_y(180f32.to_radians())) < 1e-3);

    viewer.spread(1000.0);
    assert!((viewer.model("orchid").unwrap().scale - 0.2).abs() < 1e-6);
    viewer.spread(-90.0);
    assert!((viewer.model("orchid").unwrap().scale - 0.05).abs() < 1e-6);

    viewer.pinch(100.0);
    assert!((viewer.model("orchid").unwrap().scale - 0.05).abs() < 1e-6, "pinch needs a grab");
    viewer.begin_manipulation();
    viewer.pinch(100.0);
    viewer.pinch(150.0);
    assert!((viewer.model("orchid").unwrap().scale - 0.075).abs() < 1e-6);
}

#[test]
fn closing_clears_models_and_resets_the_session_next_frame() {
    let (mut viewer, mut images, mut ui) = opened();
    images.show("orchid", Vec3::ZERO);
    viewer.update(FRAME, &mut images, &mut ui);
    viewer.spread(50.0);

    viewer.close(&mut images, &mut ui);
    assert!(!viewer.is_scanning());
    assert!(!images.scanning);
    assert_eq!(viewer.models().count(), 0);
    assert_eq!(current_code(&viewer), None);
    assert_eq!(ui.card, None);
    assert!(ui.is_shown(Panel::Menu));
    assert!(!ui.is_shown(Panel::ModelInfo));
    assert!(!ui.is_shown(Panel::BackButton));
    assert_eq!(images.resets, 1);

    viewer.update(FRAME, &mut images, &mut ui);
    assert_eq!(images.resets, 2);

    images.show("orchid", Vec3::ZERO);
    viewer.update(FRAME, &mut images, &mut ui);
    assert_eq!(viewer.models().count(), 0, "closed viewers ignore markers");

    viewer.open(&mut images, &mut ui);
    assert_eq!(images.resets, 3);
    images.show("orchid", Vec3::ZERO);
    viewer.update(FRAME, &mut images, &mut ui);
    assert_eq!(viewer.model("orchid").unwrap().scale, 0.1);
}

#[test]
fn removed_marker_drops_its_model() {
    let (mut viewer, mut images, mut ui) = opened();
    images.show("orchid", Vec3::ZERO);
    viewer.update(FRAME, &mut images, &mut ui);

    images.remove("orchid");
    viewer.update(FRAME, &mut images, &mut ui);

    assert!(viewer.model("orchid").is_none());
    assert_eq!(current_code(&viewer), None);
    assert_eq!(ui.card, None);
}
