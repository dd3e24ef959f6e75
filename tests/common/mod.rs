#![allow(dead_code)]

use std::collections::HashMap;

use bevy::math::{Vec2, Vec3};
use garden_ar::config::GameSettings;
use garden_ar::host::{
    FlatGround, Host, InputAxis, ModelCard, Panel, Pose, PoseSource, Popup, ResultsView, UiSink,
};
use garden_ar::store::MemoryStore;

/// A joystick held at a fixed value.
#[derive(Default)]
pub struct Stick {
    pub id: u32,
    pub value: Vec2,
}

impl InputAxis for Stick {
    fn axis(&self, id: u32) -> Vec2 {
        if id == self.id {
            self.value
        } else {
            Vec2::ZERO
        }
    }
}

/// Remembers the last thing the controller told each widget.
#[derive(Default, Debug)]
pub struct RecordingUi {
    pub score: String,
    pub timer: String,
    pub remaining: String,
    pub panels: HashMap<Panel, bool>,
    pub popups: Vec<Popup>,
    pub popup_open: bool,
    pub results: Option<ResultsView>,
    pub card: Option<ModelCard>,
}

impl RecordingUi {
    pub fn is_shown(&self, panel: Panel) -> bool {
        self.panels.get(&panel).copied().unwrap_or(false)
    }
}

impl UiSink for RecordingUi {
    fn set_score_text(&mut self, text: &str) {
        self.score = text.to_owned();
    }

    fn set_timer_text(&mut self, text: &str) {
        self.timer = text.to_owned();
    }

    fn set_remaining_text(&mut self, text: &str) {
        self.remaining = text.to_owned();
    }

    fn show_panel(&mut self, panel: Panel, visible: bool) {
        self.panels.insert(panel, visible);
    }

    fn show_popup(&mut self, popup: Popup) {
        self.popups.push(popup);
        self.popup_open = true;
    }

    fn dismiss_popups(&mut self) {
        self.popup_open = false;
    }

    fn show_results(&mut self, results: &ResultsView) {
        self.results = Some(results.clone());
    }

    fn show_model_card(&mut self, card: Option<&ModelCard>) {
        self.card = card.cloned();
    }
}

/// Collaborators for driving the controller without Bevy.
pub struct Fixture {
    pub pose: Option<Pose>,
    pub ground: FlatGround,
    pub stick: Stick,
    pub ui: RecordingUi,
    pub store: MemoryStore,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            pose: Some(Pose::new(Vec3::new(0.0, 1.5, 0.0), Vec3::NEG_Z)),
            ground: FlatGround::at(0.0),
            stick: Stick {
                id: 1,
                value: Vec2::ZERO,
            },
            ui: RecordingUi::default(),
            store: MemoryStore::default(),
        }
    }

    pub fn host(&mut self) -> Host<'_> {
        Host {
            pose: self.pose.as_ref().map(|pose| pose as &dyn PoseSource),
            ground: &self.ground,
            input: &self.stick,
            ui: &mut self.ui,
            store: &mut self.store,
        }
    }
}

pub fn seeded_settings(seed: u64) -> GameSettings {
    GameSettings {
        seed: Some(seed),
        ..GameSettings::default()
    }
}

pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    Vec2::new(a.x - b.x, a.z - b.z).length()
}
