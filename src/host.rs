//! Contracts for the collaborators the controller and the model viewer consume but do not own: AR
//! tracking, marker tracking, ground raycasts, character movement, joystick input, UI widgets and
//! persisted records.
//!
//! Collaborators are handed to every controller operation through [`Host`], so the controller
//! never looks anything up globally and tests can substitute plain structs.

use bevy::math::{Quat, Vec2, Vec3};

/// Camera placement reported by the AR session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Vec3,
    pub forward: Vec3,
}

impl Pose {
    pub fn new(position: Vec3, forward: Vec3) -> Self {
        Self { position, forward }
    }

    /// Forward projected on the ground plane. Falls back to -Z when looking straight up/down.
    pub fn flat_forward(&self) -> Vec3 {
        Vec3::new(self.forward.x, 0.0, self.forward.z)
            .try_normalize()
            .unwrap_or(Vec3::NEG_Z)
    }

    pub fn flat_right(&self) -> Vec3 {
        self.flat_forward().cross(Vec3::Y).normalize()
    }
}

pub trait PoseSource {
    fn current_camera_pose(&self) -> Pose;
}

pub trait GroundProbe {
    /// Ground hit below (or around) `position`, if any surface is known there.
    fn probe_ground(&self, position: Vec3) -> Option<Vec3>;
}

/// Kinematic movement primitive. Implementations never simulate forces.
pub trait CharacterMover {
    /// Applies `displacement` and returns the resulting position.
    fn move_by(&mut self, displacement: Vec3) -> Vec3;
    fn position(&self) -> Vec3;
    fn enable(&mut self);
    fn disable(&mut self);
    fn is_enabled(&self) -> bool;
    /// Drops any accumulated motion state and disables the mover.
    fn reset(&mut self);
}

pub trait InputAxis {
    /// Axis value of joystick `id`, each component in [-1, 1]; zero while the stick is idle.
    fn axis(&self, id: u32) -> Vec2;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Menu,
    GameHud,
    Results,
    Joystick,
    ModelInfo,
    BackButton,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Popup {
    CollectionComplete,
}

/// Pre-formatted end-of-session numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultsView {
    pub score: String,
    pub high_score: String,
    pub time: String,
    pub best_time: String,
}

/// Info panel contents for the model in view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelCard {
    pub title: String,
    /// Selected part's text, or the model's general info.
    pub info: String,
    /// One label per part button.
    pub parts: Vec<String>,
    pub highlighted: Option<usize>,
}

pub trait UiSink {
    fn set_score_text(&mut self, text: &str);
    fn set_timer_text(&mut self, text: &str);
    fn set_remaining_text(&mut self, text: &str);
    fn show_panel(&mut self, panel: Panel, visible: bool);
    fn show_popup(&mut self, popup: Popup);
    fn dismiss_popups(&mut self);
    fn show_results(&mut self, results: &ResultsView);
    /// `None` clears the title, the info text and every part button.
    fn show_model_card(&mut self, card: Option<&ModelCard>);
}

pub trait PersistentStore {
    fn get_int(&self, key: &str) -> Option<i32>;
    fn set_int(&mut self, key: &str, value: i32);
    fn get_float(&self, key: &str) -> Option<f32>;
    fn set_float(&mut self, key: &str, value: f32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Tracking,
    /// Known but not currently seen.
    Limited,
    None,
}

/// A recognised marker as reported by the AR session.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedImage {
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub state: TrackingState,
}

/// Marker changes since the previous poll.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageChanges {
    pub added: Vec<TrackedImage>,
    pub updated: Vec<TrackedImage>,
    pub removed: Vec<String>,
}

impl ImageChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Marker recognition. Implementations decide what is seen; the viewer only reacts.
pub trait TrackedImageSource {
    /// Drains the changes queued since the last call.
    fn take_changes(&mut self) -> ImageChanges;
    fn tracking_state(&self, name: &str) -> TrackingState;
    fn set_scanning(&mut self, enabled: bool);
    /// Forgets every trackable and restarts recognition.
    fn reset_session(&mut self);
}

/// Borrowed collaborators for a single controller call.
pub struct Host<'a> {
    /// `None` while AR tracking is unavailable.
    pub pose: Option<&'a dyn PoseSource>,
    pub ground: &'a dyn GroundProbe,
    pub input: &'a dyn InputAxis,
    pub ui: &'a mut dyn UiSink,
    pub store: &'a mut dyn PersistentStore,
}

impl Host<'_> {
    pub fn camera_pose(&self) -> Option<Pose> {
        self.pose.map(|source| source.current_camera_pose())
    }
}

/// Horizontal plane at a fixed height, or no ground at all.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FlatGround {
    pub height: Option<f32>,
}

impl FlatGround {
    pub fn at(height: f32) -> Self {
        Self {
            height: Some(height),
        }
    }
}

impl GroundProbe for FlatGround {
    fn probe_ground(&self, position: Vec3) -> Option<Vec3> {
        self.height.map(|y| Vec3::new(position.x, y, position.z))
    }
}

impl PoseSource for Pose {
    fn current_camera_pose(&self) -> Pose {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_axes_ignore_pitch() {
        let pose = Pose::new(Vec3::ZERO, Vec3::new(0.0, -0.8, -0.6));
        assert!((pose.flat_forward() - Vec3::NEG_Z).length() < 1e-5);
        assert!((pose.flat_right() - Vec3::X).length() < 1e-5);

        let straight_down = Pose::new(Vec3::ZERO, Vec3::NEG_Y);
        assert_eq!(straight_down.flat_forward(), Vec3::NEG_Z);
    }
}
