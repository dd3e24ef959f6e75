//! Marker-triggered model viewer. A recognised marker brings up the model registered for it; a
//! model whose marker stops tracking stays up for `tracking_timeout` seconds before it is hidden.
//! The model in view fills the info panel, and its part buttons swap the general text for the
//! selected part's.

use std::collections::BTreeMap;

use bevy::log::{debug, info, warn};
use bevy::math::{EulerRot, Quat, Vec2, Vec3};
use bevy::prelude::Resource;

use crate::config::{ModelInfo, ViewerSettings};
use crate::host::{
    ImageChanges, ModelCard, Panel, TrackedImage, TrackedImageSource, TrackingState, UiSink,
};

/// A model placed on its marker.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewedModel {
    pub qr_code: String,
    pub prefab: String,
    pub position: Vec3,
    /// Marker rotation followed by the user's manual rotation.
    pub rotation: Quat,
    pub scale: f32,
    pub visible: bool,
    marker_rotation: Quat,
    manual_rotation: Quat,
    initial_scale: f32,
    lost_for: f32,
}

impl ViewedModel {
    fn place(&mut self, image: &TrackedImage) {
        self.position = image.position;
        self.marker_rotation = image.rotation;
        self.rotation = self.marker_rotation * self.manual_rotation;
    }
}

#[derive(Resource)]
pub struct ModelViewer {
    settings: ViewerSettings,
    registry: BTreeMap<String, ModelInfo>,
    models: BTreeMap<String, ViewedModel>,
    current: Option<String>,
    selected_part: Option<usize>,
    scanning: bool,
    reset_pending: bool,
    manipulating: bool,
    pinch: Option<f32>,
}

impl ModelViewer {
    pub fn new(settings: ViewerSettings) -> Self {
        let mut registry = BTreeMap::new();
        for model in &settings.models {
            if model.qr_code.is_empty() {
                warn!("{} has no marker name and can never be shown", model.display_name);
                continue;
            }
            if registry.contains_key(&model.qr_code) {
                warn!("Marker {} is assigned twice; keeping the first model", model.qr_code);
                continue;
            }
            registry.insert(model.qr_code.clone(), model.clone());
        }

        Self {
            settings,
            registry,
            models: BTreeMap::new(),
            current: None,
            selected_part: None,
            scanning: false,
            reset_pending: false,
            manipulating: false,
            pinch: None,
        }
    }

    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    pub fn knows(&self, qr_code: &str) -> bool {
        self.registry.contains_key(qr_code)
    }

    /// The model the info panel describes.
    pub fn current(&self) -> Option<&ViewedModel> {
        self.current.as_ref().and_then(|code| self.models.get(code))
    }

    pub fn model(&self, qr_code: &str) -> Option<&ViewedModel> {
        self.models.get(qr_code)
    }

    pub fn models(&self) -> impl Iterator<Item = &ViewedModel> {
        self.models.values()
    }

    pub fn selected_part(&self) -> Option<usize> {
        self.selected_part
    }

    pub fn is_manipulating(&self) -> bool {
        self.manipulating
    }

    /// Leaves the menu and starts scanning with a fresh AR session.
    pub fn open(&mut self, source: &mut dyn TrackedImageSource, ui: &mut dyn UiSink) {
        if self.scanning {
            debug!("Model viewer already scanning");
            return;
        }
        ui.show_panel(Panel::Menu, false);
        ui.show_panel(Panel::ModelInfo, true);
        ui.show_panel(Panel::BackButton, true);
        self.selected_part = None;
        self.refresh_card(ui);

        self.scanning = true;
        self.reset_pending = false;
        source.set_scanning(true);
        source.reset_session();
        info!("Model viewer scanning for {} markers", self.registry.len());
    }

    /// Back to the menu. Every model is dropped; the AR session is reset on the next update.
    pub fn close(&mut self, source: &mut dyn TrackedImageSource, ui: &mut dyn UiSink) {
        if !self.scanning {
            return;
        }
        self.scanning = false;
        source.set_scanning(false);

        ui.show_panel(Panel::ModelInfo, false);
        ui.show_panel(Panel::BackButton, false);
        ui.show_panel(Panel::Menu, true);

        let dropped = self.models.len();
        self.models.clear();
        self.current = None;
        self.selected_part = None;
        self.end_manipulation();
        self.refresh_card(ui);

        self.reset_pending = true;
        info!("Model viewer closed; dropped {} models", dropped);
    }

    /// Applies marker changes and hides models whose marker has been lost for too long.
    pub fn update(&mut self, dt: f32, source: &mut dyn TrackedImageSource, ui: &mut dyn UiSink) {
        if self.reset_pending {
            self.reset_pending = false;
            source.reset_session();
            debug!("AR session reset after closing the model viewer");
        }
        if !self.scanning {
            return;
        }

        let changes = source.take_changes();
        if !changes.is_empty() {
            self.apply_changes(&changes, ui);
        }
        self.expire_lost(dt.max(0.0), source, ui);
    }

    /// Shows the text of part `index`. Returns `false` when the model in view has no such part.
    pub fn select_part(&mut self, index: usize, ui: &mut dyn UiSink) -> bool {
        if !self.scanning {
            return false;
        }
        ui.show_panel(Panel::ModelInfo, true);

        let parts = self.current_info().map_or(0, |info| self.button_count(info));
        if index >= parts {
            debug!("No part {} on the model in view ({} parts)", index, parts);
            return false;
        }
        self.selected_part = Some(index);
        self.refresh_card(ui);
        true
    }

    pub fn reset_part_selection(&mut self, ui: &mut dyn UiSink) {
        self.selected_part = None;
        self.refresh_card(ui);
    }

    /// Freezes the model in view on its current pose while the user handles it.
    pub fn begin_manipulation(&mut self) -> bool {
        if self.current().is_none() {
            return false;
        }
        self.manipulating = true;
        self.pinch = None;
        true
    }

    /// Releases the model back to its marker, keeping the manual rotation and scale.
    pub fn end_manipulation(&mut self) {
        self.manipulating = false;
        self.pinch = None;
    }

    /// Drag by `delta` pixels. Horizontal turns about the model's up axis, vertical about its
    /// right axis.
    pub fn rotate(&mut self, delta: Vec2) {
        let speed = self.settings.rotation_speed;
        let Some(model) = self.current_mut() else {
            return;
        };
        let yaw = Quat::from_rotation_y((-delta.x * speed).to_radians());
        let pitch = Quat::from_rotation_x((delta.y * speed).to_radians());
        model.manual_rotation = (model.manual_rotation * yaw * pitch).normalize();
        model.rotation = model.marker_rotation * model.manual_rotation;
    }

    /// Distance in pixels between two touches. The first reading of a gesture only sets the
    /// baseline.
    pub fn pinch(&mut self, distance: f32) {
        if !self.manipulating {
            return;
        }
        if let Some(previous) = self.pinch.replace(distance) {
            self.spread(distance - previous);
        }
    }

    /// Grows (or shrinks, for negative `pixels`) the model in view, within the configured
    /// multiples of its initial scale.
    pub fn spread(&mut self, pixels: f32) {
        let ViewerSettings {
            scale_speed,
            min_scale,
            max_scale,
            ..
        } = self.settings;
        let Some(model) = self.current_mut() else {
            return;
        };
        let low = model.initial_scale * min_scale;
        let high = model.initial_scale * max_scale;
        let scaled = model.scale * (1.0 + pixels * scale_speed);
        model.scale = scaled.clamp(low.min(high), low.max(high));
    }

    /// Info panel contents for the model in view.
    pub fn card(&self) -> Option<ModelCard> {
        let info = self.current_info()?;
        let parts = info
            .parts
            .iter()
            .take(self.button_count(info))
            .map(|part| part.name.clone())
            .collect();
        let text = match self.selected_part.and_then(|index| info.parts.get(index)) {
            Some(part) => part.info.clone(),
            None => info.general_info.clone(),
        };
        Some(ModelCard {
            title: info.display_name.clone(),
            info: text,
            parts,
            highlighted: self.selected_part,
        })
    }

    fn apply_changes(&mut self, changes: &ImageChanges, ui: &mut dyn UiSink) {
        for image in &changes.added {
            if !self.models.contains_key(&image.name) {
                self.load_model(image, ui);
            }
        }

        for image in &changes.updated {
            if image.state != TrackingState::Tracking {
                continue;
            }
            let is_current = self.current.as_deref() == Some(image.name.as_str());
            let Some(model) = self.models.get_mut(&image.name) else {
                continue;
            };
            if !(self.manipulating && is_current) {
                model.place(image);
            }
            model.visible = true;
            model.lost_for = 0.0;
            if !is_current {
                self.set_current(Some(image.name.clone()), ui);
            }
        }

        for name in &changes.removed {
            if self.models.remove(name).is_some() {
                debug!("Marker {} removed", name);
                if self.current.as_deref() == Some(name.as_str()) {
                    self.set_current(None, ui);
                }
            }
        }
    }

    fn load_model(&mut self, image: &TrackedImage, ui: &mut dyn UiSink) {
        let Some(info) = self.registry.get(&image.name) else {
            debug!("No model registered for marker {}", image.name);
            return;
        };

        let r = info.initial_rotation;
        let manual_rotation =
            Quat::from_euler(EulerRot::YXZ, r.y.to_radians(), r.x.to_radians(), r.z.to_radians());
        let mut model = ViewedModel {
            qr_code: image.name.clone(),
            prefab: info.prefab.clone(),
            position: image.position,
            rotation: image.rotation,
            scale: info.initial_scale,
            visible: true,
            marker_rotation: image.rotation,
            manual_rotation,
            initial_scale: info.initial_scale,
            lost_for: 0.0,
        };
        model.place(image);
        info!("Showing {} on marker {}", info.display_name, image.name);

        self.models.insert(image.name.clone(), model);
        self.set_current(Some(image.name.clone()), ui);
    }

    fn expire_lost(&mut self, dt: f32, source: &dyn TrackedImageSource, ui: &mut dyn UiSink) {
        let timeout = self.settings.tracking_timeout;
        let mut current_lost = false;

        for model in self.models.values_mut() {
            if source.tracking_state(&model.qr_code) == TrackingState::Tracking {
                model.visible = true;
                model.lost_for = 0.0;
                continue;
            }
            model.lost_for += dt;
            if model.visible && model.lost_for > timeout {
                model.visible = false;
                debug!("Marker {} lost for {:.1}s; hiding its model", model.qr_code, model.lost_for);
                current_lost |= self.current.as_deref() == Some(model.qr_code.as_str());
            }
        }

        if current_lost {
            self.set_current(None, ui);
        }
    }

    /// A new model in view starts with no part selected and no gesture running.
    fn set_current(&mut self, qr_code: Option<String>, ui: &mut dyn UiSink) {
        if self.current == qr_code {
            return;
        }
        self.current = qr_code;
        self.selected_part = None;
        self.end_manipulation();
        self.refresh_card(ui);
    }

    fn current_info(&self) -> Option<&ModelInfo> {
        self.current.as_ref().and_then(|code| self.registry.get(code))
    }

    fn current_mut(&mut self) -> Option<&mut ViewedModel> {
        let code = self.current.as_ref()?;
        self.models.get_mut(code)
    }

    fn button_count(&self, info: &ModelInfo) -> usize {
        info.parts.len().min(self.settings.part_buttons)
    }

    fn refresh_card(&self, ui: &mut dyn UiSink) {
        ui.show_model_card(self.card().as_ref());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ModelPart;

    fn fern() -> ModelInfo {
        ModelInfo {
            qr_code: "fern".to_owned(),
            prefab: "FernModel".to_owned(),
            display_name: "Fern".to_owned(),
            general_info: "Spore-bearing plant.".to_owned(),
            initial_scale: 0.2,
            initial_rotation: Vec3::ZERO,
            parts: vec![ModelPart {
                name: "Frond".to_owned(),
                info: "The leaf.".to_owned(),
            }],
        }
    }

    #[test]
    fn registry_skips_unnamed_and_duplicate_markers() {
        let mut unnamed = fern();
        unnamed.qr_code.clear();
        let mut duplicate = fern();
        duplicate.display_name = "Second fern".to_owned();

        let viewer = ModelViewer::new(ViewerSettings {
            models: vec![fern(), unnamed, duplicate],
            ..ViewerSettings::default()
        });

        assert!(viewer.knows("fern"));
        assert_eq!(viewer.registry.len(), 1);
        assert_eq!(viewer.registry["fern"].display_name, "Fern");
    }

    #[test]
    fn part_buttons_are_capped() {
        let mut model = fern();
        model.parts = (0..6)
            .map(|i| ModelPart {
                name: format!("Part {i}"),
                info: String::new(),
            })
            .collect();
        let viewer = ModelViewer::new(ViewerSettings {
            part_buttons: 4,
            ..ViewerSettings::default()
        });
        assert_eq!(viewer.button_count(&model), 4);
    }
}
