//! Keyboard and mouse input: mode hotkeys, the on-screen joystick (driven by WASD here), taps
//! on floating collectibles, and drag/scroll handling of the model in the viewer.

use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use bevy::utils::HashMap;
use bevy::window::PrimaryWindow;

use crate::camera::ArCamera;
use crate::config::GameSettings;
use crate::controller::GameModeController;
use crate::entity::EntityKind;
use crate::host::{InputAxis, Panel};
use crate::mode::{ModeRequest, TapRequest};
use crate::scanning::ViewerRequest;
use crate::state::{GameMode, GameSet};
use crate::ui::HudState;
use crate::viewer::ModelViewer;

/// How far from the cursor ray a collectible still counts as tapped.
const TAP_RADIUS: f32 = 0.25;
/// Pinch spread, in pixels, for one wheel line.
const PIXELS_PER_LINE: f32 = 20.0;
const PART_KEYS: [KeyCode; 4] = [KeyCode::F1, KeyCode::F2, KeyCode::F3, KeyCode::F4];

pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<JoystickAxes>().add_systems(
            Update,
            (
                read_mode_hotkeys,
                read_joystick,
                read_viewer_input,
                tap_collectibles.run_if(in_state(GameMode::ObjectSearch)),
            )
                .in_set(GameSet::Input),
        );
    }
}

/// Current value of every on-screen joystick, keyed by joystick id.
#[derive(Resource, Debug, Default, Clone)]
pub struct JoystickAxes {
    sticks: HashMap<u32, Vec2>,
}

impl JoystickAxes {
    pub fn set(&mut self, id: u32, value: Vec2) {
        self.sticks.insert(id, value.clamp(Vec2::NEG_ONE, Vec2::ONE));
    }

    pub fn release_all(&mut self) {
        self.sticks.clear();
    }
}

impl InputAxis for JoystickAxes {
    fn axis(&self, id: u32) -> Vec2 {
        self.sticks.get(&id).copied().unwrap_or(Vec2::ZERO)
    }
}

fn read_mode_hotkeys(keyboard: Res<ButtonInput<KeyCode>>, mut requests: EventWriter<ModeRequest>) {
    if keyboard.just_pressed(KeyCode::Digit1) {
        requests.send(ModeRequest::Enter(GameMode::ObjectSearch));
    }
    if keyboard.just_pressed(KeyCode::Digit2) {
        requests.send(ModeRequest::Enter(GameMode::PlatformGame));
    }
    if keyboard.just_pressed(KeyCode::Escape) {
        requests.send(ModeRequest::Cancel);
    }
    if keyboard.just_pressed(KeyCode::Enter) {
        requests.send(ModeRequest::Complete);
    }
}

fn read_viewer_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    buttons: Res<ButtonInput<MouseButton>>,
    mut motion: EventReader<MouseMotion>,
    mut wheel: EventReader<MouseWheel>,
    viewer: Res<ModelViewer>,
    mut requests: EventWriter<ViewerRequest>,
) {
    let dragged: Vec2 = motion.read().map(|event| event.delta).sum();
    let scrolled: f32 = wheel
        .read()
        .map(|event| match event.unit {
            MouseScrollUnit::Line => event.y * PIXELS_PER_LINE,
            MouseScrollUnit::Pixel => event.y,
        })
        .sum();

    if keyboard.just_pressed(KeyCode::Digit3) {
        requests.send(ViewerRequest::Open);
    }
    if !viewer.is_scanning() {
        return;
    }
    if keyboard.just_pressed(KeyCode::Escape) {
        requests.send(ViewerRequest::Close);
        return;
    }

    for (index, key) in PART_KEYS.iter().enumerate() {
        if keyboard.just_pressed(*key) {
            requests.send(ViewerRequest::SelectPart(index));
        }
    }
    if keyboard.just_pressed(KeyCode::KeyR) {
        requests.send(ViewerRequest::ClearPart);
    }

    if buttons.just_pressed(MouseButton::Left) {
        requests.send(ViewerRequest::Grab);
    }
    if buttons.pressed(MouseButton::Left) && dragged != Vec2::ZERO {
        // Window y grows downward.
        requests.send(ViewerRequest::Drag(Vec2::new(dragged.x, -dragged.y)));
    }
    if buttons.just_released(MouseButton::Left) {
        requests.send(ViewerRequest::Release);
    }
    if scrolled != 0.0 {
        requests.send(ViewerRequest::Spread(scrolled));
    }
}

/// The stick only reports while its panel is on screen.
fn read_joystick(
    keyboard: Res<ButtonInput<KeyCode>>,
    hud: Res<HudState>,
    settings: Res<GameSettings>,
    mut axes: ResMut<JoystickAxes>,
) {
    if !hud.is_visible(Panel::Joystick) {
        if axes.sticks.values().any(|value| *value != Vec2::ZERO) {
            axes.release_all();
        }
        return;
    }

    let mut value = Vec2::ZERO;
    if keyboard.pressed(KeyCode::KeyW) {
        value.y += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyS) {
        value.y -= 1.0;
    }
    if keyboard.pressed(KeyCode::KeyD) {
        value.x += 1.0;
    }
    if keyboard.pressed(KeyCode::KeyA) {
        value.x -= 1.0;
    }
    axes.set(settings.platform.joystick_id, value.normalize_or_zero());
}

fn tap_collectibles(
    buttons: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<ArCamera>>,
    controller: Res<GameModeController>,
    mut taps: EventWriter<TapRequest>,
) {
    if !buttons.just_pressed(MouseButton::Left) {
        return;
    }
    let Some(cursor) = windows.get_single().ok().and_then(Window::cursor_position) else {
        return;
    };
    let Ok((camera, transform)) = cameras.get_single() else {
        return;
    };
    let Some(ray) = camera.viewport_to_world(transform, cursor) else {
        return;
    };

    let direction = *ray.direction;
    let hit = controller
        .pool()
        .active(EntityKind::CollectibleObject)
        .filter_map(|entity| {
            let along = (entity.position - ray.origin).dot(direction);
            if along < 0.0 {
                return None;
            }
            let miss = (entity.position - (ray.origin + direction * along)).length();
            (miss <= TAP_RADIUS).then_some((along, entity.id))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0));

    if let Some((_, id)) = hit {
        debug!("Tapped {}", id);
        taps.send(TapRequest(id));
    }
}
