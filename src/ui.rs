//! HUD. The controller writes into `HudState` through `UiSink`; a sync system copies that state
//! onto a fixed node tree spawned at startup. The joystick fades in and out instead of popping.

use bevy::prelude::*;
use bevy::utils::HashSet;

use crate::host::{ModelCard, Panel, Popup, ResultsView, UiSink};
use crate::state::GameSet;

const JOYSTICK_FADE_SECONDS: f32 = 0.25;

pub struct UiPlugin;

impl Plugin for UiPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<HudState>()
            .init_resource::<JoystickFade>()
            .add_systems(Startup, spawn_hud)
            .add_systems(
                Update,
                (
                    sync_hud.run_if(resource_changed::<HudState>),
                    fade_joystick,
                )
                    .in_set(GameSet::Presentation),
            );
    }
}

/// Everything the HUD shows.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct HudState {
    pub score: String,
    pub timer: String,
    pub remaining: String,
    visible: HashSet<Panel>,
    popup: Option<Popup>,
    results: Option<ResultsView>,
    card: Option<ModelCard>,
    /// Set by `UiSink` writes that changed something, cleared by `take_dirty`.
    dirty: bool,
}

impl Default for HudState {
    fn default() -> Self {
        let mut visible = HashSet::default();
        visible.insert(Panel::Menu);
        Self {
            score: String::new(),
            timer: String::new(),
            remaining: String::new(),
            visible,
            popup: None,
            results: None,
            card: None,
            dirty: false,
        }
    }
}

impl HudState {
    pub fn is_visible(&self, panel: Panel) -> bool {
        self.visible.contains(&panel)
    }

    pub fn popup(&self) -> Option<Popup> {
        self.popup
    }

    pub fn results(&self) -> Option<&ResultsView> {
        self.results.as_ref()
    }

    pub fn card(&self) -> Option<&ModelCard> {
        self.card.as_ref()
    }

    /// Whether anything changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl UiSink for HudState {
    fn set_score_text(&mut self, text: &str) {
        self.dirty |= replace_text(&mut self.score, text);
    }

    fn set_timer_text(&mut self, text: &str) {
        self.dirty |= replace_text(&mut self.timer, text);
    }

    fn set_remaining_text(&mut self, text: &str) {
        self.dirty |= replace_text(&mut self.remaining, text);
    }

    fn show_panel(&mut self, panel: Panel, visible: bool) {
        self.dirty |= if visible {
            self.visible.insert(panel)
        } else {
            self.visible.remove(&panel)
        };
    }

    fn show_popup(&mut self, popup: Popup) {
        self.dirty |= self.popup.replace(popup) != Some(popup);
    }

    fn dismiss_popups(&mut self) {
        self.dirty |= self.popup.take().is_some();
    }

    fn show_results(&mut self, results: &ResultsView) {
        if self.results.as_ref() != Some(results) {
            self.results = Some(results.clone());
            self.dirty = true;
        }
    }

    fn show_model_card(&mut self, card: Option<&ModelCard>) {
        if self.card.as_ref() != card {
            self.card = card.cloned();
            self.dirty = true;
        }
    }
}

/// Marks `hud` changed if writes made through `bypass_change_detection` changed anything.
pub fn flush_hud(hud: &mut ResMut<HudState>) {
    if hud.bypass_change_detection().take_dirty() {
        hud.set_changed();
    }
}

fn replace_text(slot: &mut String, text: &str) -> bool {
    if slot.as_str() == text {
        return false;
    }
    text.clone_into(slot);
    true
}

/// Opacity of the joystick, 0.0 hidden, 1.0 fully shown.
#[derive(Resource, Debug, Default)]
pub struct JoystickFade {
    alpha: f32,
}

impl JoystickFade {
    /// Moves toward the target opacity over `JOYSTICK_FADE_SECONDS`.
    pub fn advance(&mut self, shown: bool, dt: f32) -> f32 {
        let step = dt / JOYSTICK_FADE_SECONDS;
        self.alpha = if shown {
            (self.alpha + step).min(1.0)
        } else {
            (self.alpha - step).max(0.0)
        };
        self.alpha
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }
}

#[derive(Component)]
pub struct HudPanel(pub Panel);

#[derive(Component, Clone, Copy, PartialEq, Eq)]
pub enum HudText {
    Score,
    Timer,
    Remaining,
    Results,
    ModelCard,
}

#[derive(Component)]
struct PopupBanner;

#[derive(Component)]
struct JoystickPad;

fn text_style(font_size: f32) -> TextStyle {
    TextStyle {
        font_size,
        color: Color::srgba(0.95, 0.95, 0.9, 1.0),
        ..default()
    }
}

fn panel_node(panel: Panel, style: Style, background: Color) -> impl Bundle {
    (
        HudPanel(panel),
        Name::new(format!("{panel:?}Panel")),
        NodeBundle {
            style,
            background_color: BackgroundColor(background),
            visibility: if panel == Panel::Menu {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            },
            ..default()
        },
    )
}

fn spawn_hud(mut commands: Commands) {
    commands
        .spawn((
            Name::new("Hud"),
            NodeBundle {
                style: Style {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    flex_direction: FlexDirection::Column,
                    justify_content: JustifyContent::SpaceBetween,
                    padding: UiRect::all(Val::Px(16.0)),
                    ..default()
                },
                ..default()
            },
        ))
        .with_children(|root| {
            root.spawn(panel_node(
                Panel::Menu,
                Style {
                    align_self: AlignSelf::Center,
                    padding: UiRect::all(Val::Px(12.0)),
                    ..default()
                },
                Color::srgba(0.0, 0.0, 0.0, 0.6),
            ))
            .with_children(|menu| {
                menu.spawn(TextBundle::from_section(
                    "Garden AR\n1  Find the hidden objects\n2  Platform game\n3  Scan a plant marker\nEsc  Back to menu",
                    text_style(28.0),
                ));
            });

            root.spawn(panel_node(
                Panel::GameHud,
                Style {
                    flex_direction: FlexDirection::Column,
                    ..default()
                },
                Color::NONE,
            ))
            .with_children(|hud| {
                for text in [HudText::Score, HudText::Timer, HudText::Remaining] {
                    hud.spawn((text, TextBundle::from_section("", text_style(24.0))));
                }
            });

            root.spawn((
                PopupBanner,
                Name::new("CollectionCompletePopup"),
                TextBundle {
                    visibility: Visibility::Hidden,
                    style: Style {
                        align_self: AlignSelf::Center,
                        ..default()
                    },
                    ..TextBundle::from_section(
                        "All found! Press Enter to finish",
                        text_style(32.0),
                    )
                },
            ));

            root.spawn(panel_node(
                Panel::Results,
                Style {
                    align_self: AlignSelf::Center,
                    padding: UiRect::all(Val::Px(12.0)),
                    ..default()
                },
                Color::srgba(0.0, 0.0, 0.0, 0.7),
            ))
            .with_children(|results| {
                results.spawn((HudText::Results, TextBundle::from_section("", text_style(28.0))));
            });

            root.spawn(panel_node(
                Panel::ModelInfo,
                Style {
                    align_self: AlignSelf::FlexEnd,
                    max_width: Val::Px(420.0),
                    padding: UiRect::all(Val::Px(12.0)),
                    ..default()
                },
                Color::srgba(0.05, 0.15, 0.05, 0.75),
            ))
            .with_children(|info| {
                info.spawn((HudText::ModelCard, TextBundle::from_section("", text_style(22.0))));
            });

            root.spawn(panel_node(
                Panel::BackButton,
                Style {
                    align_self: AlignSelf::FlexStart,
                    padding: UiRect::all(Val::Px(8.0)),
                    ..default()
                },
                Color::srgba(0.0, 0.0, 0.0, 0.6),
            ))
            .with_children(|back| {
                back.spawn(TextBundle::from_section("Esc  Back", text_style(22.0)));
            });

            root.spawn((
                panel_node(
                    Panel::Joystick,
                    Style {
                        width: Val::Px(120.0),
                        height: Val::Px(120.0),
                        align_self: AlignSelf::FlexStart,
                        ..default()
                    },
                    Color::srgba(1.0, 1.0, 1.0, 0.0),
                ),
                JoystickPad,
            ));
        });
}

fn results_text(results: Option<&ResultsView>) -> String {
    match results {
        Some(view) => format!(
            "Score: {}\nHigh score: {}\nTime: {}\nBest time: {}",
            view.score, view.high_score, view.time, view.best_time
        ),
        None => String::new(),
    }
}

/// Title, info text, then one line per part button. The selected part is marked.
fn card_text(card: Option<&ModelCard>) -> String {
    let Some(card) = card else {
        return "Point the camera at a marker".to_owned();
    };
    let mut text = format!("{}\n{}\n", card.title, card.info);
    for (index, part) in card.parts.iter().enumerate() {
        let marker = if card.highlighted == Some(index) { ">" } else { " " };
        text.push_str(&format!("\n{marker} F{}  {part}", index + 1));
    }
    text
}

fn sync_hud(
    hud: Res<HudState>,
    mut panels: Query<(&HudPanel, &mut Visibility), Without<PopupBanner>>,
    mut texts: Query<(&HudText, &mut Text)>,
    mut popups: Query<&mut Visibility, With<PopupBanner>>,
) {
    for (HudPanel(panel), mut visibility) in &mut panels {
        // The joystick's visibility follows its fade.
        if *panel == Panel::Joystick {
            continue;
        }
        *visibility = if hud.is_visible(*panel) {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }

    for (kind, mut text) in &mut texts {
        let value = match kind {
            HudText::Score => hud.score.clone(),
            HudText::Timer => hud.timer.clone(),
            HudText::Remaining => hud.remaining.clone(),
            HudText::Results => results_text(hud.results()),
            HudText::ModelCard => card_text(hud.card()),
        };
        if let Some(section) = text.sections.first_mut() {
            section.value = value;
        }
    }

    for mut visibility in &mut popups {
        *visibility = if hud.popup().is_some() {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
}

fn fade_joystick(
    time: Res<Time>,
    hud: Res<HudState>,
    mut fade: ResMut<JoystickFade>,
    mut pads: Query<(&mut BackgroundColor, &mut Visibility), With<JoystickPad>>,
) {
    let shown = hud.is_visible(Panel::Joystick);
    if !shown && fade.alpha() == 0.0 {
        return;
    }
    let alpha = fade.advance(shown, time.delta_seconds());
    for (mut background, mut visibility) in &mut pads {
        background.0 = Color::srgba(1.0, 1.0, 1.0, 0.35 * alpha);
        *visibility = if alpha > 0.0 {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
}
