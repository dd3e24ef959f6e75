//! The mode state machine. `GameModeController` owns every spawned entity, the current session,
//! the placement RNG and the platform player, and is the only thing allowed to mutate them.
//!
//! A transition runs the exit actions of the current mode, switches, then runs the entry actions
//! of the target, all inside one call. Entry actions that hit a missing reference log the problem
//! and stop where they are; the controller stays in the target mode with whatever was built so
//! far. Collection events are routed to the session, which drops anything raised for a mode that
//! is no longer current.

use bevy::log::{debug, error, info, warn};
use bevy::math::{EulerRot, Quat, Vec3};
use bevy::prelude::Resource;

use crate::boundary::BoundaryRegion;
use crate::config::{GameSettings, PlatformSettings};
use crate::entity::{BodyKind, EntityId, EntityKind};
use crate::error::{ModeError, SetupError};
use crate::host::{GroundProbe, Host, Panel, Popup};
use crate::movement::{KinematicMover, PlatformPlayer};
use crate::placement::PlacementPlanner;
use crate::pool::EntityPool;
use crate::schedule::{TickHandle, TickScheduler};
use crate::session::{format_time, CollectionOutcome, IgnoreReason, RecordOutcome, SessionState};
use crate::state::GameMode;

/// Notifications for the presentation layer, drained once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerEvent {
    ModeChanged { from: GameMode, to: GameMode },
    Spawned { id: EntityId, kind: EntityKind, reused: bool },
    Destroyed { id: EntityId, kind: EntityKind },
    Collected { entity: Option<EntityId>, mode: GameMode, points: u32, score: u32 },
    CollectionIgnored { mode: GameMode, reason: IgnoreReason },
    SessionCompleted { mode: GameMode, score: u32, elapsed: f32 },
    BananasComplete,
    RecordsChecked(RecordOutcome),
    EntryAborted { mode: GameMode, reason: SetupError },
}

/// A collect request tagged with the mode that was current when the host raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionEvent {
    pub entity: EntityId,
    pub mode: GameMode,
}

#[derive(Resource)]
pub struct GameModeController {
    settings: GameSettings,
    current: GameMode,
    transitioning: bool,
    clock: f32,
    pool: EntityPool,
    planner: PlacementPlanner,
    session: SessionState,
    scheduler: TickScheduler,
    timer_tick: Option<TickHandle>,
    map: Option<EntityId>,
    player: Option<PlatformPlayer>,
    events: Vec<ControllerEvent>,
}

impl GameModeController {
    pub fn new(settings: GameSettings) -> Self {
        let planner = PlacementPlanner::new(settings.seed);
        Self {
            settings,
            current: GameMode::Idle,
            transitioning: false,
            clock: 0.0,
            pool: EntityPool::new(),
            planner,
            session: SessionState::idle(),
            scheduler: TickScheduler::default(),
            timer_tick: None,
            map: None,
            player: None,
            events: Vec::new(),
        }
    }

    pub fn current(&self) -> GameMode {
        self.current
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn pool(&self) -> &EntityPool {
        &self.pool
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn map_entity(&self) -> Option<EntityId> {
        self.map
    }

    pub fn player(&self) -> Option<&PlatformPlayer> {
        self.player.as_ref()
    }

    pub fn elapsed_time(&self) -> f32 {
        self.session.elapsed(self.clock)
    }

    pub fn drain_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Modes that currently own at least one active entity.
    pub fn modes_with_active_entities(&self) -> Vec<GameMode> {
        let mut modes: Vec<GameMode> = Vec::new();
        for entity in self.pool.iter().filter(|e| e.active) {
            let mode = entity.owning_mode();
            if !modes.contains(&mode) {
                modes.push(mode);
            }
        }
        modes
    }

    /// Switches to `target`. Asking for the current mode does nothing.
    pub fn request_mode(&mut self, target: GameMode, host: &mut Host) -> Result<(), ModeError> {
        self.guard_transition(target)?;
        if target == self.current {
            debug!("Already in {:?}; ignoring mode request", target);
            return Ok(());
        }
        self.transition(target, host);
        Ok(())
    }

    /// Abandons the running session without touching records.
    pub fn cancel_current_mode(&mut self, host: &mut Host) -> Result<(), ModeError> {
        self.guard_transition(GameMode::Idle)?;
        if !self.current.is_session() {
            return Ok(());
        }
        info!("Cancelling {:?}", self.current);
        self.transition(GameMode::Idle, host);
        Ok(())
    }

    /// Ends the running session normally: records are checked (once), the results panel is
    /// shown, and the controller returns to `Idle`.
    pub fn complete_current_mode(&mut self, host: &mut Host) -> Result<Option<RecordOutcome>, ModeError> {
        self.guard_transition(GameMode::Idle)?;
        if !self.current.is_session() {
            return Ok(None);
        }

        self.session.freeze(self.clock);
        let outcome = self.check_records(host);
        self.transition(GameMode::Idle, host);

        host.ui.show_results(&outcome.view());
        host.ui.show_panel(Panel::Results, true);
        Ok(Some(outcome))
    }

    /// Advances the controller clock: fires due ticks and moves the platform player.
    pub fn advance(&mut self, dt: f32, host: &mut Host) {
        self.clock += dt.max(0.0);

        for handle in self.scheduler.poll(self.clock) {
            if Some(handle) == self.timer_tick {
                self.refresh_timer(host);
            }
        }

        if self.current == GameMode::PlatformGame && self.session.is_active() {
            self.step_player(dt, host);
        }
    }

    /// A tap on `entity`. Only the object search reacts to taps.
    pub fn tap(&mut self, entity: EntityId, host: &mut Host) -> CollectionOutcome {
        if self.current != GameMode::ObjectSearch {
            debug!("Tap on {} ignored outside the object search", entity);
            return self.ignore(IgnoreReason::NotInteractable);
        }
        self.collect_entity(entity, host)
    }

    /// Routes a contact/tap event raised by the host. Events raised under another mode are stale.
    pub fn handle_collection(&mut self, event: CollectionEvent, host: &mut Host) -> CollectionOutcome {
        if event.mode != self.current {
            debug!(
                "Dropping collection of {} raised in {:?}; now in {:?}",
                event.entity, event.mode, self.current
            );
            return self.ignore(IgnoreReason::WrongMode {
                session: event.mode,
                current: self.current,
            });
        }
        self.collect_entity(event.entity, host)
    }

    /// Adds `points` to the running session if it belongs to the current mode.
    pub fn record_collection(&mut self, points: u32, host: &mut Host) -> CollectionOutcome {
        self.score(None, points, host)
    }

    fn guard_transition(&self, requested: GameMode) -> Result<(), ModeError> {
        if self.transitioning {
            warn!(
                "Rejected request for {:?}: transition out of {:?} still running",
                requested, self.current
            );
            return Err(ModeError::TransitionInProgress {
                requested,
                current: self.current,
            });
        }
        Ok(())
    }

    fn transition(&mut self, target: GameMode, host: &mut Host) {
        self.transitioning = true;
        let from = self.current;
        info!("Mode {:?} -> {:?}", from, target);

        self.exit(from, host);
        self.current = target;
        self.enter(target, host);

        self.transitioning = false;
        self.events.push(ControllerEvent::ModeChanged { from, to: target });
    }

    fn exit(&mut self, mode: GameMode, host: &mut Host) {
        match mode {
            GameMode::Idle => host.ui.show_panel(Panel::Menu, false),
            GameMode::ObjectSearch => {
                let hidden = self.pool.deactivate_all(EntityKind::CollectibleObject);
                debug!("Deactivated {} collectibles", hidden);
                self.session.freeze(self.clock);
                self.cancel_timer();
                host.ui.show_panel(Panel::GameHud, false);
                host.ui.dismiss_popups();
            }
            GameMode::PlatformGame => {
                self.session.freeze(self.clock);
                if let Some(mut player) = self.player.take() {
                    player.reset();
                }
                self.map = None;
                for kind in EntityKind::ALL.into_iter().filter(|kind| kind.session_scoped()) {
                    for id in self.pool.destroy_all(kind) {
                        self.events.push(ControllerEvent::Destroyed { id, kind });
                    }
                }
                host.ui.show_panel(Panel::Joystick, false);
                host.ui.dismiss_popups();
            }
        }
    }

    fn enter(&mut self, mode: GameMode, host: &mut Host) {
        match mode {
            GameMode::Idle => {
                host.ui.show_panel(Panel::GameHud, false);
                host.ui.show_panel(Panel::Joystick, false);
                host.ui.show_panel(Panel::Results, false);
                host.ui.dismiss_popups();
                host.ui.show_panel(Panel::Menu, true);
            }
            GameMode::ObjectSearch => self.enter_object_search(host),
            GameMode::PlatformGame => self.enter_platform_game(host),
        }
    }

    fn enter_object_search(&mut self, host: &mut Host) {
        host.ui.show_panel(Panel::Results, false);
        host.ui.dismiss_popups();
        host.ui.show_panel(Panel::GameHud, true);

        let required = self.settings.object_search.objects_to_spawn;
        self.session.start(GameMode::ObjectSearch, required, self.clock);
        self.refresh_progress(host);
        self.refresh_timer(host);
        let interval = self.settings.object_search.timer_refresh_interval;
        self.timer_tick = Some(self.scheduler.register(interval, self.clock));

        if let Err(reason) = self.stage_collectibles(host) {
            self.abort_entry(GameMode::ObjectSearch, reason);
        }
        self.complete_if_empty(host);
    }

    fn stage_collectibles(&mut self, host: &mut Host) -> Result<(), SetupError> {
        let item_value = self.settings.object_search.item_value;

        if self.pool.count(EntityKind::CollectibleObject) > 0 {
            let reactivated = self
                .pool
                .activate_all(EntityKind::CollectibleObject, &[EntityKind::Banana]);
            let ids: Vec<EntityId> = self.pool.ids(EntityKind::CollectibleObject).collect();
            for id in ids {
                if let Some(entity) = self.pool.get_mut(id) {
                    entity.value = item_value;
                }
            }
            info!("Reactivated {} collectibles at their original positions", reactivated);
            return Ok(());
        }

        let search = self.settings.object_search.clone();
        let prefabs = search.collectible_prefabs();
        if prefabs.is_empty() {
            return Err(SetupError::NoCollectiblePrefabs);
        }

        let center = match host.camera_pose() {
            Some(pose) => Vec3::new(pose.position.x, 0.0, pose.position.z),
            None => {
                warn!("No camera pose for object search; spawning around the origin");
                Vec3::ZERO
            }
        };

        let constraint = search.placement();
        let mut taken: Vec<Vec3> = Vec::new();
        for _ in 0..search.objects_to_spawn {
            let prefab = prefabs[self.planner.pick(prefabs.len())];
            let placement = self
                .planner
                .find_position(center, &constraint, &taken, host.ground);
            taken.push(placement.position);

            let spawned = self.pool.spawn_or_reuse(
                EntityKind::CollectibleObject,
                &prefab.name,
                placement.position,
            );
            let phase = self.planner.phase();
            if let Some(entity) = self.pool.get_mut(spawned.id) {
                entity.value = item_value;
                if entity.kind.floats() {
                    entity.float = Some(prefab.float.resolve(search.float_speed, search.float_height, phase));
                }
            }
            self.events.push(ControllerEvent::Spawned {
                id: spawned.id,
                kind: EntityKind::CollectibleObject,
                reused: spawned.reused,
            });
        }
        info!("Spawned {} collectibles", taken.len());
        Ok(())
    }

    fn enter_platform_game(&mut self, host: &mut Host) {
        // Nothing from the object search may stay visible, whatever state it was left in.
        self.pool.deactivate_all(EntityKind::CollectibleObject);
        self.pool.deactivate_all(EntityKind::Banana);

        host.ui.show_panel(Panel::GameHud, false);
        host.ui.show_panel(Panel::Results, false);
        host.ui.dismiss_popups();

        let bananas = self.settings.platform.banana_count();
        self.session.start(GameMode::PlatformGame, bananas, self.clock);
        self.refresh_progress(host);

        if let Err(reason) = self.build_platform(host) {
            self.abort_entry(GameMode::PlatformGame, reason);
        }
        self.complete_if_empty(host);
    }

    fn complete_if_empty(&mut self, host: &mut Host) {
        if self.session.complete_if_empty(self.clock) {
            warn!("{:?} has nothing to collect; completing on entry", self.current);
            self.complete_session(host);
        }
    }

    fn build_platform(&mut self, host: &mut Host) -> Result<(), SetupError> {
        let pose = host.camera_pose().ok_or(SetupError::MissingPoseSource)?;
        let platform = self.settings.platform.clone();

        let mut anchor = pose.position + pose.flat_forward() * platform.placement_distance;
        anchor.y = pose.position.y + platform.placement_height;

        let map_name = platform
            .map_prefab
            .as_deref()
            .ok_or(SetupError::MissingPrefab("map"))?;
        let map = self.pool.spawn(EntityKind::PlatformElement, map_name, anchor);
        let boundary = BoundaryRegion::from_bounds(anchor, platform.map_bounds);
        if let Some(entity) = self.pool.get_mut(map) {
            let r = platform.map_rotation;
            entity.rotation = Quat::from_euler(
                EulerRot::YXZ,
                r.y.to_radians(),
                r.x.to_radians(),
                r.z.to_radians(),
            );
            entity.boundary = Some(boundary);
        }
        self.map = Some(map);
        self.events.push(ControllerEvent::Spawned {
            id: map,
            kind: EntityKind::PlatformElement,
            reused: false,
        });
        info!("Placed {} at {:?}", map_name, anchor);

        if let Err(reason) = self.spawn_player(&platform, anchor, boundary) {
            self.abort_entry(GameMode::PlatformGame, reason);
        }
        host.ui.show_panel(Panel::Joystick, true);
        self.spawn_bananas(&platform, anchor)
    }

    fn spawn_player(
        &mut self,
        platform: &PlatformSettings,
        anchor: Vec3,
        boundary: BoundaryRegion,
    ) -> Result<(), SetupError> {
        let name = platform
            .player_prefab
            .as_deref()
            .ok_or(SetupError::MissingPrefab("player"))?;
        let position = anchor + platform.player_spawn_offset;
        let id = self.pool.spawn(EntityKind::PlatformElement, name, position);

        if let Some(entity) = self.pool.get_mut(id) {
            if entity.body == BodyKind::RigidBody {
                debug!("Dropping rigid body on {}; movement is kinematic", name);
            }
            entity.body = BodyKind::Kinematic;
        }

        let mover = KinematicMover::new(position, Some(boundary));
        self.player = Some(PlatformPlayer::new(id, platform.joystick_id, Box::new(mover)));
        self.events.push(ControllerEvent::Spawned {
            id,
            kind: EntityKind::PlatformElement,
            reused: false,
        });
        Ok(())
    }

    fn spawn_bananas(&mut self, platform: &PlatformSettings, anchor: Vec3) -> Result<(), SetupError> {
        let name = platform
            .banana_prefab
            .as_deref()
            .ok_or(SetupError::MissingPrefab("banana"))?;

        for id in self.pool.destroy_all(EntityKind::Banana) {
            self.events.push(ControllerEvent::Destroyed {
                id,
                kind: EntityKind::Banana,
            });
        }

        let count = platform.banana_count() as usize;
        for offset in platform.banana_offsets.iter().take(count) {
            let id = self.pool.spawn(EntityKind::Banana, name, anchor + *offset);
            if let Some(entity) = self.pool.get_mut(id) {
                entity.value = platform.banana_value;
            }
            self.events.push(ControllerEvent::Spawned {
                id,
                kind: EntityKind::Banana,
                reused: false,
            });
        }
        debug!("Spawned {} bananas around {:?}", count, anchor);
        Ok(())
    }

    fn abort_entry(&mut self, mode: GameMode, reason: SetupError) {
        error!("Entering {:?} incomplete: {}", mode, reason);
        self.events.push(ControllerEvent::EntryAborted { mode, reason });
    }

    fn step_player(&mut self, dt: f32, host: &mut Host) {
        let surface = self
            .map
            .and_then(|id| self.pool.get(id))
            .and_then(|map| map.boundary);
        let Some(player) = self.player.as_mut() else {
            return;
        };

        let ground = MapGround {
            surface,
            fallback: host.ground,
        };
        let camera = host.camera_pose();
        let position = player.step(host.input, camera, &ground, &self.settings.movement, dt);
        let facing = player.facing();
        let player_id = player.entity;

        if let Some(entity) = self.pool.get_mut(player_id) {
            entity.position = position;
            entity.rotation = facing;
        }

        let platform = &self.settings.platform;
        let reached: Vec<EntityId> = self
            .pool
            .active(EntityKind::Banana)
            .filter(|banana| within_reach(position, banana.position, platform.pickup_radius, platform.player_height))
            .map(|banana| banana.id)
            .collect();
        for id in reached {
            self.collect_entity(id, host);
        }
    }

    fn collect_entity(&mut self, id: EntityId, host: &mut Host) -> CollectionOutcome {
        let Some(entity) = self.pool.get(id) else {
            return self.ignore(IgnoreReason::NotInteractable);
        };
        if !entity.is_interactable() || entity.owning_mode() != self.current {
            return self.ignore(IgnoreReason::NotInteractable);
        }

        let points = entity.value;
        let outcome = self.score(Some(id), points, host);
        if outcome.counted() {
            self.pool.deactivate(id);
        }
        outcome
    }

    fn score(&mut self, entity: Option<EntityId>, points: u32, host: &mut Host) -> CollectionOutcome {
        let outcome = self
            .session
            .record_collection(points, self.current, self.clock);

        match outcome {
            CollectionOutcome::Ignored(reason) => {
                self.events.push(ControllerEvent::CollectionIgnored {
                    mode: self.session.mode(),
                    reason,
                });
            }
            CollectionOutcome::Recorded { score, .. } | CollectionOutcome::Completed { score, .. } => {
                self.events.push(ControllerEvent::Collected {
                    entity,
                    mode: self.current,
                    points,
                    score,
                });
                self.refresh_progress(host);
                if matches!(outcome, CollectionOutcome::Completed { .. }) {
                    self.complete_session(host);
                }
            }
        }
        outcome
    }

    fn complete_session(&mut self, host: &mut Host) {
        self.cancel_timer();
        self.refresh_timer(host);

        let outcome = self.check_records(host);
        if self.current == GameMode::PlatformGame {
            host.ui.set_remaining_text("Complete!");
            self.events.push(ControllerEvent::BananasComplete);
        }
        self.events.push(ControllerEvent::SessionCompleted {
            mode: self.current,
            score: outcome.score,
            elapsed: outcome.time,
        });
        host.ui.show_popup(Popup::CollectionComplete);
    }

    fn check_records(&mut self, host: &mut Host) -> RecordOutcome {
        let first = self.session.records().is_none();
        let outcome = self.session.check_records(host.store, self.clock);
        if first {
            if outcome.new_high_score || outcome.new_best_time {
                info!(
                    "New record in {:?}: score {} time {}",
                    self.session.mode(),
                    outcome.score,
                    format_time(outcome.time)
                );
            }
            self.events.push(ControllerEvent::RecordsChecked(outcome));
        }
        outcome
    }

    fn ignore(&mut self, reason: IgnoreReason) -> CollectionOutcome {
        self.events.push(ControllerEvent::CollectionIgnored {
            mode: self.current,
            reason,
        });
        CollectionOutcome::Ignored(reason)
    }

    fn refresh_progress(&self, host: &mut Host) {
        host.ui.set_score_text(&self.session.score_text());
        let remaining = self.session.remaining();
        let text = match self.session.mode() {
            GameMode::PlatformGame => format!("Bananas remaining: {remaining}"),
            _ => format!("Remaining: {remaining}"),
        };
        host.ui.set_remaining_text(&text);
    }

    fn refresh_timer(&self, host: &mut Host) {
        host.ui.set_timer_text(&format_time(self.session.elapsed(self.clock)));
    }

    fn cancel_timer(&mut self) {
        if let Some(handle) = self.timer_tick.take() {
            self.scheduler.cancel(handle);
        }
    }
}

/// The placed map acts as the floor inside its boundary; elsewhere the host's ground decides.
struct MapGround<'a> {
    surface: Option<BoundaryRegion>,
    fallback: &'a dyn GroundProbe,
}

impl GroundProbe for MapGround<'_> {
    fn probe_ground(&self, position: Vec3) -> Option<Vec3> {
        match self.surface {
            Some(region) if region.contains(position) => {
                Some(Vec3::new(position.x, region.center.y, position.z))
            }
            _ => self.fallback.probe_ground(position),
        }
    }
}

fn within_reach(player: Vec3, item: Vec3, radius: f32, height: f32) -> bool {
    let horizontal = Vec3::new(item.x - player.x, 0.0, item.z - player.z).length();
    let rise = item.y - player.y;
    horizontal <= radius && rise >= -radius && rise <= height
}
