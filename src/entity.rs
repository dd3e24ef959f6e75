//! Spawned-entity records. Every world object the controller creates is a plain record with a
//! kind tag fixed at creation; behaviour is looked up from the kind's capability table rather
//! than discovered from attached components or display names.

use std::fmt;

use bevy::math::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::boundary::BoundaryRegion;
use crate::float::FloatMotion;
use crate::state::GameMode;

/// Stable handle for a pooled entity. Ids are never reused within a controller's lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub(crate) u32);

impl EntityId {
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityKind {
    CollectibleObject,
    Banana,
    PlatformElement,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::CollectibleObject,
        EntityKind::Banana,
        EntityKind::PlatformElement,
    ];

    /// The only mode in which entities of this kind may be active.
    pub fn owning_mode(self) -> GameMode {
        match self {
            EntityKind::CollectibleObject => GameMode::ObjectSearch,
            EntityKind::Banana | EntityKind::PlatformElement => GameMode::PlatformGame,
        }
    }

    pub fn floats(self) -> bool {
        matches!(self, EntityKind::CollectibleObject)
    }

    /// Whether an active entity of this kind takes part in pickup/tap handling.
    pub fn collides(self) -> bool {
        matches!(self, EntityKind::CollectibleObject | EntityKind::Banana)
    }

    /// Session-scoped kinds are destroyed on mode exit instead of being pooled.
    pub fn session_scoped(self) -> bool {
        matches!(self, EntityKind::Banana | EntityKind::PlatformElement)
    }

    pub fn default_body(self) -> BodyKind {
        match self {
            EntityKind::CollectibleObject | EntityKind::Banana => BodyKind::Trigger,
            EntityKind::PlatformElement => BodyKind::RigidBody,
        }
    }
}

/// How the host should simulate an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Overlap-only volume, never pushed around.
    Trigger,
    /// Physics-driven body. Must not coexist with a character mover.
    RigidBody,
    /// Moved explicitly through a `CharacterMover`.
    Kinematic,
}

#[derive(Debug, Clone)]
pub struct SpawnedEntity {
    pub id: EntityId,
    pub kind: EntityKind,
    pub name: String,
    pub position: Vec3,
    pub rotation: Quat,
    pub active: bool,
    pub body: BodyKind,
    pub float: Option<FloatMotion>,
    pub boundary: Option<BoundaryRegion>,
    /// Points granted when collected. Reset on every reactivation.
    pub value: u32,
}

impl SpawnedEntity {
    pub(crate) fn new(id: EntityId, kind: EntityKind, name: impl Into<String>, position: Vec3) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            position,
            rotation: Quat::IDENTITY,
            active: true,
            body: kind.default_body(),
            float: None,
            boundary: None,
            value: 0,
        }
    }

    pub fn owning_mode(&self) -> GameMode {
        self.kind.owning_mode()
    }

    pub fn is_interactable(&self) -> bool {
        self.active && self.kind.collides()
    }
}
