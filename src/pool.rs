//! Registry of every entity the controller has spawned. Collectibles are toggled rather than
//! recreated so their ids and positions survive mode switches; session-scoped kinds are removed
//! outright with `destroy_all`.

use std::collections::BTreeMap;

use bevy::math::Vec3;

use crate::entity::{EntityId, EntityKind, SpawnedEntity};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnResult {
    pub id: EntityId,
    pub reused: bool,
}

#[derive(Debug, Default)]
pub struct EntityPool {
    entries: BTreeMap<EntityId, SpawnedEntity>,
    next_id: u32,
}

impl EntityPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reactivates a dormant entity of `kind` at `position`, or registers a new one.
    pub fn spawn_or_reuse(&mut self, kind: EntityKind, name: &str, position: Vec3) -> SpawnResult {
        let dormant = self
            .entries
            .values_mut()
            .find(|entity| entity.kind == kind && !entity.active);

        if let Some(entity) = dormant {
            entity.active = true;
            entity.position = position;
            return SpawnResult {
                id: entity.id,
                reused: true,
            };
        }

        SpawnResult {
            id: self.spawn(kind, name, position),
            reused: false,
        }
    }

    /// Always registers a fresh entity.
    pub fn spawn(&mut self, kind: EntityKind, name: &str, position: Vec3) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        self.entries
            .insert(id, SpawnedEntity::new(id, kind, name, position));
        id
    }

    pub fn get(&self, id: EntityId) -> Option<&SpawnedEntity> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut SpawnedEntity> {
        self.entries.get_mut(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Returns `true` if the entity was active.
    pub fn deactivate(&mut self, id: EntityId) -> bool {
        match self.entries.get_mut(&id) {
            Some(entity) if entity.active => {
                entity.active = false;
                true
            }
            _ => false,
        }
    }

    pub fn deactivate_all(&mut self, kind: EntityKind) -> usize {
        let mut changed = 0;
        for entity in self.entries.values_mut().filter(|e| e.kind == kind) {
            if entity.active {
                entity.active = false;
                changed += 1;
            }
        }
        changed
    }

    /// Activates every entity of `kind` in place. Entities whose kind is listed in `excluding`
    /// are forced inactive in the same pass, so a filtered activation can never leave them
    /// visible.
    pub fn activate_all(&mut self, kind: EntityKind, excluding: &[EntityKind]) -> usize {
        let mut activated = 0;
        for entity in self.entries.values_mut() {
            if excluding.contains(&entity.kind) {
                entity.active = false;
            } else if entity.kind == kind && !entity.active {
                entity.active = true;
                activated += 1;
            }
        }
        activated
    }

    pub fn destroy(&mut self, id: EntityId) -> Option<SpawnedEntity> {
        self.entries.remove(&id)
    }

    pub fn destroy_all(&mut self, kind: EntityKind) -> Vec<EntityId> {
        let doomed: Vec<EntityId> = self.ids(kind).collect();
        for id in &doomed {
            self.entries.remove(id);
        }
        doomed
    }

    pub fn iter(&self) -> impl Iterator<Item = &SpawnedEntity> {
        self.entries.values()
    }

    pub fn ids(&self, kind: EntityKind) -> impl Iterator<Item = EntityId> + '_ {
        self.entries
            .values()
            .filter(move |e| e.kind == kind)
            .map(|e| e.id)
    }

    pub fn active(&self, kind: EntityKind) -> impl Iterator<Item = &SpawnedEntity> {
        self.entries
            .values()
            .filter(move |e| e.kind == kind && e.active)
    }

    pub fn count(&self, kind: EntityKind) -> usize {
        self.ids(kind).count()
    }

    pub fn active_count(&self, kind: EntityKind) -> usize {
        self.active(kind).count()
    }

    pub fn positions(&self, kind: EntityKind) -> Vec<Vec3> {
        self.entries
            .values()
            .filter(|e| e.kind == kind)
            .map(|e| e.position)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reuses_dormant_entity_of_matching_kind() {
        let mut pool = EntityPool::new();
        let first = pool.spawn_or_reuse(EntityKind::CollectibleObject, "Owl", Vec3::X);
        assert!(!first.reused);

        pool.deactivate(first.id);
        let banana = pool.spawn_or_reuse(EntityKind::Banana, "Banana", Vec3::Z);
        assert!(!banana.reused, "dormant owl must not be handed out as a banana");

        let again = pool.spawn_or_reuse(EntityKind::CollectibleObject, "Owl", Vec3::Y);
        assert!(again.reused);
        assert_eq!(again.id, first.id);
        assert_eq!(pool.get(first.id).map(|e| e.position), Some(Vec3::Y));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn activation_keeps_excluded_kinds_dark() {
        let mut pool = EntityPool::new();
        let owl = pool.spawn(EntityKind::CollectibleObject, "Owl", Vec3::ZERO);
        let banana = pool.spawn(EntityKind::Banana, "Banana", Vec3::ONE);
        pool.deactivate(owl);

        let activated = pool.activate_all(EntityKind::CollectibleObject, &[EntityKind::Banana]);

        assert_eq!(activated, 1);
        assert!(pool.get(owl).is_some_and(|e| e.active));
        assert!(pool.get(banana).is_some_and(|e| !e.active));
    }

    #[test]
    fn destroy_all_removes_only_that_kind() {
        let mut pool = EntityPool::new();
        let owl = pool.spawn(EntityKind::CollectibleObject, "Owl", Vec3::ZERO);
        pool.spawn(EntityKind::Banana, "Banana", Vec3::ZERO);
        pool.spawn(EntityKind::Banana, "Banana", Vec3::ZERO);

        let destroyed = pool.destroy_all(EntityKind::Banana);

        assert_eq!(destroyed.len(), 2);
        assert_eq!(pool.count(EntityKind::Banana), 0);
        assert!(pool.contains(owl));
        assert!(pool.destroy_all(EntityKind::Banana).is_empty());
    }

    #[test]
    fn ids_are_not_recycled_after_destroy() {
        let mut pool = EntityPool::new();
        let a = pool.spawn(EntityKind::Banana, "Banana", Vec3::ZERO);
        pool.destroy(a);
        let b = pool.spawn(EntityKind::Banana, "Banana", Vec3::ZERO);
        assert_ne!(a, b);
    }
}
