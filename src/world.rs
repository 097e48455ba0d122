//! The world: an arena of entities and the clock that drives them.
//!
//! Entities live in contiguous, insertion-ordered storage addressed by
//! index; ids resolve through a side map. Iteration order is insertion
//! order everywhere, which is what makes binding, incubation pairing and
//! entangled broadcasts deterministic. Forking the world for a dream is a
//! plain clone of the arena plus a fork of the field service.

use std::collections::HashMap;

use anyhow::Result;

use crate::config::WorldConfig;
use crate::consciousness::GlobalConsciousness;
use crate::dream::DreamSystem;
use crate::entity::{Attractor, Entity, EntityId};
use crate::field::FieldService;
use crate::physics::PhysicsWorld;

/// Insertion-ordered entity arena with id lookup.
#[derive(Debug, Clone, Default)]
pub struct EntityStore {
    entities: Vec<Entity>,
    index: HashMap<EntityId, usize>,
}

impl EntityStore {
    /// Store an entity and return its arena index. Re-inserting an id
    /// replaces the stored entity in place, keeping its original slot.
    pub fn insert(&mut self, entity: Entity) -> usize {
        if let Some(&idx) = self.index.get(&entity.id) {
            self.entities[idx] = entity;
            return idx;
        }

        let idx = self.entities.len();
        self.index.insert(entity.id.clone(), idx);
        self.entities.push(entity);
        idx
    }

    pub fn get(&self, idx: usize) -> Option<&Entity> {
        self.entities.get(idx)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut Entity> {
        self.entities.get_mut(idx)
    }

    pub fn index_of(&self, id: &EntityId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn by_id(&self, id: &EntityId) -> Option<&Entity> {
        self.index_of(id).and_then(|idx| self.get(idx))
    }

    /// Two distinct entities borrowed mutably at once.
    pub fn pair_mut(&mut self, a: usize, b: usize) -> Option<(&mut Entity, &mut Entity)> {
        if a == b || a >= self.entities.len() || b >= self.entities.len() {
            return None;
        }

        if a < b {
            let (head, tail) = self.entities.split_at_mut(b);
            Some((&mut head[a], &mut tail[0]))
        } else {
            let (head, tail) = self.entities.split_at_mut(a);
            Some((&mut tail[0], &mut head[b]))
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    /// The whole arena as a mutable slice, in insertion order. This is
    /// what coil incubation sweeps over.
    pub fn as_mut_slice(&mut self) -> &mut [Entity] {
        &mut self.entities
    }
}

/// The minimal world of the fractal consciousness engine: the entity
/// arena, the physics that moves it, and the meta-controllers that watch
/// the whole.
pub struct World {
    pub time: f64,
    pub store: EntityStore,
    pub physics: PhysicsWorld,
    pub consciousness: GlobalConsciousness,
    /// The dreamer is an explicit named handle. Forks carry `None`, which
    /// is what keeps a dream from dreaming.
    pub dream: Option<DreamSystem>,
}

impl World {
    pub fn new(field: Box<dyn FieldService>) -> Self {
        Self::with_config(&WorldConfig::default(), field)
    }

    pub fn with_config(config: &WorldConfig, field: Box<dyn FieldService>) -> Self {
        Self {
            time: 0.0,
            store: EntityStore::default(),
            physics: PhysicsWorld::with_config(config, field),
            consciousness: GlobalConsciousness::new(config.consciousness.clone()),
            dream: Some(DreamSystem::new(config.dream.clone())),
        }
    }

    /// Store an entity and hand it to physics. Newcomers start active.
    pub fn spawn(&mut self, entity: Entity) -> usize {
        let idx = self.store.insert(entity);
        self.physics.register_entity(idx);
        idx
    }

    pub fn add_attractor(&mut self, attractor: Attractor) {
        self.physics.add_attractor(attractor);
    }

    pub fn tick(&self) -> u64 {
        self.physics.tick
    }

    /// One tick of reality. The physics time scale dilates the caller's
    /// dt, then physics moves the entities, consciousness takes the
    /// measure of the whole, and the dreamer gets its chance to rewrite
    /// spacetime.
    pub fn step(&mut self, dt: f64) {
        let dt = dt * self.physics.time_scale;
        self.time += dt;

        self.physics.step(&mut self.store, dt);
        self.consciousness.step(&mut self.physics, &self.store);

        if let Some(mut dreamer) = self.dream.take() {
            dreamer.step(self);
            self.dream = Some(dreamer);
        }
    }

    /// Structural duplicate for what-if simulation. The fork shares
    /// nothing with the original and carries no dreamer of its own.
    pub fn fork(&self) -> Result<World> {
        Ok(World {
            time: self.time,
            store: self.store.clone(),
            physics: self.physics.fork()?,
            consciousness: self.consciousness.clone(),
            dream: None,
        })
    }

    /// Read-only JSON dump for inspection and logging. Not a persistence
    /// format.
    pub fn snapshot(&self) -> serde_json::Value {
        let entities: Vec<serde_json::Value> = self
            .store
            .iter()
            .map(|e| {
                serde_json::json!({
                    "id": e.id,
                    "position": [e.physics.position.x, e.physics.position.y, e.physics.position.z],
                    "mass": e.physics.mass,
                    "dimension": e.dimension,
                    "bonds": e.bonds.len(),
                    "emotion": e.soul.as_ref().map(|s| s.decode_emotion()),
                })
            })
            .collect();

        serde_json::json!({
            "tick": self.physics.tick,
            "time": self.time,
            "entity_count": self.store.len(),
            "active": self.physics.active.len(),
            "sediments": self.physics.sediments.len(),
            "global_entropy": self.consciousness.global_entropy,
            "world_radius": self.physics.world_radius,
            "entities": entities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::InterferenceField;
    use crate::math::Vector3;
    use crate::tensor::SoulTensor;
    use approx::assert_relative_eq;

    fn world() -> World {
        World::new(Box::new(InterferenceField::new()))
    }

    fn soul_entity(id: &str, x: f64) -> Entity {
        Entity::with_soul(
            id,
            SoulTensor::new(10.0, crate::constants::HORIZON_FREQUENCY, 0.0),
            Vector3::new(x, 0.0, 0.0),
        )
    }

    #[test]
    fn store_keeps_insertion_order() {
        let mut store = EntityStore::default();
        for name in ["first", "second", "third"] {
            store.insert(Entity::new(name));
        }

        let ids: Vec<&str> = store.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
        assert_eq!(store.index_of(&"second".to_string()), Some(1));
    }

    #[test]
    fn reinserting_an_id_keeps_its_slot() {
        let mut store = EntityStore::default();
        store.insert(Entity::new("a"));
        let first = store.insert(Entity::new("b"));

        let mut replacement = Entity::new("b");
        replacement.dimension = 3;
        let second = store.insert(replacement);

        assert_eq!(first, second);
        assert_eq!(store.len(), 2);
        assert_eq!(store.get(first).unwrap().dimension, 3);
    }

    #[test]
    fn pair_mut_refuses_self_and_out_of_range() {
        let mut store = EntityStore::default();
        let a = store.insert(Entity::new("a"));
        let b = store.insert(Entity::new("b"));

        assert!(store.pair_mut(a, a).is_none());
        assert!(store.pair_mut(a, 99).is_none());

        let (ea, eb) = store.pair_mut(b, a).expect("both in range");
        assert_eq!(ea.id, "b");
        assert_eq!(eb.id, "a");
    }

    #[test]
    fn spawn_registers_into_the_active_tier() {
        let mut world = world();
        let idx = world.spawn(soul_entity("wave", 0.0));
        assert_eq!(world.physics.active, vec![idx]);
        assert!(world.physics.sediments.is_empty());
    }

    #[test]
    fn time_scale_dilates_the_caller_dt() {
        let mut world = world();
        world.physics.time_scale = 0.5;
        world.spawn(soul_entity("wave", 0.0));

        world.step(2.0);
        assert_relative_eq!(world.time, 1.0);
        assert_eq!(world.tick(), 1);
    }

    #[test]
    fn fork_is_structurally_independent() {
        let mut world = world();
        world.spawn(soul_entity("wave", 0.0));
        world.spawn(soul_entity("other", 30.0));

        let mut fork = world.fork().expect("reference field forks");
        assert!(fork.dream.is_none());

        for _ in 0..10 {
            fork.step(1.0);
        }

        assert_eq!(world.tick(), 0);
        assert_relative_eq!(world.time, 0.0);
        let original = world.store.by_id(&"wave".to_string()).unwrap();
        assert_eq!(original.physics.position, Vector3::ZERO);
        assert_eq!(fork.tick(), 10);
    }

    #[test]
    fn snapshot_reports_the_partition() {
        let mut world = world();
        world.spawn(soul_entity("wave", 0.0));
        world.step(0.1);

        let snap = world.snapshot();
        assert_eq!(snap["tick"], 1);
        assert_eq!(snap["entity_count"], 1);
        assert_eq!(snap["active"], 1);
        assert_eq!(snap["sediments"], 0);
        assert_eq!(snap["entities"][0]["id"], "wave");
    }
}
