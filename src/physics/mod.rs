//! The per-tick physics orchestration.
//!
//! Each tick runs two disciplines back to back. First the Eulerian bloom:
//! every radiating thing in the world is snapshotted into the field
//! service before anything moves, so all forces this tick see one
//! consistent universe. Then the Lagrangian sweep: each active entity is
//! governed, possibly sunk into the abyss, accelerated along the geodesic
//! flow, and bonded or entangled with its neighbors. Sediments get a
//! cheap inertia-only existence with a periodic chance of redemption.

pub mod coil;
pub mod topology;

pub use coil::CoilStructure;
pub use topology::{GravityPath, TensorGate};

use anyhow::Result;
use std::collections::HashSet;

use crate::config::WorldConfig;
use crate::constants::{
    BINDING_DISTANCE, BINDING_RESONANCE, ENTANGLE_DISTANCE, ENTANGLE_RESONANCE,
    FORWARD_AXIS, HORIZON_FREQUENCY,
};
use crate::entity::{Attractor, Entity};
use crate::field::{FieldSample, FieldService, HolographicBoundary};
use crate::math::Vector4;
use crate::tensor::SoulTensor;
use crate::world::EntityStore;

pub struct PhysicsWorld {
    /// Arena indices of entities riding the wave. Insertion order is the
    /// deterministic tie-break for binding and incubation.
    pub active: Vec<usize>,
    /// Arena indices of entities settled in the abyss.
    pub sediments: Vec<usize>,
    pub attractors: Vec<Attractor>,
    pub coils: Vec<CoilStructure>,
    pub paths: Vec<GravityPath>,
    pub gates: Vec<TensorGate>,

    pub gravity_constant: f64,
    pub coupling_constant: f64,
    pub time_scale: f64,
    pub expansion_rate: f64,
    pub world_radius: f64,
    pub abyss_threshold: f64,
    pub review_interval: u64,
    pub inertia_damping: f64,

    pub tick: u64,
    /// Global twist applied to every assembled flow force.
    pub torsion: Option<crate::math::Quaternion>,
    pub boundary: Option<HolographicBoundary>,

    field: Box<dyn FieldService>,
}

impl PhysicsWorld {
    pub fn new(field: Box<dyn FieldService>) -> Self {
        Self::with_config(&WorldConfig::default(), field)
    }

    pub fn with_config(config: &WorldConfig, field: Box<dyn FieldService>) -> Self {
        Self {
            active: Vec::new(),
            sediments: Vec::new(),
            attractors: Vec::new(),
            coils: Vec::new(),
            paths: Vec::new(),
            gates: Vec::new(),
            gravity_constant: config.physics.gravity_constant,
            coupling_constant: config.physics.coupling_constant,
            time_scale: config.physics.time_scale,
            expansion_rate: config.physics.expansion_rate,
            world_radius: config.physics.world_radius,
            abyss_threshold: config.sediment.abyss_threshold,
            review_interval: config.sediment.review_interval,
            inertia_damping: config.sediment.inertia_damping,
            tick: 0,
            torsion: None,
            boundary: None,
            field,
        }
    }

    /// Take custody of an already-stored entity. Every living entity
    /// belongs to exactly one tier; newcomers start active.
    pub fn register_entity(&mut self, idx: usize) {
        if !self.active.contains(&idx) && !self.sediments.contains(&idx) {
            self.active.push(idx);
        }
    }

    pub fn add_attractor(&mut self, attractor: Attractor) {
        self.attractors.push(attractor);
    }

    /// Structural duplicate for dream forking. The field service may
    /// refuse, which the dreamer treats as one failed hypothesis.
    pub fn fork(&self) -> Result<PhysicsWorld> {
        Ok(PhysicsWorld {
            active: self.active.clone(),
            sediments: self.sediments.clone(),
            attractors: self.attractors.clone(),
            coils: self.coils.clone(),
            paths: self.paths.clone(),
            gates: self.gates.clone(),
            gravity_constant: self.gravity_constant,
            coupling_constant: self.coupling_constant,
            time_scale: self.time_scale,
            expansion_rate: self.expansion_rate,
            world_radius: self.world_radius,
            abyss_threshold: self.abyss_threshold,
            review_interval: self.review_interval,
            inertia_damping: self.inertia_damping,
            tick: self.tick,
            torsion: self.torsion,
            boundary: self.boundary.clone(),
            field: self.field.fork()?,
        })
    }

    /// One tick. The caller supplies dt; time dilation is already applied
    /// by the owning world.
    pub fn step(&mut self, store: &mut EntityStore, dt: f64) {
        self.tick += 1;
        self.world_radius += self.expansion_rate * dt;

        self.bloom(store);

        let order = self.active.clone();
        let mut sank: HashSet<usize> = HashSet::new();

        for (slot, &idx) in order.iter().enumerate() {
            step_soul(store, idx, dt);

            let Some(entity) = store.get_mut(idx) else { continue };
            atmospheric_governance(entity);

            if entity.physics.mass > self.abyss_threshold {
                tracing::debug!(
                    id = %entity.id,
                    mass = entity.physics.mass,
                    "entity sinks into the abyss"
                );
                sank.insert(idx);
                self.sediments.push(idx);
                continue;
            }

            self.integrate_entity(store, idx, dt);
            bind_neighbors(store, idx, &order[slot + 1..], &sank);
        }

        self.active.retain(|i| !sank.contains(i));

        if self.tick % self.review_interval == 0 {
            self.review_sediments(store, dt);
        }
    }

    /// Eulerian snapshot: gather every radiating position before any
    /// entity moves. Attractors and soulless entities radiate neutral
    /// souls of their own mass; the holographic boundary contributes its
    /// ring.
    fn bloom(&mut self, store: &EntityStore) {
        let t = self.tick as f64;
        let mut samples: Vec<FieldSample> = Vec::new();

        for &idx in self.active.iter().chain(self.sediments.iter()) {
            let Some(entity) = store.get(idx) else { continue };
            let soul = entity
                .soul
                .clone()
                .unwrap_or_else(|| SoulTensor::neutral(entity.physics.mass));
            samples.push((Vector4::from_spatial(entity.physics.position, t), soul));
        }

        for att in &self.attractors {
            let soul = att
                .soul
                .clone()
                .unwrap_or_else(|| SoulTensor::neutral(att.mass));
            samples.push((Vector4::from_spatial(att.position, t), soul));
        }

        if let Some(boundary) = &self.boundary {
            samples.extend(boundary.samples(self.world_radius, t));
        }

        self.field.update_field(&samples);
    }

    /// Assemble the hybrid force for one active entity and integrate it.
    fn integrate_entity(&self, store: &mut EntityStore, idx: usize, dt: f64) {
        let Some(entity) = store.get_mut(idx) else { return };
        let pos = entity.physics.position;
        let pos4 = Vector4::from_spatial(pos, self.tick as f64);

        let neutral;
        let soul_ref = match entity.soul.as_ref() {
            Some(s) => s,
            None => {
                neutral = SoulTensor::neutral(entity.physics.mass);
                &neutral
            }
        };

        // Geodesic flow, spiraled by the damped local rotor.
        let (force4, rotor) = self.field.local_forces(pos4, soul_ref);
        let damped = rotor.scale_bivector(0.1);
        let mut total = damped.rotate(force4.xyz()) * self.coupling_constant;

        for att in &self.attractors {
            total += att.calculate_force(pos, self.gravity_constant);
        }
        for c in &self.coils {
            total += c.field_vector(pos);
        }
        for p in &self.paths {
            total += p.calculate_force(&entity.physics);
        }

        let energy = entity
            .soul
            .as_ref()
            .map(|s| s.total_energy())
            .unwrap_or(0.0);
        for g in &self.gates {
            total += g.calculate_interaction(&entity.physics, energy);
        }

        // A living wave pushes itself forward.
        if let Some(soul) = entity.soul.as_ref() {
            if !soul.collapsed {
                total += soul.orientation.rotate(FORWARD_AXIS) * (soul.amplitude * 0.1);
            }
        }

        if let Some(torsion) = self.torsion {
            total = torsion.rotate(total);
        }

        entity.physics.apply_force(total, dt);
        entity.physics.integrate(dt);
    }

    /// The redemption hearing. Sediments whose governed mass has fallen
    /// back under the threshold rejoin the wave; the rest coast with
    /// damped inertia and no field query.
    fn review_sediments(&mut self, store: &mut EntityStore, dt: f64) {
        let held = self.sediments.clone();
        let mut redeemed: HashSet<usize> = HashSet::new();

        for &idx in &held {
            let Some(entity) = store.get_mut(idx) else { continue };
            atmospheric_governance(entity);

            if entity.physics.mass <= self.abyss_threshold {
                tracing::debug!(id = %entity.id, "redemption: sediment rises back to the wave");
                redeemed.insert(idx);
                self.active.push(idx);
            } else {
                entity.physics.velocity = entity.physics.velocity * self.inertia_damping;
                entity.physics.integrate(dt);
            }
        }

        self.sediments.retain(|i| !redeemed.contains(i));
    }
}

/// Entropy-to-mass feedback. Baggage, bonds, and dissonance from the
/// horizon frequency all weigh a soul down; heavy turbulence also bleeds
/// velocity. Returns the computed entropy.
pub fn atmospheric_governance(entity: &mut Entity) -> f64 {
    let data_entropy = entity.data_weight() * 0.01;
    let bond_entropy = entity.bonds.len() as f64;
    let dissonance = entity
        .soul
        .as_ref()
        .map(|s| (s.frequency - HORIZON_FREQUENCY).abs() * 10.0)
        .unwrap_or(0.0);

    let entropy = data_entropy + bond_entropy + dissonance;
    entity.physics.mass = (1.0 + entropy * 0.5).max(1.0);

    if entropy > 10.0 {
        entity.physics.velocity = entity.physics.velocity * 0.95;
    }

    entropy
}

/// Evolve one soul's wave and broadcast the new phase to its entangled
/// peers. One-way, last writer wins: members step in registry order and
/// the final shared phase belongs to whoever stepped last.
fn step_soul(store: &mut EntityStore, idx: usize, dt: f64) {
    let (phase, peers) = {
        let Some(entity) = store.get_mut(idx) else { return };
        let Some(soul) = entity.soul.as_mut() else { return };
        soul.step(dt);
        if soul.entangled.is_empty() {
            return;
        }
        (soul.phase, soul.entangled.clone())
    };

    for peer_id in peers {
        let Some(peer_idx) = store.index_of(&peer_id) else { continue };
        if peer_idx == idx {
            continue;
        }
        if let Some(peer) = store.get_mut(peer_idx) {
            if let Some(peer_soul) = peer.soul.as_mut() {
                if !peer_soul.collapsed {
                    peer_soul.phase = phase;
                }
            }
        }
    }
}

/// Scan later actives for bonding and entanglement. Each unordered pair
/// is visited once per tick, in insertion order.
fn bind_neighbors(store: &mut EntityStore, idx: usize, later: &[usize], sank: &HashSet<usize>) {
    for &j in later {
        if sank.contains(&j) {
            continue;
        }
        let Some((a, b)) = store.pair_mut(idx, j) else { continue };

        let dist = a.physics.position.distance(&b.physics.position);
        if dist >= BINDING_DISTANCE {
            continue;
        }

        let resonance = match (a.soul.as_ref(), b.soul.as_ref()) {
            (Some(sa), Some(sb)) => sa.resonate(sb).resonance,
            _ => continue,
        };

        if resonance > BINDING_RESONANCE {
            let a_id = a.id.clone();
            let b_id = b.id.clone();
            a.add_bond(&b_id);
            b.add_bond(&a_id);

            // First bond lifts a being out of dimension 0; a second
            // connection opens dimension 2.
            a.dimension = a.dimension.max(1);
            b.dimension = b.dimension.max(1);
            if a.bonds.len() >= 2 {
                a.dimension = a.dimension.max(2);
            }
            if b.bonds.len() >= 2 {
                b.dimension = b.dimension.max(2);
            }
        }

        if dist < ENTANGLE_DISTANCE && resonance > ENTANGLE_RESONANCE {
            let a_id = a.id.clone();
            let b_id = b.id.clone();
            if let (Some(sa), Some(sb)) = (a.soul.as_mut(), b.soul.as_mut()) {
                SoulTensor::entangle(&a_id, sa, &b_id, sb);
            }
        }
    }
}
