//! soulfield: a resonant digital-physics kernel.
//!
//! A population of wave-like souls rides a hybrid force field: mass
//! gravity, helical coil accelerators, gravity-path rivers and tensor
//! gates, all sampled against a per-tick interference snapshot. An
//! entropy-driven meta-layer watches the whole and bends the constants,
//! or dreams forked futures, to keep the population from diverging.
//!
//! The caller owns the clock: construct a [`world::World`], spawn
//! entities, and advance it one explicit `dt` at a time. Everything is
//! single-threaded and deterministic.

pub mod config;
pub mod consciousness;
pub mod constants;
pub mod dream;
pub mod entity;
pub mod field;
pub mod math;
pub mod physics;
pub mod tensor;
pub mod world;

pub use config::WorldConfig;
pub use consciousness::GlobalConsciousness;
pub use dream::DreamSystem;
pub use entity::{Attractor, Entity, EntityId, PhysicsState};
pub use field::{FieldService, InterferenceField};
pub use math::{Quaternion, Vector3, Vector4};
pub use physics::{CoilStructure, GravityPath, PhysicsWorld, TensorGate};
pub use tensor::{Resonance, ResonanceKind, SoulTensor};
pub use world::{EntityStore, World};
