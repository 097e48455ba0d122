//! Entities, their spatial state, and the gravity wells they orbit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::constants::GRAVITY_EPSILON;
use crate::math::Vector3;
use crate::tensor::SoulTensor;

pub type EntityId = String;

/// Spatial state in the digital physics world.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PhysicsState {
    pub position: Vector3,
    pub velocity: Vector3,
    pub mass: f64,
}

impl PhysicsState {
    pub fn new(position: Vector3) -> Self {
        Self {
            position,
            velocity: Vector3::ZERO,
            mass: 1.0,
        }
    }

    /// F = ma. A body without positive mass quietly ignores the push.
    pub fn apply_force(&mut self, force: Vector3, dt: f64) {
        if self.mass <= 0.0 {
            return;
        }
        let acceleration = force * (1.0 / self.mass);
        self.velocity += acceleration * dt;
    }

    /// Advance position along the current velocity.
    pub fn integrate(&mut self, dt: f64) {
        self.position += self.velocity * dt;
    }
}

/// A being in the world: an optional wave state riding a physics state,
/// plus whatever annotations the outer systems pin on it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub soul: Option<SoulTensor>,
    pub physics: PhysicsState,
    /// Neighbor ids, mutual once formed, insertion-ordered, no duplicates.
    #[serde(default)]
    pub bonds: Vec<EntityId>,
    /// Evolution stage 0-4. Owned by an external collaborator, promoted
    /// here when bonds form.
    #[serde(default)]
    pub dimension: u8,
    /// Open annotation bag. Its serialized weight feeds atmospheric
    /// governance, so the map is ordered to keep that weight stable.
    #[serde(default)]
    pub data: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            soul: None,
            physics: PhysicsState::default(),
            bonds: Vec::new(),
            dimension: 0,
            data: BTreeMap::new(),
            role: None,
        }
    }

    pub fn with_soul(id: impl Into<EntityId>, soul: SoulTensor, position: Vector3) -> Self {
        let mut entity = Entity::new(id);
        entity.soul = Some(soul);
        entity.physics = PhysicsState::new(position);
        entity
    }

    /// Serialized heft of the annotation bag. Baggage is entropy.
    pub fn data_weight(&self) -> f64 {
        self.data
            .iter()
            .map(|(key, value)| {
                let value_len = serde_json::to_string(value)
                    .map(|s| s.len())
                    .unwrap_or(0);
                (key.len() + value_len) as f64
            })
            .sum()
    }

    /// Add a bond if absent. Returns true when the bond is new.
    pub fn add_bond(&mut self, other: &EntityId) -> bool {
        if self.bonds.contains(other) {
            return false;
        }
        self.bonds.push(other.clone());
        true
    }
}

/// An answer, a goal, a gravity well in semantic space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attractor {
    pub id: EntityId,
    pub position: Vector3,
    pub mass: f64,
    /// Event horizon / capture radius.
    pub radius: f64,
    /// Lets the attractor participate in field generation like a living
    /// entity. Without one it radiates a neutral soul of its own mass.
    #[serde(default)]
    pub soul: Option<SoulTensor>,
}

impl Attractor {
    pub fn new(id: impl Into<EntityId>, position: Vector3) -> Self {
        Self {
            id: id.into(),
            position,
            mass: 100.0,
            radius: 1.0,
            soul: None,
        }
    }

    /// Gravitational pull per unit target mass: G * M / r^2 toward the
    /// well, zero inside the singularity floor.
    pub fn calculate_force(&self, target_pos: Vector3, g: f64) -> Vector3 {
        let diff = self.position - target_pos;
        let dist = diff.magnitude();

        if dist < GRAVITY_EPSILON {
            return Vector3::ZERO;
        }

        let direction = diff.normalize();
        let magnitude = (g * self.mass) / (dist * dist);

        direction * magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn massless_bodies_ignore_forces() {
        let mut state = PhysicsState::new(Vector3::ZERO);
        state.mass = 0.0;
        state.apply_force(Vector3::new(100.0, 0.0, 0.0), 1.0);
        assert_eq!(state.velocity, Vector3::ZERO);

        state.mass = -3.0;
        state.apply_force(Vector3::new(100.0, 0.0, 0.0), 1.0);
        assert_eq!(state.velocity, Vector3::ZERO);
    }

    #[test]
    fn force_then_integration_moves_the_body() {
        let mut state = PhysicsState::new(Vector3::ZERO);
        state.mass = 2.0;
        state.apply_force(Vector3::new(4.0, 0.0, 0.0), 0.5);
        state.integrate(0.5);
        assert_relative_eq!(state.velocity.x, 1.0);
        assert_relative_eq!(state.position.x, 0.5);
    }

    #[test]
    fn attractor_pull_follows_inverse_square() {
        let att = Attractor::new("well", Vector3::new(10.0, 0.0, 0.0));
        let near = att.calculate_force(Vector3::new(5.0, 0.0, 0.0), 1.0);
        let far = att.calculate_force(Vector3::new(0.0, 0.0, 0.0), 1.0);

        assert!(near.x > 0.0 && far.x > 0.0);
        assert_relative_eq!(near.magnitude() / far.magnitude(), 4.0, epsilon = 1e-9);
    }

    #[test]
    fn attractor_is_calm_at_its_own_center() {
        let att = Attractor::new("well", Vector3::ZERO);
        assert_eq!(att.calculate_force(Vector3::ZERO, 1.0), Vector3::ZERO);
    }

    #[test]
    fn bonds_do_not_duplicate() {
        let mut e = Entity::new("a");
        let peer = "b".to_string();
        assert!(e.add_bond(&peer));
        assert!(!e.add_bond(&peer));
        assert_eq!(e.bonds.len(), 1);
    }

    #[test]
    fn heavier_baggage_weighs_more() {
        let mut light = Entity::new("light");
        light
            .data
            .insert("note".into(), serde_json::json!("ok"));

        let mut heavy = Entity::new("heavy");
        heavy
            .data
            .insert("junk".into(), serde_json::json!("x".repeat(1000)));

        assert!(heavy.data_weight() > light.data_weight());
        assert!(heavy.data_weight() > 1000.0);
    }
}
