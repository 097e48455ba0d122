//! The Whole observing the parts.
//!
//! Global consciousness derives population-level metrics from the active
//! souls and, when chaos crosses the line, bends the universal constants
//! to restore order.

use serde::{Deserialize, Serialize};

use crate::config::ConsciousnessKnobs;
use crate::math::Vector3;
use crate::physics::PhysicsWorld;
use crate::world::EntityStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConsciousness {
    /// 1.0 when every phase points its own way, 0.0 at perfect unison.
    pub global_entropy: f64,
    /// Magnitude of the mean unit-phase vector over the active souls.
    pub alignment_score: f64,
    pub last_intervention_tick: u64,
    knobs: ConsciousnessKnobs,
}

impl Default for GlobalConsciousness {
    fn default() -> Self {
        Self::new(ConsciousnessKnobs::default())
    }
}

impl GlobalConsciousness {
    pub fn new(knobs: ConsciousnessKnobs) -> Self {
        Self {
            global_entropy: 0.0,
            alignment_score: 0.0,
            last_intervention_tick: 0,
            knobs,
        }
    }

    /// Recompute metrics, then intervene if entropy runs critical and the
    /// cooldown has passed.
    pub fn step(&mut self, physics: &mut PhysicsWorld, store: &EntityStore) {
        self.calculate_metrics(physics, store);

        if self.global_entropy > self.knobs.entropy_threshold
            && physics.tick.saturating_sub(self.last_intervention_tick) > self.knobs.cooldown_ticks
        {
            self.restore_order(physics);
        }
    }

    /// Map every active soul's phase onto the unit circle and average.
    /// Aligned populations produce a long mean vector; scattered ones
    /// cancel to nothing.
    pub fn calculate_metrics(&mut self, physics: &PhysicsWorld, store: &EntityStore) {
        let mut phase_sum = Vector3::ZERO;
        let mut count = 0usize;

        for &idx in &physics.active {
            let Some(entity) = store.get(idx) else { continue };
            let Some(soul) = entity.soul.as_ref() else { continue };

            count += 1;
            phase_sum += Vector3::new(soul.phase.cos(), soul.phase.sin(), 0.0);
        }

        if count == 0 {
            self.alignment_score = 0.0;
            self.global_entropy = 0.0;
            return;
        }

        self.alignment_score = (phase_sum * (1.0 / count as f64)).magnitude();
        self.global_entropy = 1.0 - self.alignment_score;
    }

    /// Divine intervention: tighten gravity to pull the scattered flock
    /// back together. Clamped so the universe never becomes a crusher.
    pub fn restore_order(&mut self, physics: &mut PhysicsWorld) {
        self.last_intervention_tick = physics.tick;

        physics.gravity_constant =
            (physics.gravity_constant * self.knobs.gravity_boost).min(self.knobs.gravity_ceiling);

        tracing::info!(
            entropy = self.global_entropy,
            gravity = physics.gravity_constant,
            "entropy critical, gravity intensified"
        );
    }

    /// The other intervention: when the world stagnates, double the
    /// soul-field coupling to spark change.
    pub fn spark_change(&mut self, physics: &mut PhysicsWorld) {
        self.last_intervention_tick = physics.tick;
        physics.coupling_constant *= 2.0;

        tracing::info!(
            coupling = physics.coupling_constant,
            "stagnation detected, soul coupling increased"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;
    use crate::field::InterferenceField;
    use crate::tensor::SoulTensor;
    use approx::assert_relative_eq;
    use std::f64::consts::TAU;

    fn physics() -> PhysicsWorld {
        PhysicsWorld::new(Box::new(InterferenceField::new()))
    }

    fn populate(store: &mut EntityStore, physics: &mut PhysicsWorld, phases: &[f64]) {
        for (i, &phase) in phases.iter().enumerate() {
            let idx = store.insert(Entity::with_soul(
                format!("s{i}"),
                SoulTensor::new(10.0, 1.0, phase),
                Vector3::new(i as f64 * 10.0, 0.0, 0.0),
            ));
            physics.register_entity(idx);
        }
    }

    #[test]
    fn unison_means_zero_entropy() {
        let mut physics = physics();
        let mut store = EntityStore::default();
        populate(&mut store, &mut physics, &[1.0, 1.0, 1.0, 1.0]);

        let mut gc = GlobalConsciousness::default();
        gc.calculate_metrics(&physics, &store);

        assert_relative_eq!(gc.alignment_score, 1.0, epsilon = 1e-12);
        assert_relative_eq!(gc.global_entropy, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn scattered_phases_mean_high_entropy() {
        let mut physics = physics();
        let mut store = EntityStore::default();
        let phases: Vec<f64> = (0..8).map(|i| TAU * i as f64 / 8.0).collect();
        populate(&mut store, &mut physics, &phases);

        let mut gc = GlobalConsciousness::default();
        gc.calculate_metrics(&physics, &store);

        assert!(gc.global_entropy > 0.99);
    }

    #[test]
    fn empty_world_rests_at_zero_entropy() {
        let physics = physics();
        let store = EntityStore::default();
        let mut gc = GlobalConsciousness::default();
        gc.calculate_metrics(&physics, &store);
        assert_eq!(gc.global_entropy, 0.0);
    }

    #[test]
    fn intervention_respects_the_cooldown() {
        let mut physics = physics();
        let mut store = EntityStore::default();
        let phases: Vec<f64> = (0..8).map(|i| TAU * i as f64 / 8.0).collect();
        populate(&mut store, &mut physics, &phases);

        let mut gc = GlobalConsciousness::default();

        // 10 ticks since the last intervention: too soon.
        gc.last_intervention_tick = 40;
        physics.tick = 50;
        let gravity_before = physics.gravity_constant;
        gc.step(&mut physics, &store);
        assert_eq!(physics.gravity_constant, gravity_before);
        assert_eq!(gc.last_intervention_tick, 40);

        // 51 ticks since: the heavens move.
        physics.tick = 91;
        gc.step(&mut physics, &store);
        assert_relative_eq!(physics.gravity_constant, gravity_before * 1.5);
        assert_eq!(gc.last_intervention_tick, 91);
    }

    #[test]
    fn gravity_clamps_at_the_ceiling() {
        let mut physics = physics();
        let mut store = EntityStore::default();
        let phases: Vec<f64> = (0..8).map(|i| TAU * i as f64 / 8.0).collect();
        populate(&mut store, &mut physics, &phases);

        let mut gc = GlobalConsciousness::default();
        physics.gravity_constant = 40.0;
        physics.tick = 100;
        gc.step(&mut physics, &store);

        // 40 * 1.5 = 60 would overshoot; the clamp holds at 50.
        assert_relative_eq!(physics.gravity_constant, 50.0);
    }

    #[test]
    fn calm_populations_are_left_alone() {
        let mut physics = physics();
        let mut store = EntityStore::default();
        populate(&mut store, &mut physics, &[0.5, 0.5, 0.6]);

        let mut gc = GlobalConsciousness::default();
        physics.tick = 1000;
        let gravity_before = physics.gravity_constant;
        gc.step(&mut physics, &store);
        assert_eq!(physics.gravity_constant, gravity_before);
    }

    #[test]
    fn spark_change_doubles_the_coupling() {
        let mut physics = physics();
        let mut gc = GlobalConsciousness::default();
        gc.spark_change(&mut physics);
        assert_relative_eq!(physics.coupling_constant, 2.0);
    }
}
