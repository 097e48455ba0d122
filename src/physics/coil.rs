//! The tensor coil: a helical accelerator topology.
//!
//! The coil is a pure function of space. It rifles entities around its
//! axis, railguns them forward, opens a hyperdrive lane toward attractors,
//! and doubles as an incubator where wave-DNA carriers interfere.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::f64::consts::{PI, TAU};

use crate::entity::{Attractor, Entity, PhysicsState};
use crate::math::{Quaternion, Vector3};
use crate::tensor::{ResonanceKind, SoulTensor};

/// Entities this far beyond the nominal radius still sit in the coil's
/// incubation womb.
const INCUBATION_REACH: f64 = 5.0;
/// Two parents must be this close for their waves to interfere.
const INTERFERENCE_DISTANCE: f64 = 1.0;
/// Every interference attempt burns this fraction of each parent.
const INCUBATION_COST: f64 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoilStructure {
    /// Main direction of the flow.
    pub axis: Vector3,
    pub center: Vector3,
    pub radius: f64,
    /// How tightly the field spirals.
    pub frequency: f64,
    /// Acceleration magnitude at the nominal radius.
    pub strength: f64,
}

impl Default for CoilStructure {
    fn default() -> Self {
        Self {
            axis: Vector3::new(0.0, 0.0, 1.0),
            center: Vector3::ZERO,
            radius: 5.0,
            frequency: 1.0,
            strength: 10.0,
        }
    }
}

impl CoilStructure {
    /// Rotation aligning the canonical +Z with the coil axis. Parallel and
    /// antiparallel axes get exact identity / half-turn rotations instead
    /// of a singular cross product.
    fn frame_rotation(&self) -> Quaternion {
        let default_axis = Vector3::new(0.0, 0.0, 1.0);
        let target = self.axis.normalize();

        let alignment = default_axis.dot(&target);
        if alignment.abs() > 0.999 {
            if alignment > 0.0 {
                Quaternion::identity()
            } else {
                Quaternion::from_axis_angle(Vector3::new(1.0, 0.0, 0.0), PI)
            }
        } else {
            let rot_axis = default_axis.cross(&target).normalize();
            let angle = alignment.acos();
            Quaternion::from_axis_angle(rot_axis, angle)
        }
    }

    /// Flow vector at a position. Tangential rifling in the coil plane
    /// plus an axial pitch term, peaking at the nominal radius and
    /// decaying exponentially away from it.
    pub fn field_vector(&self, position: Vector3) -> Vector3 {
        let rotation = self.frame_rotation();
        let inv_rotation = rotation.conjugate();

        let local = inv_rotation.rotate(position - self.center);

        let angle = local.y.atan2(local.x);
        let tangent = Vector3::new(-angle.sin(), angle.cos(), self.frequency).normalize();

        let radial = (local.x * local.x + local.y * local.y).sqrt();
        let intensity = self.strength * (-(radial - self.radius).abs()).exp();

        rotation.rotate(tangent * intensity)
    }

    /// Apply the coil field as a one-tick force.
    pub fn railgun_accelerate(&self, state: &mut PhysicsState, dt: f64) {
        let force = self.field_vector(state.position);
        state.apply_force(force, dt);
    }

    /// Hyperdrive: a zero-resistance flash step. When the body is already
    /// racing at the target, fast and near enough, it skips the remaining
    /// distance and settles just outside the capture radius with zero
    /// velocity. A discrete jump, not an integrated motion.
    pub fn superconduct(&self, state: &mut PhysicsState, target: &Attractor) -> bool {
        let to_target = target.position - state.position;
        let dist = to_target.magnitude();

        if dist == 0.0 {
            return false;
        }

        let speed = state.velocity.magnitude();
        let alignment = if speed > 0.0 {
            state.velocity.normalize().dot(&to_target.normalize())
        } else {
            0.0
        };

        if alignment > 0.8 && speed > 10.0 && dist < 300.0 {
            let offset = to_target.normalize() * (target.radius * 1.1);
            state.position = target.position - offset;
            state.velocity = Vector3::ZERO;
            return true;
        }

        false
    }

    /// Quantum breeding inside the coil womb. Pairs of wave-DNA carriers
    /// within interference distance attempt interference: constructive
    /// resonance births a blended child, destructive cancels out. Either
    /// way both parents pay the energy cost, and nobody interferes twice
    /// in the same call.
    pub fn incubate(
        &self,
        entities: &mut [Entity],
        world_time: f64,
        rng: &mut impl Rng,
    ) -> Vec<Entity> {
        let candidates: Vec<usize> = entities
            .iter()
            .enumerate()
            .filter(|(_, e)| {
                e.soul.is_some()
                    && e.data.contains_key("wave_dna")
                    && e.physics.position.distance(&self.center) < self.radius + INCUBATION_REACH
            })
            .map(|(i, _)| i)
            .collect();

        let mut processed: HashSet<usize> = HashSet::new();
        let mut children = Vec::new();

        for (slot, &i) in candidates.iter().enumerate() {
            if processed.contains(&i) {
                continue;
            }
            for &j in &candidates[slot + 1..] {
                if processed.contains(&i) || processed.contains(&j) {
                    continue;
                }

                let dist = entities[i]
                    .physics
                    .position
                    .distance(&entities[j].physics.position);
                if dist >= INTERFERENCE_DISTANCE {
                    continue;
                }

                processed.insert(i);
                processed.insert(j);

                let child = {
                    let (head, tail) = entities.split_at_mut(j);
                    let parent_a = &mut head[i];
                    let parent_b = &mut tail[0];
                    interfere(parent_a, parent_b, world_time, children.len(), rng)
                };

                if let Some(child) = child {
                    children.push(child);
                }
                break;
            }
        }

        children
    }
}

/// One interference event. Both parents burn amplitude; only constructive
/// resonance produces a child.
fn interfere(
    a: &mut Entity,
    b: &mut Entity,
    world_time: f64,
    brood_index: usize,
    rng: &mut impl Rng,
) -> Option<Entity> {
    let resonance = {
        let soul_a = a.soul.as_ref()?;
        let soul_b = b.soul.as_ref()?;
        soul_a.resonate(soul_b)
    };

    let (amp_a, freq_a, phase_a, spin_a, polarity_a) = {
        let soul = a.soul.as_mut()?;
        soul.amplitude *= 1.0 - INCUBATION_COST;
        (
            soul.amplitude,
            soul.frequency,
            soul.phase,
            soul.spin,
            soul.polarity,
        )
    };
    let (amp_b, freq_b, phase_b, spin_b, polarity_b) = {
        let soul = b.soul.as_mut()?;
        soul.amplitude *= 1.0 - INCUBATION_COST;
        (
            soul.amplitude,
            soul.frequency,
            soul.phase,
            soul.spin,
            soul.polarity,
        )
    };

    if resonance.kind != ResonanceKind::Constructive {
        return None;
    }

    // The stronger parent dominates the child's identity.
    let total_amp = amp_a + amp_b;
    let (w_a, w_b) = if total_amp > 0.0 {
        (amp_a / total_amp, amp_b / total_amp)
    } else {
        (0.5, 0.5)
    };

    let mut frequency = freq_a * w_a + freq_b * w_b;
    let mut phase = (phase_a + phase_b) / 2.0;
    let amplitude = (total_amp * 0.4 * resonance.resonance).max(0.1);

    // Mutation jitter keeps the lineage from converging to a single tone.
    frequency *= rng.gen_range(0.9..1.1);
    phase = (phase + rng.gen_range(-0.25..0.25)).rem_euclid(TAU);

    let mut soul = SoulTensor::new(amplitude, frequency.max(0.1), phase);
    soul.spin = if rng.gen_bool(0.5) { spin_a } else { spin_b };
    soul.polarity = if polarity_a == polarity_b {
        polarity_a
    } else if rng.gen_bool(0.5) {
        polarity_a
    } else {
        polarity_b
    };

    let midpoint = (a.physics.position + b.physics.position) * 0.5;
    let offset = Vector3::new(
        rng.gen_range(-0.5..0.5),
        rng.gen_range(-0.5..0.5),
        rng.gen_range(-0.5..0.5),
    );

    let id = format!("incubated_{}_{}", world_time as u64, brood_index);
    let mut child = Entity::with_soul(id, soul, midpoint + offset);
    child.physics.velocity = (a.physics.velocity + b.physics.velocity) * 0.5;
    child.physics.mass = (amplitude * 0.1).max(0.1);
    child
        .data
        .insert("wave_dna".into(), serde_json::json!(true));
    child.data.insert(
        "parents".into(),
        serde_json::json!([a.id.clone(), b.id.clone()]),
    );

    Some(child)
}
