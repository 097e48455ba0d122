//! The field-service boundary.
//!
//! The physics loop never computes spatial interference itself. Once per
//! tick it hands the field service a full snapshot of everything that
//! radiates (the bloom), then queries forces against that frozen snapshot
//! while entities move. The service is opaque and deterministic; this
//! module defines the contract and ships one reference implementation so
//! the kernel runs hermetically.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::constants::{GRAVITY_EPSILON, WORLD_UP};
use crate::math::{Quaternion, Vector3, Vector4};
use crate::tensor::SoulTensor;

/// One radiating point in the bloom snapshot: a spacetime position plus
/// the wave state standing at it.
pub type FieldSample = (Vector4, SoulTensor);

pub trait FieldService {
    /// Ingest the tick's bloom snapshot. Called exactly once per tick,
    /// before any entity moves.
    fn update_field(&mut self, samples: &[FieldSample]);

    /// Raw field value at a spacetime position, as a 4-component sample.
    fn sample_field(&self, position: Vector4, tick: u64) -> [f64; 4];

    /// Geodesic flow at a position for a given soul: a 4D force whose
    /// spatial part drives motion, and a local rotor describing the twist
    /// of the flow there.
    fn local_forces(&self, position: Vector4, soul: &SoulTensor) -> (Vector4, Quaternion);

    /// Duplicate the service for a forked world. A service backed by
    /// external state may refuse.
    fn fork(&self) -> Result<Box<dyn FieldService>>;
}

/// Reference field: every sample radiates a phase-coherent wave with
/// exponential falloff, and the local flow pulls toward what resonates
/// with you and away from what cancels you.
#[derive(Debug, Clone, Default)]
pub struct InterferenceField {
    samples: Vec<StoredSample>,
}

#[derive(Debug, Clone)]
struct StoredSample {
    position: Vector3,
    amplitude: f64,
    frequency: f64,
    phase: f64,
    spin: f64,
    polarity: f64,
}

/// Spatial reach of one radiating sample.
const FALLOFF_RATE: f64 = 0.25;
/// Keeps nearby masses from producing unbounded pulls.
const PULL_SCALE: f64 = 0.1;

impl InterferenceField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }
}

impl FieldService for InterferenceField {
    fn update_field(&mut self, samples: &[FieldSample]) {
        self.samples.clear();
        self.samples.extend(samples.iter().map(|(pos, soul)| StoredSample {
            position: pos.xyz(),
            amplitude: soul.amplitude,
            frequency: soul.frequency,
            phase: soul.phase,
            spin: soul.spin,
            polarity: soul.polarity,
        }));
    }

    fn sample_field(&self, position: Vector4, tick: u64) -> [f64; 4] {
        let here = position.xyz();
        let t = tick as f64;
        let mut acc = [0.0; 4];

        for s in &self.samples {
            let diff = s.position - here;
            let falloff = (-diff.magnitude() * FALLOFF_RATE).exp();
            let theta = s.phase + s.frequency * t * 0.001;
            let dir = diff.normalize();

            acc[0] += s.amplitude * falloff * theta.cos();
            acc[1] += s.amplitude * falloff * theta.sin() * dir.x;
            acc[2] += s.amplitude * falloff * theta.sin() * dir.y;
            acc[3] += s.amplitude * falloff * theta.sin() * dir.z;
        }

        acc
    }

    fn local_forces(&self, position: Vector4, soul: &SoulTensor) -> (Vector4, Quaternion) {
        let here = position.xyz();
        let mut force = Vector3::ZERO;
        let mut swirl = 0.0;
        let mut coherent_pull = 0.0;

        for s in &self.samples {
            let diff = s.position - here;
            let dist = diff.magnitude();
            // A sample standing where we stand is our own radiation.
            if dist < GRAVITY_EPSILON {
                continue;
            }

            let mut delta = (soul.phase - s.phase).abs();
            if delta > std::f64::consts::PI {
                delta = std::f64::consts::TAU - delta;
            }
            let resonance = delta.cos() * soul.polarity * s.polarity;

            let falloff = (-dist * FALLOFF_RATE).exp();
            let magnitude = s.amplitude * resonance * falloff * PULL_SCALE;

            force += diff.normalize() * magnitude;
            swirl += s.spin * s.amplitude * falloff;
            coherent_pull += magnitude;
        }

        let rotor = Quaternion::from_axis_angle(
            WORLD_UP,
            (swirl * 0.01).clamp(-std::f64::consts::PI, std::f64::consts::PI),
        );

        (Vector4::from_spatial(force, coherent_pull), rotor)
    }

    fn fork(&self) -> Result<Box<dyn FieldService>> {
        Ok(Box::new(self.clone()))
    }
}

/// The holographic boundary: a ring of still souls painted on the world
/// shell. Purely a bloom contributor, it gives the field a horizon to
/// interfere against and makes cosmic expansion observable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HolographicBoundary {
    /// Number of boundary points on the ring.
    pub density: usize,
    /// Amplitude radiated by each point.
    pub amplitude: f64,
}

impl HolographicBoundary {
    pub fn new(density: usize, amplitude: f64) -> Self {
        Self { density, amplitude }
    }

    /// Boundary samples for the current world radius, evenly spaced on
    /// the equatorial ring.
    pub fn samples(&self, world_radius: f64, time: f64) -> Vec<FieldSample> {
        (0..self.density)
            .map(|i| {
                let angle = std::f64::consts::TAU * (i as f64) / (self.density.max(1) as f64);
                let position = Vector3::new(
                    world_radius * angle.cos(),
                    world_radius * angle.sin(),
                    0.0,
                );
                (
                    Vector4::from_spatial(position, time),
                    SoulTensor::neutral(self.amplitude),
                )
            })
            .collect()
    }
}
