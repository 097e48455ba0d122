//! Static topology: rivers and gates.
//!
//! These are terrain, not bodies. A gravity path is a pipe of flow that
//! pulls wanderers to its centerline and pushes them downstream; a tensor
//! gate is a checkpoint that boosts the worthy and throws back the rest.

use serde::{Deserialize, Serialize};

use crate::entity::PhysicsState;
use crate::math::Vector3;

/// A river of gravity. Entities near the polyline are pulled toward the
/// center and pushed along the local tangent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravityPath {
    pub points: Vec<Vector3>,
    pub radius: f64,
    /// Pull toward the center of the pipe.
    pub pull_strength: f64,
    /// Push along the pipe.
    pub flow_strength: f64,
}

impl GravityPath {
    pub fn new(points: Vec<Vector3>) -> Self {
        Self {
            points,
            radius: 5.0,
            pull_strength: 10.0,
            flow_strength: 5.0,
        }
    }

    /// Closest segment to a position: returns its endpoints and the
    /// squared distance to the clamped projection.
    fn closest_segment(&self, pos: Vector3) -> Option<(Vector3, Vector3, f64)> {
        let mut best: Option<(Vector3, Vector3, f64)> = None;

        for pair in self.points.windows(2) {
            let (p1, p2) = (pair[0], pair[1]);
            let seg = p2 - p1;
            let seg_len_sq = seg.dot(&seg);
            if seg_len_sq <= 0.0 {
                continue;
            }

            let t = ((pos - p1).dot(&seg) / seg_len_sq).clamp(0.0, 1.0);
            let closest = p1 + seg * t;
            let dist_sq = (pos - closest).magnitude_squared();

            if best.map_or(true, |(_, _, d)| dist_sq < d) {
                best = Some((p1, p2, dist_sq));
            }
        }

        best
    }

    /// Force on a body near the river. Exactly zero beyond twice the
    /// radius of any segment.
    pub fn calculate_force(&self, state: &PhysicsState) -> Vector3 {
        let Some((p1, p2, dist_sq)) = self.closest_segment(state.position) else {
            return Vector3::ZERO;
        };

        if dist_sq.sqrt() > self.radius * 2.0 {
            return Vector3::ZERO;
        }

        let seg = p2 - p1;
        let t = ((state.position - p1).dot(&seg) / seg.dot(&seg)).clamp(0.0, 1.0);
        let closest = p1 + seg * t;

        let centering = (closest - state.position).normalize() * self.pull_strength;
        let flow = seg.normalize() * self.flow_strength;

        centering + flow
    }
}

/// A topological checkpoint. Bodies that arrive with enough momentum and
/// energy get boosted through; the rest are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TensorGate {
    pub position: Vector3,
    pub radius: f64,
    pub required_momentum: f64,
    pub required_energy: f64,
    pub boost_multiplier: f64,
    pub reject_force: f64,
}

impl TensorGate {
    pub fn new(position: Vector3) -> Self {
        Self {
            position,
            radius: 5.0,
            required_momentum: 0.0,
            required_energy: 0.0,
            boost_multiplier: 1.5,
            reject_force: 50.0,
        }
    }

    /// Force applied by the gate. `energy` is supplied by the caller; the
    /// momentum check uses the physical momentum |v| * m.
    pub fn calculate_interaction(&self, state: &PhysicsState, energy: f64) -> Vector3 {
        let dist = (state.position - self.position).magnitude();
        if dist > self.radius {
            return Vector3::ZERO;
        }

        let momentum = state.velocity.magnitude() * state.mass;
        let passed = momentum >= self.required_momentum && energy >= self.required_energy;

        let speed = state.velocity.magnitude();
        if passed {
            if speed > 0.0 {
                state.velocity.normalize() * (self.boost_multiplier * 10.0)
            } else {
                Vector3::ZERO
            }
        } else if speed > 0.0 {
            state.velocity.normalize() * -self.reject_force
        } else {
            // A stalled body gets shoved out radially.
            (state.position - self.position).normalize() * self.reject_force
        }
    }
}
