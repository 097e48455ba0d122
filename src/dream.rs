//! Quantum dreaming: a nested simulation to solve deadlocks.
//!
//! When entropy runs past even the intervention threshold, reality is
//! considered fractured. The dreamer forks the world, tries a quarter-turn
//! of spacetime around each principal axis, fast-forwards every fork, and
//! commits the rotation whose future settles calmest. Forks carry no
//! dreamer of their own, so a dream can never dream.

use std::f64::consts::FRAC_PI_2;

use crate::config::DreamKnobs;
use crate::math::{Quaternion, Vector3};
use crate::world::World;

#[derive(Debug, Clone)]
pub struct DreamSystem {
    knobs: DreamKnobs,
    /// Recursion guard. The fork exclusion already prevents nesting, this
    /// keeps an externally misused dreamer honest too.
    dream_depth: u32,
}

impl Default for DreamSystem {
    fn default() -> Self {
        Self::new(DreamKnobs::default())
    }
}

impl DreamSystem {
    pub fn new(knobs: DreamKnobs) -> Self {
        Self {
            knobs,
            dream_depth: 0,
        }
    }

    /// Dream if reality is fractured enough. Acts only at depth zero.
    pub fn step(&mut self, world: &mut World) {
        if self.dream_depth >= self.knobs.max_depth {
            return;
        }

        let entropy = world.consciousness.global_entropy;
        if entropy <= self.knobs.entropy_threshold {
            return;
        }

        tracing::info!(entropy, "reality fractured, initiating dream sequence");

        self.dream_depth += 1;
        let outcomes = self.dream_of_better_future(world);
        self.dream_depth -= 1;

        if let Some(torsion) = select_torsion(&outcomes, self.knobs.commit_threshold) {
            self.commit_torsion(world, torsion);
        }
    }

    /// Run the three fixed hypotheses. Holding one axis of existence
    /// constant and quarter-turning the others mixes the remaining two:
    /// body with spirit, soul with spirit, body with soul.
    fn dream_of_better_future(&self, world: &World) -> Vec<(Quaternion, f64)> {
        let axes = [
            ("holding body (x)", Vector3::new(1.0, 0.0, 0.0)),
            ("holding soul (y)", Vector3::new(0.0, 1.0, 0.0)),
            ("holding spirit (z)", Vector3::new(0.0, 0.0, 1.0)),
        ];

        let mut outcomes = Vec::new();

        for (label, axis) in axes {
            let torsion = Quaternion::from_axis_angle(axis, FRAC_PI_2);

            let mut fork = match world.fork() {
                Ok(fork) => fork,
                Err(err) => {
                    tracing::warn!(label, error = %err, "dream fork failed, skipping hypothesis");
                    continue;
                }
            };

            fork.physics.torsion = Some(torsion);
            for _ in 0..self.knobs.simulation_ticks {
                fork.step(1.0);
            }

            let future_entropy = fork.consciousness.global_entropy;
            tracing::debug!(label, future_entropy, "dream path evaluated");
            outcomes.push((torsion, future_entropy));
        }

        outcomes
    }

    /// Rotate real spacetime and reset the consciousness cooldown so it
    /// does not immediately override the new order.
    pub fn commit_torsion(&self, world: &mut World, torsion: Quaternion) {
        world.physics.torsion = Some(torsion);
        world.consciousness.last_intervention_tick = world.physics.tick;

        tracing::info!("solution found, rotating spacetime");
    }
}

/// Pick the hypothesis with the lowest resulting entropy, if any settles
/// below the commit threshold. Ties keep the earliest candidate.
pub fn select_torsion(outcomes: &[(Quaternion, f64)], threshold: f64) -> Option<Quaternion> {
    let mut best: Option<(Quaternion, f64)> = None;

    for &(torsion, entropy) in outcomes {
        if best.map_or(true, |(_, e)| entropy < e) {
            best = Some((torsion, entropy));
        }
    }

    match best {
        Some((torsion, entropy)) if entropy < threshold => Some(torsion),
        _ => None,
    }
}
