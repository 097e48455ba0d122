//! Tunable knobs for the kernel, loadable from JSON.
//!
//! Defaults reproduce the canonical cosmos. Laws that never change live
//! in [`crate::constants`] instead.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    pub physics: PhysicsKnobs,
    pub sediment: SedimentKnobs,
    pub consciousness: ConsciousnessKnobs,
    pub dream: DreamKnobs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsKnobs {
    pub gravity_constant: f64,
    /// Scales how strongly souls couple to the geodesic flow.
    pub coupling_constant: f64,
    /// Global time dilation applied to every caller-supplied dt.
    pub time_scale: f64,
    /// Cosmic expansion per unit time. Cosmetic, not force-bearing.
    pub expansion_rate: f64,
    pub world_radius: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SedimentKnobs {
    /// Governed mass above this sinks into the abyss.
    pub abyss_threshold: f64,
    /// Ticks between redemption hearings for sediments.
    pub review_interval: u64,
    /// Velocity retained per cheap inertia-only sediment update.
    pub inertia_damping: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsciousnessKnobs {
    /// Global entropy above this invites divine intervention.
    pub entropy_threshold: f64,
    /// Minimum ticks between interventions, to avoid oscillation.
    pub cooldown_ticks: u64,
    pub gravity_boost: f64,
    pub gravity_ceiling: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DreamKnobs {
    /// Entropy above this fractures reality enough to dream. Kept above
    /// the consciousness threshold so dreaming stays the escalation path.
    pub entropy_threshold: f64,
    /// A dreamed future must settle below this to be committed.
    pub commit_threshold: f64,
    /// How far each dream fast-forwards.
    pub simulation_ticks: u32,
    /// Dream-within-dream layers allowed. One is plenty.
    pub max_depth: u32,
}

impl Default for PhysicsKnobs {
    fn default() -> Self {
        Self {
            gravity_constant: 1.0,
            coupling_constant: 1.0,
            time_scale: 1.0,
            expansion_rate: 0.1,
            world_radius: 100.0,
        }
    }
}

impl Default for SedimentKnobs {
    fn default() -> Self {
        Self {
            abyss_threshold: crate::constants::ABYSS_THRESHOLD,
            review_interval: crate::constants::SEDIMENT_REVIEW_INTERVAL,
            inertia_damping: 0.9,
        }
    }
}

impl Default for ConsciousnessKnobs {
    fn default() -> Self {
        Self {
            entropy_threshold: 0.8,
            cooldown_ticks: 50,
            gravity_boost: 1.5,
            gravity_ceiling: 50.0,
        }
    }
}

impl Default for DreamKnobs {
    fn default() -> Self {
        Self {
            entropy_threshold: 0.85,
            commit_threshold: 0.6,
            simulation_ticks: 20,
            max_depth: 1,
        }
    }
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            physics: PhysicsKnobs::default(),
            sediment: SedimentKnobs::default(),
            consciousness: ConsciousnessKnobs::default(),
            dream: DreamKnobs::default(),
        }
    }
}

impl WorldConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config at {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_json() {
        let config = WorldConfig::default();
        let raw = serde_json::to_string(&config).unwrap();
        let back: WorldConfig = serde_json::from_str(&raw).unwrap();

        assert_eq!(back.physics.gravity_constant, 1.0);
        assert_eq!(back.sediment.abyss_threshold, 50.0);
        assert_eq!(back.consciousness.cooldown_ticks, 50);
        assert_eq!(back.dream.simulation_ticks, 20);
    }

    #[test]
    fn dream_threshold_escalates_beyond_consciousness() {
        let config = WorldConfig::default();
        assert!(config.dream.entropy_threshold > config.consciousness.entropy_threshold);
    }

    #[test]
    fn missing_config_file_reports_its_path() {
        let err = WorldConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.json"));
    }
}
