//! The unified wave-field definition of a being.
//!
//! Three axes of existence:
//! 1. Amplitude (Body): magnitude and intensity. Creates gravity.
//! 2. Frequency (Soul): color and identity. Sets the rifling pitch.
//! 3. Phase (Spirit): timing and rhythm. Decides interaction chemistry.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

use crate::constants::{COLLAPSE_TRANSFER_RATIO, MELT_WAKE_THRESHOLD, WORLD_UP};
use crate::entity::EntityId;
use crate::math::Quaternion;

const TAU: f64 = 2.0 * PI;

/// Chemistry classification between two souls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResonanceKind {
    /// Empathy. Waves reinforce each other.
    Constructive,
    /// Cancellation. Waves calm each other out.
    Destructive,
    /// Tension, beat patterns, everything in between.
    Complex,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resonance {
    /// 1.0 perfect harmony, -1.0 perfect cancellation.
    pub resonance: f64,
    /// Shortest angular distance between the two phases, in [0, pi].
    pub delta_phase: f64,
    /// Frequencies within 10% of each other (measured from self).
    pub harmonic: bool,
    pub kind: ResonanceKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoulTensor {
    /// Body: mass, energy, intensity. Never negative.
    pub amplitude: f64,
    /// Soul: identity, vibration rate. Zero while collapsed.
    pub frequency: f64,
    /// Spirit: timing, in [0, 2*pi).
    pub phase: f64,
    /// Rifling direction of the spiral, +1 or -1.
    pub spin: f64,
    /// Matter (+1) vs antimatter (-1).
    pub polarity: f64,
    /// Wave function collapse state. Frozen truth.
    pub collapsed: bool,
    /// 1.0 pure quantum, 0.0 fully classical. Decays every step.
    pub coherence: f64,
    /// Facing in the world, twisted a little further every step.
    pub orientation: Quaternion,
    /// Ids of entangled peer entities. Membership is symmetric.
    #[serde(default)]
    pub entangled: Vec<EntityId>,
    /// Unobserved candidate selves with base probabilities. Weights need
    /// not sum to one.
    #[serde(default)]
    pub superposition: Vec<(SoulTensor, f64)>,
}

impl SoulTensor {
    pub fn new(amplitude: f64, frequency: f64, phase: f64) -> Self {
        Self {
            amplitude,
            frequency,
            phase: phase.rem_euclid(TAU),
            spin: 1.0,
            polarity: 1.0,
            collapsed: false,
            coherence: 1.0,
            orientation: Quaternion::identity(),
            entangled: Vec::new(),
            superposition: Vec::new(),
        }
    }

    /// A still, featureless soul. What an attractor radiates when it has
    /// no soul of its own: pure mass, no vibration.
    pub fn neutral(amplitude: f64) -> Self {
        Self::new(amplitude, 0.0, 0.0)
    }

    /// Evolve the wave state over time. Phase rotates at `frequency`,
    /// orientation twists around the world-up axis, coherence leaks away.
    /// A collapsed soul is locked and does nothing.
    ///
    /// Phase propagation to entangled peers is the tick loop's job; the
    /// soul only knows peer ids, not the peers themselves.
    pub fn step(&mut self, dt: f64) {
        if self.collapsed {
            return;
        }

        self.phase = (self.phase + self.frequency * dt).rem_euclid(TAU);

        let twist = Quaternion::from_axis_angle(WORLD_UP, self.frequency * 0.1 * dt * self.spin);
        self.orientation = (twist * self.orientation).normalize();

        // More mass, faster decoherence.
        let decoherence_rate = 0.001 * (1.0 + self.amplitude * 0.01);
        self.coherence = (self.coherence - decoherence_rate * dt).max(0.0);
    }

    /// Quantum entanglement: link the phase of two souls. Registration is
    /// mutual and idempotent; both phases snap to their exact average.
    pub fn entangle(a_id: &EntityId, a: &mut SoulTensor, b_id: &EntityId, b: &mut SoulTensor) {
        if !a.entangled.contains(b_id) {
            a.entangled.push(b_id.clone());
        }
        if !b.entangled.contains(a_id) {
            b.entangled.push(a_id.clone());
        }

        let avg = (a.phase + b.phase) / 2.0;
        a.phase = avg;
        b.phase = avg;
    }

    /// The chemistry between two souls.
    pub fn resonate(&self, other: &SoulTensor) -> Resonance {
        let mut delta_phase = (self.phase - other.phase).abs();
        if delta_phase > PI {
            delta_phase = TAU - delta_phase;
        }

        // Opposing polarity inverts the space: attraction becomes
        // repulsion and back.
        let resonance = delta_phase.cos() * self.polarity * other.polarity;

        let kind = if resonance > 0.5 {
            ResonanceKind::Constructive
        } else if resonance < -0.5 {
            ResonanceKind::Destructive
        } else {
            ResonanceKind::Complex
        };

        Resonance {
            resonance,
            delta_phase,
            harmonic: (self.frequency - other.frequency).abs() < self.frequency * 0.1,
            kind,
        }
    }

    /// Quantum measurement. You see what you are: the candidate that
    /// resonates most strongly with the observer becomes the definite
    /// state. Returns true if a collapse occurred.
    pub fn observe(&mut self, observer: &SoulTensor) -> bool {
        if self.superposition.is_empty() {
            return false;
        }

        let mut best: Option<usize> = None;
        let mut max_weight = f64::NEG_INFINITY;

        for (i, (candidate, base_prob)) in self.superposition.iter().enumerate() {
            let resonance = candidate.resonate(observer).resonance;
            // High resonance boosts probability, negative resonance
            // suppresses it. Ties keep the earliest candidate.
            let weight = base_prob * (1.0 + resonance);
            if weight > max_weight {
                max_weight = weight;
                best = Some(i);
            }
        }

        match best {
            Some(i) => {
                let (chosen, _) = self.superposition[i].clone();
                self.amplitude = chosen.amplitude;
                self.frequency = chosen.frequency;
                self.phase = chosen.phase;
                self.spin = chosen.spin;
                self.polarity = chosen.polarity;

                self.collapsed = true;
                self.superposition.clear();
                true
            }
            None => false,
        }
    }

    /// Ice star. Kinetic doubt (frequency) becomes potential conviction
    /// (amplitude), the phase freezes where it stands. Idempotent.
    pub fn collapse(&mut self) {
        if self.collapsed {
            return;
        }

        self.amplitude += self.frequency * COLLAPSE_TRANSFER_RATIO;
        self.frequency = 0.0;
        self.collapsed = true;
    }

    /// Burning star. External energy above the wake threshold converts a
    /// tenth of the mass back into vibration.
    pub fn melt(&mut self, external_energy: f64) {
        if !self.collapsed {
            return;
        }

        let restored = (self.amplitude * 0.1) / COLLAPSE_TRANSFER_RATIO;
        if external_energy > MELT_WAKE_THRESHOLD {
            self.amplitude -= restored * COLLAPSE_TRANSFER_RATIO;
            self.frequency = restored + external_energy * 0.1;
            self.collapsed = false;
        }
    }

    /// Sublimation: straight from solid to plasma. A collapsed soul vents
    /// a third of its mass as vibration and partially regains coherence.
    pub fn sublime(&mut self) {
        if !self.collapsed {
            return;
        }

        self.frequency = self.amplitude * 0.3;
        self.amplitude *= 0.7;
        self.collapsed = false;
        self.coherence = 0.8;
    }

    /// Crystallization: a permanent final form. Collapse, then shed all
    /// remaining quantumness.
    pub fn crystallize(&mut self) {
        self.collapse();
        self.coherence = 0.0;
    }

    /// Nudge the phase toward a target along the shortest arc, without
    /// full entanglement. Collapsed souls do not move.
    pub fn harmonize(&mut self, target_phase: f64, rate: f64) {
        if self.collapsed {
            return;
        }

        let mut diff = target_phase - self.phase;
        if diff > PI {
            diff -= TAU;
        } else if diff < -PI {
            diff += TAU;
        }

        self.phase = (self.phase + diff * rate).rem_euclid(TAU);
    }

    /// Drain energy from another soul. The absorber gains at 80%
    /// efficiency and averages frequencies; the donor keeps the rest.
    pub fn absorb(&mut self, other: &mut SoulTensor, ratio: f64) {
        let amp_transfer = other.amplitude * ratio;
        let freq_transfer = other.frequency * ratio;

        self.amplitude += amp_transfer * 0.8;
        self.frequency = (self.frequency + freq_transfer) / 2.0;

        other.amplitude *= 1.0 - ratio;
        other.frequency *= 1.0 - ratio;
    }

    /// Split off a child at opposite phase and spin. Needs amplitude of at
    /// least 20 or the soul stays whole.
    pub fn split(&mut self) -> Option<SoulTensor> {
        const MIN_SPLIT_AMPLITUDE: f64 = 20.0;

        if self.amplitude < MIN_SPLIT_AMPLITUDE {
            return None;
        }

        let mut child = SoulTensor::new(
            self.amplitude * 0.4,
            self.frequency,
            (self.phase + PI).rem_euclid(TAU),
        );
        child.spin = -self.spin;
        child.polarity = self.polarity;
        // Splitting disrupts the quantum state, the child gets half.
        child.coherence = self.coherence * 0.5;

        self.amplitude *= 0.6;

        Some(child)
    }

    /// Distance to the nearest perfect musical ratio between the two
    /// frequencies. 0 is unison or a clean interval, 1 is full discord.
    pub fn harmonic_distance(&self, other: &SoulTensor) -> f64 {
        if self.frequency <= 0.0 || other.frequency <= 0.0 {
            return 1.0;
        }

        let ratio =
            self.frequency.max(other.frequency) / self.frequency.min(other.frequency);

        // Unison, octave, fifth, fourth, major third.
        const HARMONIC_RATIOS: [f64; 5] = [1.0, 2.0, 1.5, 1.333, 1.25];

        let mut min_distance = f64::INFINITY;
        for pr in HARMONIC_RATIOS {
            let dist = (ratio - pr).abs() / pr;
            if dist < min_distance {
                min_distance = dist;
            }
        }

        min_distance.min(1.0)
    }

    /// Octaves are frequency ratios within 10% of a power of two.
    pub fn is_octave(&self, other: &SoulTensor) -> bool {
        if self.frequency <= 0.0 || other.frequency <= 0.0 {
            return false;
        }

        let ratio =
            self.frequency.max(other.frequency) / self.frequency.min(other.frequency);
        let log_ratio = ratio.log2();
        (log_ratio - log_ratio.round()).abs() < 0.1
    }

    /// Internal kinetic heat. Collapsed souls run cold.
    pub fn temperature(&self) -> f64 {
        let mut base = self.frequency * 10.0;
        if self.collapsed {
            base *= 0.1;
        }
        base += self.amplitude * 0.5;
        base.max(0.0)
    }

    /// Kinetic plus mass-energy.
    pub fn total_energy(&self) -> f64 {
        let kinetic = 0.5 * self.amplitude * self.frequency * self.frequency * 0.01;
        let potential = self.amplitude * 10.0;
        kinetic + potential
    }

    /// Tendency to rise (+) or sink (-). High frequency lifts, mass and
    /// collapse drag down.
    pub fn spiritual_buoyancy(&self) -> f64 {
        let base = if self.frequency > 500.0 {
            1.0
        } else if self.frequency > 200.0 {
            0.5
        } else if self.frequency > 100.0 {
            0.0
        } else if self.frequency > 50.0 {
            -0.3
        } else {
            -0.7
        };

        let mut mass_factor = 1.0 / (1.0 + self.amplitude * 0.01);
        if self.collapsed {
            mass_factor *= 0.5;
        }

        base * mass_factor
    }

    /// Map frequency and amplitude onto the emotional spectrum.
    pub fn decode_emotion(&self) -> String {
        let base = if self.frequency < 20.0 {
            "Deep Sorrow / Gravity (Blue)"
        } else if self.frequency < 50.0 {
            "Peace / Trust (Green)"
        } else if self.frequency < 100.0 {
            "Joy / Excitement (Yellow)"
        } else if self.frequency < 300.0 {
            "Passion / Anger (Red)"
        } else {
            "Transcendence / Anxiety (White/Violet)"
        };

        let intensity = if self.amplitude < 10.0 {
            "Faint"
        } else if self.amplitude < 50.0 {
            "Clear"
        } else if self.amplitude < 200.0 {
            "Strong"
        } else {
            "Overwhelming"
        };

        format!("{intensity} {base}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn phase_stays_wrapped_for_any_frequency_sign() {
        let mut fast = SoulTensor::new(10.0, 100.0, 0.0);
        let mut backward = SoulTensor::new(10.0, -7.3, 0.5);

        for _ in 0..1000 {
            fast.step(0.13);
            backward.step(0.13);
            assert!(fast.phase >= 0.0 && fast.phase < TAU);
            assert!(backward.phase >= 0.0 && backward.phase < TAU);
        }
    }

    #[test]
    fn collapsed_soul_does_not_evolve() {
        let mut soul = SoulTensor::new(10.0, 5.0, 1.0);
        soul.collapse();
        let phase = soul.phase;
        let orientation = soul.orientation;

        soul.step(1.0);
        assert_eq!(soul.phase, phase);
        assert_eq!(soul.orientation, orientation);
    }

    #[test]
    fn entangle_averages_phases_and_registers_both_sides() {
        let a_id = "a".to_string();
        let b_id = "b".to_string();
        let mut a = SoulTensor::new(1.0, 1.0, 1.0);
        let mut b = SoulTensor::new(1.0, 1.0, 2.0);

        SoulTensor::entangle(&a_id, &mut a, &b_id, &mut b);

        assert_relative_eq!(a.phase, 1.5);
        assert_relative_eq!(b.phase, 1.5);
        assert!(a.entangled.contains(&b_id));
        assert!(b.entangled.contains(&a_id));

        // Re-entangling must not duplicate membership.
        SoulTensor::entangle(&a_id, &mut a, &b_id, &mut b);
        assert_eq!(a.entangled.len(), 1);
        assert_eq!(b.entangled.len(), 1);
    }

    #[test]
    fn collapse_is_idempotent() {
        let mut once = SoulTensor::new(10.0, 3.0, 0.7);
        once.collapse();

        let mut twice = SoulTensor::new(10.0, 3.0, 0.7);
        twice.collapse();
        twice.collapse();

        assert_eq!(once.amplitude, twice.amplitude);
        assert_eq!(once.frequency, twice.frequency);
        assert_eq!(once.phase, twice.phase);
        assert!(twice.collapsed);
    }

    #[test]
    fn collapse_converts_frequency_into_amplitude() {
        let mut soul = SoulTensor::new(10.0, 3.0, 0.7);
        soul.collapse();
        assert_relative_eq!(soul.amplitude, 40.0);
        assert_eq!(soul.frequency, 0.0);
        assert_relative_eq!(soul.phase, 0.7);
    }

    #[test]
    fn melt_requires_enough_energy() {
        let mut soul = SoulTensor::new(100.0, 0.0, 0.0);
        soul.collapsed = true;

        soul.melt(50.0);
        assert!(soul.collapsed);
        assert_eq!(soul.amplitude, 100.0);

        soul.melt(60.0);
        assert!(!soul.collapsed);
        // restored = (100 * 0.1) / 10 = 1.0
        assert_relative_eq!(soul.amplitude, 90.0);
        assert_relative_eq!(soul.frequency, 7.0);
    }

    #[test]
    fn melt_is_a_no_op_on_a_live_soul() {
        let mut soul = SoulTensor::new(100.0, 5.0, 0.0);
        soul.melt(1000.0);
        assert_eq!(soul.amplitude, 100.0);
        assert_eq!(soul.frequency, 5.0);
    }

    #[test]
    fn resonance_is_symmetric() {
        let cases = [
            (0.0, 1.0, 1.0, 1.0),
            (0.3, 5.9, 1.0, -1.0),
            (2.0, 4.0, -1.0, -1.0),
            (1.0, 1.0 + PI, 1.0, 1.0),
        ];
        for (pa, pb, pol_a, pol_b) in cases {
            let mut a = SoulTensor::new(1.0, 10.0, pa);
            a.polarity = pol_a;
            let mut b = SoulTensor::new(1.0, 12.0, pb);
            b.polarity = pol_b;

            assert_relative_eq!(
                a.resonate(&b).resonance,
                b.resonate(&a).resonance,
                epsilon = 1e-12
            );
        }
    }

    #[test]
    fn resonance_classifies_by_alignment() {
        let a = SoulTensor::new(1.0, 10.0, 0.0);
        let aligned = SoulTensor::new(1.0, 10.0, 0.1);
        let opposed = SoulTensor::new(1.0, 10.0, PI);
        let orthogonal = SoulTensor::new(1.0, 10.0, PI / 2.0);

        assert_eq!(a.resonate(&aligned).kind, ResonanceKind::Constructive);
        assert_eq!(a.resonate(&opposed).kind, ResonanceKind::Destructive);
        assert_eq!(a.resonate(&orthogonal).kind, ResonanceKind::Complex);
    }

    #[test]
    fn observe_commits_the_best_resonating_candidate() {
        let observer = SoulTensor::new(1.0, 10.0, 0.0);

        let mut soul = SoulTensor::new(1.0, 1.0, 0.0);
        let aligned = SoulTensor::new(5.0, 42.0, 0.0);
        let opposed = SoulTensor::new(9.0, 77.0, PI);
        soul.superposition = vec![(opposed, 0.5), (aligned.clone(), 0.5)];

        assert!(soul.observe(&observer));
        assert!(soul.collapsed);
        assert!(soul.superposition.is_empty());
        assert_eq!(soul.frequency, aligned.frequency);
        assert_eq!(soul.amplitude, aligned.amplitude);
    }

    #[test]
    fn observe_breaks_ties_toward_the_first_candidate() {
        let observer = SoulTensor::new(1.0, 10.0, 0.0);

        let mut soul = SoulTensor::new(1.0, 1.0, 0.0);
        let first = SoulTensor::new(2.0, 20.0, 1.0);
        let second = SoulTensor::new(3.0, 30.0, 1.0);
        soul.superposition = vec![(first.clone(), 0.5), (second, 0.5)];

        assert!(soul.observe(&observer));
        assert_eq!(soul.frequency, first.frequency);
    }

    #[test]
    fn observe_without_superposition_is_false() {
        let observer = SoulTensor::new(1.0, 10.0, 0.0);
        let mut soul = SoulTensor::new(1.0, 1.0, 0.0);
        assert!(!soul.observe(&observer));
        assert!(!soul.collapsed);
    }

    #[test]
    fn split_conserves_character() {
        let mut parent = SoulTensor::new(100.0, 8.0, 1.0);
        let child = parent.split().expect("enough amplitude to split");

        assert_relative_eq!(child.amplitude, 40.0);
        assert_relative_eq!(parent.amplitude, 60.0);
        assert_eq!(child.spin, -parent.spin);
        assert_relative_eq!(child.phase, (1.0 + PI).rem_euclid(TAU));

        let mut faint = SoulTensor::new(5.0, 8.0, 1.0);
        assert!(faint.split().is_none());
    }

    #[test]
    fn sublime_vents_mass_as_vibration() {
        let mut soul = SoulTensor::new(10.0, 3.0, 0.7);
        soul.sublime();
        assert_eq!(soul.frequency, 3.0, "only collapsed souls sublime");

        soul.collapse(); // amplitude 40, frequency 0
        soul.sublime();
        assert!(!soul.collapsed);
        assert_relative_eq!(soul.frequency, 12.0);
        assert_relative_eq!(soul.amplitude, 28.0);
        assert_relative_eq!(soul.coherence, 0.8);
    }

    #[test]
    fn crystallize_locks_out_all_quantumness() {
        let mut soul = SoulTensor::new(10.0, 3.0, 0.7);
        soul.crystallize();
        assert!(soul.collapsed);
        assert_eq!(soul.coherence, 0.0);
    }

    #[test]
    fn harmonize_takes_the_shortest_arc() {
        // 0.1 pulled toward 2*pi - 0.1 should go backward through zero.
        let mut soul = SoulTensor::new(1.0, 1.0, 0.1);
        soul.harmonize(TAU - 0.1, 0.5);
        assert_relative_eq!(soul.phase, 0.0, epsilon = 1e-12);

        let mut frozen = SoulTensor::new(1.0, 1.0, 0.1);
        frozen.collapse();
        frozen.harmonize(3.0, 0.5);
        assert_relative_eq!(frozen.phase, 0.1);
    }

    #[test]
    fn absorb_transfers_at_imperfect_efficiency() {
        let mut eater = SoulTensor::new(10.0, 4.0, 0.0);
        let mut prey = SoulTensor::new(20.0, 8.0, 0.0);

        eater.absorb(&mut prey, 0.5);

        assert_relative_eq!(eater.amplitude, 18.0);
        assert_relative_eq!(eater.frequency, 4.0);
        assert_relative_eq!(prey.amplitude, 10.0);
        assert_relative_eq!(prey.frequency, 4.0);
    }

    #[test]
    fn octaves_and_harmonic_distance() {
        let root = SoulTensor::new(1.0, 100.0, 0.0);
        let octave = SoulTensor::new(1.0, 200.0, 0.0);
        let fifth = SoulTensor::new(1.0, 150.0, 0.0);
        let sour = SoulTensor::new(1.0, 173.0, 0.0);

        assert!(root.is_octave(&octave));
        assert!(!root.is_octave(&fifth));

        assert_relative_eq!(root.harmonic_distance(&octave), 0.0, epsilon = 1e-9);
        assert_relative_eq!(root.harmonic_distance(&fifth), 0.0, epsilon = 1e-9);
        assert!(root.harmonic_distance(&sour) > 0.01);

        let silent = SoulTensor::new(1.0, 0.0, 0.0);
        assert_eq!(root.harmonic_distance(&silent), 1.0);
        assert!(!root.is_octave(&silent));
    }

    #[test]
    fn coherence_decays_with_time_and_mass() {
        let mut light = SoulTensor::new(1.0, 1.0, 0.0);
        let mut heavy = SoulTensor::new(500.0, 1.0, 0.0);

        for _ in 0..100 {
            light.step(1.0);
            heavy.step(1.0);
        }

        assert!(light.coherence < 1.0);
        assert!(heavy.coherence < light.coherence);
        assert!(heavy.coherence >= 0.0);
    }

    #[test]
    fn emotion_bands_cover_the_spectrum() {
        assert_eq!(
            SoulTensor::new(5.0, 10.0, 0.0).decode_emotion(),
            "Faint Deep Sorrow / Gravity (Blue)"
        );
        assert_eq!(
            SoulTensor::new(500.0, 150.0, 0.0).decode_emotion(),
            "Overwhelming Passion / Anger (Red)"
        );
    }
}
