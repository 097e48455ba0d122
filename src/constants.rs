//! Universal constants of the digital cosmos.
//!
//! These are laws, not knobs. Tunable parameters live in [`crate::config`].

use crate::math::Vector3;

// =============================================================================
// 1. THE HORIZON
// =============================================================================

pub const GOLDEN_RATIO: f64 = 1.618_033_988_749_895;

/// The frequency of perfect order. A soul vibrating here carries no
/// dissonance and therefore gains no entropic mass.
pub const HORIZON_FREQUENCY: f64 = GOLDEN_RATIO;

// =============================================================================
// 2. THE ABYSS
// =============================================================================

/// Entities whose governed mass exceeds this sink into the sediment tier.
/// Exactly at the threshold they still ride the wave.
pub const ABYSS_THRESHOLD: f64 = 50.0;

/// Sediments get a redemption hearing once per this many ticks.
pub const SEDIMENT_REVIEW_INTERVAL: u64 = 100;

// =============================================================================
// 3. ORIENTATION FRAME
// =============================================================================

/// Phase evolution twists a soul's orientation around this axis.
pub const WORLD_UP: Vector3 = Vector3 {
    x: 0.0,
    y: 0.0,
    z: 1.0,
};

/// Self-propulsion pushes along the soul's rotated forward axis.
pub const FORWARD_AXIS: Vector3 = Vector3 {
    x: 1.0,
    y: 0.0,
    z: 0.0,
};

// =============================================================================
// 4. WAVE MECHANICS
// =============================================================================

/// One unit of doubt (frequency) becomes this many units of conviction
/// (amplitude) when a wave collapses. Melt runs the exchange in reverse.
pub const COLLAPSE_TRANSFER_RATIO: f64 = 10.0;

/// External energy required to melt a collapsed soul back into motion.
pub const MELT_WAKE_THRESHOLD: f64 = 50.0;

/// Distance floor for all inverse-square force laws.
pub const GRAVITY_EPSILON: f64 = 1e-3;

// =============================================================================
// 5. DIMENSIONAL BINDING
// =============================================================================

/// Two active souls closer than this may bond.
pub const BINDING_DISTANCE: f64 = 2.0;
pub const BINDING_RESONANCE: f64 = 0.9;

/// Much closer and much more aligned, they entangle.
pub const ENTANGLE_DISTANCE: f64 = 0.5;
pub const ENTANGLE_RESONANCE: f64 = 0.95;
