//! Effective-stat snapshots and their validation.
//!
//! A [`StatProfile`] is computed externally (base stats plus equipment
//! deltas, flats before multipliers) and handed to the pipeline as an
//! immutable value per resolution call. Invalid profiles are rejected at
//! construction rather than silently clamped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lower bound on the pierce ratio: every hit deals at least 1% chip damage
/// against arbitrarily high armor.
pub const PIERCE_RATIO_MIN: f64 = 0.01;
pub const PIERCE_RATIO_MAX: f64 = 1.0;

/// Pipeline stage at which a critical-hit multiplier is injected.
///
/// Higher tiers are rarity-gated by the item system; the pipeline only
/// consumes the scope it is handed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CritTier {
    /// Crit flag only; no damage multiplier.
    Base,
    /// Multiplier applied to pre-mitigation damage, before armor/pierce.
    PrePierce,
    /// Multiplier applied by re-running mitigation on the scaled damage.
    PostPierce,
    /// PostPierce scaling plus downstream stacking-effect amplification.
    Full,
}

/// Per-entity effective stats, immutable for the duration of a resolution
/// call. Owned by the caller, not the core.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatProfile {
    pub attack_damage: f64,
    pub pierce_ratio: f64,
    pub crit_chance: f64,
    pub crit_tier: CritTier,
    pub crit_multiplier: f64,
    pub armor: f64,
    pub attack_speed: f64,
}

/// Invalid setup data, rejected before it can reach the pipeline.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("pierce_ratio {0} outside [{PIERCE_RATIO_MIN}, {PIERCE_RATIO_MAX}]")]
    PierceRatioOutOfRange(f64),
    #[error("crit_chance {0} outside [0, 1]")]
    CritChanceOutOfRange(f64),
    #[error("crit_multiplier must be at least 1, got {0}")]
    CritMultiplierBelowOne(f64),
    #[error("attack_speed must be positive and finite, got {0}")]
    NonPositiveAttackSpeed(f64),
    #[error("{field} must be non-negative and finite, got {value}")]
    NegativeStat { field: &'static str, value: f64 },
    #[error("max_health must be positive and finite, got {0}")]
    NonPositiveMaxHealth(f64),
}

impl StatProfile {
    /// Builds a validated snapshot. NaN fails every range check.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        attack_damage: f64,
        pierce_ratio: f64,
        crit_chance: f64,
        crit_tier: CritTier,
        crit_multiplier: f64,
        armor: f64,
        attack_speed: f64,
    ) -> Result<Self, ConfigurationError> {
        if !(PIERCE_RATIO_MIN..=PIERCE_RATIO_MAX).contains(&pierce_ratio) {
            return Err(ConfigurationError::PierceRatioOutOfRange(pierce_ratio));
        }
        if !(0.0..=1.0).contains(&crit_chance) {
            return Err(ConfigurationError::CritChanceOutOfRange(crit_chance));
        }
        if !(crit_multiplier >= 1.0) || !crit_multiplier.is_finite() {
            return Err(ConfigurationError::CritMultiplierBelowOne(crit_multiplier));
        }
        if !(attack_speed > 0.0) || !attack_speed.is_finite() {
            return Err(ConfigurationError::NonPositiveAttackSpeed(attack_speed));
        }
        for (field, value) in [("attack_damage", attack_damage), ("armor", armor)] {
            if !(value >= 0.0) || !value.is_finite() {
                return Err(ConfigurationError::NegativeStat { field, value });
            }
        }
        Ok(Self {
            attack_damage,
            pierce_ratio,
            crit_chance,
            crit_tier,
            crit_multiplier,
            armor,
            attack_speed,
        })
    }
}
