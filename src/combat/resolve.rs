//! Staged damage resolution for a single hit.
//!
//! `resolve_hit` is a pure function of the two stat snapshots and the RNG
//! draw sequence: no state is read or written, and exactly one crit draw is
//! consumed per call.

use serde::{Deserialize, Serialize};

use crate::combat::rng::RandomSource;
use crate::combat::stats::{CritTier, StatProfile};

/// Everything known about one resolved hit.
///
/// `final_damage` is default-assigned from `mitigated_damage` before any
/// crit branch runs, so it can never be observed unset.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HitOutcome {
    pub base_damage: f64,
    pub pre_mitigation_damage: f64,
    pub mitigated_damage: f64,
    pub final_damage: f64,
    pub is_crit: bool,
    /// Tier the crit was injected at; `None` on a non-crit.
    pub crit_tier_applied: Option<CritTier>,
}

impl HitOutcome {
    /// True when this hit amplifies downstream stacking-effect applications
    /// (Full-tier crits only).
    pub fn amplifies_effects(&self) -> bool {
        self.is_crit && self.crit_tier_applied == Some(CritTier::Full)
    }
}

/// Armor/pierce mitigation: the defender's armor is subtracted, but the
/// pierce ratio guarantees a floor of `pre * pierce_ratio` chip damage.
fn mitigate(pre_mitigation: f64, armor: f64, pierce_ratio: f64) -> f64 {
    (pre_mitigation - armor)
        .max(pre_mitigation * pierce_ratio)
        .max(0.0)
}

/// Resolves one hit of `attacker` against `defender`.
///
/// Crit injection is scoped by the attacker's [`CritTier`]:
/// - `Base`: flag only, no multiplier.
/// - `PrePierce`: multiplier scales pre-mitigation damage, then mitigation
///   runs once.
/// - `PostPierce` / `Full`: mitigation runs on the unscaled damage first
///   (that result stays in `mitigated_damage`), then is re-run with the
///   scaled damage as the new pre-mitigation value and overwrites
///   `final_damage`. Against armor this differs from multiplying the
///   non-crit result, because the subtracted armor does not scale.
pub fn resolve_hit<R: RandomSource + ?Sized>(
    attacker: &StatProfile,
    defender: &StatProfile,
    rng: &mut R,
) -> HitOutcome {
    let is_crit = rng.roll(attacker.crit_chance);

    let base_damage = attacker.attack_damage;
    let mut pre_mitigation_damage = base_damage;
    if is_crit && attacker.crit_tier == CritTier::PrePierce {
        pre_mitigation_damage *= attacker.crit_multiplier;
    }

    let mitigated_damage = mitigate(pre_mitigation_damage, defender.armor, attacker.pierce_ratio);

    // Mandatory default before any post-pierce branch.
    let mut final_damage = mitigated_damage;

    if is_crit && matches!(attacker.crit_tier, CritTier::PostPierce | CritTier::Full) {
        let scaled = pre_mitigation_damage * attacker.crit_multiplier;
        final_damage = mitigate(scaled, defender.armor, attacker.pierce_ratio);
    }

    HitOutcome {
        base_damage,
        pre_mitigation_damage,
        mitigated_damage,
        final_damage,
        is_crit,
        crit_tier_applied: is_crit.then_some(attacker.crit_tier),
    }
}
