//! Per-entity mutable runtime state.
//!
//! `EntityState` is exclusively owned by the orchestrator/effect-engine
//! pairing of one simulation run. The pipeline and planner never touch it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combat::stacking::{EffectKind, StackedEffectInstance};
use crate::combat::stats::ConfigurationError;

/// Opaque entity handle. Assigned by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Runtime data for one entity: health, the one-way alive flag, the attack
/// cooldown timer, and active stacking-effect instances (one per kind).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub health: f64,
    pub max_health: f64,
    pub alive: bool,
    /// Seconds until the entity may attack again (`1 / attack_speed` after
    /// each performed action).
    pub attack_cooldown: f64,
    pub stacking_effects: BTreeMap<EffectKind, StackedEffectInstance>,
}

impl EntityState {
    /// Spawns a full-health entity.
    pub fn new(max_health: f64) -> Result<Self, ConfigurationError> {
        if !(max_health > 0.0) || !max_health.is_finite() {
            return Err(ConfigurationError::NonPositiveMaxHealth(max_health));
        }
        Ok(Self {
            health: max_health,
            max_health,
            alive: true,
            attack_cooldown: 0.0,
            stacking_effects: BTreeMap::new(),
        })
    }

    pub fn missing_health(&self) -> f64 {
        (self.max_health - self.health).max(0.0)
    }

    /// Applies damage, clamping health at 0. Returns true exactly when this
    /// call crossed the entity from alive to dead; the alive flag never
    /// flips back. Damage to an already-dead entity is a no-op.
    pub fn apply_damage(&mut self, amount: f64) -> bool {
        if !self.alive {
            return false;
        }
        self.health = (self.health - amount.max(0.0)).max(0.0);
        if self.health == 0.0 {
            self.alive = false;
            return true;
        }
        false
    }

    /// Heals up to `max_health`. Does not revive.
    pub fn apply_healing(&mut self, amount: f64) {
        if !self.alive {
            return;
        }
        self.health = (self.health + amount.max(0.0)).min(self.max_health);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_non_positive_max_health() {
        assert!(EntityState::new(0.0).is_err());
        assert!(EntityState::new(-10.0).is_err());
        assert!(EntityState::new(f64::NAN).is_err());
    }

    #[test]
    fn lethal_damage_clamps_and_flips_once() {
        let mut entity = EntityState::new(5.0).unwrap();
        assert!(entity.apply_damage(12.0));
        assert_eq!(entity.health, 0.0);
        assert!(!entity.alive);
        // Second lethal hit reports no new crossing.
        assert!(!entity.apply_damage(12.0));
        assert_eq!(entity.health, 0.0);
    }

    #[test]
    fn exact_lethal_damage_kills() {
        let mut entity = EntityState::new(5.0).unwrap();
        assert!(entity.apply_damage(5.0));
        assert!(!entity.alive);
    }

    #[test]
    fn healing_clamps_to_max_and_never_revives() {
        let mut entity = EntityState::new(100.0).unwrap();
        entity.apply_damage(30.0);
        entity.apply_healing(1_000.0);
        assert_eq!(entity.health, 100.0);

        entity.apply_damage(200.0);
        assert!(!entity.alive);
        entity.apply_healing(50.0);
        assert_eq!(entity.health, 0.0);
        assert!(!entity.alive);
    }

    #[test]
    fn negative_amounts_are_ignored() {
        let mut entity = EntityState::new(100.0).unwrap();
        entity.apply_damage(-5.0);
        assert_eq!(entity.health, 100.0);
        entity.apply_damage(40.0);
        entity.apply_healing(-5.0);
        assert_eq!(entity.health, 60.0);
    }
}
