//! The single mutator of entity state.
//!
//! Everything upstream (resolution, planning, the effect engine's damage
//! formulas) returns plain data; the orchestrator consumes those effect
//! lists in order, applies them, and publishes the resulting events. A
//! discrete-time driver calls `tick(dt)` and then `perform_action(..)` per
//! simulated step, so all due periodic damage lands before the step's
//! attack.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::combat::events::{Effect, Event, EventBus};
use crate::combat::planner::{plan, Action};
use crate::combat::resolve::HitOutcome;
use crate::combat::rng::RandomSource;
use crate::combat::stacking::{EffectCatalogue, EffectEngine};
use crate::combat::state::{EntityId, EntityState};
use crate::combat::stats::StatProfile;

/// Default periodic-damage evaluation interval, in seconds.
pub const DEFAULT_TICK_INTERVAL: f64 = 1.0;

/// Fraction of the tick interval during which re-applying an already-active
/// stacking effect is suppressed, so very fast attackers cannot dominate
/// through re-application bursts.
pub const REAPPLY_COOLDOWN_FRACTION: f64 = 0.25;

/// Stack multiplier applied to stacking-effect applications that originate
/// from a Full-tier critical hit.
pub const FULL_CRIT_STACK_BONUS: u32 = 2;

/// Tunable constants of one simulation run.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CombatConfig {
    pub tick_interval: f64,
    pub reapply_cooldown_fraction: f64,
    pub full_crit_stack_bonus: u32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
            reapply_cooldown_fraction: REAPPLY_COOLDOWN_FRACTION,
            full_crit_stack_bonus: FULL_CRIT_STACK_BONUS,
        }
    }
}

/// Recoverable failures surfaced to the simulation driver. None of these
/// ever aborts an in-progress tick loop.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum CombatError {
    #[error("unknown entity {0}")]
    UnknownEntity(EntityId),
    #[error("entity {0} is dead")]
    DeadEntity(EntityId),
    #[error("entity {id} is on attack cooldown for another {remaining:.3}s")]
    AttackOnCooldown { id: EntityId, remaining: f64 },
}

/// Owns the entities, the event bus, and the effect engine for one run.
pub struct Orchestrator {
    entities: BTreeMap<EntityId, EntityState>,
    bus: EventBus,
    engine: EffectEngine,
}

impl Orchestrator {
    pub fn new(config: CombatConfig, catalogue: EffectCatalogue) -> Self {
        Self {
            entities: BTreeMap::new(),
            bus: EventBus::new(),
            engine: EffectEngine::new(config, catalogue),
        }
    }

    /// Registers an entity. Replaces any previous state under the same id.
    pub fn insert_entity(&mut self, id: EntityId, state: EntityState) {
        self.entities.insert(id, state);
    }

    pub fn entity(&self, id: EntityId) -> Option<&EntityState> {
        self.entities.get(&id)
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn catalogue(&self) -> &EffectCatalogue {
        self.engine.catalogue()
    }

    /// Resolves one already-chosen action of `attacker_id` against
    /// `defender_id` and applies its effects.
    ///
    /// Planning is pure; application happens strictly in effect-list order,
    /// so events for hit N are dispatched before hit N+1's effects touch
    /// state. A performed action (one with at least one hit) arms the
    /// attacker's cooldown to `1 / attack_speed`.
    pub fn perform_action<R: RandomSource + ?Sized>(
        &mut self,
        attacker_id: EntityId,
        defender_id: EntityId,
        attacker: &StatProfile,
        defender: &StatProfile,
        action: &Action,
        rng: &mut R,
    ) -> Result<Vec<HitOutcome>, CombatError> {
        let attacker_state = self
            .entities
            .get(&attacker_id)
            .ok_or(CombatError::UnknownEntity(attacker_id))?;
        if !attacker_state.alive {
            return Err(CombatError::DeadEntity(attacker_id));
        }
        if attacker_state.attack_cooldown > 0.0 {
            return Err(CombatError::AttackOnCooldown {
                id: attacker_id,
                remaining: attacker_state.attack_cooldown,
            });
        }
        let defender_state = self
            .entities
            .get(&defender_id)
            .ok_or(CombatError::UnknownEntity(defender_id))?;
        if !defender_state.alive {
            return Err(CombatError::DeadEntity(defender_id));
        }

        let (outcomes, effects) = plan(
            attacker_id,
            defender_id,
            attacker,
            defender,
            action,
            self.engine.catalogue(),
            rng,
        );
        self.apply(effects);

        if !outcomes.is_empty() {
            if let Some(state) = self.entities.get_mut(&attacker_id) {
                state.attack_cooldown = 1.0 / attacker.attack_speed;
            }
        }
        Ok(outcomes)
    }

    /// Advances simulated time: attack cooldowns run down and due
    /// stacking-effect damage fires through the effect engine.
    pub fn tick(&mut self, dt: f64) {
        if !(dt > 0.0) {
            return;
        }
        for entity in self.entities.values_mut() {
            if entity.alive {
                entity.attack_cooldown = (entity.attack_cooldown - dt).max(0.0);
            }
        }
        let effects = self.engine.tick(dt, &mut self.entities);
        self.apply(effects);
    }

    /// Applies an effect list in order. `ApplyDamage` clamps health at 0
    /// and publishes `OnEntityDeath` exactly once on the zero-crossing;
    /// `Dispatch` forwards to the bus synchronously, before the next
    /// effect; `ApplyStackingEffect` goes through the stacking law.
    /// Effects aimed at unknown entities are skipped with a warning.
    pub fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::ApplyDamage { target, amount } => {
                    let Some(entity) = self.entities.get_mut(&target) else {
                        tracing::warn!(%target, "damage aimed at unknown entity; skipped");
                        continue;
                    };
                    if entity.apply_damage(amount) {
                        self.bus.publish(&Event::OnEntityDeath { id: target });
                    }
                }
                Effect::ApplyHealing { target, amount } => {
                    let Some(entity) = self.entities.get_mut(&target) else {
                        tracing::warn!(%target, "healing aimed at unknown entity; skipped");
                        continue;
                    };
                    entity.apply_healing(amount);
                }
                Effect::Dispatch { event } => {
                    self.bus.publish(&event);
                }
                Effect::ApplyStackingEffect {
                    source,
                    target,
                    kind,
                    stacks_to_add,
                    duration,
                    amplified,
                } => {
                    let Some(entity) = self.entities.get_mut(&target) else {
                        tracing::warn!(%target, ?kind, "stacking effect aimed at unknown entity; skipped");
                        continue;
                    };
                    self.engine.apply_stacking(
                        target,
                        entity,
                        source,
                        kind,
                        stacks_to_add,
                        duration,
                        amplified,
                    );
                }
            }
        }
    }
}
