//! Stacking-effect catalogue and the tick-driven effect engine.
//!
//! Each [`EffectKind`] is a data row ([`EffectSpec`]): a damage formula
//! selector plus its parameters. Adding a new damage-over-time effect means
//! adding a row, not a type. The engine applies the "combined refresh"
//! stacking law and produces periodic damage on tick boundaries; all damage
//! it emits is plain [`Effect`] data that only the orchestrator applies.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::combat::events::{Effect, Event};
use crate::combat::orchestrator::CombatConfig;
use crate::combat::state::{EntityId, EntityState};

/// Tolerance for tick-boundary comparisons on accumulated float time.
pub const EPSILON: f64 = 1e-9;

/// Divisor in the escalating (Burn) formula's exponent: damage scales by
/// `2^(stacks / 30)`.
pub const ESCALATION_STACK_DIVISOR: f64 = 30.0;

/// Closed set of stacking effects known to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    Bleed,
    Poison,
    Burn,
    LifeDrain,
}

/// Damage formula selector for one catalogue row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DamageFormula {
    /// `base_damage * stacks` (Bleed).
    PerStackFlat,
    /// `target_current_health * base_pct * stacks` (Poison).
    CurrentHealthFraction,
    /// `base_damage * stacks * 2^(stacks / 30)` (Burn).
    EscalatingPerStackFlat,
    /// `target_missing_health * base_pct * stacks`, healing the source for
    /// the same amount (LifeDrain).
    MissingHealthDrain,
}

/// One data row of the stacking-effect catalogue.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectSpec {
    pub formula: DamageFormula,
    pub base_damage: f64,
    pub base_pct: f64,
    pub max_stacks: u32,
    pub default_duration: f64,
}

/// Formula table, supplied by the content pipeline at simulation start.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EffectCatalogue {
    rows: BTreeMap<EffectKind, EffectSpec>,
}

impl EffectCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stock table used when no external catalogue is supplied.
    pub fn standard() -> Self {
        let mut catalogue = Self::new();
        catalogue.insert(
            EffectKind::Bleed,
            EffectSpec {
                formula: DamageFormula::PerStackFlat,
                base_damage: 10.0,
                base_pct: 0.0,
                max_stacks: 25,
                default_duration: 5.0,
            },
        );
        catalogue.insert(
            EffectKind::Poison,
            EffectSpec {
                formula: DamageFormula::CurrentHealthFraction,
                base_damage: 0.0,
                base_pct: 0.01,
                max_stacks: 50,
                default_duration: 8.0,
            },
        );
        catalogue.insert(
            EffectKind::Burn,
            EffectSpec {
                formula: DamageFormula::EscalatingPerStackFlat,
                base_damage: 6.0,
                base_pct: 0.0,
                max_stacks: 100,
                default_duration: 6.0,
            },
        );
        catalogue.insert(
            EffectKind::LifeDrain,
            EffectSpec {
                formula: DamageFormula::MissingHealthDrain,
                base_damage: 0.0,
                base_pct: 0.02,
                max_stacks: 30,
                default_duration: 4.0,
            },
        );
        catalogue
    }

    pub fn insert(&mut self, kind: EffectKind, spec: EffectSpec) {
        self.rows.insert(kind, spec);
    }

    pub fn get(&self, kind: EffectKind) -> Option<&EffectSpec> {
        self.rows.get(&kind)
    }

    pub fn contains(&self, kind: EffectKind) -> bool {
        self.rows.contains_key(&kind)
    }
}

/// One live stacking-effect instance on one entity. At most one per kind
/// per entity; re-application refreshes it instead of creating another.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StackedEffectInstance {
    pub kind: EffectKind,
    /// Entity whose hit applied the effect (receives LifeDrain healing,
    /// reported as the tick source).
    pub source: EntityId,
    pub stacks: u32,
    pub duration_remaining: f64,
    pub duration_max: f64,
    /// Active time accrued toward the next tick boundary.
    pub tick_accumulator: f64,
    /// Remaining internal cooldown during which re-applications are
    /// suppressed.
    pub reapply_cooldown: f64,
}

/// Owns the catalogue and the stacking/tick rules. Pure over the entity map
/// it is handed: damage leaves as [`Effect`] values, never direct mutation
/// of health.
#[derive(Clone, Debug)]
pub struct EffectEngine {
    config: CombatConfig,
    catalogue: EffectCatalogue,
}

impl EffectEngine {
    pub fn new(config: CombatConfig, catalogue: EffectCatalogue) -> Self {
        Self { config, catalogue }
    }

    pub fn catalogue(&self) -> &EffectCatalogue {
        &self.catalogue
    }

    /// Combined refresh: applying an active kind increments its stacks
    /// (clamped to the row's `max_stacks`, never decreased) and resets the
    /// duration; a first application creates the instance. Returns whether
    /// anything was applied.
    ///
    /// Re-applications landing inside the internal cooldown window
    /// (`reapply_cooldown_fraction` of the tick interval) are dropped
    /// entirely, so a very fast attacker gains nothing from the burst.
    pub fn apply_stacking(
        &self,
        target: EntityId,
        entity: &mut EntityState,
        source: EntityId,
        kind: EffectKind,
        stacks_to_add: u32,
        duration: f64,
        amplified: bool,
    ) -> bool {
        let Some(spec) = self.catalogue.get(kind) else {
            tracing::warn!(%target, ?kind, "stacking effect missing from catalogue; dropped");
            return false;
        };
        if !entity.alive {
            return false;
        }
        let duration = if duration > 0.0 {
            duration
        } else {
            spec.default_duration
        };
        let added = if amplified {
            stacks_to_add.saturating_mul(self.config.full_crit_stack_bonus)
        } else {
            stacks_to_add
        };
        if added == 0 {
            return false;
        }
        let cooldown = self.config.tick_interval * self.config.reapply_cooldown_fraction;

        match entity.stacking_effects.entry(kind) {
            Entry::Occupied(mut occupied) => {
                let instance = occupied.get_mut();
                if instance.reapply_cooldown > 0.0 {
                    tracing::trace!(%target, ?kind, "re-application suppressed by internal cooldown");
                    return false;
                }
                instance.stacks = instance.stacks.saturating_add(added).min(spec.max_stacks);
                instance.duration_max = duration;
                instance.duration_remaining = duration;
                instance.reapply_cooldown = cooldown;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(StackedEffectInstance {
                    kind,
                    source,
                    stacks: added.min(spec.max_stacks),
                    duration_remaining: duration,
                    duration_max: duration,
                    tick_accumulator: 0.0,
                    reapply_cooldown: cooldown,
                });
            }
        }
        true
    }

    /// Ages every instance on every alive entity by `dt` and emits damage
    /// for each crossed tick boundary (default interval 1.0s).
    ///
    /// Expiry is atomic with respect to damage: boundaries crossed before
    /// the duration runs out still fire, nothing fires afterwards, and the
    /// instance is removed within the same call. Dead entities are skipped
    /// entirely.
    pub fn tick(&self, dt: f64, entities: &mut BTreeMap<EntityId, EntityState>) -> Vec<Effect> {
        let mut effects = Vec::new();
        if !(dt > 0.0) {
            return effects;
        }

        for (&target, entity) in entities.iter_mut() {
            if !entity.alive {
                continue;
            }
            // Formulas read the health the entity entered the tick with;
            // damage from this tick lands when the orchestrator applies it.
            let health_snapshot = entity.health;
            let missing_snapshot = entity.missing_health();
            let mut expired = Vec::new();

            for (&kind, instance) in entity.stacking_effects.iter_mut() {
                instance.reapply_cooldown = (instance.reapply_cooldown - dt).max(0.0);

                let Some(spec) = self.catalogue.get(kind) else {
                    tracing::warn!(%target, ?kind, "active effect lost its catalogue row; expiring");
                    expired.push(kind);
                    continue;
                };

                // Only time the instance is actually active counts toward
                // the boundary, so expiry mid-slice cannot over-fire.
                let active = instance.duration_remaining.min(dt);
                instance.tick_accumulator += active;
                while instance.tick_accumulator >= self.config.tick_interval - EPSILON {
                    instance.tick_accumulator -= self.config.tick_interval;
                    let amount =
                        tick_damage(spec, instance.stacks, health_snapshot, missing_snapshot);
                    effects.push(Effect::ApplyDamage { target, amount });
                    effects.push(Effect::Dispatch {
                        event: Event::OnDamageTick {
                            source: instance.source,
                            target,
                            kind,
                            amount,
                        },
                    });
                    if spec.formula == DamageFormula::MissingHealthDrain {
                        effects.push(Effect::ApplyHealing {
                            target: instance.source,
                            amount,
                        });
                    }
                }

                instance.duration_remaining = (instance.duration_remaining - dt).max(0.0);
                if instance.duration_remaining <= 0.0 {
                    expired.push(kind);
                }
            }

            for kind in expired {
                entity.stacking_effects.remove(&kind);
            }
        }
        effects
    }
}

fn tick_damage(spec: &EffectSpec, stacks: u32, current_health: f64, missing_health: f64) -> f64 {
    let stacks = f64::from(stacks.min(spec.max_stacks));
    match spec.formula {
        DamageFormula::PerStackFlat => spec.base_damage * stacks,
        DamageFormula::CurrentHealthFraction => current_health * spec.base_pct * stacks,
        DamageFormula::EscalatingPerStackFlat => {
            spec.base_damage * stacks * (stacks / ESCALATION_STACK_DIVISOR).exp2()
        }
        DamageFormula::MissingHealthDrain => missing_health * spec.base_pct * stacks,
    }
}
