//! Turns a resolved action into an ordered effect list.
//!
//! `plan` is pure: it draws every crit and proc roll it needs and returns
//! plain data. Nothing here mutates entity state.

use serde::{Deserialize, Serialize};

use crate::combat::events::{Effect, Event};
use crate::combat::resolve::{resolve_hit, HitOutcome};
use crate::combat::rng::RandomSource;
use crate::combat::stacking::{EffectCatalogue, EffectKind};
use crate::combat::state::EntityId;
use crate::combat::stats::StatProfile;

/// A proc attached to a skill: each hit independently rolls `proc_rate` and
/// on success applies the named stacking effect.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trigger {
    pub proc_rate: f64,
    pub kind: EffectKind,
    pub stacks: u32,
    pub duration: f64,
}

/// A chosen combat move. Selection is the caller's business; this crate
/// only resolves it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Action {
    Basic,
    MultiHit { hits: u32, triggers: Vec<Trigger> },
}

/// Resolves `action` into per-hit outcomes and the ordered effect list.
///
/// Every hit is independent: its own crit draw, and per trigger its own
/// proc draw; nothing is shared or batched across hits. Per hit the
/// emission order is `ApplyDamage`, `Dispatch(OnHit)`, `Dispatch(OnCrit)`
/// on a crit, then one `ApplyStackingEffect` per successful proc.
///
/// A trigger naming a kind missing from the catalogue is skipped: its proc
/// draw is still consumed (so the draw sequence matches a run where the
/// row exists), a `TriggerSkipped` warning event is emitted, and the rest
/// of the action resolves. `hits == 0` is a no-op, not an error.
#[allow(clippy::too_many_arguments)]
pub fn plan<R: RandomSource + ?Sized>(
    attacker_id: EntityId,
    defender_id: EntityId,
    attacker: &StatProfile,
    defender: &StatProfile,
    action: &Action,
    catalogue: &EffectCatalogue,
    rng: &mut R,
) -> (Vec<HitOutcome>, Vec<Effect>) {
    let (hits, triggers): (u32, &[Trigger]) = match action {
        Action::Basic => (1, &[]),
        Action::MultiHit { hits, triggers } => (*hits, triggers.as_slice()),
    };

    let mut outcomes = Vec::with_capacity(hits as usize);
    let mut effects = Vec::new();

    for _ in 0..hits {
        let outcome = resolve_hit(attacker, defender, rng);
        let amplified = outcome.amplifies_effects();

        effects.push(Effect::ApplyDamage {
            target: defender_id,
            amount: outcome.final_damage,
        });
        effects.push(Effect::Dispatch {
            event: Event::OnHit {
                attacker: attacker_id,
                defender: defender_id,
                damage: outcome.final_damage,
                is_crit: outcome.is_crit,
            },
        });
        if let Some(tier) = outcome.crit_tier_applied {
            effects.push(Effect::Dispatch {
                event: Event::OnCrit {
                    attacker: attacker_id,
                    defender: defender_id,
                    damage: outcome.final_damage,
                    tier,
                },
            });
        }

        for trigger in triggers {
            let proc = rng.roll(trigger.proc_rate);
            if !catalogue.contains(trigger.kind) {
                tracing::warn!(
                    ?trigger.kind,
                    "action trigger references a stacking effect missing from the catalogue; skipping"
                );
                effects.push(Effect::Dispatch {
                    event: Event::TriggerSkipped {
                        attacker: attacker_id,
                        kind: trigger.kind,
                    },
                });
                continue;
            }
            if proc {
                effects.push(Effect::ApplyStackingEffect {
                    source: attacker_id,
                    target: defender_id,
                    kind: trigger.kind,
                    stacks_to_add: trigger.stacks,
                    duration: trigger.duration,
                    amplified,
                });
            }
        }

        outcomes.push(outcome);
    }

    (outcomes, effects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::rng::SplitMix64;
    use crate::combat::stats::CritTier;

    const ATTACKER: EntityId = EntityId(1);
    const DEFENDER: EntityId = EntityId(2);

    fn attacker_profile(crit_chance: f64, tier: CritTier) -> StatProfile {
        StatProfile::new(100.0, 0.5, crit_chance, tier, 2.0, 0.0, 1.0).unwrap()
    }

    fn defender_profile() -> StatProfile {
        StatProfile::new(0.0, 0.5, 0.0, CritTier::Base, 1.0, 30.0, 1.0).unwrap()
    }

    fn bleed_trigger(proc_rate: f64) -> Trigger {
        Trigger {
            proc_rate,
            kind: EffectKind::Bleed,
            stacks: 1,
            duration: 5.0,
        }
    }

    #[test]
    fn basic_action_is_a_single_hit() {
        let mut rng = SplitMix64::new(1);
        let (outcomes, effects) = plan(
            ATTACKER,
            DEFENDER,
            &attacker_profile(0.0, CritTier::Base),
            &defender_profile(),
            &Action::Basic,
            &EffectCatalogue::standard(),
            &mut rng,
        );
        assert_eq!(outcomes.len(), 1);
        assert_eq!(effects.len(), 2);
        assert!(matches!(effects[0], Effect::ApplyDamage { target: DEFENDER, .. }));
        assert!(matches!(
            effects[1],
            Effect::Dispatch { event: Event::OnHit { .. } }
        ));
    }

    #[test]
    fn zero_hits_is_a_noop() {
        let mut rng = SplitMix64::new(1);
        let before = rng;
        let (outcomes, effects) = plan(
            ATTACKER,
            DEFENDER,
            &attacker_profile(0.5, CritTier::Full),
            &defender_profile(),
            &Action::MultiHit {
                hits: 0,
                triggers: vec![bleed_trigger(1.0)],
            },
            &EffectCatalogue::standard(),
            &mut rng,
        );
        assert!(outcomes.is_empty());
        assert!(effects.is_empty());
        // No draws were consumed either.
        let mut a = before;
        let mut b = rng;
        assert_eq!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn guaranteed_crit_emits_on_crit_after_on_hit() {
        let mut rng = SplitMix64::new(2);
        let (outcomes, effects) = plan(
            ATTACKER,
            DEFENDER,
            &attacker_profile(1.0, CritTier::PostPierce),
            &defender_profile(),
            &Action::Basic,
            &EffectCatalogue::standard(),
            &mut rng,
        );
        assert!(outcomes[0].is_crit);
        assert!(matches!(
            effects[1],
            Effect::Dispatch { event: Event::OnHit { is_crit: true, .. } }
        ));
        assert!(matches!(
            effects[2],
            Effect::Dispatch {
                event: Event::OnCrit { tier: CritTier::PostPierce, .. }
            }
        ));
    }

    #[test]
    fn guaranteed_proc_emits_one_application_per_hit() {
        let mut rng = SplitMix64::new(3);
        let (_, effects) = plan(
            ATTACKER,
            DEFENDER,
            &attacker_profile(0.0, CritTier::Base),
            &defender_profile(),
            &Action::MultiHit {
                hits: 3,
                triggers: vec![bleed_trigger(1.0)],
            },
            &EffectCatalogue::standard(),
            &mut rng,
        );
        let applications = effects
            .iter()
            .filter(|effect| matches!(effect, Effect::ApplyStackingEffect { .. }))
            .count();
        assert_eq!(applications, 3);
    }

    #[test]
    fn full_crit_marks_applications_amplified() {
        let mut rng = SplitMix64::new(4);
        let (_, effects) = plan(
            ATTACKER,
            DEFENDER,
            &attacker_profile(1.0, CritTier::Full),
            &defender_profile(),
            &Action::MultiHit {
                hits: 1,
                triggers: vec![bleed_trigger(1.0)],
            },
            &EffectCatalogue::standard(),
            &mut rng,
        );
        assert!(effects.iter().any(|effect| matches!(
            effect,
            Effect::ApplyStackingEffect { amplified: true, .. }
        )));
    }

    #[test]
    fn unknown_trigger_kind_is_skipped_with_warning_event() {
        let mut rng = SplitMix64::new(5);
        let mut catalogue = EffectCatalogue::new();
        // Bleed missing, Poison present.
        catalogue.insert(
            EffectKind::Poison,
            *EffectCatalogue::standard().get(EffectKind::Poison).unwrap(),
        );
        let (_, effects) = plan(
            ATTACKER,
            DEFENDER,
            &attacker_profile(0.0, CritTier::Base),
            &defender_profile(),
            &Action::MultiHit {
                hits: 1,
                triggers: vec![
                    bleed_trigger(1.0),
                    Trigger {
                        proc_rate: 1.0,
                        kind: EffectKind::Poison,
                        stacks: 1,
                        duration: 8.0,
                    },
                ],
            },
            &catalogue,
            &mut rng,
        );
        assert!(effects.iter().any(|effect| matches!(
            effect,
            Effect::Dispatch {
                event: Event::TriggerSkipped { kind: EffectKind::Bleed, .. }
            }
        )));
        // The rest of the action still resolved.
        assert!(effects.iter().any(|effect| matches!(
            effect,
            Effect::ApplyStackingEffect { kind: EffectKind::Poison, .. }
        )));
    }

    #[test]
    fn skipped_trigger_still_consumes_its_proc_draw() {
        let action = Action::MultiHit {
            hits: 1,
            triggers: vec![bleed_trigger(0.5)],
        };
        let attacker = attacker_profile(0.0, CritTier::Base);
        let defender = defender_profile();

        // Same seed, once with the row present and once without: the draws
        // consumed must match, verified by comparing the next raw value.
        let mut with_row = SplitMix64::new(77);
        plan(
            ATTACKER,
            DEFENDER,
            &attacker,
            &defender,
            &action,
            &EffectCatalogue::standard(),
            &mut with_row,
        );
        let mut without_row = SplitMix64::new(77);
        plan(
            ATTACKER,
            DEFENDER,
            &attacker,
            &defender,
            &action,
            &EffectCatalogue::new(),
            &mut without_row,
        );
        assert_eq!(with_row.next_u64(), without_row.next_u64());
    }
}
