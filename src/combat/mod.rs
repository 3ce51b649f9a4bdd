pub mod events;
pub mod orchestrator;
pub mod planner;
pub mod resolve;
pub mod rng;
pub mod stacking;
pub mod state;
pub mod stats;
pub mod trace;

pub use events::{Effect, Event, EventBus, EventKind, HandlerError, SubscriberId};
pub use orchestrator::{
    CombatConfig, CombatError, Orchestrator, DEFAULT_TICK_INTERVAL, FULL_CRIT_STACK_BONUS,
    REAPPLY_COOLDOWN_FRACTION,
};
pub use planner::{plan, Action, Trigger};
pub use resolve::{resolve_hit, HitOutcome};
pub use rng::{RandomSource, SplitMix64};
pub use stacking::{
    DamageFormula, EffectCatalogue, EffectEngine, EffectKind, EffectSpec, StackedEffectInstance,
    EPSILON, ESCALATION_STACK_DIVISOR,
};
pub use state::{EntityId, EntityState};
pub use stats::{
    ConfigurationError, CritTier, StatProfile, PIERCE_RATIO_MAX, PIERCE_RATIO_MIN,
};
pub use trace::{serialize_effects_json, serialize_events_json, TraceCollector, TraceMode};
