//! Event and effect payloads plus the synchronous dispatcher.
//!
//! Events decouple the resolution pipeline from reactive systems (proc
//! handlers, trace loggers). Effects are the ordered command list the
//! planner and effect engine hand to the orchestrator; nothing else applies
//! them.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::combat::stacking::EffectKind;
use crate::combat::state::EntityId;
use crate::combat::stats::CritTier;

/// A fact about something that happened, carrying full context so no
/// subscriber has to re-query external state to react.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    OnHit {
        attacker: EntityId,
        defender: EntityId,
        damage: f64,
        is_crit: bool,
    },
    OnCrit {
        attacker: EntityId,
        defender: EntityId,
        damage: f64,
        tier: CritTier,
    },
    OnDamageTick {
        source: EntityId,
        target: EntityId,
        kind: EffectKind,
        amount: f64,
    },
    OnEntityDeath {
        id: EntityId,
    },
    /// Warning: an action trigger referenced a stacking effect missing from
    /// the catalogue. The trigger was skipped; the action still resolved.
    TriggerSkipped {
        attacker: EntityId,
        kind: EffectKind,
    },
}

/// Field-less discriminant used for subscription routing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Hit,
    Crit,
    DamageTick,
    EntityDeath,
    TriggerSkipped,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Hit,
        EventKind::Crit,
        EventKind::DamageTick,
        EventKind::EntityDeath,
        EventKind::TriggerSkipped,
    ];
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::OnHit { .. } => EventKind::Hit,
            Event::OnCrit { .. } => EventKind::Crit,
            Event::OnDamageTick { .. } => EventKind::DamageTick,
            Event::OnEntityDeath { .. } => EventKind::EntityDeath,
            Event::TriggerSkipped { .. } => EventKind::TriggerSkipped,
        }
    }
}

/// A command to mutate state, produced by pure planning and consumed in
/// list order by the orchestrator alone.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Effect {
    ApplyDamage {
        target: EntityId,
        amount: f64,
    },
    ApplyHealing {
        target: EntityId,
        amount: f64,
    },
    Dispatch {
        event: Event,
    },
    ApplyStackingEffect {
        source: EntityId,
        target: EntityId,
        kind: EffectKind,
        stacks_to_add: u32,
        duration: f64,
        /// Set when the originating hit was a Full-tier crit; the stacking
        /// law scales `stacks_to_add` accordingly.
        amplified: bool,
    },
}

/// Error surfaced by a subscriber. Isolated per handler: it is logged and
/// dispatch continues.
pub type HandlerError = Box<dyn std::error::Error>;

type Handler = Rc<RefCell<dyn FnMut(&Event) -> Result<(), HandlerError>>>;

/// Handle returned by [`EventBus::subscribe`], usable for unsubscription.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SubscriberId(u64);

struct Subscriber {
    id: SubscriberId,
    handler: Handler,
}

/// Synchronous publish/subscribe dispatcher.
///
/// Dispatch order is subscription order. Publish iterates a snapshot of the
/// subscriber list, so a handler may publish further events or change
/// subscriptions without invalidating the iteration. Single-threaded by
/// design; each simulation run owns its own bus.
#[derive(Default)]
pub struct EventBus {
    subscribers: RefCell<HashMap<EventKind, Vec<Subscriber>>>,
    next_id: Cell<u64>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriberId
    where
        F: FnMut(&Event) -> Result<(), HandlerError> + 'static,
    {
        let id = SubscriberId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.subscribers
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Subscriber {
                id,
                handler: Rc::new(RefCell::new(handler)),
            });
        id
    }

    /// Removes a subscriber. Returns false if the id was already gone.
    pub fn unsubscribe(&self, id: SubscriberId) -> bool {
        let mut subscribers = self.subscribers.borrow_mut();
        let mut removed = false;
        for list in subscribers.values_mut() {
            let before = list.len();
            list.retain(|subscriber| subscriber.id != id);
            removed |= list.len() != before;
        }
        removed
    }

    /// Dispatches `event` to every subscriber of its kind, in subscription
    /// order. A failing handler is logged and skipped; it never aborts the
    /// rest of the dispatch or the surrounding tick loop.
    pub fn publish(&self, event: &Event) {
        let snapshot: Vec<(SubscriberId, Handler)> = {
            let subscribers = self.subscribers.borrow();
            match subscribers.get(&event.kind()) {
                Some(list) => list
                    .iter()
                    .map(|subscriber| (subscriber.id, Rc::clone(&subscriber.handler)))
                    .collect(),
                None => return,
            }
        };

        for (id, handler) in snapshot {
            match handler.try_borrow_mut() {
                Ok(mut handler) => {
                    if let Err(error) = handler(event) {
                        tracing::warn!(
                            subscriber = id.0,
                            kind = ?event.kind(),
                            %error,
                            "event handler failed; continuing dispatch"
                        );
                    }
                }
                // The handler published an event it is itself subscribed to.
                Err(_) => {
                    tracing::warn!(
                        subscriber = id.0,
                        kind = ?event.kind(),
                        "skipping re-entrant dispatch into a running handler"
                    );
                }
            }
        }
    }

    /// Number of live subscriptions for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscribers
            .borrow()
            .get(&kind)
            .map_or(0, |list| list.len())
    }
}
