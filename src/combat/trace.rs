//! Replay-verification surface: collect published events and serialize
//! them to a stable JSON shape.
//!
//! Given an identical seed and call sequence, two runs must produce
//! byte-identical serialized traces; the integration suite holds the crate
//! to that.

use std::cell::RefCell;
use std::rc::Rc;

use crate::combat::events::{Effect, Event, EventBus, EventKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TraceMode {
    #[default]
    Off,
    Events,
}

/// Records every event published on a bus (or fed to it directly).
///
/// Cheap to clone: clones share the same underlying buffer, which is what
/// lets `attach` hand recording closures to the bus while the caller keeps
/// reading.
#[derive(Clone, Debug, Default)]
pub struct TraceCollector {
    mode: TraceMode,
    events: Rc<RefCell<Vec<Event>>>,
}

impl TraceCollector {
    pub fn new(mode: TraceMode) -> Self {
        Self {
            mode,
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Subscribes the collector to every event kind on `bus`. A collector
    /// in `Off` mode subscribes to nothing and costs nothing.
    pub fn attach(&self, bus: &EventBus) {
        if self.mode == TraceMode::Off {
            return;
        }
        for kind in EventKind::ALL {
            let sink = Rc::clone(&self.events);
            bus.subscribe(kind, move |event| {
                sink.borrow_mut().push(event.clone());
                Ok(())
            });
        }
    }

    pub fn record(&self, event: Event) {
        if self.mode == TraceMode::Off {
            return;
        }
        self.events.borrow_mut().push(event);
    }

    /// Snapshot of everything recorded so far.
    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

/// Serializes an event trace to JSON with a stable field order.
pub fn serialize_events_json(events: &[Event]) -> serde_json::Result<String> {
    serde_json::to_string(events)
}

/// Serializes a planned effect list to JSON with a stable field order.
pub fn serialize_effects_json(effects: &[Effect]) -> serde_json::Result<String> {
    serde_json::to_string(effects)
}
