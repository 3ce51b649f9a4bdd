//! Deterministic combat resolution core for tick-based RPG simulations.
//!
//! The crate resolves already-chosen combat actions between entities: an
//! attacker snapshot, a defender snapshot, and an [`combat::Action`] go in;
//! damage, critical-hit outcomes, and stacking-effect procs come out. Every
//! probabilistic decision flows through an injected [`combat::RandomSource`],
//! so a run is bit-for-bit reproducible from its seed.
//!
//! Planning is pure ([`combat::resolve_hit`], [`combat::plan`]); only the
//! [`combat::Orchestrator`] mutates entity state. Content loading, item
//! generation, and batch reporting live outside this crate and talk to it
//! through plain data.
pub mod combat;
