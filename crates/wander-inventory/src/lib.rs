//! Inventory triage for the Wander patrol engine.
//!
//! Everything here is pure: a raw inventory snapshot goes in, a classified
//! [`Triage`] comes out. The network side (recycling, transfers, favorites,
//! incubators) lives in `wander-core` and drains the queues computed here.
//!
//! # Modules
//!
//! - [`balls`] -- Capture-ball stock keyed by ball kind.
//! - [`triage`] -- Snapshot classification, best-per-species retention,
//!   disposal and favorite decisions, and greedy egg assignment.

pub mod balls;
pub mod triage;

pub use balls::BallInventory;
pub use triage::{
    LevelUp, TrashRule, Triage, TriageRules, assign_incubators, best_per_species, triage,
};
