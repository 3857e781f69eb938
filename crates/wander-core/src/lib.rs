//! Session supervision, the location cycle, and the reactive engines of the
//! Wander patrol engine.
//!
//! A [`Supervisor`] authenticates through a [`Connector`], plans a route
//! once, then repeats location cycles: move, heartbeat, dispatch, capture,
//! loot, deploy. Every network call goes through a [`Gateway`] that keeps a
//! single request in flight and bounds it with a timeout.
//!
//! # Modules
//!
//! - [`config`] -- `wander.yaml` loading into typed sections.
//! - [`catalog`] -- Species and item display names.
//! - [`session`] -- [`SessionClient`] and [`Connector`] traits, the
//!   [`Gateway`], and [`TransportError`].
//! - [`context`] -- The borrowed per-session view the engines share.
//! - [`inventory`] -- Inventory state across cycles and the triage drains.
//! - [`capture`] -- The per-creature capture state machine.
//! - [`landmark`] -- Landmark classification, looting, and strongholds.
//! - [`dispatch`] -- Heartbeat part routing.
//! - [`cycle`] -- One location cycle and the route cursor.
//! - [`supervisor`] -- Startup, pacing, breaks, restarts, and stopping.
//! - [`offline`] -- A seeded in-memory world implementing the client traits.
//!
//! [`Supervisor`]: supervisor::Supervisor
//! [`Connector`]: session::Connector
//! [`Gateway`]: session::Gateway
//! [`SessionClient`]: session::SessionClient
//! [`TransportError`]: session::TransportError

pub mod capture;
pub mod catalog;
pub mod config;
pub mod context;
pub mod cycle;
pub mod dispatch;
pub mod inventory;
pub mod landmark;
pub mod offline;
pub mod session;
pub mod supervisor;

#[cfg(test)]
mod testing;
