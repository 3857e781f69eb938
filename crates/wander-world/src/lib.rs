//! The physical side of a patrol: distances on the globe, GPS-like noise,
//! and the closed route the agent walks.
//!
//! # Modules
//!
//! - [`error`] -- Error types for route planning.
//! - [`geo`] -- Great-circle distance and interpolation.
//! - [`jitter`] -- Low-order digit perturbation of transmitted coordinates.
//! - [`route`] -- The patrol [`Route`] and the planner that builds it.

pub mod error;
pub mod geo;
pub mod jitter;
pub mod route;

pub use error::WorldError;
pub use geo::{EARTH_RADIUS_M, distance_m, intermediate};
pub use jitter::jitter;
pub use route::{PlannedRoute, Route, RouteSeed, plan_route};
