//! Error types for the `wander-world` crate.

/// Errors that can occur while planning a patrol route.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WorldError {
    /// No landmark coordinates were supplied.
    #[error("cannot plan a route from an empty landmark set")]
    EmptyRoute,

    /// The maximum walking gap must be a positive finite distance.
    #[error("invalid maximum gap: {0} m")]
    InvalidGap(f64),
}
