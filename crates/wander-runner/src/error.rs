//! Error types for the runner binary.

/// Top-level error for the runner binary.
///
/// Each variant wraps a failure from one startup step, so `main` can
/// propagate everything with `?`.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration or catalog loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: wander_core::config::ConfigError,
    },

    /// The supervisor refused to start.
    #[error("supervisor error: {source}")]
    Supervisor {
        /// The underlying supervisor error.
        #[from]
        source: wander_core::supervisor::SupervisorError,
    },

    /// Writing the route export failed.
    #[error("route export failed: {source}")]
    Export {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },
}
