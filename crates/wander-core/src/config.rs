//! Configuration loading and typed config structures for the patrol engine.
//!
//! The configuration lives in `wander.yaml` (path overridable with the
//! `WANDER_CONFIG` environment variable, resolved by the binary). Every
//! section and field has a default, so an empty file, or no file at all,
//! yields a runnable configuration.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tokio::time::Duration;
use wander_inventory::{TrashRule, TriageRules};
use wander_types::Coordinate;
use wander_world::RouteSeed;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The values parsed but are inconsistent.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration, mirroring `wander.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct BotConfig {
    /// Account credentials and account-level permissions.
    #[serde(default)]
    pub account: AccountConfig,

    /// Start point and route source.
    #[serde(default)]
    pub route: RouteConfig,

    /// Cycle interval and inter-call pacing.
    #[serde(default)]
    pub pacing: PacingConfig,

    /// Capture engine settings.
    #[serde(default)]
    pub capture: CaptureConfig,

    /// Landmark and stronghold settings.
    #[serde(default)]
    pub landmarks: LandmarkConfig,

    /// Inventory triage settings.
    #[serde(default)]
    pub triage: TriageConfig,

    /// Restart, stop, and loop settings.
    #[serde(default)]
    pub supervisor: SupervisorConfig,

    /// Scheduled rest periods.
    #[serde(default)]
    pub breaks: BreakConfig,

    /// Per-call transport limits.
    #[serde(default)]
    pub transport: TransportConfig,

    /// Reference data locations.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

impl BotConfig {
    /// Load configuration from a YAML file.
    ///
    /// Environment variables override the account section:
    /// - `WANDER_USERNAME` overrides `account.username`
    /// - `WANDER_PASSWORD` overrides `account.password`
    /// - `WANDER_PROVIDER` overrides `account.provider`
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.account.apply_env_overrides();
        Ok(config)
    }

    /// Check cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |message: &str| Err(ConfigError::Invalid(message.to_owned()));

        if self.pacing.interval_min_ms > self.pacing.interval_max_ms {
            return invalid("pacing.interval_min_ms exceeds pacing.interval_max_ms");
        }
        if !self.route.max_gap_m.is_finite() || self.route.max_gap_m <= 0.0 {
            return invalid("route.max_gap_m must be a positive distance");
        }
        if !(0.0..=1.0).contains(&self.capture.min_probability) {
            return invalid("capture.min_probability must be within 0.0..=1.0");
        }
        if self.capture.max_attempts_per_creature == 0 {
            return invalid("capture.max_attempts_per_creature must be at least 1");
        }
        if !self.landmarks.interaction_radius_m.is_finite()
            || self.landmarks.interaction_radius_m <= 0.0
        {
            return invalid("landmarks.interaction_radius_m must be a positive distance");
        }
        if self.landmarks.max_attempts == 0 {
            return invalid("landmarks.max_attempts must be at least 1");
        }
        if self.breaks.every_min_secs > self.breaks.every_max_secs {
            return invalid("breaks.every_min_secs exceeds breaks.every_max_secs");
        }
        if self.transport.call_timeout_ms == 0 {
            return invalid("transport.call_timeout_ms must be positive");
        }
        Ok(())
    }

    /// Triage rules with scrapping enabled only when both the triage
    /// section and the account allow it.
    pub fn triage_rules(&self) -> TriageRules {
        TriageRules {
            trash: self.triage.trash.clone(),
            scrap: self.triage.scrap && self.account.allow_scrap,
        }
    }
}

// ---------------------------------------------------------------------------
// Account
// ---------------------------------------------------------------------------

/// Account credentials and permissions.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct AccountConfig {
    /// Login name.
    #[serde(default)]
    pub username: String,

    /// Login secret.
    #[serde(default)]
    pub password: String,

    /// Authentication provider name.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Whether surplus creatures may ever be transferred from this account.
    #[serde(default)]
    pub allow_scrap: bool,
}

impl AccountConfig {
    /// Override credentials from `WANDER_*` environment variables.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("WANDER_USERNAME") {
            self.username = val;
        }
        if let Ok(val) = std::env::var("WANDER_PASSWORD") {
            self.password = val;
        }
        if let Ok(val) = std::env::var("WANDER_PROVIDER") {
            self.provider = val;
        }
    }

    /// The credentials handed to the connector.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            password: self.password.clone(),
            provider: self.provider.clone(),
        }
    }
}

impl Default for AccountConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            provider: default_provider(),
            allow_scrap: false,
        }
    }
}

impl core::fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AccountConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("provider", &self.provider)
            .field("allow_scrap", &self.allow_scrap)
            .finish()
    }
}

/// Login material passed to [`Connector::authenticate`].
///
/// [`Connector::authenticate`]: crate::session::Connector::authenticate
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Login secret.
    pub password: String,
    /// Authentication provider name.
    pub provider: String,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("provider", &self.provider)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Route
// ---------------------------------------------------------------------------

/// Where the patrol starts and which landmarks it visits.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RouteConfig {
    /// Start coordinate; traversal begins at the route point closest to it.
    #[serde(default = "default_start")]
    pub start: Coordinate,

    /// Pre-supplied landmarks as `[lat, lon]` or `[lat, lon, label]`.
    /// When empty, landmarks are discovered by an initial scan.
    #[serde(default)]
    pub locations: Vec<LocationEntry>,

    /// Maximum walking distance between consecutive route points, meters.
    #[serde(default = "default_max_gap_m")]
    pub max_gap_m: f64,
}

impl RouteConfig {
    /// The configured locations as planner seeds.
    pub fn seeds(&self) -> Vec<RouteSeed> {
        self.locations.iter().map(LocationEntry::to_seed).collect()
    }
}

impl Default for RouteConfig {
    fn default() -> Self {
        Self {
            start: default_start(),
            locations: Vec::new(),
            max_gap_m: default_max_gap_m(),
        }
    }
}

/// One pre-supplied landmark.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LocationEntry {
    /// `[lat, lon, label]`
    Labelled(f64, f64, String),
    /// `[lat, lon]`
    Plain(f64, f64),
}

impl LocationEntry {
    /// Convert to a planner seed.
    pub fn to_seed(&self) -> RouteSeed {
        match self {
            Self::Labelled(lat, lon, label) => RouteSeed {
                coordinate: Coordinate::new(*lat, *lon),
                label: Some(label.clone()),
            },
            Self::Plain(lat, lon) => RouteSeed::at(Coordinate::new(*lat, *lon)),
        }
    }
}

// ---------------------------------------------------------------------------
// Pacing
// ---------------------------------------------------------------------------

/// Cycle interval and inter-call pacing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PacingConfig {
    /// Lower bound of the randomized delay between cycles.
    #[serde(default = "default_interval_min_ms")]
    pub interval_min_ms: u64,

    /// Upper bound of the randomized delay between cycles.
    #[serde(default = "default_interval_max_ms")]
    pub interval_max_ms: u64,

    /// Delay between consecutive calls of a drain (throws, transfers).
    #[serde(default = "default_call_wait_ms")]
    pub call_wait_ms: u64,

    /// Delay before retrying after a transport error.
    #[serde(default = "default_retry_wait_ms")]
    pub retry_wait_ms: u64,

    /// Seed for jitter and pacing randomness; OS entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl PacingConfig {
    /// Delay between consecutive calls of a drain.
    pub const fn call_wait(&self) -> Duration {
        Duration::from_millis(self.call_wait_ms)
    }

    /// Delay before retrying after a transport error.
    pub const fn retry_wait(&self) -> Duration {
        Duration::from_millis(self.retry_wait_ms)
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            interval_min_ms: default_interval_min_ms(),
            interval_max_ms: default_interval_max_ms(),
            call_wait_ms: default_call_wait_ms(),
            retry_wait_ms: default_retry_wait_ms(),
            seed: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Capture
// ---------------------------------------------------------------------------

/// Capture engine settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaptureConfig {
    /// Whether catchable creatures are pursued at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Balls whose estimated probability falls below this are upgraded.
    /// `0.0` always picks the cheapest ball with an estimate.
    #[serde(default = "default_min_probability")]
    pub min_probability: f64,

    /// Upper bound on attempts (encounters plus throws) per creature.
    #[serde(default = "default_max_attempts_per_creature")]
    pub max_attempts_per_creature: u32,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_probability: default_min_probability(),
            max_attempts_per_creature: default_max_attempts_per_creature(),
        }
    }
}

// ---------------------------------------------------------------------------
// Landmarks
// ---------------------------------------------------------------------------

/// Landmark engine settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LandmarkConfig {
    /// Landmarks farther than this from the transmitted position are ignored.
    #[serde(default = "default_interaction_radius_m")]
    pub interaction_radius_m: f64,

    /// Delay between consecutive loot requests.
    #[serde(default = "default_loot_wait_ms")]
    pub loot_wait_ms: u64,

    /// Attempts per landmark when the transport fails.
    #[serde(default = "default_landmark_attempts")]
    pub max_attempts: u32,

    /// Stronghold deployment and bonus settings.
    #[serde(default)]
    pub strongholds: StrongholdConfig,
}

impl LandmarkConfig {
    /// Delay between consecutive loot requests.
    pub const fn loot_wait(&self) -> Duration {
        Duration::from_millis(self.loot_wait_ms)
    }
}

impl Default for LandmarkConfig {
    fn default() -> Self {
        Self {
            interaction_radius_m: default_interaction_radius_m(),
            loot_wait_ms: default_loot_wait_ms(),
            max_attempts: default_landmark_attempts(),
            strongholds: StrongholdConfig::default(),
        }
    }
}

/// Stronghold settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StrongholdConfig {
    /// Whether creatures are deployed to strongholds.
    #[serde(default)]
    pub enabled: bool,

    /// Minimum trainer level before deploying.
    #[serde(default = "default_min_player_level")]
    pub min_player_level: u32,

    /// Seconds between periodic defender bonus collections.
    #[serde(default = "default_bonus_interval_secs")]
    pub bonus_interval_secs: u64,
}

impl Default for StrongholdConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            min_player_level: default_min_player_level(),
            bonus_interval_secs: default_bonus_interval_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Triage
// ---------------------------------------------------------------------------

/// Inventory triage settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TriageConfig {
    /// Transfer surplus creatures (also requires `account.allow_scrap`).
    #[serde(default)]
    pub scrap: bool,

    /// Put waiting eggs into free incubators.
    #[serde(default = "default_true")]
    pub incubate: bool,

    /// Items to recycle down to a kept stock.
    #[serde(default)]
    pub trash: Vec<TrashRule>,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            scrap: false,
            incubate: true,
            trash: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Restart, stop, and loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SupervisorConfig {
    /// Keep cycling after startup. When false, only startup and triage run.
    #[serde(default = "default_true")]
    pub looping: bool,

    /// Consecutive session failures tolerated before giving up.
    #[serde(default = "default_max_restarts")]
    pub max_restarts: u32,

    /// Delay before restarting a broken session.
    #[serde(default = "default_restart_delay_ms")]
    pub restart_delay_ms: u64,

    /// Consecutive cycles with nothing nearby before stopping (0 = never).
    #[serde(default = "default_max_empty_streak")]
    pub max_empty_streak: u32,

    /// Stop after this many completed laps (0 = unlimited).
    #[serde(default)]
    pub max_laps: u64,
}

impl SupervisorConfig {
    /// Delay before restarting a broken session.
    pub const fn restart_delay(&self) -> Duration {
        Duration::from_millis(self.restart_delay_ms)
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            looping: true,
            max_restarts: default_max_restarts(),
            restart_delay_ms: default_restart_delay_ms(),
            max_empty_streak: default_max_empty_streak(),
            max_laps: 0,
        }
    }
}

/// Scheduled rest periods.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BreakConfig {
    /// Whether breaks are scheduled at all.
    #[serde(default)]
    pub enabled: bool,

    /// Lower bound of the time between breaks.
    #[serde(default = "default_break_every_min_secs")]
    pub every_min_secs: u64,

    /// Upper bound of the time between breaks.
    #[serde(default = "default_break_every_max_secs")]
    pub every_max_secs: u64,

    /// Length of each break.
    #[serde(default = "default_break_rest_secs")]
    pub rest_secs: u64,
}

impl BreakConfig {
    /// Length of each break.
    pub const fn rest(&self) -> Duration {
        Duration::from_secs(self.rest_secs)
    }
}

impl Default for BreakConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            every_min_secs: default_break_every_min_secs(),
            every_max_secs: default_break_every_max_secs(),
            rest_secs: default_break_rest_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// Transport and catalog
// ---------------------------------------------------------------------------

/// Per-call transport limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransportConfig {
    /// A call that has not answered within this window fails as a timeout.
    #[serde(default = "default_call_timeout_ms")]
    pub call_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            call_timeout_ms: default_call_timeout_ms(),
        }
    }
}

/// Reference data locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    /// YAML map of species number to display name.
    #[serde(default)]
    pub species_file: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_provider() -> String {
    String::from("ptc")
}

const fn default_start() -> Coordinate {
    Coordinate::new(0.0, 0.0)
}

const fn default_max_gap_m() -> f64 {
    40.0
}

const fn default_interval_min_ms() -> u64 {
    10_000
}

const fn default_interval_max_ms() -> u64 {
    30_000
}

const fn default_call_wait_ms() -> u64 {
    3_000
}

const fn default_retry_wait_ms() -> u64 {
    10_000
}

const fn default_true() -> bool {
    true
}

const fn default_min_probability() -> f64 {
    0.3
}

const fn default_max_attempts_per_creature() -> u32 {
    10
}

const fn default_interaction_radius_m() -> f64 {
    40.0
}

const fn default_loot_wait_ms() -> u64 {
    3_000
}

const fn default_landmark_attempts() -> u32 {
    3
}

const fn default_min_player_level() -> u32 {
    5
}

const fn default_bonus_interval_secs() -> u64 {
    75_600
}

const fn default_max_restarts() -> u32 {
    5
}

const fn default_restart_delay_ms() -> u64 {
    60_000
}

const fn default_max_empty_streak() -> u32 {
    50
}

const fn default_break_every_min_secs() -> u64 {
    3_600
}

const fn default_break_every_max_secs() -> u64 {
    7_200
}

const fn default_break_rest_secs() -> u64 {
    1_800
}

const fn default_call_timeout_ms() -> u64 {
    30_000
}
