//! Session supervision: startup, pacing between cycles, breaks, restarts,
//! and the decision to stop.
//!
//! [`Supervisor::run`] owns everything that must survive a session restart
//! (route, cursor, inventory, stronghold ledger, counters) and rebuilds
//! only the session itself. Each session runs inside a `session` span
//! tagged with a fresh [`SessionId`].

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tokio::time::{Duration, Instant};
use tracing::{Instrument, debug, error, info, info_span, warn};
use wander_types::{HeartbeatPayload, SessionId};
use wander_world::{Route, RouteSeed, WorldError, plan_route};

use crate::catalog::Catalog;
use crate::config::{BotConfig, BreakConfig, ConfigError};
use crate::context::{SessionContext, pause};
use crate::cycle::{CycleOutcome, CycleReport, Patrol, run_cycle};
use crate::dispatch::dispatch;
use crate::inventory::{self, InventoryState};
use crate::landmark::StrongholdLedger;
use crate::session::{Connector, Gateway, SessionClient, TransportError};

/// Errors that prevent the supervisor from starting.
#[derive(Debug, thiserror::Error)]
pub enum SupervisorError {
    /// The configuration failed validation.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: ConfigError,
    },
}

/// Why the patrol stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Looping is disabled; startup and triage ran once.
    SinglePass,
    /// The configured number of laps was completed.
    LapBudgetReached,
    /// Too many consecutive cycles saw nothing at all.
    SoftBlockSuspected,
    /// Consecutive session failures exceeded the restart budget.
    RestartBudgetExhausted,
}

/// Summary of a finished patrol.
#[derive(Debug, Clone, PartialEq)]
pub struct PatrolResult {
    /// Why the patrol stopped.
    pub stop_reason: StopReason,
    /// Sessions started, including failed ones.
    pub sessions: u32,
    /// Sessions that failed.
    pub failures: u32,
    /// Location cycles run.
    pub cycles: u64,
    /// Completed laps.
    pub laps: u64,
    /// Meters walked.
    pub distance_m: f64,
    /// Creatures captured.
    pub captured: u32,
    /// Landmarks looted.
    pub looted: u32,
    /// Experience from looting.
    pub experience: u64,
    /// Creatures deployed to strongholds.
    pub deployed: u32,
}

// ---------------------------------------------------------------------------
// Counters
// ---------------------------------------------------------------------------

/// Counters that decide restarts, soft-block stops, and breaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SupervisorState {
    restarts: u32,
    empty_streak: u32,
    break_due: Option<Instant>,
}

impl SupervisorState {
    /// Account for a finished cycle. A completed cycle clears the restart
    /// counter and moves the empty streak.
    pub const fn record_cycle(&mut self, report: &CycleReport) {
        if !matches!(report.outcome, CycleOutcome::Completed) {
            return;
        }
        self.restarts = 0;
        if report.creatures_seen == 0 {
            self.empty_streak = self.empty_streak.saturating_add(1);
        } else {
            self.empty_streak = 0;
        }
    }

    /// Count a session failure and return the consecutive total.
    pub const fn record_failure(&mut self) -> u32 {
        self.restarts = self.restarts.saturating_add(1);
        self.restarts
    }

    /// Consecutive cycles that saw no creature.
    pub const fn empty_streak(&self) -> u32 {
        self.empty_streak
    }

    /// Consecutive session failures.
    pub const fn restarts(&self) -> u32 {
        self.restarts
    }

    /// Whether a scheduled break is due. The first call schedules one;
    /// a due break is cleared so the next call schedules afresh.
    pub fn break_reached(&mut self, now: Instant, breaks: &BreakConfig, rng: &mut impl Rng) -> bool {
        if !breaks.enabled {
            return false;
        }
        let due = *self.break_due.get_or_insert_with(|| {
            let secs = rng.random_range(breaks.every_min_secs..=breaks.every_max_secs);
            debug!(in_secs = secs, "next break scheduled");
            now.checked_add(Duration::from_secs(secs)).unwrap_or(now)
        });
        if now >= due {
            self.break_due = None;
            return true;
        }
        false
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// How one session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Stop(StopReason),
    StartupFailed,
    Broken,
    Break,
}

#[derive(Debug, Clone, Copy, Default)]
struct Totals {
    sessions: u32,
    failures: u32,
    cycles: u64,
    captured: u32,
    looted: u32,
    experience: u64,
    deployed: u32,
}

impl Totals {
    fn absorb(&mut self, report: &CycleReport) {
        self.cycles = self.cycles.saturating_add(1);
        self.captured = self.captured.saturating_add(report.capture.captured);
        self.looted = self.looted.saturating_add(report.loot.looted);
        self.experience = self
            .experience
            .saturating_add(u64::from(report.loot.experience));
        self.deployed = self.deployed.saturating_add(report.strongholds.deployed);
    }
}

/// State that outlives any single session.
struct Walk {
    patrol: Option<Patrol>,
    inventory: InventoryState,
    ledger: StrongholdLedger,
    state: SupervisorState,
    totals: Totals,
    rng: SmallRng,
}

/// Drives sessions until a stop condition is met.
pub struct Supervisor<K> {
    connector: K,
    config: BotConfig,
    catalog: Box<dyn Catalog>,
    walk: Walk,
}

impl<K: Connector> Supervisor<K> {
    /// Validate `config` and prepare a supervisor. The route is planned on
    /// the first successful startup.
    ///
    /// # Errors
    ///
    /// Returns [`SupervisorError::Config`] if the configuration is
    /// inconsistent.
    pub fn new(
        connector: K,
        config: BotConfig,
        catalog: Box<dyn Catalog>,
    ) -> Result<Self, SupervisorError> {
        config.validate()?;
        let rng = config
            .pacing
            .seed
            .map_or_else(SmallRng::from_os_rng, SmallRng::seed_from_u64);
        Ok(Self {
            connector,
            config,
            catalog,
            walk: Walk {
                patrol: None,
                inventory: InventoryState::new(),
                ledger: StrongholdLedger::default(),
                state: SupervisorState::default(),
                totals: Totals::default(),
                rng,
            },
        })
    }

    /// Use a ready-made route instead of planning one.
    #[must_use]
    pub fn with_route(mut self, route: Route, start_index: usize) -> Self {
        self.walk.patrol = Some(Patrol::new(route, start_index));
        self
    }

    /// The route being walked, once planned.
    pub fn route(&self) -> Option<&Route> {
        self.walk.patrol.as_ref().map(|patrol| &patrol.route)
    }

    /// Inventory knowledge gathered so far.
    pub const fn inventory(&self) -> &InventoryState {
        &self.walk.inventory
    }

    /// Run sessions until a stop condition is met.
    pub async fn run(&mut self) -> PatrolResult {
        info!(
            username = %self.config.account.username,
            looping = self.config.supervisor.looping,
            max_restarts = self.config.supervisor.max_restarts,
            "patrol starting"
        );

        loop {
            let session_id = SessionId::new();
            self.walk.totals.sessions = self.walk.totals.sessions.saturating_add(1);
            let end = run_session(
                &mut self.connector,
                &self.config,
                self.catalog.as_ref(),
                &mut self.walk,
            )
            .instrument(info_span!("session", session_id = %session_id))
            .await;

            let delay = match end {
                SessionEnd::Stop(reason) => return self.result(reason),
                SessionEnd::Break => {
                    info!(rest_secs = self.config.breaks.rest_secs, "taking a break");
                    self.config.breaks.rest()
                }
                SessionEnd::StartupFailed | SessionEnd::Broken => {
                    self.walk.totals.failures = self.walk.totals.failures.saturating_add(1);
                    let restarts = self.walk.state.record_failure();
                    if restarts > self.config.supervisor.max_restarts {
                        error!(restarts, "restart budget exhausted");
                        return self.result(StopReason::RestartBudgetExhausted);
                    }
                    let delay = if end == SessionEnd::StartupFailed {
                        self.config.pacing.retry_wait()
                    } else {
                        self.config.supervisor.restart_delay()
                    };
                    warn!(
                        restarts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "restarting session"
                    );
                    delay
                }
            };
            pause(delay).await;
        }
    }

    fn result(&self, stop_reason: StopReason) -> PatrolResult {
        let totals = self.walk.totals;
        let (laps, distance_m) = self
            .walk
            .patrol
            .as_ref()
            .map_or((0, 0.0), |p| (p.cursor.laps(), p.cursor.distance_m()));
        PatrolResult {
            stop_reason,
            sessions: totals.sessions,
            failures: totals.failures,
            cycles: totals.cycles,
            laps,
            distance_m,
            captured: totals.captured,
            looted: totals.looted,
            experience: totals.experience,
            deployed: totals.deployed,
        }
    }
}

async fn run_session<K: Connector>(
    connector: &mut K,
    config: &BotConfig,
    catalog: &dyn Catalog,
    walk: &mut Walk,
) -> SessionEnd {
    let client = match connector
        .authenticate(&config.account.credentials(), config.route.start)
        .await
    {
        Ok(client) => client,
        Err(err) => {
            warn!(error = %err, "authentication failed");
            return SessionEnd::StartupFailed;
        }
    };
    let gateway = Gateway::new(client, config.transport.call_timeout_ms);
    let ctx = SessionContext {
        gateway: &gateway,
        config,
        catalog,
    };

    if let Err(err) = start_session(ctx, walk).await {
        warn!(error = %err, "session startup failed");
        return SessionEnd::StartupFailed;
    }
    if !config.supervisor.looping {
        return SessionEnd::Stop(StopReason::SinglePass);
    }
    let Some(patrol) = walk.patrol.as_mut() else {
        return SessionEnd::StartupFailed;
    };

    loop {
        let report = run_cycle(
            ctx,
            &mut walk.inventory,
            patrol,
            &mut walk.ledger,
            &mut walk.rng,
        )
        .await;
        walk.totals.absorb(&report);
        if report.outcome == CycleOutcome::SessionBroken {
            return SessionEnd::Broken;
        }
        walk.state.record_cycle(&report);

        let max_empty = config.supervisor.max_empty_streak;
        if max_empty > 0 && walk.state.empty_streak() >= max_empty {
            warn!(
                streak = walk.state.empty_streak(),
                "nothing seen for too long, the account may be soft-blocked"
            );
            return SessionEnd::Stop(StopReason::SoftBlockSuspected);
        }
        let max_laps = config.supervisor.max_laps;
        if max_laps > 0 && patrol.cursor.laps() >= max_laps {
            info!(laps = patrol.cursor.laps(), "lap budget reached");
            return SessionEnd::Stop(StopReason::LapBudgetReached);
        }
        if walk
            .state
            .break_reached(Instant::now(), &config.breaks, &mut walk.rng)
        {
            return SessionEnd::Break;
        }

        let wait_ms = walk
            .rng
            .random_range(config.pacing.interval_min_ms..=config.pacing.interval_max_ms);
        debug!(wait_ms, "waiting before next cycle");
        pause(Duration::from_millis(wait_ms)).await;
    }
}

async fn start_session<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    walk: &mut Walk,
) -> Result<(), TransportError> {
    let profile = ctx.gateway.fetch_profile().await?;
    info!(
        username = %profile.username,
        team = ?profile.team,
        item_storage = profile.item_storage,
        creature_storage = profile.creature_storage,
        "profile loaded"
    );
    for (currency, amount) in &profile.currencies {
        info!(%currency, amount, "balance");
    }
    walk.inventory.profile = profile;

    inventory::refresh(ctx, &mut walk.inventory).await?;
    inventory::housekeeping(ctx, &mut walk.inventory).await;

    if walk.patrol.is_none() {
        walk.patrol = Some(plan_patrol(ctx, &mut walk.inventory).await?);
    }
    Ok(())
}

async fn plan_patrol<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    inventory: &mut InventoryState,
) -> Result<Patrol, TransportError> {
    let start = ctx.config.route.start;
    let seeds = if ctx.config.route.locations.is_empty() {
        ctx.gateway.set_position(start).await?;
        let payload = ctx.gateway.heartbeat().await?;
        scan_seeds(ctx, inventory, payload).await
    } else {
        ctx.config.route.seeds()
    };

    match plan_route(seeds, start, ctx.config.route.max_gap_m) {
        Ok(planned) => {
            info!(
                waypoints = planned.route.len(),
                start_index = planned.start_index,
                max_gap_m = planned.route.max_gap_m(),
                "route planned"
            );
            Ok(Patrol::new(planned.route, planned.start_index))
        }
        Err(err @ (WorldError::EmptyRoute | WorldError::InvalidGap(_))) => {
            warn!(error = %err, %start, "no route available, holding position");
            Ok(Patrol::new(Route::stationary(start), 0))
        }
    }
}

async fn scan_seeds<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    inventory: &mut InventoryState,
    payload: HeartbeatPayload,
) -> Vec<RouteSeed> {
    let map = dispatch(ctx, inventory, payload).await.map;
    map.landmarks()
        .map(|landmark| RouteSeed {
            coordinate: landmark.coordinate,
            label: Some(landmark.id.to_string()),
        })
        .collect()
}

/// Log the end of a patrol.
pub fn log_run_end(result: &PatrolResult) {
    info!(
        reason = ?result.stop_reason,
        sessions = result.sessions,
        failures = result.failures,
        cycles = result.cycles,
        laps = result.laps,
        distance_m = result.distance_m,
        "patrol ended"
    );
    if result.cycles == 0 {
        warn!("patrol ended without a single location cycle");
    } else {
        info!(
            captured = result.captured,
            looted = result.looted,
            experience = result.experience,
            deployed = result.deployed,
            "patrol totals"
        );
    }
}
