//! One pass of the patrol: move, report, react.
//!
//! [`run_cycle`] advances the [`Cursor`] to the next waypoint, transmits a
//! jittered position, sends a heartbeat, and hands the payload to the
//! dispatcher before draining the capture, loot, and stronghold work it
//! produced. The supervisor decides what happens between cycles.

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, warn};
use wander_types::{CatchableCreature, Coordinate, Waypoint};
use wander_world::{Route, distance_m, jitter};

use crate::capture::{self, CaptureSummary};
use crate::context::SessionContext;
use crate::dispatch::dispatch;
use crate::inventory::{self, InventoryState};
use crate::landmark::{self, LootSummary, StrongholdLedger, StrongholdSummary};
use crate::session::SessionClient;

// ---------------------------------------------------------------------------
// Cursor
// ---------------------------------------------------------------------------

/// Position along the route plus what the walk has covered so far.
#[derive(Debug, Clone, PartialEq)]
pub struct Cursor {
    index: usize,
    started: bool,
    previous: Option<Coordinate>,
    distance_m: f64,
    laps: u64,
}

impl Cursor {
    /// A cursor whose first step lands on `start_index`.
    pub const fn at(start_index: usize) -> Self {
        Self {
            index: start_index,
            started: false,
            previous: None,
            distance_m: 0.0,
            laps: 0,
        }
    }

    /// Step to the next waypoint. Wrapping past the end counts one lap.
    pub fn advance<'r>(&mut self, route: &'r Route) -> Option<&'r Waypoint> {
        if self.started {
            let (next, wrapped) = route.next_index(self.index);
            self.index = next;
            if wrapped {
                self.laps = self.laps.saturating_add(1);
            }
        } else {
            self.started = true;
            if self.index >= route.len() {
                self.index = 0;
            }
        }
        route.get(self.index)
    }

    /// Add the great-circle distance from the last accepted position.
    pub fn record_position(&mut self, at: Coordinate) {
        if let Some(previous) = self.previous {
            self.distance_m += distance_m(previous, at);
        }
        self.previous = Some(at);
    }

    /// Current waypoint index.
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Meters walked since the cursor was created.
    pub const fn distance_m(&self) -> f64 {
        self.distance_m
    }

    /// Completed laps.
    pub const fn laps(&self) -> u64 {
        self.laps
    }
}

/// A route and the cursor walking it.
#[derive(Debug, Clone, PartialEq)]
pub struct Patrol {
    /// The planned loop.
    pub route: Route,
    /// Progress along it.
    pub cursor: Cursor,
}

impl Patrol {
    /// Start walking `route` at `start_index`.
    pub const fn new(route: Route, start_index: usize) -> Self {
        Self {
            route,
            cursor: Cursor::at(start_index),
        }
    }
}

// ---------------------------------------------------------------------------
// Cycle
// ---------------------------------------------------------------------------

/// How a cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Heartbeat handled and reactive work drained.
    Completed,
    /// The server refused the position; nothing else was attempted.
    PositionRejected,
    /// The heartbeat failed; the session should be discarded.
    SessionBroken,
}

/// What one cycle observed and achieved.
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    /// How the cycle ended.
    pub outcome: CycleOutcome,
    /// Transmitted (jittered) position.
    pub position: Option<Coordinate>,
    /// Creatures seen, catchable or not.
    pub creatures_seen: usize,
    /// Capture queue results.
    pub capture: CaptureSummary,
    /// Looting results.
    pub loot: LootSummary,
    /// Stronghold results.
    pub strongholds: StrongholdSummary,
}

impl CycleReport {
    fn ended(outcome: CycleOutcome, position: Option<Coordinate>) -> Self {
        Self {
            outcome,
            position,
            creatures_seen: 0,
            capture: CaptureSummary::default(),
            loot: LootSummary::default(),
            strongholds: StrongholdSummary::default(),
        }
    }
}

/// Run one location cycle against the current session.
pub async fn run_cycle<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
    patrol: &mut Patrol,
    ledger: &mut StrongholdLedger,
    rng: &mut impl Rng,
) -> CycleReport {
    let Some(waypoint) = patrol.cursor.advance(&patrol.route) else {
        warn!("route has no waypoints");
        return CycleReport::ended(CycleOutcome::PositionRejected, None);
    };
    let position = jitter(waypoint.coordinate, rng);
    debug!(
        index = patrol.cursor.index(),
        label = ?waypoint.label,
        kind = ?waypoint.kind,
        %position,
        "moving"
    );

    if let Err(err) = ctx.gateway.set_position(position).await {
        warn!(error = %err, %position, "position rejected");
        return CycleReport::ended(CycleOutcome::PositionRejected, Some(position));
    }
    patrol.cursor.record_position(position);

    let payload = match ctx.gateway.heartbeat().await {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "heartbeat failed, session needs a restart");
            return CycleReport::ended(CycleOutcome::SessionBroken, Some(position));
        }
    };
    let map = dispatch(ctx, state, payload).await.map;

    for creature in map.nearby() {
        warn!(
            species = %ctx.catalog.species_name(creature.species),
            distance_m = ?creature.distance_m,
            "creature nearby but out of reach"
        );
    }

    let classified = landmark::classify(
        map.landmarks(),
        position,
        ctx.config.landmarks.interaction_radius_m,
        Utc::now(),
    );
    for cooling in &classified.cooling {
        debug!(landmark = %cooling.id, until = ?cooling.cooldown_until, "landmark cooling down");
    }

    let mut queue: Vec<CatchableCreature> = map.catchable().cloned().collect();
    queue.extend(classified.lured.iter().cloned());
    let creatures_seen = queue.len().saturating_add(map.nearby().count());

    let capture = if ctx.config.capture.enabled && !queue.is_empty() {
        capture::drain_queue(ctx, state, queue).await
    } else {
        CaptureSummary::default()
    };
    let loot = landmark::loot_all(ctx, state, &classified.loot).await;
    let strongholds = landmark::visit_strongholds(ctx, state, ledger, &classified.strongholds).await;

    if capture.captured > 0 || !loot.items.is_empty() {
        match inventory::refresh(ctx, state).await {
            Ok(()) => inventory::housekeeping(ctx, state).await,
            Err(err) => warn!(error = %err, "inventory refresh failed"),
        }
    }

    info!(
        lap = patrol.cursor.laps(),
        distance_m = patrol.cursor.distance_m(),
        seen = creatures_seen,
        captured = capture.captured,
        looted = loot.looted,
        experience = loot.experience,
        "cycle complete"
    );
    CycleReport {
        outcome: CycleOutcome::Completed,
        position: Some(position),
        creatures_seen,
        capture,
        loot,
        strongholds,
    }
}
