//! Capture engine: encounter, ball selection, throw, and resolution.
//!
//! Each catchable creature is driven through an explicit state machine:
//!
//! ```text
//! Encountering -> Encountered -> Throwing -> Resolved
//! ```
//!
//! A resolution either finishes the creature (captured or dropped),
//! requeues it, or aborts the whole queue (out of balls, storage full).
//! The queue is a stack: a requeued creature is pushed back on top, so it
//! is retried before anything queued earlier.

use tracing::{info, warn};
use wander_inventory::BallInventory;
use wander_types::{
    BallKind, CaptureProbabilities, CatchStatus, CatchableCreature, EncounterStatus,
    ThrowParameters, WildCreature,
};

use crate::context::{SessionContext, pause};
use crate::inventory::{self, InventoryState};
use crate::session::SessionClient;

/// Pick the ball to throw.
///
/// Candidates are kinds with stock, weakest first. Without probability
/// data the weakest in-stock ball is used. With data, the in-stock ball
/// with the lowest estimate that still reaches `min_probability` wins; if
/// none reaches it, the ball with the highest estimate is used instead.
/// Kinds without an estimate are ignored while any kind has one.
pub fn select_ball(
    balls: &BallInventory,
    probabilities: Option<&CaptureProbabilities>,
    min_probability: f64,
) -> Option<BallKind> {
    let weakest = balls.in_stock().next()?;
    let Some(probabilities) = probabilities.filter(|p| !p.is_empty()) else {
        return Some(weakest);
    };

    let estimated: Vec<(BallKind, f64)> = balls
        .in_stock()
        .filter_map(|kind| probabilities.get(kind).map(|p| (kind, p)))
        .collect();
    if estimated.is_empty() {
        return Some(weakest);
    }

    let adequate = estimated
        .iter()
        .filter(|(_, p)| *p >= min_probability)
        .min_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    let upgrade = || {
        estimated
            .iter()
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
    };
    adequate.or_else(upgrade).map(|(kind, _)| *kind)
}

/// Why a capture queue stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueAbort {
    /// No balls left.
    OutOfBalls,
    /// Creature storage is full and nothing could be transferred.
    StorageFull,
}

/// What one capture queue drain achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSummary {
    /// Creatures captured.
    pub captured: u32,
    /// Balls thrown.
    pub thrown: u32,
    /// Creatures given up on.
    pub dropped: u32,
    /// Set when the queue was abandoned.
    pub aborted: Option<QueueAbort>,
}

/// A queued creature plus what is already known about it.
#[derive(Debug, Clone)]
struct Pursuit {
    target: CatchableCreature,
    attempts: u32,
    encountered: Option<Encountered>,
}

#[derive(Debug, Clone)]
struct Encountered {
    creature: Option<WildCreature>,
    probabilities: Option<CaptureProbabilities>,
}

/// States of a single capture attempt.
#[derive(Debug)]
enum Phase {
    Encountering,
    Encountered,
    Throwing(BallKind),
    Resolved(Resolution),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Resolution {
    Captured,
    Requeue,
    Drop,
    Abort(QueueAbort),
}

/// Drain a capture queue to completion.
pub async fn drain_queue<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
    queue: Vec<CatchableCreature>,
) -> CaptureSummary {
    let mut summary = CaptureSummary::default();
    let max_attempts = ctx.config.capture.max_attempts_per_creature;
    let mut stack: Vec<Pursuit> = queue
        .into_iter()
        .map(|target| Pursuit {
            target,
            attempts: 0,
            encountered: None,
        })
        .collect();

    while let Some(mut pursuit) = stack.pop() {
        if state.triage.balls.total() == 0 {
            warn!(remaining = stack.len().saturating_add(1), "out of capture balls");
            summary.aborted = Some(QueueAbort::OutOfBalls);
            break;
        }
        if pursuit.attempts >= max_attempts {
            warn!(
                encounter = %pursuit.target.encounter_id,
                attempts = pursuit.attempts,
                "giving up on creature"
            );
            summary.dropped = summary.dropped.saturating_add(1);
            continue;
        }
        pursuit.attempts = pursuit.attempts.saturating_add(1);

        match attempt(ctx, state, &mut pursuit, &mut summary).await {
            Resolution::Captured => summary.captured = summary.captured.saturating_add(1),
            Resolution::Requeue => stack.push(pursuit),
            Resolution::Drop => summary.dropped = summary.dropped.saturating_add(1),
            Resolution::Abort(reason) => {
                summary.aborted = Some(reason);
                break;
            }
        }
    }
    summary
}

async fn attempt<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
    pursuit: &mut Pursuit,
    summary: &mut CaptureSummary,
) -> Resolution {
    let name = ctx.catalog.species_name(pursuit.target.species);
    let mut phase = if pursuit.encountered.is_some() {
        Phase::Encountered
    } else {
        Phase::Encountering
    };

    loop {
        phase = match phase {
            Phase::Encountering => encounter(ctx, state, pursuit, &name).await,
            Phase::Encountered => {
                let probabilities = pursuit
                    .encountered
                    .as_ref()
                    .and_then(|e| e.probabilities.as_ref());
                match select_ball(
                    &state.triage.balls,
                    probabilities,
                    ctx.config.capture.min_probability,
                ) {
                    Some(ball) => Phase::Throwing(ball),
                    None => Phase::Resolved(Resolution::Abort(QueueAbort::OutOfBalls)),
                }
            }
            Phase::Throwing(ball) => {
                let thrown = &mut summary.thrown;
                Phase::Resolved(throw(ctx, state, pursuit, ball, &name, thrown).await)
            }
            Phase::Resolved(resolution) => return resolution,
        };
    }
}

async fn encounter<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
    pursuit: &mut Pursuit,
    name: &str,
) -> Phase {
    let target = &pursuit.target;
    let result = match ctx.gateway.encounter(target).await {
        Ok(result) => result,
        Err(err) => {
            warn!(error = %err, encounter = %target.encounter_id, "encounter failed, retrying");
            pause(ctx.config.pacing.retry_wait()).await;
            return Phase::Resolved(Resolution::Requeue);
        }
    };

    match result.status {
        EncounterStatus::Success => {
            if let Some(creature) = result.creature {
                info!(
                    species = %name,
                    score = creature.score(),
                    perfect = creature.is_perfect(),
                    cp = creature.cp,
                    lured = target.lure.is_some(),
                    "encountered"
                );
            }
            pursuit.encountered = Some(Encountered {
                creature: result.creature,
                probabilities: result.probabilities,
            });
            Phase::Encountered
        }
        EncounterStatus::InventoryFull => {
            warn!(species = %name, "creature storage full, freeing space");
            if inventory::free_space(ctx, state).await {
                Phase::Resolved(Resolution::Requeue)
            } else {
                Phase::Resolved(Resolution::Abort(QueueAbort::StorageFull))
            }
        }
        status => {
            info!(species = %name, reason = status.reason(), "encounter declined");
            Phase::Resolved(Resolution::Drop)
        }
    }
}

async fn throw<C: SessionClient>(
    ctx: SessionContext<'_, C>,
    state: &mut InventoryState,
    pursuit: &Pursuit,
    ball: BallKind,
    name: &str,
    thrown: &mut u32,
) -> Resolution {
    pause(ctx.config.pacing.call_wait()).await;
    let result = match ctx
        .gateway
        .attempt_capture(&pursuit.target, ball, ThrowParameters::default())
        .await
    {
        Ok(result) => result,
        Err(err) => {
            warn!(error = %err, species = %name, "throw failed, retrying");
            pause(ctx.config.pacing.retry_wait()).await;
            return Resolution::Requeue;
        }
    };

    if matches!(
        result.status,
        CatchStatus::Success | CatchStatus::Escape | CatchStatus::Flee | CatchStatus::Missed
    ) {
        state.triage.balls.take(ball);
        *thrown = thrown.saturating_add(1);
    }

    match result.status {
        CatchStatus::Success => {
            info!(
                outcome = "success",
                species = %name,
                ball = ?ball,
                experience = result.award.experience,
                candy = result.award.candy,
                stardust = result.award.stardust,
                "captured"
            );
            let perfect = pursuit
                .encountered
                .as_ref()
                .and_then(|e| e.creature)
                .is_some_and(|c| c.is_perfect());
            let queued = result
                .captured
                .filter(|_| perfect)
                .is_some_and(|id| state.queue_favorite(id));
            if queued {
                info!(highlight = true, species = %name, creature = ?result.captured, "perfect capture");
            }
            Resolution::Captured
        }
        CatchStatus::Escape | CatchStatus::Flee | CatchStatus::Missed => {
            info!(
                species = %name,
                ball = ?ball,
                reason = result.status.reason(),
                balls_left = state.triage.balls.total(),
                "throw did not capture"
            );
            Resolution::Requeue
        }
        status => {
            warn!(species = %name, status = ?status, reason = status.reason(), "unexpected capture status");
            Resolution::Drop
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::BTreeMap;

    use wander_types::{CreatureId, EncounterId, EncounterResult, InventoryEntry, OwnedCreature};

    use super::*;
    use crate::catalog::StaticCatalog;
    use crate::config::BotConfig;
    use crate::session::TransportError;
    use crate::testing::{Call, Harness, capture, catchable};

    fn probabilities(pairs: &[(BallKind, f64)]) -> CaptureProbabilities {
        CaptureProbabilities(pairs.iter().copied().collect::<BTreeMap<_, _>>())
    }

    fn wild(ivs: u8) -> WildCreature {
        WildCreature {
            species: wander_types::SpeciesId(16),
            attack: ivs,
            defense: ivs,
            stamina: ivs,
            cp: 250,
        }
    }

    fn encountered(ivs: u8) -> Result<EncounterResult, TransportError> {
        Ok(EncounterResult {
            status: EncounterStatus::Success,
            creature: Some(wild(ivs)),
            probabilities: None,
        })
    }

    fn stocked(balls: u32) -> InventoryState {
        let mut state = InventoryState::new();
        state.triage.balls = BallInventory::from_counts([(BallKind::Poke, balls)]);
        state
    }

    #[test]
    fn empty_kind_is_skipped() {
        let balls = BallInventory::from_counts([(BallKind::Poke, 0), (BallKind::Great, 3)]);
        assert_eq!(select_ball(&balls, None, 0.3), Some(BallKind::Great));
        let probs = probabilities(&[(BallKind::Poke, 0.9), (BallKind::Great, 0.5)]);
        assert_eq!(select_ball(&balls, Some(&probs), 0.3), Some(BallKind::Great));
    }

    #[test]
    fn cheapest_adequate_ball_wins() {
        let balls = BallInventory::from_counts([
            (BallKind::Poke, 5),
            (BallKind::Great, 5),
            (BallKind::Ultra, 5),
        ]);
        let probs = probabilities(&[
            (BallKind::Poke, 0.2),
            (BallKind::Great, 0.35),
            (BallKind::Ultra, 0.5),
        ]);
        assert_eq!(select_ball(&balls, Some(&probs), 0.3), Some(BallKind::Great));
        assert_eq!(select_ball(&balls, Some(&probs), 0.0), Some(BallKind::Poke));
    }

    #[test]
    fn upgrades_to_best_estimate_below_threshold() {
        let balls = BallInventory::from_counts([(BallKind::Poke, 5), (BallKind::Ultra, 1)]);
        let probs = probabilities(&[(BallKind::Poke, 0.1), (BallKind::Ultra, 0.25)]);
        assert_eq!(select_ball(&balls, Some(&probs), 0.3), Some(BallKind::Ultra));
    }

    #[test]
    fn missing_estimates_fall_back_to_weakest() {
        let balls = BallInventory::from_counts([(BallKind::Great, 2)]);
        let probs = probabilities(&[(BallKind::Poke, 0.9)]);
        assert_eq!(select_ball(&balls, Some(&probs), 0.3), Some(BallKind::Great));
        assert_eq!(select_ball(&BallInventory::default(), None, 0.3), None);
    }

    #[tokio::test(start_paused = true)]
    async fn no_balls_means_no_calls() {
        let harness = Harness::new(BotConfig::default());
        let mut state = stocked(0);
        let summary = drain_queue(harness.ctx(), &mut state, vec![catchable(1, 16)]).await;
        assert_eq!(summary.aborted, Some(QueueAbort::OutOfBalls));
        assert_eq!(summary.thrown, 0);
        assert!(harness.client.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn perfect_capture_is_favorited_once() {
        let harness = Harness::new(BotConfig::default());
        {
            let mut script = harness.client.script();
            script.encounters.push_back(encountered(15));
            script
                .captures
                .push_back(Ok(capture(CatchStatus::Success, Some(99))));
        }
        let mut state = stocked(5);
        let summary = drain_queue(harness.ctx(), &mut state, vec![catchable(1, 16)]).await;
        assert_eq!(summary.captured, 1);
        assert_eq!(state.favorite_queue(), &[CreatureId(99)]);
        assert_eq!(state.triage.balls.total(), 4);

        // The next snapshot lists the creature as an unfavorited perfect one.
        let snapshot = vec![InventoryEntry::Creature(OwnedCreature {
            id: CreatureId(99),
            species: wander_types::SpeciesId(16),
            attack: 15,
            defense: 15,
            stamina: 15,
            cp: 250,
            stamina_current: 40,
            stamina_max: 40,
            favorite: false,
            deployed_at: None,
        })];
        let rules = BotConfig::default().triage_rules();
        state.apply(&snapshot, &rules, &StaticCatalog::default());
        assert_eq!(state.favorite_queue(), &[CreatureId(99)]);
    }

    #[tokio::test(start_paused = true)]
    async fn imperfect_capture_is_not_favorited() {
        let harness = Harness::new(BotConfig::default());
        {
            let mut script = harness.client.script();
            script.encounters.push_back(encountered(10));
            script
                .captures
                .push_back(Ok(capture(CatchStatus::Success, Some(5))));
        }
        let mut state = stocked(5);
        drain_queue(harness.ctx(), &mut state, vec![catchable(1, 16)]).await;
        assert!(state.favorite_queue().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn escape_rethrows_without_a_new_encounter() {
        let harness = Harness::new(BotConfig::default());
        {
            let mut script = harness.client.script();
            script.encounters.push_back(encountered(8));
            script.captures.push_back(Ok(capture(CatchStatus::Escape, None)));
            script.captures.push_back(Ok(capture(CatchStatus::Missed, None)));
            script
                .captures
                .push_back(Ok(capture(CatchStatus::Success, Some(3))));
        }
        let mut state = stocked(10);
        let summary = drain_queue(harness.ctx(), &mut state, vec![catchable(1, 16)]).await;
        assert_eq!(summary.captured, 1);
        assert_eq!(summary.thrown, 3);
        assert_eq!(state.triage.balls.total(), 7);
        assert_eq!(harness.client.count(|c| matches!(c, Call::Encounter(_))), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn transport_errors_retry_the_same_creature() {
        let harness = Harness::new(BotConfig::default());
        {
            let mut script = harness.client.script();
            script
                .encounters
                .push_back(Err(TransportError::Network(String::from("reset"))));
            script.encounters.push_back(encountered(8));
            script.captures.push_back(Err(TransportError::RateLimited));
            script
                .captures
                .push_back(Ok(capture(CatchStatus::Success, Some(3))));
        }
        let mut state = stocked(10);
        let summary = drain_queue(harness.ctx(), &mut state, vec![catchable(1, 16)]).await;
        assert_eq!(summary.captured, 1);
        // A failed throw never consumed a ball.
        assert_eq!(state.triage.balls.total(), 9);
        assert_eq!(harness.client.count(|c| matches!(c, Call::Encounter(_))), 2);
        assert_eq!(harness.client.count(|c| matches!(c, Call::Capture(..))), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn attempts_per_creature_are_capped() {
        let mut config = BotConfig::default();
        config.capture.max_attempts_per_creature = 3;
        let harness = Harness::new(config);
        {
            let mut script = harness.client.script();
            script.encounters.push_back(encountered(8));
            for _ in 0..10 {
                script.captures.push_back(Ok(capture(CatchStatus::Flee, None)));
            }
        }
        let mut state = stocked(20);
        let summary = drain_queue(harness.ctx(), &mut state, vec![catchable(1, 16)]).await;
        assert_eq!(summary.thrown, 3);
        assert_eq!(summary.dropped, 1);
        assert_eq!(summary.captured, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn queue_is_drained_last_in_first_out() {
        let harness = Harness::new(BotConfig::default());
        let mut state = stocked(5);
        let queue = vec![catchable(1, 16), catchable(2, 19)];
        let summary = drain_queue(harness.ctx(), &mut state, queue).await;
        // Unscripted encounters answer "not found", dropping both.
        assert_eq!(summary.dropped, 2);
        let order: Vec<EncounterId> = harness
            .client
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Encounter(id) => Some(id),
                _ => None,
            })
            .collect();
        assert_eq!(order, vec![EncounterId(2), EncounterId(1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn full_storage_without_scrapping_aborts_the_queue() {
        let harness = Harness::new(BotConfig::default());
        harness.client.script().encounters.push_back(Ok(EncounterResult {
            status: EncounterStatus::InventoryFull,
            creature: None,
            probabilities: None,
        }));
        let mut state = stocked(5);
        let queue = vec![catchable(1, 16), catchable(2, 16)];
        let summary = drain_queue(harness.ctx(), &mut state, queue).await;
        assert_eq!(summary.aborted, Some(QueueAbort::StorageFull));
        assert_eq!(harness.client.count(|c| matches!(c, Call::Encounter(_))), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn running_out_mid_queue_stops_before_the_next_encounter() {
        let harness = Harness::new(BotConfig::default());
        {
            let mut script = harness.client.script();
            script.encounters.push_back(encountered(8));
            script
                .captures
                .push_back(Ok(capture(CatchStatus::Success, Some(4))));
        }
        let mut state = stocked(1);
        let queue = vec![catchable(1, 16), catchable(2, 16)];
        let summary = drain_queue(harness.ctx(), &mut state, queue).await;
        assert_eq!(summary.captured, 1);
        assert_eq!(summary.aborted, Some(QueueAbort::OutOfBalls));
        assert_eq!(harness.client.count(|c| matches!(c, Call::Encounter(_))), 1);
    }
}
