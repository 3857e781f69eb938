//! End-to-end patrols against the offline world.
//!
//! The tokio clock is paused, so pacing sleeps complete instantly while
//! keeping their order.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use wander_core::catalog::StaticCatalog;
use wander_core::config::{BotConfig, LocationEntry};
use wander_core::offline::OfflineConnector;
use wander_core::supervisor::{StopReason, Supervisor};
use wander_types::Coordinate;

const CENTER: Coordinate = Coordinate::new(52.5163, 13.3777);

fn config() -> BotConfig {
    let mut config = BotConfig::default();
    config.route.start = CENTER;
    config.pacing.seed = Some(42);
    config.supervisor.max_empty_streak = 0;
    config
}

#[tokio::test(start_paused = true)]
async fn laps_over_configured_landmarks() {
    let connector = OfflineConnector::new(42, CENTER);
    let world = connector.world();
    let locations: Vec<LocationEntry> = world
        .lock()
        .unwrap()
        .landmarks()
        .iter()
        .map(|l| {
            LocationEntry::Labelled(
                l.coordinate.latitude,
                l.coordinate.longitude,
                l.id.to_string(),
            )
        })
        .collect();

    let mut config = config();
    config.route.locations = locations;
    config.supervisor.max_laps = 2;
    let mut supervisor =
        Supervisor::new(connector, config, Box::new(StaticCatalog::default())).unwrap();

    let result = supervisor.run().await;
    let route_len = supervisor.route().unwrap().len();

    assert_eq!(result.stop_reason, StopReason::LapBudgetReached);
    assert_eq!(result.laps, 2);
    assert_eq!(result.failures, 0);
    assert!(result.cycles > u64::try_from(route_len).unwrap());
    assert!(result.looted > 0);
    assert!(result.distance_m > 0.0);

    let owned = world.lock().unwrap().creatures().len();
    assert!(usize::try_from(result.captured).unwrap() <= owned);
    assert_eq!(
        supervisor.inventory().triage.creatures.len(),
        owned,
        "local view matches the world after the final refresh"
    );
}

#[tokio::test(start_paused = true)]
async fn single_pass_scans_for_a_route() {
    let connector = OfflineConnector::new(7, CENTER);
    let mut config = config();
    config.supervisor.looping = false;
    let mut supervisor =
        Supervisor::new(connector, config, Box::new(StaticCatalog::default())).unwrap();

    let result = supervisor.run().await;
    assert_eq!(result.stop_reason, StopReason::SinglePass);
    assert_eq!(result.cycles, 0);
    assert!(supervisor.route().is_some_and(|route| !route.is_empty()));
    assert!(supervisor.inventory().triage.balls.total() > 0);
}
