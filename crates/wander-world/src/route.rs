//! The closed patrol route and the planner that builds it.
//!
//! A route is an ordered, cyclic list of [`Waypoint`]s: the last waypoint
//! connects back to the first. The planner guarantees that no two
//! consecutive waypoints (wrap-around included) are farther apart than the
//! configured maximum walking gap, inserting great-circle interpolated
//! patrol points where needed.

use core::fmt::Write as _;

use wander_types::{Coordinate, Waypoint, WaypointKind};

use crate::error::WorldError;
use crate::geo::{distance_m, intermediate};

/// Slack allowed on the gap bound to absorb floating-point rounding.
const GAP_TOLERANCE_M: f64 = 1e-6;

/// A landmark coordinate fed to the planner.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSeed {
    /// Position of the landmark.
    pub coordinate: Coordinate,
    /// Optional human label.
    pub label: Option<String>,
}

impl RouteSeed {
    /// An unlabelled seed.
    pub const fn at(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            label: None,
        }
    }
}

/// An ordered, cyclic sequence of waypoints. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    waypoints: Vec<Waypoint>,
}

impl Route {
    /// Wrap an existing list of waypoints.
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, WorldError> {
        if waypoints.is_empty() {
            return Err(WorldError::EmptyRoute);
        }
        Ok(Self { waypoints })
    }

    /// A single-point route that never moves.
    pub fn stationary(at: Coordinate) -> Self {
        Self {
            waypoints: vec![Waypoint {
                coordinate: at,
                label: None,
                kind: WaypointKind::Patrol,
            }],
        }
    }

    /// Number of waypoints.
    pub fn len(&self) -> usize {
        self.waypoints.len()
    }

    /// Whether the route has no waypoints. Never true once constructed.
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }

    /// The waypoint at `index`.
    pub fn get(&self, index: usize) -> Option<&Waypoint> {
        self.waypoints.get(index)
    }

    /// All waypoints in walking order.
    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// The index after `current` and whether the step wrapped to the start.
    pub fn next_index(&self, current: usize) -> (usize, bool) {
        match current.checked_add(1) {
            Some(next) if next < self.waypoints.len() => (next, false),
            _ => (0, true),
        }
    }

    /// The longest distance between consecutive waypoints, wrap included.
    pub fn max_gap_m(&self) -> f64 {
        let wrap = match (self.waypoints.last(), self.waypoints.first()) {
            (Some(last), Some(first)) => distance_m(last.coordinate, first.coordinate),
            _ => 0.0,
        };
        self.waypoints
            .windows(2)
            .filter_map(|pair| match pair {
                [a, b] => Some(distance_m(a.coordinate, b.coordinate)),
                _ => None,
            })
            .fold(wrap, f64::max)
    }

    /// The route as `lat,lon,label` lines, one per waypoint.
    pub fn to_csv(&self) -> String {
        let mut out = String::new();
        for waypoint in &self.waypoints {
            let label = waypoint.label.as_deref().unwrap_or("");
            let _ = writeln!(
                out,
                "{},{},{label}",
                waypoint.coordinate.latitude, waypoint.coordinate.longitude
            );
        }
        out
    }
}

/// A planned route plus the index traversal should begin at.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedRoute {
    /// The closed route.
    pub route: Route,
    /// Index of the waypoint closest to the configured start.
    pub start_index: usize,
}

/// Build a closed, gap-bounded route from unordered landmark seeds.
///
/// Seeds are sorted by (latitude, longitude) so the same input always
/// yields the same route. Between each consecutive pair, and from the last
/// seed back to the first, `ceil(gap / max_gap_m)` equal great-circle
/// segments are laid down whenever the gap exceeds `max_gap_m`.
pub fn plan_route(
    mut seeds: Vec<RouteSeed>,
    start: Coordinate,
    max_gap_m: f64,
) -> Result<PlannedRoute, WorldError> {
    if !max_gap_m.is_finite() || max_gap_m <= 0.0 {
        return Err(WorldError::InvalidGap(max_gap_m));
    }
    if seeds.is_empty() {
        return Err(WorldError::EmptyRoute);
    }

    seeds.sort_by(|a, b| {
        a.coordinate
            .latitude
            .total_cmp(&b.coordinate.latitude)
            .then(a.coordinate.longitude.total_cmp(&b.coordinate.longitude))
    });

    let landmark_count = seeds.len();
    let mut waypoints = Vec::with_capacity(landmark_count);
    let successors: Vec<Coordinate> = seeds
        .iter()
        .skip(1)
        .chain(seeds.first())
        .map(|seed| seed.coordinate)
        .collect();

    for (seed, next) in seeds.into_iter().zip(successors) {
        let from = seed.coordinate;
        waypoints.push(Waypoint {
            coordinate: from,
            label: seed.label,
            kind: WaypointKind::Landmark,
        });
        fill_gap(&mut waypoints, from, next, max_gap_m);
    }

    let start_index = waypoints
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| {
            distance_m(a.coordinate, start).total_cmp(&distance_m(b.coordinate, start))
        })
        .map_or(0, |(index, _)| index);

    let route = Route::new(waypoints)?;
    tracing::debug!(
        landmarks = landmark_count,
        waypoints = route.len(),
        start_index,
        max_gap_m,
        "route planned"
    );
    Ok(PlannedRoute { route, start_index })
}

/// Push interpolated patrol points strictly between `from` and `to`.
fn fill_gap(waypoints: &mut Vec<Waypoint>, from: Coordinate, to: Coordinate, max_gap_m: f64) {
    let gap = distance_m(from, to);
    if gap <= max_gap_m + GAP_TOLERANCE_M {
        return;
    }
    let segments = (gap / max_gap_m).ceil();
    let mut step = 1.0_f64;
    while step < segments {
        waypoints.push(Waypoint {
            coordinate: intermediate(from, to, step / segments),
            label: None,
            kind: WaypointKind::Patrol,
        });
        step += 1.0;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    use super::*;

    fn seed(lat: f64, lon: f64) -> RouteSeed {
        RouteSeed::at(Coordinate::new(lat, lon))
    }

    #[test]
    fn empty_input_is_an_error() {
        let err = plan_route(Vec::new(), Coordinate::new(0.0, 0.0), 40.0).unwrap_err();
        assert_eq!(err, WorldError::EmptyRoute);
    }

    #[test]
    fn non_positive_gap_is_an_error() {
        let result = plan_route(vec![seed(1.0, 1.0)], Coordinate::new(0.0, 0.0), 0.0);
        assert!(matches!(result, Err(WorldError::InvalidGap(_))));
    }

    #[test]
    fn single_seed_is_a_one_point_loop() {
        let planned = plan_route(vec![seed(1.0, 1.0)], Coordinate::new(0.0, 0.0), 40.0).unwrap();
        assert_eq!(planned.route.len(), 1);
        assert_eq!(planned.start_index, 0);
        assert_eq!(planned.route.next_index(0), (0, true));
    }

    #[test]
    fn every_gap_is_bounded_including_wrap() {
        let mut rng = SmallRng::seed_from_u64(42);
        for _ in 0..25 {
            let count = rng.random_range(1..12);
            let seeds: Vec<RouteSeed> = (0..count)
                .map(|_| {
                    seed(
                        40.78 + rng.random_range(-0.01..0.01),
                        -73.96 + rng.random_range(-0.01..0.01),
                    )
                })
                .collect();
            let max_gap = rng.random_range(15.0..120.0);
            let planned = plan_route(seeds, Coordinate::new(40.78, -73.96), max_gap).unwrap();
            assert!(
                planned.route.max_gap_m() <= max_gap + 1e-3,
                "gap {} exceeds {max_gap}",
                planned.route.max_gap_m()
            );
        }
    }

    #[test]
    fn order_is_independent_of_input_order() {
        let a = vec![seed(40.001, -73.0), seed(40.0, -73.001), seed(40.0, -73.0)];
        let mut b = a.clone();
        b.reverse();
        let start = Coordinate::new(40.0, -73.0);
        let first = plan_route(a, start, 30.0).unwrap();
        let second = plan_route(b, start, 30.0).unwrap();
        assert_eq!(first, second);
        let first_point = first.route.get(0).unwrap().coordinate;
        assert_eq!(first_point, Coordinate::new(40.0, -73.001));
    }

    #[test]
    fn traversal_starts_near_the_configured_start() {
        let seeds = vec![seed(40.0, -73.0), seed(40.01, -73.0), seed(40.02, -73.0)];
        let start = Coordinate::new(40.0199, -73.0);
        let planned = plan_route(seeds, start, 50.0).unwrap();
        let chosen = planned.route.get(planned.start_index).unwrap();
        for waypoint in planned.route.waypoints() {
            assert!(
                distance_m(chosen.coordinate, start) <= distance_m(waypoint.coordinate, start)
            );
        }
        assert_eq!(chosen.kind, WaypointKind::Landmark);
    }

    #[test]
    fn labels_survive_and_inserted_points_are_patrol() {
        let seeds = vec![
            RouteSeed {
                coordinate: Coordinate::new(40.0, -73.0),
                label: Some(String::from("fountain")),
            },
            seed(40.001, -73.0),
        ];
        let planned = plan_route(seeds, Coordinate::new(40.0, -73.0), 40.0).unwrap();
        let route = &planned.route;
        assert_eq!(route.get(0).unwrap().label.as_deref(), Some("fountain"));
        let landmarks = route
            .waypoints()
            .iter()
            .filter(|w| w.kind == WaypointKind::Landmark)
            .count();
        assert_eq!(landmarks, 2);
        // ~111 m apart with a 40 m cap: three segments each way.
        assert_eq!(route.len(), 6);
    }

    #[test]
    fn next_index_wraps_and_reports_a_lap() {
        let point = |lon| Waypoint {
            coordinate: Coordinate::new(0.0, lon),
            label: None,
            kind: WaypointKind::Patrol,
        };
        let route = Route::new(vec![point(0.0), point(0.0001)]).unwrap();
        assert_eq!(route.next_index(0), (1, false));
        assert_eq!(route.next_index(1), (0, true));
    }

    #[test]
    fn csv_has_one_line_per_waypoint() {
        let seeds = vec![RouteSeed {
            coordinate: Coordinate::new(1.5, 2.5),
            label: Some(String::from("stop")),
        }];
        let planned = plan_route(seeds, Coordinate::new(0.0, 0.0), 40.0).unwrap();
        assert_eq!(planned.route.to_csv(), "1.5,2.5,stop\n");
    }
}
