//! Great-circle geometry on a spherical Earth.
//!
//! The patrol never covers more than a few kilometers between stops, so a
//! spherical model is accurate to well under a meter at that scale.

use wander_types::Coordinate;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Angular distances below this are treated as the same point.
const SAME_POINT_RAD: f64 = 1e-12;

/// Central angle between two coordinates in radians (haversine).
fn central_angle(from: Coordinate, to: Coordinate) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();

    let half_chord = (d_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    let half_chord = half_chord.clamp(0.0, 1.0);

    2.0 * half_chord.sqrt().atan2((1.0 - half_chord).sqrt())
}

/// Great-circle distance between two coordinates in meters.
pub fn distance_m(from: Coordinate, to: Coordinate) -> f64 {
    EARTH_RADIUS_M * central_angle(from, to)
}

/// The point at `fraction` of the way along the great circle from `from`
/// to `to`.
///
/// `fraction` is clamped to `0.0..=1.0`. Coincident endpoints return
/// `from`.
pub fn intermediate(from: Coordinate, to: Coordinate, fraction: f64) -> Coordinate {
    let delta = central_angle(from, to);
    if delta < SAME_POINT_RAD {
        return from;
    }
    let f = fraction.clamp(0.0, 1.0);

    let lat1 = from.latitude.to_radians();
    let lon1 = from.longitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let lon2 = to.longitude.to_radians();

    let sin_delta = delta.sin();
    let a = ((1.0 - f) * delta).sin() / sin_delta;
    let b = (f * delta).sin() / sin_delta;

    let x = a * lat1.cos() * lon1.cos() + b * lat2.cos() * lon2.cos();
    let y = a * lat1.cos() * lon1.sin() + b * lat2.cos() * lon2.sin();
    let z = a * lat1.sin() + b * lat2.sin();

    let lat = z.atan2(x.hypot(y));
    let lon = y.atan2(x);

    Coordinate::new(lat.to_degrees(), lon.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CENTRAL_PARK: Coordinate = Coordinate::new(40.7829, -73.9654);
    const TIMES_SQUARE: Coordinate = Coordinate::new(40.7580, -73.9855);

    #[test]
    fn distance_to_self_is_zero() {
        assert!(distance_m(CENTRAL_PARK, CENTRAL_PARK).abs() < 1e-9);
    }

    #[test]
    fn known_distance_is_close() {
        // Roughly 3.2 km between the two points.
        let d = distance_m(CENTRAL_PARK, TIMES_SQUARE);
        assert!((3_100.0..3_350.0).contains(&d), "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = distance_m(CENTRAL_PARK, TIMES_SQUARE);
        let ba = distance_m(TIMES_SQUARE, CENTRAL_PARK);
        assert!((ab - ba).abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_latitude() {
        let d = distance_m(Coordinate::new(0.0, 0.0), Coordinate::new(1.0, 0.0));
        assert!((d - 111_195.0).abs() < 10.0, "got {d}");
    }

    #[test]
    fn midpoint_splits_distance() {
        let mid = intermediate(CENTRAL_PARK, TIMES_SQUARE, 0.5);
        let total = distance_m(CENTRAL_PARK, TIMES_SQUARE);
        let first = distance_m(CENTRAL_PARK, mid);
        let second = distance_m(mid, TIMES_SQUARE);
        assert!((first - total / 2.0).abs() < 0.01);
        assert!((second - total / 2.0).abs() < 0.01);
    }

    #[test]
    fn endpoints_are_preserved() {
        let start = intermediate(CENTRAL_PARK, TIMES_SQUARE, 0.0);
        let end = intermediate(CENTRAL_PARK, TIMES_SQUARE, 1.0);
        assert!(distance_m(start, CENTRAL_PARK) < 1e-3);
        assert!(distance_m(end, TIMES_SQUARE) < 1e-3);
    }

    #[test]
    fn coincident_points_return_origin() {
        let p = intermediate(CENTRAL_PARK, CENTRAL_PARK, 0.3);
        assert_eq!(p, CENTRAL_PARK);
    }
}
