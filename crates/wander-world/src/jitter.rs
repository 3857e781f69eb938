//! GPS-like noise for transmitted positions.
//!
//! The last [`TAIL_DIGITS`] decimal digits of each axis are replaced with
//! fresh random digits. Values are padded first so that the first
//! [`MIN_FRACTION_DIGITS`] decimals are never touched, which keeps the
//! perturbation below 1e-6 degrees (about a decimeter).

use rand::Rng;
use wander_types::Coordinate;

/// Decimal places left untouched by the perturbation.
pub const MIN_FRACTION_DIGITS: usize = 6;

/// Trailing decimal digits replaced with random ones.
pub const TAIL_DIGITS: usize = 2;

const PADDED_DIGITS: usize = MIN_FRACTION_DIGITS + TAIL_DIGITS;

/// A perturbed copy of `canonical`. The canonical point is left untouched.
pub fn jitter(canonical: Coordinate, rng: &mut impl Rng) -> Coordinate {
    Coordinate::new(
        perturb_axis(canonical.latitude, rng),
        perturb_axis(canonical.longitude, rng),
    )
}

fn perturb_axis(value: f64, rng: &mut impl Rng) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let digits = format!("{:0TAIL_DIGITS$}", rng.random_range(0_u8..100));
    let text = padded(value);

    let keep = text.len().saturating_sub(digits.len());
    let Some(head) = text.get(..keep) else {
        return value;
    };
    format!("{head}{digits}").parse().unwrap_or(value)
}

/// Decimal text of `value` with room for the tail after the untouched
/// decimals.
fn padded(value: f64) -> String {
    let shortest = value.to_string();
    let fraction_len = shortest
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len());
    if fraction_len < PADDED_DIGITS {
        format!("{value:.PADDED_DIGITS$}")
    } else {
        shortest
    }
}
