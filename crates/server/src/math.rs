//! Angle helpers for steering.

use std::f32::consts::{PI, TAU};

/// Shortest signed angular difference from `from` to `to`, in (-PI, PI].
///
/// Normalizes with `rem_euclid`, which is constant-time for any finite
/// input; iterative wrapping would stall on magnitudes where subtracting
/// TAU no longer changes the value.
pub fn angle_diff(from: f32, to: f32) -> f32 {
    let diff = (to - from).rem_euclid(TAU);
    if diff > PI { diff - TAU } else { diff }
}

/// Step `current` toward `target` by at most `max_step` radians along the
/// shortest direction, without overshooting.
pub fn turn_toward(current: f32, target: f32, max_step: f32) -> f32 {
    let diff = angle_diff(current, target);
    current + diff.signum() * diff.abs().min(max_step)
}
