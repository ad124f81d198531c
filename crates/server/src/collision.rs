//! Collision predicates for the resolver.
//!
//! Pure distance tests over trails and circles; the resolver in
//! `server::game` decides what a hit means.

use std::collections::VecDeque;

use glam::Vec2;

/// Two circles touch when their centers are closer than the sum of radii.
#[inline]
pub fn circles_touch(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
    let reach = radius_a + radius_b;
    a.distance_squared(b) < reach * reach
}

/// Whether a point lies strictly inside the circle at `center`.
#[inline]
pub fn point_in_circle(point: Vec2, center: Vec2, radius: f32) -> bool {
    point.distance_squared(center) < radius * radius
}

/// Whether `head` comes within `reach` of any point of `trail`.
/// Short-circuits on the first hit.
pub fn trail_hit(trail: &VecDeque<Vec2>, head: Vec2, reach: f32) -> bool {
    let reach_sq = reach * reach;
    trail.iter().any(|p| p.distance_squared(head) < reach_sq)
}

/// Whether any trail point sampled at `stride` lies inside the circle at
/// `center`. Sampling keeps blast checks cheap on long trails.
pub fn trail_sample_hit(trail: &VecDeque<Vec2>, center: Vec2, radius: f32, stride: usize) -> bool {
    let radius_sq = radius * radius;
    trail
        .iter()
        .step_by(stride.max(1))
        .any(|p| p.distance_squared(center) < radius_sq)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circles_touch_on_overlap_only() {
        let a = Vec2::ZERO;
        let b = Vec2::new(10.0, 0.0);
        assert!(circles_touch(a, 6.0, b, 5.0));
        // Exactly touching is not overlapping.
        assert!(!circles_touch(a, 5.0, b, 5.0));
        assert!(!circles_touch(a, 4.0, b, 5.0));
    }

    #[test]
    fn trail_hit_short_circuits_correctly() {
        let trail: VecDeque<Vec2> = (0..100).map(|i| Vec2::new(i as f32, 0.0)).collect();
        assert!(trail_hit(&trail, Vec2::new(50.0, 3.0), 5.0));
        assert!(!trail_hit(&trail, Vec2::new(50.0, 10.0), 5.0));
        assert!(!trail_hit(&VecDeque::new(), Vec2::ZERO, 100.0));
    }

    #[test]
    fn sampled_hit_respects_stride() {
        let trail: VecDeque<Vec2> = (0..20).map(|i| Vec2::new(i as f32 * 10.0, 0.0)).collect();
        // Point near index 5 (sampled with stride 5).
        assert!(trail_sample_hit(&trail, Vec2::new(50.0, 1.0), 3.0, 5));
        // Point near index 7 only, which stride 5 skips.
        assert!(!trail_sample_hit(&trail, Vec2::new(70.0, 1.0), 3.0, 5));
        // Stride 1 sees it.
        assert!(trail_sample_hit(&trail, Vec2::new(70.0, 1.0), 3.0, 1));
    }
}
