//! Closed-form billiard motion and the corner-seeking trajectory solver
//!
//! Along one axis a point bouncing between `min` and `max` at constant speed
//! is a triangle wave of the unfolded straight-line position, with period
//! `2 * (max - min)`. That lets us evaluate any instant directly and solve
//! for a velocity that lands on a chosen corner after a given duration.

use glam::DVec2;

use super::bounds::{Corner, RectBounds};

/// Period multiples searched either side of the speed-implied solution
const SEARCH_BAND: i64 = 2;

/// Landing error dominates speed deviation when ranking corners
const POSITION_WEIGHT: f64 = 1_000.0;

/// Fold an unfolded coordinate back into `[min, max]`
fn fold(unfolded: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        return min;
    }
    let period = 2.0 * span;
    let p = (unfolded - min).rem_euclid(period);
    let folded = if p <= span { min + p } else { min + period - p };
    folded.clamp(min, max)
}

/// Position after `t` seconds of bouncing between `min` and `max`
pub fn reflect_axis(start: f64, velocity: f64, t: f64, min: f64, max: f64) -> f64 {
    fold(start + velocity * t, min, max)
}

/// Signed velocity after `t` seconds (flips on every wall contact)
fn reflected_velocity(start: f64, velocity: f64, t: f64, min: f64, max: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        return 0.0;
    }
    let p = (start + velocity * t - min).rem_euclid(2.0 * span);
    if p < span { velocity } else { -velocity }
}

/// One deterministic billiard leg
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentPath {
    /// Where the leg starts
    pub anchor: DVec2,
    /// Constant unfolded velocity (px/s)
    pub velocity: DVec2,
    /// Corner the leg was solved to reach
    pub target: Corner,
}

impl SegmentPath {
    /// Position `t` seconds into the leg
    pub fn position_at(&self, t: f64, bounds: &RectBounds) -> DVec2 {
        DVec2::new(
            reflect_axis(self.anchor.x, self.velocity.x, t, bounds.min_x, bounds.max_x),
            reflect_axis(self.anchor.y, self.velocity.y, t, bounds.min_y, bounds.max_y),
        )
    }

    /// Direction-of-travel velocity `t` seconds into the leg
    pub fn velocity_at(&self, t: f64, bounds: &RectBounds) -> DVec2 {
        DVec2::new(
            reflected_velocity(self.anchor.x, self.velocity.x, t, bounds.min_x, bounds.max_x),
            reflected_velocity(self.anchor.y, self.velocity.y, t, bounds.min_y, bounds.max_y),
        )
    }
}

/// Velocity along one axis whose unfolded displacement over `duration`
/// lands on `min` (or `max` when `to_max`), choosing among the infinitely
/// many reflections the one whose magnitude is closest to `speed`.
fn solve_axis(start: f64, min: f64, max: f64, to_max: bool, duration: f64, speed: f64) -> f64 {
    let span = max - min;
    if span <= 0.0 {
        return 0.0;
    }
    let period = 2.0 * span;
    let target = if to_max { max } else { min };
    let speed = speed.abs();

    let mut best: Option<(f64, f64)> = None;
    for direction in [1.0, -1.0] {
        let implied = start + direction * speed * duration;
        let k0 = ((implied - target) / period).round() as i64;
        for k in (k0 - SEARCH_BAND)..=(k0 + SEARCH_BAND) {
            let unfolded = target + k as f64 * period;
            let velocity = (unfolded - start) / duration;
            let deviation = (velocity.abs() - speed).abs();
            if best.is_none_or(|(_, d)| deviation < d) {
                best = Some((velocity, deviation));
            }
        }
    }
    best.map_or(0.0, |(v, _)| v)
}

/// Solve a leg from `start` that reaches a corner of `bounds` after exactly
/// `duration` seconds while travelling close to `target_speed` per axis.
///
/// All four corners are tried; the winner has the smallest landing error
/// (weighted heavily) plus deviation from the requested speed.
pub fn solve_segment(start: DVec2, bounds: &RectBounds, duration: f64, target_speed: DVec2) -> SegmentPath {
    if bounds.is_collapsed() {
        return SegmentPath {
            anchor: bounds.corner(Corner::TopLeft),
            velocity: DVec2::ZERO,
            target: Corner::TopLeft,
        };
    }

    let anchor = bounds.clamp(start);
    if duration <= 0.0 || !duration.is_finite() {
        debug_assert!(duration > 0.0, "segment duration must be positive");
        let target = Corner::ALL
            .into_iter()
            .min_by(|a, b| {
                let da = anchor.distance(bounds.corner(*a));
                let db = anchor.distance(bounds.corner(*b));
                da.total_cmp(&db)
            })
            .unwrap_or(Corner::TopLeft);
        return SegmentPath {
            anchor,
            velocity: DVec2::ZERO,
            target,
        };
    }

    let mut best: Option<(SegmentPath, f64)> = None;
    for corner in Corner::ALL {
        let velocity = DVec2::new(
            solve_axis(anchor.x, bounds.min_x, bounds.max_x, corner.is_right(), duration, target_speed.x),
            solve_axis(anchor.y, bounds.min_y, bounds.max_y, corner.is_bottom(), duration, target_speed.y),
        );
        let path = SegmentPath {
            anchor,
            velocity,
            target: corner,
        };
        let error = path.position_at(duration, bounds).distance(bounds.corner(corner));
        let speed_deviation =
            (velocity.x.abs() - target_speed.x.abs()).abs() + (velocity.y.abs() - target_speed.y.abs()).abs();
        let score = error * POSITION_WEIGHT + speed_deviation;
        if best.is_none_or(|(_, s)| score < s) {
            best = Some((path, score));
        }
    }

    best.map_or(
        SegmentPath {
            anchor,
            velocity: DVec2::ZERO,
            target: Corner::TopLeft,
        },
        |(path, _)| path,
    )
}
