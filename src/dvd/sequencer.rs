//! Scripted phases of the bouncing logo
//!
//! Driven purely by remaining countdown time. Only Case Work countdowns
//! animate; every other mode leaves the sequencer inert.
//!
//! ```text
//! Inactive -> PreHitCruise --(first corner)--> PostHitCruise
//!          --(final corner)--> FinalApproach --(end/pause)--> ReturnToOrigin -> Inactive
//! ```

use glam::DVec2;

use super::billiard::{SegmentPath, solve_segment};
use super::bounds::{Corner, RectBounds};
use crate::consts::{
    CORNER_TOLERANCE_PX, FINAL_CORNER_SECONDS, FIRST_CORNER_SECONDS, RETURN_DURATION_MS,
    SPARKLE_THROTTLE_MS,
};
use crate::persistence::{DvdSnapshot, PointJson, VelocityJson};
use crate::timer::{CountdownState, Mode};
use crate::{ease_out_cubic, lerp};

/// Remaining time may move up by this much before a segment counts as rewound
const REWIND_SLACK_SECONDS: f64 = 0.5;

/// Tunables for the logo animation
#[derive(Debug, Clone, PartialEq)]
pub struct DvdConfig {
    /// Requested travel speed per axis (px/s)
    pub speed: DVec2,
    pub first_corner_seconds: f64,
    pub final_corner_seconds: f64,
    pub return_duration_ms: f64,
    pub corner_tolerance: f64,
    pub sparkle_throttle_ms: f64,
    /// Fire loose sparkle bursts on any corner contact
    pub sparkles: bool,
    /// Logo scale while cruising
    pub cruise_scale: f64,
}

impl Default for DvdConfig {
    fn default() -> Self {
        Self {
            speed: DVec2::new(110.0, 85.0),
            first_corner_seconds: FIRST_CORNER_SECONDS,
            final_corner_seconds: FINAL_CORNER_SECONDS,
            return_duration_ms: RETURN_DURATION_MS,
            corner_tolerance: CORNER_TOLERANCE_PX,
            sparkle_throttle_ms: SPARKLE_THROTTLE_MS,
            sparkles: true,
            cruise_scale: 1.0,
        }
    }
}

/// Current scripted phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Inactive,
    PreHitCruise,
    PostHitCruise,
    FinalApproach,
    ReturnToOrigin,
}

impl Phase {
    pub fn is_cruise(self) -> bool {
        matches!(self, Phase::PreHitCruise | Phase::PostHitCruise)
    }

    /// Logo is away from its resting place on a scripted path
    pub fn is_scripted(self) -> bool {
        matches!(
            self,
            Phase::PreHitCruise | Phase::PostHitCruise | Phase::FinalApproach
        )
    }
}

/// Strength of a scripted corner hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Impact {
    /// First threshold
    Corner,
    /// Final threshold; larger burst
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SequencerEvent {
    PhaseChanged { from: Phase, to: Phase },
    CornerImpact { corner: Corner, position: DVec2, impact: Impact },
    /// Unscripted corner contact
    Sparkle { corner: Corner, position: DVec2 },
}

/// A billiard leg pinned to a window of remaining countdown time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimedSegment {
    pub path: SegmentPath,
    /// Remaining seconds when the leg starts
    pub start_remaining: f64,
    /// Remaining seconds when the leg reaches its corner
    pub end_remaining: f64,
}

impl TimedSegment {
    fn resolve(anchor: DVec2, bounds: &RectBounds, start_remaining: f64, end_remaining: f64, speed: DVec2) -> Self {
        let duration = (start_remaining - end_remaining).max(f64::EPSILON);
        Self {
            path: solve_segment(anchor, bounds, duration, speed),
            start_remaining,
            end_remaining,
        }
    }

    pub fn duration(&self) -> f64 {
        self.start_remaining - self.end_remaining
    }

    fn elapsed(&self, remaining: f64) -> f64 {
        (self.start_remaining - remaining).clamp(0.0, self.duration().max(0.0))
    }

    pub fn position(&self, remaining: f64, bounds: &RectBounds) -> DVec2 {
        self.path.position_at(self.elapsed(remaining), bounds)
    }

    pub fn velocity(&self, remaining: f64, bounds: &RectBounds) -> DVec2 {
        self.path.velocity_at(self.elapsed(remaining), bounds)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ReturnAnimation {
    from: DVec2,
    from_scale: f64,
    started_ms: f64,
}

/// Where to draw the logo this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameView {
    pub position: DVec2,
    pub velocity: DVec2,
    pub scale: f64,
    pub phase: Phase,
}

/// Phase state machine for the logo
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSequencer {
    config: DvdConfig,
    /// `None` when the page has no logo to move; the sequencer is then inert
    bounds: Option<RectBounds>,
    rest: DVec2,
    phase: Phase,
    pre: Option<TimedSegment>,
    post: Option<TimedSegment>,
    corner_hit_triggered: bool,
    final_corner_hit_triggered: bool,
    position: DVec2,
    velocity: DVec2,
    scale: f64,
    returning: Option<ReturnAnimation>,
    last_contact: Option<Corner>,
    last_sparkle_ms: Option<f64>,
}

impl PhaseSequencer {
    /// New, disabled sequencer resting at `rest`
    pub fn new(config: DvdConfig, rest: DVec2) -> Self {
        Self {
            config,
            bounds: None,
            rest,
            phase: Phase::Inactive,
            pre: None,
            post: None,
            corner_hit_triggered: false,
            final_corner_hit_triggered: false,
            position: rest,
            velocity: DVec2::ZERO,
            scale: 1.0,
            returning: None,
            last_contact: None,
            last_sparkle_ms: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn bounds(&self) -> Option<RectBounds> {
        self.bounds
    }

    pub fn is_enabled(&self) -> bool {
        self.bounds.is_some()
    }

    /// Needs another animation frame
    pub fn is_animating(&self) -> bool {
        self.phase != Phase::Inactive
    }

    pub fn pre_segment(&self) -> Option<&TimedSegment> {
        self.pre.as_ref()
    }

    pub fn post_segment(&self) -> Option<&TimedSegment> {
        self.post.as_ref()
    }

    pub fn corner_hit_triggered(&self) -> bool {
        self.corner_hit_triggered
    }

    pub fn final_corner_hit_triggered(&self) -> bool {
        self.final_corner_hit_triggered
    }

    pub fn frame(&self) -> FrameView {
        FrameView {
            position: self.position,
            velocity: self.velocity,
            scale: self.scale,
            phase: self.phase,
        }
    }

    /// Move the resting place (logo's layout position changed)
    pub fn set_rest(&mut self, rest: DVec2) {
        self.rest = rest;
        if self.phase == Phase::Inactive {
            self.position = rest;
        }
    }

    /// Install new travel bounds after a resize or fullscreen change.
    ///
    /// An active leg cannot keep its old solution on a different rectangle,
    /// so it is re-solved from the current (clamped) position toward the
    /// same deadline. `None` disables the sequencer.
    pub fn set_bounds(&mut self, bounds: Option<RectBounds>, remaining: f64) {
        self.bounds = bounds;
        let Some(bounds) = bounds else {
            self.clear();
            return;
        };

        let speed = self.config.speed;
        let from = bounds.clamp(self.position);
        match self.phase {
            Phase::PreHitCruise => {
                if let Some(seg) = self.pre {
                    let start = remaining.min(seg.start_remaining);
                    self.pre = Some(TimedSegment::resolve(from, &bounds, start, seg.end_remaining, speed));
                }
            }
            Phase::PostHitCruise => {
                if let Some(seg) = self.post {
                    let start = remaining.min(seg.start_remaining);
                    self.post = Some(TimedSegment::resolve(from, &bounds, start, seg.end_remaining, speed));
                }
            }
            Phase::FinalApproach => {
                if let Some(seg) = self.post {
                    self.position = bounds.corner(seg.path.target);
                }
            }
            Phase::Inactive | Phase::ReturnToOrigin => {}
        }
        self.last_contact = None;
    }

    /// Drop all decorative state and snap home
    pub fn clear(&mut self) {
        self.phase = Phase::Inactive;
        self.pre = None;
        self.post = None;
        self.corner_hit_triggered = false;
        self.final_corner_hit_triggered = false;
        self.position = self.rest;
        self.velocity = DVec2::ZERO;
        self.scale = 1.0;
        self.returning = None;
        self.last_contact = None;
        self.last_sparkle_ms = None;
    }

    /// Countdown was reset: forget paths and flags, glide home if away
    pub fn reset(&mut self, now_ms: f64) -> Vec<SequencerEvent> {
        let mut events = Vec::new();
        self.pre = None;
        self.post = None;
        self.corner_hit_triggered = false;
        self.final_corner_hit_triggered = false;
        self.last_contact = None;
        if self.phase.is_scripted() {
            self.begin_return(now_ms, &mut events);
        }
        events
    }

    /// Advance to the state implied by `countdown` at `now_ms`
    pub fn update(&mut self, countdown: &CountdownState, now_ms: f64) -> Vec<SequencerEvent> {
        let mut events = Vec::new();
        let Some(bounds) = self.bounds else {
            return events;
        };

        if countdown.mode != Mode::CaseWork {
            if self.phase != Phase::Inactive {
                let from = self.phase;
                self.clear();
                events.push(SequencerEvent::PhaseChanged { from, to: Phase::Inactive });
            }
            return events;
        }

        let remaining = countdown.remaining_precise(now_ms);
        let active = countdown.running && remaining > 0.0;

        if active {
            self.advance_active(remaining, &bounds, now_ms, &mut events);
        } else if self.phase.is_scripted() {
            self.begin_return(now_ms, &mut events);
        } else if self.phase == Phase::ReturnToOrigin {
            self.advance_return(now_ms, &mut events);
        }

        if self.config.sparkles && self.phase.is_cruise() {
            self.check_contact(&bounds, now_ms, &mut events);
        }

        events
    }

    fn advance_active(&mut self, remaining: f64, bounds: &RectBounds, now_ms: f64, events: &mut Vec<SequencerEvent>) {
        let first = self.config.first_corner_seconds;
        let last = self.config.final_corner_seconds;

        if remaining > first {
            self.cruise_pre(remaining, bounds, events);
            return;
        }

        if self.phase == Phase::PreHitCruise {
            self.cross_first_corner(bounds, events);
        }

        if remaining > last {
            self.cruise_post(remaining, bounds, events);
            return;
        }

        if self.phase == Phase::PostHitCruise && !self.final_corner_hit_triggered {
            self.cross_final_corner(bounds, events);
        } else if self.phase == Phase::ReturnToOrigin {
            // Resumed inside the final stretch: no scripted path is left to fly
            self.advance_return(now_ms, events);
        }
    }

    fn cruise_pre(&mut self, remaining: f64, bounds: &RectBounds, events: &mut Vec<SequencerEvent>) {
        let fresh = self.phase != Phase::PreHitCruise;
        let stale = self
            .pre
            .is_none_or(|seg| remaining > seg.start_remaining + REWIND_SLACK_SECONDS);

        if fresh || stale {
            self.corner_hit_triggered = false;
            self.final_corner_hit_triggered = false;
            self.post = None;
            self.returning = None;
            let seg = TimedSegment::resolve(
                self.position,
                bounds,
                remaining,
                self.config.first_corner_seconds,
                self.config.speed,
            );
            log::debug!(
                "Logo heading for {:?} over {:.1}s",
                seg.path.target,
                seg.duration()
            );
            self.pre = Some(seg);
        }

        self.set_phase(Phase::PreHitCruise, events);
        if let Some(seg) = self.pre {
            self.position = seg.position(remaining, bounds);
            self.velocity = seg.velocity(remaining, bounds);
        }
        self.scale = self.config.cruise_scale;
    }

    fn cross_first_corner(&mut self, bounds: &RectBounds, events: &mut Vec<SequencerEvent>) {
        let Some(pre) = self.pre else {
            return;
        };
        let corner = pre.path.target;
        let position = bounds.corner(corner);
        self.corner_hit_triggered = true;
        self.position = position;
        // The scripted burst covers this contact
        self.last_contact = Some(corner);
        events.push(SequencerEvent::CornerImpact {
            corner,
            position,
            impact: Impact::Corner,
        });
        log::debug!("Logo hit {:?}", corner);

        self.post = Some(TimedSegment::resolve(
            position,
            bounds,
            self.config.first_corner_seconds,
            self.config.final_corner_seconds,
            self.config.speed,
        ));
        self.set_phase(Phase::PostHitCruise, events);
    }

    fn cruise_post(&mut self, remaining: f64, bounds: &RectBounds, events: &mut Vec<SequencerEvent>) {
        let fresh = self.phase != Phase::PostHitCruise;
        let stale = self
            .post
            .is_none_or(|seg| remaining > seg.start_remaining + REWIND_SLACK_SECONDS);

        if fresh || stale {
            // Rewound out of the final stretch, or resumed mid-way
            self.final_corner_hit_triggered = false;
            self.returning = None;
            let start = remaining.min(self.config.first_corner_seconds);
            self.post = Some(TimedSegment::resolve(
                self.position,
                bounds,
                start,
                self.config.final_corner_seconds,
                self.config.speed,
            ));
        }

        self.set_phase(Phase::PostHitCruise, events);
        if let Some(seg) = self.post {
            self.position = seg.position(remaining, bounds);
            self.velocity = seg.velocity(remaining, bounds);
        }
        self.scale = self.config.cruise_scale;
    }

    fn cross_final_corner(&mut self, bounds: &RectBounds, events: &mut Vec<SequencerEvent>) {
        let Some(post) = self.post else {
            return;
        };
        let corner = post.path.target;
        let position = bounds.corner(corner);
        self.final_corner_hit_triggered = true;
        self.position = position;
        self.velocity = DVec2::ZERO;
        self.last_contact = Some(corner);
        events.push(SequencerEvent::CornerImpact {
            corner,
            position,
            impact: Impact::Final,
        });
        log::debug!("Logo landed on {:?}", corner);
        self.set_phase(Phase::FinalApproach, events);
    }

    fn begin_return(&mut self, now_ms: f64, events: &mut Vec<SequencerEvent>) {
        self.returning = Some(ReturnAnimation {
            from: self.position,
            from_scale: self.scale,
            started_ms: now_ms,
        });
        self.velocity = DVec2::ZERO;
        self.set_phase(Phase::ReturnToOrigin, events);
    }

    fn advance_return(&mut self, now_ms: f64, events: &mut Vec<SequencerEvent>) {
        let Some(ret) = self.returning else {
            self.position = self.rest;
            self.scale = 1.0;
            self.set_phase(Phase::Inactive, events);
            return;
        };

        let t = if self.config.return_duration_ms > 0.0 {
            (now_ms - ret.started_ms) / self.config.return_duration_ms
        } else {
            1.0
        };
        if t >= 1.0 {
            self.returning = None;
            self.position = self.rest;
            self.scale = 1.0;
            self.set_phase(Phase::Inactive, events);
            return;
        }

        let eased = ease_out_cubic(t);
        self.position = DVec2::new(
            lerp(ret.from.x, self.rest.x, eased),
            lerp(ret.from.y, self.rest.y, eased),
        );
        self.scale = lerp(ret.from_scale, 1.0, eased);
    }

    fn check_contact(&mut self, bounds: &RectBounds, now_ms: f64, events: &mut Vec<SequencerEvent>) {
        let contact = bounds.touching_corner(self.position, self.config.corner_tolerance);
        if contact == self.last_contact {
            return;
        }
        if let Some(corner) = contact {
            let ready = self
                .last_sparkle_ms
                .is_none_or(|t| now_ms - t >= self.config.sparkle_throttle_ms);
            if ready {
                self.last_sparkle_ms = Some(now_ms);
                events.push(SequencerEvent::Sparkle {
                    corner,
                    position: self.position,
                });
            }
        }
        self.last_contact = contact;
    }

    fn set_phase(&mut self, to: Phase, events: &mut Vec<SequencerEvent>) {
        if self.phase != to {
            let from = self.phase;
            self.phase = to;
            log::debug!("Logo phase {:?} -> {:?}", from, to);
            events.push(SequencerEvent::PhaseChanged { from, to });
        }
    }

    /// Persistable projection of the animation
    pub fn snapshot(&self) -> DvdSnapshot {
        DvdSnapshot {
            active: self.phase.is_scripted(),
            position: PointJson::from(self.position),
            velocity: VelocityJson::from(self.velocity),
            corner_target: self.pre.map(|s| s.path.target),
            pre_segment_velocity: self.pre.map(|s| VelocityJson::from(s.path.velocity)),
            pre_segment_start: self.pre.map(|s| s.start_remaining),
            corner_hit_triggered: self.corner_hit_triggered,
            final_corner_hit_triggered: self.final_corner_hit_triggered,
            final_corner_target: self.post.map(|s| s.path.target),
            post_segment_velocity: self.post.map(|s| VelocityJson::from(s.path.velocity)),
            post_segment_start: self.post.map(|s| s.start_remaining),
            post_anchor: self.post.map(|s| PointJson::from(s.path.anchor)),
            scale: self.scale,
            start_anchor: self.pre.map(|s| PointJson::from(s.path.anchor)),
        }
    }

    /// Pick up a persisted animation. Anything inconsistent is dropped and
    /// the paths are re-solved on the next update.
    pub fn restore(&mut self, snap: &DvdSnapshot, remaining: f64) -> bool {
        self.clear();
        if !snap.active {
            return false;
        }
        let Some(bounds) = self.bounds else {
            return false;
        };
        let first = self.config.first_corner_seconds;
        let last = self.config.final_corner_seconds;

        let pre = match (snap.start_anchor, snap.pre_segment_velocity, snap.corner_target, snap.pre_segment_start) {
            (Some(anchor), Some(velocity), Some(target), Some(start)) if start > first => Some(TimedSegment {
                path: SegmentPath {
                    anchor: anchor.into(),
                    velocity: velocity.into(),
                    target,
                },
                start_remaining: start,
                end_remaining: first,
            }),
            _ => None,
        };
        let post_anchor = snap
            .post_anchor
            .map(DVec2::from)
            .or_else(|| snap.corner_target.map(|c| bounds.corner(c)));
        let post = match (post_anchor, snap.post_segment_velocity, snap.final_corner_target, snap.post_segment_start) {
            (Some(anchor), Some(velocity), Some(target), Some(start)) if start > last => Some(TimedSegment {
                path: SegmentPath {
                    anchor,
                    velocity: velocity.into(),
                    target,
                },
                start_remaining: start,
                end_remaining: last,
            }),
            _ => None,
        };

        let values_ok = [snap.scale, snap.position.x, snap.position.y]
            .iter()
            .all(|v| v.is_finite());
        let phase = match (remaining > first, remaining > last) {
            (true, _) if pre.is_some() => Phase::PreHitCruise,
            (false, true) if post.is_some() && snap.corner_hit_triggered => Phase::PostHitCruise,
            (false, false) if post.is_some() && snap.final_corner_hit_triggered => Phase::FinalApproach,
            _ => Phase::Inactive,
        };
        if !values_ok || phase == Phase::Inactive {
            log::warn!("Discarding inconsistent logo animation snapshot");
            return false;
        }

        self.pre = pre;
        self.post = post;
        self.corner_hit_triggered = snap.corner_hit_triggered;
        self.final_corner_hit_triggered = snap.final_corner_hit_triggered;
        self.scale = snap.scale;
        self.phase = phase;
        match phase {
            Phase::PreHitCruise => {
                if let Some(seg) = self.pre {
                    self.position = seg.position(remaining, &bounds);
                }
            }
            Phase::PostHitCruise => {
                if let Some(seg) = self.post {
                    self.position = seg.position(remaining, &bounds);
                }
            }
            _ => {
                if let Some(seg) = self.post {
                    self.position = bounds.corner(seg.path.target);
                }
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{Command, apply};

    const T0: f64 = 1_000_000.0;

    fn bounds() -> RectBounds {
        RectBounds::new(20.0, 1180.0, 20.0, 680.0)
    }

    fn sequencer() -> PhaseSequencer {
        let mut seq = PhaseSequencer::new(DvdConfig::default(), DVec2::new(40.0, 40.0));
        seq.set_bounds(Some(bounds()), 0.0);
        seq
    }

    fn running_case_work() -> CountdownState {
        let mut state = CountdownState::new(Mode::CaseWork);
        apply(&mut state, Command::Start, T0);
        state
    }

    /// Wall-clock time at which `remaining` seconds are left
    fn at(remaining: f64) -> f64 {
        T0 + (2700.0 - remaining) * 1000.0
    }

    fn impacts(events: &[SequencerEvent]) -> Vec<Impact> {
        events
            .iter()
            .filter_map(|e| match e {
                SequencerEvent::CornerImpact { impact, .. } => Some(*impact),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_disabled_without_bounds() {
        let mut seq = PhaseSequencer::new(DvdConfig::default(), DVec2::ZERO);
        let state = running_case_work();
        assert!(seq.update(&state, at(2000.0)).is_empty());
        assert_eq!(seq.phase(), Phase::Inactive);
    }

    #[test]
    fn test_inert_outside_case_work() {
        let mut seq = sequencer();
        let mut state = CountdownState::new(Mode::Presentation);
        apply(&mut state, Command::Start, T0);
        assert!(seq.update(&state, T0 + 1000.0).is_empty());
        assert_eq!(seq.phase(), Phase::Inactive);
    }

    #[test]
    fn test_start_enters_pre_hit_cruise() {
        let mut seq = sequencer();
        let state = running_case_work();
        let events = seq.update(&state, at(2700.0));
        assert_eq!(seq.phase(), Phase::PreHitCruise);
        assert!(events.contains(&SequencerEvent::PhaseChanged {
            from: Phase::Inactive,
            to: Phase::PreHitCruise
        }));
        let pre = seq.pre_segment().copied().unwrap();
        assert_eq!(pre.start_remaining, 2700.0);
        assert_eq!(pre.end_remaining, FIRST_CORNER_SECONDS);
        // Leaves from the resting place
        assert_eq!(pre.path.anchor, DVec2::new(40.0, 40.0));
    }

    #[test]
    fn test_first_corner_fires_exactly_once() {
        let mut seq = sequencer();
        let state = running_case_work();
        seq.update(&state, at(2700.0));
        seq.update(&state, at(1500.0));
        seq.update(&state, at(960.5));
        let target = seq.pre_segment().unwrap().path.target;

        let events = seq.update(&state, at(960.0));
        assert_eq!(impacts(&events), vec![Impact::Corner]);
        assert!(events.iter().any(|e| matches!(
            e,
            SequencerEvent::CornerImpact { corner, .. } if *corner == target
        )));
        assert_eq!(seq.phase(), Phase::PostHitCruise);
        assert!(seq.corner_hit_triggered());

        // Later frames at or below the threshold stay quiet
        for remaining in [960.0, 959.99, 959.5, 900.0] {
            assert!(impacts(&seq.update(&state, at(remaining))).is_empty());
        }
    }

    #[test]
    fn test_arrives_on_target_corner_at_threshold() {
        let mut seq = sequencer();
        let state = running_case_work();
        seq.update(&state, at(2700.0));
        seq.update(&state, at(960.0001));
        let target = seq.pre_segment().unwrap().path.target;
        assert!(seq.frame().position.distance(bounds().corner(target)) < 0.1);
    }

    #[test]
    fn test_post_segment_runs_corner_to_corner() {
        let mut seq = sequencer();
        let state = running_case_work();
        seq.update(&state, at(2700.0));
        seq.update(&state, at(960.0));
        let first = seq.pre_segment().unwrap().path.target;
        let post = seq.post_segment().copied().unwrap();
        assert_eq!(post.path.anchor, bounds().corner(first));
        assert_eq!(post.start_remaining, FIRST_CORNER_SECONDS);
        assert_eq!(post.end_remaining, FINAL_CORNER_SECONDS);
    }

    #[test]
    fn test_final_corner_freezes_logo() {
        let mut seq = sequencer();
        let state = running_case_work();
        seq.update(&state, at(2700.0));
        seq.update(&state, at(960.0));
        let target = seq.post_segment().unwrap().path.target;

        let events = seq.update(&state, at(60.0));
        assert_eq!(impacts(&events), vec![Impact::Final]);
        assert_eq!(seq.phase(), Phase::FinalApproach);
        assert_eq!(seq.frame().position, bounds().corner(target));

        assert!(impacts(&seq.update(&state, at(30.0))).is_empty());
        assert_eq!(seq.frame().position, bounds().corner(target));
    }

    #[test]
    fn test_big_jump_fires_both_impacts_in_order() {
        let mut seq = sequencer();
        let state = running_case_work();
        seq.update(&state, at(2000.0));
        let events = seq.update(&state, at(10.0));
        assert_eq!(impacts(&events), vec![Impact::Corner, Impact::Final]);
        assert_eq!(seq.phase(), Phase::FinalApproach);
    }

    #[test]
    fn test_pause_returns_to_origin() {
        let mut seq = sequencer();
        let mut state = running_case_work();
        seq.update(&state, at(2700.0));
        seq.update(&state, at(2000.0));
        let away = seq.frame().position;

        apply(&mut state, Command::Pause, at(2000.0));
        seq.update(&state, at(2000.0));
        assert_eq!(seq.phase(), Phase::ReturnToOrigin);
        assert_eq!(seq.frame().position, away);

        let now = at(2000.0);
        seq.update(&state, now + 600.0);
        let mid = seq.frame().position;
        assert!(mid != away && mid != DVec2::new(40.0, 40.0));

        seq.update(&state, now + RETURN_DURATION_MS);
        assert_eq!(seq.phase(), Phase::Inactive);
        assert_eq!(seq.frame().position, DVec2::new(40.0, 40.0));
        assert_eq!(seq.frame().scale, 1.0);
    }

    #[test]
    fn test_resume_resolves_fresh_path() {
        let mut seq = sequencer();
        let mut state = running_case_work();
        seq.update(&state, at(2700.0));
        let original = seq.pre_segment().copied().unwrap();

        apply(&mut state, Command::Pause, at(2000.0));
        seq.update(&state, at(2000.0));
        seq.update(&state, at(2000.0) + 5_000.0);
        assert_eq!(seq.phase(), Phase::Inactive);

        let resume_at = at(2000.0) + 10_000.0;
        apply(&mut state, Command::Start, resume_at);
        seq.update(&state, resume_at);
        let fresh = seq.pre_segment().copied().unwrap();
        assert_eq!(seq.phase(), Phase::PreHitCruise);
        assert_eq!(fresh.start_remaining, 2000.0);
        assert_ne!(fresh, original);
    }

    #[test]
    fn test_rewind_past_first_corner_rearms_it() {
        let mut seq = sequencer();
        let mut state = running_case_work();
        seq.update(&state, at(2700.0));
        seq.update(&state, at(960.0));
        assert!(seq.corner_hit_triggered());

        // Two extra minutes while running puts us back above the threshold
        let now = at(950.0);
        apply(&mut state, Command::AdjustMinutes(2), now);
        seq.update(&state, now);
        assert_eq!(seq.phase(), Phase::PreHitCruise);
        assert!(!seq.corner_hit_triggered());
        assert!(seq.post_segment().is_none());
        let pre = seq.pre_segment().unwrap();
        assert!((pre.start_remaining - 1070.0).abs() < 1e-6);
    }

    #[test]
    fn test_finishing_returns_home() {
        let mut seq = sequencer();
        let mut state = running_case_work();
        seq.update(&state, at(2700.0));
        seq.update(&state, at(960.0));
        seq.update(&state, at(60.0));
        crate::timer::tick(&mut state, at(0.0));
        assert!(state.is_finished());
        seq.update(&state, at(0.0));
        assert_eq!(seq.phase(), Phase::ReturnToOrigin);
    }

    #[test]
    fn test_reset_clears_paths() {
        let mut seq = sequencer();
        let state = running_case_work();
        seq.update(&state, at(2700.0));
        seq.update(&state, at(960.0));

        seq.reset(at(950.0));
        assert!(seq.pre_segment().is_none());
        assert!(seq.post_segment().is_none());
        assert!(!seq.corner_hit_triggered());
        assert_eq!(seq.phase(), Phase::ReturnToOrigin);

        let once = seq.clone();
        seq.reset(at(950.0));
        assert_eq!(seq, once);
    }

    #[test]
    fn test_sparkle_on_corner_contact_is_throttled() {
        let mut seq = sequencer();
        seq.phase = Phase::PreHitCruise;
        let b = bounds();
        let mut events = Vec::new();

        seq.position = b.corner(Corner::TopRight);
        seq.check_contact(&b, 0.0, &mut events);
        assert_eq!(events.len(), 1);

        // Same contact key: nothing new
        seq.check_contact(&b, 1000.0, &mut events);
        assert_eq!(events.len(), 1);

        // Different corner inside the throttle window: suppressed
        seq.position = b.corner(Corner::BottomRight);
        seq.check_contact(&b, 100.0, &mut events);
        assert_eq!(events.len(), 1);

        // Leave and come back after the window
        seq.position = DVec2::new(500.0, 300.0);
        seq.check_contact(&b, 200.0, &mut events);
        seq.position = b.corner(Corner::BottomLeft);
        seq.check_contact(&b, 1000.0, &mut events);
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn test_snapshot_restores_post_hit_cruise() {
        let mut seq = sequencer();
        let state = running_case_work();
        seq.update(&state, at(2700.0));
        seq.update(&state, at(960.0));
        seq.update(&state, at(500.0));
        let snap = seq.snapshot();
        assert!(snap.active);

        let mut restored = sequencer();
        assert!(restored.restore(&snap, 500.0));
        assert_eq!(restored.phase(), Phase::PostHitCruise);
        assert_eq!(restored.post_segment(), seq.post_segment());
        assert!(restored.frame().position.distance(seq.frame().position) < 1e-9);

        // Carries on without a second corner hit
        assert!(impacts(&restored.update(&state, at(499.0))).is_empty());
    }

    #[test]
    fn test_inconsistent_snapshot_is_discarded() {
        let mut seq = sequencer();
        let snap = DvdSnapshot {
            active: true,
            corner_hit_triggered: true,
            ..DvdSnapshot::default()
        };
        assert!(!seq.restore(&snap, 500.0));
        assert_eq!(seq.phase(), Phase::Inactive);
    }

    #[test]
    fn test_resize_resolves_active_leg() {
        let mut seq = sequencer();
        let state = running_case_work();
        seq.update(&state, at(2700.0));
        seq.update(&state, at(2000.0));

        let smaller = RectBounds::new(10.0, 600.0, 10.0, 400.0);
        seq.set_bounds(Some(smaller), 2000.0);
        let pre = seq.pre_segment().copied().unwrap();
        assert_eq!(pre.start_remaining, 2000.0);
        let landed = pre.position(FIRST_CORNER_SECONDS, &smaller);
        assert!(landed.distance(smaller.corner(pre.path.target)) < 1e-3);
    }
}
