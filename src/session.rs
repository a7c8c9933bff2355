//! One page view of the interview timer
//!
//! `TimerSession` owns everything the timer page mutates: the countdown,
//! the logo sequencer, the particle burst, visitor settings and the
//! snapshot store. Browser callbacks (button clicks, the periodic tick,
//! animation frames, one-shot image cues) all go through its methods and
//! get back a list of [`Effect`]s for the platform layer to carry out.

use glam::DVec2;

use crate::audio::Chime;
use crate::consts::IMAGE_SEQUENCE_OFFSET_SECONDS;
use crate::dvd::{FrameView, Impact, PhaseSequencer, RectBounds, SequencerEvent};
use crate::particles::{BurstPreset, ParticleBurst};
use crate::persistence::{self, DvdSnapshot, PersistedSnapshot};
use crate::platform::KeyValueStore;
use crate::settings::Settings;
use crate::timer::{self, Clock, Command, CountdownState, Mode, Status, TimerEvent, format_time};

/// Delay of each decorative frame from the start of the image sequence (ms)
pub const IMAGE_FRAME_DELAYS_MS: [f64; 6] = [0.0, 5_000.0, 10_000.0, 15_000.0, 20_000.0, 25_000.0];

/// Work for the platform layer
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    PlayChime(Chime),
    ToggleFullscreen,
    /// Begin the periodic reconciliation tick
    StartTicking,
    StopTicking,
    /// Schedule `on_frame` for the next animation frame
    RequestFrame,
    /// Arm one-shot image cues; each calls `on_cue(generation, frame)`
    ScheduleCues { generation: u64, cues: Vec<ImageCue> },
    /// Drop every pending cue
    CancelCues,
}

/// One decorative frame, shown `delay_ms` from now
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageCue {
    pub frame: usize,
    pub delay_ms: f64,
}

/// Everything the page needs to draw the timer
#[derive(Debug, Clone, PartialEq)]
pub struct TimerView {
    pub mode: Mode,
    pub time_text: String,
    pub status: Status,
    pub running: bool,
    pub progress_percent: f64,
    pub logo: FrameView,
    pub image_frame: Option<usize>,
}

impl TimerView {
    pub fn start_pause_label(&self) -> &'static str {
        if self.running { "Pause" } else { "Start" }
    }

    /// Is the mode button tagged `data-mode="key"` the selected one
    pub fn is_mode_selected(&self, key: &str) -> bool {
        Mode::from_key(key) == Some(self.mode)
    }
}

pub struct TimerSession<C: Clock> {
    clock: C,
    countdown: CountdownState,
    sequencer: PhaseSequencer,
    burst: ParticleBurst,
    settings: Settings,
    store: Option<Box<dyn KeyValueStore>>,
    /// Logo animation waiting for bounds before it can be restored
    pending_dvd: Option<DvdSnapshot>,
    logo_size: DVec2,
    cue_generation: u64,
    image_frame: Option<usize>,
}

impl<C: Clock> TimerSession<C> {
    /// Build a session, picking up any snapshot left in `store`
    pub fn new(clock: C, settings: Settings, store: Option<Box<dyn KeyValueStore>>) -> Self {
        let now = clock.now_ms();
        let snapshot = store.as_deref().and_then(|s| persistence::load(s));
        let (countdown, pending_dvd) = match snapshot {
            Some(snap) => {
                let countdown = snap.countdown(now);
                log::info!(
                    "Restored {} timer at {}",
                    countdown.mode.label(),
                    format_time(i64::from(countdown.remaining_seconds))
                );
                (countdown, snap.dvd_snapshot())
            }
            None => (CountdownState::default(), None),
        };

        Self {
            sequencer: PhaseSequencer::new(settings.dvd_config(), DVec2::ZERO),
            clock,
            countdown,
            burst: ParticleBurst::default(),
            settings,
            store,
            pending_dvd,
            logo_size: DVec2::ZERO,
            cue_generation: 0,
            image_frame: None,
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn countdown(&self) -> &CountdownState {
        &self.countdown
    }

    pub fn sequencer(&self) -> &PhaseSequencer {
        &self.sequencer
    }

    pub fn burst(&self) -> &ParticleBurst {
        &self.burst
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cue_generation(&self) -> u64 {
        self.cue_generation
    }

    /// Effects needed to pick up where a restored snapshot left off
    pub fn resume(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.countdown.running {
            effects.push(Effect::StartTicking);
            self.schedule_cues(&mut effects);
        }
        if self.needs_frame() {
            effects.push(Effect::RequestFrame);
        }
        effects
    }

    /// Viewport, logo size or resting place changed
    pub fn set_layout(&mut self, viewport: DVec2, logo_size: DVec2, rest: DVec2) -> Vec<Effect> {
        self.logo_size = logo_size;
        self.sequencer.set_rest(rest);
        if !self.settings.effective_dvd() {
            return Vec::new();
        }

        let now = self.clock.now_ms();
        let remaining = self.countdown.remaining_precise(now);
        let bounds = RectBounds::from_viewport(viewport, self.settings.logo_margin, logo_size);
        self.sequencer.set_bounds(Some(bounds), remaining);

        if let Some(snap) = self.pending_dvd.take() {
            if self.countdown.running && self.sequencer.restore(&snap, remaining) {
                log::info!("Restored logo in {:?}", self.sequencer.phase());
            }
        }
        if self.needs_frame() {
            vec![Effect::RequestFrame]
        } else {
            Vec::new()
        }
    }

    /// No logo on this page
    pub fn disable_logo(&mut self) {
        self.pending_dvd = None;
        self.sequencer.set_bounds(None, 0.0);
    }

    /// Apply one user command
    pub fn dispatch(&mut self, command: Command) -> Vec<Effect> {
        let now = self.clock.now_ms();
        let events = timer::apply(&mut self.countdown, command, now);
        let mut effects = Vec::new();

        for event in events {
            match event {
                TimerEvent::Started => {
                    log::info!("{} timer started", self.countdown.mode.label());
                    effects.push(Effect::StartTicking);
                    self.schedule_cues(&mut effects);
                }
                TimerEvent::Paused => {
                    effects.push(Effect::StopTicking);
                    self.cancel_cues(&mut effects);
                }
                TimerEvent::Reset | TimerEvent::ModeChanged(_) => {
                    effects.push(Effect::StopTicking);
                    self.cancel_cues(&mut effects);
                    let seq_events = self.sequencer.reset(now);
                    self.handle_sequencer(seq_events, &mut effects);
                }
                TimerEvent::Adjusted => {
                    if self.countdown.running {
                        self.schedule_cues(&mut effects);
                    } else {
                        self.cancel_cues(&mut effects);
                    }
                }
                TimerEvent::Finished => self.finish(&mut effects),
                TimerEvent::FullscreenRequested => effects.push(Effect::ToggleFullscreen),
            }
        }

        let seq_events = self.sequencer.update(&self.countdown, now);
        self.handle_sequencer(seq_events, &mut effects);
        if self.needs_frame() {
            effects.push(Effect::RequestFrame);
        }
        self.persist();
        effects
    }

    /// Periodic tick
    pub fn on_tick(&mut self) -> Vec<Effect> {
        let now = self.clock.now_ms();
        let mut effects = Vec::new();
        for event in timer::tick(&mut self.countdown, now) {
            if event == TimerEvent::Finished {
                self.finish(&mut effects);
            }
        }
        let seq_events = self.sequencer.update(&self.countdown, now);
        self.handle_sequencer(seq_events, &mut effects);
        if self.needs_frame() {
            effects.push(Effect::RequestFrame);
        }
        self.persist();
        effects
    }

    /// Animation frame, `dt` seconds after the previous one
    pub fn on_frame(&mut self, dt: f32) -> Vec<Effect> {
        let now = self.clock.now_ms();
        let mut effects = Vec::new();
        let seq_events = self.sequencer.update(&self.countdown, now);
        self.handle_sequencer(seq_events, &mut effects);
        self.burst.advance(dt);
        if self.needs_frame() {
            effects.push(Effect::RequestFrame);
        }
        effects
    }

    /// A one-shot image cue fired; stale generations are ignored
    pub fn on_cue(&mut self, generation: u64, frame: usize) -> bool {
        if generation != self.cue_generation {
            return false;
        }
        self.image_frame = Some(frame);
        true
    }

    /// Another animation frame is wanted
    pub fn needs_frame(&self) -> bool {
        self.sequencer.is_animating() || !self.burst.is_empty()
    }

    pub fn view(&self) -> TimerView {
        let now = self.clock.now_ms();
        TimerView {
            mode: self.countdown.mode,
            time_text: format_time(i64::from(self.countdown.remaining_whole(now))),
            status: self.countdown.status(),
            running: self.countdown.running,
            progress_percent: self.countdown.progress_percent(),
            logo: self.sequencer.frame(),
            image_frame: self.image_frame,
        }
    }

    fn finish(&mut self, effects: &mut Vec<Effect>) {
        log::info!("{} timer finished", self.countdown.mode.label());
        effects.push(Effect::StopTicking);
        effects.push(Effect::PlayChime(Chime::TimeUp));
    }

    fn schedule_cues(&mut self, effects: &mut Vec<Effect>) {
        self.cancel_cues(effects);
        if !self.countdown.running || self.countdown.mode != Mode::CaseWork {
            return;
        }
        let Some(end) = self.countdown.end_time_ms else {
            return;
        };
        let now = self.clock.now_ms();
        let sequence_in = end - now - f64::from(IMAGE_SEQUENCE_OFFSET_SECONDS) * 1000.0;

        let delays: Vec<f64> = IMAGE_FRAME_DELAYS_MS.iter().map(|d| sequence_in + d).collect();
        // Starting late: show the frame that should already be up, then the rest
        let current = delays.iter().rposition(|d| *d < 0.0);
        let cues: Vec<ImageCue> = delays
            .iter()
            .enumerate()
            .filter(|(i, d)| **d >= 0.0 || Some(*i) == current)
            .map(|(frame, d)| ImageCue {
                frame,
                delay_ms: d.max(0.0),
            })
            .collect();

        if !cues.is_empty() {
            effects.push(Effect::ScheduleCues {
                generation: self.cue_generation,
                cues,
            });
        }
    }

    fn cancel_cues(&mut self, effects: &mut Vec<Effect>) {
        self.cue_generation += 1;
        self.image_frame = None;
        if !effects.contains(&Effect::CancelCues) {
            effects.push(Effect::CancelCues);
        }
    }

    fn handle_sequencer(&mut self, events: Vec<SequencerEvent>, effects: &mut Vec<Effect>) {
        for event in events {
            match event {
                SequencerEvent::CornerImpact {
                    corner,
                    position,
                    impact,
                } => {
                    log::debug!("Corner impact {:?} at {:?}", impact, corner);
                    self.burst_at(position, corner, BurstPreset::for_impact(impact));
                    effects.push(Effect::PlayChime(match impact {
                        Impact::Corner => Chime::Impact,
                        Impact::Final => Chime::FinalImpact,
                    }));
                }
                SequencerEvent::Sparkle { corner, position } => {
                    self.burst_at(position, corner, BurstPreset::SPARKLE);
                }
                SequencerEvent::PhaseChanged { .. } => {}
            }
        }
    }

    /// Bursts start from the screen corner the logo touched, not its origin
    fn burst_at(&mut self, position: DVec2, corner: crate::dvd::Corner, preset: BurstPreset) {
        if !self.settings.effective_particles() {
            return;
        }
        let offset = DVec2::new(
            if corner.is_right() { self.logo_size.x } else { 0.0 },
            if corner.is_bottom() { self.logo_size.y } else { 0.0 },
        );
        self.burst.spawn_preset((position + offset).as_vec2(), preset);
    }

    fn persist(&mut self) {
        let dvd = if self.sequencer.is_enabled() {
            Some(self.sequencer.snapshot())
        } else {
            self.pending_dvd.clone()
        };
        let snapshot = PersistedSnapshot::from_state(&self.countdown, dvd.as_ref());
        if let Some(store) = self.store.as_deref_mut() {
            persistence::save(store, &snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dvd::Phase;
    use crate::platform::MemoryStore;
    use crate::timer::ManualClock;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    const T0: f64 = 1_000_000.0;

    /// Store whose contents outlive the session that wrote them
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<HashMap<String, String>>>);

    impl KeyValueStore for SharedStore {
        fn get(&self, key: &str) -> Result<Option<String>, crate::platform::CapabilityUnavailable> {
            Ok(self.0.borrow().get(key).cloned())
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), crate::platform::CapabilityUnavailable> {
            self.0.borrow_mut().insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn remove(&mut self, key: &str) -> Result<(), crate::platform::CapabilityUnavailable> {
            self.0.borrow_mut().remove(key);
            Ok(())
        }
    }

    fn session() -> TimerSession<ManualClock> {
        let mut session = TimerSession::new(
            ManualClock::new(T0),
            Settings::default(),
            Some(Box::new(MemoryStore::new())),
        );
        session.set_layout(
            DVec2::new(1280.0, 720.0),
            DVec2::new(120.0, 60.0),
            DVec2::new(40.0, 40.0),
        );
        session
    }

    /// Move the clock to where `remaining` seconds of a run started at T0 are left
    fn goto(session: &TimerSession<ManualClock>, remaining: f64) {
        session.clock().set(T0 + (2700.0 - remaining) * 1000.0);
    }

    fn chimes(effects: &[Effect]) -> Vec<Chime> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::PlayChime(c) => Some(*c),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_start_ticks_and_schedules_cues() {
        let mut s = session();
        let effects = s.dispatch(Command::ToggleStartPause);
        assert!(effects.contains(&Effect::StartTicking));
        assert!(effects.contains(&Effect::RequestFrame));
        let cues = effects.iter().find_map(|e| match e {
            Effect::ScheduleCues { cues, .. } => Some(cues.clone()),
            _ => None,
        });
        let cues = cues.unwrap();
        assert_eq!(cues.len(), IMAGE_FRAME_DELAYS_MS.len());
        assert_eq!(cues[0].delay_ms, (2700.0 - 30.0) * 1000.0);
        assert_eq!(s.sequencer().phase(), Phase::PreHitCruise);
    }

    #[test]
    fn test_reset_twice_matches_reset_once() {
        let mut s = session();
        s.dispatch(Command::Start);
        goto(&s, 2000.0);
        s.on_frame(0.016);

        s.dispatch(Command::Reset);
        let countdown = s.countdown().clone();
        let generation = s.cue_generation();
        s.dispatch(Command::Reset);

        assert_eq!(s.countdown(), &countdown);
        assert_eq!(s.countdown(), &CountdownState::new(Mode::CaseWork));
        assert!(s.sequencer().pre_segment().is_none());
        assert!(s.sequencer().post_segment().is_none());
        assert!(!s.sequencer().corner_hit_triggered());
        assert!(s.cue_generation() > generation);
    }

    #[test]
    fn test_first_corner_bursts_once() {
        let mut s = session();
        s.dispatch(Command::Start);
        goto(&s, 960.5);
        assert!(chimes(&s.on_frame(0.016)).is_empty());
        assert!(s.burst().is_empty());

        goto(&s, 960.0);
        let effects = s.on_frame(0.016);
        assert_eq!(chimes(&effects), vec![Chime::Impact]);
        assert!(!s.burst().is_empty());

        for remaining in [959.9, 959.5, 958.0] {
            goto(&s, remaining);
            assert!(!chimes(&s.on_tick()).contains(&Chime::Impact));
            assert!(!chimes(&s.on_frame(0.016)).contains(&Chime::Impact));
        }
    }

    #[test]
    fn test_finish_plays_time_up() {
        let mut s = session();
        s.dispatch(Command::SetMode(Mode::Presentation));
        s.dispatch(Command::Start);
        s.clock().advance(300_000.0);
        let effects = s.on_tick();
        assert!(effects.contains(&Effect::StopTicking));
        assert_eq!(chimes(&effects), vec![Chime::TimeUp]);
        assert_eq!(s.view().status, Status::TimeUp);
        assert_eq!(s.view().time_text, "00:00");
    }

    #[test]
    fn test_stale_cue_is_ignored() {
        let mut s = session();
        s.dispatch(Command::Start);
        let old = s.cue_generation();
        s.dispatch(Command::Pause);
        assert!(!s.on_cue(old, 2));
        assert_eq!(s.view().image_frame, None);

        s.dispatch(Command::Start);
        assert!(s.on_cue(s.cue_generation(), 2));
        assert_eq!(s.view().image_frame, Some(2));
    }

    #[test]
    fn test_late_start_shows_current_frame_first() {
        let mut s = session();
        s.dispatch(Command::AdjustMinutes(-44));
        // 60 s left: sequence begins in 30 s
        let effects = s.dispatch(Command::Start);
        let cues = effects
            .iter()
            .find_map(|e| match e {
                Effect::ScheduleCues { cues, .. } => Some(cues.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(cues[0].delay_ms, 30_000.0);

        // 20 s left: frames 0 and 1 are already due, frame 1 shows at once
        let mut s = session();
        s.dispatch(Command::Start);
        s.clock().advance((2700.0 - 20.0) * 1000.0);
        let effects = s.dispatch(Command::AdjustMinutes(0));
        let cues = effects
            .iter()
            .find_map(|e| match e {
                Effect::ScheduleCues { cues, .. } => Some(cues.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(cues[0], ImageCue { frame: 1, delay_ms: 0.0 });
        assert_eq!(cues[1], ImageCue { frame: 2, delay_ms: 0.0 });
        assert_eq!(cues.len(), 5);
    }

    #[test]
    fn test_view_control_state() {
        let mut s = session();
        s.dispatch(Command::SetMode(Mode::Presentation));
        let view = s.view();
        assert!(view.is_mode_selected("presentation"));
        assert!(!view.is_mode_selected("caseWork"));
        assert!(!view.is_mode_selected("lunch"));
        assert_eq!(view.start_pause_label(), "Start");

        s.dispatch(Command::Start);
        assert_eq!(s.view().start_pause_label(), "Pause");
        assert!(s.view().running);
    }

    #[test]
    fn test_idle_presentation_stops_frame_loop() {
        let mut s = session();
        s.dispatch(Command::SetMode(Mode::Presentation));
        let effects = s.dispatch(Command::Start);
        assert!(effects.contains(&Effect::StartTicking));
        assert!(!effects.contains(&Effect::RequestFrame));

        s.clock().advance(1000.0);
        assert!(s.burst().is_empty());
        assert!(!s.needs_frame());
        assert!(!s.on_frame(0.016).contains(&Effect::RequestFrame));
        assert!(!s.on_tick().contains(&Effect::RequestFrame));
    }

    #[test]
    fn test_presentation_never_schedules_cues() {
        let mut s = session();
        s.dispatch(Command::SetMode(Mode::Presentation));
        let effects = s.dispatch(Command::Start);
        assert!(!effects.iter().any(|e| matches!(e, Effect::ScheduleCues { .. })));
        assert_eq!(s.sequencer().phase(), Phase::Inactive);
    }

    #[test]
    fn test_reload_resumes_running_countdown() {
        let store = SharedStore::default();
        let mut first = TimerSession::new(
            ManualClock::new(T0),
            Settings::default(),
            Some(Box::new(store.clone())),
        );
        first.set_layout(
            DVec2::new(1280.0, 720.0),
            DVec2::new(120.0, 60.0),
            DVec2::new(40.0, 40.0),
        );
        first.dispatch(Command::Start);
        first.clock().set(T0 + 2_000_000.0);
        first.on_tick();
        assert!(first.sequencer().corner_hit_triggered());

        let mut second = TimerSession::new(
            ManualClock::new(T0 + 2_005_000.0),
            Settings::default(),
            Some(Box::new(store)),
        );
        assert!(second.countdown().running);
        assert_eq!(second.countdown().mode, Mode::CaseWork);
        assert_eq!(second.countdown().remaining_seconds, 695);
        assert!(second.resume().contains(&Effect::StartTicking));

        second.set_layout(
            DVec2::new(1280.0, 720.0),
            DVec2::new(120.0, 60.0),
            DVec2::new(40.0, 40.0),
        );
        assert_eq!(second.sequencer().phase(), Phase::PostHitCruise);
        assert!(second.sequencer().corner_hit_triggered());
    }

    #[test]
    fn test_reduced_motion_keeps_logo_home() {
        let mut s = TimerSession::new(
            ManualClock::new(T0),
            Settings {
                reduced_motion: true,
                ..Settings::default()
            },
            None,
        );
        s.set_layout(
            DVec2::new(1280.0, 720.0),
            DVec2::new(120.0, 60.0),
            DVec2::new(40.0, 40.0),
        );
        s.dispatch(Command::Start);
        goto(&s, 960.0);
        let effects = s.on_frame(0.016);
        assert!(chimes(&effects).is_empty());
        assert_eq!(s.sequencer().phase(), Phase::Inactive);
        assert!(s.burst().is_empty());
    }
}
