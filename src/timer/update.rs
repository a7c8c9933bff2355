//! Countdown state transitions
//!
//! Every user command and every periodic tick goes through one of the two
//! functions here; nothing else mutates a `CountdownState`.

use super::state::{Command, CountdownState, TimerEvent};

/// Apply one user command at wall-clock time `now_ms`
pub fn apply(state: &mut CountdownState, command: Command, now_ms: f64) -> Vec<TimerEvent> {
    let mut events = Vec::new();

    match command {
        Command::Start => start(state, now_ms, &mut events),
        Command::Pause => pause(state, now_ms, &mut events),
        Command::ToggleStartPause => {
            if state.running {
                pause(state, now_ms, &mut events);
            } else {
                start(state, now_ms, &mut events);
            }
        }
        Command::Reset => {
            stop(state, now_ms);
            state.remaining_seconds = state.duration_seconds();
            events.push(TimerEvent::Reset);
        }
        Command::SetMode(mode) => {
            stop(state, now_ms);
            state.mode = mode;
            state.remaining_seconds = mode.duration_seconds();
            events.push(TimerEvent::ModeChanged(mode));
        }
        Command::AdjustMinutes(delta) => adjust(state, delta, now_ms, &mut events),
        Command::ToggleFullscreen => events.push(TimerEvent::FullscreenRequested),
    }

    events
}

/// Periodic reconciliation against the end timestamp
pub fn tick(state: &mut CountdownState, now_ms: f64) -> Vec<TimerEvent> {
    if !state.running {
        return Vec::new();
    }
    state.sync(now_ms);
    if state.remaining_seconds == 0 {
        finish(state);
        return vec![TimerEvent::Finished];
    }
    Vec::new()
}

fn start(state: &mut CountdownState, now_ms: f64, events: &mut Vec<TimerEvent>) {
    if state.running {
        return;
    }
    // Starting from a finished countdown begins a fresh full-length run
    if state.remaining_seconds == 0 {
        state.remaining_seconds = state.duration_seconds();
    }
    state.running = true;
    state.end_time_ms = Some(now_ms + f64::from(state.remaining_seconds) * 1000.0);
    events.push(TimerEvent::Started);
}

fn pause(state: &mut CountdownState, now_ms: f64, events: &mut Vec<TimerEvent>) {
    if !state.running {
        return;
    }
    stop(state, now_ms);
    events.push(TimerEvent::Paused);
}

fn stop(state: &mut CountdownState, now_ms: f64) {
    state.sync(now_ms);
    state.running = false;
    state.end_time_ms = None;
}

fn finish(state: &mut CountdownState) {
    state.remaining_seconds = 0;
    state.running = false;
    state.end_time_ms = None;
}

fn adjust(state: &mut CountdownState, delta_minutes: i32, now_ms: f64, events: &mut Vec<TimerEvent>) {
    let delta_seconds = i64::from(delta_minutes) * 60;

    if state.running {
        let Some(end) = state.end_time_ms else {
            return;
        };
        let shifted = (end + delta_seconds as f64 * 1000.0).max(now_ms);
        state.end_time_ms = Some(shifted);
        state.sync(now_ms);
        if state.remaining_seconds == 0 {
            finish(state);
            events.push(TimerEvent::Finished);
        } else {
            events.push(TimerEvent::Adjusted);
        }
        return;
    }

    if state.is_finished() {
        return;
    }
    let next = (i64::from(state.remaining_seconds) + delta_seconds).max(0);
    state.remaining_seconds = u32::try_from(next).unwrap_or(u32::MAX);
    events.push(TimerEvent::Adjusted);
}
