//! Countdown state and the commands that drive it

use serde::{Deserialize, Serialize};

use crate::consts::{CASE_WORK_SECONDS, PRESENTATION_SECONDS};

/// Interview format being timed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    /// Long solo working block (45 minutes)
    #[default]
    CaseWork,
    /// Short presentation slot (5 minutes)
    Presentation,
}

impl Mode {
    pub const ALL: [Mode; 2] = [Mode::CaseWork, Mode::Presentation];

    /// Full countdown length for this mode
    pub fn duration_seconds(self) -> u32 {
        match self {
            Mode::CaseWork => CASE_WORK_SECONDS,
            Mode::Presentation => PRESENTATION_SECONDS,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Mode::CaseWork => "Case Work",
            Mode::Presentation => "Presentation",
        }
    }

    /// Key used in markup (`data-mode`) and in persisted snapshots
    pub fn key(self) -> &'static str {
        match self {
            Mode::CaseWork => "caseWork",
            Mode::Presentation => "presentation",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Mode::ALL.into_iter().find(|m| m.key() == key)
    }
}

/// Discrete user command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Pause,
    ToggleStartPause,
    Reset,
    SetMode(Mode),
    /// Add (or remove, when negative) whole minutes
    AdjustMinutes(i32),
    ToggleFullscreen,
}

/// Something that happened while applying a command or tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Started,
    Paused,
    Reset,
    ModeChanged(Mode),
    Adjusted,
    /// Countdown reached zero
    Finished,
    FullscreenRequested,
}

/// Human-facing status line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    TimeUp,
    Ready,
    Paused,
}

impl Status {
    pub fn text(self) -> &'static str {
        match self {
            Status::Running => "Running...",
            Status::TimeUp => "Time is up.",
            Status::Ready => "Ready to start.",
            Status::Paused => "Paused.",
        }
    }
}

/// The countdown itself
///
/// When `running`, `end_time_ms` is authoritative and `remaining_seconds`
/// is a cache refreshed on every tick. When stopped, `remaining_seconds` is
/// authoritative and `end_time_ms` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct CountdownState {
    pub mode: Mode,
    pub remaining_seconds: u32,
    pub running: bool,
    pub end_time_ms: Option<f64>,
}

impl Default for CountdownState {
    fn default() -> Self {
        Self::new(Mode::default())
    }
}

impl CountdownState {
    /// Stopped countdown at the full duration of `mode`
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            remaining_seconds: mode.duration_seconds(),
            running: false,
            end_time_ms: None,
        }
    }

    pub fn duration_seconds(&self) -> u32 {
        self.mode.duration_seconds()
    }

    /// Remaining time with sub-second precision, never negative
    pub fn remaining_precise(&self, now_ms: f64) -> f64 {
        match (self.running, self.end_time_ms) {
            (true, Some(end)) => ((end - now_ms) / 1000.0).max(0.0),
            _ => f64::from(self.remaining_seconds),
        }
    }

    /// Remaining whole seconds, rounded up while running
    pub fn remaining_whole(&self, now_ms: f64) -> u32 {
        if self.running && self.end_time_ms.is_some() {
            self.remaining_precise(now_ms).ceil() as u32
        } else {
            self.remaining_seconds
        }
    }

    /// Refresh the cached whole-second value from the end timestamp
    pub fn sync(&mut self, now_ms: f64) {
        if self.running {
            self.remaining_seconds = self.remaining_whole(now_ms);
        }
    }

    /// Stopped at zero: only reset, mode switch or a fresh start leave this
    pub fn is_finished(&self) -> bool {
        !self.running && self.remaining_seconds == 0
    }

    pub fn status(&self) -> Status {
        if self.running {
            Status::Running
        } else if self.remaining_seconds == 0 {
            Status::TimeUp
        } else if self.remaining_seconds == self.duration_seconds() {
            Status::Ready
        } else {
            Status::Paused
        }
    }

    /// Remaining share of the full duration, in percent
    pub fn progress_percent(&self) -> f64 {
        let duration = self.duration_seconds();
        if duration == 0 {
            return 0.0;
        }
        (f64::from(self.remaining_seconds) / f64::from(duration) * 100.0).clamp(0.0, 100.0)
    }
}

/// Format seconds as zero-padded `MM:SS`
pub fn format_time(total_seconds: i64) -> String {
    let safe = total_seconds.max(0);
    format!("{:02}:{:02}", safe / 60, safe % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remaining_follows_end_timestamp() {
        let now = 1_000_000.0;
        let state = CountdownState {
            mode: Mode::CaseWork,
            remaining_seconds: 0,
            running: true,
            end_time_ms: Some(now + 125_000.0),
        };
        assert_eq!(state.remaining_whole(now), 125);
        assert_eq!(state.remaining_whole(now + 60_000.0), 65);
    }

    #[test]
    fn test_remaining_rounds_up_partial_seconds() {
        let state = CountdownState {
            mode: Mode::Presentation,
            remaining_seconds: 300,
            running: true,
            end_time_ms: Some(10_500.0),
        };
        assert_eq!(state.remaining_whole(10_000.0), 1);
        assert!((state.remaining_precise(10_000.0) - 0.5).abs() < 1e-9);
        // Past the end clamps to zero
        assert_eq!(state.remaining_whole(20_000.0), 0);
        assert_eq!(state.remaining_precise(20_000.0), 0.0);
    }

    #[test]
    fn test_stopped_state_does_not_drift() {
        let state = CountdownState {
            remaining_seconds: 42,
            ..CountdownState::new(Mode::CaseWork)
        };
        assert_eq!(state.remaining_whole(0.0), 42);
        assert_eq!(state.remaining_whole(9e12), 42);
        assert_eq!(state.remaining_precise(9e12), 42.0);
    }

    #[test]
    fn test_status_text() {
        let mut state = CountdownState::new(Mode::Presentation);
        assert_eq!(state.status(), Status::Ready);
        state.remaining_seconds = 100;
        assert_eq!(state.status().text(), "Paused.");
        state.remaining_seconds = 0;
        assert_eq!(state.status().text(), "Time is up.");
        state.running = true;
        assert_eq!(state.status(), Status::Running);
    }

    #[test]
    fn test_progress_percent() {
        let mut state = CountdownState::new(Mode::Presentation);
        assert_eq!(state.progress_percent(), 100.0);
        state.remaining_seconds = 150;
        assert_eq!(state.progress_percent(), 50.0);
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(45 * 60), "45:00");
        assert_eq!(format_time(65), "01:05");
        assert_eq!(format_time(-3), "00:00");
    }

    #[test]
    fn test_mode_keys() {
        assert_eq!(Mode::from_key("caseWork"), Some(Mode::CaseWork));
        assert_eq!(Mode::from_key("presentation"), Some(Mode::Presentation));
        assert_eq!(Mode::from_key("lunch"), None);
        assert_eq!(Mode::CaseWork.duration_seconds(), 2700);
    }
}
