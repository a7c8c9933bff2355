//! Best-effort countdown snapshot
//!
//! Features:
//! - JSON envelope compatible with the page's LocalStorage entry
//! - Unknown or missing fields default instead of failing
//! - Malformed logo data is dropped without losing the countdown
//! - Expired running countdowns load as finished, never resumed
//!
//! Nothing here returns an error to the caller: a snapshot either loads or
//! it doesn't.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::dvd::Corner;
use crate::platform::KeyValueStore;
use crate::timer::{CountdownState, Mode};

/// LocalStorage key for the countdown
pub const STORAGE_KEY: &str = "folio_interview_timer";

/// `{x, y}` point
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PointJson {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
}

impl From<DVec2> for PointJson {
    fn from(v: DVec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<PointJson> for DVec2 {
    fn from(p: PointJson) -> Self {
        DVec2::new(p.x, p.y)
    }
}

/// `{vx, vy}` velocity
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VelocityJson {
    #[serde(default)]
    pub vx: f64,
    #[serde(default)]
    pub vy: f64,
}

impl From<DVec2> for VelocityJson {
    fn from(v: DVec2) -> Self {
        Self { vx: v.x, vy: v.y }
    }
}

impl From<VelocityJson> for DVec2 {
    fn from(v: VelocityJson) -> Self {
        DVec2::new(v.vx, v.vy)
    }
}

fn default_scale() -> f64 {
    1.0
}

/// Persisted logo animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DvdSnapshot {
    pub active: bool,
    pub position: PointJson,
    pub velocity: VelocityJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corner_target: Option<Corner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_segment_velocity: Option<VelocityJson>,
    /// Remaining seconds when the first leg started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pre_segment_start: Option<f64>,
    pub corner_hit_triggered: bool,
    pub final_corner_hit_triggered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_corner_target: Option<Corner>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_segment_velocity: Option<VelocityJson>,
    /// Remaining seconds when the second leg started
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_segment_start: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_anchor: Option<PointJson>,
    #[serde(default = "default_scale")]
    pub scale: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_anchor: Option<PointJson>,
}

impl Default for DvdSnapshot {
    fn default() -> Self {
        Self {
            active: false,
            position: PointJson::default(),
            velocity: VelocityJson::default(),
            corner_target: None,
            pre_segment_velocity: None,
            pre_segment_start: None,
            corner_hit_triggered: false,
            final_corner_hit_triggered: false,
            final_corner_target: None,
            post_segment_velocity: None,
            post_segment_start: None,
            post_anchor: None,
            scale: default_scale(),
            start_anchor: None,
        }
    }
}

/// Countdown plus optional logo state, as written to storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedSnapshot {
    #[serde(default)]
    pub mode: Mode,
    /// Absent on old or hand-edited records; means a full mode duration
    #[serde(default)]
    pub remaining_seconds: Option<f64>,
    #[serde(default)]
    pub is_running: bool,
    /// Absolute end time; 0 when stopped
    #[serde(default)]
    pub end_time_ms: f64,
    /// Kept raw so a bad logo record cannot sink the countdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dvd: Option<serde_json::Value>,
}

impl PersistedSnapshot {
    pub fn from_state(state: &CountdownState, dvd: Option<&DvdSnapshot>) -> Self {
        Self {
            mode: state.mode,
            remaining_seconds: Some(f64::from(state.remaining_seconds)),
            is_running: state.running,
            end_time_ms: state.end_time_ms.unwrap_or(0.0),
            dvd: dvd.and_then(|d| serde_json::to_value(d).ok()),
        }
    }

    /// Rebuild the countdown as of `now_ms`
    pub fn countdown(&self, now_ms: f64) -> CountdownState {
        let mut state = CountdownState::new(self.mode);

        if self.is_running && self.end_time_ms.is_finite() && self.end_time_ms > 0.0 {
            let left = ((self.end_time_ms - now_ms) / 1000.0).ceil();
            if left <= 0.0 {
                state.remaining_seconds = 0;
                return state;
            }
            state.running = true;
            state.end_time_ms = Some(self.end_time_ms);
            state.remaining_seconds = clamp_seconds(left);
            return state;
        }

        if let Some(seconds) = self.remaining_seconds.filter(|s| s.is_finite()) {
            state.remaining_seconds = clamp_seconds(seconds.round());
        }
        state
    }

    /// Logo record, if present and well-formed
    pub fn dvd_snapshot(&self) -> Option<DvdSnapshot> {
        let raw = self.dvd.clone()?;
        match serde_json::from_value(raw) {
            Ok(snap) => Some(snap),
            Err(e) => {
                log::warn!("Ignoring malformed logo snapshot: {}", e);
                None
            }
        }
    }

    pub fn to_json(&self) -> Option<String> {
        serde_json::to_string(self).ok()
    }

    pub fn from_json(json: &str) -> Option<Self> {
        serde_json::from_str(json).ok()
    }
}

fn clamp_seconds(value: f64) -> u32 {
    value.clamp(0.0, f64::from(u32::MAX)) as u32
}

/// Write the snapshot; failures are logged and otherwise ignored
pub fn save(store: &mut dyn KeyValueStore, snapshot: &PersistedSnapshot) {
    let Some(json) = snapshot.to_json() else {
        return;
    };
    if let Err(e) = store.set(STORAGE_KEY, &json) {
        log::debug!("Snapshot not saved: {}", e);
    }
}

/// Read the snapshot; anything unreadable counts as no snapshot
pub fn load(store: &dyn KeyValueStore) -> Option<PersistedSnapshot> {
    let json = match store.get(STORAGE_KEY) {
        Ok(Some(json)) => json,
        Ok(None) => return None,
        Err(e) => {
            log::debug!("Snapshot not loaded: {}", e);
            return None;
        }
    };
    let snapshot = PersistedSnapshot::from_json(&json);
    if snapshot.is_none() {
        log::warn!("Discarding unreadable timer snapshot");
    }
    snapshot
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Capability, CapabilityUnavailable, MemoryStore};

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, CapabilityUnavailable> {
            Err(CapabilityUnavailable::new(Capability::Storage, "denied"))
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), CapabilityUnavailable> {
            Err(CapabilityUnavailable::new(Capability::Storage, "quota"))
        }

        fn remove(&mut self, _key: &str) -> Result<(), CapabilityUnavailable> {
            Err(CapabilityUnavailable::new(Capability::Storage, "denied"))
        }
    }

    #[test]
    fn test_roundtrip_keeps_mode_remaining_running() {
        let mut store = MemoryStore::new();
        let state = CountdownState {
            mode: Mode::Presentation,
            remaining_seconds: 200,
            running: true,
            end_time_ms: Some(1_200_000.0),
        };
        save(&mut store, &PersistedSnapshot::from_state(&state, None));

        let loaded = load(&store).unwrap().countdown(1_000_000.0);
        assert_eq!(loaded.mode, Mode::Presentation);
        assert_eq!(loaded.remaining_seconds, 200);
        assert!(loaded.running);
        assert_eq!(loaded.end_time_ms, Some(1_200_000.0));
    }

    #[test]
    fn test_expired_running_snapshot_loads_finished() {
        let snap = PersistedSnapshot {
            mode: Mode::CaseWork,
            remaining_seconds: Some(30.0),
            is_running: true,
            end_time_ms: 5_000.0,
            dvd: None,
        };
        let state = snap.countdown(9_000.0);
        assert!(!state.running);
        assert_eq!(state.remaining_seconds, 0);
        assert!(state.is_finished());
    }

    #[test]
    fn test_missing_fields_default() {
        let snap = PersistedSnapshot::from_json("{}").unwrap();
        let state = snap.countdown(0.0);
        assert_eq!(state.mode, Mode::CaseWork);
        assert!(!state.running);
        assert_eq!(state.remaining_seconds, Mode::CaseWork.duration_seconds());
        assert_eq!(state.status(), crate::timer::Status::Ready);

        let snap = PersistedSnapshot::from_json(r#"{"mode":"presentation"}"#).unwrap();
        let state = snap.countdown(0.0);
        assert_eq!(state.mode, Mode::Presentation);
        assert_eq!(state.remaining_seconds, Mode::Presentation.duration_seconds());

        // Explicit null is treated the same as missing
        let snap = PersistedSnapshot::from_json(r#"{"remainingSeconds":null}"#).unwrap();
        assert_eq!(snap.countdown(0.0).remaining_seconds, Mode::CaseWork.duration_seconds());
    }

    #[test]
    fn test_unknown_mode_is_no_snapshot() {
        let mut store = MemoryStore::new();
        store
            .set(STORAGE_KEY, r#"{"mode":"lunchBreak","remainingSeconds":10}"#)
            .unwrap();
        assert!(load(&store).is_none());
    }

    #[test]
    fn test_corrupt_json_is_no_snapshot() {
        let mut store = MemoryStore::new();
        store.set(STORAGE_KEY, "{not json").unwrap();
        assert!(load(&store).is_none());
    }

    #[test]
    fn test_broken_store_is_swallowed() {
        let mut store = BrokenStore;
        let state = CountdownState::new(Mode::CaseWork);
        save(&mut store, &PersistedSnapshot::from_state(&state, None));
        assert!(load(&store).is_none());
    }

    #[test]
    fn test_bad_dvd_record_keeps_countdown() {
        let json = r#"{
            "mode": "caseWork",
            "remainingSeconds": 1200,
            "isRunning": false,
            "endTimeMs": 0,
            "dvd": {"active": true, "cornerTarget": "middle"}
        }"#;
        let snap = PersistedSnapshot::from_json(json).unwrap();
        assert_eq!(snap.countdown(0.0).remaining_seconds, 1200);
        assert!(snap.dvd_snapshot().is_none());
    }

    #[test]
    fn test_dvd_wire_names() {
        let dvd = DvdSnapshot {
            active: true,
            corner_target: Some(Corner::BottomRight),
            pre_segment_velocity: Some(VelocityJson { vx: 1.5, vy: -2.0 }),
            start_anchor: Some(PointJson { x: 3.0, y: 4.0 }),
            ..DvdSnapshot::default()
        };
        let value = serde_json::to_value(&dvd).unwrap();
        assert_eq!(value["cornerTarget"], "bottom-right");
        assert_eq!(value["preSegmentVelocity"]["vx"], 1.5);
        assert_eq!(value["startAnchor"]["y"], 4.0);
        assert_eq!(value["cornerHitTriggered"], false);
        assert!(value.get("finalCornerTarget").is_none());

        let back: DvdSnapshot = serde_json::from_value(value).unwrap();
        assert_eq!(back, dvd);
    }
}
