//! Visitor preferences for the timer page
//!
//! Persisted separately from the countdown snapshot in LocalStorage.

use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::dvd::DvdConfig;
use crate::platform::KeyValueStore;

/// Timer page settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Visual Effects ===
    /// Loose bursts whenever the logo grazes a corner
    pub sparkles: bool,
    /// Particle bursts at all (scripted impacts included)
    pub particles: bool,
    /// Logo travel speed per axis (px/s)
    pub dvd_speed: [f64; 2],
    /// Gap kept between the logo and the viewport edge (px)
    pub logo_margin: f64,
    /// Logo scale while cruising
    pub cruise_scale: f64,

    // === Audio ===
    /// Chime volume (0.0 - 1.0)
    pub chime_volume: f32,
    pub muted: bool,

    // === Accessibility ===
    /// Reduced motion (no logo flight, no bursts)
    pub reduced_motion: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sparkles: true,
            particles: true,
            dvd_speed: [110.0, 85.0],
            logo_margin: 16.0,
            cruise_scale: 1.0,

            chime_volume: 0.8,
            muted: false,

            reduced_motion: false,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "folio_settings";

    /// Logo flies at all (respects reduced_motion)
    pub fn effective_dvd(&self) -> bool {
        !self.reduced_motion
    }

    /// Effective sparkle bursts (respects reduced_motion and particles)
    pub fn effective_sparkles(&self) -> bool {
        self.sparkles && self.effective_particles()
    }

    /// Effective particle bursts (respects reduced_motion)
    pub fn effective_particles(&self) -> bool {
        self.particles && !self.reduced_motion
    }

    /// Gain applied to chimes, 0 when muted
    pub fn effective_volume(&self) -> f32 {
        if self.muted {
            0.0
        } else {
            self.chime_volume.clamp(0.0, 1.0)
        }
    }

    /// Sequencer tunables derived from these settings
    pub fn dvd_config(&self) -> DvdConfig {
        let speed = DVec2::new(self.dvd_speed[0].abs(), self.dvd_speed[1].abs());
        DvdConfig {
            speed: if speed.is_finite() {
                speed
            } else {
                DvdConfig::default().speed
            },
            sparkles: self.effective_sparkles(),
            cruise_scale: if self.cruise_scale.is_finite() && self.cruise_scale > 0.0 {
                self.cruise_scale
            } else {
                1.0
            },
            ..DvdConfig::default()
        }
    }

    /// Read settings from `store`, falling back to defaults
    pub fn load_from(store: &dyn KeyValueStore) -> Self {
        if let Ok(Some(json)) = store.get(Self::STORAGE_KEY) {
            if let Ok(settings) = serde_json::from_str(&json) {
                log::info!("Loaded settings from storage");
                return settings;
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        match crate::platform::LocalStore::open() {
            Ok(store) => Self::load_from(&store),
            Err(e) => {
                log::warn!("{}", e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::MemoryStore;

    #[test]
    fn test_reduced_motion_overrides_effects() {
        let settings = Settings {
            reduced_motion: true,
            ..Settings::default()
        };
        assert!(!settings.effective_dvd());
        assert!(!settings.effective_particles());
        assert!(!settings.effective_sparkles());
        assert!(!settings.dvd_config().sparkles);
    }

    #[test]
    fn test_muted_volume_is_zero() {
        let mut settings = Settings::default();
        assert_eq!(settings.effective_volume(), 0.8);
        settings.muted = true;
        assert_eq!(settings.effective_volume(), 0.0);
    }

    #[test]
    fn test_stored_settings_are_loaded() {
        let mut store = MemoryStore::new();
        let settings = Settings {
            sparkles: false,
            dvd_speed: [90.0, 60.0],
            ..Settings::default()
        };
        store
            .set("folio_settings", &serde_json::to_string(&settings).unwrap())
            .unwrap();
        assert_eq!(Settings::load_from(&store), settings);
    }

    #[test]
    fn test_garbage_settings_fall_back() {
        let mut store = MemoryStore::new();
        store.set("folio_settings", "[1, 2").unwrap();
        assert_eq!(Settings::load_from(&store), Settings::default());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let mut store = MemoryStore::new();
        store.set("folio_settings", r#"{"muted":true}"#).unwrap();
        let settings = Settings::load_from(&store);
        assert!(settings.muted);
        assert!(settings.particles);
        assert_eq!(settings.dvd_speed, [110.0, 85.0]);
    }

    #[test]
    fn test_dvd_config_sanitizes_speed_and_scale() {
        let settings = Settings {
            dvd_speed: [-50.0, f64::NAN],
            cruise_scale: 0.0,
            ..Settings::default()
        };
        let config = settings.dvd_config();
        assert_eq!(config.speed, DvdConfig::default().speed);
        assert_eq!(config.cruise_scale, 1.0);

        let config = Settings {
            dvd_speed: [-50.0, 40.0],
            ..Settings::default()
        }
        .dvd_config();
        assert_eq!(config.speed, DVec2::new(50.0, 40.0));
    }
}
