//! Folio - interactive pieces of a personal site
//!
//! Core modules:
//! - `timer`: Interview countdown (clock source, commands, state transitions)
//! - `dvd`: Bouncing-logo easter egg (billiard solver, phase sequencer)
//! - `particles`: Corner-impact particle bursts
//! - `session`: Owned page session wiring timer, logo, particles and storage
//! - `persistence`: Best-effort snapshot of the countdown across reloads
//! - `platform`: Browser/native capability abstraction
//! - `atlas`: Task Atlas dataset normalization and table queries
//! - `site`: Page chrome helpers (link fade, lightbox, table of contents)

pub mod atlas;
pub mod audio;
pub mod dvd;
pub mod particles;
pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod site;
pub mod timer;

#[cfg(target_arch = "wasm32")]
pub mod web;

pub use session::TimerSession;
pub use settings::Settings;

/// Site-wide constants
pub mod consts {
    /// Case Work countdown length (seconds)
    pub const CASE_WORK_SECONDS: u32 = 45 * 60;
    /// Presentation countdown length (seconds)
    pub const PRESENTATION_SECONDS: u32 = 5 * 60;

    /// Periodic tick interval for reconciling the countdown (ms)
    pub const TICK_INTERVAL_MS: i32 = 200;

    /// Remaining time at which the logo hits its first corner (seconds)
    pub const FIRST_CORNER_SECONDS: f64 = 16.0 * 60.0;
    /// Remaining time at which the logo lands on its final corner (seconds)
    pub const FINAL_CORNER_SECONDS: f64 = 60.0;

    /// Return-to-origin animation length (ms)
    pub const RETURN_DURATION_MS: f64 = 1200.0;
    /// Pixel distance counted as touching a corner
    pub const CORNER_TOLERANCE_PX: f64 = 2.0;
    /// Minimum gap between two sparkle bursts (ms)
    pub const SPARKLE_THROTTLE_MS: f64 = 450.0;

    /// Downward acceleration applied to particles (px/s²)
    pub const PARTICLE_GRAVITY: f32 = 900.0;
    /// Base launch speed band for particles (px/s)
    pub const PARTICLE_SPEED_MIN: f32 = 140.0;
    pub const PARTICLE_SPEED_MAX: f32 = 380.0;
    /// Base particle size band (px)
    pub const PARTICLE_SIZE_MIN: f32 = 2.0;
    pub const PARTICLE_SIZE_MAX: f32 = 5.0;

    /// Largest frame delta fed to the particle integrator (s)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Image sequence starts this long before the countdown ends (seconds)
    pub const IMAGE_SEQUENCE_OFFSET_SECONDS: u32 = 30;
}

/// Linear interpolation between `a` and `b`
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Cubic ease-out on `t` in [0, 1]
#[inline]
pub fn ease_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}
