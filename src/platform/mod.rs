//! Platform abstraction layer
//!
//! Thin capability interface over the browser features the site treats as
//! optional:
//! - Key-value storage (LocalStorage on web, in-memory natively)
//! - Fullscreen
//!
//! Every call reports absence as `CapabilityUnavailable`; callers decide
//! whether to fall back or ignore it.

use std::collections::HashMap;
use std::fmt;

#[cfg(target_arch = "wasm32")]
pub mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{BrowserFullscreen, LocalStore};

/// Optional environment features
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Storage,
    Audio,
    Fullscreen,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::Storage => "storage",
            Capability::Audio => "audio",
            Capability::Fullscreen => "fullscreen",
        }
    }
}

/// A capability is missing or refused the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityUnavailable {
    pub capability: Capability,
    pub reason: String,
}

impl CapabilityUnavailable {
    pub fn new(capability: Capability, reason: impl Into<String>) -> Self {
        Self {
            capability,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for CapabilityUnavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} unavailable: {}", self.capability.as_str(), self.reason)
    }
}

impl std::error::Error for CapabilityUnavailable {}

/// Result of probing for a capability; a failed probe is never repeated
#[derive(Debug, Default)]
pub enum Detected<T> {
    #[default]
    Untried,
    Ready(T),
    Missing,
}

impl<T> Detected<T> {
    /// Run `probe` on first use only.
    ///
    /// The first failure comes back as `Err`; afterwards the capability is
    /// quietly absent (`Ok(None)`).
    pub fn get_or_detect(
        &mut self,
        probe: impl FnOnce() -> Result<T, CapabilityUnavailable>,
    ) -> Result<Option<&T>, CapabilityUnavailable> {
        if matches!(self, Detected::Untried) {
            match probe() {
                Ok(value) => *self = Detected::Ready(value),
                Err(e) => {
                    *self = Detected::Missing;
                    return Err(e);
                }
            }
        }
        Ok(self.ready())
    }

    pub fn ready(&self) -> Option<&T> {
        match self {
            Detected::Ready(value) => Some(value),
            Detected::Untried | Detected::Missing => None,
        }
    }
}

/// String key-value store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, CapabilityUnavailable>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), CapabilityUnavailable>;
    fn remove(&mut self, key: &str) -> Result<(), CapabilityUnavailable>;
}

/// Process-local store (native runs and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, CapabilityUnavailable> {
        Ok(self.items.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CapabilityUnavailable> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), CapabilityUnavailable> {
        self.items.remove(key);
        Ok(())
    }
}

/// Document fullscreen control
pub trait Fullscreen {
    fn is_fullscreen(&self) -> bool;
    fn toggle(&self) -> Result<(), CapabilityUnavailable>;
}

/// Fullscreen on a platform that has none
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFullscreen;

impl Fullscreen for NoFullscreen {
    fn is_fullscreen(&self) -> bool {
        false
    }

    fn toggle(&self) -> Result<(), CapabilityUnavailable> {
        Err(CapabilityUnavailable::new(Capability::Fullscreen, "not supported here"))
    }
}
