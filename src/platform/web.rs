//! Browser implementations of the capability traits

use wasm_bindgen::JsValue;

use super::{Capability, CapabilityUnavailable, Fullscreen, KeyValueStore};

fn js_reason(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}

/// `window.localStorage`
pub struct LocalStore {
    storage: web_sys::Storage,
}

impl LocalStore {
    /// Detect LocalStorage once; private modes and sandboxed frames refuse it
    pub fn open() -> Result<Self, CapabilityUnavailable> {
        let window = web_sys::window()
            .ok_or_else(|| CapabilityUnavailable::new(Capability::Storage, "no window"))?;
        let storage = window
            .local_storage()
            .map_err(|e| CapabilityUnavailable::new(Capability::Storage, js_reason(&e)))?
            .ok_or_else(|| CapabilityUnavailable::new(Capability::Storage, "localStorage missing"))?;
        Ok(Self { storage })
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Result<Option<String>, CapabilityUnavailable> {
        self.storage
            .get_item(key)
            .map_err(|e| CapabilityUnavailable::new(Capability::Storage, js_reason(&e)))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), CapabilityUnavailable> {
        // Quota errors land here
        self.storage
            .set_item(key, value)
            .map_err(|e| CapabilityUnavailable::new(Capability::Storage, js_reason(&e)))
    }

    fn remove(&mut self, key: &str) -> Result<(), CapabilityUnavailable> {
        self.storage
            .remove_item(key)
            .map_err(|e| CapabilityUnavailable::new(Capability::Storage, js_reason(&e)))
    }
}

/// Fullscreen API on the document element
pub struct BrowserFullscreen {
    document: web_sys::Document,
}

impl BrowserFullscreen {
    pub fn detect() -> Result<Self, CapabilityUnavailable> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| CapabilityUnavailable::new(Capability::Fullscreen, "no document"))?;
        if !document.fullscreen_enabled() {
            return Err(CapabilityUnavailable::new(Capability::Fullscreen, "disabled by the page"));
        }
        Ok(Self { document })
    }
}

impl Fullscreen for BrowserFullscreen {
    fn is_fullscreen(&self) -> bool {
        self.document.fullscreen_element().is_some()
    }

    fn toggle(&self) -> Result<(), CapabilityUnavailable> {
        if self.is_fullscreen() {
            self.document.exit_fullscreen();
            return Ok(());
        }
        let root = self
            .document
            .document_element()
            .ok_or_else(|| CapabilityUnavailable::new(Capability::Fullscreen, "no root element"))?;
        root.request_fullscreen()
            .map_err(|e| CapabilityUnavailable::new(Capability::Fullscreen, js_reason(&e)))
    }
}
