//! Browser wiring
//!
//! Each page mounts only the pieces whose elements it actually has, so the
//! same bundle serves the timer, the Task Atlas and the plain pages.

mod atlas;
mod chrome;
mod timer;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, EventTarget, HtmlElement};

/// Mount everything the current page supports
pub async fn start() {
    let Some(document) = document() else {
        log::warn!("No document; nothing to mount");
        return;
    };

    chrome::mount(&document);

    if document.get_element_by_id("timerDisplay").is_some() {
        timer::mount(&document);
    }
    if document.get_element_by_id("atlas-dwa-tbody").is_some() {
        atlas::mount(&document).await;
    }
}

// === DOM helpers ===

pub(crate) fn document() -> Option<Document> {
    web_sys::window().and_then(|w| w.document())
}

pub(crate) fn by_id(id: &str) -> Option<Element> {
    document().and_then(|d| d.get_element_by_id(id))
}

pub(crate) fn html_by_id(id: &str) -> Option<HtmlElement> {
    by_id(id).and_then(|el| el.dyn_into::<HtmlElement>().ok())
}

pub(crate) fn set_text(id: &str, text: &str) {
    if let Some(el) = by_id(id) {
        el.set_text_content(Some(text));
    }
}

pub(crate) fn set_html(id: &str, html: &str) {
    if let Some(el) = by_id(id) {
        el.set_inner_html(html);
    }
}

pub(crate) fn set_style(el: &HtmlElement, property: &str, value: &str) {
    let _ = el.style().set_property(property, value);
}

pub(crate) fn toggle_class(el: &Element, class: &str, on: bool) {
    let _ = el.class_list().toggle_with_force(class, on);
}

/// Every element matching `selector`
pub(crate) fn query_all(root: &Document, selector: &str) -> Vec<Element> {
    let Ok(list) = root.query_selector_all(selector) else {
        return Vec::new();
    };
    (0..list.length())
        .filter_map(|i| list.item(i))
        .filter_map(|node| node.dyn_into::<Element>().ok())
        .collect()
}

/// Event target as an element, for delegated handlers
pub(crate) fn event_element(event: &web_sys::Event) -> Option<Element> {
    event.target().and_then(|t| t.dyn_into::<Element>().ok())
}

/// Nearest ancestor-or-self of the event target matching `selector`
pub(crate) fn closest(event: &web_sys::Event, selector: &str) -> Option<Element> {
    event_element(event).and_then(|el| el.closest(selector).ok().flatten())
}

/// Attach a listener for the life of the page
pub(crate) fn listen(target: &EventTarget, event: &str, handler: impl FnMut(web_sys::Event) + 'static) {
    let closure = Closure::<dyn FnMut(web_sys::Event)>::new(handler);
    if let Err(e) = target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref()) {
        log::warn!("Could not listen for {}: {:?}", event, e);
    }
    closure.forget();
}

pub(crate) fn js_reason(err: &JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{:?}", err))
}
