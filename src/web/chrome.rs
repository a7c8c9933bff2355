//! Site-wide page chrome: fade transitions, footer clock, gallery lightbox
//! and the essay table of contents

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlImageElement};

use super::{by_id, listen, query_all, set_style, toggle_class};
use crate::site::{self, LinkClick, Lightbox, NAVIGATION_DELAY_MS};

const CLOCK_INTERVAL_MS: i32 = 1000;

pub fn mount(document: &Document) {
    fade_in();
    mount_clock();
    bind_links(document);
    mount_lightbox(document);
    mount_toc(document);
}

/// Two frames so the initial opacity is painted before the transition
fn fade_in() {
    let Some(window) = web_sys::window() else { return };
    let inner = Closure::once_into_js(|| {
        if let Some(body) = super::document().and_then(|d| d.body()) {
            toggle_class(&body, "loaded", true);
        }
    });
    let outer = Closure::once_into_js(move || {
        if let Some(window) = web_sys::window() {
            let _ = window.request_animation_frame(inner.unchecked_ref());
        }
    });
    let _ = window.request_animation_frame(outer.unchecked_ref());
}

fn mount_clock() {
    let Some(el) = by_id("current-time") else { return };
    let Some(window) = web_sys::window() else { return };

    let update = move || {
        let now = js_sys::Date::new_0();
        el.set_text_content(Some(&site::clock_text(
            now.get_hours(),
            now.get_minutes(),
            now.get_seconds(),
        )));
    };
    update();

    let closure = Closure::<dyn FnMut()>::new(update);
    let _ = window.set_interval_with_callback_and_timeout_and_arguments_0(
        closure.as_ref().unchecked_ref(),
        CLOCK_INTERVAL_MS,
    );
    closure.forget();
}

fn bind_links(document: &Document) {
    for link in query_all(document, "a") {
        let Some(href) = link.get_attribute("href") else {
            continue;
        };
        if !site::is_internal_link(&href) {
            continue;
        }
        let anchor = link.clone();
        listen(&link, "click", move |event| {
            let Some(mouse) = event.dyn_ref::<web_sys::MouseEvent>() else {
                return;
            };
            let click = LinkClick {
                default_prevented: event.default_prevented(),
                button: mouse.button(),
                modifier: mouse.meta_key() || mouse.ctrl_key() || mouse.shift_key() || mouse.alt_key(),
                download: anchor.has_attribute("download"),
                target: anchor.get_attribute("target"),
            };
            if !site::should_intercept(&href, &click) {
                return;
            }
            event.prevent_default();
            navigate_after_fade(&href);
        });
    }
}

fn navigate_after_fade(href: &str) {
    let Some(window) = web_sys::window() else { return };
    if let Some(body) = window.document().and_then(|d| d.body()) {
        toggle_class(&body, "loaded", false);
        toggle_class(&body, "fade-out", true);
    }
    let href = href.to_string();
    let go = Closure::once_into_js(move || {
        if let Some(window) = web_sys::window() {
            let _ = window.location().set_href(&href);
        }
    });
    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(go.unchecked_ref(), NAVIGATION_DELAY_MS);
}

// === Lightbox ===

struct Gallery {
    sources: Vec<String>,
    lightbox: Lightbox,
}

fn show(gallery: &Gallery) {
    let Some(overlay) = by_id("lightbox") else { return };
    let body = super::document().and_then(|d| d.body());
    match gallery.lightbox.current().and_then(|i| gallery.sources.get(i)) {
        Some(src) => {
            if let Some(img) = by_id("lightbox-img").and_then(|el| el.dyn_into::<HtmlImageElement>().ok()) {
                img.set_src(src);
            }
            toggle_class(&overlay, "active", true);
            if let Some(body) = body {
                set_style(&body, "overflow", "hidden");
            }
        }
        None => {
            toggle_class(&overlay, "active", false);
            if let Some(body) = body {
                set_style(&body, "overflow", "auto");
            }
        }
    }
}

fn mount_lightbox(document: &Document) {
    let images: Vec<Element> = query_all(document, "#gallery img");
    if images.is_empty() || by_id("lightbox").is_none() {
        return;
    }
    let sources: Vec<String> = images
        .iter()
        .map(|img| img.get_attribute("src").unwrap_or_default())
        .collect();
    let gallery = Rc::new(RefCell::new(Gallery {
        lightbox: Lightbox::new(sources.len()),
        sources,
    }));

    for (index, img) in images.iter().enumerate() {
        let gallery = gallery.clone();
        listen(img, "click", move |_| {
            let mut g = gallery.borrow_mut();
            g.lightbox.open(index);
            show(&g);
        });
    }

    let step = |direction: i32, gallery: Rc<RefCell<Gallery>>| {
        move |_: web_sys::Event| {
            let mut g = gallery.borrow_mut();
            g.lightbox.step(direction);
            show(&g);
        }
    };
    if let Ok(Some(prev)) = document.query_selector(".prev-btn") {
        listen(&prev, "click", step(-1, gallery.clone()));
    }
    if let Ok(Some(next)) = document.query_selector(".next-btn") {
        listen(&next, "click", step(1, gallery.clone()));
    }

    let close = |gallery: Rc<RefCell<Gallery>>| {
        move || {
            let mut g = gallery.borrow_mut();
            g.lightbox.close();
            show(&g);
        }
    };
    if let Ok(Some(button)) = document.query_selector(".close-lightbox") {
        let close = close(gallery.clone());
        listen(&button, "click", move |_| close());
    }
    if let Some(overlay) = by_id("lightbox") {
        let close = close(gallery.clone());
        listen(&overlay, "click", move |event| {
            // Only the backdrop itself, not the image
            let on_backdrop = super::event_element(&event).is_some_and(|el| el.id() == "lightbox");
            if on_backdrop {
                close();
            }
        });
    }

    listen(document, "keydown", move |event| {
        let Some(key) = event.dyn_ref::<web_sys::KeyboardEvent>().map(|e| e.key()) else {
            return;
        };
        let mut g = gallery.borrow_mut();
        if !g.lightbox.is_open() {
            return;
        }
        match key.as_str() {
            "Escape" => g.lightbox.close(),
            "ArrowLeft" => {
                g.lightbox.step(-1);
            }
            "ArrowRight" => {
                g.lightbox.step(1);
            }
            _ => return,
        }
        show(&g);
    });
}

// === Table of contents ===

fn mount_toc(document: &Document) {
    let entries: Vec<(Element, Element)> = query_all(document, ".toc-item")
        .into_iter()
        .filter_map(|item| {
            let href = item.get_attribute("href")?;
            let section = document.get_element_by_id(href.strip_prefix('#')?)?;
            Some((item, section))
        })
        .collect();
    if entries.is_empty() {
        return;
    }

    let update = move || {
        let Some(window) = web_sys::window() else { return };
        let Some(body) = window.document().and_then(|d| d.body()) else {
            return;
        };
        let tops: Vec<f64> = entries
            .iter()
            .map(|(_, section)| section.get_bounding_client_rect().top())
            .collect();
        let viewport = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
        let scroll_y = window.scroll_y().unwrap_or(0.0);
        let active = site::active_section(&tops, viewport, scroll_y, f64::from(body.scroll_height()));
        for (i, (item, _)) in entries.iter().enumerate() {
            toggle_class(item, "active", Some(i) == active);
        }
    };
    update();

    if let Some(window) = web_sys::window() {
        listen(&window, "scroll", move |_| update());
    }
}
