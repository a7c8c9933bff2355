//! Interview timer page

use std::cell::RefCell;
use std::rc::Rc;

use glam::DVec2;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, HtmlElement, HtmlImageElement};

use super::{by_id, html_by_id, listen, query_all, set_style, set_text, toggle_class};
use crate::audio::AudioManager;
use crate::consts::TICK_INTERVAL_MS;
use crate::particles::ParticleBurst;
use crate::platform::{BrowserFullscreen, Fullscreen, KeyValueStore, LocalStore};
use crate::session::{Effect, ImageCue, TimerSession};
use crate::settings::Settings;
use crate::site::aria_flag;
use crate::timer::{Command, Mode, SystemClock};

const PARTICLE_COLOR: &str = "#111111";

struct TimerPage {
    session: TimerSession<SystemClock>,
    audio: AudioManager,
    fullscreen: Option<BrowserFullscreen>,
    tick: Option<(i32, Closure<dyn FnMut()>)>,
    cue_timeouts: Vec<i32>,
    frame_pending: bool,
    last_frame_ms: f64,
    logo: Option<HtmlElement>,
    /// Translation currently applied to the logo
    logo_offset: DVec2,
    /// Logo's layout position, translation removed
    logo_rest: DVec2,
    canvas: Option<(HtmlCanvasElement, CanvasRenderingContext2d)>,
    /// Image sources for the decorative sequence
    frames: Vec<String>,
}

type Shared = Rc<RefCell<TimerPage>>;

fn prefers_reduced_motion() -> bool {
    web_sys::window()
        .and_then(|w| w.match_media("(prefers-reduced-motion: reduce)").ok().flatten())
        .is_some_and(|mq| mq.matches())
}

fn particle_canvas() -> Option<(HtmlCanvasElement, CanvasRenderingContext2d)> {
    let canvas = by_id("particleCanvas")?.dyn_into::<HtmlCanvasElement>().ok()?;
    let ctx = canvas
        .get_context("2d")
        .ok()
        .flatten()?
        .dyn_into::<CanvasRenderingContext2d>()
        .ok()?;
    Some((canvas, ctx))
}

pub fn mount(document: &Document) {
    let mut settings = Settings::load();
    settings.reduced_motion |= prefers_reduced_motion();

    let store: Option<Box<dyn KeyValueStore>> = match LocalStore::open() {
        Ok(store) => Some(Box::new(store)),
        Err(e) => {
            log::warn!("Timer will not survive reloads: {}", e);
            None
        }
    };
    let fullscreen = BrowserFullscreen::detect()
        .map_err(|e| log::warn!("{}", e))
        .ok();

    let mut audio = AudioManager::new();
    audio.set_volume(settings.effective_volume());

    let frames = by_id("sequenceImage")
        .and_then(|el| el.get_attribute("data-frames"))
        .map(|list| {
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let page = Rc::new(RefCell::new(TimerPage {
        session: TimerSession::new(SystemClock, settings, store),
        audio,
        fullscreen,
        tick: None,
        cue_timeouts: Vec::new(),
        frame_pending: false,
        last_frame_ms: 0.0,
        logo: html_by_id("dvdLogo"),
        logo_offset: DVec2::ZERO,
        logo_rest: DVec2::ZERO,
        canvas: particle_canvas(),
        frames,
    }));

    if let Some(logo) = &page.borrow().logo {
        // Keeps the bounding box's top-left on the translated point
        set_style(logo, "transform-origin", "top left");
    }
    bind_controls(document, &page);
    layout(&page);

    let effects = page.borrow_mut().session.resume();
    apply_effects(&page, effects);
    render(&page);
    log::info!("Timer page ready");
}

fn bind_controls(document: &Document, page: &Shared) {
    let buttons: [(&str, Command); 5] = [
        ("startPauseButton", Command::ToggleStartPause),
        ("resetButton", Command::Reset),
        ("minusMinuteButton", Command::AdjustMinutes(-1)),
        ("plusMinuteButton", Command::AdjustMinutes(1)),
        ("fullscreenButton", Command::ToggleFullscreen),
    ];
    for (id, command) in buttons {
        if let Some(button) = document.get_element_by_id(id) {
            let page = page.clone();
            listen(&button, "click", move |_| dispatch(&page, command));
        }
    }

    for button in query_all(document, ".mode-button") {
        let Some(mode) = button.get_attribute("data-mode").and_then(|m| Mode::from_key(&m)) else {
            continue;
        };
        let page = page.clone();
        listen(&button, "click", move |_| dispatch(&page, Command::SetMode(mode)));
    }

    if let Some(window) = web_sys::window() {
        {
            let page = page.clone();
            listen(&window, "resize", move |_| {
                layout(&page);
                render(&page);
            });
        }
        {
            let page = page.clone();
            listen(&window, "keydown", move |event| {
                let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
                    return;
                };
                if event.repeat() {
                    return;
                }
                if matches!(event.key().as_str(), "f" | "F") {
                    dispatch(&page, Command::ToggleFullscreen);
                }
            });
        }
    }

    // Background tabs throttle the interval; catch up on return
    {
        let page = page.clone();
        listen(document, "visibilitychange", move |_| {
            let effects = page.borrow_mut().session.on_tick();
            apply_effects(&page, effects);
            render(&page);
        });
    }
}

fn dispatch(page: &Shared, command: Command) {
    let effects = {
        let mut p = page.borrow_mut();
        if let Err(e) = p.audio.unlock() {
            log::warn!("{}", e);
        }
        p.session.dispatch(command)
    };
    apply_effects(page, effects);
    render(page);
}

/// Measure the viewport and logo, then hand them to the session
fn layout(page: &Shared) {
    let Some(window) = web_sys::window() else { return };
    let width = window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);
    let height = window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(0.0);

    let effects = {
        let mut p = page.borrow_mut();
        if let Some((canvas, _)) = &p.canvas {
            canvas.set_width(width as u32);
            canvas.set_height(height as u32);
        }
        match p.logo.clone() {
            Some(logo) => {
                let rect = logo.get_bounding_client_rect();
                let size = DVec2::new(f64::from(logo.offset_width()), f64::from(logo.offset_height()));
                // Layout position, without the translation we applied
                let rest = DVec2::new(rect.left(), rect.top()) - p.logo_offset;
                p.logo_rest = rest;
                p.session.set_layout(DVec2::new(width, height), size, rest)
            }
            None => {
                p.session.disable_logo();
                Vec::new()
            }
        }
    };
    apply_effects(page, effects);
}

fn apply_effects(page: &Shared, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::PlayChime(chime) => page.borrow().audio.play(chime),
            Effect::ToggleFullscreen => {
                if let Some(fs) = &page.borrow().fullscreen {
                    if let Err(e) = fs.toggle() {
                        log::warn!("{}", e);
                    }
                }
            }
            Effect::StartTicking => start_ticking(page),
            Effect::StopTicking => stop_ticking(page),
            Effect::RequestFrame => {
                let mut p = page.borrow_mut();
                if !p.frame_pending {
                    p.frame_pending = true;
                    drop(p);
                    request_animation_frame(page.clone());
                }
            }
            Effect::ScheduleCues { generation, cues } => schedule_cues(page, generation, &cues),
            Effect::CancelCues => cancel_cues(page),
        }
    }
}

fn start_ticking(page: &Shared) {
    stop_ticking(page);
    let Some(window) = web_sys::window() else { return };

    let tick_page = page.clone();
    let closure = Closure::<dyn FnMut()>::new(move || {
        let effects = tick_page.borrow_mut().session.on_tick();
        apply_effects(&tick_page, effects);
        render(&tick_page);
    });
    match window.set_interval_with_callback_and_timeout_and_arguments_0(
        closure.as_ref().unchecked_ref(),
        TICK_INTERVAL_MS,
    ) {
        Ok(id) => page.borrow_mut().tick = Some((id, closure)),
        Err(e) => log::warn!("Could not start ticking: {:?}", e),
    }
}

fn stop_ticking(page: &Shared) {
    let tick = page.borrow_mut().tick.take();
    if let (Some((id, _closure)), Some(window)) = (tick, web_sys::window()) {
        window.clear_interval_with_handle(id);
    }
}

fn schedule_cues(page: &Shared, generation: u64, cues: &[ImageCue]) {
    let Some(window) = web_sys::window() else { return };
    for cue in cues {
        let cue_page = page.clone();
        let frame = cue.frame;
        let callback = Closure::once_into_js(move || {
            let shown = cue_page.borrow_mut().session.on_cue(generation, frame);
            if shown {
                render(&cue_page);
            }
        });
        match window.set_timeout_with_callback_and_timeout_and_arguments_0(
            callback.unchecked_ref(),
            cue.delay_ms.round() as i32,
        ) {
            Ok(id) => page.borrow_mut().cue_timeouts.push(id),
            Err(e) => log::warn!("Could not schedule image cue: {:?}", e),
        }
    }
}

fn cancel_cues(page: &Shared) {
    let ids = std::mem::take(&mut page.borrow_mut().cue_timeouts);
    if let Some(window) = web_sys::window() {
        for id in ids {
            window.clear_timeout_with_handle(id);
        }
    }
}

fn request_animation_frame(page: Shared) {
    let Some(window) = web_sys::window() else { return };
    let closure = Closure::<dyn FnMut(f64)>::once(move |time: f64| frame(page, time));
    let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
    closure.forget();
}

fn frame(page: Shared, time: f64) {
    let effects = {
        let mut p = page.borrow_mut();
        p.frame_pending = false;
        let dt = if p.last_frame_ms > 0.0 {
            ((time - p.last_frame_ms) / 1000.0) as f32
        } else {
            1.0 / 60.0
        };
        p.last_frame_ms = time;
        p.session.on_frame(dt)
    };
    render(&page);

    if !effects.contains(&Effect::RequestFrame) {
        // Loop stops; the next one starts with a fresh delta
        page.borrow_mut().last_frame_ms = 0.0;
    }
    apply_effects(&page, effects);
}

fn render(page: &Shared) {
    let mut p = page.borrow_mut();
    let view = p.session.view();

    set_text("timerModeLabel", view.mode.label());
    set_text("timerDisplay", &view.time_text);
    set_text("timerStatus", view.status.text());
    if let Some(button) = by_id("startPauseButton") {
        button.set_text_content(Some(view.start_pause_label()));
        let _ = button.set_attribute("aria-pressed", aria_flag(view.running));
    }
    if let Some(fill) = html_by_id("progressFill") {
        set_style(&fill, "width", &format!("{}%", view.progress_percent));
    }
    if let Some(document) = super::document() {
        for button in query_all(&document, ".mode-button") {
            let active = button
                .get_attribute("data-mode")
                .is_some_and(|key| view.is_mode_selected(&key));
            toggle_class(&button, "is-active", active);
            let _ = button.set_attribute("aria-selected", aria_flag(active));
        }
    }

    if let Some(logo) = p.logo.clone() {
        let offset = if p.session.sequencer().is_enabled() {
            view.logo.position - p.logo_rest
        } else {
            DVec2::ZERO
        };
        set_style(
            &logo,
            "transform",
            &format!(
                "translate({:.2}px, {:.2}px) scale({:.4})",
                offset.x, offset.y, view.logo.scale
            ),
        );
        p.logo_offset = offset;
    }

    if let Some((canvas, ctx)) = &p.canvas {
        draw_particles(canvas, ctx, p.session.burst());
    }

    if let Some(img) = by_id("sequenceImage").and_then(|el| el.dyn_into::<HtmlImageElement>().ok()) {
        match view.image_frame.and_then(|i| p.frames.get(i)) {
            Some(src) => {
                if img.get_attribute("src").as_deref() != Some(src.as_str()) {
                    img.set_src(src);
                }
                toggle_class(&img, "visible", true);
            }
            None => toggle_class(&img, "visible", false),
        }
    }
}

fn draw_particles(canvas: &HtmlCanvasElement, ctx: &CanvasRenderingContext2d, burst: &ParticleBurst) {
    ctx.clear_rect(0.0, 0.0, f64::from(canvas.width()), f64::from(canvas.height()));
    if burst.is_empty() {
        return;
    }
    ctx.set_fill_style_str(PARTICLE_COLOR);
    for p in burst.particles() {
        let size = f64::from(p.size);
        ctx.set_global_alpha(f64::from(p.alpha()));
        ctx.fill_rect(
            f64::from(p.pos.x) - size / 2.0,
            f64::from(p.pos.y) - size / 2.0,
            size,
            size,
        );
    }
    ctx.set_global_alpha(1.0);
}
