//! Folio entry point
//!
//! On the web this mounts whatever the current page supports. Natively it is
//! a small headless tool for exercising the timer and the atlas pipeline.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("Logger already set: {}", e).into());
    }
    log::info!("Folio starting...");
    folio::web::start().await;
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let result = match args.first().map(String::as_str) {
        Some("simulate") => native::simulate(&args[1..]),
        Some("atlas") => native::atlas(&args[1..]),
        _ => {
            native::usage();
            Ok(())
        }
    };
    if let Err(e) = result {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use glam::DVec2;

    use folio::atlas::format::{fmt_currency_compact, fmt_pct};
    use folio::atlas::{Atlas, Exposure};
    use folio::platform::MemoryStore;
    use folio::session::Effect;
    use folio::timer::{Command, ManualClock, Mode};
    use folio::{Settings, TimerSession};

    const VIEWPORT: DVec2 = DVec2::new(1280.0, 720.0);
    const LOGO_SIZE: DVec2 = DVec2::new(120.0, 54.0);
    const LOGO_REST: DVec2 = DVec2::new(24.0, 24.0);

    pub fn usage() {
        println!("usage:");
        println!("  folio simulate [caseWork|presentation] [--step SECONDS]");
        println!("  folio atlas <task_atlas.json>");
    }

    /// Run a countdown to the end on a manual clock, printing what happens
    pub fn simulate(args: &[String]) -> Result<(), String> {
        let mut mode = Mode::CaseWork;
        let mut step_seconds = 1.0;
        let mut rest = args.iter();
        while let Some(arg) = rest.next() {
            match arg.as_str() {
                "--step" => {
                    let value = rest.next().ok_or("--step needs a value")?;
                    step_seconds = value
                        .parse::<f64>()
                        .ok()
                        .filter(|s| *s > 0.0)
                        .ok_or_else(|| format!("bad step: {}", value))?;
                }
                key => mode = Mode::from_key(key).ok_or_else(|| format!("unknown mode: {}", key))?,
            }
        }

        let mut session = TimerSession::new(
            ManualClock::new(0.0),
            Settings::default(),
            Some(Box::new(MemoryStore::new())),
        );
        session.dispatch(Command::SetMode(mode));
        session.set_layout(VIEWPORT, LOGO_SIZE, LOGO_REST);
        let effects = session.dispatch(Command::Start);
        report(&session, &effects);

        let mut phase = session.sequencer().phase();
        while session.countdown().running {
            session.clock().advance(step_seconds * 1000.0);
            let mut effects = session.on_tick();
            effects.extend(session.on_frame(step_seconds as f32));
            if session.sequencer().phase() != phase {
                phase = session.sequencer().phase();
                let view = session.view();
                println!(
                    "{}  logo -> {:?} at ({:.1}, {:.1})",
                    view.time_text, phase, view.logo.position.x, view.logo.position.y
                );
            }
            report(&session, &effects);
        }

        // Let the return glide finish
        for _ in 0..10 {
            session.clock().advance(200.0);
            session.on_frame(0.2);
        }
        let view = session.view();
        println!("{}  {:?}, {}", view.time_text, view.logo.phase, view.status.text());
        Ok(())
    }

    fn report(session: &TimerSession<ManualClock>, effects: &[Effect]) {
        let view = session.view();
        for effect in effects {
            match effect {
                Effect::PlayChime(chime) => println!("{}  chime {:?}", view.time_text, chime),
                Effect::ScheduleCues { cues, .. } => {
                    println!("{}  {} image cues armed", view.time_text, cues.len())
                }
                Effect::StartTicking => println!("{}  {}", view.time_text, view.status.text()),
                _ => {}
            }
        }
    }

    /// Summarize a Task Atlas payload
    pub fn atlas(args: &[String]) -> Result<(), String> {
        let path = args.first().ok_or("atlas needs a file path")?;
        let text = std::fs::read_to_string(path).map_err(|e| format!("{}: {}", path, e))?;
        let atlas = Atlas::from_json(&text).map_err(|e| e.to_string())?;
        let d = &atlas.derived;

        println!("activities:   {}", atlas.data.activities.len());
        println!("occupations:  {}", atlas.data.occupations.len());
        println!("allocations:  {}", atlas.data.allocations.len());
        println!("total value:  {}", fmt_currency_compact(d.total_value));
        println!("median value: {}", fmt_currency_compact(d.median_value));
        println!(
            "top 10/100/500 share: {}% / {}% / {}%",
            fmt_pct(d.top10_share, 1),
            fmt_pct(d.top100_share, 1),
            fmt_pct(d.top500_share, 1)
        );
        println!("weighted exposure: {}", fmt_pct(d.weighted_ai, 1));
        for cat in Exposure::ORDER {
            let total = d.category(cat);
            println!(
                "  {:<12} {:>10} {:>6}%  ({} activities)",
                cat.label(),
                fmt_currency_compact(total.value),
                fmt_pct(d.category_share(cat), 2),
                total.count
            );
        }
        Ok(())
    }
}
