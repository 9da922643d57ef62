//! Admin Dashboard
//!
//! Browser binding of the `panel` crate. Wires the edit dialogs, the two
//! document tables and the training console to the server-rendered page.
//! The page handlers (`openUrlModal`, `filterAndSort`, ...) are also set on
//! `window` so inline `onclick`/`oninput` attributes keep working.

mod config;
mod dom;
mod modals;
mod tables;
mod trainer;


use dom::report;
use panel::PanelConfig;
use std::cell::Cell;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Window;

pub use trainer::{button_appearance, ButtonAppearance};

thread_local! {
    static GLOBALS_EXPOSED: Cell<bool> = const { Cell::new(false) };
}

/// Initialize the dashboard once the document is parsed
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Set up panic hook for better error messages in WASM
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    let document = dom::document()?;
    if document.ready_state() != "loading" {
        return init();
    }

    let ready_closure = Closure::once(move || {
        report("dashboard init", init());
    });
    document.add_event_listener_with_callback(
        "DOMContentLoaded",
        ready_closure.as_ref().unchecked_ref(),
    )?;
    ready_closure.forget();

    Ok(())
}

/// Replace the page configuration (JSON, missing sections keep their
/// defaults) and initialize again
#[wasm_bindgen(js_name = initWithConfig)]
pub fn init_with_config(json: &str) -> Result<(), JsValue> {
    let config = PanelConfig::from_json(json).map_err(|e| JsValue::from_str(&e.to_string()))?;
    config::replace(config);
    init()
}

fn init() -> Result<(), JsValue> {
    let window = web_sys::window().ok_or("No window")?;
    let document = window.document().ok_or("No document")?;
    let config = config::current();

    modals::install(&document, config.modals.clone())?;
    expose_globals(&window)?;

    // Pages without one of the tables still get the rest of the dashboard
    for spec in &config.tables {
        match tables::refresh(&document, spec) {
            Ok(summary) => dom::log(&format!(
                "{}: {} shown, {} hidden, {} sorted",
                spec.kind, summary.shown, summary.hidden, summary.sorted
            )),
            Err(e) => dom::log(&format!("{}: skipped ({})", spec.kind, dom::describe(&e))),
        }
    }

    Ok(())
}

/// Fill the URL edit form and show its dialog
#[wasm_bindgen(js_name = openUrlModal)]
pub fn open_url_modal(name: &str, url: &str) -> Result<(), JsValue> {
    modals::open_url(name, url)
}

/// Fill the PDF rename form and show its dialog
#[wasm_bindgen(js_name = openPdfModal)]
pub fn open_pdf_modal(filename: &str) -> Result<(), JsValue> {
    modals::open_pdf(filename)
}

/// Apply the search box and sort selector of the table registered as `kind`
#[wasm_bindgen(js_name = filterAndSort)]
pub fn filter_and_sort(kind: &str) -> Result<(), JsValue> {
    let config = config::current();
    let spec = config
        .table(kind)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    tables::refresh(&dom::document()?, spec)?;
    Ok(())
}

#[wasm_bindgen(js_name = startTraining)]
pub fn start_training() -> Result<(), JsValue> {
    trainer::start()
}

#[wasm_bindgen(js_name = finishTrainingProcess)]
pub fn finish_training_process() -> Result<(), JsValue> {
    trainer::finish()
}

/// Publish the page handlers as `window` globals
fn expose_globals(window: &Window) -> Result<(), JsValue> {
    if GLOBALS_EXPOSED.with(|g| g.replace(true)) {
        return Ok(());
    }

    let open_url = Closure::wrap(Box::new(|name: String, url: String| {
        report("openUrlModal", open_url_modal(&name, &url));
    }) as Box<dyn Fn(String, String)>);
    js_sys::Reflect::set(window, &"openUrlModal".into(), open_url.as_ref())?;
    open_url.forget();

    let open_pdf = Closure::wrap(Box::new(|filename: String| {
        report("openPdfModal", open_pdf_modal(&filename));
    }) as Box<dyn Fn(String)>);
    js_sys::Reflect::set(window, &"openPdfModal".into(), open_pdf.as_ref())?;
    open_pdf.forget();

    let filter = Closure::wrap(Box::new(|kind: String| {
        report("filterAndSort", filter_and_sort(&kind));
    }) as Box<dyn Fn(String)>);
    js_sys::Reflect::set(window, &"filterAndSort".into(), filter.as_ref())?;
    filter.forget();

    let train = Closure::wrap(Box::new(|| {
        report("startTraining", start_training());
    }) as Box<dyn Fn()>);
    js_sys::Reflect::set(window, &"startTraining".into(), train.as_ref())?;
    train.forget();

    let finish = Closure::wrap(Box::new(|| {
        report("finishTrainingProcess", finish_training_process());
    }) as Box<dyn Fn()>);
    js_sys::Reflect::set(window, &"finishTrainingProcess".into(), finish.as_ref())?;
    finish.forget();

    Ok(())
}
