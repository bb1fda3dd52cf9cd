//! Helpdesk client: WASM entry point and composition root.
//!
//! The host page provides a `<canvas id="helpdesk_canvas">` and, for
//! sign-in, a `window.helpdeskIdentity` bridge.

mod app;
mod startup;


use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlCanvasElement;

const CANVAS_ID: &str = "helpdesk_canvas";

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let level = if cfg!(debug_assertions) {
        log::Level::Debug
    } else {
        log::Level::Info
    };
    wasm_logger::init(wasm_logger::Config::new(level));
    log::info!("Helpdesk client {} starting", env!("CARGO_PKG_VERSION"));

    let canvas = find_canvas(CANVAS_ID)?;
    wasm_bindgen_futures::spawn_local(async move {
        let started = eframe::WebRunner::new()
            .start(
                canvas,
                eframe::WebOptions::default(),
                Box::new(|cc| Ok(Box::new(app::HelpdeskApp::new(cc)))),
            )
            .await;
        if let Err(e) = started {
            log::error!("Could not start the UI: {:?}", e);
        }
    });
    Ok(())
}

fn find_canvas(id: &str) -> Result<HtmlCanvasElement, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("no element with id '{}'", id)))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str(&format!("element '{}' is not a canvas", id)))
}
