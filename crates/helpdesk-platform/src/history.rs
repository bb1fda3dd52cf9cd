//! Address-bar sync for client-side routes (`history.pushState`).

use wasm_bindgen::JsValue;

use helpdesk_types::{route::Route, HelpdeskError, Result};

/// Route for the page's current path; `Login` outside a browser.
pub fn current_route() -> Route {
    web_sys::window()
        .and_then(|w| w.location().pathname().ok())
        .map(|path| Route::parse(&path))
        .unwrap_or(Route::Login)
}

/// Push `route` onto the browser history unless it is already current.
pub fn push_route(route: Route) -> Result<()> {
    let window = web_sys::window()
        .ok_or_else(|| HelpdeskError::JsInterop("No window object".to_string()))?;
    let path = route.path();
    if window.location().pathname().ok().as_deref() == Some(path.as_str()) {
        return Ok(());
    }
    window
        .history()
        .map_err(|e| HelpdeskError::JsInterop(format!("{:?}", e)))?
        .push_state_with_url(&JsValue::NULL, "", Some(&path))
        .map_err(|e| HelpdeskError::JsInterop(format!("{:?}", e)))
}
