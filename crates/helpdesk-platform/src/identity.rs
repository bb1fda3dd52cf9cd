//! Identity provider adapter.
//!
//! The OIDC library lives in the host page. It is exposed to the client as
//! `window.helpdeskIdentity`, an object with three promise-returning
//! functions, each called with the [`IdentityConfig`] as its argument:
//!
//! ```text
//! signIn(config)             → { accessToken, expiresOn }   // popup/redirect
//! acquireTokenSilent(config) → { accessToken, expiresOn }   // cached account
//! signOut(config)            → undefined
//! ```
//!
//! `expiresOn` is epoch milliseconds. A rejection whose `name` is
//! `InteractionRequiredAuthError` (or whose `errorCode` is one of the OIDC
//! interaction codes) maps to `HelpdeskError::InteractionRequired`.

use async_trait::async_trait;
use chrono::DateTime;
use gloo_utils::format::JsValueSerdeExt;
use js_sys::{Function, Promise, Reflect};
use serde::Deserialize;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

use helpdesk_core::ports::IdentityPort;
use helpdesk_types::{config::IdentityConfig, session::Credential, HelpdeskError, Result};

const BRIDGE_GLOBAL: &str = "helpdeskIdentity";

const INTERACTION_CODES: &[&str] = &["interaction_required", "login_required", "consent_required"];

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenPayload {
    access_token: String,
    expires_on: f64,
}

pub struct JsIdentityBridge {
    config: IdentityConfig,
}

impl JsIdentityBridge {
    pub fn new(config: IdentityConfig) -> Self {
        Self { config }
    }

    fn bridge() -> Result<JsValue> {
        let window = web_sys::window()
            .ok_or_else(|| HelpdeskError::JsInterop("No window object".to_string()))?;
        let bridge = Reflect::get(&window, &JsValue::from_str(BRIDGE_GLOBAL))
            .map_err(|e| HelpdeskError::JsInterop(format!("{:?}", e)))?;
        if bridge.is_undefined() || bridge.is_null() {
            return Err(HelpdeskError::JsInterop(format!(
                "window.{} is not installed",
                BRIDGE_GLOBAL
            )));
        }
        Ok(bridge)
    }

    async fn call(&self, method: &str) -> Result<JsValue> {
        let bridge = Self::bridge()?;
        let func: Function = Reflect::get(&bridge, &JsValue::from_str(method))
            .map_err(|e| HelpdeskError::JsInterop(format!("{:?}", e)))?
            .dyn_into()
            .map_err(|_| HelpdeskError::JsInterop(format!("{}.{} is not a function", BRIDGE_GLOBAL, method)))?;
        let arg = JsValue::from_serde(&self.config)?;
        let promise: Promise = func
            .call1(&bridge, &arg)
            .map_err(map_rejection)?
            .dyn_into()
            .map_err(|_| HelpdeskError::JsInterop(format!("{} did not return a promise", method)))?;
        JsFuture::from(promise).await.map_err(map_rejection)
    }

    async fn token(&self, method: &str) -> Result<Credential> {
        let value = self.call(method).await?;
        let payload: TokenPayload = value
            .into_serde()
            .map_err(|e| HelpdeskError::JsInterop(format!("{} returned an invalid token: {}", method, e)))?;
        let expires_at = DateTime::from_timestamp_millis(payload.expires_on as i64)
            .ok_or_else(|| HelpdeskError::JsInterop(format!("invalid expiresOn {}", payload.expires_on)))?;
        Ok(Credential::new(payload.access_token, expires_at))
    }
}

#[async_trait(?Send)]
impl IdentityPort for JsIdentityBridge {
    async fn sign_in_interactive(&self) -> Result<Credential> {
        self.token("signIn").await
    }

    async fn acquire_token_silent(&self) -> Result<Credential> {
        self.token("acquireTokenSilent").await
    }

    async fn sign_out(&self) -> Result<()> {
        self.call("signOut").await.map(|_| ())
    }
}

fn js_string(value: &JsValue, key: &str) -> Option<String> {
    if !value.is_object() {
        return None;
    }
    Reflect::get(value, &JsValue::from_str(key))
        .ok()
        .and_then(|v| v.as_string())
}

fn map_rejection(err: JsValue) -> HelpdeskError {
    let message = js_string(&err, "message")
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{:?}", err));
    let interaction = js_string(&err, "name").as_deref() == Some("InteractionRequiredAuthError")
        || js_string(&err, "errorCode").is_some_and(|code| INTERACTION_CODES.contains(&code.as_str()));
    if interaction {
        HelpdeskError::InteractionRequired(message)
    } else {
        HelpdeskError::JsInterop(message)
    }
}
