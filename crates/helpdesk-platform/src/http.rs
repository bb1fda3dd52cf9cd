//! Backend transport over browser `fetch()` via gloo-net.

use async_trait::async_trait;
use gloo_net::http::{Request, Response};
use serde_json::Value;

use helpdesk_core::ports::HttpPort;
use helpdesk_types::{config::ClientConfig, HelpdeskError, Result};

/// JSON-over-HTTP client bound to the configured backend origin.
pub struct GlooHttp {
    config: ClientConfig,
}

impl GlooHttp {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }
}

#[async_trait(?Send)]
impl HttpPort for GlooHttp {
    async fn get(&self, path: &str, bearer: &str) -> Result<Value> {
        let url = self.config.url_for(path);
        let response = Request::get(&url)
            .header("Authorization", &format!("Bearer {}", bearer))
            .send()
            .await
            .map_err(|e| HelpdeskError::Network(e.to_string()))?;
        read_body(response).await
    }

    async fn post(&self, path: &str, bearer: &str, body: &Value) -> Result<Value> {
        let url = self.config.url_for(path);
        let response = Request::post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", &format!("Bearer {}", bearer))
            .json(body)
            .map_err(|e| HelpdeskError::Serialization(e.to_string()))?
            .send()
            .await
            .map_err(|e| HelpdeskError::Network(e.to_string()))?;
        read_body(response).await
    }
}

/// Decode a response body. Empty bodies become `null`; a body that is not
/// JSON (some mutation endpoints answer with plain text) is kept as a
/// string.
async fn read_body(response: Response) -> Result<Value> {
    if !response.ok() {
        let status = response.status();
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "unknown error".to_string());
        return Err(HelpdeskError::from_status(status, text));
    }

    let text = response
        .text()
        .await
        .map_err(|e| HelpdeskError::Network(e.to_string()))?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}
