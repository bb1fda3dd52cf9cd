//! `window.localStorage` backend.
//! Persistent across page reloads; values must be UTF-8 (all stored values
//! are JSON documents).

use async_trait::async_trait;
use wasm_bindgen::JsValue;

use helpdesk_core::ports::StoragePort;
use helpdesk_types::{HelpdeskError, Result};

use super::as_text;

pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    pub fn open() -> Result<Self> {
        let window = web_sys::window()
            .ok_or_else(|| HelpdeskError::Storage("No window object".to_string()))?;
        let storage = window
            .local_storage()
            .map_err(storage_err)?
            .ok_or_else(|| HelpdeskError::Storage("localStorage not available".to_string()))?;
        Ok(Self { storage })
    }
}

#[async_trait(?Send)]
impl StoragePort for LocalStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.storage.get_item(key).map_err(storage_err)?;
        Ok(value.map(String::into_bytes))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let text = as_text(key, value)?;
        self.storage.set_item(key, text).map_err(storage_err)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.storage.remove_item(key).map_err(storage_err)
    }

    fn backend_name(&self) -> &str {
        "localstorage"
    }
}

fn storage_err(e: JsValue) -> HelpdeskError {
    HelpdeskError::Storage(format!("{:?}", e))
}
