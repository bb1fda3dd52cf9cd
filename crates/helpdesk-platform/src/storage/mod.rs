//! Durable key-value storage for the transcript and the client config.
//!
//! Values are JSON documents, so every backend holds UTF-8 text the way
//! `window.localStorage` does. The in-memory backend enforces the same
//! rule so a fallback session fails where a real one would.

mod local;
mod memory;

use std::rc::Rc;

use helpdesk_core::ports::StoragePort;
use helpdesk_types::{config::StorageBackendType, HelpdeskError, Result};

pub use local::LocalStorage;
pub use memory::MemoryStorage;

/// Open the requested backend. `Auto` and `LocalStorage` fall back to
/// memory when localStorage cannot be opened (private browsing, Node).
pub fn open_storage(backend: StorageBackendType) -> Rc<dyn StoragePort> {
    if backend == StorageBackendType::Memory {
        log::info!("Storage backend: memory (configured)");
        return Rc::new(MemoryStorage::new());
    }
    match LocalStorage::open() {
        Ok(local) => {
            log::info!("Storage backend: localStorage");
            Rc::new(local)
        }
        Err(e) => {
            log::warn!("localStorage unavailable ({}); chat will not survive a reload", e);
            Rc::new(MemoryStorage::new())
        }
    }
}

/// Borrow a stored value as text.
fn as_text<'a>(key: &str, value: &'a [u8]) -> Result<&'a str> {
    std::str::from_utf8(value)
        .map_err(|e| HelpdeskError::Storage(format!("value for {} is not UTF-8: {}", key, e)))
}
