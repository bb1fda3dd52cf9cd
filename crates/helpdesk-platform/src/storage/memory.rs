//! Fallback store with localStorage semantics: text values and a byte
//! quota. Clones share one map; contents are lost on reload.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use async_trait::async_trait;
use helpdesk_core::ports::StoragePort;
use helpdesk_types::{HelpdeskError, Result};

use super::as_text;

/// Typical per-origin localStorage budget
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Clone)]
pub struct MemoryStorage {
    items: Rc<RefCell<BTreeMap<String, String>>>,
    quota_bytes: usize,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::with_quota(DEFAULT_QUOTA_BYTES)
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: Rc::new(RefCell::new(BTreeMap::new())),
            quota_bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Bytes held, counting keys and values.
    pub fn used_bytes(&self) -> usize {
        self.items
            .borrow()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl StoragePort for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.items.borrow().get(key).map(|v| v.clone().into_bytes()))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let text = as_text(key, value)?;
        let replaced = self
            .items
            .borrow()
            .get(key)
            .map_or(0, |old| key.len() + old.len());
        let needed = self.used_bytes() - replaced + key.len() + text.len();
        if needed > self.quota_bytes {
            return Err(HelpdeskError::Storage(format!(
                "quota exceeded writing {} ({} of {} bytes)",
                key, needed, self.quota_bytes
            )));
        }
        self.items.borrow_mut().insert(key.to_string(), text.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &str {
        "memory"
    }
}
