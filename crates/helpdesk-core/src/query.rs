//! Read-through query layer: retry with exponential backoff and
//! staleness-windowed caches.

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use helpdesk_types::{config::QueryConfig, Result};
use crate::ports::TimerPort;

/// Upper bound for a single backoff delay
const MAX_RETRY_DELAY_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: u32,
    pub base_delay_ms: u64,
}

impl RetryPolicy {
    pub fn new(retries: u32, base_delay_ms: u64) -> Self {
        Self {
            retries,
            base_delay_ms,
        }
    }

    /// Mutations are sent once.
    pub fn none() -> Self {
        Self::new(0, 0)
    }

    pub fn from_config(config: &QueryConfig) -> Self {
        Self::new(config.retries, config.retry_base_delay_ms as u64)
    }

    /// Delay before retry number `attempt` (0-based): `base * 2^attempt`.
    pub fn delay_for(&self, attempt: u32) -> u64 {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        self.base_delay_ms
            .saturating_mul(factor)
            .min(MAX_RETRY_DELAY_MS)
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's retries are used up.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    timer: &dyn TimerPort,
    what: &str,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.retries => {
                let delay = policy.delay_for(attempt);
                attempt += 1;
                log::warn!(
                    "Loading {} failed ({}), retry {}/{} in {}ms",
                    what,
                    e,
                    attempt,
                    policy.retries,
                    delay
                );
                timer.sleep_ms(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}

// ─── Cache ───────────────────────────────────────────────────

struct Cached<V> {
    value: V,
    fetched_at: DateTime<Utc>,
}

/// Keyed cache whose entries go stale `stale_after` after being fetched.
/// Stale entries stay readable through [`QueryCache::get_any`] so views can
/// render while a refetch runs, until the next insert evicts them.
pub struct QueryCache<K, V> {
    entries: Rc<RefCell<HashMap<K, Cached<V>>>>,
    stale_after: Duration,
}

impl<K, V> Clone for QueryCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
            stale_after: self.stale_after,
        }
    }
}

impl<K: Eq + Hash, V: Clone> QueryCache<K, V> {
    pub fn new(stale_after: Duration) -> Self {
        Self {
            entries: Rc::new(RefCell::new(HashMap::new())),
            stale_after,
        }
    }

    /// The cached value if it is still fresh at `now`.
    pub fn get_fresh(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        self.entries
            .borrow()
            .get(key)
            .filter(|c| now - c.fetched_at < self.stale_after)
            .map(|c| c.value.clone())
    }

    pub fn get_any(&self, key: &K) -> Option<V> {
        self.entries.borrow().get(key).map(|c| c.value.clone())
    }

    /// Store a fresh value. Entries already stale at `now` are evicted so
    /// one-off keys (free-text searches) do not pile up.
    pub fn insert(&self, key: K, value: V, now: DateTime<Utc>) {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|_, c| now - c.fetched_at < self.stale_after);
        if entries.len() < before {
            log::debug!("Evicted {} stale cache entries", before - entries.len());
        }
        entries.insert(
            key,
            Cached {
                value,
                fetched_at: now,
            },
        );
    }

    /// Edit a cached value in place without touching its age.
    /// Returns the updated value, or `None` when nothing is cached.
    pub fn update(&self, key: &K, f: impl FnOnce(&mut V)) -> Option<V> {
        let mut entries = self.entries.borrow_mut();
        let cached = entries.get_mut(key)?;
        f(&mut cached.value);
        Some(cached.value.clone())
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.borrow_mut().remove(key);
    }

    pub fn invalidate_all(&self) {
        self.entries.borrow_mut().clear();
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}
