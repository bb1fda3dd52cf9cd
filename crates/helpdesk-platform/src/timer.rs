//! Browser timer via `setTimeout` (gloo-timers).

use async_trait::async_trait;
use gloo_timers::future::TimeoutFuture;

use helpdesk_core::ports::TimerPort;

#[derive(Default)]
pub struct BrowserTimer;

impl BrowserTimer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait(?Send)]
impl TimerPort for BrowserTimer {
    async fn sleep_ms(&self, ms: u64) {
        TimeoutFuture::new(ms.min(u32::MAX as u64) as u32).await;
    }
}
