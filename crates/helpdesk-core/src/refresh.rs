//! Background credential refresh.
//!
//! Sleeps until `refresh_lead` before the current credential expires, then
//! asks the identity provider for a new one without interaction. Any
//! failure clears the session; when the provider demands interaction the
//! user is sent back to the sign-in view.

use std::rc::Rc;

use chrono::Duration;
use helpdesk_types::{
    event::{ClientEvent, Notification},
    route::Route,
    HelpdeskError, Result,
};
use crate::event_bus::EventBus;
use crate::poller::PollHandle;
use crate::ports::{IdentityPort, TimerPort};
use crate::session::SessionStore;

/// Lower bound between two refresh attempts
const MIN_REFRESH_DELAY_MS: u64 = 1_000;

pub struct CredentialRefresher {
    store: SessionStore,
    identity: Rc<dyn IdentityPort>,
    timer: Rc<dyn TimerPort>,
    bus: EventBus,
    lead: Duration,
}

impl CredentialRefresher {
    pub fn new(
        store: SessionStore,
        identity: Rc<dyn IdentityPort>,
        timer: Rc<dyn TimerPort>,
        bus: EventBus,
        lead_secs: i64,
    ) -> Self {
        Self {
            store,
            identity,
            timer,
            bus,
            lead: Duration::seconds(lead_secs),
        }
    }

    /// Milliseconds to wait before the next refresh, or `None` when there is
    /// no session to refresh.
    pub fn next_delay_ms(&self) -> Option<u64> {
        let credential = self.store.credential()?;
        let due = credential.refresh_at(self.lead);
        let wait = (due - self.timer.now()).num_milliseconds().max(0) as u64;
        Some(wait.max(MIN_REFRESH_DELAY_MS))
    }

    /// Run until the session ends, a refresh fails, or `stop` is cancelled.
    pub async fn run(&self, stop: PollHandle) {
        while let Some(delay) = self.next_delay_ms() {
            let before = self.store.credential();
            log::debug!("Next credential refresh in {}ms", delay);
            self.timer.sleep_ms(delay).await;

            if stop.is_cancelled() {
                log::debug!("Refresh loop cancelled");
                return;
            }

            let current = self.store.credential();
            if current.is_none() {
                log::debug!("Session ended; refresh loop stopping");
                return;
            }
            if current != before {
                // Someone else replaced the credential while we slept.
                continue;
            }
            if self.refresh_once().await.is_err() {
                return;
            }
        }
    }

    /// One silent refresh attempt.
    pub async fn refresh_once(&self) -> Result<()> {
        match self.identity.acquire_token_silent().await {
            Ok(credential) => {
                log::info!("Credential refreshed, expires {}", credential.expires_at);
                self.store.set_credential(credential)?;
                self.bus.emit(ClientEvent::SessionChanged);
                Ok(())
            }
            Err(e) => {
                log::warn!("Silent credential refresh failed: {}", e);
                self.store.logout();
                self.bus.emit(ClientEvent::SessionChanged);
                if !matches!(e, HelpdeskError::InteractionRequired(_)) {
                    self.bus
                        .notify(Notification::error("Your session expired. Please sign in again."));
                }
                self.bus.navigate(Route::Login);
                Err(e)
            }
        }
    }
}
