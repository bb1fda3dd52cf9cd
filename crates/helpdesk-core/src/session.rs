//! Session Store and sign-in/sign-out service.
//!
//! The store holds identity and credential as one `Option<Session>`, so a
//! partial session cannot be observed: both are set together and cleared
//! together.

use std::cell::RefCell;
use std::rc::Rc;

use helpdesk_types::{
    event::ClientEvent,
    route::Route,
    session::{Credential, Identity, Session},
    HelpdeskError, Result,
};
use crate::event_bus::EventBus;
use crate::gateway::{Endpoint, RemoteGateway};
use crate::navigation::landing_route;
use crate::ports::IdentityPort;

/// Shared session state, clone-cheap via Rc.
#[derive(Clone, Default)]
pub struct SessionStore {
    inner: Rc<RefCell<Option<Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Session> {
        self.inner.borrow().clone()
    }

    pub fn identity(&self) -> Option<Identity> {
        self.inner.borrow().as_ref().map(|s| s.identity.clone())
    }

    pub fn credential(&self) -> Option<Credential> {
        self.inner.borrow().as_ref().map(|s| s.credential.clone())
    }

    pub fn is_signed_in(&self) -> bool {
        self.inner.borrow().is_some()
    }

    /// Establish a session from a fresh sign-in.
    pub fn sign_in(&self, identity: Identity, credential: Credential) {
        *self.inner.borrow_mut() = Some(Session { identity, credential });
    }

    /// Replace the identity of the current session.
    pub fn set_identity(&self, identity: Identity) -> Result<()> {
        match self.inner.borrow_mut().as_mut() {
            Some(session) => {
                session.identity = identity;
                Ok(())
            }
            None => Err(HelpdeskError::AuthenticationRequired),
        }
    }

    /// Replace the credential of the current session (silent refresh).
    pub fn set_credential(&self, credential: Credential) -> Result<()> {
        match self.inner.borrow_mut().as_mut() {
            Some(session) => {
                session.credential = credential;
                Ok(())
            }
            None => Err(HelpdeskError::AuthenticationRequired),
        }
    }

    pub fn logout(&self) {
        self.inner.borrow_mut().take();
    }

    /// The backend rejected the credential we still hold: drop the session
    /// and send the user to sign-in. Clearing first keeps the route guard
    /// from bouncing `Login` back to the landing view.
    pub fn expire(&self, bus: &EventBus) {
        if self.inner.borrow_mut().take().is_some() {
            log::warn!("Credential rejected by the backend; session cleared");
            bus.emit(ClientEvent::SessionChanged);
        }
        bus.navigate(Route::Login);
    }
}

/// Sign-in and sign-out against the identity provider and the backend.
pub struct SessionService {
    store: SessionStore,
    identity: Rc<dyn IdentityPort>,
    gateway: Rc<RemoteGateway>,
    bus: EventBus,
}

impl SessionService {
    pub fn new(
        store: SessionStore,
        identity: Rc<dyn IdentityPort>,
        gateway: Rc<RemoteGateway>,
        bus: EventBus,
    ) -> Self {
        Self {
            store,
            identity,
            gateway,
            bus,
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Interactive sign-in, then resolve who we are via `/api/users/me`.
    /// The store is only written once both halves are known.
    pub async fn sign_in(&self) -> Result<Identity> {
        let credential = self.identity.sign_in_interactive().await?;
        let identity: Identity = self
            .gateway
            .get_one(Endpoint::UsersMe, None, Some(&credential))
            .await?;
        log::info!(
            "Signed in as {} ({}), credential expires {}",
            identity.user_name,
            identity.group.label(),
            credential.expires_at
        );
        self.store.sign_in(identity.clone(), credential);
        self.bus.emit(ClientEvent::SessionChanged);
        self.bus.navigate(landing_route(&identity));
        Ok(identity)
    }

    /// Re-establish a session from the provider's cached account without
    /// interaction (page reload). No navigation happens; the caller decides
    /// where to go.
    pub async fn resume(&self) -> Result<Identity> {
        let credential = self.identity.acquire_token_silent().await?;
        let identity: Identity = self
            .gateway
            .get_one(Endpoint::UsersMe, None, Some(&credential))
            .await?;
        log::info!("Resumed session for {}", identity.user_name);
        self.store.sign_in(identity.clone(), credential);
        self.bus.emit(ClientEvent::SessionChanged);
        Ok(identity)
    }

    pub async fn sign_out(&self) {
        if let Err(e) = self.identity.sign_out().await {
            log::warn!("Identity provider sign-out failed: {}", e);
        }
        self.store.logout();
        log::info!("Signed out");
        self.bus.emit(ClientEvent::SessionChanged);
        self.bus.navigate(Route::Login);
    }
}
