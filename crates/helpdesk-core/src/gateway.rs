//! Remote Data Gateway: the single authorized entry point to the backend.
//!
//! Four call shapes: get-one, get-collection, get-filtered (document posted,
//! payload returned) and mutate (document posted, nothing of interest
//! returned). A missing credential fails with
//! `HelpdeskError::AuthenticationRequired` before anything reaches the
//! transport. Retry policy belongs to the caller.

use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use helpdesk_types::{session::Credential, HelpdeskError, Result};
use crate::ports::HttpPort;

/// Logical backend endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    UsersMe,
    Tickets,
    MyTickets,
    Ticket,
    Technicians,
    AssignTicket,
    CloseTicket,
    ReopenTicket,
    InsertTicketMessage,
    AiWorkflow,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::UsersMe => "/api/users/me",
            Endpoint::Tickets => "/api/tickets",
            Endpoint::MyTickets => "/api/my-tickets",
            Endpoint::Ticket => "/api/ticket",
            Endpoint::Technicians => "/api/technicians",
            Endpoint::AssignTicket => "/api/assign-ticket",
            Endpoint::CloseTicket => "/api/close-ticket",
            Endpoint::ReopenTicket => "/api/reopen-ticket",
            Endpoint::InsertTicketMessage => "/api/insert-ticket-message",
            Endpoint::AiWorkflow => "/init_ai_workflow",
        }
    }

    fn path_with_id(&self, id: Option<u64>) -> String {
        match id {
            Some(id) => format!("{}/{}", self.path(), id),
            None => self.path().to_string(),
        }
    }
}

pub struct RemoteGateway {
    http: Rc<dyn HttpPort>,
}

impl RemoteGateway {
    pub fn new(http: Rc<dyn HttpPort>) -> Self {
        Self { http }
    }

    /// `GET {endpoint}[/{id}]` decoded into a single document.
    pub async fn get_one<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        id: Option<u64>,
        credential: Option<&Credential>,
    ) -> Result<T> {
        let bearer = bearer(credential)?;
        let path = endpoint.path_with_id(id);
        log::debug!("GET {}", path);
        let value = self.http.get(&path, bearer).await.map_err(|e| {
            log::warn!("GET {} failed: {}", path, e);
            e
        })?;
        decode(value)
    }

    /// `GET {endpoint}` decoded into a list.
    pub async fn get_collection<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        credential: Option<&Credential>,
    ) -> Result<Vec<T>> {
        let bearer = bearer(credential)?;
        let path = endpoint.path();
        log::debug!("GET {}", path);
        let value = self.http.get(path, bearer).await.map_err(|e| {
            log::warn!("GET {} failed: {}", path, e);
            e
        })?;
        if value.is_null() {
            return Ok(Vec::new());
        }
        decode(value)
    }

    /// `POST {endpoint}` with a query-by-example document; the payload is
    /// decoded into `T`.
    pub async fn get_filtered<P: Serialize, T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        predicate: &P,
        credential: Option<&Credential>,
    ) -> Result<T> {
        let bearer = bearer(credential)?;
        let body = serde_json::to_value(predicate)?;
        let path = endpoint.path();
        log::debug!("POST {}", path);
        let value = self.http.post(path, bearer, &body).await.map_err(|e| {
            log::warn!("POST {} failed: {}", path, e);
            e
        })?;
        decode(value)
    }

    /// `POST {endpoint}` for its side effect only.
    pub async fn mutate<B: Serialize>(
        &self,
        endpoint: Endpoint,
        body: &B,
        credential: Option<&Credential>,
    ) -> Result<()> {
        let bearer = bearer(credential)?;
        let body = serde_json::to_value(body)?;
        let path = endpoint.path();
        log::debug!("POST {} (mutation)", path);
        self.http.post(path, bearer, &body).await.map_err(|e| {
            log::warn!("POST {} failed: {}", path, e);
            e
        })?;
        Ok(())
    }
}

fn bearer(credential: Option<&Credential>) -> Result<&str> {
    match credential {
        Some(c) if !c.access_token.is_empty() => Ok(c.access_token.as_str()),
        _ => Err(HelpdeskError::AuthenticationRequired),
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    Ok(serde_json::from_value(value)?)
}
