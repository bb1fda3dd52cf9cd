//! UI-level state that drives rendering.
//!
//! A read-only projection of the client stores, updated each frame by
//! draining the EventBus. Transcript and session live in the core stores;
//! the events only mark the projections stale so the app can re-read them.

use chrono::{DateTime, Utc};
use uuid::Uuid;
use helpdesk_types::{
    event::{ClientEvent, Notification},
    message::ChatTranscript,
    route::Route,
    session::Identity,
    ticket::{Technician, Ticket, TicketList},
};

/// How long a toast stays on screen
pub const TOAST_TTL_MS: i64 = 5_000;

/// State visible to UI panels
pub struct UiState {
    /// View currently shown (already passed through the route guard)
    pub route: Route,
    pub identity: Option<Identity>,
    /// Copy of the transcript store, refreshed on `TranscriptChanged`
    pub transcript: ChatTranscript,
    pub workflow_busy: bool,
    pub generating_ticket: bool,
    pub signing_in: bool,

    pub chat_input: String,
    pub message_input: String,
    pub search_input: String,

    pub tickets: Option<TicketList>,
    pub my_tickets: Option<TicketList>,
    pub ticket: Option<Ticket>,
    pub technicians: Vec<Technician>,
    /// 1-based page of the technician backlog
    pub page: u32,
    /// 1-based page of "my tickets"
    pub my_page: u32,

    pub toasts: Vec<Notification>,
    pub last_error: Option<String>,

    pub session_stale: bool,
    pub transcript_stale: bool,
}

impl UiState {
    pub fn new() -> Self {
        Self {
            route: Route::Login,
            identity: None,
            transcript: ChatTranscript::new(),
            workflow_busy: false,
            generating_ticket: false,
            signing_in: false,
            chat_input: String::new(),
            message_input: String::new(),
            search_input: String::new(),
            tickets: None,
            my_tickets: None,
            ticket: None,
            technicians: Vec::new(),
            page: 1,
            my_page: 1,
            toasts: Vec::new(),
            last_error: None,
            session_stale: false,
            transcript_stale: false,
        }
    }

    /// Apply events from the EventBus. Navigation requests are returned
    /// for the caller to run through the route guard.
    pub fn process_events(&mut self, events: Vec<ClientEvent>) -> Vec<Route> {
        let mut navigations = Vec::new();
        for event in events {
            match event {
                ClientEvent::Navigate(route) => navigations.push(route),
                ClientEvent::Notify(notification) => self.toasts.push(notification),
                ClientEvent::SessionChanged => self.session_stale = true,
                ClientEvent::TranscriptChanged => self.transcript_stale = true,
                ClientEvent::WorkflowBusy(busy) => {
                    self.workflow_busy = busy;
                    if !busy {
                        self.generating_ticket = false;
                    }
                }
                ClientEvent::TicketsLoaded(list) => {
                    self.tickets = Some(list);
                    self.last_error = None;
                }
                ClientEvent::MyTicketsLoaded(list) => {
                    self.my_tickets = Some(list);
                    self.last_error = None;
                }
                ClientEvent::TicketLoaded(ticket) => {
                    if self.route == Route::Ticket(ticket.ticket_id) {
                        self.ticket = Some(ticket);
                    }
                }
                ClientEvent::TechniciansLoaded(list) => self.technicians = list,
                ClientEvent::LoadFailed { what, message } => {
                    log::debug!("UI: loading {} failed: {}", what, message);
                    self.last_error = Some(format!("Could not load {}.", what));
                }
            }
        }
        navigations
    }

    /// Switch view. Per-view buffers are cleared when the view changes.
    pub fn open_route(&mut self, route: Route) {
        if self.route == route {
            return;
        }
        if !matches!(self.ticket, Some(ref t) if route == Route::Ticket(t.ticket_id)) {
            self.ticket = None;
        }
        self.message_input.clear();
        self.last_error = None;
        self.route = route;
    }

    pub fn set_identity(&mut self, identity: Option<Identity>) {
        self.identity = identity;
        self.session_stale = false;
    }

    pub fn set_transcript(&mut self, transcript: ChatTranscript) {
        self.transcript = transcript;
        self.transcript_stale = false;
    }

    pub fn is_technician(&self) -> bool {
        self.identity.as_ref().is_some_and(Identity::is_technician)
    }

    /// Drop toasts older than [`TOAST_TTL_MS`].
    pub fn expire_toasts(&mut self, now: DateTime<Utc>) {
        self.toasts.retain(|t| t.age_ms(now) < TOAST_TTL_MS);
    }

    pub fn dismiss_toast(&mut self, id: Uuid) {
        self.toasts.retain(|t| t.id != id);
    }

    /// Anything animating or waiting that needs another frame
    pub fn needs_repaint(&self) -> bool {
        self.workflow_busy || self.signing_in || !self.toasts.is_empty()
    }
}

impl Default for UiState {
    fn default() -> Self {
        Self::new()
    }
}
