//! Ticket queries and mutations.
//!
//! Queries go through per-shape [`QueryCache`]s and retry transient
//! failures; mutations are sent exactly once. Message posts, close and
//! reopen update the cached ticket before the request and revert it when
//! the request fails.

use std::rc::Rc;

use chrono::{DateTime, Duration, Utc};
use helpdesk_types::{
    config::QueryConfig,
    event::{ClientEvent, Notification},
    filter::TicketQuery,
    ticket::{NewTicketMessage, Technician, Ticket, TicketAssignee, TicketId, TicketList, TicketMessage},
    HelpdeskError, Result,
};
use crate::event_bus::EventBus;
use crate::gateway::{Endpoint, RemoteGateway};
use crate::ports::TimerPort;
use crate::query::{with_retry, QueryCache, RetryPolicy};
use crate::session::SessionStore;

/// Clone-cheap handle; clones share caches.
#[derive(Clone)]
pub struct TicketService {
    gateway: Rc<RemoteGateway>,
    session: SessionStore,
    timer: Rc<dyn TimerPort>,
    bus: EventBus,
    policy: RetryPolicy,
    tickets: QueryCache<TicketQuery, TicketList>,
    my_tickets: QueryCache<TicketQuery, TicketList>,
    details: QueryCache<u64, Ticket>,
    technicians: QueryCache<(), Vec<Technician>>,
}

impl TicketService {
    pub fn new(
        gateway: Rc<RemoteGateway>,
        session: SessionStore,
        timer: Rc<dyn TimerPort>,
        bus: EventBus,
        config: &QueryConfig,
    ) -> Self {
        let list_stale = Duration::seconds(config.list_stale_secs);
        Self {
            gateway,
            session,
            timer,
            bus,
            policy: RetryPolicy::from_config(config),
            tickets: QueryCache::new(list_stale),
            my_tickets: QueryCache::new(list_stale),
            details: QueryCache::new(Duration::seconds(config.detail_stale_secs)),
            technicians: QueryCache::new(list_stale),
        }
    }

    /// Last known copy of a ticket, fresh or not.
    pub fn cached_ticket(&self, ticket_id: u64) -> Option<Ticket> {
        self.details.get_any(&ticket_id)
    }

    // ─── Queries ─────────────────────────────────────────────

    /// Technician backlog page (`POST /api/tickets`).
    pub async fn fetch_filtered_tickets(&self, query: &TicketQuery, force: bool) -> Result<TicketList> {
        self.fetch_list(Endpoint::Tickets, &self.tickets, query, force).await
    }

    /// The caller's own tickets (`POST /api/my-tickets`).
    pub async fn fetch_my_tickets(&self, query: &TicketQuery, force: bool) -> Result<TicketList> {
        self.fetch_list(Endpoint::MyTickets, &self.my_tickets, query, force).await
    }

    async fn fetch_list(
        &self,
        endpoint: Endpoint,
        cache: &QueryCache<TicketQuery, TicketList>,
        query: &TicketQuery,
        force: bool,
    ) -> Result<TicketList> {
        if !force {
            if let Some(list) = cache.get_fresh(query, self.timer.now()) {
                return Ok(list);
            }
        }
        let list: TicketList = with_retry(self.policy, self.timer.as_ref(), endpoint.path(), || {
            let gateway = self.gateway.clone();
            let credential = self.session.credential();
            let query = query.clone();
            async move { gateway.get_filtered(endpoint, &query, credential.as_ref()).await }
        })
        .await?;
        log::debug!(
            "{}: page {} holds {} of {} tickets",
            endpoint.path(),
            query.page.page,
            list.tickets.len(),
            list.count
        );
        cache.insert(query.clone(), list.clone(), self.timer.now());
        Ok(list)
    }

    /// One ticket with its thread and related tickets.
    pub async fn fetch_ticket(&self, ticket_id: u64, force: bool) -> Result<Ticket> {
        if !force {
            if let Some(ticket) = self.details.get_fresh(&ticket_id, self.timer.now()) {
                return Ok(ticket);
            }
        }
        let ticket: Ticket = with_retry(self.policy, self.timer.as_ref(), "ticket", || {
            let gateway = self.gateway.clone();
            let credential = self.session.credential();
            async move {
                gateway
                    .get_one(Endpoint::Ticket, Some(ticket_id), credential.as_ref())
                    .await
            }
        })
        .await?;
        self.details.insert(ticket_id, ticket.clone(), self.timer.now());
        Ok(ticket)
    }

    pub async fn fetch_technicians(&self, force: bool) -> Result<Vec<Technician>> {
        if !force {
            if let Some(list) = self.technicians.get_fresh(&(), self.timer.now()) {
                return Ok(list);
            }
        }
        let list: Vec<Technician> = with_retry(self.policy, self.timer.as_ref(), "technicians", || {
            let gateway = self.gateway.clone();
            let credential = self.session.credential();
            async move {
                gateway
                    .get_collection(Endpoint::Technicians, credential.as_ref())
                    .await
            }
        })
        .await?;
        self.technicians.insert((), list.clone(), self.timer.now());
        Ok(list)
    }

    // ─── Event-emitting loaders (used by the views) ──────────

    pub async fn load_tickets(&self, query: &TicketQuery, force: bool) {
        match self.fetch_filtered_tickets(query, force).await {
            Ok(list) => self.bus.emit(ClientEvent::TicketsLoaded(list)),
            Err(e) => self.report_failure("tickets", e),
        }
    }

    pub async fn load_my_tickets(&self, query: &TicketQuery, force: bool) {
        match self.fetch_my_tickets(query, force).await {
            Ok(list) => self.bus.emit(ClientEvent::MyTicketsLoaded(list)),
            Err(e) => self.report_failure("tickets", e),
        }
    }

    pub async fn load_ticket(&self, ticket_id: u64, force: bool) {
        match self.fetch_ticket(ticket_id, force).await {
            Ok(ticket) => self.bus.emit(ClientEvent::TicketLoaded(ticket)),
            Err(e) => self.report_failure("ticket", e),
        }
    }

    pub async fn load_technicians(&self, force: bool) {
        match self.fetch_technicians(force).await {
            Ok(list) => self.bus.emit(ClientEvent::TechniciansLoaded(list)),
            Err(e) => self.report_failure("technicians", e),
        }
    }

    /// Background refetch of an open ticket. Failures are logged only so a
    /// flaky connection does not raise a toast every interval.
    pub async fn poll_ticket(&self, ticket_id: u64) {
        match self.fetch_ticket(ticket_id, true).await {
            Ok(ticket) => self.bus.emit(ClientEvent::TicketLoaded(ticket)),
            Err(e) => log::warn!("Polling ticket {} failed: {}", ticket_id, e),
        }
    }

    fn report_failure(&self, what: &str, e: HelpdeskError) {
        if matches!(e, HelpdeskError::AuthenticationRequired) {
            self.session.expire(&self.bus);
            return;
        }
        self.bus.emit(ClientEvent::LoadFailed {
            what: what.to_string(),
            message: e.to_string(),
        });
        self.bus
            .notify(Notification::error(format!("Failed to load {}. Please try again.", what)));
    }

    // ─── Mutations ───────────────────────────────────────────

    /// Append a message to a ticket's thread.
    pub async fn post_message(&self, ticket_id: u64, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        if self.cached_ticket(ticket_id).is_some_and(|t| t.is_closed()) {
            self.bus
                .notify(Notification::error("This ticket is closed. Reopen it to reply."));
            return Err(HelpdeskError::TicketClosed(ticket_id));
        }

        let created_at = self.timer.now();
        let optimistic = match self.session.identity() {
            Some(identity) => TicketMessage {
                message: text.to_string(),
                author_name: identity.user_name,
                group: identity.group.as_wire().to_string(),
                created_at,
            },
            None => return Err(HelpdeskError::AuthenticationRequired),
        };
        self.edit_cached(ticket_id, |t| t.ticket_messages.push(optimistic.clone()));

        let body = NewTicketMessage {
            ticket_id,
            message: text.to_string(),
            created_at,
        };
        let credential = self.session.credential();
        match self
            .gateway
            .mutate(Endpoint::InsertTicketMessage, &body, credential.as_ref())
            .await
        {
            Ok(()) => {
                self.refetch_after_mutation(ticket_id).await;
                Ok(())
            }
            Err(e) => {
                self.edit_cached(ticket_id, |t| {
                    if let Some(pos) = t.ticket_messages.iter().rposition(|m| *m == optimistic) {
                        t.ticket_messages.remove(pos);
                    }
                });
                self.mutation_failed(&e, "Failed to send message. Please try again.");
                Err(e)
            }
        }
    }

    /// Assign a ticket; `None` clears the assignee.
    pub async fn assign(&self, ticket_id: u64, assignee_id: Option<&str>) -> Result<()> {
        let body = TicketAssignee::new(ticket_id, assignee_id);
        let credential = self.session.credential();
        match self
            .gateway
            .mutate(Endpoint::AssignTicket, &body, credential.as_ref())
            .await
        {
            Ok(()) => {
                log::info!("Ticket {} assigned to {}", ticket_id, body.assignee_id);
                self.invalidate_lists();
                self.refetch_after_mutation(ticket_id).await;
                Ok(())
            }
            Err(e) => {
                self.mutation_failed(&e, "Failed to assign Ticket. Please try again.");
                Err(e)
            }
        }
    }

    pub async fn close(&self, ticket_id: u64) -> Result<()> {
        let now = self.timer.now();
        self.set_closed(ticket_id, Endpoint::CloseTicket, Some(now), "close")
            .await
    }

    pub async fn reopen(&self, ticket_id: u64) -> Result<()> {
        self.set_closed(ticket_id, Endpoint::ReopenTicket, None, "reopen")
            .await
    }

    async fn set_closed(
        &self,
        ticket_id: u64,
        endpoint: Endpoint,
        closed_date: Option<DateTime<Utc>>,
        verb: &str,
    ) -> Result<()> {
        let previous = self.cached_ticket(ticket_id).map(|t| t.closed_date);
        self.edit_cached(ticket_id, |t| t.closed_date = closed_date);

        let credential = self.session.credential();
        match self
            .gateway
            .mutate(endpoint, &TicketId { ticket_id }, credential.as_ref())
            .await
        {
            Ok(()) => {
                log::info!("Ticket {}: {} succeeded", ticket_id, verb);
                self.invalidate_lists();
                Ok(())
            }
            Err(e) => {
                if let Some(previous) = previous {
                    self.edit_cached(ticket_id, |t| t.closed_date = previous);
                }
                self.mutation_failed(&e, &format!("Failed to {} Ticket. Please try again.", verb));
                Err(e)
            }
        }
    }

    fn mutation_failed(&self, e: &HelpdeskError, message: &str) {
        if matches!(e, HelpdeskError::AuthenticationRequired) {
            self.session.expire(&self.bus);
        } else {
            self.bus.notify(Notification::error(message));
        }
    }

    fn edit_cached(&self, ticket_id: u64, f: impl FnOnce(&mut Ticket)) {
        if let Some(ticket) = self.details.update(&ticket_id, f) {
            self.bus.emit(ClientEvent::TicketLoaded(ticket));
        }
    }

    fn invalidate_lists(&self) {
        self.tickets.invalidate_all();
        self.my_tickets.invalidate_all();
    }

    async fn refetch_after_mutation(&self, ticket_id: u64) {
        match self.fetch_ticket(ticket_id, true).await {
            Ok(ticket) => self.bus.emit(ClientEvent::TicketLoaded(ticket)),
            Err(e) => log::debug!("Refetch of ticket {} failed: {}", ticket_id, e),
        }
    }
}
