#[cfg(test)]
mod tests {
    use crate::event_bus::EventBus;
    use crate::filter::FilterStore;
    use crate::gateway::{Endpoint, RemoteGateway};
    use crate::navigation::{guard, landing_route};
    use crate::orchestrator::{ConversationOrchestrator, TurnOutcome};
    use crate::poller::{run_poll, PollHandle};
    use crate::ports::*;
    use crate::query::{with_retry, QueryCache, RetryPolicy};
    use crate::refresh::CredentialRefresher;
    use crate::session::{SessionService, SessionStore};
    use crate::tickets::TicketService;
    use crate::transcript::TranscriptStore;
    use helpdesk_types::config::{QueryConfig, TRANSCRIPT_STORAGE_KEY};
    use helpdesk_types::event::{ClientEvent, NotificationLevel};
    use helpdesk_types::filter::{PageRequest, SortOrder, TicketFilter, TicketQuery};
    use helpdesk_types::message::{ChatEntry, ChatTranscript, Speaker};
    use helpdesk_types::route::Route;
    use helpdesk_types::session::{Credential, Group, Identity};
    use helpdesk_types::ticket::{Technician, Ticket, TicketList};
    use helpdesk_types::workflow::CREATE_TICKET_PROMPT;
    use helpdesk_types::{HelpdeskError, Result};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use futures::executor::block_on;
    use serde_json::{json, Value};
    use std::cell::{Cell, RefCell};
    use std::collections::{HashMap, VecDeque};
    use std::rc::Rc;

    // ─── Mock ports ──────────────────────────────────────────

    #[derive(Debug, Clone, PartialEq)]
    struct Call {
        method: &'static str,
        path: String,
        body: Option<Value>,
    }

    /// Records every request and answers from a script (default: `null`).
    #[derive(Default)]
    struct MockHttp {
        calls: RefCell<Vec<Call>>,
        replies: RefCell<VecDeque<Result<Value>>>,
    }

    impl MockHttp {
        fn new() -> Rc<Self> {
            Rc::new(Self::default())
        }

        fn reply(&self, reply: Result<Value>) {
            self.replies.borrow_mut().push_back(reply);
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }

        fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }

        fn next_reply(&self) -> Result<Value> {
            self.replies.borrow_mut().pop_front().unwrap_or(Ok(Value::Null))
        }
    }

    #[async_trait(?Send)]
    impl HttpPort for MockHttp {
        async fn get(&self, path: &str, _bearer: &str) -> Result<Value> {
            self.calls.borrow_mut().push(Call {
                method: "GET",
                path: path.to_string(),
                body: None,
            });
            self.next_reply()
        }

        async fn post(&self, path: &str, _bearer: &str, body: &Value) -> Result<Value> {
            self.calls.borrow_mut().push(Call {
                method: "POST",
                path: path.to_string(),
                body: Some(body.clone()),
            });
            self.next_reply()
        }
    }

    #[derive(Default)]
    struct MockStorage {
        data: RefCell<HashMap<String, Vec<u8>>>,
    }

    #[async_trait(?Send)]
    impl StoragePort for MockStorage {
        async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.data.borrow().get(key).cloned())
        }

        async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
            self.data.borrow_mut().insert(key.to_string(), value.to_vec());
            Ok(())
        }

        async fn delete(&self, key: &str) -> Result<()> {
            self.data.borrow_mut().remove(key);
            Ok(())
        }

        fn backend_name(&self) -> &str {
            "mock"
        }
    }

    /// Clock that only moves when something sleeps.
    struct MockTimer {
        now: Cell<DateTime<Utc>>,
        sleeps: RefCell<Vec<u64>>,
    }

    impl MockTimer {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                now: Cell::new(t0()),
                sleeps: RefCell::new(Vec::new()),
            })
        }

        fn advance(&self, ms: i64) {
            self.now.set(self.now.get() + Duration::milliseconds(ms));
        }

        fn sleeps(&self) -> Vec<u64> {
            self.sleeps.borrow().clone()
        }
    }

    #[async_trait(?Send)]
    impl TimerPort for MockTimer {
        async fn sleep_ms(&self, ms: u64) {
            self.sleeps.borrow_mut().push(ms);
            self.advance(ms as i64);
        }

        fn now(&self) -> DateTime<Utc> {
            self.now.get()
        }
    }

    struct MockIdentity {
        interactive: RefCell<Option<Result<Credential>>>,
        silent: RefCell<VecDeque<Result<Credential>>>,
        silent_calls: Cell<u32>,
        signed_out: Cell<bool>,
    }

    impl MockIdentity {
        fn new() -> Rc<Self> {
            Rc::new(Self {
                interactive: RefCell::new(Some(Ok(credential("interactive")))),
                silent: RefCell::new(VecDeque::new()),
                silent_calls: Cell::new(0),
                signed_out: Cell::new(false),
            })
        }
    }

    #[async_trait(?Send)]
    impl IdentityPort for MockIdentity {
        async fn sign_in_interactive(&self) -> Result<Credential> {
            self.interactive
                .borrow_mut()
                .take()
                .unwrap_or(Err(HelpdeskError::Other("popup closed".into())))
        }

        async fn acquire_token_silent(&self) -> Result<Credential> {
            self.silent_calls.set(self.silent_calls.get() + 1);
            self.silent
                .borrow_mut()
                .pop_front()
                .unwrap_or(Err(HelpdeskError::InteractionRequired("login_required".into())))
        }

        async fn sign_out(&self) -> Result<()> {
            self.signed_out.set(true);
            Ok(())
        }
    }

    // ─── Fixtures ────────────────────────────────────────────

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 4, 14, 0, 0).unwrap()
    }

    fn credential(token: &str) -> Credential {
        Credential::new(token, t0() + Duration::minutes(10))
    }

    fn technician() -> Identity {
        Identity {
            user_id: "t1".into(),
            user_name: "Grace".into(),
            group: Group::Technician,
        }
    }

    fn user() -> Identity {
        Identity {
            user_id: "u1".into(),
            user_name: "Ada".into(),
            group: Group::User,
        }
    }

    fn ticket_json(id: u64, closed: bool) -> Value {
        json!({
            "ticket_id": id,
            "title": "Printer jams",
            "content": "The printer jams. Every time.",
            "creation_date": "2025-03-04T14:07:00",
            "closed_date": if closed { json!("2025-03-05T09:00:00") } else { Value::Null },
            "author_name": "Ada",
            "assignee_name": null,
            "similar_tickets": [],
            "ticket_messages": []
        })
    }

    fn list_json(count: u64, ids: &[u64]) -> Value {
        let tickets: Vec<Value> = ids.iter().map(|id| ticket_json(*id, false)).collect();
        json!({ "count": count, "tickets": tickets })
    }

    struct Fixture {
        http: Rc<MockHttp>,
        storage: Rc<MockStorage>,
        timer: Rc<MockTimer>,
        bus: EventBus,
        session: SessionStore,
        gateway: Rc<RemoteGateway>,
    }

    impl Fixture {
        fn signed_out() -> Self {
            let http = MockHttp::new();
            let gateway = Rc::new(RemoteGateway::new(http.clone()));
            Self {
                http,
                storage: Rc::new(MockStorage::default()),
                timer: MockTimer::new(),
                bus: EventBus::new(),
                session: SessionStore::new(),
                gateway,
            }
        }

        fn signed_in() -> Self {
            let fx = Self::signed_out();
            fx.session.sign_in(technician(), credential("token"));
            fx
        }

        fn orchestrator(&self) -> ConversationOrchestrator {
            ConversationOrchestrator::new(
                TranscriptStore::new(),
                self.session.clone(),
                self.gateway.clone(),
                self.storage.clone(),
                self.bus.clone(),
            )
        }

        fn tickets(&self) -> TicketService {
            TicketService::new(
                self.gateway.clone(),
                self.session.clone(),
                self.timer.clone(),
                self.bus.clone(),
                &QueryConfig::default(),
            )
        }
    }

    fn navigations(events: &[ClientEvent]) -> Vec<Route> {
        events
            .iter()
            .filter_map(|e| match e {
                ClientEvent::Navigate(route) => Some(*route),
                _ => None,
            })
            .collect()
    }

    fn toasts(events: &[ClientEvent]) -> Vec<(NotificationLevel, String)> {
        events
            .iter()
            .filter_map(|e| match e {
                ClientEvent::Notify(n) => Some((n.level, n.description.clone())),
                _ => None,
            })
            .collect()
    }

    fn reply(text: &str) -> Result<Value> {
        Ok(json!({ "llm_output": text, "ticket": false }))
    }

    fn proposal(text: &str) -> Result<Value> {
        Ok(json!({ "llm_output": text, "ticket": true }))
    }

    // ─── EventBus Tests ──────────────────────────────────────

    #[test]
    fn test_event_bus_new_is_empty() {
        let bus = EventBus::new();
        assert!(!bus.has_pending());
        assert!(bus.drain().is_empty());
    }

    #[test]
    fn test_event_bus_clone_shares_state() {
        let bus1 = EventBus::new();
        let bus2 = bus1.clone();
        bus1.emit(ClientEvent::SessionChanged);
        bus1.navigate(Route::AiChat);
        assert!(bus2.has_pending());
        let events = bus2.drain();
        assert_eq!(events.len(), 2);
        assert!(!bus1.has_pending());
    }

    #[test]
    fn test_event_bus_coalesces_store_markers() {
        let bus = EventBus::new();
        bus.emit(ClientEvent::TranscriptChanged);
        bus.emit(ClientEvent::WorkflowBusy(true));
        bus.emit(ClientEvent::TranscriptChanged);
        bus.emit(ClientEvent::SessionChanged);
        bus.emit(ClientEvent::SessionChanged);
        let events = bus.drain();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[0], ClientEvent::TranscriptChanged));
        assert!(matches!(events[1], ClientEvent::WorkflowBusy(true)));
        assert!(matches!(events[2], ClientEvent::SessionChanged));

        // A new frame accepts the marker again.
        bus.emit(ClientEvent::TranscriptChanged);
        assert_eq!(bus.drain().len(), 1);
    }

    #[test]
    fn test_event_bus_keeps_every_navigation() {
        let bus = EventBus::new();
        bus.navigate(Route::Login);
        bus.navigate(Route::Login);
        assert_eq!(navigations(&bus.drain()), vec![Route::Login, Route::Login]);
    }

    #[test]
    fn test_event_bus_notify_wraps_notification() {
        let bus = EventBus::new();
        bus.notify(helpdesk_types::event::Notification::error("boom"));
        let events = bus.drain();
        assert_eq!(toasts(&events), vec![(NotificationLevel::Error, "boom".to_string())]);
    }

    // ─── Gateway Tests ───────────────────────────────────────

    #[test]
    fn test_gateway_without_credential_never_reaches_network() {
        let fx = Fixture::signed_out();
        let err = block_on(fx.gateway.get_one::<Value>(Endpoint::Ticket, Some(1), None)).unwrap_err();
        assert_eq!(err, HelpdeskError::AuthenticationRequired);

        let empty = Credential::new("", t0());
        let err = block_on(fx.gateway.mutate(Endpoint::CloseTicket, &json!({}), Some(&empty)))
            .unwrap_err();
        assert_eq!(err, HelpdeskError::AuthenticationRequired);
        assert_eq!(fx.http.call_count(), 0);
    }

    #[test]
    fn test_gateway_get_one_appends_id() {
        let fx = Fixture::signed_in();
        fx.http.reply(Ok(ticket_json(7, false)));
        let cred = fx.session.credential();
        let ticket: Ticket =
            block_on(fx.gateway.get_one(Endpoint::Ticket, Some(7), cred.as_ref())).unwrap();
        assert_eq!(ticket.ticket_id, 7);
        assert_eq!(fx.http.calls()[0].method, "GET");
        assert_eq!(fx.http.calls()[0].path, "/api/ticket/7");
    }

    #[test]
    fn test_gateway_collection_null_body_is_empty() {
        let fx = Fixture::signed_in();
        let cred = fx.session.credential();
        let list: Vec<Technician> =
            block_on(fx.gateway.get_collection(Endpoint::Technicians, cred.as_ref())).unwrap();
        assert!(list.is_empty());
        assert_eq!(fx.http.calls()[0].path, "/api/technicians");
    }

    #[test]
    fn test_gateway_get_filtered_posts_predicate_document() {
        let fx = Fixture::signed_in();
        fx.http.reply(Ok(list_json(0, &[])));
        let cred = fx.session.credential();
        let query = TicketQuery::new(TicketFilter::open_only(), PageRequest::first(10));
        let list: TicketList =
            block_on(fx.gateway.get_filtered(Endpoint::Tickets, &query, cred.as_ref())).unwrap();
        assert_eq!(list.count, 0);
        let call = &fx.http.calls()[0];
        assert_eq!(call.method, "POST");
        assert_eq!(call.path, "/api/tickets");
        assert_eq!(call.body, Some(json!({ "closed": false, "page": 1, "page_size": 10 })));
    }

    #[test]
    fn test_gateway_propagates_transport_error() {
        let fx = Fixture::signed_in();
        fx.http.reply(Err(HelpdeskError::from_status(503, "unavailable")));
        let cred = fx.session.credential();
        let err = block_on(fx.gateway.mutate(Endpoint::ReopenTicket, &json!({"ticket_id": 1}), cred.as_ref()))
            .unwrap_err();
        assert!(err.is_retryable());
    }

    // ─── Session Tests ───────────────────────────────────────

    #[test]
    fn test_session_sign_in_sets_identity_and_credential_together() {
        let store = SessionStore::new();
        assert!(!store.is_signed_in());
        store.sign_in(user(), credential("a"));
        let session = store.current().unwrap();
        assert_eq!(session.identity, user());
        assert_eq!(session.credential.access_token, "a");
    }

    #[test]
    fn test_session_logout_clears_both() {
        let store = SessionStore::new();
        store.sign_in(user(), credential("a"));
        store.logout();
        assert!(store.identity().is_none());
        assert!(store.credential().is_none());
        assert!(store.current().is_none());
    }

    #[test]
    fn test_session_mutators_require_session() {
        let store = SessionStore::new();
        assert_eq!(store.set_credential(credential("x")), Err(HelpdeskError::AuthenticationRequired));
        assert_eq!(store.set_identity(user()), Err(HelpdeskError::AuthenticationRequired));
        assert!(store.current().is_none());

        store.sign_in(user(), credential("a"));
        store.set_credential(credential("b")).unwrap();
        store.set_identity(technician()).unwrap();
        let session = store.current().unwrap();
        assert_eq!(session.credential.access_token, "b");
        assert!(session.identity.is_technician());
    }

    #[test]
    fn test_session_service_sign_in_resolves_identity() {
        let fx = Fixture::signed_out();
        let idp = MockIdentity::new();
        fx.http.reply(Ok(json!({ "user_id": "t1", "user_name": "Grace", "group": "technicians" })));
        let service = SessionService::new(fx.session.clone(), idp, fx.gateway.clone(), fx.bus.clone());

        let identity = block_on(service.sign_in()).unwrap();
        assert!(identity.is_technician());
        assert_eq!(fx.http.calls()[0].path, "/api/users/me");
        assert_eq!(fx.session.credential().unwrap().access_token, "interactive");
        assert_eq!(navigations(&fx.bus.drain()), vec![Route::TechnicianPortal]);
    }

    #[test]
    fn test_session_service_sign_in_failure_leaves_store_empty() {
        let fx = Fixture::signed_out();
        fx.http.reply(Err(HelpdeskError::Network("offline".into())));
        let service =
            SessionService::new(fx.session.clone(), MockIdentity::new(), fx.gateway.clone(), fx.bus.clone());
        assert!(block_on(service.sign_in()).is_err());
        assert!(!fx.session.is_signed_in());
        assert!(navigations(&fx.bus.drain()).is_empty());
    }

    #[test]
    fn test_session_expire_clears_and_redirects() {
        let fx = Fixture::signed_in();
        fx.session.expire(&fx.bus);
        assert!(!fx.session.is_signed_in());
        assert_eq!(fx.session.credential(), None);
        let events = fx.bus.drain();
        assert!(events.iter().any(|e| matches!(e, ClientEvent::SessionChanged)));
        assert_eq!(navigations(&events), vec![Route::Login]);
        assert_eq!(guard(Route::Login, fx.session.identity().as_ref()), Route::Login);
    }

    #[test]
    fn test_session_expire_when_signed_out_only_redirects() {
        let fx = Fixture::signed_out();
        fx.session.expire(&fx.bus);
        let events = fx.bus.drain();
        assert!(!events.iter().any(|e| matches!(e, ClientEvent::SessionChanged)));
        assert_eq!(navigations(&events), vec![Route::Login]);
    }

    #[test]
    fn test_session_service_resume_is_silent() {
        let fx = Fixture::signed_out();
        let idp = MockIdentity::new();
        idp.silent.borrow_mut().push_back(Ok(credential("cached")));
        fx.http.reply(Ok(json!({ "user_id": "u1", "user_name": "Ada", "group": "users" })));
        let service = SessionService::new(fx.session.clone(), idp, fx.gateway.clone(), fx.bus.clone());

        let identity = block_on(service.resume()).unwrap();
        assert_eq!(identity.group, Group::User);
        assert_eq!(fx.session.credential().unwrap().access_token, "cached");
        assert!(navigations(&fx.bus.drain()).is_empty());
    }

    #[test]
    fn test_session_service_resume_without_cached_account() {
        let fx = Fixture::signed_out();
        let service =
            SessionService::new(fx.session.clone(), MockIdentity::new(), fx.gateway.clone(), fx.bus.clone());
        let err = block_on(service.resume()).unwrap_err();
        assert!(matches!(err, HelpdeskError::InteractionRequired(_)));
        assert!(!fx.session.is_signed_in());
        assert_eq!(fx.http.call_count(), 0);
    }

    #[test]
    fn test_session_service_sign_out() {
        let fx = Fixture::signed_in();
        let idp = MockIdentity::new();
        let service = SessionService::new(fx.session.clone(), idp.clone(), fx.gateway.clone(), fx.bus.clone());
        block_on(service.sign_out());
        assert!(idp.signed_out.get());
        assert!(!fx.session.is_signed_in());
        assert_eq!(navigations(&fx.bus.drain()), vec![Route::Login]);
    }

    // ─── Navigation Tests ────────────────────────────────────

    #[test]
    fn test_landing_route_by_group() {
        assert_eq!(landing_route(&technician()), Route::TechnicianPortal);
        assert_eq!(landing_route(&user()), Route::MyTickets);
        let nobody = Identity { group: Group::None, ..user() };
        assert_eq!(landing_route(&nobody), Route::AiChat);
    }

    #[test]
    fn test_guard_requires_session() {
        assert_eq!(guard(Route::AiChat, None), Route::Login);
        assert_eq!(guard(Route::Ticket(3), None), Route::Login);
        assert_eq!(guard(Route::Login, None), Route::Login);
        assert_eq!(guard(Route::NotFound, None), Route::NotFound);
    }

    #[test]
    fn test_guard_redirects_non_technician_from_portal() {
        assert_eq!(guard(Route::TechnicianPortal, Some(&user())), Route::MyTickets);
        assert_eq!(guard(Route::TechnicianPortal, Some(&technician())), Route::TechnicianPortal);
        assert_eq!(guard(Route::Ticket(9), Some(&user())), Route::Ticket(9));
        assert_eq!(guard(Route::Login, Some(&user())), Route::MyTickets);
    }

    // ─── Credential Refresh Tests ────────────────────────────

    #[test]
    fn test_refresh_delay_uses_lead() {
        let fx = Fixture::signed_out();
        let refresher = CredentialRefresher::new(
            fx.session.clone(),
            MockIdentity::new(),
            fx.timer.clone(),
            fx.bus.clone(),
            60,
        );
        assert_eq!(refresher.next_delay_ms(), None);

        fx.session.sign_in(user(), credential("a"));
        assert_eq!(refresher.next_delay_ms(), Some(9 * 60 * 1000));

        fx.timer.advance(20 * 60 * 1000);
        assert_eq!(refresher.next_delay_ms(), Some(1000));
    }

    #[test]
    fn test_refresh_once_replaces_credential() {
        let fx = Fixture::signed_in();
        let idp = MockIdentity::new();
        idp.silent.borrow_mut().push_back(Ok(credential("fresh")));
        let refresher =
            CredentialRefresher::new(fx.session.clone(), idp, fx.timer.clone(), fx.bus.clone(), 60);
        block_on(refresher.refresh_once()).unwrap();
        assert_eq!(fx.session.credential().unwrap().access_token, "fresh");
        assert_eq!(fx.session.identity(), Some(technician()));
    }

    #[test]
    fn test_refresh_interaction_required_redirects_without_toast() {
        let fx = Fixture::signed_in();
        let refresher = CredentialRefresher::new(
            fx.session.clone(),
            MockIdentity::new(),
            fx.timer.clone(),
            fx.bus.clone(),
            60,
        );
        let err = block_on(refresher.refresh_once()).unwrap_err();
        assert!(matches!(err, HelpdeskError::InteractionRequired(_)));
        assert!(!fx.session.is_signed_in());
        let events = fx.bus.drain();
        assert_eq!(navigations(&events), vec![Route::Login]);
        assert!(toasts(&events).is_empty());
    }

    #[test]
    fn test_refresh_other_failure_notifies() {
        let fx = Fixture::signed_in();
        let idp = MockIdentity::new();
        idp.silent.borrow_mut().push_back(Err(HelpdeskError::Network("down".into())));
        let refresher =
            CredentialRefresher::new(fx.session.clone(), idp, fx.timer.clone(), fx.bus.clone(), 60);
        assert!(block_on(refresher.refresh_once()).is_err());
        assert_eq!(toasts(&fx.bus.drain()).len(), 1);
    }

    #[test]
    fn test_refresh_loop_runs_until_failure() {
        let fx = Fixture::signed_in();
        let idp = MockIdentity::new();
        idp.silent.borrow_mut().push_back(Ok(credential("r1")));
        idp.silent.borrow_mut().push_back(Ok(credential("r2")));
        let refresher = CredentialRefresher::new(
            fx.session.clone(),
            idp.clone(),
            fx.timer.clone(),
            fx.bus.clone(),
            60,
        );
        block_on(refresher.run(PollHandle::new()));
        assert_eq!(idp.silent_calls.get(), 3);
        assert!(!fx.session.is_signed_in());
        assert_eq!(fx.timer.sleeps().len(), 3);
        assert_eq!(fx.timer.sleeps()[0], 9 * 60 * 1000);
    }

    #[test]
    fn test_refresh_loop_stops_when_cancelled() {
        let fx = Fixture::signed_in();
        let idp = MockIdentity::new();
        let refresher =
            CredentialRefresher::new(fx.session.clone(), idp.clone(), fx.timer.clone(), fx.bus.clone(), 60);
        let stop = PollHandle::new();
        stop.cancel();
        block_on(refresher.run(stop));
        assert_eq!(idp.silent_calls.get(), 0);
        assert!(fx.session.is_signed_in());
        assert_eq!(fx.timer.sleeps().len(), 1);
    }

    #[test]
    fn test_refresh_loop_without_session_returns_immediately() {
        let fx = Fixture::signed_out();
        let idp = MockIdentity::new();
        let refresher =
            CredentialRefresher::new(fx.session.clone(), idp.clone(), fx.timer.clone(), fx.bus.clone(), 60);
        block_on(refresher.run(PollHandle::new()));
        assert_eq!(idp.silent_calls.get(), 0);
        assert!(fx.timer.sleeps().is_empty());
    }

    // ─── Transcript Tests ────────────────────────────────────

    #[test]
    fn test_transcript_begin_turn_appends_pending() {
        let store = TranscriptStore::new();
        let pending = store.begin_turn("hello");
        assert_eq!(store.len(), 1);
        assert!(store.entries()[0].is_pending());
        assert_eq!(pending.text(), "hello");
        assert_eq!(pending.request.conversation, vec![("human".to_string(), "hello".to_string())]);
        assert_eq!(pending.request.execution_count, 0);
        assert!(!pending.request.ticket);

        store.confirm(&pending);
        assert!(!store.entries()[0].is_pending());
    }

    #[test]
    fn test_transcript_rollback_restores_counters() {
        let store = TranscriptStore::new();
        store.offer_ticket();
        store.increment_turns();
        let before = store.snapshot();

        let pending = store.begin_turn("more");
        assert!(!store.offer_ticket_action());
        store.rollback(&pending);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_transcript_reset_bumps_epoch() {
        let store = TranscriptStore::new();
        store.begin_turn("a");
        store.offer_ticket();
        let epoch = store.epoch();
        store.reset();
        assert!(store.is_empty());
        assert_eq!(store.turns_since_offer(), 0);
        assert!(!store.ticket_opened());
        assert!(!store.offer_ticket_action());
        assert_eq!(store.epoch(), epoch + 1);
    }

    #[test]
    fn test_transcript_load_drops_pending_entries() {
        let storage = MockStorage::default();
        let store = TranscriptStore::new();
        let pending = store.begin_turn("first");
        store.confirm(&pending);
        store.push_assistant("reply");
        store.begin_turn("lost on reload");
        block_on(store.save(&storage)).unwrap();

        let restored = TranscriptStore::new();
        block_on(restored.load(&storage)).unwrap();
        assert_eq!(
            restored.entries(),
            vec![ChatEntry::human("first"), ChatEntry::assistant("reply")]
        );
    }

    #[test]
    fn test_transcript_load_discards_corrupt_data() {
        let storage = MockStorage::default();
        storage
            .data
            .borrow_mut()
            .insert(TRANSCRIPT_STORAGE_KEY.to_string(), b"{not json".to_vec());
        let store = TranscriptStore::new();
        block_on(store.load(&storage)).unwrap();
        assert!(store.is_empty());
        assert!(storage.data.borrow().get(TRANSCRIPT_STORAGE_KEY).is_none());
    }

    #[test]
    fn test_transcript_load_without_data_is_noop() {
        let storage = MockStorage::default();
        let store = TranscriptStore::from_transcript(ChatTranscript {
            entries: vec![ChatEntry::human("keep")],
            ..ChatTranscript::default()
        });
        block_on(store.load(&storage)).unwrap();
        assert_eq!(store.len(), 1);
    }

    // ─── Orchestrator Tests ──────────────────────────────────

    #[test]
    fn test_orchestrator_monitor_example() {
        let fx = Fixture::signed_in();
        let orch = fx.orchestrator();
        fx.http.reply(reply("Can you specify the model?"));

        let outcome = block_on(orch.submit("My monitor does not work.")).unwrap();
        assert_eq!(outcome, TurnOutcome::Replied);

        let calls = fx.http.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].path, "/init_ai_workflow");
        assert_eq!(
            calls[0].body,
            Some(json!({
                "conversation": [["human", "My monitor does not work."]],
                "execution_count": 0,
                "ticket": false
            }))
        );

        let transcript = orch.transcript().snapshot();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.entries[1].speaker, Speaker::Assistant);
        assert_eq!(transcript.entries[1].text, "Can you specify the model?");
        assert_eq!(transcript.turns_since_offer, 1);
        assert!(!transcript.has_pending());
    }

    #[test]
    fn test_orchestrator_n_round_trips_give_2n_entries() {
        let fx = Fixture::signed_in();
        let orch = fx.orchestrator();
        for n in 1..=4 {
            fx.http.reply(reply(&format!("answer {}", n)));
            block_on(orch.submit(&format!("question {}", n))).unwrap();
            assert_eq!(orch.transcript().len(), 2 * n);
        }
        assert_eq!(orch.transcript().turns_since_offer(), 4);
        let last = fx.http.calls().last().cloned().unwrap();
        assert_eq!(last.body.unwrap()["execution_count"], json!(3));
    }

    #[test]
    fn test_orchestrator_empty_submission_is_ignored() {
        let fx = Fixture::signed_in();
        let orch = fx.orchestrator();
        assert_eq!(block_on(orch.submit("")).unwrap(), TurnOutcome::Ignored);
        assert_eq!(block_on(orch.submit("   \n\t")).unwrap(), TurnOutcome::Ignored);
        assert_eq!(orch.transcript().len(), 0);
        assert_eq!(fx.http.call_count(), 0);
        assert!(fx.bus.drain().is_empty());
    }

    #[test]
    fn test_orchestrator_first_proposal_offers_ticket() {
        let fx = Fixture::signed_in();
        let orch = fx.orchestrator();
        fx.http.reply(reply("Which model?"));
        fx.http.reply(proposal("Shall I open a ticket?"));
        block_on(orch.submit("Monitor broken")).unwrap();
        let outcome = block_on(orch.submit("Dell U2720")).unwrap();

        assert_eq!(outcome, TurnOutcome::TicketOffered);
        let store = orch.transcript();
        assert_eq!(store.len(), 4);
        assert!(store.offer_ticket_action());
        assert!(store.ticket_opened());
        assert_eq!(store.turns_since_offer(), 0);
        assert!(!orch.accepts_text());
    }

    #[test]
    fn test_orchestrator_second_proposal_is_not_reoffered() {
        let fx = Fixture::signed_in();
        let orch = fx.orchestrator();
        fx.http.reply(proposal("Open a ticket?"));
        fx.http.reply(proposal("Still want a ticket?"));
        block_on(orch.submit("help")).unwrap();
        let outcome = block_on(orch.submit("one more detail")).unwrap();

        assert_eq!(outcome, TurnOutcome::Replied);
        assert!(!orch.transcript().offer_ticket_action());
        assert_eq!(orch.transcript().turns_since_offer(), 1);
        assert_eq!(fx.http.calls()[1].body.as_ref().unwrap()["ticket"], json!(true));
    }

    #[test]
    fn test_orchestrator_ticket_created_resets_and_navigates() {
        let fx = Fixture::signed_in();
        let orch = fx.orchestrator();
        fx.http.reply(proposal("Open a ticket?"));
        fx.http.reply(Ok(json!({ "llm_output": "", "ticket": true, "ticket_id": 42 })));
        block_on(orch.submit("printer on fire")).unwrap();
        let outcome = block_on(orch.create_ticket()).unwrap();

        assert_eq!(outcome, TurnOutcome::TicketCreated(42));
        assert_eq!(orch.transcript().snapshot(), ChatTranscript::new());
        let events = fx.bus.drain();
        assert_eq!(navigations(&events), vec![Route::Ticket(42)]);
        assert!(toasts(&events).iter().any(|(level, _)| *level == NotificationLevel::Success));

        let saved = fx.storage.data.borrow().get(TRANSCRIPT_STORAGE_KEY).cloned().unwrap();
        let saved: ChatTranscript = serde_json::from_slice(&saved).unwrap();
        assert!(saved.is_empty());
    }

    #[test]
    fn test_orchestrator_create_ticket_equals_literal_prompt() {
        let run = |via_action: bool| {
            let fx = Fixture::signed_in();
            let orch = fx.orchestrator();
            fx.http.reply(proposal("Open a ticket?"));
            fx.http.reply(reply("Working on it"));
            block_on(orch.submit("vpn down")).unwrap();
            let outcome = if via_action {
                block_on(orch.create_ticket()).unwrap()
            } else {
                block_on(orch.submit(CREATE_TICKET_PROMPT)).unwrap()
            };
            (outcome, fx.http.calls(), orch.transcript().snapshot())
        };
        assert_eq!(run(true), run(false));
    }

    #[test]
    fn test_orchestrator_failure_rolls_back_and_notifies() {
        let fx = Fixture::signed_in();
        let orch = fx.orchestrator();
        fx.http.reply(reply("Hi"));
        block_on(orch.submit("hello")).unwrap();
        let before = orch.transcript().snapshot();
        fx.bus.drain();

        fx.http.reply(Err(HelpdeskError::Network("timeout".into())));
        let err = block_on(orch.submit("X")).unwrap_err();
        assert_eq!(err, HelpdeskError::Network("timeout".into()));
        assert_eq!(orch.transcript().snapshot(), before);
        assert!(!orch.is_busy());
        assert_eq!(
            toasts(&fx.bus.drain()),
            vec![(NotificationLevel::Error, "The AI failed to respond. Please try again.".to_string())]
        );
    }

    #[test]
    fn test_orchestrator_rollback_is_idempotent() {
        let fx = Fixture::signed_in();
        let orch = fx.orchestrator();
        fx.http.reply(proposal("Ticket?"));
        block_on(orch.submit("disk full")).unwrap();
        let before = orch.transcript().snapshot();

        fx.http.reply(Err(HelpdeskError::Network("a".into())));
        fx.http.reply(Err(HelpdeskError::Network("b".into())));
        assert!(block_on(orch.submit("X")).is_err());
        let after_first = orch.transcript().snapshot();
        assert!(block_on(orch.submit("X")).is_err());

        assert_eq!(after_first, before);
        assert_eq!(orch.transcript().snapshot(), before);
        assert!(orch.transcript().offer_ticket_action());
        let calls = fx.http.calls();
        assert_eq!(calls[1].body, calls[2].body);
    }

    #[test]
    fn test_orchestrator_without_session_redirects_to_login() {
        let fx = Fixture::signed_out();
        let orch = fx.orchestrator();
        let err = block_on(orch.submit("hello")).unwrap_err();
        assert_eq!(err, HelpdeskError::AuthenticationRequired);
        assert_eq!(fx.http.call_count(), 0);
        assert!(orch.transcript().is_empty());
        let events = fx.bus.drain();
        assert_eq!(navigations(&events), vec![Route::Login]);
        assert!(toasts(&events).is_empty());
    }

    #[test]
    fn test_orchestrator_rejected_credential_ends_session() {
        let fx = Fixture::signed_in();
        let orch = fx.orchestrator();
        fx.http.reply(Err(HelpdeskError::from_status(401, "token expired")));

        let err = block_on(orch.submit("My monitor does not work.")).unwrap_err();
        assert_eq!(err, HelpdeskError::AuthenticationRequired);
        assert!(orch.transcript().is_empty());
        assert!(!fx.session.is_signed_in());

        let events = fx.bus.drain();
        assert!(events.iter().any(|e| matches!(e, ClientEvent::SessionChanged)));
        assert!(toasts(&events).is_empty());
        let shown: Vec<Route> = navigations(&events)
            .into_iter()
            .map(|r| guard(r, fx.session.identity().as_ref()))
            .collect();
        assert_eq!(shown, vec![Route::Login]);
    }

    #[test]
    fn test_orchestrator_persists_every_turn() {
        let fx = Fixture::signed_in();
        let orch = fx.orchestrator();
        fx.http.reply(reply("ok"));
        block_on(orch.submit("persist me")).unwrap();

        let restored = ConversationOrchestrator::new(
            TranscriptStore::new(),
            fx.session.clone(),
            fx.gateway.clone(),
            fx.storage.clone(),
            fx.bus.clone(),
        );
        block_on(restored.restore()).unwrap();
        assert_eq!(restored.transcript().snapshot(), orch.transcript().snapshot());
    }

    #[test]
    fn test_orchestrator_reset_clears_transcript() {
        let fx = Fixture::signed_in();
        let orch = fx.orchestrator();
        fx.http.reply(proposal("Ticket?"));
        block_on(orch.submit("hello")).unwrap();
        block_on(orch.reset());
        assert_eq!(orch.transcript().snapshot(), ChatTranscript::new());
        assert!(orch.accepts_text());
    }

    /// Transport that runs a hook against the orchestrator while the
    /// workflow request is outstanding.
    struct HookedHttp {
        orch: RefCell<Option<ConversationOrchestrator>>,
        reset_during_flight: bool,
        observed: RefCell<Vec<String>>,
    }

    #[async_trait(?Send)]
    impl HttpPort for HookedHttp {
        async fn get(&self, _path: &str, _bearer: &str) -> Result<Value> {
            Ok(Value::Null)
        }

        async fn post(&self, _path: &str, _bearer: &str, _body: &Value) -> Result<Value> {
            let orch = self.orch.borrow().clone();
            if let Some(orch) = orch {
                self.observed
                    .borrow_mut()
                    .push(format!("busy={} generating={}", orch.is_busy(), orch.is_generating_ticket()));
                match orch.submit("second").await {
                    Err(e) => self.observed.borrow_mut().push(e.to_string()),
                    Ok(outcome) => self.observed.borrow_mut().push(format!("{:?}", outcome)),
                }
                if self.reset_during_flight {
                    orch.reset().await;
                }
            }
            Ok(json!({ "llm_output": "late reply", "ticket": false }))
        }
    }

    fn hooked(reset_during_flight: bool) -> (Rc<HookedHttp>, ConversationOrchestrator) {
        let http = Rc::new(HookedHttp {
            orch: RefCell::new(None),
            reset_during_flight,
            observed: RefCell::new(Vec::new()),
        });
        let session = SessionStore::new();
        session.sign_in(user(), credential("token"));
        let orch = ConversationOrchestrator::new(
            TranscriptStore::new(),
            session,
            Rc::new(RemoteGateway::new(http.clone())),
            Rc::new(MockStorage::default()),
            EventBus::new(),
        );
        *http.orch.borrow_mut() = Some(orch.clone());
        (http, orch)
    }

    #[test]
    fn test_orchestrator_single_flight() {
        let (http, orch) = hooked(false);
        let outcome = block_on(orch.submit("first")).unwrap();
        assert_eq!(outcome, TurnOutcome::Replied);
        assert_eq!(
            *http.observed.borrow(),
            vec![
                "busy=true generating=false".to_string(),
                HelpdeskError::Busy.to_string()
            ]
        );
        assert_eq!(orch.transcript().len(), 2);
        assert_eq!(orch.transcript().entries()[0].text, "first");
    }

    #[test]
    fn test_orchestrator_reports_ticket_generation_in_flight() {
        let (http, orch) = hooked(false);
        block_on(orch.create_ticket()).unwrap();
        assert_eq!(http.observed.borrow()[0], "busy=true generating=true");
        assert!(!orch.is_generating_ticket());
    }

    #[test]
    fn test_orchestrator_discards_response_after_reset() {
        let (_http, orch) = hooked(true);
        let outcome = block_on(orch.submit("first")).unwrap();
        assert_eq!(outcome, TurnOutcome::Discarded);
        assert!(orch.transcript().is_empty());
        assert!(!orch.is_busy());
    }

    // ─── Filter Store Tests ──────────────────────────────────

    #[test]
    fn test_filter_store_starts_with_open_tickets() {
        let store = FilterStore::new();
        assert_eq!(store.get(), TicketFilter::open_only());
    }

    #[test]
    fn test_filter_store_replaces_whole_value() {
        let store = FilterStore::new();
        store.replace(TicketFilter {
            closed: Some(true),
            ..TicketFilter::default()
        });
        store.replace(TicketFilter {
            assignee_id: Some("t1".into()),
            ..TicketFilter::default()
        });
        let filter = store.get();
        assert_eq!(filter.assignee_id.as_deref(), Some("t1"));
        assert_eq!(filter.closed, None);
        assert_eq!(serde_json::to_value(&filter).unwrap(), json!({ "assignee_id": "t1" }));
    }

    #[test]
    fn test_filter_store_reports_change() {
        let store = FilterStore::new();
        assert!(!store.replace(TicketFilter::open_only()));
        let next = store.get().with_order(Some(SortOrder::Asc));
        assert!(store.replace(next));
        let clone = store.clone();
        assert_eq!(clone.get().order, Some(SortOrder::Asc));
    }

    // ─── Query Layer Tests ───────────────────────────────────

    #[test]
    fn test_retry_policy_backoff() {
        let policy = RetryPolicy::new(2, 1000);
        assert_eq!(policy.delay_for(0), 1000);
        assert_eq!(policy.delay_for(1), 2000);
        assert_eq!(policy.delay_for(2), 4000);
        assert_eq!(policy.delay_for(40), 30_000);
        assert_eq!(RetryPolicy::from_config(&QueryConfig::default()), policy);
    }

    #[test]
    fn test_with_retry_gives_up_after_retries() {
        let timer = MockTimer::new();
        let attempts = Cell::new(0);
        let result: Result<()> = block_on(with_retry(RetryPolicy::new(2, 1000), timer.as_ref(), "x", || {
            attempts.set(attempts.get() + 1);
            async { Err(HelpdeskError::Network("down".into())) }
        }));
        assert!(result.is_err());
        assert_eq!(attempts.get(), 3);
        assert_eq!(timer.sleeps(), vec![1000, 2000]);
    }

    #[test]
    fn test_with_retry_skips_non_retryable() {
        let timer = MockTimer::new();
        let attempts = Cell::new(0);
        let result: Result<()> = block_on(with_retry(RetryPolicy::new(2, 1000), timer.as_ref(), "x", || {
            attempts.set(attempts.get() + 1);
            async { Err(HelpdeskError::from_status(404, "missing")) }
        }));
        assert!(result.is_err());
        assert_eq!(attempts.get(), 1);
        assert!(timer.sleeps().is_empty());
    }

    #[test]
    fn test_with_retry_recovers() {
        let timer = MockTimer::new();
        let attempts = Cell::new(0);
        let result = block_on(with_retry(RetryPolicy::new(2, 500), timer.as_ref(), "x", || {
            attempts.set(attempts.get() + 1);
            let n = attempts.get();
            async move {
                if n < 2 {
                    Err(HelpdeskError::from_status(502, "bad gateway"))
                } else {
                    Ok(n)
                }
            }
        }));
        assert_eq!(result, Ok(2));
        assert_eq!(timer.sleeps(), vec![500]);
    }

    #[test]
    fn test_query_cache_staleness() {
        let cache: QueryCache<u64, String> = QueryCache::new(Duration::minutes(2));
        cache.insert(1, "a".into(), t0());
        assert_eq!(cache.get_fresh(&1, t0() + Duration::seconds(30)), Some("a".into()));
        assert_eq!(cache.get_fresh(&1, t0() + Duration::minutes(3)), None);
        assert_eq!(cache.get_any(&1), Some("a".into()));

        assert_eq!(cache.update(&1, |v| v.push('b')), Some("ab".into()));
        assert_eq!(cache.update(&2, |v| v.push('b')), None);

        cache.invalidate(&1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_query_cache_insert_evicts_stale_entries() {
        let cache: QueryCache<String, u32> = QueryCache::new(Duration::minutes(2));
        cache.insert("printer".into(), 1, t0());
        cache.insert("vpn".into(), 2, t0() + Duration::minutes(1));
        assert_eq!(cache.len(), 2);

        cache.insert("monitor".into(), 3, t0() + Duration::minutes(2) + Duration::seconds(30));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get_any(&"printer".to_string()), None);
        assert_eq!(cache.get_any(&"vpn".to_string()), Some(2));
    }

    // ─── Ticket Service Tests ────────────────────────────────

    #[test]
    fn test_tickets_list_is_cached_until_stale() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        let query = TicketQuery::new(TicketFilter::open_only(), PageRequest::first(10));
        fx.http.reply(Ok(list_json(12, &[1, 2])));

        let list = block_on(service.fetch_filtered_tickets(&query, false)).unwrap();
        assert_eq!(list.page_count(10), 2);
        block_on(service.fetch_filtered_tickets(&query, false)).unwrap();
        assert_eq!(fx.http.call_count(), 1);

        let page2 = TicketQuery::new(TicketFilter::open_only(), PageRequest::new(2, 10));
        fx.http.reply(Ok(list_json(12, &[11])));
        block_on(service.fetch_filtered_tickets(&page2, false)).unwrap();
        assert_eq!(fx.http.call_count(), 2);

        fx.timer.advance(3 * 60 * 1000);
        fx.http.reply(Ok(list_json(12, &[1, 2])));
        block_on(service.fetch_filtered_tickets(&query, false)).unwrap();
        assert_eq!(fx.http.call_count(), 3);
    }

    #[test]
    fn test_tickets_my_tickets_endpoint() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        fx.http.reply(Ok(list_json(1, &[5])));
        let query = TicketQuery::new(TicketFilter::default(), PageRequest::first(10));
        block_on(service.load_my_tickets(&query, false));
        assert_eq!(fx.http.calls()[0].path, "/api/my-tickets");
        assert_eq!(fx.http.calls()[0].body, Some(json!({ "page": 1, "page_size": 10 })));
        assert!(matches!(fx.bus.drain().as_slice(), [ClientEvent::MyTicketsLoaded(list)] if list.count == 1));
    }

    #[test]
    fn test_tickets_query_retries_twice() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        fx.http.reply(Err(HelpdeskError::Network("a".into())));
        fx.http.reply(Err(HelpdeskError::Network("b".into())));
        fx.http.reply(Ok(ticket_json(3, false)));
        let ticket = block_on(service.fetch_ticket(3, false)).unwrap();
        assert_eq!(ticket.ticket_id, 3);
        assert_eq!(fx.http.call_count(), 3);
        assert_eq!(fx.timer.sleeps(), vec![1000, 2000]);
    }

    #[test]
    fn test_tickets_load_failure_reports() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        for _ in 0..3 {
            fx.http.reply(Err(HelpdeskError::Network("down".into())));
        }
        block_on(service.load_technicians(false));
        assert_eq!(fx.http.call_count(), 3);
        let events = fx.bus.drain();
        assert!(events
            .iter()
            .any(|e| matches!(e, ClientEvent::LoadFailed { what, .. } if what == "technicians")));
        assert_eq!(toasts(&events).len(), 1);
    }

    #[test]
    fn test_tickets_load_without_session_redirects() {
        let fx = Fixture::signed_out();
        let service = fx.tickets();
        block_on(service.load_ticket(1, false));
        assert_eq!(fx.http.call_count(), 0);
        assert_eq!(navigations(&fx.bus.drain()), vec![Route::Login]);
    }

    #[test]
    fn test_tickets_rejected_credential_ends_session() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        fx.http.reply(Err(HelpdeskError::from_status(401, "token expired")));
        let query = TicketQuery::new(TicketFilter::default(), PageRequest::first(10));

        block_on(service.load_my_tickets(&query, false));
        assert_eq!(fx.http.call_count(), 1);
        assert!(!fx.session.is_signed_in());

        let events = fx.bus.drain();
        assert!(toasts(&events).is_empty());
        let shown: Vec<Route> = navigations(&events)
            .into_iter()
            .map(|r| guard(r, fx.session.identity().as_ref()))
            .collect();
        assert_eq!(shown, vec![Route::Login]);

        // The redirected view does not load again without a session.
        block_on(service.load_my_tickets(&query, false));
        assert_eq!(fx.http.call_count(), 1);
    }

    #[test]
    fn test_tickets_mutation_rejected_credential_ends_session() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        fx.http.reply(Ok(ticket_json(6, false)));
        block_on(service.fetch_ticket(6, false)).unwrap();
        fx.bus.drain();

        fx.http.reply(Err(HelpdeskError::from_status(401, "token expired")));
        assert!(block_on(service.close(6)).is_err());
        assert!(!service.cached_ticket(6).unwrap().is_closed());
        assert!(!fx.session.is_signed_in());
        let events = fx.bus.drain();
        assert!(toasts(&events).is_empty());
        assert_eq!(navigations(&events), vec![Route::Login]);
    }

    #[test]
    fn test_tickets_assign_unassigned_literal() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        block_on(service.assign(8, None)).unwrap();
        let call = &fx.http.calls()[0];
        assert_eq!(call.path, "/api/assign-ticket");
        assert_eq!(call.body, Some(json!({ "ticket_id": 8, "assignee_id": "Unassigned" })));
    }

    #[test]
    fn test_tickets_mutation_never_retries() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        fx.http.reply(Err(HelpdeskError::Network("down".into())));
        assert!(block_on(service.assign(8, Some("t1"))).is_err());
        assert_eq!(fx.http.call_count(), 1);
        assert!(fx.timer.sleeps().is_empty());
        assert_eq!(
            toasts(&fx.bus.drain()),
            vec![(NotificationLevel::Error, "Failed to assign Ticket. Please try again.".to_string())]
        );
    }

    #[test]
    fn test_tickets_post_message_rejected_when_closed() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        fx.http.reply(Ok(ticket_json(4, true)));
        block_on(service.fetch_ticket(4, false)).unwrap();

        let err = block_on(service.post_message(4, "anyone?")).unwrap_err();
        assert_eq!(err, HelpdeskError::TicketClosed(4));
        assert_eq!(fx.http.call_count(), 1);
    }

    #[test]
    fn test_tickets_post_message_is_optimistic() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        fx.http.reply(Ok(ticket_json(4, false)));
        block_on(service.fetch_ticket(4, false)).unwrap();
        fx.bus.drain();

        fx.http.reply(Ok(Value::Null));
        fx.http.reply(Err(HelpdeskError::Network("refetch failed".into())));
        fx.http.reply(Err(HelpdeskError::Network("refetch failed".into())));
        fx.http.reply(Err(HelpdeskError::Network("refetch failed".into())));
        block_on(service.post_message(4, "  restarted it  ")).unwrap();

        let call = &fx.http.calls()[1];
        assert_eq!(call.path, "/api/insert-ticket-message");
        let body = call.body.clone().unwrap();
        assert_eq!(body["ticket_id"], json!(4));
        assert_eq!(body["message"], json!("restarted it"));

        let cached = service.cached_ticket(4).unwrap();
        assert_eq!(cached.ticket_messages.len(), 1);
        assert_eq!(cached.ticket_messages[0].author_name, "Grace");
        assert_eq!(cached.ticket_messages[0].group, "technicians");
    }

    #[test]
    fn test_tickets_post_message_failure_removes_optimistic_entry() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        fx.http.reply(Ok(ticket_json(4, false)));
        block_on(service.fetch_ticket(4, false)).unwrap();
        fx.bus.drain();

        fx.http.reply(Err(HelpdeskError::Network("down".into())));
        assert!(block_on(service.post_message(4, "hello")).is_err());
        assert!(service.cached_ticket(4).unwrap().ticket_messages.is_empty());
        let events = fx.bus.drain();
        let loaded: Vec<usize> = events
            .iter()
            .filter_map(|e| match e {
                ClientEvent::TicketLoaded(t) => Some(t.ticket_messages.len()),
                _ => None,
            })
            .collect();
        assert_eq!(loaded, vec![1, 0]);
        assert_eq!(toasts(&events).len(), 1);
    }

    #[test]
    fn test_tickets_close_updates_cache_and_invalidates_lists() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        let query = TicketQuery::new(TicketFilter::open_only(), PageRequest::first(10));
        fx.http.reply(Ok(list_json(1, &[6])));
        block_on(service.fetch_filtered_tickets(&query, false)).unwrap();
        fx.http.reply(Ok(ticket_json(6, false)));
        block_on(service.fetch_ticket(6, false)).unwrap();

        block_on(service.close(6)).unwrap();
        assert_eq!(fx.http.calls()[2].path, "/api/close-ticket");
        assert_eq!(fx.http.calls()[2].body, Some(json!({ "ticket_id": 6 })));
        assert!(service.cached_ticket(6).unwrap().is_closed());

        fx.http.reply(Ok(list_json(0, &[])));
        block_on(service.fetch_filtered_tickets(&query, false)).unwrap();
        assert_eq!(fx.http.call_count(), 4);
    }

    #[test]
    fn test_tickets_reopen_failure_reverts() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        fx.http.reply(Ok(ticket_json(6, true)));
        block_on(service.fetch_ticket(6, false)).unwrap();

        fx.http.reply(Err(HelpdeskError::from_status(500, "oops")));
        assert!(block_on(service.reopen(6)).is_err());
        assert!(service.cached_ticket(6).unwrap().is_closed());
        assert_eq!(fx.http.call_count(), 2);
    }

    #[test]
    fn test_tickets_poll_failure_is_quiet() {
        let fx = Fixture::signed_in();
        let service = fx.tickets();
        for _ in 0..3 {
            fx.http.reply(Err(HelpdeskError::Network("down".into())));
        }
        block_on(service.poll_ticket(2));
        assert!(toasts(&fx.bus.drain()).is_empty());
    }

    // ─── Poller Tests ────────────────────────────────────────

    #[test]
    fn test_poller_stops_when_cancelled() {
        let timer = MockTimer::new();
        let handle = PollHandle::new();
        let ticks = Cell::new(0);
        let stopper = handle.clone();
        let count = block_on(run_poll(handle, timer.clone(), 5000, || {
            ticks.set(ticks.get() + 1);
            if ticks.get() == 3 {
                stopper.cancel();
            }
            async {}
        }));
        assert_eq!(count, 3);
        assert_eq!(timer.sleeps(), vec![5000; 4]);
    }

    #[test]
    fn test_poller_cancelled_before_first_tick() {
        let timer = MockTimer::new();
        let handle = PollHandle::new();
        handle.cancel();
        let count = block_on(run_poll(handle, timer.clone(), 5000, || async {}));
        assert_eq!(count, 0);
        assert_eq!(timer.sleeps(), vec![5000]);
    }
}
