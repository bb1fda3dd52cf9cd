//! Main egui application: composes the views and owns background tasks
//! (session resume, credential refresh, ticket polling).

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use egui::{self, CentralPanel, RichText, TopBottomPanel};

use helpdesk_core::event_bus::EventBus;
use helpdesk_core::filter::FilterStore;
use helpdesk_core::gateway::RemoteGateway;
use helpdesk_core::navigation::guard;
use helpdesk_core::orchestrator::ConversationOrchestrator;
use helpdesk_core::poller::{run_poll, PollHandle};
use helpdesk_core::ports::{HttpPort, IdentityPort, StoragePort, TimerPort};
use helpdesk_core::refresh::CredentialRefresher;
use helpdesk_core::session::{SessionService, SessionStore};
use helpdesk_core::tickets::TicketService;
use helpdesk_core::transcript::TranscriptStore;
use helpdesk_platform::history;
use helpdesk_platform::http::GlooHttp;
use helpdesk_platform::identity::JsIdentityBridge;
use helpdesk_platform::storage::open_storage;
use helpdesk_platform::timer::BrowserTimer;
use helpdesk_types::config::{ClientConfig, CONFIG_STORAGE_KEY};
use helpdesk_types::event::Notification;
use helpdesk_types::route::Route;
use helpdesk_types::HelpdeskError;
use helpdesk_ui::panels::chat::{self, ChatAction};
use helpdesk_ui::panels::nav::{self, NavAction};
use helpdesk_ui::panels::ticket_detail::{self, TicketAction};
use helpdesk_ui::panels::tickets::{self, FilterBar, ListView, TicketListAction};
use helpdesk_ui::panels::{login, toasts};
use helpdesk_ui::state::UiState;
use helpdesk_ui::theme;

use crate::startup;

/// Repaint cadence while something on screen is waiting
const IDLE_REPAINT: Duration = Duration::from_millis(250);

/// State that survives a rebuild of the services
#[derive(Clone)]
struct Stores {
    bus: EventBus,
    session: SessionStore,
    transcript: TranscriptStore,
    filter: FilterStore,
    storage: Rc<dyn StoragePort>,
    timer: Rc<dyn TimerPort>,
}

/// Everything built from one `ClientConfig`
struct Services {
    session: Rc<SessionService>,
    refresher: Rc<CredentialRefresher>,
    orchestrator: ConversationOrchestrator,
    tickets: TicketService,
}

impl Services {
    fn build(config: &ClientConfig, stores: &Stores) -> Self {
        let http: Rc<dyn HttpPort> = Rc::new(GlooHttp::new(config.clone()));
        let gateway = Rc::new(RemoteGateway::new(http));
        let identity: Rc<dyn IdentityPort> =
            Rc::new(JsIdentityBridge::new(config.identity.clone()));

        Self {
            session: Rc::new(SessionService::new(
                stores.session.clone(),
                identity.clone(),
                gateway.clone(),
                stores.bus.clone(),
            )),
            refresher: Rc::new(CredentialRefresher::new(
                stores.session.clone(),
                identity,
                stores.timer.clone(),
                stores.bus.clone(),
                config.refresh_lead_secs,
            )),
            orchestrator: ConversationOrchestrator::new(
                stores.transcript.clone(),
                stores.session.clone(),
                gateway.clone(),
                stores.storage.clone(),
                stores.bus.clone(),
            ),
            tickets: TicketService::new(
                gateway,
                stores.session.clone(),
                stores.timer.clone(),
                stores.bus.clone(),
                &config.query,
            ),
        }
    }
}

/// What the user asked for this frame
enum Intent {
    SignIn,
    Nav(NavAction),
    Chat(ChatAction),
    Backlog(TicketListAction),
    Mine(TicketListAction),
    Ticket(TicketAction),
}

/// The main application state
pub struct HelpdeskApp {
    ui_state: UiState,
    config: ClientConfig,
    stores: Stores,
    services: Services,
    /// Filled once by the startup task
    restored_config: Rc<RefCell<Option<ClientConfig>>>,
    /// Deep link to open once the session is resumed (or not)
    pending_route: Option<Route>,
    signing_in: Rc<Cell<bool>>,
    poll: Option<(u64, PollHandle)>,
    refresh: Option<PollHandle>,
    ctx: egui::Context,
    first_frame: bool,
}

impl HelpdeskApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        let config = startup::base_config();
        let stores = Stores {
            bus: EventBus::new(),
            session: SessionStore::new(),
            transcript: TranscriptStore::new(),
            filter: FilterStore::new(),
            storage: open_storage(config.storage.backend),
            timer: Rc::new(BrowserTimer::new()),
        };
        let services = Services::build(&config, &stores);

        let app = Self {
            ui_state: UiState::new(),
            config,
            stores,
            services,
            restored_config: Rc::new(RefCell::new(None)),
            pending_route: Some(history::current_route()),
            signing_in: Rc::new(Cell::new(true)),
            poll: None,
            refresh: None,
            ctx: cc.egui_ctx.clone(),
            first_frame: true,
        };

        app.restore_config();
        app.restore_transcript();
        app
    }

    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        let ctx = self.ctx.clone();
        wasm_bindgen_futures::spawn_local(async move {
            task.await;
            ctx.request_repaint();
        });
    }

    /// Load the stored config (async). Without one, the defaults are
    /// written back so they can be edited in place.
    fn restore_config(&self) {
        let storage = self.stores.storage.clone();
        let slot = self.restored_config.clone();
        let fallback = self.config.clone();
        self.spawn(async move {
            let stored = match storage.get(CONFIG_STORAGE_KEY).await {
                Ok(data) => data.and_then(|d| startup::decode_config(&d)),
                Err(e) => {
                    log::warn!("Could not read stored config: {}", e);
                    None
                }
            };
            let config = match stored {
                Some(config) => {
                    log::info!("Config restored from storage");
                    config
                }
                None => {
                    save_config(storage.as_ref(), &fallback).await;
                    fallback
                }
            };
            *slot.borrow_mut() = Some(config);
        });
    }

    fn restore_transcript(&self) {
        let orchestrator = self.services.orchestrator.clone();
        self.spawn(async move {
            if let Err(e) = orchestrator.restore().await {
                log::warn!("Could not restore chat transcript: {}", e);
            }
        });
    }

    fn apply_config(&mut self, config: ClientConfig) {
        if config != self.config {
            log::info!("Applying stored configuration");
            if config.storage.backend != self.config.storage.backend {
                log::info!("Storage backend change takes effect on next load");
            }
            if let Some(handle) = self.refresh.take() {
                handle.cancel();
            }
            self.stop_poll();
            self.services = Services::build(&config, &self.stores);
            self.config = config;
            self.sync_session();
        }

        if let Some(route) = self.pending_route.take() {
            self.resume_session(route);
        }
    }

    /// Try a silent sign-in, then open `requested` through the guard.
    fn resume_session(&self, requested: Route) {
        let session = self.services.session.clone();
        let bus = self.stores.bus.clone();
        let signing_in = self.signing_in.clone();
        signing_in.set(true);
        self.spawn(async move {
            if let Err(e) = session.resume().await {
                log::info!("No session to resume: {}", e);
            }
            signing_in.set(false);
            bus.navigate(requested);
        });
    }

    // ─── Projections ─────────────────────────────────────────

    fn sync_projections(&mut self) {
        if self.ui_state.session_stale {
            self.sync_session();
        }
        if self.ui_state.transcript_stale {
            self.ui_state.set_transcript(self.stores.transcript.snapshot());
        }
        self.ui_state.signing_in = self.signing_in.get();
        self.ui_state.generating_ticket = self.services.orchestrator.is_generating_ticket();
    }

    /// Start or stop the session's background tasks to match the store.
    fn sync_session(&mut self) {
        let identity = self.stores.session.identity();
        match (identity.is_some(), self.refresh.is_some()) {
            (true, false) => self.start_refresh(),
            (false, true) => {
                if let Some(handle) = self.refresh.take() {
                    handle.cancel();
                }
                self.stop_poll();
            }
            _ => {}
        }
        self.ui_state.set_identity(identity);
    }

    fn start_refresh(&mut self) {
        let handle = PollHandle::new();
        let refresher = self.services.refresher.clone();
        let stop = handle.clone();
        self.spawn(async move { refresher.run(stop).await });
        self.refresh = Some(handle);
    }

    // ─── Routing ─────────────────────────────────────────────

    fn go(&mut self, requested: Route) {
        let identity = self.stores.session.identity();
        let route = guard(requested, identity.as_ref());
        if route != requested {
            log::debug!("Route {} redirected to {}", requested, route);
        }
        self.ui_state.open_route(route);
        if let Err(e) = history::push_route(route) {
            log::warn!("Could not update the address bar: {}", e);
        }
        self.enter(route);
    }

    /// Kick off the loads a view needs and tie the poller to the detail view.
    fn enter(&mut self, route: Route) {
        match route {
            Route::Ticket(id) => self.start_poll(id),
            _ => self.stop_poll(),
        }

        match route {
            Route::TechnicianPortal => {
                self.load_technicians();
                self.load_backlog(false);
            }
            Route::MyTickets => self.load_mine(false),
            Route::Ticket(id) => {
                let tickets = self.services.tickets.clone();
                self.spawn(async move { tickets.load_ticket(id, false).await });
                if self.ui_state.is_technician() {
                    self.load_technicians();
                }
            }
            Route::Login | Route::AiChat | Route::NotFound => {}
        }
    }

    fn start_poll(&mut self, ticket_id: u64) {
        if matches!(self.poll, Some((id, _)) if id == ticket_id) {
            return;
        }
        self.stop_poll();

        let handle = PollHandle::new();
        let tickets = self.services.tickets.clone();
        let timer = self.stores.timer.clone();
        let interval = u64::from(self.config.ticket_poll_interval_ms);
        let ctx = self.ctx.clone();
        let stop = handle.clone();
        self.spawn(async move {
            run_poll(stop, timer, interval, || {
                let tickets = tickets.clone();
                let ctx = ctx.clone();
                async move {
                    tickets.poll_ticket(ticket_id).await;
                    ctx.request_repaint();
                }
            })
            .await;
        });
        log::debug!("Polling ticket {} every {}ms", ticket_id, interval);
        self.poll = Some((ticket_id, handle));
    }

    fn stop_poll(&mut self) {
        if let Some((_, handle)) = self.poll.take() {
            handle.cancel();
        }
    }

    // ─── Loads ───────────────────────────────────────────────

    fn load_backlog(&self, force: bool) {
        let query = startup::backlog_query(
            self.stores.filter.get(),
            self.ui_state.page,
            self.config.page_size,
        );
        let tickets = self.services.tickets.clone();
        self.spawn(async move { tickets.load_tickets(&query, force).await });
    }

    fn load_mine(&self, force: bool) {
        let query = startup::my_tickets_query(self.ui_state.my_page, self.config.page_size);
        let tickets = self.services.tickets.clone();
        self.spawn(async move { tickets.load_my_tickets(&query, force).await });
    }

    fn load_technicians(&self) {
        let tickets = self.services.tickets.clone();
        self.spawn(async move { tickets.load_technicians(false).await });
    }
}

impl eframe::App for HelpdeskApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.first_frame {
            theme::apply_theme(ctx);
            self.first_frame = false;
        }

        let restored = self.restored_config.borrow_mut().take();
        if let Some(config) = restored {
            self.apply_config(config);
        }

        // Drain events from background tasks
        let events = self.stores.bus.drain();
        if !events.is_empty() {
            let navigations = self.ui_state.process_events(events);
            self.sync_projections();
            for route in navigations {
                self.go(route);
            }
            ctx.request_repaint();
        }
        self.sync_projections();

        self.ui_state.expire_toasts(self.stores.timer.now());
        if self.ui_state.needs_repaint() {
            ctx.request_repaint_after(IDLE_REPAINT);
        }

        let mut intent = None;

        if self.ui_state.identity.is_some() && self.ui_state.route != Route::Login {
            TopBottomPanel::top("nav_bar").show(ctx, |ui| {
                if let Some(action) = nav::nav_bar(ui, &self.ui_state) {
                    intent = Some(Intent::Nav(action));
                }
            });
        }

        toasts::toasts_overlay(ctx, &mut self.ui_state);

        let view = CentralPanel::default()
            .show(ctx, |ui| self.render_view(ui))
            .inner;
        if let Some(action) = view {
            intent = Some(action);
        }

        if let Some(intent) = intent {
            self.dispatch(intent);
        }
    }
}

impl HelpdeskApp {
    fn render_view(&mut self, ui: &mut egui::Ui) -> Option<Intent> {
        let page_size = self.config.page_size;
        let state = &mut self.ui_state;
        match state.route {
            Route::Login => login::login_panel(ui, state.signing_in).then_some(Intent::SignIn),
            Route::AiChat => chat::chat_panel(ui, state).map(Intent::Chat),
            Route::TechnicianPortal => {
                let filter = self.stores.filter.get();
                let view = ListView {
                    title: Route::TechnicianPortal.label(),
                    list: state.tickets.as_ref(),
                    page: state.page,
                    page_size,
                    error: state.last_error.as_deref(),
                    filter: Some(FilterBar {
                        filter: &filter,
                        technicians: &state.technicians,
                        search: &mut state.search_input,
                    }),
                };
                tickets::ticket_list_panel(ui, view).map(Intent::Backlog)
            }
            Route::MyTickets => {
                let view = ListView {
                    title: Route::MyTickets.label(),
                    list: state.my_tickets.as_ref(),
                    page: state.my_page,
                    page_size,
                    error: state.last_error.as_deref(),
                    filter: None,
                };
                tickets::ticket_list_panel(ui, view).map(Intent::Mine)
            }
            Route::Ticket(_) => ticket_detail::ticket_detail_panel(ui, state).map(Intent::Ticket),
            Route::NotFound => {
                let mut intent = None;
                ui.vertical_centered(|ui| {
                    ui.add_space(48.0);
                    ui.heading(RichText::new("Page not found").color(theme::TEXT_PRIMARY));
                    ui.add_space(12.0);
                    if ui.button("Go home").clicked() {
                        intent = Some(Intent::Nav(NavAction::Go(Route::Login)));
                    }
                });
                intent
            }
        }
    }

    fn dispatch(&mut self, intent: Intent) {
        match intent {
            Intent::SignIn => self.sign_in(),
            Intent::Nav(NavAction::Go(route)) => self.go(route),
            Intent::Nav(NavAction::SignOut) => {
                let session = self.services.session.clone();
                self.spawn(async move { session.sign_out().await });
            }
            Intent::Chat(action) => self.dispatch_chat(action),
            Intent::Backlog(action) => self.dispatch_backlog(action),
            Intent::Mine(action) => match action {
                TicketListAction::Open(id) => self.go(Route::Ticket(id)),
                TicketListAction::Page(page) => {
                    self.ui_state.my_page = page;
                    self.load_mine(false);
                }
                TicketListAction::Refresh => self.load_mine(true),
                TicketListAction::SetFilter(_) => {}
            },
            Intent::Ticket(action) => self.dispatch_ticket(action),
        }
    }

    fn sign_in(&self) {
        let session = self.services.session.clone();
        let bus = self.stores.bus.clone();
        let signing_in = self.signing_in.clone();
        signing_in.set(true);
        self.spawn(async move {
            if let Err(e) = session.sign_in().await {
                log::warn!("Sign-in failed: {}", e);
                bus.notify(Notification::error("Sign-in failed. Please try again."));
            }
            signing_in.set(false);
        });
    }

    fn dispatch_chat(&self, action: ChatAction) {
        let orchestrator = self.services.orchestrator.clone();
        match action {
            ChatAction::Send(text) => self.spawn(async move {
                report_turn(orchestrator.submit(&text).await);
            }),
            ChatAction::CreateTicket => self.spawn(async move {
                report_turn(orchestrator.create_ticket().await);
            }),
            ChatAction::Reset => self.spawn(async move { orchestrator.reset().await }),
        }
    }

    fn dispatch_backlog(&mut self, action: TicketListAction) {
        match action {
            TicketListAction::Open(id) => self.go(Route::Ticket(id)),
            TicketListAction::SetFilter(filter) => {
                if self.stores.filter.replace(filter) {
                    self.ui_state.page = 1;
                    self.load_backlog(false);
                }
            }
            TicketListAction::Page(page) => {
                self.ui_state.page = page;
                self.load_backlog(false);
            }
            TicketListAction::Refresh => self.load_backlog(true),
        }
    }

    fn dispatch_ticket(&mut self, action: TicketAction) {
        let Route::Ticket(id) = self.ui_state.route else {
            return;
        };
        let tickets = self.services.tickets.clone();
        match action {
            TicketAction::Send(text) => self.spawn(async move {
                if let Err(e) = tickets.post_message(id, &text).await {
                    log::debug!("Message to ticket {} not sent: {}", id, e);
                }
            }),
            TicketAction::Assign(assignee) => self.spawn(async move {
                let _ = tickets.assign(id, assignee.as_deref()).await;
            }),
            TicketAction::Close => self.spawn(async move {
                let _ = tickets.close(id).await;
            }),
            TicketAction::Reopen => self.spawn(async move {
                let _ = tickets.reopen(id).await;
            }),
            TicketAction::Open(other) => self.go(Route::Ticket(other)),
            TicketAction::Back => self.go(startup::back_route(self.ui_state.is_technician())),
        }
    }
}

/// Workflow failures are already surfaced by the orchestrator.
fn report_turn<T: std::fmt::Debug>(result: helpdesk_types::Result<T>) {
    match result {
        Ok(outcome) => log::debug!("Chat turn finished: {:?}", outcome),
        Err(HelpdeskError::Busy) => log::debug!("Chat turn rejected: request in flight"),
        Err(e) => log::debug!("Chat turn failed: {}", e),
    }
}

async fn save_config(storage: &dyn StoragePort, config: &ClientConfig) {
    match serde_json::to_vec(config) {
        Ok(json) => match storage.set(CONFIG_STORAGE_KEY, &json).await {
            Ok(()) => log::info!("Config saved to storage"),
            Err(e) => log::warn!("Could not save config: {}", e),
        },
        Err(e) => log::warn!("Could not encode config: {}", e),
    }
}
