//! Startup helpers: effective configuration and the queries each view
//! issues when it opens.

use helpdesk_types::{
    config::ClientConfig,
    filter::{PageRequest, TicketFilter, TicketQuery},
    route::Route,
};

/// Backend origin baked in at build time, if any.
const BACKEND_URL_OVERRIDE: Option<&str> = option_env!("HELPDESK_BACKEND_URL");

/// Defaults plus the build-time backend override.
pub fn base_config() -> ClientConfig {
    with_backend_override(ClientConfig::default(), BACKEND_URL_OVERRIDE)
}

pub fn with_backend_override(mut config: ClientConfig, backend_url: Option<&str>) -> ClientConfig {
    if let Some(url) = backend_url.map(str::trim).filter(|u| !u.is_empty()) {
        config.backend_url = url.to_string();
    }
    config
}

/// Decode a stored configuration. Invalid data is logged and ignored.
pub fn decode_config(data: &[u8]) -> Option<ClientConfig> {
    match ClientConfig::from_json(data) {
        Ok(config) => Some(config),
        Err(e) => {
            log::warn!("Ignoring stored config: {}", e);
            None
        }
    }
}

/// Backlog request for the technician portal.
pub fn backlog_query(filter: TicketFilter, page: u32, page_size: u32) -> TicketQuery {
    TicketQuery::new(filter, PageRequest::new(page, page_size))
}

/// "My tickets" carries no predicate beyond the page.
pub fn my_tickets_query(page: u32, page_size: u32) -> TicketQuery {
    TicketQuery::new(TicketFilter::default(), PageRequest::new(page, page_size))
}

/// Where "Back" leads from a ticket.
pub fn back_route(is_technician: bool) -> Route {
    if is_technician {
        Route::TechnicianPortal
    } else {
        Route::MyTickets
    }
}
