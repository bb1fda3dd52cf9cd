use std::fmt;

use serde::{Deserialize, Serialize};

/// Client-side views, addressed by path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Route {
    Login,
    AiChat,
    TechnicianPortal,
    MyTickets,
    Ticket(u64),
    NotFound,
}

impl Route {
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" | "/login" => Route::Login,
            "/ai-chat" => Route::AiChat,
            "/technician-portal" => Route::TechnicianPortal,
            "/my-tickets" => Route::MyTickets,
            other => other
                .strip_prefix("/ticket/")
                .and_then(|id| id.parse().ok())
                .map(Route::Ticket)
                .unwrap_or(Route::NotFound),
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/".to_string(),
            Route::AiChat => "/ai-chat".to_string(),
            Route::TechnicianPortal => "/technician-portal".to_string(),
            Route::MyTickets => "/my-tickets".to_string(),
            Route::Ticket(id) => format!("/ticket/{}", id),
            Route::NotFound => "/404".to_string(),
        }
    }

    /// Routes shown in the navigation bar
    pub fn nav_items() -> &'static [Route] {
        &[Route::AiChat, Route::TechnicianPortal, Route::MyTickets]
    }

    pub fn label(&self) -> &'static str {
        match self {
            Route::Login => "Login",
            Route::AiChat => "AI Chat",
            Route::TechnicianPortal => "Technician Portal",
            Route::MyTickets => "My Tickets",
            Route::Ticket(_) => "Ticket",
            Route::NotFound => "Not Found",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
