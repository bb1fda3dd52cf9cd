//! Route guard: role gating happens client-side by redirect, never by
//! showing an error.

use helpdesk_types::{
    route::Route,
    session::{Group, Identity},
};

/// First view after sign-in, by group.
pub fn landing_route(identity: &Identity) -> Route {
    match identity.group {
        Group::Technician => Route::TechnicianPortal,
        Group::User => Route::MyTickets,
        Group::None => Route::AiChat,
    }
}

/// Resolve the route actually shown for `requested`.
pub fn guard(requested: Route, identity: Option<&Identity>) -> Route {
    match (requested, identity) {
        (Route::Login, Some(identity)) => landing_route(identity),
        (Route::Login, None) | (Route::NotFound, _) => requested,
        (_, None) => Route::Login,
        (Route::TechnicianPortal, Some(identity)) if !identity.is_technician() => {
            log::info!("Technician portal restricted; redirecting {}", identity.user_name);
            Route::MyTickets
        }
        (route, Some(_)) => route,
    }
}
