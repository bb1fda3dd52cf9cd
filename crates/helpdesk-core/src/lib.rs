//! Helpdesk client core.
//!
//! Everything here is platform-free: browser adapters plug in through the
//! traits in [`ports`], and all state is single-threaded (`Rc<RefCell<_>>`
//! handles, cheap to clone into spawned tasks).

pub mod ports;
pub mod event_bus;
pub mod gateway;
pub mod session;
pub mod refresh;
pub mod transcript;
pub mod orchestrator;
pub mod filter;
pub mod query;
pub mod tickets;
pub mod poller;
pub mod navigation;

#[cfg(test)]
mod tests;
