//! Browser adapters for the helpdesk client.
//!
//! Each module implements one port from `helpdesk_core::ports` on top of
//! browser APIs (fetch, localStorage, timers, the host page's identity
//! bridge).

pub mod http;
pub mod storage;
pub mod identity;
pub mod timer;
pub mod history;
