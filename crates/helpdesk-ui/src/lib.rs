//! egui views for the helpdesk client.
//!
//! Panels are pure renderers over [`state::UiState`]; user intent comes
//! back to the caller as an action value, never as a side effect.

pub mod panels;
pub mod state;
pub mod theme;
