pub mod chat;
pub mod login;
pub mod nav;
pub mod ticket_detail;
pub mod tickets;
pub mod toasts;
