pub mod message;
pub mod workflow;
pub mod ticket;
pub mod filter;
pub mod session;
pub mod route;
pub mod event;
pub mod config;
pub mod error;


pub use error::HelpdeskError;
pub type Result<T> = std::result::Result<T, HelpdeskError>;
