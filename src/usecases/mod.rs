//! Application use cases. Orchestrate domain logic via ports.

pub mod session_service;

pub use session_service::{ChatSession, SessionService};
