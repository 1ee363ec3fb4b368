//! AI adapter module. Test double for the assistant port.
//!
//! The real assistant lives behind the backend (`adapters::backend`).

pub mod mock_adapter;

pub use mock_adapter::{MockAiAdapter, MockReply};
