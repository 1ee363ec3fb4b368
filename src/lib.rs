//! wa-insight: WhatsApp chat export viewer and analyzer with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
