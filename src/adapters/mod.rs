//! Infrastructure adapters. Implement outbound ports.
//!
//! WhatsApp export parsing, analysis backend, terminal UI. Map errors to DomainError.

pub mod ai;
pub mod backend;
pub mod ui;
pub mod whatsapp;
