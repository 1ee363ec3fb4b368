//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod analyzer;
pub mod entities;
pub mod errors;
pub mod report;

pub use analyzer::{ChatAnalyzer, Inquiry, MessageTally, SUGGESTIONS};
pub use entities::{
    Answer, AnswerSource, ChatEntry, ChatItem, ExportFile, ExportKind, LoadedChat, Message,
    SenderCount, SystemNotification, WordStat,
};
pub use errors::DomainError;
pub use report::Report;
