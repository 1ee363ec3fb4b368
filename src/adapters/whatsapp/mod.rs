//! WhatsApp export adapter: archive extraction and text parsing.

pub mod archive;
pub mod local_source;
pub mod parser;

pub use local_source::LocalExportSource;
pub use parser::ExportParser;
