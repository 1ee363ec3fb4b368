//! Implements ChatSourcePort by parsing the export on this machine.
//!
//! Used in offline mode; no backend session is created.

use super::archive::read_chat_text;
use super::parser::ExportParser;
use crate::domain::{DomainError, ExportFile, LoadedChat};
use crate::ports::ChatSourcePort;
use async_trait::async_trait;
use tracing::info;

pub struct LocalExportSource {
    parser: ExportParser,
}

impl LocalExportSource {
    pub fn new(parser: ExportParser) -> Self {
        Self { parser }
    }
}

#[async_trait]
impl ChatSourcePort for LocalExportSource {
    async fn load(&self, export: &ExportFile) -> Result<LoadedChat, DomainError> {
        let text = read_chat_text(export.path.clone(), export.kind).await?;
        let entries = self.parser.parse(&text);
        info!(
            file = %export.file_name(),
            days = entries.len(),
            "parsed export locally"
        );
        Ok(LoadedChat {
            entries,
            session_id: None,
        })
    }
}
