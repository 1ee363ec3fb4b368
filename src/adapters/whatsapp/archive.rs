//! Read the chat text out of an export: plain `.txt` or the `.zip` WhatsApp produces
//! with "Export chat → Include media".

use crate::domain::{DomainError, ExportKind};
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// Read the export text without blocking the runtime.
pub async fn read_chat_text(path: PathBuf, kind: ExportKind) -> Result<String, DomainError> {
    tokio::task::spawn_blocking(move || read_chat_text_blocking(&path, kind))
        .await
        .map_err(|e| DomainError::Io(format!("export reader task failed: {}", e)))?
}

pub fn read_chat_text_blocking(path: &Path, kind: ExportKind) -> Result<String, DomainError> {
    match kind {
        ExportKind::Text => std::fs::read_to_string(path)
            .map_err(|e| DomainError::Io(format!("read {}: {}", path.display(), e))),
        ExportKind::Zip => {
            let file = std::fs::File::open(path)
                .map_err(|e| DomainError::Io(format!("open {}: {}", path.display(), e)))?;
            extract_chat_text(file)
        }
    }
}

/// Return the contents of the first `.txt` entry in the archive.
pub fn extract_chat_text<R: Read + Seek>(reader: R) -> Result<String, DomainError> {
    let mut archive = ZipArchive::new(reader)
        .map_err(|e| DomainError::Archive(format!("Failed to open zip: {}", e)))?;

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| DomainError::Archive(format!("Failed to read zip entry: {}", e)))?;
        if entry.is_dir() || !entry.name().to_lowercase().ends_with(".txt") {
            continue;
        }
        let mut text = String::new();
        entry
            .read_to_string(&mut text)
            .map_err(|e| DomainError::Archive(format!("Failed to read {}: {}", entry.name(), e)))?;
        return Ok(text);
    }

    Err(DomainError::Archive("No .txt file found in ZIP".to_string()))
}
