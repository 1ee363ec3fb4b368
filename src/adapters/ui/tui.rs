//! Implements InputPort. Inquire-based interactive prompts.
//!
//! Main menu: load an export, browse it, ask the assistant.

use crate::domain::{DomainError, SUGGESTIONS};
use crate::ports::{InputPort, RenderPort};
use crate::usecases::SessionService;
use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use inquire::validator::Validation;
use inquire::{InquireError, Select, Text};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuItem {
    Load,
    Ask,
    Quick,
    ShowChat,
    SaveTranscript,
    StartOver,
    Quit,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            MenuItem::Load => "📂 Load WhatsApp export (.zip / .txt)",
            MenuItem::Ask => "💬 Ask a question",
            MenuItem::Quick => "⚡ Quick analysis",
            MenuItem::ShowChat => "📜 Show chat",
            MenuItem::SaveTranscript => "💾 Save transcript (.txt)",
            MenuItem::StartOver => "🔄 Start over",
            MenuItem::Quit => "🚪 Quit",
        };
        f.write_str(label)
    }
}

/// Menu entries available with or without a loaded chat.
fn menu_items(has_chat: bool) -> Vec<MenuItem> {
    if has_chat {
        vec![
            MenuItem::Ask,
            MenuItem::Quick,
            MenuItem::ShowChat,
            MenuItem::SaveTranscript,
            MenuItem::Load,
            MenuItem::StartOver,
            MenuItem::Quit,
        ]
    } else {
        vec![MenuItem::Load, MenuItem::Quit]
    }
}

/// Path prompt validation: existing file with a supported extension.
fn validate_export_path(input: &str) -> Validation {
    let path = Path::new(input.trim());
    if !path.is_file() {
        return Validation::Invalid("File not found".into());
    }
    match crate::domain::ExportKind::from_path(path) {
        Ok(_) => Validation::Valid,
        Err(e) => Validation::Invalid(e.to_string().into()),
    }
}

/// Applies the prompt theme for all subsequent inquire prompts.
pub fn apply_theme() {
    use inquire::ui::{Color, RenderConfig, StyleSheet, Styled};

    let config = RenderConfig::default()
        .with_prompt_prefix(Styled::new("›").with_fg(Color::LightGreen))
        .with_highlighted_option_prefix(Styled::new("➤").with_fg(Color::LightGreen))
        .with_answer(StyleSheet::new().with_fg(Color::LightCyan));
    inquire::set_global_render_config(config);
}

fn spinner(message: &'static str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// `Ok(None)` when the user backed out of a prompt (Esc).
fn skippable<T>(result: Result<Option<T>, InquireError>) -> Result<Option<T>, DomainError> {
    match result {
        Ok(value) => Ok(value),
        Err(InquireError::OperationCanceled) => Ok(None),
        Err(e) => Err(DomainError::Ui(e.to_string())),
    }
}

/// TUI adapter. Inquire prompts + terminal renderer.
pub struct TuiInputPort {
    sessions: Arc<SessionService>,
    renderer: Arc<dyn RenderPort>,
}

impl TuiInputPort {
    pub fn new(sessions: Arc<SessionService>, renderer: Arc<dyn RenderPort>) -> Self {
        Self { sessions, renderer }
    }

    /// Non-interactive: load `path`, answer `question`, render, return.
    pub async fn run_once(&self, path: &Path, question: &str) -> Result<(), DomainError> {
        self.load(path).await?;
        self.ask(question).await
    }

    async fn load(&self, path: &Path) -> Result<(), DomainError> {
        let pb = spinner("Processing export...");
        let result = self.sessions.load_export(path).await;
        pb.finish_and_clear();
        let session = result?;
        self.renderer.render_notice(&format!(
            "Loaded {}: {} days, {} messages{}",
            session.filename,
            session.entries.len(),
            session.message_count(),
            if self.sessions.is_offline() {
                " (offline analysis)"
            } else {
                ""
            }
        ))
    }

    async fn ask(&self, question: &str) -> Result<(), DomainError> {
        let pb = spinner("Thinking...");
        let result = self.sessions.ask(question).await;
        pb.finish_and_clear();
        match result? {
            Some(answer) => self.renderer.render_answer(&answer),
            None => Ok(()),
        }
    }

    async fn show_chat(&self) -> Result<(), DomainError> {
        match self.sessions.current().await {
            Some(session) => self.renderer.render_chat(&session.entries),
            None => Err(DomainError::NoSession),
        }
    }

    async fn save_transcript(&self, path: &Path) -> Result<(), DomainError> {
        let session = self.sessions.current().await.ok_or(DomainError::NoSession)?;
        tokio::fs::write(path, session.context_text())
            .await
            .map_err(|e| DomainError::Io(format!("write {}: {}", path.display(), e)))?;
        self.renderer
            .render_notice(&format!("Transcript saved to {}", path.display()))
    }

    /// Run one menu action. `Ok(false)` means quit.
    async fn dispatch(&self, item: MenuItem) -> Result<bool, DomainError> {
        match item {
            MenuItem::Load => {
                let input = skippable(
                    Text::new("Path to WhatsApp export:")
                        .with_help_message("Export chat → .zip (with media) or .txt")
                        .with_validator(|input: &str| Ok(validate_export_path(input)))
                        .prompt_skippable(),
                )?;
                if let Some(input) = input {
                    let path = PathBuf::from(input.trim());
                    self.load(&path).await?;
                    self.show_chat().await?;
                }
            }
            MenuItem::Ask => {
                let question = skippable(
                    Text::new("Ask about this chat:")
                        .with_help_message("e.g. Summarize this chat")
                        .prompt_skippable(),
                )?;
                if let Some(question) = question {
                    self.ask(&question).await?;
                }
            }
            MenuItem::Quick => {
                let choice = skippable(
                    Select::new("Quick analysis:", SUGGESTIONS.to_vec()).prompt_skippable(),
                )?;
                if let Some(question) = choice {
                    self.ask(question).await?;
                }
            }
            MenuItem::ShowChat => self.show_chat().await?,
            MenuItem::SaveTranscript => {
                let input = skippable(
                    Text::new("Save transcript to:")
                        .with_default("transcript.txt")
                        .prompt_skippable(),
                )?;
                if let Some(input) = input {
                    self.save_transcript(Path::new(input.trim())).await?;
                }
            }
            MenuItem::StartOver => {
                self.sessions.reset().await;
                self.renderer.render_notice("Session cleared.")?;
            }
            MenuItem::Quit => return Ok(false),
        }
        Ok(true)
    }
}

#[async_trait]
impl InputPort for TuiInputPort {
    async fn run(&self) -> Result<(), DomainError> {
        loop {
            let has_chat = self.sessions.current().await.is_some();
            let choice = match Select::new("What next?", menu_items(has_chat)).prompt() {
                Ok(choice) => choice,
                Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                    return Ok(());
                }
                Err(e) => return Err(DomainError::Ui(e.to_string())),
            };

            match self.dispatch(choice).await {
                Ok(true) => {}
                Ok(false) => return Ok(()),
                Err(DomainError::Ui(e)) => return Err(DomainError::Ui(e)),
                Err(e) => {
                    debug!(error = %e, "menu action failed");
                    self.renderer.render_notice(&format!("Error: {}", e))?;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_menu_items() {
        assert_eq!(menu_items(false), vec![MenuItem::Load, MenuItem::Quit]);
        let full = menu_items(true);
        assert_eq!(full.first(), Some(&MenuItem::Ask));
        assert_eq!(full.last(), Some(&MenuItem::Quit));
        assert!(full.contains(&MenuItem::StartOver));
        assert!(full.contains(&MenuItem::SaveTranscript));
    }

    #[test]
    fn test_validate_export_path() {
        let dir = tempfile::tempdir().unwrap();
        let txt = dir.path().join("chat.txt");
        let pdf = dir.path().join("chat.pdf");
        std::fs::write(&txt, "x").unwrap();
        std::fs::write(&pdf, "x").unwrap();

        assert!(matches!(
            validate_export_path(txt.to_str().unwrap()),
            Validation::Valid
        ));
        assert!(matches!(
            validate_export_path(pdf.to_str().unwrap()),
            Validation::Invalid(_)
        ));
        assert!(matches!(
            validate_export_path(dir.path().join("missing.zip").to_str().unwrap()),
            Validation::Invalid(_)
        ));
    }
}
