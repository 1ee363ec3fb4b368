//! Implements RenderPort on a terminal. Chat transcript + markdown-lite answers.

use crate::domain::{Answer, AnswerSource, ChatEntry, ChatItem, DomainError};
use crate::ports::RenderPort;
use crossterm::queue;
use crossterm::style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor};
use once_cell::sync::Lazy;
use regex::Regex;
use std::io::{Stdout, Write, stdout};
use std::sync::Mutex;

static EMPHASIS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*(.*?)\*\*|\*(.*?)\*").expect("emphasis regex"));

/// One rendered row of the chat transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatLine {
    DateHeader(String),
    /// Written by the exporting user; no sender label.
    Sent { text: String, time: String },
    Received { sender: String, text: String, time: String },
    Notice { kind: String, text: String },
}

/// Flatten a chat into transcript rows: a header per day, then its items in order.
pub fn chat_lines(chat: &[ChatEntry]) -> Vec<ChatLine> {
    let mut lines = Vec::new();
    for entry in chat {
        lines.push(ChatLine::DateHeader(entry.date.clone()));
        for item in &entry.content {
            lines.push(match item {
                ChatItem::Message(m) if m.is_current_user => ChatLine::Sent {
                    text: m.message.clone(),
                    time: m.timestamp.clone(),
                },
                ChatItem::Message(m) => ChatLine::Received {
                    sender: m.sender.clone(),
                    text: m.message.clone(),
                    time: m.timestamp.clone(),
                },
                ChatItem::SystemNotification(n) => ChatLine::Notice {
                    kind: n.kind.clone(),
                    text: n.message.clone(),
                },
            });
        }
    }
    lines
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Plain,
    Bold,
    Italic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub emphasis: Emphasis,
}

impl Span {
    fn new(text: &str, emphasis: Emphasis) -> Self {
        Self {
            text: text.to_string(),
            emphasis,
        }
    }
}

/// Split markdown-lite text into styled spans: `**bold**`, `*italic*`.
/// Newlines stay inside plain spans. Emphasis never crosses a line break.
pub fn format_markdown(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut cursor = 0;
    for caps in EMPHASIS_RE.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        if whole.start() > cursor {
            spans.push(Span::new(&text[cursor..whole.start()], Emphasis::Plain));
        }
        let styled = match (caps.get(1), caps.get(2)) {
            (Some(bold), _) => Some((bold.as_str(), Emphasis::Bold)),
            (None, Some(italic)) => Some((italic.as_str(), Emphasis::Italic)),
            (None, None) => None,
        };
        if let Some((inner, emphasis)) = styled.filter(|(inner, _)| !inner.is_empty()) {
            spans.push(Span::new(inner, emphasis));
        }
        cursor = whole.end();
    }
    if cursor < text.len() {
        spans.push(Span::new(&text[cursor..], Emphasis::Plain));
    }
    spans
}

/// Terminal renderer. Writes ANSI-styled output to `W` (stdout by default).
pub struct TerminalRenderer<W: Write + Send = Stdout> {
    out: Mutex<W>,
}

impl TerminalRenderer<Stdout> {
    pub fn new() -> Self {
        Self::with_writer(stdout())
    }
}

impl Default for TerminalRenderer<Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write + Send> TerminalRenderer<W> {
    pub fn with_writer(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write_with<F>(&self, f: F) -> Result<(), DomainError>
    where
        F: FnOnce(&mut W) -> std::io::Result<()>,
    {
        let mut out = self
            .out
            .lock()
            .map_err(|_| DomainError::Ui("terminal writer poisoned".to_string()))?;
        f(&mut *out)
            .and_then(|_| out.flush())
            .map_err(|e| DomainError::Ui(format!("terminal write failed: {}", e)))
    }
}

fn write_line<W: Write>(out: &mut W, line: &ChatLine) -> std::io::Result<()> {
    match line {
        ChatLine::DateHeader(date) => queue!(
            out,
            Print("\n"),
            SetForegroundColor(Color::DarkGrey),
            Print(format!("──────── {} ────────\n", date)),
            ResetColor
        ),
        ChatLine::Sent { text, time } => queue!(
            out,
            SetForegroundColor(Color::Green),
            SetAttribute(Attribute::Bold),
            Print("  You ▸ "),
            SetAttribute(Attribute::Reset),
            ResetColor,
            Print(text),
            SetForegroundColor(Color::DarkGrey),
            Print(format!("  {}\n", time)),
            ResetColor
        ),
        ChatLine::Received { sender, text, time } => queue!(
            out,
            SetForegroundColor(Color::Cyan),
            SetAttribute(Attribute::Bold),
            Print(format!("{} ▸ ", sender)),
            SetAttribute(Attribute::Reset),
            ResetColor,
            Print(text),
            SetForegroundColor(Color::DarkGrey),
            Print(format!("  {}\n", time)),
            ResetColor
        ),
        ChatLine::Notice { kind, text } => queue!(
            out,
            SetForegroundColor(Color::Yellow),
            SetAttribute(Attribute::Italic),
            Print(format!("    · [{}] {}\n", kind, text)),
            SetAttribute(Attribute::Reset),
            ResetColor
        ),
    }
}

fn write_spans<W: Write>(out: &mut W, spans: &[Span]) -> std::io::Result<()> {
    for span in spans {
        match span.emphasis {
            Emphasis::Plain => queue!(out, Print(&span.text))?,
            Emphasis::Bold => queue!(
                out,
                SetAttribute(Attribute::Bold),
                Print(&span.text),
                SetAttribute(Attribute::Reset)
            )?,
            Emphasis::Italic => queue!(
                out,
                SetAttribute(Attribute::Italic),
                Print(&span.text),
                SetAttribute(Attribute::Reset)
            )?,
        }
    }
    Ok(())
}

fn source_label(source: AnswerSource) -> (&'static str, Option<&'static str>) {
    match source {
        AnswerSource::Remote => ("🤖 Assistant", None),
        AnswerSource::Local => ("🔎 Analysis", None),
        AnswerSource::Fallback => ("🔎 Analysis", Some(" (local analysis)")),
    }
}

impl<W: Write + Send> RenderPort for TerminalRenderer<W> {
    fn render_chat(&self, chat: &[ChatEntry]) -> Result<(), DomainError> {
        let lines = chat_lines(chat);
        self.write_with(|out| {
            for line in &lines {
                write_line(out, line)?;
            }
            queue!(out, Print("\n"))
        })
    }

    fn render_answer(&self, answer: &Answer) -> Result<(), DomainError> {
        let (label, tag) = source_label(answer.source);
        let spans = format_markdown(&answer.text);
        self.write_with(|out| {
            queue!(
                out,
                Print("\n"),
                SetForegroundColor(Color::Magenta),
                SetAttribute(Attribute::Bold),
                Print(label),
                SetAttribute(Attribute::Reset),
                ResetColor
            )?;
            if let Some(tag) = tag {
                queue!(
                    out,
                    SetAttribute(Attribute::Dim),
                    Print(tag),
                    SetAttribute(Attribute::Reset)
                )?;
            }
            queue!(out, Print("\n"))?;
            write_spans(out, &spans)?;
            queue!(out, Print("\n\n"))
        })
    }

    fn render_notice(&self, text: &str) -> Result<(), DomainError> {
        self.write_with(|out| {
            queue!(
                out,
                SetForegroundColor(Color::Yellow),
                Print(text),
                ResetColor,
                Print("\n")
            )
        })
    }
}
