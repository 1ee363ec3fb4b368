//! Local chat analysis. Deterministic keyword routing over a parsed chat.
//!
//! Used when the remote assistant is unavailable or disabled. Pure: no I/O, no
//! state between calls, safe to share across tasks.

use super::entities::{ChatEntry, SenderCount, WordStat};
use super::report::Report;
use std::collections::HashMap;

pub const NO_DATA_MESSAGE: &str = "No chat data available to analyze.";

/// Number of words listed by topic extraction.
pub const TOP_TOPICS: usize = 10;

/// Tokens with this many characters or fewer are ignored by topic extraction.
const MIN_TOKEN_CHARS: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "and", "or", "but", "in", "with", "to", "for",
    "of", "as", "by", "that", "this", "it", "from", "i", "you", "he", "she", "we", "they", "me",
    "him", "her", "us", "them",
];

/// Questions offered to the user when nothing matches.
pub const SUGGESTIONS: &[&str] = &[
    "Summarize this chat",
    "Show conversation statistics",
    "What are the most discussed topics?",
    "Who is most active?",
];

/// Kind of analysis a question asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inquiry {
    Summary,
    Statistics,
    Topics,
    MostActive,
    Help,
}

/// Trigger substrings per inquiry. Evaluated top to bottom; first match wins.
const ROUTES: &[(&[&str], Inquiry)] = &[
    (&["summar"], Inquiry::Summary),
    (&["stat", "number"], Inquiry::Statistics),
    (&["topic", "discuss"], Inquiry::Topics),
    (&["active", "most"], Inquiry::MostActive),
];

impl Inquiry {
    /// Route a free-text question (case-insensitive).
    pub fn classify(question: &str) -> Self {
        let lower = question.to_lowercase();
        ROUTES
            .iter()
            .find(|(triggers, _)| triggers.iter().any(|t| lower.contains(t)))
            .map(|(_, inquiry)| *inquiry)
            .unwrap_or(Inquiry::Help)
    }
}

/// Per-call message aggregation: totals, raw texts and per-sender counts in
/// first-seen order.
#[derive(Debug, Default)]
pub struct MessageTally<'a> {
    total: usize,
    texts: Vec<&'a str>,
    senders: Vec<SenderCount>,
    index: HashMap<&'a str, usize>,
}

impl<'a> MessageTally<'a> {
    pub fn from_chat(chat: &'a [ChatEntry]) -> Self {
        let mut tally = Self::default();
        for message in chat.iter().flat_map(ChatEntry::messages) {
            tally.total += 1;
            tally.texts.push(&message.message);
            match tally.index.get(message.sender.as_str()) {
                Some(&slot) => tally.senders[slot].count += 1,
                None => {
                    tally.index.insert(&message.sender, tally.senders.len());
                    tally.senders.push(SenderCount {
                        sender: message.sender.clone(),
                        count: 1,
                    });
                }
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn texts(&self) -> &[&'a str] {
        &self.texts
    }

    /// Senders in first-seen order.
    pub fn senders(&self) -> &[SenderCount] {
        &self.senders
    }

    /// Senders by descending count; ties keep first-seen order.
    pub fn ranked(&self) -> Vec<SenderCount> {
        let mut ranked = self.senders.clone();
        ranked.sort_by(|a, b| b.count.cmp(&a.count));
        ranked
    }
}

/// Round half away from zero to one decimal place.
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / whole * 100`, one decimal; `0.0` when `whole` is zero.
pub fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round1(part as f64 / whole as f64 * 100.0)
}

/// `total / days`, one decimal; `0.0` when there are no days.
pub fn average_per_day(total: usize, days: usize) -> f64 {
    if days == 0 {
        return 0.0;
    }
    round1(total as f64 / days as f64)
}

fn normalize(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect()
}

/// Most frequent meaningful words across `texts`, highest first.
///
/// Tokens of three characters or fewer and stop words are skipped. Equal counts
/// keep the order in which the words first appeared.
pub fn top_words<S: AsRef<str>>(texts: &[S], limit: usize) -> Vec<WordStat> {
    let mut stats: Vec<WordStat> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for text in texts {
        let normalized = normalize(text.as_ref());
        for token in normalized.split_whitespace() {
            if token.chars().count() <= MIN_TOKEN_CHARS || STOP_WORDS.contains(&token) {
                continue;
            }
            match index.get(token) {
                Some(&slot) => stats[slot].count += 1,
                None => {
                    index.insert(token.to_string(), stats.len());
                    stats.push(WordStat {
                        word: token.to_string(),
                        count: 1,
                    });
                }
            }
        }
    }

    stats.sort_by(|a, b| b.count.cmp(&a.count));
    stats.truncate(limit);
    stats
}

/// Stateless local analyzer.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatAnalyzer;

impl ChatAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Answer `question` about `chat` without any network call.
    pub fn analyze(&self, chat: &[ChatEntry], question: &str) -> String {
        if chat.is_empty() {
            return NO_DATA_MESSAGE.to_string();
        }
        let tally = MessageTally::from_chat(chat);
        match Inquiry::classify(question) {
            Inquiry::Summary => summary(chat, &tally).to_string(),
            Inquiry::Statistics => statistics(chat, &tally).to_string(),
            Inquiry::Topics => topics(&tally).to_string(),
            Inquiry::MostActive => most_active(&tally).to_string(),
            Inquiry::Help => help(),
        }
    }
}

fn period(chat: &[ChatEntry]) -> String {
    match (chat.first(), chat.last()) {
        (Some(first), Some(last)) => format!("from {} to {}", first.date, last.date),
        _ => String::new(),
    }
}

fn summary(chat: &[ChatEntry], tally: &MessageTally<'_>) -> Report {
    let participants: Vec<&str> = tally.senders().iter().map(|s| s.sender.as_str()).collect();
    let breakdown = std::iter::once("**Message breakdown:**".to_string()).chain(
        tally.senders().iter().map(|s| {
            format!(
                "• {}: {} messages ({:.1}%)",
                s.sender,
                s.count,
                percentage(s.count, tally.total())
            )
        }),
    );

    Report::new("📊", "Chat Summary")
        .block([
            format!("📅 Period: {}", period(chat)),
            format!("💬 Total messages: {}", tally.total()),
            format!("👥 Participants: {}", participants.join(", ")),
        ])
        .block(breakdown)
}

fn statistics(chat: &[ChatEntry], tally: &MessageTally<'_>) -> Report {
    let participants = std::iter::once("👥 **Participants:**".to_string()).chain(
        tally
            .ranked()
            .into_iter()
            .map(|s| format!("• {}: {} messages", s.sender, s.count)),
    );

    Report::new("📈", "Conversation Statistics")
        .block([
            format!("Total Messages: {}", tally.total()),
            format!("Total Days: {}", chat.len()),
            format!(
                "Average Messages/Day: {:.1}",
                average_per_day(tally.total(), chat.len())
            ),
        ])
        .block(participants)
}

fn topics(tally: &MessageTally<'_>) -> Report {
    let words = std::iter::once("Based on frequently used words:".to_string()).chain(
        top_words(tally.texts(), TOP_TOPICS)
            .into_iter()
            .enumerate()
            .map(|(i, w)| format!("{}. \"{}\" - used {} times", i + 1, w.word, w.count)),
    );
    Report::new("🔍", "Most Discussed Topics").block(words)
}

fn most_active(tally: &MessageTally<'_>) -> Report {
    tally
        .ranked()
        .into_iter()
        .enumerate()
        .fold(
            Report::new("⭐", "Most Active Participants"),
            |report, (i, s)| {
                report.block([
                    format!("{}. {}", i + 1, s.sender),
                    format!(
                        "   {} messages ({:.1}% of total)",
                        s.count,
                        percentage(s.count, tally.total())
                    ),
                ])
            },
        )
}

fn help() -> String {
    let mut text = String::from("I can help you analyze this chat! Try asking me:\n\n");
    for suggestion in SUGGESTIONS {
        text.push_str(&format!("• \"{}\"\n", suggestion));
    }
    text.push_str(
        "\n*Note: Using local analysis. For AI-powered insights, connect to the analysis backend.*",
    );
    text
}
