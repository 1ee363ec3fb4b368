//! Map WhatsApp "Export chat" text to domain entries.
//!
//! Line format: `15/03/2024, 9:41 pm - Alice: text`. Lines without a header are
//! continuations of the previous message.

use crate::domain::{ChatEntry, ChatItem, Message, SystemNotification};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use tracing::{debug, warn};

static LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2}[/.\-]\d{1,2}[/.\-]\d{2,4}),? (\d{1,2}:\d{2})\s?([ap]m)? - (.+)$")
        .expect("export line regex")
});

const ENCRYPTION_NOTICE: &str = "Messages and calls are end-to-end encrypted";
const JOINED_MARKER: &str = "joined using this group's invite link";
const CREATED_MARKER: &str = "created group";
const ADDED_MARKER: &str = "added";

/// Invisible marks WhatsApp puts in front of lines (LRM, BOM).
const LEADING_MARKS: &[char] = &['\u{200e}', '\u{feff}'];

/// WhatsApp text export parser.
#[derive(Debug, Clone)]
pub struct ExportParser {
    /// Lowercased sender names treated as the exporting user.
    owner_names: Vec<String>,
}

impl Default for ExportParser {
    fn default() -> Self {
        Self::new(["you"])
    }
}

impl ExportParser {
    pub fn new<I, S>(owner_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            owner_names: owner_names
                .into_iter()
                .map(|n| n.as_ref().trim().to_lowercase())
                .filter(|n| !n.is_empty())
                .collect(),
        }
    }

    /// Parse a whole export. Days come out in ascending date order.
    pub fn parse(&self, text: &str) -> Vec<ChatEntry> {
        let mut days: BTreeMap<String, Vec<ChatItem>> = BTreeMap::new();
        // Day holding the message that continuation lines extend.
        let mut open_message_day: Option<String> = None;
        let mut skipped = 0usize;

        for raw_line in text.lines() {
            let line = raw_line.trim().trim_start_matches(LEADING_MARKS).trim();

            let Some(caps) = LINE_RE.captures(line) else {
                if line.is_empty() {
                    continue;
                }
                let open = open_message_day
                    .as_ref()
                    .and_then(|day| days.get_mut(day))
                    .and_then(|items| items.last_mut());
                match open {
                    Some(ChatItem::Message(m)) => {
                        m.message.push('\n');
                        m.message.push_str(line);
                    }
                    _ => skipped += 1,
                }
                continue;
            };

            let date = normalize_date(&caps[1]);
            let timestamp = match caps.get(3) {
                Some(meridian) => format!("{} {}", &caps[2], meridian.as_str().to_uppercase()),
                None => caps[2].to_string(),
            };

            match self.classify(&caps[4], timestamp) {
                Some(item) => {
                    let is_message = matches!(item, ChatItem::Message(_));
                    days.entry(date.clone()).or_default().push(item);
                    open_message_day = is_message.then_some(date);
                }
                None => {
                    skipped += 1;
                    open_message_day = None;
                }
            }
        }

        debug!(days = days.len(), skipped, "parsed export");

        days.into_iter()
            .map(|(date, content)| ChatEntry::new(date, content))
            .collect()
    }

    /// System markers are matched against the text before the first `": "`,
    /// so a group name containing `": "` stays a notification while a message
    /// body mentioning a marker stays a message.
    fn classify(&self, body: &str, timestamp: String) -> Option<ChatItem> {
        if body.contains(ENCRYPTION_NOTICE) {
            return Some(notification("settings", body));
        }
        let split = body.split_once(": ");
        let head = split.map_or(body, |(sender, _)| sender);
        if head.contains(JOINED_MARKER) {
            return Some(notification("joined", body));
        }
        if head.contains(CREATED_MARKER) {
            return Some(notification("settings", body));
        }
        if head.contains(ADDED_MARKER) {
            return Some(notification("added", body));
        }
        split.map(|(sender, message)| {
            ChatItem::Message(Message {
                sender: sender.to_string(),
                message: message.to_string(),
                timestamp,
                is_current_user: self.is_owner(sender),
            })
        })
    }

    fn is_owner(&self, sender: &str) -> bool {
        let sender = sender.trim().to_lowercase();
        self.owner_names.iter().any(|n| *n == sender)
    }
}

fn notification(kind: &str, body: &str) -> ChatItem {
    ChatItem::SystemNotification(SystemNotification {
        kind: kind.to_string(),
        message: body.to_string(),
    })
}

/// Normalize an export date to `YYYY-MM-DD`. Day-first wins over month-first;
/// unparseable dates are kept verbatim.
fn normalize_date(raw: &str) -> String {
    let separator = raw.chars().find(|c| !c.is_ascii_digit());
    let year_width = raw
        .rsplit(|c: char| !c.is_ascii_digit())
        .next()
        .map(str::len)
        .unwrap_or(0);

    if let Some(sep) = separator {
        let year = if year_width == 2 { "%y" } else { "%Y" };
        for format in [
            format!("%d{sep}%m{sep}{year}"),
            format!("%m{sep}%d{sep}{year}"),
        ] {
            if let Ok(date) = NaiveDate::parse_from_str(raw, &format) {
                return date.format("%Y-%m-%d").to_string();
            }
        }
    }

    warn!(date = raw, "unknown date format, keeping raw value");
    raw.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
12/03/2024, 09:15 - Messages and calls are end-to-end encrypted. No one outside of this chat can read them.
12/03/2024, 09:16 - Alice created group \"Trip\"
12/03/2024, 09:17 - Alice added Bob
12/03/2024, 9:20 pm - Alice: Who is bringing the tent?
12/03/2024, 9:21 pm - You: I will
and the stove too
13/03/2024, 10:02 am - Carol joined using this group's invite link
13/03/2024, 10:05 am - Bob: Sounds good: see you there
13/03/2024, 10:06 am - Bob left
";

    #[test]
    fn test_parse_sample_export() {
        let entries = ExportParser::default().parse(SAMPLE);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].date, "2024-03-12");
        assert_eq!(entries[1].date, "2024-03-13");

        let kinds: Vec<String> = entries[0]
            .content
            .iter()
            .map(|item| match item {
                ChatItem::Message(m) => format!("msg:{}", m.sender),
                ChatItem::SystemNotification(n) => n.kind.clone(),
            })
            .collect();
        assert_eq!(
            kinds,
            vec!["settings", "settings", "added", "msg:Alice", "msg:You"]
        );

        match &entries[0].content[3] {
            ChatItem::Message(m) => {
                assert_eq!(m.timestamp, "9:20 PM");
                assert!(!m.is_current_user);
            }
            other => panic!("unexpected {:?}", other),
        }
        match &entries[0].content[4] {
            ChatItem::Message(m) => {
                assert!(m.is_current_user);
                assert_eq!(m.message, "I will\nand the stove too");
            }
            other => panic!("unexpected {:?}", other),
        }

        // "Bob left" is neither a message nor a known notification.
        assert_eq!(entries[1].content.len(), 2);
        match &entries[1].content[1] {
            ChatItem::Message(m) => {
                assert_eq!(m.sender, "Bob");
                assert_eq!(m.message, "Sounds good: see you there");
                assert_eq!(m.timestamp, "10:05 AM");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_message_mentioning_added_stays_message() {
        let entries = ExportParser::default().parse("01/02/2024, 08:00 - Dan: I added salt\n");
        assert!(matches!(&entries[0].content[0], ChatItem::Message(m) if m.message == "I added salt"));
    }

    #[test]
    fn test_group_name_with_colon_stays_notification() {
        let text = "12/03/2024, 09:16 - Alice created group \"Trip: 2024\"\n\
                    12/03/2024, 09:17 - Alice added Bob: the planner\n\
                    12/03/2024, 09:18 - Bob: hi\n";
        let entries = ExportParser::default().parse(text);
        let content = &entries[0].content;
        assert_eq!(content.len(), 3);
        assert!(matches!(
            &content[0],
            ChatItem::SystemNotification(n)
                if n.kind == "settings" && n.message == "Alice created group \"Trip: 2024\""
        ));
        assert!(matches!(&content[1], ChatItem::SystemNotification(n) if n.kind == "added"));
        let senders: Vec<&str> = entries[0].messages().map(|m| m.sender.as_str()).collect();
        assert_eq!(senders, vec!["Bob"]);
    }

    #[test]
    fn test_owner_names_case_insensitive() {
        let parser = ExportParser::new(["Arshad Ali", "you"]);
        let entries = parser.parse("01/02/2024, 08:00 - arshad ali: hi\n01/02/2024, 08:01 - Eve: hey\n");
        let flags: Vec<bool> = entries[0]
            .messages()
            .map(|m| m.is_current_user)
            .collect();
        assert_eq!(flags, vec![true, false]);
    }

    #[test]
    fn test_days_sorted_ascending() {
        let text = "05/01/2024, 10:00 - A: later\n04/01/2024, 10:00 - B: earlier\n";
        let entries = ExportParser::default().parse(text);
        let dates: Vec<&str> = entries.iter().map(|e| e.date.as_str()).collect();
        assert_eq!(dates, vec!["2024-01-04", "2024-01-05"]);
    }

    #[test]
    fn test_normalize_date_formats() {
        assert_eq!(normalize_date("15/03/2024"), "2024-03-15");
        assert_eq!(normalize_date("03/15/24"), "2024-03-15");
        assert_eq!(normalize_date("1/2/24"), "2024-02-01");
        assert_eq!(normalize_date("15.03.2024"), "2024-03-15");
        assert_eq!(normalize_date("15-03-2024"), "2024-03-15");
        assert_eq!(normalize_date("31/31/2024"), "31/31/2024");
    }

    #[test]
    fn test_leading_marks_and_narrow_space() {
        let text = "\u{feff}\u{200e}12/03/2024, 9:20\u{202f}pm - Alice: hi\n";
        let entries = ExportParser::default().parse(text);
        assert_eq!(entries.len(), 1);
        match &entries[0].content[0] {
            ChatItem::Message(m) => assert_eq!(m.timestamp, "9:20 PM"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_orphan_continuation_dropped() {
        let entries = ExportParser::default().parse("just some text\n\n");
        assert!(entries.is_empty());
    }
}
