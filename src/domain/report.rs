//! Structured analysis report. Rendered as markdown-lite text:
//! `**bold**` title, `*italic*` notes, blocks separated by a blank line.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    icon: &'static str,
    title: String,
    blocks: Vec<Vec<String>>,
}

impl Report {
    pub fn new(icon: &'static str, title: impl Into<String>) -> Self {
        Self {
            icon,
            title: title.into(),
            blocks: Vec::new(),
        }
    }

    /// Append a block of lines. Empty blocks are skipped.
    pub fn block<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        if !lines.is_empty() {
            self.blocks.push(lines);
        }
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn blocks(&self) -> &[Vec<String>] {
        &self.blocks
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.icon.is_empty() {
            write!(f, "**{}:**", self.title)?;
        } else {
            write!(f, "{} **{}:**", self.icon, self.title)?;
        }
        for block in &self.blocks {
            write!(f, "\n\n{}", block.join("\n"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_layout() {
        let report = Report::new("📈", "Stats")
            .block(["Total: 1", "Days: 1"])
            .block(Vec::<String>::new())
            .block(["• A: 1 messages"]);
        assert_eq!(
            report.to_string(),
            "📈 **Stats:**\n\nTotal: 1\nDays: 1\n\n• A: 1 messages"
        );
        assert_eq!(report.blocks().len(), 2);
    }

    #[test]
    fn test_report_without_icon() {
        assert_eq!(Report::new("", "Plain").to_string(), "**Plain:**");
    }
}
