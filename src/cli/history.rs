//! History command for bibly.
//!
//! Shows the most recent grading events, newest first.

use serde::Serialize;

use crate::config::Config;
use crate::core::format_timestamp;
use crate::history::{HistoryLedger, ReviewHistoryItem};
use crate::storage::ReviewStore;

/// Options for the history command.
#[derive(Debug, Clone, Default)]
pub struct HistoryOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Maximum number of entries (default: `history.recent_count`).
    pub limit: Option<usize>,
}

/// Output format for the history command.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryOutput {
    pub success: bool,
    /// Entries in the whole ledger.
    pub total: usize,
    /// Listed entries, newest first.
    pub entries: Vec<ReviewHistoryItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HistoryOutput {
    pub fn success(total: usize, entries: Vec<ReviewHistoryItem>) -> Self {
        Self {
            success: true,
            total,
            entries,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            total: 0,
            entries: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The history command implementation.
pub struct HistoryCommand<S: ReviewStore> {
    store: S,
    config: Config,
}

impl<S: ReviewStore> HistoryCommand<S> {
    /// Create a new history command.
    pub fn new(store: S, config: Config) -> Self {
        Self { store, config }
    }

    /// Run the history command.
    pub fn run(&self, options: &HistoryOptions) -> HistoryOutput {
        let items = match self.store.load_history() {
            Ok(items) => items,
            Err(e) => return HistoryOutput::failure(e.to_string()),
        };

        let ledger = HistoryLedger::from_items(items, self.config.history.capacity);
        let limit = options.limit.unwrap_or(self.config.history.recent_count);
        let entries = ledger.recent(limit).into_iter().cloned().collect();

        HistoryOutput::success(ledger.len(), entries)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &HistoryOutput, options: &HistoryOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            return serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string());
        }

        if !output.success {
            return format!(
                "History failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.entries.is_empty() {
            return "No reviews recorded yet.\n".to_string();
        }

        let mut lines = vec![format!(
            "Showing {} of {} review(s):\n",
            output.entries.len(),
            output.total
        )];
        for item in &output.entries {
            let verdict = if item.correct { "correct" } else { "wrong" };
            lines.push(format!(
                "{}  {:<10} {:<8} grade {}  {}",
                format_timestamp(item.date),
                item.field.label(),
                verdict,
                item.grade,
                item.ref_title
            ));
            if !item.correct && !item.user_answer.is_empty() {
                lines.push(format!("    answered: {}", item.user_answer));
            }
        }
        lines.push(String::new());
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FieldKey;
    use crate::storage::MemoryReviewStore;
    use std::sync::Arc;

    fn item(date: i64, correct: bool) -> ReviewHistoryItem {
        ReviewHistoryItem {
            date,
            ref_id: "r".to_string(),
            ref_title: "Walden".to_string(),
            field: FieldKey::Publisher,
            user_answer: "Ticknor".to_string(),
            correct,
            grade: 3,
        }
    }

    fn setup(n: i64) -> Arc<MemoryReviewStore> {
        let store = Arc::new(MemoryReviewStore::new());
        let items: Vec<_> = (0..n).map(|i| item(i, i % 2 == 0)).collect();
        store.save_history(&items).unwrap();
        store
    }

    #[test]
    fn test_history_newest_first_with_default_limit() {
        let cmd = HistoryCommand::new(setup(15), Config::default());
        let output = cmd.run(&HistoryOptions::default());

        assert!(output.success);
        assert_eq!(output.total, 15);
        assert_eq!(output.entries.len(), 10);
        assert_eq!(output.entries[0].date, 14);
        assert_eq!(output.entries[9].date, 5);
    }

    #[test]
    fn test_history_explicit_limit() {
        let cmd = HistoryCommand::new(setup(5), Config::default());
        let output = cmd.run(&HistoryOptions {
            limit: Some(2),
            ..Default::default()
        });
        assert_eq!(output.entries.len(), 2);
        assert_eq!(output.entries[1].date, 3);
    }

    #[test]
    fn test_history_empty() {
        let cmd = HistoryCommand::new(Arc::new(MemoryReviewStore::new()), Config::default());
        let output = cmd.run(&HistoryOptions::default());
        let text = cmd.format_output(&output, &HistoryOptions::default());
        assert_eq!(text, "No reviews recorded yet.\n");
    }

    #[test]
    fn test_format_shows_wrong_answers() {
        let cmd = HistoryCommand::new(setup(2), Config::default());
        let output = cmd.run(&HistoryOptions::default());
        let text = cmd.format_output(&output, &HistoryOptions::default());

        assert!(text.contains("Showing 2 of 2"));
        assert!(text.contains("Publisher"));
        assert!(text.contains("answered: Ticknor"));
    }
}
