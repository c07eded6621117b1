//! Stats command for bibly.
//!
//! Displays a review dashboard: collection size, scheduling averages,
//! rolling accuracy, and the latest grading events.

use serde::Serialize;

use crate::config::Config;
use crate::core::{format_timestamp, Clock, EligibleFields};
use crate::error::Result;
use crate::history::{HistoryLedger, ReviewStats};
use crate::storage::ReviewStore;

/// Options for the stats command.
#[derive(Debug, Clone, Default)]
pub struct StatsOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the stats command.
#[derive(Debug, Clone, Serialize)]
pub struct StatsOutput {
    /// Whether stats were computed.
    pub success: bool,
    /// The statistics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<ReviewStats>,
    /// Error message if stats failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StatsOutput {
    /// Create a successful output.
    pub fn success(stats: ReviewStats) -> Self {
        Self {
            success: true,
            stats: Some(stats),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            stats: None,
            error: Some(error.into()),
        }
    }
}

/// The stats command implementation.
pub struct StatsCommand<S: ReviewStore, C: Clock> {
    store: S,
    clock: C,
    config: Config,
}

impl<S: ReviewStore, C: Clock> StatsCommand<S, C> {
    /// Create a new stats command.
    pub fn new(store: S, clock: C, config: Config) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Run the stats command.
    pub fn run(&self) -> StatsOutput {
        match self.compute() {
            Ok(stats) => StatsOutput::success(stats),
            Err(e) => StatsOutput::failure(e.to_string()),
        }
    }

    fn compute(&self) -> Result<ReviewStats> {
        let references = self.store.load_references()?;
        let ledger =
            HistoryLedger::from_items(self.store.load_history()?, self.config.history.capacity);

        Ok(ReviewStats::compute(
            &references,
            &ledger,
            &EligibleFields::from_config(&self.config.review),
            self.clock.now(),
            self.config.history.accuracy_window,
            self.config.history.recent_count,
        ))
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &StatsOutput, options: &StatsOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output)
        }
    }

    /// Format output as human-readable text.
    fn format_human_readable(&self, output: &StatsOutput) -> String {
        let stats = match (&output.stats, output.success) {
            (Some(stats), true) => stats,
            _ => {
                return format!(
                    "Stats failed: {}\n",
                    output.error.as_deref().unwrap_or("unknown error")
                )
            }
        };

        let mut lines = Vec::new();

        lines.push("Review Statistics".to_string());
        lines.push("=================".to_string());
        lines.push(String::new());

        lines.push(format!("References:     {}", stats.references));
        lines.push(format!("Fields tracked: {}", stats.total));
        lines.push(format!(
            "Reviewed:       {} ({}%)",
            stats.reviewed,
            stats.reviewed_percent()
        ));
        lines.push(format!("Due now:        {}", stats.due));
        lines.push(String::new());

        lines.push(format!("Avg interval:   {:.1} days", stats.avg_interval));
        lines.push(format!("Avg ease:       {:.2}", stats.avg_ease));
        lines.push(format!("Avg reps:       {:.1}", stats.avg_reps));
        let accuracy = match stats.accuracy {
            Some(a) => format!("{}% ({})", a, stats.band.display_name()),
            None => stats.band.display_name().to_string(),
        };
        lines.push(format!(
            "Accuracy:       {} over last {}",
            accuracy, self.config.history.accuracy_window
        ));

        if !stats.last.is_empty() {
            lines.push(String::new());
            lines.push("Recent reviews:".to_string());
            for item in &stats.last {
                lines.push(format!(
                    "  {} {} {:<10} {} (grade {})",
                    format_timestamp(item.date),
                    if item.correct { "✓" } else { "✗" },
                    item.field.label(),
                    item.ref_title,
                    item.grade
                ));
            }
        }

        lines.push(String::new());
        lines.join("\n")
    }
}
