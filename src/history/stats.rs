//! Aggregate review statistics over references and history.

use serde::Serialize;

use crate::core::clock::Timestamp;
use crate::core::reference::{Reference, DEFAULT_EASE_FACTOR};
use crate::core::selector::{due_count, EligibleFields};
use crate::history::ledger::{HistoryLedger, ReviewHistoryItem};

/// Qualitative bucket for rolling accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyBand {
    Great,
    Ok,
    Low,
    Unavailable,
}

impl AccuracyBand {
    /// Classify an accuracy percentage.
    pub fn from_accuracy(accuracy: Option<u32>) -> Self {
        match accuracy {
            Some(a) if a >= 80 => AccuracyBand::Great,
            Some(a) if a >= 50 => AccuracyBand::Ok,
            Some(_) => AccuracyBand::Low,
            None => AccuracyBand::Unavailable,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AccuracyBand::Great => "great",
            AccuracyBand::Ok => "ok",
            AccuracyBand::Low => "low",
            AccuracyBand::Unavailable => "n/a",
        }
    }
}

/// Snapshot of scheduling and recall statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewStats {
    /// References in the collection.
    pub references: usize,
    /// Scheduled (reference, field) pairs over eligible fields.
    pub total: usize,
    /// Pairs with at least one successful recall in a row.
    pub reviewed: usize,
    /// Pairs due now (absent progress counts as due).
    pub due: usize,
    pub avg_interval: f64,
    pub avg_ease: f64,
    pub avg_reps: f64,
    /// Rolling accuracy percentage, `None` without history.
    pub accuracy: Option<u32>,
    pub band: AccuracyBand,
    /// Most recent history entries, newest first.
    pub last: Vec<ReviewHistoryItem>,
}

impl ReviewStats {
    /// Compute statistics for the current collection and ledger.
    pub fn compute(
        list: &[Reference],
        ledger: &HistoryLedger,
        fields: &EligibleFields,
        now: Timestamp,
        accuracy_window: usize,
        recent: usize,
    ) -> Self {
        let progress: Vec<_> = list
            .iter()
            .flat_map(|r| fields.iter().filter_map(move |f| r.progress(f)))
            .collect();

        let total = progress.len();
        let reviewed = progress.iter().filter(|p| p.repetition > 0).count();
        let avg = |values: Vec<f64>| {
            if values.is_empty() {
                0.0
            } else {
                values.iter().sum::<f64>() / values.len() as f64
            }
        };
        let avg_interval = avg(progress.iter().map(|p| p.interval as f64).collect());
        let avg_ease = if progress.is_empty() {
            DEFAULT_EASE_FACTOR
        } else {
            avg(progress.iter().map(|p| p.ease_factor).collect())
        };
        let avg_reps = avg(progress.iter().map(|p| p.repetition as f64).collect());
        let accuracy = ledger.accuracy(accuracy_window);

        Self {
            references: list.len(),
            total,
            reviewed,
            due: due_count(list, fields, now),
            avg_interval,
            avg_ease,
            avg_reps,
            accuracy,
            band: AccuracyBand::from_accuracy(accuracy),
            last: ledger.recent(recent).into_iter().cloned().collect(),
        }
    }

    /// Share of scheduled pairs that have been recalled, as a whole percent.
    pub fn reviewed_percent(&self) -> u32 {
        if self.total == 0 {
            0
        } else {
            (100.0 * self.reviewed as f64 / self.total as f64).round() as u32
        }
    }
}
