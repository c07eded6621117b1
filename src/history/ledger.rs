//! Append-only review history.
//!
//! The ledger keeps the most recent grading events, dropping the oldest when
//! it grows past its capacity. Appends return a new ledger; the caller owns
//! persistence.

use serde::{Deserialize, Serialize};

use crate::core::clock::Timestamp;
use crate::core::reference::FieldKey;

/// Maximum number of entries kept by default.
pub const DEFAULT_CAPACITY: usize = 200;

/// Number of recent entries used for rolling accuracy by default.
pub const DEFAULT_ACCURACY_WINDOW: usize = 20;

/// One grading event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewHistoryItem {
    /// When the grade was given, epoch milliseconds.
    pub date: Timestamp,
    pub ref_id: String,
    /// Title at grading time.
    pub ref_title: String,
    pub field: FieldKey,
    pub user_answer: String,
    pub correct: bool,
    pub grade: i32,
}

/// Capped, ordered history of grading events (oldest first).
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryLedger {
    items: Vec<ReviewHistoryItem>,
    capacity: usize,
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl HistoryLedger {
    /// Create an empty ledger. A zero capacity is raised to 1.
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Build a ledger from persisted items, keeping the newest `capacity`.
    pub fn from_items(items: Vec<ReviewHistoryItem>, capacity: usize) -> Self {
        let mut ledger = Self::new(capacity);
        ledger.items = items;
        ledger.truncate();
        ledger
    }

    /// Return a new ledger with `item` appended.
    pub fn append(&self, item: ReviewHistoryItem) -> Self {
        let mut next = self.clone();
        next.items.push(item);
        next.truncate();
        next
    }

    fn truncate(&mut self) {
        if self.items.len() > self.capacity {
            let overflow = self.items.len() - self.capacity;
            self.items.drain(..overflow);
        }
    }

    /// All entries, oldest first.
    pub fn items(&self) -> &[ReviewHistoryItem] {
        &self.items
    }

    /// Maximum number of entries retained.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// The last `n` entries, most recent first.
    pub fn recent(&self, n: usize) -> Vec<&ReviewHistoryItem> {
        self.items.iter().rev().take(n).collect()
    }

    /// Rolling accuracy percentage over the last `window` entries.
    ///
    /// Returns `None` when the ledger is empty.
    pub fn accuracy(&self, window: usize) -> Option<u32> {
        let start = self.items.len().saturating_sub(window);
        let recent = &self.items[start..];
        if recent.is_empty() {
            return None;
        }
        let correct = recent.iter().filter(|h| h.correct).count();
        Some((100.0 * correct as f64 / recent.len() as f64).round() as u32)
    }
}
