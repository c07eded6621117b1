//! In-memory review storage for testing.
//!
//! This module provides a thread-safe in-memory implementation of the
//! ReviewStore trait, primarily for use in unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use crate::core::Reference;
use crate::error::Result;
use crate::history::ReviewHistoryItem;
use crate::storage::ReviewStore;

/// In-memory review store for testing.
///
/// Collections are lost when the store is dropped. Save calls are counted so
/// tests can assert on persistence side effects.
#[derive(Debug, Default)]
pub struct MemoryReviewStore {
    references: RwLock<Vec<Reference>>,
    history: RwLock<Vec<ReviewHistoryItem>>,
    reference_saves: AtomicUsize,
    history_saves: AtomicUsize,
}

impl MemoryReviewStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with references.
    pub fn with_references(references: Vec<Reference>) -> Self {
        Self {
            references: RwLock::new(references),
            ..Self::default()
        }
    }

    /// Snapshot of the stored references.
    pub fn references(&self) -> Vec<Reference> {
        self.references.read().unwrap().clone()
    }

    /// Snapshot of the stored history.
    pub fn history(&self) -> Vec<ReviewHistoryItem> {
        self.history.read().unwrap().clone()
    }

    /// Number of times references were saved.
    pub fn reference_saves(&self) -> usize {
        self.reference_saves.load(Ordering::SeqCst)
    }

    /// Number of times history was saved.
    pub fn history_saves(&self) -> usize {
        self.history_saves.load(Ordering::SeqCst)
    }
}

impl ReviewStore for MemoryReviewStore {
    fn load_references(&self) -> Result<Vec<Reference>> {
        Ok(self.references())
    }

    fn save_references(&self, references: &[Reference]) -> Result<()> {
        *self.references.write().unwrap() = references.to_vec();
        self.reference_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn load_history(&self) -> Result<Vec<ReviewHistoryItem>> {
        Ok(self.history())
    }

    fn save_history(&self, history: &[ReviewHistoryItem]) -> Result<()> {
        *self.history.write().unwrap() = history.to_vec();
        self.history_saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
