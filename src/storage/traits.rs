//! Storage trait for references and review history.

use std::sync::Arc;

use crate::core::Reference;
use crate::error::Result;
use crate::history::ReviewHistoryItem;

/// Durable storage for the reference collection and the review ledger.
///
/// The two collections are independent keys; each save replaces the whole
/// stored collection.
pub trait ReviewStore: Send + Sync {
    /// Load every stored reference. Missing storage loads as empty.
    fn load_references(&self) -> Result<Vec<Reference>>;

    /// Replace the stored references.
    fn save_references(&self, references: &[Reference]) -> Result<()>;

    /// Load the review history, oldest first. Missing storage loads as empty.
    fn load_history(&self) -> Result<Vec<ReviewHistoryItem>>;

    /// Replace the stored review history.
    fn save_history(&self, history: &[ReviewHistoryItem]) -> Result<()>;
}

/// Blanket implementation of ReviewStore for Arc-wrapped stores.
///
/// This allows sharing one store between a session and the test asserting
/// on it.
impl<T: ReviewStore + ?Sized> ReviewStore for Arc<T> {
    fn load_references(&self) -> Result<Vec<Reference>> {
        (**self).load_references()
    }

    fn save_references(&self, references: &[Reference]) -> Result<()> {
        (**self).save_references(references)
    }

    fn load_history(&self) -> Result<Vec<ReviewHistoryItem>> {
        (**self).load_history()
    }

    fn save_history(&self, history: &[ReviewHistoryItem]) -> Result<()> {
        (**self).save_history(history)
    }
}

impl<T: ReviewStore + ?Sized> ReviewStore for &T {
    fn load_references(&self) -> Result<Vec<Reference>> {
        (**self).load_references()
    }

    fn save_references(&self, references: &[Reference]) -> Result<()> {
        (**self).save_references(references)
    }

    fn load_history(&self) -> Result<Vec<ReviewHistoryItem>> {
        (**self).load_history()
    }

    fn save_history(&self, history: &[ReviewHistoryItem]) -> Result<()> {
        (**self).save_history(history)
    }
}
