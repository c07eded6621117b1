//! Remove command for bibly.
//!
//! Deletes a reference together with its per-field progress. History
//! entries are kept; they carry the title at grading time.

use serde::Serialize;

use crate::core::Reference;
use crate::error::{BiblyError, Result};
use crate::storage::ReviewStore;

/// Options for the remove command.
#[derive(Debug, Clone, Default)]
pub struct RemoveOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the remove command.
#[derive(Debug, Clone, Serialize)]
pub struct RemoveOutput {
    /// Whether the reference was removed.
    pub success: bool,
    /// Id that was requested.
    pub id: String,
    /// Title of the removed reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Error message if removal failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RemoveOutput {
    /// Create a successful output.
    pub fn success(reference: &Reference) -> Self {
        Self {
            success: true,
            id: reference.id.clone(),
            title: Some(reference.title.clone()),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            id: id.into(),
            title: None,
            error: Some(error.into()),
        }
    }
}

/// The remove command implementation.
pub struct RemoveCommand<S: ReviewStore> {
    store: S,
}

impl<S: ReviewStore> RemoveCommand<S> {
    /// Create a new remove command.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Remove the reference with the given id.
    pub fn run(&self, id: &str) -> RemoveOutput {
        match self.remove(id) {
            Ok(reference) => RemoveOutput::success(&reference),
            Err(e) => RemoveOutput::failure(id, e.to_string()),
        }
    }

    fn remove(&self, id: &str) -> Result<Reference> {
        let references = self.store.load_references()?;
        let removed = references
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| BiblyError::not_found(id))?;

        let remaining: Vec<Reference> = references.into_iter().filter(|r| r.id != id).collect();
        self.store.save_references(&remaining)?;

        tracing::info!(id = %id, "removed reference");
        Ok(removed)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &RemoveOutput, options: &RemoveOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else if output.success {
            format!(
                "Removed \"{}\" ({}).\n",
                output.title.as_deref().unwrap_or(""),
                output.id
            )
        } else {
            format!(
                "Remove failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NewReference;
    use crate::storage::MemoryReviewStore;
    use std::sync::Arc;

    fn reference(id: &str) -> Reference {
        Reference::with_id(
            id,
            NewReference {
                title: format!("Title {}", id),
                ..Default::default()
            },
            0,
        )
    }

    #[test]
    fn test_remove_existing() {
        let store = Arc::new(MemoryReviewStore::with_references(vec![
            reference("a"),
            reference("b"),
        ]));
        let cmd = RemoveCommand::new(Arc::clone(&store));

        let output = cmd.run("a");
        assert!(output.success);
        assert_eq!(output.title.as_deref(), Some("Title a"));

        let stored = store.references();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, "b");
    }

    #[test]
    fn test_remove_unknown_id() {
        let store = Arc::new(MemoryReviewStore::with_references(vec![reference("a")]));
        let cmd = RemoveCommand::new(Arc::clone(&store));

        let output = cmd.run("zzz");
        assert!(!output.success);
        assert!(output.error.as_deref().unwrap().contains("zzz"));
        assert_eq!(store.reference_saves(), 0);

        let text = cmd.format_output(&output, &RemoveOptions::default());
        assert!(text.starts_with("Remove failed"));
    }
}
