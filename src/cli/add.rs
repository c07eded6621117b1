//! Add command for bibly.
//!
//! Creates a reference with every field scheduled for immediate review.

use serde::Serialize;

use crate::core::{Clock, NewReference, Reference};
use crate::error::{BiblyError, Result};
use crate::storage::ReviewStore;

/// Options for the add command.
#[derive(Debug, Clone, Default)]
pub struct AddOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
}

/// Output format for the add command.
#[derive(Debug, Clone, Serialize)]
pub struct AddOutput {
    /// Whether the reference was stored.
    pub success: bool,
    /// Id of the new reference.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Title of the new reference.
    pub title: String,
    /// Error message if adding failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AddOutput {
    /// Create a successful output.
    pub fn success(reference: &Reference) -> Self {
        Self {
            success: true,
            id: Some(reference.id.clone()),
            title: reference.title.clone(),
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            title: String::new(),
            error: Some(error.into()),
        }
    }
}

/// The add command implementation.
pub struct AddCommand<S: ReviewStore, C: Clock> {
    store: S,
    clock: C,
}

impl<S: ReviewStore, C: Clock> AddCommand<S, C> {
    /// Create a new add command.
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    /// Validate and store a new reference.
    pub fn run(&self, form: NewReference) -> AddOutput {
        match self.add(form) {
            Ok(reference) => AddOutput::success(&reference),
            Err(e) => AddOutput::failure(e.to_string()),
        }
    }

    fn add(&self, form: NewReference) -> Result<Reference> {
        for (name, value) in [
            ("title", &form.title),
            ("authors", &form.authors),
            ("year", &form.year),
            ("publisher", &form.publisher),
            ("area", &form.area),
        ] {
            if value.trim().is_empty() {
                return Err(BiblyError::invalid_input(format!("{} must not be empty", name)));
            }
        }

        let mut references = self.store.load_references()?;
        let reference = Reference::new(form, self.clock.now());
        references.push(reference.clone());
        self.store.save_references(&references)?;

        tracing::info!(id = %reference.id, "added reference");
        Ok(reference)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &AddOutput, options: &AddOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else if output.success {
            format!(
                "Added \"{}\" ({}).\nAll fields are due for review.\n",
                output.title,
                output.id.as_deref().unwrap_or("-")
            )
        } else {
            format!(
                "Add failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            )
        }
    }
}
