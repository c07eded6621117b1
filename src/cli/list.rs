//! List command for bibly.
//!
//! Lists references with the schedule of each quizzable field.

use serde::Serialize;

use crate::config::Config;
use crate::core::{format_timestamp, Clock, EligibleFields, FieldKey, Reference, Timestamp};
use crate::storage::ReviewStore;

/// Options for the list command.
#[derive(Debug, Clone, Default)]
pub struct ListOptions {
    /// Output as JSON.
    pub json: bool,
    /// Suppress output.
    pub quiet: bool,
    /// Show only references with at least one due field.
    pub due: bool,
}

/// Output format for the list command.
#[derive(Debug, Clone, Serialize)]
pub struct ListOutput {
    /// Whether the list was successful.
    pub success: bool,
    /// Number of listed references.
    pub count: usize,
    /// The references.
    pub references: Vec<ReferenceInfo>,
    /// Error message if listing failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Reference summary for output.
#[derive(Debug, Clone, Serialize)]
pub struct ReferenceInfo {
    pub id: String,
    pub title: String,
    pub authors: String,
    pub year: String,
    /// Schedule per eligible field.
    pub fields: Vec<FieldInfo>,
}

/// Schedule of one field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldInfo {
    pub field: FieldKey,
    /// Epoch milliseconds, `None` when never scheduled.
    pub next_review: Option<Timestamp>,
    pub interval: Option<u32>,
    pub due: bool,
}

impl ReferenceInfo {
    fn from_reference(reference: &Reference, fields: &EligibleFields, now: Timestamp) -> Self {
        Self {
            id: reference.id.clone(),
            title: reference.title.clone(),
            authors: reference.authors.clone(),
            year: reference.year.clone(),
            fields: fields
                .iter()
                .map(|field| {
                    let progress = reference.progress(field);
                    FieldInfo {
                        field,
                        next_review: progress.map(|p| p.next_review),
                        interval: progress.map(|p| p.interval),
                        due: progress.map(|p| p.is_due(now)).unwrap_or(true),
                    }
                })
                .collect(),
        }
    }

    fn due_count(&self) -> usize {
        self.fields.iter().filter(|f| f.due).count()
    }
}

impl ListOutput {
    /// Create a successful output.
    pub fn success(references: Vec<ReferenceInfo>) -> Self {
        Self {
            success: true,
            count: references.len(),
            references,
            error: None,
        }
    }

    /// Create a failed output.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            count: 0,
            references: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// The list command implementation.
pub struct ListCommand<S: ReviewStore, C: Clock> {
    store: S,
    clock: C,
    config: Config,
}

impl<S: ReviewStore, C: Clock> ListCommand<S, C> {
    /// Create a new list command.
    pub fn new(store: S, clock: C, config: Config) -> Self {
        Self {
            store,
            clock,
            config,
        }
    }

    /// Run the list command.
    pub fn run(&self, options: &ListOptions) -> ListOutput {
        let references = match self.store.load_references() {
            Ok(r) => r,
            Err(e) => return ListOutput::failure(e.to_string()),
        };

        let fields = EligibleFields::from_config(&self.config.review);
        let now = self.clock.now();
        let infos = references
            .iter()
            .map(|r| ReferenceInfo::from_reference(r, &fields, now))
            .filter(|info| !options.due || info.due_count() > 0)
            .collect();

        ListOutput::success(infos)
    }

    /// Format output based on options.
    pub fn format_output(&self, output: &ListOutput, options: &ListOptions) -> String {
        if options.quiet {
            return String::new();
        }

        if options.json {
            serde_json::to_string_pretty(output).unwrap_or_else(|_| "{}".to_string())
        } else {
            self.format_human_readable(output, options)
        }
    }

    /// Format output as human-readable text.
    fn format_human_readable(&self, output: &ListOutput, options: &ListOptions) -> String {
        if !output.success {
            return format!(
                "List failed: {}\n",
                output.error.as_deref().unwrap_or("unknown error")
            );
        }

        if output.references.is_empty() {
            return if options.due {
                "Nothing is due for review.\n".to_string()
            } else {
                "No references yet. Add one with `bibly add`.\n".to_string()
            };
        }

        let mut lines = vec![format!("Found {} reference(s):\n", output.count)];

        for (i, info) in output.references.iter().enumerate() {
            lines.push(format!(
                "{}. {} ({}) - {}",
                i + 1,
                info.title,
                info.year,
                info.authors
            ));
            for field in &info.fields {
                let when = match field.next_review {
                    Some(ts) => format_timestamp(ts),
                    None => "never scheduled".to_string(),
                };
                let marker = if field.due { " (due)" } else { "" };
                lines.push(format!("   {:<10} {}{}", field.field.label(), when, marker));
            }
            lines.push(format!("   ID: {}", info.id));
            lines.push(String::new());
        }

        lines.join("\n")
    }
}
