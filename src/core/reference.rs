//! Reference and per-field progress types.
//!
//! A reference carries five bibliographic fields and one progress record per
//! field. Progress lives in a fixed-slot table indexed by [`FieldKey`], so a
//! reference never grows or shrinks its memory state; an empty slot means
//! "never scheduled" and is treated as due.
//!
//! Loading is tolerant of data written by older clients: a missing or
//! malformed `fieldProgress` is rebuilt through [`initialize_field_progress`]
//! at the epoch, a malformed entry falls back to that default, and numeric
//! text fields are read as strings.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::core::clock::Timestamp;
use crate::error::BiblyError;

/// Ease factor assigned to a freshly initialized field.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Lower bound for the ease factor.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Bibliographic field that can be quizzed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKey {
    Year,
    Publisher,
    Area,
    Authors,
    Title,
}

impl FieldKey {
    /// Every field, in scan order.
    pub const ALL: [FieldKey; 5] = [
        FieldKey::Year,
        FieldKey::Publisher,
        FieldKey::Area,
        FieldKey::Authors,
        FieldKey::Title,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            FieldKey::Year => "Year",
            FieldKey::Publisher => "Publisher",
            FieldKey::Area => "Area/Topic",
            FieldKey::Authors => "Authors",
            FieldKey::Title => "Title",
        }
    }

    /// Wire name, as used in persisted JSON.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKey::Year => "year",
            FieldKey::Publisher => "publisher",
            FieldKey::Area => "area",
            FieldKey::Authors => "authors",
            FieldKey::Title => "title",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKey {
    type Err = BiblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "year" => Ok(FieldKey::Year),
            "publisher" => Ok(FieldKey::Publisher),
            "area" => Ok(FieldKey::Area),
            "authors" => Ok(FieldKey::Authors),
            "title" => Ok(FieldKey::Title),
            other => Err(BiblyError::invalid_input(format!(
                "unknown field '{}'",
                other
            ))),
        }
    }
}

/// Memory state for one (reference, field) pair.
///
/// Missing keys in persisted data fall back to the `Default` values, which
/// place the record at the epoch and therefore make it due.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldProgress {
    /// Days until the next review (always >= 1).
    pub interval: u32,
    /// Consecutive successful recalls.
    pub repetition: u32,
    /// Multiplicative growth factor for the interval (always >= 1.3).
    pub ease_factor: f64,
    /// Epoch milliseconds of the next scheduled review.
    pub next_review: Timestamp,
}

impl Default for FieldProgress {
    fn default() -> Self {
        Self {
            interval: 1,
            repetition: 0,
            ease_factor: DEFAULT_EASE_FACTOR,
            next_review: 0,
        }
    }
}

impl FieldProgress {
    /// Fresh progress, due at `now`.
    pub fn new(now: Timestamp) -> Self {
        Self {
            next_review: now,
            ..Self::default()
        }
    }

    /// Check whether this field should be reviewed at `now`.
    pub fn is_due(&self, now: Timestamp) -> bool {
        self.next_review <= now
    }

    /// Clamp values that violate the record invariants back into range.
    pub fn sanitized(self) -> Self {
        let ease_factor = if self.ease_factor.is_finite() {
            self.ease_factor.max(MIN_EASE_FACTOR)
        } else {
            DEFAULT_EASE_FACTOR
        };
        Self {
            interval: self.interval.max(1),
            ease_factor,
            ..self
        }
    }
}

/// Fixed-slot progress table, one optional record per [`FieldKey`].
///
/// Serialized as a JSON object keyed by field name. On load, unknown keys
/// are dropped and absent or malformed entries are initialized at the epoch,
/// so every slot of a deserialized table is populated and due until graded.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(into = "BTreeMap<String, FieldProgress>")]
pub struct FieldProgressTable {
    slots: [Option<FieldProgress>; 5],
}

impl FieldProgressTable {
    /// Progress for a field, if it has ever been scheduled.
    pub fn get(&self, field: FieldKey) -> Option<&FieldProgress> {
        self.slots[field.slot()].as_ref()
    }

    /// Store progress for a field.
    pub fn set(&mut self, field: FieldKey, progress: FieldProgress) {
        self.slots[field.slot()] = Some(progress);
    }

    /// Iterate over every field with its (possibly absent) progress.
    pub fn iter(&self) -> impl Iterator<Item = (FieldKey, Option<&FieldProgress>)> + '_ {
        FieldKey::ALL
            .iter()
            .map(move |&field| (field, self.get(field)))
    }

    /// Number of populated slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Check whether no slot is populated.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FieldProgressTable {
    /// Build a table from persisted JSON, never failing.
    pub fn from_json(value: Value) -> Self {
        let mut table = initialize_field_progress(0);
        let map = match value {
            Value::Object(map) => map,
            Value::Null => return table,
            other => {
                tracing::debug!(value = %other, "fieldProgress is not an object, resetting");
                return table;
            }
        };

        for (key, entry) in map {
            let field = match key.parse::<FieldKey>() {
                Ok(field) => field,
                Err(_) => {
                    tracing::debug!(key = %key, "ignoring unknown fieldProgress key");
                    continue;
                }
            };
            match serde_json::from_value::<FieldProgress>(entry) {
                Ok(progress) => table.set(field, progress.sanitized()),
                Err(e) => {
                    tracing::debug!(key = %key, error = %e, "dropping malformed fieldProgress entry")
                }
            }
        }
        table
    }
}

impl<'de> Deserialize<'de> for FieldProgressTable {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_json)
    }
}

impl From<FieldProgressTable> for BTreeMap<String, FieldProgress> {
    fn from(table: FieldProgressTable) -> Self {
        table
            .iter()
            .filter_map(|(field, progress)| progress.map(|p| (field.as_str().to_string(), *p)))
            .collect()
    }
}

/// Build a table with every field initialized and immediately due.
pub fn initialize_field_progress(now: Timestamp) -> FieldProgressTable {
    let mut table = FieldProgressTable::default();
    for field in FieldKey::ALL {
        table.set(field, FieldProgress::new(now));
    }
    table
}

/// User-entered citation data for a new reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReference {
    pub title: String,
    pub authors: String,
    pub year: String,
    pub publisher: String,
    pub area: String,
}

/// Read a text field that older clients may have stored as a number.
fn lenient_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => {
            tracing::debug!(value = %other, "ignoring non-text citation field");
            String::new()
        }
    })
}

fn legacy_field_progress() -> FieldProgressTable {
    initialize_field_progress(0)
}

/// A bibliographic citation with its per-field review state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    /// Opaque unique identifier.
    #[serde(deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub authors: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub year: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub publisher: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub area: String,
    /// Per-field progress; initialized at the epoch when absent in legacy data.
    #[serde(default = "legacy_field_progress")]
    pub field_progress: FieldProgressTable,
}

impl Reference {
    /// Create a reference with a fresh id and all fields due at `now`.
    pub fn new(form: NewReference, now: Timestamp) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), form, now)
    }

    /// Create a reference with a caller-chosen id.
    pub fn with_id(id: impl Into<String>, form: NewReference, now: Timestamp) -> Self {
        Self {
            id: id.into(),
            title: form.title.trim().to_string(),
            authors: form.authors.trim().to_string(),
            year: form.year.trim().to_string(),
            publisher: form.publisher.trim().to_string(),
            area: form.area.trim().to_string(),
            field_progress: initialize_field_progress(now),
        }
    }

    /// Text value of a field.
    pub fn field_value(&self, field: FieldKey) -> &str {
        match field {
            FieldKey::Year => &self.year,
            FieldKey::Publisher => &self.publisher,
            FieldKey::Area => &self.area,
            FieldKey::Authors => &self.authors,
            FieldKey::Title => &self.title,
        }
    }

    /// Progress for a field, if present.
    pub fn progress(&self, field: FieldKey) -> Option<&FieldProgress> {
        self.field_progress.get(field)
    }

    /// Return a copy with one field's progress replaced.
    pub fn with_progress(&self, field: FieldKey, progress: FieldProgress) -> Self {
        let mut updated = self.clone();
        updated.field_progress.set(field, progress);
        updated
    }
}

/// Return a new list where the reference sharing `updated.id` is replaced.
pub fn replace_reference(list: &[Reference], updated: &Reference) -> Vec<Reference> {
    list.iter()
        .map(|r| {
            if r.id == updated.id {
                updated.clone()
            } else {
                r.clone()
            }
        })
        .collect()
}
