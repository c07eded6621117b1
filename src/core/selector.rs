//! Due-set selection and field choice.
//!
//! Selection is stateless: every call scans the list it is given, so callers
//! must pass the latest list after each grading event.

use crate::config::ReviewConfig;
use crate::core::clock::Timestamp;
use crate::core::random::RandomSource;
use crate::core::reference::{FieldKey, Reference};

/// The set of fields that may be quizzed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleFields {
    fields: Vec<FieldKey>,
}

impl EligibleFields {
    /// Every field, title included.
    pub fn all() -> Self {
        Self {
            fields: FieldKey::ALL.to_vec(),
        }
    }

    /// Every field except title.
    pub fn without_title() -> Self {
        Self {
            fields: FieldKey::ALL
                .into_iter()
                .filter(|f| *f != FieldKey::Title)
                .collect(),
        }
    }

    /// Build the eligible set from review configuration.
    pub fn from_config(config: &ReviewConfig) -> Self {
        if config.quiz_title {
            Self::all()
        } else {
            Self::without_title()
        }
    }

    /// Check whether a field may be quizzed.
    pub fn contains(&self, field: FieldKey) -> bool {
        self.fields.contains(&field)
    }

    /// Eligible fields in scan order.
    pub fn iter(&self) -> impl Iterator<Item = FieldKey> + '_ {
        self.fields.iter().copied()
    }

    /// Number of eligible fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Check whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Default for EligibleFields {
    fn default() -> Self {
        Self::without_title()
    }
}

/// A due (reference, field) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuePair {
    pub ref_id: String,
    pub field: FieldKey,
    /// Scheduled time, `None` when no progress record exists.
    pub next_review: Option<Timestamp>,
}

impl DuePair {
    /// Ordering key; missing progress sorts first.
    fn urgency(&self) -> Timestamp {
        self.next_review.unwrap_or(0)
    }
}

/// Collect every due pair, in list order then field order.
pub fn due_fields(list: &[Reference], fields: &EligibleFields, now: Timestamp) -> Vec<DuePair> {
    let mut due = Vec::new();
    for reference in list {
        for field in fields.iter() {
            let next_review = reference.progress(field).map(|p| p.next_review);
            let is_due = next_review.map(|ts| ts <= now).unwrap_or(true);
            if is_due {
                due.push(DuePair {
                    ref_id: reference.id.clone(),
                    field,
                    next_review,
                });
            }
        }
    }
    due
}

/// Number of due pairs.
pub fn due_count(list: &[Reference], fields: &EligibleFields, now: Timestamp) -> usize {
    due_fields(list, fields, now).len()
}

/// Pick the most overdue pair.
///
/// Ties keep the first pair encountered, so the result is deterministic for a
/// fixed list order.
pub fn pick_next<'a>(
    list: &'a [Reference],
    fields: &EligibleFields,
    now: Timestamp,
) -> Option<(&'a Reference, FieldKey)> {
    let mut best: Option<DuePair> = None;
    for pair in due_fields(list, fields, now) {
        let better = match &best {
            Some(current) => pair.urgency() < current.urgency(),
            None => true,
        };
        if better {
            best = Some(pair);
        }
    }

    let pair = best?;
    list.iter()
        .find(|r| r.id == pair.ref_id)
        .map(|r| (r, pair.field))
}

/// Choose a field to quiz for a reference, uniformly at random.
///
/// Fields with an empty value are skipped when the reference has any
/// non-empty eligible field; otherwise the whole eligible set is used.
pub fn choose_field<R: RandomSource + ?Sized>(
    reference: &Reference,
    fields: &EligibleFields,
    rng: &mut R,
) -> FieldKey {
    let filled: Vec<FieldKey> = fields
        .iter()
        .filter(|f| !reference.field_value(*f).trim().is_empty())
        .collect();
    let options: Vec<FieldKey> = if filled.is_empty() {
        fields.iter().collect()
    } else {
        filled
    };

    match options.len() {
        0 => FieldKey::Year,
        n => options[rng.index(n)],
    }
}
