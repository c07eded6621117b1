//! APA-style cloze prompts.
//!
//! A prompt renders the citation as `Authors (Year). Title. Publisher, Area`
//! with the quizzed field replaced by a `[Label?]` blank.

use crate::core::reference::{FieldKey, Reference};

/// Join an ` and `-separated author list the APA way.
///
/// `A` → `A`, `A and B` → `A & B`, `A and B and C` → `A, B, & C`.
pub fn format_authors(authors: &str) -> String {
    let names: Vec<&str> = authors
        .split(" and ")
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .collect();

    match names.as_slice() {
        [] => String::new(),
        [one] => one.to_string(),
        [first, second] => format!("{} & {}", first, second),
        [init @ .., last] => format!("{}, & {}", init.join(", "), last),
    }
}

fn blank(field: FieldKey) -> String {
    format!("[{}?]", field.label())
}

/// Render the citation of `reference` with `hidden` blanked out.
pub fn format_prompt(reference: &Reference, hidden: FieldKey) -> String {
    let part = |field: FieldKey| -> String {
        if field == hidden {
            blank(field)
        } else if field == FieldKey::Authors {
            format_authors(&reference.authors)
        } else {
            reference.field_value(field).to_string()
        }
    };
    let shown = |field: FieldKey| field == hidden || !reference.field_value(field).is_empty();

    let mut out = format!(
        "{} ({}). {}",
        part(FieldKey::Authors),
        part(FieldKey::Year),
        part(FieldKey::Title)
    );
    if shown(FieldKey::Publisher) {
        out.push_str(". ");
        out.push_str(&part(FieldKey::Publisher));
    }
    if shown(FieldKey::Area) {
        out.push_str(", ");
        out.push_str(&part(FieldKey::Area));
    }
    out
}
