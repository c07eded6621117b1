//! SM-2 update for a single field.
//!
//! Grades follow the SuperMemo quality scale:
//! - 0: Complete blackout, no recall
//! - 1: Incorrect, but upon seeing answer, remembered
//! - 2: Incorrect, but answer seemed easy to recall
//! - 3: Correct response with serious difficulty
//! - 4: Correct response after hesitation
//! - 5: Perfect response with no hesitation
//!
//! Grades outside 0..=5 are not rejected; they only select the pass/fail
//! branch and feed the ease formula as-is.

use crate::core::clock::{Timestamp, DAY_MS};
use crate::core::reference::{FieldProgress, MIN_EASE_FACTOR};

/// Lowest grade that counts as a successful recall.
pub const PASSING_GRADE: i32 = 3;

/// Highest grade on the quality scale.
pub const MAX_GRADE: i32 = 5;

/// Check whether a grade takes the pass branch.
pub fn is_pass(grade: i32) -> bool {
    grade >= PASSING_GRADE
}

/// Ease factor change for a grade.
///
/// EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02))
pub fn ease_delta(grade: i32) -> f64 {
    let miss = MAX_GRADE as f64 - grade as f64;
    0.1 - miss * (0.08 + miss * 0.02)
}

/// Compute the progress that follows grading `prior` with `grade` at `now`.
pub fn update(prior: &FieldProgress, grade: i32, now: Timestamp) -> FieldProgress {
    let (interval, repetition) = if is_pass(grade) {
        let interval = match prior.repetition {
            0 => 1,
            1 => 6,
            _ => (prior.interval as f64 * prior.ease_factor).round() as u32,
        };
        (interval.max(1), prior.repetition.saturating_add(1))
    } else {
        (1, 0)
    };

    // Uses the prior ease factor in both branches.
    let ease_factor = (prior.ease_factor + ease_delta(grade)).max(MIN_EASE_FACTOR);

    FieldProgress {
        interval,
        repetition,
        ease_factor,
        next_review: now.saturating_add(interval as i64 * DAY_MS),
    }
}

/// Format an interval in days as a short human-readable string.
pub fn format_interval(days: u32) -> String {
    if days == 0 {
        "now".to_string()
    } else if days < 7 {
        format!("{}d", days)
    } else if days < 30 {
        format!("{}w", days / 7)
    } else if days < 365 {
        format!("{}mo", days / 30)
    } else {
        format!("{}y", days / 365)
    }
}
