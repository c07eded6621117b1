//! Core types and logic for bibly.
//!
//! This module contains the reference model, the SM-2 scheduler, due-set
//! selection, and the review session state machine.

pub mod citation;
pub mod clock;
pub mod random;
pub mod reference;
pub mod selector;
pub mod session;
pub mod sm2;

pub use citation::{format_authors, format_prompt};
pub use clock::{format_timestamp, Clock, FixedClock, SystemClock, Timestamp, DAY_MS};
pub use random::{shuffle, RandomSource, RngRandom, SequenceRandom};
pub use reference::{
    initialize_field_progress, replace_reference, FieldKey, FieldProgress, FieldProgressTable,
    NewReference, Reference, DEFAULT_EASE_FACTOR, MIN_EASE_FACTOR,
};
pub use selector::{choose_field, due_count, due_fields, pick_next, DuePair, EligibleFields};
pub use session::{
    answers_match, GradeOutcome, QuizItem, ReviewSession, SessionMode, SessionPhase, SessionState,
};
