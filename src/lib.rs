//! bibly - spaced repetition for bibliographic citations
//!
//! bibly schedules each field of a citation (year, publisher, area, authors,
//! and optionally title) independently with the SM-2 algorithm, quizzes the
//! most overdue field first, and keeps a capped history of every answer.

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod history;
pub mod storage;

pub use crate::config::Config;
pub use crate::core::{
    Clock, FieldKey, FieldProgress, NewReference, RandomSource, Reference, ReviewSession,
    SessionMode, SessionPhase, SystemClock,
};
pub use crate::error::{BiblyError, Result};
pub use crate::history::{HistoryLedger, ReviewHistoryItem, ReviewStats};
pub use crate::storage::{FileReviewStore, MemoryReviewStore, ReviewStore};

// CLI commands
pub use crate::cli::{
    AddCommand, HistoryCommand, ListCommand, RemoveCommand, ReviewCommand, StatsCommand,
};
