//! Review history and statistics.
//!
//! The ledger records every grading event; statistics combine it with the
//! scheduling state of the reference collection.

pub mod ledger;
pub mod stats;

pub use ledger::{HistoryLedger, ReviewHistoryItem, DEFAULT_ACCURACY_WINDOW, DEFAULT_CAPACITY};
pub use stats::{AccuracyBand, ReviewStats};
