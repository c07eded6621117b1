//! CLI commands for bibly.
//!
//! This module provides CLI commands for bibly, organized into:
//! - **Collection commands**: add, list, remove
//! - **Review commands**: review (interactive), stats, history

// Collection commands
pub mod add;
pub mod list;
pub mod remove;

// Review commands
pub mod history;
pub mod review;
pub mod stats;

pub use add::AddCommand;
pub use history::HistoryCommand;
pub use list::ListCommand;
pub use remove::RemoveCommand;
pub use review::ReviewCommand;
pub use stats::StatsCommand;
