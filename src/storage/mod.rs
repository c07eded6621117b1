//! Review storage for bibly.
//!
//! This module provides persistent storage for references and review
//! history, supporting file-based and in-memory backends.

pub mod file;
pub mod memory;
pub mod traits;

pub use file::FileReviewStore;
pub use memory::MemoryReviewStore;
pub use traits::ReviewStore;
