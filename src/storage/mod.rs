//! Output sinks for collected comments
//!
//! Results are plain text lines appended in processing order. The file sink is the
//! production target; the memory sink backs tests.

pub mod text;

pub use text::{AppendFileSink, MemorySink};

use crate::utils::error::StorageError;

/// Append-only line sink
pub trait OutputSink: Send + Sync {
    /// Append `line` followed by a newline
    ///
    /// `line` may itself contain newlines; page headers start with one to leave a
    /// blank line before the title.
    fn append_line(&self, line: &str) -> Result<(), StorageError>;
}
