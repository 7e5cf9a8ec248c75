//! Plain text sinks
//!
//! [`AppendFileSink`] reopens its file in append mode on every write and keeps no
//! handle between writes.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use super::OutputSink;
use crate::utils::error::StorageError;

/// Appends lines to a UTF-8 text file
#[derive(Debug, Clone)]
pub struct AppendFileSink {
    path: PathBuf,
}

impl AppendFileSink {
    /// Create a sink for `path`, creating missing parent directories
    ///
    /// The file itself is created on first write.
    ///
    /// # Example
    /// ```no_run
    /// use bilicomments::storage::{AppendFileSink, OutputSink};
    /// use std::path::Path;
    ///
    /// let sink = AppendFileSink::new(Path::new("./output/comments.txt")).unwrap();
    /// sink.append_line("1. hello").unwrap();
    /// ```
    pub fn new(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| StorageError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Target file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl OutputSink for AppendFileSink {
    fn append_line(&self, line: &str) -> Result<(), StorageError> {
        let io_err = |source: std::io::Error| StorageError::Io {
            path: self.path.display().to_string(),
            source,
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(io_err)?;

        writeln!(file, "{line}").map_err(io_err)
    }
}

/// Collects lines in memory
///
/// Clones share the same buffer, so a test can keep one clone and hand another to
/// the pipeline.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines appended so far
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .map(|lines| lines.clone())
            .unwrap_or_default()
    }

    /// Buffer rendered exactly as the file sink would write it
    pub fn contents(&self) -> String {
        self.lines()
            .iter()
            .map(|line| format!("{line}\n"))
            .collect()
    }
}

impl OutputSink for MemorySink {
    fn append_line(&self, line: &str) -> Result<(), StorageError> {
        self.lines
            .lock()
            .map_err(|_| StorageError::Poisoned)?
            .push(line.to_string());
        Ok(())
    }
}
