//! JSONL-file history.
//!
//! Each non-blank line of the file is one page: a JSON array of message
//! records. Line order is page order.

use super::{HistoryApi, MemoryHistory, PageTicket};
use crate::model::{HistoryError, MessageRecord};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// History loaded from a JSONL file.
#[derive(Debug, Clone)]
pub struct FileHistory {
    path: PathBuf,
    pages: MemoryHistory,
}

impl FileHistory {
    /// Read and decode every page of `path`.
    ///
    /// # Errors
    ///
    /// Returns `HistoryError::Unavailable` if the file cannot be read and
    /// `HistoryError::InvalidPage` for the first line that is not a JSON array
    /// of records.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| HistoryError::Unavailable(format!("{}: {e}", path.display())))?;
        let pages = parse_pages(BufReader::new(file))?;
        info!(path = %path.display(), pages = pages.len(), "Loaded history file");
        Ok(Self {
            path: path.to_path_buf(),
            pages,
        })
    }

    /// Source file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// True if the file held no pages.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

impl HistoryApi for FileHistory {
    fn request(&mut self, id: u64) -> PageTicket {
        debug!(id, path = %self.path.display(), "History page requested");
        self.pages.request(id)
    }
}

/// Decode pages from JSONL. Blank lines are skipped.
///
/// # Errors
///
/// Returns `HistoryError::InvalidPage` with the 1-based line number of the
/// first undecodable line, or `HistoryError::Unavailable` on read failure.
pub fn parse_pages(reader: impl BufRead) -> Result<MemoryHistory, HistoryError> {
    let mut pages = MemoryHistory::default();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| HistoryError::Unavailable(e.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let page: Vec<MessageRecord> =
            serde_json::from_str(&line).map_err(|e| HistoryError::InvalidPage {
                line: index + 1,
                message: e.to_string(),
            })?;
        pages.push_page(page);
    }
    Ok(pages)
}
