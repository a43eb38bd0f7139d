//! # Sequence Index
//!
//! Persisted next-file counter for each prefix of numbered files.
//!
//! Every `(directory, prefix)` pair has its own index file holding a single
//! decimal integer:
//!
//! ```text
//! logs/info.txt          counter for logs/log<NNN>.txt
//! data/DATA_.info.txt    counter for data/DATA_<NNN>.txt
//! ```
//!
//! Every allocation reads the counter, increments it and writes it back under
//! a mutex, so two callers sharing one index never observe the same number.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

use crate::error::{HousekeepingError, Result};
use crate::storage::Storage;

/// Name of the log index file, and suffix of every other prefix's index
pub const INDEX_FILE_NAME: &str = "info.txt";

/// Base name of log files, whose index keeps the bare `info.txt` name
pub const LOG_BASE_NAME: &str = "log";

/// Extension of numbered files
pub const FILE_EXTENSION: &str = ".txt";

/// Allocates strictly increasing sequence numbers
#[derive(Debug, Default)]
pub struct SequenceIndex {
    lock: Mutex<()>,
}

impl SequenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the index file for `prefix` in `dir`
    pub fn index_path(dir: &Path, prefix: &str) -> PathBuf {
        if prefix == LOG_BASE_NAME {
            dir.join(INDEX_FILE_NAME)
        } else {
            dir.join(format!("{}.{}", prefix, INDEX_FILE_NAME))
        }
    }

    /// Read the persisted value without incrementing it
    ///
    /// Returns `None` when no index has been written yet.
    pub fn current<S: Storage + ?Sized>(
        &self,
        storage: &S,
        dir: &Path,
        prefix: &str,
    ) -> Result<Option<u32>> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        read_index(storage, dir, prefix)
    }

    /// Allocate the next sequence number for `prefix` in `dir`
    ///
    /// The result is one past the larger of the persisted value and the
    /// highest `<prefix>NNN.txt` already in the directory. On an empty
    /// directory successive calls return 1, 2, 3, ...
    ///
    /// # Errors
    ///
    /// - `IndexCorrupt` if the index file exists but cannot be read as a number
    /// - `Storage` if the directory cannot be listed or the index cannot be written
    pub fn next<S: Storage + ?Sized>(&self, storage: &S, dir: &Path, prefix: &str) -> Result<u32> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        let persisted = read_index(storage, dir, prefix)?.unwrap_or(0);
        let highest = highest_suffix(storage, dir, prefix)?.unwrap_or(0);

        let next = persisted
            .max(highest)
            .checked_add(1)
            .ok_or(HousekeepingError::Encoding {
                field: "sequence number",
                value: u64::from(u32::MAX) + 1,
                width: 4,
            })?;

        write_index(storage, dir, prefix, next)?;
        debug!("Allocated sequence number {} for {}/{}", next, dir.display(), prefix);
        Ok(next)
    }

    /// Bring the index back in line with the files on disk
    ///
    /// Used on startup after an interrupted write or an `IndexCorrupt` error.
    /// A corrupt index is replaced by the highest existing suffix; a valid one
    /// is only ever moved forward.
    pub fn repair<S: Storage + ?Sized>(&self, storage: &S, dir: &Path, prefix: &str) -> Result<u32> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        if !storage.exists(dir) {
            return Ok(0);
        }

        let persisted = match read_index(storage, dir, prefix) {
            Ok(value) => value,
            Err(HousekeepingError::IndexCorrupt { path, reason }) => {
                warn!("Discarding corrupt sequence index {}: {}", path.display(), reason);
                None
            }
            Err(e) => return Err(e),
        };
        let highest = highest_suffix(storage, dir, prefix)?.unwrap_or(0);

        let repaired = persisted.unwrap_or(0).max(highest);
        if persisted != Some(repaired) {
            write_index(storage, dir, prefix, repaired)?;
            warn!("Sequence index for {}/{} repaired to {}", dir.display(), prefix, repaired);
        }
        Ok(repaired)
    }
}

/// Parse the sequence number out of `<prefix><digits>.txt`
pub fn parse_suffix(name: &str, prefix: &str) -> Option<u32> {
    let digits = name.strip_prefix(prefix)?.strip_suffix(FILE_EXTENSION)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Highest sequence number among `<prefix>NNN.txt` files in `dir`
pub fn highest_suffix<S: Storage + ?Sized>(storage: &S, dir: &Path, prefix: &str) -> Result<Option<u32>> {
    if !storage.exists(dir) {
        return Ok(None);
    }

    let names = storage
        .list_dir(dir)
        .map_err(|e| HousekeepingError::storage("Failed to list", dir, e))?;

    Ok(names.iter().filter_map(|name| parse_suffix(name, prefix)).max())
}

fn read_index<S: Storage + ?Sized>(storage: &S, dir: &Path, prefix: &str) -> Result<Option<u32>> {
    let path = SequenceIndex::index_path(dir, prefix);

    let contents = match storage.read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(HousekeepingError::IndexCorrupt {
                path,
                reason: e.to_string(),
            })
        }
    };

    let first_line = contents.lines().next().unwrap_or("").trim();
    first_line
        .parse::<u32>()
        .map(Some)
        .map_err(|_| HousekeepingError::IndexCorrupt {
            path,
            reason: format!("not a sequence number: {:?}", first_line),
        })
}

fn write_index<S: Storage + ?Sized>(storage: &S, dir: &Path, prefix: &str, value: u32) -> Result<()> {
    let path = SequenceIndex::index_path(dir, prefix);
    storage
        .write(&path, value.to_string().as_bytes())
        .map_err(|e| HousekeepingError::storage("Failed to write", &path, e))
}
