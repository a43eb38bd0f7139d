//! # File Rotation Manager
//!
//! Creates numbered data and log files and rotates the active log by size.
//!
//! ## File layout
//!
//! ```text
//! logs/info.txt          sequence index for log files
//! logs/log001.txt        first log file
//! data/DATA_.info.txt    sequence index for prefix "data/DATA_"
//! data/DATA_001.txt      data file created with prefix "data/DATA_"
//! ```
//!
//! Every new file starts with a two-line header:
//!
//! ```text
//! # Created: <monotonic seconds>\r\n
//! # Status: <status snapshot as JSON>\r\n
//! ```

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

use super::sequence::SequenceIndex;
use crate::clock::{Clock, MonotonicClock};
use crate::dataset::{self, Record};
use crate::error::{HousekeepingError, Result};
use crate::indicator::{LogIndicator, StatusIndicator};
use crate::status::{snapshot, StatusProvider, StatusRecord};
use crate::storage::{self, Storage, StorageStats};

/// Prefix used for log files
pub const LOG_PREFIX: &str = "logs/log";

/// Size above which the active log is rotated (100 MB)
pub const DEFAULT_MAX_LOG_BYTES: u64 = 100_000_000;

/// Save target used until a data file is created
pub const DEFAULT_DATA_FILE: &str = "default.txt";

/// Per-caller file state: the last log written and the default save target
///
/// The active log itself is shared by every session of a [`FileManager`];
/// a session's log path only seeds it when the manager has none yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    log_file: Option<PathBuf>,
    data_file: PathBuf,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Session with no active log and the default data file
    pub fn new() -> Self {
        Self {
            log_file: None,
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
        }
    }

    /// Continue appending to an existing log file
    pub fn resume_log<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn with_data_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.data_file = path.into();
        self
    }

    /// Log most recently written through this session
    pub fn log_file(&self) -> Option<&Path> {
        self.log_file.as_deref()
    }

    pub fn data_file(&self) -> &Path {
        &self.data_file
    }

    pub fn set_data_file<P: Into<PathBuf>>(&mut self, path: P) {
        self.data_file = path.into();
    }
}

/// Split a file prefix such as `/data/DATA_` into directory and base name
pub fn split_prefix(prefix: &str) -> (PathBuf, &str) {
    let prefix = prefix.trim_start_matches('/');
    match prefix.rfind('/') {
        Some(idx) => (PathBuf::from(&prefix[..idx]), &prefix[idx + 1..]),
        None => (PathBuf::new(), prefix),
    }
}

/// Numbered file creation, log rotation and dataset saving
pub struct FileManager<S, P> {
    storage: S,
    provider: P,
    index: SequenceIndex,
    /// Log shared by all sessions; held from the size check through the append
    active_log: Mutex<Option<PathBuf>>,
    clock: Box<dyn Clock>,
    indicator: Box<dyn StatusIndicator>,
    max_log_bytes: u64,
}

impl<S: Storage, P: StatusProvider> FileManager<S, P> {
    /// Create a manager with a monotonic clock, a log-only indicator and
    /// the 100 MB rotation threshold
    pub fn new(storage: S, provider: P) -> Self {
        Self {
            storage,
            provider,
            index: SequenceIndex::new(),
            active_log: Mutex::new(None),
            clock: Box::new(MonotonicClock::new()),
            indicator: Box::new(LogIndicator),
            max_log_bytes: DEFAULT_MAX_LOG_BYTES,
        }
    }

    pub fn with_clock<C: Clock + 'static>(mut self, clock: C) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn with_indicator<I: StatusIndicator + 'static>(mut self, indicator: I) -> Self {
        self.indicator = Box::new(indicator);
        self
    }

    pub fn with_max_log_bytes(mut self, max_log_bytes: u64) -> Self {
        self.max_log_bytes = max_log_bytes;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn max_log_bytes(&self) -> u64 {
        self.max_log_bytes
    }

    /// Current status snapshot
    pub fn status(&self) -> StatusRecord {
        snapshot(&self.provider)
    }

    /// Create the next numbered file for `prefix`
    ///
    /// `prefix` is `<directory>/<base name>`, e.g. `data/DATA_`. A missing
    /// directory is created. The file is named `<base name><NNN>.txt` and
    /// starts with the creation time and a status snapshot.
    ///
    /// # Errors
    ///
    /// - `IndexCorrupt` if the directory's sequence index is unreadable
    /// - `Encoding` if the status snapshot cannot be encoded
    /// - `Storage` if the directory or the file cannot be written
    pub fn new_file(&self, prefix: &str) -> Result<PathBuf> {
        let (dir, base) = split_prefix(prefix);

        if !self.storage.exists(&dir) {
            info!("Directory {} not found, creating", dir.display());
            self.storage
                .create_dir(&dir)
                .map_err(|e| HousekeepingError::storage("Failed to create directory", &dir, e))?;
        }

        let seq = self.index.next(&self.storage, &dir, base)?;
        let path = dir.join(format!("{}{:03}.txt", base, seq));
        self.write_header(&path)?;

        info!("New file: {}", path.display());
        Ok(path)
    }

    /// Create a numbered data file and make it the session's save target
    pub fn new_data_file(&self, session: &mut Session, prefix: &str) -> Result<PathBuf> {
        let path = self.new_file(prefix)?;
        session.set_data_file(path.clone());
        Ok(path)
    }

    /// Start a new log file and make it the active log
    pub fn new_log(&self, session: &mut Session) -> Result<PathBuf> {
        let mut active = self.lock_active_log();
        let path = self.start_log(&mut active)?;
        session.log_file = Some(path.clone());
        Ok(path)
    }

    /// Append `<timestamp>,<message>` to the active log
    ///
    /// Starts a log if there is none, and rotates to a new one first if the
    /// active log has grown past the size threshold. The size check, the
    /// rotation and the append run under one lock, so concurrent sessions
    /// rotate once and keep writing to the same file. Logging is skipped
    /// without error when no SD card is present.
    ///
    /// # Errors
    ///
    /// Returns `Storage` (or the errors of [`FileManager::new_file`]) when
    /// the card is present but the log cannot be written
    pub fn append_log(&self, session: &mut Session, message: &str) -> Result<()> {
        if !self.storage.card_present() {
            debug!("No SD card present, dropping log message");
            return Ok(());
        }

        let mut active = self.lock_active_log();

        let current = active.clone().or_else(|| session.log_file.clone());
        let path = match current {
            Some(path) if self.exceeds_threshold(&path)? => {
                info!(
                    "Log file {} exceeded {} bytes, rotating",
                    path.display(),
                    self.max_log_bytes
                );
                self.start_log(&mut active)?
            }
            Some(path) => path,
            None => self.start_log(&mut active)?,
        };
        *active = Some(path.clone());
        session.log_file = Some(path.clone());

        let line = format!("{:.1},{}\r\n", self.clock.monotonic(), message);
        self.storage
            .append(&path, line.as_bytes())
            .map_err(|e| HousekeepingError::storage("Failed to append to", &path, e))
    }

    /// Save a dataset to `target`, or to the session's data file
    ///
    /// On failure the status indicator is set to red and the error returned.
    pub fn save(&self, session: &Session, data: &[Record], target: Option<&Path>) -> Result<()> {
        let target = target.unwrap_or_else(|| session.data_file());
        dataset::save(&self.storage, self.indicator.as_ref(), data, target)
    }

    /// Reconcile the sequence index for `prefix` with the files on disk
    pub fn repair_index(&self, prefix: &str) -> Result<u32> {
        let (dir, base) = split_prefix(prefix);
        self.index.repair(&self.storage, &dir, base)
    }

    /// Usage of the internal filesystem and the SD card
    pub fn storage_stats(&self) -> Result<StorageStats> {
        storage::storage_stats(&self.storage)
    }

    fn lock_active_log(&self) -> MutexGuard<'_, Option<PathBuf>> {
        self.active_log.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn start_log(&self, active: &mut Option<PathBuf>) -> Result<PathBuf> {
        let path = self.new_file(LOG_PREFIX)?;
        info!("New log file: {}", path.display());
        *active = Some(path.clone());
        Ok(path)
    }

    fn exceeds_threshold(&self, path: &Path) -> Result<bool> {
        match self.storage.size(path) {
            Ok(size) => Ok(size > self.max_log_bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(HousekeepingError::storage("Failed to stat", path, e)),
        }
    }

    fn write_header(&self, path: &Path) -> Result<()> {
        let status = snapshot(&self.provider).render()?;
        let header = format!(
            "# Created: {:.0}\r\n# Status: {}\r\n",
            self.clock.monotonic(),
            status
        );
        self.storage
            .append(path, header.as_bytes())
            .map_err(|e| HousekeepingError::storage("Failed to write header to", path, e))
    }
}
