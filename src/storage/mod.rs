//! # Storage Module
//!
//! Access to the flight computer's storage media.
//!
//! This module handles:
//! - The [`Storage`] trait the rest of the crate writes through
//! - Filesystem usage statistics for the internal flash and the SD card
//!
//! Paths handed to [`Storage`] are relative to the SD card mount.

pub mod local;

use std::io;
use std::path::Path;

use crate::error::{HousekeepingError, Result};

pub use local::LocalStorage;

/// Mounted volume whose usage can be queried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Volume {
    /// Flight computer's internal filesystem
    Internal,
    /// Removable SD card
    SdCard,
}

/// Block usage of a mounted volume
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VolumeUsage {
    pub used_blocks: u64,
    pub total_blocks: u64,
}

impl VolumeUsage {
    /// Integer percentage of used blocks, in `0..=100`
    ///
    /// An empty volume reports 0.
    pub fn percent(&self) -> u8 {
        if self.total_blocks == 0 {
            return 0;
        }
        let used = self.used_blocks.min(self.total_blocks) as u128;
        (used * 100 / self.total_blocks as u128) as u8
    }
}

/// Usage percentages reported by [`storage_stats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub internal_percent: u8,
    pub sd_percent: u8,
}

/// Storage medium used by the housekeeping core
pub trait Storage: Send + Sync {
    /// Whether a file or directory exists
    fn exists(&self, path: &Path) -> bool;

    fn create_dir(&self, dir: &Path) -> io::Result<()>;

    /// Names of the entries in a directory
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<String>>;

    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace the contents of a file
    fn write(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Append to a file, creating it if needed
    fn append(&self, path: &Path, data: &[u8]) -> io::Result<()>;

    /// Fill `buf` from `offset`, returning the number of bytes read
    ///
    /// Reads fewer than `buf.len()` bytes only at end of file.
    fn read_at(&self, path: &Path, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// File size in bytes
    fn size(&self, path: &Path) -> io::Result<u64>;

    fn usage(&self, volume: Volume) -> io::Result<VolumeUsage>;

    /// Whether the optional SD card is inserted
    fn card_present(&self) -> bool;
}

/// Report usage percentages for the internal filesystem and the SD card
///
/// The SD card reads as 0% when it is absent.
///
/// # Errors
///
/// Returns `Storage` if a present volume cannot be queried
pub fn storage_stats<S: Storage + ?Sized>(storage: &S) -> Result<StorageStats> {
    let sd_percent = if storage.card_present() {
        storage
            .usage(Volume::SdCard)
            .map_err(|e| HousekeepingError::Storage(format!("Failed to stat SD card: {}", e)))?
            .percent()
    } else {
        0
    };

    let internal_percent = storage
        .usage(Volume::Internal)
        .map_err(|e| HousekeepingError::Storage(format!("Failed to stat filesystem: {}", e)))?
        .percent();

    Ok(StorageStats {
        internal_percent,
        sd_percent,
    })
}
