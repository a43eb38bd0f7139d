//! # Files Module
//!
//! Numbered data files and rotating log files on the SD card.
//!
//! This module handles:
//! - Allocating per-prefix sequence numbers persisted in index files
//! - Creating `<prefix><NNN>.txt` files with a status header
//! - Rotating the active log once it exceeds the size threshold

pub mod manager;
pub mod sequence;

pub use manager::{FileManager, Session, DEFAULT_MAX_LOG_BYTES, LOG_PREFIX};
pub use sequence::SequenceIndex;
