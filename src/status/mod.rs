//! # Status Module
//!
//! Status snapshots of the flight computer.
//!
//! This module handles:
//! - Reading boot time, boot count, time-on and the fuel gauge
//! - Capturing deployment flags and event counters
//! - Encoding the fixed 13-byte raw status layout

pub mod provider;
pub mod record;

pub use provider::{DeployFlags, EventCounters, HostProvider, NvmRegister, StatusProvider};
pub use record::{snapshot, RawStatus, StatusRecord, STATUS_RAW_LEN};
