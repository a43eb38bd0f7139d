//! Trait abstraction for the board's status sources to enable testing

use serde::Serialize;
use std::time::Instant;

/// Non-volatile memory registers captured in the raw status encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NvmRegister {
    BootCount,
    Flags,
    ResetErrors,
    DownlinkCount,
    DeployCount,
}

impl NvmRegister {
    /// Registers in the order they appear in the raw encoding
    pub const ALL: [NvmRegister; 5] = [
        NvmRegister::BootCount,
        NvmRegister::Flags,
        NvmRegister::ResetErrors,
        NvmRegister::DownlinkCount,
        NvmRegister::DeployCount,
    ];
}

/// Deployment and burn-wire flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct DeployFlags {
    pub deploy: bool,
    pub mid_deploy: bool,
    pub burn1: bool,
    pub burn2: bool,
}

/// Error and event counters, monotonic within one boot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EventCounters {
    pub state_errors: u32,
    pub vbus_resets: u32,
    pub deploy: u32,
    pub downlink: u32,
}

/// Read-only view of the flight computer's health sources
#[cfg_attr(test, mockall::automock)]
pub trait StatusProvider: Send + Sync {
    /// Boot timestamp in seconds
    fn boot_time(&self) -> u32;

    /// Number of boots recorded in NVM
    fn boot_count(&self) -> u32;

    /// Seconds since the last boot or hard reset
    fn time_on(&self) -> u64;

    /// Battery charge as a percentage of full
    fn fuel_gauge(&self) -> f32;

    fn flags(&self) -> DeployFlags;

    fn counters(&self) -> EventCounters;

    /// Raw byte stored in an NVM register
    fn register(&self, register: NvmRegister) -> u8;
}

/// Host-side stand-in used when running off the flight board
///
/// Reports time-on from process start and a full battery; every register and
/// counter reads zero.
#[derive(Debug, Clone)]
pub struct HostProvider {
    started: Instant,
    boot_time: u32,
    boot_count: u32,
}

impl HostProvider {
    pub fn new(boot_time: u32, boot_count: u32) -> Self {
        Self {
            started: Instant::now(),
            boot_time,
            boot_count,
        }
    }
}

impl StatusProvider for HostProvider {
    fn boot_time(&self) -> u32 {
        self.boot_time
    }

    fn boot_count(&self) -> u32 {
        self.boot_count
    }

    fn time_on(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    fn fuel_gauge(&self) -> f32 {
        100.0
    }

    fn flags(&self) -> DeployFlags {
        DeployFlags::default()
    }

    fn counters(&self) -> EventCounters {
        EventCounters::default()
    }

    fn register(&self, register: NvmRegister) -> u8 {
        match register {
            NvmRegister::BootCount => self.boot_count.min(u8::MAX as u32) as u8,
            _ => 0,
        }
    }
}
