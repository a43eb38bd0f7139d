//! # Status Record
//!
//! Fixed-field status snapshot and its 13-byte big-endian encoding.
//!
//! ```text
//! Byte 0-4:  NVM registers (boot-count, flags, reset-errors, downlink, deploy)
//! Byte 5-7:  boot-time (24-bit, big-endian)
//! Byte 8-11: time-on (32-bit, big-endian)
//! Byte 12:   fuel-gauge (8-bit)
//! ```

use serde::Serialize;

use super::provider::{DeployFlags, EventCounters, NvmRegister, StatusProvider};
use crate::error::{HousekeepingError, Result};

/// Length of the raw status encoding
pub const STATUS_RAW_LEN: usize = 13;

/// Number of NVM register bytes at the start of the encoding
pub const NVM_REGISTER_COUNT: usize = 5;

/// Largest boot-time that fits the 3-byte field
pub const BOOT_TIME_MAX: u32 = 0x00FF_FFFF;

/// Largest time-on that fits the 4-byte field
pub const TIME_ON_MAX: u64 = u32::MAX as u64;

/// Raw NVM register bytes, in encoding order
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct NvmRegisters {
    pub boot_count: u8,
    pub flags: u8,
    pub reset_errors: u8,
    pub downlink_count: u8,
    pub deploy_count: u8,
}

impl NvmRegisters {
    pub fn to_bytes(self) -> [u8; NVM_REGISTER_COUNT] {
        [
            self.boot_count,
            self.flags,
            self.reset_errors,
            self.downlink_count,
            self.deploy_count,
        ]
    }

    pub fn from_bytes(bytes: [u8; NVM_REGISTER_COUNT]) -> Self {
        Self {
            boot_count: bytes[0],
            flags: bytes[1],
            reset_errors: bytes[2],
            downlink_count: bytes[3],
            deploy_count: bytes[4],
        }
    }

    fn read(provider: &dyn StatusProvider) -> Self {
        let mut bytes = [0u8; NVM_REGISTER_COUNT];
        for (slot, register) in bytes.iter_mut().zip(NvmRegister::ALL) {
            *slot = provider.register(register);
        }
        Self::from_bytes(bytes)
    }
}

/// Point-in-time capture of onboard health telemetry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StatusRecord {
    pub boot_time: u32,
    pub boot_count: u32,
    pub time_on: u64,
    pub fuel_gauge: u8,
    pub flags: DeployFlags,
    pub counters: EventCounters,
    pub registers: NvmRegisters,
}

/// Fields recoverable from the raw encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawStatus {
    pub registers: NvmRegisters,
    pub boot_time: u32,
    pub time_on: u32,
    pub fuel_gauge: u8,
}

#[derive(Serialize)]
struct StatusReport<'a> {
    #[serde(flatten)]
    record: &'a StatusRecord,
    raw: [u8; STATUS_RAW_LEN],
}

/// Clamp a fuel-gauge reading to the 8-bit range
///
/// NaN reads as 0; the fractional part is truncated.
pub fn clamp_fuel_gauge(reading: f32) -> u8 {
    if reading.is_nan() {
        return 0;
    }
    reading.clamp(0.0, u8::MAX as f32) as u8
}

/// Take a status snapshot from the provider
///
/// Pure read of the provider; the fuel gauge is clamped into `0..=255`.
pub fn snapshot(provider: &dyn StatusProvider) -> StatusRecord {
    StatusRecord {
        boot_time: provider.boot_time(),
        boot_count: provider.boot_count(),
        time_on: provider.time_on(),
        fuel_gauge: clamp_fuel_gauge(provider.fuel_gauge()),
        flags: provider.flags(),
        counters: provider.counters(),
        registers: NvmRegisters::read(provider),
    }
}

impl StatusRecord {
    /// Encode into the 13-byte raw layout
    ///
    /// # Errors
    ///
    /// Returns `Encoding` if boot-time exceeds 24 bits or time-on exceeds 32 bits
    pub fn encode(&self) -> Result<[u8; STATUS_RAW_LEN]> {
        if self.boot_time > BOOT_TIME_MAX {
            return Err(HousekeepingError::Encoding {
                field: "boot-time",
                value: self.boot_time as u64,
                width: 3,
            });
        }
        if self.time_on > TIME_ON_MAX {
            return Err(HousekeepingError::Encoding {
                field: "time-on",
                value: self.time_on,
                width: 4,
            });
        }

        let mut raw = [0u8; STATUS_RAW_LEN];
        raw[..5].copy_from_slice(&self.registers.to_bytes());
        raw[5..8].copy_from_slice(&self.boot_time.to_be_bytes()[1..]);
        raw[8..12].copy_from_slice(&(self.time_on as u32).to_be_bytes());
        raw[12] = self.fuel_gauge;
        Ok(raw)
    }

    /// Single-line JSON rendering used in file headers
    pub fn render(&self) -> Result<String> {
        let report = StatusReport {
            record: self,
            raw: self.encode()?,
        };
        Ok(serde_json::to_string(&report)?)
    }
}

impl RawStatus {
    /// Decode a 13-byte raw status buffer
    ///
    /// # Errors
    ///
    /// Returns `Encoding` if the buffer is not exactly 13 bytes
    pub fn decode(raw: &[u8]) -> Result<Self> {
        if raw.len() != STATUS_RAW_LEN {
            return Err(HousekeepingError::Encoding {
                field: "raw status",
                value: raw.len() as u64,
                width: STATUS_RAW_LEN,
            });
        }

        Ok(Self {
            registers: NvmRegisters::from_bytes([raw[0], raw[1], raw[2], raw[3], raw[4]]),
            boot_time: u32::from_be_bytes([0, raw[5], raw[6], raw[7]]),
            time_on: u32::from_be_bytes([raw[8], raw[9], raw[10], raw[11]]),
            fuel_gauge: raw[12],
        })
    }
}
