//! # Radio Module
//!
//! Downlink radio access over a serial link.
//!
//! This module handles:
//! - Opening the radio's serial port (8N1, no flow control)
//! - Writing downlink frames and flushing after each one
//! - The [`Transport`] trait the downlink code sends through

pub mod transport;

use std::io::Write;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::RadioConfig;
use crate::error::{HousekeepingError, Result};

pub use transport::Transport;

/// Default radio serial baud rate
pub const RADIO_BAUD_RATE: u32 = 115_200;

/// Default write timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_millis(100);

/// Serial-attached downlink radio
pub struct SerialRadio {
    port: Box<dyn tokio_serial::SerialPort>,
    /// Device path (e.g., /dev/ttyS0)
    device_path: String,
}

impl std::fmt::Debug for SerialRadio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialRadio")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl SerialRadio {
    /// Open the radio described by the `[radio]` configuration section
    pub fn open(config: &RadioConfig) -> Result<Self> {
        Self::open_with_paths(
            &[config.port.as_str()],
            config.baud_rate,
            Duration::from_millis(config.timeout_ms),
        )
    }

    /// Open the first port in `paths` that accepts the connection
    ///
    /// # Errors
    ///
    /// Returns `RadioNotFound` listing every path tried if none opens
    pub fn open_with_paths(paths: &[&str], baud_rate: u32, timeout: Duration) -> Result<Self> {
        for path in paths {
            debug!("Trying to open radio port: {}", path);

            match Self::open_port(path, baud_rate, timeout) {
                Ok(port) => {
                    info!("Opened radio at {} ({} baud)", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(HousekeepingError::RadioNotFound(paths.join(", ")))
    }

    fn open_port(
        path: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Box<dyn tokio_serial::SerialPort>> {
        tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|e| HousekeepingError::Transport(format!("Failed to open {}: {}", path, e)))
    }

    /// Open with the default baud rate and timeout
    pub fn open_path(path: &str) -> Result<Self> {
        Self::open_with_paths(&[path], RADIO_BAUD_RATE, DEFAULT_TIMEOUT)
    }

    pub fn device_path(&self) -> &str {
        &self.device_path
    }
}

impl Transport for SerialRadio {
    fn send_frame(&mut self, frame: &[u8]) -> std::io::Result<()> {
        self.port.write_all(frame)?;
        self.port.flush()?;
        debug!("Sent downlink frame ({} bytes)", frame.len());
        Ok(())
    }
}
