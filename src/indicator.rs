//! RGB status indicator used to flag unrecoverable faults.

use tracing::warn;

/// RGB colour for the board's status LED
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    /// Fault colour shown after a failed save
    pub const RED: Rgb = Rgb::new(255, 0, 0);

    pub const OFF: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// Visible fault signalling
#[cfg_attr(test, mockall::automock)]
pub trait StatusIndicator: Send + Sync {
    fn set_rgb(&self, colour: Rgb);
}

/// Indicator that reports colour changes through the diagnostic log
#[derive(Debug, Clone, Copy, Default)]
pub struct LogIndicator;

impl StatusIndicator for LogIndicator {
    fn set_rgb(&self, colour: Rgb) {
        warn!(
            "Status indicator set to RGB({}, {}, {})",
            colour.red, colour.green, colour.blue
        );
    }
}
