//! # Qube Housekeeping
//!
//! Onboard housekeeping daemon: periodic status logging to the SD card and
//! downlink of the active log over the radio.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tokio::time::{interval, Duration};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use qube_housekeeping::config::Config;
use qube_housekeeping::downlink;
use qube_housekeeping::files::{FileManager, Session, LOG_PREFIX};
use qube_housekeeping::radio::SerialRadio;
use qube_housekeeping::status::HostProvider;
use qube_housekeeping::storage::LocalStorage;

/// Configuration used when no path is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix of the rolling diagnostic log
const DIAGNOSTICS_FILE_PREFIX: &str = "housekeeping.log";

/// Largest boot time the status record can carry (24 bits)
const BOOT_TIME_MASK: u64 = 0xFF_FFFF;

/// Install the console and rolling-file tracing layers
///
/// The returned guard flushes the file writer and must be held until exit.
fn init_logging(diagnostics_dir: &str) -> WorkerGuard {
    let file_appender = tracing_appender::rolling::daily(diagnostics_dir, DIAGNOSTICS_FILE_PREFIX);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_writer)
                .with_ansi(false),
        )
        .init();

    guard
}

fn config_path() -> PathBuf {
    std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Wall-clock seconds truncated to the status record's boot time width
fn boot_time() -> u32 {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    (secs & BOOT_TIME_MASK) as u32
}

/// Main entry point for the housekeeping daemon
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Load configuration (first argument, or `config/default.toml`)
///    - Set up console and rolling-file logging
///    - Reconcile the log sequence index with the SD card
///    - Open the radio if enabled; run without downlink if it is missing
///
/// 2. **Main Loop**
///    - Every `interval_s`: append a status line to the active log and
///      report storage usage
///    - Every `downlink_interval_s`: downlink the active log
///    - Handle Ctrl+C for graceful shutdown
///
/// # Errors
///
/// Returns error if the configuration cannot be loaded or is invalid
#[tokio::main]
async fn main() -> Result<()> {
    let path = config_path();
    let config = Config::load(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    let _guard = init_logging(&config.housekeeping.diagnostics_dir);

    info!("Qube Housekeeping v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration loaded from {}", path.display());

    let storage = LocalStorage::new(&config.storage.sd_root)
        .with_system_root(&config.storage.system_root)
        .with_card_present(config.storage.sd_card_present);
    let provider = HostProvider::new(boot_time(), 0);
    let manager = FileManager::new(storage, provider)
        .with_max_log_bytes(config.storage.max_log_bytes);
    let mut session = Session::new().with_data_file(&config.storage.default_data_file);

    if config.storage.sd_card_present {
        match manager.repair_index(LOG_PREFIX) {
            Ok(seq) => info!("Log sequence index at {}", seq),
            Err(e) => warn!("Could not reconcile log sequence index: {}", e),
        }
    } else {
        warn!("SD card not present, logging disabled");
    }

    let mut radio = if config.radio.enabled {
        match SerialRadio::open(&config.radio) {
            Ok(radio) => Some(radio),
            Err(e) => {
                warn!("Radio unavailable, downlink disabled: {}", e);
                None
            }
        }
    } else {
        info!("Radio disabled in configuration");
        None
    };

    let mut housekeeping_interval = interval(Duration::from_secs(config.housekeeping.interval_s));
    let mut downlink_interval = interval(Duration::from_secs(config.radio.downlink_interval_s));
    // First tick completes immediately; the first downlink waits a full period
    downlink_interval.tick().await;

    info!(
        "Starting housekeeping loop (status every {}s, downlink every {}s)",
        config.housekeeping.interval_s, config.radio.downlink_interval_s
    );
    info!("Press Ctrl+C to exit");

    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            _ = housekeeping_interval.tick() => {
                ticks += 1;
                housekeeping_tick(&manager, &mut session);
            }

            _ = downlink_interval.tick() => {
                let (Some(radio), Some(log)) = (radio.as_mut(), session.log_file()) else {
                    continue;
                };
                let log = log.to_path_buf();
                let chunk_size = config.radio.chunk_size;

                let result = tokio::task::block_in_place(|| {
                    downlink::send_file(manager.storage(), radio, &log, chunk_size)
                });
                if let Err(e) = result {
                    error!("Downlink of {} failed: {}", log.display(), e);
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                info!("Completed {} housekeeping cycles", ticks);
                break;
            }
        }
    }

    Ok(())
}

/// Log one status line and the current storage usage
fn housekeeping_tick(manager: &FileManager<LocalStorage, HostProvider>, session: &mut Session) {
    let status = manager.status();
    let summary = format!(
        "status,boot_count={},time_on={},fuel={}",
        status.boot_count, status.time_on, status.fuel_gauge
    );

    if let Err(e) = manager.append_log(session, &summary) {
        error!("Failed to append status to log: {}", e);
    }

    match manager.storage_stats() {
        Ok(stats) => info!(
            "Storage usage: internal {}%, sd {}%",
            stats.internal_percent, stats.sd_percent
        ),
        Err(e) => warn!("Could not read storage usage: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_default_config_path() {
        assert_eq!(DEFAULT_CONFIG_PATH, "config/default.toml");
        assert!(Path::new(DEFAULT_CONFIG_PATH).extension().is_some());
    }

    #[test]
    fn test_boot_time_fits_record() {
        assert!(u64::from(boot_time()) <= BOOT_TIME_MASK);
    }

    #[test]
    fn test_housekeeping_tick_writes_log() {
        let root = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(root.path());
        let manager = FileManager::new(storage, HostProvider::new(1, 2));
        let mut session = Session::new();

        housekeeping_tick(&manager, &mut session);

        let log = session.log_file().unwrap().to_path_buf();
        let contents = std::fs::read_to_string(root.path().join(&log)).unwrap();
        assert!(contents.contains("status,boot_count=2"));
    }
}
