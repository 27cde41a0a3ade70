//! File-based logging for the bridge host. Messages go to
//! ~/.bridge/logs/{run_id}/log and are mirrored to stderr, since stdout
//! carries the transport.

use anyhow::{Context, Result};
use chrono::Local;
use dirs::home_dir;
use log::{LevelFilter, Log, Metadata, Record};
use std::fs::{create_dir_all, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

pub struct BridgeLogger {
    level: LevelFilter,
    file: Mutex<File>,
    run_id: String,
    log_path: PathBuf,
}

impl BridgeLogger {
    /// Creates the log file for this run.
    ///
    /// The run id is `{timestamp}_{short uuid}`, so runs sort by start time.
    pub fn new(level: LevelFilter) -> Result<Self> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let uuid = Uuid::new_v4().simple().to_string();
        let run_id = format!("{timestamp}_{}", &uuid[..8]);

        let log_dir = Self::log_dir(&run_id)?;
        create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

        let log_path = log_dir.join("log");
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .with_context(|| format!("Failed to open log file: {}", log_path.display()))?;

        Ok(Self {
            level,
            file: Mutex::new(file),
            run_id,
            log_path,
        })
    }

    pub fn log_dir(run_id: &str) -> Result<PathBuf> {
        let home = home_dir().context("Could not find home directory")?;
        Ok(home.join(".bridge").join("logs").join(run_id))
    }

    /// Installs the logger as the global `log` backend.
    pub fn init(level: LevelFilter) -> Result<()> {
        let logger = Self::new(level)?;
        let run_id = logger.run_id.clone();
        let log_path = logger.log_path.clone();

        log::set_boxed_logger(Box::new(logger))
            .map(|()| log::set_max_level(level))
            .map_err(|e| anyhow::anyhow!("Failed to set logger: {e}"))?;

        log::info!("Bridge logger initialized. Run ID: {run_id}");
        log::info!("Log file: {}", log_path.display());
        Ok(())
    }
}

fn format_record(record: &Record) -> String {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    format!(
        "{timestamp} {} [{}] {}",
        record.level(),
        record.target(),
        record.args()
    )
}

impl Log for BridgeLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = format_record(record);

        if let Ok(mut file) = self.file.lock() {
            // A failed log write must never take the bridge down
            let _ = writeln!(file, "{message}");
            let _ = file.flush();
        }
        eprintln!("{message}");
    }

    fn flush(&self) {
        if let Ok(mut file) = self.file.lock() {
            let _ = file.flush();
        }
    }
}
