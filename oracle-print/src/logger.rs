//! Logging Infrastructure
//!
//! Console output goes to stderr, pretty for development or JSON for
//! production. With a log directory, every event is also appended to a
//! daily rotating `oracle-print.YYYY-MM-DD.log` file; files older than
//! [`RETENTION_DAYS`] are deleted at startup.

use std::fs;
use std::path::Path;
use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LOG_PREFIX: &str = "oracle-print";
const LOG_SUFFIX: &str = "log";

/// Days a rotated log file is kept
pub const RETENTION_DAYS: i64 = 14;

/// Delete rotated log files older than `retention_days`
///
/// Returns the number of files removed. Files that do not follow the
/// rotation naming scheme are left alone.
pub fn cleanup_old_logs(log_dir: &Path, retention_days: i64) -> anyhow::Result<usize> {
    let cutoff = Local::now().date_naive() - chrono::Duration::days(retention_days);
    let mut removed = 0;

    for entry in fs::read_dir(log_dir)? {
        let path = entry?.path();

        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        // oracle-print.YYYY-MM-DD.log
        if let Some(date_part) = name
            .strip_prefix(LOG_PREFIX)
            .and_then(|rest| rest.strip_prefix('.'))
            .and_then(|rest| rest.strip_suffix(LOG_SUFFIX))
            .and_then(|rest| rest.strip_suffix('.'))
            && let Ok(date) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
            && date < cutoff
        {
            fs::remove_file(&path)?;
            removed += 1;
        }
    }

    Ok(removed)
}

/// Initialize the logging system
///
/// # Arguments
/// * `level` - Log level used when `RUST_LOG` is unset (e.g., "info", "debug")
/// * `json_format` - Whether to use JSON format on the console
/// * `log_dir` - Optional directory for daily rotating log files
pub fn init_logger(level: &str, json_format: bool, log_dir: Option<&Path>) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let json_layer = json_format.then(|| {
        fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
    });

    let pretty_layer = (!json_format).then(|| {
        fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
    });

    let file_layer = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            cleanup_old_logs(dir, RETENTION_DAYS)?;

            let appender = RollingFileAppender::builder()
                .rotation(Rotation::DAILY)
                .filename_prefix(LOG_PREFIX)
                .filename_suffix(LOG_SUFFIX)
                .build(dir)?;

            Some(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true)
                    .with_ansi(false)
                    .with_writer(Mutex::new(appender)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(pretty_layer)
        .with(file_layer)
        .try_init()?;

    Ok(())
}
