//! Tracing subscriber setup.

use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Args, Debug, Clone, Default)]
pub struct LogArgs {
    /// Debug-level logging (ignored when RUST_LOG is set).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to this file (no ANSI colors).
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Write logs to `<DIR>/seedgraph_<timestamp>.log`.
    #[arg(long, global = true, value_name = "DIR", conflicts_with = "log_file")]
    pub log_dir: Option<PathBuf>,
}

/// `seedgraph_YYYYmmdd_HHMMSS.log` under `dir`.
pub fn timestamped_log_path(dir: &Path, now: chrono::NaiveDateTime) -> PathBuf {
    dir.join(format!("seedgraph_{}.log", now.format("%Y%m%d_%H%M%S")))
}

pub fn build_filter(verbose: bool, rust_log: Option<&str>) -> Result<EnvFilter> {
    let base = match rust_log.map(str::trim).filter(|s| !s.is_empty()) {
        Some(spec) => EnvFilter::try_new(spec).map_err(|e| anyhow!("invalid RUST_LOG: {e}"))?,
        None => EnvFilter::new(if verbose { "debug" } else { "info" }),
    };
    Ok(base
        .add_directive("reqwest=warn".parse()?)
        .add_directive("hyper=warn".parse()?))
}

/// Install the global subscriber. Returns the log file path, if any.
pub fn init(args: &LogArgs) -> Result<Option<PathBuf>> {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = build_filter(args.verbose, rust_log.as_deref())?;

    let log_path = match (&args.log_file, &args.log_dir) {
        (Some(path), _) => Some(path.clone()),
        (None, Some(dir)) => Some(timestamped_log_path(dir, chrono::Local::now().naive_local())),
        (None, None) => None,
    };

    let file_layer = match &log_path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to create log file {}", path.display()))?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(true)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to install logger: {e}"))?;
    Ok(log_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_name_uses_timestamp() {
        let now = chrono::NaiveDate::from_ymd_opt(2024, 3, 9)
            .and_then(|d| d.and_hms_opt(14, 5, 7))
            .unwrap();
        assert_eq!(
            timestamped_log_path(Path::new("logs"), now),
            PathBuf::from("logs/seedgraph_20240309_140507.log")
        );
    }

    #[test]
    fn filter_levels() {
        assert!(build_filter(false, None).unwrap().to_string().contains("info"));
        assert!(build_filter(true, None).unwrap().to_string().contains("debug"));
        let custom = build_filter(true, Some("seedgraph_dataset=trace")).unwrap();
        assert!(custom.to_string().contains("seedgraph_dataset=trace"));
        assert!(custom.to_string().contains("reqwest=warn"));
    }
}
