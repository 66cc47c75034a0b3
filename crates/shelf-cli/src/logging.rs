use anyhow::Result;
use std::io;
use std::io::IsTerminal;
use std::path::Path;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::{self, time::ChronoUtc};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use media_shelf_config::LoggingConfig;

/// Build the level filter. `-q` wins, then `-v` counts, then `RUST_LOG`, then the config file.
fn build_filter(verbose_level: u8, quiet: bool, configured_level: &str) -> EnvFilter {
    if quiet {
        return EnvFilter::new("error");
    }
    match verbose_level {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(configured_level)),
        // -v: debug level but suppress noisy hyper logs
        1 => EnvFilter::new("debug,hyper::proto::h1=warn,hyper::client::pool=warn"),
        _ => EnvFilter::new("trace"),
    }
}

pub fn init_logging(verbose_level: u8, quiet: bool, config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(verbose_level, quiet, &config.level);

    let json = std::env::var("RUST_LOG_JSON")
        .map(|v| v == "true")
        .unwrap_or_else(|_| config.json || !io::stderr().is_terminal());

    let registry = Registry::default().with(filter);

    if let Some(log_path) = &config.file {
        let (log_dir, log_prefix) = rolling_target(log_path)?;
        std::fs::create_dir_all(&log_dir)?;

        // Daily rotation: shelf.2026-01-17, shelf.2026-01-18, ...
        let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir, log_prefix);

        if json {
            let json_layer = fmt::layer()
                .json()
                .with_timer(ChronoUtc::rfc_3339())
                .with_writer(file_appender);
            registry.with(json_layer).init();
        } else {
            let fmt_layer = fmt::layer()
                .with_timer(ChronoUtc::rfc_3339())
                .with_ansi(false)
                .with_writer(file_appender);
            registry.with(fmt_layer).init();
        }
    } else if json {
        let json_layer = fmt::layer()
            .json()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);
        registry.with(json_layer).init();
    } else {
        let fmt_layer = fmt::layer()
            .with_timer(ChronoUtc::rfc_3339())
            .with_writer(io::stderr);
        registry.with(fmt_layer).init();
    }

    Ok(())
}

/// Split `logs/shelf.log` into the directory and the rotation prefix `shelf`.
fn rolling_target(log_path: &Path) -> Result<(std::path::PathBuf, String)> {
    let log_dir = log_path
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Log file path has no parent directory"))?;
    let log_filename = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log filename"))?;
    let log_prefix = log_filename
        .rsplit_once('.')
        .map(|(prefix, _)| prefix)
        .unwrap_or(log_filename);
    Ok((log_dir.to_path_buf(), log_prefix.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_rolling_target_strips_extension() {
        let (dir, prefix) = rolling_target(&PathBuf::from("/var/log/shelf/shelf.log")).unwrap();
        assert_eq!(dir, PathBuf::from("/var/log/shelf"));
        assert_eq!(prefix, "shelf");

        let (_, prefix) = rolling_target(&PathBuf::from("/tmp/plain")).unwrap();
        assert_eq!(prefix, "plain");
    }
}
