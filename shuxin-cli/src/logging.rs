use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub enum LogTarget {
    /// Daily rolling file; used while the full-screen wizard owns the terminal.
    File(PathBuf),
    Stderr,
}

/// Install the global subscriber. Keep the returned guard alive until exit so
/// buffered file lines get flushed.
pub fn init_logging(level: &str, target: LogTarget) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match target {
        LogTarget::File(dir) => {
            std::fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(&dir, "shuxin.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(writer)
                .with_ansi(false)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("install log subscriber: {e}"))?;
            Ok(Some(guard))
        }
        LogTarget::Stderr => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow::anyhow!("install log subscriber: {e}"))?;
            Ok(None)
        }
    }
}
