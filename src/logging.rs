//! Tracing subscriber setup.
//!
//! Logs go to a file so they never interleave with interactive output.

use color_eyre::{eyre::eyre, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{Config, LogConfig};

const DEFAULT_LEVEL: &str = "info";

/// Resolve the filter directive: `POKEDEX_LOG`, then config, then `info`.
fn filter_directive(config: &LogConfig, env: Option<String>) -> String {
  env
    .filter(|level| !level.trim().is_empty())
    .or_else(|| config.level.clone())
    .unwrap_or_else(|| DEFAULT_LEVEL.to_string())
}

/// Install the global subscriber writing to the configured log file.
///
/// The returned guard flushes buffered lines when dropped, so it must live
/// as long as the program.
pub fn init(config: &LogConfig) -> Result<WorkerGuard> {
  let path = match &config.file {
    Some(path) => path.clone(),
    None => Config::data_dir()?.join("pokedex.log"),
  };

  let dir = path
    .parent()
    .filter(|p| !p.as_os_str().is_empty())
    .map(|p| p.to_path_buf())
    .unwrap_or_else(|| std::path::PathBuf::from("."));
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let file_name = path
    .file_name()
    .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;

  let appender = tracing_appender::rolling::never(&dir, file_name);
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_new(filter_directive(config, std::env::var("POKEDEX_LOG").ok()))
    .map_err(|e| eyre!("Invalid log filter: {}", e))?;

  tracing_subscriber::registry()
    .with(filter)
    .with(fmt::layer().with_writer(writer).with_ansi(false))
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
