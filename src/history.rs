//! Last search term, kept across sessions.

use color_eyre::Result;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::{debug, error};

use crate::config::Config;

const FILE_NAME: &str = "last_search";

/// File holding the most recent search term.
#[derive(Debug, Clone)]
pub struct LastSearch {
  path: PathBuf,
}

impl LastSearch {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  /// Store under the data directory
  pub fn in_data_dir() -> Result<Self> {
    Ok(Self::new(Config::data_dir()?.join(FILE_NAME)))
  }

  /// The saved term, if one was saved and it is not blank.
  ///
  /// A missing file is a fresh start; any other read failure is logged and
  /// treated the same way.
  pub fn load(&self) -> Option<String> {
    match std::fs::read_to_string(&self.path) {
      Ok(contents) => {
        let term = contents.trim();
        (!term.is_empty()).then(|| term.to_string())
      }
      Err(e) if e.kind() == ErrorKind::NotFound => None,
      Err(e) => {
        error!(path = %self.path.display(), error = %e, "Error loading last search");
        None
      }
    }
  }

  /// Save `term`, replacing the previous one. Failures are logged, never
  /// returned, so a read-only data directory does not break searching.
  pub fn save(&self, term: &str) {
    let written = self
      .path
      .parent()
      .filter(|dir| !dir.as_os_str().is_empty())
      .map_or(Ok(()), std::fs::create_dir_all)
      .and_then(|_| std::fs::write(&self.path, term.trim()));

    match written {
      Ok(()) => debug!(path = %self.path.display(), term = term.trim(), "Saved last search"),
      Err(e) => error!(path = %self.path.display(), error = %e, "Error saving last search"),
    }
  }
}
