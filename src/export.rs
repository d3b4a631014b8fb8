//! CSV export of selected Pokémon.

use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::selection::SelectedItem;

const HEADERS: [&str; 7] = [
  "Name",
  "Description",
  "Details URL",
  "Height (m)",
  "Weight (kg)",
  "Types",
  "ID",
];

const NO_DESCRIPTION: &str = "No description available";
const NOT_AVAILABLE: &str = "N/A";

/// Quote a value containing a comma, quote or newline, doubling inner quotes.
fn escape(value: &str) -> String {
  if value.contains([',', '"', '\n']) {
    format!("\"{}\"", value.replace('"', "\"\""))
  } else {
    value.to_string()
  }
}

fn row(item: &SelectedItem) -> String {
  let details = item.details.as_ref();
  let description = item.description.as_deref().unwrap_or(NO_DESCRIPTION);
  let height = details.map_or(NOT_AVAILABLE.to_string(), |d| d.height_meters().to_string());
  let weight = details.map_or(NOT_AVAILABLE.to_string(), |d| d.weight_kilograms().to_string());
  let types = details.map_or(NOT_AVAILABLE.to_string(), |d| d.types.join("; "));
  let id = details.map_or(NOT_AVAILABLE.to_string(), |d| d.id.to_string());

  [
    item.pokemon.name.as_str(),
    description,
    item.pokemon.url.as_str(),
    height.as_str(),
    weight.as_str(),
    types.as_str(),
    id.as_str(),
  ]
  .iter()
  .map(|value| escape(value))
  .collect::<Vec<_>>()
  .join(",")
}

/// Render selected items as CSV, header first, rows joined by `\n`.
pub fn to_csv(items: &[SelectedItem]) -> String {
  std::iter::once(HEADERS.join(","))
    .chain(items.iter().map(row))
    .collect::<Vec<_>>()
    .join("\n")
}

/// File name used when no explicit output path is given
pub fn default_file_name(count: usize) -> String {
  format!("{}_pokemon_items.csv", count)
}

/// Write `items` as CSV to `path`, or to the default file name in the
/// current directory. Nothing is written for an empty selection.
pub fn write_csv(items: &[SelectedItem], path: Option<&Path>) -> Result<Option<PathBuf>> {
  if items.is_empty() {
    return Ok(None);
  }

  let path = path
    .map(Path::to_path_buf)
    .unwrap_or_else(|| PathBuf::from(default_file_name(items.len())));

  std::fs::write(&path, to_csv(items))
    .map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?;

  info!(path = %path.display(), items = items.len(), "Exported selection");
  Ok(Some(path))
}
