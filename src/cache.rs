use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::tracks::TrackTable;

/// Load a previously saved track table. Returns `Ok(None)` when the path does
/// not exist — callers treat that as "must recompute". A file that exists but
/// cannot be read or parsed is an error: masking it could hide stale-data
/// bugs behind a silent recompute.
pub fn load(path: &Path) -> Result<Option<TrackTable>> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read track cache {:?}", path))?;
    let table: TrackTable = serde_json::from_str(&data)
        .with_context(|| format!("corrupt track cache {:?}", path))?;
    info!("loaded track table from cache {:?}", path);
    Ok(Some(table))
}

/// Persist the full track table snapshot. No staleness metadata is written;
/// path-to-input equivalence is the caller's contract.
pub fn save(path: &Path, table: &TrackTable) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create cache directory {:?}", parent))?;
        }
    }
    let json = serde_json::to_string(table).context("failed to serialize track table")?;
    fs::write(path, json).with_context(|| format!("failed to write track cache {:?}", path))?;
    info!("saved track table to cache {:?}", path);
    Ok(())
}
