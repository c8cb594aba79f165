//! JSON config snapshots on disk.

use std::fs;
use std::path::Path;

use courtside_core::SystemConfig;
use serde::de::DeserializeOwned;
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub fn load_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, IoError> {
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Write `value` as pretty JSON.
pub fn write_json<T: Serialize>(value: &T, path: impl AsRef<Path>) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

/// Load a [`SystemConfig`] snapshot. Value ranges are checked when the
/// snapshot is applied, not here.
pub fn load_config(path: impl AsRef<Path>) -> Result<SystemConfig, IoError> {
    let path = path.as_ref();
    let config: SystemConfig = load_json(path)?;
    log::debug!("loaded config from {}", path.display());
    Ok(config)
}
