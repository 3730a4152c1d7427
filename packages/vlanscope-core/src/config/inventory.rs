//! Device list and credential files.

use crate::session::Credentials;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no device addresses listed in {0}")]
    EmptyDeviceList(PathBuf),

    #[error("malformed credentials file {path}: {reason}")]
    MalformedCredentials { path: PathBuf, reason: &'static str },
}

fn read(path: &Path) -> Result<String, InventoryError> {
    fs::read_to_string(path).map_err(|source| InventoryError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Read device addresses, one per line.
pub fn load_device_list(path: &Path) -> Result<Vec<String>, InventoryError> {
    let devices = parse_device_list(&read(path)?);
    if devices.is_empty() {
        return Err(InventoryError::EmptyDeviceList(path.to_path_buf()));
    }
    tracing::debug!("Loaded {} device addresses from {:?}", devices.len(), path);
    Ok(devices)
}

/// Trimmed, non-blank lines in file order.
pub fn parse_device_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Read the username (first line) and password (second line).
pub fn load_credentials(path: &Path) -> Result<Credentials, InventoryError> {
    parse_credentials(&read(path)?).map_err(|reason| InventoryError::MalformedCredentials {
        path: path.to_path_buf(),
        reason,
    })
}

pub fn parse_credentials(content: &str) -> Result<Credentials, &'static str> {
    let mut lines = content.lines().map(str::trim);

    let username = match lines.next() {
        Some(username) if !username.is_empty() => username.to_string(),
        _ => return Err("first line must hold the username"),
    };
    let password = lines
        .next()
        .ok_or("second line must hold the password")?
        .to_string();

    Ok(Credentials { username, password })
}
