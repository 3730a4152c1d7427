//! Runtime configuration.
//!
//! Each setting is taken from, in order of priority:
//! 1. Command line flag
//! 2. Environment variable (`VLANSCOPE_DEVICES`, `VLANSCOPE_CREDENTIALS`, `VLANSCOPE_CONCURRENCY`)
//! 3. Config file (`~/.config/vlanscope/config.toml`)
//! 4. Default values

pub mod inventory;

pub use inventory::{
    InventoryError, load_credentials, load_device_list, parse_credentials, parse_device_list,
};

use crate::scanner::ScanOptions;
use crate::session::SshSettings;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Default device list, relative to the working directory
const DEFAULT_DEVICES_FILE: &str = "input.txt";

/// Default credentials file, relative to the working directory
const DEFAULT_CREDENTIALS_FILE: &str = "credentials.txt";

const ENV_DEVICES: &str = "VLANSCOPE_DEVICES";
const ENV_CREDENTIALS: &str = "VLANSCOPE_CREDENTIALS";
const ENV_CONCURRENCY: &str = "VLANSCOPE_CONCURRENCY";

/// Configuration file structure
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    inventory: InventoryConfig,
    ssh: SshSettings,
    scan: ScanConfig,
}

#[derive(Debug, Deserialize, Default)]
struct InventoryConfig {
    devices_file: Option<PathBuf>,
    credentials_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default)]
struct ScanConfig {
    concurrency: Option<usize>,
    vendor_lookup: Option<bool>,
}

/// Where a setting came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    /// Using default hardcoded values
    Default,
    /// Loaded from config file
    ConfigFile,
    /// Loaded from environment variable
    Environment,
    /// Passed on the command line
    CommandLine,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::ConfigFile => write!(f, "config file"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::CommandLine => write!(f, "command line"),
        }
    }
}

/// A setting value together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: ConfigSource,
}

/// Values given explicitly on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub devices_file: Option<PathBuf>,
    pub credentials_file: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub no_vendor: bool,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone)]
pub struct Settings {
    pub devices_file: Sourced<PathBuf>,
    pub credentials_file: Sourced<PathBuf>,
    pub concurrency: Sourced<usize>,
    pub vendor_lookup: bool,
    pub ssh: SshSettings,
}

impl Settings {
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            concurrency: self.concurrency.value,
            vendor_lookup: self.vendor_lookup,
        }
    }
}

/// Get the path to the configuration file
fn get_config_file_path() -> Option<PathBuf> {
    dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .map(|p| p.join("vlanscope").join("config.toml"))
}

/// Load configuration from the config file
fn load_config_file() -> Option<ConfigFile> {
    let path = get_config_file_path()?;

    if !path.exists() {
        return None;
    }

    match fs::read_to_string(&path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::debug!("Loaded config from {:?}", path);
                Some(config)
            }
            Err(e) => {
                tracing::warn!("Failed to parse config file {:?}: {}", path, e);
                None
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read config file {:?}: {}", path, e);
            None
        }
    }
}

/// Load settings from command line overrides, environment, config file and defaults.
pub fn load_settings(overrides: &Overrides) -> Settings {
    resolve_settings(
        load_config_file().unwrap_or_default(),
        |name| std::env::var(name).ok(),
        overrides,
    )
}

fn resolve_settings(
    file: ConfigFile,
    env: impl Fn(&str) -> Option<String>,
    overrides: &Overrides,
) -> Settings {
    let env_path = |name: &str| {
        env(name)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    };

    let devices_file = pick(
        overrides.devices_file.clone(),
        env_path(ENV_DEVICES),
        file.inventory.devices_file,
        PathBuf::from(DEFAULT_DEVICES_FILE),
    );
    let credentials_file = pick(
        overrides.credentials_file.clone(),
        env_path(ENV_CREDENTIALS),
        file.inventory.credentials_file,
        PathBuf::from(DEFAULT_CREDENTIALS_FILE),
    );

    let env_concurrency = env(ENV_CONCURRENCY).and_then(|v| match v.trim().parse::<usize>() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a number", ENV_CONCURRENCY, v);
            None
        }
    });
    let mut concurrency = pick(
        overrides.concurrency,
        env_concurrency,
        file.scan.concurrency,
        ScanOptions::default().concurrency,
    );
    if concurrency.value == 0 {
        tracing::warn!("Concurrency of 0 from {}; polling one device at a time", concurrency.source);
        concurrency.value = 1;
    }

    let vendor_lookup = !overrides.no_vendor
        && file
            .scan
            .vendor_lookup
            .unwrap_or(ScanOptions::default().vendor_lookup);

    Settings {
        devices_file,
        credentials_file,
        concurrency,
        vendor_lookup,
        ssh: nonzero_timeouts(file.ssh),
    }
}

/// A zero timeout is rejected by the socket layer, so fall back to the default.
fn nonzero_timeouts(mut ssh: SshSettings) -> SshSettings {
    let defaults = SshSettings::default();
    if ssh.connect_timeout_secs == 0 {
        tracing::warn!(
            "connect_timeout_secs = 0 in config file; using {}s",
            defaults.connect_timeout_secs
        );
        ssh.connect_timeout_secs = defaults.connect_timeout_secs;
    }
    if ssh.session_timeout_secs == 0 {
        tracing::warn!(
            "session_timeout_secs = 0 in config file; using {}s",
            defaults.session_timeout_secs
        );
        ssh.session_timeout_secs = defaults.session_timeout_secs;
    }
    ssh
}

fn pick<T>(cli: Option<T>, env: Option<T>, file: Option<T>, default: T) -> Sourced<T> {
    let (value, source) = match (cli, env, file) {
        (Some(v), _, _) => (v, ConfigSource::CommandLine),
        (None, Some(v), _) => (v, ConfigSource::Environment),
        (None, None, Some(v)) => (v, ConfigSource::ConfigFile),
        (None, None, None) => (default, ConfigSource::Default),
    };
    Sourced { value, source }
}

/// Get the path to the config file for documentation purposes
pub fn get_config_file_path_string() -> String {
    get_config_file_path()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "~/.config/vlanscope/config.toml".to_string())
}

/// Generate example config file content
pub fn generate_example_config() -> String {
    r#"# vlanscope configuration
# Place this file at: ~/.config/vlanscope/config.toml

[inventory]
# One switch address per line; blank lines are skipped
# devices_file = "input.txt"
# Username on the first line, password on the second
# credentials_file = "credentials.txt"

[ssh]
# port = 22
# connect_timeout_secs = 10
# session_timeout_secs = 60

[scan]
# Switches polled at once (1 = strictly one after another)
# concurrency = 1
# Look up the manufacturer of learned MAC addresses
# vendor_lookup = true
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = resolve_settings(ConfigFile::default(), env_of(&[]), &Overrides::default());
        assert_eq!(settings.devices_file.value, PathBuf::from("input.txt"));
        assert_eq!(settings.devices_file.source, ConfigSource::Default);
        assert_eq!(settings.credentials_file.value, PathBuf::from("credentials.txt"));
        assert_eq!(settings.scan_options(), ScanOptions::default());
        assert_eq!(settings.ssh, SshSettings::default());
    }

    #[test]
    fn test_config_file_values() {
        let file: ConfigFile = toml::from_str(
            r#"
[inventory]
devices_file = "/etc/vlanscope/switches.txt"

[ssh]
port = 2222

[scan]
concurrency = 8
vendor_lookup = false
"#,
        )
        .unwrap();

        let settings = resolve_settings(file, env_of(&[]), &Overrides::default());
        assert_eq!(settings.devices_file.source, ConfigSource::ConfigFile);
        assert_eq!(settings.credentials_file.source, ConfigSource::Default);
        assert_eq!(settings.ssh.port, 2222);
        assert_eq!(settings.ssh.connect_timeout_secs, 10);
        assert_eq!(settings.concurrency.value, 8);
        assert!(!settings.vendor_lookup);
    }

    #[test]
    fn test_priority_cli_over_env_over_file() {
        let file: ConfigFile = toml::from_str(
            "[inventory]\ndevices_file = \"file.txt\"\ncredentials_file = \"file-creds.txt\"\n[scan]\nconcurrency = 2\n",
        )
        .unwrap();
        let env = env_of(&[
            ("VLANSCOPE_DEVICES", "env.txt"),
            ("VLANSCOPE_CREDENTIALS", "env-creds.txt"),
            ("VLANSCOPE_CONCURRENCY", "4"),
        ]);
        let overrides = Overrides {
            devices_file: Some(PathBuf::from("cli.txt")),
            ..Overrides::default()
        };

        let settings = resolve_settings(file, env, &overrides);
        assert_eq!(
            settings.devices_file,
            Sourced { value: PathBuf::from("cli.txt"), source: ConfigSource::CommandLine }
        );
        assert_eq!(
            settings.credentials_file,
            Sourced { value: PathBuf::from("env-creds.txt"), source: ConfigSource::Environment }
        );
        assert_eq!(settings.concurrency.value, 4);
    }

    #[test]
    fn test_bad_concurrency_values() {
        let settings = resolve_settings(
            ConfigFile::default(),
            env_of(&[("VLANSCOPE_CONCURRENCY", "lots")]),
            &Overrides { concurrency: Some(0), no_vendor: true, ..Overrides::default() },
        );
        assert_eq!(settings.concurrency.value, 1);
        assert_eq!(settings.concurrency.source, ConfigSource::CommandLine);
        assert!(!settings.vendor_lookup);

        let settings = resolve_settings(
            ConfigFile::default(),
            env_of(&[("VLANSCOPE_CONCURRENCY", "lots")]),
            &Overrides::default(),
        );
        assert_eq!(settings.concurrency.source, ConfigSource::Default);
    }

    #[test]
    fn test_zero_timeouts_fall_back_to_defaults() {
        let file: ConfigFile = toml::from_str(
            "[ssh]\nport = 830\nconnect_timeout_secs = 0\nsession_timeout_secs = 0\n",
        )
        .unwrap();

        let settings = resolve_settings(file, env_of(&[]), &Overrides::default());
        assert_eq!(
            settings.ssh,
            SshSettings { port: 830, ..SshSettings::default() }
        );
    }

    #[test]
    fn test_example_config_parses() {
        let file: ConfigFile = toml::from_str(&generate_example_config()).unwrap();
        assert!(file.inventory.devices_file.is_none());
    }
}
