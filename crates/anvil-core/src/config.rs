//! Configuration resolution for Anvil.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (`~/.config/anvil/settings.json`)
//! 3. Explicit config file (`--config`)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)
//!
//! A file replaces whole sections: a file that only sets `commands.escalation`
//! still resets every other `commands` field to its default.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Complete Anvil configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub commands: CommandConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Settings files merged into this config, in load order.
    #[serde(skip)]
    pub sources: Vec<PathBuf>,
}

/// Argv templates for the privileged AppArmor utilities.
///
/// Every template is prefixed with `escalation` when the command runs, unless
/// the process already has an effective uid of 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    /// Privilege-escalation prefix. Empty runs the tools directly.
    pub escalation: Vec<String>,
    /// Profile and process status listing, expected to print JSON.
    pub status: Vec<String>,
    /// Listing of processes with network access and no profile.
    pub unconfined: Vec<String>,
    /// Kernel log dump containing the AppArmor audit lines.
    pub logs: Vec<String>,
    /// Profile load/replace; the profile file path is appended.
    pub load_profile: Vec<String>,
    /// Profile disable; the profile name is appended.
    pub disable_profile: Vec<String>,
    /// Profile lookup; the profile name is appended, matches print one per line.
    pub locate_profile: Vec<String>,
    /// Listing of available abstractions, one name per line.
    pub abstractions: Vec<String>,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            escalation: vec!["pkexec".to_string()],
            status: vec!["aa-status".to_string(), "--json".to_string()],
            unconfined: vec!["aa-unconfined".to_string()],
            logs: vec!["dmesg".to_string()],
            load_profile: vec!["apparmor_parser".to_string(), "-r".to_string()],
            disable_profile: vec!["aa-disable".to_string()],
            locate_profile: [
                "find",
                "/etc/apparmor.d",
                "-maxdepth",
                "1",
                "-name",
            ]
            .map(String::from)
            .to_vec(),
            abstractions: vec!["ls".to_string(), "/etc/apparmor.d/abstractions".to_string()],
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON log lines.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Load configuration with hierarchical resolution.
///
/// The global file is optional; an explicit `config_file` must exist.
/// Loaded paths are recorded in [`Config::sources`] since this usually runs
/// before a tracing subscriber is installed.
pub fn load_config(config_file: Option<&Path>) -> Result<Config> {
    let mut config = Config::default();

    if let Some(global_path) = global_config_path()
        && global_path.exists()
    {
        let global = load_config_file(&global_path)?;
        merge_config(&mut config, global);
        config.sources.push(global_path);
    }

    if let Some(path) = config_file {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        let file = load_config_file(path)?;
        merge_config(&mut config, file);
        config.sources.push(path.to_path_buf());
    }

    apply_env_overrides(&mut config);

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("anvil").join("settings.json"))
}

/// Read and parse a single settings file.
pub fn load_config_file(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn merge_config(base: &mut Config, overlay: Config) {
    base.commands = overlay.commands;
    base.logging = overlay.logging;
}

fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

fn apply_overrides_from(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("ANVIL_ESCALATION") {
        config.commands.escalation = val.split_whitespace().map(String::from).collect();
    }
    if let Some(val) = lookup("ANVIL_LOG_LEVEL") {
        config.logging.level = val;
    }
    if let Some(val) = lookup("ANVIL_LOG_JSON") {
        config.logging.json = matches!(val.as_str(), "1" | "true" | "yes");
    }
}
