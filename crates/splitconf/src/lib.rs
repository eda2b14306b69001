//! Configuration loading for midisplit.
//!
//! Kept small so both the splitting library and the `split-midi` binary can
//! depend on it without dragging in the rest of the stack.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins):
//! 1. `/etc/midisplit/config.toml` (system)
//! 2. `~/.config/midisplit/config.toml` (user)
//! 3. `./midisplit.toml` (local override), or the `--config` path
//! 4. Environment variables (`MIDISPLIT_*`)
//!
//! # Example Config
//!
//! ```toml
//! [tools]
//! midicsv = "/usr/local/bin/midicsv"
//! csvmidi = "/usr/local/bin/csvmidi"
//!
//! [output]
//! dir_name = "split_channels"
//! keep_csv = true
//! parallel = false
//!
//! [telemetry]
//! log_level = "debug"
//! ```

pub mod loader;
pub mod sections;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use sections::{OutputConfig, TelemetryConfig, ToolsConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Complete splitter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SplitConfig {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl SplitConfig {
    /// Load configuration from the standard locations plus environment,
    /// letting `config_path` replace `./midisplit.toml`, and report where
    /// values came from.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = SplitConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            let layer = loader::load_from_file(&path)?;
            layer.apply(&mut config);
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources, std::env::vars());

        Ok((config, sources))
    }

    /// Render the config as TOML.
    pub fn to_toml(&self) -> String {
        let mut output = String::from("# midisplit configuration\n\n");

        output.push_str("[tools]\n");
        output.push_str(&format!("midicsv = {}\n", toml_path(&self.tools.midicsv)));
        output.push_str(&format!("csvmidi = {}\n", toml_path(&self.tools.csvmidi)));

        output.push_str("\n[output]\n");
        output.push_str(&format!(
            "dir_name = {}\n",
            toml::Value::from(self.output.dir_name.as_str())
        ));
        if let Some(keep) = self.output.keep_csv {
            output.push_str(&format!("keep_csv = {keep}\n"));
        }
        output.push_str(&format!("parallel = {}\n", self.output.parallel));

        output.push_str("\n[telemetry]\n");
        output.push_str(&format!(
            "log_level = {}\n",
            toml::Value::from(self.telemetry.log_level.as_str())
        ));

        output
    }
}

/// A quoted, escaped TOML string for `path`.
fn toml_path(path: &Path) -> toml::Value {
    toml::Value::from(path.to_string_lossy().as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SplitConfig::default();
        assert_eq!(config.output.dir_name, "split_channels");
        assert_eq!(config.output.keep_csv, None);
        assert!(!config.output.parallel);
        assert_eq!(config.tools.midicsv, PathBuf::from("midicsv"));
        assert_eq!(config.tools.csvmidi, PathBuf::from("csvmidi"));
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn test_to_toml() {
        let config = SplitConfig::default();
        let toml = config.to_toml();
        assert!(toml.contains("[tools]"));
        assert!(toml.contains("[output]"));
        assert!(toml.contains("split_channels"));
        assert!(!toml.contains("keep_csv"));
    }

    #[test]
    fn test_to_toml_escapes_strings() {
        let mut config = SplitConfig::default();
        config.tools.csvmidi = PathBuf::from("/opt/odd \"name\"\\csvmidi");
        config.output.dir_name = "stems \"v2\"".to_string();

        let parsed: SplitConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_to_toml_parses_back() {
        let mut config = SplitConfig::default();
        config.output.keep_csv = Some(true);
        config.output.parallel = true;

        let parsed: SplitConfig = toml::from_str(&config.to_toml()).unwrap();
        assert_eq!(parsed, config);
    }
}
