//! Config sections: converter tools, output layout, telemetry.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// External converter executables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Binary-to-text converter, resolved through `PATH` when not absolute.
    /// Default: midicsv
    #[serde(default = "ToolsConfig::default_midicsv")]
    pub midicsv: PathBuf,

    /// Text-to-binary converter.
    /// Default: csvmidi
    #[serde(default = "ToolsConfig::default_csvmidi")]
    pub csvmidi: PathBuf,
}

impl ToolsConfig {
    fn default_midicsv() -> PathBuf {
        PathBuf::from("midicsv")
    }

    fn default_csvmidi() -> PathBuf {
        PathBuf::from("csvmidi")
    }
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            midicsv: Self::default_midicsv(),
            csvmidi: Self::default_csvmidi(),
        }
    }
}

/// Where split files go and which intermediates survive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Name of the directory created next to the input file.
    /// Default: split_channels
    #[serde(default = "OutputConfig::default_dir_name")]
    pub dir_name: String,

    /// Keep intermediate CSV files. Unset means: keep them for CSV input,
    /// discard them for MIDI input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keep_csv: Option<bool>,

    /// Write and convert channels concurrently.
    /// Default: false
    #[serde(default)]
    pub parallel: bool,
}

impl OutputConfig {
    fn default_dir_name() -> String {
        "split_channels".to_string()
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir_name: Self::default_dir_name(),
            keep_csv: None,
            parallel: false,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    /// Default: info
    #[serde(default = "TelemetryConfig::default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    fn default_log_level() -> String {
        "info".to_string()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: Self::default_log_level(),
        }
    }
}
