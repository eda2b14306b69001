//! Config file discovery, loading, and environment variable overlay.

use crate::{ConfigError, SplitConfig};
use std::path::{Path, PathBuf};

/// Information about where config values came from.
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Config files that were loaded (in order)
    pub files: Vec<PathBuf>,
    /// Environment variables that overrode config values
    pub env_overrides: Vec<String>,
}

impl ConfigSources {
    /// TOML comment lines naming each source, or a note that only defaults
    /// applied.
    pub fn to_comment(&self) -> String {
        if self.files.is_empty() && self.env_overrides.is_empty() {
            return "# loaded from: built-in defaults\n".to_string();
        }
        let mut out = String::new();
        for file in &self.files {
            out.push_str(&format!("# loaded from: {}\n", file.display()));
        }
        for var in &self.env_overrides {
            out.push_str(&format!("# overridden by: ${var}\n"));
        }
        out
    }
}

/// Values set by a single config file. Unset keys leave earlier layers alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLayer {
    pub midicsv: Option<PathBuf>,
    pub csvmidi: Option<PathBuf>,
    pub dir_name: Option<String>,
    pub keep_csv: Option<bool>,
    pub parallel: Option<bool>,
    pub log_level: Option<String>,
}

impl ConfigLayer {
    /// Overlay this layer onto `config`.
    pub fn apply(self, config: &mut SplitConfig) {
        if let Some(v) = self.midicsv {
            config.tools.midicsv = v;
        }
        if let Some(v) = self.csvmidi {
            config.tools.csvmidi = v;
        }
        if let Some(v) = self.dir_name {
            config.output.dir_name = v;
        }
        if let Some(v) = self.keep_csv {
            config.output.keep_csv = Some(v);
        }
        if let Some(v) = self.parallel {
            config.output.parallel = v;
        }
        if let Some(v) = self.log_level {
            config.telemetry.log_level = v;
        }
    }
}

const SYSTEM_CONFIG: &str = "/etc/midisplit/config.toml";
const USER_CONFIG: &str = "midisplit/config.toml";
const LOCAL_CONFIG: &str = "midisplit.toml";

/// Existing config files, lowest precedence first. `cli_path` stands in
/// for `./midisplit.toml` when it exists.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let user = directories::BaseDirs::new().map(|dirs| dirs.config_dir().join(USER_CONFIG));
    let last = match cli_path {
        Some(path) if path.exists() => path.to_path_buf(),
        _ => PathBuf::from(LOCAL_CONFIG),
    };

    [Some(PathBuf::from(SYSTEM_CONFIG)), user, Some(last)]
        .into_iter()
        .flatten()
        .filter(|path| path.exists())
        .collect()
}

/// Load a config layer from a TOML file.
pub fn load_from_file(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    parse_toml(&contents, path)
}

/// Parse a config layer from a TOML string.
fn parse_toml(contents: &str, path: &Path) -> Result<ConfigLayer, ConfigError> {
    let table: toml::Table = contents.parse().map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut layer = ConfigLayer::default();

    if let Some(tools) = table.get("tools").and_then(|v| v.as_table()) {
        if let Some(v) = tools.get("midicsv").and_then(|v| v.as_str()) {
            layer.midicsv = Some(expand_path(v));
        }
        if let Some(v) = tools.get("csvmidi").and_then(|v| v.as_str()) {
            layer.csvmidi = Some(expand_path(v));
        }
    }

    if let Some(output) = table.get("output").and_then(|v| v.as_table()) {
        if let Some(v) = output.get("dir_name").and_then(|v| v.as_str()) {
            layer.dir_name = Some(v.to_string());
        }
        if let Some(v) = output.get("keep_csv") {
            layer.keep_csv = Some(v.as_bool().ok_or_else(|| ConfigError::Parse {
                path: path.to_path_buf(),
                message: "output.keep_csv must be a boolean".to_string(),
            })?);
        }
        if let Some(v) = output.get("parallel") {
            layer.parallel = Some(v.as_bool().ok_or_else(|| ConfigError::Parse {
                path: path.to_path_buf(),
                message: "output.parallel must be a boolean".to_string(),
            })?);
        }
    }

    if let Some(telemetry) = table.get("telemetry").and_then(|v| v.as_table()) {
        if let Some(v) = telemetry.get("log_level").and_then(|v| v.as_str()) {
            layer.log_level = Some(v.to_string());
        }
    }

    if layer.dir_name.as_deref().is_some_and(|d| d.trim().is_empty()) {
        return Err(ConfigError::Parse {
            path: path.to_path_buf(),
            message: "output.dir_name must not be empty".to_string(),
        });
    }

    Ok(layer)
}

/// Apply environment variable overrides to config.
///
/// `vars` is normally `std::env::vars()`; tests pass their own pairs.
pub fn apply_env_overrides<I>(config: &mut SplitConfig, sources: &mut ConfigSources, vars: I)
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, value) in vars {
        let applied = match key.as_str() {
            "MIDISPLIT_MIDICSV" => {
                config.tools.midicsv = expand_path(&value);
                true
            }
            "MIDISPLIT_CSVMIDI" => {
                config.tools.csvmidi = expand_path(&value);
                true
            }
            "MIDISPLIT_OUTPUT_DIR" if !value.trim().is_empty() => {
                config.output.dir_name = value;
                true
            }
            "MIDISPLIT_KEEP_CSV" => match parse_bool(&value) {
                Some(keep) => {
                    config.output.keep_csv = Some(keep);
                    true
                }
                None => false,
            },
            "MIDISPLIT_PARALLEL" => match parse_bool(&value) {
                Some(parallel) => {
                    config.output.parallel = parallel;
                    true
                }
                None => false,
            },
            "MIDISPLIT_LOG_LEVEL" => {
                config.telemetry.log_level = value;
                true
            }
            _ => false,
        };

        if applied {
            sources.env_overrides.push(key);
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Resolve a leading `~/` against the home directory and a leading
/// `$VAR` (alone or followed by `/...`) against the environment. Anything
/// unresolvable, including bare tool names, passes through so it can still
/// be looked up on `PATH`.
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(dirs) = directories::BaseDirs::new() {
            return dirs.home_dir().join(rest);
        }
    } else if let Some(var_path) = path.strip_prefix('$') {
        let (name, rest) = var_path.split_once('/').unwrap_or((var_path, ""));
        if let Some(value) = std::env::var_os(name) {
            let base = PathBuf::from(value);
            return if rest.is_empty() { base } else { base.join(rest) };
        }
    }
    PathBuf::from(path)
}
