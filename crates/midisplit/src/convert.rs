//! MIDI <-> CSV conversion through the midicsv / csvmidi tools.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Serialize;
use splitconf::ToolsConfig;
use tracing::debug;

use crate::error::{Result, SplitError};
use crate::partition::{CSV_EXTENSION, MIDI_EXTENSION};

const MIDI_SUFFIXES: [&str; 2] = [".mid", ".midi"];

/// What form an input file is in, judged by its name alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Midi,
    Csv,
}

impl InputKind {
    /// `.mid` / `.midi` in any case is MIDI; anything else is treated as CSV.
    pub fn detect(path: &Path) -> Self {
        let name = path.to_string_lossy().to_lowercase();
        if MIDI_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
            Self::Midi
        } else {
            Self::Csv
        }
    }
}

/// Converts between the binary container and the textual row format.
///
/// Both methods write a sibling file with the extension swapped and
/// return its path.
pub trait Converter: Send + Sync {
    fn midi_to_csv(&self, midi: &Path) -> Result<PathBuf>;
    fn csv_to_midi(&self, csv: &Path) -> Result<PathBuf>;
}

/// Runs the midicsv package's executables as subprocesses.
#[derive(Debug, Clone)]
pub struct ExternalTools {
    midicsv: PathBuf,
    csvmidi: PathBuf,
}

impl ExternalTools {
    pub fn new(midicsv: impl Into<PathBuf>, csvmidi: impl Into<PathBuf>) -> Self {
        Self {
            midicsv: midicsv.into(),
            csvmidi: csvmidi.into(),
        }
    }

    pub fn from_config(tools: &ToolsConfig) -> Self {
        Self::new(&tools.midicsv, &tools.csvmidi)
    }

    fn run(&self, tool: &Path, input: &Path, output: &Path) -> Result<()> {
        let tool_name = tool.display().to_string();
        debug!("Running {} {} {}", tool_name, input.display(), output.display());

        let result = Command::new(tool).arg(input).arg(output).output();
        let out = match result {
            Ok(out) => out,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SplitError::ToolMissing { tool: tool_name });
            }
            Err(e) => return Err(SplitError::io(tool, e)),
        };

        if !out.status.success() {
            return Err(SplitError::ConversionFailed {
                tool: tool_name,
                input: input.to_path_buf(),
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

impl Default for ExternalTools {
    fn default() -> Self {
        Self::from_config(&ToolsConfig::default())
    }
}

impl Converter for ExternalTools {
    fn midi_to_csv(&self, midi: &Path) -> Result<PathBuf> {
        let csv = midi.with_extension(CSV_EXTENSION);
        self.run(&self.midicsv, midi, &csv)?;
        Ok(csv)
    }

    fn csv_to_midi(&self, csv: &Path) -> Result<PathBuf> {
        let midi = csv.with_extension(MIDI_EXTENSION);
        self.run(&self.csvmidi, csv, &midi)?;
        Ok(midi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_midi_suffixes_in_any_case() {
        for name in ["song.mid", "song.MID", "song.midi", "song.MIDI", "dir/Song.Mid"] {
            assert_eq!(InputKind::detect(Path::new(name)), InputKind::Midi, "{name}");
        }
    }

    #[test]
    fn everything_else_is_csv() {
        for name in ["song.csv", "song.txt", "song", "song.mid.csv", "midi", "song.midx"] {
            assert_eq!(InputKind::detect(Path::new(name)), InputKind::Csv, "{name}");
        }
    }

    #[test]
    fn missing_tool_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let csv = tmp.path().join("channel_1.csv");
        std::fs::write(&csv, "0,0,End_of_file\n").unwrap();

        let tools = ExternalTools::new(
            "/nonexistent/bin/midicsv-missing",
            "/nonexistent/bin/csvmidi-missing",
        );
        let err = tools.csv_to_midi(&csv).unwrap_err();
        match err {
            SplitError::ToolMissing { tool } => assert!(tool.ends_with("csvmidi-missing")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn failing_tool_surfaces_status() {
        let tmp = tempfile::tempdir().unwrap();
        let midi = tmp.path().join("song.mid");
        std::fs::write(&midi, b"not really midi").unwrap();

        let tools = ExternalTools::new("false", "false");
        let err = tools.midi_to_csv(&midi).unwrap_err();
        match err {
            SplitError::ConversionFailed { tool, input, status, .. } => {
                assert_eq!(tool, "false");
                assert_eq!(input, midi);
                assert!(!status.success());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn output_path_swaps_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let csv = tmp.path().join("channel_4.csv");
        std::fs::write(&csv, "0,0,End_of_file\n").unwrap();

        // `cp <in> <out>` has the same calling convention as csvmidi.
        let tools = ExternalTools::new("cp", "cp");
        let midi = tools.csv_to_midi(&csv).unwrap();
        assert_eq!(midi, tmp.path().join("channel_4.mid"));
        assert!(midi.exists());
    }
}
