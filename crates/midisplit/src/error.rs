use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;

use crate::classify::Channel;

/// Errors from splitting a file by channel.
#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("file {} does not exist", path.display())]
    InputNotFound { path: PathBuf },

    #[error("{tool} command not found. Please install midicsv (https://www.fourmilab.ch/webtools/midicsv/)")]
    ToolMissing { tool: String },

    #[error("{tool} failed on {} ({status}): {stderr}", input.display())]
    ConversionFailed {
        tool: String,
        input: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("line {line}: channel field {value:?} is not a valid channel number")]
    MalformedChannelField { line: usize, value: String },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("worker for channel {channel} panicked")]
    WorkerPanicked { channel: Channel },

    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("error processing file {}: {stage} failed", input.display())]
    Processing {
        input: PathBuf,
        stage: Stage,
        #[source]
        source: Box<SplitError>,
    },
}

impl SplitError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Wrap with the input file and the step that failed.
    pub(crate) fn during(self, input: impl Into<PathBuf>, stage: Stage) -> Self {
        Self::Processing {
            input: input.into(),
            stage,
            source: Box::new(self),
        }
    }

    /// The innermost error, with all processing context peeled away.
    pub fn root(&self) -> &SplitError {
        match self {
            Self::Processing { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Step of the split pipeline, used for error context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ConvertInput,
    ReadRows,
    ClassifyRows,
    CreateOutputDir,
    WriteChannel(Channel),
    ConvertChannel(Channel),
    /// Somewhere in a channel's write-convert-cleanup sequence.
    ProcessChannel(Channel),
    Cleanup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConvertInput => f.write_str("converting input to CSV"),
            Self::ReadRows => f.write_str("reading rows"),
            Self::ClassifyRows => f.write_str("classifying rows"),
            Self::CreateOutputDir => f.write_str("creating output directory"),
            Self::WriteChannel(ch) => write!(f, "writing channel {ch}"),
            Self::ConvertChannel(ch) => write!(f, "converting channel {ch} to MIDI"),
            Self::ProcessChannel(ch) => write!(f, "processing channel {ch}"),
            Self::Cleanup => f.write_str("removing intermediate CSV"),
        }
    }
}

pub type Result<T> = std::result::Result<T, SplitError>;
