//! Split a multi-channel MIDI file into one MIDI file per channel.
//!
//! The MIDI file is turned into midicsv text, every row is tagged with its
//! channel (or marked global for meta events, headers, and track
//! boundaries), and each channel gets a file holding all global rows plus
//! its own rows in their original order. Each file is then converted back
//! to MIDI, so every output plays on its own.
//!
//! ```no_run
//! use midisplit::{ExternalTools, SplitOptions, Splitter};
//! use std::path::Path;
//!
//! let splitter = Splitter::new(ExternalTools::default(), SplitOptions::default());
//! let report = splitter.split_file(Path::new("song.mid"))?;
//! for out in &report.channels {
//!     println!("channel {} -> {}", out.channel, out.midi_path.display());
//! }
//! # Ok::<(), midisplit::SplitError>(())
//! ```

pub mod classify;
pub mod convert;
pub mod csv_text;
pub mod error;
pub mod partition;
pub mod splitter;

pub use classify::{
    classify, classify_row, is_channel_event, Channel, ChannelEvent, Classification,
    ClassifiedRow, Marker,
};
pub use convert::{Converter, ExternalTools, InputKind};
pub use csv_text::{parse_rows, read_rows, render_rows, Row};
pub use error::{Result, SplitError, Stage};
pub use partition::{channel_file_name, create_output_dir, write_partition};
pub use splitter::{ChannelOutput, RunPlan, SplitOptions, SplitReport, Splitter};
