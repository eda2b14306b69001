//! Whole-file pipeline: detect, convert, classify, write each channel.

use std::path::{Path, PathBuf};

use serde::Serialize;
use splitconf::SplitConfig;
use tracing::{debug, error, info};

use crate::classify::{classify, Channel, Classification};
use crate::convert::{Converter, InputKind};
use crate::csv_text::read_rows;
use crate::error::{Result, SplitError, Stage};
use crate::partition::{create_output_dir, write_partition};

/// Caller intent, before the input file has been looked at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitOptions {
    /// `None` defers to the input kind: CSV input keeps, MIDI input discards.
    pub keep_csv: Option<bool>,
    pub output_dir_name: String,
    pub parallel: bool,
}

impl SplitOptions {
    pub fn from_config(config: &SplitConfig) -> Self {
        Self {
            keep_csv: config.output.keep_csv,
            output_dir_name: config.output.dir_name.clone(),
            parallel: config.output.parallel,
        }
    }
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self::from_config(&SplitConfig::default())
    }
}

/// Settings fixed for one input file. Never changes once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunPlan {
    pub kind: InputKind,
    pub keep_csv: bool,
}

impl RunPlan {
    pub fn resolve(input: &Path, keep_csv: Option<bool>) -> Self {
        let kind = InputKind::detect(input);
        let keep_csv = keep_csv.unwrap_or(match kind {
            InputKind::Midi => false,
            InputKind::Csv => true,
        });
        Self { kind, keep_csv }
    }
}

/// Files produced for one channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelOutput {
    pub channel: Channel,
    pub midi_path: PathBuf,
    /// Present only when the CSV was kept.
    pub csv_path: Option<PathBuf>,
}

/// Outcome of splitting one input file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    pub input: PathBuf,
    pub plan: RunPlan,
    /// The CSV that was classified; deleted afterwards if it was converted
    /// from MIDI and `plan.keep_csv` is false.
    pub csv_source: PathBuf,
    pub output_dir: PathBuf,
    pub channels: Vec<ChannelOutput>,
}

pub struct Splitter<C> {
    converter: C,
    options: SplitOptions,
}

impl<C: Converter> Splitter<C> {
    pub fn new(converter: C, options: SplitOptions) -> Self {
        Self { converter, options }
    }

    pub fn converter(&self) -> &C {
        &self.converter
    }

    /// Split `input` (MIDI or CSV) into one MIDI file per channel.
    pub fn split_file(&self, input: &Path) -> Result<SplitReport> {
        if !input.exists() {
            return Err(SplitError::InputNotFound {
                path: input.to_path_buf(),
            });
        }

        let plan = RunPlan::resolve(input, self.options.keep_csv);

        let (csv_source, converted) = match plan.kind {
            InputKind::Midi => {
                info!("Converting MIDI file {} to CSV...", input.display());
                let csv = self
                    .converter
                    .midi_to_csv(input)
                    .map_err(|e| e.during(input, Stage::ConvertInput))?;
                (csv, true)
            }
            InputKind::Csv => (input.to_path_buf(), false),
        };

        let result = self.split_csv(input, &csv_source, plan);

        // Runs on failure too: a CSV we created and were told to discard
        // should not outlive the run.
        if converted && !plan.keep_csv {
            let cleanup = std::fs::remove_file(&csv_source)
                .map_err(|e| SplitError::io(&csv_source, e).during(input, Stage::Cleanup));
            match (&result, cleanup) {
                (Ok(_), Err(e)) => return Err(e),
                (Err(_), Err(e)) => debug!("Ignoring cleanup failure after error: {e}"),
                (_, Ok(())) => debug!("Removed temporary CSV file: {}", csv_source.display()),
            }
        }

        let (output_dir, channels) = result?;
        Ok(SplitReport {
            input: input.to_path_buf(),
            plan,
            csv_source,
            output_dir,
            channels,
        })
    }

    fn split_csv(
        &self,
        input: &Path,
        csv: &Path,
        plan: RunPlan,
    ) -> Result<(PathBuf, Vec<ChannelOutput>)> {
        info!("Processing {}...", csv.display());

        let rows = read_rows(csv).map_err(|e| e.during(input, Stage::ReadRows))?;
        let classification = classify(rows).map_err(|e| e.during(input, Stage::ClassifyRows))?;
        debug!(
            "Classified {} rows into channels {:?}",
            classification.rows.len(),
            classification.channels
        );

        let parent = csv.parent().unwrap_or_else(|| Path::new(""));
        let output_dir = create_output_dir(parent, &self.options.output_dir_name)
            .map_err(|e| e.during(input, Stage::CreateOutputDir))?;

        let outputs = if self.options.parallel && classification.channels.len() > 1 {
            self.split_channels_parallel(input, &classification, &output_dir, plan)?
        } else {
            classification
                .channels
                .iter()
                .map(|&ch| self.split_channel(input, ch, &classification, &output_dir, plan))
                .collect::<Result<Vec<_>>>()?
        };

        Ok((output_dir, outputs))
    }

    fn split_channels_parallel(
        &self,
        input: &Path,
        classification: &Classification,
        output_dir: &Path,
        plan: RunPlan,
    ) -> Result<Vec<ChannelOutput>> {
        let results: Vec<Result<ChannelOutput>> = std::thread::scope(|scope| {
            let handles: Vec<_> = classification
                .channels
                .iter()
                .map(|&ch| {
                    let handle = scope.spawn(move || {
                        self.split_channel(input, ch, classification, output_dir, plan)
                    });
                    (ch, handle)
                })
                .collect();

            handles
                .into_iter()
                .map(|(ch, handle)| {
                    handle.join().unwrap_or_else(|_| {
                        Err(SplitError::WorkerPanicked { channel: ch }
                            .during(input, Stage::ProcessChannel(ch)))
                    })
                })
                .collect()
        });

        let mut outputs = Vec::with_capacity(results.len());
        let mut first_error = None;
        for result in results {
            match result {
                Ok(output) => outputs.push(output),
                Err(e) => {
                    error!("{e}: {}", e.root());
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(outputs),
        }
    }

    /// Write one channel's CSV, convert it, and drop the CSV if not kept.
    fn split_channel(
        &self,
        input: &Path,
        channel: Channel,
        classification: &Classification,
        output_dir: &Path,
        plan: RunPlan,
    ) -> Result<ChannelOutput> {
        let csv_path = write_partition(channel, classification, output_dir)
            .map_err(|e| e.during(input, Stage::WriteChannel(channel)))?;

        let midi_path = self
            .converter
            .csv_to_midi(&csv_path)
            .map_err(|e| e.during(input, Stage::ConvertChannel(channel)))?;
        info!("Created {}", midi_path.display());

        let csv_path = if plan.keep_csv {
            Some(csv_path)
        } else {
            std::fs::remove_file(&csv_path)
                .map_err(|e| SplitError::io(&csv_path, e).during(input, Stage::Cleanup))?;
            debug!("Removed temporary CSV file: {}", csv_path.display());
            None
        };

        Ok(ChannelOutput {
            channel,
            midi_path,
            csv_path,
        })
    }
}
