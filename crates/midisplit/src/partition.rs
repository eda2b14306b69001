//! Per-channel CSV output.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::classify::{Channel, Classification};
use crate::csv_text::render_rows;
use crate::error::{Result, SplitError};

pub const CSV_EXTENSION: &str = "csv";
pub const MIDI_EXTENSION: &str = "mid";

/// `channel_<N>.<ext>`
pub fn channel_file_name(channel: Channel, extension: &str) -> String {
    format!("channel_{channel}.{extension}")
}

/// Create `<parent>/<name>`, succeeding if it already exists.
pub fn create_output_dir(parent: &Path, name: &str) -> Result<PathBuf> {
    let dir = parent.join(name);
    std::fs::create_dir_all(&dir).map_err(|e| SplitError::io(&dir, e))?;
    debug!("Created output directory: {}", dir.display());
    Ok(dir)
}

/// Write global rows plus `channel`'s rows to `<output_dir>/channel_<N>.csv`.
///
/// The whole file is rendered in memory before the destination is opened,
/// so a rendering failure never leaves a partial file behind.
pub fn write_partition(
    channel: Channel,
    classification: &Classification,
    output_dir: &Path,
) -> Result<PathBuf> {
    let bytes = render_rows(classification.partition(channel))?;
    let path = output_dir.join(channel_file_name(channel, CSV_EXTENSION));
    std::fs::write(&path, bytes).map_err(|e| SplitError::io(&path, e))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::classify;
    use crate::csv_text::{parse_rows, Row};
    use pretty_assertions::assert_eq;

    const INPUT: &str = "0, 0, Header, 0, 1, 96\n\
                         1, 0, Start_track\n\
                         1, 0, Title_t, \"Duet, in two parts\"\n\
                         1, 0, Tempo, 400000\n\
                         1, 0, Program_c, 1, 32\n\
                         1, 0, Program_c, 2, 27\n\
                         1, 100, Note_on_c, 1, 40, 75\n\
                         1, 200, Note_on_c, 1, 40, 0\n\
                         1, 300, Note_on_c, 2, 40, 80\n\
                         1, 400, Note_off_c, 2, 40, 0\n\
                         1, 500, End_track\n\
                         0, 0, End_of_file\n";

    fn fields(rows: &[Row]) -> Vec<Vec<String>> {
        rows.iter().map(|r| r.fields.clone()).collect()
    }

    #[test]
    fn file_names() {
        assert_eq!(channel_file_name(0, CSV_EXTENSION), "channel_0.csv");
        assert_eq!(channel_file_name(15, MIDI_EXTENSION), "channel_15.mid");
    }

    #[test]
    fn output_dir_creation_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let first = create_output_dir(tmp.path(), "split_channels").unwrap();
        let second = create_output_dir(tmp.path(), "split_channels").unwrap();
        assert_eq!(first, second);
        assert!(first.is_dir());
    }

    #[test]
    fn written_partition_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let classification = classify(parse_rows(INPUT)).unwrap();

        for &channel in &classification.channels {
            let path = write_partition(channel, &classification, tmp.path()).unwrap();
            assert_eq!(path, tmp.path().join(format!("channel_{channel}.csv")));

            let written = parse_rows(&std::fs::read_to_string(&path).unwrap());
            let expected: Vec<Row> = classification.partition(channel).cloned().collect();
            assert_eq!(fields(&written), fields(&expected));

            // Re-classifying the output finds only this channel.
            let reclassified = classify(written).unwrap();
            assert_eq!(reclassified.channels, vec![channel]);
        }
    }

    #[test]
    fn partition_keeps_every_global_row_in_order() {
        let tmp = tempfile::tempdir().unwrap();
        let classification = classify(parse_rows(INPUT)).unwrap();
        let globals: Vec<Row> = classification.global_rows().cloned().collect();

        for &channel in &classification.channels {
            let path = write_partition(channel, &classification, tmp.path()).unwrap();
            let written = classify(parse_rows(&std::fs::read_to_string(path).unwrap())).unwrap();
            let written_globals: Vec<Row> = written.global_rows().cloned().collect();
            assert_eq!(fields(&written_globals), fields(&globals));
        }
    }

    #[test]
    fn partition_file_text() {
        let tmp = tempfile::tempdir().unwrap();
        let classification = classify(parse_rows(INPUT)).unwrap();
        let path = write_partition(2, &classification, tmp.path()).unwrap();

        let text = std::fs::read_to_string(path).unwrap();
        assert_eq!(
            text,
            "0,0,Header,0,1,96\n\
             1,0,Start_track\n\
             1,0,Title_t,\"Duet, in two parts\"\n\
             1,0,Tempo,400000\n\
             1,0,Program_c,2,27\n\
             1,300,Note_on_c,2,40,80\n\
             1,400,Note_off_c,2,40,0\n\
             1,500,End_track\n\
             0,0,End_of_file\n"
        );
    }

    #[test]
    fn lyric_syllables_keep_leading_space() {
        let tmp = tempfile::tempdir().unwrap();
        let classification = classify(parse_rows(
            "0, 0, Header, 0, 1, 96\n\
             1, 0, Program_c, 1, 32\n\
             1, 10, Lyric_t, \"la\"\n\
             1, 20, Lyric_t, \" la\"\n\
             1, 30, Note_on_c, 1, 60, 90\n\
             0, 0, End_of_file\n",
        ))
        .unwrap();

        let path = write_partition(1, &classification, tmp.path()).unwrap();
        let text = std::fs::read_to_string(path).unwrap();
        assert!(text.contains("1,10,Lyric_t,la\n"));
        assert!(text.contains("1,20,Lyric_t,\" la\"\n"));

        let written = parse_rows(&text);
        let expected: Vec<Row> = classification.partition(1).cloned().collect();
        assert_eq!(fields(&written), fields(&expected));
        assert_eq!(written[2].fields[3], " la");
    }

    #[test]
    fn write_into_missing_dir_fails_with_path() {
        let classification = classify(parse_rows(INPUT)).unwrap();
        let err = write_partition(1, &classification, Path::new("/nonexistent/split")).unwrap_err();
        match err {
            SplitError::Io { path, .. } => {
                assert_eq!(path, Path::new("/nonexistent/split/channel_1.csv"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
