use crate::csv_text::Row;
use crate::error::{Result, SplitError};
use serde::Serialize;

/// A MIDI channel number as written in the CSV channel field.
pub type Channel = u32;

/// Channel-voice event types whose fourth field is a channel number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ChannelEvent {
    NoteOn,
    NoteOff,
    Control,
    Program,
    PitchBend,
}

impl ChannelEvent {
    pub const ALL: [ChannelEvent; 5] = [
        Self::NoteOn,
        Self::NoteOff,
        Self::Control,
        Self::Program,
        Self::PitchBend,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::NoteOn => "Note_on_c",
            Self::NoteOff => "Note_off_c",
            Self::Control => "Control_c",
            Self::Program => "Program_c",
            Self::PitchBend => "Pitch_bend_c",
        }
    }

    /// Exact, case-sensitive match on the midicsv label.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|ev| ev.label() == label)
    }
}

impl std::fmt::Display for ChannelEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

pub fn is_channel_event(label: &str) -> bool {
    ChannelEvent::from_label(label).is_some()
}

/// Which partition a row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// Replicated into every channel's output.
    Global,
    Channel(Channel),
}

impl Marker {
    /// Whether a row with this marker belongs in `channel`'s output.
    pub fn belongs_to(&self, channel: Channel) -> bool {
        match self {
            Self::Global => true,
            Self::Channel(ch) => *ch == channel,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedRow {
    pub marker: Marker,
    pub row: Row,
}

/// Rows tagged by channel, plus the channels in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub channels: Vec<Channel>,
    pub rows: Vec<ClassifiedRow>,
}

impl Classification {
    /// All global rows and `channel`'s rows, in input order.
    pub fn partition(&self, channel: Channel) -> impl Iterator<Item = &Row> + '_ {
        self.rows
            .iter()
            .filter(move |c| c.marker.belongs_to(channel))
            .map(|c| &c.row)
    }

    pub fn global_rows(&self) -> impl Iterator<Item = &Row> + '_ {
        self.rows
            .iter()
            .filter(|c| c.marker == Marker::Global)
            .map(|c| &c.row)
    }
}

/// Decide the marker for a single row.
///
/// A row is channel-specific only when field 2 is a channel event label
/// and field 3 exists; everything else is global.
pub fn classify_row(row: &Row) -> Result<Marker> {
    let Some(label) = row.field(2) else {
        return Ok(Marker::Global);
    };
    if !is_channel_event(label) {
        return Ok(Marker::Global);
    }
    match row.field(3) {
        Some(value) => parse_channel(value, row.line).map(Marker::Channel),
        None => Ok(Marker::Global),
    }
}

/// Tag every row and collect distinct channels in first-seen order.
pub fn classify(rows: Vec<Row>) -> Result<Classification> {
    let mut classification = Classification::default();

    for row in rows {
        let marker = classify_row(&row)?;
        if let Marker::Channel(ch) = marker {
            if !classification.channels.contains(&ch) {
                classification.channels.push(ch);
            }
        }
        classification.rows.push(ClassifiedRow { marker, row });
    }

    Ok(classification)
}

fn parse_channel(value: &str, line: usize) -> Result<Channel> {
    let trimmed = value.trim();
    // `u32::from_str` accepts a leading '+' and rejects '-'.
    trimmed
        .parse::<Channel>()
        .map_err(|_| SplitError::MalformedChannelField {
            line,
            value: value.to_string(),
        })
}
