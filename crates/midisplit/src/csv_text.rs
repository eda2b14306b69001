//! Textual event rows in the midicsv dialect.
//!
//! midicsv writes `track, time, Type, args...` with a space after every
//! comma and quotes string arguments (`1, 0, Title_t, "Hello, world"`).
//! The `csv` crate only honours a quote at the very first byte of a field,
//! so reading is done here. Writing goes through `csv::Writer` with the
//! quoting decided here, since a leading space must survive a re-read.

use std::borrow::Cow;
use std::path::Path;

use serde::Serialize;

use crate::error::{Result, SplitError};

/// One event record: positional fields plus the line it started on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row {
    pub fields: Vec<String>,
    /// 1-based source line, for diagnostics only.
    pub line: usize,
}

impl Row {
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            line: 0,
        }
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.fields.get(index).map(String::as_str)
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    StartField,
    InField,
    InQuoted,
    QuoteInQuoted,
}

/// Parse midicsv text into rows. Blank lines yield no row.
pub fn parse_rows(text: &str) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut fields: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = State::StartField;
    let mut line = 1;
    let mut record_line = 1;
    // A record with no delimiter and no content is a blank line.
    let mut record_started = false;

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        let is_newline = c == '\n' || c == '\r';
        if is_newline && state != State::InQuoted {
            if c == '\r' && chars.peek() == Some(&'\n') {
                chars.next();
            }
            if record_started || !field.is_empty() || state != State::StartField {
                fields.push(std::mem::take(&mut field));
                rows.push(Row {
                    fields: std::mem::take(&mut fields),
                    line: record_line,
                });
            }
            line += 1;
            record_line = line;
            record_started = false;
            state = State::StartField;
            continue;
        }

        match state {
            State::StartField => match c {
                ' ' => {}
                '"' => {
                    record_started = true;
                    state = State::InQuoted;
                }
                ',' => {
                    record_started = true;
                    fields.push(std::mem::take(&mut field));
                }
                _ => {
                    record_started = true;
                    field.push(c);
                    state = State::InField;
                }
            },
            State::InField => match c {
                ',' => {
                    fields.push(std::mem::take(&mut field));
                    state = State::StartField;
                }
                _ => field.push(c),
            },
            State::InQuoted => match c {
                '"' => state = State::QuoteInQuoted,
                _ => {
                    if c == '\n' || (c == '\r' && chars.peek() != Some(&'\n')) {
                        line += 1;
                    }
                    field.push(c);
                }
            },
            State::QuoteInQuoted => match c {
                '"' => {
                    field.push('"');
                    state = State::InQuoted;
                }
                ',' => {
                    fields.push(std::mem::take(&mut field));
                    state = State::StartField;
                }
                _ => {
                    field.push(c);
                    state = State::InField;
                }
            },
        }
    }

    if record_started || !field.is_empty() {
        fields.push(field);
        rows.push(Row {
            fields,
            line: record_line,
        });
    }

    rows
}

/// Read and parse a whole CSV file.
pub fn read_rows(path: &Path) -> Result<Vec<Row>> {
    let text = std::fs::read_to_string(path).map_err(|e| SplitError::io(path, e))?;
    Ok(parse_rows(&text))
}

/// Serialize rows into a fresh buffer. Fields are quoted only when reading
/// them back would otherwise change them; see [`quote_field`].
pub fn render_rows<'a, I>(rows: I) -> Result<Vec<u8>>
where
    I: IntoIterator<Item = &'a Row>,
{
    // Quoting is decided per field here, so the writer must not add its own.
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    for row in rows {
        let lone = row.fields.len() == 1;
        for field in &row.fields {
            writer.write_field(quote_field(field, lone).as_bytes())?;
        }
        writer.write_record(None::<&[u8]>)?;
    }

    writer
        .into_inner()
        .map_err(|e| SplitError::io("<buffer>", e.into_error()))
}

/// Quote `field` if it holds a delimiter, quote or line break, or starts
/// with a space (which [`parse_rows`] would otherwise skip). A lone empty
/// field is quoted so the record does not read back as a blank line.
fn quote_field(field: &str, lone: bool) -> Cow<'_, str> {
    let needs_quotes = field.starts_with(' ')
        || field.contains([',', '"', '\n', '\r'])
        || (lone && field.is_empty());
    if needs_quotes {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}
