//! The response table: (event × mood) → affect and need deltas.
//!
//! Loaded once from CSV rows `event,mood,valence,arousal,touch,rest,social`
//! (header skipped, `#` comments allowed) and immutable afterwards. The
//! mood column is an [`AffectiveLabel`] or `*`, which matches any mood
//! that has no row of its own.

use std::collections::HashMap;
use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::Result;
use crate::gauge::GaugeBank;
use crate::types::{AffectiveLabel, Need, Trigger, UnknownName};

/// The table shipped with the crate.
const BUILTIN_TABLE: &str = include_str!("../data/responses.csv");

/// What one table row does to the companion.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Response {
    /// Valence push, before fuzzing.
    pub valence: f32,
    /// Arousal push, before fuzzing.
    pub arousal: f32,
    /// Touch gauge delta.
    pub touch: f32,
    /// Rest gauge delta.
    pub rest: f32,
    /// Social gauge delta.
    pub social: f32,
}

impl Response {
    /// Apply the three gauge deltas.
    pub fn apply_to(&self, gauges: &mut GaugeBank) {
        gauges.apply_delta(Need::Touch, self.touch);
        gauges.apply_delta(Need::Rest, self.rest);
        gauges.apply_delta(Need::Social, self.social);
    }
}

/// Mood column of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoodKey {
    /// Row applies to one mood.
    Label(AffectiveLabel),
    /// `*` row, used when no exact row exists.
    Any,
}

impl FromStr for MoodKey {
    type Err = UnknownName;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s.trim() == "*" {
            Ok(Self::Any)
        } else {
            s.parse().map(Self::Label)
        }
    }
}

impl fmt::Display for MoodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label(label) => f.write_str(label.as_str()),
            Self::Any => f.write_str("*"),
        }
    }
}

/// Why a row was skipped.
#[derive(Debug)]
enum RowError {
    Arity(usize),
    Event(String),
    Mood(String),
    Number { column: &'static str, raw: String },
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arity(n) => write!(f, "expected 7 fields, found {n}"),
            Self::Event(raw) => write!(f, "unknown event {raw:?}"),
            Self::Mood(raw) => write!(f, "unknown mood {raw:?}"),
            Self::Number { column, raw } => write!(f, "{column} is not a number: {raw:?}"),
        }
    }
}

const NUMERIC_COLUMNS: [&str; 5] = ["valence", "arousal", "touch", "rest", "social"];

type ParsedRow = (Trigger, MoodKey, Response);

fn parse_row(record: &csv::StringRecord) -> std::result::Result<ParsedRow, RowError> {
    if record.len() != 7 {
        return Err(RowError::Arity(record.len()));
    }
    let event = record[0]
        .parse::<Trigger>()
        .map_err(|e| RowError::Event(e.0))?;
    let mood = record[1]
        .parse::<MoodKey>()
        .map_err(|e| RowError::Mood(e.0))?;

    let mut values = [0.0_f32; 5];
    for (i, column) in NUMERIC_COLUMNS.into_iter().enumerate() {
        let raw = &record[i + 2];
        values[i] = raw
            .parse::<f32>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RowError::Number {
                column,
                raw: raw.to_string(),
            })?;
    }
    let [valence, arousal, touch, rest, social] = values;
    Ok((
        event,
        mood,
        Response {
            valence,
            arousal,
            touch,
            rest,
            social,
        },
    ))
}

/// Immutable (event, mood) → [`Response`] map.
#[derive(Debug, Clone, Default)]
pub struct ResponseTable {
    rows: HashMap<(Trigger, MoodKey), Response>,
}

impl ResponseTable {
    /// A table with no rows. Every lookup misses.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// The table compiled into the crate.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_reader(BUILTIN_TABLE.as_bytes())
    }

    /// Parse CSV text.
    #[must_use]
    pub fn from_csv_str(text: &str) -> Self {
        Self::from_reader(text.as_bytes())
    }

    /// Parse CSV from any reader. Bad rows are logged and skipped.
    pub fn from_reader<R: Read>(reader: R) -> Self {
        Self::from_csv(Self::reader_builder().from_reader(reader))
    }

    /// Load from a file, returning an empty table if it cannot be opened.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(table) => table,
            Err(e) => {
                error!(path = %path.display(), error = %e, "failed to open response table, using empty table");
                Self::empty()
            }
        }
    }

    /// Load from a file.
    ///
    /// # Errors
    /// Returns `PurrError::Csv` if the file cannot be opened. Bad rows
    /// inside a readable file are skipped, not reported.
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = Self::reader_builder().from_path(path)?;
        let table = Self::from_csv(reader);
        info!(path = %path.display(), rows = table.len(), "response table loaded");
        Ok(table)
    }

    fn reader_builder() -> csv::ReaderBuilder {
        let mut builder = csv::ReaderBuilder::new();
        builder
            .has_headers(true)
            .flexible(true)
            .comment(Some(b'#'))
            .trim(csv::Trim::All);
        builder
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Self {
        let mut rows = HashMap::new();
        for (index, result) in reader.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) if e.is_io_error() => {
                    error!(error = %e, "response table read aborted");
                    break;
                }
                Err(e) => {
                    warn!(row = index + 1, error = %e, "skipping unreadable response row");
                    continue;
                }
            };
            let line = record.position().map_or(index as u64 + 2, csv::Position::line);
            match parse_row(&record) {
                Ok((event, mood, response)) => {
                    if rows.insert((event, mood), response).is_some() {
                        warn!(line, %event, %mood, "duplicate response row, keeping the later one");
                    }
                }
                Err(e) => warn!(line, reason = %e, "skipping malformed response row"),
            }
        }
        Self { rows }
    }

    /// Row for `(trigger, mood)`, falling back to the trigger's `*` row.
    #[must_use]
    pub fn lookup(&self, trigger: Trigger, mood: AffectiveLabel) -> Option<&Response> {
        self.rows
            .get(&(trigger, MoodKey::Label(mood)))
            .or_else(|| self.rows.get(&(trigger, MoodKey::Any)))
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// `true` if no row loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
