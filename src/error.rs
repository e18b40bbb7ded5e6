//! Error types for grammar construction and date resolution.

use std::path::PathBuf;

use thiserror::Error;

/// A malformed grammar, detected before any parse runs.
#[derive(Error, Debug)]
pub enum GrammarError {
    #[error("unknown period '{0}'")]
    UnknownPeriod(String),

    #[error("unknown vocabulary '{0}'")]
    UnknownVocabulary(String),

    #[error("vocabulary '{0}' is declared more than once")]
    DuplicateVocabulary(String),

    #[error("vocabulary '{vocabulary}' declares key '{key}' more than once")]
    DuplicateKey { vocabulary: String, key: String },

    #[error("period pattern '{pattern}' has multiplier {multiplier}, expected at least 1")]
    InvalidMultiplier { pattern: String, multiplier: i64 },

    #[error("unterminated '{delimiter}' marker in pattern '{pattern}'")]
    UnterminatedMarker { pattern: String, delimiter: char },

    #[error("pattern '{pattern}' contains more than one period placeholder")]
    MultiplePlaceholders { pattern: String },

    #[error("pattern '{pattern}' references capture ${index} but captures only {count} value(s)")]
    CaptureOutOfRange { pattern: String, index: usize, count: usize },

    #[error("pattern '{pattern}' has an operation with no period to act on")]
    MissingPeriod { pattern: String },

    #[error("invalid operation value '{0}'")]
    InvalidValue(String),

    #[error("invalid word-split expression: {0}")]
    WordSplit(#[source] regex::Error),

    #[error("pattern '{pattern}' compiles to an invalid expression: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("malformed grammar document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("cannot read grammar file '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A resolution step that the calendar could not carry out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CalendarError {
    #[error("{field} {value} is out of range")]
    OutOfRange { field: &'static str, value: i64 },

    #[error("{year:04}-{month:02}-{day:02} is not a valid date")]
    InvalidDate { year: i64, month: i64, day: i64 },

    #[error("week {week} day {weekday} does not exist in ISO year {year}")]
    InvalidWeekDate { year: i64, week: i64, weekday: i64 },

    #[error("day {ordinal} does not exist in year {year}")]
    InvalidOrdinal { year: i64, ordinal: i64 },

    #[error("date arithmetic overflowed")]
    Overflow,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Grammar(#[from] GrammarError),

    #[error(transparent)]
    Calendar(#[from] CalendarError),
}

pub type Result<T> = std::result::Result<T, Error>;
