//! Grammar-driven parsing of human date/time expressions.
//!
//! Text such as "next monday at 5pm" or "in 3 weeks" is resolved against a
//! reference instant. What the parser understands is data, not code: a
//! [`Grammar`] declares the period words, the value vocabularies and the
//! pattern rules of a language, and the engine compiles it once.
//!
//! ```
//! use chrono::NaiveDate;
//!
//! let reference = NaiveDate::from_ymd_opt(2013, 2, 12).unwrap().and_hms_opt(4, 30, 0).unwrap();
//! let value = humandate::DateTimeParser::english().parse("tomorrow at 5pm", reference).unwrap();
//! assert_eq!(value, NaiveDate::from_ymd_opt(2013, 2, 13).unwrap().and_hms_opt(17, 0, 0).unwrap());
//! ```

extern crate self as humandate;

#[macro_use]
mod macros;
mod api;
pub mod calendar;
pub mod engine;
mod error;
pub mod grammar;
pub mod grammars;
mod loader;
mod normalize;

pub use api::{
    Context, DateTimeParser, FieldSummary, MatchSummary, Options, ParseDetails, ParseResult, ParseResultVerbose, parse,
    parse_verbose_with, parse_with,
};
pub use calendar::{Calendar, GregorianCalendar, IsoWeekDate, Overflow};
pub use error::{CalendarError, Error, GrammarError, Result};
pub use grammar::{
    Grammar, GrammarBuilder, OpKind, Operation, Period, PeriodId, PeriodKind, PeriodRef, RuleDecl, ValueSource,
    Vocabulary, VocabularyId,
};
pub use normalize::normalize;

/// Byte span in a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    /// Start byte index (inclusive).
    pub start: usize,
    /// End byte index (exclusive).
    pub end: usize,
}
