//! Grammars shipped with the crate.
//!
//! Each language lives in `src/grammars/<lang>.json` and is compiled on first
//! use. The documents use the same format [`Grammar::from_json`] accepts, so a
//! copy of one makes a good starting point for a custom grammar.

use once_cell::sync::Lazy;

use crate::grammar::Grammar;

/// Source of the bundled English grammar.
pub const ENGLISH_SOURCE: &str = include_str!("grammars/en.json");

static ENGLISH: Lazy<Grammar> =
    Lazy::new(|| Grammar::from_json(ENGLISH_SOURCE).expect("bundled English grammar must be valid"));

/// The bundled English grammar.
pub fn english() -> &'static Grammar {
    &ENGLISH
}

/// Bundled grammar for a language code such as `"en"` or `"en-US"`.
///
/// Only the primary language subtag is looked at, case-insensitively.
pub fn by_language(code: &str) -> Option<&'static Grammar> {
    let primary = code.split(['-', '_']).next().unwrap_or(code);
    match primary.to_ascii_lowercase().as_str() {
        "en" => Some(english()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "grammars/tests.rs"]
mod tests;
