//! Rule compilation.
//!
//! This module holds the *static* side of the engine: it turns the declared
//! rules of a [`Grammar`] into a flat, ordered list of [`CompiledRule`]s, each
//! one a ready-to-run regex plus a binding to the period it acts on.
//!
//! Patterns use two kinds of markers:
//!
//! - `%name%` is a **period placeholder**. `%period%` selects every period of
//!   the grammar, `%year%` selects every period of kind year (year, decade, ..).
//!   The declaration is expanded into one compiled rule per selected period,
//!   with that period's own pattern substituted at the placeholder.
//! - `$name$` is a **vocabulary capture**. It becomes the named group `vN`
//!   (N = 1-based capture ordinal) matching any key of the vocabulary.
//!
//! ```text
//! "in $number$ %period%"
//!        │         └── expanded per period ──┐
//!        v                                   v
//! " in (?P<v1>a|an|one|..|\d+) (?:days?) "   bound to: day
//! " in (?P<v1>a|an|one|..|\d+) (?:weeks?) "  bound to: week
//! ...
//! ```
//!
//! ## Invariants
//!
//! - Compiled rules keep declaration order; expansions of one declaration keep
//!   the grammar's period order.
//! - Every expansion of a declaration shares the same capture list, so `$N`
//!   always names the same vocabulary whichever period matched.
//! - Compilation is pure: the same grammar always yields the same rules.

use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use crate::error::GrammarError;
use crate::grammar::{Grammar, PeriodId, PeriodKind, PeriodRef, RuleDecl, ValueSource, VocabularyId};

/// Index of a declaration in [`Grammar::rules`].
pub type RuleId = usize;

/// Placeholder name selecting every period of the grammar.
pub const ANY_PERIOD: &str = "period";

const PERIOD_DELIMITER: char = '%';
const CAPTURE_DELIMITER: char = '$';

/// One matcher, ready to run against normalized text.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    /// Declaration this rule was compiled from.
    pub decl: RuleId,
    /// Period bound by expansion; inherited by operations without an explicit one.
    pub period: Option<PeriodId>,
    pub regex: Regex,
    /// Vocabularies captured by the pattern, in encounter order.
    pub captures: Arc<[VocabularyId]>,
}

impl CompiledRule {
    /// Name of the regex group holding capture `index` (1-based).
    pub fn group_name(index: usize) -> String {
        format!("v{index}")
    }
}

/// The compiled, ordered rule list of a grammar.
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    pub rules: Vec<CompiledRule>,
}

impl CompiledRules {
    pub fn new(grammar: &Grammar) -> Result<Self, GrammarError> {
        let mut rules = Vec::new();
        for (id, decl) in grammar.rules().iter().enumerate() {
            rules.extend(compile_rule(id, decl, grammar)?);
        }

        debug!(
            language = grammar.language(),
            declared = grammar.rules().len(),
            compiled = rules.len(),
            "grammar compiled"
        );

        Ok(CompiledRules { rules })
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CompiledRule> {
        self.rules.iter()
    }
}

/// Result of scanning a pattern once, before per-period expansion.
#[derive(Debug)]
struct ScannedPattern {
    expr: String,
    /// Byte offset of the period placeholder in `expr`, if any.
    insert_at: Option<usize>,
    /// Periods selected by the placeholder.
    targets: Vec<PeriodId>,
    captures: Vec<VocabularyId>,
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '-'
}

fn scan(pattern: &str, grammar: &Grammar) -> Result<ScannedPattern, GrammarError> {
    let padded = format!(" {pattern} ");
    let mut scanned = ScannedPattern {
        expr: String::with_capacity(padded.len()),
        insert_at: None,
        targets: Vec::new(),
        captures: Vec::new(),
    };
    let mut open: Option<char> = None;
    let mut name = String::new();

    for c in padded.chars() {
        match (c, open) {
            (PERIOD_DELIMITER, None) => {
                if scanned.insert_at.is_some() {
                    return Err(GrammarError::MultiplePlaceholders { pattern: pattern.to_string() });
                }
                scanned.insert_at = Some(scanned.expr.len());
                name.clear();
                open = Some(PERIOD_DELIMITER);
            }
            (PERIOD_DELIMITER, Some(PERIOD_DELIMITER)) => {
                scanned.targets = select_periods(&name, grammar)?;
                open = None;
            }
            (CAPTURE_DELIMITER, None) => {
                name.clear();
                open = Some(CAPTURE_DELIMITER);
            }
            (CAPTURE_DELIMITER, Some(CAPTURE_DELIMITER)) => {
                let id =
                    grammar.vocabulary_by_name(&name).ok_or_else(|| GrammarError::UnknownVocabulary(name.clone()))?;
                scanned.captures.push(id);
                let group = CompiledRule::group_name(scanned.captures.len());
                scanned.expr.push_str(&format!("(?P<{group}>{})", grammar.vocabulary(id).alternation()));
                open = None;
            }
            (PERIOD_DELIMITER | CAPTURE_DELIMITER, Some(delimiter)) => {
                return Err(GrammarError::UnterminatedMarker { pattern: pattern.to_string(), delimiter });
            }
            (c, Some(_)) if is_name_char(c) => name.push(c),
            (c, _) => {
                scanned.expr.push(c);
                name.clear();
            }
        }
    }

    if let Some(delimiter) = open {
        return Err(GrammarError::UnterminatedMarker { pattern: pattern.to_string(), delimiter });
    }

    Ok(scanned)
}

fn select_periods(name: &str, grammar: &Grammar) -> Result<Vec<PeriodId>, GrammarError> {
    if name == ANY_PERIOD {
        return Ok(grammar.period_ids().collect());
    }
    let kind = PeriodKind::from_name(name).ok_or_else(|| GrammarError::UnknownPeriod(name.to_string()))?;
    Ok(grammar.periods_of(kind).collect())
}

fn compile_rule(id: RuleId, decl: &RuleDecl, grammar: &Grammar) -> Result<Vec<CompiledRule>, GrammarError> {
    let scanned = scan(&decl.pattern, grammar)?;

    for op in &decl.operations {
        if let ValueSource::Capture(index) = op.source {
            if index == 0 || index > scanned.captures.len() {
                return Err(GrammarError::CaptureOutOfRange {
                    pattern: decl.pattern.clone(),
                    index,
                    count: scanned.captures.len(),
                });
            }
        }
    }

    // An empty selection still registers the rule once, without substitution.
    let substitute = !scanned.targets.is_empty();
    let bindings: Vec<Option<PeriodId>> =
        if substitute { scanned.targets.iter().copied().map(Some).collect() } else { vec![decl.period] };

    let inherits = decl.operations.iter().any(|op| op.period == PeriodRef::Inherit);
    if inherits && bindings.iter().any(Option::is_none) {
        return Err(GrammarError::MissingPeriod { pattern: decl.pattern.clone() });
    }

    let captures: Arc<[VocabularyId]> = scanned.captures.into();
    let mut compiled = Vec::with_capacity(bindings.len());

    for period in bindings {
        let mut source = scanned.expr.clone();
        if let (true, Some(at), Some(period)) = (substitute, scanned.insert_at, period) {
            source.insert_str(at, &format!("(?:{})", grammar.period(period).pattern));
        }

        let regex = RegexBuilder::new(&source)
            .case_insensitive(!grammar.case_sensitive())
            .build()
            .map_err(|source| GrammarError::InvalidPattern { pattern: decl.pattern.clone(), source })?;

        compiled.push(CompiledRule { decl: id, period, regex, captures: Arc::clone(&captures) });
    }

    Ok(compiled)
}
