//! In-memory grammar model.
//!
//! A [`Grammar`] owns every [`Period`] and [`Vocabulary`] in flat arenas. Rules
//! and operations point into those arenas through [`PeriodId`] and
//! [`VocabularyId`], so one period record (say "day") can be shared by any
//! number of rules without shared ownership.
//!
//! ```text
//! Grammar
//!  ├─ periods:      [second, minute, hour, day, week, fortnight, ..]
//!  ├─ vocabularies: [number, month, weekday, ..]
//!  └─ rules:        [RuleDecl { pattern, period?, operations }, ..]
//!                          │                          │
//!                          └── PeriodId ──────────────┴── PeriodId / $N
//! ```
//!
//! Grammars are built once (see [`GrammarBuilder`] or `Grammar::from_json`)
//! and are read-only afterwards.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::error::GrammarError;

/// Unit of calendar granularity, ordered from finest to coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PeriodKind {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl PeriodKind {
    pub const COUNT: usize = 7;

    pub const ALL: [PeriodKind; PeriodKind::COUNT] = [
        PeriodKind::Second,
        PeriodKind::Minute,
        PeriodKind::Hour,
        PeriodKind::Day,
        PeriodKind::Week,
        PeriodKind::Month,
        PeriodKind::Year,
    ];

    /// Look a kind up by its grammar name. Unknown names have no kind.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "second" => Some(PeriodKind::Second),
            "minute" => Some(PeriodKind::Minute),
            "hour" => Some(PeriodKind::Hour),
            "day" => Some(PeriodKind::Day),
            "week" => Some(PeriodKind::Week),
            "month" => Some(PeriodKind::Month),
            "year" => Some(PeriodKind::Year),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PeriodKind::Second => "second",
            PeriodKind::Minute => "minute",
            PeriodKind::Hour => "hour",
            PeriodKind::Day => "day",
            PeriodKind::Week => "week",
            PeriodKind::Month => "month",
            PeriodKind::Year => "year",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Index of a [`Period`] inside its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PeriodId(pub(crate) usize);

/// Index of a [`Vocabulary`] inside its grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VocabularyId(pub(crate) usize);

/// A recognizable period word ("day", "decade") and the amount of its kind it stands for.
#[derive(Debug, Clone)]
pub struct Period {
    pub kind: PeriodKind,
    /// Number of `kind` units in one of these (a decade is 10 years).
    pub multiplier: i64,
    /// Regular expression matching the spelling of the period.
    pub pattern: String,
}

/// Named set of words that translate to integers (month names, number words, ...).
#[derive(Debug, Clone)]
pub struct Vocabulary {
    pub name: String,
    entries: Vec<(String, i64)>,
}

impl Vocabulary {
    /// The vocabulary that also accepts raw decimal literals.
    pub const NUMBER: &'static str = "number";

    pub fn new<K: Into<String>>(name: impl Into<String>, entries: impl IntoIterator<Item = (K, i64)>) -> Self {
        Vocabulary { name: name.into(), entries: entries.into_iter().map(|(k, v)| (k.into(), v)).collect() }
    }

    pub fn entries(&self) -> &[(String, i64)] {
        &self.entries
    }

    pub fn is_number(&self) -> bool {
        self.name == Self::NUMBER
    }

    /// Alternation matching any key of this vocabulary (keys are matched literally).
    pub fn alternation(&self) -> String {
        let mut alternatives: Vec<String> = self.entries.iter().map(|(key, _)| regex::escape(key)).collect();
        if self.is_number() {
            alternatives.push(r"\d+".to_string());
        }
        alternatives.join("|")
    }

    /// Translate captured text. Integer literals are taken as-is, anything
    /// else goes through the key table.
    pub fn value_of(&self, text: &str) -> Option<i64> {
        if let Ok(n) = text.parse::<i64>() {
            return Some(n);
        }
        self.entries.iter().find(|(key, _)| key == text).map(|(_, v)| *v)
    }

    /// Like [`value_of`](Self::value_of), comparing keys case-insensitively.
    pub fn value_of_folded(&self, text: &str) -> Option<i64> {
        if let Ok(n) = text.parse::<i64>() {
            return Some(n);
        }
        self.entries.iter().find(|(key, _)| key.to_lowercase() == text.to_lowercase()).map(|(_, v)| *v)
    }

    fn first_duplicate(&self) -> Option<&str> {
        let mut seen = HashSet::new();
        self.entries.iter().map(|(k, _)| k.as_str()).find(|k| !seen.insert(*k))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpKind {
    Add,
    Subtract,
    Set,
}

/// Which field an operation writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodRef {
    /// Use the period the owning rule is bound to.
    Inherit,
    Explicit(PeriodId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Literal(i64),
    /// 1-based index into the rule's captured vocabularies.
    Capture(usize),
}

impl FromStr for ValueSource {
    type Err = GrammarError;

    /// `"$2"` is a capture reference, anything else must be an integer literal.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.strip_prefix('$') {
            Some(index) => match index.parse::<usize>() {
                Ok(n) if n >= 1 => Ok(ValueSource::Capture(n)),
                _ => Err(GrammarError::InvalidValue(s.to_string())),
            },
            None => s.parse::<i64>().map(ValueSource::Literal).map_err(|_| GrammarError::InvalidValue(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Operation {
    pub kind: OpKind,
    pub period: PeriodRef,
    pub source: ValueSource,
}

impl Operation {
    pub fn new(kind: OpKind, source: ValueSource) -> Self {
        Operation { kind, period: PeriodRef::Inherit, source }
    }

    pub fn add(source: ValueSource) -> Self {
        Self::new(OpKind::Add, source)
    }

    pub fn subtract(source: ValueSource) -> Self {
        Self::new(OpKind::Subtract, source)
    }

    pub fn set(source: ValueSource) -> Self {
        Self::new(OpKind::Set, source)
    }

    /// Target an explicit period instead of the rule's bound one.
    pub fn on(mut self, period: PeriodId) -> Self {
        self.period = PeriodRef::Explicit(period);
        self
    }
}

/// A rule as declared: a pattern and the operations it triggers.
///
/// `%name%` in the pattern is a period placeholder (`%period%` means any period),
/// `$name$` captures a value from the named vocabulary.
#[derive(Debug, Clone)]
pub struct RuleDecl {
    pub pattern: String,
    /// Owning period used when the pattern selects no period.
    pub period: Option<PeriodId>,
    pub operations: Vec<Operation>,
}

impl RuleDecl {
    pub fn new(pattern: impl Into<String>) -> Self {
        RuleDecl { pattern: pattern.into(), period: None, operations: Vec::new() }
    }

    pub fn bound_to(mut self, period: PeriodId) -> Self {
        self.period = Some(period);
        self
    }

    pub fn op(mut self, operation: Operation) -> Self {
        self.operations.push(operation);
        self
    }
}

/// A complete, validated language grammar.
#[derive(Debug, Clone)]
pub struct Grammar {
    language: String,
    word_split: Regex,
    case_sensitive: bool,
    periods: Vec<Period>,
    vocabularies: Vec<Vocabulary>,
    rules: Vec<RuleDecl>,
}

impl Grammar {
    pub fn builder(language: impl Into<String>) -> GrammarBuilder {
        GrammarBuilder::new(language)
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn word_split(&self) -> &Regex {
        &self.word_split
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    pub fn period(&self, id: PeriodId) -> &Period {
        &self.periods[id.0]
    }

    pub fn period_ids(&self) -> impl Iterator<Item = PeriodId> + '_ {
        (0..self.periods.len()).map(PeriodId)
    }

    /// All period records registered under `kind`, in declaration order.
    pub fn periods_of(&self, kind: PeriodKind) -> impl Iterator<Item = PeriodId> + '_ {
        self.periods.iter().enumerate().filter(move |(_, p)| p.kind == kind).map(|(i, _)| PeriodId(i))
    }

    pub fn vocabularies(&self) -> &[Vocabulary] {
        &self.vocabularies
    }

    pub fn vocabulary(&self, id: VocabularyId) -> &Vocabulary {
        &self.vocabularies[id.0]
    }

    pub fn vocabulary_by_name(&self, name: &str) -> Option<VocabularyId> {
        self.vocabularies.iter().position(|v| v.name == name).map(VocabularyId)
    }

    pub fn rules(&self) -> &[RuleDecl] {
        &self.rules
    }
}

/// Incremental constructor for [`Grammar`]; all validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct GrammarBuilder {
    language: String,
    word_split: String,
    case_sensitive: bool,
    periods: Vec<Period>,
    vocabularies: Vec<Vocabulary>,
    rules: Vec<RuleDecl>,
}

impl GrammarBuilder {
    pub const DEFAULT_WORD_SPLIT: &'static str = r"\s+";

    pub fn new(language: impl Into<String>) -> Self {
        GrammarBuilder {
            language: language.into(),
            word_split: Self::DEFAULT_WORD_SPLIT.to_string(),
            case_sensitive: false,
            periods: Vec::new(),
            vocabularies: Vec::new(),
            rules: Vec::new(),
        }
    }

    pub fn word_split(&mut self, expr: impl Into<String>) -> &mut Self {
        self.word_split = expr.into();
        self
    }

    pub fn case_sensitive(&mut self, yes: bool) -> &mut Self {
        self.case_sensitive = yes;
        self
    }

    pub fn period(&mut self, kind: PeriodKind, multiplier: i64, pattern: impl Into<String>) -> PeriodId {
        self.periods.push(Period { kind, multiplier, pattern: pattern.into() });
        PeriodId(self.periods.len() - 1)
    }

    /// First declared period of `kind`, the one explicit period names refer to.
    pub fn first_period_of(&self, kind: PeriodKind) -> Option<PeriodId> {
        self.periods.iter().position(|p| p.kind == kind).map(PeriodId)
    }

    pub fn vocabulary(&mut self, vocabulary: Vocabulary) -> VocabularyId {
        self.vocabularies.push(vocabulary);
        VocabularyId(self.vocabularies.len() - 1)
    }

    pub fn rule(&mut self, rule: RuleDecl) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        let word_split = Regex::new(&self.word_split).map_err(GrammarError::WordSplit)?;

        if let Some(p) = self.periods.iter().find(|p| p.multiplier < 1) {
            return Err(GrammarError::InvalidMultiplier { pattern: p.pattern.clone(), multiplier: p.multiplier });
        }

        let mut names = HashSet::new();
        for vocabulary in &self.vocabularies {
            if !names.insert(vocabulary.name.as_str()) {
                return Err(GrammarError::DuplicateVocabulary(vocabulary.name.clone()));
            }
            if let Some(key) = vocabulary.first_duplicate() {
                return Err(GrammarError::DuplicateKey { vocabulary: vocabulary.name.clone(), key: key.to_string() });
            }
        }

        let in_range = |id: PeriodId| id.0 < self.periods.len();
        for rule in &self.rules {
            let explicit = rule.operations.iter().filter_map(|op| match op.period {
                PeriodRef::Explicit(id) => Some(id),
                PeriodRef::Inherit => None,
            });
            if let Some(bad) = rule.period.into_iter().chain(explicit).find(|id| !in_range(*id)) {
                return Err(GrammarError::UnknownPeriod(format!("#{}", bad.0)));
            }
        }

        Ok(Grammar {
            language: self.language,
            word_split,
            case_sensitive: self.case_sensitive,
            periods: self.periods,
            vocabularies: self.vocabularies,
            rules: self.rules,
        })
    }
}
