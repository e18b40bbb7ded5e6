//! JSON grammar documents.
//!
//! One document describes one language:
//!
//! ```json
//! {
//!   "language": "en",
//!   "wordsplit": "[\\s,]+",
//!   "casesensitive": false,
//!   "periods": [ { "type": "day", "pattern": "days?" },
//!                { "type": "year", "value": 10, "pattern": "decades?" } ],
//!   "values":  [ { "name": "number", "entries": [["one", 1], ["two", 2]] } ],
//!   "rules":   [ { "pattern": "in $number$ %period%",
//!                  "operations": [ { "op": "add" } ] } ]
//! }
//! ```
//!
//! Defaults: a period's `value` (multiplier) is 1, an operation's `value` is
//! `"$1"`, and an operation without `period` acts on the period its rule is
//! bound to. Period names (`"day"`, `"year"`, ..) refer to the first period
//! declared with that kind.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::GrammarError;
use crate::grammar::{
    Grammar, GrammarBuilder, OpKind, Operation, PeriodId, PeriodKind, RuleDecl, ValueSource, Vocabulary,
};

#[derive(Debug, Deserialize)]
struct Document {
    language: String,
    #[serde(default)]
    wordsplit: Option<String>,
    #[serde(default)]
    casesensitive: bool,
    #[serde(default)]
    periods: Vec<PeriodDoc>,
    #[serde(default)]
    values: Vec<VocabularyDoc>,
    #[serde(default)]
    rules: Vec<RuleDoc>,
}

#[derive(Debug, Deserialize)]
struct PeriodDoc {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default = "default_multiplier")]
    value: i64,
    pattern: String,
}

#[derive(Debug, Deserialize)]
struct VocabularyDoc {
    name: String,
    #[serde(default)]
    entries: Vec<(String, i64)>,
}

#[derive(Debug, Deserialize)]
struct RuleDoc {
    pattern: String,
    #[serde(default)]
    period: Option<String>,
    #[serde(default)]
    operations: Vec<OperationDoc>,
}

#[derive(Debug, Deserialize)]
struct OperationDoc {
    op: OpName,
    #[serde(default)]
    period: Option<String>,
    #[serde(default = "default_value")]
    value: ValueDoc,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum OpName {
    Add,
    #[serde(alias = "subtract")]
    Sub,
    Set,
}

impl From<OpName> for OpKind {
    fn from(op: OpName) -> Self {
        match op {
            OpName::Add => OpKind::Add,
            OpName::Sub => OpKind::Subtract,
            OpName::Set => OpKind::Set,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ValueDoc {
    Int(i64),
    Text(String),
}

fn default_multiplier() -> i64 {
    1
}

fn default_value() -> ValueDoc {
    ValueDoc::Text("$1".to_string())
}

impl TryFrom<&ValueDoc> for ValueSource {
    type Error = GrammarError;

    fn try_from(value: &ValueDoc) -> Result<Self, Self::Error> {
        match value {
            ValueDoc::Int(n) => Ok(ValueSource::Literal(*n)),
            ValueDoc::Text(s) => s.parse(),
        }
    }
}

impl Grammar {
    /// Build a grammar from a JSON document.
    pub fn from_json(source: &str) -> Result<Grammar, GrammarError> {
        let doc: Document = serde_json::from_str(source)?;
        from_document(doc)
    }

    /// Read and build a grammar from a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Grammar, GrammarError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| GrammarError::Io { path: path.to_path_buf(), source })?;
        Grammar::from_json(&source)
    }
}

fn from_document(doc: Document) -> Result<Grammar, GrammarError> {
    let mut builder = Grammar::builder(doc.language);
    if let Some(split) = doc.wordsplit {
        builder.word_split(split);
    }
    builder.case_sensitive(doc.casesensitive);

    for period in doc.periods {
        let kind = PeriodKind::from_name(&period.kind).ok_or(GrammarError::UnknownPeriod(period.kind))?;
        builder.period(kind, period.value, period.pattern);
    }

    for vocabulary in doc.values {
        builder.vocabulary(Vocabulary::new(vocabulary.name, vocabulary.entries));
    }

    for rule in doc.rules {
        let mut decl = RuleDecl::new(rule.pattern);
        if let Some(name) = &rule.period {
            decl = decl.bound_to(period_by_name(&builder, name)?);
        }
        for op in &rule.operations {
            let mut operation = Operation::new(op.op.into(), ValueSource::try_from(&op.value)?);
            if let Some(name) = &op.period {
                operation = operation.on(period_by_name(&builder, name)?);
            }
            decl = decl.op(operation);
        }
        builder.rule(decl);
    }

    let grammar = builder.build()?;
    debug!(
        language = grammar.language(),
        periods = grammar.periods().len(),
        vocabularies = grammar.vocabularies().len(),
        rules = grammar.rules().len(),
        "grammar loaded"
    );
    Ok(grammar)
}

fn period_by_name(builder: &GrammarBuilder, name: &str) -> Result<PeriodId, GrammarError> {
    PeriodKind::from_name(name)
        .and_then(|kind| builder.first_period_of(kind))
        .ok_or_else(|| GrammarError::UnknownPeriod(name.to_string()))
}
