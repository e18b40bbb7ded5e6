//! Rule application: normalized text in, [`Delta`] out.
//!
//! Rules run once each, in compiled order, against a working copy of the
//! input. Whatever a rule matches is cut out of the working copy, so a later
//! rule can never claim the same words again:
//!
//! ```text
//! " in 3 days 3 days ago "
//!   rule "$number$ %period% ago" (day)  -> day -= 3,  text " in 3 days "
//!   rule "in $number$ %period%"  (day)  -> day += 3,  text " "
//! ```
//!
//! Order therefore encodes priority: grammar authors list specific rules
//! before general ones.

use regex::Captures;
use tracing::{debug, trace, warn};

use super::compiler::{CompiledRule, CompiledRules, RuleId};
use super::delta::Delta;
use crate::grammar::{Grammar, Operation, PeriodId, PeriodRef, ValueSource};
use crate::Range;

/// One applied rule, kept for reporting.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    /// Index into the compiled rule list.
    pub rule: usize,
    pub decl: RuleId,
    pub period: Option<PeriodId>,
    /// Matched text, including its boundary spaces.
    pub text: String,
    /// Byte span in the working text at the time of the match.
    pub range: Range,
}

#[derive(Debug, Clone, Default)]
pub struct Accumulation {
    pub delta: Delta,
    pub matches: Vec<RuleMatch>,
}

/// Apply `rules` to `normalized` and accumulate their operations.
pub fn accumulate(normalized: &str, grammar: &Grammar, rules: &CompiledRules) -> Accumulation {
    let mut working = normalized.to_string();
    let mut out = Accumulation::default();

    for (index, rule) in rules.iter().enumerate() {
        let Some(caps) = rule.regex.captures(&working) else {
            continue;
        };
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let range = Range { start: whole.start(), end: whole.end() };
        let text = whole.as_str().to_string();

        for op in &grammar.rules()[rule.decl].operations {
            apply_operation(&mut out.delta, op, rule, &caps, grammar);
        }

        debug!(rule = index, decl = rule.decl, text = text.trim(), "rule matched");
        out.matches.push(RuleMatch { rule: index, decl: rule.decl, period: rule.period, text, range });

        drop(caps);
        excise(&mut working, &range);
    }

    out
}

fn apply_operation(delta: &mut Delta, op: &Operation, rule: &CompiledRule, caps: &Captures<'_>, grammar: &Grammar) {
    // The compiler guarantees a period for every inheriting operation.
    let Some(period_id) = (match op.period {
        PeriodRef::Explicit(id) => Some(id),
        PeriodRef::Inherit => rule.period,
    }) else {
        return;
    };
    let period = grammar.period(period_id);

    let raw = match op.source {
        ValueSource::Literal(v) => v,
        ValueSource::Capture(index) => captured_value(index, rule, caps, grammar),
    };
    let value = raw.saturating_mul(period.multiplier);

    trace!(op = ?op.kind, period = %period.kind, value, "apply operation");
    delta[period.kind].apply(op.kind, value);
}

fn captured_value(index: usize, rule: &CompiledRule, caps: &Captures<'_>, grammar: &Grammar) -> i64 {
    let vocabulary = grammar.vocabulary(rule.captures[index - 1]);
    let text = caps.name(&CompiledRule::group_name(index)).map(|m| m.as_str()).unwrap_or("");

    let value = if grammar.case_sensitive() { vocabulary.value_of(text) } else { vocabulary.value_of_folded(text) };
    match value {
        Some(v) => v,
        None => {
            warn!(vocabulary = %vocabulary.name, text, "captured text has no value, using 0");
            0
        }
    }
}

/// Remove the span but keep its final character, the boundary separator.
fn excise(working: &mut String, range: &Range) {
    let keep_from = working[range.start..range.end].char_indices().last().map(|(i, _)| range.start + i);
    if let Some(end) = keep_from {
        working.replace_range(range.start..end, "");
    }
}
