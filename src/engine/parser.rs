//! One parse, start to finish.
//!
//! ```text
//! input ─▶ normalize ─▶ accumulate ─▶ resolve ─▶ NaiveDateTime
//!           (grammar)    (compiled     (calendar,
//!                         rules)        reference)
//! ```
//!
//! A `Parser` borrows everything long-lived (grammar, compiled rules) and owns
//! only the per-run state, so any number of parsers can run over the same
//! compiled grammar.

use std::time::Instant;

use chrono::NaiveDateTime;
use tracing::debug;

use super::accumulate::accumulate;
use super::compiler::CompiledRules;
use super::metrics::{MatchMetrics, RunMetrics, RunResult};
use super::resolve::resolve;
use crate::Context;
use crate::calendar::Calendar;
use crate::error::CalendarError;
use crate::grammar::Grammar;
use crate::normalize::normalize;

/// Applies a compiled grammar to one input.
#[derive(Debug)]
pub struct Parser<'a> {
    input: &'a str,
    grammar: &'a Grammar,
    compiled: &'a CompiledRules,
}

impl<'a> Parser<'a> {
    /// `compiled` must have been built from `grammar`.
    pub fn new(input: &'a str, grammar: &'a Grammar, compiled: &'a CompiledRules) -> Self {
        Parser { input, grammar, compiled }
    }

    pub fn run_with_metrics(self, context: &Context, calendar: &dyn Calendar) -> Result<RunResult, CalendarError> {
        let total_start = Instant::now();

        let normalize_start = Instant::now();
        let normalized = normalize(self.input, self.grammar);
        let normalize_time = normalize_start.elapsed();

        let match_start = Instant::now();
        let accumulation = accumulate(&normalized, self.grammar, self.compiled);
        let matching = MatchMetrics {
            duration: match_start.elapsed(),
            rules_considered: self.compiled.len(),
            rules_matched: accumulation.matches.len(),
        };

        let resolve_start = Instant::now();
        let value = resolve(&accumulation.delta, context.reference_time, calendar)?;
        let resolve_time = resolve_start.elapsed();

        debug!(input = self.input, %value, matched = accumulation.matches.len(), "parsed");

        Ok(RunResult {
            value,
            normalized,
            delta: accumulation.delta,
            matches: accumulation.matches,
            metrics: RunMetrics {
                total: total_start.elapsed(),
                normalize: normalize_time,
                matching,
                resolve: resolve_time,
            },
        })
    }

    pub fn run(self, context: &Context, calendar: &dyn Calendar) -> Result<NaiveDateTime, CalendarError> {
        self.run_with_metrics(context, calendar).map(|run| run.value)
    }
}
