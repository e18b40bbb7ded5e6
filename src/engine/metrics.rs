//! Engine run metrics.
//!
//! - `Parser::run` for normal operation.
//! - `Parser::run_with_metrics` when the caller also wants timings and the
//!   intermediate state (normalized text, matches, delta) of the run.

use std::time::Duration;

use chrono::NaiveDateTime;

use super::accumulate::RuleMatch;
use super::delta::Delta;

#[derive(Debug, Default, Clone)]
pub struct RunMetrics {
    /// Total elapsed time for [`Parser::run_with_metrics`](super::Parser::run_with_metrics).
    pub total: Duration,
    pub normalize: Duration,
    pub matching: MatchMetrics,
    /// Time spent turning the delta into an instant.
    pub resolve: Duration,
}

/// Timing and counts for the rule matching phase.
#[derive(Debug, Default, Clone)]
pub struct MatchMetrics {
    pub duration: Duration,
    /// Compiled rules tried against the input (every rule is tried once).
    pub rules_considered: usize,
    pub rules_matched: usize,
}

/// Parser output bundled with the state it was derived from.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub value: NaiveDateTime,
    /// Input after word splitting, case folding and padding.
    pub normalized: String,
    pub delta: Delta,
    pub matches: Vec<RuleMatch>,
    pub metrics: RunMetrics,
}
