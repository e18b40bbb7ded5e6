//! Matching and resolution engine.
//!
//! The engine is split into a static half, built once per grammar, and a
//! per-parse half:
//!
//! ```text
//! Grammar ── CompiledRules::new ──▶ CompiledRules        (compiler.rs)
//!                                        │
//! input ── normalize ──▶ " in 3 days " ──┤
//!                                        v
//!                               accumulate (accumulate.rs)
//!                                 - every rule, in order, first match only
//!                                 - matched text is cut from the working copy
//!                                        │
//!                                        v
//!                                     Delta              (delta.rs)
//!                                        │
//!                                        v
//!                               resolve (resolve.rs)
//!                                 - Year, Month, Week, Day, then time of day
//!                                 - date steps through a `Calendar`
//!                                        │
//!                                        v
//!                                  NaiveDateTime
//! ```
//!
//! `parser.rs` ties the half-steps together for one input and `metrics.rs`
//! holds the timings it records.
//!
//! ## Debugging
//!
//! Every stage emits `tracing` events. Run the CLI with
//! `RUST_LOG=humandate=trace` to see each applied operation and resolver step.

#[path = "engine/accumulate.rs"]
mod accumulate;
#[path = "engine/compiler.rs"]
mod compiler;
#[path = "engine/delta.rs"]
mod delta;
#[path = "engine/metrics.rs"]
mod metrics;
#[path = "engine/parser.rs"]
mod parser;
#[path = "engine/resolve.rs"]
mod resolve;

pub use accumulate::{Accumulation, RuleMatch, accumulate};
pub use compiler::{ANY_PERIOD, CompiledRule, CompiledRules, RuleId};
pub use delta::{Delta, Field, PeriodMask};
pub use metrics::{MatchMetrics, RunMetrics, RunResult};
pub use parser::Parser;
pub use resolve::resolve;
