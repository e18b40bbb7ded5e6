use crate::calendar::{Calendar, GregorianCalendar, Overflow};
use crate::engine::{self, CompiledRules, RuleMatch, RunResult};
use crate::error::{CalendarError, GrammarError};
use crate::grammar::{Grammar, PeriodKind};
use crate::grammars;
use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};
use once_cell::sync::Lazy;
use std::time::Duration;

static ENGLISH: Lazy<DateTimeParser> = Lazy::new(|| {
    DateTimeParser::new(grammars::english().clone()).expect("bundled English grammar must compile")
});

/// Parsing context.
///
/// This holds the environment needed to resolve relative expressions (like "tomorrow").
#[derive(Debug, Clone)]
pub struct Context {
    /// Reference datetime used to resolve relative expressions.
    pub reference_time: NaiveDateTime,
}

impl Default for Context {
    fn default() -> Self {
        if cfg!(test) {
            let date = NaiveDate::from_ymd_opt(2013, 2, 12).unwrap_or_default();
            Self { reference_time: NaiveDateTime::new(date, NaiveTime::MIN) }
        } else {
            Self { reference_time: Local::now().naive_local() }
        }
    }
}

/// Options that affect resolution.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// How out-of-range dates such as "february 30" are treated.
    pub overflow: Overflow,
}

impl Options {
    fn calendar(&self) -> GregorianCalendar {
        GregorianCalendar::new(self.overflow)
    }
}

/// Result from [`parse`] and [`parse_with`].
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// The parsed input text.
    pub text: String,
    /// The resolved instant; the reference itself when nothing matched.
    pub value: NaiveDateTime,
    /// Total elapsed time spent normalizing, matching and resolving.
    pub elapsed: Duration,
}

/// A compact summary of one applied rule.
#[derive(Debug, Clone)]
pub struct MatchSummary {
    /// Index of the compiled rule.
    pub rule: usize,
    /// Pattern of the declaration it was compiled from.
    pub pattern: String,
    /// Period the rule was expanded for, e.g. `"year x10"`.
    pub period: Option<String>,
    /// Matched text, without boundary spaces.
    pub text: String,
    /// Byte span in the working text the rule ran against: the normalized
    /// text with the matches of earlier rules already cut out.
    pub start: usize,
    pub end: usize,
}

/// One written delta field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSummary {
    pub kind: PeriodKind,
    pub value: i64,
    pub relative: bool,
}

/// Additional details returned by [`parse_verbose_with`].
///
/// Meant for debugging grammars: what the input looked like after
/// normalization, which rules fired, and what they wrote.
#[derive(Debug, Clone)]
pub struct ParseDetails {
    pub normalized: String,
    pub matches: Vec<MatchSummary>,
    /// Written fields only, finest first.
    pub fields: Vec<FieldSummary>,
    pub total: Duration,
    pub normalize: Duration,
    /// Time spent applying rules.
    pub matching: Duration,
    pub rules_considered: usize,
    pub resolve: Duration,
}

/// Result from [`parse_verbose_with`].
#[derive(Debug, Clone)]
pub struct ParseResultVerbose {
    pub text: String,
    pub value: NaiveDateTime,
    pub elapsed: Duration,
    pub details: ParseDetails,
}

/// A grammar compiled and ready to parse.
///
/// Building one compiles every rule of the grammar, so build it once and
/// reuse it; it is `Send + Sync`.
///
/// # Example
/// ```
/// use chrono::NaiveDate;
/// use humandate::DateTimeParser;
///
/// let reference = NaiveDate::from_ymd_opt(2013, 2, 12).unwrap().and_hms_opt(4, 30, 0).unwrap();
/// let value = DateTimeParser::english().parse("in 3 days", reference).unwrap();
/// assert_eq!(value, NaiveDate::from_ymd_opt(2013, 2, 15).unwrap().and_hms_opt(4, 30, 0).unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct DateTimeParser {
    grammar: Grammar,
    compiled: CompiledRules,
}

impl DateTimeParser {
    pub fn new(grammar: Grammar) -> Result<Self, GrammarError> {
        let compiled = CompiledRules::new(&grammar)?;
        Ok(DateTimeParser { grammar, compiled })
    }

    /// Parser for the bundled English grammar, compiled on first use.
    pub fn english() -> &'static DateTimeParser {
        &ENGLISH
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn compiled(&self) -> &CompiledRules {
        &self.compiled
    }

    /// Resolve `text` against `reference` with the Gregorian calendar.
    pub fn parse(&self, text: &str, reference: NaiveDateTime) -> Result<NaiveDateTime, CalendarError> {
        self.parse_with_calendar(text, reference, &GregorianCalendar::default())
    }

    pub fn parse_with_calendar(
        &self,
        text: &str,
        reference: NaiveDateTime,
        calendar: &dyn Calendar,
    ) -> Result<NaiveDateTime, CalendarError> {
        let context = Context { reference_time: reference };
        engine::Parser::new(text, &self.grammar, &self.compiled).run(&context, calendar)
    }

    pub fn parse_with(&self, text: &str, context: &Context, options: &Options) -> Result<ParseResult, CalendarError> {
        let run = self.run(text, context, options)?;
        Ok(ParseResult { text: text.to_string(), value: run.value, elapsed: run.metrics.total })
    }

    /// Like [`parse_with`](Self::parse_with), plus the intermediate state of the run.
    pub fn parse_verbose_with(
        &self,
        text: &str,
        context: &Context,
        options: &Options,
    ) -> Result<ParseResultVerbose, CalendarError> {
        let run = self.run(text, context, options)?;

        let matches = run.matches.iter().map(|m| self.summarize(m)).collect();
        let fields = run
            .delta
            .iter()
            .filter(|(_, field)| field.set)
            .map(|(kind, field)| FieldSummary { kind, value: field.value, relative: field.relative })
            .collect();

        let details = ParseDetails {
            normalized: run.normalized,
            matches,
            fields,
            total: run.metrics.total,
            normalize: run.metrics.normalize,
            matching: run.metrics.matching.duration,
            rules_considered: run.metrics.matching.rules_considered,
            resolve: run.metrics.resolve,
        };

        Ok(ParseResultVerbose { text: text.to_string(), value: run.value, elapsed: details.total, details })
    }

    fn run(&self, text: &str, context: &Context, options: &Options) -> Result<RunResult, CalendarError> {
        engine::Parser::new(text, &self.grammar, &self.compiled).run_with_metrics(context, &options.calendar())
    }

    fn summarize(&self, m: &RuleMatch) -> MatchSummary {
        let period = m.period.map(|id| {
            let period = self.grammar.period(id);
            if period.multiplier == 1 {
                period.kind.to_string()
            } else {
                format!("{} x{}", period.kind, period.multiplier)
            }
        });

        MatchSummary {
            rule: m.rule,
            pattern: self.grammar.rules()[m.decl].pattern.clone(),
            period,
            text: m.text.trim().to_string(),
            start: m.range.start,
            end: m.range.end,
        }
    }
}

/// Parse `text` with the English grammar and a default [`Context`].
///
/// # Example
/// ```
/// let out = humandate::parse("tomorrow").unwrap();
/// assert!(out.value > chrono::Local::now().naive_local());
/// ```
pub fn parse(text: &str) -> Result<ParseResult, CalendarError> {
    parse_with(text, &Context::default(), &Options::default())
}

/// Parse `text` with the English grammar and the provided `context`/`options`.
///
/// Use this when you want deterministic parsing by supplying a reference time.
pub fn parse_with(text: &str, context: &Context, options: &Options) -> Result<ParseResult, CalendarError> {
    DateTimeParser::english().parse_with(text, context, options)
}

/// Parse `text` with the English grammar and return extra debug details.
pub fn parse_verbose_with(
    text: &str,
    context: &Context,
    options: &Options,
) -> Result<ParseResultVerbose, CalendarError> {
    DateTimeParser::english().parse_verbose_with(text, context, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{Operation, RuleDecl, ValueSource, Vocabulary};
    use proptest::prelude::*;

    fn reference_context() -> Context {
        let date = NaiveDate::from_ymd_opt(2013, 2, 12).unwrap();
        let time = NaiveTime::from_hms_opt(4, 30, 0).unwrap();
        Context { reference_time: NaiveDateTime::new(date, time) }
    }

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    #[test]
    fn default_context_is_fixed_under_test() {
        assert_eq!(Context::default().reference_time, at(2013, 2, 12, 0, 0, 0));
    }

    #[test]
    fn parse_with_returns_value() {
        let ctx = reference_context();
        let res = parse_with("tomorrow", &ctx, &Options::default()).unwrap();

        assert_eq!(res.text, "tomorrow");
        assert_eq!(res.value, at(2013, 2, 13, 4, 30, 0));
        assert!(res.elapsed >= Duration::ZERO);
    }

    #[test]
    fn parse_uses_default_context() {
        assert_eq!(parse("today").unwrap().value, at(2013, 2, 12, 0, 0, 0));
    }

    #[test]
    fn parse_verbose_includes_matches_and_fields() {
        let ctx = reference_context();
        let res = parse_verbose_with("Tomorrow at 5pm", &ctx, &Options::default()).unwrap();

        assert_eq!(res.value, at(2013, 2, 13, 17, 0, 0));
        assert_eq!(res.elapsed, res.details.total);
        assert_eq!(res.details.normalized, " tomorrow at 5pm ");

        let texts: Vec<&str> = res.details.matches.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["tomorrow", "at 5pm"]);
        assert_eq!(res.details.matches[0].period.as_deref(), Some("day"));

        assert_eq!(
            res.details.fields,
            vec![
                FieldSummary { kind: PeriodKind::Second, value: 0, relative: false },
                FieldSummary { kind: PeriodKind::Minute, value: 0, relative: false },
                FieldSummary { kind: PeriodKind::Hour, value: 17, relative: false },
                FieldSummary { kind: PeriodKind::Day, value: 1, relative: true },
            ]
        );
        assert!(res.details.rules_considered > res.details.matches.len());
    }

    #[test]
    fn multiplied_periods_are_labelled() {
        let res = parse_verbose_with("in a decade", &reference_context(), &Options::default()).unwrap();
        assert_eq!(res.details.matches[0].period.as_deref(), Some("year x10"));
        assert_eq!(res.value, at(2023, 2, 12, 4, 30, 0));
    }

    #[test]
    fn strict_overflow_rejects_impossible_dates() {
        let ctx = reference_context();
        let lenient = parse_with("february 30", &ctx, &Options::default()).unwrap();
        assert_eq!(lenient.value, at(2013, 2, 28, 4, 30, 0));

        let strict = Options { overflow: Overflow::Reject };
        let err = parse_with("february 30", &ctx, &strict).unwrap_err();
        assert_eq!(err, CalendarError::InvalidDate { year: 2013, month: 2, day: 30 });
    }

    #[test]
    fn custom_grammar() {
        let mut b = Grammar::builder("xx");
        let day = b.period(PeriodKind::Day, 1, "dias?");
        b.vocabulary(Vocabulary::new("number", [("dos", 2)]));
        b.rule(RuleDecl::new("en $number$ %period%").op(Operation::add(ValueSource::Capture(1))));
        b.rule(RuleDecl::new("manana").bound_to(day).op(Operation::add(ValueSource::Literal(1))));
        let parser = DateTimeParser::new(b.build().unwrap()).unwrap();

        let reference = reference_context().reference_time;
        assert_eq!(parser.parse("en dos dias", reference).unwrap(), at(2013, 2, 14, 4, 30, 0));
        assert_eq!(parser.parse("manana", reference).unwrap(), at(2013, 2, 13, 4, 30, 0));
        assert_eq!(parser.parse("in 2 days", reference).unwrap(), reference);
        assert_eq!(parser.grammar().language(), "xx");
        assert_eq!(parser.compiled().len(), 2);
    }

    #[test]
    fn invalid_grammar_fails_to_compile() {
        let mut b = Grammar::builder("xx");
        b.rule(RuleDecl::new("in $number$ days").op(Operation::add(ValueSource::Capture(1))));
        let err = DateTimeParser::new(b.build().unwrap()).unwrap_err();
        assert!(matches!(err, GrammarError::UnknownVocabulary(name) if name == "number"));
    }

    #[test]
    fn parser_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DateTimeParser>();
        assert_send_sync::<Grammar>();
    }

    fn reference_instant() -> impl Strategy<Value = NaiveDateTime> {
        (1900i32..2100, 1u32..=365, 0u32..86_400).prop_map(|(year, ordinal, secs)| {
            let date = NaiveDate::from_yo_opt(year, ordinal).unwrap();
            date.and_time(NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap())
        })
    }

    proptest! {
        #[test]
        fn empty_input_is_identity(reference in reference_instant(), blank in "[ ,;!?\t]{0,6}") {
            let parser = DateTimeParser::english();
            prop_assert_eq!(parser.parse(&blank, reference).unwrap(), reference);
        }

        #[test]
        fn opposite_offsets_cancel(reference in reference_instant(), n in 1u32..60) {
            let text = format!("in {n} days {n} days ago");
            prop_assert_eq!(DateTimeParser::english().parse(&text, reference).unwrap(), reference);
        }
    }
}
