use crate::api::DateTimeParser;
use crate::calendar::{GregorianCalendar, Overflow};
use crate::grammars::{by_language, english};
use chrono::{NaiveDate, NaiveDateTime};

fn reference() -> NaiveDateTime {
    // A Tuesday.
    NaiveDate::from_ymd_opt(2013, 2, 12).unwrap().and_hms_opt(4, 30, 0).unwrap()
}

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
}

#[test]
fn english_grammar_loads() {
    let g = english();
    assert_eq!(g.language(), "en");
    assert!(!g.case_sensitive());
    assert!(g.vocabulary_by_name("number").is_some());
    assert!(g.vocabulary_by_name("clock").is_some());
}

#[test]
fn english_examples() {
    let cases: Vec<(NaiveDateTime, &str)> = vec![
        // Nothing to do.
        (reference(), ""),
        (reference(), "today"),
        (reference(), "now"),
        (reference(), "whenever you like"),
        // Named days.
        (at(2013, 2, 13, 4, 30, 0), "tomorrow"),
        (at(2013, 2, 13, 4, 30, 0), "Tomorrow!"),
        (at(2013, 2, 11, 4, 30, 0), "yesterday"),
        (at(2013, 2, 14, 4, 30, 0), "the day after tomorrow"),
        (at(2013, 2, 10, 4, 30, 0), "day before yesterday"),
        // Offsets.
        (at(2013, 2, 15, 4, 30, 0), "in 3 days"),
        (at(2013, 2, 15, 4, 30, 0), "in three days"),
        (at(2013, 2, 15, 4, 30, 0), "3 days from now"),
        (at(2013, 2, 9, 4, 30, 0), "3 days ago"),
        (at(2013, 2, 26, 4, 30, 0), "in 2 weeks"),
        (at(2013, 2, 26, 4, 30, 0), "in a fortnight"),
        (at(2013, 2, 12, 6, 30, 0), "in 2 hours"),
        (at(2013, 2, 12, 5, 0, 0), "in half an hour"),
        (at(2013, 2, 12, 4, 45, 0), "in fifteen minutes"),
        (at(2013, 2, 12, 4, 30, 30), "in 30 seconds"),
        (at(2013, 3, 12, 4, 30, 0), "in 1 month"),
        (at(2014, 2, 12, 4, 30, 0), "next year"),
        (at(2023, 2, 12, 4, 30, 0), "in a decade"),
        (at(1913, 2, 12, 4, 30, 0), "a century ago"),
        (at(2013, 2, 5, 4, 30, 0), "last week"),
        (at(2013, 2, 5, 4, 30, 0), "a week ago"),
        (at(2013, 3, 12, 4, 30, 0), "next month"),
        // Opposite offsets cancel out.
        (reference(), "in 3 days 3 days ago"),
        // Weekdays.
        (at(2013, 2, 18, 4, 30, 0), "next monday"),
        (at(2013, 2, 15, 4, 30, 0), "friday"),
        (at(2013, 2, 15, 4, 30, 0), "on fri"),
        (at(2013, 2, 8, 4, 30, 0), "last friday"),
        (at(2013, 2, 11, 4, 30, 0), "monday"),
        // Time of day.
        (at(2013, 2, 12, 17, 0, 0), "at 5pm"),
        (at(2013, 2, 12, 17, 0, 0), "5 pm"),
        (at(2013, 2, 12, 0, 0, 0), "12am"),
        (at(2013, 2, 12, 12, 0, 0), "12pm"),
        (at(2013, 2, 12, 17, 45, 0), "at 17:45"),
        (at(2013, 2, 12, 8, 5, 9), "08:05:09"),
        (at(2013, 2, 12, 12, 0, 0), "noon"),
        (at(2013, 2, 12, 0, 0, 0), "at midnight"),
        (at(2013, 2, 12, 9, 0, 0), "at 9"),
        // Combined.
        (at(2013, 2, 13, 17, 0, 0), "tomorrow at 5pm"),
        (at(2013, 2, 19, 9, 30, 0), "next tuesday at 9:30"),
        (at(2013, 2, 15, 7, 30, 0), "in 3 days at 7:30"),
        // Calendar dates.
        (at(2013, 3, 15, 4, 30, 0), "march 15"),
        (at(2013, 3, 15, 4, 30, 0), "March 15th"),
        (at(2013, 3, 15, 4, 30, 0), "15th of march"),
        (at(2014, 3, 15, 4, 30, 0), "15th of march 2014"),
        (at(2014, 3, 15, 4, 30, 0), "march 15, 2014"),
        (at(2013, 12, 1, 4, 30, 0), "1 dec"),
        (at(2024, 3, 15, 4, 30, 0), "2024-03-15"),
        (at(2013, 3, 12, 4, 30, 0), "in march"),
        (at(2024, 1, 8, 4, 30, 0), "week 2 of 2024"),
    ];

    let parser = DateTimeParser::english();
    for (expected, input) in cases {
        let got = parser.parse(input, reference());
        assert_eq!(got, Ok(expected), "input '{input}'");
    }
}

#[test]
fn impossible_dates_follow_the_overflow_policy() {
    let parser = DateTimeParser::english();
    assert_eq!(parser.parse("february 31", reference()), Ok(at(2013, 2, 28, 4, 30, 0)));

    let strict = GregorianCalendar::new(Overflow::Reject);
    assert!(parser.parse_with_calendar("february 31", reference(), &strict).is_err());
    assert!(parser.parse_with_calendar("at 25:00", reference(), &strict).is_err());
}

#[test]
fn rule_order_is_stable() {
    // Same input, same grammar: same matches in the same order.
    let parser = DateTimeParser::english();
    let ctx = crate::Context { reference_time: reference() };
    let opts = crate::Options::default();
    let first = parser.parse_verbose_with("next friday at noon", &ctx, &opts).unwrap();
    let second = parser.parse_verbose_with("next friday at noon", &ctx, &opts).unwrap();

    let rules = |r: &crate::ParseResultVerbose| r.details.matches.iter().map(|m| m.rule).collect::<Vec<_>>();
    assert_eq!(rules(&first), rules(&second));
    assert_eq!(first.value, at(2013, 2, 22, 12, 0, 0));
}

#[test]
fn bundled_grammars_are_found_by_language() {
    assert!(std::ptr::eq(by_language("en").unwrap(), english()));
    assert!(std::ptr::eq(by_language("EN-us").unwrap(), english()));
    assert!(std::ptr::eq(by_language("en_GB").unwrap(), english()));
    assert!(by_language("fr").is_none());
    assert!(by_language("").is_none());
}

#[test]
fn match_spans_point_into_the_working_text() {
    let parser = DateTimeParser::english();
    let ctx = crate::Context { reference_time: reference() };
    let out = parser.parse_verbose_with("tomorrow at 5pm", &ctx, &crate::Options::default()).unwrap();
    assert_eq!(out.details.normalized, " tomorrow at 5pm ");

    // Each span starts at the boundary space left behind by earlier excisions.
    for m in &out.details.matches {
        assert_eq!(m.start, 0, "rule {} ('{}')", m.rule, m.text);
    }
}
