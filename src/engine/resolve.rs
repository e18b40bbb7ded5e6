//! Delta resolution.
//!
//! Turns an accumulated [`Delta`] into a concrete instant by applying its
//! fields to a reference, one at a time, in a fixed precedence order:
//!
//! ```text
//! Year ─▶ Month ─▶ Week ─▶ Day ─▶ Hour ─▶ Minute ─▶ Second
//! ```
//!
//! Date-level steps go through a [`Calendar`]; time-of-day steps are plain
//! instant arithmetic. Each step sees the date produced by the previous one,
//! so "march 15" against 2024-01-10 first moves to 2024-03-10 and then to
//! 2024-03-15.
//!
//! Absolute week and day fields are interpreted according to which coarser
//! fields were also set:
//!
//! ```text
//! week set, year set        -> ISO week of that year, weekday kept
//! week set, year not set    -> week counted from the first of the month
//! day set,  month set       -> day of month
//! day set,  week set        -> weekday within the ISO week
//! day set,  year not set    -> weekday within the current ISO week
//! day set,  only year set   -> day of year
//! ```

use chrono::{NaiveDate, NaiveDateTime, TimeDelta, Timelike};
use tracing::trace;

use super::delta::{Delta, Field};
use crate::calendar::Calendar;
use crate::error::CalendarError;
use crate::grammar::PeriodKind;

pub fn resolve(
    delta: &Delta,
    reference: NaiveDateTime,
    calendar: &dyn Calendar,
) -> Result<NaiveDateTime, CalendarError> {
    let time = reference.time();
    let mut date = reference.date();

    date = resolve_year(delta[PeriodKind::Year], date, calendar)?;
    date = resolve_month(delta[PeriodKind::Month], date, calendar)?;
    date = resolve_week(delta, date, calendar)?;
    date = resolve_day(delta, date, calendar)?;

    let mut instant = date.and_time(time);
    instant = resolve_time(delta[PeriodKind::Hour], instant, "hour", 3600)?;
    instant = resolve_time(delta[PeriodKind::Minute], instant, "minute", 60)?;
    instant = resolve_time(delta[PeriodKind::Second], instant, "second", 1)?;

    Ok(instant)
}

fn resolve_year(field: Field, date: NaiveDate, cal: &dyn Calendar) -> Result<NaiveDate, CalendarError> {
    if !field.set {
        return Ok(date);
    }
    trace!(value = field.value, relative = field.relative, "resolve year");
    if field.relative {
        cal.add_years(date, field.value)
    } else {
        cal.set_ymd(field.value, cal.month(date).into(), cal.day(date).into())
    }
}

fn resolve_month(field: Field, date: NaiveDate, cal: &dyn Calendar) -> Result<NaiveDate, CalendarError> {
    if !field.set {
        return Ok(date);
    }
    trace!(value = field.value, relative = field.relative, "resolve month");
    if field.relative {
        cal.add_months(date, field.value)
    } else {
        cal.set_ymd(cal.year(date).into(), field.value, cal.day(date).into())
    }
}

fn resolve_week(delta: &Delta, date: NaiveDate, cal: &dyn Calendar) -> Result<NaiveDate, CalendarError> {
    let field = delta[PeriodKind::Week];
    if !field.set {
        return Ok(date);
    }
    trace!(value = field.value, relative = field.relative, "resolve week");
    if field.relative {
        let days = field.value.checked_mul(7).ok_or(CalendarError::Overflow)?;
        return cal.add_days(date, days);
    }
    if delta[PeriodKind::Year].set {
        return cal.set_iso_week(cal.year(date).into(), field.value, cal.day_of_week(date).into());
    }

    // Week of month: offset from the ISO week holding the first of the month,
    // landing on its Monday.
    let first = cal.set_ymd(cal.year(date).into(), cal.month(date).into(), 1)?;
    let week = i64::from(cal.iso_week(first).week).saturating_add(field.value);
    cal.set_iso_week(cal.year(first).into(), week, 1)
}

fn resolve_day(delta: &Delta, date: NaiveDate, cal: &dyn Calendar) -> Result<NaiveDate, CalendarError> {
    let field = delta[PeriodKind::Day];
    if !field.set {
        return Ok(date);
    }
    trace!(value = field.value, relative = field.relative, "resolve day");
    if field.relative {
        cal.add_days(date, field.value)
    } else if delta[PeriodKind::Month].set {
        cal.set_ymd(cal.year(date).into(), cal.month(date).into(), field.value)
    } else if delta[PeriodKind::Week].set || !delta[PeriodKind::Year].set {
        let week = cal.iso_week(date);
        cal.set_iso_week(week.year.into(), week.week.into(), field.value)
    } else {
        cal.set_year_day(cal.year(date).into(), field.value)
    }
}

fn resolve_time(
    field: Field,
    instant: NaiveDateTime,
    name: &'static str,
    seconds_per_unit: i64,
) -> Result<NaiveDateTime, CalendarError> {
    if !field.set {
        return Ok(instant);
    }
    trace!(field = name, value = field.value, relative = field.relative, "resolve time");

    if field.relative {
        let delta = field
            .value
            .checked_mul(seconds_per_unit)
            .and_then(TimeDelta::try_seconds)
            .ok_or(CalendarError::Overflow)?;
        return instant.checked_add_signed(delta).ok_or(CalendarError::Overflow);
    }

    let out_of_range = CalendarError::OutOfRange { field: name, value: field.value };
    let component = u32::try_from(field.value).map_err(|_| out_of_range.clone())?;
    let updated = match name {
        "hour" => instant.with_hour(component),
        "minute" => instant.with_minute(component),
        _ => instant.with_second(component),
    };
    updated.ok_or(out_of_range)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{GregorianCalendar, Overflow};
    use crate::grammar::OpKind;

    fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    fn delta(ops: &[(PeriodKind, OpKind, i64)]) -> Delta {
        let mut delta = Delta::new();
        for (kind, op, value) in ops {
            delta[*kind].apply(*op, *value);
        }
        delta
    }

    fn run(ops: &[(PeriodKind, OpKind, i64)], reference: NaiveDateTime) -> Result<NaiveDateTime, CalendarError> {
        resolve(&delta(ops), reference, &GregorianCalendar::default())
    }

    use OpKind::{Add, Set, Subtract};
    use PeriodKind::*;

    #[test]
    fn empty_delta_is_identity() {
        let reference = at(2024, 2, 29, 23, 59, 59);
        assert_eq!(run(&[], reference).unwrap(), reference);
    }

    #[test]
    fn zero_relative_fields_change_nothing() {
        let reference = at(2024, 1, 31, 10, 0, 0);
        assert_eq!(run(&[(Day, Add, 0), (Month, Add, 0), (Hour, Subtract, 0)], reference).unwrap(), reference);
    }

    #[test]
    fn month_is_applied_before_day() {
        let reference = at(2024, 1, 10, 8, 0, 0);
        assert_eq!(run(&[(Month, Set, 3), (Day, Set, 15)], reference).unwrap(), at(2024, 3, 15, 8, 0, 0));
    }

    #[test]
    fn absolute_year_keeps_month_and_day() {
        let reference = at(2013, 2, 12, 4, 30, 0);
        assert_eq!(run(&[(Year, Set, 2020)], reference).unwrap(), at(2020, 2, 12, 4, 30, 0));
    }

    #[test]
    fn relative_months_clamp_to_month_end() {
        let reference = at(2024, 1, 31, 0, 0, 0);
        assert_eq!(run(&[(Month, Add, 1)], reference).unwrap(), at(2024, 2, 29, 0, 0, 0));
    }

    #[test]
    fn iso_week_with_year_keeps_weekday() {
        // 2013-02-12 is a Tuesday; in 2024 that date is a Monday.
        let reference = at(2013, 2, 12, 4, 30, 0);
        assert_eq!(run(&[(Year, Set, 2024), (Week, Set, 2)], reference).unwrap(), at(2024, 1, 8, 4, 30, 0));

        let reference = at(2024, 5, 16, 0, 0, 0);
        assert_eq!(run(&[(Year, Set, 2024), (Week, Set, 10)], reference).unwrap(), at(2024, 3, 7, 0, 0, 0));
    }

    #[test]
    fn day_after_week_and_year_is_a_weekday() {
        // Week 10 of 2024 runs from Monday 2024-03-04; day 5 is its Friday, not January 5th.
        let reference = at(2013, 2, 12, 0, 0, 0);
        let ops = [(Year, Set, 2024), (Week, Set, 10), (Day, Set, 5)];
        assert_eq!(run(&ops, reference).unwrap(), at(2024, 3, 8, 0, 0, 0));
    }

    #[test]
    fn day_after_week_of_month_is_a_weekday() {
        // 2013-02-01 is in ISO week 5, so week 2 of february starts Monday 2013-02-11.
        let reference = at(2013, 2, 12, 0, 0, 0);
        assert_eq!(run(&[(Week, Set, 2), (Day, Set, 5)], reference).unwrap(), at(2013, 2, 15, 0, 0, 0));
    }

    #[test]
    fn relative_weeks_are_seven_days() {
        let reference = at(2013, 2, 12, 0, 0, 0);
        assert_eq!(run(&[(Week, Add, 2)], reference).unwrap(), at(2013, 2, 26, 0, 0, 0));
        assert_eq!(run(&[(Week, Subtract, 1)], reference).unwrap(), at(2013, 2, 5, 0, 0, 0));
    }

    #[test]
    fn week_of_month_counts_from_first_of_month() {
        // 2024-05-01 is in ISO week 18; week 18 + 2 starts on Monday 2024-05-13.
        let reference = at(2024, 5, 20, 9, 0, 0);
        assert_eq!(run(&[(Week, Set, 2)], reference).unwrap(), at(2024, 5, 13, 9, 0, 0));
    }

    #[test]
    fn week_of_month_uses_calendar_year_of_the_first() {
        // 2021-01-01 belongs to ISO week 53 of 2020; the week number is applied to 2021.
        let reference = at(2021, 1, 20, 0, 0, 0);
        let clamped = run(&[(Week, Set, 1)], reference).unwrap();
        assert_eq!(clamped, at(2021, 12, 27, 0, 0, 0));
    }

    #[test]
    fn absolute_day_without_month_is_a_weekday() {
        // Tuesday 2013-02-12; day 5 of the same ISO week is Friday.
        let reference = at(2013, 2, 12, 4, 30, 0);
        assert_eq!(run(&[(Day, Set, 5)], reference).unwrap(), at(2013, 2, 15, 4, 30, 0));
        assert_eq!(run(&[(Week, Add, 1), (Day, Set, 1)], reference).unwrap(), at(2013, 2, 18, 4, 30, 0));
    }

    #[test]
    fn weekday_across_year_boundary_uses_iso_year() {
        // Monday 2024-12-30 is in ISO week 1 of 2025.
        let reference = at(2024, 12, 30, 0, 0, 0);
        assert_eq!(run(&[(Day, Set, 3)], reference).unwrap(), at(2025, 1, 1, 0, 0, 0));
    }

    #[test]
    fn absolute_day_with_only_year_is_day_of_year() {
        let reference = at(2013, 2, 12, 0, 0, 0);
        assert_eq!(run(&[(Year, Set, 2024), (Day, Set, 60)], reference).unwrap(), at(2024, 2, 29, 0, 0, 0));
    }

    #[test]
    fn time_components_are_independent() {
        let reference = at(2013, 2, 12, 4, 30, 15);
        assert_eq!(run(&[(Hour, Set, 14)], reference).unwrap(), at(2013, 2, 12, 14, 30, 15));
        assert_eq!(run(&[(Minute, Set, 0), (Second, Set, 0)], reference).unwrap(), at(2013, 2, 12, 4, 0, 0));
    }

    #[test]
    fn relative_time_crosses_midnight() {
        let reference = at(2013, 2, 12, 23, 30, 0);
        assert_eq!(run(&[(Hour, Add, 2)], reference).unwrap(), at(2013, 2, 13, 1, 30, 0));
        assert_eq!(run(&[(Minute, Subtract, 31)], at(2013, 1, 1, 0, 0, 0)).unwrap(), at(2012, 12, 31, 23, 29, 0));
    }

    #[test]
    fn out_of_range_time_of_day_is_an_error() {
        let reference = at(2013, 2, 12, 0, 0, 0);
        assert_eq!(run(&[(Hour, Set, 25)], reference), Err(CalendarError::OutOfRange { field: "hour", value: 25 }));
        assert_eq!(run(&[(Minute, Set, -1)], reference), Err(CalendarError::OutOfRange { field: "minute", value: -1 }));
    }

    #[test]
    fn overflow_policy_decides_invalid_days() {
        let reference = at(2023, 2, 10, 0, 0, 0);
        let ops = delta(&[(Day, Set, 30), (Month, Set, 2)]);

        let clamped = resolve(&ops, reference, &GregorianCalendar::new(Overflow::Clamp)).unwrap();
        assert_eq!(clamped, at(2023, 2, 28, 0, 0, 0));

        let rejected = resolve(&ops, reference, &GregorianCalendar::new(Overflow::Reject));
        assert_eq!(rejected, Err(CalendarError::InvalidDate { year: 2023, month: 2, day: 30 }));
    }

    #[test]
    fn huge_relative_values_overflow() {
        let reference = at(2013, 2, 12, 0, 0, 0);
        assert_eq!(run(&[(Second, Add, i64::MAX)], reference), Err(CalendarError::Overflow));
        assert_eq!(run(&[(Week, Add, i64::MAX)], reference), Err(CalendarError::Overflow));
    }
}
