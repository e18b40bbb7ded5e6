//! Calendar abstraction used by the resolver.
//!
//! Every date-level mutation the resolver performs goes through [`Calendar`],
//! so calendar-specific rules (month lengths, leap years, ISO weeks) live in
//! one place. [`GregorianCalendar`] is the chrono-backed implementation.

use chrono::{Datelike, Months, NaiveDate, TimeDelta, Weekday};

use crate::error::CalendarError;

/// ISO 8601 week-numbering position of a date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsoWeekDate {
    pub year: i32,
    pub week: u32,
}

/// Date operations required to resolve a delta.
///
/// Weekdays are numbered 1 (Monday) to 7 (Sunday).
pub trait Calendar: Send + Sync {
    fn add_years(&self, date: NaiveDate, years: i64) -> Result<NaiveDate, CalendarError>;
    fn add_months(&self, date: NaiveDate, months: i64) -> Result<NaiveDate, CalendarError>;
    fn add_days(&self, date: NaiveDate, days: i64) -> Result<NaiveDate, CalendarError>;

    fn set_ymd(&self, year: i64, month: i64, day: i64) -> Result<NaiveDate, CalendarError>;
    fn set_iso_week(&self, year: i64, week: i64, weekday: i64) -> Result<NaiveDate, CalendarError>;
    fn set_year_day(&self, year: i64, ordinal: i64) -> Result<NaiveDate, CalendarError>;

    fn year(&self, date: NaiveDate) -> i32;
    fn month(&self, date: NaiveDate) -> u32;
    fn day(&self, date: NaiveDate) -> u32;
    fn iso_week(&self, date: NaiveDate) -> IsoWeekDate;
    fn day_of_week(&self, date: NaiveDate) -> u32;
}

/// What a calendar does with set arguments outside their valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Overflow {
    /// Pull the value to the nearest valid one (February 30 becomes February 28/29).
    #[default]
    Clamp,
    /// Fail with a [`CalendarError`].
    Reject,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GregorianCalendar {
    pub overflow: Overflow,
}

impl GregorianCalendar {
    pub fn new(overflow: Overflow) -> Self {
        GregorianCalendar { overflow }
    }

    fn clamp(&self, value: i64, min: i64, max: i64) -> Option<i64> {
        match self.overflow {
            Overflow::Clamp => Some(value.clamp(min, max)),
            Overflow::Reject => (min..=max).contains(&value).then_some(value),
        }
    }
}

fn to_year(year: i64) -> Result<i32, CalendarError> {
    let year = i32::try_from(year).map_err(|_| CalendarError::OutOfRange { field: "year", value: year })?;
    // Make sure the whole year is representable before anything clamps into it.
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and(NaiveDate::from_ymd_opt(year, 12, 31))
        .map(|_| year)
        .ok_or(CalendarError::OutOfRange { field: "year", value: year as i64 })
}

fn days_in_month(year: i32, month: u32) -> u32 {
    (28..=31).rev().find(|d| NaiveDate::from_ymd_opt(year, month, *d).is_some()).unwrap_or(28)
}

fn days_in_year(year: i32) -> u32 {
    if NaiveDate::from_ymd_opt(year, 2, 29).is_some() { 366 } else { 365 }
}

fn iso_weeks_in_year(year: i32) -> u32 {
    // December 28th always falls in the last ISO week of its year.
    NaiveDate::from_ymd_opt(year, 12, 28).map(|d| d.iso_week().week()).unwrap_or(52)
}

fn weekday_from_number(n: u32) -> Option<Weekday> {
    match n {
        1 => Some(Weekday::Mon),
        2 => Some(Weekday::Tue),
        3 => Some(Weekday::Wed),
        4 => Some(Weekday::Thu),
        5 => Some(Weekday::Fri),
        6 => Some(Weekday::Sat),
        7 => Some(Weekday::Sun),
        _ => None,
    }
}

fn shift_months(date: NaiveDate, months: i64) -> Result<NaiveDate, CalendarError> {
    let magnitude = u32::try_from(months.unsigned_abs()).map_err(|_| CalendarError::Overflow)?;
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(magnitude))
    } else {
        date.checked_sub_months(Months::new(magnitude))
    };
    shifted.ok_or(CalendarError::Overflow)
}

impl Calendar for GregorianCalendar {
    fn add_years(&self, date: NaiveDate, years: i64) -> Result<NaiveDate, CalendarError> {
        shift_months(date, years.checked_mul(12).ok_or(CalendarError::Overflow)?)
    }

    fn add_months(&self, date: NaiveDate, months: i64) -> Result<NaiveDate, CalendarError> {
        shift_months(date, months)
    }

    fn add_days(&self, date: NaiveDate, days: i64) -> Result<NaiveDate, CalendarError> {
        let delta = TimeDelta::try_days(days).ok_or(CalendarError::Overflow)?;
        date.checked_add_signed(delta).ok_or(CalendarError::Overflow)
    }

    fn set_ymd(&self, year: i64, month: i64, day: i64) -> Result<NaiveDate, CalendarError> {
        let invalid = CalendarError::InvalidDate { year, month, day };
        let y = to_year(year)?;
        let m = self.clamp(month, 1, 12).ok_or_else(|| invalid.clone())? as u32;
        let d = self.clamp(day, 1, days_in_month(y, m) as i64).ok_or_else(|| invalid.clone())? as u32;
        NaiveDate::from_ymd_opt(y, m, d).ok_or(invalid)
    }

    fn set_iso_week(&self, year: i64, week: i64, weekday: i64) -> Result<NaiveDate, CalendarError> {
        let invalid = CalendarError::InvalidWeekDate { year, week, weekday };
        let y = to_year(year)?;
        let w = self.clamp(week, 1, iso_weeks_in_year(y) as i64).ok_or_else(|| invalid.clone())? as u32;
        let wd = self.clamp(weekday, 1, 7).and_then(|n| weekday_from_number(n as u32)).ok_or_else(|| invalid.clone())?;
        NaiveDate::from_isoywd_opt(y, w, wd).ok_or(invalid)
    }

    fn set_year_day(&self, year: i64, ordinal: i64) -> Result<NaiveDate, CalendarError> {
        let invalid = CalendarError::InvalidOrdinal { year, ordinal };
        let y = to_year(year)?;
        let o = self.clamp(ordinal, 1, days_in_year(y) as i64).ok_or_else(|| invalid.clone())? as u32;
        NaiveDate::from_yo_opt(y, o).ok_or(invalid)
    }

    fn year(&self, date: NaiveDate) -> i32 {
        date.year()
    }

    fn month(&self, date: NaiveDate) -> u32 {
        date.month()
    }

    fn day(&self, date: NaiveDate) -> u32 {
        date.day()
    }

    fn iso_week(&self, date: NaiveDate) -> IsoWeekDate {
        let week = date.iso_week();
        IsoWeekDate { year: week.year(), week: week.week() }
    }

    fn day_of_week(&self, date: NaiveDate) -> u32 {
        date.weekday().number_from_monday()
    }
}
