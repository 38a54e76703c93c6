//! Fixed UTC-3 civil time.
//!
//! Slots travel through the API as local civil time. The store keeps them
//! shifted back by [`UTC_OFFSET_HOURS`]; every write goes through [`to_store`]
//! and every read through [`from_store`].

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Deserializer};

pub const UTC_OFFSET_HOURS: i64 = 3;

/// Text layout of the `schedules.date` column.
pub const STORE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const INPUT_FORMATS: [&str; 5] = [
    "%d/%m/%Y %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

pub fn to_store(local: NaiveDateTime) -> NaiveDateTime {
    local - Duration::hours(UTC_OFFSET_HOURS)
}

pub fn from_store(stored: NaiveDateTime) -> NaiveDateTime {
    stored + Duration::hours(UTC_OFFSET_HOURS)
}

pub trait Clock: Send + Sync {
    /// Current local civil time.
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc() - Duration::hours(UTC_OFFSET_HOURS)
    }
}

/// Always reports the same instant.
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

pub fn parse_local(raw: &str) -> Result<NaiveDateTime, String> {
    let raw = raw.trim();
    let dt = INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| format!("unrecognised date-time: {raw}"))?;

    if dt.second() != 0 || dt.nanosecond() != 0 {
        return Err(format!("date-time must have minute precision: {raw}"));
    }
    Ok(dt)
}

pub fn deserialize_local<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_local(&raw).map_err(serde::de::Error::custom)
}

/// pt-BR rendering used by the availability listing, e.g. `10/08/2021, 10:30`.
pub fn format_local(dt: &NaiveDateTime) -> String {
    dt.format("%d/%m/%Y, %H:%M").to_string()
}

/// Half-open local interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl LocalRange {
    fn from_dates(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        Some(Self {
            start: start.and_hms_opt(0, 0, 0)?,
            end: end.and_hms_opt(0, 0, 0)?,
        })
    }
}

fn first_of_next_month(year: i32, month: u32) -> Option<NaiveDate> {
    if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
}

pub fn month_range(year: i32, month: u32) -> Option<LocalRange> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    LocalRange::from_dates(first, first_of_next_month(year, month)?)
}

pub fn day_range(year: i32, month: u32, day: u32) -> Option<LocalRange> {
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    LocalRange::from_dates(date, date.succ_opt()?)
}

/// Week 1 is the Monday-based week holding the month's first weekday; later
/// weeks follow in 7-day steps. The range is clipped to the month.
pub fn week_range(year: i32, month: u32, week: u32) -> Option<LocalRange> {
    if !(1..=5).contains(&week) {
        return None;
    }
    let month_start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let month_end = first_of_next_month(year, month)?;

    let first_weekday = month_start
        .iter_days()
        .take(7)
        .find(|d| d.weekday().number_from_monday() <= 5)?;
    let monday =
        first_weekday - Duration::days(first_weekday.weekday().num_days_from_monday() as i64);

    let start = monday + Duration::weeks(week as i64 - 1);
    let end = start + Duration::weeks(1);

    let start = start.max(month_start);
    let end = end.min(month_end).max(start);
    LocalRange::from_dates(start, end)
}

pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let next = first_of_next_month(year, month)?;
    Some(next.pred_opt()?.day())
}
