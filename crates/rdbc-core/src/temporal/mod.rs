//! SQL temporal values for rdbc-core
//!
//! Canonical text encoding and decoding for the three SQL temporal kinds:
//! - [`SqlDate`]: `yyyy-[m]m-[d]d`
//! - [`SqlTime`]: `hh:mm:ss`
//! - [`SqlTimestamp`]: `yyyy-[m]m-[d]d hh:mm:ss[.fffffffff]`
//!
//! All three share the [`SqlTemporal`] accessor surface. Accessors that make
//! no sense for a kind (the hour of a `DATE`, the year of a `TIME`) are still
//! present on the trait but always fail with [`Error::Unsupported`], so code
//! generic over `SqlTemporal` gets an explicit rejection instead of a silently
//! coerced zero.
//!
//! Civil fields are interpreted in UTC. Parsing is lenient in the same way the
//! field constructors are: a day of 31 in a 30-day month rolls into the next
//! month, an hour of 25 rolls into the next day.

mod date;
mod time;
mod timestamp;

pub use date::SqlDate;
pub use time::SqlTime;
pub use timestamp::SqlTimestamp;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};

use crate::error::{Error, Result};

pub(crate) const MILLIS_PER_SECOND: i64 = 1_000;
pub(crate) const NANOS_PER_SECOND: u32 = 1_000_000_000;
pub(crate) const NANOS_PER_MILLI: u32 = 1_000_000;

/// The kind of SQL temporal value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    /// Date without time of day (DATE)
    Date,
    /// Time of day without date (TIME)
    Time,
    /// Date and time with nanosecond precision (TIMESTAMP)
    Timestamp,
}

impl TemporalKind {
    /// SQL type name
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
        }
    }

    /// JDBC escape keyword (`{d '...'}`, `{t '...'}`, `{ts '...'}`)
    pub fn escape_keyword(&self) -> &'static str {
        match self {
            Self::Date => "d",
            Self::Time => "t",
            Self::Timestamp => "ts",
        }
    }
}

impl std::fmt::Display for TemporalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.sql_type())
    }
}

/// Common accessor surface of the SQL temporal values.
///
/// Setters are lenient: out-of-range field values roll over into the
/// neighbouring unit, matching the parsers.
pub trait SqlTemporal {
    /// Which temporal kind this value is
    fn kind(&self) -> TemporalKind;

    /// Milliseconds since the Unix epoch
    fn time(&self) -> i64;

    /// Calendar year
    fn year(&self) -> Result<i32>;

    /// Month of year, 1-12
    fn month(&self) -> Result<u32>;

    /// Day of month, 1-31
    fn day(&self) -> Result<u32>;

    /// Hour of day, 0-23
    fn hours(&self) -> Result<u32>;

    /// Minute of hour, 0-59
    fn minutes(&self) -> Result<u32>;

    /// Second of minute, 0-59
    fn seconds(&self) -> Result<u32>;

    /// Set the calendar year
    fn set_year(&mut self, year: i32) -> Result<()>;

    /// Set the month of year
    fn set_month(&mut self, month: i32) -> Result<()>;

    /// Set the day of month
    fn set_day(&mut self, day: i32) -> Result<()>;

    /// Set the hour of day
    fn set_hours(&mut self, hours: i32) -> Result<()>;

    /// Set the minute of hour
    fn set_minutes(&mut self, minutes: i32) -> Result<()>;

    /// Set the second of minute
    fn set_seconds(&mut self, seconds: i32) -> Result<()>;

    /// Convert to an absolute instant
    fn to_instant(&self) -> Result<DateTime<Utc>>;
}

/// Civil fields of a temporal value, before lenient normalization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Fields {
    pub year: i64,
    pub month: i64,
    pub day: i64,
    pub hour: i64,
    pub minute: i64,
    pub second: i64,
}

impl Fields {
    pub(crate) fn date(year: i64, month: i64, day: i64) -> Self {
        Self {
            year,
            month,
            day,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }

    pub(crate) fn of(dt: &NaiveDateTime) -> Self {
        use chrono::{Datelike, Timelike};
        Self {
            year: i64::from(dt.year()),
            month: i64::from(dt.month()),
            day: i64::from(dt.day()),
            hour: i64::from(dt.hour()),
            minute: i64::from(dt.minute()),
            second: i64::from(dt.second()),
        }
    }

    /// Normalize to a whole-second date-time, rolling over out-of-range fields.
    pub(crate) fn normalize(&self) -> Result<NaiveDateTime> {
        let month0 = self.month - 1;
        let year = self.year + month0.div_euclid(12);
        let month = month0.rem_euclid(12) + 1;

        let first = i32::try_from(year)
            .ok()
            .and_then(|y| NaiveDate::from_ymd_opt(y, month as u32, 1))
            .ok_or_else(|| out_of_range(self))?;

        let offset = self
            .hour
            .checked_mul(3_600)
            .and_then(|h| self.minute.checked_mul(60).and_then(|m| h.checked_add(m)))
            .and_then(|hm| hm.checked_add(self.second))
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| out_of_range(self))?;

        TimeDelta::try_days(self.day - 1)
            .and_then(|days| first.and_hms_opt(0, 0, 0)?.checked_add_signed(days))
            .and_then(|dt| dt.checked_add_signed(offset))
            .ok_or_else(|| out_of_range(self))
    }
}

fn out_of_range(fields: &Fields) -> Error {
    Error::invalid_argument(format!(
        "date-time out of supported range: {}-{}-{} {}:{}:{}",
        fields.year, fields.month, fields.day, fields.hour, fields.minute, fields.second
    ))
}

/// Convert epoch milliseconds to a UTC civil date-time.
pub(crate) fn civil_from_millis(millis: i64) -> Result<NaiveDateTime> {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.naive_utc())
        .ok_or_else(|| {
            Error::invalid_argument(format!("millisecond value {millis} out of supported range"))
        })
}

/// Epoch milliseconds of a UTC civil date-time.
#[inline]
pub(crate) fn millis_of(dt: &NaiveDateTime) -> i64 {
    dt.and_utc().timestamp_millis()
}

/// Parse a decimal integer segment.
///
/// Accepts an optional leading sign followed by one or more ASCII digits.
pub(crate) fn parse_decimal(segment: &str) -> Option<i64> {
    let digits = segment
        .strip_prefix('+')
        .or_else(|| segment.strip_prefix('-'))
        .unwrap_or(segment);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    segment
        .parse::<i32>()
        .ok()
        .map(i64::from)
}

/// Split `yyyy-[m]m-[d]d` into validated year, month and day.
///
/// Only the structure and the month/day ranges are checked; the day is not
/// checked against the length of the month.
pub(crate) fn parse_date_fields(s: &str) -> Option<(i64, i64, i64)> {
    const YEAR_LENGTH: usize = 4;
    const MONTH_LENGTH: usize = 2;
    const DAY_LENGTH: usize = 2;
    const MAX_MONTH: i64 = 12;
    const MAX_DAY: i64 = 31;

    let first_dash = s.find('-')?;
    let second_dash = first_dash + 1 + s[first_dash + 1..].find('-')?;
    let len = s.len();

    if first_dash != YEAR_LENGTH
        || second_dash >= len - 1
        || !(2..=MONTH_LENGTH + 1).contains(&(second_dash - first_dash))
        || !(2..=DAY_LENGTH + 1).contains(&(len - second_dash))
    {
        return None;
    }

    let year = parse_decimal(&s[..first_dash])?;
    let month = parse_decimal(&s[first_dash + 1..second_dash])?;
    let day = parse_decimal(&s[second_dash + 1..])?;

    ((1..=MAX_MONTH).contains(&month) && (1..=MAX_DAY).contains(&day))
        .then_some((year, month, day))
}

/// Append `value` zero-padded to `width` digits.
///
/// Values wider than `width` are written in full; negative values get a
/// leading `-` in front of the padded magnitude.
pub(crate) fn format_decimal(buf: &mut String, value: i64, width: usize) {
    if value < 0 {
        buf.push('-');
    }
    let digits = value.unsigned_abs().to_string();
    for _ in digits.len()..width {
        buf.push('0');
    }
    buf.push_str(&digits);
}

/// Append a year: at least four digits, growing for larger years.
pub(crate) fn format_year(buf: &mut String, year: i32) {
    format_decimal(buf, i64::from(year), 4);
}
