use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{
    civil_from_millis, format_decimal, format_year, millis_of, parse_date_fields, Fields,
    SqlTemporal, TemporalKind,
};
use crate::error::{Error, Result};

/// A SQL `DATE` value.
///
/// Holds whole days only: the underlying millisecond value is always
/// midnight UTC. Time-of-day accessors on [`SqlTemporal`] are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SqlDate {
    date: NaiveDate,
}

impl SqlDate {
    /// Build from year, month (1-12) and day of month.
    ///
    /// Lenient: a day past the end of the month rolls into the next month.
    pub fn new(year: i32, month: u32, day: u32) -> Result<Self> {
        let dt = Fields::date(i64::from(year), i64::from(month), i64::from(day)).normalize()?;
        Ok(Self { date: dt.date() })
    }

    /// Build from milliseconds since the epoch, truncated to midnight.
    pub fn from_millis(millis: i64) -> Result<Self> {
        Ok(Self {
            date: civil_from_millis(millis)?.date(),
        })
    }

    /// Parse `yyyy-[m]m-[d]d`.
    ///
    /// # Examples
    ///
    /// ```
    /// use rdbc_core::temporal::SqlDate;
    ///
    /// let date = SqlDate::parse("2023-3-5").unwrap();
    /// assert_eq!(date.to_string(), "2023-03-05");
    ///
    /// assert!(SqlDate::parse("bad-input").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let (year, month, day) = parse_date_fields(s).ok_or_else(|| {
            Error::invalid_argument(format!("invalid date '{s}', expected yyyy-[m]m-[d]d"))
        })?;
        let dt = Fields::date(year, month, day).normalize()?;
        Ok(Self { date: dt.date() })
    }

    /// Replace the underlying millisecond value, truncated to midnight.
    pub fn set_time(&mut self, millis: i64) -> Result<()> {
        *self = Self::from_millis(millis)?;
        Ok(())
    }

    /// Build from a chrono date
    pub fn from_naive_date(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Convert to a chrono date
    pub fn to_naive_date(&self) -> NaiveDate {
        self.date
    }

    fn midnight(&self) -> NaiveDateTime {
        self.date.and_time(chrono::NaiveTime::MIN)
    }

    fn with_fields(&mut self, f: impl FnOnce(&mut Fields)) -> Result<()> {
        let mut fields = Fields::of(&self.midnight());
        f(&mut fields);
        self.date = fields.normalize()?.date();
        Ok(())
    }
}

fn no_time_of_day(accessor: &str) -> Error {
    Error::unsupported(format!("{accessor} is not available on a DATE value"))
}

impl SqlTemporal for SqlDate {
    fn kind(&self) -> TemporalKind {
        TemporalKind::Date
    }

    fn time(&self) -> i64 {
        millis_of(&self.midnight())
    }

    fn year(&self) -> Result<i32> {
        Ok(self.date.year())
    }

    fn month(&self) -> Result<u32> {
        Ok(self.date.month())
    }

    fn day(&self) -> Result<u32> {
        Ok(self.date.day())
    }

    fn hours(&self) -> Result<u32> {
        Err(no_time_of_day("hours"))
    }

    fn minutes(&self) -> Result<u32> {
        Err(no_time_of_day("minutes"))
    }

    fn seconds(&self) -> Result<u32> {
        Err(no_time_of_day("seconds"))
    }

    fn set_year(&mut self, year: i32) -> Result<()> {
        self.with_fields(|f| f.year = i64::from(year))
    }

    fn set_month(&mut self, month: i32) -> Result<()> {
        self.with_fields(|f| f.month = i64::from(month))
    }

    fn set_day(&mut self, day: i32) -> Result<()> {
        self.with_fields(|f| f.day = i64::from(day))
    }

    fn set_hours(&mut self, _hours: i32) -> Result<()> {
        Err(no_time_of_day("set_hours"))
    }

    fn set_minutes(&mut self, _minutes: i32) -> Result<()> {
        Err(no_time_of_day("set_minutes"))
    }

    fn set_seconds(&mut self, _seconds: i32) -> Result<()> {
        Err(no_time_of_day("set_seconds"))
    }

    fn to_instant(&self) -> Result<DateTime<Utc>> {
        Err(Error::unsupported(
            "a DATE value has no time component and cannot be converted to an instant",
        ))
    }
}

impl fmt::Display for SqlDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = String::with_capacity(10);
        format_year(&mut buf, self.date.year());
        buf.push('-');
        format_decimal(&mut buf, i64::from(self.date.month()), 2);
        buf.push('-');
        format_decimal(&mut buf, i64::from(self.date.day()), 2);
        f.write_str(&buf)
    }
}

impl FromStr for SqlDate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<NaiveDate> for SqlDate {
    fn from(date: NaiveDate) -> Self {
        Self::from_naive_date(date)
    }
}

impl From<SqlDate> for NaiveDate {
    fn from(date: SqlDate) -> Self {
        date.to_naive_date()
    }
}

impl Serialize for SqlDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SqlDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
