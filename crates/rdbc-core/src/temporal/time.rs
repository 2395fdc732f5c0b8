use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{
    civil_from_millis, format_decimal, millis_of, parse_decimal, Fields, SqlTemporal,
    TemporalKind,
};
use crate::error::{Error, Result};

/// A SQL `TIME` value.
///
/// Stored as milliseconds since the epoch; only the time of day is meaningful.
/// Date accessors on [`SqlTemporal`] are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SqlTime {
    datetime: NaiveDateTime,
}

impl SqlTime {
    /// Build from hour, minute and second on the epoch day (lenient).
    pub fn new(hour: i32, minute: i32, second: i32) -> Result<Self> {
        let datetime = Fields {
            hour: i64::from(hour),
            minute: i64::from(minute),
            second: i64::from(second),
            ..Fields::date(1970, 1, 1)
        }
        .normalize()?;
        Ok(Self { datetime })
    }

    /// Build from milliseconds since the epoch
    pub fn from_millis(millis: i64) -> Result<Self> {
        Ok(Self {
            datetime: civil_from_millis(millis)?,
        })
    }

    /// Parse `hh:mm:ss`.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::invalid_argument(format!("invalid time '{s}', expected hh:mm:ss"));

        let first_colon = s.find(':').ok_or_else(invalid)?;
        let second_colon = first_colon
            + 1
            + s[first_colon + 1..].find(':').ok_or_else(invalid)?;
        if first_colon == 0 || second_colon >= s.len() - 1 {
            return Err(invalid());
        }

        let hour = parse_decimal(&s[..first_colon]).ok_or_else(invalid)?;
        let minute = parse_decimal(&s[first_colon + 1..second_colon]).ok_or_else(invalid)?;
        let second = parse_decimal(&s[second_colon + 1..]).ok_or_else(invalid)?;

        let datetime = Fields {
            hour,
            minute,
            second,
            ..Fields::date(1970, 1, 1)
        }
        .normalize()?;
        Ok(Self { datetime })
    }

    /// Replace the underlying millisecond value
    pub fn set_time(&mut self, millis: i64) -> Result<()> {
        self.datetime = civil_from_millis(millis)?;
        Ok(())
    }

    /// Build from a chrono time; fractional seconds are dropped.
    pub fn from_naive_time(time: NaiveTime) -> Result<Self> {
        Self::new(time.hour() as i32, time.minute() as i32, time.second() as i32)
    }

    /// Convert to a chrono time
    pub fn to_naive_time(&self) -> NaiveTime {
        self.datetime.time()
    }

    fn with_fields(&mut self, f: impl FnOnce(&mut Fields)) -> Result<()> {
        let mut fields = Fields::of(&self.datetime);
        f(&mut fields);
        self.datetime = fields.normalize()?;
        Ok(())
    }
}

fn no_date(accessor: &str) -> Error {
    Error::unsupported(format!("{accessor} is not available on a TIME value"))
}

impl SqlTemporal for SqlTime {
    fn kind(&self) -> TemporalKind {
        TemporalKind::Time
    }

    fn time(&self) -> i64 {
        millis_of(&self.datetime)
    }

    fn year(&self) -> Result<i32> {
        Err(no_date("year"))
    }

    fn month(&self) -> Result<u32> {
        Err(no_date("month"))
    }

    fn day(&self) -> Result<u32> {
        Err(no_date("day"))
    }

    fn hours(&self) -> Result<u32> {
        Ok(self.datetime.hour())
    }

    fn minutes(&self) -> Result<u32> {
        Ok(self.datetime.minute())
    }

    fn seconds(&self) -> Result<u32> {
        Ok(self.datetime.second())
    }

    fn set_year(&mut self, _year: i32) -> Result<()> {
        Err(no_date("set_year"))
    }

    fn set_month(&mut self, _month: i32) -> Result<()> {
        Err(no_date("set_month"))
    }

    fn set_day(&mut self, _day: i32) -> Result<()> {
        Err(no_date("set_day"))
    }

    fn set_hours(&mut self, hours: i32) -> Result<()> {
        self.with_fields(|f| f.hour = i64::from(hours))
    }

    fn set_minutes(&mut self, minutes: i32) -> Result<()> {
        self.with_fields(|f| f.minute = i64::from(minutes))
    }

    fn set_seconds(&mut self, seconds: i32) -> Result<()> {
        self.with_fields(|f| f.second = i64::from(seconds))
    }

    fn to_instant(&self) -> Result<DateTime<Utc>> {
        Err(Error::unsupported(
            "a TIME value has no date component and cannot be converted to an instant",
        ))
    }
}

impl fmt::Display for SqlTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = String::with_capacity(8);
        format_decimal(&mut buf, i64::from(self.datetime.hour()), 2);
        buf.push(':');
        format_decimal(&mut buf, i64::from(self.datetime.minute()), 2);
        buf.push(':');
        format_decimal(&mut buf, i64::from(self.datetime.second()), 2);
        f.write_str(&buf)
    }
}

impl FromStr for SqlTime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SqlTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SqlTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
