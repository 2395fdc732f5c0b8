use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Datelike, NaiveDateTime, TimeDelta, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{
    civil_from_millis, format_decimal, format_year, millis_of, parse_date_fields, parse_decimal,
    Fields, SqlTemporal, TemporalKind, MILLIS_PER_SECOND, NANOS_PER_MILLI, NANOS_PER_SECOND,
};
use crate::error::{Error, Overflow, Result};

const FORMAT_ERROR: &str = "Timestamp format must be yyyy-mm-dd hh:mm:ss[.fffffffff]";
const MAX_NANOS: u32 = NANOS_PER_SECOND - 1;

/// A SQL `TIMESTAMP` value.
///
/// The date-time is kept at whole-second precision and the fraction of the
/// second lives in a separate nanosecond field in `[0, 999_999_999]`.
///
/// Equality compares the millisecond time and the nanos; the hash uses the
/// millisecond time only, so two timestamps that differ below one
/// millisecond hash alike but are not equal.
#[derive(Debug, Clone, Copy)]
pub struct SqlTimestamp {
    /// Whole seconds
    datetime: NaiveDateTime,
    nanos: u32,
}

impl SqlTimestamp {
    /// Build from civil fields (lenient) and a nanosecond fraction.
    pub fn new(
        year: i32,
        month: u32,
        day: u32,
        hour: u32,
        minute: u32,
        second: u32,
        nanos: u32,
    ) -> Result<Self> {
        check_nanos(nanos)?;
        let datetime = Fields {
            year: i64::from(year),
            month: i64::from(month),
            day: i64::from(day),
            hour: i64::from(hour),
            minute: i64::from(minute),
            second: i64::from(second),
        }
        .normalize()?;
        Ok(Self { datetime, nanos })
    }

    /// Build from milliseconds since the epoch.
    ///
    /// The millisecond remainder moves into the nanosecond field; for
    /// negative values the whole-second part is rounded down so that the
    /// nanos stay non-negative.
    ///
    /// # Examples
    ///
    /// ```
    /// use rdbc_core::temporal::{SqlTemporal, SqlTimestamp};
    ///
    /// let ts = SqlTimestamp::from_millis(-1_500).unwrap();
    /// assert_eq!(ts.nanos(), 500_000_000);
    /// assert_eq!(ts.time(), -1_500);
    /// ```
    pub fn from_millis(millis: i64) -> Result<Self> {
        let whole = millis
            .div_euclid(MILLIS_PER_SECOND)
            .checked_mul(MILLIS_PER_SECOND)
            .ok_or_else(|| {
                Error::invalid_argument_with_source("millisecond value out of range", Overflow)
            })?;
        let nanos = millis.rem_euclid(MILLIS_PER_SECOND) as u32 * NANOS_PER_MILLI;
        Ok(Self {
            datetime: civil_from_millis(whole)?,
            nanos,
        })
    }

    /// Build from epoch seconds and a nanosecond fraction.
    ///
    /// Fails if the seconds cannot be expressed in milliseconds.
    pub fn from_epoch_parts(seconds: i64, nanos: u32) -> Result<Self> {
        check_nanos(nanos)?;
        let millis = seconds
            .checked_mul(MILLIS_PER_SECOND)
            .ok_or_else(|| {
                Error::invalid_argument_with_source("instant exceeds timestamp range", Overflow)
            })?;
        Ok(Self {
            datetime: civil_from_millis(millis)?,
            nanos,
        })
    }

    /// Parse `yyyy-[m]m-[d]d hh:mm:ss[.f...]`.
    ///
    /// Surrounding whitespace is ignored. The fraction may have one to nine
    /// digits and is right-padded with zeros to nanoseconds.
    ///
    /// # Examples
    ///
    /// ```
    /// use rdbc_core::temporal::SqlTimestamp;
    ///
    /// let ts = SqlTimestamp::parse("2023-03-05 10:20:30.5").unwrap();
    /// assert_eq!(ts.nanos(), 500_000_000);
    /// assert_eq!(ts.to_string(), "2023-03-05 10:20:30.5");
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = || Error::invalid_argument(FORMAT_ERROR);

        let s = s.trim();
        let dividing_space = s.find(' ').ok_or_else(invalid)?;
        let (date_part, time_part) = (&s[..dividing_space], &s[dividing_space + 1..]);

        let (year, month, day) = parse_date_fields(date_part).ok_or_else(invalid)?;

        let first_colon = time_part.find(':').ok_or_else(invalid)?;
        let second_colon = first_colon
            + 1
            + time_part[first_colon + 1..].find(':').ok_or_else(invalid)?;
        if second_colon >= time_part.len() - 1 {
            return Err(invalid());
        }

        let hour = parse_decimal(&time_part[..first_colon]).ok_or_else(invalid)?;
        let minute = parse_decimal(&time_part[first_colon + 1..second_colon]).ok_or_else(invalid)?;

        let rest = &time_part[second_colon + 1..];
        let (second, nanos) = match rest.find('.') {
            Some(period) if period + 1 < rest.len() => {
                let second = parse_decimal(&rest[..period]).ok_or_else(invalid)?;
                (second, parse_fraction(&rest[period + 1..]).ok_or_else(invalid)?)
            }
            Some(_) => return Err(invalid()),
            None => (parse_decimal(rest).ok_or_else(invalid)?, 0),
        };

        let datetime = Fields {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
        .normalize()?;
        Ok(Self { datetime, nanos })
    }

    /// Build from an absolute instant.
    ///
    /// A leap second is carried into the following second.
    pub fn from_instant(instant: DateTime<Utc>) -> Result<Self> {
        let mut seconds = instant.timestamp();
        let mut nanos = instant.timestamp_subsec_nanos();
        if nanos >= NANOS_PER_SECOND {
            seconds += 1;
            nanos -= NANOS_PER_SECOND;
        }
        Self::from_epoch_parts(seconds, nanos)
    }

    /// Build from a system time
    pub fn from_system_time(time: SystemTime) -> Result<Self> {
        let overflow =
            || Error::invalid_argument_with_source("system time exceeds timestamp range", Overflow);
        match time.duration_since(UNIX_EPOCH) {
            Ok(after) => {
                let seconds = i64::try_from(after.as_secs()).map_err(|_| overflow())?;
                Self::from_epoch_parts(seconds, after.subsec_nanos())
            }
            Err(before) => {
                let before = before.duration();
                let mut seconds = i64::try_from(before.as_secs())
                    .map_err(|_| overflow())?
                    .checked_neg()
                    .ok_or_else(overflow)?;
                let mut nanos = before.subsec_nanos();
                if nanos > 0 {
                    seconds = seconds.checked_sub(1).ok_or_else(overflow)?;
                    nanos = NANOS_PER_SECOND - nanos;
                }
                Self::from_epoch_parts(seconds, nanos)
            }
        }
    }

    /// Build from a chrono date-time.
    ///
    /// A leap-second fraction carries into the following second.
    pub fn from_naive_date_time(datetime: NaiveDateTime) -> Self {
        let whole = datetime.with_nanosecond(0).unwrap_or(datetime);
        let nanos = datetime.nanosecond();
        if nanos < NANOS_PER_SECOND {
            return Self { datetime: whole, nanos };
        }
        Self {
            datetime: whole
                .checked_add_signed(TimeDelta::seconds(1))
                .unwrap_or(whole),
            nanos: nanos - NANOS_PER_SECOND,
        }
    }

    /// Convert to a chrono date-time with full nanosecond precision
    pub fn to_naive_date_time(&self) -> NaiveDateTime {
        self.datetime.with_nanosecond(self.nanos).unwrap_or(self.datetime)
    }

    /// Nanosecond fraction of the second
    #[inline]
    pub fn nanos(&self) -> u32 {
        self.nanos
    }

    /// Set the nanosecond fraction; must be in `[0, 999_999_999]`.
    pub fn set_nanos(&mut self, nanos: u32) -> Result<()> {
        check_nanos(nanos)?;
        self.nanos = nanos;
        Ok(())
    }

    /// Replace the underlying millisecond value, re-deriving the nanos
    pub fn set_time(&mut self, millis: i64) -> Result<()> {
        *self = Self::from_millis(millis)?;
        Ok(())
    }

    /// Whether this timestamp is earlier than `other`
    pub fn before(&self, other: &Self) -> bool {
        self < other
    }

    /// Whether this timestamp is later than `other`
    pub fn after(&self, other: &Self) -> bool {
        self > other
    }

    fn with_fields(&mut self, f: impl FnOnce(&mut Fields)) -> Result<()> {
        let mut fields = Fields::of(&self.datetime);
        f(&mut fields);
        self.datetime = fields.normalize()?;
        Ok(())
    }
}

fn check_nanos(nanos: u32) -> Result<()> {
    if nanos > MAX_NANOS {
        return Err(Error::invalid_argument("nanos > 999999999 or < 0"));
    }
    Ok(())
}

/// Parse one to nine fraction digits into nanoseconds.
fn parse_fraction(digits: &str) -> Option<u32> {
    if digits.is_empty() || digits.len() > 9 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value: u32 = digits.parse().ok()?;
    Some(value * 10u32.pow((9 - digits.len()) as u32))
}

impl SqlTemporal for SqlTimestamp {
    fn kind(&self) -> TemporalKind {
        TemporalKind::Timestamp
    }

    fn time(&self) -> i64 {
        millis_of(&self.datetime) + i64::from(self.nanos / NANOS_PER_MILLI)
    }

    fn year(&self) -> Result<i32> {
        Ok(self.datetime.year())
    }

    fn month(&self) -> Result<u32> {
        Ok(self.datetime.month())
    }

    fn day(&self) -> Result<u32> {
        Ok(self.datetime.day())
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

    fn set_year(&mut self, year: i32) -> Result<()> {
        self.with_fields(|f| f.year = i64::from(year))
    }

    fn set_month(&mut self, month: i32) -> Result<()> {
        self.with_fields(|f| f.month = i64::from(month))
    }

    fn set_day(&mut self, day: i32) -> Result<()> {
        self.with_fields(|f| f.day = i64::from(day))
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
        let seconds = self.datetime.and_utc().timestamp();
        DateTime::from_timestamp(seconds, self.nanos)
            .ok_or_else(|| Error::invalid_argument("timestamp exceeds instant range"))
    }
}

impl PartialEq for SqlTimestamp {
    fn eq(&self, other: &Self) -> bool {
        self.time() == other.time() && self.nanos == other.nanos
    }
}

impl Eq for SqlTimestamp {}

impl Hash for SqlTimestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.time().hash(state);
    }
}

impl PartialOrd for SqlTimestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SqlTimestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.time()
            .cmp(&other.time())
            .then(self.nanos.cmp(&other.nanos))
    }
}

impl fmt::Display for SqlTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (fraction, width) = if self.nanos == 0 {
            (0, 1)
        } else {
            let mut fraction = self.nanos;
            let mut width = 9;
            while fraction % 10 == 0 {
                fraction /= 10;
                width -= 1;
            }
            (fraction, width)
        };

        let dt = &self.datetime;
        let mut buf = String::with_capacity(29);
        format_year(&mut buf, dt.year());
        buf.push('-');
        format_decimal(&mut buf, i64::from(dt.month()), 2);
        buf.push('-');
        format_decimal(&mut buf, i64::from(dt.day()), 2);
        buf.push(' ');
        format_decimal(&mut buf, i64::from(dt.hour()), 2);
        buf.push(':');
        format_decimal(&mut buf, i64::from(dt.minute()), 2);
        buf.push(':');
        format_decimal(&mut buf, i64::from(dt.second()), 2);
        buf.push('.');
        format_decimal(&mut buf, i64::from(fraction), width);
        f.write_str(&buf)
    }
}

impl FromStr for SqlTimestamp {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl From<NaiveDateTime> for SqlTimestamp {
    fn from(datetime: NaiveDateTime) -> Self {
        Self::from_naive_date_time(datetime)
    }
}

impl TryFrom<DateTime<Utc>> for SqlTimestamp {
    type Error = Error;

    fn try_from(instant: DateTime<Utc>) -> Result<Self> {
        Self::from_instant(instant)
    }
}

impl Serialize for SqlTimestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SqlTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
