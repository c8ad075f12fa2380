//! Temporal structures and their `chrono` counterparts.

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;

use crate::packstream::{PackStreamError, PackStreamErrorKind};

const NANOS_PER_SECOND: i64 = 1_000_000_000;
/// Days from 0001-01-01 to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

fn out_of_range(what: &str) -> PackStreamError {
    PackStreamError::with_detail(
        PackStreamErrorKind::OutOfBoundary,
        format!("{} is outside the representable range", what),
    )
}

fn offset(seconds: i64) -> Result<FixedOffset, PackStreamError> {
    i32::try_from(seconds)
        .ok()
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| out_of_range("timezone offset"))
}

fn naive_time(nanoseconds: i64) -> Result<NaiveTime, PackStreamError> {
    let seconds = u32::try_from(nanoseconds.div_euclid(NANOS_PER_SECOND))
        .map_err(|_| out_of_range("time of day"))?;
    let nanos = nanoseconds.rem_euclid(NANOS_PER_SECOND) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(seconds, nanos)
        .ok_or_else(|| out_of_range("time of day"))
}

fn nanos_of_day(time: NaiveTime) -> i64 {
    time.num_seconds_from_midnight() as i64 * NANOS_PER_SECOND + time.nanosecond() as i64
}

fn utc_from_epoch(seconds: i64, nanoseconds: i64) -> Result<chrono::DateTime<chrono::Utc>, PackStreamError> {
    let nanos = u32::try_from(nanoseconds).map_err(|_| out_of_range("nanoseconds"))?;
    chrono::DateTime::from_timestamp(seconds, nanos).ok_or_else(|| out_of_range("instant"))
}

// ==================== Structures ====================

bolt_structure! {
    /// Days since the Unix epoch.
    Date = 0x44 => {
        days: i64,
    }
}

bolt_structure! {
    /// Time of day with a fixed UTC offset.
    Time = 0x54 => {
        nanoseconds: i64,
        tz_offset_seconds: i64,
    }
}

bolt_structure! {
    LocalTime = 0x74 => {
        nanoseconds: i64,
    }
}

bolt_structure! {
    /// Instant in UTC epoch seconds, with the offset it was expressed in.
    DateTime = 0x49 => {
        seconds: i64,
        nanoseconds: i64,
        tz_offset_seconds: i64,
    }
}

bolt_structure! {
    DateTimeZoneId = 0x69 => {
        seconds: i64,
        nanoseconds: i64,
        tz_id: String,
    }
}

bolt_structure! {
    LocalDateTime = 0x64 => {
        seconds: i64,
        nanoseconds: i64,
    }
}

bolt_structure! {
    Duration = 0x45 => {
        months: i64,
        days: i64,
        seconds: i64,
        nanoseconds: i64,
    }
}

// ==================== chrono conversions ====================

impl TryFrom<&Date> for NaiveDate {
    type Error = PackStreamError;

    fn try_from(date: &Date) -> Result<Self, Self::Error> {
        date.days
            .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
            .and_then(|days| i32::try_from(days).ok())
            .and_then(NaiveDate::from_num_days_from_ce_opt)
            .ok_or_else(|| out_of_range("date"))
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Self {
            days: date.num_days_from_ce() as i64 - UNIX_EPOCH_DAYS_FROM_CE,
        }
    }
}

impl TryFrom<&LocalTime> for NaiveTime {
    type Error = PackStreamError;

    fn try_from(time: &LocalTime) -> Result<Self, Self::Error> {
        naive_time(time.nanoseconds)
    }
}

impl From<NaiveTime> for LocalTime {
    fn from(time: NaiveTime) -> Self {
        Self {
            nanoseconds: nanos_of_day(time),
        }
    }
}

impl Time {
    pub fn new(time: NaiveTime, offset: FixedOffset) -> Self {
        Self {
            nanoseconds: nanos_of_day(time),
            tz_offset_seconds: offset.local_minus_utc() as i64,
        }
    }

    pub fn local_time(&self) -> Result<NaiveTime, PackStreamError> {
        naive_time(self.nanoseconds)
    }

    pub fn offset(&self) -> Result<FixedOffset, PackStreamError> {
        offset(self.tz_offset_seconds)
    }
}

impl TryFrom<&LocalDateTime> for NaiveDateTime {
    type Error = PackStreamError;

    fn try_from(value: &LocalDateTime) -> Result<Self, Self::Error> {
        utc_from_epoch(value.seconds, value.nanoseconds).map(|dt| dt.naive_utc())
    }
}

impl From<NaiveDateTime> for LocalDateTime {
    fn from(value: NaiveDateTime) -> Self {
        let utc = value.and_utc();
        Self {
            seconds: utc.timestamp(),
            nanoseconds: utc.timestamp_subsec_nanos() as i64,
        }
    }
}

impl TryFrom<&DateTime> for chrono::DateTime<FixedOffset> {
    type Error = PackStreamError;

    fn try_from(value: &DateTime) -> Result<Self, Self::Error> {
        let offset = offset(value.tz_offset_seconds)?;
        Ok(utc_from_epoch(value.seconds, value.nanoseconds)?.with_timezone(&offset))
    }
}

impl<Z: TimeZone> From<chrono::DateTime<Z>> for DateTime {
    fn from(value: chrono::DateTime<Z>) -> Self {
        let fixed = value.fixed_offset();
        Self {
            seconds: fixed.timestamp(),
            nanoseconds: fixed.timestamp_subsec_nanos() as i64,
            tz_offset_seconds: fixed.offset().local_minus_utc() as i64,
        }
    }
}

impl TryFrom<&DateTimeZoneId> for chrono::DateTime<Tz> {
    type Error = PackStreamError;

    fn try_from(value: &DateTimeZoneId) -> Result<Self, Self::Error> {
        let zone: Tz = value.tz_id.parse().map_err(|_| {
            PackStreamError::with_detail(
                PackStreamErrorKind::IncorrectValue,
                format!("unknown timezone id: {}", value.tz_id),
            )
        })?;
        Ok(utc_from_epoch(value.seconds, value.nanoseconds)?.with_timezone(&zone))
    }
}

impl From<chrono::DateTime<Tz>> for DateTimeZoneId {
    fn from(value: chrono::DateTime<Tz>) -> Self {
        Self {
            seconds: value.timestamp(),
            nanoseconds: value.timestamp_subsec_nanos() as i64,
            tz_id: value.timezone().name().to_string(),
        }
    }
}

impl Duration {
    /// Exact length, available only when no calendar months are involved.
    pub fn to_chrono(&self) -> Option<chrono::Duration> {
        if self.months != 0 {
            return None;
        }
        chrono::Duration::try_days(self.days)?
            .checked_add(&chrono::Duration::try_seconds(self.seconds)?)?
            .checked_add(&chrono::Duration::nanoseconds(self.nanoseconds))
    }
}

impl From<chrono::Duration> for Duration {
    fn from(value: chrono::Duration) -> Self {
        let seconds = value.num_seconds();
        let remainder = value - chrono::Duration::seconds(seconds);
        Self {
            months: 0,
            days: 0,
            seconds,
            nanoseconds: remainder.num_nanoseconds().unwrap_or(0),
        }
    }
}
