use std::fmt;

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};

use crate::error::XritError;

/// Date and time of an acquisition, truncated to whole seconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtcDateTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl UtcDateTime {
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Self {
        Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        }
    }

    /// Converts a CCSDS day segmented (CDS) time code, counted from
    /// 1958-01-01, into a calendar date and time.
    pub fn from_cds(days: u16, millis_of_day: u32) -> Result<Self, XritError> {
        if millis_of_day >= 86_400_000 {
            return Err(XritError::InvalidValueError(format!(
                "invalid CDS time of day: {millis_of_day} ms"
            )));
        }
        let dt = cds_epoch()?
            + Duration::days(i64::from(days))
            + Duration::milliseconds(i64::from(millis_of_day));
        Ok(Self::new(
            dt.year() as u16,
            dt.month() as u8,
            dt.day() as u8,
            dt.hour() as u8,
            dt.minute() as u8,
            dt.second() as u8,
        ))
    }

    /// Converts the time back into a CDS `(days, milliseconds)` pair.
    pub fn to_cds(&self) -> Result<(u16, u32), XritError> {
        let dt = create_date_time(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        )?;
        let days = u16::try_from((dt - cds_epoch()?).num_days())
            .map_err(|_| XritError::InvalidValueError(format!("{self} cannot be coded as CDS")))?;
        Ok((days, dt.num_seconds_from_midnight() * 1000))
    }

    /// Formats the time as `YYYYMMDDhhmm`, the timing token used in xRIT
    /// file names.
    pub fn timing(&self) -> String {
        format!(
            "{:04}{:02}{:02}{:02}{:02}",
            self.year, self.month, self.day, self.hour, self.minute
        )
    }
}

impl fmt::Display for UtcDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

fn create_date_time(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Result<DateTime<Utc>, XritError> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .ok_or_else(|| {
            XritError::InvalidValueError(format!(
                "invalid date time: {year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02}"
            ))
        })
}

fn cds_epoch() -> Result<DateTime<Utc>, XritError> {
    create_date_time(1958, 1, 1, 0, 0, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    macro_rules! test_conversion_to_cds {
        ($(($name:ident, $time:expr, $expected:expr),)*) => ($(
            #[test]
            fn $name() {
                assert_eq!($time.to_cds(), $expected);
            }
        )*);
    }

    test_conversion_to_cds! {
        (cds_of_epoch, UtcDateTime::new(1958, 1, 1, 0, 0, 0), Ok((0, 0))),
        (cds_of_last_second_of_day, UtcDateTime::new(2006, 11, 14, 23, 59, 59), Ok((17849, 86_399_000))),
        (
            cds_of_invalid_date,
            UtcDateTime::new(2022, 11, 31, 0, 0, 0),
            Err(XritError::InvalidValueError("invalid date time: 2022-11-31 00:00:00".to_owned()))
        ),
        (
            cds_of_invalid_time,
            UtcDateTime::new(2022, 1, 1, 0, 61, 0),
            Err(XritError::InvalidValueError("invalid date time: 2022-01-01 00:61:00".to_owned()))
        ),
        (
            cds_of_time_before_epoch,
            UtcDateTime::new(1957, 12, 31, 0, 0, 0),
            Err(XritError::InvalidValueError("1957-12-31 00:00:00 UTC cannot be coded as CDS".to_owned()))
        ),
    }

    #[test]
    fn cds_time_at_epoch() {
        let time = UtcDateTime::from_cds(0, 0).unwrap();
        assert_eq!(time, UtcDateTime::new(1958, 1, 1, 0, 0, 0));
    }

    #[test]
    fn cds_time_of_msg_slot() {
        // 2006-11-14 12:00 UTC
        let time = UtcDateTime::from_cds(17849, 12 * 3_600_000 + 12_345).unwrap();
        assert_eq!(time, UtcDateTime::new(2006, 11, 14, 12, 0, 12));
        assert_eq!(time.timing(), "200611141200");
        assert_eq!(time.to_cds(), Ok((17849, 43_212_000)));
    }

    #[test]
    fn cds_rejects_overlong_day() {
        assert!(UtcDateTime::from_cds(100, 86_400_000).is_err());
    }

    #[test]
    fn utc_date_time_string() {
        let time = UtcDateTime::new(2025, 1, 1, 0, 0, 0);
        assert_eq!(format!("{time}"), "2025-01-01 00:00:00 UTC".to_owned())
    }
}
