//! Year/month extraction from file modification times.

use chrono::{Datelike, Local, TimeZone};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("cannot convert {0} seconds since the epoch to local time")]
    OutOfRange(i64),
}

/// Calendar year and month (1-12) of an instant, in the local time zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimestampParts {
    pub year: i32,
    pub month: u32,
}

/// Splits `epoch_secs` into local year and month.
///
/// Ambiguous local times (DST fold) resolve to the earlier instant.
pub fn decompose(epoch_secs: i64) -> Result<TimestampParts, TimestampError> {
    let local = Local
        .timestamp_opt(epoch_secs, 0)
        .earliest()
        .ok_or(TimestampError::OutOfRange(epoch_secs))?;
    Ok(TimestampParts {
        year: local.year(),
        month: local.month(),
    })
}

/// Whole seconds between the Unix epoch and `time`, rounded towards negative infinity.
pub fn epoch_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(after) => i64::try_from(after.as_secs()).unwrap_or(i64::MAX),
        Err(err) => {
            let before = err.duration();
            let secs = i64::try_from(before.as_secs()).unwrap_or(i64::MAX);
            if before.subsec_nanos() > 0 {
                -secs - 1
            } else {
                -secs
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_decompose_matches_local_calendar() {
        let local = Local.with_ymd_and_hms(2022, 3, 15, 12, 0, 0).unwrap();
        let parts = decompose(local.timestamp()).unwrap();
        assert_eq!(parts, TimestampParts { year: 2022, month: 3 });
    }

    #[test]
    fn test_decompose_month_range() {
        for month in 1..=12 {
            let local = Local.with_ymd_and_hms(2019, month, 10, 8, 30, 0).unwrap();
            let parts = decompose(local.timestamp()).unwrap();
            assert_eq!(parts.month, month);
            assert_eq!(parts.year, 2019);
        }
    }

    #[test]
    fn test_decompose_out_of_range() {
        assert_eq!(
            decompose(i64::MAX),
            Err(TimestampError::OutOfRange(i64::MAX))
        );
    }

    #[test]
    fn test_epoch_seconds() {
        assert_eq!(epoch_seconds(UNIX_EPOCH), 0);
        assert_eq!(epoch_seconds(UNIX_EPOCH + Duration::from_secs(90)), 90);
        assert_eq!(epoch_seconds(UNIX_EPOCH - Duration::from_secs(10)), -10);
        assert_eq!(epoch_seconds(UNIX_EPOCH - Duration::from_millis(1500)), -2);
    }
}
