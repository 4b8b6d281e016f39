//! Archive II date/time conversion.

use chrono::{DateTime, Duration, TimeZone, Utc};

const MS_PER_DAY: u32 = 86_400_000;

/// Convert a modified Julian day and milliseconds past midnight to UTC.
///
/// Day 1 is 1970-01-01. Day 0 and out-of-range millisecond counts yield `None`.
pub fn julian_to_datetime(julian_day: u32, ms_of_day: u32) -> Option<DateTime<Utc>> {
    if julian_day == 0 || ms_of_day >= MS_PER_DAY {
        return None;
    }

    let epoch = Utc.timestamp_opt(0, 0).single()?;
    let days = Duration::try_days(julian_day as i64 - 1)?;
    let ms = Duration::try_milliseconds(ms_of_day as i64)?;
    epoch.checked_add_signed(days)?.checked_add_signed(ms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_epoch_day() {
        let t = julian_to_datetime(1, 0).unwrap();
        assert_eq!(t.timestamp(), 0);
    }

    #[test]
    fn test_known_date() {
        // 2013-05-20 is day 15846 since 1970-01-01, +1 for the Archive II convention.
        let t = julian_to_datetime(15_846, (20 * 3600 + 1800) * 1000 + 250).unwrap();
        assert_eq!((t.year(), t.month(), t.day()), (2013, 5, 20));
        assert_eq!((t.hour(), t.minute(), t.second()), (20, 30, 0));
        assert_eq!(t.timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(julian_to_datetime(0, 1000).is_none());
        assert!(julian_to_datetime(100, MS_PER_DAY).is_none());
    }
}
