//! Conversion between [`chrono::Weekday`] and the spec's day-index convention
//! (Monday = 0 .. Sunday = 6), kept as a single module so every other part of
//! the engine references "day_index" through one conversion point.

use chrono::{Datelike, NaiveDate, Weekday};

/// Monday = 0 .. Sunday = 6, per `CoverageRule::day_index` and
/// `EmployeeAvailability::day_of_week`.
pub fn day_index(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_monday() as u8
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The Monday that begins the calendar week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - chrono::Duration::days(day_index(date) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monday_is_zero() {
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        assert_eq!(day_index(monday), 0);
    }

    #[test]
    fn sunday_is_six() {
        let sunday = NaiveDate::from_ymd_opt(2024, 11, 10).unwrap();
        assert_eq!(day_index(sunday), 6);
    }

    #[test]
    fn week_start_is_idempotent_across_the_week() {
        let monday = NaiveDate::from_ymd_opt(2024, 11, 4).unwrap();
        for offset in 0..7 {
            let day = monday + chrono::Duration::days(offset);
            assert_eq!(week_start(day), monday);
        }
    }

    #[test]
    fn weekend_detection() {
        assert!(is_weekend(NaiveDate::from_ymd_opt(2024, 11, 9).unwrap())); // Sat
        assert!(is_weekend(NaiveDate::from_ymd_opt(2024, 11, 10).unwrap())); // Sun
        assert!(!is_weekend(NaiveDate::from_ymd_opt(2024, 11, 8).unwrap())); // Fri
    }
}
