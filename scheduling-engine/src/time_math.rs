//! Pure time-string arithmetic shared by every other module: "HH:MM" <-> minutes,
//! shift duration, rest hours between two shifts, and interval overlap.
//!
//! Grounded on `original_source/src/backend/services/scheduler/utility.py`, which
//! memoizes these with `functools.lru_cache` since the same "HH:MM" strings recur
//! across a whole schedule generation run. We do the same with a small in-process
//! cache instead of reaching for a new dependency.

use std::collections::HashMap;
use std::sync::{Mutex, OnceLock};

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("malformed time string {0:?}, expected \"HH:MM\"")]
    MalformedTime(String),
}

const MINUTES_PER_DAY: i64 = 24 * 60;

fn minutes_cache() -> &'static Mutex<HashMap<String, i32>> {
    static CACHE: OnceLock<Mutex<HashMap<String, i32>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Converts an "HH:MM" string to minutes since midnight (0..1440).
pub fn time_to_minutes(time_str: &str) -> Result<i32, ParseError> {
    if let Some(&cached) = minutes_cache().lock().unwrap().get(time_str) {
        return Ok(cached);
    }

    let minutes = parse_time_to_minutes(time_str)?;
    minutes_cache()
        .lock()
        .unwrap()
        .insert(time_str.to_string(), minutes);
    Ok(minutes)
}

fn parse_time_to_minutes(time_str: &str) -> Result<i32, ParseError> {
    let (hours_str, minutes_str) = time_str
        .split_once(':')
        .ok_or_else(|| ParseError::MalformedTime(time_str.to_string()))?;

    let hours: i32 = hours_str
        .parse()
        .map_err(|_| ParseError::MalformedTime(time_str.to_string()))?;
    let minutes: i32 = minutes_str
        .parse()
        .map_err(|_| ParseError::MalformedTime(time_str.to_string()))?;

    if !(0..24).contains(&hours) || !(0..60).contains(&minutes) {
        return Err(ParseError::MalformedTime(time_str.to_string()));
    }

    Ok(hours * 60 + minutes)
}

/// Formats minutes since midnight (0..1440) back to an "HH:MM" string.
pub fn minutes_to_time(total_minutes: i32) -> String {
    let normalized = total_minutes.rem_euclid(MINUTES_PER_DAY as i32);
    format!("{:02}:{:02}", normalized / 60, normalized % 60)
}

/// Duration in hours between `start` and `end`, treating `end <= start` as an
/// overnight shift (adds 24h before subtracting). Result is in `(0, 24]`.
pub fn duration(start: &str, end: &str) -> Result<f64, ParseError> {
    let start_minutes = time_to_minutes(start)?;
    let mut end_minutes = time_to_minutes(end)?;

    if end_minutes <= start_minutes {
        end_minutes += MINUTES_PER_DAY as i32;
    }

    Ok((end_minutes - start_minutes) as f64 / 60.0)
}

/// Rest hours between the end of one shift (`prev_end`) and the start of the
/// next (`next_start`). Overlapping or back-to-back-with-no-gap shifts clamp
/// to 0 rather than going negative.
pub fn rest_hours(prev_end: &str, next_start: &str) -> Result<f64, ParseError> {
    let prev_end_minutes = time_to_minutes(prev_end)?;
    let mut next_start_minutes = time_to_minutes(next_start)?;

    if next_start_minutes < prev_end_minutes {
        next_start_minutes += MINUTES_PER_DAY as i32;
    }

    let rest = (next_start_minutes - prev_end_minutes) as f64 / 60.0;
    Ok(rest.max(0.0))
}

/// Half-open interval overlap test, normalizing overnight intervals by adding
/// 24h to the end before comparing.
pub fn intervals_overlap(
    a_start: &str,
    a_end: &str,
    b_start: &str,
    b_end: &str,
) -> Result<bool, ParseError> {
    let (a_start_m, a_end_m) = normalized_interval(a_start, a_end)?;
    let (b_start_m, b_end_m) = normalized_interval(b_start, b_end)?;

    Ok(a_start_m < b_end_m && b_start_m < a_end_m)
}

fn normalized_interval(start: &str, end: &str) -> Result<(i32, i32), ParseError> {
    let start_m = time_to_minutes(start)?;
    let mut end_m = time_to_minutes(end)?;
    if end_m <= start_m {
        end_m += MINUTES_PER_DAY as i32;
    }
    Ok((start_m, end_m))
}

/// Clears the memoization cache. Exposed for tests that want a clean slate,
/// mirroring `utility.clear_time_caches` in the source this was distilled from.
pub fn clear_caches() {
    minutes_cache().lock().unwrap().clear();
}
