//! Temporal helpers: weekday indexing, fixed-time parsing, and
//! normalization of legacy schedule-day inputs.
//!
//! Weekday indices follow the 0=Sunday..6=Saturday convention used by
//! `Reminder::schedule_days`.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

use crate::error::{Error, Result};

/// Weekday index (0=Sunday..6=Saturday) of a UTC timestamp.
pub fn weekday_index(at: DateTime<Utc>) -> u8 {
    at.weekday().num_days_from_sunday() as u8
}

/// Parse a "HH:mm" clock time into (hour, minute).
///
/// Rejects out-of-range components and anything that is not exactly two
/// colon-separated numeric fields.
pub fn parse_fixed_time(s: &str) -> Result<(u32, u32)> {
    let mut parts = s.splitn(2, ':');
    let (hour_s, minute_s) = match (parts.next(), parts.next()) {
        (Some(h), Some(m)) => (h, m),
        _ => {
            return Err(Error::InvalidInput(format!(
                "fixed_time must be HH:mm, got {:?}",
                s
            )))
        }
    };

    let hour: u32 = hour_s
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid hour in fixed_time {:?}", s)))?;
    let minute: u32 = minute_s
        .parse()
        .map_err(|_| Error::InvalidInput(format!("invalid minute in fixed_time {:?}", s)))?;

    if hour > 23 || minute > 59 {
        return Err(Error::InvalidInput(format!(
            "fixed_time out of range: {:?}",
            s
        )));
    }

    Ok((hour, minute))
}

/// Whether a string is a well-formed "HH:mm" clock time.
pub fn is_valid_fixed_time(s: &str) -> bool {
    parse_fixed_time(s).is_ok()
}

/// Normalize schedule-day inputs into weekday indices.
///
/// New clients send an array of indices; legacy clients send a single
/// lowercase day name ("monday", ...). The legacy form is honored only
/// when the array is absent or empty, and only at this boundary — core
/// logic reads the normalized array exclusively.
pub fn normalize_schedule_days(days: Option<&[u8]>, legacy_day: Option<&str>) -> Result<Vec<u8>> {
    if let Some(days) = days {
        if !days.is_empty() {
            let mut normalized: Vec<u8> = Vec::with_capacity(days.len());
            for &day in days {
                if day > 6 {
                    return Err(Error::InvalidInput(format!(
                        "weekday index out of range: {}",
                        day
                    )));
                }
                if !normalized.contains(&day) {
                    normalized.push(day);
                }
            }
            normalized.sort_unstable();
            return Ok(normalized);
        }
    }

    match legacy_day {
        Some(name) => Ok(vec![day_name_to_index(name)?]),
        None => Ok(vec![]),
    }
}

/// Map a day name to its weekday index. Case-insensitive.
pub fn day_name_to_index(name: &str) -> Result<u8> {
    match name.trim().to_ascii_lowercase().as_str() {
        "sunday" => Ok(0),
        "monday" => Ok(1),
        "tuesday" => Ok(2),
        "wednesday" => Ok(3),
        "thursday" => Ok(4),
        "friday" => Ok(5),
        "saturday" => Ok(6),
        other => Err(Error::InvalidInput(format!("unknown day name: {:?}", other))),
    }
}

/// Round a timestamp up to the next whole hour. A timestamp already on
/// the hour is returned unchanged.
pub fn ceil_to_hour(at: DateTime<Utc>) -> DateTime<Utc> {
    if at.minute() == 0 && at.second() == 0 && at.nanosecond() == 0 {
        return at;
    }
    let truncated = at
        .with_minute(0)
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(at);
    truncated + Duration::hours(1)
}

/// When a one-day reminder's notification should fire, given its start
/// time and lead minutes.
pub fn notification_fire_time(start: DateTime<Utc>, lead_minutes: i64) -> DateTime<Utc> {
    start - Duration::minutes(lead_minutes)
}
