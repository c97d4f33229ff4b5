use chrono::{DateTime, Utc};

use crate::model::UnitSystem;

const PLACEHOLDER: &str = "--";

/// Rounds half-up, so 20.5 shows as 21 and -0.5 as 0.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn format_temp(temp: f64, units: UnitSystem) -> String {
    format!("{}°{}", round_half_up(temp), units.temperature_symbol())
}

pub fn format_wind(speed: f64, units: UnitSystem) -> String {
    format!("{} {}", round_half_up(speed), units.wind_unit())
}

fn shifted(timestamp: i64, tz_offset_seconds: i32) -> Option<DateTime<Utc>> {
    timestamp
        .checked_add(i64::from(tz_offset_seconds))
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
}

/// `7:05 AM` in the location's local time.
pub fn format_time(timestamp: i64, tz_offset_seconds: i32) -> String {
    shifted(timestamp, tz_offset_seconds)
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// `Mon, Jan 5` in the location's local time.
pub fn format_date(timestamp: i64, tz_offset_seconds: i32) -> String {
    shifted(timestamp, tz_offset_seconds)
        .map(|t| t.format("%a, %b %-d").to_string())
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// "light rain" becomes "Light Rain".
pub fn title_case(description: &str) -> String {
    description
        .split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
