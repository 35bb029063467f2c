/// Utility functions for window aggregation and timestamp formatting
use time::{format_description, OffsetDateTime};

use crate::error::{AdvisorError, Result};
use crate::models::{AveragedWindow, Reading};

/// Format a timestamp for human-readable logging
///
/// Converts an OffsetDateTime to DD.MM.YYYY - HH:MM:SS format
/// Falls back to default string representation if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    match format_description::parse("[day].[month].[year] - [hour]:[minute]:[second]") {
        Ok(format) => dt.format(&format).unwrap_or_else(|_| dt.to_string()),
        Err(_) => dt.to_string(),
    }
}

/// Format a Unix millisecond timestamp the same way as `format_datetime`.
pub fn format_millis(millis: i64) -> String {
    OffsetDateTime::from_unix_timestamp_nanos(millis as i128 * 1_000_000)
        .map(|dt| format_datetime(&dt))
        .unwrap_or_else(|_| millis.to_string())
}

/// Current UTC wall clock in Unix milliseconds
pub fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

/// Calculate average values over a window of recent readings
///
/// The order of the readings does not matter. An empty window has no
/// defined mean and is rejected instead of producing NaN averages, and so
/// is any window whose means are not finite.
///
/// # Arguments
/// * `readings` - Most recent readings, newest first or last
///
/// # Returns
/// The averaged window, or `AdvisorError::EmptyWindow`
pub fn calculate_averages(readings: &[Reading]) -> Result<AveragedWindow> {
    if readings.is_empty() {
        return Err(AdvisorError::EmptyWindow);
    }

    let count = readings.len() as f64;

    let temp_sum: f64 = readings.iter().map(|r| r.temperature).sum();
    let humid_sum: f64 = readings.iter().map(|r| r.humidity).sum();
    let aqi_sum: f64 = readings.iter().map(|r| r.air_quality_index).sum();

    let window = AveragedWindow {
        avg_temperature: temp_sum / count,
        avg_humidity: humid_sum / count,
        avg_air_quality: aqi_sum / count,
        samples: readings.len(),
    };

    // NaN rows or overflowing sums must not reach the rule engine
    let means = [
        ("temperature", window.avg_temperature),
        ("humidity", window.avg_humidity),
        ("air quality", window.avg_air_quality),
    ];
    for (name, value) in means {
        if !value.is_finite() {
            return Err(AdvisorError::InvalidReading(format!(
                "average {} over {} readings is not finite: {}",
                name, window.samples, value
            )));
        }
    }

    Ok(window)
}
