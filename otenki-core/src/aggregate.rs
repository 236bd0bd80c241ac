//! Turns a provider payload into a [`WeatherSnapshot`].
//!
//! Everything here is pure: no I/O, no clock reads, no shared state. The
//! capture time is passed in by the caller.

use std::collections::HashSet;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use thiserror::Error;
use tracing::debug;

use crate::{
    condition::{Condition, classify},
    model::{
        CurrentConditions, DailyEntry, HourlyEntry, RawCurrent, RawDailySample, RawHourlySample,
        RawWeatherPayload, Reading, SnapshotStatus, WeatherSnapshot,
    },
    units,
};

/// Upper bound on the daily forecast list.
pub const MAX_DAILY_ENTRIES: usize = 7;

/// Label used when a coordinate cannot be resolved to a place name.
pub const UNKNOWN_LOCATION: &str = "Unknown location";

/// Description shown by the fallback snapshot.
pub const FALLBACK_DESCRIPTION: &str = "Failed to load weather";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AggregateError {
    #[error("Malformed weather payload: {0}")]
    MalformedPayload(String),
}

/// Normalizes `raw` into a snapshot for `location_label`, captured at `now`.
///
/// Fails only when the payload has no usable current-conditions record; in
/// that case no partial snapshot is produced and the caller should display
/// [`fallback_snapshot`] instead.
pub fn aggregate(
    raw: &RawWeatherPayload,
    location_label: &str,
    now: DateTime<Utc>,
) -> Result<WeatherSnapshot, AggregateError> {
    let current = raw
        .current
        .as_ref()
        .ok_or_else(|| AggregateError::MalformedPayload("missing current conditions".into()))?;

    let offset = FixedOffset::east_opt(raw.utc_offset_seconds).unwrap_or_else(|| Utc.fix());

    Ok(WeatherSnapshot {
        location_label: location_label.to_string(),
        current: summarize_current(current)?,
        hourly: hourly_series(&raw.hourly, offset),
        daily: daily_series(&raw.daily),
        fetched_at: now,
        status: SnapshotStatus::Live,
    })
}

/// The one snapshot shown whenever weather could not be obtained, whatever
/// the cause.
pub fn fallback_snapshot(location_label: &str, now: DateTime<Utc>) -> WeatherSnapshot {
    WeatherSnapshot {
        location_label: location_label.to_string(),
        current: CurrentConditions {
            condition: Condition::Unknown,
            temperature_c: Reading::Unavailable,
            humidity_percent: Reading::Unavailable,
            wind_speed_ms: Reading::Unavailable,
            description: FALLBACK_DESCRIPTION.to_string(),
        },
        hourly: Vec::new(),
        daily: Vec::new(),
        fetched_at: now,
        status: SnapshotStatus::Fallback,
    }
}

fn summarize_current(current: &RawCurrent) -> Result<CurrentConditions, AggregateError> {
    let temperature = current.temperature.to_celsius();
    let wind = current.wind_speed.to_meters_per_second();

    for (field, value) in [("temperature", temperature), ("humidity", current.humidity), ("wind speed", wind)] {
        if !value.is_finite() {
            return Err(AggregateError::MalformedPayload(format!(
                "current {field} is not a finite number"
            )));
        }
    }

    Ok(CurrentConditions {
        condition: classify(&current.condition_code),
        temperature_c: Reading::Measured(units::truncate_toward_zero(temperature)),
        humidity_percent: Reading::Measured(units::humidity_percent(current.humidity)),
        wind_speed_ms: Reading::Measured(units::one_decimal(wind)),
        description: current.description.clone(),
    })
}

/// Source order is kept as-is; repeated timestamps keep their first sample.
/// Samples with a non-finite temperature are skipped.
fn hourly_series(samples: &[RawHourlySample], offset: FixedOffset) -> Vec<HourlyEntry> {
    let mut seen = HashSet::with_capacity(samples.len());

    samples
        .iter()
        .filter(|sample| {
            let finite = sample.temperature.to_celsius().is_finite();
            if !finite {
                debug!(time = %sample.time, "Dropping hourly sample without a temperature");
            }
            finite
        })
        .filter(|sample| {
            let fresh = seen.insert(sample.time);
            if !fresh {
                debug!(time = %sample.time, "Dropping duplicate hourly sample");
            }
            fresh
        })
        .map(|sample| HourlyEntry {
            time: units::format_time_of_day(&sample.time.with_timezone(&offset)),
            condition: classify(&sample.condition_code),
            temperature_c: units::one_decimal(sample.temperature.to_celsius()),
        })
        .collect()
}

/// Days missing a finite low or high are skipped before the cap applies.
fn daily_series(samples: &[RawDailySample]) -> Vec<DailyEntry> {
    let mut seen = HashSet::with_capacity(samples.len());

    samples
        .iter()
        .filter(|sample| {
            let finite =
                sample.low.to_celsius().is_finite() && sample.high.to_celsius().is_finite();
            if !finite {
                debug!(date = %sample.date, "Dropping daily sample without both bounds");
            }
            finite
        })
        .filter(|sample| {
            let fresh = seen.insert(sample.date);
            if !fresh {
                debug!(date = %sample.date, "Dropping duplicate daily sample");
            }
            fresh
        })
        .take(MAX_DAILY_ENTRIES)
        .map(|sample| DailyEntry {
            date: units::format_month_day(sample.date),
            condition: classify(&sample.condition_code),
            low_c: units::truncate_toward_zero(sample.low.to_celsius()),
            high_c: units::truncate_toward_zero(sample.high.to_celsius()),
        })
        .collect()
}
