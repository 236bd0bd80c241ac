use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    condition::Condition,
    units::{self, Speed, Temperature},
};

/// A point on the map, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.latitude) && (-180.0..=180.0).contains(&self.longitude)
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

// ---------------------------------------------------------------------------
// Provider input
// ---------------------------------------------------------------------------

/// Weather as delivered by a provider, before normalization.
///
/// Condition codes are provider tokens (see
/// [`KNOWN_CONDITION_CODES`](crate::condition::KNOWN_CONDITION_CODES)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawWeatherPayload {
    /// Mandatory for aggregation; a payload without it is malformed.
    pub current: Option<RawCurrent>,

    #[serde(default)]
    pub hourly: Vec<RawHourlySample>,

    #[serde(default)]
    pub daily: Vec<RawDailySample>,

    /// Offset of the location's local time from UTC, used for hourly labels.
    #[serde(default)]
    pub utc_offset_seconds: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCurrent {
    pub condition_code: String,
    pub description: String,
    pub temperature: Temperature,
    /// Relative humidity as a fraction in `[0, 1]`.
    pub humidity: f64,
    pub wind_speed: Speed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawHourlySample {
    pub time: DateTime<Utc>,
    pub condition_code: String,
    pub temperature: Temperature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDailySample {
    pub date: NaiveDate,
    pub condition_code: String,
    pub low: Temperature,
    pub high: Temperature,
}

// ---------------------------------------------------------------------------
// Display model
// ---------------------------------------------------------------------------

/// A value that is either measured or explicitly unavailable.
///
/// Serializes as the bare value, or `null` when unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Reading<T> {
    Measured(T),
    Unavailable,
}

impl<T: Copy> Reading<T> {
    pub fn value(&self) -> Option<T> {
        match self {
            Reading::Measured(v) => Some(*v),
            Reading::Unavailable => None,
        }
    }

    fn render(&self, format: impl FnOnce(T) -> String) -> String {
        match self {
            Reading::Measured(v) => format(*v),
            Reading::Unavailable => units::PLACEHOLDER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotStatus {
    /// Built from provider data.
    Live,
    /// Substituted after a failed fetch.
    Fallback,
}

/// Display-ready weather for one location at one moment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_label: String,
    pub current: CurrentConditions,
    pub hourly: Vec<HourlyEntry>,
    pub daily: Vec<DailyEntry>,
    pub fetched_at: DateTime<Utc>,
    pub status: SnapshotStatus,
}

impl WeatherSnapshot {
    pub fn is_fallback(&self) -> bool {
        self.status == SnapshotStatus::Fallback
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub condition: Condition,
    pub temperature_c: Reading<i32>,
    pub humidity_percent: Reading<u8>,
    pub wind_speed_ms: Reading<f64>,
    pub description: String,
}

impl CurrentConditions {
    pub fn icon(&self) -> &'static str {
        self.condition.icon()
    }

    /// `21°C`, or the placeholder.
    pub fn temperature_text(&self) -> String {
        self.temperature_c.render(units::format_temperature)
    }

    /// `63%`, or the placeholder.
    pub fn humidity_text(&self) -> String {
        self.humidity_percent.render(units::format_humidity)
    }

    /// `3.4 m/s`, or the placeholder.
    pub fn wind_speed_text(&self) -> String {
        self.wind_speed_ms.render(units::format_wind_speed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyEntry {
    /// Local time of day, `HH:MM`.
    pub time: String,
    pub condition: Condition,
    pub temperature_c: f64,
}

impl HourlyEntry {
    pub fn temperature_text(&self) -> String {
        units::format_temperature_precise(self.temperature_c)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEntry {
    /// `month/day`.
    pub date: String,
    pub condition: Condition,
    pub low_c: i32,
    pub high_c: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current(temperature_c: Reading<i32>) -> CurrentConditions {
        CurrentConditions {
            condition: Condition::Sunny,
            temperature_c,
            humidity_percent: Reading::Measured(63),
            wind_speed_ms: Reading::Measured(3.4),
            description: "Clear".to_string(),
        }
    }

    #[test]
    fn coordinate_validation() {
        assert!(Coordinate::new(35.6812, 139.7671).is_valid());
        assert!(Coordinate::new(-90.0, 180.0).is_valid());
        assert!(!Coordinate::new(90.5, 0.0).is_valid());
        assert!(!Coordinate::new(0.0, -180.5).is_valid());
    }

    #[test]
    fn coordinate_display() {
        assert_eq!(Coordinate::new(35.6812, 139.7671).to_string(), "35.6812, 139.7671");
    }

    #[test]
    fn reading_text() {
        let measured = current(Reading::Measured(21));
        assert_eq!(measured.temperature_text(), "21°C");
        assert_eq!(measured.humidity_text(), "63%");
        assert_eq!(measured.wind_speed_text(), "3.4 m/s");

        let unavailable = current(Reading::Unavailable);
        assert_eq!(unavailable.temperature_text(), units::PLACEHOLDER);
        assert_eq!(unavailable.temperature_c.value(), None);
    }

    #[test]
    fn reading_serializes_untagged() {
        assert_eq!(serde_json::to_string(&Reading::Measured(21)).unwrap(), "21");
        assert_eq!(serde_json::to_string(&Reading::<i32>::Unavailable).unwrap(), "null");
    }

    #[test]
    fn payload_sequences_default_to_empty() {
        let json = r#"{
            "current": {
                "condition_code": "clear",
                "description": "Clear",
                "temperature": {"value": 21.7},
                "humidity": 0.63,
                "wind_speed": {"value": 3.4}
            }
        }"#;
        let payload: RawWeatherPayload = serde_json::from_str(json).unwrap();
        assert!(payload.current.is_some());
        assert!(payload.hourly.is_empty());
        assert!(payload.daily.is_empty());
        assert_eq!(payload.utc_offset_seconds, 0);
    }
}
