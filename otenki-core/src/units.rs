//! Unit conversion and display formatting.
//!
//! Everything the snapshot exposes is metric: Celsius for temperatures and
//! metres per second for wind. Integer readings are truncated toward zero,
//! never rounded.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Text shown in place of a reading that could not be obtained.
pub const PLACEHOLDER: &str = "--";

/// Absorbs binary floating point error before truncating, so that a value
/// like `0.29 * 100.0 == 28.999999999999996` still truncates to 29.
const TRUNCATION_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
    Kelvin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SpeedUnit {
    #[default]
    MetersPerSecond,
    KilometersPerHour,
    MilesPerHour,
    Knots,
}

/// A temperature as reported by a provider, in the provider's unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Temperature {
    pub value: f64,
    #[serde(default)]
    pub unit: TemperatureUnit,
}

impl Temperature {
    pub const fn celsius(value: f64) -> Self {
        Self { value, unit: TemperatureUnit::Celsius }
    }

    pub const fn fahrenheit(value: f64) -> Self {
        Self { value, unit: TemperatureUnit::Fahrenheit }
    }

    pub fn to_celsius(self) -> f64 {
        match self.unit {
            TemperatureUnit::Celsius => self.value,
            TemperatureUnit::Fahrenheit => (self.value - 32.0) * 5.0 / 9.0,
            TemperatureUnit::Kelvin => self.value - 273.15,
        }
    }
}

/// A wind speed as reported by a provider, in the provider's unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Speed {
    pub value: f64,
    #[serde(default)]
    pub unit: SpeedUnit,
}

impl Speed {
    pub const fn meters_per_second(value: f64) -> Self {
        Self { value, unit: SpeedUnit::MetersPerSecond }
    }

    pub const fn kilometers_per_hour(value: f64) -> Self {
        Self { value, unit: SpeedUnit::KilometersPerHour }
    }

    pub fn to_meters_per_second(self) -> f64 {
        match self.unit {
            SpeedUnit::MetersPerSecond => self.value,
            SpeedUnit::KilometersPerHour => self.value / 3.6,
            SpeedUnit::MilesPerHour => self.value * 0.447_04,
            SpeedUnit::Knots => self.value * 0.514_444,
        }
    }
}

/// Truncates toward zero: `21.7 -> 21`, `-3.7 -> -3`.
///
/// Out-of-range values saturate and NaN maps to 0, which is how `as` casts
/// behave; callers that care reject non-finite input first.
pub fn truncate_toward_zero(value: f64) -> i32 {
    let nudged = value + TRUNCATION_TOLERANCE * value.signum();
    nudged.trunc() as i32
}

/// Converts a humidity fraction in `[0, 1]` to a whole percentage in `[0, 100]`.
pub fn humidity_percent(fraction: f64) -> u8 {
    let percent = truncate_toward_zero(fraction * 100.0);
    percent.clamp(0, 100) as u8
}

/// Rounds to one decimal place for display.
pub fn one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn format_temperature(celsius: i32) -> String {
    format!("{celsius}°C")
}

pub fn format_temperature_precise(celsius: f64) -> String {
    format!("{celsius:.1}°C")
}

pub fn format_humidity(percent: u8) -> String {
    format!("{percent}%")
}

pub fn format_wind_speed(meters_per_second: f64) -> String {
    format!("{meters_per_second:.1} m/s")
}

/// Short time of day, e.g. `14:00`.
pub fn format_time_of_day<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%H:%M").to_string()
}

/// Short `month/day` date, e.g. `4/20`.
pub fn format_month_day(date: NaiveDate) -> String {
    date.format("%-m/%-d").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, Utc};

    #[test]
    fn truncation_drops_the_fraction() {
        assert_eq!(truncate_toward_zero(21.7), 21);
        assert_eq!(truncate_toward_zero(21.0), 21);
        assert_eq!(truncate_toward_zero(-3.7), -3);
        assert_eq!(truncate_toward_zero(0.0), 0);
    }

    #[test]
    fn truncation_absorbs_float_noise() {
        assert_eq!(truncate_toward_zero(0.29 * 100.0), 29);
        assert_eq!(truncate_toward_zero(Temperature::fahrenheit(69.8).to_celsius()), 21);
    }

    #[test]
    fn truncation_of_nan_is_zero() {
        assert_eq!(truncate_toward_zero(f64::NAN), 0);
    }

    #[test]
    fn humidity_is_bounded() {
        assert_eq!(humidity_percent(0.0), 0);
        assert_eq!(humidity_percent(0.5), 50);
        assert_eq!(humidity_percent(1.0), 100);
        assert_eq!(humidity_percent(0.63), 63);
        assert_eq!(humidity_percent(1.4), 100);
        assert_eq!(humidity_percent(-0.2), 0);
    }

    #[test]
    fn temperature_conversions() {
        assert!((Temperature::celsius(21.7).to_celsius() - 21.7).abs() < 1e-9);
        assert!((Temperature::fahrenheit(212.0).to_celsius() - 100.0).abs() < 1e-9);
        let kelvin = Temperature { value: 273.15, unit: TemperatureUnit::Kelvin };
        assert!(kelvin.to_celsius().abs() < 1e-9);
    }

    #[test]
    fn speed_conversions() {
        assert!((Speed::kilometers_per_hour(36.0).to_meters_per_second() - 10.0).abs() < 1e-9);
        assert!((Speed::meters_per_second(3.4).to_meters_per_second() - 3.4).abs() < 1e-9);
        let mph = Speed { value: 10.0, unit: SpeedUnit::MilesPerHour };
        assert!((mph.to_meters_per_second() - 4.4704).abs() < 1e-9);
    }

    #[test]
    fn one_decimal_rounds() {
        assert!((one_decimal(3.44) - 3.4).abs() < 1e-9);
        assert!((one_decimal(3.46) - 3.5).abs() < 1e-9);
    }

    #[test]
    fn display_strings() {
        assert_eq!(format_temperature(21), "21°C");
        assert_eq!(format_temperature(-4), "-4°C");
        assert_eq!(format_temperature_precise(21.34), "21.3°C");
        assert_eq!(format_humidity(63), "63%");
        assert_eq!(format_wind_speed(3.4), "3.4 m/s");
    }

    #[test]
    fn time_and_date_formats() {
        let utc = Utc.with_ymd_and_hms(2025, 4, 20, 5, 0, 0).unwrap();
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        assert_eq!(format_time_of_day(&utc.with_timezone(&tokyo)), "14:00");

        let date = NaiveDate::from_ymd_opt(2025, 4, 20).unwrap();
        assert_eq!(format_month_day(date), "4/20");
    }

    #[test]
    fn units_deserialize_with_defaults() {
        let t: Temperature = serde_json::from_str(r#"{"value": 10.0}"#).unwrap();
        assert_eq!(t.unit, TemperatureUnit::Celsius);

        let s: Speed = serde_json::from_str(r#"{"value": 5.0, "unit": "kilometers_per_hour"}"#).unwrap();
        assert_eq!(s.unit, SpeedUnit::KilometersPerHour);
    }
}
