//! Open-Meteo forecast adapter (<https://open-meteo.com>). No API key needed.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    model::{Coordinate, RawCurrent, RawDailySample, RawHourlySample, RawWeatherPayload},
    units::{Speed, Temperature},
};

use super::{WeatherProvider, truncate_body};

const DEFAULT_BASE_URL: &str = "https://api.open-meteo.com/v1";
const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,weather_code,wind_speed_10m";
const HOURLY_FIELDS: &str = "temperature_2m,weather_code";
const DAILY_FIELDS: &str = "weather_code,temperature_2m_max,temperature_2m_min";
const FORECAST_HOURS: u32 = 24;
const FORECAST_DAYS: u32 = 7;

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    base_url: String,
    http: Client,
}

impl OpenMeteoProvider {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Points the provider at another host, e.g. a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl Default for OpenMeteoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    relative_humidity_2m: f64,
    weather_code: u8,
    wind_speed_10m: f64,
}

#[derive(Debug, Deserialize)]
struct OmHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    weather_code: Vec<Option<u8>>,
}

#[derive(Debug, Deserialize)]
struct OmDaily {
    time: Vec<String>,
    weather_code: Vec<Option<u8>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OmResponse {
    #[serde(default)]
    utc_offset_seconds: i32,
    current: Option<OmCurrent>,
    hourly: Option<OmHourly>,
    daily: Option<OmDaily>,
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    #[instrument(skip(self), fields(lat = %coordinate.latitude, lon = %coordinate.longitude))]
    async fn fetch_weather(&self, coordinate: Coordinate) -> Result<RawWeatherPayload> {
        if !coordinate.is_valid() {
            bail!("Invalid coordinates: {coordinate}");
        }

        let url = format!("{}/forecast", self.base_url);
        debug!(url = %url, "Fetching Open-Meteo forecast");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("latitude", coordinate.latitude.to_string()),
                ("longitude", coordinate.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", "auto".to_string()),
                ("wind_speed_unit", "ms".to_string()),
                ("forecast_hours", FORECAST_HOURS.to_string()),
                ("forecast_days", FORECAST_DAYS.to_string()),
            ])
            .send()
            .await
            .context("Failed to send request to Open-Meteo")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read Open-Meteo response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "Open-Meteo request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OmResponse =
            serde_json::from_str(&body).context("Failed to parse Open-Meteo JSON")?;

        into_payload(parsed)
    }
}

fn into_payload(parsed: OmResponse) -> Result<RawWeatherPayload> {
    let offset = FixedOffset::east_opt(parsed.utc_offset_seconds)
        .ok_or_else(|| anyhow!("Open-Meteo returned an invalid UTC offset"))?;

    let current = parsed.current.map(|c| {
        let (condition_code, description) = wmo_condition(c.weather_code);
        RawCurrent {
            condition_code: condition_code.to_string(),
            description: description.to_string(),
            temperature: Temperature::celsius(c.temperature_2m),
            humidity: c.relative_humidity_2m / 100.0,
            wind_speed: Speed::meters_per_second(c.wind_speed_10m),
        }
    });

    let hourly = match parsed.hourly {
        Some(h) => hourly_samples(h, offset)?,
        None => Vec::new(),
    };

    let daily = match parsed.daily {
        Some(d) => daily_samples(d)?,
        None => Vec::new(),
    };

    Ok(RawWeatherPayload {
        current,
        hourly,
        daily,
        utc_offset_seconds: parsed.utc_offset_seconds,
    })
}

/// Samples with a missing temperature are skipped.
fn hourly_samples(hourly: OmHourly, offset: FixedOffset) -> Result<Vec<RawHourlySample>> {
    let mut samples = Vec::with_capacity(hourly.time.len());

    for ((time, temperature), code) in hourly
        .time
        .iter()
        .zip(hourly.temperature_2m)
        .zip(hourly.weather_code)
    {
        let Some(temperature) = temperature else {
            continue;
        };
        samples.push(RawHourlySample {
            time: parse_local_time(time, offset)?,
            condition_code: code_token(code).to_string(),
            temperature: Temperature::celsius(temperature),
        });
    }

    Ok(samples)
}

/// Days missing either bound are skipped.
fn daily_samples(daily: OmDaily) -> Result<Vec<RawDailySample>> {
    let mut samples = Vec::with_capacity(daily.time.len());

    for (((date, code), high), low) in daily
        .time
        .iter()
        .zip(daily.weather_code)
        .zip(daily.temperature_2m_max)
        .zip(daily.temperature_2m_min)
    {
        let (Some(high), Some(low)) = (high, low) else {
            continue;
        };
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .with_context(|| format!("Invalid Open-Meteo date: {date}"))?;
        samples.push(RawDailySample {
            date,
            condition_code: code_token(code).to_string(),
            low: Temperature::celsius(low),
            high: Temperature::celsius(high),
        });
    }

    Ok(samples)
}

/// Open-Meteo reports times as local wall-clock time (`2025-04-20T14:00`).
fn parse_local_time(s: &str, offset: FixedOffset) -> Result<DateTime<Utc>> {
    let local = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .with_context(|| format!("Invalid Open-Meteo time: {s}"))?;

    local
        .and_local_timezone(offset)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| anyhow!("Ambiguous Open-Meteo time: {s}"))
}

fn code_token(code: Option<u8>) -> &'static str {
    code.map_or("unknown", |c| wmo_condition(c).0)
}

/// WMO weather interpretation code -> (condition code, description).
///
/// See: <https://open-meteo.com/en/docs#weathervariables>
fn wmo_condition(code: u8) -> (&'static str, &'static str) {
    match code {
        0 => ("clear", "Clear sky"),
        1 => ("mostlyClear", "Mainly clear"),
        2 => ("partlyCloudy", "Partly cloudy"),
        3 => ("cloudy", "Overcast"),
        45 | 48 => ("foggy", "Fog"),
        51 | 53 | 55 => ("drizzle", "Drizzle"),
        56 | 57 => ("freezingDrizzle", "Freezing drizzle"),
        61 | 63 => ("rain", "Rain"),
        65 => ("heavyRain", "Heavy rain"),
        66 | 67 => ("freezingRain", "Freezing rain"),
        71 | 73 => ("snow", "Snow"),
        75 => ("heavySnow", "Heavy snow"),
        77 => ("snow", "Snow grains"),
        80 | 81 => ("rain", "Rain showers"),
        82 => ("heavyRain", "Violent rain showers"),
        85 | 86 => ("snow", "Snow showers"),
        95 => ("thunderstorms", "Thunderstorm"),
        96 | 99 => ("thunderstorms", "Thunderstorm with hail"),
        _ => ("unknown", "Unknown"),
    }
}
