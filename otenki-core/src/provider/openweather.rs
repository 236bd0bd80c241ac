use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    model::{Coordinate, RawCurrent, RawDailySample, RawHourlySample, RawWeatherPayload},
    units::{Speed, Temperature},
};

use super::{WeatherProvider, truncate_body};

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/3.0";

/// OpenWeather One Call 3.0 adapter. Requires an API key with a One Call
/// subscription.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: u16,
    description: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    temp: f64,
    humidity: f64,
    wind_speed: f64,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwHourly {
    dt: i64,
    temp: f64,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwDailyTemp {
    min: f64,
    max: f64,
}

#[derive(Debug, Deserialize)]
struct OwDaily {
    dt: i64,
    temp: OwDailyTemp,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwOneCallResponse {
    #[serde(default)]
    timezone_offset: i32,
    current: Option<OwCurrent>,
    #[serde(default)]
    hourly: Vec<OwHourly>,
    #[serde(default)]
    daily: Vec<OwDaily>,
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self), fields(lat = %coordinate.latitude, lon = %coordinate.longitude))]
    async fn fetch_weather(&self, coordinate: Coordinate) -> Result<RawWeatherPayload> {
        if !coordinate.is_valid() {
            bail!("Invalid coordinates: {coordinate}");
        }

        let url = format!("{}/onecall", self.base_url);
        debug!(url = %url, "Fetching OpenWeather one call");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("appid", self.api_key.clone()),
                ("units", "metric".to_string()),
                ("exclude", "minutely,alerts".to_string()),
            ])
            .send()
            .await
            .context("Failed to send request to OpenWeather (one call)")?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read OpenWeather one call response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "OpenWeather one call request failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let parsed: OwOneCallResponse =
            serde_json::from_str(&body).context("Failed to parse OpenWeather one call JSON")?;

        into_payload(parsed)
    }
}

fn into_payload(parsed: OwOneCallResponse) -> Result<RawWeatherPayload> {
    let offset = FixedOffset::east_opt(parsed.timezone_offset)
        .ok_or_else(|| anyhow!("OpenWeather returned an invalid timezone offset"))?;

    let current = parsed.current.map(|c| {
        let (condition_code, description) = describe(&c.weather);
        RawCurrent {
            condition_code: condition_code.to_string(),
            description,
            temperature: Temperature::celsius(c.temp),
            humidity: c.humidity / 100.0,
            wind_speed: Speed::meters_per_second(c.wind_speed),
        }
    });

    let hourly = parsed
        .hourly
        .into_iter()
        .map(|h| {
            Ok(RawHourlySample {
                time: unix_to_utc(h.dt)?,
                condition_code: describe(&h.weather).0.to_string(),
                temperature: Temperature::celsius(h.temp),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // `dt` is around local midday, so the local calendar date is the day meant.
    let daily = parsed
        .daily
        .into_iter()
        .map(|d| {
            Ok(RawDailySample {
                date: unix_to_utc(d.dt)?.with_timezone(&offset).date_naive(),
                condition_code: describe(&d.weather).0.to_string(),
                low: Temperature::celsius(d.temp.min),
                high: Temperature::celsius(d.temp.max),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(RawWeatherPayload {
        current,
        hourly,
        daily,
        utc_offset_seconds: parsed.timezone_offset,
    })
}

fn describe(weather: &[OwWeather]) -> (&'static str, String) {
    weather.first().map_or_else(
        || ("unknown", "Unknown".to_string()),
        |w| (condition_code(w.id), w.description.clone()),
    )
}

/// OpenWeather condition id -> condition code.
///
/// See: <https://openweathermap.org/weather-conditions>
fn condition_code(id: u16) -> &'static str {
    match id {
        200..=232 => "thunderstorms",
        300..=321 => "drizzle",
        500 | 501 | 520 | 521 => "rain",
        502..=504 | 522 | 531 => "heavyRain",
        511 => "freezingRain",
        600 | 601 | 620 | 621 => "snow",
        602 | 622 => "heavySnow",
        611..=616 => "sleet",
        701 | 741 => "foggy",
        711 => "smoky",
        721 => "haze",
        731 | 751 | 761 => "blowingDust",
        781 => "hurricane",
        800 => "clear",
        801 => "mostlyClear",
        802 => "partlyCloudy",
        803 => "mostlyCloudy",
        804 => "cloudy",
        _ => "unknown",
    }
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(ts, 0).ok_or_else(|| anyhow!("OpenWeather timestamp out of range: {ts}"))
}
