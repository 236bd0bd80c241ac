//! Core library for the `otenki` weather display.
//!
//! This crate defines:
//! - Condition classification and icons
//! - Aggregation of raw provider payloads into display-ready snapshots
//! - Abstractions over weather providers, geocoders and location sources
//! - The session that keeps the displayed snapshot current
//! - Configuration handling
//!
//! It is used by `otenki-cli`, but can also be reused by other front ends.

pub mod aggregate;
pub mod condition;
pub mod config;
pub mod geocode;
pub mod location;
pub mod model;
pub mod provider;
pub mod session;
pub mod units;

pub use aggregate::{AggregateError, aggregate, fallback_snapshot};
pub use condition::{Condition, classify, icon_for};
pub use config::{Config, LocationConfig, ProviderConfig, SessionConfig};
pub use geocode::{Geocoder, NominatimGeocoder};
pub use location::{LocationError, LocationProvider, StaticLocationProvider};
pub use model::{
    Coordinate, CurrentConditions, DailyEntry, HourlyEntry, RawCurrent, RawDailySample,
    RawHourlySample, RawWeatherPayload, Reading, SnapshotStatus, WeatherSnapshot,
};
pub use provider::{ProviderId, WeatherProvider};
pub use session::{GeocodeGate, RefreshOutcome, WeatherSession};
