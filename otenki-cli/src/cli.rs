use std::sync::Arc;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use inquire::{Confirm, Password, PasswordDisplayMode};
use otenki_core::{
    Config, Coordinate, NominatimGeocoder, ProviderId, StaticLocationProvider, WeatherProvider,
    WeatherSession, classify, icon_for, provider::provider_from_config,
};
use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "otenki", version, about = "Current weather, hourly and daily forecast")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Configure credentials for a specific provider and make it the default.
    Configure {
        /// Provider short name, e.g. "openmeteo" or "openweather".
        provider: String,
    },

    /// Show weather for a location.
    Show {
        /// Latitude in degrees; defaults to the configured location.
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Longitude in degrees; defaults to the configured location.
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Provider to use instead of the configured default.
        #[arg(long)]
        provider: Option<String>,

        /// Print the snapshot as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print the normalized condition for a provider condition code.
    Classify {
        /// Condition code, e.g. "partlyCloudy".
        code: String,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { provider } => configure(&provider),
            Command::Show {
                lat,
                lon,
                provider,
                json,
            } => show(lat.zip(lon), provider.as_deref(), json).await,
            Command::Classify { code } => {
                let condition = classify(&code);
                println!("{} {condition}", icon_for(condition));
                Ok(())
            }
        }
    }
}

fn configure(provider: &str) -> anyhow::Result<()> {
    let id = ProviderId::try_from(provider)?;
    let mut config = Config::load()?;

    if id.requires_api_key() {
        let replace = match config.provider_api_key(id) {
            Some(_) => Confirm::new(&format!("An API key for '{id}' is already stored. Replace it?"))
                .with_default(false)
                .prompt()
                .context("Failed to read confirmation")?,
            None => true,
        };

        if replace {
            let api_key = Password::new(&format!("API key for {id}:"))
                .with_display_mode(PasswordDisplayMode::Masked)
                .without_confirmation()
                .prompt()
                .context("Failed to read API key")?;

            let api_key = api_key.trim();
            if api_key.is_empty() {
                bail!("API key must not be empty");
            }
            config.upsert_provider_api_key(id, api_key.to_string());
        }
    }

    config.set_default_provider(id);
    config.save()?;

    println!(
        "Default provider set to '{id}'. Config saved to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

/// Fails early, with a pointer to `configure`, for a provider missing its key.
fn ensure_configured(id: ProviderId, config: &Config) -> anyhow::Result<()> {
    if !config.is_provider_configured(id) {
        bail!("Provider '{id}' needs an API key. Run `otenki configure {id}` first.");
    }
    Ok(())
}

async fn show(location: Option<(f64, f64)>, provider: Option<&str>, json: bool) -> anyhow::Result<()> {
    let config = Config::load()?;

    let id = match provider {
        Some(name) => ProviderId::try_from(name)?,
        None => config.default_provider_id()?,
    };

    ensure_configured(id, &config)?;

    let coordinate = location
        .map(|(lat, lon)| Coordinate::new(lat, lon))
        .unwrap_or_else(|| config.location.coordinate());
    if !coordinate.is_valid() {
        bail!("Coordinates out of range: {coordinate}");
    }

    let weather: Arc<dyn WeatherProvider> = Arc::from(provider_from_config(id, &config)?);
    let geocoder = Arc::new(NominatimGeocoder::new()?);
    debug!(provider = %id, %coordinate, "Showing weather");

    let session = Arc::new(WeatherSession::new(
        weather,
        geocoder,
        config.session.geocode_cooldown(),
    ));
    let snapshot = session
        .run(StaticLocationProvider::new([coordinate]))
        .await
        .context("No weather was produced")?;

    if json {
        let out = serde_json::to_string_pretty(&snapshot)
            .context("Failed to serialize weather snapshot")?;
        println!("{out}");
    } else {
        print!("{}", render::Overlay(&snapshot));
    }

    Ok(())
}
