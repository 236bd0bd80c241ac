//! Drives the display: location updates in, snapshots out.
//!
//! A [`WeatherSession`] owns the flow around the pure aggregator. Each
//! refresh geocodes (rate-limited by a [`GeocodeGate`]) and fetches weather
//! concurrently, then publishes either the aggregated snapshot or the
//! fallback. Only the newest refresh may publish: every refresh takes a
//! ticket, and a result whose ticket has been superseded is dropped.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use chrono::{DateTime, Utc};
use tokio::{
    sync::{Mutex, watch},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    aggregate::{UNKNOWN_LOCATION, aggregate, fallback_snapshot},
    geocode::Geocoder,
    location::{LocationError, LocationProvider},
    model::{Coordinate, WeatherSnapshot},
    provider::WeatherProvider,
};

/// Minimum time between two successful reverse geocodes.
pub const DEFAULT_GEOCODE_COOLDOWN: Duration = Duration::from_secs(10);

/// Suppresses repeat geocoding within a cooldown window.
///
/// Only successful lookups start the window, so a failure is retried on the
/// very next update.
#[derive(Debug, Clone)]
pub struct GeocodeGate {
    cooldown: Duration,
    last_success: Option<DateTime<Utc>>,
}

impl GeocodeGate {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown, last_success: None }
    }

    pub fn should_request(&self, now: DateTime<Utc>) -> bool {
        match self.last_success {
            None => true,
            // a clock that went backwards opens the gate
            Some(last) => (now - last).to_std().map_or(true, |elapsed| elapsed >= self.cooldown),
        }
    }

    pub fn record_success(&mut self, now: DateTime<Utc>) {
        self.last_success = Some(now);
    }
}

impl Default for GeocodeGate {
    fn default() -> Self {
        Self::new(DEFAULT_GEOCODE_COOLDOWN)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// The snapshot is now the displayed state.
    Applied(WeatherSnapshot),
    /// A newer refresh started meanwhile; this result was dropped.
    Superseded,
}

#[derive(Debug)]
struct LabelState {
    gate: GeocodeGate,
    label: String,
}

pub struct WeatherSession {
    weather: Arc<dyn WeatherProvider>,
    geocoder: Arc<dyn Geocoder>,
    labels: Mutex<LabelState>,
    latest_ticket: AtomicU64,
    display: watch::Sender<Option<WeatherSnapshot>>,
}

impl std::fmt::Debug for WeatherSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherSession")
            .field("weather", &self.weather)
            .field("geocoder", &self.geocoder)
            .field("latest_ticket", &self.latest_ticket.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl WeatherSession {
    pub fn new(
        weather: Arc<dyn WeatherProvider>,
        geocoder: Arc<dyn Geocoder>,
        geocode_cooldown: Duration,
    ) -> Self {
        let (display, _) = watch::channel(None);
        Self {
            weather,
            geocoder,
            labels: Mutex::new(LabelState {
                gate: GeocodeGate::new(geocode_cooldown),
                label: UNKNOWN_LOCATION.to_string(),
            }),
            latest_ticket: AtomicU64::new(0),
            display,
        }
    }

    /// Displayed state; `None` until the first refresh completes.
    pub fn subscribe(&self) -> watch::Receiver<Option<WeatherSnapshot>> {
        self.display.subscribe()
    }

    pub fn current(&self) -> Option<WeatherSnapshot> {
        self.display.borrow().clone()
    }

    pub async fn refresh(&self, coordinate: Coordinate) -> RefreshOutcome {
        self.refresh_at(coordinate, Utc::now()).await
    }

    /// One fetch-and-publish cycle for `coordinate`, stamped with `now`.
    pub async fn refresh_at(&self, coordinate: Coordinate, now: DateTime<Utc>) -> RefreshOutcome {
        let ticket = self.next_ticket();
        debug!(ticket, %coordinate, "Refreshing weather");

        let (label, fetched) =
            tokio::join!(self.location_label(coordinate, now), self.weather.fetch_weather(coordinate));

        let snapshot = match fetched {
            Ok(raw) => aggregate(&raw, &label, now).unwrap_or_else(|e| {
                warn!("Showing fallback weather: {e}");
                fallback_snapshot(&label, now)
            }),
            Err(e) => {
                warn!("Showing fallback weather, fetch failed: {e:#}");
                fallback_snapshot(&label, now)
            }
        };

        self.publish(ticket, snapshot)
    }

    /// A failed or denied location read replaces the display with the
    /// fallback, keeping the label already on screen, and invalidates any
    /// refresh still in flight.
    pub fn report_location_failure(&self, error: &LocationError, now: DateTime<Utc>) -> RefreshOutcome {
        let ticket = self.next_ticket();
        warn!("Showing fallback weather, location unavailable: {error}");

        let label = self
            .display
            .borrow()
            .as_ref()
            .map_or_else(|| UNKNOWN_LOCATION.to_string(), |shown| shown.location_label.clone());

        self.publish(ticket, fallback_snapshot(&label, now))
    }

    /// Follows `locations` until the stream ends, then returns the final
    /// displayed snapshot.
    ///
    /// A new update aborts the refresh still running for the previous one.
    pub async fn run<L: LocationProvider>(self: Arc<Self>, mut locations: L) -> Option<WeatherSnapshot> {
        let mut in_flight: Option<JoinHandle<RefreshOutcome>> = None;

        while let Some(update) = locations.next_update().await {
            if let Some(handle) = in_flight.take() {
                handle.abort();
            }

            match update {
                Ok(coordinate) => {
                    let session = Arc::clone(&self);
                    in_flight = Some(tokio::spawn(async move { session.refresh(coordinate).await }));
                }
                Err(error) => {
                    self.report_location_failure(&error, Utc::now());
                }
            }
        }

        if let Some(handle) = in_flight {
            if let Err(e) = handle.await {
                warn!("Weather refresh task failed: {e}");
            }
        }

        self.current()
    }

    fn next_ticket(&self) -> u64 {
        self.latest_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn location_label(&self, coordinate: Coordinate, now: DateTime<Utc>) -> String {
        let mut state = self.labels.lock().await;

        if !state.gate.should_request(now) {
            debug!(label = %state.label, "Geocode skipped within cooldown");
            return state.label.clone();
        }

        // The lock is held across the lookup, so concurrent refreshes share
        // one request.
        let label = match self.geocoder.resolve_location_label(coordinate).await {
            Ok(label) => {
                state.gate.record_success(now);
                label
            }
            Err(e) => {
                warn!(%coordinate, "Reverse geocoding failed: {e:#}");
                UNKNOWN_LOCATION.to_string()
            }
        };
        state.label = label.clone();
        label
    }

    fn publish(&self, ticket: u64, snapshot: WeatherSnapshot) -> RefreshOutcome {
        let mut outcome = RefreshOutcome::Superseded;

        // The ticket check and the store happen under the channel's lock,
        // so an older result can never overwrite a newer one.
        self.display.send_if_modified(|slot| {
            if self.latest_ticket.load(Ordering::SeqCst) != ticket {
                return false;
            }
            *slot = Some(snapshot.clone());
            outcome = RefreshOutcome::Applied(snapshot);
            true
        });

        match &outcome {
            RefreshOutcome::Applied(shown) => info!(
                ticket,
                location = %shown.location_label,
                fallback = shown.is_fallback(),
                "Weather updated"
            ),
            RefreshOutcome::Superseded => debug!(ticket, "Discarding superseded weather result"),
        }
        outcome
    }
}
