//! Where the device is.

use std::{collections::VecDeque, fmt::Debug, time::Duration};

use async_trait::async_trait;
use thiserror::Error;

use crate::model::Coordinate;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location error: {0}")]
    Other(String),
}

/// A stream of coordinate updates.
#[async_trait]
pub trait LocationProvider: Send + Debug {
    /// Waits for the next update; `None` once no more updates will come.
    async fn next_update(&mut self) -> Option<Result<Coordinate, LocationError>>;
}

/// Replays a fixed list of updates, optionally spaced out in time.
///
/// Covers the fixed-location mode of the display (a pinned map point) and
/// scripted sequences in tests.
#[derive(Debug, Clone)]
pub struct StaticLocationProvider {
    updates: VecDeque<Result<Coordinate, LocationError>>,
    interval: Option<Duration>,
    started: bool,
}

impl StaticLocationProvider {
    pub fn new(coordinates: impl IntoIterator<Item = Coordinate>) -> Self {
        Self::from_updates(coordinates.into_iter().map(Ok))
    }

    pub fn from_updates(updates: impl IntoIterator<Item = Result<Coordinate, LocationError>>) -> Self {
        Self {
            updates: updates.into_iter().collect(),
            interval: None,
            started: false,
        }
    }

    /// Waits `interval` before every update after the first.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }
}

#[async_trait]
impl LocationProvider for StaticLocationProvider {
    async fn next_update(&mut self) -> Option<Result<Coordinate, LocationError>> {
        if self.updates.is_empty() {
            return None;
        }
        if let (true, Some(interval)) = (self.started, self.interval) {
            tokio::time::sleep(interval).await;
        }
        self.started = true;
        self.updates.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_updates_in_order() {
        let tokyo = Coordinate::new(35.6812, 139.7671);
        let osaka = Coordinate::new(34.7025, 135.4959);
        let mut provider = StaticLocationProvider::new([tokyo, osaka]);

        assert_eq!(provider.next_update().await, Some(Ok(tokyo)));
        assert_eq!(provider.next_update().await, Some(Ok(osaka)));
        assert_eq!(provider.next_update().await, None);
    }

    #[tokio::test]
    async fn replays_failures() {
        let mut provider = StaticLocationProvider::from_updates([Err(LocationError::PermissionDenied)]);
        assert_eq!(provider.next_update().await, Some(Err(LocationError::PermissionDenied)));
        assert_eq!(provider.next_update().await, None);
    }

    #[tokio::test]
    async fn interval_spaces_later_updates() {
        let tokyo = Coordinate::new(35.6812, 139.7671);
        let mut provider =
            StaticLocationProvider::new([tokyo, tokyo]).with_interval(Duration::from_millis(20));

        let start = tokio::time::Instant::now();
        provider.next_update().await;
        provider.next_update().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn error_messages() {
        assert_eq!(LocationError::PermissionDenied.to_string(), "Location permission denied");
        assert!(LocationError::Other("gps off".into()).to_string().contains("gps off"));
    }
}
