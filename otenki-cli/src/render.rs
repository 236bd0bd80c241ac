//! Plain-text presentation of a snapshot.

use std::fmt;

use otenki_core::{WeatherSnapshot, units::format_temperature};

/// The overlay followed by the hourly and daily lists.
///
/// Empty lists are left out, so a fallback snapshot renders as the overlay
/// alone.
pub struct Overlay<'a>(pub &'a WeatherSnapshot);

impl fmt::Display for Overlay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.0;
        let current = &snapshot.current;

        writeln!(f, "📍 {}", snapshot.location_label)?;
        writeln!(
            f,
            "{} {}  {}",
            current.icon(),
            current.temperature_text(),
            current.description
        )?;
        writeln!(
            f,
            "💧 {}  🌬️ {}",
            current.humidity_text(),
            current.wind_speed_text()
        )?;

        if !snapshot.hourly.is_empty() {
            writeln!(f, "\nHourly")?;
            for hour in &snapshot.hourly {
                writeln!(
                    f,
                    "  {:<6} {}  {}",
                    hour.time,
                    hour.condition.icon(),
                    hour.temperature_text()
                )?;
            }
        }

        if !snapshot.daily.is_empty() {
            writeln!(f, "\nDaily")?;
            for day in &snapshot.daily {
                writeln!(
                    f,
                    "  {:<6} {}  {} / {}",
                    day.date,
                    day.condition.icon(),
                    format_temperature(day.low_c),
                    format_temperature(day.high_c)
                )?;
            }
        }

        Ok(())
    }
}
