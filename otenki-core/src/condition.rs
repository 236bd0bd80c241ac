//! Normalized weather conditions and the canonical classification table.

use serde::{Deserialize, Serialize};

/// The display vocabulary every provider code is reduced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Sunny,
    Cloudy,
    Rainy,
    Snowy,
    Foggy,
    Thunderstorm,
    Unknown,
}

impl Condition {
    pub const ALL: [Condition; 7] = [
        Condition::Sunny,
        Condition::Cloudy,
        Condition::Rainy,
        Condition::Snowy,
        Condition::Foggy,
        Condition::Thunderstorm,
        Condition::Unknown,
    ];

    pub const fn label(&self) -> &'static str {
        match self {
            Condition::Sunny => "Sunny",
            Condition::Cloudy => "Cloudy",
            Condition::Rainy => "Rainy",
            Condition::Snowy => "Snowy",
            Condition::Foggy => "Foggy",
            Condition::Thunderstorm => "Thunderstorm",
            Condition::Unknown => "Unknown",
        }
    }

    pub const fn icon(&self) -> &'static str {
        match self {
            Condition::Sunny => "☀️",
            Condition::Cloudy => "☁️",
            Condition::Rainy => "🌧️",
            Condition::Snowy => "❄️",
            Condition::Foggy => "🌫️",
            Condition::Thunderstorm => "⚡️",
            Condition::Unknown => "❓",
        }
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Provider condition codes understood by [`classify`].
///
/// Adapters translate their native codes into these tokens before building a
/// payload. Anything outside this list classifies as [`Condition::Unknown`].
pub const KNOWN_CONDITION_CODES: &[&str] = &[
    "blizzard",
    "blowingDust",
    "blowingSnow",
    "breezy",
    "clear",
    "cloudy",
    "drizzle",
    "flurries",
    "foggy",
    "freezingDrizzle",
    "freezingRain",
    "frigid",
    "hail",
    "haze",
    "heavyRain",
    "heavySnow",
    "hot",
    "hurricane",
    "isolatedThunderstorms",
    "mostlyClear",
    "mostlyCloudy",
    "partlyCloudy",
    "rain",
    "scatteredThunderstorms",
    "sleet",
    "smoky",
    "snow",
    "strongStorms",
    "sunFlurries",
    "sunShowers",
    "thunderstorms",
    "tropicalStorm",
    "windy",
    "wintryMix",
];

/// Maps a provider condition code to a [`Condition`]. Never fails.
///
/// Case and separators are ignored, so `mostlyClear`, `mostly_clear` and
/// `Mostly Clear` are the same code.
pub fn classify(code: &str) -> Condition {
    let key: String = code
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();

    match key.as_str() {
        // partly cloudy counts as the "mostly good" bucket
        "clear" | "mostlyclear" | "sunny" | "mostlysunny" | "partlycloudy" | "partlysunny" => {
            Condition::Sunny
        }
        "cloudy" | "mostlycloudy" | "overcast" => Condition::Cloudy,
        "foggy" | "fog" | "haze" | "mist" | "smoky" => Condition::Foggy,
        "rain" | "drizzle" | "heavyrain" | "showers" | "sunshowers" => Condition::Rainy,
        "thunderstorms" | "thunderstorm" | "isolatedthunderstorms" | "scatteredthunderstorms"
        | "strongstorms" | "tropicalstorm" | "hurricane" => Condition::Thunderstorm,
        "snow" | "heavysnow" | "flurries" | "sunflurries" | "blizzard" | "blowingsnow"
        | "sleet" | "wintrymix" | "freezingrain" | "freezingdrizzle" | "hail" | "ice" => {
            Condition::Snowy
        }
        _ => Condition::Unknown,
    }
}

/// Icon for a condition, for presentation layers that draw their own chrome.
pub fn icon_for(condition: Condition) -> &'static str {
    condition.icon()
}
