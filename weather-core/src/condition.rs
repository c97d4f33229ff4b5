//! Maps OpenWeather condition codes to icons and background themes.
//!
//! Code groups: https://openweathermap.org/weather-conditions

use serde::{Deserialize, Serialize};

const THUNDERSTORM: std::ops::Range<i32> = 200..300;
const DRIZZLE: std::ops::Range<i32> = 300..400;
const RAIN: std::ops::Range<i32> = 500..600;
const SNOW: std::ops::Range<i32> = 600..700;
const ATMOSPHERE: std::ops::Range<i32> = 700..800;
const CLEAR: i32 = 800;
const FEW_CLOUDS: i32 = 801;
const FREEZING_RAIN: i32 = 511;

/// Icon shown next to a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Icon {
    Lightning,
    Drizzle,
    Rain,
    Snow,
    Fog,
    Sun,
    CloudSun,
    #[default]
    Cloud,
}

impl Icon {
    /// Fallback for anything unrecognised.
    pub const DEFAULT: Icon = Icon::Cloud;

    /// Name of the asset in the icon library.
    pub fn asset_name(&self) -> &'static str {
        match self {
            Icon::Lightning => "cloud-lightning",
            Icon::Drizzle => "cloud-drizzle",
            Icon::Rain => "cloud-rain",
            Icon::Snow => "cloud-snow",
            Icon::Fog => "cloud-fog",
            Icon::Sun => "sun",
            Icon::CloudSun => "cloud-sun",
            Icon::Cloud => "cloud",
        }
    }

    /// Terminal rendering of the icon.
    pub fn glyph(&self) -> &'static str {
        match self {
            Icon::Lightning => "⛈",
            Icon::Drizzle => "🌦",
            Icon::Rain => "🌧",
            Icon::Snow => "🌨",
            Icon::Fog => "🌫",
            Icon::Sun => "☀",
            Icon::CloudSun => "⛅",
            Icon::Cloud => "☁",
        }
    }
}

/// Background theme for the whole dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Theme {
    ClearDay,
    ClearNight,
    CloudyDay,
    CloudyNight,
    RainDay,
    RainNight,
    SnowDay,
    SnowNight,
    Storm,
    FogDay,
    FogNight,
    DefaultDay,
    DefaultNight,
}

impl Theme {
    /// Theme used before any conditions are loaded.
    pub const DEFAULT_DAY: Theme = Theme::DefaultDay;

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::ClearDay => "clear-day",
            Theme::ClearNight => "clear-night",
            Theme::CloudyDay => "cloudy-day",
            Theme::CloudyNight => "cloudy-night",
            Theme::RainDay => "rain-day",
            Theme::RainNight => "rain-night",
            Theme::SnowDay => "snow-day",
            Theme::SnowNight => "snow-night",
            Theme::Storm => "storm",
            Theme::FogDay => "fog-day",
            Theme::FogNight => "fog-night",
            Theme::DefaultDay => "default-day",
            Theme::DefaultNight => "default-night",
        }
    }

    /// Top and bottom colour of the background gradient, as `<hue>-<shade>`.
    pub fn gradient(&self) -> (&'static str, &'static str) {
        match self {
            Theme::ClearDay => ("blue-400", "blue-600"),
            Theme::ClearNight => ("indigo-900", "blue-900"),
            Theme::CloudyDay => ("blue-300", "blue-500"),
            Theme::CloudyNight => ("gray-800", "blue-900"),
            Theme::RainDay => ("gray-400", "blue-600"),
            Theme::RainNight => ("gray-900", "blue-800"),
            Theme::SnowDay => ("gray-200", "blue-300"),
            Theme::SnowNight => ("gray-800", "blue-900"),
            Theme::Storm => ("gray-700", "gray-900"),
            Theme::FogDay => ("gray-300", "gray-500"),
            Theme::FogNight => ("gray-700", "gray-900"),
            Theme::DefaultDay => ("blue-200", "blue-400"),
            Theme::DefaultNight => ("gray-800", "blue-900"),
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Foreground tone that stays readable on a theme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TextTone {
    Light,
    #[default]
    Dark,
}

pub fn classify_icon(condition_code: i32) -> Icon {
    match condition_code {
        c if THUNDERSTORM.contains(&c) => Icon::Lightning,
        c if DRIZZLE.contains(&c) => Icon::Drizzle,
        FREEZING_RAIN => Icon::Snow,
        c if RAIN.contains(&c) => Icon::Rain,
        c if SNOW.contains(&c) => Icon::Snow,
        c if ATMOSPHERE.contains(&c) => Icon::Fog,
        CLEAR => Icon::Sun,
        FEW_CLOUDS => Icon::CloudSun,
        _ => Icon::DEFAULT,
    }
}

/// Clear, clouds, rain (drizzle included), snow, thunderstorm, atmosphere, default.
pub fn classify_background(condition_code: i32, is_daytime: bool) -> Theme {
    let pick = |day, night| if is_daytime { day } else { night };

    match condition_code {
        CLEAR => pick(Theme::ClearDay, Theme::ClearNight),
        c if c > CLEAR && c < 900 => pick(Theme::CloudyDay, Theme::CloudyNight),
        c if DRIZZLE.contains(&c) || RAIN.contains(&c) => pick(Theme::RainDay, Theme::RainNight),
        c if SNOW.contains(&c) => pick(Theme::SnowDay, Theme::SnowNight),
        c if THUNDERSTORM.contains(&c) => Theme::Storm,
        c if ATMOSPHERE.contains(&c) => pick(Theme::FogDay, Theme::FogNight),
        _ => pick(Theme::DefaultDay, Theme::DefaultNight),
    }
}

/// Both ends are exclusive: exactly at sunrise or sunset counts as night.
pub fn is_daytime(now: i64, sunrise: i64, sunset: i64) -> bool {
    now > sunrise && now < sunset
}

/// Night backgrounds and storms are dark and need light text.
pub fn text_tone(condition_code: i32, is_daytime: bool) -> TextTone {
    if (!is_daytime && condition_code >= THUNDERSTORM.start) || THUNDERSTORM.contains(&condition_code) {
        TextTone::Light
    } else {
        TextTone::Dark
    }
}
