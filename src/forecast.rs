//! OpenWeatherMap current-weather model and its display summary

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Current weather snapshot for one city (`/data/2.5/weather`, metric units)
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct WeatherForecast {
    pub base: String,
    pub clouds: Clouds,
    pub coord: Coord,
    pub dt: i64,
    pub id: i64,
    pub main: Readings,
    pub name: String,
    pub sys: Sys,
    pub timezone: i64,
    /// Metres
    pub visibility: u32,
    pub weather: Vec<Condition>,
    pub wind: Wind,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Clouds {
    pub all: u32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Readings {
    pub feels_like: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub temp: f64,
    pub temp_max: f64,
    pub temp_min: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Sys {
    pub country: Option<String>,
    pub sunrise: i64,
    pub sunset: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Condition {
    pub id: u32,
    pub main: String,
    pub description: String,
    pub icon: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct Wind {
    pub deg: f64,
    pub speed: f64,
}

impl WeatherForecast {
    pub fn condition(&self) -> Option<&Condition> {
        self.weather.first()
    }
}

const COMPASS: [&str; 17] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW", "N",
];

/// Compass point for a wind bearing in degrees
pub fn wind_direction(deg: f64) -> &'static str {
    let deg = deg.rem_euclid(360.0);
    let index = (deg / 22.5).floor() as usize;
    COMPASS[index.min(COMPASS.len() - 1)]
}

/// Glyph for an OpenWeatherMap icon code ("01d", "10n", ...)
pub fn condition_glyph(icon: &str) -> &'static str {
    match icon.get(..2) {
        Some("01") => "\u{2600}\u{fe0f}",
        Some("02") => "\u{26c5}",
        Some("03") | Some("04") => "\u{2601}\u{fe0f}",
        Some("09") | Some("10") => "\u{1f327}\u{fe0f}",
        Some("11") => "\u{26c8}\u{fe0f}",
        Some("13") => "\u{2744}\u{fe0f}",
        Some("50") => "\u{1f32b}\u{fe0f}",
        _ => "\u{1f321}\u{fe0f}",
    }
}

/// Display-ready strings for a forecast
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherSummary {
    pub name: String,
    pub icon: &'static str,
    pub temperature: String,
    pub feels_like: String,
    pub description: String,
    pub wind: String,
    pub clouds: String,
    pub pressure: String,
    pub humidity: String,
    pub visibility: String,
}

impl From<&WeatherForecast> for WeatherSummary {
    fn from(forecast: &WeatherForecast) -> Self {
        let name = match &forecast.sys.country {
            Some(country) if !country.is_empty() => format!("{}, {}", forecast.name, country),
            _ => forecast.name.clone(),
        };
        let (icon, description) = match forecast.condition() {
            Some(condition) => (
                condition_glyph(&condition.icon),
                capitalize(&condition.description),
            ),
            None => (condition_glyph(""), String::new()),
        };

        Self {
            name,
            icon,
            temperature: format!("{:.0}°C", forecast.main.temp),
            feels_like: format!("{:.0}°C", forecast.main.feels_like),
            description,
            wind: format!(
                "{:.1} m/s {}",
                forecast.wind.speed,
                wind_direction(forecast.wind.deg)
            ),
            clouds: format!("{}%", forecast.clouds.all),
            pressure: format!("{:.0} hPa", forecast.main.pressure),
            humidity: format!("{:.0}%", forecast.main.humidity),
            visibility: format!("{:.1} km", forecast.visibility as f64 / 1000.0),
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
