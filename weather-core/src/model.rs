use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One geocoding match, exactly as the upstream search returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceCandidate {
    pub id: i64,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub country: String,
    #[serde(default)]
    pub population: Option<u64>,
}

impl PlaceCandidate {
    /// "Name, Country", or just the name when the country is unknown.
    pub fn label(&self) -> String {
        if self.country.is_empty() {
            self.name.clone()
        } else {
            format!("{}, {}", self.name, self.country)
        }
    }

    /// Two candidates with the same key are the same place for display.
    pub fn display_key(&self) -> (String, String) {
        (self.name.clone(), self.country.clone())
    }
}

/// The top geocoding match for a committed city; drives the weather lookup.
pub type Coordinates = PlaceCandidate;

/// Current conditions at a location, field names normalised, values untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub wind_speed: f64,
    pub weather_code: i32,
    pub humidity: Option<f64>,
    pub feels_like: Option<f64>,
    pub fetched_at: DateTime<Utc>,
}

impl WeatherSnapshot {
    pub fn condition(&self) -> WeatherCondition {
        WeatherCondition::from_code(self.weather_code)
    }
}

/// Coarse condition buckets over WMO weather codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherCondition {
    ClearSky,
    PartlyCloudy,
    Fog,
    Rain,
    Snow,
    Thunderstorm,
    Unknown,
}

impl WeatherCondition {
    /// Total over `i32`; both ends of every range are inclusive.
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::ClearSky,
            1..=3 => Self::PartlyCloudy,
            45..=48 => Self::Fog,
            51..=67 => Self::Rain,
            71..=77 => Self::Snow,
            95..=99 => Self::Thunderstorm,
            _ => Self::Unknown,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ClearSky => "Clear sky",
            Self::PartlyCloudy => "Partly cloudy",
            Self::Fog => "Fog",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Thunderstorm => "Thunderstorm",
            Self::Unknown => "Unknown",
        }
    }
}

/// Label for a raw weather code.
pub fn classify_weather_code(code: i32) -> &'static str {
    WeatherCondition::from_code(code).description()
}
