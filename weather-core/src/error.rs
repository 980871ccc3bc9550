use thiserror::Error;

use crate::text;

/// Every failure the lookup pipeline can surface.
///
/// The string payloads carry diagnostic detail for logs only; what the user
/// sees is decided by [`WeatherError::user_message`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// Geocoding answered, but with no match for the requested name.
    #[error("city not found: {0}")]
    CityNotFound(String),

    /// Geocoding request could not be completed or returned a non-success status.
    #[error("geocoding request failed: {0}")]
    NetworkFailure(String),

    /// Forecast request could not be completed or returned a non-success status.
    #[error("weather service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The query is not a plausible city name. Never reaches the network.
    #[error("invalid city name: {0}")]
    Validation(String),
}

impl WeatherError {
    /// The single message shown for this kind of failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::CityNotFound(_) => text::ERROR_CITY_NOT_FOUND,
            WeatherError::NetworkFailure(_) => text::ERROR_NETWORK,
            WeatherError::ServiceUnavailable(_) => text::ERROR_SERVICE_UNAVAILABLE,
            WeatherError::Validation(_) => text::ERROR_CITY_WITH_NUMBERS,
        }
    }
}

/// Message for any error reaching the presentation layer.
///
/// Domain errors get their fixed text; anything else is shown with its
/// context chain, or the generic text when it has nothing to say.
pub fn error_message(err: &anyhow::Error) -> String {
    if let Some(weather) = err.downcast_ref::<WeatherError>() {
        return weather.user_message().to_string();
    }

    let msg = format!("{err:#}");
    if msg.trim().is_empty() {
        text::ERROR_GENERIC.to_string()
    } else {
        msg
    }
}
