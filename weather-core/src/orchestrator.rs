//! Two-stage lookup for a committed city: coordinates first, then the
//! weather at exactly those coordinates.

use std::sync::Arc;
use tokio::sync::mpsc;

use crate::{
    error::WeatherError,
    model::{Coordinates, WeatherSnapshot},
    provider::WeatherProvider,
};

/// Completions of the two stages, tagged with the cycle that started them.
#[derive(Debug)]
pub enum FetchEvent {
    CoordinatesResolved {
        generation: u64,
        city: String,
        result: Result<Coordinates, WeatherError>,
    },
    WeatherFetched {
        generation: u64,
        city: String,
        result: Result<WeatherSnapshot, WeatherError>,
    },
}

/// Where the current cycle is.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchStage {
    Idle,
    ResolvingCoordinates {
        city: String,
    },
    FetchingWeather {
        city: String,
        place: Coordinates,
    },
    Ready {
        city: String,
        place: Coordinates,
        weather: WeatherSnapshot,
    },
    GeocodingFailed {
        city: String,
        error: WeatherError,
    },
    WeatherFailed {
        city: String,
        place: Coordinates,
        error: WeatherError,
    },
}

/// What the presentation layer should show. Exactly one at a time.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    Empty,
    Loading,
    Error(WeatherError),
    Result {
        place: Coordinates,
        weather: WeatherSnapshot,
    },
}

#[derive(Debug)]
pub struct FetchOrchestrator {
    provider: Arc<dyn WeatherProvider>,
    events: mpsc::UnboundedSender<FetchEvent>,
    generation: u64,
    stage: FetchStage,
}

impl FetchOrchestrator {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> (Self, mpsc::UnboundedReceiver<FetchEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let orchestrator = Self {
            provider,
            events,
            generation: 0,
            stage: FetchStage::Idle,
        };
        (orchestrator, rx)
    }

    pub fn stage(&self) -> &FetchStage {
        &self.stage
    }

    /// The city driving the current cycle, if any.
    pub fn committed_city(&self) -> Option<&str> {
        match &self.stage {
            FetchStage::Idle => None,
            FetchStage::ResolvingCoordinates { city }
            | FetchStage::FetchingWeather { city, .. }
            | FetchStage::Ready { city, .. }
            | FetchStage::GeocodingFailed { city, .. }
            | FetchStage::WeatherFailed { city, .. } => Some(city),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(
            self.stage,
            FetchStage::ResolvingCoordinates { .. } | FetchStage::FetchingWeather { .. }
        )
    }

    pub fn has_weather(&self) -> bool {
        matches!(self.stage, FetchStage::Ready { .. })
    }

    /// Autocomplete stays quiet while a lookup runs or a result is on screen.
    pub fn suppresses_suggestions(&self) -> bool {
        self.is_loading() || self.has_weather()
    }

    pub fn screen(&self) -> Screen {
        match &self.stage {
            FetchStage::Idle => Screen::Empty,
            FetchStage::ResolvingCoordinates { .. } | FetchStage::FetchingWeather { .. } => {
                Screen::Loading
            }
            FetchStage::GeocodingFailed { error, .. } | FetchStage::WeatherFailed { error, .. } => {
                Screen::Error(error.clone())
            }
            FetchStage::Ready { place, weather, .. } => Screen::Result {
                place: place.clone(),
                weather: weather.clone(),
            },
        }
    }

    /// Start a fresh cycle for `city`. Whatever an earlier cycle still has in
    /// flight becomes stale.
    pub fn commit(&mut self, city: String) {
        self.generation += 1;
        let generation = self.generation;

        tracing::info!("Looking up '{}'", city);
        self.stage = FetchStage::ResolvingCoordinates { city: city.clone() };

        let events = self.events.clone();
        let provider = Arc::clone(&self.provider);
        tokio::spawn(async move {
            let result = provider.resolve_coordinates(&city).await;
            let _ = events.send(FetchEvent::CoordinatesResolved {
                generation,
                city,
                result,
            });
        });
    }

    /// Forget a finished result or error. An in-flight cycle is left alone.
    pub fn invalidate(&mut self) {
        if !self.is_loading() && self.stage != FetchStage::Idle {
            tracing::debug!("Clearing previous lookup");
            self.stage = FetchStage::Idle;
        }
    }

    /// Apply a stage completion. Returns `true` if it belonged to the current cycle.
    pub fn handle(&mut self, event: FetchEvent) -> bool {
        match event {
            FetchEvent::CoordinatesResolved {
                generation,
                city,
                result,
            } => {
                let current = matches!(
                    &self.stage,
                    FetchStage::ResolvingCoordinates { city: c } if *c == city
                );
                if generation != self.generation || !current {
                    tracing::debug!("Dropping stale coordinates for '{}'", city);
                    return false;
                }

                match result {
                    Ok(place) => self.fetch_weather(generation, city, place),
                    Err(error) => {
                        tracing::warn!("Geocoding '{}' failed: {}", city, error);
                        self.stage = FetchStage::GeocodingFailed { city, error };
                    }
                }
                true
            }
            FetchEvent::WeatherFetched {
                generation,
                city,
                result,
            } => {
                if generation != self.generation {
                    tracing::debug!("Dropping stale weather for '{}'", city);
                    return false;
                }
                let FetchStage::FetchingWeather {
                    city: current,
                    place,
                } = &self.stage
                else {
                    tracing::debug!("Dropping weather for '{}' outside of a weather fetch", city);
                    return false;
                };
                if *current != city {
                    tracing::debug!("Dropping stale weather for '{}'", city);
                    return false;
                }

                let place = place.clone();
                match result {
                    Ok(weather) => {
                        tracing::info!(
                            "Weather for {}: {}°C, code {}",
                            place.label(),
                            weather.temperature,
                            weather.weather_code
                        );
                        self.stage = FetchStage::Ready {
                            city,
                            place,
                            weather,
                        };
                    }
                    Err(error) => {
                        tracing::warn!("Weather lookup for '{}' failed: {}", city, error);
                        self.stage = FetchStage::WeatherFailed { city, place, error };
                    }
                }
                true
            }
        }
    }

    fn fetch_weather(&mut self, generation: u64, city: String, place: Coordinates) {
        let (latitude, longitude) = (place.latitude, place.longitude);
        tracing::debug!("Resolved '{}' to {}, {}", city, latitude, longitude);

        self.stage = FetchStage::FetchingWeather {
            city: city.clone(),
            place,
        };

        let events = self.events.clone();
        let provider = Arc::clone(&self.provider);
        tokio::spawn(async move {
            let result = provider.fetch_weather(latitude, longitude).await;
            let _ = events.send(FetchEvent::WeatherFetched {
                generation,
                city,
                result,
            });
        });
    }
}
