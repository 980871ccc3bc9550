//! Core library for the `weather` city lookup client.
//!
//! This crate defines:
//! - Configuration (endpoints, autocomplete tuning)
//! - The provider abstraction over the geocoding and forecast services
//! - Live suggestions with debouncing and staleness control
//! - The search controller and the two-stage coordinates → weather lookup
//! - A [`Session`] that composes them and publishes a renderable view
//!
//! It is used by `weather-cli`, but can also drive any other front end.

pub mod config;
pub mod controller;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod session;
pub mod suggest;
pub mod text;

pub use config::{AutocompleteSettings, Config};
pub use controller::{Key, SearchController};
pub use error::{WeatherError, error_message};
pub use model::{
    Coordinates, PlaceCandidate, WeatherCondition, WeatherSnapshot, classify_weather_code,
};
pub use orchestrator::{FetchOrchestrator, FetchStage, Screen};
pub use provider::{WeatherProvider, provider_from_config};
pub use session::{Intent, Session, SessionView};
pub use suggest::{SuggestionEngine, refine_candidates};
