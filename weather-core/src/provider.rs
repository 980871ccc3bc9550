use crate::{
    Config,
    error::WeatherError,
    model::{Coordinates, PlaceCandidate, WeatherSnapshot},
    provider::{cache::CachingProvider, open_meteo::OpenMeteoProvider},
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod cache;
pub mod open_meteo;

/// The remote lookups the search pipeline depends on.
///
/// Implementations hold no search state; every call is independent.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Up to `count` geocoding matches for `name`, in upstream relevance order.
    ///
    /// A response without results is an empty list, not an error.
    async fn search_places(
        &self,
        name: &str,
        count: u32,
    ) -> Result<Vec<PlaceCandidate>, WeatherError>;

    /// Current conditions at exactly these coordinates.
    async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSnapshot, WeatherError>;

    /// Top match for a committed city. The first result is canonical.
    async fn resolve_coordinates(&self, city: &str) -> Result<Coordinates, WeatherError> {
        self.search_places(city, 1)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| WeatherError::CityNotFound(city.to_string()))
    }
}

/// Construct the Open-Meteo provider described by `config`, cached when a TTL is set.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    let open_meteo = OpenMeteoProvider::from_config(config)?;

    let provider: Arc<dyn WeatherProvider> = match config.cache_ttl() {
        Some(ttl) => Arc::new(CachingProvider::new(open_meteo, ttl)),
        None => Arc::new(open_meteo),
    };

    Ok(provider)
}
