//! Keeps successful lookups fresh for a while so re-searching the same city
//! does not hit the network again.

use async_trait::async_trait;
use std::{collections::HashMap, hash::Hash, time::Duration};
use tokio::{sync::Mutex, time::Instant};

use crate::{
    error::WeatherError,
    model::{Coordinates, PlaceCandidate, WeatherSnapshot},
};

use super::WeatherProvider;

#[derive(Debug)]
struct Entry<T> {
    stored_at: Instant,
    value: T,
}

/// Wraps a provider, caching `resolve_coordinates` by city and
/// `fetch_weather` by exact coordinates. Failures are never cached and
/// suggestion searches always go through.
#[derive(Debug)]
pub struct CachingProvider<P> {
    inner: P,
    ttl: Duration,
    places: Mutex<HashMap<String, Entry<Coordinates>>>,
    weather: Mutex<HashMap<(u64, u64), Entry<WeatherSnapshot>>>,
}

impl<P: WeatherProvider> CachingProvider<P> {
    pub fn new(inner: P, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            places: Mutex::new(HashMap::new()),
            weather: Mutex::new(HashMap::new()),
        }
    }

    fn fresh<T: Clone>(&self, entry: Option<&Entry<T>>) -> Option<T> {
        entry
            .filter(|e| e.stored_at.elapsed() < self.ttl)
            .map(|e| e.value.clone())
    }
}

/// Insert `value`, dropping every entry that has outlived `ttl` on the way.
fn store<K: Eq + Hash, T>(map: &mut HashMap<K, Entry<T>>, ttl: Duration, key: K, value: T) {
    map.retain(|_, entry| entry.stored_at.elapsed() < ttl);
    map.insert(
        key,
        Entry {
            stored_at: Instant::now(),
            value,
        },
    );
}

fn coordinate_key(latitude: f64, longitude: f64) -> (u64, u64) {
    (latitude.to_bits(), longitude.to_bits())
}

#[async_trait]
impl<P: WeatherProvider> WeatherProvider for CachingProvider<P> {
    async fn search_places(
        &self,
        name: &str,
        count: u32,
    ) -> Result<Vec<PlaceCandidate>, WeatherError> {
        self.inner.search_places(name, count).await
    }

    async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let key = coordinate_key(latitude, longitude);

        if let Some(hit) = self.fresh(self.weather.lock().await.get(&key)) {
            tracing::debug!("Weather cache hit for {}, {}", latitude, longitude);
            return Ok(hit);
        }

        let snapshot = self.inner.fetch_weather(latitude, longitude).await?;
        store(&mut *self.weather.lock().await, self.ttl, key, snapshot.clone());
        Ok(snapshot)
    }

    async fn resolve_coordinates(&self, city: &str) -> Result<Coordinates, WeatherError> {
        if let Some(hit) = self.fresh(self.places.lock().await.get(city)) {
            tracing::debug!("Geocoding cache hit for '{}'", city);
            return Ok(hit);
        }

        let place = self.inner.resolve_coordinates(city).await?;
        store(&mut *self.places.lock().await, self.ttl, city.to_string(), place.clone());
        Ok(place)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Default)]
    struct Counting {
        resolves: AtomicUsize,
        forecasts: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl WeatherProvider for Counting {
        async fn search_places(
            &self,
            name: &str,
            _count: u32,
        ) -> Result<Vec<PlaceCandidate>, WeatherError> {
            self.resolves.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(WeatherError::NetworkFailure("offline".into()));
            }
            Ok(vec![PlaceCandidate {
                id: 1,
                name: name.to_string(),
                latitude: 10.0,
                longitude: 20.0,
                country: "Testland".into(),
                population: Some(50_000),
            }])
        }

        async fn fetch_weather(
            &self,
            _latitude: f64,
            _longitude: f64,
        ) -> Result<WeatherSnapshot, WeatherError> {
            self.forecasts.fetch_add(1, Ordering::SeqCst);
            Ok(WeatherSnapshot {
                temperature: 12.0,
                wind_speed: 3.0,
                weather_code: 1,
                humidity: Some(70.0),
                feels_like: Some(11.0),
                fetched_at: Utc::now(),
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_lookups_within_ttl_hit_cache() {
        let cache = CachingProvider::new(Counting::default(), Duration::from_secs(300));

        cache.resolve_coordinates("Oslo").await.expect("resolve");
        cache.resolve_coordinates("Oslo").await.expect("resolve");
        cache.fetch_weather(10.0, 20.0).await.expect("weather");
        cache.fetch_weather(10.0, 20.0).await.expect("weather");

        assert_eq!(cache.inner.resolves.load(Ordering::SeqCst), 1);
        assert_eq!(cache.inner.forecasts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn entries_expire_after_ttl() {
        let cache = CachingProvider::new(Counting::default(), Duration::from_secs(300));

        cache.resolve_coordinates("Oslo").await.expect("resolve");
        tokio::time::advance(Duration::from_secs(301)).await;
        cache.resolve_coordinates("Oslo").await.expect("resolve");

        assert_eq!(cache.inner.resolves.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entries_are_evicted_on_insert() {
        let cache = CachingProvider::new(Counting::default(), Duration::from_secs(300));

        cache.resolve_coordinates("Oslo").await.expect("resolve");
        cache.fetch_weather(10.0, 20.0).await.expect("weather");
        tokio::time::advance(Duration::from_secs(301)).await;
        cache.resolve_coordinates("Bergen").await.expect("resolve");
        cache.fetch_weather(60.0, 5.0).await.expect("weather");

        let places = cache.places.lock().await;
        assert_eq!(places.len(), 1);
        assert!(places.contains_key("Bergen"));
        assert_eq!(cache.weather.lock().await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failures_are_not_cached() {
        let inner = Counting {
            fail: true,
            ..Counting::default()
        };
        let cache = CachingProvider::new(inner, Duration::from_secs(300));

        assert!(cache.resolve_coordinates("Oslo").await.is_err());
        assert!(cache.resolve_coordinates("Oslo").await.is_err());

        assert_eq!(cache.inner.resolves.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn suggestion_searches_bypass_cache() {
        let cache = CachingProvider::new(Counting::default(), Duration::from_secs(300));

        cache.search_places("Os", 10).await.expect("search");
        cache.search_places("Os", 10).await.expect("search");

        assert_eq!(cache.inner.resolves.load(Ordering::SeqCst), 2);
    }
}
