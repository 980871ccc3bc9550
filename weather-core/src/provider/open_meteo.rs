use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    Config,
    error::WeatherError,
    model::{PlaceCandidate, WeatherSnapshot},
};

use super::WeatherProvider;

const CURRENT_FIELDS: [&str; 5] = [
    "temperature_2m",
    "weather_code",
    "wind_speed_10m",
    "relative_humidity_2m",
    "apparent_temperature",
];

/// Open-Meteo geocoding + forecast APIs. No API key required.
#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    http: Client,
    search_url: String,
    forecast_url: String,
}

impl OpenMeteoProvider {
    /// `search_url` and `forecast_url` are full endpoint URLs.
    pub fn new(search_url: impl Into<String>, forecast_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            search_url: search_url.into(),
            forecast_url: forecast_url.into(),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let http = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            search_url: config.geocoding_search_url(),
            forecast_url: config.weather_forecast_url(),
        })
    }
}

#[derive(Debug, Deserialize)]
struct OmForecastResponse {
    current: OmCurrent,
}

#[derive(Debug, Deserialize)]
struct OmCurrent {
    temperature_2m: f64,
    wind_speed_10m: f64,
    weather_code: i32,
    relative_humidity_2m: Option<f64>,
    apparent_temperature: Option<f64>,
}

#[async_trait]
impl WeatherProvider for OpenMeteoProvider {
    async fn search_places(
        &self,
        name: &str,
        count: u32,
    ) -> Result<Vec<PlaceCandidate>, WeatherError> {
        let count = count.to_string();

        let res = self
            .http
            .get(&self.search_url)
            .query(&[
                ("name", name),
                ("count", count.as_str()),
                ("language", "en"),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::NetworkFailure(format!("geocoding request: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::NetworkFailure(format!("geocoding body: {e}")))?;

        if !status.is_success() {
            return Err(WeatherError::NetworkFailure(format!(
                "geocoding returned status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        parse_places(&body)
    }

    async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let latitude = latitude.to_string();
        let longitude = longitude.to_string();
        let current = CURRENT_FIELDS.join(",");

        let res = self
            .http
            .get(&self.forecast_url)
            .query(&[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current", current.as_str()),
            ])
            .send()
            .await
            .map_err(|e| WeatherError::ServiceUnavailable(format!("forecast request: {e}")))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|e| WeatherError::ServiceUnavailable(format!("forecast body: {e}")))?;

        if !status.is_success() {
            return Err(WeatherError::ServiceUnavailable(format!(
                "forecast returned status {}: {}",
                status,
                truncate_body(&body),
            )));
        }

        let parsed: OmForecastResponse = serde_json::from_str(&body)
            .map_err(|e| WeatherError::ServiceUnavailable(format!("forecast JSON: {e}")))?;

        Ok(WeatherSnapshot {
            temperature: parsed.current.temperature_2m,
            wind_speed: parsed.current.wind_speed_10m,
            weather_code: parsed.current.weather_code,
            humidity: parsed.current.relative_humidity_2m,
            feels_like: parsed.current.apparent_temperature,
            fetched_at: Utc::now(),
        })
    }
}

/// A body that is not JSON at all is a transport problem; a JSON body whose
/// `results` member is missing or unusable simply has no matches.
fn parse_places(body: &str) -> Result<Vec<PlaceCandidate>, WeatherError> {
    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| WeatherError::NetworkFailure(format!("geocoding JSON: {e}")))?;

    let Some(results) = value.get("results") else {
        return Ok(Vec::new());
    };

    match Vec::<PlaceCandidate>::deserialize(results) {
        Ok(places) => Ok(places),
        Err(e) => {
            tracing::debug!("Ignoring malformed geocoding results: {}", e);
            Ok(Vec::new())
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider_for(server: &MockServer) -> OpenMeteoProvider {
        OpenMeteoProvider::new(
            format!("{}/v1/search", server.uri()),
            format!("{}/v1/forecast", server.uri()),
        )
    }

    fn london() -> serde_json::Value {
        serde_json::json!({
            "id": 2643743,
            "name": "London",
            "latitude": 51.5074,
            "longitude": -0.1278,
            "country": "United Kingdom",
            "population": 8961989
        })
    }

    #[tokio::test]
    async fn resolve_sends_expected_query_and_returns_first_result() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "London"))
            .and(query_param("count", "1"))
            .and(query_param("language", "en"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [london(), {
                    "id": 6058560,
                    "name": "London",
                    "latitude": 42.98,
                    "longitude": -81.23,
                    "country": "Canada"
                }],
                "generationtime_ms": 0.5
            })))
            .expect(1)
            .mount(&server)
            .await;

        let place = provider_for(&server)
            .resolve_coordinates("London")
            .await
            .expect("London resolves");

        assert_eq!(place.name, "London");
        assert_eq!(place.country, "United Kingdom");
        assert_eq!(place.latitude, 51.5074);
        assert_eq!(place.longitude, -0.1278);
    }

    #[tokio::test]
    async fn city_name_with_spaces_and_unicode_is_encoded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/search"))
            .and(query_param("name", "São Paulo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{
                    "id": 3448439,
                    "name": "São Paulo",
                    "latitude": -23.5475,
                    "longitude": -46.63611,
                    "country": "Brazil",
                    "population": 10021295
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let place = provider_for(&server)
            .resolve_coordinates("São Paulo")
            .await
            .expect("encoded name matches");
        assert_eq!(place.country, "Brazil");
    }

    #[tokio::test]
    async fn missing_results_is_city_not_found() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/search"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "generationtime_ms": 0.2 })),
            )
            .mount(&server)
            .await;

        let err = provider_for(&server).resolve_coordinates("Qwxyz").await.unwrap_err();
        assert!(matches!(err, WeatherError::CityNotFound(_)));
    }

    #[tokio::test]
    async fn empty_or_malformed_results_is_city_not_found() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/search"))
            .and(query_param("name", "Empty"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "results": [] })),
            )
            .mount(&server)
            .await;
        Mock::given(path("/v1/search"))
            .and(query_param("name", "Broken"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "results": "not a list" })),
            )
            .mount(&server)
            .await;

        let provider = provider_for(&server);
        let empty = provider.resolve_coordinates("Empty").await.unwrap_err();
        let broken = provider.resolve_coordinates("Broken").await.unwrap_err();

        assert!(matches!(empty, WeatherError::CityNotFound(_)));
        assert!(matches!(broken, WeatherError::CityNotFound(_)));
    }

    #[tokio::test]
    async fn non_success_status_is_network_failure() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/search"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = provider_for(&server).resolve_coordinates("London").await.unwrap_err();
        assert!(matches!(err, WeatherError::NetworkFailure(_)));
    }

    #[tokio::test]
    async fn unreachable_host_is_network_failure() {
        let provider = OpenMeteoProvider::new(
            "http://127.0.0.1:1/v1/search",
            "http://127.0.0.1:1/v1/forecast",
        );

        let err = provider.resolve_coordinates("London").await.unwrap_err();
        assert!(matches!(err, WeatherError::NetworkFailure(_)));

        let err = provider.fetch_weather(51.5074, -0.1278).await.unwrap_err();
        assert!(matches!(err, WeatherError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn suggestion_search_requests_count_and_tolerates_no_results() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/search"))
            .and(query_param("name", "Zz"))
            .and(query_param("count", "10"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let places = provider_for(&server).search_places("Zz", 10).await.expect("ok");
        assert!(places.is_empty());
    }

    #[tokio::test]
    async fn weather_maps_fields_to_domain_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "51.5074"))
            .and(query_param("longitude", "-0.1278"))
            .and(query_param(
                "current",
                concat!(
                    "temperature_2m,weather_code,wind_speed_10m,",
                    "relative_humidity_2m,apparent_temperature"
                ),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "latitude": 51.5,
                "longitude": -0.12,
                "current": {
                    "time": "2026-10-19T12:00",
                    "temperature_2m": 20.0,
                    "wind_speed_10m": 15.5,
                    "weather_code": 3,
                    "relative_humidity_2m": 65,
                    "apparent_temperature": 19.2
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let weather = provider_for(&server)
            .fetch_weather(51.5074, -0.1278)
            .await
            .expect("weather");

        assert_eq!(weather.temperature, 20.0);
        assert_eq!(weather.wind_speed, 15.5);
        assert_eq!(weather.weather_code, 3);
        assert_eq!(weather.humidity, Some(65.0));
        assert_eq!(weather.feels_like, Some(19.2));
    }

    #[tokio::test]
    async fn weather_error_status_is_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(path("/v1/forecast"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = provider_for(&server).fetch_weather(1.0, 2.0).await.unwrap_err();
        assert!(matches!(err, WeatherError::ServiceUnavailable(_)));
    }

    #[test]
    fn non_json_geocoding_body_is_network_failure() {
        let err = parse_places("<html>").unwrap_err();
        assert!(matches!(err, WeatherError::NetworkFailure(_)));
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let body = "é".repeat(300);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.chars().count(), 203);
        assert!(truncated.ends_with("..."));
    }
}
