//! Just Weather API client
//!
//! Thin glue over the HTTP engine and the response cache: per-endpoint URL
//! builders, cache-key fingerprinting, and the shared request pipeline. The
//! JSON document model is `serde_json::Value` and is treated as opaque —
//! this layer only moves text through it and inspects the `success` /
//! `error.message` envelope the API uses for failures.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::cache::{normalize_for_key, ResponseCache, CACHE_DEFAULT_TTL, CACHE_MAX_ENTRIES};
use crate::net::{HttpClient, HttpError};

use super::params::{url_encode, validate_city_name, validate_latitude, validate_longitude};

/// Errors surfaced to callers of the weather client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Latitude or longitude outside the valid range
    #[error("invalid coordinates")]
    InvalidCoordinates,

    /// City name empty or longer than 100 characters
    #[error("invalid city name")]
    InvalidCityName,

    /// City search query shorter than 2 characters
    #[error("query must be at least 2 characters")]
    QueryTooShort,

    /// Transport or protocol failure from the HTTP engine
    #[error(transparent)]
    Http(#[from] HttpError),

    /// The server answered with an error status code
    #[error("HTTP status {0}")]
    Status(u16),

    /// The server answered with a `success: false` envelope
    #[error("API error: {0}")]
    Api(String),

    /// The server sent no body at all
    #[error("empty response from server")]
    EmptyResponse,

    /// The response body is not valid JSON
    #[error("failed to parse response JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Connection settings for the weather API
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 10680,
            timeout: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            ..Self::default()
        }
    }
}

/// Failure envelope some endpoints answer with even under status 200
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    success: Option<bool>,
    error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Client for the Just Weather API with response caching
pub struct WeatherClient {
    config: ClientConfig,
    http: HttpClient,
    cache: ResponseCache,
}

impl WeatherClient {
    /// Creates a client with the default XDG-backed cache.
    ///
    /// Falls back to a cache directory under the system temp dir if no
    /// platform cache directory can be determined.
    pub fn new(config: ClientConfig) -> Self {
        let cache = ResponseCache::new(CACHE_MAX_ENTRIES, CACHE_DEFAULT_TTL).unwrap_or_else(|| {
            ResponseCache::with_dir(
                std::env::temp_dir().join("just-weather-cache"),
                CACHE_MAX_ENTRIES,
                CACHE_DEFAULT_TTL,
            )
        });
        Self::with_cache(config, cache)
    }

    /// Creates a client over an explicitly constructed cache.
    pub fn with_cache(config: ClientConfig, cache: ResponseCache) -> Self {
        let http = HttpClient::new(config.timeout);
        Self {
            config,
            http,
            cache,
        }
    }

    /// The active configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Replaces the request timeout for subsequent requests.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.config.timeout = timeout;
        self.http = HttpClient::new(timeout);
    }

    /// Current weather by coordinates: `/v1/current?lat=..&lon=..`
    pub fn current(&mut self, lat: f64, lon: f64) -> Result<Value, ClientError> {
        if !validate_latitude(lat) || !validate_longitude(lon) {
            return Err(ClientError::InvalidCoordinates);
        }

        let url = format!("{}/v1/current?lat={lat:.4}&lon={lon:.4}", self.base_url());
        let cache_key = build_cache_key("current", &format!("lat={lat:.4}:lon={lon:.4}"));
        self.make_request(&url, &cache_key)
    }

    /// Weather by city name with optional country and region filters:
    /// `/v1/weather?city=..[&country=..][&region=..]`
    pub fn weather_by_city(
        &mut self,
        city: &str,
        country: Option<&str>,
        region: Option<&str>,
    ) -> Result<Value, ClientError> {
        if !validate_city_name(city) {
            return Err(ClientError::InvalidCityName);
        }

        let mut url = format!("{}/v1/weather?city={}", self.base_url(), url_encode(city));
        if let Some(country) = country.filter(|c| !c.is_empty()) {
            url.push_str("&country=");
            url.push_str(&url_encode(country));
        }
        if let Some(region) = region.filter(|r| !r.is_empty()) {
            url.push_str("&region=");
            url.push_str(&url_encode(region));
        }

        let cache_key = build_cache_key("weather", &city_params(city, country, region));
        self.make_request(&url, &cache_key)
    }

    /// City search: `/v1/cities?query=..`
    pub fn search_cities(&mut self, query: &str) -> Result<Value, ClientError> {
        if query.chars().count() < 2 {
            return Err(ClientError::QueryTooShort);
        }

        let url = format!("{}/v1/cities?query={}", self.base_url(), url_encode(query));
        let cache_key = build_cache_key("cities", &format!("query={}", normalize_for_key(query)));
        self.make_request(&url, &cache_key)
    }

    /// API homepage document: `/`
    pub fn homepage(&mut self) -> Result<Value, ClientError> {
        let url = format!("{}/", self.base_url());
        let cache_key = build_cache_key("homepage", "");
        self.make_request(&url, &cache_key)
    }

    /// Echo test endpoint: `/echo`. Never cached; the raw body is wrapped
    /// as `{"echo": <body>}`.
    pub fn echo(&mut self) -> Result<Value, ClientError> {
        let url = format!("{}/echo", self.base_url());

        let response = self.http.get(&url)?;
        if response.body.is_empty() {
            return Err(ClientError::EmptyResponse);
        }

        Ok(serde_json::json!({ "echo": response.body_text() }))
    }

    /// Empties both cache tiers.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Fetches `url` with caching under `cache_key`.
    ///
    /// A fresh cached document is returned without touching the network.
    /// Otherwise the engine runs; an error status (≥ 400) or a
    /// `success: false` envelope becomes a typed error, and only a
    /// validated payload is written back to the cache.
    pub fn make_request(&mut self, url: &str, cache_key: &str) -> Result<Value, ClientError> {
        if let Some(cached) = self.cache.get(cache_key) {
            if let Ok(doc) = serde_json::from_str::<Value>(&cached) {
                log::debug!("serving {cache_key} from cache");
                return Ok(doc);
            }
            // An unparsable cached payload falls through to a fresh fetch
        }

        let response = self.http.get(url)?;
        if response.body.is_empty() {
            return Err(ClientError::EmptyResponse);
        }
        if response.status >= 400 {
            return Err(ClientError::Status(response.status));
        }

        let body = response.body_text().into_owned();
        let doc: Value = serde_json::from_str(&body)?;

        // A non-object body simply has no envelope to check
        if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
            if envelope.success == Some(false) {
                let message = envelope
                    .error
                    .and_then(|e| e.message)
                    .unwrap_or_else(|| "API error".to_string());
                return Err(ClientError::Api(message));
            }
        }

        self.cache.set(cache_key, &body);
        Ok(doc)
    }

    fn base_url(&self) -> String {
        format!("http://{}:{}", self.config.host, self.config.port)
    }
}

/// Joins an endpoint name and its normalized parameters into a cache key.
fn build_cache_key(endpoint: &str, params: &str) -> String {
    format!("{endpoint}:{params}")
}

/// Normalized parameter fingerprint for the by-city endpoint.
///
/// Absent filters fingerprint as empty so that `("Vancouver", None, None)`
/// and `("vancouver", Some(""), None)` share an entry.
fn city_params(city: &str, country: Option<&str>, region: Option<&str>) -> String {
    format!(
        "city={}:country={}:region={}",
        normalize_for_key(city),
        normalize_for_key(country.unwrap_or("")),
        normalize_for_key(region.unwrap_or(""))
    )
}
