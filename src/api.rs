//! OpenWeatherMap API client

use async_trait::async_trait;
use serde_json::Value;

use crate::forecast::WeatherForecast;
use crate::geo::Coordinates;
use crate::http::{HttpClient, NetworkError};

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("{0}")]
    NotFound(String),
    #[error("unexpected response: {0}")]
    Parse(String),
}

/// Weather provider operations the widget needs
#[async_trait]
pub trait WeatherApi: Send + Sync {
    /// Current weather for a city name
    async fn current_weather(&self, city: &str) -> Result<WeatherForecast, ApiError>;

    /// City name nearest to the given coordinates
    async fn reverse_geocode(&self, coords: Coordinates) -> Result<String, ApiError>;

    /// Whether the provider recognizes `city`. Network failures are errors,
    /// an unknown name is `Ok(false)`.
    async fn validate_city(&self, city: &str) -> Result<bool, ApiError> {
        match self.current_weather(city).await {
            Ok(_) => Ok(true),
            Err(ApiError::NotFound(message)) => {
                tracing::debug!(%city, %message, "city rejected by provider");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

pub struct OpenWeatherClient {
    http: HttpClient,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn weather_url(&self, city: &str) -> String {
        format!(
            "{}/data/2.5/weather?q={}&units=metric&appid={}",
            self.base_url,
            urlencoding::encode(city),
            self.api_key
        )
    }

    fn reverse_url(&self, coords: Coordinates) -> String {
        format!(
            "{}/geo/1.0/reverse?lat={}&lon={}&limit=1&appid={}",
            self.base_url, coords.lat, coords.lon, self.api_key
        )
    }
}

/// The provider answers unknown cities (and bad keys) with a body carrying
/// both `cod` and `message`.
fn error_message(body: &Value) -> Option<String> {
    let cod = body.get("cod").filter(|cod| !cod.is_null())?;
    let message = body.get("message")?.as_str().filter(|m| !m.is_empty())?;
    tracing::trace!(%cod, "provider error body");
    Some(message.to_string())
}

#[async_trait]
impl WeatherApi for OpenWeatherClient {
    async fn current_weather(&self, city: &str) -> Result<WeatherForecast, ApiError> {
        let body = self.http.get(&self.weather_url(city)).await?;
        if let Some(message) = error_message(&body) {
            return Err(ApiError::NotFound(message));
        }
        serde_json::from_value(body).map_err(|e| ApiError::Parse(e.to_string()))
    }

    async fn reverse_geocode(&self, coords: Coordinates) -> Result<String, ApiError> {
        let body = self.http.get(&self.reverse_url(coords)).await?;
        if let Some(message) = error_message(&body) {
            return Err(ApiError::NotFound(message));
        }
        body.get(0)
            .and_then(|place| place.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::NotFound(format!("no place near {}, {}", coords.lat, coords.lon)))
    }
}
