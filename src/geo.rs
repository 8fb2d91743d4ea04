//! Geolocation - resolve the user's city on first run

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::api::WeatherApi;
use crate::city::City;
use crate::http::HttpClient;

/// Default endpoint for IP-based position lookup
pub const IP_LOOKUP_URL: &str = "http://ip-api.com/json/?fields=status,message,lat,lon";

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(thiserror::Error, Debug)]
pub enum GeoError {
    #[error("location services are unavailable")]
    Unavailable,
    #[error("location lookup failed: {0}")]
    Lookup(String),
}

/// Source of the device position
#[async_trait]
pub trait Locator: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeoError>;
}

/// No position source configured
pub struct NoLocator;

#[async_trait]
impl Locator for NoLocator {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        Err(GeoError::Unavailable)
    }
}

/// Coordinates supplied up front (e.g. from flags)
pub struct FixedLocator(pub Coordinates);

#[async_trait]
impl Locator for FixedLocator {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        Ok(self.0)
    }
}

/// Position estimated from the public IP address
pub struct IpLocator {
    http: HttpClient,
    url: String,
}

impl IpLocator {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self {
            http,
            url: url.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[async_trait]
impl Locator for IpLocator {
    async fn current_position(&self) -> Result<Coordinates, GeoError> {
        let body = self
            .http
            .get(&self.url)
            .await
            .map_err(|e| GeoError::Lookup(e.to_string()))?;
        let response: IpLookupResponse =
            serde_json::from_value(body).map_err(|e| GeoError::Lookup(e.to_string()))?;

        match (response.status.as_str(), response.lat, response.lon) {
            ("success", Some(lat), Some(lon)) => Ok(Coordinates { lat, lon }),
            _ => Err(GeoError::Lookup(
                response.message.unwrap_or_else(|| response.status.clone()),
            )),
        }
    }
}

/// Single-entry list holding the fallback city
pub fn default_cities(name: &str) -> Vec<City> {
    vec![City::new(0, name, 0)]
}

/// Resolve the device's city, degrading to `default_city` on any failure.
pub async fn resolve_current_city(
    locator: &dyn Locator,
    api: &dyn WeatherApi,
    default_city: &str,
) -> Vec<City> {
    let coords = match locator.current_position().await {
        Ok(coords) => coords,
        Err(e) => {
            tracing::debug!(error = %e, "no device position, using default city");
            return default_cities(default_city);
        }
    };

    match api.reverse_geocode(coords).await {
        Ok(name) if !name.trim().is_empty() => {
            tracing::info!(city = %name, "resolved current city");
            vec![City::new(0, name, 0)]
        }
        Ok(_) => default_cities(default_city),
        Err(e) => {
            tracing::debug!(error = %e, "reverse geocoding failed, using default city");
            default_cities(default_city)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::ApiError;
    use crate::forecast::WeatherForecast;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct Geocoder(Result<&'static str, &'static str>);

    #[async_trait]
    impl WeatherApi for Geocoder {
        async fn current_weather(&self, _city: &str) -> Result<WeatherForecast, ApiError> {
            Ok(WeatherForecast::default())
        }

        async fn reverse_geocode(&self, _coords: Coordinates) -> Result<String, ApiError> {
            self.0
                .map(str::to_string)
                .map_err(|e| ApiError::NotFound(e.to_string()))
        }
    }

    const HERE: Coordinates = Coordinates {
        lat: 52.52,
        lon: 13.40,
    };

    #[tokio::test]
    async fn test_unavailable_position_uses_default() {
        let cities = resolve_current_city(&NoLocator, &Geocoder(Ok("Berlin")), "London").await;
        assert_eq!(cities, vec![City::new(0, "London", 0)]);
    }

    #[tokio::test]
    async fn test_position_is_reverse_geocoded() {
        let cities =
            resolve_current_city(&FixedLocator(HERE), &Geocoder(Ok("Berlin")), "London").await;
        assert_eq!(cities, vec![City::new(0, "Berlin", 0)]);
    }

    #[tokio::test]
    async fn test_lookup_error_uses_default() {
        let cities =
            resolve_current_city(&FixedLocator(HERE), &Geocoder(Err("boom")), "London").await;
        assert_eq!(cities, vec![City::new(0, "London", 0)]);
    }

    #[tokio::test]
    async fn test_ip_locator_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "success",
                "lat": 48.85,
                "lon": 2.35
            })))
            .mount(&server)
            .await;

        let locator = IpLocator::new(HttpClient::new(None).unwrap(), server.uri());
        let coords = locator.current_position().await.unwrap();
        assert_eq!(coords, Coordinates { lat: 48.85, lon: 2.35 });
    }

    #[tokio::test]
    async fn test_ip_locator_failure_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "fail",
                "message": "private range"
            })))
            .mount(&server)
            .await;

        let locator = IpLocator::new(HttpClient::new(None).unwrap(), server.uri());
        let err = locator.current_position().await.unwrap_err();
        assert_eq!(err.to_string(), "location lookup failed: private range");
    }
}
