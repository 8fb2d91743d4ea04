//! Services - run effects against the injected backends

use std::sync::Arc;

use crate::action::Action;
use crate::api::WeatherApi;
use crate::city::City;
use crate::geo::{self, Locator};
use crate::store::CityStore;

/// Backends shared by every effect
#[derive(Clone)]
pub struct Services {
    pub api: Arc<dyn WeatherApi>,
    pub store: CityStore,
    pub locator: Arc<dyn Locator>,
    pub default_city: String,
}

impl Services {
    pub fn new(
        api: Arc<dyn WeatherApi>,
        store: CityStore,
        locator: Arc<dyn Locator>,
        default_city: impl Into<String>,
    ) -> Self {
        Self {
            api,
            store,
            locator,
            default_city: default_city.into(),
        }
    }

    /// Stored list if there is one, otherwise the resolved current city
    /// (written back to storage).
    pub async fn bootstrap(&self) -> Action {
        match self.store.load().await {
            Ok(Some(cities)) => {
                tracing::info!(count = cities.len(), "loaded stored cities");
                return Action::CitiesDidLoad {
                    cities,
                    error: None,
                };
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "ignoring unreadable stored cities"),
        }

        let cities = geo::resolve_current_city(
            self.locator.as_ref(),
            self.api.as_ref(),
            &self.default_city,
        )
        .await;
        let error = match self.store.save(&cities).await {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(error = %e, "could not store bootstrap cities");
                Some(format!("Could not save cities: {e}"))
            }
        };
        Action::CitiesDidLoad { cities, error }
    }

    pub async fn validate_city(&self, name: String) -> Action {
        match self.api.validate_city(&name).await {
            Ok(true) => Action::CityDidValidate(name),
            Ok(false) => Action::CityDidReject(name),
            Err(e) => {
                tracing::warn!(city = %name, error = %e, "city validation failed");
                Action::CityDidError {
                    name,
                    error: e.to_string(),
                }
            }
        }
    }

    pub async fn save_cities(&self, cities: Vec<City>) -> Action {
        match self.store.save(&cities).await {
            Ok(()) => Action::CitiesDidSave,
            Err(e) => {
                tracing::warn!(error = %e, "could not store cities");
                Action::CitiesDidFailSave(e.to_string())
            }
        }
    }

    pub async fn fetch_weather(&self, city: String) -> Action {
        match self.api.current_weather(&city).await {
            Ok(data) => Action::WeatherDidLoad(data),
            Err(e) => {
                tracing::debug!(%city, error = %e, "weather fetch failed");
                Action::WeatherDidError(e.to_string())
            }
        }
    }
}
