//! Headless city manager.
//!
//! Drives the same reducer as the terminal widget but awaits each effect in
//! order instead of spawning tasks, so hosts without a UI get identical list
//! semantics. Weather fetches are skipped unless enabled with
//! [`CityManager::with_weather`].

use std::collections::VecDeque;

use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::city::{City, CityList};
use crate::effect::Effect;
use crate::reducer::reducer;
use crate::services::Services;
use crate::state::AppState;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ManagerError {
    #[error("operation cancelled")]
    Cancelled,
}

pub struct CityManager {
    state: AppState,
    services: Services,
    cancel: CancellationToken,
    fetch_weather: bool,
}

impl CityManager {
    pub fn new(cities: CityList, services: Services) -> Self {
        Self {
            state: AppState::new(cities),
            services,
            cancel: CancellationToken::new(),
            fetch_weather: false,
        }
    }

    pub fn with_weather(mut self, enabled: bool) -> Self {
        self.fetch_weather = enabled;
        self
    }

    /// Cancelling the token aborts the in-flight lookup and every later call.
    /// A save already under way still finishes.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn cities(&self) -> &[City] {
        self.state.cities.as_slice()
    }

    pub fn error(&self) -> Option<&str> {
        self.state.error.as_deref()
    }

    pub async fn bootstrap(&mut self) -> Result<(), ManagerError> {
        self.dispatch(Action::CitiesBootstrap).await
    }

    pub async fn add_city(&mut self, name: &str) -> Result<(), ManagerError> {
        self.dispatch(Action::CityAddSubmit(name.to_string())).await
    }

    pub async fn remove_city(&mut self, id: u32) -> Result<(), ManagerError> {
        self.dispatch(Action::CityRemove(id)).await
    }

    pub async fn reorder(&mut self, before: u32, after: u32) -> Result<(), ManagerError> {
        self.dispatch(Action::CityReorder { before, after }).await
    }

    pub async fn select(&mut self, index: usize) -> Result<(), ManagerError> {
        self.dispatch(Action::CitySelect(index)).await
    }

    pub async fn refresh_weather(&mut self) -> Result<(), ManagerError> {
        self.dispatch(Action::WeatherFetch).await
    }

    pub fn clear_error(&mut self) {
        let _ = reducer(&mut self.state, Action::ErrorClear);
    }

    /// Runs `action` and every follow-up it produces. On cancellation the
    /// state rolls back to the last point that matches storage.
    async fn dispatch(&mut self, action: Action) -> Result<(), ManagerError> {
        if self.cancel.is_cancelled() {
            return Err(ManagerError::Cancelled);
        }

        let mut committed = self.state.clone();
        let mut queue = VecDeque::from([action]);
        while let Some(action) = queue.pop_front() {
            let result = reducer(&mut self.state, action);
            for effect in result.effects {
                let next = match effect {
                    // Not cancellable: memory and storage must agree afterwards
                    Effect::SaveCities { cities } => {
                        let next = self.services.save_cities(cities).await;
                        committed = self.state.clone();
                        Some(next)
                    }
                    effect => match self.run(effect).await {
                        Ok(next) => next,
                        Err(e) => {
                            self.state = committed;
                            return Err(e);
                        }
                    },
                };
                queue.extend(next);
            }
        }
        Ok(())
    }

    async fn run(&self, effect: Effect) -> Result<Option<Action>, ManagerError> {
        let services = &self.services;
        let work = async {
            match effect {
                Effect::Bootstrap => Some(services.bootstrap().await),
                Effect::ValidateCity { name } => Some(services.validate_city(name).await),
                Effect::SaveCities { cities } => Some(services.save_cities(cities).await),
                Effect::CancelValidation => None,
                Effect::FetchWeather { city } if self.fetch_weather => {
                    Some(services.fetch_weather(city).await)
                }
                Effect::FetchWeather { .. } => None,
            }
        };

        tokio::select! {
            _ = self.cancel.cancelled() => Err(ManagerError::Cancelled),
            action = work => Ok(action),
        }
    }
}
