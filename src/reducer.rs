//! Reducer - pure function: (state, action) -> DispatchResult

use tui_dispatch::{DataResource, DispatchResult};

use crate::action::Action;
use crate::city::{normalize_name, CityError};
use crate::effect::Effect;
use crate::state::AppState;

/// The reducer handles all state transitions
pub fn reducer(state: &mut AppState, action: Action) -> DispatchResult<Effect> {
    match action {
        // ===== List lifecycle =====
        Action::CitiesBootstrap => {
            state.cities_loading = true;
            DispatchResult::changed_with(Effect::Bootstrap)
        }

        Action::CitiesDidLoad { cities, error } => {
            state.cities.replace(cities);
            state.cities_loading = false;
            state.selected = 0;
            if error.is_some() {
                state.error = error;
            }
            match load_selected(state) {
                Some(effect) => DispatchResult::changed_with(effect),
                None => DispatchResult::changed(),
            }
        }

        Action::CitiesDidSave => DispatchResult::unchanged(),

        Action::CitiesDidFailSave(msg) => {
            state.error = Some(format!("Could not save cities: {msg}"));
            DispatchResult::changed()
        }

        // ===== Selection =====
        Action::CitySelect(index) => {
            if index < state.cities.len() && index != state.selected {
                state.selected = index;
                match load_selected(state) {
                    Some(effect) => DispatchResult::changed_with(effect),
                    None => DispatchResult::changed(),
                }
            } else {
                DispatchResult::unchanged()
            }
        }

        // ===== Add =====
        Action::CityAddOpen => {
            state.add_mode = true;
            state.add_query.clear();
            DispatchResult::changed()
        }

        Action::CityAddClose => {
            state.add_mode = false;
            state.add_query.clear();
            if state.pending_add.take().is_some() {
                DispatchResult::changed_with(Effect::CancelValidation)
            } else {
                DispatchResult::changed()
            }
        }

        Action::CityAddQueryChange(query) => {
            state.add_query = query;
            DispatchResult::changed()
        }

        Action::CityAddSubmit(name) => {
            if state.cities_loading || state.is_validating() {
                return DispatchResult::unchanged();
            }
            match normalize_name(&name) {
                Some(name) => {
                    state.pending_add = Some(name.clone());
                    DispatchResult::changed_with(Effect::ValidateCity { name })
                }
                None => {
                    state.error = Some(CityError::Invalid.to_string());
                    DispatchResult::changed()
                }
            }
        }

        Action::CityDidValidate(name) => {
            if !take_pending(state, &name) {
                return DispatchResult::unchanged();
            }
            match state.cities.push(&name) {
                Ok(city) => {
                    tracing::info!(id = city.id, name = %city.name, "city added");
                    state.add_mode = false;
                    state.add_query.clear();
                    DispatchResult::changed_with(save(state))
                }
                Err(e) => {
                    state.error = Some(e.to_string());
                    DispatchResult::changed()
                }
            }
        }

        Action::CityDidReject(name) => {
            if !take_pending(state, &name) {
                return DispatchResult::unchanged();
            }
            state.error = Some(CityError::Invalid.to_string());
            DispatchResult::changed()
        }

        Action::CityDidError { name, error } => {
            if !take_pending(state, &name) {
                return DispatchResult::unchanged();
            }
            state.error = Some(error);
            DispatchResult::changed()
        }

        // ===== Remove / reorder =====
        Action::CityRemove(id) => {
            if state.cities_loading {
                return DispatchResult::unchanged();
            }
            let shown = state.selected_city().map(|city| city.name.clone());
            if !state.cities.remove(id) {
                return DispatchResult::unchanged();
            }
            state.selected = state.selected.min(state.cities.len().saturating_sub(1));

            let mut effects = vec![save(state)];
            if state.selected_city().map(|city| &city.name) != shown.as_ref() {
                match load_selected(state) {
                    Some(effect) => effects.push(effect),
                    None => {
                        state.weather = DataResource::Empty;
                        state.is_refreshing = false;
                    }
                }
            }
            DispatchResult::changed_with_many(effects)
        }

        // The bootstrap result replaces the list, so edits wait for it
        Action::CityReorder { .. } if state.cities_loading => DispatchResult::unchanged(),
        Action::CityReorder { before, after } => match state.cities.reorder(before, after) {
            Some(index) => {
                state.selected = index;
                DispatchResult::changed_with(save(state))
            }
            None => DispatchResult::unchanged(),
        },

        // ===== Weather =====
        Action::WeatherFetch => {
            let Some(city) = state.selected_city().map(|city| city.name.clone()) else {
                return DispatchResult::unchanged();
            };
            if state.weather.is_loaded() {
                state.is_refreshing = true;
            } else {
                state.weather = DataResource::Loading;
            }
            DispatchResult::changed_with(Effect::FetchWeather { city })
        }

        Action::WeatherDidLoad(data) => {
            state.weather = DataResource::Loaded(data);
            state.is_refreshing = false;
            DispatchResult::changed()
        }

        Action::WeatherDidError(msg) => {
            state.weather = DataResource::Failed(msg);
            state.is_refreshing = false;
            DispatchResult::changed()
        }

        // ===== Error =====
        Action::ErrorClear => {
            if state.error.take().is_some() {
                DispatchResult::changed()
            } else {
                DispatchResult::unchanged()
            }
        }

        Action::Render => DispatchResult::changed(),

        Action::Quit => DispatchResult::unchanged(),
    }
}

/// Reset weather for the selected city and request it
fn load_selected(state: &mut AppState) -> Option<Effect> {
    let city = state.selected_city()?.name.clone();
    state.weather = DataResource::Loading;
    state.is_refreshing = false;
    Some(Effect::FetchWeather { city })
}

/// Clear the pending add if it matches `name`. Stale results return false.
fn take_pending(state: &mut AppState, name: &str) -> bool {
    if state.pending_add.as_deref() == Some(name) {
        state.pending_add = None;
        true
    } else {
        false
    }
}

fn save(state: &AppState) -> Effect {
    Effect::SaveCities {
        cities: state.cities.to_vec(),
    }
}
