//! Actions - intents from the UI and results from effects

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::city::City;
use crate::forecast::WeatherForecast;

/// Application actions with automatic category inference
#[derive(tui_dispatch::Action, Clone, Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
#[action(infer_categories)]
pub enum Action {
    // ===== Cities category =====
    /// Intent: load stored cities or resolve the first one
    CitiesBootstrap,

    /// Result: bootstrap finished; `error` is set when the list could not be stored
    CitiesDidLoad {
        cities: Vec<City>,
        error: Option<String>,
    },

    /// Result: list written to storage
    CitiesDidSave,

    /// Result: storage write failed
    CitiesDidFailSave(String),

    // ===== City category =====
    /// Select a city by display index
    CitySelect(usize),

    /// Open the add-city dialog
    CityAddOpen,

    /// Close the add-city dialog, cancelling a pending validation
    CityAddClose,

    /// Add-city input text changed
    CityAddQueryChange(String),

    /// Intent: add a city by name (validated remotely first)
    CityAddSubmit(String),

    /// Result: provider recognizes the name
    CityDidValidate(String),

    /// Result: provider does not recognize the name
    CityDidReject(String),

    /// Result: validation of `name` could not be performed
    CityDidError { name: String, error: String },

    /// Remove every city with this id
    CityRemove(u32),

    /// Move the city with id `after` to the position of the city with id `before`
    CityReorder { before: u32, after: u32 },

    // ===== Weather category =====
    /// Intent: refresh weather for the selected city
    WeatherFetch,

    /// Result: weather loaded
    WeatherDidLoad(WeatherForecast),

    /// Result: weather fetch failed
    WeatherDidError(String),

    // ===== Error category =====
    /// Dismiss the error message
    ErrorClear,

    // ===== Uncategorized (global) =====
    /// Force a re-render (for cursor movement, etc.)
    Render,

    /// Exit the application
    Quit,
}
