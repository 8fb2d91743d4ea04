//! Effects - side effects declared by the reducer

use crate::city::City;

/// Side effects that can be triggered by actions
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Load stored cities or resolve the first one
    Bootstrap,
    /// Ask the provider whether `name` is a known city
    ValidateCity { name: String },
    /// Abort the in-flight validation, if any
    CancelValidation,
    /// Write the list to storage
    SaveCities { cities: Vec<City> },
    /// Fetch current weather for a city
    FetchWeather { city: String },
}

/// Task keys; spawning under a key cancels the previous task with that key.
pub mod task {
    pub const BOOTSTRAP: &str = "bootstrap";
    pub const VALIDATE: &str = "city_validate";
    pub const SAVE: &str = "cities_save";
    pub const WEATHER: &str = "weather";
}
