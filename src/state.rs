//! Application state - single source of truth

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tui_dispatch::DataResource;

use crate::city::{City, CityList};
use crate::forecast::WeatherForecast;

/// Application state - everything the widget needs to render
#[derive(Clone, Debug, tui_dispatch::DebugState, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct AppState {
    // --- Core data (visible in debug) ---
    /// Tracked cities in display order
    #[debug(section = "Cities", label = "List", debug_fmt)]
    pub cities: CityList,

    /// Index of the city whose weather is shown
    #[debug(section = "Cities", label = "Selected", debug_fmt)]
    pub selected: usize,

    /// True until the bootstrap list arrives
    #[debug(section = "Cities", label = "Loading")]
    pub cities_loading: bool,

    /// The one advisory message shown to the user
    #[debug(section = "Cities", label = "Error", debug_fmt)]
    pub error: Option<String>,

    /// Name waiting on remote validation
    #[debug(section = "Cities", label = "Pending", debug_fmt)]
    pub pending_add: Option<String>,

    /// Weather for the selected city: Empty → Loading → Loaded/Failed
    #[debug(section = "Weather", label = "Data", debug_fmt)]
    pub weather: DataResource<WeatherForecast>,

    /// Whether a refresh is in progress (keeps showing current data during fetch)
    #[debug(section = "Weather", label = "Refreshing")]
    pub is_refreshing: bool,

    // --- Add-city dialog (skipped) ---
    #[debug(skip)]
    pub add_mode: bool,

    #[debug(skip)]
    pub add_query: String,
}

impl AppState {
    /// Create state around an (usually empty) city list
    pub fn new(cities: CityList) -> Self {
        Self {
            cities,
            selected: 0,
            cities_loading: false,
            error: None,
            pending_add: None,
            weather: DataResource::Empty,
            is_refreshing: false,
            add_mode: false,
            add_query: String::new(),
        }
    }

    pub fn selected_city(&self) -> Option<&City> {
        self.cities.get(self.selected)
    }

    pub fn is_validating(&self) -> bool {
        self.pending_add.is_some()
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(CityList::default())
    }
}
