pub mod add_city_overlay;
pub mod city_header;
pub mod city_list;
pub mod weather_panel;
pub mod weather_widget;

// Re-export core Component trait
pub use tui_dispatch::Component;

pub use add_city_overlay::{AddCityOverlay, AddCityOverlayProps};
pub use city_header::{CityHeader, CityHeaderProps};
pub use city_list::{CityListPanel, CityListPanelProps};
pub use weather_panel::{WeatherPanel, WeatherPanelProps};
pub use weather_widget::{ERROR_ICON, WeatherWidget, WeatherWidgetProps};
