//! Runtime configuration and backend wiring

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::api::OpenWeatherClient;
use crate::city::{CityList, IdStrategy, MAX_CITIES};
use crate::geo::{Coordinates, FixedLocator, IpLocator, Locator, NoLocator, IP_LOOKUP_URL};
use crate::http::{HttpClient, NetworkError};
use crate::services::Services;
use crate::store::{CityStore, JsonFileStore};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";
pub const DEFAULT_CITY: &str = "London";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
pub const API_KEY_ENV: &str = "OWM_API_KEY";

const APP_DIR: &str = "weather-widget";
const STORAGE_FILE: &str = "storage.json";
const LOG_FILE: &str = "weather-widget.log";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing OpenWeatherMap API key (pass --api-key or set OWM_API_KEY)")]
    MissingApiKey,
    #[error("--lat and --lon must be given together")]
    PartialCoordinates,
    #[error(transparent)]
    Http(#[from] NetworkError),
}

/// Where the device position comes from
#[derive(Clone, Debug, PartialEq)]
pub enum LocateMode {
    Off,
    Fixed(Coordinates),
    Ip,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub default_city: String,
    pub max_cities: usize,
    pub id_strategy: IdStrategy,
    pub timeout: Option<Duration>,
    pub data_dir: PathBuf,
    pub locate: LocateMode,
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn new(api_key: Option<String>, data_dir: Option<&Path>) -> Result<Self, ConfigError> {
        let api_key = api_key
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
            .ok_or(ConfigError::MissingApiKey)?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            default_city: DEFAULT_CITY.to_string(),
            max_cities: MAX_CITIES,
            id_strategy: IdStrategy::default(),
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            data_dir: data_dir_or_default(data_dir),
            locate: LocateMode::Off,
            log_file: None,
        })
    }

    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(STORAGE_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.log_file
            .clone()
            .unwrap_or_else(|| self.data_dir.join(LOG_FILE))
    }

    /// Empty list carrying the configured capacity and id strategy
    pub fn city_list(&self) -> CityList {
        CityList::new(self.max_cities, self.id_strategy)
    }

    /// Build the production backends
    pub fn services(&self) -> Result<Services, ConfigError> {
        let http = HttpClient::new(self.timeout)?;
        let api = OpenWeatherClient::new(http.clone(), &self.base_url, &self.api_key);
        let store = CityStore::new(Arc::new(JsonFileStore::new(self.storage_path())));
        let locator: Arc<dyn Locator> = match &self.locate {
            LocateMode::Off => Arc::new(NoLocator),
            LocateMode::Fixed(coords) => Arc::new(FixedLocator(*coords)),
            LocateMode::Ip => Arc::new(IpLocator::new(http, IP_LOOKUP_URL)),
        };
        Ok(Services::new(
            Arc::new(api),
            store,
            locator,
            &self.default_city,
        ))
    }
}

/// Combine optional `--lat`/`--lon` and `--locate` into a mode
pub fn locate_mode(
    lat: Option<f64>,
    lon: Option<f64>,
    ip_lookup: bool,
) -> Result<LocateMode, ConfigError> {
    match (lat, lon) {
        (Some(lat), Some(lon)) => Ok(LocateMode::Fixed(Coordinates { lat, lon })),
        (None, None) if ip_lookup => Ok(LocateMode::Ip),
        (None, None) => Ok(LocateMode::Off),
        _ => Err(ConfigError::PartialCoordinates),
    }
}

fn data_dir_or_default(data_dir: Option<&Path>) -> PathBuf {
    data_dir
        .map(Path::to_path_buf)
        .or_else(|| dirs_next::data_local_dir().map(|dir| dir.join(APP_DIR)))
        .unwrap_or_else(|| PathBuf::from("."))
}
