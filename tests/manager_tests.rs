//! End-to-end list management through the headless CityManager
//!
//! Backends are in-process stubs (or a wiremock provider), so these run
//! the real reducer + services without a terminal.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use weather_widget::{
    api::{ApiError, OpenWeatherClient, WeatherApi},
    city::{City, CityList, IdStrategy, MAX_CITIES},
    forecast::WeatherForecast,
    geo::{Coordinates, FixedLocator, NoLocator},
    http::{HttpClient, NetworkError},
    manager::{CityManager, ManagerError},
    services::Services,
    store::{CITIES_KEY, CityStore, JsonFileStore, KeyValueStore, MemoryStore, StoreError},
};
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DUPLICATE: &str = "This city already exists. Please try another one";
const INVALID: &str = "This city is not valid. Please try another one";

/// Provider stub: knows every name unless a whitelist is given
#[derive(Default)]
struct StubApi {
    known: Option<Vec<&'static str>>,
    geocoded: Option<&'static str>,
    offline: bool,
    hang: bool,
    lookups: AtomicUsize,
}

#[async_trait]
impl WeatherApi for StubApi {
    async fn current_weather(&self, city: &str) -> Result<WeatherForecast, ApiError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            std::future::pending::<()>().await;
        }
        if self.offline {
            return Err(NetworkError::Transport("connection refused".into()).into());
        }
        match &self.known {
            Some(known) if !known.contains(&city) => Err(ApiError::NotFound("city not found".into())),
            _ => Ok(WeatherForecast {
                name: city.to_string(),
                ..Default::default()
            }),
        }
    }

    async fn reverse_geocode(&self, _coords: Coordinates) -> Result<String, ApiError> {
        self.geocoded
            .map(str::to_string)
            .ok_or_else(|| ApiError::NotFound("no match".into()))
    }
}

/// Memory store that cancels `token` while a write is in progress
#[derive(Default)]
struct CancelOnWrite {
    inner: MemoryStore,
    token: OnceLock<CancellationToken>,
}

#[async_trait]
impl KeyValueStore for CancelOnWrite {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Some(token) = self.token.get() {
            token.cancel();
        }
        tokio::task::yield_now().await;
        self.inner.set(key, value).await
    }
}

fn services(api: StubApi, backend: Arc<dyn KeyValueStore>) -> Services {
    Services::new(
        Arc::new(api),
        CityStore::new(backend),
        Arc::new(NoLocator),
        "London",
    )
}

fn manager(api: StubApi, backend: Arc<dyn KeyValueStore>) -> CityManager {
    CityManager::new(
        CityList::new(MAX_CITIES, IdStrategy::Positional),
        services(api, backend),
    )
}

async fn seed(backend: &Arc<dyn KeyValueStore>, cities: &[City]) {
    CityStore::new(Arc::clone(backend))
        .save(cities)
        .await
        .unwrap();
}

async fn stored(backend: &Arc<dyn KeyValueStore>) -> Vec<City> {
    CityStore::new(Arc::clone(backend))
        .load()
        .await
        .unwrap()
        .unwrap_or_default()
}

// ============================================================================
// Bootstrap
// ============================================================================

#[tokio::test]
async fn test_bootstrap_without_location_uses_default_city() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut manager = manager(StubApi::default(), Arc::clone(&backend));

    manager.bootstrap().await.unwrap();

    assert_eq!(manager.cities(), &[City::new(0, "London", 0)]);
    assert_eq!(stored(&backend).await, vec![City::new(0, "London", 0)]);
    assert_eq!(manager.error(), None);
}

#[tokio::test]
async fn test_bootstrap_resolves_current_city() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let api = StubApi {
        geocoded: Some("Kyiv"),
        ..Default::default()
    };
    let services = Services::new(
        Arc::new(api),
        CityStore::new(Arc::clone(&backend)),
        Arc::new(FixedLocator(Coordinates {
            lat: 50.45,
            lon: 30.52,
        })),
        "London",
    );
    let mut manager = CityManager::new(CityList::default(), services);

    manager.bootstrap().await.unwrap();

    assert_eq!(manager.cities(), &[City::new(0, "Kyiv", 0)]);
    assert_eq!(stored(&backend).await, vec![City::new(0, "Kyiv", 0)]);
}

#[tokio::test]
async fn test_bootstrap_prefers_stored_list() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let saved = vec![City::new(1, "Oslo", 1), City::new(2, "Rome", 2)];
    seed(&backend, &saved).await;
    let mut manager = manager(StubApi::default(), Arc::clone(&backend));

    manager.bootstrap().await.unwrap();

    assert_eq!(manager.cities(), saved.as_slice());
}

#[tokio::test]
async fn test_bootstrap_ignores_corrupt_storage() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    backend.set(CITIES_KEY, "{not json").await.unwrap();
    let mut manager = manager(StubApi::default(), Arc::clone(&backend));

    manager.bootstrap().await.unwrap();

    assert_eq!(manager.cities(), &[City::new(0, "London", 0)]);
    assert_eq!(stored(&backend).await, vec![City::new(0, "London", 0)]);
}

// ============================================================================
// Add
// ============================================================================

#[tokio::test]
async fn test_add_city_appends_and_persists() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut manager = manager(StubApi::default(), Arc::clone(&backend));
    manager.bootstrap().await.unwrap();

    manager.add_city("Paris").await.unwrap();

    let expected = vec![City::new(0, "London", 0), City::new(1, "Paris", 1)];
    assert_eq!(manager.cities(), expected.as_slice());
    assert_eq!(stored(&backend).await, expected);
    assert_eq!(manager.error(), None);
}

#[tokio::test]
async fn test_add_city_trims_name() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut manager = manager(StubApi::default(), backend);
    manager.bootstrap().await.unwrap();

    manager.add_city("  Paris ").await.unwrap();

    assert_eq!(manager.cities()[1].name, "Paris");
}

#[tokio::test]
async fn test_add_duplicate_is_rejected() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut manager = manager(StubApi::default(), Arc::clone(&backend));
    manager.bootstrap().await.unwrap();

    manager.add_city("London").await.unwrap();

    assert_eq!(manager.cities().len(), 1);
    assert_eq!(manager.error(), Some(DUPLICATE));
    assert_eq!(stored(&backend).await.len(), 1);
}

#[tokio::test]
async fn test_add_unknown_city_is_invalid() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let api = StubApi {
        known: Some(vec!["London"]),
        ..Default::default()
    };
    let mut manager = manager(api, backend);
    manager.bootstrap().await.unwrap();

    manager.add_city("Atlantis").await.unwrap();

    assert_eq!(manager.cities().len(), 1);
    assert_eq!(manager.error(), Some(INVALID));
}

#[tokio::test]
async fn test_add_empty_name_skips_provider() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let api = Arc::new(StubApi::default());
    let services = Services::new(
        api.clone(),
        CityStore::new(backend),
        Arc::new(NoLocator),
        "London",
    );
    let mut manager = CityManager::new(CityList::default(), services);
    manager.bootstrap().await.unwrap();

    manager.add_city("   ").await.unwrap();

    assert_eq!(manager.error(), Some(INVALID));
    assert_eq!(api.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_add_while_offline_reports_error() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let api = StubApi {
        offline: true,
        ..Default::default()
    };
    let mut manager = manager(api, backend);
    manager.bootstrap().await.unwrap();

    manager.add_city("Paris").await.unwrap();

    assert_eq!(manager.cities().len(), 1);
    let error = manager.error().unwrap_or_default();
    assert!(error.contains("connection refused"), "got: {error}");
    assert!(!manager.state().is_validating());
}

#[tokio::test]
async fn test_add_beyond_capacity_is_rejected() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let full: Vec<City> = (0..MAX_CITIES as u32)
        .map(|i| City::new(i, format!("City {i}"), i))
        .collect();
    seed(&backend, &full).await;
    let mut manager = manager(StubApi::default(), Arc::clone(&backend));
    manager.bootstrap().await.unwrap();

    manager.add_city("Paris").await.unwrap();

    assert_eq!(manager.cities(), full.as_slice());
    assert_eq!(
        manager.error(),
        Some("You can track up to 10 cities. Remove one to add another")
    );
    assert_eq!(stored(&backend).await, full);
}

#[tokio::test]
async fn test_clear_error() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let mut manager = manager(StubApi::default(), backend);
    manager.bootstrap().await.unwrap();
    manager.add_city("London").await.unwrap();
    assert!(manager.error().is_some());

    manager.clear_error();

    assert_eq!(manager.error(), None);
}

// ============================================================================
// Remove / reorder
// ============================================================================

#[tokio::test]
async fn test_remove_city() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    seed(
        &backend,
        &[City::new(1, "A", 1), City::new(2, "B", 2), City::new(3, "C", 3)],
    )
    .await;
    let mut manager = manager(StubApi::default(), Arc::clone(&backend));
    manager.bootstrap().await.unwrap();

    manager.remove_city(2).await.unwrap();

    let expected = vec![City::new(1, "A", 1), City::new(3, "C", 3)];
    assert_eq!(manager.cities(), expected.as_slice());
    assert_eq!(stored(&backend).await, expected);
}

#[tokio::test]
async fn test_remove_absent_id_is_noop() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let saved = vec![City::new(1, "A", 1), City::new(2, "B", 2)];
    seed(&backend, &saved).await;
    let mut manager = manager(StubApi::default(), Arc::clone(&backend));
    manager.bootstrap().await.unwrap();

    manager.remove_city(42).await.unwrap();

    assert_eq!(manager.cities(), saved.as_slice());
    assert_eq!(manager.error(), None);
}

#[tokio::test]
async fn test_reorder_moves_city_before_target() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    seed(
        &backend,
        &[City::new(1, "A", 1), City::new(2, "B", 2), City::new(3, "C", 3)],
    )
    .await;
    let mut manager = manager(StubApi::default(), Arc::clone(&backend));
    manager.bootstrap().await.unwrap();

    manager.reorder(1, 3).await.unwrap();

    let expected = vec![City::new(3, "C", 1), City::new(1, "A", 2), City::new(2, "B", 3)];
    assert_eq!(manager.cities(), expected.as_slice());
    assert_eq!(stored(&backend).await, expected);
}

#[tokio::test]
async fn test_monotonic_ids_do_not_repeat() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    seed(&backend, &[City::new(0, "A", 0), City::new(1, "B", 1)]).await;
    let mut manager = CityManager::new(
        CityList::new(MAX_CITIES, IdStrategy::Monotonic),
        services(StubApi::default(), Arc::clone(&backend)),
    );
    manager.bootstrap().await.unwrap();

    manager.remove_city(0).await.unwrap();
    manager.add_city("C").await.unwrap();

    let ids: Vec<u32> = manager.cities().iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancelled_validation_leaves_list_untouched() {
    let backend: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    let api = StubApi {
        hang: true,
        ..Default::default()
    };
    let mut manager = manager(api, Arc::clone(&backend));
    manager.bootstrap().await.unwrap();

    manager.cancellation_token().cancel();
    let result = manager.add_city("Paris").await;

    assert_eq!(result, Err(ManagerError::Cancelled));
    assert_eq!(manager.cities(), &[City::new(0, "London", 0)]);
    assert!(!manager.state().is_validating());
}

#[tokio::test]
async fn test_cancel_during_save_keeps_memory_and_storage_equal() {
    let store = Arc::new(CancelOnWrite::default());
    let backend: Arc<dyn KeyValueStore> = store.clone();
    seed(
        &backend,
        &[City::new(1, "A", 1), City::new(2, "B", 2), City::new(3, "C", 3)],
    )
    .await;
    let mut manager = manager(StubApi::default(), Arc::clone(&backend));
    manager.bootstrap().await.unwrap();
    let _ = store.token.set(manager.cancellation_token());

    manager.reorder(1, 3).await.unwrap();

    let expected = vec![City::new(3, "C", 1), City::new(1, "A", 2), City::new(2, "B", 3)];
    assert_eq!(manager.cities(), expected.as_slice());
    assert_eq!(stored(&backend).await, expected);

    // The token is now cancelled, so later edits are refused untouched
    assert_eq!(manager.remove_city(1).await, Err(ManagerError::Cancelled));
    assert_eq!(manager.cities(), expected.as_slice());
    assert_eq!(stored(&backend).await, expected);
}

#[tokio::test]
async fn test_cancelled_fetch_after_remove_keeps_saved_list() {
    let store = Arc::new(CancelOnWrite::default());
    let backend: Arc<dyn KeyValueStore> = store.clone();
    seed(&backend, &[City::new(0, "A", 0), City::new(1, "B", 1)]).await;
    let api = StubApi {
        hang: true,
        ..Default::default()
    };
    let mut manager = manager(api, Arc::clone(&backend));
    manager.bootstrap().await.unwrap();
    let mut manager = manager.with_weather(true);
    let _ = store.token.set(manager.cancellation_token());

    // Removing the shown city saves, then fetches weather for the next one
    let result = manager.remove_city(0).await;

    assert_eq!(result, Err(ManagerError::Cancelled));
    assert_eq!(manager.cities(), &[City::new(1, "B", 1)]);
    assert_eq!(stored(&backend).await, vec![City::new(1, "B", 1)]);
}

// ============================================================================
// Full stack against a mock provider and a file store
// ============================================================================

#[tokio::test]
async fn test_provider_rejection_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Paris"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "Paris",
            "cod": 200,
            "main": { "temp": 18.0 }
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "Atlantis"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "cod": "404",
            "message": "city not found"
        })))
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let storage = dir.path().join("storage.json");
    let api = OpenWeatherClient::new(HttpClient::new(None).unwrap(), server.uri(), "test-key");
    let services = Services::new(
        Arc::new(api),
        CityStore::new(Arc::new(JsonFileStore::new(&storage))),
        Arc::new(NoLocator),
        "London",
    );
    let mut manager = CityManager::new(CityList::default(), services);
    manager.bootstrap().await.unwrap();

    manager.add_city("Atlantis").await.unwrap();
    assert_eq!(manager.error(), Some(INVALID));
    manager.clear_error();

    manager.add_city("Paris").await.unwrap();
    assert_eq!(manager.error(), None);

    let raw = std::fs::read_to_string(&storage).unwrap();
    let file: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let cities: Vec<City> =
        serde_json::from_str(file[CITIES_KEY].as_str().unwrap()).unwrap();
    assert_eq!(
        cities,
        vec![City::new(0, "London", 0), City::new(1, "Paris", 1)]
    );
}

#[tokio::test]
async fn test_truncated_storage_file_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let storage = dir.path().join("storage.json");
    std::fs::write(&storage, r#"{"weather.cities": "[{\"id\":0"#).unwrap();
    let backend: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(&storage));
    let mut manager = manager(StubApi::default(), Arc::clone(&backend));

    manager.bootstrap().await.unwrap();
    assert_eq!(manager.error(), None);
    manager.add_city("Paris").await.unwrap();

    let expected = vec![City::new(0, "London", 0), City::new(1, "Paris", 1)];
    assert_eq!(manager.error(), None);
    assert_eq!(manager.cities(), expected.as_slice());
    let reopened: Arc<dyn KeyValueStore> = Arc::new(JsonFileStore::new(&storage));
    assert_eq!(stored(&reopened).await, expected);
}
