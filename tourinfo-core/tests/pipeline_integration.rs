//! Both stages wired together against mock providers.

mod common;

use tourinfo_core::{
    Config, ForecastFetcher, LocationResolver, PersistedStore, Pipeline, transport::cache::CACHE_FILE,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{USER_AGENT, baia_mare, forecast_body, store, transport};

fn pipeline(server: &MockServer, store: &PersistedStore) -> Pipeline {
    Pipeline::new(
        LocationResolver::new(
            format!("{}/search", server.uri()),
            USER_AGENT,
            transport(),
            store.clone(),
        ),
        ForecastFetcher::new(format!("{}/v1/forecast", server.uri()), transport(), store.clone()),
        store.clone(),
    )
}

#[tokio::test]
async fn test_baia_mare_week() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Baia Mare"))
        .respond_with(ResponseTemplate::new(200).set_body_json(baia_mare()))
        .expect(1)
        .mount(&server)
        .await;
    // The forecast must be requested for the coordinates the geocoder returned.
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "47.6571945"))
        .and(query_param("longitude", "23.5680173"))
        .and(query_param("forecast_hours", "168"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(168, &[])))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, store) = store();
    let report = pipeline(&server, &store).run("Baia Mare", 168).await;

    assert!(report.is_complete());
    let location = store.read_location().unwrap().unwrap();
    assert_eq!(location.country_code, "ro");

    let series = store.read_forecast().unwrap().unwrap();
    assert_eq!(series.len(), 168);
    assert!(series.first().unwrap().timestamp <= series.last().unwrap().timestamp);
    assert!(
        series
            .records()
            .windows(2)
            .all(|w| (w[1].timestamp - w[0].timestamp).num_seconds() == 3600)
    );
    assert_eq!(report.forecast.unwrap(), series);
}

#[tokio::test]
async fn test_unresolved_location_falls_back_to_degenerate_coordinates() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "0"))
        .and(query_param("longitude", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(24, &[])))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, store) = store();
    let report = pipeline(&server, &store).run("Atlantis", 24).await;

    assert!(report.location.is_none());
    assert_eq!(report.forecast.map(|s| s.len()), Some(24));
    assert!(store.read_location().unwrap().is_none());
}

#[tokio::test]
async fn test_failed_resolution_reuses_previously_persisted_location() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "47.6571945"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(12, &[])))
        .expect(1)
        .mount(&server)
        .await;

    let (_dir, store) = store();
    // Seed the store the way an earlier successful run would have.
    let seed = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(baia_mare()))
        .mount(&seed)
        .await;
    LocationResolver::new(
        format!("{}/search", seed.uri()),
        USER_AGENT,
        transport(),
        store.clone(),
    )
    .resolve("Baia Mare")
    .await
    .unwrap();

    let report = pipeline(&server, &store).run("Baia Mare", 12).await;

    assert!(report.location.is_none());
    assert_eq!(report.forecast.map(|s| s.len()), Some(12));
    assert_eq!(store.read_location().unwrap().unwrap().country_code, "ro");
}

#[tokio::test]
async fn test_no_stage_failure_aborts_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let (_dir, store) = store();
    let report = pipeline(&server, &store).run("Baia Mare", 24).await;

    assert!(report.location.is_none());
    assert!(report.forecast.is_none());
    assert!(store.read_forecast().unwrap().is_none());
}

#[tokio::test]
async fn test_from_config_wires_endpoints_cache_and_data_dir() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(baia_mare()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body(48, &[])))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.data_dir = Some(dir.path().to_path_buf());
    config.endpoints.geocoding = format!("{}/search", server.uri());
    config.endpoints.forecast = format!("{}/v1/forecast", server.uri());
    config.http.user_agent = USER_AGENT.to_string();
    config.http.max_retries = 0;

    let pipeline = Pipeline::from_config(&config).unwrap();
    let report = pipeline.run("Baia Mare", 48).await;
    assert!(report.is_complete());

    // Second forecast comes from the response cache.
    let again = pipeline.refresh_forecast(48).await.unwrap();
    assert_eq!(again.len(), 48);

    assert!(dir.path().join(CACHE_FILE).exists());
    assert_eq!(pipeline.store().dir(), dir.path());
    assert!(pipeline.store().read_location().unwrap().is_some());
}
