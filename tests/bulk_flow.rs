//! End-to-end bulk operation flow through the HTTP surface
//!
//! Exercises the whole chain: start endpoint -> detached batch ->
//! provider HTTP calls (stubbed with wiremock) -> status endpoint.

use actix_web::{test, web};
use credhub::config::Config;
use credhub::core::operations::{OperationRegistry, OperationStatus};
use credhub::core::providers::{HttpCredentialChecker, ProviderEndpoints};
use credhub::server::{AppState, HttpServer};
use credhub::storage::{InMemoryStore, PersistenceService, StaticTokenSessions};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "integration-test-admin-token!!!!";

fn build_state(provider_base: &str) -> (AppState, Arc<InMemoryStore>) {
    let mut config = Config::default();
    config.auth.admin_token = TOKEN.to_string();
    config.operations.check_concurrency = 3;
    config.operations.check_retry_attempts = 1;
    config.providers.voice_api_base = provider_base.to_string();

    let registry = Arc::new(OperationRegistry::default());
    let store = Arc::new(InMemoryStore::new());
    let checker = Arc::new(HttpCredentialChecker::new(config.providers.endpoints()));
    let state = AppState::new(
        config,
        registry,
        Arc::clone(&store) as Arc<dyn PersistenceService>,
        Arc::new(StaticTokenSessions::new(TOKEN)),
        checker,
    );
    (state, store)
}

async fn wait_terminal(registry: &Arc<OperationRegistry>, operation_id: &str) {
    for _ in 0..1000 {
        let record = registry.get(operation_id).expect("operation vanished");
        if record.status.is_terminal() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("operation {} never reached a terminal state", operation_id);
}

#[actix_web::test]
async fn import_then_check_flow() {
    let provider = MockServer::start().await;
    // Accept every key except the one we plant as revoked.
    Mock::given(method("GET"))
        .and(path("/v1/user/subscription"))
        .and(header("xi-api-key", "vk_revoked"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&provider)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/user/subscription"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({ "character_count": 9000 })),
        )
        .mount(&provider)
        .await;

    let (state, store) = build_state(&provider.uri());
    let registry = Arc::clone(&state.registry);
    let app = test::init_service(HttpServer::create_app(web::Data::new(state))).await;

    // 1. Import four keys, one of them twice.
    let req = test::TestRequest::post()
        .uri("/credentials/bulk-import")
        .insert_header(("Authorization", format!("Bearer {}", TOKEN)))
        .set_json(serde_json::json!({
            "keys_text": "vk_one\nvk_two\nvk_revoked\nvk_one",
            "provider": "voice",
        }))
        .to_request();
    let body: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total_items"], 4);
    let import_id = body["data"]["operation_id"].as_str().unwrap().to_string();

    wait_terminal(&registry, &import_id).await;

    let req = test::TestRequest::get()
        .uri(&format!("/operations/{}/status", import_id))
        .to_request();
    let status: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(status["data"]["status"], "completed");
    assert_eq!(status["data"]["progress"], 100);
    assert_eq!(status["data"]["errors"].as_array().unwrap().len(), 1);
    assert_eq!(store.credential_count(), 3);

    // 2. Re-validate everything against the stubbed provider.
    let req = test::TestRequest::post()
        .uri("/credentials/check-all")
        .insert_header(("Authorization", format!("Bearer {}", TOKEN)))
        .to_request();
    let body: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    let check_id = body["data"]["operation_id"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["total_items"], 3);

    wait_terminal(&registry, &check_id).await;

    let req = test::TestRequest::get()
        .uri(&format!("/operations/{}/status", check_id))
        .to_request();
    let status: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(status["data"]["status"], "completed");
    let errors = status["data"]["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0]["error"].as_str().unwrap().contains("HTTP 401"));

    let revoked = store.find_credential_by_key("vk_revoked").await.unwrap().unwrap();
    assert_eq!(
        serde_json::to_value(revoked.status).unwrap(),
        serde_json::json!("dead")
    );
    let good = store.find_credential_by_key("vk_one").await.unwrap().unwrap();
    assert_eq!(good.credit_balance, Some(9000));
}

#[actix_web::test]
async fn registry_snapshot_matches_http_view() {
    let provider = MockServer::start().await;
    let (state, _store) = build_state(&provider.uri());
    let registry = Arc::clone(&state.registry);
    let app = test::init_service(HttpServer::create_app(web::Data::new(state))).await;

    let req = test::TestRequest::post()
        .uri("/credentials/bulk-import")
        .insert_header(("Authorization", format!("Bearer {}", TOKEN)))
        .set_json(serde_json::json!({ "keys_text": "vk_solo", "provider": "voice" }))
        .to_request();
    let body: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    let operation_id = body["data"]["operation_id"].as_str().unwrap().to_string();

    wait_terminal(&registry, &operation_id).await;
    let record = registry.get(&operation_id).unwrap();
    assert_eq!(record.status, OperationStatus::Completed);

    let req = test::TestRequest::get()
        .uri(&format!("/operations/{}/status", operation_id))
        .to_request();
    let status: serde_json::Value = test::read_body_json(test::call_service(&app, req).await).await;
    assert_eq!(status["data"]["current_item"], record.current_item);
    assert_eq!(
        status["data"]["operation_id"].as_str().unwrap(),
        record.operation_id
    );
}
