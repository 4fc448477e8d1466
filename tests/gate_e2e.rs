//! E2E tests: authorization gate behavior over real actix services.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use actix_web::{App, HttpResponse, test, web};
use async_trait::async_trait;

use funcgate::auth::{AuthGate, Authorized, GateSettings, SecretStoreHandle};
use funcgate::config::FUNCTIONS_KEY_HEADER;
use funcgate::secrets::{
    HostSecrets, SecretMap, SecretStore, SecretStoreError, StaticSecretStore,
};

/// The standard fixture: master "M1", system keys sys1/sys2, function key
/// fk1 scoped to "f1".
fn fixture_store() -> StaticSecretStore {
    StaticSecretStore::new()
        .with_master("M1")
        .with_system_key("sys1", "S1")
        .with_system_key("sys2", "S2")
        .with_function_key("f1", "fk1", "F1")
}

/// Counts host-secret fetches, shared across clones.
#[derive(Clone)]
struct CountingStore {
    inner: Arc<StaticSecretStore>,
    host_fetches: Arc<AtomicUsize>,
}

impl CountingStore {
    fn new(inner: StaticSecretStore) -> Self {
        Self {
            inner: Arc::new(inner),
            host_fetches: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl SecretStore for CountingStore {
    async fn get_host_secrets(&self) -> Result<HostSecrets, SecretStoreError> {
        self.host_fetches.fetch_add(1, Ordering::SeqCst);
        self.inner.get_host_secrets().await
    }

    async fn get_function_secrets(
        &self,
        function_name: &str,
    ) -> Result<SecretMap, SecretStoreError> {
        self.inner.get_function_secrets(function_name).await
    }
}

/// Store that fails every fetch.
struct BrokenStore;

#[async_trait]
impl SecretStore for BrokenStore {
    async fn get_host_secrets(&self) -> Result<HostSecrets, SecretStoreError> {
        Err(SecretStoreError::Unavailable("store down".to_string()))
    }

    async fn get_function_secrets(&self, _: &str) -> Result<SecretMap, SecretStoreError> {
        Err(SecretStoreError::Unavailable("store down".to_string()))
    }
}

async fn echo_auth(auth: Authorized) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "level": auth.0.level.as_str(),
        "key": auth.0.key_name,
    }))
}

/// Builds the gated test app over the given store and settings.
macro_rules! gated_app {
    ($store:expr, $settings:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new(SecretStoreHandle::new($store)))
                .app_data(web::Data::new($settings))
                .service(
                    web::resource("/api/f1")
                        .wrap(AuthGate::function("f1"))
                        .route(web::get().to(echo_auth)),
                )
                .service(
                    web::resource("/admin/status")
                        .wrap(AuthGate::admin())
                        .route(web::get().to(echo_auth)),
                )
                .service(
                    web::resource("/sys")
                        .wrap(AuthGate::system())
                        .route(web::get().to(echo_auth)),
                )
                .service(
                    web::resource("/sys/named")
                        .wrap(AuthGate::system_key("sys2"))
                        .route(web::get().to(echo_auth)),
                )
                .service(
                    web::resource("/exempt")
                        .wrap(AuthGate::admin().allow_anonymous())
                        .route(web::get().to(echo_auth)),
                )
                .service(
                    web::resource("/open")
                        .wrap(AuthGate::anonymous())
                        .route(web::get().to(echo_auth)),
                ),
        )
    };
}

async fn get_json<S, B>(app: &S, req: test::TestRequest) -> (u16, serde_json::Value)
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = actix_web::dev::ServiceResponse<B>,
            Error = actix_web::Error,
        >,
    B: actix_web::body::MessageBody,
{
    let resp = test::call_service(app, req.to_request()).await;
    let status = resp.status().as_u16();
    let body = test::read_body(resp).await;
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// (1) Master key via header → Admin, reserved name, even on an admin route.
#[actix_rt::test]
async fn test_master_key_reaches_admin_route() {
    let app = gated_app!(fixture_store(), GateSettings::default()).await;

    let (status, body) = get_json(
        &app,
        test::TestRequest::get()
            .uri("/admin/status")
            .insert_header((FUNCTIONS_KEY_HEADER, "M1")),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["level"], "admin");
    assert_eq!(body["key"], "master");
}

/// (2) System key on an admin route → 401 (System < Admin).
#[actix_rt::test]
async fn test_system_key_rejected_from_admin_route() {
    let app = gated_app!(fixture_store(), GateSettings::default()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/admin/status")
            .insert_header((FUNCTIONS_KEY_HEADER, "S1"))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status().as_u16(), 401);
}

/// (3) System key passes a function-level gate (System >= Function).
#[actix_rt::test]
async fn test_system_key_passes_function_gate() {
    let app = gated_app!(fixture_store(), GateSettings::default()).await;

    let (status, body) = get_json(
        &app,
        test::TestRequest::get()
            .uri("/api/f1")
            .insert_header((FUNCTIONS_KEY_HEADER, "S1")),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(body["level"], "system");
    assert_eq!(body["key"], "sys1");
}

/// (4) Function key via the `code` query parameter → Function, its name.
#[actix_rt::test]
async fn test_function_key_via_query_parameter() {
    let app = gated_app!(fixture_store(), GateSettings::default()).await;

    let (status, body) = get_json(&app, test::TestRequest::get().uri("/api/f1?code=F1")).await;

    assert_eq!(status, 200);
    assert_eq!(body["level"], "function");
    assert_eq!(body["key"], "fk1");
}

/// (5) A function key does not reach a system-level gate.
#[actix_rt::test]
async fn test_function_key_rejected_from_system_gate() {
    let app = gated_app!(fixture_store(), GateSettings::default()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/sys")
            .insert_header((FUNCTIONS_KEY_HEADER, "F1"))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status().as_u16(), 401);
}

/// (6) Unknown key → 401 with an empty body (no tier detail leaks).
#[actix_rt::test]
async fn test_unknown_key_rejected_with_empty_body() {
    let app = gated_app!(fixture_store(), GateSettings::default()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/f1")
            .insert_header((FUNCTIONS_KEY_HEADER, "X"))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status().as_u16(), 401);
    let body = test::read_body(resp).await;
    assert!(body.is_empty());
}

/// (7) No key at all on an anonymous route → 200, Anonymous.
#[actix_rt::test]
async fn test_anonymous_route_needs_no_key() {
    let app = gated_app!(fixture_store(), GateSettings::default()).await;

    let (status, body) = get_json(&app, test::TestRequest::get().uri("/open")).await;

    assert_eq!(status, 200);
    assert_eq!(body["level"], "anonymous");
    assert_eq!(body["key"], serde_json::Value::Null);
}

/// (8) Disable switch on → everything allowed, even keyless admin calls.
#[actix_rt::test]
async fn test_disable_switch_allows_everything() {
    let app = gated_app!(
        fixture_store(),
        GateSettings {
            auth_disabled: true
        }
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/admin/status").to_request(),
    )
    .await;

    assert_eq!(resp.status().as_u16(), 200);
}

/// (9) Exemption outranks even an Admin requirement.
#[actix_rt::test]
async fn test_exempt_route_allows_anonymous_caller() {
    let app = gated_app!(fixture_store(), GateSettings::default()).await;

    let (status, body) = get_json(&app, test::TestRequest::get().uri("/exempt")).await;

    assert_eq!(status, 200);
    assert_eq!(body["level"], "anonymous");
}

/// (10) Named-key gate: another system key's value is not accepted.
#[actix_rt::test]
async fn test_named_system_gate_restricts_to_its_key() {
    let app = gated_app!(fixture_store(), GateSettings::default()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/sys/named")
            .insert_header((FUNCTIONS_KEY_HEADER, "S1"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 401);

    let (status, body) = get_json(
        &app,
        test::TestRequest::get()
            .uri("/sys/named")
            .insert_header((FUNCTIONS_KEY_HEADER, "S2")),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(body["key"], "sys2");
}

/// (11) Chained gates resolve once: the cached result is reused.
#[actix_rt::test]
async fn test_chained_gates_resolve_once() {
    let store = CountingStore::new(fixture_store());
    let fetches = Arc::clone(&store.host_fetches);

    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(SecretStoreHandle::new(store)))
            .app_data(web::Data::new(GateSettings::default()))
            .service(
                web::resource("/chained")
                    .wrap(AuthGate::function("f1"))
                    .wrap(AuthGate::system())
                    .route(web::get().to(echo_auth)),
            ),
    )
    .await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/chained")
            .insert_header((FUNCTIONS_KEY_HEADER, "S1"))
            .to_request(),
    )
    .await;

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
}

/// (12) Keyless requests never touch the store.
#[actix_rt::test]
async fn test_keyless_request_skips_store() {
    let store = CountingStore::new(fixture_store());
    let fetches = Arc::clone(&store.host_fetches);

    let app = gated_app!(store, GateSettings::default()).await;

    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/open").to_request()).await;

    assert_eq!(resp.status().as_u16(), 200);
    assert_eq!(fetches.load(Ordering::SeqCst), 0);
}

/// (13) Store outage denies protected routes but not exempt ones.
#[actix_rt::test]
async fn test_store_outage_denies_protected_routes() {
    let app = gated_app!(BrokenStore, GateSettings::default()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/admin/status")
            .insert_header((FUNCTIONS_KEY_HEADER, "M1"))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status().as_u16(), 401);

    let (status, _) = get_json(
        &app,
        test::TestRequest::get()
            .uri("/exempt")
            .insert_header((FUNCTIONS_KEY_HEADER, "M1")),
    )
    .await;
    assert_eq!(status, 200);
}
