#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use keyhub::config::Config;
use serde_json::Value;
use tower::ServiceExt;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "admin-password-1";

pub fn test_config() -> Config {
    let mut config = Config::default();
    let db_path = std::env::temp_dir().join(format!("keyhub-test-{}.db", uuid::Uuid::new_v4()));
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;
    config.observability.metrics_enabled = false;
    config.bootstrap.admin_username = ADMIN_USERNAME.to_string();
    config.bootstrap.admin_password = ADMIN_PASSWORD.to_string();
    config
}

pub async fn spawn_app_with(config: Config) -> Router {
    let state = keyhub::api::create_app_state_from_config(config, None)
        .await
        .expect("Failed to create app state");
    keyhub::api::router(state).await
}

/// Second connection to the app's database, for asserting on stored rows.
pub async fn open_store(config: &Config) -> keyhub::db::Store {
    keyhub::db::Store::new(&config.general.database_path)
        .await
        .expect("Failed to open test database")
}

pub async fn spawn_app() -> Router {
    spawn_app_with(test_config()).await
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    app.clone().oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

/// `name=value` part of the session `Set-Cookie` header.
pub fn session_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("response should set a session cookie")
        .to_string()
}

pub async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = send(
        app,
        "POST",
        "/api/login",
        None,
        Some(serde_json::json!({ "username": username, "password": password })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    session_cookie(&response)
}

pub async fn admin_login(app: &Router) -> String {
    login(app, ADMIN_USERNAME, ADMIN_PASSWORD).await
}

/// Registers an account and returns `(cookie, account_id)`.
pub async fn register(app: &Router, username: &str, password: &str) -> (String, String) {
    let response = send(
        app,
        "POST",
        "/api/register",
        None,
        Some(serde_json::json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": password,
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = session_cookie(&response);
    let body = json_body(response).await;
    let id = body["data"]["id"].as_str().unwrap().to_string();
    (cookie, id)
}

/// Generates keys as admin and returns their JSON objects.
pub async fn generate_keys(app: &Router, admin_cookie: &str, quantity: u32) -> Vec<Value> {
    let response = send(
        app,
        "POST",
        "/api/admin/generate-keys",
        Some(admin_cookie),
        Some(serde_json::json!({ "quantity": quantity, "expirationDays": 0 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    json_body(response).await["data"]
        .as_array()
        .unwrap()
        .clone()
}
