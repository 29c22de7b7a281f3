use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Config;
use crate::services::{AccountService, DesktopAuthService, KeyService, LoginThrottle};
use crate::state::SharedState;

mod admin;
pub mod auth;
pub mod client;
mod desktop;
mod error;
mod keys;
mod observability;
mod profile;
mod system;
mod types;
pub mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn accounts(&self) -> &Arc<dyn AccountService> {
        &self.shared.account_service
    }

    #[must_use]
    pub fn keys(&self) -> &Arc<dyn KeyService> {
        &self.shared.key_service
    }

    #[must_use]
    pub fn desktop_auth(&self) -> &Arc<dyn DesktopAuthService> {
        &self.shared.desktop_auth
    }

    #[must_use]
    pub fn throttle(&self) -> &LoginThrottle {
        &self.shared.throttle
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    Ok(create_app_state(shared, prometheus_handle))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (cors_origins, secure_cookies, inactivity_minutes) = {
        let config = state.config().read().await;
        (
            config.server.cors_allowed_origins.clone(),
            config.server.secure_cookies,
            config.server.session_inactivity_minutes,
        )
    };

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(secure_cookies)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            inactivity_minutes,
        )));

    let api_router = Router::new()
        .merge(create_user_router(state.clone()))
        .nest("/admin", create_admin_router(state.clone()))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/desktop-auth", post(desktop::desktop_auth))
        .route("/health/live", get(system::health_live))
        .route("/health/ready", get(system::health_ready))
        .layer(session_layer)
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_credentials(true)
    };

    let cors_layer = cors_layer
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer)
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_user_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/user", get(auth::get_current_user))
        .route("/change-password", post(auth::change_password))
        .route("/profile", get(profile::get_profile))
        .route("/profile", put(profile::update_profile))
        .route("/keys", get(keys::list_keys))
        .route("/keys/redeem", post(keys::redeem_key))
        .route("/keys/{id}", delete(keys::delete_key))
        .route_layer(middleware::from_fn_with_state(state, auth::require_user))
}

fn create_admin_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/stats", get(admin::get_stats))
        .route("/users", get(admin::list_users))
        .route("/users/{id}/block", post(admin::set_blocked))
        .route("/users/{id}/hwid", delete(admin::reset_hwid))
        .route("/generate-keys", post(admin::generate_keys))
        .route("/recent-keys", get(admin::recent_keys))
        .route("/keys/{id}/assign", post(admin::assign_key))
        .route("/keys/{id}/active", put(admin::set_key_active))
        .route("/keys/{id}", delete(admin::delete_key))
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::require_admin))
}
