//! Desktop client authentication endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

use super::auth::record_attempt;
use super::client::ClientAddress;
use super::validation;
use super::{AppState, DesktopAuthResponse};
use crate::services::AuthDecision;

#[derive(Debug, Deserialize)]
pub struct DesktopAuthRequest {
    pub username: String,
    pub password: String,
    pub key: String,
    pub hwid: String,
}

impl DesktopAuthRequest {
    /// Trims the key and hardware id. `None` when any field is empty, so an
    /// empty fingerprint can never be bound to an account.
    fn normalized(self) -> Option<Self> {
        let request = Self {
            key: self.key.trim().to_string(),
            hwid: self.hwid.trim().to_string(),
            ..self
        };

        let valid = [
            (request.username.as_str(), "Username"),
            (request.password.as_str(), "Password"),
            (request.key.as_str(), "Key"),
            (request.hwid.as_str(), "Hardware ID"),
        ]
        .into_iter()
        .all(|(value, field)| validation::validate_required(value, field).is_ok());
        valid.then_some(request)
    }
}

/// POST /api/desktop-auth
///
/// Exactly one login attempt is recorded per well-formed request, including
/// throttled ones. A body with a missing or empty field is rejected with 400
/// before anything is recorded.
pub async fn desktop_auth(
    State(state): State<Arc<AppState>>,
    ClientAddress(address): ClientAddress,
    payload: Result<Json<DesktopAuthRequest>, JsonRejection>,
) -> Response {
    let Some(request) = payload.ok().and_then(|Json(request)| request.normalized()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(DesktopAuthResponse::denied("Invalid request")),
        )
            .into_response();
    };

    match state.throttle().is_locked_out(&address).await {
        Ok(false) => {}
        Ok(true) => {
            record_attempt(&state, &request.username, &address, false).await;
            return (
                StatusCode::TOO_MANY_REQUESTS,
                Json(DesktopAuthResponse::denied(
                    "Too many failed attempts, try again later",
                )),
            )
                .into_response();
        }
        Err(e) => {
            error!("Throttle lookup failed: {e}");
            return internal_error();
        }
    }

    let decision = state
        .desktop_auth()
        .validate(&request.username, &request.password, &request.key, &request.hwid)
        .await;

    let granted = matches!(decision, Ok(AuthDecision::Granted(_)));
    record_attempt(&state, &request.username, &address, granted).await;

    match decision {
        Ok(AuthDecision::Granted(_)) => {
            (StatusCode::OK, Json(DesktopAuthResponse::granted())).into_response()
        }
        Ok(AuthDecision::Denied(rejection)) => (
            StatusCode::UNAUTHORIZED,
            Json(DesktopAuthResponse::denied(rejection.to_string())),
        )
            .into_response(),
        Err(e) => {
            error!("Desktop authentication failed: {e}");
            internal_error()
        }
    }
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(DesktopAuthResponse::denied("Internal server error")),
    )
        .into_response()
}
