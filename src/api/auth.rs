use axum::{
    Extension, Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;
use tracing::{info, warn};
use uuid::Uuid;

use super::client::ClientAddress;
use super::validation::{
    validate_email, validate_new_password, validate_required, validate_username,
};
use super::{AccountDto, ApiError, ApiResponse, AppState, MessageResponse};
use crate::models::Account;
use crate::services::AccountError;

/// Session entry holding the signed-in account id.
pub const SESSION_ACCOUNT_KEY: &str = "account_id";

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ChangePasswordRequest {
    #[serde(alias = "currentPassword")]
    pub current_password: String,
    #[serde(alias = "newPassword")]
    pub new_password: String,
}

/// The authenticated account, inserted by [`require_user`] / [`require_admin`].
#[derive(Debug, Clone)]
pub struct CurrentAccount(pub Account);

// ============================================================================
// Middleware
// ============================================================================

/// Rejects requests without a live session for an active account.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let account = session_account(&state, &session).await?;

    tracing::Span::current().record("user_id", tracing::field::display(account.id));
    request.extensions_mut().insert(CurrentAccount(account));

    Ok(next.run(request).await)
}

/// Like [`require_user`], and additionally requires the administrator flag.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let account = session_account(&state, &session).await?;

    tracing::Span::current().record("user_id", tracing::field::display(account.id));

    if !account.is_admin {
        warn!(account_id = %account.id, path = %request.uri().path(), "Non-admin denied admin route");
        return Err(ApiError::Forbidden(
            "Administrator access required".to_string(),
        ));
    }

    request.extensions_mut().insert(CurrentAccount(account));
    Ok(next.run(request).await)
}

async fn session_account(state: &AppState, session: &Session) -> Result<Account, ApiError> {
    let account_id = session
        .get::<Uuid>(SESSION_ACCOUNT_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(ApiError::not_authenticated)?;

    let account = match state.accounts().get(account_id).await {
        Ok(account) => account,
        Err(AccountError::NotFound) => {
            let _ = session.flush().await;
            return Err(ApiError::not_authenticated());
        }
        Err(e) => return Err(e.into()),
    };

    if account.is_blocked {
        let _ = session.flush().await;
        return Err(ApiError::Forbidden("Account is blocked".to_string()));
    }

    Ok(account)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/register
/// Create a regular account and sign it in
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<AccountDto>>), ApiError> {
    let username = validate_username(&payload.username)?;
    let email = validate_email(&payload.email)?;
    let password = validate_new_password(&payload.password)?;

    let account = state.accounts().register(username, email, password).await?;

    start_session(&session, account.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(AccountDto::from(account))),
    ))
}

/// POST /api/login
/// Authenticate with username and password and start a session
pub async fn login(
    State(state): State<Arc<AppState>>,
    ClientAddress(address): ClientAddress,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    validate_required(&payload.username, "Username")?;
    validate_required(&payload.password, "Password")?;

    if state.throttle().is_locked_out(&address).await? {
        record_attempt(&state, &payload.username, &address, false).await;
        return Err(ApiError::too_many_attempts());
    }

    let result = state
        .accounts()
        .login(&payload.username, &payload.password, &address)
        .await;

    record_attempt(&state, &payload.username, &address, result.is_ok()).await;

    let account = result?;
    start_session(&session, account.id).await?;

    info!(account_id = %account.id, "User signed in");
    Ok(Json(ApiResponse::success(AccountDto::from(account))))
}

/// POST /api/logout
/// Invalidate the current session
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse::new("Logged out")))
}

/// GET /api/user
pub async fn get_current_user(
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
) -> Json<ApiResponse<AccountDto>> {
    Json(ApiResponse::success(AccountDto::from(account)))
}

/// POST /api/change-password
/// Change password (requires current password verification)
pub async fn change_password(
    State(state): State<Arc<AppState>>,
    Extension(CurrentAccount(account)): Extension<CurrentAccount>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    validate_new_password(&payload.new_password)?;

    state
        .accounts()
        .change_password(account.id, &payload.current_password, &payload.new_password)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse::new(
        "Password updated successfully",
    ))))
}

// ============================================================================
// Helpers
// ============================================================================

async fn start_session(session: &Session, account_id: Uuid) -> Result<(), ApiError> {
    session
        .cycle_id()
        .await
        .map_err(|e| ApiError::internal(format!("Failed to rotate session: {e}")))?;

    session
        .insert(SESSION_ACCOUNT_KEY, account_id)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))
}

/// Attempts are audit data; a failed write is logged and does not fail the request.
pub(super) async fn record_attempt(state: &AppState, username: &str, address: &str, success: bool) {
    if let Err(e) = state.throttle().record(username, address, success).await {
        warn!(username, address, "Failed to record login attempt: {e}");
    }
}
