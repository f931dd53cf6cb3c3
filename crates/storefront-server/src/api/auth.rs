//! Session endpoints: signup, login, logout, and the `me` probe.
//!
//! The signed credential is stored in an HTTP-only cookie (and returned in
//! the body for bearer-header clients). Script-side code learns its auth
//! state from `GET /api/auth/me`, never from a readable copy of the token.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    Extension, Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::app_config::Environment;
use storefront_core::auth::{hash_password, issue_token, verify_password, Identity};
use storefront_db::UserRow;

use crate::middleware::{CurrentIdentity, RequestId, AUTH_COOKIE};

use super::{
    is_plausible_email, map_db_error, map_unique_violation, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

const MIN_PASSWORD_LEN: usize = 8;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct UserJson {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRow> for UserJson {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            is_admin: row.is_admin,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SessionData {
    pub token: String,
    pub user: UserJson,
}

#[derive(Debug, Serialize)]
pub(super) struct MeData {
    pub authenticated: bool,
    pub user: Option<Identity>,
}

#[derive(Debug, Deserialize)]
pub(super) struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers shared with the setup endpoint
// ---------------------------------------------------------------------------

/// Validate a signup-shaped body into (name, email, password).
pub(super) fn validate_credentials(
    req_id: &str,
    name: Option<&str>,
    email: Option<&str>,
    password: Option<&str>,
) -> Result<(String, String, String), ApiError> {
    let name = name.map(str::trim).unwrap_or_default();
    if name.is_empty() || name.len() > 120 {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            "name must be 1-120 characters",
        ));
    }
    let email = email.map(str::trim).unwrap_or_default();
    if !is_plausible_email(email) {
        return Err(ApiError::new(req_id, "validation_error", "email is not valid"));
    }
    let password = password.unwrap_or_default();
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        ));
    }
    Ok((name.to_owned(), email.to_owned(), password.to_owned()))
}

/// Sign a token for the user and render the session cookie.
pub(super) fn open_session(
    state: &AppState,
    req_id: &str,
    user: &UserRow,
) -> Result<(String, String), ApiError> {
    let identity = Identity {
        id: user.id,
        name: user.name.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
    };
    let token = issue_token(
        &state.config.jwt_secret,
        &identity,
        Duration::days(state.config.token_ttl_days),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "token signing failed");
        ApiError::new(req_id, "internal_error", "could not establish session")
    })?;
    let cookie = session_cookie(state, &token);
    Ok((token, cookie))
}

fn session_cookie(state: &AppState, token: &str) -> String {
    let max_age = state.config.token_ttl_days * 24 * 60 * 60;
    let mut cookie =
        format!("{AUTH_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={max_age}");
    if state.config.env == Environment::Production {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_session_cookie(state: &AppState) -> String {
    let mut cookie = format!("{AUTH_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if state.config.env == Environment::Production {
        cookie.push_str("; Secure");
    }
    cookie
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/auth/signup — create a customer account and open a session.
pub(super) async fn signup(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SignupRequest>,
) -> Result<(StatusCode, [(axum::http::HeaderName, String); 1], Json<ApiResponse<SessionData>>), ApiError>
{
    let rid = &req_id.0;
    let (name, email, password) = validate_credentials(
        rid,
        body.name.as_deref(),
        body.email.as_deref(),
        body.password.as_deref(),
    )?;

    let password_hash = hash_password(&password).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        ApiError::new(rid, "internal_error", "could not create account")
    })?;

    let user = storefront_db::create_user(&state.pool, &name, &email, &password_hash, false)
        .await
        .map_err(|e| map_unique_violation(rid, &e, "an account with that email already exists"))?;

    let (token, cookie) = open_session(&state, rid, &user)?;
    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(ApiResponse {
            data: SessionData {
                token,
                user: UserJson::from(user),
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// POST /api/auth/login
pub(super) async fn login(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<LoginRequest>,
) -> Result<([(axum::http::HeaderName, String); 1], Json<ApiResponse<SessionData>>), ApiError> {
    let rid = &req_id.0;
    let email = body.email.as_deref().map(str::trim).unwrap_or_default();
    let password = body.password.as_deref().unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "email and password are required",
        ));
    }

    let user = storefront_db::get_user_by_email(&state.pool, email)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    // Same response for unknown email and wrong password.
    let Some(user) = user.filter(|u| verify_password(password, &u.password_hash)) else {
        return Err(ApiError::new(rid, "unauthorized", "invalid email or password"));
    };

    let (token, cookie) = open_session(&state, rid, &user)?;
    Ok((
        [(SET_COOKIE, cookie)],
        Json(ApiResponse {
            data: SessionData {
                token,
                user: UserJson::from(user),
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// POST /api/auth/logout — expire the session cookie.
pub(super) async fn logout(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> ([(axum::http::HeaderName, String); 1], Json<ApiResponse<serde_json::Value>>) {
    (
        [(SET_COOKIE, clear_session_cookie(&state))],
        Json(ApiResponse {
            data: serde_json::json!({ "message": "logged out" }),
            meta: ResponseMeta::new(req_id.0),
        }),
    )
}

/// GET /api/auth/me — the script-visible auth probe. Always 200; anonymous
/// callers see `authenticated: false`.
pub(super) async fn me(
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
) -> Json<ApiResponse<MeData>> {
    Json(ApiResponse {
        data: MeData {
            authenticated: current.0.is_some(),
            user: current.0,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
