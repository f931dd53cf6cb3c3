//! First-run bootstrap: create the one initial admin account.
//!
//! The path closes permanently the moment any admin exists, regardless of
//! who calls it or with what payload.

use axum::{
    extract::State,
    http::{header::SET_COOKIE, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::auth::{open_session, validate_credentials, SessionData, UserJson};
use super::{map_db_error, map_unique_violation, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct SetupStatus {
    pub needs_setup: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct SetupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// GET /api/setup — whether the bootstrap path is still open.
pub(super) async fn setup_status(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<SetupStatus>>, ApiError> {
    let admins = storefront_db::count_admins(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: SetupStatus {
            needs_setup: admins == 0,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/setup — create the first admin and open its session.
pub(super) async fn create_first_admin(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SetupRequest>,
) -> Result<(StatusCode, [(axum::http::HeaderName, String); 1], Json<ApiResponse<SessionData>>), ApiError>
{
    let rid = &req_id.0;

    let admins = storefront_db::count_admins(&state.pool)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if admins > 0 {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "setup has already been completed",
        ));
    }

    let (name, email, password) = validate_credentials(
        rid,
        body.name.as_deref(),
        body.email.as_deref(),
        body.password.as_deref(),
    )?;
    let password_hash = storefront_core::auth::hash_password(&password).map_err(|e| {
        tracing::error!(error = %e, "password hashing failed");
        ApiError::new(rid, "internal_error", "could not create account")
    })?;

    let user = storefront_db::create_user(&state.pool, &name, &email, &password_hash, true)
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
