//! User account endpoints: admin listing, self-or-admin read/update,
//! admin-only deletion. Role changes are reserved to admins — a user can
//! never grant themselves `is_admin`.

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::{CurrentIdentity, RequestId};

use super::auth::UserJson;
use super::{
    is_plausible_email, map_db_error, map_unique_violation, parse_limit, parse_page,
    require_admin, require_user, ApiError, ApiResponse, AppState, Pagination, ResponseMeta,
};

#[derive(Debug, Serialize)]
pub(super) struct UserListData {
    pub users: Vec<UserJson>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "isAdmin")]
    pub is_admin: Option<bool>,
}

/// GET /api/users (admin).
pub(super) async fn list_users(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Query(params): Query<UserListParams>,
) -> Result<Json<ApiResponse<UserListData>>, ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;

    let page = parse_page(params.page.as_deref());
    let limit = parse_limit(params.limit.as_deref(), 20);
    let (rows, total) = storefront_db::list_users(&state.pool, limit, (page - 1) * limit)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: UserListData {
            users: rows.into_iter().map(UserJson::from).collect(),
            pagination: Pagination::new(total, page, limit),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/users/:id (self or admin).
pub(super) async fn get_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<UserJson>>, ApiError> {
    let rid = &req_id.0;
    let caller = require_user(&current, rid)?;
    if caller.id != id && !caller.is_admin {
        return Err(ApiError::new(rid, "unauthorized", "not your account"));
    }

    let row = storefront_db::get_user(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "user not found"))?;

    Ok(Json(ApiResponse {
        data: UserJson::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /api/users/:id (self or admin; role changes admin-only).
pub(super) async fn update_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<UserJson>>, ApiError> {
    let rid = &req_id.0;
    let caller = require_user(&current, rid)?;
    if caller.id != id && !caller.is_admin {
        return Err(ApiError::new(rid, "unauthorized", "not your account"));
    }
    if body.is_admin.is_some() && !caller.is_admin {
        return Err(ApiError::new(
            rid,
            "unauthorized",
            "only an admin may change roles",
        ));
    }

    let name = body.name.as_deref().map(str::trim);
    if let Some(name) = name {
        if name.is_empty() || name.len() > 120 {
            return Err(ApiError::new(
                rid,
                "validation_error",
                "name must be 1-120 characters",
            ));
        }
    }
    let email = body.email.as_deref().map(str::trim);
    if let Some(email) = email {
        if !is_plausible_email(email) {
            return Err(ApiError::new(rid, "validation_error", "email is not valid"));
        }
    }
    let password_hash = match body.password.as_deref() {
        Some(password) if password.len() >= 8 => {
            Some(storefront_core::auth::hash_password(password).map_err(|e| {
                tracing::error!(error = %e, "password hashing failed");
                ApiError::new(rid, "internal_error", "could not update account")
            })?)
        }
        Some(_) => {
            return Err(ApiError::new(
                rid,
                "validation_error",
                "password must be at least 8 characters",
            ))
        }
        None => None,
    };

    let row = storefront_db::update_user(
        &state.pool,
        id,
        name,
        email,
        password_hash.as_deref(),
        body.is_admin,
    )
    .await
    .map_err(|e| map_unique_violation(rid, &e, "an account with that email already exists"))?
    .ok_or_else(|| ApiError::new(rid, "not_found", "user not found"))?;

    Ok(Json(ApiResponse {
        data: UserJson::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/users/:id (admin).
pub(super) async fn delete_user(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;

    let removed = storefront_db::delete_user(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !removed {
        return Err(ApiError::new(rid, "not_found", "user not found"));
    }

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "message": "user deleted" }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
