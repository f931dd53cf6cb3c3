//! Contact-form intake (public) and admin triage.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_db::{ContactRow, NewContact};

use crate::middleware::{CurrentIdentity, RequestId};

use super::{
    is_plausible_email, map_db_error, parse_limit, parse_page, require_admin, ApiError,
    ApiResponse, AppState, Pagination, ResponseMeta,
};

const CONTACT_STATUSES: [&str; 4] = ["new", "read", "replied", "archived"];

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct ContactJson {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ContactRow> for ContactJson {
    fn from(row: ContactRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            subject: row.subject,
            message: row.message,
            status: row.status,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ContactListData {
    pub contacts: Vec<ContactJson>,
    pub pagination: Pagination,
}

#[derive(Debug, Deserialize)]
pub(super) struct ContactListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateContactRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateContactRequest {
    pub status: Option<String>,
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/contacts — public intake; every field is required.
pub(super) async fn create_contact(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateContactRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ContactJson>>), ApiError> {
    let rid = &req_id.0;

    let field = |value: Option<&String>, name: &str| -> Result<String, ApiError> {
        value
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ApiError::new(rid, "validation_error", format!("{name} is required"))
            })
    };
    let name = field(body.name.as_ref(), "name")?;
    let email = field(body.email.as_ref(), "email")?;
    let subject = field(body.subject.as_ref(), "subject")?;
    let message = field(body.message.as_ref(), "message")?;
    if !is_plausible_email(&email) {
        return Err(ApiError::new(rid, "validation_error", "email is not valid"));
    }

    let row = storefront_db::create_contact(
        &state.pool,
        &NewContact {
            name,
            email,
            subject,
            message,
        },
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ContactJson::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/contacts — admin triage list.
pub(super) async fn list_contacts(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Query(params): Query<ContactListParams>,
) -> Result<Json<ApiResponse<ContactListData>>, ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;

    let page = parse_page(params.page.as_deref());
    let limit = parse_limit(params.limit.as_deref(), 20);
    let status = params
        .status
        .as_deref()
        .map(str::trim)
        .filter(|s| CONTACT_STATUSES.contains(s));
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let (rows, total) = storefront_db::list_contacts(
        &state.pool,
        status,
        search,
        limit,
        (page - 1) * limit,
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: ContactListData {
            contacts: rows.into_iter().map(ContactJson::from).collect(),
            pagination: Pagination::new(total, page, limit),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/contacts/:id (admin).
pub(super) async fn get_contact(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<ContactJson>>, ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;

    let row = storefront_db::get_contact(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", "contact not found"))?;

    Ok(Json(ApiResponse {
        data: ContactJson::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /api/contacts/:id — status/notes triage (admin). Intake fields are
/// immutable.
pub(super) async fn update_contact(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateContactRequest>,
) -> Result<Json<ApiResponse<ContactJson>>, ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;

    if let Some(ref status) = body.status {
        if !CONTACT_STATUSES.contains(&status.as_str()) {
            return Err(ApiError::new(
                rid,
                "validation_error",
                format!("status must be one of new/read/replied/archived, got '{status}'"),
            ));
        }
    }

    let row = storefront_db::update_contact(
        &state.pool,
        id,
        body.status.as_deref(),
        body.notes.as_deref(),
    )
    .await
    .map_err(|e| map_db_error(rid.clone(), &e))?
    .ok_or_else(|| ApiError::new(rid, "not_found", "contact not found"))?;

    Ok(Json(ApiResponse {
        data: ContactJson::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/contacts/:id (admin).
pub(super) async fn delete_contact(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Extension(current): Extension<CurrentIdentity>,
    Path(id): Path<i64>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let rid = &req_id.0;
    require_admin(&current, rid)?;

    let removed = storefront_db::delete_contact(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !removed {
        return Err(ApiError::new(rid, "not_found", "contact not found"));
    }

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "message": "contact deleted" }),
        meta: ResponseMeta::new(req_id.0),
    }))
}
