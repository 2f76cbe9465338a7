//! Audit trail API handlers
//!
//! All audit reads require the `audit` or `admin` role.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use common::model::audit::{AuditEntry, EntityKind};
use uuid::Uuid;

use crate::api::response::{ApiResponse, PaginatedResponse};
use crate::api::ListQuery;
use crate::auth::{CurrentActor, AUDIT_READ};
use crate::error::ApiError;
use crate::AppState;

/// List all audit entries, newest first
#[utoipa::path(
    get,
    path = "/api/v1/audit-logs",
    params(ListQuery),
    responses(
        (status = 200, description = "Audit entries retrieved"),
        (status = 403, description = "Insufficient role")
    ),
    tag = "audit"
)]
pub async fn list_audit_logs(
    State(state): State<Arc<AppState>>,
    actor: CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<PaginatedResponse<AuditEntry>, ApiError> {
    actor.require_any(AUDIT_READ)?;
    let page = state.audit.find_all(query.into()).await?;
    Ok(PaginatedResponse::from_page(page))
}

/// Get one audit entry
#[utoipa::path(
    get,
    path = "/api/v1/audit-logs/{id}",
    params(("id" = Uuid, Path, description = "Audit entry ID")),
    responses(
        (status = 200, description = "Audit entry retrieved"),
        (status = 404, description = "Audit entry not found"),
        (status = 403, description = "Insufficient role")
    ),
    tag = "audit"
)]
pub async fn get_audit_log(
    State(state): State<Arc<AppState>>,
    actor: CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<AuditEntry>, ApiError> {
    actor.require_any(AUDIT_READ)?;
    let entry = state.audit.find_one(id).await?;
    Ok(ApiResponse::new(entry))
}

/// List audit entries for one entity
#[utoipa::path(
    get,
    path = "/api/v1/audit-logs/entity/{entityType}/{entityId}",
    params(
        ("entityType" = String, Path, description = "Entity kind, e.g. transaction"),
        ("entityId" = Uuid, Path, description = "Entity ID"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Audit entries retrieved"),
        (status = 400, description = "Unknown entity kind"),
        (status = 403, description = "Insufficient role")
    ),
    tag = "audit"
)]
pub async fn list_audit_logs_by_entity(
    State(state): State<Arc<AppState>>,
    actor: CurrentActor,
    Path((entity_type, entity_id)): Path<(String, Uuid)>,
    Query(query): Query<ListQuery>,
) -> Result<PaginatedResponse<AuditEntry>, ApiError> {
    actor.require_any(AUDIT_READ)?;
    let kind = EntityKind::from_str(&entity_type).map_err(ApiError::Common)?;
    let page = state
        .audit
        .find_by_entity(kind, entity_id, query.into())
        .await?;
    Ok(PaginatedResponse::from_page(page))
}

/// List audit entries authored by one user
#[utoipa::path(
    get,
    path = "/api/v1/audit-logs/user/{userId}",
    params(
        ("userId" = Uuid, Path, description = "User ID"),
        ListQuery
    ),
    responses(
        (status = 200, description = "Audit entries retrieved"),
        (status = 403, description = "Insufficient role")
    ),
    tag = "audit"
)]
pub async fn list_audit_logs_by_user(
    State(state): State<Arc<AppState>>,
    actor: CurrentActor,
    Path(user_id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> Result<PaginatedResponse<AuditEntry>, ApiError> {
    actor.require_any(AUDIT_READ)?;
    let page = state.audit.find_by_user(user_id, query.into()).await?;
    Ok(PaginatedResponse::from_page(page))
}
