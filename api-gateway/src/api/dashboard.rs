//! Dashboard API handlers

use std::sync::Arc;

use axum::extract::{Path, State};
use dashboard_service::GroupedAccounts;

use crate::api::response::ApiResponse;
use crate::auth::CurrentActor;
use crate::error::ApiError;
use crate::AppState;

/// Full grouped-accounts tree: category -> bank -> currency -> accounts
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/accounts",
    responses(
        (status = 200, description = "Grouped accounts retrieved")
    ),
    tag = "dashboard"
)]
pub async fn get_grouped_accounts(
    State(state): State<Arc<AppState>>,
    _actor: CurrentActor,
) -> Result<ApiResponse<GroupedAccounts>, ApiError> {
    let grouped = state.dashboard.all_accounts_grouped().await?;
    Ok(ApiResponse::new(grouped))
}

/// Grouped accounts filtered to one category
#[utoipa::path(
    get,
    path = "/api/v1/dashboard/accounts/{category}",
    params(("category" = String, Path, description = "Category name")),
    responses(
        (status = 200, description = "Grouped accounts retrieved")
    ),
    tag = "dashboard"
)]
pub async fn get_grouped_accounts_by_category(
    State(state): State<Arc<AppState>>,
    _actor: CurrentActor,
    Path(category): Path<String>,
) -> Result<ApiResponse<GroupedAccounts>, ApiError> {
    let grouped = state
        .dashboard
        .accounts_grouped_by_category(&category)
        .await?;
    Ok(ApiResponse::new(grouped))
}
