//! Transaction API handlers
//!
//! Posting, correcting, and removing transactions requires the `acct` or
//! `admin` role; reads require an authenticated actor.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use common::decimal::Amount;
use common::model::transaction::{FlowKind, Transaction, TransactionView};
use ledger_service::{NewTransaction, TransactionPatch};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::response::{ApiResponse, MessageResponse, PaginatedResponse};
use crate::api::ListQuery;
use crate::auth::{CurrentActor, LEDGER_WRITE};
use crate::error::ApiError;
use crate::AppState;

/// Post transaction request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    /// Target account
    pub account_id: Uuid,
    /// Movement direction
    #[serde(rename = "type")]
    pub kind: FlowKind,
    /// Amount, strictly positive, two decimal places
    pub amount: Amount,
    /// Optional description
    pub description: Option<String>,
}

/// Correction request; type and amount may only be echoed back unchanged
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    #[serde(rename = "type")]
    pub kind: Option<FlowKind>,
    pub amount: Option<Amount>,
    pub description: Option<String>,
}

/// Post a new transaction
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    request_body = CreateTransactionRequest,
    responses(
        (status = 200, description = "Transaction posted"),
        (status = 400, description = "Validation failure or insufficient funds"),
        (status = 404, description = "Account not found"),
        (status = 403, description = "Insufficient role")
    ),
    tag = "transaction"
)]
pub async fn post_transaction(
    State(state): State<Arc<AppState>>,
    actor: CurrentActor,
    Json(request): Json<CreateTransactionRequest>,
) -> Result<ApiResponse<TransactionView>, ApiError> {
    let actor = actor.require_any(LEDGER_WRITE)?;

    let view = state
        .ledger
        .post(
            NewTransaction {
                account_id: request.account_id,
                kind: request.kind,
                amount: request.amount,
                description: request.description,
            },
            actor,
        )
        .await?;

    Ok(ApiResponse::new(view))
}

/// List transactions, newest first
#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    params(ListQuery),
    responses(
        (status = 200, description = "Transactions retrieved")
    ),
    tag = "transaction"
)]
pub async fn list_transactions(
    State(state): State<Arc<AppState>>,
    _actor: CurrentActor,
    Query(query): Query<ListQuery>,
) -> Result<PaginatedResponse<TransactionView>, ApiError> {
    let page = state.ledger.find_all(query.into()).await?;
    Ok(PaginatedResponse::from_page(page))
}

/// Get one transaction
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction retrieved"),
        (status = 404, description = "Transaction not found")
    ),
    tag = "transaction"
)]
pub async fn get_transaction(
    State(state): State<Arc<AppState>>,
    _actor: CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<TransactionView>, ApiError> {
    let view = state.ledger.find_one(id).await?;
    Ok(ApiResponse::new(view))
}

/// Correct a transaction's descriptive fields
#[utoipa::path(
    patch,
    path = "/api/v1/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    request_body = UpdateTransactionRequest,
    responses(
        (status = 200, description = "Transaction updated"),
        (status = 400, description = "Balance-affecting edit rejected"),
        (status = 404, description = "Transaction not found"),
        (status = 403, description = "Insufficient role")
    ),
    tag = "transaction"
)]
pub async fn update_transaction(
    State(state): State<Arc<AppState>>,
    actor: CurrentActor,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTransactionRequest>,
) -> Result<ApiResponse<Transaction>, ApiError> {
    let actor = actor.require_any(LEDGER_WRITE)?;

    let updated = state
        .ledger
        .update(
            id,
            TransactionPatch {
                kind: request.kind,
                amount: request.amount,
                description: request.description,
            },
            actor,
        )
        .await?;

    Ok(ApiResponse::new(updated))
}

/// Remove the account's latest transaction, restoring its balance
#[utoipa::path(
    delete,
    path = "/api/v1/transactions/{id}",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction removed"),
        (status = 404, description = "Transaction not found"),
        (status = 409, description = "Not the account's latest transaction"),
        (status = 403, description = "Insufficient role")
    ),
    tag = "transaction"
)]
pub async fn delete_transaction(
    State(state): State<Arc<AppState>>,
    actor: CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<MessageResponse, ApiError> {
    let actor = actor.require_any(LEDGER_WRITE)?;
    state.ledger.remove(id, actor).await?;
    Ok(MessageResponse::new("Transaction deleted successfully"))
}
