//! Account API handlers
//!
//! Accounts are reference data: created here, balance-mutated only by the
//! ledger. Successful mutations are published to the audit dispatcher as
//! typed events; the dispatcher never blocks or fails the response.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::decimal::Amount;
use common::model::account::{Account, BankRef, CategoryRef, CurrencyRef};
use common::model::audit::{AuditAction, EntityKind};
use audit_service::MutationEvent;
use ledger_service::NewAccount;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::response::ApiResponse;
use crate::auth::{CurrentActor, LEDGER_WRITE};
use crate::error::ApiError;
use crate::AppState;

/// Create account request
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    /// Display name
    pub name: String,
    /// Globally unique account number
    pub account_number: String,
    /// Bank holding the account
    pub bank: BankRef,
    /// Denomination currency
    pub currency: CurrencyRef,
    /// Grouping category
    pub category: CategoryRef,
    /// Starting balance, defaults to zero
    pub opening_balance: Option<Amount>,
}

/// Create a new account
#[utoipa::path(
    post,
    path = "/api/v1/accounts",
    request_body = CreateAccountRequest,
    responses(
        (status = 200, description = "Account created"),
        (status = 409, description = "Account number already in use"),
        (status = 400, description = "Validation failure"),
        (status = 403, description = "Insufficient role")
    ),
    tag = "account"
)]
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    actor: CurrentActor,
    Json(request): Json<CreateAccountRequest>,
) -> Result<ApiResponse<Account>, ApiError> {
    let actor = actor.require_any(LEDGER_WRITE)?;
    let request_payload = serde_json::to_value(&request).unwrap_or(Value::Null);

    let account = state
        .accounts
        .create(
            NewAccount {
                name: request.name,
                account_number: request.account_number,
                bank: request.bank,
                currency: request.currency,
                category: request.category,
                opening_balance: request.opening_balance,
            },
            actor,
        )
        .await?;

    let event = MutationEvent::new(EntityKind::Account, AuditAction::Create, account.id)
        .with_actor(actor)
        .with_request(request_payload)
        .with_response(serde_json::to_value(&account).unwrap_or(Value::Null));
    state.dispatcher.observe(event);

    Ok(ApiResponse::new(account))
}

/// Get an account by ID
#[utoipa::path(
    get,
    path = "/api/v1/accounts/{id}",
    params(("id" = Uuid, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account retrieved"),
        (status = 404, description = "Account not found")
    ),
    tag = "account"
)]
pub async fn get_account(
    State(state): State<Arc<AppState>>,
    _actor: CurrentActor,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Account>, ApiError> {
    let account = state
        .accounts
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Account not found: {}", id)))?;
    Ok(ApiResponse::new(account))
}

/// List all accounts
#[utoipa::path(
    get,
    path = "/api/v1/accounts",
    responses(
        (status = 200, description = "Accounts retrieved")
    ),
    tag = "account"
)]
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
    _actor: CurrentActor,
) -> Result<ApiResponse<Vec<Account>>, ApiError> {
    let accounts = state.accounts.list().await?;
    Ok(ApiResponse::new(accounts))
}
