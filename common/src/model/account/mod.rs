//! Account model and its reference-data value objects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Bank the account is held at (reference data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct BankRef {
    pub id: Uuid,
    pub name: String,
}

/// Currency the account is denominated in (reference data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct CurrencyRef {
    pub id: Uuid,
    /// ISO-style currency code, e.g. "USD"
    pub code: String,
}

/// Account category, e.g. "project" or "secretariat" (reference data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
}

/// Account model
///
/// `balance` always equals the `current_balance` snapshot of the account's
/// most recently posted transaction, or the opening balance if none exists.
/// It is written exclusively by the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Account {
    /// Unique account ID
    pub id: Uuid,
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
    /// Current balance, two decimal places
    pub balance: Amount,
    /// User that created the account
    pub created_by: Uuid,
    /// Account creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp (advanced on every balance write)
    pub updated_at: DateTime<Utc>,
}

/// Denormalized account summary attached to transaction responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct AccountSummary {
    pub id: Uuid,
    pub name: String,
    pub currency: CurrencyRef,
    pub bank: BankRef,
}

impl From<&Account> for AccountSummary {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            name: account.name.clone(),
            currency: account.currency.clone(),
            bank: account.bank.clone(),
        }
    }
}
