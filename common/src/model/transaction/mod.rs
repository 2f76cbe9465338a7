//! Transaction model and related types

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
use crate::error::Error;
use crate::model::account::AccountSummary;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Direction of a balance movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum FlowKind {
    /// Increases the account balance
    Inflow,
    /// Decreases the account balance
    Outflow,
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowKind::Inflow => f.write_str("inflow"),
            FlowKind::Outflow => f.write_str("outflow"),
        }
    }
}

impl FromStr for FlowKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "inflow" => Ok(FlowKind::Inflow),
            "outflow" => Ok(FlowKind::Outflow),
            other => Err(Error::ValidationError(format!(
                "Unknown transaction type: {}",
                other
            ))),
        }
    }
}

/// A posted balance movement
///
/// `previous_balance` and `current_balance` are snapshots fixed at post
/// time; they are historical facts and are never recomputed on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Transaction {
    /// Unique transaction ID
    pub id: Uuid,
    /// Account the movement was posted against
    pub account_id: Uuid,
    /// Movement direction
    #[serde(rename = "type")]
    pub kind: FlowKind,
    /// Movement amount, strictly positive, two decimal places
    pub amount: Amount,
    /// Account balance immediately before the post
    pub previous_balance: Amount,
    /// Account balance immediately after the post
    pub current_balance: Amount,
    /// Optional free-form description
    pub description: Option<String>,
    /// User that posted the transaction
    pub created_by: Uuid,
    /// Post timestamp
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Whether the snapshot pair is consistent with the amount and kind
    pub fn chain_is_consistent(&self) -> bool {
        match self.kind {
            FlowKind::Inflow => self.current_balance == self.previous_balance + self.amount,
            FlowKind::Outflow => self.current_balance == self.previous_balance - self.amount,
        }
    }
}

/// Transaction enriched with a denormalized account summary for responses
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct TransactionView {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub account: AccountSummary,
}
