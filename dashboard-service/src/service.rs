//! Dashboard aggregation over accounts and their transaction history
//!
//! Read-only and uncached: every call replays the persisted state. The
//! aggregator never writes balances; it only reads the snapshots the
//! ledger fixed at post time.

use std::collections::HashMap;
use std::sync::Arc;

use common::decimal::Amount;
use common::error::Result;
use common::model::transaction::FlowKind;
use ledger_service::LedgerRepository;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

#[cfg(feature = "utoipa")]
use common::utoipa::ToSchema;

/// Per-account flow summary shown on the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct AccountFlowSummary {
    pub id: Uuid,
    pub name: String,
    pub account_number: String,
    /// First transaction's previous-balance snapshot, or the stored
    /// balance when the account has no transactions
    pub previous_balance: Amount,
    /// Sum of inflow amounts
    pub inflow: Amount,
    /// Sum of outflow amounts
    pub outflow: Amount,
    /// Last transaction's current-balance snapshot, or the stored balance
    pub current_balance: Amount,
}

/// category -> bank -> currency -> account summaries
pub type GroupedAccounts = HashMap<String, HashMap<String, HashMap<String, Vec<AccountFlowSummary>>>>;

/// Dashboard aggregation service
pub struct DashboardService {
    repo: Arc<dyn LedgerRepository>,
}

impl DashboardService {
    pub fn new(repo: Arc<dyn LedgerRepository>) -> Self {
        Self { repo }
    }

    /// All accounts grouped by category, then bank, then currency
    pub async fn all_accounts_grouped(&self) -> Result<GroupedAccounts> {
        let accounts = self.repo.list_accounts().await?;
        debug!("Aggregating dashboard over {} accounts", accounts.len());

        let mut result: GroupedAccounts = HashMap::new();

        for account in accounts {
            // Oldest first
            let transactions = self.repo.transactions_for_account(account.id).await?;

            let summary = if transactions.is_empty() {
                AccountFlowSummary {
                    id: account.id,
                    name: account.name.clone(),
                    account_number: account.account_number.clone(),
                    previous_balance: account.balance,
                    inflow: Amount::ZERO,
                    outflow: Amount::ZERO,
                    current_balance: account.balance,
                }
            } else {
                let inflow = transactions
                    .iter()
                    .filter(|t| t.kind == FlowKind::Inflow)
                    .map(|t| t.amount)
                    .sum();
                let outflow = transactions
                    .iter()
                    .filter(|t| t.kind == FlowKind::Outflow)
                    .map(|t| t.amount)
                    .sum();
                AccountFlowSummary {
                    id: account.id,
                    name: account.name.clone(),
                    account_number: account.account_number.clone(),
                    previous_balance: transactions[0].previous_balance,
                    inflow,
                    outflow,
                    current_balance: transactions[transactions.len() - 1].current_balance,
                }
            };

            result
                .entry(account.category.name.clone())
                .or_default()
                .entry(account.bank.name.clone())
                .or_default()
                .entry(account.currency.code.clone())
                .or_default()
                .push(summary);
        }

        Ok(result)
    }

    /// Grouped accounts filtered to a single category; the category key is
    /// present with an empty subtree when no account matches
    pub async fn accounts_grouped_by_category(&self, category: &str) -> Result<GroupedAccounts> {
        let mut all = self.all_accounts_grouped().await?;
        let subtree = all.remove(category).unwrap_or_default();

        let mut result = GroupedAccounts::new();
        result.insert(category.to_string(), subtree);
        Ok(result)
    }
}
