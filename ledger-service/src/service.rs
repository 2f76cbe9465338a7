//! Transaction ledger implementation
//!
//! The ledger is the only legitimate writer of account balances. Posting
//! and removal are serialized per account: a per-account async mutex
//! guards the read-compute-write sequence in this process, and the
//! Postgres repository's conditional balance update backstops writers the
//! lock cannot see.

use std::collections::HashMap;
use std::sync::Arc;

use audit_service::AuditService;
use chrono::Utc;
use common::decimal::{money, Amount};
use common::error::{Error, ErrorExt, Result};
use common::model::account::{Account, AccountSummary};
use common::model::audit::EntityKind;
use common::model::transaction::{FlowKind, Transaction, TransactionView};
use common::model::user::Actor;
use common::pagination::{Page, PageQuery};
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::repository::LedgerRepository;

/// Input for posting a new transaction
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub account_id: Uuid,
    pub kind: FlowKind,
    pub amount: Amount,
    pub description: Option<String>,
}

/// Correction patch for an existing transaction
///
/// Balance-affecting fields are present so a caller can echo them back,
/// but changing them is rejected: money corrections are posted as
/// compensating transactions, which keeps the snapshot chain intact.
#[derive(Debug, Clone, Default)]
pub struct TransactionPatch {
    pub kind: Option<FlowKind>,
    pub amount: Option<Amount>,
    pub description: Option<String>,
}

/// Transaction ledger: posts, corrects, and removes balance movements
pub struct LedgerService {
    /// Repository for accounts and transactions
    repo: Arc<dyn LedgerRepository>,
    /// Audit recorder for the ledger's own audit events
    audit: Arc<AuditService>,
    /// Per-account posting locks
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl LedgerService {
    /// Create a new ledger service
    pub fn new(repo: Arc<dyn LedgerRepository>, audit: Arc<AuditService>) -> Self {
        Self {
            repo,
            audit,
            locks: DashMap::new(),
        }
    }

    /// Shared repository handle (read-only consumers such as the
    /// dashboard aggregator attach here)
    pub fn repository(&self) -> Arc<dyn LedgerRepository> {
        Arc::clone(&self.repo)
    }

    fn account_lock(&self, account_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(account_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Post a balance movement against an account
    pub async fn post(&self, new_tx: NewTransaction, actor: &Actor) -> Result<TransactionView> {
        let amount = money::validate_amount(new_tx.amount)?;

        info!(
            "Posting {} of {} against account {}",
            new_tx.kind, amount, new_tx.account_id
        );

        let lock = self.account_lock(new_tx.account_id);
        let _guard = lock.lock().await;

        let account = self
            .repo
            .get_account(new_tx.account_id)
            .await
            .with_context(|| format!("Failed to retrieve account {}", new_tx.account_id))?
            .ok_or_else(|| {
                Error::AccountNotFound(format!("Account not found: {}", new_tx.account_id))
            })?;

        let previous_balance = account.balance;
        let current_balance = match new_tx.kind {
            FlowKind::Inflow => previous_balance + amount,
            FlowKind::Outflow => {
                if previous_balance < amount {
                    return Err(Error::InsufficientFunds(format!(
                        "Outflow of {} exceeds balance {} on account {}",
                        amount, previous_balance, account.name
                    )));
                }
                previous_balance - amount
            }
        };

        let tx = Transaction {
            id: Uuid::new_v4(),
            account_id: account.id,
            kind: new_tx.kind,
            amount,
            previous_balance,
            current_balance,
            description: new_tx.description,
            created_by: actor.id,
            created_at: Utc::now(),
        };

        let saved = self
            .repo
            .insert_transaction(tx)
            .await
            .with_context(|| format!("Failed to post transaction for account {}", account.id))?;

        self.audit
            .log_create(
                EntityKind::Transaction,
                saved.id,
                format!(
                    "Created {} transaction of {} for account {}",
                    saved.kind, saved.amount, account.name
                ),
                Some(actor),
            )
            .await;

        Ok(TransactionView {
            account: AccountSummary::from(&account),
            transaction: saved,
        })
    }

    /// Apply a correction patch to an existing transaction.
    ///
    /// Only descriptive fields may change; a patch that alters the kind or
    /// amount is rejected because the balance snapshots would no longer be
    /// honest. One UPDATE audit entry is emitted per changed field.
    pub async fn update(
        &self,
        id: Uuid,
        patch: TransactionPatch,
        actor: &Actor,
    ) -> Result<Transaction> {
        let mut tx = self
            .repo
            .get_transaction(id)
            .await?
            .ok_or_else(|| Error::TransactionNotFound(format!("Transaction not found: {}", id)))?;

        if let Some(kind) = patch.kind {
            if kind != tx.kind {
                return Err(Error::ValidationError(
                    "Transaction type cannot be edited; post a compensating transaction instead"
                        .to_string(),
                ));
            }
        }
        if let Some(amount) = patch.amount {
            if amount != tx.amount {
                return Err(Error::ValidationError(
                    "Transaction amount cannot be edited; post a compensating transaction instead"
                        .to_string(),
                ));
            }
        }

        let Some(new_description) = patch.description else {
            return Ok(tx);
        };
        if Some(&new_description) == tx.description.as_ref() {
            return Ok(tx);
        }

        let old_description = tx.description.clone().unwrap_or_default();
        tx.description = Some(new_description.clone());
        let updated = self.repo.update_transaction(tx).await?;

        self.audit
            .log_update(
                EntityKind::Transaction,
                updated.id,
                "description".to_string(),
                old_description.clone(),
                new_description.clone(),
                format!(
                    "Updated transaction description from {} to {}",
                    old_description, new_description
                ),
                Some(actor),
            )
            .await;

        Ok(updated)
    }

    /// Remove a transaction.
    ///
    /// Only the account's chronologically latest transaction may be
    /// removed; removal rolls the account balance back to the
    /// transaction's previous-balance snapshot, keeping the chain intact.
    pub async fn remove(&self, id: Uuid, actor: &Actor) -> Result<()> {
        let tx = self
            .repo
            .get_transaction(id)
            .await?
            .ok_or_else(|| Error::TransactionNotFound(format!("Transaction not found: {}", id)))?;

        let lock = self.account_lock(tx.account_id);
        let _guard = lock.lock().await;

        let latest = self
            .repo
            .latest_transaction(tx.account_id)
            .await?
            .ok_or_else(|| Error::TransactionNotFound(format!("Transaction not found: {}", id)))?;
        if latest.id != tx.id {
            return Err(Error::Conflict(format!(
                "Transaction {} is not the latest for account {}; only the most recent transaction can be removed",
                tx.id, tx.account_id
            )));
        }

        let account = self
            .repo
            .get_account(tx.account_id)
            .await?
            .ok_or_else(|| {
                Error::AccountNotFound(format!("Account not found: {}", tx.account_id))
            })?;

        self.repo.delete_transaction_restoring_balance(&tx).await?;

        info!(
            "Removed {} of {} from account {}, balance restored to {}",
            tx.kind, tx.amount, account.name, tx.previous_balance
        );

        self.audit
            .log_delete(
                EntityKind::Transaction,
                tx.id,
                format!(
                    "Deleted {} transaction of {} for account {}",
                    tx.kind, tx.amount, account.name
                ),
                Some(actor),
            )
            .await;

        Ok(())
    }

    /// List transactions newest-first, denormalized with account summaries
    pub async fn find_all(&self, query: PageQuery) -> Result<Page<TransactionView>> {
        let Page {
            items,
            total,
            page,
            limit,
        } = self.repo.list_transactions(&query).await?;

        // Resolve each distinct account once
        let mut summaries: HashMap<Uuid, AccountSummary> = HashMap::new();
        let mut views = Vec::with_capacity(items.len());
        for tx in items {
            let summary = match summaries.get(&tx.account_id) {
                Some(summary) => summary.clone(),
                None => {
                    let account = self.repo.get_account(tx.account_id).await?.ok_or_else(|| {
                        Error::Internal(format!(
                            "Transaction {} references missing account {}",
                            tx.id, tx.account_id
                        ))
                    })?;
                    let summary = AccountSummary::from(&account);
                    summaries.insert(account.id, summary.clone());
                    summary
                }
            };
            views.push(TransactionView {
                account: summary,
                transaction: tx,
            });
        }

        Ok(Page {
            items: views,
            total,
            page,
            limit,
        })
    }

    /// One transaction by ID, denormalized with its account summary
    pub async fn find_one(&self, id: Uuid) -> Result<TransactionView> {
        let tx = self
            .repo
            .get_transaction(id)
            .await?
            .ok_or_else(|| Error::TransactionNotFound(format!("Transaction not found: {}", id)))?;

        let account = self.repo.get_account(tx.account_id).await?.ok_or_else(|| {
            Error::Internal(format!(
                "Transaction {} references missing account {}",
                tx.id, tx.account_id
            ))
        })?;

        Ok(TransactionView {
            account: AccountSummary::from(&account),
            transaction: tx,
        })
    }

    /// Get an account by ID
    pub async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        self.repo.get_account(id).await
    }
}
