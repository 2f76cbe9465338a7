//! Account reference-data collaborator
//!
//! Creates and resolves accounts before any transaction exists. The
//! collaborator never touches balances after creation; that is the
//! ledger's job.

use std::sync::Arc;

use chrono::Utc;
use common::decimal::{money, Amount};
use common::error::{Error, Result};
use common::model::account::{Account, BankRef, CategoryRef, CurrencyRef};
use common::model::user::Actor;
use tracing::info;
use uuid::Uuid;

use crate::repository::LedgerRepository;

/// Input for creating an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub account_number: String,
    pub bank: BankRef,
    pub currency: CurrencyRef,
    pub category: CategoryRef,
    /// Starting balance, defaults to zero
    pub opening_balance: Option<Amount>,
}

/// Account management service
pub struct AccountService {
    repo: Arc<dyn LedgerRepository>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn LedgerRepository>) -> Self {
        Self { repo }
    }

    /// Create a new account with a globally unique account number
    pub async fn create(&self, new_account: NewAccount, actor: &Actor) -> Result<Account> {
        if new_account.name.trim().is_empty() {
            return Err(Error::ValidationError("Account name must not be empty".to_string()));
        }
        if new_account.account_number.trim().is_empty() {
            return Err(Error::ValidationError(
                "Account number must not be empty".to_string(),
            ));
        }

        let opening_balance = match new_account.opening_balance {
            Some(balance) => {
                if balance < Amount::ZERO {
                    return Err(Error::ValidationError(
                        "Opening balance must not be negative".to_string(),
                    ));
                }
                money::round(balance)
            }
            None => Amount::ZERO,
        };

        if self
            .repo
            .find_account_by_number(&new_account.account_number)
            .await?
            .is_some()
        {
            return Err(Error::Conflict(format!(
                "Account number already in use: {}",
                new_account.account_number
            )));
        }

        let now = Utc::now();
        let account = Account {
            id: Uuid::new_v4(),
            name: new_account.name,
            account_number: new_account.account_number,
            bank: new_account.bank,
            currency: new_account.currency,
            category: new_account.category,
            balance: opening_balance,
            created_by: actor.id,
            created_at: now,
            updated_at: now,
        };

        info!("Creating account {} ({})", account.name, account.account_number);
        self.repo.insert_account(account).await
    }

    /// Get an account by ID
    pub async fn get(&self, id: Uuid) -> Result<Option<Account>> {
        self.repo.get_account(id).await
    }

    /// List all accounts
    pub async fn list(&self) -> Result<Vec<Account>> {
        self.repo.list_accounts().await
    }
}
