//! Repository for accounts and posted transactions
//!
//! Accounts and transactions share one repository because posting is an
//! atomic unit across both tables: a reader must never observe a
//! transaction without the matching account balance, or vice versa.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::account::{Account, BankRef, CategoryRef, CurrencyRef};
use common::model::transaction::{FlowKind, Transaction};
use common::pagination::{Page, PageQuery};
use dashmap::DashMap;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Ledger repository trait defining the interface for account and
/// transaction storage
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Insert a new account
    async fn insert_account(&self, account: Account) -> Result<Account>;

    /// Get an account by ID
    async fn get_account(&self, id: Uuid) -> Result<Option<Account>>;

    /// Look up an account by its globally unique account number
    async fn find_account_by_number(&self, number: &str) -> Result<Option<Account>>;

    /// List all accounts
    async fn list_accounts(&self) -> Result<Vec<Account>>;

    /// Atomically insert a transaction and advance the account balance
    /// from `tx.previous_balance` to `tx.current_balance`.
    ///
    /// Fails with `Conflict` when the stored balance no longer equals
    /// `tx.previous_balance` (a concurrent writer got there first).
    async fn insert_transaction(&self, tx: Transaction) -> Result<Transaction>;

    /// Get a transaction by ID
    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>>;

    /// Get the chronologically latest transaction for an account
    async fn latest_transaction(&self, account_id: Uuid) -> Result<Option<Transaction>>;

    /// Persist descriptive-field changes to an existing transaction.
    /// Balance snapshots are never rewritten.
    async fn update_transaction(&self, tx: Transaction) -> Result<Transaction>;

    /// Atomically delete a transaction and roll the account balance back
    /// to `tx.previous_balance`.
    ///
    /// Fails with `Conflict` when the stored balance no longer equals
    /// `tx.current_balance`.
    async fn delete_transaction_restoring_balance(&self, tx: &Transaction) -> Result<()>;

    /// List transactions newest-first within the query's date window
    async fn list_transactions(&self, query: &PageQuery) -> Result<Page<Transaction>>;

    /// All transactions for one account, oldest first
    async fn transactions_for_account(&self, account_id: Uuid) -> Result<Vec<Transaction>>;
}

/// In-memory repository for accounts and transactions
pub struct InMemoryLedgerRepository {
    /// Accounts by ID
    pub accounts: DashMap<Uuid, Account>,
    /// Transactions by ID, with an insertion sequence for stable ordering
    pub transactions: DashMap<Uuid, (Transaction, u64)>,
    seq: AtomicU64,
}

impl InMemoryLedgerRepository {
    /// Create a new in-memory ledger repository
    pub fn new() -> Self {
        Self {
            accounts: DashMap::new(),
            transactions: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }

    fn next_seq(&self) -> u64 {
        self.seq.fetch_add(1, Ordering::SeqCst)
    }

    fn sorted_for_account(&self, account_id: Uuid) -> Vec<(Transaction, u64)> {
        let mut txs: Vec<(Transaction, u64)> = self
            .transactions
            .iter()
            .filter(|entry| entry.value().0.account_id == account_id)
            .map(|entry| entry.value().clone())
            .collect();
        txs.sort_by_key(|(tx, seq)| (tx.created_at, *seq));
        txs
    }
}

impl Default for InMemoryLedgerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    async fn insert_account(&self, account: Account) -> Result<Account> {
        self.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        Ok(self.accounts.get(&id).map(|a| a.clone()))
    }

    async fn find_account_by_number(&self, number: &str) -> Result<Option<Account>> {
        Ok(self
            .accounts
            .iter()
            .find(|entry| entry.value().account_number == number)
            .map(|entry| entry.value().clone()))
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let mut accounts: Vec<Account> =
            self.accounts.iter().map(|entry| entry.value().clone()).collect();
        accounts.sort_by_key(|a| a.created_at);
        Ok(accounts)
    }

    async fn insert_transaction(&self, tx: Transaction) -> Result<Transaction> {
        // The entry guard keeps the balance check and write atomic with
        // respect to other posts against the same account.
        let mut account = self.accounts.get_mut(&tx.account_id).ok_or_else(|| {
            Error::AccountNotFound(format!("Account not found: {}", tx.account_id))
        })?;

        if account.balance != tx.previous_balance {
            return Err(Error::Conflict(format!(
                "Account {} balance moved from {} while posting",
                tx.account_id, tx.previous_balance
            )));
        }

        account.balance = tx.current_balance;
        account.updated_at = Utc::now();

        let seq = self.next_seq();
        self.transactions.insert(tx.id, (tx.clone(), seq));
        Ok(tx)
    }

    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
        Ok(self.transactions.get(&id).map(|entry| entry.value().0.clone()))
    }

    async fn latest_transaction(&self, account_id: Uuid) -> Result<Option<Transaction>> {
        Ok(self
            .sorted_for_account(account_id)
            .pop()
            .map(|(tx, _)| tx))
    }

    async fn update_transaction(&self, tx: Transaction) -> Result<Transaction> {
        let mut entry = self.transactions.get_mut(&tx.id).ok_or_else(|| {
            Error::TransactionNotFound(format!("Transaction not found: {}", tx.id))
        })?;
        entry.value_mut().0 = tx.clone();
        Ok(tx)
    }

    async fn delete_transaction_restoring_balance(&self, tx: &Transaction) -> Result<()> {
        let mut account = self.accounts.get_mut(&tx.account_id).ok_or_else(|| {
            Error::AccountNotFound(format!("Account not found: {}", tx.account_id))
        })?;

        if account.balance != tx.current_balance {
            return Err(Error::Conflict(format!(
                "Account {} balance moved from {} while removing transaction {}",
                tx.account_id, tx.current_balance, tx.id
            )));
        }

        account.balance = tx.previous_balance;
        account.updated_at = Utc::now();
        self.transactions.remove(&tx.id);
        Ok(())
    }

    async fn list_transactions(&self, query: &PageQuery) -> Result<Page<Transaction>> {
        let mut txs: Vec<(Transaction, u64)> = self
            .transactions
            .iter()
            .filter(|entry| query.range.contains(entry.value().0.created_at))
            .map(|entry| entry.value().clone())
            .collect();
        // Newest first; sequence breaks same-timestamp ties
        txs.sort_by(|(a, sa), (b, sb)| (b.created_at, sb).cmp(&(a.created_at, sa)));
        Ok(Page::slice(txs.into_iter().map(|(tx, _)| tx).collect(), query))
    }

    async fn transactions_for_account(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        Ok(self
            .sorted_for_account(account_id)
            .into_iter()
            .map(|(tx, _)| tx)
            .collect())
    }
}

/// PostgreSQL repository for accounts and transactions
///
/// Monetary columns are stored as text and parsed into `Decimal` on read,
/// so the database never does float arithmetic on them.
pub struct PostgresLedgerRepository {
    pool: PgPool,
}

fn parse_amount(raw: &str, column: &str) -> Result<Amount> {
    raw.parse::<Amount>()
        .map_err(|e| Error::Internal(format!("Invalid {} format: {}", column, e)))
}

fn account_from_row(row: &sqlx::postgres::PgRow) -> Result<Account> {
    let balance_raw: String = row.get("balance");
    Ok(Account {
        id: row.get("id"),
        name: row.get("name"),
        account_number: row.get("account_number"),
        bank: BankRef {
            id: row.get("bank_id"),
            name: row.get("bank_name"),
        },
        currency: CurrencyRef {
            id: row.get("currency_id"),
            code: row.get("currency_code"),
        },
        category: CategoryRef {
            id: row.get("category_id"),
            name: row.get("category_name"),
        },
        balance: parse_amount(&balance_raw, "balance")?,
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn transaction_from_row(row: &sqlx::postgres::PgRow) -> Result<Transaction> {
    let kind_raw: String = row.get("kind");
    let amount_raw: String = row.get("amount");
    let previous_raw: String = row.get("previous_balance");
    let current_raw: String = row.get("current_balance");
    Ok(Transaction {
        id: row.get("id"),
        account_id: row.get("account_id"),
        kind: kind_raw.parse::<FlowKind>()?,
        amount: parse_amount(&amount_raw, "amount")?,
        previous_balance: parse_amount(&previous_raw, "previous_balance")?,
        current_balance: parse_amount(&current_raw, "current_balance")?,
        description: row.get("description"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
    })
}

impl PostgresLedgerRepository {
    /// Create a new PostgreSQL ledger repository
    pub async fn new(database_url: Option<String>) -> Result<Self> {
        let url = match database_url {
            Some(url) => url,
            None => std::env::var("DATABASE_URL")
                .map_err(|_| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?,
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");
        Ok(Self { pool })
    }

    /// Create a new PostgreSQL ledger repository with configuration
    pub async fn with_config(config: &crate::config::LedgerServiceConfig) -> Result<Self> {
        info!(
            "Connecting to PostgreSQL database with pool size: {}",
            config.db_pool_size
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.db_pool_size)
            .connect(&config.database_url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");
        Ok(Self { pool })
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    async fn insert_account(&self, account: Account) -> Result<Account> {
        debug!("Inserting account {} into database", account.id);

        sqlx::query(
            "INSERT INTO accounts \
             (id, name, account_number, bank_id, bank_name, currency_id, currency_code, \
              category_id, category_name, balance, created_by, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.account_number)
        .bind(account.bank.id)
        .bind(&account.bank.name)
        .bind(account.currency.id)
        .bind(&account.currency.code)
        .bind(account.category.id)
        .bind(&account.category.name)
        .bind(account.balance.to_string())
        .bind(account.created_by)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(account)
    }

    async fn get_account(&self, id: Uuid) -> Result<Option<Account>> {
        debug!("Getting account from database: {}", id);

        let row = sqlx::query("SELECT * FROM accounts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_account_by_number(&self, number: &str) -> Result<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE account_number = $1")
            .bind(number)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(account_from_row).transpose()
    }

    async fn list_accounts(&self) -> Result<Vec<Account>> {
        let rows = sqlx::query("SELECT * FROM accounts ORDER BY created_at")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(account_from_row).collect()
    }

    async fn insert_transaction(&self, tx: Transaction) -> Result<Transaction> {
        debug!("Posting transaction {} for account {}", tx.id, tx.account_id);

        let mut db_tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO transactions \
             (id, account_id, kind, amount, previous_balance, current_balance, \
              description, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(tx.id)
        .bind(tx.account_id)
        .bind(tx.kind.to_string())
        .bind(tx.amount.to_string())
        .bind(tx.previous_balance.to_string())
        .bind(tx.current_balance.to_string())
        .bind(&tx.description)
        .bind(tx.created_by)
        .bind(tx.created_at)
        .execute(&mut *db_tx)
        .await?;

        // Conditional write: only advance the balance if nobody moved it
        // since the snapshot was taken.
        let updated = sqlx::query(
            "UPDATE accounts SET balance = $2, updated_at = $3 \
             WHERE id = $1 AND balance = $4",
        )
        .bind(tx.account_id)
        .bind(tx.current_balance.to_string())
        .bind(Utc::now())
        .bind(tx.previous_balance.to_string())
        .execute(&mut *db_tx)
        .await?;

        if updated.rows_affected() == 0 {
            db_tx.rollback().await.map_err(Error::Database)?;
            return Err(Error::Conflict(format!(
                "Account {} balance moved from {} while posting",
                tx.account_id, tx.previous_balance
            )));
        }

        db_tx.commit().await.map_err(Error::Database)?;
        Ok(tx)
    }

    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>> {
        let row = sqlx::query("SELECT * FROM transactions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn latest_transaction(&self, account_id: Uuid) -> Result<Option<Transaction>> {
        let row = sqlx::query(
            "SELECT * FROM transactions WHERE account_id = $1 \
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn update_transaction(&self, tx: Transaction) -> Result<Transaction> {
        let result = sqlx::query("UPDATE transactions SET description = $2 WHERE id = $1")
            .bind(tx.id)
            .bind(&tx.description)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::TransactionNotFound(format!(
                "Transaction not found: {}",
                tx.id
            )));
        }

        Ok(tx)
    }

    async fn delete_transaction_restoring_balance(&self, tx: &Transaction) -> Result<()> {
        debug!("Removing transaction {} for account {}", tx.id, tx.account_id);

        let mut db_tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query("DELETE FROM transactions WHERE id = $1")
            .bind(tx.id)
            .execute(&mut *db_tx)
            .await?;

        let updated = sqlx::query(
            "UPDATE accounts SET balance = $2, updated_at = $3 \
             WHERE id = $1 AND balance = $4",
        )
        .bind(tx.account_id)
        .bind(tx.previous_balance.to_string())
        .bind(Utc::now())
        .bind(tx.current_balance.to_string())
        .execute(&mut *db_tx)
        .await?;

        if updated.rows_affected() == 0 {
            db_tx.rollback().await.map_err(Error::Database)?;
            return Err(Error::Conflict(format!(
                "Account {} balance moved from {} while removing transaction {}",
                tx.account_id, tx.current_balance, tx.id
            )));
        }

        db_tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn list_transactions(&self, query: &PageQuery) -> Result<Page<Transaction>> {
        let lower = query.range.lower_bound();
        let upper = query.range.upper_bound();

        let rows = sqlx::query(
            "SELECT * FROM transactions \
             WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
               AND ($2::timestamptz IS NULL OR created_at <= $2) \
             ORDER BY created_at DESC \
             LIMIT $3 OFFSET $4",
        )
        .bind(lower)
        .bind(upper)
        .bind(query.limit() as i64)
        .bind(query.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total_row = sqlx::query(
            "SELECT COUNT(*) AS total FROM transactions \
             WHERE ($1::timestamptz IS NULL OR created_at >= $1) \
               AND ($2::timestamptz IS NULL OR created_at <= $2)",
        )
        .bind(lower)
        .bind(upper)
        .fetch_one(&self.pool)
        .await?;
        let total: i64 = total_row.get("total");

        let items: Result<Vec<Transaction>> = rows.iter().map(transaction_from_row).collect();
        Ok(Page::from_parts(items?, total as usize, query))
    }

    async fn transactions_for_account(&self, account_id: Uuid) -> Result<Vec<Transaction>> {
        let rows = sqlx::query(
            "SELECT * FROM transactions WHERE account_id = $1 ORDER BY created_at",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }
}
