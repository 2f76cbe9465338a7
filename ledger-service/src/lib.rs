//! Ledger service: posts balance movements and owns account balances

pub mod service;
pub mod repository;
pub mod accounts;
pub mod config;

pub use service::{LedgerService, NewTransaction, TransactionPatch};
pub use accounts::{AccountService, NewAccount};
pub use repository::{InMemoryLedgerRepository, LedgerRepository, PostgresLedgerRepository};
pub use config::LedgerServiceConfig;
