// api-gateway/src/lib.rs
pub mod api;
pub mod auth;
pub mod config;
pub mod error;

use std::sync::Arc;

use audit_service::{AuditDispatcher, AuditService};
use dashboard_service::DashboardService;
use ledger_service::{AccountService, InMemoryLedgerRepository, LedgerRepository, LedgerService};

/// App state shared across handlers
pub struct AppState {
    /// Transaction ledger
    pub ledger: Arc<LedgerService>,
    /// Account reference-data collaborator
    pub accounts: Arc<AccountService>,
    /// Audit recorder (query side)
    pub audit: Arc<AuditService>,
    /// Audit dispatcher for reference-data mutations
    pub dispatcher: Arc<AuditDispatcher>,
    /// Dashboard aggregator
    pub dashboard: Arc<DashboardService>,
}

impl AppState {
    /// Wire all services over one shared ledger repository
    pub fn new(ledger_repo: Arc<dyn LedgerRepository>, audit: Arc<AuditService>) -> Self {
        let ledger = Arc::new(LedgerService::new(Arc::clone(&ledger_repo), Arc::clone(&audit)));
        let accounts = Arc::new(AccountService::new(Arc::clone(&ledger_repo)));
        let dashboard = Arc::new(DashboardService::new(ledger_repo));
        let dispatcher = Arc::new(AuditDispatcher::new(Arc::clone(&audit)));

        Self {
            ledger,
            accounts,
            audit,
            dispatcher,
            dashboard,
        }
    }

    /// Fully in-memory state, used by tests and local development
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryLedgerRepository::new()),
            Arc::new(AuditService::new()),
        )
    }
}
