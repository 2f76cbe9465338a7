//! Dashboard aggregator: read-only derived views over the ledger

pub mod service;

pub use service::{AccountFlowSummary, DashboardService, GroupedAccounts};
