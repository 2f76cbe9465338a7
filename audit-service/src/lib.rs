//! Audit service: append-only recorder and the mutation-event dispatcher

pub mod service;
pub mod repository;
pub mod dispatcher;

pub use service::{AuditService, AuditOutcome};
pub use repository::{AuditFilter, AuditRepository, InMemoryAuditRepository, PostgresAuditRepository};
pub use dispatcher::{AuditDispatcher, MutationEvent};
