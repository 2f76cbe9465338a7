//! Common types and utilities for the ledger core
//!
//! This library contains shared types, utilities, and abstractions used across
//! all services in the account-management backend. It provides a unified
//! approach to error handling, money arithmetic, pagination, and domain models.

pub mod error;
pub mod model;
pub mod decimal;
pub mod pagination;

/// Re-export important types
pub use error::{Error, Result, ErrorExt};
pub use decimal::*;
pub use pagination::{DateRange, PageQuery, Page};

// Re-export utoipa for use in model ToSchema derives
#[cfg(feature = "utoipa")]
pub use utoipa;
