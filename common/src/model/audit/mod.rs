//! Audit trail models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Kind of entity an audit entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum EntityKind {
    Transaction,
    Account,
    User,
    Bank,
    Currency,
    Category,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Transaction => "transaction",
            EntityKind::Account => "account",
            EntityKind::User => "user",
            EntityKind::Bank => "bank",
            EntityKind::Currency => "currency",
            EntityKind::Category => "category",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "transaction" => Ok(EntityKind::Transaction),
            "account" => Ok(EntityKind::Account),
            "user" => Ok(EntityKind::User),
            "bank" => Ok(EntityKind::Bank),
            "currency" => Ok(EntityKind::Currency),
            "category" => Ok(EntityKind::Category),
            other => Err(Error::ValidationError(format!(
                "Unknown entity type: {}",
                other
            ))),
        }
    }
}

/// Mutation class recorded by an audit entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }

    /// Past-tense verb used in synthesized descriptions
    pub fn verb(&self) -> &'static str {
        match self {
            AuditAction::Create => "Created",
            AuditAction::Update => "Updated",
            AuditAction::Delete => "Deleted",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable record of a mutating operation against a tracked entity
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct AuditEntry {
    /// Unique entry ID
    pub id: Uuid,
    /// Kind of the mutated entity
    pub entity_type: EntityKind,
    /// ID of the mutated entity
    pub entity_id: Uuid,
    /// Mutation class
    pub action: AuditAction,
    /// For per-field updates, the field that changed
    pub field_changed: Option<String>,
    /// Previous value as a string
    pub old_value: Option<String>,
    /// New value as a string
    pub new_value: Option<String>,
    /// Human readable description
    pub description: Option<String>,
    /// Actor that performed the mutation, when known
    pub created_by: Option<Uuid>,
    /// Entry creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Payload assembled by callers of the audit recorder
#[derive(Debug, Clone)]
pub struct AuditLogData {
    pub entity_type: EntityKind,
    pub entity_id: Uuid,
    pub action: AuditAction,
    pub field_changed: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub description: Option<String>,
    pub created_by: Option<Uuid>,
}

impl AuditLogData {
    pub fn new(entity_type: EntityKind, entity_id: Uuid, action: AuditAction) -> Self {
        Self {
            entity_type,
            entity_id,
            action,
            field_changed: None,
            old_value: None,
            new_value: None,
            description: None,
            created_by: None,
        }
    }
}
