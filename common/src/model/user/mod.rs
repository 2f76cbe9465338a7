//! Authenticated actor types
//!
//! Identity is issued by an out-of-scope auth layer; the core only receives
//! an already-authenticated actor and threads it explicitly through every
//! mutating operation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Role granted to an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum Role {
    /// May post, correct, and remove transactions
    Acct,
    /// May read the audit trail
    Audit,
    /// May do both
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Acct => "acct",
            Role::Audit => "audit",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "acct" => Ok(Role::Acct),
            "audit" => Ok(Role::Audit),
            "admin" => Ok(Role::Admin),
            other => Err(Error::Unauthorized(format!("Unknown role: {}", other))),
        }
    }
}

/// Authenticated principal attached to every mutating call
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Actor {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, email: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            email: email.into(),
            role,
        }
    }

    /// Check that the actor holds one of the allowed roles
    pub fn require_any(&self, allowed: &[Role]) -> Result<(), Error> {
        if allowed.contains(&self.role) {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "Role {} is not permitted for this operation",
                self.role
            )))
        }
    }
}
