//! Actor extraction and role gates
//!
//! Identity is established upstream (out of scope here); the trusted
//! reverse proxy forwards the authenticated principal in `x-user-*`
//! headers. The gateway turns those into an explicit [`Actor`] value that
//! is threaded through every domain operation.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use common::model::user::{Actor, Role};
use uuid::Uuid;

use crate::error::ApiError;

/// Roles allowed to post, correct, and remove transactions
pub const LEDGER_WRITE: &[Role] = &[Role::Acct, Role::Admin];

/// Roles allowed to read the audit trail
pub const AUDIT_READ: &[Role] = &[Role::Audit, Role::Admin];

/// Authenticated actor extracted from forwarded identity headers
#[derive(Debug, Clone)]
pub struct CurrentActor(pub Actor);

fn required_header(parts: &Parts, name: &str) -> Result<String, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .ok_or_else(|| ApiError::Unauthorized(format!("Missing identity header: {}", name)))
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = required_header(parts, "x-user-id")?
            .parse::<Uuid>()
            .map_err(|_| ApiError::Unauthorized("Invalid x-user-id header".to_string()))?;
        let email = required_header(parts, "x-user-email")?;
        let role = required_header(parts, "x-user-role")?
            .parse::<Role>()
            .map_err(ApiError::Common)?;

        Ok(CurrentActor(Actor::new(id, email, role)))
    }
}

impl CurrentActor {
    /// Check the actor against an allowed-role list
    pub fn require_any(&self, allowed: &[Role]) -> Result<&Actor, ApiError> {
        self.0.require_any(allowed).map_err(ApiError::Common)?;
        Ok(&self.0)
    }
}
