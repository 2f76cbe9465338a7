//! Audit recorder implementation
//!
//! Writes are best-effort by contract: audit durability must never gate or
//! roll back the business mutation that triggered it. `log` therefore
//! returns an [`AuditOutcome`] the caller may inspect instead of an error
//! it would have to handle.

use std::sync::Arc;

use chrono::Utc;
use common::error::Result;
use common::model::audit::{AuditAction, AuditEntry, AuditLogData, EntityKind};
use common::model::user::Actor;
use common::pagination::{Page, PageQuery};
use tracing::{debug, error};
use uuid::Uuid;

use crate::repository::{AuditFilter, AuditRepository, InMemoryAuditRepository};

/// Result of one best-effort audit write
#[derive(Debug, Clone)]
pub enum AuditOutcome {
    /// The entry was persisted
    Recorded(AuditEntry),
    /// The write failed; the failure was traced and discarded
    Dropped,
}

impl AuditOutcome {
    pub fn is_recorded(&self) -> bool {
        matches!(self, AuditOutcome::Recorded(_))
    }
}

/// Audit recorder: the only writer of the append-only audit trail
pub struct AuditService {
    /// Repository for audit entries
    repo: Arc<dyn AuditRepository>,
}

impl AuditService {
    /// Create a new audit service backed by an in-memory repository
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryAuditRepository::new()),
        }
    }

    /// Create a new audit service with a specific repository
    pub fn with_repo(repo: Arc<dyn AuditRepository>) -> Self {
        Self { repo }
    }

    /// Persist one audit entry, best-effort
    pub async fn log(&self, data: AuditLogData) -> AuditOutcome {
        let entry = AuditEntry {
            id: Uuid::new_v4(),
            entity_type: data.entity_type,
            entity_id: data.entity_id,
            action: data.action,
            field_changed: data.field_changed,
            old_value: data.old_value,
            new_value: data.new_value,
            description: data.description,
            created_by: data.created_by,
            created_at: Utc::now(),
        };

        match self.repo.insert(entry).await {
            Ok(entry) => {
                debug!(
                    "Recorded {} audit entry {} for {} {}",
                    entry.action, entry.id, entry.entity_type, entry.entity_id
                );
                AuditOutcome::Recorded(entry)
            }
            Err(e) => {
                error!("Failed to record audit entry: {}", e);
                AuditOutcome::Dropped
            }
        }
    }

    /// Record a CREATE against an entity
    pub async fn log_create(
        &self,
        entity_type: EntityKind,
        entity_id: Uuid,
        description: String,
        actor: Option<&Actor>,
    ) -> AuditOutcome {
        let mut data = AuditLogData::new(entity_type, entity_id, AuditAction::Create);
        data.description = Some(description);
        data.created_by = actor.map(|a| a.id);
        self.log(data).await
    }

    /// Record a per-field UPDATE against an entity
    #[allow(clippy::too_many_arguments)]
    pub async fn log_update(
        &self,
        entity_type: EntityKind,
        entity_id: Uuid,
        field_changed: String,
        old_value: String,
        new_value: String,
        description: String,
        actor: Option<&Actor>,
    ) -> AuditOutcome {
        let mut data = AuditLogData::new(entity_type, entity_id, AuditAction::Update);
        data.field_changed = Some(field_changed);
        data.old_value = Some(old_value);
        data.new_value = Some(new_value);
        data.description = Some(description);
        data.created_by = actor.map(|a| a.id);
        self.log(data).await
    }

    /// Record a DELETE against an entity
    pub async fn log_delete(
        &self,
        entity_type: EntityKind,
        entity_id: Uuid,
        description: String,
        actor: Option<&Actor>,
    ) -> AuditOutcome {
        let mut data = AuditLogData::new(entity_type, entity_id, AuditAction::Delete);
        data.description = Some(description);
        data.created_by = actor.map(|a| a.id);
        self.log(data).await
    }

    /// All entries, newest first
    pub async fn find_all(&self, query: PageQuery) -> Result<Page<AuditEntry>> {
        self.repo.list(&AuditFilter::all(query)).await
    }

    /// One entry by ID
    pub async fn find_one(&self, id: Uuid) -> Result<AuditEntry> {
        self.repo.get(id).await?.ok_or_else(|| {
            common::error::Error::AuditEntryNotFound(format!("Audit entry not found: {}", id))
        })
    }

    /// Entries for one entity, newest first
    pub async fn find_by_entity(
        &self,
        kind: EntityKind,
        entity_id: Uuid,
        query: PageQuery,
    ) -> Result<Page<AuditEntry>> {
        self.repo
            .list(&AuditFilter::by_entity(kind, entity_id, query))
            .await
    }

    /// Entries authored by one user, newest first
    pub async fn find_by_user(&self, user_id: Uuid, query: PageQuery) -> Result<Page<AuditEntry>> {
        self.repo.list(&AuditFilter::by_user(user_id, query)).await
    }
}

impl Default for AuditService {
    fn default() -> Self {
        Self::new()
    }
}
