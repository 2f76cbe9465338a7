//! Repository for audit entries

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use common::error::{Error, Result};
use common::model::audit::{AuditAction, AuditEntry, EntityKind};
use common::pagination::{Page, PageQuery};
use dashmap::DashMap;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Filter for audit queries
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditFilter {
    /// Exact entity match (kind + ID)
    pub entity: Option<(EntityKind, Uuid)>,
    /// Entries authored by one actor
    pub created_by: Option<Uuid>,
    /// Date window and pagination
    pub query: PageQuery,
}

impl AuditFilter {
    pub fn all(query: PageQuery) -> Self {
        Self {
            query,
            ..Default::default()
        }
    }

    pub fn by_entity(kind: EntityKind, id: Uuid, query: PageQuery) -> Self {
        Self {
            entity: Some((kind, id)),
            created_by: None,
            query,
        }
    }

    pub fn by_user(user_id: Uuid, query: PageQuery) -> Self {
        Self {
            entity: None,
            created_by: Some(user_id),
            query,
        }
    }
}

/// Audit repository trait defining the interface for audit-entry storage.
/// Entries are append-only; there is no update or delete.
#[async_trait]
pub trait AuditRepository: Send + Sync {
    /// Append one entry
    async fn insert(&self, entry: AuditEntry) -> Result<AuditEntry>;

    /// Get an entry by ID
    async fn get(&self, id: Uuid) -> Result<Option<AuditEntry>>;

    /// List entries matching the filter, newest first, with total count
    async fn list(&self, filter: &AuditFilter) -> Result<Page<AuditEntry>>;
}

/// In-memory repository for audit entries
pub struct InMemoryAuditRepository {
    /// Entries by ID, with an insertion sequence for stable ordering
    pub entries: DashMap<Uuid, (AuditEntry, u64)>,
    seq: AtomicU64,
}

impl InMemoryAuditRepository {
    /// Create a new in-memory audit repository
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            seq: AtomicU64::new(0),
        }
    }
}

impl Default for InMemoryAuditRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn insert(&self, entry: AuditEntry) -> Result<AuditEntry> {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst);
        self.entries.insert(entry.id, (entry.clone(), seq));
        Ok(entry)
    }

    async fn get(&self, id: Uuid) -> Result<Option<AuditEntry>> {
        Ok(self.entries.get(&id).map(|e| e.value().0.clone()))
    }

    async fn list(&self, filter: &AuditFilter) -> Result<Page<AuditEntry>> {
        let mut matches: Vec<(AuditEntry, u64)> = self
            .entries
            .iter()
            .map(|e| e.value().clone())
            .filter(|(entry, _)| {
                if let Some((kind, id)) = filter.entity {
                    if entry.entity_type != kind || entry.entity_id != id {
                        return false;
                    }
                }
                if let Some(user_id) = filter.created_by {
                    if entry.created_by != Some(user_id) {
                        return false;
                    }
                }
                filter.query.range.contains(entry.created_at)
            })
            .collect();
        // Newest first; sequence breaks same-timestamp ties
        matches.sort_by(|(a, sa), (b, sb)| (b.created_at, sb).cmp(&(a.created_at, sa)));
        Ok(Page::slice(
            matches.into_iter().map(|(entry, _)| entry).collect(),
            &filter.query,
        ))
    }
}

/// PostgreSQL repository for audit entries
pub struct PostgresAuditRepository {
    pool: PgPool,
}

fn entry_from_row(row: &sqlx::postgres::PgRow) -> Result<AuditEntry> {
    let kind_raw: String = row.get("entity_type");
    let action_raw: String = row.get("action");
    let action = match action_raw.as_str() {
        "CREATE" => AuditAction::Create,
        "UPDATE" => AuditAction::Update,
        "DELETE" => AuditAction::Delete,
        other => {
            return Err(Error::Internal(format!("Invalid audit action: {}", other)));
        }
    };
    Ok(AuditEntry {
        id: row.get("id"),
        entity_type: EntityKind::from_str(&kind_raw)?,
        entity_id: row.get("entity_id"),
        action,
        field_changed: row.get("field_changed"),
        old_value: row.get("old_value"),
        new_value: row.get("new_value"),
        description: row.get("description"),
        created_by: row.get("created_by"),
        created_at: row.get("created_at"),
    })
}

impl PostgresAuditRepository {
    /// Create a new PostgreSQL audit repository
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
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn insert(&self, entry: AuditEntry) -> Result<AuditEntry> {
        debug!(
            "Appending {} audit entry for {} {}",
            entry.action, entry.entity_type, entry.entity_id
        );

        sqlx::query(
            "INSERT INTO audit_entries \
             (id, entity_type, entity_id, action, field_changed, old_value, \
              new_value, description, created_by, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(entry.id)
        .bind(entry.entity_type.as_str())
        .bind(entry.entity_id)
        .bind(entry.action.as_str())
        .bind(&entry.field_changed)
        .bind(&entry.old_value)
        .bind(&entry.new_value)
        .bind(&entry.description)
        .bind(entry.created_by)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        Ok(entry)
    }

    async fn get(&self, id: Uuid) -> Result<Option<AuditEntry>> {
        let row = sqlx::query("SELECT * FROM audit_entries WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(entry_from_row).transpose()
    }

    async fn list(&self, filter: &AuditFilter) -> Result<Page<AuditEntry>> {
        let (kind, entity_id) = match filter.entity {
            Some((kind, id)) => (Some(kind.as_str()), Some(id)),
            None => (None, None),
        };
        let lower = filter.query.range.lower_bound();
        let upper = filter.query.range.upper_bound();

        let rows = sqlx::query(
            "SELECT * FROM audit_entries \
             WHERE ($1::text IS NULL OR entity_type = $1) \
               AND ($2::uuid IS NULL OR entity_id = $2) \
               AND ($3::uuid IS NULL OR created_by = $3) \
               AND ($4::timestamptz IS NULL OR created_at >= $4) \
               AND ($5::timestamptz IS NULL OR created_at <= $5) \
             ORDER BY created_at DESC \
             LIMIT $6 OFFSET $7",
        )
        .bind(kind)
        .bind(entity_id)
        .bind(filter.created_by)
        .bind(lower)
        .bind(upper)
        .bind(filter.query.limit() as i64)
        .bind(filter.query.offset() as i64)
        .fetch_all(&self.pool)
        .await?;

        let total_row = sqlx::query(
            "SELECT COUNT(*) AS total FROM audit_entries \
             WHERE ($1::text IS NULL OR entity_type = $1) \
               AND ($2::uuid IS NULL OR entity_id = $2) \
               AND ($3::uuid IS NULL OR created_by = $3) \
               AND ($4::timestamptz IS NULL OR created_at >= $4) \
               AND ($5::timestamptz IS NULL OR created_at <= $5)",
        )
        .bind(kind)
        .bind(entity_id)
        .bind(filter.created_by)
        .bind(lower)
        .bind(upper)
        .fetch_one(&self.pool)
        .await?;
        let total: i64 = total_row.get("total");

        let items: Result<Vec<AuditEntry>> = rows.iter().map(entry_from_row).collect();
        Ok(Page::from_parts(items?, total as usize, &filter.query))
    }
}
