//! Audit dispatcher: derives audit entries from typed mutation events
//!
//! Services (or the HTTP layer on their behalf) publish a [`MutationEvent`]
//! after each successful create/update/delete. The dispatcher synthesizes a
//! human-readable description from a per-entity-kind template registry and
//! forwards it to the recorder. Dispatch never blocks or fails the
//! originating operation.
//!
//! Dispatcher-originated UPDATE entries log the generic `multiple_fields`
//! change: the dispatcher has no pre-mutation state, so only services that
//! own that state (the ledger's own `update`) produce per-field diffs.

use std::sync::Arc;

use common::model::audit::{AuditAction, EntityKind};
use common::model::user::Actor;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::service::{AuditOutcome, AuditService};

/// A successful mutating operation, as observed by the dispatcher
#[derive(Debug, Clone)]
pub struct MutationEvent {
    /// Kind of the mutated entity
    pub kind: EntityKind,
    /// Mutation class
    pub action: AuditAction,
    /// ID of the mutated entity
    pub entity_id: Uuid,
    /// Actor that performed the mutation, when known
    pub actor: Option<Actor>,
    /// Serialized response payload (preferred field source)
    pub response: Value,
    /// Serialized request payload (fallback field source)
    pub request: Value,
}

impl MutationEvent {
    pub fn new(kind: EntityKind, action: AuditAction, entity_id: Uuid) -> Self {
        Self {
            kind,
            action,
            entity_id,
            actor: None,
            response: Value::Null,
            request: Value::Null,
        }
    }

    pub fn with_actor(mut self, actor: &Actor) -> Self {
        self.actor = Some(actor.clone());
        self
    }

    pub fn with_response(mut self, response: Value) -> Self {
        self.response = response;
        self
    }

    pub fn with_request(mut self, request: Value) -> Self {
        self.request = request;
        self
    }

    /// Read a field from the response payload, falling back to the
    /// request payload. Each candidate is a JSON pointer without the
    /// leading slash, e.g. `account/name`.
    fn field(&self, candidates: &[&str]) -> Option<String> {
        for payload in [&self.response, &self.request] {
            for candidate in candidates {
                let pointer = format!("/{}", candidate);
                match payload.pointer(&pointer) {
                    Some(Value::String(s)) => return Some(s.clone()),
                    Some(Value::Number(n)) => return Some(n.to_string()),
                    _ => continue,
                }
            }
        }
        None
    }

    /// Synthesize the audit description for this event
    pub fn description(&self) -> String {
        let verb = self.action.verb();
        match self.kind {
            EntityKind::Transaction => {
                let mut base = verb.to_string();
                if let Some(kind) = self.field(&["type"]) {
                    base.push_str(&format!(" {}", kind));
                }
                base.push_str(" transaction");
                if let Some(amount) = self.field(&["amount"]) {
                    base.push_str(&format!(" of {}", amount));
                }
                if let Some(account) = self.field(&["account/name", "accountName"]) {
                    base.push_str(&format!(" for account {}", account));
                }
                if let Some(desc) = self.field(&["description"]) {
                    base.push_str(&format!(" (\"{}\")", desc));
                }
                base
            }
            EntityKind::Account | EntityKind::Bank | EntityKind::Category => {
                match self.field(&["name"]) {
                    Some(name) => format!("{} {} \"{}\"", verb, self.kind, name),
                    None => self.fallback_description(),
                }
            }
            EntityKind::User => match self.field(&["email"]) {
                Some(email) => format!("{} user \"{}\"", verb, email),
                None => self.fallback_description(),
            },
            EntityKind::Currency => match self.field(&["code"]) {
                Some(code) => format!("{} currency \"{}\"", verb, code),
                None => self.fallback_description(),
            },
        }
    }

    fn fallback_description(&self) -> String {
        format!(
            "{} {} with ID {}",
            self.action.verb(),
            self.kind,
            self.entity_id
        )
    }
}

/// Forwards mutation events to the audit recorder
pub struct AuditDispatcher {
    recorder: Arc<AuditService>,
}

impl AuditDispatcher {
    pub fn new(recorder: Arc<AuditService>) -> Self {
        Self { recorder }
    }

    /// Record the event and return the outcome
    pub async fn record(&self, event: MutationEvent) -> AuditOutcome {
        let description = event.description();
        let actor = event.actor.as_ref();
        match event.action {
            AuditAction::Create => {
                self.recorder
                    .log_create(event.kind, event.entity_id, description, actor)
                    .await
            }
            AuditAction::Update => {
                self.recorder
                    .log_update(
                        event.kind,
                        event.entity_id,
                        "multiple_fields".to_string(),
                        "previous_values".to_string(),
                        "updated_values".to_string(),
                        description,
                        actor,
                    )
                    .await
            }
            AuditAction::Delete => {
                self.recorder
                    .log_delete(event.kind, event.entity_id, description, actor)
                    .await
            }
        }
    }

    /// Record the event on a detached task. The caller's response is
    /// never delayed, and a crash between the mutation and the audit
    /// write loses the entry (accepted trade-off).
    pub fn observe(&self, event: MutationEvent) {
        let recorder = Arc::clone(&self.recorder);
        tokio::spawn(async move {
            let dispatcher = AuditDispatcher::new(recorder);
            let outcome = dispatcher.record(event).await;
            debug!("Detached audit dispatch finished, recorded={}", outcome.is_recorded());
        });
    }
}
