//! Audit event sink for state transitions.
//!
//! Every state transition in the core (post, reverse, close, apply-payment)
//! emits a structured event for the external audit-logging module. The sink
//! is injected; emission is fire-and-forget and must never block or fail a
//! transition.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use keystone_shared::types::{Money, TenantId, UserId};

/// Opaque caller identity threaded through every command for audit
/// attribution. The core never interprets it.
#[derive(Debug, Clone, Copy)]
pub struct AuditContext {
    /// The tenant the command is scoped to.
    pub tenant_id: TenantId,
    /// The user performing the command.
    pub user_id: UserId,
}

/// Action recorded by an audit event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    /// A journal entry was posted.
    EntryPosted,
    /// A posted journal entry was reversed.
    EntryReversed,
    /// A fiscal period was closed.
    PeriodClosed,
    /// A fiscal year was closed with a closing entry.
    YearEndClosed,
    /// An invoice was created.
    InvoiceCreated,
    /// An invoice was voided.
    InvoiceVoided,
    /// A payment was applied to an invoice.
    PaymentApplied,
}

/// A structured audit event describing one state transition.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    /// Entity type, e.g. `"journal_entry"`.
    pub entity_type: &'static str,
    /// The entity's ID.
    pub entity_id: Uuid,
    /// The action performed.
    pub action: AuditAction,
    /// Monetary amount before the transition, where applicable.
    pub amount_before: Option<Money>,
    /// Monetary amount after the transition, where applicable.
    pub amount_after: Option<Money>,
    /// The tenant the transition is scoped to.
    pub tenant_id: TenantId,
    /// The user who performed the action.
    pub actor: UserId,
    /// When the event was recorded.
    pub occurred_at: DateTime<Utc>,
}

impl AuditEvent {
    /// Builds an event for the given action and entity.
    #[must_use]
    pub fn new(
        entity_type: &'static str,
        entity_id: Uuid,
        action: AuditAction,
        ctx: &AuditContext,
    ) -> Self {
        Self {
            entity_type,
            entity_id,
            action,
            amount_before: None,
            amount_after: None,
            tenant_id: ctx.tenant_id,
            actor: ctx.user_id,
            occurred_at: Utc::now(),
        }
    }

    /// Attaches before/after amounts to the event.
    #[must_use]
    pub fn with_amounts(mut self, before: Option<Money>, after: Option<Money>) -> Self {
        self.amount_before = before;
        self.amount_after = after;
        self
    }

    /// The event as a JSON payload for downstream sinks.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// Injected sink for audit events.
///
/// Implementations enqueue and return; they must not block the calling
/// transition or surface errors into it.
pub trait EventSink {
    /// Records one event.
    fn emit(&self, event: AuditEvent);
}

/// Sink that discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: AuditEvent) {}
}

/// Sink that buffers events in memory, for tests and small hosts.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: std::sync::Mutex<Vec<AuditEvent>>,
}

impl MemorySink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: AuditEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
