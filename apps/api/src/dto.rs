use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use audex_application::{KeysetPage, OffsetPage};
use audex_domain::AuditEvent;

/// One audit event as returned by the API.
#[derive(Debug, Serialize)]
pub struct AuditEventResponse {
    /// Event id, unique within its entity type.
    pub id: i64,
    /// Entity type label of the owning scope.
    pub entity_type: &'static str,
    /// Id of the owning entity.
    pub entity_id: i64,
    /// User that performed the audited action.
    pub author_id: i64,
    /// Event creation time.
    pub created_at: DateTime<Utc>,
    /// Human-readable path of the owning entity, when recorded.
    pub entity_path: Option<String>,
    /// Structured event payload.
    pub details: Option<Value>,
}

impl From<AuditEvent> for AuditEventResponse {
    fn from(event: AuditEvent) -> Self {
        Self {
            id: event.id,
            entity_type: event.scope.entity_type(),
            entity_id: event.entity_id,
            author_id: event.author_id,
            created_at: event.created_at,
            entity_path: event.entity_path,
            details: event.details,
        }
    }
}

/// Keyset-mode page payload.
#[derive(Debug, Serialize)]
pub struct KeysetPageResponse {
    /// Records in total order.
    pub records: Vec<AuditEventResponse>,
    /// Cursor resuming after the last record, when a next page exists.
    pub cursor_for_next_page: Option<String>,
}

impl From<KeysetPage> for KeysetPageResponse {
    fn from(page: KeysetPage) -> Self {
        Self {
            records: page.records.into_iter().map(Into::into).collect(),
            cursor_for_next_page: page.cursor_for_next_page,
        }
    }
}

/// Offset-mode page payload.
#[derive(Debug, Serialize)]
pub struct OffsetPageResponse {
    /// Records in id order.
    pub records: Vec<AuditEventResponse>,
    /// Normalized page number actually used.
    pub page: usize,
    /// Normalized page size actually used.
    pub per_page: usize,
}

impl From<OffsetPage> for OffsetPageResponse {
    fn from(page: OffsetPage) -> Self {
        Self {
            records: page.records.into_iter().map(Into::into).collect(),
            page: page.page,
            per_page: page.per_page,
        }
    }
}
