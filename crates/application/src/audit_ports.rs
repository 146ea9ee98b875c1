use async_trait::async_trait;
use chrono::{DateTime, Utc};

use audex_core::AppResult;
use audex_domain::{AuditEvent, AuditScope, SortOrder};

use crate::audit_query_service::OrderedScopeQuery;

/// Minimal projection of one union candidate row. Produced by the union
/// step and discarded after hydration; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateRow {
    /// Partition the row was read from.
    pub scope: AuditScope,
    /// Event id within the scope.
    pub id: i64,
    /// Creation time; carried in keyset mode only.
    pub created_at: Option<DateTime<Utc>>,
}

/// Resolved keyset resume position the union is filtered against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorPosition {
    /// Creation time of the cursor event.
    pub created_at: DateTime<Utc>,
    /// Id of the cursor event within its scope.
    pub id: i64,
}

/// Port for reading and appending audit events across all scope tables.
///
/// Implementations execute the scope queries as one merged read. The two
/// candidate fetches return globally ordered rows: by the shared total
/// order for keyset mode, strictly by id for offset mode.
#[async_trait]
pub trait AuditEventStore: Send + Sync {
    /// Persists one audit event into its scope table.
    async fn append(&self, event: AuditEvent) -> AppResult<()>;

    /// Executes the keyset union: each scope query contributes at most
    /// `fetch_limit` rows past `cursor`, the merged set is re-sorted by the
    /// shared total order and capped at `fetch_limit`.
    async fn fetch_keyset_candidates(
        &self,
        queries: &[OrderedScopeQuery],
        cursor: Option<&CursorPosition>,
        fetch_limit: usize,
    ) -> AppResult<Vec<CandidateRow>>;

    /// Executes the offset union: each scope query is pre-limited to
    /// `max_position` rows in id order, the merged set is re-sorted
    /// strictly by id per `sort`, then `offset`/`limit` are applied.
    async fn fetch_offset_candidates(
        &self,
        queries: &[OrderedScopeQuery],
        max_position: usize,
        offset: usize,
        limit: usize,
        sort: SortOrder,
    ) -> AppResult<Vec<CandidateRow>>;

    /// Batch-loads full rows for one scope by composite `(created_at, id)`
    /// keys. Result order is unspecified.
    async fn load_by_time_keys(
        &self,
        scope: AuditScope,
        keys: &[(DateTime<Utc>, i64)],
    ) -> AppResult<Vec<AuditEvent>>;

    /// Batch-loads full rows for one scope by id set. Result order is
    /// unspecified.
    async fn load_by_ids(&self, scope: AuditScope, ids: &[i64]) -> AppResult<Vec<AuditEvent>>;

    /// Looks up a single event within one scope.
    async fn find_in_scope(&self, scope: AuditScope, id: i64) -> AppResult<Option<AuditEvent>>;
}
