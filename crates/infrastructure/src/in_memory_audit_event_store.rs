use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use audex_application::{
    AuditEventStore, CandidateRow, CursorPosition, OrderedScopeQuery, ScopeQuery,
};
use audex_core::AppResult;
use audex_domain::{AuditEvent, AuditScope, INSTANCE_ENTITY_ID, SortOrder};


/// In-memory store over per-scope event vectors. Used by tests and local
/// development; mirrors the union contract of the Postgres adapter.
#[derive(Default)]
pub struct InMemoryAuditEventStore {
    events: RwLock<HashMap<AuditScope, Vec<AuditEvent>>>,
}

impl InMemoryAuditEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(event: &AuditEvent, query: &ScopeQuery) -> bool {
    if let Some(after) = query.created_after {
        if event.created_at < after {
            return false;
        }
    }
    if let Some(before) = query.created_before {
        if event.created_at > before {
            return false;
        }
    }
    if let Some(author_id) = query.author_id {
        if event.author_id != author_id {
            return false;
        }
    }
    if let Some(entity_id) = query.entity_id {
        if event.entity_id != entity_id {
            return false;
        }
    }
    if let Some(entity_path) = query.entity_path.as_deref() {
        if event.entity_path.as_deref() != Some(entity_path) {
            return false;
        }
    }

    true
}

fn keyset_candidate(event: &AuditEvent) -> CandidateRow {
    CandidateRow {
        scope: event.scope,
        id: event.id,
        created_at: Some(event.created_at),
    }
}

fn offset_candidate(event: &AuditEvent) -> CandidateRow {
    CandidateRow {
        scope: event.scope,
        id: event.id,
        created_at: None,
    }
}

#[async_trait]
impl AuditEventStore for InMemoryAuditEventStore {
    async fn append(&self, mut event: AuditEvent) -> AppResult<()> {
        // Instance events always hydrate with the fixed sentinel entity id,
        // matching the column the SQL adapter synthesizes for that table.
        if event.scope == AuditScope::Instance {
            event.entity_id = INSTANCE_ENTITY_ID;
        }

        self.events
            .write()
            .await
            .entry(event.scope)
            .or_default()
            .push(event);
        Ok(())
    }

    async fn fetch_keyset_candidates(
        &self,
        queries: &[OrderedScopeQuery],
        cursor: Option<&CursorPosition>,
        fetch_limit: usize,
    ) -> AppResult<Vec<CandidateRow>> {
        let events = self.events.read().await;

        let mut union_rows = Vec::new();
        for ordered in queries {
            let mut rows: Vec<CandidateRow> = events
                .get(&ordered.query.scope)
                .map(|scoped| {
                    scoped
                        .iter()
                        .filter(|event| matches(event, &ordered.query))
                        .map(keyset_candidate)
                        .filter(|row| {
                            cursor.is_none_or(|cursor| ordered.order.admits_after(row, cursor))
                        })
                        .collect()
                })
                .unwrap_or_default();

            rows.sort_by(|left, right| ordered.order.compare(left, right));
            rows.truncate(fetch_limit);
            union_rows.extend(rows);
        }

        if let Some(first) = queries.first() {
            union_rows.sort_by(|left, right| first.order.compare(left, right));
        }
        union_rows.truncate(fetch_limit);

        Ok(union_rows)
    }

    async fn fetch_offset_candidates(
        &self,
        queries: &[OrderedScopeQuery],
        max_position: usize,
        offset: usize,
        limit: usize,
        sort: SortOrder,
    ) -> AppResult<Vec<CandidateRow>> {
        let events = self.events.read().await;

        let mut union_rows = Vec::new();
        for ordered in queries {
            let mut rows: Vec<CandidateRow> = events
                .get(&ordered.query.scope)
                .map(|scoped| {
                    scoped
                        .iter()
                        .filter(|event| matches(event, &ordered.query))
                        .map(offset_candidate)
                        .collect()
                })
                .unwrap_or_default();

            rows.sort_by(|left, right| ordered.order.compare(left, right));
            rows.truncate(max_position);
            union_rows.extend(rows);
        }

        // The merged set is re-sorted strictly by id; `sort` is the single
        // source of truth for the direction, as in the SQL adapter's outer
        // ORDER BY.
        union_rows.sort_by(|left, right| match sort {
            SortOrder::CreatedAsc => left.id.cmp(&right.id),
            SortOrder::CreatedDesc => right.id.cmp(&left.id),
        });

        Ok(union_rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn load_by_time_keys(
        &self,
        scope: AuditScope,
        keys: &[(DateTime<Utc>, i64)],
    ) -> AppResult<Vec<AuditEvent>> {
        let wanted: HashSet<(DateTime<Utc>, i64)> = keys.iter().copied().collect();
        let events = self.events.read().await;

        Ok(events
            .get(&scope)
            .map(|scoped| {
                scoped
                    .iter()
                    .filter(|event| wanted.contains(&(event.created_at, event.id)))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn load_by_ids(&self, scope: AuditScope, ids: &[i64]) -> AppResult<Vec<AuditEvent>> {
        let wanted: HashSet<i64> = ids.iter().copied().collect();
        let events = self.events.read().await;

        Ok(events
            .get(&scope)
            .map(|scoped| {
                scoped
                    .iter()
                    .filter(|event| wanted.contains(&event.id))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_in_scope(&self, scope: AuditScope, id: i64) -> AppResult<Option<AuditEvent>> {
        let events = self.events.read().await;
        Ok(events
            .get(&scope)
            .and_then(|scoped| scoped.iter().find(|event| event.id == id))
            .cloned())
    }
}
