use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::warn;

use audex_core::AppResult;
use audex_domain::{AuditEvent, AuditScope};

use crate::audit_ports::{AuditEventStore, CandidateRow};

/// Hydrates keyset candidates into full records. Candidates are grouped by
/// scope and batch-loaded by composite `(created_at, id)` key, because ids
/// are unique only within a scope and an id-only batch could mis-match
/// rows. The over-fetch sentinel must already be outside `page_size`.
pub(crate) async fn hydrate_keyset(
    store: &dyn AuditEventStore,
    mut candidates: Vec<CandidateRow>,
    page_size: usize,
) -> AppResult<Vec<AuditEvent>> {
    candidates.truncate(page_size);

    let mut keys_by_scope: HashMap<AuditScope, Vec<(DateTime<Utc>, i64)>> = HashMap::new();
    for candidate in &candidates {
        match candidate.created_at {
            Some(created_at) => keys_by_scope
                .entry(candidate.scope)
                .or_default()
                .push((created_at, candidate.id)),
            None => warn!(
                scope = %candidate.scope,
                id = candidate.id,
                "keyset candidate is missing created_at; skipping row"
            ),
        }
    }

    let mut loaded = Vec::with_capacity(candidates.len());
    for scope in AuditScope::all() {
        let Some(keys) = keys_by_scope.get(scope) else {
            continue;
        };

        let events = store.load_by_time_keys(*scope, keys).await?;
        if events.len() < keys.len() {
            warn!(
                scope = %scope,
                requested = keys.len(),
                loaded = events.len(),
                "hydration returned fewer rows than requested; page may be under-filled"
            );
        }

        loaded.extend(events);
    }

    Ok(restore_candidate_order(&candidates, loaded))
}

/// Hydrates offset candidates into full records. An id-only batch per scope
/// is sufficient here because offset mode orders the union strictly by id.
pub(crate) async fn hydrate_offset(
    store: &dyn AuditEventStore,
    candidates: Vec<CandidateRow>,
) -> AppResult<Vec<AuditEvent>> {
    let mut ids_by_scope: HashMap<AuditScope, Vec<i64>> = HashMap::new();
    for candidate in &candidates {
        ids_by_scope
            .entry(candidate.scope)
            .or_default()
            .push(candidate.id);
    }

    let mut loaded = Vec::with_capacity(candidates.len());
    for scope in AuditScope::all() {
        let Some(ids) = ids_by_scope.get(scope) else {
            continue;
        };

        let events = store.load_by_ids(*scope, ids).await?;
        if events.len() < ids.len() {
            warn!(
                scope = %scope,
                requested = ids.len(),
                loaded = events.len(),
                "hydration returned fewer rows than requested; page may be under-filled"
            );
        }

        loaded.extend(events);
    }

    Ok(restore_candidate_order(&candidates, loaded))
}

/// Re-sorts hydrated records into the exact candidate order using a
/// `(scope, id) -> position` index; batch loads return rows in arbitrary
/// order. Records without a matching candidate are a data-consistency
/// anomaly and are dropped with a warning.
fn restore_candidate_order(
    candidates: &[CandidateRow],
    loaded: Vec<AuditEvent>,
) -> Vec<AuditEvent> {
    let positions: HashMap<(AuditScope, i64), usize> = candidates
        .iter()
        .enumerate()
        .map(|(position, candidate)| ((candidate.scope, candidate.id), position))
        .collect();

    let mut positioned: Vec<(usize, AuditEvent)> = Vec::with_capacity(loaded.len());
    for event in loaded {
        match positions.get(&(event.scope, event.id)) {
            Some(position) => positioned.push((*position, event)),
            None => warn!(
                scope = %event.scope,
                id = event.id,
                "hydrated row has no matching candidate; dropping row"
            ),
        }
    }

    positioned.sort_by_key(|(position, _)| *position);
    positioned.into_iter().map(|(_, event)| event).collect()
}
