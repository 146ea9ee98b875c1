use audex_core::AppResult;
use audex_domain::SortOrder;

use crate::audit_ports::{AuditEventStore, CandidateRow, CursorPosition};
use crate::audit_query_service::order::OrderedScopeQuery;

/// Page size used when the caller does not request one.
pub(crate) const DEFAULT_PER_PAGE: usize = 20;

/// Candidate set for one keyset page, with the over-fetch sentinel already
/// consumed into `has_next_page`.
pub(crate) struct KeysetCandidates {
    pub rows: Vec<CandidateRow>,
    pub has_next_page: bool,
}

/// Runs the keyset union over all scope queries. Over-fetches by one row so
/// a next page is detected without a count query; the sentinel row stays in
/// `rows` and is dropped by hydration.
pub(crate) async fn execute_keyset(
    store: &dyn AuditEventStore,
    queries: &[OrderedScopeQuery],
    cursor: Option<&CursorPosition>,
    page_size: usize,
) -> AppResult<KeysetCandidates> {
    if queries.is_empty() {
        return Ok(KeysetCandidates {
            rows: Vec::new(),
            has_next_page: false,
        });
    }

    let fetch_limit = page_size.saturating_add(1);
    let mut rows = store
        .fetch_keyset_candidates(queries, cursor, fetch_limit)
        .await?;
    rows.truncate(fetch_limit);
    let has_next_page = rows.len() > page_size;

    Ok(KeysetCandidates {
        rows,
        has_next_page,
    })
}

/// Runs the offset union over all scope queries. Each scope contributes at
/// most `page * per_page` rows, which bounds the union to exactly what this
/// page could need regardless of table sizes.
pub(crate) async fn execute_offset(
    store: &dyn AuditEventStore,
    queries: &[OrderedScopeQuery],
    page: usize,
    per_page: usize,
    sort: SortOrder,
) -> AppResult<Vec<CandidateRow>> {
    if queries.is_empty() {
        return Ok(Vec::new());
    }

    // `page` and `per_page` come straight from request parameters, so the
    // position arithmetic saturates instead of wrapping on extreme values;
    // a saturated bound past the data simply yields an empty page.
    let max_position = page.saturating_mul(per_page);
    let offset = page.saturating_sub(1).saturating_mul(per_page);

    store
        .fetch_offset_candidates(queries, max_position, offset, per_page, sort)
        .await
}

/// Clamps a caller-supplied page number to the first page at minimum.
pub(crate) fn clamp_page(page: usize) -> usize {
    page.max(1)
}

/// Clamps a caller-supplied page size to one row at minimum.
pub(crate) fn clamp_per_page(per_page: usize) -> usize {
    per_page.max(1)
}
