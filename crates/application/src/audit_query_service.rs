//! Combined audit event querying across the four scope tables, under two
//! pagination strategies: cursor-based keyset and numeric offset.

use std::sync::Arc;

use audex_core::{AppError, AppResult};
use audex_domain::{AuditEvent, AuditScope};

use crate::audit_ports::{AuditEventStore, CursorPosition};

mod cursor;
mod filter;
mod hydrate;
mod order;
mod page;
mod union;

pub use cursor::{decode_cursor, encode_cursor};
pub use filter::{AuditFilter, ScopeQuery};
pub use order::{OrderColumn, OrderDirection, OrderedScopeQuery, TotalOrder};
pub use page::{KeysetPage, OffsetPage};

use filter::build_scope_queries;
use union::{DEFAULT_PER_PAGE, clamp_page, clamp_per_page};

/// Application service merging audit events from all scope tables into one
/// globally ordered page.
#[derive(Clone)]
pub struct AuditQueryService {
    store: Arc<dyn AuditEventStore>,
}

impl AuditQueryService {
    /// Creates a service from a store implementation.
    #[must_use]
    pub fn new(store: Arc<dyn AuditEventStore>) -> Self {
        Self { store }
    }

    /// Persists one audit event.
    pub async fn record(&self, event: AuditEvent) -> AppResult<()> {
        self.store.append(event).await
    }

    /// Returns one keyset page ordered by creation time descending with id
    /// as tie-breaker, resuming after `cursor` when present. The cursor is
    /// decoded before any query is issued.
    pub async fn list_keyset(
        &self,
        filter: &AuditFilter,
        cursor: Option<&str>,
        per_page: Option<usize>,
    ) -> AppResult<KeysetPage> {
        let per_page = clamp_per_page(per_page.unwrap_or(DEFAULT_PER_PAGE));
        let position = match cursor {
            Some(raw) => Some(self.resolve_cursor(raw).await?),
            None => None,
        };

        let order = TotalOrder::keyset()?;
        let queries = ordered_queries(filter, &order);

        let candidates =
            union::execute_keyset(self.store.as_ref(), &queries, position.as_ref(), per_page)
                .await?;
        let has_next_page = candidates.has_next_page;
        let records = hydrate::hydrate_keyset(self.store.as_ref(), candidates.rows, per_page).await?;

        let cursor_for_next_page = if has_next_page {
            records.last().map(|record| encode_cursor(record.id))
        } else {
            None
        };

        Ok(KeysetPage {
            records,
            cursor_for_next_page,
        })
    }

    /// Returns one offset page. The union is re-sorted strictly by id for
    /// performance, which may order rows differently than keyset mode for
    /// the same filter; each scope contributes at most `page * per_page`
    /// rows so the read stays bounded.
    pub async fn list_offset(
        &self,
        filter: &AuditFilter,
        page: usize,
        per_page: usize,
    ) -> AppResult<OffsetPage> {
        let page = clamp_page(page);
        let per_page = clamp_per_page(per_page);

        let order = TotalOrder::by_id(filter.sort)?;
        let queries = ordered_queries(filter, &order);

        let candidates =
            union::execute_offset(self.store.as_ref(), &queries, page, per_page, filter.sort)
                .await?;
        let records = hydrate::hydrate_offset(self.store.as_ref(), candidates).await?;

        Ok(OffsetPage {
            records,
            page,
            per_page,
        })
    }

    /// Looks up a single audit event by scanning all scopes in the fixed
    /// order Instance, User, Project, Group and returning the first match.
    pub async fn find(&self, id: i64) -> AppResult<AuditEvent> {
        for scope in AuditScope::all() {
            if let Some(event) = self.store.find_in_scope(*scope, id).await? {
                return Ok(event);
            }
        }

        Err(AppError::NotFound(format!(
            "audit event {id} not found in any scope"
        )))
    }

    /// Decodes a cursor and resolves it to a full resume position. The
    /// cursor carries only an id, so the creation time comes from the
    /// stored event; a cursor whose event no longer exists is invalid.
    async fn resolve_cursor(&self, raw: &str) -> AppResult<CursorPosition> {
        let id = decode_cursor(raw)?;
        for scope in AuditScope::all() {
            if let Some(event) = self.store.find_in_scope(*scope, id).await? {
                return Ok(CursorPosition {
                    created_at: event.created_at,
                    id: event.id,
                });
            }
        }

        Err(AppError::InvalidCursor(format!(
            "cursor references an unknown audit event id {id}"
        )))
    }
}

/// Applies the shared total order to every built scope query.
fn ordered_queries(filter: &AuditFilter, order: &TotalOrder) -> Vec<OrderedScopeQuery> {
    build_scope_queries(filter)
        .into_iter()
        .map(|query| OrderedScopeQuery {
            query,
            order: order.clone(),
        })
        .collect()
}

/// Convenience wrapper selecting a pagination mode from the transport
/// `pagination` parameter: `"keyset"` selects keyset semantics, anything
/// else selects offset semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditPage {
    /// Keyset-mode result.
    Keyset(KeysetPage),
    /// Offset-mode result.
    Offset(OffsetPage),
}

impl AuditQueryService {
    /// Dispatches to the pagination mode named by `pagination`.
    pub async fn list(
        &self,
        filter: &AuditFilter,
        pagination: Option<&str>,
        cursor: Option<&str>,
        page: Option<usize>,
        per_page: Option<usize>,
    ) -> AppResult<AuditPage> {
        if pagination == Some("keyset") {
            return Ok(AuditPage::Keyset(
                self.list_keyset(filter, cursor, per_page).await?,
            ));
        }

        Ok(AuditPage::Offset(
            self.list_offset(
                filter,
                page.unwrap_or(1),
                per_page.unwrap_or(DEFAULT_PER_PAGE),
            )
            .await?,
        ))
    }
}
