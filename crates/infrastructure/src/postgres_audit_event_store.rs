use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use tracing::warn;

use audex_application::{
    AuditEventStore, CandidateRow, CursorPosition, OrderColumn, OrderDirection, OrderedScopeQuery,
    ScopeQuery, TotalOrder,
};
use audex_core::{AppError, AppResult};
use audex_domain::{AuditEvent, AuditScope, INSTANCE_ENTITY_ID, SortOrder};

#[cfg(test)]
mod tests;

/// PostgreSQL-backed store merging the four audit event tables with one
/// UNION ALL statement per page fetch.
#[derive(Clone)]
pub struct PostgresAuditEventStore {
    pool: PgPool,
}

impl PostgresAuditEventStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// Static scope lookup: every tag resolves through this table, never through
// runtime reflection.
fn table_name(scope: AuditScope) -> &'static str {
    match scope {
        AuditScope::Instance => "instance_audit_events",
        AuditScope::User => "user_audit_events",
        AuditScope::Project => "project_audit_events",
        AuditScope::Group => "group_audit_events",
    }
}

fn entity_column(scope: AuditScope) -> Option<&'static str> {
    match scope {
        AuditScope::Instance => None,
        AuditScope::User => Some("user_id"),
        AuditScope::Project => Some("project_id"),
        AuditScope::Group => Some("group_id"),
    }
}

fn entity_select(scope: AuditScope) -> String {
    match entity_column(scope) {
        Some(column) => format!("{column} AS entity_id"),
        None => format!("{INSTANCE_ENTITY_ID}::BIGINT AS entity_id"),
    }
}

fn column_name(column: OrderColumn) -> &'static str {
    match column {
        OrderColumn::CreatedAt => "created_at",
        OrderColumn::Id => "id",
    }
}

fn direction_sql(direction: OrderDirection) -> &'static str {
    match direction {
        OrderDirection::Asc => "ASC",
        OrderDirection::Desc => "DESC",
    }
}

fn bind_limit(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn push_order_clause(builder: &mut QueryBuilder<'_, Postgres>, order: &TotalOrder) {
    for (index, (column, direction)) in order.columns().iter().enumerate() {
        if index > 0 {
            builder.push(", ");
        }
        builder.push(column_name(*column));
        builder.push(" ");
        builder.push(direction_sql(*direction));
    }
}

fn push_scope_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &ScopeQuery) {
    if let Some(after) = query.created_after {
        builder.push(" AND created_at >= ");
        builder.push_bind(after);
    }
    if let Some(before) = query.created_before {
        builder.push(" AND created_at <= ");
        builder.push_bind(before);
    }
    if let Some(author_id) = query.author_id {
        builder.push(" AND author_id = ");
        builder.push_bind(author_id);
    }
    if let (Some(column), Some(entity_id)) = (entity_column(query.scope), query.entity_id) {
        builder.push(" AND ");
        builder.push(column);
        builder.push(" = ");
        builder.push_bind(entity_id);
    }
    if let Some(entity_path) = &query.entity_path {
        builder.push(" AND entity_path = ");
        builder.push_bind(entity_path.clone());
    }
}

fn push_cursor_value(
    builder: &mut QueryBuilder<'_, Postgres>,
    column: OrderColumn,
    cursor: &CursorPosition,
) {
    match column {
        OrderColumn::CreatedAt => builder.push_bind(cursor.created_at),
        OrderColumn::Id => builder.push_bind(cursor.id),
    };
}

/// Expands the "resume after this key" predicate from the order definition
/// as a nested OR chain, one disjunct per order column.
fn push_cursor_predicate(
    builder: &mut QueryBuilder<'_, Postgres>,
    order: &TotalOrder,
    cursor: &CursorPosition,
) {
    let columns = order.columns();

    builder.push(" AND (");
    for (index, (column, direction)) in columns.iter().enumerate() {
        if index > 0 {
            builder.push(" OR ");
        }
        builder.push("(");
        for (prefix_column, _) in &columns[..index] {
            builder.push(column_name(*prefix_column));
            builder.push(" = ");
            push_cursor_value(builder, *prefix_column, cursor);
            builder.push(" AND ");
        }

        builder.push(column_name(*column));
        builder.push(match direction {
            OrderDirection::Asc => " > ",
            OrderDirection::Desc => " < ",
        });
        push_cursor_value(builder, *column, cursor);
        builder.push(")");
    }
    builder.push(")");
}

fn parse_scope_tag(tag: &str) -> Option<AuditScope> {
    match AuditScope::from_str(tag) {
        Ok(scope) => Some(scope),
        Err(_) => {
            warn!(tag, "unexpected scope tag in union row; skipping row");
            None
        }
    }
}

#[derive(Debug, FromRow)]
struct KeysetCandidateSqlRow {
    scope: String,
    id: i64,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct OffsetCandidateSqlRow {
    scope: String,
    id: i64,
}

#[derive(Debug, FromRow)]
struct AuditEventRow {
    id: i64,
    created_at: DateTime<Utc>,
    author_id: i64,
    entity_id: i64,
    entity_path: Option<String>,
    details: Option<serde_json::Value>,
}

fn into_event(scope: AuditScope, row: AuditEventRow) -> AuditEvent {
    AuditEvent {
        id: row.id,
        scope,
        created_at: row.created_at,
        author_id: row.author_id,
        entity_id: row.entity_id,
        entity_path: row.entity_path,
        details: row.details,
    }
}

#[async_trait]
impl AuditEventStore for PostgresAuditEventStore {
    async fn append(&self, event: AuditEvent) -> AppResult<()> {
        let table = table_name(event.scope);
        let sql = match entity_column(event.scope) {
            Some(column) => format!(
                "INSERT INTO {table} (id, created_at, author_id, {column}, entity_path, details) \
                 VALUES ($1, $2, $3, $4, $5, $6)"
            ),
            None => format!(
                "INSERT INTO {table} (id, created_at, author_id, entity_path, details) \
                 VALUES ($1, $2, $3, $4, $5)"
            ),
        };

        let query = sqlx::query(sql.as_str())
            .bind(event.id)
            .bind(event.created_at)
            .bind(event.author_id);
        let query = match entity_column(event.scope) {
            Some(_) => query.bind(event.entity_id),
            None => query,
        };

        query
            .bind(event.entity_path)
            .bind(event.details)
            .execute(&self.pool)
            .await
            .map_err(|error| AppError::Internal(format!("failed to append audit event: {error}")))?;

        Ok(())
    }

    async fn fetch_keyset_candidates(
        &self,
        queries: &[OrderedScopeQuery],
        cursor: Option<&CursorPosition>,
        fetch_limit: usize,
    ) -> AppResult<Vec<CandidateRow>> {
        let Some(first) = queries.first() else {
            return Ok(Vec::new());
        };

        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT scope, id, created_at FROM (");
        for (index, ordered) in queries.iter().enumerate() {
            if index > 0 {
                builder.push(" UNION ALL ");
            }

            builder.push("(SELECT id, created_at, '");
            builder.push(ordered.query.scope.as_str());
            builder.push("' AS scope FROM ");
            builder.push(table_name(ordered.query.scope));
            builder.push(" WHERE TRUE");
            push_scope_filters(&mut builder, &ordered.query);
            if let Some(cursor) = cursor {
                push_cursor_predicate(&mut builder, &ordered.order, cursor);
            }
            builder.push(" ORDER BY ");
            push_order_clause(&mut builder, &ordered.order);
            builder.push(" LIMIT ");
            builder.push_bind(bind_limit(fetch_limit));
            builder.push(")");
        }
        builder.push(") AS union_rows ORDER BY ");
        push_order_clause(&mut builder, &first.order);
        builder.push(" LIMIT ");
        builder.push_bind(bind_limit(fetch_limit));

        let rows: Vec<KeysetCandidateSqlRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to fetch keyset candidates: {error}"))
            })?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                parse_scope_tag(row.scope.as_str()).map(|scope| CandidateRow {
                    scope,
                    id: row.id,
                    created_at: Some(row.created_at),
                })
            })
            .collect())
    }

    async fn fetch_offset_candidates(
        &self,
        queries: &[OrderedScopeQuery],
        max_position: usize,
        offset: usize,
        limit: usize,
        sort: SortOrder,
    ) -> AppResult<Vec<CandidateRow>> {
        if queries.is_empty() {
            return Ok(Vec::new());
        }

        let direction = match sort {
            SortOrder::CreatedAsc => OrderDirection::Asc,
            SortOrder::CreatedDesc => OrderDirection::Desc,
        };

        let mut builder = QueryBuilder::<Postgres>::new("SELECT scope, id FROM (");
        for (index, ordered) in queries.iter().enumerate() {
            if index > 0 {
                builder.push(" UNION ALL ");
            }

            builder.push("(SELECT id, '");
            builder.push(ordered.query.scope.as_str());
            builder.push("' AS scope FROM ");
            builder.push(table_name(ordered.query.scope));
            builder.push(" WHERE TRUE");
            push_scope_filters(&mut builder, &ordered.query);
            builder.push(" ORDER BY ");
            push_order_clause(&mut builder, &ordered.order);
            builder.push(" LIMIT ");
            builder.push_bind(bind_limit(max_position));
            builder.push(")");
        }
        builder.push(") AS union_rows ORDER BY id ");
        builder.push(direction_sql(direction));
        builder.push(" OFFSET ");
        builder.push_bind(bind_limit(offset));
        builder.push(" LIMIT ");
        builder.push_bind(bind_limit(limit));

        let rows: Vec<OffsetCandidateSqlRow> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to fetch offset candidates: {error}"))
            })?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                parse_scope_tag(row.scope.as_str()).map(|scope| CandidateRow {
                    scope,
                    id: row.id,
                    created_at: None,
                })
            })
            .collect())
    }

    async fn load_by_time_keys(
        &self,
        scope: AuditScope,
        keys: &[(DateTime<Utc>, i64)],
    ) -> AppResult<Vec<AuditEvent>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }

        let (times, ids): (Vec<DateTime<Utc>>, Vec<i64>) = keys.iter().copied().unzip();
        let sql = format!(
            "SELECT id, created_at, author_id, {entity}, entity_path, details FROM {table} \
             WHERE (created_at, id) IN (SELECT * FROM UNNEST($1::TIMESTAMPTZ[], $2::BIGINT[]))",
            entity = entity_select(scope),
            table = table_name(scope),
        );

        let rows = sqlx::query_as::<_, AuditEventRow>(sql.as_str())
            .bind(&times)
            .bind(&ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to hydrate audit events by key: {error}"))
            })?;

        Ok(rows.into_iter().map(|row| into_event(scope, row)).collect())
    }

    async fn load_by_ids(&self, scope: AuditScope, ids: &[i64]) -> AppResult<Vec<AuditEvent>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT id, created_at, author_id, {entity}, entity_path, details FROM {table} \
             WHERE id = ANY($1)",
            entity = entity_select(scope),
            table = table_name(scope),
        );

        let rows = sqlx::query_as::<_, AuditEventRow>(sql.as_str())
            .bind(ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to hydrate audit events by id: {error}"))
            })?;

        Ok(rows.into_iter().map(|row| into_event(scope, row)).collect())
    }

    async fn find_in_scope(&self, scope: AuditScope, id: i64) -> AppResult<Option<AuditEvent>> {
        let sql = format!(
            "SELECT id, created_at, author_id, {entity}, entity_path, details FROM {table} \
             WHERE id = $1",
            entity = entity_select(scope),
            table = table_name(scope),
        );

        let row = sqlx::query_as::<_, AuditEventRow>(sql.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to look up audit event: {error}"))
            })?;

        Ok(row.map(|row| into_event(scope, row)))
    }
}
