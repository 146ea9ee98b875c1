use std::sync::Arc;

use chrono::{Duration, Utc};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use audex_application::{AuditFilter, AuditQueryService, decode_cursor};
use audex_core::AppError;
use audex_domain::{AuditEvent, AuditScope};

use super::PostgresAuditEventStore;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres audit event tests: {error}");
    }

    Some(pool)
}

// Ids and author are derived from the current time so concurrent test runs
// against a shared database stay isolated.
fn unique_base() -> i64 {
    Utc::now().timestamp_micros()
}

fn event(scope: AuditScope, id: i64, author_id: i64, minutes_ago: i64) -> AuditEvent {
    AuditEvent {
        id,
        scope,
        created_at: Utc::now() - Duration::minutes(minutes_ago),
        author_id,
        entity_id: 42,
        entity_path: Some("acme/app".to_owned()),
        details: Some(serde_json::json!({ "action": "updated" })),
    }
}

async fn seeded_service(pool: PgPool, events: Vec<AuditEvent>) -> AuditQueryService {
    let service = AuditQueryService::new(Arc::new(PostgresAuditEventStore::new(pool)));
    for event in events {
        let appended = service.record(event).await;
        assert!(appended.is_ok());
    }

    service
}

#[tokio::test]
async fn keyset_pages_walk_the_union_of_all_tables() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let base = unique_base();
    let author = base;
    let service = seeded_service(
        pool,
        vec![
            event(AuditScope::Instance, base + 1, author, 180),
            event(AuditScope::Project, base + 2, author, 120),
            event(AuditScope::Project, base + 3, author, 60),
        ],
    )
    .await;

    let filter = AuditFilter {
        author_id: Some(author),
        ..AuditFilter::default()
    };

    let first = service.list_keyset(&filter, None, Some(2)).await;
    assert!(first.is_ok());
    let Ok(first) = first else { return };

    let ids: Vec<i64> = first.records.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![base + 3, base + 2]);
    let cursor = first.cursor_for_next_page.unwrap_or_default();
    assert_eq!(decode_cursor(cursor.as_str()).unwrap_or_default(), base + 2);

    let second = service.list_keyset(&filter, Some(cursor.as_str()), Some(2)).await;
    assert!(second.is_ok());
    let Ok(second) = second else { return };

    let ids: Vec<i64> = second.records.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![base + 1]);
    assert_eq!(second.records[0].scope, AuditScope::Instance);
    assert_eq!(second.cursor_for_next_page, None);
}

#[tokio::test]
async fn offset_page_returns_id_ordered_union_and_hydrates_details() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let base = unique_base();
    let author = base;
    let service = seeded_service(
        pool,
        vec![
            event(AuditScope::Group, base + 1, author, 10),
            event(AuditScope::User, base + 2, author, 30),
            event(AuditScope::Instance, base + 3, author, 20),
        ],
    )
    .await;

    let filter = AuditFilter {
        author_id: Some(author),
        ..AuditFilter::default()
    };
    let page = service.list_offset(&filter, 1, 2).await;
    assert!(page.is_ok());
    let Ok(page) = page else { return };

    let ids: Vec<i64> = page.records.iter().map(|record| record.id).collect();
    assert_eq!(ids, vec![base + 3, base + 2]);
    assert_eq!(page.page, 1);
    assert_eq!(page.per_page, 2);
    assert_eq!(
        page.records[1].details,
        Some(serde_json::json!({ "action": "updated" }))
    );
}

#[tokio::test]
async fn entity_filters_narrow_to_the_matching_scope_rows() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let base = unique_base();
    let author = base;
    let mut project = event(AuditScope::Project, base + 1, author, 10);
    project.entity_id = base + 500;
    let mut group = event(AuditScope::Group, base + 2, author, 20);
    group.entity_id = base + 500;
    let service = seeded_service(pool, vec![project, group]).await;

    let filter = AuditFilter {
        author_id: Some(author),
        entity_type: Some("Project".to_owned()),
        entity_id: Some(base + 500),
        ..AuditFilter::default()
    };
    let page = service.list_keyset(&filter, None, Some(10)).await;
    assert!(page.is_ok());
    let Ok(page) = page else { return };

    let keys: Vec<(AuditScope, i64)> = page
        .records
        .iter()
        .map(|record| (record.scope, record.id))
        .collect();
    assert_eq!(keys, vec![(AuditScope::Project, base + 1)]);
}

#[tokio::test]
async fn find_scans_tables_and_reports_missing_ids() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let base = unique_base();
    let service = seeded_service(pool, vec![event(AuditScope::User, base + 1, base, 5)]).await;

    let found = service.find(base + 1).await;
    assert!(found.is_ok());
    if let Ok(found) = found {
        assert_eq!(found.scope, AuditScope::User);
        assert_eq!(found.entity_id, 42);
    }

    let missing = service.find(base + 999).await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}
