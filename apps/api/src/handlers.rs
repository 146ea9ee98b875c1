use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use audex_application::{AuditFilter, AuditPage};
use audex_core::AppError;
use audex_domain::SortOrder;

use crate::dto::{AuditEventResponse, KeysetPageResponse, OffsetPageResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Query parameters accepted by the audit event listing.
#[derive(Debug, Deserialize)]
pub struct AuditEventListQuery {
    pub entity_type: Option<String>,
    pub entity_id: Option<i64>,
    pub entity_username: Option<String>,
    pub author_id: Option<i64>,
    pub created_after: Option<DateTime<Utc>>,
    pub created_before: Option<DateTime<Utc>>,
    pub pagination: Option<String>,
    pub cursor: Option<String>,
    pub page: Option<usize>,
    pub per_page: Option<usize>,
    pub sort: Option<String>,
}

/// Lists audit events across all scopes. `pagination=keyset` selects
/// cursor pagination; anything else selects offset pagination.
pub async fn list_audit_events_handler(
    State(state): State<AppState>,
    Query(query): Query<AuditEventListQuery>,
) -> ApiResult<Response> {
    if let Some(entity_id) = query.entity_id {
        if entity_id <= 0 {
            return Err(ApiError(AppError::Validation(
                "entity_id must be a positive integer".to_owned(),
            )));
        }
    }

    let filter = AuditFilter {
        created_after: query.created_after,
        created_before: query.created_before,
        author_id: query.author_id,
        entity_type: query.entity_type,
        entity_id: query.entity_id,
        entity_username: query.entity_username,
        sort: SortOrder::from_param(query.sort.as_deref()),
    };

    let page = state
        .audit_query_service
        .list(
            &filter,
            query.pagination.as_deref(),
            query.cursor.as_deref(),
            query.page,
            query.per_page,
        )
        .await?;

    Ok(match page {
        AuditPage::Keyset(page) => Json(KeysetPageResponse::from(page)).into_response(),
        AuditPage::Offset(page) => Json(OffsetPageResponse::from(page)).into_response(),
    })
}

/// Returns one audit event by id, scanning all scopes.
pub async fn get_audit_event_handler(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<AuditEventResponse>> {
    let event = state.audit_query_service.find(id).await?;
    Ok(Json(AuditEventResponse::from(event)))
}

/// Liveness probe.
pub async fn health_handler() -> &'static str {
    "ok"
}
