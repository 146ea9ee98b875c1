use audex_application::AuditQueryService;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    /// Combined audit event query service.
    pub audit_query_service: AuditQueryService,
}
