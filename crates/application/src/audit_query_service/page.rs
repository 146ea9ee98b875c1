use audex_domain::AuditEvent;

/// One keyset-paginated page of audit events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeysetPage {
    /// Records in total order.
    pub records: Vec<AuditEvent>,
    /// Opaque cursor resuming after the last record, present only when a
    /// next page exists.
    pub cursor_for_next_page: Option<String>,
}

/// One offset-paginated page of audit events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffsetPage {
    /// Records in id order.
    pub records: Vec<AuditEvent>,
    /// Normalized page number actually used.
    pub page: usize,
    /// Normalized page size actually used.
    pub per_page: usize,
}
