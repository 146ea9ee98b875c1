//! Application services and ports for combined audit event queries.

#![forbid(unsafe_code)]

mod audit_ports;
mod audit_query_service;

pub use audit_ports::{AuditEventStore, CandidateRow, CursorPosition};
pub use audit_query_service::{
    AuditFilter, AuditPage, AuditQueryService, KeysetPage, OffsetPage, OrderColumn, OrderDirection,
    OrderedScopeQuery, ScopeQuery, TotalOrder, decode_cursor, encode_cursor,
};
