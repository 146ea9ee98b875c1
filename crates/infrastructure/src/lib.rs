//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_event_store;
mod postgres_audit_event_store;

pub use in_memory_audit_event_store::InMemoryAuditEventStore;
pub use postgres_audit_event_store::PostgresAuditEventStore;
