//! Domain value types for audit event querying.

#![forbid(unsafe_code)]

mod audit;

pub use audit::{AuditEvent, AuditScope, INSTANCE_ENTITY_ID, SortOrder};
