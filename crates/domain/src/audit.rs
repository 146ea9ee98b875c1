use std::fmt::{Display, Formatter};
use std::str::FromStr;

use audex_core::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Entity id reported for instance-scoped events, which have no entity row
/// of their own.
pub const INSTANCE_ENTITY_ID: i64 = 1;

/// Logical audit event partition. Each scope is backed by its own table and
/// event ids are unique only within a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditScope {
    /// Instance-wide events with no owning entity.
    Instance,
    /// Events scoped to a single user.
    User,
    /// Events scoped to a single project.
    Project,
    /// Events scoped to a single group.
    Group,
}

impl AuditScope {
    /// Returns a stable storage tag for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instance => "instance",
            Self::User => "user",
            Self::Project => "project",
            Self::Group => "group",
        }
    }

    /// Returns all scopes in the fixed lookup order used by single-event
    /// resolution.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[AuditScope] = &[
            AuditScope::Instance,
            AuditScope::User,
            AuditScope::Project,
            AuditScope::Group,
        ];

        ALL
    }

    /// Returns the entity type label reported for events in this scope.
    #[must_use]
    pub fn entity_type(&self) -> &'static str {
        match self {
            Self::Instance => "Instance",
            Self::User => "User",
            Self::Project => "Project",
            Self::Group => "Group",
        }
    }

    /// Resolves a caller-supplied entity type to a scope. Unrecognized
    /// values return `None`, which callers treat as "all scopes".
    #[must_use]
    pub fn from_entity_type(value: &str) -> Option<Self> {
        match value {
            "Instance" => Some(Self::Instance),
            "User" => Some(Self::User),
            "Project" => Some(Self::Project),
            "Group" => Some(Self::Group),
            _ => None,
        }
    }
}

impl FromStr for AuditScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "instance" => Ok(Self::Instance),
            "user" => Ok(Self::User),
            "project" => Ok(Self::Project),
            "group" => Ok(Self::Group),
            _ => Err(AppError::Validation(format!(
                "unknown audit scope tag '{value}'"
            ))),
        }
    }
}

impl Display for AuditScope {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.as_str())
    }
}

/// A fully hydrated audit event row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    /// Event id, unique within `scope` only.
    pub id: i64,
    /// Partition the event belongs to.
    pub scope: AuditScope,
    /// Event creation time.
    pub created_at: DateTime<Utc>,
    /// User that performed the audited action.
    pub author_id: i64,
    /// Id of the owning entity within the scope.
    pub entity_id: i64,
    /// Human-readable path of the owning entity, when recorded.
    pub entity_path: Option<String>,
    /// Structured event payload.
    pub details: Option<Value>,
}

/// Requested result ordering for offset pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Newest events first.
    #[default]
    CreatedDesc,
    /// Oldest events first.
    CreatedAsc,
}

impl SortOrder {
    /// Parses a caller-supplied sort value, defaulting to newest-first for
    /// anything unrecognized.
    #[must_use]
    pub fn from_param(value: Option<&str>) -> Self {
        match value {
            Some("created_asc") => Self::CreatedAsc,
            _ => Self::CreatedDesc,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{AuditScope, SortOrder};

    #[test]
    fn scope_tags_round_trip() {
        for scope in AuditScope::all() {
            let parsed = AuditScope::from_str(scope.as_str());
            assert!(parsed.is_ok());
            assert_eq!(parsed.unwrap_or(AuditScope::Instance), *scope);
        }
    }

    #[test]
    fn unknown_scope_tag_is_rejected() {
        assert!(AuditScope::from_str("vault").is_err());
    }

    #[test]
    fn entity_type_resolution_ignores_unknown_values() {
        assert_eq!(
            AuditScope::from_entity_type("Project"),
            Some(AuditScope::Project)
        );
        assert_eq!(AuditScope::from_entity_type("Pipeline"), None);
    }

    #[test]
    fn sort_param_defaults_to_created_desc() {
        assert_eq!(SortOrder::from_param(None), SortOrder::CreatedDesc);
        assert_eq!(SortOrder::from_param(Some("bogus")), SortOrder::CreatedDesc);
        assert_eq!(
            SortOrder::from_param(Some("created_asc")),
            SortOrder::CreatedAsc
        );
    }
}
