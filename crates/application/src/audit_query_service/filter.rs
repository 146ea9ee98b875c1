use chrono::{DateTime, Utc};

use audex_domain::{AuditScope, SortOrder};

/// Immutable filter for combined audit event queries. Constructed once per
/// request from caller-supplied parameters and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditFilter {
    /// Lower creation time bound (inclusive).
    pub created_after: Option<DateTime<Utc>>,
    /// Upper creation time bound (inclusive).
    pub created_before: Option<DateTime<Utc>>,
    /// Restrict to events performed by this author.
    pub author_id: Option<i64>,
    /// Caller-supplied entity type; unrecognized values mean "all scopes".
    pub entity_type: Option<String>,
    /// Restrict to events owned by this entity id.
    pub entity_id: Option<i64>,
    /// Restrict user-scoped events to this username; ignored elsewhere.
    pub entity_username: Option<String>,
    /// Result ordering for offset pagination.
    pub sort: SortOrder,
}

impl AuditFilter {
    /// Returns the scopes this filter evaluates. A recognized entity type
    /// narrows evaluation to its single scope; this only skips scopes that
    /// are guaranteed empty and never changes result semantics.
    #[must_use]
    pub fn target_scopes(&self) -> Vec<AuditScope> {
        match self
            .entity_type
            .as_deref()
            .and_then(AuditScope::from_entity_type)
        {
            Some(scope) => vec![scope],
            None => AuditScope::all().to_vec(),
        }
    }
}

/// One scope's filtered query descriptor. Immutable once built; sharing a
/// descriptor between scopes is impossible because each carries its own
/// predicate set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeQuery {
    /// Scope the descriptor reads from.
    pub scope: AuditScope,
    /// Lower creation time bound (inclusive).
    pub created_after: Option<DateTime<Utc>>,
    /// Upper creation time bound (inclusive).
    pub created_before: Option<DateTime<Utc>>,
    /// Author predicate.
    pub author_id: Option<i64>,
    /// Entity id predicate, set only for scopes that honor it.
    pub entity_id: Option<i64>,
    /// Entity path predicate, honored by the user scope only.
    pub entity_path: Option<String>,
}

/// Builds one filtered query per targeted scope, applying predicates in a
/// fixed order: time range, author, then the entity predicate for that
/// scope. Scopes that do not support a requested entity predicate pass
/// through unfiltered on it.
pub(crate) fn build_scope_queries(filter: &AuditFilter) -> Vec<ScopeQuery> {
    filter
        .target_scopes()
        .into_iter()
        .map(|scope| {
            let honors_entity_id = matches!(
                scope,
                AuditScope::User | AuditScope::Project | AuditScope::Group
            );

            ScopeQuery {
                scope,
                created_after: filter.created_after,
                created_before: filter.created_before,
                author_id: filter.author_id,
                entity_id: filter.entity_id.filter(|_| honors_entity_id),
                entity_path: filter
                    .entity_username
                    .clone()
                    .filter(|_| scope == AuditScope::User),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use audex_domain::AuditScope;

    use super::{AuditFilter, build_scope_queries};

    #[test]
    fn recognized_entity_type_narrows_to_one_scope() {
        let filter = AuditFilter {
            entity_type: Some("Project".to_owned()),
            entity_id: Some(42),
            ..AuditFilter::default()
        };

        let queries = build_scope_queries(&filter);
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].scope, AuditScope::Project);
        assert_eq!(queries[0].entity_id, Some(42));
    }

    #[test]
    fn unrecognized_entity_type_targets_all_scopes() {
        let filter = AuditFilter {
            entity_type: Some("Pipeline".to_owned()),
            ..AuditFilter::default()
        };

        assert_eq!(build_scope_queries(&filter).len(), 4);
    }

    #[test]
    fn instance_scope_ignores_entity_predicates() {
        let filter = AuditFilter {
            entity_id: Some(7),
            entity_username: Some("alice".to_owned()),
            ..AuditFilter::default()
        };

        let queries = build_scope_queries(&filter);
        for query in &queries {
            match query.scope {
                AuditScope::Instance => {
                    assert_eq!(query.entity_id, None);
                    assert_eq!(query.entity_path, None);
                }
                AuditScope::User => {
                    assert_eq!(query.entity_id, Some(7));
                    assert_eq!(query.entity_path.as_deref(), Some("alice"));
                }
                AuditScope::Project | AuditScope::Group => {
                    assert_eq!(query.entity_id, Some(7));
                    assert_eq!(query.entity_path, None);
                }
            }
        }
    }
}
