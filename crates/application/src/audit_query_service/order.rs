use std::cmp::Ordering;

use audex_core::{AppError, AppResult};
use audex_domain::SortOrder;

use crate::audit_ports::{CandidateRow, CursorPosition};
use crate::audit_query_service::filter::ScopeQuery;

/// Columns a candidate ordering may reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderColumn {
    /// Event creation time.
    CreatedAt,
    /// Per-scope primary key, the unique tie-breaker.
    Id,
}

/// Ordering direction for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderDirection {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

/// Deterministic total order over candidate rows. The primary key is always
/// present as the final column, so no two distinct rows of one scope ever
/// compare equal; cursor resumption depends on this.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TotalOrder {
    columns: Vec<(OrderColumn, OrderDirection)>,
}

impl TotalOrder {
    /// Builds a total order from a natural ordering, appending the primary
    /// key tie-breaker when absent. Fails when no deterministic order can
    /// be formed; that is a programming error and must abort the request.
    pub fn try_new(natural: Vec<(OrderColumn, OrderDirection)>) -> AppResult<Self> {
        if natural.is_empty() {
            return Err(AppError::OrderConstruction(
                "at least one order column is required".to_owned(),
            ));
        }

        for (index, (column, direction)) in natural.iter().enumerate() {
            let conflicting = natural[index + 1..]
                .iter()
                .any(|(other, other_direction)| other == column && other_direction != direction);
            if conflicting {
                return Err(AppError::OrderConstruction(format!(
                    "conflicting directions for order column {column:?}"
                )));
            }
        }

        let mut columns = natural;
        if !columns.iter().any(|(column, _)| *column == OrderColumn::Id) {
            let last_direction = columns
                .last()
                .map(|(_, direction)| *direction)
                .unwrap_or(OrderDirection::Desc);
            columns.push((OrderColumn::Id, last_direction));
        }

        Ok(Self { columns })
    }

    /// The keyset order: creation time descending, id descending.
    pub fn keyset() -> AppResult<Self> {
        Self::try_new(vec![(OrderColumn::CreatedAt, OrderDirection::Desc)])
    }

    /// The offset order: strictly by id in the requested direction.
    pub fn by_id(sort: SortOrder) -> AppResult<Self> {
        let direction = match sort {
            SortOrder::CreatedAsc => OrderDirection::Asc,
            SortOrder::CreatedDesc => OrderDirection::Desc,
        };

        Self::try_new(vec![(OrderColumn::Id, direction)])
    }

    /// Returns the ordered column list, tie-breaker included.
    #[must_use]
    pub fn columns(&self) -> &[(OrderColumn, OrderDirection)] {
        &self.columns
    }

    /// Compares two candidate rows; `Less` means `left` is presented first.
    #[must_use]
    pub fn compare(&self, left: &CandidateRow, right: &CandidateRow) -> Ordering {
        for (column, direction) in &self.columns {
            let ordering = match column {
                OrderColumn::CreatedAt => left.created_at.cmp(&right.created_at),
                OrderColumn::Id => left.id.cmp(&right.id),
            };
            let ordering = match direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            };

            if ordering != Ordering::Equal {
                return ordering;
            }
        }

        Ordering::Equal
    }

    /// Returns whether `row` lies strictly after the cursor position in
    /// presentation order. The comparison is derived from the column list,
    /// never hand-written per scope.
    #[must_use]
    pub fn admits_after(&self, row: &CandidateRow, cursor: &CursorPosition) -> bool {
        let cursor_row = CandidateRow {
            scope: row.scope,
            id: cursor.id,
            created_at: Some(cursor.created_at),
        };

        self.compare(row, &cursor_row) == Ordering::Greater
    }
}

/// A scope query carrying its total order, ready for union execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedScopeQuery {
    /// The filtered query descriptor.
    pub query: ScopeQuery,
    /// Total order shared by every scope in the union.
    pub order: TotalOrder,
}
