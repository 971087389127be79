//! Keyset page queries.
//!
//! Both listings and both sort fields share one query shape. An [`OrderKey`]
//! picks the timestamp and tie-break columns for a [`ScanTarget`] and
//! [`SortField`]; [`KeysetQuery`] renders the page predicate against them.

use docshare_core::{Cursor, LevelFilter, PageSize, PermissionLevel, SortField};
use rusqlite::types::Value;
use rusqlite::ParamsFromIter;

use crate::error::Result;

/// Which rows a listing walks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScanTarget {
    /// Documents a principal holds a permission on, keyed by document.
    DocumentsByPrincipal,
    /// Permission rows of one document, keyed by recipient.
    PermissionsOnDocument,
}

impl ScanTarget {
    fn select(&self) -> &'static str {
        match self {
            ScanTarget::DocumentsByPrincipal => {
                "SELECT d.id AS id, d.name AS name, d.description AS description, \
                 d.created_at AS created_at, d.last_modified_at AS last_modified_at, \
                 p.permission_level AS permission_level \
                 FROM permissions p JOIN documents d ON d.id = p.document_id"
            }
            ScanTarget::PermissionsOnDocument => {
                "SELECT p.document_id AS document_id, p.recipient_id AS recipient_id, \
                 p.recipient_type AS recipient_type, p.permission_level AS permission_level, \
                 p.created_by AS created_by, p.created_at AS created_at, \
                 p.last_modified_at AS last_modified_at \
                 FROM permissions p"
            }
        }
    }

    /// Column the listing is scoped by.
    fn scope_column(&self) -> &'static str {
        match self {
            ScanTarget::DocumentsByPrincipal => "p.recipient_id",
            ScanTarget::PermissionsOnDocument => "p.document_id",
        }
    }
}

/// The `(time, id)` columns a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct OrderKey {
    pub time_column: &'static str,
    pub id_column: &'static str,
}

impl OrderKey {
    pub(crate) fn new(target: ScanTarget, sort: SortField) -> Self {
        match (target, sort) {
            (ScanTarget::DocumentsByPrincipal, SortField::CreatedAt) => Self {
                time_column: "d.created_at",
                id_column: "d.id",
            },
            (ScanTarget::DocumentsByPrincipal, SortField::LastModifiedAt) => Self {
                time_column: "d.last_modified_at",
                id_column: "d.id",
            },
            (ScanTarget::PermissionsOnDocument, SortField::CreatedAt) => Self {
                time_column: "p.created_at",
                id_column: "p.recipient_id",
            },
            (ScanTarget::PermissionsOnDocument, SortField::LastModifiedAt) => Self {
                time_column: "p.last_modified_at",
                id_column: "p.recipient_id",
            },
        }
    }
}

/// Validate listing arguments that do not depend on stored state.
pub(crate) fn validate(levels: &[PermissionLevel], page_size: u32) -> Result<(LevelFilter, PageSize)> {
    let filter = LevelFilter::new(levels)?;
    let size = PageSize::new(page_size)?;
    Ok((filter, size))
}

/// One rendered page query.
#[derive(Debug)]
pub(crate) struct KeysetQuery {
    sql: String,
    params: Vec<Value>,
}

impl KeysetQuery {
    pub(crate) fn new(
        target: ScanTarget,
        scope: &[u8; 16],
        levels: &LevelFilter,
        cursor: &Cursor,
        size: PageSize,
    ) -> Self {
        let key = OrderKey::new(target, cursor.sort_field);
        let level_values = levels.levels();
        let placeholders = vec!["?"; level_values.len()].join(", ");

        let sql = format!(
            "{select} WHERE {scope} = ? AND p.permission_level IN ({placeholders}) \
             AND ({time} < ? OR ({time} = ? AND {id} < ?)) \
             ORDER BY {time} DESC, {id} DESC LIMIT ?",
            select = target.select(),
            scope = target.scope_column(),
            placeholders = placeholders,
            time = key.time_column,
            id = key.id_column,
        );

        let micros = docshare_core::time::to_micros(&cursor.last_seen_time);
        let mut params = Vec::with_capacity(level_values.len() + 5);
        params.push(Value::Blob(scope.to_vec()));
        params.extend(level_values.iter().map(|l| Value::Text(l.as_str().to_string())));
        params.push(Value::Integer(micros));
        params.push(Value::Integer(micros));
        params.push(Value::Blob(cursor.last_seen_id.as_bytes().to_vec()));
        params.push(Value::Integer(i64::from(size.get())));

        Self { sql, params }
    }

    pub(crate) fn sql(&self) -> &str {
        &self.sql
    }

    pub(crate) fn params(&self) -> ParamsFromIter<std::slice::Iter<'_, Value>> {
        rusqlite::params_from_iter(self.params.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use docshare_core::MAX_UUID;

    #[test]
    fn test_order_key_columns() {
        let key = OrderKey::new(ScanTarget::PermissionsOnDocument, SortField::LastModifiedAt);
        assert_eq!(key.time_column, "p.last_modified_at");
        assert_eq!(key.id_column, "p.recipient_id");

        let key = OrderKey::new(ScanTarget::DocumentsByPrincipal, SortField::CreatedAt);
        assert_eq!(key.time_column, "d.created_at");
        assert_eq!(key.id_column, "d.id");
    }

    #[test]
    fn test_validate_rejects_empty_levels_and_zero_size() {
        assert_eq!(validate(&[], 10).unwrap_err().kind(), ErrorKind::InvalidInput);
        assert_eq!(
            validate(&[PermissionLevel::Viewer], 0).unwrap_err().kind(),
            ErrorKind::InvalidInput
        );
        let (filter, size) = validate(&PermissionLevel::ALL, 5).unwrap();
        assert!(filter.contains(PermissionLevel::Owner));
        assert_eq!(size.get(), 5);
    }

    #[test]
    fn test_query_binds_one_param_per_placeholder() {
        let filter = LevelFilter::new(&[PermissionLevel::Viewer, PermissionLevel::Editor]).unwrap();
        let cursor = Cursor::beginning(SortField::LastModifiedAt);
        let query = KeysetQuery::new(
            ScanTarget::DocumentsByPrincipal,
            &[7; 16],
            &filter,
            &cursor,
            PageSize::new(10).unwrap(),
        );

        let placeholders = query.sql().matches('?').count();
        assert_eq!(placeholders, query.params.len());
        assert!(query
            .sql()
            .contains("ORDER BY d.last_modified_at DESC, d.id DESC"));
        assert_eq!(
            query.params[query.params.len() - 2],
            Value::Blob(MAX_UUID.as_bytes().to_vec())
        );
    }

    fn query_plan(target: ScanTarget, sort: SortField) -> Vec<String> {
        let mut conn = rusqlite::Connection::open_in_memory().unwrap();
        crate::migration::migrate(&mut conn).unwrap();

        let query = KeysetQuery::new(
            target,
            &[7; 16],
            &LevelFilter::new(&PermissionLevel::ALL).unwrap(),
            &Cursor::beginning(sort),
            PageSize::new(10).unwrap(),
        );
        let mut stmt = conn
            .prepare(&format!("EXPLAIN QUERY PLAN {}", query.sql()))
            .unwrap();
        let details = stmt
            .query_map(query.params(), |row| row.get::<_, String>(3))
            .unwrap()
            .collect::<rusqlite::Result<Vec<_>>>()
            .unwrap();
        details
    }

    #[test]
    fn test_listings_never_scan_all_permissions() {
        for sort in [SortField::CreatedAt, SortField::LastModifiedAt] {
            let plan = query_plan(ScanTarget::DocumentsByPrincipal, sort);
            assert!(
                plan.iter()
                    .any(|step| step.starts_with("SEARCH p") && step.contains("recipient_id=?")),
                "{:?}",
                plan
            );
            assert!(!plan.iter().any(|step| step.starts_with("SCAN p")), "{:?}", plan);

            let plan = query_plan(ScanTarget::PermissionsOnDocument, sort);
            assert!(
                plan.iter()
                    .any(|step| step.starts_with("SEARCH p") && step.contains("document_id=?")),
                "{:?}",
                plan
            );
            assert!(!plan.iter().any(|step| step.starts_with("SCAN p")), "{:?}", plan);
        }
    }
}
