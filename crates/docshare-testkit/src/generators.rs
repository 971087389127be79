//! Proptest generators for property-based testing.

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use docshare_core::{time, Cursor, DocumentFields, PermissionLevel, SortField};

/// Generate a random UUID.
pub fn uuid() -> impl Strategy<Value = Uuid> {
    any::<[u8; 16]>().prop_map(Uuid::from_bytes)
}

/// Generate a timestamp between 1970 and roughly 2100, at µs precision.
pub fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
    (0i64..=4_102_444_800_000_000i64).prop_filter_map("in range", |micros| {
        time::from_micros(micros).ok()
    })
}

/// Generate a SortField.
pub fn sort_field() -> impl Strategy<Value = SortField> {
    prop_oneof![Just(SortField::CreatedAt), Just(SortField::LastModifiedAt)]
}

/// Generate any valid cursor.
pub fn cursor() -> impl Strategy<Value = Cursor> {
    (sort_field(), timestamp(), uuid())
        .prop_map(|(sort, time, id)| Cursor::new(sort, time, id))
}

/// Generate a PermissionLevel.
pub fn level() -> impl Strategy<Value = PermissionLevel> {
    prop_oneof![
        Just(PermissionLevel::Owner),
        Just(PermissionLevel::Editor),
        Just(PermissionLevel::Viewer),
    ]
}

/// Generate a level a non-owner grant may use.
pub fn grantable_level() -> impl Strategy<Value = PermissionLevel> {
    prop_oneof![Just(PermissionLevel::Editor), Just(PermissionLevel::Viewer)]
}

/// Generate a non-empty level filter.
pub fn level_filter() -> impl Strategy<Value = Vec<PermissionLevel>> {
    prop::collection::vec(level(), 1..=3)
}

/// Generate document fields, each possibly absent.
pub fn document_fields() -> impl Strategy<Value = DocumentFields> {
    (
        prop::option::of("[A-Za-z0-9 ]{0,24}"),
        prop::option::of("[A-Za-z0-9 .,]{0,64}"),
    )
        .prop_map(|(name, description)| DocumentFields { name, description })
}

/// Parameters for a pagination run.
#[derive(Debug, Clone)]
pub struct PagingParams {
    /// Rows to create.
    pub rows: usize,
    pub page_size: u32,
    pub sort_field: SortField,
}

impl Arbitrary for PagingParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (0usize..=30, 1u32..=12, sort_field())
            .prop_map(|(rows, page_size, sort_field)| PagingParams {
                rows,
                page_size,
                sort_field,
            })
            .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_token_roundtrip(cursor in cursor()) {
            let token = cursor.to_token();
            prop_assert_eq!(Cursor::from_token(&token).unwrap(), cursor);
        }

        #[test]
        fn test_token_is_url_safe(cursor in cursor()) {
            let token = cursor.to_token();
            prop_assert!(token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }

        #[test]
        fn test_cursor_admits_is_strict(cursor in cursor()) {
            prop_assert!(!cursor.admits(&cursor.last_seen_time, &cursor.last_seen_id));
        }
    }
}
