//! Row mappers.
//!
//! Ids are 16-byte BLOBs read through rusqlite's `uuid` support. Timestamps are
//! INTEGER microseconds. Enum columns hold their lowercase text form.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use docshare_core::{
    time, Document, DocumentId, DocumentPermission, Guest, GuestId, Permission, PermissionLevel,
    PrincipalId, RecipientType,
};
use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

/// A conversion failure on `column`, or the lookup error if the row has no
/// such column.
fn conversion(row: &Row<'_>, column: &str, ty: Type, err: docshare_core::CoreError) -> rusqlite::Error {
    match row.as_ref().column_index(column) {
        Ok(index) => rusqlite::Error::FromSqlConversionFailure(index, ty, Box::new(err)),
        Err(lookup) => lookup,
    }
}

fn timestamp(row: &Row<'_>, column: &str) -> rusqlite::Result<DateTime<Utc>> {
    let micros: i64 = row.get(column)?;
    time::from_micros(micros).map_err(|e| conversion(row, column, Type::Integer, e))
}

fn text_enum<T>(row: &Row<'_>, column: &str) -> rusqlite::Result<T>
where
    T: FromStr<Err = docshare_core::CoreError>,
{
    let text: String = row.get(column)?;
    text.parse().map_err(|e| conversion(row, column, Type::Text, e))
}

pub(crate) fn document(row: &Row<'_>) -> rusqlite::Result<Document> {
    Ok(Document {
        id: DocumentId(row.get::<_, Uuid>("id")?),
        name: row.get("name")?,
        description: row.get("description")?,
        created_at: timestamp(row, "created_at")?,
        last_modified_at: timestamp(row, "last_modified_at")?,
    })
}

/// A document joined with one principal's `permission_level`.
pub(crate) fn document_permission(row: &Row<'_>) -> rusqlite::Result<DocumentPermission> {
    Ok(DocumentPermission {
        document: document(row)?,
        level: text_enum::<PermissionLevel>(row, "permission_level")?,
    })
}

pub(crate) fn permission(row: &Row<'_>) -> rusqlite::Result<Permission> {
    Ok(Permission {
        document_id: DocumentId(row.get::<_, Uuid>("document_id")?),
        recipient_id: PrincipalId(row.get::<_, Uuid>("recipient_id")?),
        recipient_type: text_enum::<RecipientType>(row, "recipient_type")?,
        level: text_enum::<PermissionLevel>(row, "permission_level")?,
        created_by: PrincipalId(row.get::<_, Uuid>("created_by")?),
        created_at: timestamp(row, "created_at")?,
        last_modified_at: timestamp(row, "last_modified_at")?,
    })
}

pub(crate) fn guest(row: &Row<'_>) -> rusqlite::Result<Guest> {
    Ok(Guest {
        id: GuestId(row.get::<_, Uuid>("id")?),
        document_id: DocumentId(row.get::<_, Uuid>("document_id")?),
        created_by: PrincipalId(row.get::<_, Uuid>("created_by")?),
        created_at: timestamp(row, "created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_permission_row_decodes() {
        let conn = Connection::open_in_memory().unwrap();
        let recipient = Uuid::new_v4();
        let perm = conn
            .query_row(
                "SELECT ?1 AS document_id, ?2 AS recipient_id, 'guest' AS recipient_type, \
                 'editor' AS permission_level, ?2 AS created_by, 5 AS created_at, \
                 7 AS last_modified_at",
                rusqlite::params![Uuid::nil(), recipient],
                permission,
            )
            .unwrap();

        assert_eq!(perm.recipient_id, PrincipalId(recipient));
        assert_eq!(perm.recipient_type, RecipientType::Guest);
        assert_eq!(perm.level, PermissionLevel::Editor);
        assert_eq!(time::to_micros(&perm.last_modified_at), 7);
    }

    #[test]
    fn test_unknown_level_is_conversion_error() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .query_row(
                "SELECT ?1 AS id, NULL AS name, NULL AS description, 0 AS created_at, \
                 0 AS last_modified_at, 'admin' AS permission_level",
                [Uuid::nil()],
                document_permission,
            )
            .unwrap_err();
        assert!(matches!(
            err,
            rusqlite::Error::FromSqlConversionFailure(5, Type::Text, _)
        ));
    }

    #[test]
    fn test_conversion_on_missing_column_reports_the_column() {
        let conn = Connection::open_in_memory().unwrap();
        let err = conn
            .query_row("SELECT 'bogus' AS permission_level", [], |row| {
                Err::<(), _>(conversion(
                    row,
                    "recipient_type",
                    Type::Text,
                    docshare_core::CoreError::UnknownRecipientType("bogus".into()),
                ))
            })
            .unwrap_err();
        assert!(
            matches!(err, rusqlite::Error::InvalidColumnName(ref name) if name == "recipient_type"),
            "got {:?}",
            err
        );

        let err = conn
            .query_row("SELECT 'bogus' AS permission_level", [], |row| {
                Err::<(), _>(conversion(
                    row,
                    "permission_level",
                    Type::Text,
                    docshare_core::CoreError::UnknownPermissionLevel("bogus".into()),
                ))
            })
            .unwrap_err();
        assert!(matches!(
            err,
            rusqlite::Error::FromSqlConversionFailure(0, Type::Text, _)
        ));
    }
}
