//! Keyset pagination cursors.
//!
//! A listing is a strict total order over rows by `(sort value DESC, id DESC)`.
//! A [`Cursor`] is the last position a client has seen in that order; the next
//! page holds the rows strictly after it:
//!
//! ```text
//! sort < cursor.time  OR  (sort = cursor.time AND id < cursor.id)
//! ```
//!
//! The cursor is plain client-held data; nothing about it lives on the server.
//!
//! ## Miss-forward
//!
//! Traversal only moves backward in time from the captured position. A row
//! created (or, for `LastModifiedAt`, touched) after the cursor was issued
//! sorts before the cursor and is never returned when resuming from it. Rows
//! already passed are never repeated, because the comparison uses the frozen
//! cursor values rather than an offset. Clients that want fresh rows start a
//! new traversal from [`Cursor::beginning`].
//!
//! ## Token format
//!
//! [`Cursor::to_bytes`] is a fixed 26-byte layout:
//!
//! | offset | size | field |
//! |---|---|---|
//! | 0 | 1 | format version (`1`) |
//! | 1 | 1 | sort field (`0` created_at, `1` last_modified_at) |
//! | 2 | 8 | last seen time, µs since epoch, big-endian `i64` |
//! | 10 | 16 | last seen id |
//!
//! [`Cursor::to_token`] is the URL-safe, unpadded base64 of those bytes.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{DocumentPermission, Permission};
use crate::error::CoreError;
use crate::time;
use crate::types::MAX_UUID;

/// Cursor token format version.
pub const CURSOR_VERSION: u8 = 1;

/// Length of [`Cursor::to_bytes`] output.
pub const CURSOR_LEN: usize = 26;

/// Which timestamp a listing is ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    CreatedAt,
    LastModifiedAt,
}

impl SortField {
    pub const fn to_u8(self) -> u8 {
        match self {
            SortField::CreatedAt => 0,
            SortField::LastModifiedAt => 1,
        }
    }

    pub fn from_u8(value: u8) -> Result<Self, CoreError> {
        match value {
            0 => Ok(SortField::CreatedAt),
            1 => Ok(SortField::LastModifiedAt),
            other => Err(CoreError::UnknownSortField(other)),
        }
    }
}

/// A resumable position in a descending `(time, id)` order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cursor {
    pub sort_field: SortField,
    pub last_seen_time: DateTime<Utc>,
    pub last_seen_id: Uuid,
}

impl Cursor {
    pub fn new(sort_field: SortField, last_seen_time: DateTime<Utc>, last_seen_id: Uuid) -> Self {
        Self {
            sort_field,
            last_seen_time,
            last_seen_id,
        }
    }

    /// A cursor positioned before the newest row: now, with the maximum id.
    pub fn beginning(sort_field: SortField) -> Self {
        Self::new(sort_field, time::now(), MAX_UUID)
    }

    /// True when a row with this key lies strictly after the cursor.
    pub fn admits(&self, row_time: &DateTime<Utc>, row_id: &Uuid) -> bool {
        *row_time < self.last_seen_time
            || (*row_time == self.last_seen_time && *row_id < self.last_seen_id)
    }

    /// The cursor to hand back after returning `page`.
    ///
    /// Positioned at the last row of the page, or unchanged when the page is
    /// empty. An empty page, not cursor equality, signals the end.
    pub fn advance<T: Keyed>(&self, page: &[T]) -> Cursor {
        match page.last() {
            Some(last) => {
                let (time, id) = last.order_key(self.sort_field);
                Cursor::new(self.sort_field, time, id)
            }
            None => *self,
        }
    }

    pub fn to_bytes(&self) -> [u8; CURSOR_LEN] {
        let mut out = [0u8; CURSOR_LEN];
        out[0] = CURSOR_VERSION;
        out[1] = self.sort_field.to_u8();
        out[2..10].copy_from_slice(&time::to_micros(&self.last_seen_time).to_be_bytes());
        out[10..26].copy_from_slice(self.last_seen_id.as_bytes());
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CoreError> {
        if bytes.len() != CURSOR_LEN {
            return Err(CoreError::MalformedCursor(format!(
                "expected {} bytes, got {}",
                CURSOR_LEN,
                bytes.len()
            )));
        }
        if bytes[0] != CURSOR_VERSION {
            return Err(CoreError::MalformedCursor(format!(
                "unsupported version {}",
                bytes[0]
            )));
        }
        let sort_field = SortField::from_u8(bytes[1])
            .map_err(|e| CoreError::MalformedCursor(e.to_string()))?;

        let mut micros = [0u8; 8];
        micros.copy_from_slice(&bytes[2..10]);
        let last_seen_time = time::from_micros(i64::from_be_bytes(micros))
            .map_err(|e| CoreError::MalformedCursor(e.to_string()))?;

        let mut id = [0u8; 16];
        id.copy_from_slice(&bytes[10..26]);

        Ok(Self::new(sort_field, last_seen_time, Uuid::from_bytes(id)))
    }

    /// Opaque URL-safe token for clients.
    pub fn to_token(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.to_bytes())
    }

    pub fn from_token(token: &str) -> Result<Self, CoreError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token)
            .map_err(|e| CoreError::MalformedCursor(e.to_string()))?;
        Self::from_bytes(&bytes)
    }
}

/// Rows that can be positioned in a keyset order.
///
/// Implementations pick the timestamp selected by the sort field and the id
/// that breaks ties between equal timestamps.
pub trait Keyed {
    fn order_key(&self, sort_field: SortField) -> (DateTime<Utc>, Uuid);
}

impl Keyed for DocumentPermission {
    fn order_key(&self, sort_field: SortField) -> (DateTime<Utc>, Uuid) {
        let time = match sort_field {
            SortField::CreatedAt => self.document.created_at,
            SortField::LastModifiedAt => self.document.last_modified_at,
        };
        (time, self.document.id.0)
    }
}

impl Keyed for Permission {
    fn order_key(&self, sort_field: SortField) -> (DateTime<Utc>, Uuid) {
        let time = match sort_field {
            SortField::CreatedAt => self.created_at,
            SortField::LastModifiedAt => self.last_modified_at,
        };
        (time, self.recipient_id.0)
    }
}

/// Validated page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageSize(u32);

impl PageSize {
    pub fn new(size: u32) -> Result<Self, CoreError> {
        if size == 0 {
            return Err(CoreError::ZeroPageSize);
        }
        Ok(Self(size))
    }

    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// One page of a keyset listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Position to resume from. Equals the request cursor when `items` is empty.
    pub next_cursor: Cursor,
}

impl<T: Keyed> Page<T> {
    /// Build a page and derive its resume cursor from the request cursor.
    pub fn from_items(items: Vec<T>, request: &Cursor) -> Self {
        let next_cursor = request.advance(&items);
        Self { items, next_cursor }
    }
}

impl<T> Page<T> {
    /// True once the listing is exhausted.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::principal::{PermissionLevel, RecipientType};
    use crate::types::{DocumentId, PrincipalId};
    use proptest::prelude::*;

    fn ts(micros: i64) -> DateTime<Utc> {
        time::from_micros(micros).unwrap()
    }

    fn doc_perm(created: i64, modified: i64, id: Uuid) -> DocumentPermission {
        DocumentPermission {
            document: Document {
                id: DocumentId(id),
                name: None,
                description: None,
                created_at: ts(created),
                last_modified_at: ts(modified),
            },
            level: PermissionLevel::Owner,
        }
    }

    #[test]
    fn test_admits_strictly_after() {
        let id = Uuid::from_bytes([0x80; 16]);
        let cursor = Cursor::new(SortField::CreatedAt, ts(1_000), id);

        assert!(cursor.admits(&ts(999), &MAX_UUID));
        assert!(cursor.admits(&ts(1_000), &Uuid::from_bytes([0x7f; 16])));
        assert!(!cursor.admits(&ts(1_000), &id));
        assert!(!cursor.admits(&ts(1_000), &Uuid::from_bytes([0x81; 16])));
        assert!(!cursor.admits(&ts(1_001), &Uuid::nil()));
    }

    #[test]
    fn test_beginning_admits_everything_older() {
        let cursor = Cursor::beginning(SortField::LastModifiedAt);
        assert_eq!(cursor.last_seen_id, MAX_UUID);
        assert!(cursor.admits(&ts(0), &Uuid::new_v4()));
    }

    #[test]
    fn test_advance_uses_selected_sort_field() {
        let last = Uuid::from_bytes([1; 16]);
        let page = vec![doc_perm(50, 90, Uuid::from_bytes([2; 16])), doc_perm(40, 80, last)];

        let by_created = Cursor::beginning(SortField::CreatedAt).advance(&page);
        assert_eq!(by_created.last_seen_time, ts(40));
        assert_eq!(by_created.last_seen_id, last);

        let by_modified = Cursor::beginning(SortField::LastModifiedAt).advance(&page);
        assert_eq!(by_modified.last_seen_time, ts(80));
        assert_eq!(by_modified.sort_field, SortField::LastModifiedAt);
    }

    #[test]
    fn test_advance_on_empty_page_echoes_input() {
        let cursor = Cursor::new(SortField::CreatedAt, ts(7), Uuid::from_bytes([3; 16]));
        let page: Page<DocumentPermission> = Page::from_items(vec![], &cursor);
        assert!(page.is_empty());
        assert_eq!(page.next_cursor, cursor);
    }

    #[test]
    fn test_permission_key_uses_recipient() {
        let recipient = PrincipalId::new_v4();
        let perm = Permission {
            document_id: DocumentId::new_v4(),
            recipient_id: recipient,
            recipient_type: RecipientType::User,
            level: PermissionLevel::Viewer,
            created_by: recipient,
            created_at: ts(10),
            last_modified_at: ts(20),
        };
        assert_eq!(perm.order_key(SortField::CreatedAt), (ts(10), recipient.0));
        assert_eq!(perm.order_key(SortField::LastModifiedAt), (ts(20), recipient.0));
    }

    #[test]
    fn test_bytes_layout() {
        let cursor = Cursor::new(SortField::LastModifiedAt, ts(1), Uuid::from_bytes([0xab; 16]));
        let bytes = cursor.to_bytes();
        assert_eq!(bytes[0], CURSOR_VERSION);
        assert_eq!(bytes[1], 1);
        assert_eq!(&bytes[2..10], &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(&bytes[10..], &[0xab; 16]);
    }

    #[test]
    fn test_rejects_malformed_tokens() {
        assert!(matches!(
            Cursor::from_token("not base64!"),
            Err(CoreError::MalformedCursor(_))
        ));
        assert!(matches!(
            Cursor::from_bytes(&[1u8; 10]),
            Err(CoreError::MalformedCursor(_))
        ));

        let mut bytes = Cursor::beginning(SortField::CreatedAt).to_bytes();
        bytes[0] = 9;
        assert!(Cursor::from_bytes(&bytes).is_err());

        let mut bytes = Cursor::beginning(SortField::CreatedAt).to_bytes();
        bytes[1] = 2;
        assert!(Cursor::from_bytes(&bytes).is_err());

        let mut bytes = Cursor::beginning(SortField::CreatedAt).to_bytes();
        bytes[2..10].copy_from_slice(&i64::MAX.to_be_bytes());
        assert!(Cursor::from_bytes(&bytes).is_err());
    }

    #[test]
    fn test_page_size() {
        assert_eq!(PageSize::new(0), Err(CoreError::ZeroPageSize));
        assert_eq!(PageSize::new(10).unwrap().get(), 10);
    }

    fn any_cursor() -> impl Strategy<Value = Cursor> {
        // roughly +/- 190,000 years, inside chrono's representable range
        let micros = -6_000_000_000_000_000_000i64..=6_000_000_000_000_000_000i64;
        (any::<bool>(), micros, any::<[u8; 16]>()).prop_map(|(modified, micros, id)| {
            let sort = if modified {
                SortField::LastModifiedAt
            } else {
                SortField::CreatedAt
            };
            Cursor::new(sort, ts(micros), Uuid::from_bytes(id))
        })
    }

    proptest! {
        #[test]
        fn token_roundtrip_is_identity(cursor in any_cursor()) {
            let decoded = Cursor::from_token(&cursor.to_token()).unwrap();
            prop_assert_eq!(decoded, cursor);
            prop_assert_eq!(decoded.to_bytes(), cursor.to_bytes());
        }
    }
}
