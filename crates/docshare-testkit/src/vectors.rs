//! Golden cursor token vectors.
//!
//! Cursor tokens are handed to clients and come back on later requests,
//! possibly to a different build. These vectors pin the token encoding byte
//! for byte.

use docshare_core::{time, Cursor, SortField};
use uuid::Uuid;

/// A golden cursor vector.
#[derive(Debug, Clone)]
pub struct CursorVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub sort_field: SortField,
    /// Last seen time, µs since the Unix epoch.
    pub micros: i64,
    pub id: [u8; 16],
    /// Expected `Cursor::to_bytes` output (hex).
    pub expected_hex: &'static str,
    /// Expected `Cursor::to_token` output.
    pub expected_token: &'static str,
}

/// Get all golden cursor vectors.
pub fn all_vectors() -> Vec<CursorVector> {
    vec![
        CursorVector {
            name: "epoch with nil id",
            sort_field: SortField::CreatedAt,
            micros: 0,
            id: [0x00; 16],
            expected_hex: "0100000000000000000000000000000000000000000000000000",
            expected_token: "AQAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA",
        },
        CursorVector {
            name: "last modified at 2025-01-14T16:00:00Z",
            sort_field: SortField::LastModifiedAt,
            micros: 1_736_870_400_000_000,
            id: [0x42; 16],
            expected_hex: "010100062baca736800042424242424242424242424242424242",
            expected_token: "AQEABiuspzaAAEJCQkJCQkJCQkJCQkJCQkI",
        },
        CursorVector {
            name: "pre-epoch with max id",
            sort_field: SortField::CreatedAt,
            micros: -1,
            id: [0xff; 16],
            expected_hex: "0100ffffffffffffffffffffffffffffffffffffffffffffffff",
            expected_token: "AQD_______________________________8",
        },
        CursorVector {
            name: "sub-second time",
            sort_field: SortField::LastModifiedAt,
            micros: 1_700_000_000_123_456,
            id: [
                0x01, 0x23, 0x45, 0x67, 0x89, 0xab, 0xcd, 0xef, 0x01, 0x23, 0x45, 0x67, 0x89, 0xab,
                0xcd, 0xef,
            ],
            expected_hex: "010100060a24182022400123456789abcdef0123456789abcdef",
            expected_token: "AQEABgokGCAiQAEjRWeJq83vASNFZ4mrze8",
        },
    ]
}

/// Build the cursor a vector describes.
pub fn cursor_from_vector(vector: &CursorVector) -> Cursor {
    let last_seen_time = match time::from_micros(vector.micros) {
        Ok(ts) => ts,
        Err(e) => panic!("vector '{}' has an invalid time: {}", vector.name, e),
    };
    Cursor::new(vector.sort_field, last_seen_time, Uuid::from_bytes(vector.id))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Encode every vector and compare against the pinned output.
///
/// Returns `(name, matches, token)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let cursor = cursor_from_vector(v);
            let token = cursor.to_token();
            let matches =
                to_hex(&cursor.to_bytes()) == v.expected_hex && token == v.expected_token;
            (v.name.to_string(), matches, token)
        })
        .collect()
}
