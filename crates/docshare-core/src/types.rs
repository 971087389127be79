//! Strong identifier types.
//!
//! Every identifier is a newtype over a UUID so that a document id can never be
//! passed where a principal id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Generate a fresh random (v4) identifier.
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The wrapped UUID.
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Raw big-endian bytes, the persisted and wire form.
            pub const fn as_bytes(&self) -> &[u8; 16] {
                self.0.as_bytes()
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

uuid_newtype!(
    /// Identifier of a document row.
    DocumentId
);

uuid_newtype!(
    /// Identifier of a user. Users live in the external identity service and
    /// are only referenced here.
    UserId
);

uuid_newtype!(
    /// Identifier of a guest principal minted by this store.
    GuestId
);

uuid_newtype!(
    /// Identifier of any principal that can hold a permission, user or guest.
    ///
    /// This is the `recipient_id` column of a permission row and the id
    /// component of a cursor over permissions.
    PrincipalId
);

impl From<UserId> for PrincipalId {
    fn from(id: UserId) -> Self {
        Self(id.0)
    }
}

impl From<GuestId> for PrincipalId {
    fn from(id: GuestId) -> Self {
        Self(id.0)
    }
}

/// The largest possible UUID (all bits set).
///
/// Beginning cursors pair this with the current time so that every existing row
/// sorts strictly after the starting position.
pub const MAX_UUID: Uuid = Uuid::from_bytes([0xff; 16]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_roundtrip() {
        let id = DocumentId::new_v4();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_debug_names_the_type() {
        let id = GuestId::from_uuid(Uuid::nil());
        assert_eq!(
            format!("{:?}", id),
            "GuestId(00000000-0000-0000-0000-000000000000)"
        );
    }

    #[test]
    fn test_principal_from_user_and_guest() {
        let uuid = Uuid::new_v4();
        assert_eq!(PrincipalId::from(UserId(uuid)).0, uuid);
        assert_eq!(PrincipalId::from(GuestId(uuid)).0, uuid);
    }

    #[test]
    fn test_max_uuid_sorts_last() {
        let id = Uuid::new_v4();
        assert!(id < MAX_UUID);
        assert!(MAX_UUID.as_bytes().iter().all(|b| *b == 0xff));
    }
}
