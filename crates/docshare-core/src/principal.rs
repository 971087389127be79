//! Principals and permission levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{GuestId, PrincipalId, UserId};

/// An identity that can hold a permission on a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Principal {
    /// An authenticated user from the identity service.
    User(UserId),
    /// A guest minted for a single document's share link.
    Guest(GuestId),
}

impl Principal {
    /// The untyped principal id, as stored in `recipient_id`.
    pub fn id(&self) -> PrincipalId {
        match self {
            Principal::User(id) => (*id).into(),
            Principal::Guest(id) => (*id).into(),
        }
    }

    pub fn recipient_type(&self) -> RecipientType {
        match self {
            Principal::User(_) => RecipientType::User,
            Principal::Guest(_) => RecipientType::Guest,
        }
    }
}

impl From<UserId> for Principal {
    fn from(id: UserId) -> Self {
        Principal::User(id)
    }
}

impl From<GuestId> for Principal {
    fn from(id: GuestId) -> Self {
        Principal::Guest(id)
    }
}

/// Discriminator stored alongside a permission's recipient id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecipientType {
    User,
    Guest,
}

impl RecipientType {
    /// The persisted text form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RecipientType::User => "user",
            RecipientType::Guest => "guest",
        }
    }
}

impl fmt::Display for RecipientType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecipientType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(RecipientType::User),
            "guest" => Ok(RecipientType::Guest),
            other => Err(CoreError::UnknownRecipientType(other.to_string())),
        }
    }
}

/// Access level a principal holds on a document.
///
/// Ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PermissionLevel {
    Viewer,
    Editor,
    Owner,
}

impl PermissionLevel {
    /// Every level, least privileged first.
    pub const ALL: [PermissionLevel; 3] = [
        PermissionLevel::Viewer,
        PermissionLevel::Editor,
        PermissionLevel::Owner,
    ];

    /// The persisted text form.
    pub const fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::Viewer => "viewer",
            PermissionLevel::Editor => "editor",
            PermissionLevel::Owner => "owner",
        }
    }

    const fn bit(&self) -> u8 {
        match self {
            PermissionLevel::Viewer => 0b001,
            PermissionLevel::Editor => 0b010,
            PermissionLevel::Owner => 0b100,
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PermissionLevel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "viewer" => Ok(PermissionLevel::Viewer),
            "editor" => Ok(PermissionLevel::Editor),
            "owner" => Ok(PermissionLevel::Owner),
            other => Err(CoreError::UnknownPermissionLevel(other.to_string())),
        }
    }
}

/// Numeric form used by the transport layer (`0 = viewer`, `1 = editor`,
/// `2 = owner`).
impl TryFrom<i32> for PermissionLevel {
    type Error = CoreError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PermissionLevel::Viewer),
            1 => Ok(PermissionLevel::Editor),
            2 => Ok(PermissionLevel::Owner),
            other => Err(CoreError::UnknownPermissionLevel(other.to_string())),
        }
    }
}

/// A non-empty set of permission levels used to filter listings.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelFilter(u8);

impl LevelFilter {
    /// Build a filter from a slice of levels. Duplicates are ignored.
    ///
    /// Fails with [`CoreError::EmptyLevelFilter`] when `levels` is empty.
    pub fn new(levels: &[PermissionLevel]) -> Result<Self, CoreError> {
        let bits = levels.iter().fold(0u8, |acc, level| acc | level.bit());
        if bits == 0 {
            return Err(CoreError::EmptyLevelFilter);
        }
        Ok(Self(bits))
    }

    /// A filter admitting every level.
    pub fn all() -> Self {
        Self(0b111)
    }

    pub fn contains(&self, level: PermissionLevel) -> bool {
        self.0 & level.bit() != 0
    }

    /// The admitted levels, least privileged first.
    pub fn levels(&self) -> Vec<PermissionLevel> {
        PermissionLevel::ALL
            .into_iter()
            .filter(|level| self.contains(*level))
            .collect()
    }
}

impl fmt::Debug for LevelFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.levels()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_level_order() {
        assert!(PermissionLevel::Viewer < PermissionLevel::Editor);
        assert!(PermissionLevel::Editor < PermissionLevel::Owner);
    }

    #[test]
    fn test_level_text_roundtrip() {
        for level in PermissionLevel::ALL {
            assert_eq!(level.as_str().parse::<PermissionLevel>().unwrap(), level);
        }
        assert!("admin".parse::<PermissionLevel>().is_err());
    }

    #[test]
    fn test_level_from_i32() {
        assert_eq!(PermissionLevel::try_from(1).unwrap(), PermissionLevel::Editor);
        assert_eq!(
            PermissionLevel::try_from(3),
            Err(CoreError::UnknownPermissionLevel("3".into()))
        );
        assert!(PermissionLevel::try_from(-1).is_err());
    }

    #[test]
    fn test_empty_filter_rejected() {
        assert_eq!(LevelFilter::new(&[]), Err(CoreError::EmptyLevelFilter));
    }

    #[test]
    fn test_filter_membership() {
        let filter =
            LevelFilter::new(&[PermissionLevel::Owner, PermissionLevel::Owner]).unwrap();
        assert!(filter.contains(PermissionLevel::Owner));
        assert!(!filter.contains(PermissionLevel::Viewer));
        assert_eq!(filter.levels(), vec![PermissionLevel::Owner]);
        assert_eq!(LevelFilter::all().levels(), PermissionLevel::ALL.to_vec());
    }

    #[test]
    fn test_principal_accessors() {
        let uuid = Uuid::new_v4();
        let guest = Principal::from(GuestId(uuid));
        assert_eq!(guest.id(), PrincipalId(uuid));
        assert_eq!(guest.recipient_type(), RecipientType::Guest);
        assert_eq!(Principal::from(UserId(uuid)).recipient_type(), RecipientType::User);
    }
}
