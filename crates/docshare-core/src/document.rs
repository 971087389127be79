//! Document, permission, and guest records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::principal::{PermissionLevel, RecipientType};
use crate::types::{DocumentId, GuestId, PrincipalId};

/// Document metadata.
///
/// A document has no owner column; ownership is the permission row with
/// [`PermissionLevel::Owner`] created alongside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

/// A document together with the level a particular principal holds on it.
///
/// Item type of the documents-by-principal listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPermission {
    pub document: Document,
    pub level: PermissionLevel,
}

/// A permission row: one principal's access to one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub document_id: DocumentId,
    pub recipient_id: PrincipalId,
    pub recipient_type: RecipientType,
    pub level: PermissionLevel,
    /// Principal that created the row.
    pub created_by: PrincipalId,
    pub created_at: DateTime<Utc>,
    pub last_modified_at: DateTime<Utc>,
}

/// A guest principal, scoped to the document it was minted for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guest {
    pub id: GuestId,
    pub document_id: DocumentId,
    /// Principal that minted the guest.
    pub created_by: PrincipalId,
    pub created_at: DateTime<Utc>,
}

/// Optional document fields supplied on create and update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFields {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl DocumentFields {
    pub fn new(name: Option<&str>, description: Option<&str>) -> Self {
        Self {
            name: name.map(str::to_owned),
            description: description.map(str::to_owned),
        }
    }

    /// Fields with only a name set.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// True when neither field is present.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_builders() {
        let fields = DocumentFields::named("handbook").with_description("draft");
        assert_eq!(fields.name.as_deref(), Some("handbook"));
        assert_eq!(fields.description.as_deref(), Some("draft"));
        assert!(!fields.is_empty());
        assert!(DocumentFields::default().is_empty());
        assert!(DocumentFields::new(None, None).is_empty());
    }

    #[test]
    fn test_document_serializes_ids_as_strings() {
        let doc = Document {
            id: DocumentId::new_v4(),
            name: None,
            description: None,
            created_at: crate::time::now(),
            last_modified_at: crate::time::now(),
        };
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["id"], serde_json::Value::String(doc.id.to_string()));
    }
}
