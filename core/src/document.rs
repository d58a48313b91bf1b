//! Schema-less document model.
//!
//! The back-office persists every entity as a schema-less document inside a
//! named collection. Documents are identified by an opaque id and carry a
//! server-assigned creation timestamp. Typed domain records are decoded from
//! documents at the store boundary, never inside handlers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Opaque identifier of a document within a collection.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Creates a new random id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wraps an existing id string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

/// The named collections this service operates on.
///
/// A closed enumeration rather than free-form strings: every caller names
/// its collection at compile time, and the store maps each variant to the
/// physical collection name used by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    /// Room bookings (the original `bookings` collection).
    Bookings,
    /// Restaurant table bookings.
    RestaurantBookings,
    /// Airport shuttle bookings.
    ShuttleBookings,
    /// Room catalog.
    Rooms,
    /// Event hall catalog.
    Halls,
    /// Restaurant menu items.
    RestaurantMenu,
    /// Bar menu items.
    BarMenu,
    /// Experiences / events.
    Experiences,
    /// Staff-facing notifications.
    Notifications,
    /// User profiles (role, member status).
    Users,
}

impl Collection {
    /// All collections, in a stable order.
    pub const ALL: [Self; 10] = [
        Self::Bookings,
        Self::RestaurantBookings,
        Self::ShuttleBookings,
        Self::Rooms,
        Self::Halls,
        Self::RestaurantMenu,
        Self::BarMenu,
        Self::Experiences,
        Self::Notifications,
        Self::Users,
    ];

    /// Physical collection name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bookings => "bookings",
            Self::RestaurantBookings => "restaurant_bookings",
            Self::ShuttleBookings => "shuttle_bookings",
            Self::Rooms => "rooms",
            Self::Halls => "halls",
            Self::RestaurantMenu => "restaurant_menu",
            Self::BarMenu => "bar_menu",
            Self::Experiences => "experiences",
            Self::Notifications => "notifications",
            Self::Users => "users",
        }
    }

    /// Parses a physical collection name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.as_str() == name)
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A schema-less record.
///
/// `fields` holds the raw JSON object as stored; `created_at` is the
/// server-assigned timestamp (absent for documents written before the
/// timestamp was introduced — they sort last in descending views).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Opaque identifier within the collection.
    pub id: DocumentId,
    /// Raw field map.
    pub fields: Map<String, Value>,
    /// Server-assigned creation timestamp, if stamped.
    pub created_at: Option<DateTime<Utc>>,
}

impl Document {
    /// Creates a document from an id and field map.
    #[must_use]
    pub const fn new(id: DocumentId, fields: Map<String, Value>) -> Self {
        Self {
            id,
            fields,
            created_at: None,
        }
    }

    /// Attaches the creation timestamp.
    #[must_use]
    pub const fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Returns a string field, if present and a string.
    #[must_use]
    pub fn str_field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }

    /// Returns a boolean field, defaulting to `false` when absent.
    #[must_use]
    pub fn bool_field(&self, name: &str) -> bool {
        self.fields
            .get(name)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    /// Returns a numeric field as `f64`.
    #[must_use]
    pub fn number_field(&self, name: &str) -> Option<f64> {
        self.fields.get(name).and_then(Value::as_f64)
    }

    /// Returns an integer field, accepting JSON numbers and numeric strings
    /// (legacy documents stored counts as strings in places).
    #[must_use]
    pub fn integer_field(&self, name: &str) -> Option<i64> {
        match self.fields.get(name)? {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Returns a timestamp field parsed from RFC 3339.
    #[must_use]
    pub fn timestamp_field(&self, name: &str) -> Option<DateTime<Utc>> {
        self.str_field(name)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// An equality filter on one field.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    /// Field name to compare.
    pub field: String,
    /// Value the field must equal.
    pub value: Value,
}

impl Filter {
    /// Builds an equality filter.
    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Tests a document against this filter.
    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        doc.fields.get(&self.field) == Some(&self.value)
    }
}

/// Result ordering for list queries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Newest first; documents without a timestamp sort last.
    /// The default for every list view.
    #[default]
    CreatedAtDesc,
    /// Backend insertion order, whatever that is.
    Unordered,
}

/// Sorts documents newest-first, treating a missing timestamp as the epoch.
pub fn sort_created_at_desc(docs: &mut [Document]) {
    docs.sort_by_key(|d| std::cmp::Reverse(d.created_at.unwrap_or(DateTime::UNIX_EPOCH)));
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::json;

    fn doc(id: &str, fields: Value) -> Document {
        let Value::Object(map) = fields else {
            unreachable!("test documents are objects")
        };
        Document::new(DocumentId::new(id), map)
    }

    #[test]
    fn collection_roundtrip() {
        for c in Collection::ALL {
            assert_eq!(Collection::parse(c.as_str()), Some(c));
        }
        assert_eq!(Collection::parse("no_such_collection"), None);
    }

    #[test]
    fn filter_matches_equal_value() {
        let d = doc("n1", json!({"targetRole": "admin", "read": false}));
        assert!(Filter::eq("targetRole", "admin").matches(&d));
        assert!(!Filter::eq("targetRole", "guest").matches(&d));
        assert!(!Filter::eq("missing", "x").matches(&d));
    }

    #[test]
    fn integer_field_accepts_numeric_strings() {
        let d = doc("r1", json!({"guests": "4", "luggage": 2, "name": "suite"}));
        assert_eq!(d.integer_field("guests"), Some(4));
        assert_eq!(d.integer_field("luggage"), Some(2));
        assert_eq!(d.integer_field("name"), None);
    }

    #[test]
    fn sort_puts_missing_timestamps_last() {
        let t1 = Utc::now();
        let t2 = t1 + chrono::Duration::seconds(10);
        let mut docs = vec![
            doc("old", json!({})).with_created_at(t1),
            doc("untimed", json!({})),
            doc("new", json!({})).with_created_at(t2),
        ];
        sort_created_at_desc(&mut docs);
        let ids: Vec<_> = docs.iter().map(|d| d.id.as_str().to_owned()).collect();
        assert_eq!(ids, ["new", "old", "untimed"]);
    }
}
