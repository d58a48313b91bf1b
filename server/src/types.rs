//! Domain types and document normalization.
//!
//! Every typed record in the service decodes from a raw [`Document`] here,
//! at the store boundary, through one explicit function per type. Legacy
//! field names (`checkInDate`, `price`, scalar `imageUrl` on rooms) and
//! the bilingual status strings are handled in these functions and nowhere
//! else; handlers only ever see normalized values.

use chrono::{DateTime, Utc};
use obwira_core::document::{Collection, Document, DocumentId};
use serde::{Deserialize, Serialize};

/// Which physical collection a booking came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingKind {
    /// Room stay.
    Room,
    /// Restaurant table.
    Restaurant,
    /// Airport shuttle.
    Shuttle,
}

impl BookingKind {
    /// All kinds, in merge order.
    pub const ALL: [Self; 3] = [Self::Room, Self::Restaurant, Self::Shuttle];

    /// Wire name, as used in the `type` query parameter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Room => "room",
            Self::Restaurant => "restaurant",
            Self::Shuttle => "shuttle",
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// The collection holding this kind of booking.
    #[must_use]
    pub const fn collection(self) -> Collection {
        match self {
            Self::Room => Collection::Bookings,
            Self::Restaurant => Collection::RestaurantBookings,
            Self::Shuttle => Collection::ShuttleBookings,
        }
    }
}

/// Booking status.
///
/// The three canonical states plus a passthrough: any unrecognized string
/// is kept verbatim, filtered as nothing, and written back unchanged.
/// French synonyms from older documents map onto the canonical states.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingStatus {
    /// Awaiting staff action. The default when the field is absent.
    Pending,
    /// Confirmed by staff.
    Confirmed,
    /// Cancelled.
    Cancelled,
    /// Anything else, preserved as stored.
    Other(String),
}

impl BookingStatus {
    /// Translates a raw status string, accepting the French synonyms.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw {
            "pending" | "en attente" => Self::Pending,
            "confirmed" | "confirmé" => Self::Confirmed,
            "cancelled" | "annulé" => Self::Cancelled,
            other => Self::Other(other.to_string()),
        }
    }

    /// Canonical wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Other(s) => s,
        }
    }
}

impl Serialize for BookingStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for BookingStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::parse(&raw))
    }
}

/// Shuttle trip direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TripType {
    /// Pickup at the airport.
    AirportToHotel,
    /// Drop-off at the airport.
    HotelToAirport,
}

impl TripType {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "airport_to_hotel" => Some(Self::AirportToHotel),
            "hotel_to_airport" => Some(Self::HotelToAirport),
            _ => None,
        }
    }
}

/// Kind-specific booking fields.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged, rename_all = "camelCase")]
pub enum BookingDetails {
    /// Room stay fields.
    #[serde(rename_all = "camelCase")]
    Room {
        /// Stay start.
        check_in: Option<DateTime<Utc>>,
        /// Stay end.
        check_out: Option<DateTime<Utc>>,
        /// Display name of the booked room.
        room_name: Option<String>,
        /// Total price of the stay.
        total_price: Option<f64>,
        /// Guests on the booking.
        guests: i64,
    },
    /// Restaurant table fields.
    #[serde(rename_all = "camelCase")]
    Restaurant {
        /// Reservation date and time.
        booking_date: Option<DateTime<Utc>>,
        /// Party size.
        guests: i64,
        /// Seating preference.
        preference: Option<String>,
        /// Free-text allergies note.
        allergies: Option<String>,
    },
    /// Shuttle run fields.
    #[serde(rename_all = "camelCase")]
    Shuttle {
        /// Departure time.
        scheduled_time: Option<DateTime<Utc>>,
        /// Direction of the run.
        trip_type: Option<TripType>,
        /// Passenger count.
        passengers: i64,
        /// Luggage count.
        luggage: i64,
        /// Flight number, when provided.
        flight_number: Option<String>,
    },
}

/// One logical booking over the three physical collections.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Document id within its collection.
    pub id: DocumentId,
    /// Which collection it came from.
    #[serde(rename = "type")]
    pub kind: BookingKind,
    /// Normalized status.
    pub status: BookingStatus,
    /// Id of the guest account, if linked.
    pub user_id: Option<String>,
    /// Server creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
    /// Kind-specific fields.
    #[serde(flatten)]
    pub details: BookingDetails,
}

/// Decodes a booking document, tagging it with its kind.
///
/// Absent status defaults to pending. Legacy stays store their dates as
/// `checkInDate`/`checkOutDate`; both spellings are accepted.
#[must_use]
pub fn booking_from_document(kind: BookingKind, doc: &Document) -> Booking {
    let status = doc
        .str_field("status")
        .map_or(BookingStatus::Pending, BookingStatus::parse);
    let details = match kind {
        BookingKind::Room => BookingDetails::Room {
            check_in: doc
                .timestamp_field("checkIn")
                .or_else(|| doc.timestamp_field("checkInDate")),
            check_out: doc
                .timestamp_field("checkOut")
                .or_else(|| doc.timestamp_field("checkOutDate")),
            room_name: doc.str_field("roomName").map(str::to_string),
            total_price: doc.number_field("totalPrice"),
            guests: doc.integer_field("guests").unwrap_or(0),
        },
        BookingKind::Restaurant => BookingDetails::Restaurant {
            booking_date: doc.timestamp_field("bookingDate"),
            guests: doc.integer_field("guests").unwrap_or(0),
            preference: doc.str_field("preference").map(str::to_string),
            allergies: doc.str_field("allergies").map(str::to_string),
        },
        BookingKind::Shuttle => BookingDetails::Shuttle {
            scheduled_time: doc.timestamp_field("scheduledTime"),
            trip_type: doc.str_field("tripType").and_then(TripType::parse),
            passengers: doc.integer_field("passengers").unwrap_or(0),
            luggage: doc.integer_field("luggage").unwrap_or(0),
            flight_number: doc.str_field("flightNumber").map(str::to_string),
        },
    };
    Booking {
        id: doc.id.clone(),
        kind,
        status,
        user_id: doc.str_field("userId").map(str::to_string),
        created_at: doc.created_at,
        details,
    }
}

/// A staff or guest account.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Document id.
    pub id: DocumentId,
    /// Display name.
    pub full_name: Option<String>,
    /// Sign-in email.
    pub email: Option<String>,
    /// Loyalty tier label.
    pub member_status: Option<String>,
    /// Access role; only `admin` may sign in to the back office.
    pub role: Option<String>,
}

/// Decodes a user document. The password hash stays out of the read model.
#[must_use]
pub fn user_from_document(doc: &Document) -> User {
    User {
        id: doc.id.clone(),
        full_name: doc.str_field("fullName").map(str::to_string),
        email: doc.str_field("email").map(str::to_string),
        member_status: doc.str_field("memberStatus").map(str::to_string),
        role: doc.str_field("role").map(str::to_string),
    }
}

/// A curated experience shown to guests.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    /// Document id.
    pub id: DocumentId,
    /// Title.
    pub title: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Display date.
    pub date: Option<String>,
    /// Image URL.
    pub image_url: Option<String>,
    /// Whether this is the featured experience. At most one at a time.
    pub is_featured: bool,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
}

/// Decodes an experience document.
#[must_use]
pub fn experience_from_document(doc: &Document) -> Experience {
    Experience {
        id: doc.id.clone(),
        title: doc.str_field("title").map(str::to_string),
        description: doc.str_field("description").map(str::to_string),
        date: doc.str_field("date").map(str::to_string),
        image_url: doc.str_field("imageUrl").map(str::to_string),
        is_featured: doc.bool_field("isFeatured"),
        created_at: doc.created_at,
    }
}

/// A staff-facing notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Document id.
    pub id: DocumentId,
    /// Role the notification targets.
    pub target_role: Option<String>,
    /// Short title.
    pub title: Option<String>,
    /// Body text.
    pub message: Option<String>,
    /// Whether staff has seen it.
    pub read: bool,
    /// Creation timestamp.
    pub created_at: Option<DateTime<Utc>>,
}

/// Decodes a notification document.
#[must_use]
pub fn notification_from_document(doc: &Document) -> Notification {
    Notification {
        id: doc.id.clone(),
        target_role: doc.str_field("targetRole").map(str::to_string),
        title: doc.str_field("title").map(str::to_string),
        message: doc.str_field("message").map(str::to_string),
        read: doc.bool_field("read"),
        created_at: doc.created_at,
    }
}

/// A bookable room.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Document id.
    pub id: DocumentId,
    /// Display name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Maximum occupancy.
    pub capacity: Option<i64>,
    /// Nightly rate.
    pub price_per_night: Option<f64>,
    /// Gallery image URLs.
    pub images: Vec<String>,
}

/// Decodes a room document.
///
/// Older rooms carry a scalar `imageUrl` and a `price` field; both fold
/// into the current shape.
#[must_use]
pub fn room_from_document(doc: &Document) -> Room {
    let images = doc
        .fields
        .get("images")
        .and_then(serde_json::Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(serde_json::Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_else(|| {
            doc.str_field("imageUrl")
                .map(str::to_string)
                .into_iter()
                .collect()
        });
    Room {
        id: doc.id.clone(),
        name: doc.str_field("name").map(str::to_string),
        description: doc.str_field("description").map(str::to_string),
        capacity: doc.integer_field("capacity"),
        price_per_night: doc
            .number_field("pricePerNight")
            .or_else(|| doc.number_field("price")),
        images,
    }
}

/// An event hall.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Hall {
    /// Document id.
    pub id: DocumentId,
    /// Display name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Hourly rate.
    pub price_per_hour: Option<f64>,
    /// Maximum occupancy.
    pub capacity: Option<i64>,
    /// Image URL.
    pub image_url: Option<String>,
}

/// Decodes a hall document.
#[must_use]
pub fn hall_from_document(doc: &Document) -> Hall {
    Hall {
        id: doc.id.clone(),
        name: doc.str_field("name").map(str::to_string),
        description: doc.str_field("description").map(str::to_string),
        price_per_hour: doc.number_field("pricePerHour"),
        capacity: doc.integer_field("capacity"),
        image_url: doc.str_field("imageUrl").map(str::to_string),
    }
}

/// A restaurant or bar menu entry.
///
/// Both menus share a shape; only the category vocabulary differs.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    /// Document id.
    pub id: DocumentId,
    /// Dish or drink name.
    pub name: Option<String>,
    /// Description.
    pub description: Option<String>,
    /// Price.
    pub price: Option<f64>,
    /// Menu section.
    pub category: Option<String>,
    /// Image URL.
    pub image_url: Option<String>,
}

/// Valid categories for restaurant menu items.
pub const RESTAURANT_CATEGORIES: [&str; 4] = ["breakfast", "starter", "main", "dessert"];

/// Valid categories for bar menu items.
pub const BAR_CATEGORIES: [&str; 3] = ["signature", "classic", "soft"];

/// Decodes a menu item document.
#[must_use]
pub fn menu_item_from_document(doc: &Document) -> MenuItem {
    MenuItem {
        id: doc.id.clone(),
        name: doc.str_field("name").map(str::to_string),
        description: doc.str_field("description").map(str::to_string),
        price: doc.number_field("price"),
        category: doc.str_field("category").map(str::to_string),
        image_url: doc.str_field("imageUrl").map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use serde_json::{json, Map, Value};

    fn doc(id: &str, fields: Value) -> Document {
        let Value::Object(map) = fields else {
            unreachable!("test documents are objects")
        };
        Document::new(DocumentId::new(id), map)
    }

    #[test]
    fn status_translates_french_synonyms() {
        assert_eq!(BookingStatus::parse("en attente"), BookingStatus::Pending);
        assert_eq!(BookingStatus::parse("confirmé"), BookingStatus::Confirmed);
        assert_eq!(BookingStatus::parse("annulé"), BookingStatus::Cancelled);
        assert_eq!(BookingStatus::parse("pending"), BookingStatus::Pending);
    }

    #[test]
    fn status_preserves_unknown_strings() {
        let status = BookingStatus::parse("waitlisted");
        assert_eq!(status, BookingStatus::Other("waitlisted".to_string()));
        assert_eq!(status.as_str(), "waitlisted");
    }

    #[test]
    fn missing_status_defaults_to_pending() {
        let booking =
            booking_from_document(BookingKind::Room, &doc("b1", json!({ "guests": 2 })));
        assert_eq!(booking.status, BookingStatus::Pending);
    }

    #[test]
    fn room_booking_accepts_legacy_date_fields() {
        let booking = booking_from_document(
            BookingKind::Room,
            &doc(
                "b1",
                json!({
                    "checkInDate": "2025-03-01T14:00:00Z",
                    "checkOutDate": "2025-03-05T11:00:00Z",
                    "guests": "3"
                }),
            ),
        );
        let BookingDetails::Room {
            check_in,
            check_out,
            guests,
            ..
        } = booking.details
        else {
            unreachable!("room kind decodes to room details")
        };
        assert!(check_in.is_some());
        assert!(check_out.is_some());
        assert_eq!(guests, 3);
    }

    #[test]
    fn current_date_fields_win_over_legacy() {
        let booking = booking_from_document(
            BookingKind::Room,
            &doc(
                "b1",
                json!({
                    "checkIn": "2025-03-02T14:00:00Z",
                    "checkInDate": "2025-01-01T00:00:00Z"
                }),
            ),
        );
        let BookingDetails::Room { check_in, .. } = booking.details else {
            unreachable!("room kind decodes to room details")
        };
        assert_eq!(
            check_in.unwrap().to_rfc3339(),
            "2025-03-02T14:00:00+00:00"
        );
    }

    #[test]
    fn shuttle_trip_type_parses_known_values() {
        let booking = booking_from_document(
            BookingKind::Shuttle,
            &doc(
                "s1",
                json!({
                    "tripType": "airport_to_hotel",
                    "passengers": 2,
                    "luggage": 4,
                    "flightNumber": "ET702"
                }),
            ),
        );
        let BookingDetails::Shuttle {
            trip_type,
            passengers,
            luggage,
            ..
        } = booking.details
        else {
            unreachable!("shuttle kind decodes to shuttle details")
        };
        assert_eq!(trip_type, Some(TripType::AirportToHotel));
        assert_eq!(passengers, 2);
        assert_eq!(luggage, 4);
    }

    #[test]
    fn room_folds_legacy_price_and_scalar_image() {
        let room = room_from_document(&doc(
            "r1",
            json!({ "name": "Suite", "price": 220.0, "imageUrl": "https://img/1.jpg" }),
        ));
        assert_eq!(room.price_per_night, Some(220.0));
        assert_eq!(room.images, vec!["https://img/1.jpg".to_string()]);
    }

    #[test]
    fn room_prefers_current_fields() {
        let room = room_from_document(&doc(
            "r1",
            json!({
                "pricePerNight": 250.0,
                "price": 220.0,
                "images": ["a.jpg", "b.jpg"],
                "imageUrl": "legacy.jpg"
            }),
        ));
        assert_eq!(room.price_per_night, Some(250.0));
        assert_eq!(room.images, vec!["a.jpg".to_string(), "b.jpg".to_string()]);
    }

    #[test]
    fn booking_serializes_with_type_tag_and_camel_case() {
        let booking = booking_from_document(
            BookingKind::Restaurant,
            &doc("b9", json!({ "bookingDate": "2025-04-01T19:00:00Z", "guests": 4 })),
        );
        let value = serde_json::to_value(&booking).unwrap();
        assert_eq!(value["type"], "restaurant");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["guests"], 4);
        assert!(value.get("bookingDate").is_some());
    }

    #[test]
    fn user_read_model_has_no_password_hash() {
        let mut fields = Map::new();
        fields.insert("email".into(), json!("a@b.c"));
        fields.insert("passwordHash".into(), json!("deadbeef"));
        let user = user_from_document(&Document::new(DocumentId::new("u1"), fields));
        let value = serde_json::to_value(&user).unwrap();
        assert!(value.get("passwordHash").is_none());
    }
}
