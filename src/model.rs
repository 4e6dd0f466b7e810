//! Domain value types shared by the store and the API wrapper.
//!
//! All types serialize with camelCase field names so that the durable
//! slot and the wire format match the backing API's JSON conventions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A registered ClubSync account.
///
/// Owned by the session: replaced wholesale on login, shallow-merged on
/// profile update, cleared on logout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-assigned account identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Optional contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Optional profile image URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    /// Optional postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Account creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A partial update for [`User`].
///
/// `Some` overwrites the corresponding field; `None` leaves it untouched.
/// A patch can therefore set or replace an optional field but never clear
/// one back to absent: removing a phone number or address is done by
/// replacing the whole user (login delivers a fresh profile), not by
/// patching. The account `id` and `created_at` are server-owned and
/// cannot be patched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserUpdate {
    /// New display name.
    pub name: Option<String>,
    /// New login email.
    pub email: Option<String>,
    /// New contact phone number.
    pub phone: Option<String>,
    /// New profile image URL.
    pub profile_image: Option<String>,
    /// New postal address.
    pub address: Option<String>,
}

impl User {
    /// Shallow-merge a partial update into this user.
    pub(crate) fn merge(&mut self, update: UserUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(phone) = update.phone {
            self.phone = Some(phone);
        }
        if let Some(image) = update.profile_image {
            self.profile_image = Some(image);
        }
        if let Some(address) = update.address {
            self.address = Some(address);
        }
    }
}

/// Availability of a listed event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventStatus {
    /// Tickets are on sale.
    Active,
    /// Capacity exhausted.
    SoldOut,
    /// Organizer cancelled the event.
    Cancelled,
}

/// A bookable event in the catalog.
///
/// Catalog entries are session-scoped: fetched from the API after startup
/// and never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Server-assigned event identifier.
    pub id: String,
    /// Event title.
    pub name: String,
    /// Scheduled start time.
    pub date: DateTime<Utc>,
    /// Venue or city.
    pub location: String,
    /// Catalog category (e.g. "concert", "nightlife").
    pub category: String,
    /// Long-form description.
    pub description: String,
    /// Cover image URL.
    pub cover_image: String,
    /// Ticket price in the account currency.
    pub price: f64,
    /// Maximum attendance.
    pub capacity: u32,
    /// Current availability.
    pub status: EventStatus,
}

/// Lifecycle state of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    /// Created but not yet paid/confirmed.
    Pending,
    /// Payment received, ticket issued.
    Confirmed,
    /// Event attended.
    Completed,
    /// Booking cancelled.
    Cancelled,
}

/// A ticket or table booking held by the session user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    /// Server-assigned booking identifier.
    pub id: String,
    /// The booked event.
    pub event_id: String,
    /// Denormalized event title for list rendering.
    pub event_name: String,
    /// Owning account.
    pub user_id: String,
    /// Lifecycle state.
    pub status: BookingStatus,
    /// Outstanding amount.
    pub amount_due: f64,
    /// Amount already paid.
    pub amount_paid: f64,
    /// Check-in QR payload, present once confirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    /// When the booking was created.
    pub booking_date: DateTime<Utc>,
    /// Whether this is a shared group booking.
    pub is_group_booking: bool,
    /// Comma-separated user ids the bill is split with, for group bookings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_with: Option<String>,
}

/// A partial update for [`Booking`], applied by id.
///
/// `Some` overwrites the corresponding field; `None` leaves it untouched.
/// As with [`UserUpdate`], optional fields can be set or replaced but not
/// cleared; server refreshes arrive through
/// [`set_bookings`](crate::AppStateStore::set_bookings) as whole records.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingUpdate {
    /// New lifecycle state.
    pub status: Option<BookingStatus>,
    /// New outstanding amount.
    pub amount_due: Option<f64>,
    /// New paid amount.
    pub amount_paid: Option<f64>,
    /// New check-in QR payload.
    pub qr_code: Option<String>,
    /// New split participants.
    pub split_with: Option<String>,
}

impl Booking {
    /// Shallow-merge a partial update into this booking.
    pub(crate) fn merge(&mut self, update: &BookingUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(due) = update.amount_due {
            self.amount_due = due;
        }
        if let Some(paid) = update.amount_paid {
            self.amount_paid = paid;
        }
        if let Some(ref qr) = update.qr_code {
            self.qr_code = Some(qr.clone());
        }
        if let Some(ref split) = update.split_with {
            self.split_with = Some(split.clone());
        }
    }
}

/// Severity of an in-app notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    /// Informational message.
    Info,
    /// Positive confirmation.
    Success,
    /// Something needs attention.
    Warning,
    /// Something failed.
    Error,
}

/// An in-app notification shown in the notification center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Unique notification identifier.
    pub id: String,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Severity.
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Whether the user has seen this notification.
    pub read: bool,
    /// Delivery timestamp.
    pub created_at: DateTime<Utc>,
}


#[cfg(test)]
mod tests {
    use super::test_fixtures::{sample_booking, sample_user};
    use super::*;

    #[test]
    fn user_merge_overwrites_only_given_fields() {
        let mut user = sample_user("u-1");
        user.merge(UserUpdate {
            phone: Some("+2348000000000".to_owned()),
            ..UserUpdate::default()
        });

        assert_eq!(user.phone.as_deref(), Some("+2348000000000"));
        assert_eq!(user.name, "Ada Lovelace", "untouched fields must survive");
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn merge_sets_but_never_clears_optional_fields() {
        let mut user = sample_user("u-1");
        user.phone = Some("+2348000000000".to_owned());
        user.merge(UserUpdate {
            name: Some("Ada L.".to_owned()),
            ..UserUpdate::default()
        });
        assert_eq!(
            user.phone.as_deref(),
            Some("+2348000000000"),
            "a patch without the field keeps the existing value"
        );

        let mut booking = sample_booking("b-1", "e-1");
        booking.qr_code = Some("qr-payload".to_owned());
        booking.merge(&BookingUpdate {
            status: Some(BookingStatus::Completed),
            ..BookingUpdate::default()
        });
        assert_eq!(booking.qr_code.as_deref(), Some("qr-payload"));
    }

    #[test]
    fn user_merge_with_empty_update_is_noop() {
        let mut user = sample_user("u-1");
        let before = user.clone();
        user.merge(UserUpdate::default());
        assert_eq!(user, before);
    }

    #[test]
    fn booking_merge_patches_status_and_payment() {
        let mut booking = sample_booking("b-1", "e-1");
        booking.merge(&BookingUpdate {
            status: Some(BookingStatus::Confirmed),
            amount_paid: Some(150.0),
            qr_code: Some("qr-payload".to_owned()),
            ..BookingUpdate::default()
        });

        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.amount_paid, 150.0);
        assert_eq!(booking.qr_code.as_deref(), Some("qr-payload"));
        assert_eq!(booking.amount_due, 150.0, "unpatched field must survive");
    }

    #[test]
    fn booking_serializes_camel_case() {
        let booking = sample_booking("b-1", "e-1");
        let value = serde_json::to_value(&booking).expect("serialization should succeed");

        assert_eq!(value["eventId"], "e-1");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["isGroupBooking"], false);
        assert!(
            value.get("qrCode").is_none(),
            "absent optionals are omitted from the document"
        );
    }

    #[test]
    fn notification_kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(NotificationKind::Warning).unwrap(),
            serde_json::json!("warning")
        );
    }

    #[test]
    fn event_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_value(EventStatus::SoldOut).unwrap(),
            serde_json::json!("sold_out")
        );
    }

    #[test]
    fn user_deserializes_with_missing_optionals() {
        let user: User = serde_json::from_value(serde_json::json!({
            "id": "u-9",
            "name": "Grace",
            "email": "grace@example.com",
            "createdAt": "2025-01-15T12:00:00Z",
        }))
        .expect("deserialization should succeed");

        assert_eq!(user.id, "u-9");
        assert!(user.phone.is_none());
        assert!(user.address.is_none());
    }
}
