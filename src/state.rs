//! The full in-memory field set held by the store.

use crate::model::{Booking, Event, Notification, User};

/// Snapshot of every field the store manages.
///
/// `Default` yields the documented initial values: an unauthenticated
/// session, empty collections, zero balances, and cleared transient flags.
/// Only the persisted subset (session, favorites, wallet balance)
/// survives a restart; everything else starts from these defaults on
/// every launch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppState {
    /// Whether a user is logged in. True iff `user` and `auth_token` are set.
    pub is_authenticated: bool,
    /// The logged-in account, if any. Persisted.
    pub user: Option<User>,
    /// Bearer token for API calls, if any. Persisted.
    pub auth_token: Option<String>,

    /// Event catalog fetched from the API. Session-scoped.
    pub events: Vec<Event>,
    /// Ids of favorited events, in the order they were added. Persisted.
    pub favorite_events: Vec<String>,

    /// The session user's bookings. Cleared on logout.
    pub bookings: Vec<Booking>,
    /// Booking currently being viewed or checked out. A pointer, not a
    /// member of `bookings`; it may reference a booking absent from the
    /// collection. Cleared on logout.
    pub current_booking: Option<Booking>,

    /// In-app notifications, most recent first.
    pub notifications: Vec<Notification>,
    /// Cached count of unread notifications. Maintained by the store so
    /// badge rendering never rescans the list; equals the number of
    /// `read == false` entries after every action.
    pub unread_count: usize,

    /// Whether a network operation is in flight. Transient.
    pub is_loading: bool,
    /// Last surfaced error message, if any. Transient; set by callers
    /// from network/validation failures, never by the store itself.
    pub error: Option<String>,

    /// Whether the user is waiting in an event entry queue.
    pub in_queue: bool,
    /// Position in the queue. `None` whenever `in_queue` is false.
    pub queue_position: Option<u32>,

    /// In-app wallet balance. Never negative. Persisted.
    pub wallet_balance: f64,
}
