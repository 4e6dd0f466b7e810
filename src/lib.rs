//! Client-side application state core for the ClubSync booking app:
//! an observable state store with a persisted, schema-versioned subset,
//! plus the authenticated HTTP wrapper that reads from it.

mod client;
pub use client::ApiClient;
mod error;
pub use error::{ApiError, PersistError};
mod migrate;
mod model;
pub use model::{
    Booking, BookingStatus, BookingUpdate, Event, EventStatus, Notification, NotificationKind,
    User, UserUpdate,
};
mod persist;
mod state;
pub use state::AppState;
mod store;
pub use store::{AppStateStore, AppStateStoreBuilder, SubscriptionId};
