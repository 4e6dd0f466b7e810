//! Top-level entry point that composes the in-memory state, the observer
//! list, and the write-behind persistence trigger into a single
//! [`AppStateStore`] type.
//!
//! The store is opened via [`AppStateStoreBuilder`], which loads and
//! migrates the durable slot (if one is configured) and spawns the
//! background writer. All actions are synchronous, infallible,
//! run-to-completion mutations: each one applies under the state lock,
//! notifies subscribers with the resulting snapshot, and enqueues a
//! persist of the durable subset before returning.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tokio::sync::{mpsc, oneshot};

use crate::migrate::migrate;
use crate::model::{Booking, BookingUpdate, Event, Notification, User, UserUpdate};
use crate::persist::{PersistRequest, PersistedState, StateFile, spawn_writer};
use crate::state::AppState;

/// Callback invoked with a snapshot after every mutation.
type Subscriber = Arc<dyn Fn(&AppState) + Send + Sync>;

/// Opaque handle returned by [`AppStateStore::subscribe`], used to
/// unsubscribe later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Shared internals behind the cloneable store handle.
struct StoreInner {
    /// The live state. Mutations are single-step replacements under the
    /// write lock, so no action ever observes a partial update.
    state: RwLock<AppState>,
    /// Registered observers, paired with their subscription ids.
    subscribers: Mutex<Vec<(SubscriptionId, Subscriber)>>,
    /// Next subscription id to hand out.
    next_subscription: AtomicU64,
    /// Channel to the background writer. `None` for in-memory stores.
    persist_tx: Option<mpsc::UnboundedSender<PersistRequest>>,
}

/// The application state store: an observable key/value container with a
/// persisted, schema-versioned subset.
///
/// Construct one per app (or per test) via [`AppStateStoreBuilder`];
/// there is no ambient global instance. `Clone` is cheap -- all internal
/// state is `Arc`-wrapped, and clones share the same state.
#[derive(Clone)]
pub struct AppStateStore {
    inner: Arc<StoreInner>,
}

// Manual `Debug` because subscribers are not `Debug` and dumping the
// full state on every log line is unhelpful.
impl std::fmt::Debug for AppStateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppStateStore")
            .field("persisted", &self.inner.persist_tx.is_some())
            .finish()
    }
}

impl AppStateStore {
    /// Create a store with no durable slot. State lives only in memory;
    /// useful for tests and previews.
    pub fn in_memory() -> Self {
        Self::with(AppState::default(), None)
    }

    fn with(initial: AppState, persist_tx: Option<mpsc::UnboundedSender<PersistRequest>>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(initial),
                subscribers: Mutex::new(Vec::new()),
                next_subscription: AtomicU64::new(0),
                persist_tx,
            }),
        }
    }

    /// Apply a mutation, enqueue a persist, and notify subscribers.
    ///
    /// The persist request is enqueued while the write lock is still
    /// held: the queue order then matches the mutation order, so the
    /// writer's coalescing keeps the newest snapshot. An unbounded send
    /// never blocks, so the extra time under the lock is negligible.
    /// Subscribers run against a snapshot, outside any lock, so a
    /// callback reading the store cannot deadlock.
    fn update(&self, mutation: impl FnOnce(&mut AppState)) {
        let snapshot = {
            let mut state = self.inner.state.write().expect("state lock poisoned");
            mutation(&mut state);
            let snapshot = state.clone();
            if let Some(tx) = &self.inner.persist_tx {
                // The writer task only exits once this sender is dropped,
                // so a send failure here is unreachable in practice.
                let _ = tx.send(PersistRequest::Write(PersistedState::capture(&snapshot)));
            }
            snapshot
        };

        let subscribers: Vec<Subscriber> = {
            let subs = self.inner.subscribers.lock().expect("subscriber lock poisoned");
            subs.iter().map(|(_, f)| Arc::clone(f)).collect()
        };
        for subscriber in subscribers {
            subscriber(&snapshot);
        }
    }

    // --- Reads ---

    /// A point-in-time snapshot of the full state.
    pub fn state(&self) -> AppState {
        self.inner.state.read().expect("state lock poisoned").clone()
    }

    /// The current bearer token, if a user is logged in.
    pub fn auth_token(&self) -> Option<String> {
        self.inner
            .state
            .read()
            .expect("state lock poisoned")
            .auth_token
            .clone()
    }

    /// Whether a user is logged in.
    pub fn is_authenticated(&self) -> bool {
        self.inner
            .state
            .read()
            .expect("state lock poisoned")
            .is_authenticated
    }

    /// The cached count of unread notifications.
    pub fn unread_count(&self) -> usize {
        self.inner
            .state
            .read()
            .expect("state lock poisoned")
            .unread_count
    }

    // --- Observers ---

    /// Register a callback invoked with a snapshot after every mutation.
    ///
    /// Callbacks run synchronously on the mutating caller's thread, in
    /// subscription order, before the action returns.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&AppState) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_subscription.fetch_add(1, Ordering::Relaxed));
        self.inner
            .subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .push((id, Arc::new(callback)));
        id
    }

    /// Remove a previously registered callback. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.inner
            .subscribers
            .lock()
            .expect("subscriber lock poisoned")
            .retain(|(sub_id, _)| *sub_id != id);
    }

    // --- Session actions ---

    /// Log a user in: sets the user, the token, and the authenticated
    /// flag together. Overwrites any existing session; bookings and
    /// notifications are untouched.
    pub fn login(&self, user: User, token: impl Into<String>) {
        let token = token.into();
        self.update(|state| {
            state.is_authenticated = true;
            state.user = Some(user);
            state.auth_token = Some(token);
        });
    }

    /// Log out: clears the session, bookings, the current booking, and
    /// queue standing. Favorites, wallet balance, the event catalog, and
    /// notifications survive.
    pub fn logout(&self) {
        self.update(|state| {
            state.is_authenticated = false;
            state.user = None;
            state.auth_token = None;
            state.bookings.clear();
            state.current_booking = None;
            state.in_queue = false;
            state.queue_position = None;
        });
    }

    /// Shallow-merge profile fields into the logged-in user. No-op when
    /// nobody is logged in.
    pub fn update_user(&self, update: UserUpdate) {
        self.update(|state| {
            if let Some(user) = state.user.as_mut() {
                user.merge(update);
            }
        });
    }

    // --- Catalog actions ---

    /// Replace the event catalog.
    pub fn set_events(&self, events: Vec<Event>) {
        self.update(|state| state.events = events);
    }

    /// Add an event to favorites. Already-favorited ids are ignored, so
    /// the list behaves as an insertion-ordered set.
    pub fn add_favorite_event(&self, event_id: impl Into<String>) {
        let event_id = event_id.into();
        self.update(|state| {
            if !state.favorite_events.contains(&event_id) {
                state.favorite_events.push(event_id);
            }
        });
    }

    /// Remove an event from favorites. Absent ids are ignored.
    pub fn remove_favorite_event(&self, event_id: &str) {
        self.update(|state| state.favorite_events.retain(|id| id != event_id));
    }

    // --- Booking actions ---

    /// Replace the booking collection.
    pub fn set_bookings(&self, bookings: Vec<Booking>) {
        self.update(|state| state.bookings = bookings);
    }

    /// Append a booking to the collection.
    pub fn add_booking(&self, booking: Booking) {
        self.update(|state| state.bookings.push(booking));
    }

    /// Patch the booking with the given id. Unknown ids leave the
    /// collection unchanged.
    pub fn update_booking(&self, booking_id: &str, update: BookingUpdate) {
        self.update(|state| {
            if let Some(booking) = state.bookings.iter_mut().find(|b| b.id == booking_id) {
                booking.merge(&update);
            }
        });
    }

    /// Set or clear the current-booking pointer. The pointed-at booking
    /// need not be a member of the collection.
    pub fn set_current_booking(&self, booking: Option<Booking>) {
        self.update(|state| state.current_booking = booking);
    }

    // --- Notification actions ---

    /// Prepend a notification and bump the unread count.
    ///
    /// The count is incremented unconditionally; the store trusts callers
    /// not to deliver already-read notifications.
    pub fn add_notification(&self, notification: Notification) {
        self.update(|state| {
            state.notifications.insert(0, notification);
            state.unread_count += 1;
        });
    }

    /// Mark the notification with the given id as read.
    ///
    /// Idempotent: the unread count only decrements when the entry
    /// actually flips from unread to read, so calling this twice on the
    /// same id cannot under-count.
    pub fn mark_notification_as_read(&self, notification_id: &str) {
        self.update(|state| {
            if let Some(notification) = state
                .notifications
                .iter_mut()
                .find(|n| n.id == notification_id)
                && !notification.read
            {
                notification.read = true;
                state.unread_count = state.unread_count.saturating_sub(1);
            }
        });
    }

    /// Mark every notification as read and reset the unread count.
    pub fn mark_all_notifications_as_read(&self) {
        self.update(|state| {
            for notification in &mut state.notifications {
                notification.read = true;
            }
            state.unread_count = 0;
        });
    }

    /// Drop all notifications and reset the unread count.
    pub fn clear_notifications(&self) {
        self.update(|state| {
            state.notifications.clear();
            state.unread_count = 0;
        });
    }

    // --- Queue actions ---

    /// Enter the entry queue at the given position.
    pub fn join_queue(&self, position: u32) {
        self.update(|state| {
            state.in_queue = true;
            state.queue_position = Some(position);
        });
    }

    /// Leave the entry queue, clearing the position regardless of any
    /// intervening position updates.
    pub fn leave_queue(&self) {
        self.update(|state| {
            state.in_queue = false;
            state.queue_position = None;
        });
    }

    /// Update the queue position. No-op when not in the queue, keeping
    /// the `in_queue == false implies no position` invariant.
    pub fn update_queue_position(&self, position: u32) {
        self.update(|state| {
            if state.in_queue {
                state.queue_position = Some(position);
            }
        });
    }

    // --- Wallet actions ---

    /// Set the wallet balance to an absolute amount, floored at zero.
    pub fn update_wallet_balance(&self, amount: f64) {
        self.update(|state| state.wallet_balance = amount.max(0.0));
    }

    /// Credit the wallet.
    pub fn add_to_wallet(&self, amount: f64) {
        self.update(|state| state.wallet_balance = (state.wallet_balance + amount).max(0.0));
    }

    /// Debit the wallet, clamping at zero: the balance never goes
    /// negative no matter how large the deduction.
    pub fn deduct_from_wallet(&self, amount: f64) {
        self.update(|state| state.wallet_balance = (state.wallet_balance - amount).max(0.0));
    }

    // --- Transient UI actions ---

    /// Set the loading flag.
    pub fn set_loading(&self, loading: bool) {
        self.update(|state| state.is_loading = loading);
    }

    /// Set the transient error message.
    pub fn set_error(&self, error: impl Into<String>) {
        let error = error.into();
        self.update(|state| state.error = Some(error));
    }

    /// Clear the transient error message.
    pub fn clear_error(&self) {
        self.update(|state| state.error = None);
    }

    // --- Persistence control ---

    /// Wait until every mutation made so far has been attempted against
    /// the durable slot. Returns immediately for in-memory stores.
    ///
    /// Durability is otherwise eventual: a mutation completes and
    /// notifies subscribers before its persisted copy hits the disk.
    pub async fn flush(&self) {
        if let Some(tx) = &self.inner.persist_tx {
            let (ack_tx, ack_rx) = oneshot::channel();
            if tx.send(PersistRequest::Flush(ack_tx)).is_ok() {
                let _ = ack_rx.await;
            }
        }
    }
}

/// Builder for configuring and opening an [`AppStateStore`].
///
/// # Examples
///
/// ```no_run
/// use clubsync_state::AppStateStoreBuilder;
///
/// # async fn example() {
/// let store = AppStateStoreBuilder::new()
///     .state_path("/data/clubsync/clubsync-storage.json")
///     .open()
///     .await;
/// assert!(!store.is_authenticated());
/// # }
/// ```
#[derive(Debug, Default)]
pub struct AppStateStoreBuilder {
    state_path: Option<PathBuf>,
}

impl AppStateStoreBuilder {
    /// Create a builder with no configuration. Without a state path the
    /// resulting store is in-memory only.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the path of the durable slot.
    pub fn state_path(mut self, path: impl AsRef<Path>) -> Self {
        self.state_path = Some(path.as_ref().to_owned());
        self
    }

    /// Load the slot, migrate it to the current schema, and open the
    /// store with the background writer running.
    ///
    /// Startup never fails: a missing or damaged slot is logged and
    /// treated as no prior state, and non-persisted fields always start
    /// at their initial values. Must be called within a tokio runtime
    /// (the writer is a spawned task).
    pub async fn open(self) -> AppStateStore {
        let Some(path) = self.state_path else {
            return AppStateStore::in_memory();
        };

        let file = StateFile::new(path);
        let initial = match file.load() {
            Some(envelope) => {
                tracing::debug!(
                    path = %file.path().display(),
                    version = envelope.version,
                    "rehydrating persisted state"
                );
                migrate(&envelope.state, envelope.version).restore()
            }
            None => AppState::default(),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        // The writer runs detached for the life of the store; it exits
        // once the store (and thus the sender) is dropped.
        let _ = spawn_writer(file, rx);
        AppStateStore::with(initial, Some(tx))
    }
}
