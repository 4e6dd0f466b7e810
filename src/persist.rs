//! Durable slot for the persisted subset of the application state.
//!
//! The subset is stored as a single JSON document
//! `{ "state": { ...subset... }, "version": <int> }` at a caller-chosen
//! path. Writes are atomic via a temp-rename pattern to prevent
//! corruption from crashes mid-write, and happen on a background task so
//! mutations never wait on disk I/O.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tokio::sync::{mpsc, oneshot};

use crate::error::PersistError;
use crate::migrate::SCHEMA_VERSION;
use crate::model::User;
use crate::state::AppState;

/// The subset of [`AppState`] that crosses the durability boundary.
///
/// Everything outside this subset is session-scoped and resets to its
/// initial value on every launch, regardless of what was last in memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct PersistedState {
    /// Whether a user was logged in.
    pub is_authenticated: bool,
    /// The logged-in account.
    pub user: Option<User>,
    /// Bearer token for API calls.
    pub auth_token: Option<String>,
    /// Favorited event ids.
    pub favorite_events: Vec<String>,
    /// Wallet balance.
    pub wallet_balance: f64,
}

impl PersistedState {
    /// Capture the persisted subset from a live state snapshot.
    pub(crate) fn capture(state: &AppState) -> Self {
        Self {
            is_authenticated: state.is_authenticated,
            user: state.user.clone(),
            auth_token: state.auth_token.clone(),
            favorite_events: state.favorite_events.clone(),
            wallet_balance: state.wallet_balance,
        }
    }

    /// Merge this subset into a fresh [`AppState`]: persisted fields come
    /// from `self`, every other field takes its initial value.
    pub(crate) fn restore(self) -> AppState {
        AppState {
            is_authenticated: self.is_authenticated,
            user: self.user,
            auth_token: self.auth_token,
            favorite_events: self.favorite_events,
            wallet_balance: self.wallet_balance,
            ..AppState::default()
        }
    }
}

/// On-disk wrapper pairing the persisted payload with its schema version.
///
/// Loaded with `S = serde_json::Value` so that migration can inspect the
/// raw document before any typed deserialization runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "S: Serialize", deserialize = "S: DeserializeOwned"))]
pub(crate) struct StateEnvelope<S> {
    /// The persisted payload.
    pub state: S,
    /// Schema version the payload was written under.
    pub version: u32,
}

/// The single named slot holding the persisted subset.
///
/// Cheap to clone (wraps one `PathBuf`).
#[derive(Debug, Clone)]
pub(crate) struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Create a slot handle for the given path. The file and its parent
    /// directories need not exist yet.
    pub(crate) fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the slot on disk.
    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    /// Load the raw envelope from disk.
    ///
    /// Returns `None` when the file is missing, unreadable, or does not
    /// parse as an envelope -- all three are treated as "no prior state"
    /// so that startup never fails on a damaged slot. Unexpected failures
    /// are logged as warnings.
    pub(crate) fn load(&self) -> Option<StateEnvelope<serde_json::Value>> {
        let bytes = match std::fs::read(&self.path) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "failed to read persisted state; starting fresh"
                );
                return None;
            }
        };

        match serde_json::from_slice::<StateEnvelope<serde_json::Value>>(&bytes) {
            Ok(envelope) => Some(envelope),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "persisted state is corrupt; starting fresh"
                );
                None
            }
        }
    }

    /// Write the persisted subset atomically under the current schema
    /// version.
    ///
    /// Writes to a sibling temp file, then renames over the slot, so a
    /// crash mid-write never leaves a partially-written document.
    ///
    /// # Errors
    ///
    /// Returns [`PersistError`] if serialization, directory creation,
    /// writing, or renaming fails.
    pub(crate) fn save(&self, state: &PersistedState) -> Result<(), PersistError> {
        if let Some(dir) = self.path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let envelope = StateEnvelope {
            state,
            version: SCHEMA_VERSION,
        };
        let json = serde_json::to_vec_pretty(&envelope)?;

        let tmp_path = self.path.with_extension("json.tmp");
        std::fs::write(&tmp_path, &json)?;
        std::fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Messages sent from the store to the background writer task.
pub(crate) enum PersistRequest {
    /// Persist this snapshot of the subset.
    Write(PersistedState),
    /// Reply on the channel once every previously enqueued write has
    /// been attempted.
    Flush(oneshot::Sender<()>),
}

/// Spawn the background writer that owns the durable slot.
///
/// The task drains whatever is queued and writes only the newest pending
/// snapshot, so a burst of mutations costs one disk write and the last
/// write always wins. Writes are serialized by construction -- the task
/// is the only writer. A failed write is logged and dropped, never
/// retried; durability is best-effort. The task exits when the store
/// drops its sender.
pub(crate) fn spawn_writer(
    file: StateFile,
    mut rx: mpsc::UnboundedReceiver<PersistRequest>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(first) = rx.recv().await {
            let mut latest = None;
            let mut flushes = Vec::new();

            let mut next = Some(first);
            while let Some(req) = next.take() {
                match req {
                    PersistRequest::Write(state) => latest = Some(state),
                    PersistRequest::Flush(ack) => flushes.push(ack),
                }
                next = rx.try_recv().ok();
            }

            if let Some(state) = latest
                && let Err(e) = file.save(&state)
            {
                tracing::warn!(
                    path = %file.path().display(),
                    error = %e,
                    "state write-behind failed; in-memory state unaffected"
                );
            }

            for ack in flushes {
                // The flusher may have given up waiting; that's fine.
                let _ = ack.send(());
            }
        }
        tracing::debug!(path = %file.path().display(), "state writer shut down");
    })
}
