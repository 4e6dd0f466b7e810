//! Crate-level error types for persistence and the API wrapper.
//!
//! Store actions themselves are infallible: malformed persisted data is
//! repaired during migration, write failures are absorbed by the
//! background writer, and action misuse degrades to a no-op. These types
//! cover the two places where failure is real: the durable slot and the
//! HTTP wrapper.

/// Error writing the persisted subset to the durable slot.
///
/// Never reaches store callers; the background writer logs it and moves
/// on, leaving the in-memory mutation intact.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// Disk I/O failure while creating directories, writing, or renaming.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The subset failed to serialize to JSON.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Error returned by [`ApiClient`](crate::ApiClient) request helpers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The server returned 401.
    ///
    /// By the time the caller sees this, the wrapper has already logged
    /// the session out of the store.
    #[error("session expired: server returned 401")]
    Unauthorized,

    /// The server returned a non-success status other than 401.
    #[error("unexpected status code: {0}")]
    Status(u16),

    /// Connection, timeout, or other transport-level failure.
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body was not the expected JSON shape.
    #[error("failed to decode response body: {0}")]
    Decode(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_error_io_from_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = PersistError::from(io_err);
        assert!(err.to_string().contains("access denied"));
    }

    #[test]
    fn api_error_unauthorized_display() {
        assert_eq!(
            ApiError::Unauthorized.to_string(),
            "session expired: server returned 401"
        );
    }

    #[test]
    fn api_error_status_display() {
        assert_eq!(
            ApiError::Status(503).to_string(),
            "unexpected status code: 503"
        );
    }

    // Verify `Send + Sync` bounds so errors can cross task boundaries.
    const _: () = {
        #[allow(dead_code)]
        fn assert_send_sync<T: Send + Sync>() {}

        #[allow(dead_code)]
        fn check() {
            assert_send_sync::<PersistError>();
            assert_send_sync::<ApiError>();
        }
    };
}
