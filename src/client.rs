//! Authenticated HTTP wrapper around the ClubSync REST API.
//!
//! The wrapper owns the one cross-cutting coupling between the network
//! layer and the store: every request reads the bearer token from the
//! store, and any 401 response logs the session out before the error
//! reaches the caller. Endpoint business logic lives with the callers;
//! this module only provides the request helpers.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::ApiError;
use crate::store::AppStateStore;

/// Per-request timeout, matching the app's interactive budget.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// JSON API client bound to a store.
///
/// Cheap to clone: the underlying `reqwest::Client` and the store handle
/// are both reference-counted.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: AppStateStore,
}

impl ApiClient {
    /// Build a client for the given API base URL, bound to `store` for
    /// token reads and the 401 logout side effect.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(base_url: impl Into<String>, store: AppStateStore) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            store,
        })
    }

    /// Issue a GET request and decode the JSON response body.
    ///
    /// # Errors
    ///
    /// [`ApiError::Unauthorized`] on 401 (after logging the session out),
    /// [`ApiError::Status`] on other non-success statuses,
    /// [`ApiError::Http`] on transport failures, and
    /// [`ApiError::Decode`] when the body is not the expected shape.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.execute(self.http.get(self.url(path))).await
    }

    /// Issue a POST request with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`get`](ApiClient::get).
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.http.post(self.url(path)).json(body)).await
    }

    /// Issue a PUT request with a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`get`](ApiClient::get).
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.execute(self.http.put(self.url(path)).json(body)).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attach the session token, send, and map the response.
    ///
    /// An absent or empty token sends no `Authorization` header at all,
    /// behaving as an unauthenticated request.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let request = match self.store.auth_token() {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        };

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("received 401; logging session out");
            self.store.logout();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Status(status.as_u16()));
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
