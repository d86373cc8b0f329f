//! Resilient fetch client.
//!
//! One logical call is a sequence of strictly sequential attempts. Each
//! attempt is bounded by a timeout and its outcome is classified into a
//! [`FetchError`]. Only `Forbidden` outcomes are retried, with exponential
//! backoff, up to the policy's retry budget.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::adapters::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, TransportError};

use super::errors::FetchError;
use super::retry::{RetryPolicy, RetryState};

/// Per-attempt timeout when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Timeout and retry settings for a fetch client
#[derive(Debug, Clone, PartialEq)]
pub struct FetchSettings {
    /// Bound on a single attempt
    pub timeout: Duration,

    /// Retry budget for `Forbidden` outcomes
    pub retry: RetryPolicy,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }
}

/// A decodable error envelope returned with a 2xx status
pub trait ErrorEnvelope: DeserializeOwned {
    /// Human-readable message carried by the envelope
    fn into_message(self) -> String;
}

/// `{ "error": { "error": "<message>" } }`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorEnvelope {
    pub error: ApiErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

impl ErrorEnvelope for ApiErrorEnvelope {
    fn into_message(self) -> String {
        self.error.error
    }
}

/// Decode a completed HTTP exchange.
///
/// Non-2xx statuses are classified by status alone. A 2xx body is tried
/// against the error envelope first, then against the success schema.
pub fn decode_response<T, E>(response: &HttpResponse) -> Result<T, FetchError>
where
    T: DeserializeOwned,
    E: ErrorEnvelope,
{
    if !response.is_success() {
        return Err(FetchError::from_status(response.status));
    }

    if let Ok(envelope) = serde_json::from_slice::<E>(&response.body) {
        return Err(FetchError::from_envelope_message(envelope.into_message()));
    }

    serde_json::from_slice::<T>(&response.body).map_err(|e| {
        debug!(error = %e, bytes = response.body.len(), "Success schema mismatch");
        FetchError::DecodingError
    })
}

/// Fetch client over an injected transport
#[derive(Clone)]
pub struct FetchClient {
    transport: Arc<dyn HttpTransport>,
    settings: FetchSettings,
}

impl FetchClient {
    /// Create a client with explicit settings
    pub fn new(transport: Arc<dyn HttpTransport>, settings: FetchSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Get the client settings
    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }

    fn build_request(
        &self,
        endpoint: &str,
        method: HttpMethod,
        body: Option<&serde_json::Value>,
    ) -> Result<HttpRequest, FetchError> {
        let mut request = HttpRequest::new(method, endpoint, self.settings.timeout)
            .header("Accept", "application/json");

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(|_| FetchError::DecodingError)?;
            request = request.header("Content-Type", "application/json").body(bytes);
        }

        Ok(request)
    }

    /// Perform a single attempt
    pub async fn submit<T, E>(
        &self,
        endpoint: &str,
        method: HttpMethod,
        body: Option<&serde_json::Value>,
    ) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        E: ErrorEnvelope,
    {
        let request = self.build_request(endpoint, method, body)?;

        debug!(transport = self.transport.name(), %endpoint, %method, "Sending request");

        let attempt = tokio::time::timeout(self.settings.timeout, self.transport.send(request));
        let response = match attempt.await {
            Err(_elapsed) => return Err(FetchError::Timeout),
            Ok(Err(TransportError::Timeout)) => return Err(FetchError::Timeout),
            Ok(Err(TransportError::Other(cause))) => return Err(FetchError::NetworkError(cause)),
            Ok(Ok(response)) => response,
        };

        decode_response::<T, E>(&response)
    }

    /// Perform a logical call, retrying `Forbidden` outcomes with backoff
    #[instrument(skip(self, body), fields(%endpoint, %method))]
    pub async fn submit_with_retry<T, E>(
        &self,
        endpoint: &str,
        method: HttpMethod,
        body: Option<&serde_json::Value>,
    ) -> Result<T, FetchError>
    where
        T: DeserializeOwned,
        E: ErrorEnvelope,
    {
        let mut state = RetryState::new();

        loop {
            match self.submit::<T, E>(endpoint, method, body).await {
                Err(err) if err.is_retryable() => match state.next_delay(&self.settings.retry) {
                    Some(delay) => {
                        warn!(
                            retry = state.attempt,
                            max_retries = self.settings.retry.max_retries,
                            ?delay,
                            error = %err,
                            "Request forbidden, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    None => {
                        warn!(
                            attempts = state.attempt + 1,
                            error = %err,
                            "Retry budget exhausted"
                        );
                        return Err(err);
                    }
                },
                other => return other,
            }
        }
    }
}
