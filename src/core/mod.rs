//! Core resolution and fetch logic.
//!
//! This module contains:
//! - LinkResolver: share-link classification and identifier extraction
//! - FetchClient: timeout-bounded requests with retry on `Forbidden`
//! - FlagResolver: cached remote flags and subscription offer
//! - Extractor: share link to decoded media

pub mod errors;
pub mod extractor;
pub mod fetch_client;
pub mod flag_resolver;
pub mod link_resolver;
pub mod retry;

// Re-export commonly used types
pub use errors::{is_permission_message, FetchError};
pub use extractor::Extractor;
pub use fetch_client::{decode_response, ApiErrorEnvelope, ErrorEnvelope, FetchClient, FetchSettings};
pub use flag_resolver::{
    FlagResolver, FlagResolverConfig, RefreshHandles, RefreshOutcome, FLAGS_CACHE_KEY,
    SUBSCRIPTION_CACHE_KEY,
};
pub use link_resolver::{classify, extract_identifier};
pub use retry::{RetryPolicy, RetryState};
