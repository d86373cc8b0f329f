//! storyfetch - Story share-link resolution and resilient media fetch
//!
//! The client-side core of a story downloader: turns share links into
//! content identifiers, fetches media metadata from an unreliable
//! extraction backend, and resolves remotely controlled feature flags.
//!
//! # Modules
//!
//! - `adapters`: HTTP transport and settings persistence seams
//! - `core`: LinkResolver, FetchClient, FlagResolver, Extractor
//! - `domain`: Data structures (ContentIdentifier, FlagSnapshot, ...)
//! - `config`: Layered configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Extract the identifier behind a share link
//! storyfetch id "https://instagram.com/stories/highlights/17890895565213838/"
//!
//! # Fetch media metadata
//! storyfetch fetch "https://instagram.com/s/aGlnaGxpZ2h0OjE3ODkwODk1NTY1MjEzODM4"
//!
//! # Inspect remote flags
//! storyfetch flags --refresh
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use crate::adapters::{HttpTransport, KeyValueStore};
pub use crate::core::{
    classify, extract_identifier, Extractor, FetchClient, FetchError, FetchSettings, FlagResolver,
    RetryPolicy,
};
pub use crate::domain::{ContentIdentifier, ContentKind, ExtractedMedia, FlagSnapshot, SubscriptionOffer};
