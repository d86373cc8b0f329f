//! Domain types for storyfetch.
//!
//! This module contains the core data structures:
//! - Content: identifiers, kinds and decoded extraction results
//! - Flags: remote feature flags and subscription offer settings

pub mod content;
pub mod flags;

// Re-export commonly used types
pub use content::{
    ContentIdentifier, ContentKind, ExtractedMedia, Extraction, VideoQuality, VideoVersion,
};
pub use flags::{
    FlagPayload, FlagSnapshot, SubscriptionEnvelope, SubscriptionOffer, SubscriptionOfferPayload,
    VersionGates,
};
