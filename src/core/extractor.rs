//! Share link to decoded media.
//!
//! Resolves the link locally, then asks the extraction backend for the
//! media behind the identifier.

use serde_json::json;
use tracing::{info, instrument};

use crate::adapters::HttpMethod;
use crate::domain::{ExtractedMedia, Extraction};

use super::errors::FetchError;
use super::fetch_client::{ApiErrorEnvelope, FetchClient};
use super::link_resolver::{classify, extract_identifier};

/// Content extraction pipeline
pub struct Extractor {
    client: FetchClient,
    endpoint: String,
}

impl Extractor {
    /// Create an extractor posting to `endpoint`
    pub fn new(client: FetchClient, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    /// Get the extraction endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Resolve `share_link` and fetch its media.
    ///
    /// An unrecognized link fails with `InvalidLink` before any request.
    #[instrument(skip(self))]
    pub async fn extract(&self, share_link: &str) -> Result<Extraction, FetchError> {
        let kind = classify(share_link);
        let identifier = extract_identifier(share_link)?;

        info!(%kind, %identifier, "Resolved share link");

        let body = json!({
            "url": share_link,
            "media_id": identifier.as_str(),
            "kind": kind.as_str(),
        });

        let media: ExtractedMedia = self
            .client
            .submit_with_retry::<ExtractedMedia, ApiErrorEnvelope>(
                &self.endpoint,
                HttpMethod::Post,
                Some(&body),
            )
            .await?;

        info!(
            versions = media.all_video_versions.len(),
            width = media.video_quality.width,
            height = media.video_quality.height,
            "Extracted media"
        );

        Ok(Extraction {
            kind,
            identifier,
            media,
        })
    }
}
