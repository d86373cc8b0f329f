//! Content types produced by link resolution and extraction.

use serde::{Deserialize, Serialize};

/// Canonical content identifier (a run of decimal digits)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentIdentifier(String);

impl ContentIdentifier {
    /// Wrap an already-extracted identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the raw string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Kind of content a share link points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Ephemeral story
    Story,

    /// Archived story collection
    Highlight,

    /// Feed post (classified upstream, never by the link resolver)
    Post,
}

impl ContentKind {
    /// Wire name used in extraction requests
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Story => "story",
            ContentKind::Highlight => "highlight",
            ContentKind::Post => "post",
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pixel dimensions reported for the selected video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VideoQuality {
    pub width: u32,
    pub height: u32,
}

impl VideoQuality {
    /// Total pixel count
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// One rendition listed in `allVideoVersions`
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VideoVersion {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    /// Backend-specific rendition code
    #[serde(default, rename = "type")]
    pub version_type: Option<i64>,
}

impl VideoVersion {
    fn area(&self) -> u64 {
        u64::from(self.width.unwrap_or(0)) * u64::from(self.height.unwrap_or(0))
    }
}

/// Decoded content-resolution success envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedMedia {
    pub all_video_versions: Vec<VideoVersion>,
    pub download_link: String,
    pub thumbnail_url: String,
    pub video_title: String,
    pub video_quality: VideoQuality,
}

impl ExtractedMedia {
    /// URL of the largest rendition, falling back to `downloadLink`
    pub fn best_url(&self) -> &str {
        self.all_video_versions
            .iter()
            .filter(|v| v.url.as_deref().is_some_and(|u| !u.is_empty()))
            .max_by_key(|v| v.area())
            .and_then(|v| v.url.as_deref())
            .unwrap_or(&self.download_link)
    }
}

/// Result of a full share-link extraction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Extraction {
    pub kind: ContentKind,
    pub identifier: ContentIdentifier,
    pub media: ExtractedMedia,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media(versions: Vec<VideoVersion>) -> ExtractedMedia {
        ExtractedMedia {
            all_video_versions: versions,
            download_link: "https://cdn.example/fallback.mp4".to_string(),
            thumbnail_url: "https://cdn.example/thumb.jpg".to_string(),
            video_title: "story".to_string(),
            video_quality: VideoQuality {
                width: 720,
                height: 1280,
            },
        }
    }

    #[test]
    fn test_content_kind_wire_names() {
        assert_eq!(ContentKind::Highlight.to_string(), "highlight");
        assert_eq!(
            serde_json::to_string(&ContentKind::Story).unwrap(),
            "\"story\""
        );
    }

    #[test]
    fn test_envelope_decoding() {
        let json = r#"{
            "allVideoVersions": [{"url": "https://cdn.example/a.mp4", "width": 480, "height": 854, "type": 101}],
            "downloadLink": "https://cdn.example/a.mp4",
            "thumbnailUrl": "https://cdn.example/a.jpg",
            "videoTitle": "Story by someone",
            "videoQuality": {"width": 480, "height": 854}
        }"#;

        let media: ExtractedMedia = serde_json::from_str(json).unwrap();
        assert_eq!(media.all_video_versions.len(), 1);
        assert_eq!(media.all_video_versions[0].version_type, Some(101));
        assert_eq!(media.video_quality.area(), 480 * 854);
    }

    #[test]
    fn test_best_url_prefers_largest_version() {
        let m = media(vec![
            VideoVersion {
                url: Some("small".to_string()),
                width: Some(320),
                height: Some(568),
                version_type: None,
            },
            VideoVersion {
                url: Some("large".to_string()),
                width: Some(1080),
                height: Some(1920),
                version_type: None,
            },
        ]);
        assert_eq!(m.best_url(), "large");
    }

    #[test]
    fn test_best_url_falls_back_to_download_link() {
        let m = media(vec![VideoVersion::default()]);
        assert_eq!(m.best_url(), "https://cdn.example/fallback.mp4");
    }

    #[test]
    fn test_identifier_serializes_transparently() {
        let id = ContentIdentifier::new("17890895565213838");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"17890895565213838\"");
    }
}
