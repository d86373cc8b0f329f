//! Share-link classification and identifier extraction.
//!
//! Three link shapes are understood:
//! - `instagram.com/stories/highlights/<id>/` carries the id directly
//! - `instagram.com/s/<token>` carries a base64 token that decodes to
//!   text such as `highlight:<id>`
//! - any link with a `story_media_id=<id>` query parameter
//!
//! Everything here is pure: no I/O and no shared state.

use std::sync::OnceLock;

use base64::alphabet;
use base64::engine::general_purpose::GeneralPurposeConfig;
use base64::engine::{DecodePaddingMode, GeneralPurpose};
use base64::Engine;
use regex::Regex;

use crate::domain::{ContentIdentifier, ContentKind};

use super::errors::FetchError;

const HIGHLIGHTS_MARKER: &str = "instagram.com/stories/highlights/";
const SHARE_MARKER: &str = "instagram.com/s/";
/// base64 of `highlight`
const HIGHLIGHT_TOKEN_PREFIX: &str = "aGlnaGxpZ2h0";

/// Minimum length of a bare digit run accepted as a media id
const MIN_MEDIA_ID_DIGITS: usize = 15;

const PADDING_INDIFFERENT: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, PADDING_INDIFFERENT);
const URL_SAFE_LENIENT: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, PADDING_INDIFFERENT);

fn highlight_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"highlight:([0-9]+)").expect("valid regex"))
}

fn digit_run_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!("[0-9]{{{},}}", MIN_MEDIA_ID_DIGITS)).expect("valid regex")
    })
}

fn story_media_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"story_media_id=([0-9]+)").expect("valid regex"))
}

/// Classify a share link as a story or a highlight
pub fn classify(url: &str) -> ContentKind {
    let share_highlight = url.contains(SHARE_MARKER)
        && (url.contains(HIGHLIGHT_TOKEN_PREFIX) || url.contains("highlight"));

    if share_highlight || url.contains(HIGHLIGHTS_MARKER) {
        ContentKind::Highlight
    } else {
        ContentKind::Story
    }
}

/// Extract the canonical content identifier from a share link.
///
/// Rules are tried in order and the first one producing an id wins.
pub fn extract_identifier(url: &str) -> Result<ContentIdentifier, FetchError> {
    if let Some(id) = from_highlights_path(url) {
        return Ok(ContentIdentifier::new(id));
    }

    if let Some(id) = from_share_token(url) {
        return Ok(ContentIdentifier::new(id));
    }

    story_media_id_pattern()
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| ContentIdentifier::new(m.as_str()))
        .ok_or(FetchError::InvalidLink)
}

fn after_marker<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    url.find(marker).map(|idx| &url[idx + marker.len()..])
}

fn from_highlights_path(url: &str) -> Option<String> {
    let rest = after_marker(url, HIGHLIGHTS_MARKER)?;
    let rest = rest.split(['?', '#']).next().unwrap_or_default();
    let id = rest.trim_end_matches('/');

    (!id.is_empty()).then(|| id.to_string())
}

fn from_share_token(url: &str) -> Option<String> {
    let rest = after_marker(url, SHARE_MARKER)?;
    let token = rest.split('?').next().unwrap_or_default();

    let text = decode_token(token)?;

    if let Some(caps) = highlight_pattern().captures(&text) {
        return caps.get(1).map(|m| m.as_str().to_string());
    }

    longest_digit_run(&text).map(str::to_string)
}

/// Decode a share token to UTF-8 text, accepting either base64 alphabet
fn decode_token(token: &str) -> Option<String> {
    if token.is_empty() {
        return None;
    }

    let bytes = STANDARD_LENIENT
        .decode(token)
        .or_else(|_| URL_SAFE_LENIENT.decode(token))
        .ok()?;

    String::from_utf8(bytes).ok()
}

/// Longest run of at least 15 digits; ties go to the earliest run
fn longest_digit_run(text: &str) -> Option<&str> {
    digit_run_pattern()
        .find_iter(text)
        .fold(None, |best: Option<&str>, m| match best {
            Some(b) if b.len() >= m.as_str().len() => Some(b),
            _ => Some(m.as_str()),
        })
}
