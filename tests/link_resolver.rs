//! Link Resolver Integration Tests
//!
//! Classification and identifier extraction across the supported link shapes.

use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use base64::Engine;
use proptest::prelude::*;
use storyfetch::{classify, extract_identifier, ContentKind, FetchError};

#[test]
fn test_highlight_path_link() {
    let url = "https://instagram.com/stories/highlights/17890895565213838/";

    assert_eq!(classify(url), ContentKind::Highlight);
    assert_eq!(extract_identifier(url).unwrap().as_str(), "17890895565213838");
}

#[test]
fn test_base64_share_token() {
    let url = "https://instagram.com/s/aGlnaGxpZ2h0OjE3ODkwODk1NTY1MjEzODM4?x=1";

    assert_eq!(classify(url), ContentKind::Highlight);
    assert_eq!(extract_identifier(url).unwrap().as_str(), "17890895565213838");
}

#[test]
fn test_story_media_id_query() {
    let url = "https://www.instagram.com/stories/someone/?story_media_id=123456789012345&foo=bar";

    assert_eq!(classify(url), ContentKind::Story);
    assert_eq!(extract_identifier(url).unwrap().as_str(), "123456789012345");
}

#[test]
fn test_story_media_id_at_end_of_string() {
    let url = "https://instagram.com/x?story_media_id=3312345678901234567";
    assert_eq!(extract_identifier(url).unwrap().as_str(), "3312345678901234567");
}

#[test]
fn test_unrecognized_link() {
    for url in [
        "https://example.com/video/123",
        "https://www.instagram.com/p/Cxyz123/",
        "",
        "not a url at all",
    ] {
        assert_eq!(extract_identifier(url), Err(FetchError::InvalidLink), "{}", url);
    }
}

#[test]
fn test_highlight_path_wins_over_query() {
    let url = "https://instagram.com/stories/highlights/111/?story_media_id=222222222222222";
    assert_eq!(extract_identifier(url).unwrap().as_str(), "111");
}

#[test]
fn test_share_token_wins_over_query() {
    let token = STANDARD.encode("highlight:17890000000000001");
    let url = format!(
        "https://instagram.com/s/{}?story_media_id=999999999999999",
        token
    );
    assert_eq!(extract_identifier(&url).unwrap().as_str(), "17890000000000001");
}

#[test]
fn test_share_token_url_safe_alphabet() {
    // "~~~" encodes to "fn5+" in the standard alphabet
    let text = "highlight:17890895565213838~~~";
    let token = URL_SAFE_NO_PAD.encode(text);
    assert!(token.contains('-') || token.contains('_'));

    let url = format!("https://instagram.com/s/{}", token);
    assert_eq!(extract_identifier(&url).unwrap().as_str(), "17890895565213838");
}

#[test]
fn test_share_token_digit_run_fallback() {
    let token = STANDARD.encode("story_share|id=3312345678901234567|owner=42");
    let url = format!("https://www.instagram.com/s/{}?igsh=abc", token);

    assert_eq!(classify(&url), ContentKind::Story);
    assert_eq!(extract_identifier(&url).unwrap().as_str(), "3312345678901234567");
}

proptest! {
    #[test]
    fn prop_story_media_id_roundtrip(id in "[1-9][0-9]{0,24}", tail in "[a-z]{0,8}") {
        let url = format!(
            "https://www.instagram.com/stories/someone/?utm_source=ig&story_media_id={}&{}=1",
            id, tail
        );
        let extracted = extract_identifier(&url).unwrap();
        prop_assert_eq!(extracted.as_str(), id.as_str());
        prop_assert_eq!(classify(&url), ContentKind::Story);
    }

    #[test]
    fn prop_highlight_token_roundtrip(id in "[0-9]{1,30}", query in "[a-z0-9=&]{0,12}") {
        let token = STANDARD.encode(format!("highlight:{}", id));
        let url = format!("https://instagram.com/s/{}?{}", token, query);

        let extracted = extract_identifier(&url).unwrap();
        prop_assert_eq!(extracted.as_str(), id.as_str());
        prop_assert_eq!(classify(&url), ContentKind::Highlight);
    }

    #[test]
    fn prop_highlight_path_roundtrip(id in "[0-9]{1,30}", slashes in 0usize..3) {
        let url = format!(
            "https://www.instagram.com/stories/highlights/{}{}",
            id,
            "/".repeat(slashes)
        );
        let extracted = extract_identifier(&url).unwrap();
        prop_assert_eq!(extracted.as_str(), id.as_str());
        prop_assert_eq!(classify(&url), ContentKind::Highlight);
    }

    #[test]
    fn prop_arbitrary_input_never_panics(input in ".{0,200}") {
        let _ = classify(&input);
        match extract_identifier(&input) {
            Ok(id) => prop_assert!(!id.as_str().is_empty()),
            Err(e) => prop_assert_eq!(e, FetchError::InvalidLink),
        }
    }
}
