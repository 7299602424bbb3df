//! Share links: a snapshot carried inside a URL query parameter

use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use base64::Engine;
use tracing::debug;
use url::Url;

use crate::error::{DecodeError, Result};

/// Query parameter holding the share token
pub const SHARE_PARAM: &str = "data";

/// Encode a snapshot into a URL-safe token
///
/// The snapshot is taken as UTF-8 bytes, so non-Latin-1 text survives.
pub fn encode_share(snapshot: &str) -> String {
    URL_SAFE_NO_PAD.encode(snapshot.as_bytes())
}

/// Decode a token produced by [`encode_share`]
///
/// Padding is optional, and tokens in the standard alphabet are accepted too.
pub fn decode_share(token: &str) -> std::result::Result<String, DecodeError> {
    let token = token.trim().trim_end_matches('=');
    let bytes = match URL_SAFE_NO_PAD.decode(token) {
        Ok(bytes) => bytes,
        Err(url_safe_err) => STANDARD_NO_PAD.decode(token).map_err(|_| url_safe_err)?,
    };
    Ok(String::from_utf8(bytes)?)
}

/// `base` with its share parameter replaced by a token for `snapshot`
pub fn share_url(base: &Url, snapshot: &str) -> Url {
    let mut url = base.clone();
    let retained: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(name, _)| name != SHARE_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(retained)
        .append_pair(SHARE_PARAM, &encode_share(snapshot));
    url
}

/// Remove the share parameter from `url`, returning its token
///
/// Other query parameters are kept; an emptied query is dropped entirely.
pub fn take_share_token(url: &mut Url) -> Option<String> {
    let mut token = None;
    let mut retained = Vec::new();
    for (name, value) in url.query_pairs() {
        if name == SHARE_PARAM && token.is_none() {
            token = Some(value.into_owned());
        } else {
            retained.push((name.into_owned(), value.into_owned()));
        }
    }

    let token = token?;
    if retained.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(retained);
    }
    debug!("Took share token ({} chars) from URL", token.len());
    Some(token)
}

/// Where a share link goes once built
pub trait Clipboard {
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// Clipboard that keeps the last written text
#[derive(Debug, Clone, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for MemoryClipboard {
    fn write_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_latin_snapshot_survives() {
        let snapshot = "<p>Öğrenci çalışması — 日本語 ✓</p>";
        let token = encode_share(snapshot);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_eq!(decode_share(&token).unwrap(), snapshot);
    }

    #[test]
    fn test_decode_accepts_padding_and_standard_alphabet() {
        let snapshot = "<p>??>></p>";
        let padded = base64::engine::general_purpose::STANDARD.encode(snapshot);
        assert!(padded.contains('/') || padded.contains('+') || padded.ends_with('='));
        assert_eq!(decode_share(&padded).unwrap(), snapshot);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode_share("not base64!"), Err(DecodeError::Base64(_))));
        let invalid_utf8 = URL_SAFE_NO_PAD.encode([0xff, 0xfe, 0xfd]);
        assert!(matches!(decode_share(&invalid_utf8), Err(DecodeError::Utf8(_))));
    }

    #[test]
    fn test_share_url_round_trip() {
        let base = Url::parse("https://ethos.example/editor?lang=tr&data=stale").unwrap();
        let mut shared = share_url(&base, "<p>merhaba</p>");

        assert_eq!(
            shared.query_pairs().filter(|(name, _)| name == SHARE_PARAM).count(),
            1
        );

        let token = take_share_token(&mut shared).unwrap();
        assert_eq!(decode_share(&token).unwrap(), "<p>merhaba</p>");
        assert_eq!(shared.as_str(), "https://ethos.example/editor?lang=tr");
    }

    #[test]
    fn test_take_token_clears_query() {
        let mut url = Url::parse("https://ethos.example/?data=PHA-PC9wPg").unwrap();
        assert_eq!(take_share_token(&mut url).as_deref(), Some("PHA-PC9wPg"));
        assert_eq!(url.query(), None);
        assert_eq!(take_share_token(&mut url), None);
    }

    #[test]
    fn test_memory_clipboard() {
        let mut clipboard = MemoryClipboard::new();
        clipboard.write_text("https://ethos.example/?data=x").unwrap();
        assert_eq!(clipboard.contents.as_deref(), Some("https://ethos.example/?data=x"));
    }
}
