//! Base64 adapter for the content API, which ships file bodies as base64 text
//! wrapped at 60 columns.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

/// Errors that can occur when decoding content received from the API
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("content is not valid base64")]
    Base64(#[source] base64::DecodeError),

    #[error("content is not valid UTF-8")]
    Utf8(#[source] std::string::FromUtf8Error),
}

/// Decode API content into text, ignoring the line breaks the API inserts.
///
/// # Errors
///
/// Returns [`DecodeError::Base64`] if the payload is not base64, or
/// [`DecodeError::Utf8`] if the decoded bytes are not UTF-8 text.
pub fn decode_content(encoded: &str) -> Result<String, DecodeError> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    let bytes = STANDARD.decode(compact).map_err(DecodeError::Base64)?;
    String::from_utf8(bytes).map_err(DecodeError::Utf8)
}

/// Encode text for a content API write.
#[must_use]
pub fn encode_content(text: &str) -> String {
    STANDARD.encode(text.as_bytes())
}
