//! Payload text convention: `"<formatTag>,<base64 body>"`.
//!
//! Only the first comma separates the format tag from the body. The body is
//! standard base64 with padding.

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::error::DecodeError;

/// Separator between the format tag and the encoded body.
pub const DELIMITER: char = ',';

/// A fully reassembled payload split into its format tag and raw bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconstructedPayload {
    format_tag: String,
    body: Vec<u8>,
}

impl ReconstructedPayload {
    #[must_use]
    pub fn new(format_tag: impl Into<String>, body: Vec<u8>) -> Self {
        Self {
            format_tag: format_tag.into(),
            body,
        }
    }

    /// Split `text` on its first delimiter and decode the body.
    ///
    /// ```
    /// use chunkframe::payload::ReconstructedPayload;
    ///
    /// let payload = ReconstructedPayload::parse("img,aGk=").expect("valid payload");
    /// assert_eq!(payload.format_tag(), "img");
    /// assert_eq!(payload.body(), b"hi");
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::MissingDelimiter`] when `text` has no comma and
    /// [`DecodeError::Base64`] when the body is not valid base64.
    pub fn parse(text: &str) -> Result<Self, DecodeError> {
        let (format_tag, encoded) = text
            .split_once(DELIMITER)
            .ok_or(DecodeError::MissingDelimiter)?;
        let body = STANDARD.decode(encoded)?;
        Ok(Self::new(format_tag, body))
    }

    /// Render the payload back into its text form.
    #[must_use]
    pub fn to_text(&self) -> String { encode_text(&self.format_tag, &self.body) }

    #[must_use]
    pub fn format_tag(&self) -> &str { &self.format_tag }

    #[must_use]
    pub fn body(&self) -> &[u8] { &self.body }

    #[must_use]
    pub fn into_parts(self) -> (String, Vec<u8>) { (self.format_tag, self.body) }
}

/// Render `format_tag` and `body` in payload text form.
#[must_use]
pub fn encode_text(format_tag: &str, body: &[u8]) -> String {
    let mut text = String::with_capacity(format_tag.len() + 1 + body.len().div_ceil(3) * 4);
    text.push_str(format_tag);
    text.push(DELIMITER);
    STANDARD.encode_string(body, &mut text);
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_first_comma_only() {
        let payload = ReconstructedPayload::parse("data:image/jpeg;base64,/9j/").expect("parse");
        assert_eq!(payload.format_tag(), "data:image/jpeg;base64");
        assert_eq!(payload.body(), &[0xff, 0xd8, 0xff]);
    }

    #[test]
    fn body_with_internal_comma_is_a_decode_error() {
        assert!(matches!(
            ReconstructedPayload::parse("img,AAAA,BBBB"),
            Err(DecodeError::Base64(_))
        ));
    }

    #[test]
    fn missing_delimiter_is_rejected() {
        assert_eq!(
            ReconstructedPayload::parse("AAAA"),
            Err(DecodeError::MissingDelimiter)
        );
    }

    #[test]
    fn empty_body_is_allowed() {
        let payload = ReconstructedPayload::parse("img,").expect("parse");
        assert!(payload.body().is_empty());
        assert_eq!(payload.to_text(), "img,");
    }

    #[test]
    fn text_round_trips() {
        let payload = ReconstructedPayload::new("image/png", vec![0, 1, 2, 250, 251]);
        assert_eq!(ReconstructedPayload::parse(&payload.to_text()), Ok(payload));
    }
}
