use thiserror::Error;

/// Failure to read wire bytes as text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TextDecodeError {
    #[error("invalid UTF8 bytes {0}")]
    InvalidUtf8(String),

    #[error("invalid ASCII bytes {0}")]
    InvalidAscii(String),
}

/// Byte helpers shared by the codecs and the column decoder.
pub struct ByteUtils;

impl ByteUtils {
    /// Lower-case hex rendering, two digits per byte.
    pub fn to_hex(bytes: &[u8]) -> String {
        hex::encode(bytes)
    }

    /// Strict UTF-8 decoding.
    pub fn decode_utf8(bytes: &[u8]) -> Result<&str, TextDecodeError> {
        std::str::from_utf8(bytes).map_err(|_| TextDecodeError::InvalidUtf8(Self::to_hex(bytes)))
    }

    /// Strict 7-bit ASCII decoding.
    pub fn decode_ascii(bytes: &[u8]) -> Result<&str, TextDecodeError> {
        if bytes.is_ascii() {
            // ASCII is always valid UTF-8
            std::str::from_utf8(bytes)
                .map_err(|_| TextDecodeError::InvalidAscii(Self::to_hex(bytes)))
        } else {
            Err(TextDecodeError::InvalidAscii(Self::to_hex(bytes)))
        }
    }

    /// UTF-8 decoding that yields an empty string instead of failing.
    pub fn best_effort_utf8(bytes: &[u8]) -> String {
        Self::decode_utf8(bytes)
            .map(str::to_string)
            .unwrap_or_default()
    }
}
