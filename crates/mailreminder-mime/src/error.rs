//! Errors raised while parsing or decoding MIME entities.

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME parsing errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A Content-Type header value that cannot be parsed.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Malformed transfer-encoded content.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 content that does not decode.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// Multipart content type without a boundary parameter.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// Nesting deeper than the parser is willing to follow.
    #[error("Multipart nesting exceeds {0} levels")]
    TooDeep(usize),
}
