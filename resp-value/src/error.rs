//! Error types for RESP value construction, parsing, and encoding.

/// Error type for all fallible operations in this crate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RespError {
    /// Need more data to complete parsing.
    /// This is not a fatal error - the caller should buffer more data and retry.
    /// The high-level [`try_parse`](crate::try_parse) entry point reports this
    /// condition as `Ok(None)` instead.
    #[error("incomplete frame")]
    Incomplete,

    /// A length or size precondition was violated.
    #[error("out of range: {0}")]
    OutOfRange(&'static str),

    /// A value of the wrong kind was passed to a typed factory.
    #[error("invalid argument: {0}")]
    Argument(&'static str),

    /// Malformed numeric text on the wire.
    #[error("format error: {0}")]
    Format(&'static str),

    /// The operation cannot be completed in the current state.
    #[error("invalid operation: {0}")]
    Invalid(&'static str),

    /// A `\r` was not followed by `\n` where the framing requires it.
    #[error("expected newline, found byte {0:#04x}")]
    ExpectedNewLine(u8),

    /// Unknown wire prefix byte.
    #[error("unimplemented frame prefix: {0:#04x}")]
    TypeNotImplemented(u8),

    /// An error reply surfaced by [`check_error`](crate::RespValue::check_error).
    #[error("server error: {0}")]
    ErrorReply(String),
}

impl RespError {
    /// Returns true if this error indicates more data is needed.
    #[inline]
    pub fn is_incomplete(&self) -> bool {
        matches!(self, RespError::Incomplete)
    }
}
