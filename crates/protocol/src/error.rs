//! Protocol error types
//!
//! Errors raised while parsing RFC5424 messages or splitting an RFC5425
//! octet-counted stream into frames.

use std::io;

use thiserror::Error;

/// Errors that can occur while parsing a single RFC5424 message
///
/// Every variant carries the zero-based byte offset at which parsing failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Nothing to parse
    #[error("empty input")]
    Empty,

    /// Missing or malformed `<PRIVAL>`
    #[error("expecting a priority value within angle brackets [col {0}]")]
    Priority(usize),

    /// PRIVAL outside 0..=191
    #[error("expecting a priority value in the range 0-191 [col {0}]")]
    PriorityRange(usize),

    /// Malformed VERSION
    #[error("expecting a version value in the range 1-999 [col {0}]")]
    Version(usize),

    /// Expected a single space separator
    #[error("expecting a space [col {0}]")]
    Space(usize),

    /// Malformed TIMESTAMP
    #[error("expecting an RFC3339 timestamp or a nil value [col {0}]")]
    Timestamp(usize),

    /// Malformed HOSTNAME
    #[error("expecting a hostname (1 to 255 printable US-ASCII characters) or a nil value [col {0}]")]
    Hostname(usize),

    /// Malformed APP-NAME
    #[error("expecting an app-name (1 to 48 printable US-ASCII characters) or a nil value [col {0}]")]
    AppName(usize),

    /// Malformed PROCID
    #[error("expecting a procid (1 to 128 printable US-ASCII characters) or a nil value [col {0}]")]
    ProcId(usize),

    /// Malformed MSGID
    #[error("expecting a msgid (1 to 32 printable US-ASCII characters) or a nil value [col {0}]")]
    MsgId(usize),

    /// Malformed STRUCTURED-DATA section
    #[error("expecting structured data elements (`[id( key=\"value\")*]+`) or a nil value [col {0}]")]
    StructuredData(usize),

    /// Malformed SD-ID
    #[error("expecting a structured data element id (1 to 32 printable US-ASCII characters except `=`, ` `, `]` and `\"`) [col {0}]")]
    SdId(usize),

    /// The same SD-ID appeared twice in one message
    #[error("duplicate structured data element id '{id}' [col {position}]")]
    DuplicateSdId {
        /// The repeated identifier
        id: String,
        /// Offset of the repeated element
        position: usize,
    },

    /// Malformed PARAM-NAME
    #[error("expecting a structured data parameter name (1 to 32 printable US-ASCII characters except `=`, ` `, `]` and `\"`) [col {0}]")]
    SdParamName(usize),

    /// Malformed or unterminated PARAM-VALUE
    #[error("expecting a quoted UTF-8 structured data parameter value [col {0}]")]
    SdParamValue(usize),
}

impl ParseError {
    /// Byte offset where parsing stopped, if the error has one
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Empty => None,
            Self::Priority(p)
            | Self::PriorityRange(p)
            | Self::Version(p)
            | Self::Space(p)
            | Self::Timestamp(p)
            | Self::Hostname(p)
            | Self::AppName(p)
            | Self::ProcId(p)
            | Self::MsgId(p)
            | Self::StructuredData(p)
            | Self::SdId(p)
            | Self::SdParamName(p)
            | Self::SdParamValue(p) => Some(*p),
            Self::DuplicateSdId { position, .. } => Some(*position),
        }
    }
}

/// Errors that break RFC5425 framing
///
/// Unlike [`ParseError`] these are not recoverable: once the octet count is
/// lost there is no way to find the next message boundary.
#[derive(Debug, Error)]
pub enum FrameError {
    /// MSG-LEN is not `NONZERO-DIGIT *DIGIT` followed by a space
    #[error("invalid octet count prefix at byte {position}")]
    InvalidLength { position: usize },

    /// MSG-LEN exceeds what the receiver accepts
    #[error("frame length {length} exceeds maximum {max}")]
    TooLarge { length: usize, max: usize },

    /// The stream ended inside a frame
    #[error("stream ended inside a frame with {remaining} bytes buffered")]
    Truncated { remaining: usize },

    /// I/O error surfaced through the decoder
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl FrameError {
    /// Create an invalid length error
    #[inline]
    pub fn invalid_length(position: usize) -> Self {
        Self::InvalidLength { position }
    }

    /// Create a frame too large error
    #[inline]
    pub fn too_large(length: usize, max: usize) -> Self {
        Self::TooLarge { length, max }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_position() {
        assert_eq!(ParseError::Empty.position(), None);
        assert_eq!(ParseError::Hostname(17).position(), Some(17));
        let dup = ParseError::DuplicateSdId {
            id: "origin".into(),
            position: 40,
        };
        assert_eq!(dup.position(), Some(40));
        assert!(dup.to_string().contains("origin"));
    }

    #[test]
    fn test_frame_error_display() {
        let err = FrameError::too_large(70000, 65536);
        assert!(err.to_string().contains("70000"));
        assert!(err.to_string().contains("65536"));

        let err = FrameError::invalid_length(3);
        assert!(err.to_string().contains("byte 3"));
    }
}
