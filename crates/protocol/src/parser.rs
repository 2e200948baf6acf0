//! Parser interface consumed by the receivers
//!
//! A [`Parser`] offers two entry points that match the two transport
//! families:
//!
//! - **Stream** - [`Parser::framer`] returns a `tokio_util` [`Decoder`] that
//!   finds message boundaries in a byte stream and yields one
//!   [`ParsedResult`] per frame. A decoder error is a framing failure and
//!   ends the stream.
//! - **Datagram** - [`Parser::parse`] treats the whole payload as exactly one
//!   message.

use tokio_util::codec::Decoder;

use crate::error::{FrameError, ParseError};
use crate::framing::OctetCountingDecoder;
use crate::message::SyslogMessage;
use crate::rfc5424;

/// Outcome of parsing one message
///
/// `message` and `error` are not exclusive: in best-effort mode a partially
/// populated message travels together with the error that cut it short.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedResult {
    /// The (possibly partial) message
    pub message: Option<SyslogMessage>,

    /// The message-level error, if any
    pub error: Option<ParseError>,
}

impl ParsedResult {
    /// A fully parsed message
    pub fn parsed(message: SyslogMessage) -> Self {
        Self {
            message: Some(message),
            error: None,
        }
    }

    /// A partial message plus the error that stopped parsing
    pub fn partial(message: SyslogMessage, error: ParseError) -> Self {
        Self {
            message: Some(message),
            error: Some(error),
        }
    }

    /// No usable message
    pub fn failed(error: ParseError) -> Self {
        Self {
            message: None,
            error: Some(error),
        }
    }

    /// True when parsing completed without error
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Syslog parser used by stream and datagram receivers
pub trait Parser: Send + Sync + 'static {
    /// Per-connection stream framer
    type Framer: Decoder<Item = ParsedResult, Error = FrameError> + Send + 'static;

    /// Create a fresh framer for one stream connection
    fn framer(&self, best_effort: bool) -> Self::Framer;

    /// Parse a single datagram payload
    fn parse(&self, input: &[u8], best_effort: bool) -> ParsedResult;
}

/// RFC5424 messages, RFC5425 octet-counted framing on streams
#[derive(Debug, Clone)]
pub struct Rfc5424Parser {
    max_frame_length: usize,
}

impl Rfc5424Parser {
    /// Create a parser with the default frame limit
    pub fn new() -> Self {
        Self {
            max_frame_length: crate::MAX_MESSAGE_SIZE,
        }
    }

    /// Override the largest MSG-LEN accepted on streams
    pub fn with_max_frame_length(mut self, max_frame_length: usize) -> Self {
        self.max_frame_length = max_frame_length;
        self
    }

    /// Largest MSG-LEN accepted on streams
    pub fn max_frame_length(&self) -> usize {
        self.max_frame_length
    }
}

impl Default for Rfc5424Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser for Rfc5424Parser {
    type Framer = OctetCountingDecoder;

    fn framer(&self, best_effort: bool) -> Self::Framer {
        OctetCountingDecoder::new(best_effort).with_max_frame_length(self.max_frame_length)
    }

    fn parse(&self, input: &[u8], best_effort: bool) -> ParsedResult {
        rfc5424::parse(input, best_effort)
    }
}
