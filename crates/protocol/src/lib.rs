//! Sluice Protocol - syslog wire formats and the metric model
//!
//! This crate provides the types that flow from the network into a sink:
//! - `SyslogMessage` - A parsed RFC5424 message
//! - `Parser` - Interface the receivers drive (stream framing + datagrams)
//! - `Rfc5424Parser` - Strict RFC5424 parser with RFC5425 octet counting
//! - `Metric` - Tags, typed fields and an emission timestamp
//!
//! # Design Principles
//!
//! - **Two entry points**: streams go through a `tokio_util` `Decoder`,
//!   datagrams through a plain function call
//! - **Best effort is explicit**: a partial message and its error travel
//!   together in `ParsedResult`
//! - **Framing errors are fatal, message errors are not**: a bad frame length
//!   loses the stream position, a bad message does not

mod error;
mod framing;
mod message;
mod metric;
mod parser;
pub mod rfc5424;

pub use error::{FrameError, ParseError};
pub use framing::OctetCountingDecoder;
pub use message::{Facility, Severity, StructuredData, SyslogMessage, decode_priority};
pub use metric::{FieldValue, Fields, MEASUREMENT, Metric, Tags};
pub use parser::{ParsedResult, Parser, Rfc5424Parser};

// Re-export bytes for convenience
pub use bytes::BytesMut;

/// Largest syslog message accepted, in bytes (64KB)
///
/// Also the datagram receive buffer size.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Default RFC5425 port
pub const DEFAULT_PORT: u16 = 6514;
