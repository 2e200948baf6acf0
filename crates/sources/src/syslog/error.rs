//! Receiver error taxonomy
//!
//! Startup errors are returned from `Receiver::start`. Everything that
//! happens afterwards reaches the sink through `Accumulator::report_error`.

use std::io;
use std::time::Duration;

use sluice_protocol::{FrameError, ParseError};

use super::address::AddressError;
use super::tls::TlsError;

/// Receiver errors
#[derive(Debug, thiserror::Error)]
pub enum ReceiverError {
    /// Listen address could not be resolved
    #[error(transparent)]
    Address(#[from] AddressError),

    /// Listener or socket could not be opened
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    /// TLS configuration could not be built
    #[error(transparent)]
    Tls(#[from] TlsError),

    /// `start` called on a running receiver
    #[error("receiver is already running")]
    AlreadyRunning,

    /// Accept failed; the accept loop ends
    #[error("accept on {address} failed: {source}")]
    Accept {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Read failed; the connection or datagram loop ends
    #[error("read from {peer} failed: {source}")]
    Read {
        peer: String,
        #[source]
        source: io::Error,
    },

    /// No data within the read timeout
    #[error("read from {peer} timed out after {timeout:?}")]
    ReadTimeout { peer: String, timeout: Duration },

    /// TLS handshake failed; the connection ends
    #[error("TLS handshake with {peer} failed: {source}")]
    Handshake {
        peer: String,
        #[source]
        source: io::Error,
    },

    /// Keep-alive could not be configured; the connection continues
    #[error("unable to configure keep alive ({address}): {source}")]
    KeepAlive {
        address: String,
        #[source]
        source: io::Error,
    },

    /// Stream framing violated; the connection ends
    #[error("framing error from {peer}: {source}")]
    Frame {
        peer: String,
        #[source]
        source: FrameError,
    },

    /// Message did not parse
    #[error("parse error from {peer}: {source}")]
    Parse {
        peer: String,
        #[source]
        source: ParseError,
    },
}

impl ReceiverError {
    /// Errors raised before the receiver is listening
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Self::Address(_) | Self::Bind { .. } | Self::Tls(_) | Self::AlreadyRunning
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let bind_err = ReceiverError::Bind {
            address: "tcp://0.0.0.0:514".into(),
            source: io::Error::new(io::ErrorKind::AddrInUse, "address in use"),
        };
        assert!(bind_err.to_string().contains("tcp://0.0.0.0:514"));
        assert!(bind_err.is_startup());

        let timeout = ReceiverError::ReadTimeout {
            peer: "127.0.0.1:4000".into(),
            timeout: Duration::from_millis(500),
        };
        assert!(timeout.to_string().contains("127.0.0.1:4000"));
        assert!(timeout.to_string().contains("500ms"));
        assert!(!timeout.is_startup());

        let parse = ReceiverError::Parse {
            peer: "peer".into(),
            source: ParseError::Version(4),
        };
        assert!(parse.to_string().starts_with("parse error from peer"));
    }

    #[test]
    fn test_address_error_is_transparent() {
        let err: ReceiverError = AddressError::InvalidAddress {
            address: "nope".into(),
            reason: "missing protocol",
        }
        .into();
        assert_eq!(
            err.to_string(),
            "invalid address 'nope': missing protocol"
        );
    }
}
