//! Syslog Receivers
//!
//! RFC 5424 messages over RFC 5425 octet-counted streams or one message per
//! datagram, converted to metrics and pushed to an [`Accumulator`].
//!
//! # Transports
//!
//! - **Stream** - `tcp`, `tcp4`, `tcp6`, `unix`, `unixpacket`, optionally TLS
//! - **Datagram** - `udp`, `udp4`, `udp6`, `unixgram`
//!
//! Raw IP schemes (`ip`, `ip4`, `ip6`) are recognized as datagram transports
//! but cannot be bound.
//!
//! # Design
//!
//! - One long-lived task per receiver (accept loop or datagram read loop)
//! - One task per admitted stream connection, tracked for shutdown
//! - Metric timestamps come from a shared sequencer and never repeat

mod address;
mod datagram;
mod emitter;
mod error;
mod mapper;
mod receiver;
mod registry;
mod sequencer;
mod sink;
mod stream;
mod tls;
mod transport;

pub use address::{Address, AddressError, Endpoint, Family, IpVersion, Scheme};
pub use error::ReceiverError;
pub use mapper::{fields, tags, to_metric};
pub use receiver::{
    DEFAULT_READ_TIMEOUT, DEFAULT_SDPARAM_SEPARATOR, DEFAULT_SERVER, Receiver, ReceiverConfig,
};
pub use registry::{ConnectionId, ConnectionRegistry};
pub use sequencer::{Clock, SystemClock, TimestampSequencer};
pub use sink::{Accumulator, MemoryAccumulator};
pub use tls::{NoTls, PemTlsProvider, TlsError, TlsProvider};
