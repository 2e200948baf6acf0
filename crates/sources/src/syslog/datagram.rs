//! Datagram receiver
//!
//! A single task reads one datagram at a time and parses it as exactly one
//! message. The read timeout is armed after the first datagram and re-armed
//! after every successful read, so it bounds the silence between datagrams.

use std::sync::Arc;
use std::time::Duration;

use sluice_protocol::{MAX_MESSAGE_SIZE, Parser};
use tokio_util::sync::CancellationToken;

use super::emitter::Emitter;
use super::error::ReceiverError;
use super::stream::within;
use super::transport::DatagramSocket;

/// Settings and collaborators of the read loop
pub(crate) struct DatagramContext<P: Parser> {
    pub parser: Arc<P>,
    pub emitter: Arc<Emitter>,
    /// Listen address, for error messages
    pub address: String,
    pub read_timeout: Option<Duration>,
    pub best_effort: bool,
}

/// Read datagrams until shutdown, a read error or a timeout
pub(crate) async fn read_loop<P: Parser>(
    socket: DatagramSocket,
    ctx: DatagramContext<P>,
    shutdown: CancellationToken,
) {
    let mut buf = vec![0u8; MAX_MESSAGE_SIZE];
    let mut deadline = None;

    loop {
        let received = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            received = within(deadline, socket.recv(&mut buf)) => received,
        };

        match received {
            Ok(Ok((len, peer))) => {
                deadline = ctx.read_timeout;
                tracing::trace!(peer = %peer, bytes = len, "datagram");
                ctx.emitter.metrics().bytes_read(len as u64);

                let result = ctx.parser.parse(&buf[..len], ctx.best_effort);
                ctx.emitter.emit(&peer, result);
            }
            Ok(Err(source)) => {
                ctx.emitter.report(ReceiverError::Read {
                    peer: ctx.address.clone(),
                    source,
                });
                break;
            }
            Err(timeout) => {
                ctx.emitter.report(ReceiverError::ReadTimeout {
                    peer: ctx.address.clone(),
                    timeout,
                });
                break;
            }
        }
    }

    drop(socket);
    tracing::debug!(address = %ctx.address, "datagram loop stopped");
}

#[cfg(test)]
#[path = "datagram_test.rs"]
mod datagram_test;
