//! Stream receiver
//!
//! One accept loop per receiver and one task per admitted connection.
//!
//! # Connection lifecycle
//!
//! ```text
//! accepted -> admitted? -(no)-> closed, no task
//!                |
//!               yes -> keep-alive -> task: [TLS handshake] -> read loop -> cleanup
//! ```
//!
//! Cleanup removes the connection from the registry before the socket is
//! closed, on every exit path.
//!
//! # Shutdown
//!
//! The receiver cancels its shutdown token. The accept loop drops the
//! listener, then cancels every registered connection's token. Connection
//! tasks observe the cancellation between reads and exit without reporting.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use sluice_protocol::{ParsedResult, Parser};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio_rustls::TlsAcceptor;
use tokio_rustls::server::TlsStream;
use tokio_util::codec::Decoder;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::emitter::Emitter;
use super::error::ReceiverError;
use super::registry::{ConnectionId, ConnectionRegistry};
use super::transport::{StreamConn, StreamListener, set_keep_alive};

/// Room reserved in the read buffer before every read (64KB)
///
/// Seqpacket sockets truncate a packet larger than the space offered.
const READ_RESERVE: usize = 64 * 1024;

/// Settings and collaborators shared by every connection of one receiver
pub(crate) struct StreamContext<P: Parser> {
    pub parser: Arc<P>,
    pub emitter: Arc<Emitter>,
    pub registry: Arc<ConnectionRegistry>,
    pub tls: Option<TlsAcceptor>,
    pub tracker: TaskTracker,
    /// Listen address, for error messages
    pub address: String,
    pub keep_alive: Option<Duration>,
    pub read_timeout: Option<Duration>,
    pub best_effort: bool,
}

/// Accept connections until shutdown or an accept error
pub(crate) async fn accept_loop<P: Parser>(
    listener: StreamListener,
    ctx: Arc<StreamContext<P>>,
    shutdown: CancellationToken,
) {
    loop {
        let accepted = tokio::select! {
            biased;
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => accepted,
        };

        let (conn, peer) = match accepted {
            Ok(accepted) => accepted,
            Err(source) => {
                ctx.emitter.report(ReceiverError::Accept {
                    address: ctx.address.clone(),
                    source,
                });
                break;
            }
        };

        let close = CancellationToken::new();
        let Some(id) = ctx.registry.try_admit(&peer, close.clone()) else {
            ctx.emitter.metrics().connection_rejected();
            tracing::debug!(
                peer = %peer,
                max_connections = ctx.registry.max_connections(),
                "connection limit reached, closing"
            );
            continue;
        };
        ctx.emitter.metrics().connection_opened();
        tracing::debug!(peer = %peer, connection = %id, "connection admitted");

        if let (Some(period), Some(tcp)) = (ctx.keep_alive, conn.as_tcp())
            && let Err(source) = set_keep_alive(tcp, period)
        {
            ctx.emitter.report(ReceiverError::KeepAlive {
                address: ctx.address.clone(),
                source,
            });
        }

        let session = StreamSession {
            ctx: Arc::clone(&ctx),
            id,
            peer,
            close,
        };
        ctx.tracker.spawn(session.run(conn));
    }

    // Closes the socket (and removes a unix path) before connections go
    drop(listener);
    let closing = ctx.registry.close_all();
    tracing::debug!(address = %ctx.address, connections = closing, "accept loop stopped");
}

/// One admitted connection
struct StreamSession<P: Parser> {
    ctx: Arc<StreamContext<P>>,
    id: ConnectionId,
    peer: String,
    close: CancellationToken,
}

impl<P: Parser> StreamSession<P> {
    async fn run(self, conn: StreamConn) {
        match self.ctx.tls.clone() {
            None => self.serve(conn).await,
            Some(acceptor) => match self.handshake(&acceptor, conn).await {
                Some(stream) => self.serve(stream).await,
                None => drop(self.cleanup()),
            },
        }
    }

    /// `None` when the handshake failed or the receiver is shutting down
    async fn handshake(
        &self,
        acceptor: &TlsAcceptor,
        conn: StreamConn,
    ) -> Option<TlsStream<StreamConn>> {
        let accept = within(self.ctx.read_timeout, acceptor.accept(conn));
        let result = tokio::select! {
            biased;
            _ = self.close.cancelled() => return None,
            result = accept => result,
        };

        match result {
            Ok(Ok(stream)) => Some(stream),
            Ok(Err(source)) => {
                self.ctx.emitter.report(ReceiverError::Handshake {
                    peer: self.peer.clone(),
                    source,
                });
                None
            }
            Err(timeout) => {
                self.ctx.emitter.report(ReceiverError::ReadTimeout {
                    peer: self.peer.clone(),
                    timeout,
                });
                None
            }
        }
    }

    async fn serve<S: AsyncRead + Unpin>(&self, mut stream: S) {
        // Dropped before `stream`: deregister, then close
        let _cleanup = self.cleanup();
        self.read_loop(&mut stream).await;
    }

    async fn read_loop<S: AsyncRead + Unpin>(&self, stream: &mut S) {
        let mut framer = self.ctx.parser.framer(self.ctx.best_effort);
        let mut buf = BytesMut::with_capacity(READ_RESERVE);

        loop {
            loop {
                match framer.decode(&mut buf) {
                    Ok(Some(result)) => {
                        if !self.forward(result) {
                            return;
                        }
                    }
                    Ok(None) => break,
                    Err(source) => {
                        self.report_frame_error(source);
                        return;
                    }
                }
            }

            buf.reserve(READ_RESERVE);
            let read = tokio::select! {
                biased;
                _ = self.close.cancelled() => return,
                read = within(self.ctx.read_timeout, stream.read_buf(&mut buf)) => read,
            };

            match read {
                Ok(Ok(0)) => {
                    self.finish(&mut framer, &mut buf);
                    return;
                }
                Ok(Ok(n)) => {
                    tracing::trace!(peer = %self.peer, bytes = n, "read");
                    self.ctx.emitter.metrics().bytes_read(n as u64);
                }
                Ok(Err(source)) => {
                    self.ctx.emitter.report(ReceiverError::Read {
                        peer: self.peer.clone(),
                        source,
                    });
                    return;
                }
                Err(timeout) => {
                    self.ctx.emitter.report(ReceiverError::ReadTimeout {
                        peer: self.peer.clone(),
                        timeout,
                    });
                    return;
                }
            }
        }
    }

    /// Drain what is left at end of stream
    fn finish(&self, framer: &mut P::Framer, buf: &mut BytesMut) {
        loop {
            match framer.decode_eof(buf) {
                Ok(Some(result)) => {
                    if !self.forward(result) {
                        return;
                    }
                }
                Ok(None) => return,
                Err(source) => {
                    self.report_frame_error(source);
                    return;
                }
            }
        }
    }

    /// Emit one result; `false` ends the session
    fn forward(&self, result: ParsedResult) -> bool {
        let keep_going = result.is_ok() || self.ctx.best_effort;
        self.ctx.emitter.emit(&self.peer, result);
        keep_going
    }

    fn report_frame_error(&self, source: sluice_protocol::FrameError) {
        self.ctx.emitter.report(ReceiverError::Frame {
            peer: self.peer.clone(),
            source,
        });
    }

    fn cleanup(&self) -> SessionCleanup<'_> {
        SessionCleanup {
            registry: &self.ctx.registry,
            emitter: &self.ctx.emitter,
            id: self.id,
            peer: &self.peer,
        }
    }
}

/// Deregisters a connection when dropped
struct SessionCleanup<'a> {
    registry: &'a ConnectionRegistry,
    emitter: &'a Emitter,
    id: ConnectionId,
    peer: &'a str,
}

impl Drop for SessionCleanup<'_> {
    fn drop(&mut self) {
        self.registry.remove(self.id);
        self.emitter.metrics().connection_closed();
        tracing::debug!(peer = %self.peer, connection = %self.id, "connection closed");
    }
}

/// Run `future` under an optional time limit; `Err` carries the limit
pub(crate) async fn within<F: Future>(
    limit: Option<Duration>,
    future: F,
) -> Result<F::Output, Duration> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, future)
            .await
            .map_err(|_| limit),
        None => Ok(future.await),
    }
}

#[cfg(test)]
#[path = "stream_test.rs"]
mod stream_test;
