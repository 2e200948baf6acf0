//! Receiver facade
//!
//! Startup resolves the address, opens the transport and spawns exactly one
//! long-lived task (accept loop or datagram read loop). Shutdown cancels that
//! task, force-closes tracked connections and waits for every task to exit.
//!
//! # Example
//!
//! ```ignore
//! let receiver = Receiver::new(ReceiverConfig {
//!     server: "udp://:6514".into(),
//!     ..Default::default()
//! });
//! receiver.start(Arc::new(MemoryAccumulator::new())).await?;
//! // ...
//! receiver.stop().await;
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use sluice_protocol::{Parser, Rfc5424Parser};
use tokio::sync::Mutex;
use tokio_rustls::TlsAcceptor;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use super::address::{Address, Family};
use super::datagram::{self, DatagramContext};
use super::emitter::Emitter;
use super::error::ReceiverError;
use super::registry::ConnectionRegistry;
use super::sequencer::TimestampSequencer;
use super::sink::Accumulator;
use super::stream::{self, StreamContext};
use super::tls::{NoTls, TlsProvider};
use super::transport::{DatagramSocket, StreamListener};
use crate::common::{MetricsSnapshot, ReceiverMetrics};

/// Default listen address (RFC5425 section 4.1)
pub const DEFAULT_SERVER: &str = "tcp://:6514";

/// Default read timeout (500ms)
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Default structured data separator
pub const DEFAULT_SDPARAM_SEPARATOR: &str = "_";

// =============================================================================
// Configuration
// =============================================================================

/// Receiver configuration, fixed once started
#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    /// `scheme://host[:port]` or `scheme://path`
    pub server: String,

    /// TCP keep-alive period: `None` keeps the OS default, zero disables
    pub keep_alive_period: Option<Duration>,

    /// Read timeout: `None` or zero means unlimited
    pub read_timeout: Option<Duration>,

    /// Maximum concurrent stream connections (0 = unlimited)
    pub max_connections: usize,

    /// Keep partially parsed messages
    pub best_effort: bool,

    /// Joins SD-ID and parameter name into a field key
    pub sdparam_separator: String,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.into(),
            keep_alive_period: None,
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            max_connections: 0,
            best_effort: false,
            sdparam_separator: DEFAULT_SDPARAM_SEPARATOR.into(),
        }
    }
}

impl ReceiverConfig {
    /// Config listening on `server` with defaults for everything else
    pub fn with_server(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Default::default()
        }
    }

    fn effective_read_timeout(&self) -> Option<Duration> {
        self.read_timeout.filter(|timeout| !timeout.is_zero())
    }
}

// =============================================================================
// Receiver
// =============================================================================

/// State of a started receiver
struct Running {
    address: Address,
    local_addr: Option<SocketAddr>,
    shutdown: CancellationToken,
    tracker: TaskTracker,
    registry: Option<Arc<ConnectionRegistry>>,
}

/// Syslog receiver over one stream or datagram transport
pub struct Receiver<P: Parser = Rfc5424Parser> {
    config: ReceiverConfig,
    parser: Arc<P>,
    tls: Arc<dyn TlsProvider>,
    sequencer: Arc<TimestampSequencer>,
    metrics: Arc<ReceiverMetrics>,

    /// Serializes start and stop
    state: Mutex<Option<Running>>,
}

impl Receiver<Rfc5424Parser> {
    /// Create a receiver with the RFC5424 parser and no TLS
    pub fn new(config: ReceiverConfig) -> Self {
        Self::with_parser(config, Rfc5424Parser::new())
    }
}

impl<P: Parser> Receiver<P> {
    /// Create a receiver with a custom parser
    pub fn with_parser(config: ReceiverConfig, parser: P) -> Self {
        Self {
            config,
            parser: Arc::new(parser),
            tls: Arc::new(NoTls),
            sequencer: Arc::new(TimestampSequencer::new()),
            metrics: Arc::new(ReceiverMetrics::new()),
            state: Mutex::new(None),
        }
    }

    /// Use a TLS provider for stream transports
    pub fn with_tls(mut self, provider: impl TlsProvider) -> Self {
        self.tls = Arc::new(provider);
        self
    }

    /// Share a timestamp sequencer, e.g. across receivers feeding one sink
    pub fn with_sequencer(mut self, sequencer: Arc<TimestampSequencer>) -> Self {
        self.sequencer = sequencer;
        self
    }

    /// Receiver configuration
    pub fn config(&self) -> &ReceiverConfig {
        &self.config
    }

    /// Start listening; returns once the transport is open
    ///
    /// # Errors
    ///
    /// Address resolution, TLS setup and bind failures. Nothing is left
    /// running on error.
    pub async fn start(&self, sink: Arc<dyn Accumulator>) -> Result<(), ReceiverError> {
        let mut state = self.state.lock().await;
        if state.is_some() {
            return Err(ReceiverError::AlreadyRunning);
        }

        let address = Address::resolve(&self.config.server)?;
        let emitter = Arc::new(Emitter::new(
            sink,
            Arc::clone(&self.sequencer),
            Arc::clone(&self.metrics),
            self.config.sdparam_separator.clone(),
        ));
        let shutdown = CancellationToken::new();
        let tracker = TaskTracker::new();

        let bind_error = |source| ReceiverError::Bind {
            address: address.to_string(),
            source,
        };

        let (local_addr, registry) = match address.family() {
            Family::Stream => {
                let tls = self.tls.server_config()?.map(TlsAcceptor::from);
                let listener = StreamListener::bind(&address).await.map_err(bind_error)?;
                let local_addr = listener.local_addr();
                let registry = Arc::new(ConnectionRegistry::new(self.config.max_connections));

                let ctx = Arc::new(StreamContext {
                    parser: Arc::clone(&self.parser),
                    emitter,
                    registry: Arc::clone(&registry),
                    tls,
                    tracker: tracker.clone(),
                    address: address.to_string(),
                    keep_alive: self.config.keep_alive_period,
                    read_timeout: self.config.effective_read_timeout(),
                    best_effort: self.config.best_effort,
                });
                tracker.spawn(stream::accept_loop(listener, ctx, shutdown.clone()));
                (local_addr, Some(registry))
            }
            Family::Datagram => {
                let socket = DatagramSocket::bind(&address).await.map_err(bind_error)?;
                let local_addr = socket.local_addr();

                let ctx = DatagramContext {
                    parser: Arc::clone(&self.parser),
                    emitter,
                    address: address.to_string(),
                    read_timeout: self.config.effective_read_timeout(),
                    best_effort: self.config.best_effort,
                };
                tracker.spawn(datagram::read_loop(socket, ctx, shutdown.clone()));
                (local_addr, None)
            }
        };

        tracing::info!(
            address = %address,
            local_addr = ?local_addr,
            max_connections = self.config.max_connections,
            best_effort = self.config.best_effort,
            "syslog receiver listening"
        );

        *state = Some(Running {
            address,
            local_addr,
            shutdown,
            tracker,
            registry,
        });
        Ok(())
    }

    /// Stop and wait for every task to exit; no-op when not running
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;
        let Some(running) = state.take() else {
            return;
        };

        running.shutdown.cancel();
        running.tracker.close();
        running.tracker.wait().await;

        tracing::info!(
            address = %running.address,
            metrics = ?self.metrics.snapshot(),
            "syslog receiver stopped"
        );
    }

    /// Pull hook; metrics are pushed as they arrive
    pub fn collect(&self) {}

    /// Whether the receiver is started
    pub async fn is_running(&self) -> bool {
        self.state.lock().await.is_some()
    }

    /// Bound socket address for network transports
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.state.lock().await.as_ref().and_then(|r| r.local_addr)
    }

    /// Live stream connections (0 for datagram transports)
    pub async fn connection_count(&self) -> usize {
        self.state
            .lock()
            .await
            .as_ref()
            .and_then(|r| r.registry.as_ref())
            .map_or(0, |registry| registry.len())
    }

    /// Counter snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl<P: Parser> Drop for Receiver<P> {
    fn drop(&mut self) {
        // Tasks notice and exit on their own; nobody is left to wait for them
        if let Some(running) = self.state.get_mut().take() {
            running.shutdown.cancel();
        }
    }
}

#[cfg(test)]
#[path = "receiver_test.rs"]
mod receiver_test;
