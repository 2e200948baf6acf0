//! Receiver counters
//!
//! Lock-free counters shared by the accept loop, connection tasks and the
//! datagram loop.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters for one receiver
#[derive(Debug, Default)]
pub struct ReceiverMetrics {
    /// Currently active connections
    pub connections_active: AtomicU64,

    /// Total connections admitted
    pub connections_total: AtomicU64,

    /// Connections closed at admission because the limit was reached
    pub connections_rejected: AtomicU64,

    /// Messages (frames or datagrams) received
    pub messages_received: AtomicU64,

    /// Bytes received
    pub bytes_received: AtomicU64,

    /// Metrics handed to the sink
    pub metrics_emitted: AtomicU64,

    /// Errors reported to the sink
    pub errors: AtomicU64,
}

impl ReceiverMetrics {
    /// Create new metrics instance
    pub const fn new() -> Self {
        Self {
            connections_active: AtomicU64::new(0),
            connections_total: AtomicU64::new(0),
            connections_rejected: AtomicU64::new(0),
            messages_received: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            metrics_emitted: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }

    /// Increment active connections
    #[inline]
    pub fn connection_opened(&self) {
        self.connections_active.fetch_add(1, Ordering::Relaxed);
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Decrement active connections
    #[inline]
    pub fn connection_closed(&self) {
        self.connections_active.fetch_sub(1, Ordering::Relaxed);
    }

    /// Record a rejected connection
    #[inline]
    pub fn connection_rejected(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a received message (frame or datagram)
    #[inline]
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record bytes read from a socket
    #[inline]
    pub fn bytes_read(&self, bytes: u64) {
        self.bytes_received.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record an emitted metric
    #[inline]
    pub fn metric_emitted(&self) {
        self.metrics_emitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a reported error
    #[inline]
    pub fn error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_rejected: self.connections_rejected.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            metrics_emitted: self.metrics_emitted.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub connections_active: u64,
    pub connections_total: u64,
    pub connections_rejected: u64,
    pub messages_received: u64,
    pub bytes_received: u64,
    pub metrics_emitted: u64,
    pub errors: u64,
}
