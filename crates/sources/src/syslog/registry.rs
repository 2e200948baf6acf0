//! Live stream connection tracking
//!
//! The registry enforces `max_connections` and lets shutdown force-close
//! every connection. It holds close handles only: each connection task owns
//! its socket and closes it once its cancellation token fires.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

/// Registry key, unique per accepted connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

struct Entry {
    peer: String,
    close: CancellationToken,
}

/// Admission control and bulk close for stream connections
pub struct ConnectionRegistry {
    max_connections: usize,
    next_id: AtomicU64,
    connections: Mutex<HashMap<ConnectionId, Entry>>,
}

impl ConnectionRegistry {
    /// Create a registry; `max_connections == 0` means unlimited
    pub fn new(max_connections: usize) -> Self {
        Self {
            max_connections,
            next_id: AtomicU64::new(1),
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Register a connection unless the registry is full
    ///
    /// `None` means rejected; the caller closes the socket without spawning
    /// a handler.
    pub fn try_admit(&self, peer: &str, close: CancellationToken) -> Option<ConnectionId> {
        let mut connections = self.connections.lock();
        if self.max_connections > 0 && connections.len() >= self.max_connections {
            return None;
        }

        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        connections.insert(
            id,
            Entry {
                peer: peer.to_owned(),
                close,
            },
        );
        Some(id)
    }

    /// Forget a connection; removing twice is a no-op
    pub fn remove(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(&id).is_some()
    }

    /// Signal every registered connection to close
    ///
    /// Entries stay registered until their handler removes them on exit.
    pub fn close_all(&self) -> usize {
        let connections = self.connections.lock();
        for (id, entry) in connections.iter() {
            tracing::debug!(connection = %id, peer = %entry.peer, "closing connection");
            entry.close.cancel();
        }
        connections.len()
    }

    /// Number of registered connections
    pub fn len(&self) -> usize {
        self.connections.lock().len()
    }

    /// True when no connection is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured limit (0 = unlimited)
    pub fn max_connections(&self) -> usize {
        self.max_connections
    }

    /// Peers of the registered connections
    pub fn peers(&self) -> Vec<String> {
        self.connections
            .lock()
            .values()
            .map(|entry| entry.peer.clone())
            .collect()
    }
}

impl fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionRegistry")
            .field("max_connections", &self.max_connections)
            .field("len", &self.len())
            .finish()
    }
}
