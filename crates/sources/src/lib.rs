//! Sluice - Sources
//!
//! Network receivers that accept syslog traffic and push one metric per
//! message into an accumulator.
//!
//! # Design Principles
//!
//! - **Async I/O**: Built on `tokio` for non-blocking operations
//! - **Buffered framing**: `tokio_util::codec` decoders over `bytes::BytesMut`
//! - **Bounded admission**: Optional connection limit enforced at accept time
//! - **Clean shutdown**: Cancellation plus task tracking, no leaked tasks
//!
//! # Example
//!
//! ```ignore
//! use sluice_sources::syslog::{MemoryAccumulator, Receiver, ReceiverConfig};
//! use std::sync::Arc;
//!
//! let receiver = Receiver::new(ReceiverConfig::with_server("tcp://:6514"));
//! let sink = Arc::new(MemoryAccumulator::new());
//!
//! receiver.start(sink.clone()).await?;
//! // ...
//! receiver.stop().await;
//! ```

pub mod syslog;

// Counters shared by every receiver task
mod common;

pub use common::{MetricsSnapshot, ReceiverMetrics};

pub use syslog::{Accumulator, Receiver, ReceiverConfig, ReceiverError};
