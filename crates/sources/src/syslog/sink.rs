//! Metric sink interface
//!
//! The receiver pushes every metric and every runtime error into an
//! [`Accumulator`]. Calls are fire-and-forget and may come from any task.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use sluice_protocol::Metric;
use tokio::sync::Notify;

use super::error::ReceiverError;

/// Destination for metrics and runtime errors
pub trait Accumulator: Send + Sync + 'static {
    /// Deliver one metric
    fn add_metric(&self, metric: Metric);

    /// Report a non-fatal runtime error
    fn report_error(&self, error: ReceiverError);
}

impl<A: Accumulator + ?Sized> Accumulator for Arc<A> {
    fn add_metric(&self, metric: Metric) {
        (**self).add_metric(metric);
    }

    fn report_error(&self, error: ReceiverError) {
        (**self).report_error(error);
    }
}

/// Collects everything in memory
///
/// Used by tests and by embedders that poll instead of streaming.
#[derive(Debug, Default)]
pub struct MemoryAccumulator {
    metrics: Mutex<Vec<Metric>>,
    errors: Mutex<Vec<ReceiverError>>,
    changed: Notify,
}

impl MemoryAccumulator {
    /// Create an empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the metrics received so far
    pub fn metrics(&self) -> Vec<Metric> {
        self.metrics.lock().clone()
    }

    /// Number of metrics received so far
    pub fn metric_count(&self) -> usize {
        self.metrics.lock().len()
    }

    /// Rendered errors reported so far
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().iter().map(ToString::to_string).collect()
    }

    /// Number of errors reported so far
    pub fn error_count(&self) -> usize {
        self.errors.lock().len()
    }

    /// Whether any reported error matches
    pub fn any_error(&self, predicate: impl Fn(&ReceiverError) -> bool) -> bool {
        self.errors.lock().iter().any(predicate)
    }

    /// Wait until at least `count` metrics arrived
    pub async fn wait_for_metrics(&self, count: usize, timeout: Duration) -> bool {
        self.wait_until(timeout, || self.metric_count() >= count)
            .await
    }

    /// Wait until at least `count` errors were reported
    pub async fn wait_for_errors(&self, count: usize, timeout: Duration) -> bool {
        self.wait_until(timeout, || self.error_count() >= count).await
    }

    async fn wait_until(&self, timeout: Duration, done: impl Fn() -> bool) -> bool {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let notified = self.changed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if done() {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return done();
            }
        }
    }
}

impl Accumulator for MemoryAccumulator {
    fn add_metric(&self, metric: Metric) {
        self.metrics.lock().push(metric);
        self.changed.notify_waiters();
    }

    fn report_error(&self, error: ReceiverError) {
        self.errors.lock().push(error);
        self.changed.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use sluice_protocol::{Fields, Tags};

    use super::*;

    #[tokio::test]
    async fn test_wait_for_metrics() {
        let sink = Arc::new(MemoryAccumulator::new());

        let producer = Arc::clone(&sink);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            producer.add_metric(Metric::new(Tags::new(), Fields::new(), Utc::now()));
        });

        assert!(sink.wait_for_metrics(1, Duration::from_secs(5)).await);
        assert_eq!(sink.metric_count(), 1);
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let sink = MemoryAccumulator::new();
        assert!(!sink.wait_for_errors(1, Duration::from_millis(20)).await);
    }

    #[test]
    fn test_errors_rendered() {
        let sink = MemoryAccumulator::new();
        sink.report_error(ReceiverError::AlreadyRunning);
        assert_eq!(sink.errors(), vec!["receiver is already running".to_string()]);
        assert!(sink.any_error(|e| matches!(e, ReceiverError::AlreadyRunning)));
    }
}
