//! Delivery of parse results to the sink

use std::sync::Arc;

use sluice_protocol::ParsedResult;

use super::error::ReceiverError;
use super::mapper;
use super::sequencer::TimestampSequencer;
use super::sink::Accumulator;
use crate::common::ReceiverMetrics;

/// Turns parse results into sink calls
///
/// Shared by every connection task and the datagram loop of one receiver.
pub(crate) struct Emitter {
    sink: Arc<dyn Accumulator>,
    sequencer: Arc<TimestampSequencer>,
    metrics: Arc<ReceiverMetrics>,
    separator: String,
}

impl Emitter {
    pub(crate) fn new(
        sink: Arc<dyn Accumulator>,
        sequencer: Arc<TimestampSequencer>,
        metrics: Arc<ReceiverMetrics>,
        separator: String,
    ) -> Self {
        Self {
            sink,
            sequencer,
            metrics,
            separator,
        }
    }

    pub(crate) fn metrics(&self) -> &ReceiverMetrics {
        &self.metrics
    }

    /// Forward one result: the error first, then the (possibly partial) message
    pub(crate) fn emit(&self, peer: &str, result: ParsedResult) {
        self.metrics.message_received();

        if let Some(source) = result.error {
            self.report(ReceiverError::Parse {
                peer: peer.to_owned(),
                source,
            });
        }

        if let Some(message) = result.message {
            let metric = mapper::to_metric(&message, &self.separator, self.sequencer.next());
            tracing::trace!(peer = %peer, fields = metric.fields.len(), "metric emitted");
            self.metrics.metric_emitted();
            self.sink.add_metric(metric);
        }
    }

    /// Report a runtime error
    pub(crate) fn report(&self, error: ReceiverError) {
        tracing::debug!(error = %error, "syslog receive error");
        self.metrics.error();
        self.sink.report_error(error);
    }
}
