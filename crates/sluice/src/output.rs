//! Stdout output for emitted metrics
//!
//! Each metric becomes one line: InfluxDB line protocol or a JSON object.
//! Errors reported by the receiver are logged, not written to stdout.
//!
//! # Example Output
//!
//! ```text
//! syslog,appname=su,facility=auth,hostname=mymachine,severity=crit facility_code=4i,message="'su root' failed",msgid="ID47",severity_code=2i,version=1u 1729326855003000001
//! ```

use std::fmt::Write as _;
use std::io::{self, Write};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use sluice_config::OutputFormat;
use sluice_protocol::{FieldValue, Metric};
use sluice_sources::syslog::{Accumulator, ReceiverError};
use tracing::warn;

/// Accumulator writing one line per metric
pub struct OutputAccumulator<W: Write + Send + 'static> {
    format: OutputFormat,
    writer: Mutex<W>,
    lines_written: AtomicU64,
}

impl OutputAccumulator<io::Stdout> {
    /// Write to the process stdout
    pub fn stdout(format: OutputFormat) -> Self {
        Self::new(format, io::stdout())
    }
}

impl<W: Write + Send + 'static> OutputAccumulator<W> {
    /// Write to any writer
    pub fn new(format: OutputFormat, writer: W) -> Self {
        Self {
            format,
            writer: Mutex::new(writer),
            lines_written: AtomicU64::new(0),
        }
    }

    /// Lines successfully written
    pub fn lines_written(&self) -> u64 {
        self.lines_written.load(Ordering::Relaxed)
    }

    /// Consume the accumulator and return the writer
    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn format(&self, metric: &Metric) -> Option<String> {
        match self.format {
            OutputFormat::Line => Some(line_protocol(metric)),
            OutputFormat::Json => match serde_json::to_string(metric) {
                Ok(json) => Some(json),
                Err(e) => {
                    warn!(error = %e, "failed to serialize metric");
                    None
                }
            },
        }
    }
}

impl<W: Write + Send + 'static> Accumulator for OutputAccumulator<W> {
    fn add_metric(&self, metric: Metric) {
        let Some(line) = self.format(&metric) else {
            return;
        };

        let mut writer = self.writer.lock();
        let written = writeln!(writer, "{line}").and_then(|()| writer.flush());
        match written {
            Ok(()) => {
                self.lines_written.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => warn!(error = %e, "failed to write metric"),
        }
    }

    fn report_error(&self, error: ReceiverError) {
        warn!(error = %error, "syslog receive error");
    }
}

// =============================================================================
// Line protocol
// =============================================================================

/// Format a metric as one InfluxDB line protocol record (no trailing newline)
///
/// Empty tag values are omitted. The timestamp is in nanoseconds.
pub fn line_protocol(metric: &Metric) -> String {
    let mut line = String::with_capacity(256);
    escape_into(&mut line, metric.name, &[',', ' ']);

    for (key, value) in &metric.tags {
        if value.is_empty() {
            continue;
        }
        line.push(',');
        escape_into(&mut line, key, &[',', '=', ' ']);
        line.push('=');
        escape_into(&mut line, value, &[',', '=', ' ']);
    }

    for (i, (key, value)) in metric.fields.iter().enumerate() {
        line.push(if i == 0 { ' ' } else { ',' });
        escape_into(&mut line, key, &[',', '=', ' ']);
        line.push('=');
        push_field_value(&mut line, value);
    }

    if let Some(nanos) = metric.timestamp.timestamp_nanos_opt() {
        let _ = write!(line, " {nanos}");
    }
    line
}

fn push_field_value(line: &mut String, value: &FieldValue) {
    match value {
        FieldValue::Int(v) => {
            let _ = write!(line, "{v}i");
        }
        FieldValue::UInt(v) => {
            let _ = write!(line, "{v}u");
        }
        FieldValue::Bool(v) => {
            let _ = write!(line, "{v}");
        }
        FieldValue::Str(v) => {
            line.push('"');
            escape_into(line, v, &['"', '\\']);
            line.push('"');
        }
    }
}

/// Backslash-escape `special`; newlines become `\n` everywhere
fn escape_into(out: &mut String, value: &str, special: &[char]) {
    for c in value.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            c if special.contains(&c) => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
}

#[cfg(test)]
#[path = "output_test.rs"]
mod output_test;
