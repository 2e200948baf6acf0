//! Stdout output tests

use chrono::{TimeZone, Utc};
use sluice_config::OutputFormat;
use sluice_protocol::{FieldValue, Fields, Metric, Tags};
use sluice_sources::syslog::{Accumulator, ReceiverError};

use super::{OutputAccumulator, line_protocol};

fn metric(tags: &[(&str, &str)], fields: Vec<(&str, FieldValue)>) -> Metric {
    let tags: Tags = tags
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    let fields: Fields = fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
    let timestamp = Utc.timestamp_opt(1_700_000_000, 42).unwrap();
    Metric::new(tags, fields, timestamp)
}

// ============================================================================
// Line protocol
// ============================================================================

#[test]
fn test_line_protocol_basic() {
    let m = metric(
        &[("severity", "info"), ("facility", "user")],
        vec![
            ("severity_code", FieldValue::Int(6)),
            ("version", FieldValue::UInt(1)),
            ("message", FieldValue::Str("hello".into())),
        ],
    );

    assert_eq!(
        line_protocol(&m),
        "syslog,facility=user,severity=info \
         message=\"hello\",severity_code=6i,version=1u 1700000000000000042"
    );
}

#[test]
fn test_line_protocol_escapes_tags_and_keys() {
    let m = metric(
        &[("hostname", "my host,a=b")],
        vec![("origin ip", FieldValue::Bool(true))],
    );

    assert_eq!(
        line_protocol(&m),
        "syslog,hostname=my\\ host\\,a\\=b origin\\ ip=true 1700000000000000042"
    );
}

#[test]
fn test_line_protocol_escapes_string_fields() {
    let m = metric(
        &[],
        vec![("message", FieldValue::Str("say \"hi\" C:\\ now\nnext".into()))],
    );

    assert_eq!(
        line_protocol(&m),
        "syslog message=\"say \\\"hi\\\" C:\\\\ now\\nnext\" 1700000000000000042"
    );
}

#[test]
fn test_line_protocol_skips_empty_tag_values() {
    let m = metric(
        &[("appname", ""), ("severity", "err")],
        vec![("severity_code", FieldValue::Int(3))],
    );

    assert_eq!(
        line_protocol(&m),
        "syslog,severity=err severity_code=3i 1700000000000000042"
    );
}

// ============================================================================
// Accumulator
// ============================================================================

#[test]
fn test_line_output_one_line_per_metric() {
    let output = OutputAccumulator::new(OutputFormat::Line, Vec::new());
    output.add_metric(metric(&[("severity", "info")], vec![("version", FieldValue::UInt(1))]));
    output.add_metric(metric(&[("severity", "crit")], vec![("version", FieldValue::UInt(1))]));
    assert_eq!(output.lines_written(), 2);

    let written = String::from_utf8(output.into_inner()).unwrap();
    let lines: Vec<_> = written.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("syslog,severity=info "));
    assert!(lines[1].starts_with("syslog,severity=crit "));
}

#[test]
fn test_json_output() {
    let output = OutputAccumulator::new(OutputFormat::Json, Vec::new());
    output.add_metric(metric(
        &[("hostname", "web1")],
        vec![
            ("severity_code", FieldValue::Int(6)),
            ("message", FieldValue::Str("hi".into())),
        ],
    ));

    let written = String::from_utf8(output.into_inner()).unwrap();
    let value: serde_json::Value = serde_json::from_str(written.trim_end()).unwrap();
    assert_eq!(value["name"], "syslog");
    assert_eq!(value["tags"]["hostname"], "web1");
    assert_eq!(value["fields"]["severity_code"], 6);
    assert_eq!(value["fields"]["message"], "hi");
    assert!(value["timestamp"].as_str().unwrap().starts_with("2023-11-14T22:13:20"));
}

#[test]
fn test_reported_errors_are_not_written() {
    let output = OutputAccumulator::new(OutputFormat::Line, Vec::new());
    output.report_error(ReceiverError::AlreadyRunning);

    assert_eq!(output.lines_written(), 0);
    assert!(output.into_inner().is_empty());
}
