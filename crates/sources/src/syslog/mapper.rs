//! Syslog message to metric projection
//!
//! Tags carry the low-cardinality identity of a message (severity, facility,
//! hostname, appname). Everything else becomes a field, with structured data
//! flattened to `SD-ID + separator + PARAM-NAME`.

use chrono::{DateTime, Utc};
use sluice_protocol::{FieldValue, Fields, Metric, SyslogMessage, Tags};

/// Derive the tag set
pub fn tags(message: &SyslogMessage) -> Tags {
    let mut tags = Tags::new();
    tags.insert("severity".into(), message.severity.short_name().into());
    tags.insert("facility".into(), message.facility.name().into());

    if let Some(hostname) = &message.hostname {
        tags.insert("hostname".into(), hostname.clone());
    }
    if let Some(appname) = &message.appname {
        tags.insert("appname".into(), appname.clone());
    }
    tags
}

/// Derive the field set
pub fn fields(message: &SyslogMessage, separator: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert("version".into(), FieldValue::UInt(u64::from(message.version)));
    fields.insert(
        "severity_code".into(),
        FieldValue::Int(i64::from(message.severity.code())),
    );
    fields.insert(
        "facility_code".into(),
        FieldValue::Int(i64::from(message.facility.code())),
    );

    // Outside the i64 nanosecond range (years 1677..2262) the field is dropped
    if let Some(nanos) = message.timestamp.and_then(|ts| ts.timestamp_nanos_opt()) {
        fields.insert("timestamp".into(), FieldValue::Int(nanos));
    }

    for (key, value) in [
        ("procid", &message.procid),
        ("msgid", &message.msgid),
        ("message", &message.message),
    ] {
        if let Some(value) = value {
            fields.insert(key.into(), FieldValue::Str(value.clone()));
        }
    }

    if let Some(sd) = &message.structured_data {
        for (id, params) in sd {
            if params.is_empty() {
                fields.insert(id.clone(), FieldValue::Bool(true));
                continue;
            }
            for (name, value) in params {
                fields.insert(format!("{id}{separator}{name}"), FieldValue::Str(value.clone()));
            }
        }
    }

    fields
}

/// Build the metric for one message
pub fn to_metric(message: &SyslogMessage, separator: &str, timestamp: DateTime<Utc>) -> Metric {
    Metric::new(tags(message), fields(message, separator), timestamp)
}

#[cfg(test)]
#[path = "mapper_test.rs"]
mod mapper_test;
