//! Parsed syslog message types
//!
//! [`SyslogMessage`] is what the RFC5424 parser yields. Severity and facility
//! are decoded from PRI; every optional header field is `None` when the
//! sender used the NILVALUE (`-`).

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};

/// Structured data: SD-ID → (PARAM-NAME → PARAM-VALUE)
///
/// An element without parameters maps to an empty inner map.
pub type StructuredData = BTreeMap<String, BTreeMap<String, String>>;

/// Syslog severity (RFC5424 section 6.2.1, table 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Severity {
    Emergency = 0,
    Alert = 1,
    Critical = 2,
    Error = 3,
    Warning = 4,
    Notice = 5,
    Informational = 6,
    Debug = 7,
}

impl Severity {
    /// Decode a severity code (0..=7)
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            0 => Self::Emergency,
            1 => Self::Alert,
            2 => Self::Critical,
            3 => Self::Error,
            4 => Self::Warning,
            5 => Self::Notice,
            6 => Self::Informational,
            7 => Self::Debug,
            _ => return None,
        })
    }

    /// Numeric severity code
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Short keyword, as used in syslog.conf selectors
    pub fn short_name(self) -> &'static str {
        match self {
            Self::Emergency => "emerg",
            Self::Alert => "alert",
            Self::Critical => "crit",
            Self::Error => "err",
            Self::Warning => "warning",
            Self::Notice => "notice",
            Self::Informational => "info",
            Self::Debug => "debug",
        }
    }
}

/// Syslog facility (RFC5424 section 6.2.1, table 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Facility {
    Kern = 0,
    User = 1,
    Mail = 2,
    Daemon = 3,
    Auth = 4,
    Syslog = 5,
    Lpr = 6,
    News = 7,
    Uucp = 8,
    Cron = 9,
    AuthPriv = 10,
    Ftp = 11,
    Ntp = 12,
    Security = 13,
    Console = 14,
    SolarisCron = 15,
    Local0 = 16,
    Local1 = 17,
    Local2 = 18,
    Local3 = 19,
    Local4 = 20,
    Local5 = 21,
    Local6 = 22,
    Local7 = 23,
}

impl Facility {
    const ALL: [Self; 24] = [
        Self::Kern,
        Self::User,
        Self::Mail,
        Self::Daemon,
        Self::Auth,
        Self::Syslog,
        Self::Lpr,
        Self::News,
        Self::Uucp,
        Self::Cron,
        Self::AuthPriv,
        Self::Ftp,
        Self::Ntp,
        Self::Security,
        Self::Console,
        Self::SolarisCron,
        Self::Local0,
        Self::Local1,
        Self::Local2,
        Self::Local3,
        Self::Local4,
        Self::Local5,
        Self::Local6,
        Self::Local7,
    ];

    /// Decode a facility code (0..=23)
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(code as usize).copied()
    }

    /// Numeric facility code
    #[inline]
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Facility keyword
    pub fn name(self) -> &'static str {
        match self {
            Self::Kern => "kern",
            Self::User => "user",
            Self::Mail => "mail",
            Self::Daemon => "daemon",
            Self::Auth => "auth",
            Self::Syslog => "syslog",
            Self::Lpr => "lpr",
            Self::News => "news",
            Self::Uucp => "uucp",
            Self::Cron => "cron",
            Self::AuthPriv => "authpriv",
            Self::Ftp => "ftp",
            Self::Ntp => "ntp",
            Self::Security => "security",
            Self::Console => "console",
            Self::SolarisCron => "solaris-cron",
            Self::Local0 => "local0",
            Self::Local1 => "local1",
            Self::Local2 => "local2",
            Self::Local3 => "local3",
            Self::Local4 => "local4",
            Self::Local5 => "local5",
            Self::Local6 => "local6",
            Self::Local7 => "local7",
        }
    }
}

/// Split a PRIVAL into facility and severity
///
/// Returns `None` when the value is above 191.
pub fn decode_priority(prival: u8) -> Option<(Facility, Severity)> {
    let facility = Facility::from_code(prival / 8)?;
    let severity = Severity::from_code(prival % 8)?;
    Some((facility, severity))
}

/// A parsed RFC5424 message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyslogMessage {
    /// Facility from PRI
    pub facility: Facility,

    /// Severity from PRI
    pub severity: Severity,

    /// Protocol VERSION (always 1 for RFC5424 senders)
    pub version: u16,

    /// TIMESTAMP, with the sender's offset preserved
    pub timestamp: Option<DateTime<FixedOffset>>,

    /// HOSTNAME
    pub hostname: Option<String>,

    /// APP-NAME
    pub appname: Option<String>,

    /// PROCID
    pub procid: Option<String>,

    /// MSGID
    pub msgid: Option<String>,

    /// STRUCTURED-DATA, `None` for the NILVALUE
    pub structured_data: Option<StructuredData>,

    /// Free-form MSG, without the UTF-8 BOM
    pub message: Option<String>,
}

impl SyslogMessage {
    /// Create a message with only PRI and VERSION populated
    pub fn new(facility: Facility, severity: Severity, version: u16) -> Self {
        Self {
            facility,
            severity,
            version,
            timestamp: None,
            hostname: None,
            appname: None,
            procid: None,
            msgid: None,
            structured_data: None,
            message: None,
        }
    }
}
