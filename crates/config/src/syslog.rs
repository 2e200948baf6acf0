//! Syslog receiver configuration
//!
//! Listener address, TLS material and per-connection behavior. Durations use
//! humantime syntax (`"500ms"`, `"5m"`).

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Default listen address (RFC5425 section 4.1)
pub const DEFAULT_SERVER: &str = "tcp://:6514";

/// Default read timeout
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(500);

/// Default structured data separator
pub const DEFAULT_SDPARAM_SEPARATOR: &str = "_";

/// Syslog receiver configuration
///
/// # Example
///
/// ```toml
/// [syslog]
/// server = "tcp://:6514"
/// tls_cert = "/etc/sluice/cert.pem"
/// tls_key = "/etc/sluice/key.pem"
/// keep_alive_period = "5m"
/// max_connections = 1024
/// read_timeout = "500ms"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyslogConfig {
    /// `scheme://host[:port]` or `scheme://path`
    /// Default: "tcp://:6514"
    pub server: String,

    /// Server certificate chain (PEM)
    pub tls_cert: Option<PathBuf>,

    /// Server private key (PEM)
    pub tls_key: Option<PathBuf>,

    /// CA certificates clients must present a certificate from (PEM)
    /// Default: empty (client certificates not requested)
    pub tls_allowed_cacerts: Vec<PathBuf>,

    /// TCP keep-alive probe period; "0s" disables keep-alive
    /// Default: unset (OS default)
    #[serde(with = "humantime_serde")]
    pub keep_alive_period: Option<Duration>,

    /// Maximum concurrent stream connections (0 = unlimited)
    /// Default: 0
    pub max_connections: usize,

    /// Read timeout; "0s" means unlimited
    /// Default: 500ms
    #[serde(with = "humantime_serde")]
    pub read_timeout: Option<Duration>,

    /// Keep partially parsed messages
    /// Default: false
    pub best_effort: bool,

    /// Joins SD-ID and parameter name into a field key
    /// Default: "_"
    pub sdparam_separator: String,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            server: DEFAULT_SERVER.into(),
            tls_cert: None,
            tls_key: None,
            tls_allowed_cacerts: Vec::new(),
            keep_alive_period: None,
            max_connections: 0,
            read_timeout: Some(DEFAULT_READ_TIMEOUT),
            best_effort: false,
            sdparam_separator: DEFAULT_SDPARAM_SEPARATOR.into(),
        }
    }
}

impl SyslogConfig {
    /// Whether any TLS material is configured
    pub fn tls_enabled(&self) -> bool {
        self.tls_cert.is_some() || self.tls_key.is_some()
    }

    /// Read timeout with zero normalized to `None` (unlimited)
    pub fn effective_read_timeout(&self) -> Option<Duration> {
        self.read_timeout.filter(|timeout| !timeout.is_zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SyslogConfig::default();
        assert_eq!(config.server, "tcp://:6514");
        assert_eq!(config.read_timeout, Some(Duration::from_millis(500)));
        assert_eq!(config.keep_alive_period, None);
        assert_eq!(config.max_connections, 0);
        assert!(!config.best_effort);
        assert_eq!(config.sdparam_separator, "_");
        assert!(!config.tls_enabled());
    }

    #[test]
    fn test_deserialize_durations() {
        let toml = r#"
server = "udp://127.0.0.1:1514"
keep_alive_period = "5m"
read_timeout = "2s"
"#;
        let config: SyslogConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.server, "udp://127.0.0.1:1514");
        assert_eq!(config.keep_alive_period, Some(Duration::from_secs(300)));
        assert_eq!(config.read_timeout, Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_zero_durations() {
        let toml = r#"
keep_alive_period = "0s"
read_timeout = "0s"
"#;
        let config: SyslogConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.keep_alive_period, Some(Duration::ZERO));
        assert_eq!(config.read_timeout, Some(Duration::ZERO));
        assert_eq!(config.effective_read_timeout(), None);
    }

    #[test]
    fn test_tls_paths() {
        let toml = r#"
tls_cert = "/etc/sluice/cert.pem"
tls_key = "/etc/sluice/key.pem"
tls_allowed_cacerts = ["/etc/sluice/ca.pem"]
"#;
        let config: SyslogConfig = toml::from_str(toml).unwrap();
        assert!(config.tls_enabled());
        assert_eq!(config.tls_allowed_cacerts.len(), 1);
    }
}
