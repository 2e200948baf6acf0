//! Sluice Configuration
//!
//! TOML-based configuration loading with sensible defaults.
//! An empty file listens on `tcp://:6514` and writes line protocol to stdout.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use sluice_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str("[syslog]\nserver = \"udp://:514\"").unwrap();
//! assert_eq!(config.syslog.server, "udp://:514");
//! ```
//!
//! # Example Minimal Config
//!
//! ```toml
//! [syslog]
//! server = "tcp://127.0.0.1:6514"
//! ```

mod error;
mod logging;
mod output;
mod syslog;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use output::{OutputConfig, OutputFormat};
pub use syslog::{
    DEFAULT_READ_TIMEOUT, DEFAULT_SDPARAM_SEPARATOR, DEFAULT_SERVER, SyslogConfig,
};

use serde::Deserialize;

/// Commented configuration printed by `sluice sample-config`
pub const SAMPLE_CONFIG: &str = r#"# Sluice configuration

[log]
# trace, debug, info, warn, error
level = "info"
# console or json
format = "console"

[syslog]
# Listen address: tcp, tcp4, tcp6, udp, udp4, udp6, unix, unixgram, unixpacket
# server = "tcp://:6514"
# server = "udp://:6514"
# server = "unix:///var/run/sluice.sock"

# TLS (stream schemes only)
# tls_cert = "/etc/sluice/cert.pem"
# tls_key = "/etc/sluice/key.pem"
# Require client certificates signed by one of these CAs
# tls_allowed_cacerts = ["/etc/sluice/clientca.pem"]

# TCP keep-alive period, "0s" disables keep-alive
# keep_alive_period = "5m"

# Maximum concurrent connections, 0 is unlimited
# max_connections = 1024

# Read timeout, "0s" is unlimited
# read_timeout = "500ms"

# Keep partially parsed messages
# best_effort = false

# Joins SD-ID and parameter name into a field key
# sdparam_separator = "_"

[output]
# line (InfluxDB line protocol) or json
format = "line"
"#;

/// Main configuration structure
///
/// All sections are optional with sensible defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Logging configuration
    pub log: LogConfig,

    /// Syslog receiver settings
    pub syslog: SyslogConfig,

    /// Metric output settings
    pub output: OutputConfig,
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns error if file cannot be read, contains invalid TOML or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::from_str(&contents)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::str::FromStr;
    use std::time::Duration;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.syslog.server, DEFAULT_SERVER);
        assert_eq!(config.syslog.read_timeout, Some(DEFAULT_READ_TIMEOUT));
        assert_eq!(config.output.format, OutputFormat::Line);
        assert_eq!(config.log.level, LogLevel::Info);
    }

    #[test]
    fn test_full_config_parse() {
        let toml = r#"
[log]
level = "debug"
format = "json"
ansi = false

[syslog]
server = "tcp4://127.0.0.1:6514"
tls_cert = "cert.pem"
tls_key = "key.pem"
tls_allowed_cacerts = ["ca.pem"]
keep_alive_period = "1m"
max_connections = 16
read_timeout = "0s"
best_effort = true
sdparam_separator = "."

[output]
format = "json"
"#;
        let config = Config::from_str(toml).unwrap();

        assert_eq!(config.log.level, LogLevel::Debug);
        assert_eq!(config.log.format, LogFormat::Json);
        assert!(!config.log.ansi);
        assert_eq!(config.syslog.server, "tcp4://127.0.0.1:6514");
        assert_eq!(config.syslog.keep_alive_period, Some(Duration::from_secs(60)));
        assert_eq!(config.syslog.max_connections, 16);
        assert_eq!(config.syslog.effective_read_timeout(), None);
        assert!(config.syslog.best_effort);
        assert_eq!(config.syslog.sdparam_separator, ".");
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    #[test]
    fn test_sample_config_parses() {
        let config = Config::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.syslog.server, DEFAULT_SERVER);
    }

    #[test]
    fn test_invalid_toml() {
        let result = Config::from_str("invalid { toml");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_validation_runs_on_parse() {
        let result = Config::from_str("[syslog]\ntls_key = \"key.pem\"");
        assert!(matches!(result, Err(ConfigError::MissingDependency { .. })));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[syslog]\nserver = \"udp://:5514\"").unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.syslog.server, "udp://:5514");
    }

    #[test]
    fn test_from_missing_file() {
        let result = Config::from_file("/definitely/not/here/sluice.toml");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
