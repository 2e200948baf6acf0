//! Configuration validation
//!
//! Checks that can be made without touching the network:
//! - `server` carries a `scheme://` prefix
//! - TLS certificate and key are given together
//! - Client CA list only with a server certificate
//! - Non-empty structured data separator

use crate::Config;
use crate::error::{ConfigError, Result};

/// Validate the entire configuration
pub fn validate_config(config: &Config) -> Result<()> {
    validate_syslog(config)?;
    Ok(())
}

fn validate_syslog(config: &Config) -> Result<()> {
    let syslog = &config.syslog;

    match syslog.server.split_once("://") {
        Some((scheme, _)) if !scheme.is_empty() => {}
        _ => {
            return Err(ConfigError::invalid_value(
                "server",
                format!("'{}' is missing a scheme:// prefix", syslog.server),
            ));
        }
    }

    match (&syslog.tls_cert, &syslog.tls_key) {
        (Some(_), None) => return Err(ConfigError::missing_dependency("tls_cert", "tls_key")),
        (None, Some(_)) => return Err(ConfigError::missing_dependency("tls_key", "tls_cert")),
        _ => {}
    }

    if !syslog.tls_allowed_cacerts.is_empty() && syslog.tls_cert.is_none() {
        return Err(ConfigError::missing_dependency(
            "tls_allowed_cacerts",
            "tls_cert",
        ));
    }

    if syslog.sdparam_separator.is_empty() {
        return Err(ConfigError::invalid_value(
            "sdparam_separator",
            "must not be empty",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_server_without_scheme() {
        let mut config = Config::default();
        config.syslog.server = ":6514".into();
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "server", .. }));
    }

    #[test]
    fn test_server_with_empty_scheme() {
        let mut config = Config::default();
        config.syslog.server = "://:6514".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_cert_without_key() {
        let mut config = Config::default();
        config.syslog.tls_cert = Some(PathBuf::from("cert.pem"));
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingDependency {
                field: "tls_cert",
                requires: "tls_key"
            }
        ));
    }

    #[test]
    fn test_cacerts_without_cert() {
        let mut config = Config::default();
        config.syslog.tls_allowed_cacerts = vec![PathBuf::from("ca.pem")];
        let err = validate_config(&config).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::MissingDependency {
                field: "tls_allowed_cacerts",
                ..
            }
        ));
    }

    #[test]
    fn test_empty_separator() {
        let mut config = Config::default();
        config.syslog.sdparam_separator = String::new();
        assert!(validate_config(&config).is_err());
    }
}
