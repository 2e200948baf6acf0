//! Metric output configuration

use serde::Deserialize;

/// How emitted metrics are written to stdout
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// InfluxDB line protocol (default)
    #[default]
    Line,
    /// One JSON object per metric
    Json,
}

/// Output configuration
///
/// # Example
///
/// ```toml
/// [output]
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Output format
    /// Default: line
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_line_protocol() {
        assert_eq!(OutputConfig::default().format, OutputFormat::Line);
    }

    #[test]
    fn test_deserialize_json() {
        let config: OutputConfig = toml::from_str("format = \"json\"").unwrap();
        assert_eq!(config.format, OutputFormat::Json);
    }
}
