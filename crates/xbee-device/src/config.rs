//! Device configuration.
//!
//! ```yaml
//! name: coordinator
//! family: mesh
//! api_mode: api_escaped
//! max_frame_length: 256
//! max_bytes_per_poll: 1024
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use xbee_api::{ApiMode, Escaping, Family, DEFAULT_MAX_FRAME_LENGTH};

use crate::error::{DeviceError, DeviceResult};

/// Bytes a single poll reads from the transport before returning.
pub const DEFAULT_MAX_BYTES_PER_POLL: usize = 4096;

fn default_max_frame_length() -> u16 {
    DEFAULT_MAX_FRAME_LENGTH
}

fn default_max_bytes_per_poll() -> usize {
    DEFAULT_MAX_BYTES_PER_POLL
}

/// Settings for one device link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceConfig {
    /// Name used in logs and metric labels.
    pub name: String,
    /// Module family.
    pub family: Family,
    /// API mode the module is configured with (`ATAP`).
    #[serde(default)]
    pub api_mode: ApiMode,
    /// Largest declared frame length the parser accepts.
    #[serde(default = "default_max_frame_length")]
    pub max_frame_length: u16,
    /// Upper bound on bytes consumed by one poll, so a busy stream cannot hold the
    /// caller. Leftover bytes are picked up by the next poll.
    #[serde(default = "default_max_bytes_per_poll")]
    pub max_bytes_per_poll: usize,
}

impl DeviceConfig {
    /// Configuration with default API mode and frame limit.
    pub fn new(name: impl Into<String>, family: Family) -> Self {
        Self {
            name: name.into(),
            family,
            api_mode: ApiMode::default(),
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
            max_bytes_per_poll: DEFAULT_MAX_BYTES_PER_POLL,
        }
    }

    /// Set the API mode.
    pub fn with_api_mode(mut self, api_mode: ApiMode) -> Self {
        self.api_mode = api_mode;
        self
    }

    /// Set the parser's frame length limit.
    pub fn with_max_frame_length(mut self, max_frame_length: u16) -> Self {
        self.max_frame_length = max_frame_length;
        self
    }

    /// Set the per-poll read budget.
    pub fn with_max_bytes_per_poll(mut self, max_bytes_per_poll: usize) -> Self {
        self.max_bytes_per_poll = max_bytes_per_poll;
        self
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml_str(yaml: &str) -> DeviceResult<Self> {
        let config: DeviceConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> DeviceResult<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&yaml)
    }

    /// Escaping setting implied by the API mode.
    pub fn escaping(&self) -> DeviceResult<Escaping> {
        self.api_mode.escaping().ok_or_else(|| {
            DeviceError::Config(format!(
                "device {}: transparent mode cannot carry API frames",
                self.name
            ))
        })
    }

    /// Check that the configuration can drive a framed link.
    pub fn validate(&self) -> DeviceResult<()> {
        if self.name.trim().is_empty() {
            return Err(DeviceError::Config("device name must not be empty".into()));
        }
        if self.max_frame_length == 0 {
            return Err(DeviceError::Config(format!(
                "device {}: max_frame_length must be at least 1",
                self.name
            )));
        }
        if self.max_bytes_per_poll == 0 {
            return Err(DeviceError::Config(format!(
                "device {}: max_bytes_per_poll must be at least 1",
                self.name
            )));
        }
        self.escaping()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeviceConfig::from_yaml_str("name: sensor\nfamily: wifi\n").unwrap();
        assert_eq!(config, DeviceConfig::new("sensor", Family::Wifi));
        assert_eq!(config.api_mode, ApiMode::Api);
        assert_eq!(config.max_frame_length, 1500);
        assert_eq!(config.max_bytes_per_poll, DEFAULT_MAX_BYTES_PER_POLL);
        assert_eq!(config.escaping().unwrap(), Escaping::Disabled);
    }

    #[test]
    fn test_full_document() {
        let yaml = "name: coordinator\nfamily: mesh\napi_mode: api_escaped\nmax_frame_length: 256\nmax_bytes_per_poll: 1024\n";
        let config = DeviceConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.family, Family::Mesh);
        assert_eq!(config.escaping().unwrap(), Escaping::Enabled);
        assert_eq!(config.max_frame_length, 256);
        assert_eq!(config.max_bytes_per_poll, 1024);
    }

    #[test]
    fn test_transparent_rejected() {
        let err = DeviceConfig::from_yaml_str("name: x\nfamily: mesh\napi_mode: transparent\n")
            .unwrap_err();
        assert!(matches!(err, DeviceError::Config(_)));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let err = DeviceConfig::from_yaml_str("name: x\nfamily: mesh\nbaud: 9600\n").unwrap_err();
        assert!(matches!(err, DeviceError::Yaml(_)));
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            DeviceConfig::from_yaml_str("name: x\nfamily: zigbee\n"),
            Err(DeviceError::Yaml(_))
        ));
        assert!(matches!(
            DeviceConfig::new("", Family::Wifi).validate(),
            Err(DeviceError::Config(_))
        ));
        assert!(matches!(
            DeviceConfig::new("x", Family::Wifi).with_max_frame_length(0).validate(),
            Err(DeviceError::Config(_))
        ));
        assert!(matches!(
            DeviceConfig::new("x", Family::Wifi).with_max_bytes_per_poll(0).validate(),
            Err(DeviceError::Config(_))
        ));
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = DeviceConfig::new("node", Family::Mesh).with_api_mode(ApiMode::ApiEscaped);
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert_eq!(DeviceConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            DeviceConfig::from_yaml_file("/nonexistent/xbee-device.yaml"),
            Err(DeviceError::Io(_))
        ));
    }
}
