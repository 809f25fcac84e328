//! Device configuration
//!
//! All fields have defaults, so an empty JSON object is a valid config.

use serde::Deserialize;

/// Default page size in bytes
pub const PAGE_SIZE: usize = 4096;

/// Default number of handles that may be open at once
pub const DEFAULT_MAX_HANDLES: u32 = 1;

/// Default device name
pub const DEVICE_NAME: &str = "ramdisk";

/// Errors while loading or validating a [`DeviceConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(String),

    #[error("failed to parse config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("page size must be a non-zero power of two, got {0}")]
    InvalidPageSize(usize),

    #[error("max_pages must be at least 1")]
    InvalidMaxPages,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DeviceConfig {
    /// Name used in logs and the status report
    pub name: String,
    /// Bytes per page
    pub page_size: usize,
    /// Initial limit on concurrently open handles
    pub max_handles: u32,
    /// Cap on allocated pages; reaching it behaves like allocation failure
    pub max_pages: Option<usize>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: DEVICE_NAME.to_string(),
            page_size: PAGE_SIZE,
            max_handles: DEFAULT_MAX_HANDLES,
            max_pages: None,
        }
    }
}

impl DeviceConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    #[must_use]
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    #[must_use]
    pub fn with_max_handles(mut self, max_handles: u32) -> Self {
        self.max_handles = max_handles;
        self
    }

    #[must_use]
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    /// Read a JSON config from a reader and validate it.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - reading from `reader` fails
    /// - the JSON is malformed or has unknown fields
    /// - the values fail [`DeviceConfig::validate`]
    pub fn from_reader(mut reader: impl embedded_io::Read) -> Result<Self, ConfigError> {
        let mut buffer = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            match embedded_io::Read::read(&mut reader, &mut chunk) {
                Ok(0) => break,
                Ok(n) => buffer.extend_from_slice(chunk.get(..n).unwrap_or_default()),
                Err(e) => return Err(ConfigError::Read(format!("{e:?}"))),
            }
        }
        Self::from_slice(&buffer)
    }

    /// Parse and validate a JSON config.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or the values are invalid.
    pub fn from_slice(json: &[u8]) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_slice(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns an error if the page size is not a non-zero power of two or
    /// `max_pages` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.page_size.is_power_of_two() {
            return Err(ConfigError::InvalidPageSize(self.page_size));
        }
        if self.max_pages == Some(0) {
            return Err(ConfigError::InvalidMaxPages);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config = DeviceConfig::from_slice(b"{}").unwrap();
        assert_eq!(config, DeviceConfig::default());
        assert_eq!(config.page_size, 4096);
        assert_eq!(config.max_handles, 1);
    }

    #[test]
    fn test_from_reader() {
        let json: &[u8] = br#"{"name": "rd0", "page_size": 512, "max_handles": 4, "max_pages": 8}"#;
        let config = DeviceConfig::from_reader(json).unwrap();
        assert_eq!(config.name, "rd0");
        assert_eq!(config.page_size, 512);
        assert_eq!(config.max_handles, 4);
        assert_eq!(config.max_pages, Some(8));
    }

    #[test]
    fn test_rejects_bad_page_size() {
        let err = DeviceConfig::from_slice(br#"{"page_size": 1000}"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPageSize(1000)));

        let err = DeviceConfig::new().with_page_size(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPageSize(0)));
    }

    #[test]
    fn test_rejects_unknown_field() {
        let err = DeviceConfig::from_slice(br#"{"pagesize": 512}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_zero_max_pages() {
        let err = DeviceConfig::new().with_max_pages(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidMaxPages));
    }
}
