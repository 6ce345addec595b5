//! Debounce settings loaded from TOML
//!
//! ```toml
//! # Quiet period in milliseconds (default: 250)
//! delay_ms = 250
//! ```

use crate::{Debouncer, Delay};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings for building a [`Debouncer`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebounceConfig {
    /// Quiet period in milliseconds (default: 250)
    ///
    /// Signed so that a negative value is reported rather than failing to parse
    pub delay_ms: i64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self { delay_ms: 250 }
    }
}

impl DebounceConfig {
    /// Upper bound on `delay_ms` (one hour)
    pub const MAX_DELAY_MS: i64 = 60 * 60 * 1000;

    /// Parse and validate TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).context("Failed to parse debounce config")?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    /// Render as TOML
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize debounce config")
    }

    /// Check that values are in range
    pub fn validate(&self) -> Result<()> {
        if self.delay_ms < 0 {
            anyhow::bail!("delay_ms must be non-negative, got {}", self.delay_ms);
        }
        if self.delay_ms > Self::MAX_DELAY_MS {
            anyhow::bail!(
                "delay_ms must be at most {} (1h), got {}",
                Self::MAX_DELAY_MS,
                self.delay_ms
            );
        }
        Ok(())
    }

    /// The configured quiet period
    pub fn delay(&self) -> crate::Result<Delay> {
        Delay::from_millis(self.delay_ms)
    }

    /// Build a debouncer on the ambient time source
    pub fn build<A, F>(&self, callback: F) -> Result<Debouncer<A>>
    where
        A: Send + 'static,
        F: Fn(A) + Send + Sync + 'static,
    {
        self.validate()?;
        let debouncer = Debouncer::new(callback, self.delay()?)?;
        tracing::debug!(delay_ms = self.delay_ms, "debouncer built from config");
        Ok(debouncer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults() {
        let config = DebounceConfig::default();
        assert_eq!(config.delay_ms, 250);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = DebounceConfig::from_toml_str("").unwrap();
        assert_eq!(config, DebounceConfig::default());
    }

    #[test]
    fn test_parse_delay() {
        let config = DebounceConfig::from_toml_str("delay_ms = 40").unwrap();
        assert_eq!(config.delay().unwrap().as_duration(), Duration::from_millis(40));
    }

    #[test]
    fn test_negative_delay_rejected() {
        let err = DebounceConfig::from_toml_str("delay_ms = -5").unwrap_err();
        assert!(err.to_string().contains("non-negative"), "unexpected error: {err}");
    }

    #[test]
    fn test_oversized_delay_rejected() {
        let config = DebounceConfig {
            delay_ms: DebounceConfig::MAX_DELAY_MS + 1,
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(DebounceConfig::from_toml_str("delay = 5").is_err());
    }

    #[test]
    fn test_serialize_parses_back() {
        let config = DebounceConfig { delay_ms: 1200 };
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("delay_ms = 1200"));
    }

    #[test]
    fn test_load_from_file() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("debounce.toml");
        std::fs::write(&path, "delay_ms = 75\n")?;

        let config = DebounceConfig::load(&path)?;
        assert_eq!(config.delay_ms, 75);
        Ok(())
    }

    #[test]
    fn test_load_missing_file_mentions_path() {
        let err = DebounceConfig::load(Path::new("/nonexistent/debounce.toml")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/debounce.toml"));
    }

    #[test]
    fn test_build_on_virtual_clock() -> Result<()> {
        use parking_lot::Mutex;
        use std::sync::Arc;

        let guard = clock::install_virtual_clock();
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();

        let config = DebounceConfig::from_toml_str("delay_ms = 30")?;
        let debouncer = config.build(move |v: u8| sink.lock().push(v))?;

        debouncer.call(9);
        guard.advance(Duration::from_millis(30));
        assert_eq!(*calls.lock(), vec![9]);
        Ok(())
    }
}
