//! Factory configuration.
//!
//! Configuration is read-only after factory construction and designed to
//! be loadable from JSON (or TOML with the `toml` feature) while keeping
//! complexity minimal.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Policy controlling implicit prepared-geometry construction.
///
/// Under `Enabled`, a wrapper builds its prepared cache as a side effect
/// of the second accepted predicate call; one-shot queries never pay the
/// preparation cost. Under `Disabled` only an explicit
/// [`crate::Geometry::prepare`] builds the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AutoPrepare {
    #[default]
    Enabled,
    Disabled,
}

/// Factory configuration.
///
/// # Example
///
/// ```rust
/// use geoforge::{AutoPrepare, FactoryConfig};
///
/// let config = FactoryConfig::default();
/// assert_eq!(config.srid, 0);
/// assert_eq!(config.auto_prepare, AutoPrepare::Enabled);
///
/// let config: FactoryConfig = serde_json::from_str(
///     r#"{ "srid": 4326, "auto_prepare": "disabled" }"#,
/// ).unwrap();
/// assert_eq!(config.srid, 4326);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FactoryConfig {
    /// Spatial reference identifier stamped on geometries created by the
    /// factory.
    #[serde(default)]
    pub srid: i32,

    /// Whether repeated predicate calls prepare geometries implicitly.
    #[serde(default)]
    pub auto_prepare: AutoPrepare,
}

impl FactoryConfig {
    pub fn with_srid(mut self, srid: i32) -> Self {
        self.srid = srid;
        self
    }

    pub fn with_auto_prepare(mut self, auto_prepare: AutoPrepare) -> Self {
        self.auto_prepare = auto_prepare;
        self
    }

    /// Load configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from a TOML string.
    #[cfg(feature = "toml")]
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FactoryConfig::default();
        assert_eq!(config.srid, 0);
        assert_eq!(config.auto_prepare, AutoPrepare::Enabled);
    }

    #[test]
    fn test_builder_style_setters() {
        let config = FactoryConfig::default()
            .with_srid(4326)
            .with_auto_prepare(AutoPrepare::Disabled);
        assert_eq!(config.srid, 4326);
        assert_eq!(config.auto_prepare, AutoPrepare::Disabled);
    }

    #[test]
    fn test_from_json() {
        let config = FactoryConfig::from_json(r#"{ "srid": 3857 }"#).unwrap();
        assert_eq!(config.srid, 3857);
        assert_eq!(config.auto_prepare, AutoPrepare::Enabled);

        assert!(FactoryConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn test_json_round_trip() {
        let config = FactoryConfig::default().with_srid(4326);
        let json = serde_json::to_string(&config).unwrap();
        let back = FactoryConfig::from_json(&json).unwrap();
        assert_eq!(config, back);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_from_toml() {
        let config = FactoryConfig::from_toml("srid = 4326\nauto_prepare = \"disabled\"\n").unwrap();
        assert_eq!(config.srid, 4326);
        assert_eq!(config.auto_prepare, AutoPrepare::Disabled);
    }
}
