//! Configuration for the index and the locator query path.

use crate::compute::geohash::MAX_GEOHASH_PRECISION;
use crate::index::DEFAULT_PRECISION;
use serde::de::Error;

/// Locator configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Prefix length of terminal nodes in every tenant tree
    #[serde(default = "Config::default_precision")]
    pub precision: usize,

    /// Multiplier applied to the zoom-derived viewport radius
    #[serde(default = "Config::default_radius_padding")]
    pub radius_padding: f64,

    /// Highest zoom level accepted from clients
    #[serde(default = "Config::default_max_zoom")]
    pub max_zoom: u8,

    /// Anti-scraping caps applied to query responses
    #[serde(default)]
    pub truncation: TruncationPolicy,
}

/// Response caps applied after traversal.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TruncationPolicy {
    /// Most exact markers returned at street zoom
    #[serde(default = "TruncationPolicy::default_max_street_markers")]
    pub max_street_markers: usize,

    /// Most result-list entries returned below `full_results_zoom`
    #[serde(default = "TruncationPolicy::default_max_result_keys")]
    pub max_result_keys: usize,

    /// Zoom at which the result list is no longer capped
    #[serde(default = "TruncationPolicy::default_full_results_zoom")]
    pub full_results_zoom: u8,
}

impl TruncationPolicy {
    const fn default_max_street_markers() -> usize {
        20
    }

    const fn default_max_result_keys() -> usize {
        10
    }

    const fn default_full_results_zoom() -> u8 {
        13
    }
}

impl Default for TruncationPolicy {
    fn default() -> Self {
        Self {
            max_street_markers: Self::default_max_street_markers(),
            max_result_keys: Self::default_max_result_keys(),
            full_results_zoom: Self::default_full_results_zoom(),
        }
    }
}

impl Config {
    const fn default_precision() -> usize {
        DEFAULT_PRECISION
    }

    const fn default_radius_padding() -> f64 {
        1.3
    }

    const fn default_max_zoom() -> u8 {
        22
    }

    pub fn with_precision(mut self, precision: usize) -> Self {
        assert!(
            (1..=MAX_GEOHASH_PRECISION).contains(&precision),
            "Geohash precision must be between 1 and 12"
        );
        self.precision = precision;
        self
    }

    pub fn with_radius_padding(mut self, padding: f64) -> Self {
        assert!(
            padding.is_finite() && padding >= 1.0,
            "Radius padding must be a finite value >= 1.0"
        );
        self.radius_padding = padding;
        self
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_truncation(mut self, truncation: TruncationPolicy) -> Self {
        self.truncation = truncation;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_GEOHASH_PRECISION).contains(&self.precision) {
            return Err(format!(
                "Precision must be between 1 and {}, got {}",
                MAX_GEOHASH_PRECISION, self.precision
            ));
        }

        if !self.radius_padding.is_finite() || self.radius_padding < 1.0 {
            return Err(format!(
                "Radius padding must be a finite value >= 1.0, got {}",
                self.radius_padding
            ));
        }

        if self.truncation.max_street_markers == 0 {
            log::warn!("max_street_markers is 0; street zoom responses will carry no markers");
        }

        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            precision: Self::default_precision(),
            radius_padding: Self::default_radius_padding(),
            max_zoom: Self::default_max_zoom(),
            truncation: TruncationPolicy::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.precision, 6);
        assert_eq!(config.radius_padding, 1.3);
        assert_eq!(config.max_zoom, 22);
        assert_eq!(config.truncation.max_street_markers, 20);
        assert_eq!(config.truncation.max_result_keys, 10);
        assert_eq!(config.truncation.full_results_zoom, 13);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_partial_document() {
        let config = Config::from_json(r#"{"precision": 7, "truncation": {"max_result_keys": 5}}"#)
            .unwrap();
        assert_eq!(config.precision, 7);
        assert_eq!(config.truncation.max_result_keys, 5);
        assert_eq!(config.truncation.max_street_markers, 20);

        let json = config.to_json().unwrap();
        assert_eq!(Config::from_json(&json).unwrap(), config);
    }

    #[test]
    fn test_json_rejects_invalid() {
        assert!(Config::from_json(r#"{"precision": 0}"#).is_err());
        assert!(Config::from_json(r#"{"precision": 13}"#).is_err());
        assert!(Config::from_json(r#"{"radius_padding": 0.5}"#).is_err());
        assert!(Config::from_json(r#"{"unknown": true}"#).is_err());
    }

    #[test]
    fn test_builders() {
        let config = Config::default()
            .with_precision(9)
            .with_radius_padding(1.5)
            .with_max_zoom(20);
        assert_eq!(config.precision, 9);
        assert_eq!(config.radius_padding, 1.5);
        assert_eq!(config.max_zoom, 20);
    }

    #[test]
    #[should_panic(expected = "Radius padding must be a finite value >= 1.0")]
    fn test_padding_below_one_panics() {
        let _ = Config::default().with_radius_padding(0.9);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_roundtrip() {
        let config = Config::from_toml("precision = 8\n[truncation]\nfull_results_zoom = 14\n").unwrap();
        assert_eq!(config.precision, 8);
        assert_eq!(config.truncation.full_results_zoom, 14);

        let toml = config.to_toml().unwrap();
        assert_eq!(Config::from_toml(&toml).unwrap(), config);
    }
}
