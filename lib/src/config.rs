use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Settings for parsing and balancing
///
/// Every field has a default, so a TOML file only needs the keys it changes:
///
/// ```toml
/// max_nesting_depth = 16
/// validate_elements = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Maximum parenthesis nesting accepted in a formula
    pub max_nesting_depth: usize,
    /// Cross-validate element symbols against the periodic table
    pub validate_elements: bool,
    /// Treat ionic charge as an additional conserved quantity while balancing
    pub conserve_charge: bool,
    /// Intern parsed molecules so that equal formulas share one allocation
    pub cache_molecules: bool,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            validate_elements: false,
            conserve_charge: false,
            cache_molecules: false,
        }
    }
}
impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Parses configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Toml {
            path: "<string>".to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Loads configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::Toml {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_nesting_depth == 0 {
            return Err(ConfigError::Invalid("max_nesting_depth must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct ConfigBuilder {
    max_nesting_depth: Option<usize>,
    validate_elements: Option<bool>,
    conserve_charge: Option<bool>,
    cache_molecules: Option<bool>,
}
impl ConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = Some(depth);
        self
    }
    pub fn validate_elements(mut self, enabled: bool) -> Self {
        self.validate_elements = Some(enabled);
        self
    }
    pub fn conserve_charge(mut self, enabled: bool) -> Self {
        self.conserve_charge = Some(enabled);
        self
    }
    pub fn cache_molecules(mut self, enabled: bool) -> Self {
        self.cache_molecules = Some(enabled);
        self
    }

    pub fn build(self) -> Result<Config, ConfigError> {
        let defaults = Config::default();
        let config = Config {
            max_nesting_depth: self.max_nesting_depth.unwrap_or(defaults.max_nesting_depth),
            validate_elements: self.validate_elements.unwrap_or(defaults.validate_elements),
            conserve_charge: self.conserve_charge.unwrap_or(defaults.conserve_charge),
            cache_molecules: self.cache_molecules.unwrap_or(defaults.cache_molecules),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_toml_gives_defaults() {
        assert_eq!(Config::from_toml_str("").unwrap(), Config::default());
    }

    #[test]
    fn partial_toml_overrides_only_given_keys() {
        let config = Config::from_toml_str("max_nesting_depth = 8\nconserve_charge = true\n").unwrap();
        assert_eq!(config.max_nesting_depth, 8);
        assert!(config.conserve_charge);
        assert!(!config.validate_elements);
        assert!(!config.cache_molecules);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = Config::from_toml_str("max_depth = 8");
        assert!(matches!(result, Err(ConfigError::Toml { .. })));
    }

    #[test]
    fn zero_depth_is_invalid() {
        assert!(matches!(
            Config::from_toml_str("max_nesting_depth = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            Config::builder().max_nesting_depth(0).build(),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn builder_sets_fields() {
        let config = Config::builder()
            .validate_elements(true)
            .cache_molecules(true)
            .build()
            .unwrap();
        assert_eq!(config.max_nesting_depth, DEFAULT_MAX_NESTING_DEPTH);
        assert!(config.validate_elements);
        assert!(config.cache_molecules);
        assert!(!config.conserve_charge);
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "validate_elements = true").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(config.validate_elements);
    }

    #[test]
    fn load_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.toml");

        match Config::load(&path) {
            Err(ConfigError::Io { path: p, .. }) => assert!(p.ends_with("missing.toml")),
            other => panic!("expected Io error, got {:?}", other),
        }
    }
}
