//! Export styling, loaded from an optional TOML file.
//!
//! ```toml
//! [style]
//! font_name = "Helvetica"
//! association_fill = "salmon"
//! ```
//!
//! Keys that are not set keep their default.

use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("Invalid config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Invalid config value for {key}: {reason}")]
    Value { key: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    pub fn new(style: StyleConfig) -> Self {
        Self { style }
    }

    pub fn style(&self) -> &StyleConfig {
        &self.style
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(source)?;
        config.style.check()?;
        Ok(config)
    }
}

/// Graph-wide styling written into the document header and node statements.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub font_name: String,
    pub font_size: u32,
    pub node_fill: String,
    pub association_fill: String,
    pub enum_fill: String,
    pub nodesep: f64,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            font_name: "Bitstream Vera Sans".to_string(),
            font_size: 8,
            node_fill: "aliceblue".to_string(),
            association_fill: "coral".to_string(),
            enum_fill: "wheat".to_string(),
            nodesep: 0.3,
        }
    }
}

impl StyleConfig {
    fn check(&self) -> Result<(), ConfigError> {
        if self.font_size == 0 {
            return Err(ConfigError::Value {
                key: "font_size",
                reason: "must be positive".to_string(),
            });
        }
        if !self.nodesep.is_finite() || self.nodesep < 0.0 {
            return Err(ConfigError::Value {
                key: "nodesep",
                reason: format!("{} is not a non-negative number", self.nodesep),
            });
        }
        let fills = [
            ("node_fill", &self.node_fill),
            ("association_fill", &self.association_fill),
            ("enum_fill", &self.enum_fill),
        ];
        for (key, value) in fills {
            if value.trim().is_empty() {
                return Err(ConfigError::Value {
                    key,
                    reason: "color must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Load the config file if one is given, defaults otherwise.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let Some(path) = path else {
        debug!("No config file given, using defaults");
        return Ok(AppConfig::default());
    };

    debug!(path:? = path; "Loading config");
    let source = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    AppConfig::from_toml(&source)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_empty() {
        let config = AppConfig::from_toml("").unwrap();
        assert_eq!(config.style(), &StyleConfig::default());
    }

    #[test]
    fn test_partial_style() {
        let config = AppConfig::from_toml(
            r#"
            [style]
            enum_fill = "khaki"
            nodesep = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.style().enum_fill, "khaki");
        assert_eq!(config.style().nodesep, 0.5);
        assert_eq!(config.style().node_fill, "aliceblue");
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            AppConfig::from_toml("[style]\nfont_size = 0"),
            Err(ConfigError::Value { key: "font_size", .. })
        ));
        assert!(matches!(
            AppConfig::from_toml("[style]\nnodesep = -1.0"),
            Err(ConfigError::Value { key: "nodesep", .. })
        ));
        assert!(matches!(
            AppConfig::from_toml("[style]\nnode_fill = \"\""),
            Err(ConfigError::Value { key: "node_fill", .. })
        ));
    }

    #[test]
    fn test_malformed_toml() {
        assert!(matches!(AppConfig::from_toml("[style"), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = load_config(Some(Path::new("/nonexistent/erdot.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }
}
