use crate::error::Result;
use crate::paths;
use crate::resolver::SchemaResolver;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SCHEMA: &str = "spec-driven";
const CURRENT_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Project settings stored in `.artiflow/config.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    /// Schema used when neither the caller nor the change metadata names one.
    #[serde(default = "default_schema")]
    pub default_schema: String,
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_schema() -> String {
    DEFAULT_SCHEMA.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            default_schema: default_schema(),
        }
    }
}

impl Config {
    /// Load the project config, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())?;
        Ok(())
    }

    /// Write the default config unless one already exists. Returns true if
    /// a file was written.
    pub fn write_default(root: &Path) -> Result<bool> {
        let data = serde_yaml::to_string(&Self::default())?;
        Ok(crate::io::write_if_missing(&paths::config_path(root), data.as_bytes())?)
    }

    pub fn validate(&self, resolver: &SchemaResolver) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.version != CURRENT_VERSION {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "config version {} is not supported (expected {CURRENT_VERSION})",
                    self.version
                ),
            });
        }

        let available = resolver.list_schemas();
        if !available.contains(&self.default_schema) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "default_schema '{}' not found. Available: {}",
                    self.default_schema,
                    available.join(", ")
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_config_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load(dir.path()).unwrap();
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.default_schema, "spec-driven");
    }

    #[test]
    fn config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let cfg = Config {
            default_schema: "tdd".to_string(),
            ..Config::default()
        };
        cfg.save(dir.path()).unwrap();
        assert_eq!(Config::load(dir.path()).unwrap(), cfg);
    }

    #[test]
    fn write_default_keeps_existing_file() {
        let dir = TempDir::new().unwrap();
        assert!(Config::write_default(dir.path()).unwrap());

        let custom = Config {
            default_schema: "tdd".to_string(),
            ..Config::default()
        };
        custom.save(dir.path()).unwrap();
        assert!(!Config::write_default(dir.path()).unwrap());
        assert_eq!(Config::load(dir.path()).unwrap(), custom);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".artiflow")).unwrap();
        std::fs::write(dir.path().join(".artiflow/config.yaml"), "version: 1\n").unwrap();
        assert_eq!(Config::load(dir.path()).unwrap().default_schema, DEFAULT_SCHEMA);
    }

    #[test]
    fn validate_flags_unknown_default_schema() {
        let dir = TempDir::new().unwrap();
        let resolver = SchemaResolver::new(dir.path().join("user"), dir.path().join("pkg"));
        let warnings = Config::default().validate(&resolver);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].level, WarnLevel::Error);
        assert!(warnings[0].message.contains("spec-driven"));
    }

    #[test]
    fn validate_clean_with_builtin_schemas() {
        let dir = TempDir::new().unwrap();
        let resolver = SchemaResolver::new(dir.path().join("user"), paths::package_schemas_dir());
        assert!(Config::default().validate(&resolver).is_empty());
    }
}
