use crate::error::ChangeMetadataError;
use crate::paths;
use crate::resolver::SchemaResolver;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

type Result<T> = std::result::Result<T, ChangeMetadataError>;

/// Contents of `<change>/.artiflow.yaml`.
///
/// Only `schema` and `created` are interpreted; any other keys are kept
/// verbatim and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeMetadata {
    pub schema: String,
    pub created: NaiveDate,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ChangeMetadata {
    /// Metadata for a change created today.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            created: chrono::Local::now().date_naive(),
            extra: BTreeMap::new(),
        }
    }

    /// Read and validate a change's metadata. `Ok(None)` when no file exists.
    pub fn load(change_dir: &Path, resolver: &SchemaResolver) -> Result<Option<Self>> {
        let path = paths::metadata_path(change_dir);
        match path.try_exists() {
            Ok(true) => {}
            Ok(false) => return Ok(None),
            Err(source) => return Err(ChangeMetadataError::Read { path, source }),
        }

        let data = std::fs::read_to_string(&path).map_err(|source| ChangeMetadataError::Read {
            path: path.clone(),
            source,
        })?;
        let raw: serde_yaml::Value =
            serde_yaml::from_str(&data).map_err(|source| ChangeMetadataError::Yaml {
                path: path.clone(),
                source,
            })?;
        if raw.is_null() {
            return Err(ChangeMetadataError::Invalid {
                path,
                reason: "metadata file is empty".to_string(),
            });
        }

        let meta: ChangeMetadata =
            serde_yaml::from_value(raw).map_err(|e| ChangeMetadataError::Invalid {
                path: path.clone(),
                reason: e.to_string(),
            })?;
        meta.check_structure(&path)?;
        check_known_schema(resolver, &meta.schema, &path)?;
        Ok(Some(meta))
    }

    /// Validate against the live schema catalog, then write atomically.
    pub fn save(&self, change_dir: &Path, resolver: &SchemaResolver) -> Result<()> {
        let path = paths::metadata_path(change_dir);
        self.check_structure(&path)?;
        check_known_schema(resolver, &self.schema, &path)?;

        let data = serde_yaml::to_string(self).map_err(|e| ChangeMetadataError::Invalid {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        crate::io::atomic_write(&path, data.as_bytes())
            .map_err(|source| ChangeMetadataError::Write {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(path = %path.display(), schema = %self.schema, "wrote change metadata");
        Ok(())
    }

    fn check_structure(&self, path: &Path) -> Result<()> {
        if self.schema.trim().is_empty() {
            return Err(ChangeMetadataError::Invalid {
                path: path.to_path_buf(),
                reason: "schema: must be a non-empty string".to_string(),
            });
        }
        Ok(())
    }
}

fn check_known_schema(resolver: &SchemaResolver, schema: &str, path: &Path) -> Result<()> {
    let available = resolver.list_schemas();
    if available.iter().any(|s| s == schema) {
        return Ok(());
    }
    Err(ChangeMetadataError::UnknownSchema {
        path: path.to_path_buf(),
        schema: schema.to_string(),
        available,
    })
}

/// Pick the schema for a change: explicit override, then the recorded
/// metadata, then `default_schema`. Unreadable metadata falls back silently
/// to the default.
pub fn resolve_schema_for_change(
    resolver: &SchemaResolver,
    change_dir: &Path,
    explicit: Option<&str>,
    default_schema: &str,
) -> String {
    if let Some(name) = explicit.filter(|s| !s.is_empty()) {
        return name.to_string();
    }

    match ChangeMetadata::load(change_dir, resolver) {
        Ok(Some(meta)) => meta.schema,
        Ok(None) => default_schema.to_string(),
        Err(e) => {
            tracing::warn!(dir = %change_dir.display(), error = %e, "ignoring unreadable change metadata");
            default_schema.to_string()
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
