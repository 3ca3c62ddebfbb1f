//! Layered schema lookup.
//!
//! A resolver holds an ordered list of schema directories. Each directory
//! follows the `<dir>/<name>/schema.yaml` layout. Lookups query the layers in
//! priority order and stop at the first hit: a user override replaces a
//! built-in schema of the same name wholesale, nothing is merged.

use crate::error::{ArtiflowError, Result, SchemaLoadError};
use crate::paths;
use crate::schema::{self, SchemaModel};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// SchemaSource / SchemaLayer
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaSource {
    User,
    Package,
}

impl SchemaSource {
    pub fn as_str(self) -> &'static str {
        match self {
            SchemaSource::User => "user",
            SchemaSource::Package => "package",
        }
    }
}

impl fmt::Display for SchemaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SchemaLayer {
    pub source: SchemaSource,
    pub dir: PathBuf,
}

impl SchemaLayer {
    pub fn new(source: SchemaSource, dir: impl Into<PathBuf>) -> Self {
        Self {
            source,
            dir: dir.into(),
        }
    }

    fn schema_file(&self, name: &str) -> PathBuf {
        paths::schema_file(&self.dir, name)
    }

    /// Names of subdirectories holding a `schema.yaml`. Missing dir → empty.
    fn schema_names(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| self.schema_file(name).is_file())
            .collect();
        names.sort();
        names
    }
}

// ---------------------------------------------------------------------------
// Outputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub schema: SchemaModel,
    /// Directory holding `schema.yaml`; templates resolve relative to it.
    pub dir: PathBuf,
    pub source: SchemaSource,
}

/// Catalog entry used for listings and error messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaInfo {
    pub name: String,
    pub description: String,
    pub artifacts: Vec<String>,
    pub source: SchemaSource,
}

// ---------------------------------------------------------------------------
// SchemaResolver
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SchemaResolver {
    layers: Vec<SchemaLayer>,
}

impl SchemaResolver {
    /// User overrides in `user_dir` shadow built-ins in `package_dir`.
    pub fn new(user_dir: impl Into<PathBuf>, package_dir: impl Into<PathBuf>) -> Self {
        Self::with_layers(vec![
            SchemaLayer::new(SchemaSource::User, user_dir),
            SchemaLayer::new(SchemaSource::Package, package_dir),
        ])
    }

    /// Layers in priority order, highest first.
    pub fn with_layers(layers: Vec<SchemaLayer>) -> Self {
        Self { layers }
    }

    /// User data dir from the environment plus the built-in schemas.
    pub fn from_env() -> Self {
        let package = SchemaLayer::new(SchemaSource::Package, paths::package_schemas_dir());
        match paths::user_schemas_dir() {
            Ok(user) => Self::with_layers(vec![SchemaLayer::new(SchemaSource::User, user), package]),
            Err(e) => {
                tracing::debug!(error = %e, "no user data dir, using built-in schemas only");
                Self::with_layers(vec![package])
            }
        }
    }

    pub fn layers(&self) -> &[SchemaLayer] {
        &self.layers
    }

    /// First layer that has `<name>/schema.yaml`, with that file's path.
    pub fn locate(&self, name: &str) -> Option<(&SchemaLayer, PathBuf)> {
        let name = normalize_name(name);
        self.layers.iter().find_map(|layer| {
            let file = layer.schema_file(name);
            file.is_file().then_some((layer, file))
        })
    }

    pub fn resolve(&self, name: &str) -> Result<ResolvedSchema> {
        let normalized = normalize_name(name);
        let Some((layer, file)) = self.locate(normalized) else {
            return Err(ArtiflowError::SchemaNotFound {
                name: normalized.to_string(),
                available: self.list_schemas(),
            });
        };
        tracing::debug!(schema = normalized, source = %layer.source, path = %file.display(), "resolved schema");

        let schema = load_schema_file(&file)?;
        let dir = file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| layer.dir.join(normalized));
        Ok(ResolvedSchema {
            schema,
            dir,
            source: layer.source,
        })
    }

    pub fn resolve_schema(&self, name: &str) -> Result<SchemaModel> {
        Ok(self.resolve(name)?.schema)
    }

    /// Every schema name visible through any layer, sorted and distinct.
    pub fn list_schemas(&self) -> Vec<String> {
        let names: BTreeSet<String> = self
            .layers
            .iter()
            .flat_map(SchemaLayer::schema_names)
            .collect();
        names.into_iter().collect()
    }

    /// One entry per visible name, taken from the highest-priority layer.
    /// Schemas that fail to load are skipped rather than failing the listing;
    /// a broken override still shadows the built-in it would replace.
    pub fn catalog(&self) -> Vec<SchemaInfo> {
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut entries: BTreeMap<String, SchemaInfo> = BTreeMap::new();
        for layer in &self.layers {
            for name in layer.schema_names() {
                if !seen.insert(name.clone()) {
                    continue;
                }
                match load_schema_file(&layer.schema_file(&name)) {
                    Ok(schema) => {
                        let info = SchemaInfo {
                            description: schema.description.clone().unwrap_or_default(),
                            artifacts: schema.artifact_ids(),
                            source: layer.source,
                            name: name.clone(),
                        };
                        entries.insert(name, info);
                    }
                    Err(e) => {
                        tracing::warn!(schema = %name, source = %layer.source, error = %e, "skipping unloadable schema");
                    }
                }
            }
        }
        entries.into_values().collect()
    }
}

/// Strip a trailing `.yaml` / `.yml` so `foo`, `foo.yaml` and `foo.yml` agree.
pub fn normalize_name(name: &str) -> &str {
    name.strip_suffix(".yaml")
        .or_else(|| name.strip_suffix(".yml"))
        .unwrap_or(name)
}

/// Read, parse and validate one `schema.yaml`.
pub fn load_schema_file(path: &Path) -> std::result::Result<SchemaModel, SchemaLoadError> {
    let path = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());

    let content = match std::fs::read_to_string(&path) {
        Ok(content) => content,
        Err(source) => return Err(SchemaLoadError::Read { path, source }),
    };
    let raw: serde_yaml::Value = match serde_yaml::from_str(&content) {
        Ok(raw) => raw,
        Err(source) => return Err(SchemaLoadError::Parse { path, source }),
    };
    match schema::validate(&raw, &path.display().to_string()) {
        Ok(schema) => Ok(schema),
        Err(source) => Err(SchemaLoadError::Invalid { path, source }),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
