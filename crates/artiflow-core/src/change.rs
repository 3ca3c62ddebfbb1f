use crate::error::{ArtiflowError, Result};
use crate::metadata::ChangeMetadata;
use crate::paths;
use crate::resolver::SchemaResolver;
use std::path::{Path, PathBuf};

/// Scaffold `.artiflow/changes/<name>/` and record its schema.
///
/// `schema` falls back to `default_schema`; either way it must exist in the
/// resolver's catalog before anything touches the filesystem.
pub fn create_change(
    root: &Path,
    resolver: &SchemaResolver,
    name: &str,
    schema: Option<&str>,
    default_schema: &str,
) -> Result<PathBuf> {
    paths::validate_change_name(name)?;

    let schema_name = crate::resolver::normalize_name(schema.unwrap_or(default_schema));
    let available = resolver.list_schemas();
    if !available.iter().any(|s| s == schema_name) {
        return Err(ArtiflowError::SchemaNotFound {
            name: schema_name.to_string(),
            available,
        });
    }

    let dir = paths::change_dir(root, name);
    if dir.exists() {
        return Err(ArtiflowError::ChangeExists {
            name: name.to_string(),
            path: dir,
        });
    }

    crate::io::ensure_dir(&dir)?;
    ChangeMetadata::new(schema_name).save(&dir, resolver)?;
    tracing::debug!(change = name, schema = schema_name, "created change");
    Ok(dir)
}

/// Names of change directories, sorted. The archive directory is excluded.
pub fn list_changes(root: &Path) -> Result<Vec<String>> {
    let dir = paths::changes_dir(root);
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(&dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == paths::ARCHIVE_DIR_NAME || name.starts_with('.') {
            continue;
        }
        names.push(name);
    }
    names.sort();
    Ok(names)
}
