use crate::error::{ArtiflowError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const ARTIFLOW_DIR: &str = ".artiflow";
pub const CHANGES_DIR: &str = ".artiflow/changes";
pub const CONFIG_FILE: &str = ".artiflow/config.yaml";
pub const ARCHIVE_DIR_NAME: &str = "archive";

pub const METADATA_FILE: &str = ".artiflow.yaml";
pub const SCHEMAS_DIR: &str = "schemas";
pub const SCHEMA_FILE: &str = "schema.yaml";

/// Directory name under the platform data dir holding user overrides.
pub const DATA_DIR_NAME: &str = "artiflow";

// ---------------------------------------------------------------------------
// Project paths
// ---------------------------------------------------------------------------

pub fn changes_dir(root: &Path) -> PathBuf {
    root.join(CHANGES_DIR)
}

pub fn change_dir(root: &Path, name: &str) -> PathBuf {
    changes_dir(root).join(name)
}

pub fn metadata_path(change_dir: &Path) -> PathBuf {
    change_dir.join(METADATA_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

// ---------------------------------------------------------------------------
// Schema locations
// ---------------------------------------------------------------------------

/// `<dir>/<name>/schema.yaml`
pub fn schema_file(schemas_dir: &Path, name: &str) -> PathBuf {
    schemas_dir.join(name).join(SCHEMA_FILE)
}

/// Built-in schemas shipped alongside this crate.
pub fn package_schemas_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join(SCHEMAS_DIR)
}

/// Platform data directory for user data such as schema overrides.
///
/// `$XDG_DATA_HOME/artiflow` wins on every platform when set. Otherwise
/// `%LOCALAPPDATA%/artiflow` on Windows and `~/.local/share/artiflow` elsewhere.
pub fn user_data_dir() -> Result<PathBuf> {
    if let Some(xdg) = std::env::var_os("XDG_DATA_HOME").filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join(DATA_DIR_NAME));
    }

    if cfg!(windows) {
        if let Some(local) = std::env::var_os("LOCALAPPDATA").filter(|v| !v.is_empty()) {
            return Ok(PathBuf::from(local).join(DATA_DIR_NAME));
        }
        let home = home::home_dir().ok_or(ArtiflowError::HomeNotFound)?;
        return Ok(home.join("AppData").join("Local").join(DATA_DIR_NAME));
    }

    let home = home::home_dir().ok_or(ArtiflowError::HomeNotFound)?;
    Ok(home.join(".local").join("share").join(DATA_DIR_NAME))
}

pub fn user_schemas_dir() -> Result<PathBuf> {
    Ok(user_data_dir()?.join(SCHEMAS_DIR))
}

// ---------------------------------------------------------------------------
// Change name validation
// ---------------------------------------------------------------------------

static CHANGE_NAME_RE: OnceLock<Regex> = OnceLock::new();

fn change_name_re() -> &'static Regex {
    CHANGE_NAME_RE.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9]*(-[a-z0-9]+)*$").expect("static regex is valid")
    })
}

/// Change names are kebab-case: a leading lowercase letter, then lowercase
/// letters, digits and single hyphens.
pub fn validate_change_name(name: &str) -> Result<()> {
    let reason = if name.is_empty() {
        "change name cannot be empty"
    } else if change_name_re().is_match(name) {
        return Ok(());
    } else if name.chars().any(|c| c.is_ascii_uppercase()) {
        "change name must be lowercase (use kebab-case)"
    } else if name.chars().any(char::is_whitespace) {
        "change name cannot contain spaces (use hyphens instead)"
    } else if name.contains('_') {
        "change name cannot contain underscores (use hyphens instead)"
    } else if name.starts_with('-') {
        "change name cannot start with a hyphen"
    } else if name.ends_with('-') {
        "change name cannot end with a hyphen"
    } else if name.contains("--") {
        "change name cannot contain consecutive hyphens"
    } else if name
        .chars()
        .any(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-'))
    {
        "change name can only contain lowercase letters, numbers, and hyphens"
    } else if name.starts_with(|c: char| c.is_ascii_digit()) {
        "change name must start with a letter"
    } else {
        "change name must follow kebab-case convention (e.g. add-auth, refactor-db)"
    };

    Err(ArtiflowError::InvalidChangeName {
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
