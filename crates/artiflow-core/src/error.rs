use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// SchemaValidationError
// ---------------------------------------------------------------------------

/// A schema document failed structural validation.
///
/// `label` names where the document came from (a file path, or a caller
/// supplied tag for in-memory content) so messages stay attributable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid schema ({label}): {kind}")]
pub struct SchemaValidationError {
    pub label: String,
    pub kind: ValidationErrorKind,
}

impl SchemaValidationError {
    pub fn new(label: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            label: label.into(),
            kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    NotAMapping,
    MissingName,
    InvalidVersion,
    MissingArtifacts,
    InvalidArtifactField { index: usize, field: &'static str },
    InvalidRequires { index: usize },
    InvalidApply,
    DuplicateId(String),
    DuplicateRequires { artifact: String, id: String },
    InvalidReference { artifact: String, missing: String },
    InvalidApplyReference { missing: String },
    Cycle(Vec<String>),
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationErrorKind::NotAMapping => f.write_str("document must be a mapping"),
            ValidationErrorKind::MissingName => {
                f.write_str("name: must be a non-empty string")
            }
            ValidationErrorKind::InvalidVersion => {
                f.write_str("version: must be a positive integer")
            }
            ValidationErrorKind::MissingArtifacts => {
                f.write_str("artifacts: must be a non-empty list")
            }
            ValidationErrorKind::InvalidArtifactField { index, field } => {
                write!(f, "artifacts.{index}.{field}: must be a non-empty string")
            }
            ValidationErrorKind::InvalidRequires { index } => {
                write!(f, "artifacts.{index}.requires: must be a list of artifact ids")
            }
            ValidationErrorKind::InvalidApply => {
                f.write_str("apply: must be a mapping with an optional list of artifact ids")
            }
            ValidationErrorKind::DuplicateId(id) => write!(f, "Duplicate artifact ID: {id}"),
            ValidationErrorKind::DuplicateRequires { artifact, id } => {
                write!(f, "Duplicate dependency '{id}' in artifact '{artifact}'")
            }
            ValidationErrorKind::InvalidReference { artifact, missing } => write!(
                f,
                "Invalid dependency reference in artifact '{artifact}': '{missing}' does not exist"
            ),
            ValidationErrorKind::InvalidApplyReference { missing } => write!(
                f,
                "Invalid apply reference: '{missing}' does not exist"
            ),
            ValidationErrorKind::Cycle(path) => {
                write!(f, "Cyclic dependency detected: {}", path.join(" → "))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// SchemaLoadError
// ---------------------------------------------------------------------------

/// Loading a `schema.yaml` from disk failed. Always names the absolute path.
#[derive(Debug, Error)]
pub enum SchemaLoadError {
    #[error("failed to read schema at '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse schema at '{}'", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid schema at '{}': {}", .path.display(), .source.kind)]
    Invalid {
        path: PathBuf,
        #[source]
        source: SchemaValidationError,
    },
}

impl SchemaLoadError {
    pub fn path(&self) -> &std::path::Path {
        match self {
            SchemaLoadError::Read { path, .. }
            | SchemaLoadError::Parse { path, .. }
            | SchemaLoadError::Invalid { path, .. } => path,
        }
    }
}

// ---------------------------------------------------------------------------
// ChangeMetadataError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ChangeMetadataError {
    #[error("failed to read metadata at '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write metadata at '{}'", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in metadata file '{}'", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid metadata at '{}': {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },

    #[error("unknown schema '{schema}' in '{}'. Available: {}", .path.display(), .available.join(", "))]
    UnknownSchema {
        path: PathBuf,
        schema: String,
        available: Vec<String>,
    },
}

// ---------------------------------------------------------------------------
// ArtiflowError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ArtiflowError {
    #[error("Schema '{name}' not found. Available schemas: {}", .available.join(", "))]
    SchemaNotFound { name: String, available: Vec<String> },

    #[error(transparent)]
    SchemaLoad(#[from] SchemaLoadError),

    #[error(transparent)]
    SchemaValidation(#[from] SchemaValidationError),

    #[error(transparent)]
    ChangeMetadata(#[from] ChangeMetadataError),

    #[error("artifact '{artifact}' not found in schema '{schema}'")]
    ArtifactNotFound { artifact: String, schema: String },

    #[error("change not found: {0}")]
    ChangeNotFound(String),

    #[error("change '{name}' already exists at {}", .path.display())]
    ChangeExists { name: String, path: PathBuf },

    #[error("invalid change name '{name}': {reason}")]
    InvalidChangeName { name: String, reason: String },

    #[error("failed to read template at '{}'", .path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read task list at '{}'", .path.display())]
    TracksRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("home directory not found: set HOME or XDG_DATA_HOME")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ArtiflowError>;
