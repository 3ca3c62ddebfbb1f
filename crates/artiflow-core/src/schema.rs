//! Schema model and validation.
//!
//! Schema documents are parsed into an untyped YAML tree first, then
//! [`validate`] walks that tree and either produces an immutable
//! [`SchemaModel`] or a [`SchemaValidationError`] naming the first problem
//! found. Checks run in a fixed order over artifacts in document order, so
//! the same input always yields the same error text.

use crate::error::{Result, SchemaValidationError, ValidationErrorKind};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub id: String,
    /// Relative output path, or a glob pattern, under the change directory.
    pub generates: String,
    pub description: String,
    /// Template body location, relative to the schema's own directory.
    pub template: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    pub requires: Vec<String>,
}

impl Artifact {
    pub fn is_root(&self) -> bool {
        self.requires.is_empty()
    }
}

/// Optional gate describing what must exist before implementation starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyPhase {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requires: Option<Vec<String>>,
    /// Checkbox task list, relative to the change directory, that records
    /// implementation progress.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaModel {
    pub name: String,
    pub version: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub artifacts: Vec<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply: Option<ApplyPhase>,
}

impl SchemaModel {
    pub fn artifact_ids(&self) -> Vec<String> {
        self.artifacts.iter().map(|a| a.id.clone()).collect()
    }

    /// Artifacts that must be complete before implementation may start.
    /// Every artifact, unless the schema narrows it with `apply.requires`.
    pub fn apply_requires(&self) -> Vec<String> {
        self.apply
            .as_ref()
            .and_then(|apply| apply.requires.clone())
            .unwrap_or_else(|| self.artifact_ids())
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse and validate schema YAML held in memory.
pub fn parse_schema(content: &str, label: &str) -> Result<SchemaModel> {
    let raw: Value = serde_yaml::from_str(content)?;
    Ok(validate(&raw, label)?)
}

/// Validate an untyped schema document into a [`SchemaModel`].
pub fn validate(raw: &Value, label: &str) -> std::result::Result<SchemaModel, SchemaValidationError> {
    let fail = |kind| SchemaValidationError::new(label, kind);

    let doc = raw
        .as_mapping()
        .ok_or_else(|| fail(ValidationErrorKind::NotAMapping))?;

    let name = non_empty_str(doc, "name").ok_or_else(|| fail(ValidationErrorKind::MissingName))?;
    let version = positive_int(doc, "version").ok_or_else(|| fail(ValidationErrorKind::InvalidVersion))?;
    let description = optional_str(doc, "description");

    let raw_artifacts = doc
        .get("artifacts")
        .and_then(Value::as_sequence)
        .filter(|seq| !seq.is_empty())
        .ok_or_else(|| fail(ValidationErrorKind::MissingArtifacts))?;

    let mut artifacts = Vec::with_capacity(raw_artifacts.len());
    for (index, raw_artifact) in raw_artifacts.iter().enumerate() {
        artifacts.push(parse_artifact(index, raw_artifact).map_err(fail)?);
    }

    let apply = match doc.get("apply") {
        None | Some(Value::Null) => None,
        Some(value) => Some(parse_apply(value).map_err(fail)?),
    };

    check_unique_ids(&artifacts).map_err(fail)?;
    check_references(&artifacts, apply.as_ref()).map_err(fail)?;
    if let Some(path) = find_cycle(&artifacts) {
        return Err(fail(ValidationErrorKind::Cycle(path)));
    }

    Ok(SchemaModel {
        name,
        version,
        description,
        artifacts,
        apply,
    })
}

fn parse_artifact(index: usize, raw: &Value) -> std::result::Result<Artifact, ValidationErrorKind> {
    let field_err = |field| ValidationErrorKind::InvalidArtifactField { index, field };

    let map = raw.as_mapping().ok_or(field_err("id"))?;
    let id = non_empty_str(map, "id").ok_or(field_err("id"))?;
    let generates = non_empty_str(map, "generates").ok_or(field_err("generates"))?;
    let description = non_empty_str(map, "description").ok_or(field_err("description"))?;
    let template = non_empty_str(map, "template").ok_or(field_err("template"))?;
    let requires = id_list(map.get("requires"))
        .ok_or(ValidationErrorKind::InvalidRequires { index })?
        .unwrap_or_default();
    if let Some(dup) = first_duplicate(&requires) {
        return Err(ValidationErrorKind::DuplicateRequires {
            artifact: id,
            id: dup.to_string(),
        });
    }

    Ok(Artifact {
        id,
        generates,
        description,
        template,
        instruction: optional_str(map, "instruction"),
        requires,
    })
}

fn parse_apply(raw: &Value) -> std::result::Result<ApplyPhase, ValidationErrorKind> {
    let map = raw.as_mapping().ok_or(ValidationErrorKind::InvalidApply)?;
    let requires = id_list(map.get("requires")).ok_or(ValidationErrorKind::InvalidApply)?;
    if requires.as_deref().and_then(first_duplicate).is_some() {
        return Err(ValidationErrorKind::InvalidApply);
    }
    let tracks = match map.get("tracks") {
        None | Some(Value::Null) => None,
        Some(_) => Some(non_empty_str(map, "tracks").ok_or(ValidationErrorKind::InvalidApply)?),
    };
    Ok(ApplyPhase {
        requires,
        tracks,
        instruction: optional_str(map, "instruction"),
    })
}

fn first_duplicate(ids: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    ids.iter().map(String::as_str).find(|id| !seen.insert(*id))
}

fn non_empty_str(map: &Mapping, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

fn optional_str(map: &Mapping, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_string)
}

fn positive_int(map: &Mapping, key: &str) -> Option<u32> {
    map.get(key)
        .and_then(Value::as_u64)
        .filter(|&v| v > 0)
        .and_then(|v| u32::try_from(v).ok())
}

/// `None` when the value is malformed; `Some(None)` when absent or null.
fn id_list(value: Option<&Value>) -> Option<Option<Vec<String>>> {
    match value {
        None | Some(Value::Null) => Some(None),
        Some(Value::Sequence(seq)) => seq
            .iter()
            .map(|v| v.as_str().filter(|s| !s.is_empty()).map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .map(Some),
        Some(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Graph checks
// ---------------------------------------------------------------------------

fn check_unique_ids(artifacts: &[Artifact]) -> std::result::Result<(), ValidationErrorKind> {
    let mut seen = HashSet::new();
    for artifact in artifacts {
        if !seen.insert(artifact.id.as_str()) {
            return Err(ValidationErrorKind::DuplicateId(artifact.id.clone()));
        }
    }
    Ok(())
}

fn check_references(
    artifacts: &[Artifact],
    apply: Option<&ApplyPhase>,
) -> std::result::Result<(), ValidationErrorKind> {
    let ids: HashSet<&str> = artifacts.iter().map(|a| a.id.as_str()).collect();

    for artifact in artifacts {
        if let Some(missing) = artifact.requires.iter().find(|r| !ids.contains(r.as_str())) {
            return Err(ValidationErrorKind::InvalidReference {
                artifact: artifact.id.clone(),
                missing: missing.clone(),
            });
        }
    }

    let apply_requires = apply.and_then(|a| a.requires.as_deref()).unwrap_or(&[]);
    if let Some(missing) = apply_requires.iter().find(|r| !ids.contains(r.as_str())) {
        return Err(ValidationErrorKind::InvalidApplyReference {
            missing: missing.clone(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// Depth-first search with white/gray/black marking. The current path is
/// kept as an explicit stack; reaching a gray node means the stack from that
/// node onward is a cycle, returned closed (first id repeated at the end).
fn find_cycle(artifacts: &[Artifact]) -> Option<Vec<String>> {
    let index: HashMap<&str, usize> = artifacts
        .iter()
        .enumerate()
        .map(|(i, a)| (a.id.as_str(), i))
        .collect();
    let mut marks = vec![Mark::White; artifacts.len()];
    let mut stack = Vec::new();

    (0..artifacts.len()).find_map(|start| {
        if marks[start] != Mark::White {
            return None;
        }
        visit(start, artifacts, &index, &mut marks, &mut stack)
    })
}

fn visit(
    node: usize,
    artifacts: &[Artifact],
    index: &HashMap<&str, usize>,
    marks: &mut [Mark],
    stack: &mut Vec<usize>,
) -> Option<Vec<String>> {
    marks[node] = Mark::Gray;
    stack.push(node);

    for dep in &artifacts[node].requires {
        let Some(&next) = index.get(dep.as_str()) else {
            continue;
        };
        match marks[next] {
            Mark::Gray => {
                let start = stack.iter().position(|&n| n == next).unwrap_or(0);
                let mut path: Vec<String> = stack[start..]
                    .iter()
                    .map(|&n| artifacts[n].id.clone())
                    .collect();
                path.push(artifacts[next].id.clone());
                return Some(path);
            }
            Mark::White => {
                if let Some(cycle) = visit(next, artifacts, index, marks, stack) {
                    return Some(cycle);
                }
            }
            Mark::Black => {}
        }
    }

    stack.pop();
    marks[node] = Mark::Black;
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
