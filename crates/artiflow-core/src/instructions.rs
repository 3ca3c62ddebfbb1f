//! What to produce next, and how far along a change is.
//!
//! A [`ChangeContext`] is an immutable snapshot: the schema picked for the
//! change, its graph, and the artifacts found on disk when the snapshot was
//! taken. The status and instruction views below are pure functions of that
//! snapshot; the apply view also reads the change's task list.

use crate::completion::detect_completed;
use crate::config::Config;
use crate::error::{ArtiflowError, Result};
use crate::graph::{ArtifactGraph, CompletedSet};
use crate::metadata::resolve_schema_for_change;
use crate::paths;
use crate::resolver::{SchemaResolver, SchemaSource};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// ChangeContext
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ChangeContext {
    pub change_name: String,
    pub change_dir: PathBuf,
    pub schema_name: String,
    pub schema_dir: PathBuf,
    pub schema_source: SchemaSource,
    pub graph: ArtifactGraph,
    pub completed: CompletedSet,
}

impl ChangeContext {
    /// Pick the schema (override → metadata → config default), load it and
    /// scan the change directory.
    pub fn load(
        root: &Path,
        resolver: &SchemaResolver,
        config: &Config,
        change_name: &str,
        schema_override: Option<&str>,
    ) -> Result<Self> {
        paths::validate_change_name(change_name)?;
        let change_dir = paths::change_dir(root, change_name);
        if !change_dir.is_dir() {
            return Err(ArtiflowError::ChangeNotFound(change_name.to_string()));
        }

        let schema_name =
            resolve_schema_for_change(resolver, &change_dir, schema_override, &config.default_schema);
        let resolved = resolver.resolve(&schema_name)?;
        let graph = ArtifactGraph::new(resolved.schema);
        let completed = detect_completed(&graph, &change_dir);

        Ok(Self {
            change_name: change_name.to_string(),
            change_dir,
            schema_name: graph.name().to_string(),
            schema_dir: resolved.dir,
            schema_source: resolved.source,
            graph,
            completed,
        })
    }
}

// ---------------------------------------------------------------------------
// Instructions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DependencyInfo {
    pub id: String,
    pub done: bool,
    pub path: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactInstructions {
    pub artifact_id: String,
    pub change_name: String,
    pub schema_name: String,
    pub change_dir: String,
    pub output_path: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
    pub template_path: String,
    pub template_content: String,
    pub dependencies: Vec<DependencyInfo>,
    pub unlocks: Vec<String>,
}

/// Everything a consumer needs to produce `artifact_id` for this change.
pub fn generate_instructions(ctx: &ChangeContext, artifact_id: &str) -> Result<ArtifactInstructions> {
    let artifact = ctx
        .graph
        .artifact(artifact_id)
        .ok_or_else(|| ArtiflowError::ArtifactNotFound {
            artifact: artifact_id.to_string(),
            schema: ctx.schema_name.clone(),
        })?;

    let template_path = ctx.schema_dir.join(&artifact.template);
    let template_content =
        std::fs::read_to_string(&template_path).map_err(|source| ArtiflowError::TemplateRead {
            path: template_path.clone(),
            source,
        })?;

    let dependencies = artifact
        .requires
        .iter()
        .map(|id| {
            let dep = ctx.graph.artifact(id);
            DependencyInfo {
                id: id.clone(),
                done: ctx.completed.contains(id),
                path: dep.map(|d| d.generates.clone()).unwrap_or_default(),
                description: dep.map(|d| d.description.clone()).unwrap_or_default(),
            }
        })
        .collect();

    Ok(ArtifactInstructions {
        artifact_id: artifact.id.clone(),
        change_name: ctx.change_name.clone(),
        schema_name: ctx.schema_name.clone(),
        change_dir: ctx.change_dir.display().to_string(),
        output_path: artifact.generates.clone(),
        description: artifact.description.clone(),
        instruction: artifact.instruction.clone(),
        template_path: template_path.display().to_string(),
        template_content,
        dependencies,
        unlocks: ctx.graph.unlocks(&artifact.id),
    })
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactState {
    Done,
    Ready,
    Blocked,
}

impl fmt::Display for ArtifactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArtifactState::Done => "done",
            ArtifactState::Ready => "ready",
            ArtifactState::Blocked => "blocked",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactStatus {
    pub id: String,
    pub status: ArtifactState,
    pub missing_deps: Vec<String>,
    pub output_path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeStatus {
    pub change_name: String,
    pub schema_name: String,
    pub is_complete: bool,
    /// Artifacts that gate implementation of the change.
    pub apply_requires: Vec<String>,
    pub artifacts: Vec<ArtifactStatus>,
}

impl ChangeStatus {
    pub fn ready_for_apply(&self) -> bool {
        self.apply_requires.iter().all(|id| {
            self.artifacts
                .iter()
                .any(|a| a.id == *id && a.status == ArtifactState::Done)
        })
    }
}

/// Per-artifact done/ready/blocked classification, in build order.
pub fn format_change_status(ctx: &ChangeContext) -> ChangeStatus {
    let graph = &ctx.graph;
    let mut blocked = graph.blocked(&ctx.completed);

    let artifacts = graph
        .build_order()
        .into_iter()
        .filter_map(|id| {
            let artifact = graph.artifact(&id)?;
            let (status, missing_deps) = if ctx.completed.contains(&id) {
                (ArtifactState::Done, Vec::new())
            } else if let Some(missing) = blocked.remove(&id) {
                (ArtifactState::Blocked, missing)
            } else {
                (ArtifactState::Ready, Vec::new())
            };
            Some(ArtifactStatus {
                output_path: artifact.generates.clone(),
                id,
                status,
                missing_deps,
            })
        })
        .collect();

    ChangeStatus {
        change_name: ctx.change_name.clone(),
        schema_name: ctx.schema_name.clone(),
        is_complete: graph.is_complete(&ctx.completed),
        apply_requires: graph.schema().apply_requires(),
        artifacts,
    }
}

// ---------------------------------------------------------------------------
// Apply
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyState {
    Blocked,
    Ready,
    AllDone,
}

impl fmt::Display for ApplyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ApplyState::Blocked => "blocked",
            ApplyState::Ready => "ready",
            ApplyState::AllDone => "all_done",
        };
        f.write_str(s)
    }
}

/// One checkbox line from the tracked task list. Ids count from 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskItem {
    pub id: usize,
    pub description: String,
    pub done: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskProgress {
    pub total: usize,
    pub complete: usize,
    pub remaining: usize,
}

impl TaskProgress {
    fn of(tasks: &[TaskItem]) -> Self {
        let complete = tasks.iter().filter(|t| t.done).count();
        Self {
            total: tasks.len(),
            complete,
            remaining: tasks.len() - complete,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplyInstructions {
    pub change_name: String,
    pub schema_name: String,
    pub change_dir: String,
    pub state: ApplyState,
    pub missing_artifacts: Vec<String>,
    /// Artifact id to on-disk output, for every artifact already produced.
    pub context_files: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks_path: Option<String>,
    pub tasks: Vec<TaskItem>,
    pub progress: TaskProgress,
    pub instruction: String,
}

const READY_NO_TRACKS: &str = "All required artifacts complete. Proceed with implementation.";
const READY_WITH_TASKS: &str =
    "Read the context files, work through the pending tasks and tick them off as you go.";

/// Whether implementation can start, and how far it has got.
///
/// The gate is `apply.requires` (every artifact when absent). When the schema
/// names an `apply.tracks` file, its checkbox items drive progress: a missing
/// or empty list blocks, a fully ticked one is `AllDone`.
pub fn apply_instructions(ctx: &ChangeContext) -> Result<ApplyInstructions> {
    let schema = ctx.graph.schema();
    let apply = schema.apply.as_ref();

    let missing_artifacts: Vec<String> = schema
        .apply_requires()
        .into_iter()
        .filter(|id| !ctx.completed.contains(id))
        .collect();

    let context_files = ctx
        .graph
        .artifacts()
        .iter()
        .filter(|a| ctx.completed.contains(&a.id))
        .map(|a| (a.id.clone(), ctx.change_dir.join(&a.generates).display().to_string()))
        .collect();

    let tracks = apply.and_then(|a| a.tracks.as_deref());
    let tracks_path = tracks.map(|t| ctx.change_dir.join(t));
    let tracks_exists = tracks_path.as_ref().is_some_and(|p| p.is_file());
    let tasks = match &tracks_path {
        Some(path) if tracks_exists => {
            let content = fs::read_to_string(path).map_err(|source| ArtiflowError::TracksRead {
                path: path.clone(),
                source,
            })?;
            parse_checkbox_tasks(&content)
        }
        _ => Vec::new(),
    };
    let progress = TaskProgress::of(&tasks);

    let schema_instruction = apply
        .and_then(|a| a.instruction.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let tracks_name = tracks.map(|t| {
        Path::new(t)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| t.to_string())
    });

    let (state, instruction) = if !missing_artifacts.is_empty() {
        (
            ApplyState::Blocked,
            format!(
                "Cannot apply this change yet. Missing artifacts: {}.",
                missing_artifacts.join(", ")
            ),
        )
    } else if let Some(name) = tracks_name {
        if !tracks_exists {
            (
                ApplyState::Blocked,
                format!("The {name} file is missing and must be created."),
            )
        } else if progress.total == 0 {
            (
                ApplyState::Blocked,
                format!("{name} contains no tasks. Add checkbox items (\"- [ ] ...\") first."),
            )
        } else if progress.remaining == 0 {
            (
                ApplyState::AllDone,
                "All tasks are complete. The change is ready to be archived.".to_string(),
            )
        } else {
            (
                ApplyState::Ready,
                schema_instruction.unwrap_or(READY_WITH_TASKS).to_string(),
            )
        }
    } else {
        (
            ApplyState::Ready,
            schema_instruction.unwrap_or(READY_NO_TRACKS).to_string(),
        )
    };

    Ok(ApplyInstructions {
        change_name: ctx.change_name.clone(),
        schema_name: ctx.schema_name.clone(),
        change_dir: ctx.change_dir.display().to_string(),
        state,
        missing_artifacts,
        context_files,
        tracks_path: tracks_path.map(|p| p.display().to_string()),
        tasks,
        progress,
        instruction,
    })
}

/// `- [ ] text`, `- [x] text` and `* [X] text` lines, in order. Other lines
/// are ignored.
fn parse_checkbox_tasks(content: &str) -> Vec<TaskItem> {
    let mut tasks = Vec::new();
    for line in content.lines() {
        let line = line.trim_start();
        let Some(item) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) else {
            continue;
        };
        let (done, rest) = if let Some(rest) = item.strip_prefix("[ ] ") {
            (false, rest)
        } else if let Some(rest) = item
            .strip_prefix("[x] ")
            .or_else(|| item.strip_prefix("[X] "))
        {
            (true, rest)
        } else {
            continue;
        };
        tasks.push(TaskItem {
            id: tasks.len() + 1,
            description: rest.trim().to_string(),
            done,
        });
    }
    tasks
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
