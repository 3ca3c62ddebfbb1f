use crate::graph::{ArtifactGraph, CompletedSet};
use std::path::Path;

const GLOB_CHARS: &[char] = &['*', '?', '['];

pub fn is_glob_pattern(generates: &str) -> bool {
    generates.contains(GLOB_CHARS)
}

/// Scan `change_dir` and return the ids of artifacts whose output exists.
///
/// Literal `generates` paths must name a regular file. Glob patterns need at
/// least one matching regular file; matching directories and dotfiles do not
/// count. A
/// missing or empty change directory yields an empty set.
pub fn detect_completed(graph: &ArtifactGraph, change_dir: &Path) -> CompletedSet {
    let mut completed = CompletedSet::new();
    if !change_dir.is_dir() {
        tracing::debug!(dir = %change_dir.display(), "change directory missing, nothing completed");
        return completed;
    }

    for artifact in graph.artifacts() {
        if artifact_output_exists(change_dir, &artifact.generates) {
            completed.insert(artifact.id.clone());
        }
    }
    tracing::debug!(
        dir = %change_dir.display(),
        completed = completed.len(),
        total = graph.artifacts().len(),
        "scanned change directory"
    );
    completed
}

pub fn artifact_output_exists(change_dir: &Path, generates: &str) -> bool {
    if !is_glob_pattern(generates) {
        return change_dir.join(generates).is_file();
    }

    // Only the pattern may contain metacharacters; the directory is literal.
    let base = glob::Pattern::escape(&change_dir.to_string_lossy());
    let pattern = format!("{base}/{}", generates.trim_start_matches("./"));
    let options = glob::MatchOptions {
        require_literal_leading_dot: true,
        ..Default::default()
    };
    match glob::glob_with(&pattern, options) {
        Ok(paths) => paths.filter_map(|p| p.ok()).any(|p| p.is_file()),
        Err(e) => {
            tracing::warn!(pattern = %generates, error = %e, "invalid glob pattern");
            false
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
