use crate::schema::{Artifact, SchemaModel};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};

/// Ids of artifacts whose output is present. Recomputed per query.
pub type CompletedSet = BTreeSet<String>;

/// Not-yet-completed artifact id → sorted ids of its unmet dependencies.
pub type BlockedArtifacts = BTreeMap<String, Vec<String>>;

// ---------------------------------------------------------------------------
// ArtifactGraph
// ---------------------------------------------------------------------------

/// Read-only query layer over a validated [`SchemaModel`].
///
/// The schema is trusted: ids are unique, references resolve and the
/// `requires` edges form a DAG. Nothing here re-validates.
#[derive(Debug, Clone)]
pub struct ArtifactGraph {
    schema: SchemaModel,
    index: HashMap<String, usize>,
}

impl ArtifactGraph {
    pub fn new(schema: SchemaModel) -> Self {
        let index = schema
            .artifacts
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id.clone(), i))
            .collect();
        Self { schema, index }
    }

    pub fn schema(&self) -> &SchemaModel {
        &self.schema
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn version(&self) -> u32 {
        self.schema.version
    }

    pub fn artifact(&self, id: &str) -> Option<&Artifact> {
        self.index.get(id).map(|&i| &self.schema.artifacts[i])
    }

    /// All artifacts in document order.
    pub fn artifacts(&self) -> &[Artifact] {
        &self.schema.artifacts
    }

    /// Topological order via Kahn's algorithm. Roots are seeded sorted and
    /// each batch of newly-ready ids is sorted before it joins the queue, so
    /// ties always break alphabetically.
    pub fn build_order(&self) -> Vec<String> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut dependents: HashMap<&str, Vec<&str>> = HashMap::new();

        for artifact in self.artifacts() {
            in_degree.insert(&artifact.id, artifact.requires.len());
            for req in &artifact.requires {
                dependents.entry(req.as_str()).or_default().push(&artifact.id);
            }
        }

        let mut roots: Vec<&str> = self
            .artifacts()
            .iter()
            .filter(|a| a.is_root())
            .map(|a| a.id.as_str())
            .collect();
        roots.sort_unstable();
        let mut queue: VecDeque<&str> = roots.into();

        let mut order = Vec::with_capacity(self.artifacts().len());
        while let Some(current) = queue.pop_front() {
            order.push(current.to_string());

            let mut newly_ready = Vec::new();
            for &dependent in dependents.get(current).map(Vec::as_slice).unwrap_or(&[]) {
                if let Some(degree) = in_degree.get_mut(dependent) {
                    *degree -= 1;
                    if *degree == 0 {
                        newly_ready.push(dependent);
                    }
                }
            }
            newly_ready.sort_unstable();
            queue.extend(newly_ready);
        }
        order
    }

    /// Artifacts not yet completed whose every dependency is completed.
    pub fn next_artifacts(&self, completed: &CompletedSet) -> Vec<String> {
        let mut ready: Vec<String> = self
            .artifacts()
            .iter()
            .filter(|a| !completed.contains(&a.id))
            .filter(|a| a.requires.iter().all(|r| completed.contains(r)))
            .map(|a| a.id.clone())
            .collect();
        ready.sort();
        ready
    }

    /// Artifacts not yet completed with at least one unmet dependency.
    pub fn blocked(&self, completed: &CompletedSet) -> BlockedArtifacts {
        self.artifacts()
            .iter()
            .filter(|a| !completed.contains(&a.id))
            .filter_map(|a| {
                let mut unmet: Vec<String> = a
                    .requires
                    .iter()
                    .filter(|r| !completed.contains(*r))
                    .cloned()
                    .collect();
                if unmet.is_empty() {
                    return None;
                }
                unmet.sort();
                Some((a.id.clone(), unmet))
            })
            .collect()
    }

    pub fn is_complete(&self, completed: &CompletedSet) -> bool {
        self.artifacts().iter().all(|a| completed.contains(&a.id))
    }

    /// Artifacts that list `id` directly in their `requires`, sorted.
    pub fn unlocks(&self, id: &str) -> Vec<String> {
        let mut out: Vec<String> = self
            .artifacts()
            .iter()
            .filter(|a| a.id != id && a.requires.iter().any(|r| r == id))
            .map(|a| a.id.clone())
            .collect();
        out.sort();
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
