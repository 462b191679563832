//! Path records and entry-point records

use crate::{Result, StorageError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracepath_ids::{AnalysisSession, ClassSig, EntryPoint, MethodSig};
use tracepath_parts::{structural_eq, Form, PartGraph, PartId, Placeholder, Render};

/// One reconstructed path: the placeholder it started from and the expression built
///
/// Each record owns the graph of its expression, so records can be moved between
/// threads and stores independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PathRecordRepr")]
pub struct PathRecord {
    seed: Placeholder,
    graph: PartGraph,
    root: PartId,
}

#[derive(Deserialize)]
struct PathRecordRepr {
    seed: Placeholder,
    graph: PartGraph,
    root: PartId,
}

impl TryFrom<PathRecordRepr> for PathRecord {
    type Error = StorageError;

    fn try_from(repr: PathRecordRepr) -> Result<Self> {
        Self::from_parts(repr.seed, repr.graph, repr.root)
    }
}

impl PathRecord {
    /// Copy the expression at `root` out of a working graph
    ///
    /// `seed` must be a placeholder leaf of the same graph.
    pub fn new(graph: &PartGraph, seed: PartId, root: PartId) -> Result<Self> {
        let seed = graph.placeholder(seed)?.clone();
        let (graph, root) = graph.extract(root)?;
        Ok(Self { seed, graph, root })
    }

    /// Wrap a graph that already holds only this expression
    pub fn from_parts(seed: Placeholder, graph: PartGraph, root: PartId) -> Result<Self> {
        graph.part(root)?;
        Ok(Self { seed, graph, root })
    }

    pub fn seed(&self) -> &Placeholder {
        &self.seed
    }

    pub fn graph(&self) -> &PartGraph {
        &self.graph
    }

    pub fn root(&self) -> PartId {
        self.root
    }

    pub fn render(&self, form: Form) -> Result<String> {
        Ok(self.graph.render(self.root, form)?)
    }
}

impl PartialEq for PathRecord {
    fn eq(&self, other: &Self) -> bool {
        self.seed == other.seed && structural_eq(&self.graph, self.root, &other.graph, other.root)
    }
}

/// Sort records by seed, keeping the insertion order of equal seeds
pub(crate) fn sort_by_seed(paths: &mut [PathRecord]) {
    paths.sort_by(|a, b| a.seed.cmp(&b.seed));
}

/// Output form of one entry point and its paths
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryPointRecord {
    pub stub: Option<ClassSig>,
    pub method: MethodSig,
    paths: Vec<PathRecord>,
}

impl EntryPointRecord {
    pub fn new(entry: &EntryPoint, paths: Vec<PathRecord>) -> Self {
        Self {
            stub: entry.stub.as_ref().map(|s| s.sig.clone()),
            method: entry.method.sig.clone(),
            paths,
        }
    }

    pub(crate) fn key(&self) -> (Option<ClassSig>, MethodSig) {
        (self.stub.clone(), self.method.clone())
    }

    pub fn paths(&self) -> &[PathRecord] {
        &self.paths
    }

    pub(crate) fn sort_paths(&mut self) {
        sort_by_seed(&mut self.paths);
    }

    /// Resolve the entry point against a live session
    pub fn resolve(&self, session: &dyn AnalysisSession) -> Result<EntryPoint> {
        let method = session.require_method(&self.method)?;
        let stub = self
            .stub
            .as_ref()
            .map(|s| session.require_class(s))
            .transpose()?;
        Ok(EntryPoint::new(method, stub))
    }

    /// `{stub : method}` followed by each seed and its path
    pub fn to_text(&self, spacer: &str, form: Form) -> Result<String> {
        let mut out = String::new();
        let stub = self.stub.as_ref().map_or("null", ClassSig::as_str);
        out.push_str(&format!("{spacer}{{{stub} : {}}}\n", self.method));
        for path in &self.paths {
            out.push_str(&format!("{spacer}  {}\n", path.seed.render(form)));
            out.push_str(&format!("{spacer}    {}\n", path.render(form)?));
        }
        Ok(out)
    }
}

impl Eq for EntryPointRecord {}

impl Ord for EntryPointRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.stub
            .cmp(&other.stub)
            .then_with(|| self.method.cmp(&other.method))
    }
}

impl PartialOrd for EntryPointRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
