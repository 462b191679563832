//! The path store: entry point to reconstructed paths

use super::record::{EntryPointRecord, PathRecord};
use crate::lock::StoreLock;
use crate::provider::{write_file, PersistentStore};
use crate::{FileHashList, Result, StorageError, StoreConfig};
use log::{debug, info};
use parking_lot::{MappedRwLockReadGuard, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracepath_ids::{AnalysisSession, ClassSig, EntryPoint, MethodSig};
use tracepath_parts::Form;

type EntryKey = (Option<ClassSig>, MethodSig);

/// Resolved view: live entry points to their paths
pub type ResolvedPaths = BTreeMap<EntryPoint, Vec<PathRecord>>;

#[derive(Default, Serialize, Deserialize)]
struct PathsData {
    file_hashes: FileHashList,
    records: Vec<EntryPointRecord>,

    #[serde(skip)]
    index: HashMap<EntryKey, usize>,
    #[serde(skip)]
    sorted: bool,
    #[serde(skip)]
    session: Option<Arc<dyn AnalysisSession>>,
    #[serde(skip)]
    resolved: ResolvedPaths,
    #[serde(skip)]
    resolved_loaded: bool,
}

impl PathsData {
    fn fresh() -> Self {
        Self {
            sorted: true,
            ..Self::default()
        }
    }

    fn insert(&mut self, entry: EntryPoint, paths: Vec<PathRecord>) {
        let record = EntryPointRecord::new(&entry, paths.clone());
        match self.index.get(&record.key()) {
            Some(&i) => self.records[i] = record,
            None => {
                self.index.insert(record.key(), self.records.len());
                self.records.push(record);
            }
        }
        if self.resolved_loaded {
            let mut paths = paths;
            super::record::sort_by_seed(&mut paths);
            self.resolved.insert(entry, paths);
        }
        self.sorted = false;
    }

    fn sort(&mut self) {
        if self.sorted {
            return;
        }
        for record in &mut self.records {
            record.sort_paths();
        }
        self.records.sort();
        self.rebuild_index();
        self.sorted = true;
        debug!("sorted {} entry point record(s)", self.records.len());
    }

    fn rebuild_index(&mut self) {
        self.index = self
            .records
            .iter()
            .enumerate()
            .map(|(i, r)| (r.key(), i))
            .collect();
    }

    fn load_resolved(&mut self) -> Result<()> {
        let session = self.session.clone().ok_or(StorageError::Detached)?;
        self.sort();
        let mut resolved = BTreeMap::new();
        for record in &self.records {
            let entry = record.resolve(session.as_ref())?;
            let mut paths = record.paths().to_vec();
            super::record::sort_by_seed(&mut paths);
            resolved.insert(entry, paths);
        }
        self.resolved = resolved;
        self.resolved_loaded = true;
        debug!("resolved {} entry point(s)", self.resolved.len());
        Ok(())
    }
}

/// Thread-safe store of the paths reconstructed for each entry point
///
/// Holds an output form keyed by signatures and, once a session is attached, a lazily
/// built resolved form keyed by live entry points.
pub struct PathStore {
    lock: StoreLock<PathsData>,
    /// Disabled stores drop every addition
    disabled: bool,
}

impl std::fmt::Debug for PathStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathStore")
            .field("len", &self.len())
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl Default for PathStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PathStore {
    pub fn new() -> Self {
        Self {
            lock: StoreLock::new(PathsData::fresh()),
            disabled: false,
        }
    }

    /// A store for disabled phases: additions are ignored and all views are empty
    pub fn empty() -> Self {
        Self {
            disabled: true,
            ..Self::new()
        }
    }

    pub fn with_session(session: Arc<dyn AnalysisSession>) -> Self {
        let store = Self::new();
        store.lock.write().session = Some(session);
        store
    }

    pub fn is_empty_store(&self) -> bool {
        self.disabled
    }

    // ===== Mutation =====

    /// Insert or overwrite the paths of one entry point
    pub fn add(&self, entry: EntryPoint, paths: Vec<PathRecord>) {
        if self.disabled {
            return;
        }
        self.lock.write().insert(entry, paths);
    }

    pub fn add_all(&self, data: impl IntoIterator<Item = (EntryPoint, Vec<PathRecord>)>) {
        if self.disabled {
            return;
        }
        let mut guard = self.lock.write();
        for (entry, paths) in data {
            guard.insert(entry, paths);
        }
    }

    pub fn sort_data(&self) {
        self.lock.write().sort();
    }

    // ===== Views =====

    /// Sorted output records
    pub fn output_data(&self) -> MappedRwLockReadGuard<'_, [EntryPointRecord]> {
        let guard = self.lock.read_refreshed(|d| d.sorted, PathsData::sort);
        RwLockReadGuard::map(guard, |d| d.records.as_slice())
    }

    /// Resolved view, rebuilt on first use after a session was attached
    pub fn data(&self) -> Result<MappedRwLockReadGuard<'_, ResolvedPaths>> {
        let guard = self
            .lock
            .read_fresh(|d| d.resolved_loaded, PathsData::load_resolved)?;
        Ok(RwLockReadGuard::map(guard, |d| &d.resolved))
    }

    pub fn entry_points(&self) -> Result<Vec<EntryPoint>> {
        Ok(self.data()?.keys().cloned().collect())
    }

    pub fn paths_for(&self, entry: &EntryPoint) -> Result<Vec<PathRecord>> {
        Ok(self.data()?.get(entry).cloned().unwrap_or_default())
    }

    /// Number of entry points
    pub fn len(&self) -> usize {
        self.lock.read().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ===== Resolution =====

    /// Drop the resolved view so the store no longer refers to a live session
    pub fn clear_resolved_data(&self) {
        let mut guard = self.lock.write();
        guard.resolved.clear();
        guard.resolved_loaded = false;
        guard.session = None;
    }

    /// Attach `session` and rebuild the resolved view against it
    pub fn load_resolved_data(&self, session: Arc<dyn AnalysisSession>) -> Result<()> {
        let mut guard = self.lock.write();
        guard.session = Some(session);
        guard.resolved_loaded = false;
        guard.load_resolved()
    }

    // ===== Text =====

    pub fn to_text(&self, spacer: &str, form: Form) -> Result<String> {
        let mut out = format!("{spacer}# File Paths Database:\n");
        for record in self.output_data().iter() {
            out.push_str(&record.to_text(spacer, form)?);
        }
        Ok(out)
    }

    pub fn write_txt(&self, path: &Path, config: &StoreConfig) -> Result<()> {
        info!("writing file paths text to {}", path.display());
        write_file(path, &self.to_text(&config.spacer, Form::Full)?)
    }
}

impl PersistentStore for PathStore {
    const NAME: &'static str = "file paths store";

    fn read_json(path: &Path) -> Result<Self> {
        info!("reading file paths store from {}", path.display());
        let text = fs::read_to_string(path)?;
        let mut data: PathsData = serde_json::from_str(&text)?;
        data.rebuild_index();
        data.sort();
        Ok(Self {
            lock: StoreLock::new(data),
            disabled: false,
        })
    }

    fn write_json(&self, path: &Path, config: &StoreConfig) -> Result<()> {
        info!("writing file paths store to {}", path.display());
        let mut guard = self.lock.write();
        guard.sort();
        let json = config.to_json(&*guard)?;
        write_file(path, &json)
    }

    fn file_hashes(&self) -> FileHashList {
        self.lock.read().file_hashes.clone()
    }

    fn set_file_hashes(&self, hashes: FileHashList) {
        self.lock.write().file_hashes = hashes;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use tracepath_ids::{MemorySession, MethodRef, StmtSig};
    use tracepath_parts::{Leaf, PartGraph, Placeholder};

    fn method(s: &str) -> MethodSig {
        MethodSig::parse(s).unwrap()
    }

    fn path(text: &str) -> PathRecord {
        let mut g = PartGraph::new();
        let source = StmtSig::new(method("<A: void f()>"), 0, "x");
        let seed = g.leaf(Placeholder::Base { source });
        let c = g.leaf(Leaf::string(text));
        let root = g.append([c]).unwrap();
        PathRecord::new(&g, seed, root).unwrap()
    }

    fn entry(session: &mut MemorySession, sig: &str) -> EntryPoint {
        EntryPoint::new(session.add_method(method(sig), false), None)
    }

    #[test]
    fn test_add_overwrites_and_sorts() {
        let mut session = MemorySession::new();
        let g = entry(&mut session, "<A: void g()>");
        let f = entry(&mut session, "<A: void f()>");
        let store = PathStore::new();

        store.add(g.clone(), vec![path("x")]);
        store.add(f, vec![path("y")]);
        store.add(g, vec![path("z")]);

        let out = store.output_data();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].method, method("<A: void f()>"));
        assert_eq!(out[1].paths()[0].render(Form::Full).unwrap(), "{z}");
    }

    #[test]
    fn test_data_requires_session() {
        let store = PathStore::new();
        store.add(
            EntryPoint::new(MethodRef::new(method("<A: void f()>"), false), None),
            vec![],
        );
        assert!(matches!(store.data(), Err(StorageError::Detached)));
    }

    #[test]
    fn test_resolved_view_rebuilt_after_clear() {
        let mut session = MemorySession::new();
        let f = entry(&mut session, "<A: void f()>");
        let session = Arc::new(session);
        let store = PathStore::with_session(session.clone());
        store.add(f.clone(), vec![path("a")]);

        assert_eq!(store.entry_points().unwrap(), vec![f.clone()]);
        store.clear_resolved_data();
        assert!(matches!(store.data(), Err(StorageError::Detached)));

        store.load_resolved_data(session).unwrap();
        assert_eq!(store.paths_for(&f).unwrap(), vec![path("a")]);
    }

    #[test]
    fn test_unresolvable_entry_point_is_fatal() {
        let store = PathStore::new();
        store.add(
            EntryPoint::new(MethodRef::new(method("<A: void gone()>"), false), None),
            vec![],
        );
        let err = store
            .load_resolved_data(Arc::new(MemorySession::new()))
            .unwrap_err();
        assert!(matches!(err, StorageError::Unresolvable { kind: "method", .. }));
    }

    #[test]
    fn test_empty_store_ignores_additions() {
        let store = PathStore::empty();
        store.add(
            EntryPoint::new(MethodRef::new(method("<A: void f()>"), false), None),
            vec![path("a")],
        );
        assert!(store.is_empty());
        assert!(store.output_data().is_empty());
    }

    #[test]
    fn test_json_round_trip_keeps_hashes() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("paths.json");
        let config = StoreConfig::default();
        let mut session = MemorySession::new();
        let store = PathStore::new();
        store.add(entry(&mut session, "<A: void f()>"), vec![path("a"), path("b")]);
        store.set_file_hashes(FileHashList::default());

        store.write_json(&file, &config).unwrap();
        let loaded = PathStore::read_json(&file).unwrap();
        assert_eq!(&*loaded.output_data(), &*store.output_data());
    }

    #[test]
    fn test_text_header() {
        let store = PathStore::new();
        assert_eq!(store.to_text("", Form::Full).unwrap(), "# File Paths Database:\n");
    }
}
