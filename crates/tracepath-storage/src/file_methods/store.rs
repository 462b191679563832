//! The file-method store and its eight sorted views

use super::record::{ApiOrigin, FileMethod};
use crate::lock::StoreLock;
use crate::provider::{write_file, PersistentStore};
use crate::{FileHashList, Result, StorageError, StoreConfig};
use log::{debug, info};
use parking_lot::{MappedRwLockReadGuard, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracepath_ids::{AnalysisSession, MethodRef, MethodSig};

/// One partition of the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    All,
    Native,
    Open,
    Access,
    Remove,
    JavaApi,
    AndroidApi,
    AndroidSystem,
}

impl View {
    pub const ALL: [View; 8] = [
        View::All,
        View::Native,
        View::Open,
        View::Access,
        View::Remove,
        View::JavaApi,
        View::AndroidApi,
        View::AndroidSystem,
    ];

    pub fn includes(self, fm: &FileMethod) -> bool {
        match self {
            View::All => true,
            View::Native => fm.is_native(),
            View::Open => fm.opens(),
            View::Access => fm.accesses(),
            View::Remove => fm.removes(),
            View::JavaApi => fm.api() == ApiOrigin::JavaApi,
            View::AndroidApi => fm.api() == ApiOrigin::AndroidApi,
            View::AndroidSystem => fm.api() == ApiOrigin::AndroidSystem,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            View::All => "all",
            View::Native => "native",
            View::Open => "open",
            View::Access => "access",
            View::Remove => "remove",
            View::JavaApi => "java-api",
            View::AndroidApi => "android-api",
            View::AndroidSystem => "android-system",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Default)]
struct FileMethodsData {
    file_hashes: FileHashList,
    views: [Vec<FileMethod>; 8],
    /// Views touched since their last sort
    dirty: [bool; 8],
    /// Position of each record in the `All` view
    index: HashMap<MethodSig, usize>,
    session: Option<Arc<dyn AnalysisSession>>,
    resolved: Vec<MethodRef>,
    resolved_loaded: bool,
}

#[derive(Serialize)]
struct FileMethodsOut<'a> {
    file_hashes: &'a FileHashList,
    records: &'a [FileMethod],
}

#[derive(Deserialize)]
struct FileMethodsIn {
    #[serde(default)]
    file_hashes: FileHashList,
    records: Vec<FileMethod>,
}

impl FileMethodsData {
    /// Keep the first record for a signature; return the kept record
    fn insert(&mut self, fm: FileMethod) -> FileMethod {
        if let Some(&i) = self.index.get(fm.signature()) {
            return self.views[View::All.index()][i].clone();
        }
        for view in View::ALL {
            if view.includes(&fm) {
                self.views[view.index()].push(fm.clone());
                self.dirty[view.index()] = true;
            }
        }
        self.index
            .insert(fm.signature().clone(), self.views[View::All.index()].len() - 1);
        if self.resolved_loaded {
            self.resolved.push(fm.method().clone());
            self.resolved.sort();
        }
        fm
    }

    fn is_sorted(&self, view: View) -> bool {
        !self.dirty[view.index()]
    }

    fn sort_view(&mut self, view: View) {
        let i = view.index();
        if !self.dirty[i] {
            return;
        }
        self.views[i].sort();
        self.dirty[i] = false;
        if view == View::All {
            self.rebuild_index();
        }
        debug!("sorted {} file method view ({} record(s))", view.name(), self.views[i].len());
    }

    fn sort_all(&mut self) {
        for view in View::ALL {
            self.sort_view(view);
        }
    }

    fn rebuild_index(&mut self) {
        self.index = self.views[View::All.index()]
            .iter()
            .enumerate()
            .map(|(i, fm)| (fm.signature().clone(), i))
            .collect();
    }

    fn clear_views(&mut self) {
        self.views = Default::default();
        self.dirty = [false; 8];
        self.index.clear();
    }

    fn load_resolved(&mut self) -> Result<()> {
        let session = self.session.clone().ok_or(StorageError::Detached)?;
        let records = self.views[View::All.index()]
            .iter()
            .map(|fm| -> Result<FileMethod> {
                let method = session.require_method(fm.signature())?;
                let mut fm = fm.clone();
                fm.set_method(method);
                Ok(fm)
            })
            .collect::<Result<Vec<_>>>()?;
        // The native flag may have changed, so every partition is rebuilt.
        self.clear_views();
        for fm in records {
            self.insert(fm);
        }
        self.sort_all();
        self.resolved = self.views[View::All.index()]
            .iter()
            .map(|fm| fm.method().clone())
            .collect();
        self.resolved_loaded = true;
        debug!("resolved {} file method(s)", self.resolved.len());
        Ok(())
    }
}

/// Thread-safe set of file methods, deduplicated by signature
pub struct FileMethodStore {
    lock: StoreLock<FileMethodsData>,
    disabled: bool,
}

impl std::fmt::Debug for FileMethodStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileMethodStore")
            .field("len", &self.len())
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl Default for FileMethodStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FileMethodStore {
    pub fn new() -> Self {
        Self {
            lock: StoreLock::new(FileMethodsData::default()),
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

    pub(crate) fn from_records(
        records: impl IntoIterator<Item = FileMethod>,
        file_hashes: FileHashList,
    ) -> Self {
        let store = Self::new();
        {
            let mut guard = store.lock.write();
            for fm in records {
                guard.insert(fm);
            }
            guard.file_hashes = file_hashes;
            guard.sort_all();
        }
        store
    }

    pub fn is_empty_store(&self) -> bool {
        self.disabled
    }

    // ===== Mutation =====

    /// Add a record unless one with the same signature exists; returns the kept record
    pub fn add(&self, fm: FileMethod) -> FileMethod {
        if self.disabled {
            return fm;
        }
        self.lock.write().insert(fm)
    }

    /// Add every record; returns the kept records, sorted
    pub fn add_all(&self, records: impl IntoIterator<Item = FileMethod>) -> Vec<FileMethod> {
        if self.disabled {
            return Vec::new();
        }
        let mut guard = self.lock.write();
        let mut kept: Vec<FileMethod> = records.into_iter().map(|fm| guard.insert(fm)).collect();
        kept.sort();
        kept.dedup();
        kept
    }

    pub fn sort_data(&self) {
        self.lock.write().sort_all();
    }

    // ===== Views =====

    /// Sorted records of one partition
    pub fn view(&self, view: View) -> MappedRwLockReadGuard<'_, [FileMethod]> {
        let guard = self
            .lock
            .read_refreshed(|d| d.is_sorted(view), |d| d.sort_view(view));
        RwLockReadGuard::map(guard, |d| d.views[view.index()].as_slice())
    }

    pub fn output_data(&self) -> Vec<FileMethod> {
        self.view(View::All).to_vec()
    }

    pub fn native_methods(&self) -> Vec<FileMethod> {
        self.view(View::Native).to_vec()
    }

    pub fn open_methods(&self) -> Vec<FileMethod> {
        self.view(View::Open).to_vec()
    }

    pub fn access_methods(&self) -> Vec<FileMethod> {
        self.view(View::Access).to_vec()
    }

    pub fn remove_methods(&self) -> Vec<FileMethod> {
        self.view(View::Remove).to_vec()
    }

    pub fn java_api_methods(&self) -> Vec<FileMethod> {
        self.view(View::JavaApi).to_vec()
    }

    pub fn android_api_methods(&self) -> Vec<FileMethod> {
        self.view(View::AndroidApi).to_vec()
    }

    pub fn android_system_methods(&self) -> Vec<FileMethod> {
        self.view(View::AndroidSystem).to_vec()
    }

    pub fn contains(&self, sig: &MethodSig) -> bool {
        self.lock.read().index.contains_key(sig)
    }

    pub fn get(&self, sig: &MethodSig) -> Option<FileMethod> {
        let guard = self.lock.read();
        let i = *guard.index.get(sig)?;
        guard.views[View::All.index()].get(i).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock.read().views[View::All.index()].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Resolved methods in output order
    pub fn data(&self) -> Result<MappedRwLockReadGuard<'_, [MethodRef]>> {
        let guard = self
            .lock
            .read_fresh(|d| d.resolved_loaded, FileMethodsData::load_resolved)?;
        Ok(RwLockReadGuard::map(guard, |d| d.resolved.as_slice()))
    }

    // ===== Resolution =====

    pub fn clear_resolved_data(&self) {
        let mut guard = self.lock.write();
        guard.resolved.clear();
        guard.resolved_loaded = false;
        guard.session = None;
    }

    pub fn load_resolved_data(&self, session: Arc<dyn AnalysisSession>) -> Result<()> {
        let mut guard = self.lock.write();
        guard.session = Some(session);
        guard.resolved_loaded = false;
        guard.load_resolved()
    }

    // ===== Text =====

    pub fn to_text(&self, spacer: &str) -> String {
        let mut out = format!("{spacer}# File Methods Database:\n");
        for fm in self.view(View::All).iter() {
            out.push_str(&fm.to_text(spacer));
            out.push('\n');
        }
        out
    }
}

impl PersistentStore for FileMethodStore {
    const NAME: &'static str = "file methods store";

    fn read_json(path: &Path) -> Result<Self> {
        info!("reading file methods store from {}", path.display());
        let text = fs::read_to_string(path)?;
        let repr: FileMethodsIn = serde_json::from_str(&text)?;
        Ok(Self::from_records(repr.records, repr.file_hashes))
    }

    fn write_json(&self, path: &Path, config: &StoreConfig) -> Result<()> {
        info!("writing file methods store to {}", path.display());
        let mut guard = self.lock.write();
        guard.sort_all();
        let out = FileMethodsOut {
            file_hashes: &guard.file_hashes,
            records: &guard.views[View::All.index()],
        };
        write_file(path, &config.to_json(&out)?)
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
    use crate::file_methods::Actions;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use tracepath_ids::MemorySession;

    fn sig(s: &str) -> MethodSig {
        MethodSig::parse(s).unwrap()
    }

    fn fm(s: &str, actions: Actions, api: ApiOrigin) -> FileMethod {
        FileMethod::new(MethodRef::new(sig(s), false), actions, api)
    }

    fn names(records: &[FileMethod]) -> Vec<&str> {
        records.iter().map(|r| r.signature().name()).collect()
    }

    #[test]
    fn test_views_partition_records() {
        let store = FileMethodStore::new();
        store.add(fm("<A: void g()>", Actions::remove(), ApiOrigin::AndroidApi));
        store.add(fm("<A: void f()>", Actions::open(), ApiOrigin::JavaApi));
        store.add(FileMethod::new(
            MethodRef::new(sig("<A: void n()>"), true),
            Actions::new(true, true, false).unwrap(),
            ApiOrigin::AndroidSystem,
        ));

        assert_eq!(names(&store.output_data()), vec!["f", "g", "n"]);
        assert_eq!(names(&store.open_methods()), vec!["f", "n"]);
        assert_eq!(names(&store.access_methods()), vec!["n"]);
        assert_eq!(names(&store.remove_methods()), vec!["g"]);
        assert_eq!(names(&store.native_methods()), vec!["n"]);
        assert_eq!(names(&store.java_api_methods()), vec!["f"]);
        assert_eq!(names(&store.android_api_methods()), vec!["g"]);
        assert_eq!(names(&store.android_system_methods()), vec!["n"]);
    }

    #[test]
    fn test_first_record_wins() {
        let store = FileMethodStore::new();
        let mut first = fm("<A: void f()>", Actions::open(), ApiOrigin::JavaApi);
        first.set_sinks([sig("<A: void g()>")]);
        store.add(first.clone());
        let kept = store.add(fm("<A: void f()>", Actions::remove(), ApiOrigin::AndroidApi));

        assert_eq!(kept, first);
        assert_eq!(store.len(), 1);
        assert!(store.remove_methods().is_empty());
        assert_eq!(store.get(&sig("<A: void f()>")), Some(first));
    }

    #[test]
    fn test_only_touched_views_resort() {
        let store = FileMethodStore::new();
        store.add(fm("<A: void f()>", Actions::open(), ApiOrigin::JavaApi));
        store.sort_data();
        store.add(fm("<A: void a()>", Actions::remove(), ApiOrigin::JavaApi));

        let guard = store.lock.read();
        assert!(guard.is_sorted(View::Open));
        assert!(!guard.is_sorted(View::Remove));
        assert!(!guard.is_sorted(View::All));
    }

    #[test]
    fn test_empty_store_ignores_additions() {
        let store = FileMethodStore::empty();
        store.add(fm("<A: void f()>", Actions::open(), ApiOrigin::JavaApi));
        assert!(store.output_data().is_empty());
        assert!(!store.contains(&sig("<A: void f()>")));
    }

    #[test]
    fn test_resolve_refreshes_native_flag() {
        let mut session = MemorySession::new();
        session.add_method(sig("<A: void f()>"), true);
        let store = FileMethodStore::new();
        store.add(fm("<A: void f()>", Actions::open(), ApiOrigin::JavaApi));
        assert!(store.native_methods().is_empty());

        store.load_resolved_data(Arc::new(session)).unwrap();
        assert_eq!(names(&store.native_methods()), vec!["f"]);
        assert!(store.data().unwrap()[0].native);

        store.clear_resolved_data();
        assert!(matches!(store.data(), Err(StorageError::Detached)));
    }

    #[test]
    fn test_failed_resolution_keeps_records() {
        let mut session = MemorySession::new();
        session.add_method(sig("<A: void f()>"), false);
        let store = FileMethodStore::new();
        store.add(fm("<A: void f()>", Actions::open(), ApiOrigin::JavaApi));
        store.add(fm("<A: void g()>", Actions::open(), ApiOrigin::JavaApi));

        let err = store.load_resolved_data(Arc::new(session)).unwrap_err();
        assert!(matches!(err, StorageError::Unresolvable { kind: "method", .. }));
        assert_eq!(store.len(), 2);
        assert_eq!(names(&store.output_data()), vec!["f", "g"]);
        assert_eq!(names(&store.open_methods()), vec!["f", "g"]);
        assert!(store.contains(&sig("<A: void f()>")));
        assert!(store.get(&sig("<A: void g()>")).is_some());
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("fm.json");
        let store = FileMethodStore::new();
        let mut f = fm("<A: void f()>", Actions::open(), ApiOrigin::JavaApi);
        f.set_sinks([sig("<A: void g()>")]);
        store.add_all([f, fm("<A: void g()>", Actions::access(), ApiOrigin::AndroidSystem)]);

        store.write_json(&file, &StoreConfig::default()).unwrap();
        let loaded = FileMethodStore::read_json(&file).unwrap();
        assert_eq!(loaded.output_data(), store.output_data());
        assert_eq!(loaded.to_text(""), store.to_text(""));
    }
}
