//! The message-handler store: a sorted set of handler methods

use crate::lock::StoreLock;
use crate::provider::{write_file, PersistentStore};
use crate::{FileHashList, Result, StorageError, StoreConfig};
use log::{debug, info};
use parking_lot::{MappedRwLockReadGuard, RwLockReadGuard};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracepath_ids::{AnalysisSession, MethodRef, MethodSig};

#[derive(Default, Serialize, Deserialize)]
struct HandlersData {
    file_hashes: FileHashList,
    methods: Vec<MethodRef>,

    #[serde(skip)]
    known: HashSet<MethodSig>,
    #[serde(skip)]
    sorted: bool,
    #[serde(skip)]
    session: Option<Arc<dyn AnalysisSession>>,
    #[serde(skip)]
    resolved: Vec<MethodRef>,
    #[serde(skip)]
    resolved_loaded: bool,
}

impl HandlersData {
    fn insert(&mut self, method: MethodRef) {
        if self.known.insert(method.sig.clone()) {
            if self.resolved_loaded {
                self.resolved.push(method.clone());
                self.resolved.sort();
            }
            self.methods.push(method);
            self.sorted = false;
        }
    }

    fn sort(&mut self) {
        if !self.sorted {
            self.methods.sort();
            self.sorted = true;
            debug!("sorted {} message handler(s)", self.methods.len());
        }
    }

    fn load_resolved(&mut self) -> Result<()> {
        let session = self.session.clone().ok_or(StorageError::Detached)?;
        self.sort();
        let resolved = self
            .methods
            .iter()
            .map(|m| session.require_method(&m.sig))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        self.resolved = resolved;
        self.resolved_loaded = true;
        Ok(())
    }
}

/// Thread-safe, deduplicated set of message handler methods
pub struct MessageHandlerStore {
    lock: StoreLock<HandlersData>,
    disabled: bool,
}

impl std::fmt::Debug for MessageHandlerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MessageHandlerStore")
            .field("len", &self.len())
            .field("disabled", &self.disabled)
            .finish_non_exhaustive()
    }
}

impl Default for MessageHandlerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageHandlerStore {
    pub fn new() -> Self {
        Self {
            lock: StoreLock::new(HandlersData {
                sorted: true,
                ..HandlersData::default()
            }),
            disabled: false,
        }
    }

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

    pub fn add(&self, method: MethodRef) {
        if !self.disabled {
            self.lock.write().insert(method);
        }
    }

    pub fn add_all(&self, methods: impl IntoIterator<Item = MethodRef>) {
        if self.disabled {
            return;
        }
        let mut guard = self.lock.write();
        for method in methods {
            guard.insert(method);
        }
    }

    pub fn sort_data(&self) {
        self.lock.write().sort();
    }

    /// Sorted handler methods
    pub fn methods(&self) -> MappedRwLockReadGuard<'_, [MethodRef]> {
        let guard = self.lock.read_refreshed(|d| d.sorted, HandlersData::sort);
        RwLockReadGuard::map(guard, |d| d.methods.as_slice())
    }

    /// Sorted handler signatures
    pub fn output_data(&self) -> Vec<MethodSig> {
        self.methods().iter().map(|m| m.sig.clone()).collect()
    }

    pub fn contains(&self, sig: &MethodSig) -> bool {
        self.lock.read().known.contains(sig)
    }

    pub fn len(&self) -> usize {
        self.lock.read().methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Handlers resolved against the attached session
    pub fn data(&self) -> Result<MappedRwLockReadGuard<'_, [MethodRef]>> {
        let guard = self
            .lock
            .read_fresh(|d| d.resolved_loaded, HandlersData::load_resolved)?;
        Ok(RwLockReadGuard::map(guard, |d| d.resolved.as_slice()))
    }

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

    pub fn to_text(&self, spacer: &str) -> String {
        let mut out = format!("{spacer}Message Handler Database:\n");
        for method in self.methods().iter() {
            out.push_str(&format!("{spacer}  {}\n", method.sig));
        }
        out
    }
}

impl PersistentStore for MessageHandlerStore {
    const NAME: &'static str = "message handler store";

    fn read_json(path: &Path) -> Result<Self> {
        info!("reading message handler store from {}", path.display());
        let text = fs::read_to_string(path)?;
        let mut data: HandlersData = serde_json::from_str(&text)?;
        let methods = std::mem::take(&mut data.methods);
        data.sorted = true;
        for method in methods {
            data.insert(method);
        }
        data.sort();
        Ok(Self {
            lock: StoreLock::new(data),
            disabled: false,
        })
    }

    fn write_json(&self, path: &Path, config: &StoreConfig) -> Result<()> {
        info!("writing message handler store to {}", path.display());
        let mut guard = self.lock.write();
        guard.sort();
        write_file(path, &config.to_json(&*guard)?)
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
    use crate::provider::load_or_compute;
    use crate::FileHash;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use tempfile::tempdir;
    use tracepath_ids::MemorySession;

    fn method(s: &str) -> MethodRef {
        MethodRef::new(MethodSig::parse(s).unwrap(), false)
    }

    #[test]
    fn test_dedup_and_sort() {
        let store = MessageHandlerStore::new();
        store.add_all([
            method("<B: void handle(int)>"),
            method("<A: void handle(int)>"),
            method("<B: void handle(int)>"),
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(
            store.to_text(""),
            "Message Handler Database:\n  <A: void handle(int)>\n  <B: void handle(int)>\n"
        );
        assert!(store.contains(&method("<A: void handle(int)>").sig));
    }

    #[test]
    fn test_resolution_cycle() {
        let mut session = MemorySession::new();
        let a = session.add_method(MethodSig::parse("<A: void handle(int)>").unwrap(), false);
        let session: Arc<dyn AnalysisSession> = Arc::new(session);

        let store = MessageHandlerStore::with_session(session.clone());
        store.add(a.clone());
        assert_eq!(&*store.data().unwrap(), &[a.clone()]);

        store.clear_resolved_data();
        assert!(matches!(store.data(), Err(StorageError::Detached)));
        store.load_resolved_data(session).unwrap();
        assert_eq!(&*store.data().unwrap(), &[a]);
    }

    #[test]
    fn test_empty_store() {
        let store = MessageHandlerStore::empty();
        store.add(method("<A: void handle(int)>"));
        assert!(store.is_empty());
        assert!(store.is_empty_store());
    }

    #[test]
    fn test_load_or_compute_reuses_current_store() {
        let dir = tempdir().unwrap();
        let dep = dir.path().join("dep.txt");
        fs::write(&dep, "v1").unwrap();
        let out = dir.path().join("out").join("handlers.json");
        let config = StoreConfig::default();
        let computed = Cell::new(0);
        let compute = || {
            computed.set(computed.get() + 1);
            let store = MessageHandlerStore::new();
            store.add(method("<A: void handle(int)>"));
            Ok(store)
        };

        let first: MessageHandlerStore = load_or_compute(&out, &[&dep], &config, compute).unwrap();
        assert_eq!(first.file_hashes(), FileHashList::new(vec![FileHash::compute(&dep).unwrap()]));
        let again: MessageHandlerStore = load_or_compute(&out, &[&dep], &config, compute).unwrap();
        assert_eq!(computed.get(), 1);
        assert_eq!(again.output_data(), first.output_data());

        fs::write(&dep, "v2").unwrap();
        let _: MessageHandlerStore = load_or_compute(&out, &[&dep], &config, compute).unwrap();
        assert_eq!(computed.get(), 2);
    }

    #[test]
    fn test_load_or_compute_recovers_from_corrupt_file() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("handlers.json");
        fs::write(&out, "{not json").unwrap();
        let store: MessageHandlerStore =
            load_or_compute(&out, &[] as &[&Path], &StoreConfig::default(), || {
                Ok(MessageHandlerStore::new())
            })
            .unwrap();
        assert!(store.is_empty());
        assert!(MessageHandlerStore::read_json(&out).is_ok());
    }
}
