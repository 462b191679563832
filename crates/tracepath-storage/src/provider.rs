//! Persistence boundary shared by all stores

use crate::{FileHashList, Result, StoreConfig};
use log::{info, warn};
use std::fs;
use std::path::Path;

/// A store that can be written to disk and read back without an analysis session
pub trait PersistentStore: Sized {
    /// Name used in log messages
    const NAME: &'static str;

    /// Read a store written by [`PersistentStore::write_json`]
    fn read_json(path: &Path) -> Result<Self>;

    /// Write the store as one JSON snapshot
    fn write_json(&self, path: &Path, config: &StoreConfig) -> Result<()>;

    /// Dependency hashes recorded with the store
    fn file_hashes(&self) -> FileHashList;

    fn set_file_hashes(&self, hashes: FileHashList);
}

/// Reuse the store at `path` if its dependencies are unchanged, otherwise rebuild it
///
/// A rebuilt store is stamped with the current dependency hashes and written to `path`.
pub fn load_or_compute<S, P, F>(
    path: &Path,
    deps: &[P],
    config: &StoreConfig,
    compute: F,
) -> Result<S>
where
    S: PersistentStore,
    P: AsRef<Path>,
    F: FnOnce() -> Result<S>,
{
    let current = FileHashList::compute(deps)?;
    if path.exists() {
        match S::read_json(path) {
            Ok(store) if store.file_hashes() == current => {
                info!("reusing {} from {}", S::NAME, path.display());
                return Ok(store);
            }
            Ok(_) => info!("{} at {} is stale, recomputing", S::NAME, path.display()),
            Err(e) => warn!("failed to read {} at {}: {e}", S::NAME, path.display()),
        }
    }

    let store = compute()?;
    store.set_file_hashes(current);
    store.write_json(path, config)?;
    Ok(store)
}

/// Write `text` to `path`, creating parent directories
pub(crate) fn write_file(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, text)?;
    Ok(())
}
