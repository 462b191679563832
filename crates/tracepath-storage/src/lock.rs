//! Reader-writer lock with an upgrade path for stale caches
//!
//! Readers that find a derived cache stale release their read lock, take the write
//! lock, rebuild, and downgrade. The downgrade takes the read lock back before the
//! write lock is released, so no writer can slip in between the rebuild and the read.

use crate::Result;
use log::debug;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Debug, Default)]
pub struct StoreLock<T> {
    inner: RwLock<T>,
}

impl<T> StoreLock<T> {
    pub fn new(value: T) -> Self {
        Self {
            inner: RwLock::new(value),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read()
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write()
    }

    /// Read access with `is_fresh` holding
    ///
    /// When the cache is stale the lock is upgraded, `rebuild` runs under the write lock
    /// unless another writer already refreshed the cache, and the guard is downgraded.
    pub fn read_fresh<F, R>(&self, is_fresh: F, rebuild: R) -> Result<RwLockReadGuard<'_, T>>
    where
        F: Fn(&T) -> bool,
        R: FnOnce(&mut T) -> Result<()>,
    {
        let guard = self.inner.read();
        if is_fresh(&guard) {
            return Ok(guard);
        }
        drop(guard);

        let mut guard = self.inner.write();
        if !is_fresh(&guard) {
            debug!("rebuilding stale store cache under write lock");
            rebuild(&mut guard)?;
        }
        Ok(RwLockWriteGuard::downgrade(guard))
    }

    /// [`StoreLock::read_fresh`] for rebuilds that cannot fail
    pub fn read_refreshed<F, R>(&self, is_fresh: F, rebuild: R) -> RwLockReadGuard<'_, T>
    where
        F: Fn(&T) -> bool,
        R: FnOnce(&mut T),
    {
        let guard = self.inner.read();
        if is_fresh(&guard) {
            return guard;
        }
        drop(guard);

        let mut guard = self.inner.write();
        if !is_fresh(&guard) {
            debug!("re-sorting store under write lock");
            rebuild(&mut guard);
        }
        RwLockWriteGuard::downgrade(guard)
    }

    pub fn into_inner(self) -> T {
        self.inner.into_inner()
    }
}
