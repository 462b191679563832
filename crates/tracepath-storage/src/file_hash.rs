//! Dependency file hashes used to decide whether a persisted store is stale

use crate::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// SHA-256 of one dependency file
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FileHash {
    pub path: PathBuf,
    /// Lower-case hex digest
    pub hash: String,
}

impl FileHash {
    /// Hash the current contents of `path`
    pub fn compute(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            hash: hex::encode(Sha256::digest(&bytes)),
        })
    }

    /// Whether the file still exists with the recorded contents
    pub fn is_current(&self) -> bool {
        FileHash::compute(&self.path).is_ok_and(|now| now.hash == self.hash)
    }
}

impl fmt::Display for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}", self.hash, self.path.display())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileHashList(Vec<FileHash>);

impl FileHashList {
    pub fn new(hashes: Vec<FileHash>) -> Self {
        Self(hashes)
    }

    /// Hash every file in `paths`, in order
    pub fn compute<P: AsRef<Path>>(paths: impl IntoIterator<Item = P>) -> Result<Self> {
        paths
            .into_iter()
            .map(FileHash::compute)
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    /// Whether every recorded file is unchanged
    pub fn is_current(&self) -> bool {
        self.0.iter().all(FileHash::is_current)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileHash> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FileHashList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for hash in &self.0 {
            writeln!(f, "{hash}")?;
        }
        Ok(())
    }
}
