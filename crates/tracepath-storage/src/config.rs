//! Store configuration
//!
//! Loaded once from TOML and handed to whatever writes or reads the stores.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Which persisted file a path is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Paths,
    FileMethods,
    FileMethodsText,
    Handlers,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Directory all store files live in
    pub output_dir: PathBuf,
    pub paths_file: String,
    pub file_methods_file: String,
    pub file_methods_txt: String,
    pub handlers_file: String,
    /// Indentation unit of text renderings
    pub spacer: String,
    /// Pretty-print JSON output
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            paths_file: "file_paths_db.json".to_string(),
            file_methods_file: "file_methods_db.json".to_string(),
            file_methods_txt: "file_methods_db.txt".to_string(),
            handlers_file: "message_handlers_db.json".to_string(),
            spacer: "  ".to_string(),
            pretty: true,
        }
    }
}

impl StoreConfig {
    /// Read a TOML config; missing keys take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(toml::from_str(&text)?)
    }

    pub fn path_for(&self, kind: StoreKind) -> PathBuf {
        let name = match kind {
            StoreKind::Paths => &self.paths_file,
            StoreKind::FileMethods => &self.file_methods_file,
            StoreKind::FileMethodsText => &self.file_methods_txt,
            StoreKind::Handlers => &self.handlers_file,
        };
        self.output_dir.join(name)
    }

    pub(crate) fn to_json<T: Serialize>(&self, value: &T) -> Result<String> {
        Ok(if self.pretty {
            serde_json::to_string_pretty(value)?
        } else {
            serde_json::to_string(value)?
        })
    }
}
