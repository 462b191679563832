//! Plain-text format of the file-method store
//!
//! ```text
//! # File Methods Database:
//! open               JavaAPI       <A: void f()>
//!   <A: void g()>
//! remove             AndroidAPI    <A: void g()>
//! ```
//!
//! Header lines start with `#`. Intermediate files embed their dependency hash list as
//! `# `-prefixed JSON lines, terminated by a blank line.

use super::record::FileMethod;
use super::store::FileMethodStore;
use crate::provider::write_file;
use crate::{FileHashList, Result, StorageError, StoreConfig};
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tracepath_ids::{AnalysisSession, MethodSig};

impl FileMethodStore {
    /// Read a text dump, resolving every record against `session`
    pub fn read_txt(path: &Path, session: &dyn AnalysisSession) -> Result<Self> {
        info!("reading file methods text from {}", path.display());
        let text = fs::read_to_string(path)?;
        Self::parse_txt(&text, session)
    }

    /// Parse a text dump
    ///
    /// Every malformed line is reported in one [`StorageError::Parse`]. Sink lines may
    /// name records that appear later in the file.
    pub fn parse_txt(text: &str, session: &dyn AnalysisSession) -> Result<Self> {
        let mut records: Vec<FileMethod> = Vec::new();
        let mut positions: HashMap<MethodSig, usize> = HashMap::new();
        let mut sink_lines: Vec<(usize, MethodSig)> = Vec::new();
        let mut current: Option<usize> = None;
        let mut errors = String::new();
        let mut error_count = 0;

        for line in text.lines().map(str::trim) {
            if line.starts_with('#') || line.is_empty() {
                continue;
            }
            let outcome = if line.starts_with('<') {
                match current {
                    Some(i) => MethodSig::parse(line)
                        .map(|sig| sink_lines.push((i, sig)))
                        .map_err(StorageError::from),
                    None => Err(StorageError::invalid(format!(
                        "no file method precedes the sink '{line}'"
                    ))),
                }
            } else {
                FileMethod::parse_line(line, session).map(|fm| {
                    let i = *positions.entry(fm.signature().clone()).or_insert_with(|| {
                        records.push(fm);
                        records.len() - 1
                    });
                    current = Some(i);
                })
            };
            if let Err(err) = outcome {
                errors.push_str(&format!("Exception {error_count}: {}\n", err.to_string().trim()));
                error_count += 1;
            }
        }
        if error_count != 0 {
            return Err(StorageError::Parse(errors));
        }

        let mut sinks: HashMap<usize, HashSet<MethodSig>> = HashMap::new();
        for (owner, sig) in sink_lines {
            if positions.contains_key(&sig) {
                sinks.entry(owner).or_default().insert(sig);
            } else {
                warn!("dropping sink {sig}: it has no file method record");
            }
        }
        for (owner, set) in sinks {
            let mut sorted: Vec<MethodSig> = set.into_iter().collect();
            sorted.sort();
            records[owner].set_sinks(sorted);
        }

        Ok(Self::from_records(records, FileHashList::default()))
    }

    pub fn write_txt(&self, path: &Path, config: &StoreConfig) -> Result<()> {
        info!("writing file methods text to {}", path.display());
        write_file(path, &self.to_text(&config.spacer))
    }

    /// Dump a subset of records with a header naming the producer and its dependencies
    pub fn write_parts_txt(
        path: &Path,
        parts: &[FileMethod],
        name: Option<&str>,
        deps: Option<&FileHashList>,
    ) -> Result<()> {
        let mut out = match name {
            Some(name) => format!("# {name} File Methods Intermediate File\n"),
            None => "# File Methods Intermediate File\n".to_string(),
        };
        if let Some(deps) = deps {
            let json = serde_json::to_string_pretty(deps)?;
            for line in json.trim().lines() {
                out.push_str(&format!("# {line}\n"));
            }
        }
        out.push('\n');
        for fm in parts {
            out.push_str(&fm.to_text(""));
            out.push('\n');
        }
        info!("writing {} file method part(s) to {}", parts.len(), path.display());
        write_file(path, &out)
    }

    /// Read only the dependency hash list from the header of a text dump
    ///
    /// Returns `None` when the header embeds no hash list.
    pub fn read_file_hash_list_txt(path: &Path) -> Result<Option<FileHashList>> {
        let text = fs::read_to_string(path)?;
        parse_file_hash_header(&text)
            .map_err(|msg| StorageError::Parse(format!("{msg} in '{}'", path.display())))
    }
}

fn parse_file_hash_header(text: &str) -> std::result::Result<Option<FileHashList>, String> {
    let mut lines = text.lines().map(str::trim);
    // The first header line is a description.
    match lines.next() {
        Some(first) if first.starts_with('#') => {}
        _ => return Err("missing file methods header".to_string()),
    }

    let mut collected = String::new();
    for line in lines {
        if line.starts_with('#') {
            collected.push_str(line.get(2..).unwrap_or(""));
            collected.push('\n');
        } else if line.is_empty() {
            let json = collected.trim();
            if json.is_empty() {
                return Ok(None);
            }
            return serde_json::from_str(json)
                .map(Some)
                .map_err(|e| format!("malformed file hash list: {e}"));
        } else {
            return Err("file methods header is not terminated by a blank line".to_string());
        }
    }
    Err("file methods header is not terminated by a blank line".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_methods::{Actions, ApiOrigin};
    use crate::{FileHash, PersistentStore};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;
    use tracepath_ids::{MemorySession, MethodRef};

    fn sig(s: &str) -> MethodSig {
        MethodSig::parse(s).unwrap()
    }

    fn session() -> MemorySession {
        let mut session = MemorySession::new();
        session.add_method(sig("<A: void f()>"), false);
        session.add_method(sig("<A: void g()>"), false);
        session.add_method(sig("<A: void n()>"), true);
        session
    }

    #[test]
    fn test_forward_sinks_resolve() {
        let text = "# File Methods Database:\n\
                    open JavaAPI <A: void f()>\n\
                    \x20 <A: void g()>\n\
                    \x20 <A: void missing()>\n\
                    remove AndroidAPI <A: void g()>\n";
        let store = FileMethodStore::parse_txt(text, &session()).unwrap();
        let f = store.get(&sig("<A: void f()>")).unwrap();
        assert_eq!(f.sinks(), &[sig("<A: void g()>")]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_errors_accumulate() {
        let text = "  <A: void f()>\n\
                    write JavaAPI <A: void f()>\n\
                    open JavaAPI <A: void f()>\n\
                    open Kernel <A: void g()>\n";
        let Err(StorageError::Parse(report)) = FileMethodStore::parse_txt(text, &session()) else {
            panic!("expected a parse error");
        };
        assert_eq!(report.lines().count(), 3);
        assert!(report.starts_with("Exception 0: "));
        assert!(report.contains("Exception 2: "));
    }

    #[test]
    fn test_malformed_sinks_are_reported_together() {
        let text = "open JavaAPI <A: void f()>\n\
                    \x20 <broken\n\
                    \x20 <also broken\n\
                    remove AndroidAPI <A: void g()>\n";
        let Err(StorageError::Parse(report)) = FileMethodStore::parse_txt(text, &session()) else {
            panic!("expected a parse error");
        };
        assert_eq!(report.lines().count(), 2);
        assert!(report.starts_with("Exception 0: "));
        assert!(report.contains("Exception 1: "));
    }

    #[test]
    fn test_text_round_trip() {
        let store = FileMethodStore::new();
        let mut f = FileMethod::new(
            MethodRef::new(sig("<A: void f()>"), false),
            Actions::open(),
            ApiOrigin::JavaApi,
        );
        f.set_sinks([sig("<A: void g()>")]);
        store.add(f);
        store.add(FileMethod::new(
            MethodRef::new(sig("<A: void g()>"), false),
            Actions::new(false, true, true).unwrap(),
            ApiOrigin::AndroidApi,
        ));
        store.add(FileMethod::new(
            MethodRef::new(sig("<A: void n()>"), true),
            Actions::access(),
            ApiOrigin::AndroidSystem,
        ));

        let text = store.to_text("");
        let reread = FileMethodStore::parse_txt(&text, &session()).unwrap();
        assert_eq!(reread.to_text(""), text);
        assert_eq!(reread.output_data(), store.output_data());
    }

    #[test]
    fn test_parts_header_carries_hashes() {
        let dir = tempdir().unwrap();
        let dep = dir.path().join("dep.txt");
        fs::write(&dep, "dependency").unwrap();
        let hashes = FileHashList::new(vec![FileHash::compute(&dep).unwrap()]);
        let part = FileMethod::new(
            MethodRef::new(sig("<A: void f()>"), false),
            Actions::open(),
            ApiOrigin::JavaApi,
        );

        let out = dir.path().join("parts.txt");
        FileMethodStore::write_parts_txt(&out, &[part], Some("Java"), Some(&hashes)).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.starts_with("# Java File Methods Intermediate File\n# "));

        assert_eq!(FileMethodStore::read_file_hash_list_txt(&out).unwrap(), Some(hashes));
        let store = FileMethodStore::read_txt(&out, &session()).unwrap();
        assert!(store.contains(&sig("<A: void f()>")));
        assert!(store.file_hashes().is_empty());
    }

    #[test]
    fn test_header_without_hashes() {
        assert_eq!(parse_file_hash_header("# File Methods Intermediate File\n\nopen"), Ok(None));
        assert!(parse_file_hash_header("# x\nopen JavaAPI <A: void f()>\n").is_err());
    }
}
