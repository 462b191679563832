//! File-method records
//!
//! A record classifies one method by the file actions it performs and where its API
//! comes from. Non-native records may name sinks: other file methods they lead to.

use crate::{Result, StorageError};
use log::warn;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use tracepath_ids::{AnalysisSession, MethodRef, MethodSig};

const OPEN: &str = "open";
const ACCESS: &str = "access";
const REMOVE: &str = "remove";

/// Width of the widest action list, `open:access:remove`
const ACTIONS_WIDTH: usize = 18;
/// Width of the widest origin token, `AndroidSystem`
const ORIGIN_WIDTH: usize = 13;

static LINE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^((?:open:?|access:?|remove:?)+)\s+(JavaAPI|AndroidAPI|AndroidSystem)\s+(<.+?)$")
        .unwrap_or_else(|err| panic!("invalid file method line pattern: {err}"))
});

// ===== Actions =====

/// Non-empty set of file actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Actions {
    open: bool,
    access: bool,
    remove: bool,
}

impl Actions {
    pub fn new(open: bool, access: bool, remove: bool) -> Result<Self> {
        if !(open || access || remove) {
            return Err(StorageError::invalid("a file method needs at least one action"));
        }
        Ok(Self { open, access, remove })
    }

    pub fn open() -> Self {
        Self { open: true, access: false, remove: false }
    }

    pub fn access() -> Self {
        Self { open: false, access: true, remove: false }
    }

    pub fn remove() -> Self {
        Self { open: false, access: false, remove: true }
    }

    pub fn opens(&self) -> bool {
        self.open
    }

    pub fn accesses(&self) -> bool {
        self.access
    }

    pub fn removes(&self) -> bool {
        self.remove
    }
}

impl FromStr for Actions {
    type Err = StorageError;

    /// Colon-separated action tokens in any order, e.g. `open:remove`
    fn from_str(s: &str) -> Result<Self> {
        let (mut open, mut access, mut remove) = (false, false, false);
        for token in s.split(':').filter(|t| !t.is_empty()) {
            match token {
                OPEN => open = true,
                ACCESS => access = true,
                REMOVE => remove = true,
                other => {
                    return Err(StorageError::invalid(format!("unknown file action '{other}'")))
                }
            }
        }
        Self::new(open, access, remove)
    }
}

impl fmt::Display for Actions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<&str> = [(self.open, OPEN), (self.access, ACCESS), (self.remove, REMOVE)]
            .into_iter()
            .filter_map(|(set, name)| set.then_some(name))
            .collect();
        f.write_str(&tokens.join(":"))
    }
}

impl TryFrom<String> for Actions {
    type Error = StorageError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Actions> for String {
    fn from(actions: Actions) -> Self {
        actions.to_string()
    }
}

impl Ord for Actions {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl PartialOrd for Actions {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ===== API origin =====

/// Where a file method's API comes from
///
/// Variants are declared in the lexical order of their tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ApiOrigin {
    #[serde(rename = "AndroidAPI")]
    AndroidApi,
    AndroidSystem,
    #[serde(rename = "JavaAPI")]
    JavaApi,
}

impl ApiOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiOrigin::AndroidApi => "AndroidAPI",
            ApiOrigin::AndroidSystem => "AndroidSystem",
            ApiOrigin::JavaApi => "JavaAPI",
        }
    }
}

impl FromStr for ApiOrigin {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "AndroidAPI" => Ok(ApiOrigin::AndroidApi),
            "AndroidSystem" => Ok(ApiOrigin::AndroidSystem),
            "JavaAPI" => Ok(ApiOrigin::JavaApi),
            other => Err(StorageError::invalid(format!("unknown API origin '{other}'"))),
        }
    }
}

impl fmt::Display for ApiOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ===== FileMethod =====

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileMethod {
    method: MethodRef,
    actions: Actions,
    api: ApiOrigin,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    sinks: Vec<MethodSig>,
}

impl FileMethod {
    pub fn new(method: MethodRef, actions: Actions, api: ApiOrigin) -> Self {
        Self {
            method,
            actions,
            api,
            sinks: Vec::new(),
        }
    }

    /// Parse one record line, `actions origin <signature>`, resolving the method
    pub fn parse_line(line: &str, session: &dyn AnalysisSession) -> Result<Self> {
        let caps = LINE_REGEX
            .captures(line)
            .ok_or_else(|| StorageError::invalid(format!("cannot parse file method from '{line}'")))?;
        let actions: Actions = caps[1].parse()?;
        let api: ApiOrigin = caps[2].parse()?;
        let sig = MethodSig::parse(&caps[3])?;
        let method = session.require_method(&sig)?;
        Ok(Self::new(method, actions, api))
    }

    pub fn method(&self) -> &MethodRef {
        &self.method
    }

    pub fn signature(&self) -> &MethodSig {
        &self.method.sig
    }

    pub fn actions(&self) -> Actions {
        self.actions
    }

    pub fn api(&self) -> ApiOrigin {
        self.api
    }

    pub fn sinks(&self) -> &[MethodSig] {
        &self.sinks
    }

    pub fn is_native(&self) -> bool {
        self.method.native
    }

    pub fn opens(&self) -> bool {
        self.actions.opens()
    }

    pub fn accesses(&self) -> bool {
        self.actions.accesses()
    }

    pub fn removes(&self) -> bool {
        self.actions.removes()
    }

    /// Replace the sink set; native methods cannot have sinks and keep none
    pub fn set_sinks(&mut self, sinks: impl IntoIterator<Item = MethodSig>) {
        if self.is_native() {
            warn!("ignoring sinks of native file method {}", self.method.sig);
            return;
        }
        self.sinks.clear();
        for sink in sinks {
            if !self.sinks.contains(&sink) {
                self.sinks.push(sink);
            }
        }
    }

    pub(crate) fn set_method(&mut self, method: MethodRef) {
        self.method = method;
    }

    /// `actions origin <signature>` with the first two columns padded
    pub fn to_string_no_sinks(&self, spacer: &str) -> String {
        format!(
            "{spacer}{:<aw$} {:<ow$} {}",
            self.actions.to_string(),
            self.api.as_str(),
            self.method.sig,
            aw = ACTIONS_WIDTH,
            ow = ORIGIN_WIDTH,
        )
    }

    /// Record line followed by one indented line per sink
    pub fn to_text(&self, spacer: &str) -> String {
        let mut out = self.to_string_no_sinks(spacer);
        for sink in &self.sinks {
            out.push('\n');
            out.push_str(spacer);
            out.push_str("  ");
            out.push_str(sink.as_str());
        }
        out
    }
}

impl fmt::Display for FileMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text(""))
    }
}

impl Ord for FileMethod {
    fn cmp(&self, other: &Self) -> Ordering {
        self.method
            .sig
            .cmp(&other.method.sig)
            .then_with(|| self.actions.cmp(&other.actions))
            .then_with(|| self.api.cmp(&other.api))
            .then_with(|| self.method.native.cmp(&other.method.native))
            .then_with(|| self.sinks.cmp(&other.sinks))
    }
}

impl PartialOrd for FileMethod {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
