//! Resolved handles and the analysis-session boundary

use crate::{ClassSig, MethodSig, Result, SignatureError, StmtSig};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A method resolved against a live session
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MethodRef {
    pub sig: MethodSig,
    /// Whether the method has no bytecode body
    pub native: bool,
}

impl MethodRef {
    pub fn new(sig: MethodSig, native: bool) -> Self {
        Self { sig, native }
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sig)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClassRef {
    pub sig: ClassSig,
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sig)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StmtRef {
    pub sig: StmtSig,
}

/// An entry point of the analysed program
///
/// Ordered by stub first (absent stubs sort before present ones), then by method.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntryPoint {
    pub stub: Option<ClassRef>,
    pub method: MethodRef,
}

impl EntryPoint {
    pub fn new(method: MethodRef, stub: Option<ClassRef>) -> Self {
        Self { stub, method }
    }
}

impl fmt::Display for EntryPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.stub {
            Some(stub) => write!(f, "{{{} : {}}}", stub, self.method),
            None => write!(f, "{{null : {}}}", self.method),
        }
    }
}

/// Re-resolution of persisted signatures against a live analysis engine
///
/// Implementations answer `None` when the engine no longer knows the element.
pub trait AnalysisSession: Send + Sync {
    fn resolve_method(&self, sig: &MethodSig) -> Option<MethodRef>;

    fn resolve_class(&self, sig: &ClassSig) -> Option<ClassRef>;

    fn resolve_stmt(&self, sig: &StmtSig) -> Option<StmtRef>;

    /// Resolve a method or fail with [`SignatureError::Unresolvable`]
    fn require_method(&self, sig: &MethodSig) -> Result<MethodRef> {
        self.resolve_method(sig).ok_or_else(|| SignatureError::Unresolvable {
            kind: "method",
            signature: sig.to_string(),
        })
    }

    fn require_class(&self, sig: &ClassSig) -> Result<ClassRef> {
        self.resolve_class(sig).ok_or_else(|| SignatureError::Unresolvable {
            kind: "class",
            signature: sig.to_string(),
        })
    }
}

/// Session backed by explicitly registered program elements
#[derive(Debug, Default, Clone)]
pub struct MemorySession {
    methods: HashMap<MethodSig, bool>,
    classes: HashSet<ClassSig>,
    stmts: HashSet<StmtSig>,
}

impl MemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a method and its declaring class
    pub fn add_method(&mut self, sig: MethodSig, native: bool) -> MethodRef {
        self.classes.insert(sig.declaring_class());
        self.methods.insert(sig.clone(), native);
        MethodRef::new(sig, native)
    }

    pub fn add_class(&mut self, sig: ClassSig) -> ClassRef {
        self.classes.insert(sig.clone());
        ClassRef { sig }
    }

    pub fn add_stmt(&mut self, sig: StmtSig) -> StmtRef {
        self.stmts.insert(sig.clone());
        StmtRef { sig }
    }

    /// Forget a method so later resolution fails
    pub fn remove_method(&mut self, sig: &MethodSig) -> bool {
        self.methods.remove(sig).is_some()
    }

    pub fn len(&self) -> usize {
        self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

impl AnalysisSession for MemorySession {
    fn resolve_method(&self, sig: &MethodSig) -> Option<MethodRef> {
        self.methods
            .get(sig)
            .map(|native| MethodRef::new(sig.clone(), *native))
    }

    fn resolve_class(&self, sig: &ClassSig) -> Option<ClassRef> {
        self.classes.get(sig).map(|sig| ClassRef { sig: sig.clone() })
    }

    fn resolve_stmt(&self, sig: &StmtSig) -> Option<StmtRef> {
        self.stmts.get(sig).map(|sig| StmtRef { sig: sig.clone() })
    }
}

/// Session for tools running without an analysis engine
///
/// Every well-formed signature resolves. Methods listed in `native` resolve as native,
/// all others as ordinary methods with bodies.
#[derive(Debug, Default, Clone)]
pub struct OfflineSession {
    native: HashSet<MethodSig>,
}

impl OfflineSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_native(mut self, sig: MethodSig) -> Self {
        self.native.insert(sig);
        self
    }
}

impl AnalysisSession for OfflineSession {
    fn resolve_method(&self, sig: &MethodSig) -> Option<MethodRef> {
        Some(MethodRef::new(sig.clone(), self.native.contains(sig)))
    }

    fn resolve_class(&self, sig: &ClassSig) -> Option<ClassRef> {
        Some(ClassRef { sig: sig.clone() })
    }

    fn resolve_stmt(&self, sig: &StmtSig) -> Option<StmtRef> {
        Some(StmtRef { sig: sig.clone() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sig(s: &str) -> MethodSig {
        MethodSig::parse(s).unwrap()
    }

    #[test]
    fn test_memory_session_resolves_registered() {
        let mut session = MemorySession::new();
        let f = session.add_method(sig("<A: void f()>"), true);

        assert_eq!(session.resolve_method(&f.sig), Some(f.clone()));
        assert!(session.resolve_class(&ClassSig::parse("A").unwrap()).is_some());
        assert!(session.resolve_method(&sig("<A: void g()>")).is_none());
    }

    #[test]
    fn test_require_method_reports_signature() {
        let session = MemorySession::new();
        let err = session.require_method(&sig("<A: void f()>")).unwrap_err();
        assert_eq!(err.signature(), "<A: void f()>");
    }

    #[test]
    fn test_entry_point_ordering_stub_first() {
        let a = MethodRef::new(sig("<A: void a()>"), false);
        let b = MethodRef::new(sig("<A: void b()>"), false);
        let stub = ClassRef { sig: ClassSig::parse("S").unwrap() };

        let mut eps = vec![
            EntryPoint::new(a.clone(), Some(stub.clone())),
            EntryPoint::new(b.clone(), None),
            EntryPoint::new(a.clone(), None),
        ];
        eps.sort();

        assert_eq!(eps[0], EntryPoint::new(a.clone(), None));
        assert_eq!(eps[1], EntryPoint::new(b, None));
        assert_eq!(eps[2], EntryPoint::new(a, Some(stub)));
    }

    #[test]
    fn test_offline_session_native_list() {
        let native = sig("<A: void n()>");
        let session = OfflineSession::new().with_native(native.clone());
        assert!(session.resolve_method(&native).unwrap().native);
        assert!(!session.resolve_method(&sig("<A: void f()>")).unwrap().native);
    }
}
