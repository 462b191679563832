//! Placeholder (seed) leaves
//!
//! A placeholder marks where the reconstruction of a path started: an argument, the
//! return value, the base object or the written field of some statement.

use crate::render::{Form, Render, SEP};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracepath_ids::{MethodSig, StmtSig};

const PH_IND: &str = "PH";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Placeholder {
    /// Argument `index` of the invoke in `source`
    Argument { source: StmtSig, index: u32 },
    /// Value returned by `target` when invoked from `source`
    Return { source: StmtSig, target: MethodSig },
    /// Right-hand side of the field assignment in `source`
    Field { source: StmtSig },
    /// Base object of the instance invoke in `source`
    Base { source: StmtSig },
}

impl Placeholder {
    pub fn source(&self) -> &StmtSig {
        match self {
            Placeholder::Argument { source, .. }
            | Placeholder::Return { source, .. }
            | Placeholder::Field { source }
            | Placeholder::Base { source } => source,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Placeholder::Argument { .. } => "ARGUMENTVALUE",
            Placeholder::Return { .. } => "RETURNVALUE",
            Placeholder::Field { .. } => "FIELDVALUE",
            Placeholder::Base { .. } => "BASEVALUE",
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Placeholder::Argument { .. } => "PHArgumentValue",
            Placeholder::Return { .. } => "PHReturnValue",
            Placeholder::Field { .. } => "PHFieldValue",
            Placeholder::Base { .. } => "PHBaseValue",
        }
    }

    /// Human readable name of the analysis that starts from this placeholder
    pub fn analysis_name(&self) -> &'static str {
        match self {
            Placeholder::Argument { .. } => "Argument Value Analysis",
            Placeholder::Return { .. } => "Return Value Analysis",
            Placeholder::Field { .. } => "Field Value Analysis",
            Placeholder::Base { .. } => "Base Value Analysis",
        }
    }

    /// Multi-line description used in analysis logs
    pub fn to_log_string(&self, spacer: &str) -> String {
        let source = self.source();
        let mut out = String::new();
        out.push_str(&format!("{spacer}Invoke Source: {}\n", source.method_sig()));
        match self {
            Placeholder::Argument { index, .. } => {
                out.push_str(&format!("{spacer}Arg. Index: {index}\n"));
            }
            Placeholder::Return { target, .. } => {
                out.push_str(&format!("{spacer}Target Method: {target}\n"));
            }
            _ => {}
        }
        out.push_str(&format!("{spacer}Invoke Stmt: {}\n", source.signature()));
        out
    }

    /// Append the `Start ...` lines describing where a search began
    pub fn append_start_data(&self, out: &mut String, spacer: &str) {
        let source = self.source();
        out.push_str(&format!("{spacer}Start Source: {}\n", source.method_sig()));
        match self {
            Placeholder::Argument { index, .. } => {
                out.push_str(&format!("{spacer}Start Arg. Index: {index}\n"));
            }
            Placeholder::Return { target, .. } => {
                out.push_str(&format!("{spacer}Start Target: {target}\n"));
            }
            _ => {}
        }
        out.push_str(&format!("{spacer}Start Stmt: {}\n", source.signature()));
    }
}

impl Render for Placeholder {
    fn render(&self, form: Form) -> String {
        match form {
            Form::Regex => ".*".to_string(),
            Form::SuperSimple => format!("{SEP}{PH_IND}{SEP}"),
            Form::Simple => format!("{SEP}{PH_IND}[{}]{SEP}", self.tag()),
            Form::Full => {
                let source = self.source();
                let extra = match self {
                    Placeholder::Argument { index, .. } => format!(", INDEX={index}"),
                    Placeholder::Return { target, .. } => format!(", TARGET={target}"),
                    _ => String::new(),
                };
                format!(
                    "{SEP}{PH_IND}[TYPE={}, SOURCE={}{extra}, STMT={}]{SEP}",
                    self.tag(),
                    source.method_sig(),
                    source.signature()
                )
            }
        }
    }
}

impl Ord for Placeholder {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (
                Placeholder::Argument { source: a, index: ia },
                Placeholder::Argument { source: b, index: ib },
            ) => a.cmp(b).then(ia.cmp(ib)),
            (
                Placeholder::Return { source: a, target: ta },
                Placeholder::Return { source: b, target: tb },
            ) => a.cmp(b).then_with(|| ta.cmp(tb)),
            (Placeholder::Field { source: a }, Placeholder::Field { source: b })
            | (Placeholder::Base { source: a }, Placeholder::Base { source: b }) => a.cmp(b),
            _ => self.type_name().cmp(other.type_name()),
        }
    }
}

impl PartialOrd for Placeholder {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
