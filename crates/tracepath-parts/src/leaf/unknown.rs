//! Leaves for situations the reconstruction did not handle

use crate::render::{Form, Render, SEP};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracepath_ids::StmtSig;

pub(crate) const UNKNOWN_IND: &str = "UNKNOWN";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unknown {
    /// A statement shape with no handling
    Stmt { source: Option<StmtSig> },
    /// A value with no handling, with a best-effort description
    Value {
        source: Option<StmtSig>,
        value: String,
    },
}

impl Unknown {
    pub fn source(&self) -> Option<&StmtSig> {
        match self {
            Unknown::Stmt { source } | Unknown::Value { source, .. } => source.as_ref(),
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            Unknown::Stmt { .. } => "STMT",
            Unknown::Value { .. } => "VALUE",
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Unknown::Stmt { .. } => "UnknownStmt",
            Unknown::Value { .. } => "UnknownValue",
        }
    }
}

impl Render for Unknown {
    fn render(&self, form: Form) -> String {
        match form {
            Form::Regex => ".*".to_string(),
            Form::SuperSimple => format!("{SEP}{UNKNOWN_IND}{SEP}"),
            Form::Simple => format!("{SEP}{UNKNOWN_IND}[{}]{SEP}", self.tag()),
            Form::Full => {
                let source = self.source();
                let method = source.map_or("null".to_string(), |s| s.method_sig().to_string());
                let stmt = source.map_or("null".to_string(), |s| s.signature());
                match self {
                    Unknown::Stmt { .. } => format!(
                        "{SEP}{UNKNOWN_IND}[TYPE={}, SOURCE={method}, STMT={stmt}]{SEP}",
                        self.tag()
                    ),
                    Unknown::Value { value, .. } => format!(
                        "{SEP}{UNKNOWN_IND}[TYPE={}, SOURCE={method}, VALUE={value}, STMT={stmt}]{SEP}",
                        self.tag()
                    ),
                }
            }
        }
    }
}

impl Ord for Unknown {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Unknown::Stmt { source: a }, Unknown::Stmt { source: b }) => a.cmp(b),
            (
                Unknown::Value { source: a, value: va },
                Unknown::Value { source: b, value: vb },
            ) => a.cmp(b).then_with(|| va.cmp(vb)),
            _ => self.type_name().cmp(other.type_name()),
        }
    }
}

impl PartialOrd for Unknown {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
