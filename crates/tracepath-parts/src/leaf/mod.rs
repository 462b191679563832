//! Leaf parts
//!
//! Leaves reference no other part and never change once built, so a graph may share one
//! leaf between many parents and cloning returns the leaf itself.

mod any;
mod constant;
mod placeholder;
mod unknown;

pub use any::{AnyKind, AnyLeaf};
pub use constant::Constant;
pub use placeholder::Placeholder;
pub use unknown::Unknown;

use crate::render::{Form, Render, SEP};
use any::ANY_IND;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Leaf {
    Constant(Constant),
    Any(AnyLeaf),
    /// Wildcard carrying only an opaque info id
    AnyInfo(String),
    /// Several leaves collapsed into one wildcard
    AnyCombo(Vec<Leaf>),
    Unknown(Unknown),
    Placeholder(Placeholder),
}

impl Leaf {
    pub fn string(value: impl Into<String>) -> Self {
        Leaf::Constant(Constant::string(value))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Leaf::Constant(c) => c.type_name(),
            Leaf::Any(a) => a.kind.type_name(),
            Leaf::AnyInfo(_) => "AnyInfo",
            Leaf::AnyCombo(_) => "AnyCombo",
            Leaf::Unknown(u) => u.type_name(),
            Leaf::Placeholder(p) => p.type_name(),
        }
    }

    /// Whether the leaf stands for an untracked value
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Leaf::Any(_) | Leaf::AnyInfo(_) | Leaf::AnyCombo(_))
    }

    pub fn as_placeholder(&self) -> Option<&Placeholder> {
        match self {
            Leaf::Placeholder(p) => Some(p),
            _ => None,
        }
    }
}

impl Render for Leaf {
    fn render(&self, form: Form) -> String {
        match self {
            Leaf::Constant(c) => c.render(form),
            Leaf::Any(a) => a.render(form),
            Leaf::AnyInfo(id) => match form {
                Form::Regex => ".*".to_string(),
                Form::SuperSimple => format!("{SEP}{ANY_IND}{SEP}"),
                Form::Simple | Form::Full => format!("{SEP}{ANY_IND}[{id}]{SEP}"),
            },
            Leaf::AnyCombo(contents) => match form {
                Form::Regex => ".*".to_string(),
                Form::SuperSimple => format!("{SEP}{ANY_IND}{SEP}"),
                Form::Simple => format!("{SEP}{ANY_IND}[COMBO]{SEP}"),
                Form::Full => {
                    let inner: Vec<String> = contents.iter().map(|l| l.render(Form::Full)).collect();
                    format!("{SEP}{ANY_IND}[TYPE=COMBO, CONTENTS=[{}]]{SEP}", inner.join(", "))
                }
            },
            Leaf::Unknown(u) => u.render(form),
            Leaf::Placeholder(p) => p.render(form),
        }
    }
}

impl Ord for Leaf {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Leaf::Constant(a), Leaf::Constant(b)) => a.cmp(b),
            (Leaf::Any(a), Leaf::Any(b)) => a.cmp(b),
            (Leaf::AnyInfo(a), Leaf::AnyInfo(b)) => a.cmp(b),
            (Leaf::AnyCombo(_), Leaf::AnyCombo(_)) => {
                self.render(Form::Full).cmp(&other.render(Form::Full))
            }
            (Leaf::Unknown(a), Leaf::Unknown(b)) => a.cmp(b),
            (Leaf::Placeholder(a), Leaf::Placeholder(b)) => a.cmp(b),
            _ => self.type_name().cmp(other.type_name()),
        }
    }
}

impl PartialOrd for Leaf {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<Constant> for Leaf {
    fn from(c: Constant) -> Self {
        Leaf::Constant(c)
    }
}

impl From<AnyLeaf> for Leaf {
    fn from(a: AnyLeaf) -> Self {
        Leaf::Any(a)
    }
}

impl From<Unknown> for Leaf {
    fn from(u: Unknown) -> Self {
        Leaf::Unknown(u)
    }
}

impl From<Placeholder> for Leaf {
    fn from(p: Placeholder) -> Self {
        Leaf::Placeholder(p)
    }
}
