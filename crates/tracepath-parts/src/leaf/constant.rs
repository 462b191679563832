//! Constant leaves

use crate::render::{Form, Render, SEP};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

const UNKNOWN_IND: &str = "UNKNOWN";

/// A literal value observed while reconstructing a path
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Constant {
    Str(String),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Null,
    /// A constant whose value could not be interpreted
    Unknown(String),
}

impl Constant {
    pub fn string(value: impl Into<String>) -> Self {
        Constant::Str(value.into())
    }

    /// Name used to order constants of different kinds
    pub fn type_name(&self) -> &'static str {
        match self {
            Constant::Str(_) => "StringConstant",
            Constant::Int(_) => "IntConstant",
            Constant::Long(_) => "LongConstant",
            Constant::Float(_) => "FloatConstant",
            Constant::Double(_) => "DoubleConstant",
            Constant::Null => "NullConstant",
            Constant::Unknown(_) => "UnknownConstant",
        }
    }

    /// Value as it appears in a rendered path
    pub fn value_text(&self) -> String {
        match self {
            Constant::Str(s) => s.clone(),
            Constant::Int(v) => v.to_string(),
            Constant::Long(v) => v.to_string(),
            Constant::Float(v) => float_text(f64::from(*v)),
            Constant::Double(v) => float_text(*v),
            Constant::Null => "null".to_string(),
            Constant::Unknown(s) => s.clone(),
        }
    }
}

/// Formats whole floats with a trailing `.0` so `1` and `1.0` stay distinguishable
fn float_text(v: f64) -> String {
    if v.is_nan() {
        "NaN".to_string()
    } else if v.is_infinite() {
        let text = if v > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if v.fract() == 0.0 && v.abs() < 1e7 {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

impl Render for Constant {
    fn render(&self, form: Form) -> String {
        match (self, form) {
            (Constant::Unknown(_), Form::Regex) => ".*".to_string(),
            (Constant::Unknown(_), Form::SuperSimple) => format!("{SEP}{UNKNOWN_IND}{SEP}"),
            (Constant::Unknown(_), Form::Simple) => format!("{SEP}{UNKNOWN_IND}[CONSTANT]{SEP}"),
            (Constant::Unknown(value), Form::Full) => {
                format!("{SEP}{UNKNOWN_IND}[TYPE=CONSTANT, CONSTANT={value}]{SEP}")
            }
            (_, Form::Regex) => regex_lite::escape(&self.value_text()),
            _ => self.value_text(),
        }
    }
}

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Constant::Str(a), Constant::Str(b)) => a == b,
            (Constant::Int(a), Constant::Int(b)) => a == b,
            (Constant::Long(a), Constant::Long(b)) => a == b,
            (Constant::Float(a), Constant::Float(b)) => a.to_bits() == b.to_bits(),
            (Constant::Double(a), Constant::Double(b)) => a.to_bits() == b.to_bits(),
            (Constant::Null, Constant::Null) => true,
            (Constant::Unknown(a), Constant::Unknown(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Constant {}

impl Hash for Constant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name().hash(state);
        match self {
            Constant::Str(s) | Constant::Unknown(s) => s.hash(state),
            Constant::Int(v) => v.hash(state),
            Constant::Long(v) => v.hash(state),
            Constant::Float(v) => v.to_bits().hash(state),
            Constant::Double(v) => v.to_bits().hash(state),
            Constant::Null => {}
        }
    }
}

impl Ord for Constant {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Constant::Str(a), Constant::Str(b)) => a.cmp(b),
            (Constant::Int(a), Constant::Int(b)) => a.cmp(b),
            (Constant::Long(a), Constant::Long(b)) => a.cmp(b),
            (Constant::Float(a), Constant::Float(b)) => a.total_cmp(b),
            (Constant::Double(a), Constant::Double(b)) => a.total_cmp(b),
            (Constant::Null, Constant::Null) => Ordering::Equal,
            (Constant::Unknown(a), Constant::Unknown(b)) => a.cmp(b),
            _ => self.type_name().cmp(other.type_name()),
        }
    }
}

impl PartialOrd for Constant {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
