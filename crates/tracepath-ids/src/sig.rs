//! Signature containers
//!
//! Each container wraps the canonical signature text of one program element. Ordering,
//! equality and hashing are defined purely over that text so that two independently
//! loaded stores sort identically.

use crate::{Result, SignatureError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Signature of a method, e.g. `<java.io.File: boolean delete()>`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MethodSig(String);

impl MethodSig {
    /// Parse and validate a method signature
    ///
    /// The accepted shape is `<declaring.Class: returnType name(paramTypes)>`.
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let malformed = || SignatureError::MalformedMethod(text.clone());

        let inner = text
            .strip_prefix('<')
            .and_then(|s| s.strip_suffix('>'))
            .ok_or_else(malformed)?;
        let (class, rest) = inner.split_once(": ").ok_or_else(malformed)?;
        let open = rest.find('(').ok_or_else(malformed)?;
        if class.is_empty() || !rest.ends_with(')') || rest[..open].split_whitespace().count() != 2 {
            return Err(malformed());
        }

        Ok(Self(text))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fully qualified name of the declaring class
    pub fn declaring_class(&self) -> ClassSig {
        let inner = &self.0[1..self.0.len() - 1];
        let class = inner.split_once(": ").map(|(c, _)| c).unwrap_or(inner);
        ClassSig(class.to_string())
    }

    /// Simple method name
    pub fn name(&self) -> &str {
        let (ret_and_name, _) = self.head_and_params();
        ret_and_name.split_whitespace().nth(1).unwrap_or("")
    }

    pub fn return_type(&self) -> &str {
        let (ret_and_name, _) = self.head_and_params();
        ret_and_name.split_whitespace().next().unwrap_or("")
    }

    /// Parameter types in declaration order
    pub fn param_types(&self) -> Vec<&str> {
        let (_, params) = self.head_and_params();
        params
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect()
    }

    fn head_and_params(&self) -> (&str, &str) {
        let inner = &self.0[1..self.0.len() - 1];
        let rest = inner.split_once(": ").map(|(_, r)| r).unwrap_or(inner);
        match rest.find('(') {
            Some(open) => (&rest[..open], rest[open + 1..].trim_end_matches(')')),
            None => (rest, ""),
        }
    }
}

impl TryFrom<String> for MethodSig {
    type Error = SignatureError;

    fn try_from(value: String) -> Result<Self> {
        MethodSig::parse(value)
    }
}

impl From<MethodSig> for String {
    fn from(sig: MethodSig) -> Self {
        sig.0
    }
}

impl fmt::Display for MethodSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully qualified class name, e.g. `android.app.ActivityThread`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassSig(String);

impl ClassSig {
    pub fn parse(text: impl Into<String>) -> Result<Self> {
        let text = text.into();
        let valid = !text.is_empty()
            && !text.contains(char::is_whitespace)
            && !text.contains(['<', '>', '(', ')', ':']);
        if valid {
            Ok(Self(text))
        } else {
            Err(SignatureError::MalformedClass(text))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Class name without its package
    pub fn simple_name(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }
}

impl TryFrom<String> for ClassSig {
    type Error = SignatureError;

    fn try_from(value: String) -> Result<Self> {
        ClassSig::parse(value)
    }
}

impl From<ClassSig> for String {
    fn from(sig: ClassSig) -> Self {
        sig.0
    }
}

impl fmt::Display for ClassSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A statement inside a method body
///
/// The index disambiguates textually identical statements within one body.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StmtSig {
    /// Method whose body contains the statement
    pub method: MethodSig,
    /// Position of the statement in the body
    pub index: u32,
    /// Statement text as printed by the analysis engine
    pub text: String,
}

impl StmtSig {
    pub fn new(method: MethodSig, index: u32, text: impl Into<String>) -> Self {
        Self {
            method,
            index,
            text: text.into(),
        }
    }

    /// Signature of the containing method
    pub fn method_sig(&self) -> &str {
        self.method.as_str()
    }

    /// Printable statement signature
    pub fn signature(&self) -> String {
        format!("{{{}}}#{}", self.text, self.index)
    }
}

impl fmt::Display for StmtSig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.signature(), self.method)
    }
}
