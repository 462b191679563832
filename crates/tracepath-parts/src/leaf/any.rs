//! Wildcard leaves
//!
//! An "any" leaf stands for a value the reconstruction could not follow further. The
//! sub-kind records why, and the provenance records where.

use crate::render::{Form, Render, SEP};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracepath_ids::{MethodSig, StmtSig};

pub(crate) const ANY_IND: &str = "ANY";
const NUM_IND: &str = "NUM";

/// Reason a value could not be tracked
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnyKind {
    /// Element read out of an array
    Array,
    /// Read of a field with no known writes
    FieldRef,
    /// Return value of a method with no body; `target` is the invoked method
    MethodReturn { target: Option<MethodSig> },
    /// Return value of a method with no outgoing call edges
    MethodRef,
    /// Freshly constructed object
    NewInvoke,
    /// Argument of the entry point itself
    EntryPointArg {
        index: u32,
        /// Used when no source statement is available
        method_sig: Option<String>,
        stmt_sig: Option<String>,
    },
    ParentPath,
    ChildPath,
    /// Numeric value of the given primitive type
    Number { ty: String },
    ResourceOrAsset,
    CommandLineInput,
    VmRuntimeSetting,
    AccountId,
    UserId,
    Uid,
    ApkInfo,
}

impl AnyKind {
    /// Upper-case tag used inside renderings
    pub fn tag(&self) -> String {
        match self {
            AnyKind::Array => "ARRAY".to_string(),
            AnyKind::FieldRef => "FIELDREF".to_string(),
            AnyKind::MethodReturn { .. } => "METHODRETURN".to_string(),
            AnyKind::MethodRef => "METHODREF".to_string(),
            AnyKind::NewInvoke => "NEWINVOKE".to_string(),
            AnyKind::EntryPointArg { .. } => "EPARG".to_string(),
            AnyKind::ParentPath => "PARENTPATH".to_string(),
            AnyKind::ChildPath => "CHILDPATH".to_string(),
            AnyKind::Number { ty } => ty.to_uppercase(),
            AnyKind::ResourceOrAsset => "RESOURCEORASSET".to_string(),
            AnyKind::CommandLineInput => "COMMANDLINEINPUT".to_string(),
            AnyKind::VmRuntimeSetting => "VMRUNTIMESETTING".to_string(),
            AnyKind::AccountId => "ACCOUNTID".to_string(),
            AnyKind::UserId => "USERID".to_string(),
            AnyKind::Uid => "UID".to_string(),
            AnyKind::ApkInfo => "APKINFO".to_string(),
        }
    }

    /// Name used to order leaves of different kinds
    pub fn type_name(&self) -> &'static str {
        match self {
            AnyKind::Array => "AnyArray",
            AnyKind::FieldRef => "AnyFieldRef",
            AnyKind::MethodReturn { .. } => "AnyMethodReturn",
            AnyKind::MethodRef => "AnyMethodRef",
            AnyKind::NewInvoke => "AnyNewInvoke",
            AnyKind::EntryPointArg { .. } => "AnyEPArg",
            AnyKind::ParentPath => "AnyParentPath",
            AnyKind::ChildPath => "AnyChildPath",
            AnyKind::Number { .. } => "AnyNumber",
            AnyKind::ResourceOrAsset => "AnyResourceOrAsset",
            AnyKind::CommandLineInput => "AnyCommandLineInput",
            AnyKind::VmRuntimeSetting => "AnyVMRuntimeSetting",
            AnyKind::AccountId => "AnyAccountId",
            AnyKind::UserId => "AnyUserId",
            AnyKind::Uid => "AnyUID",
            AnyKind::ApkInfo => "AnyAPKInfo",
        }
    }

    fn is_numeric(&self) -> bool {
        matches!(
            self,
            AnyKind::Number { .. } | AnyKind::AccountId | AnyKind::UserId | AnyKind::Uid
        )
    }

    /// Kind-specific tie-break once kind and source are equal
    fn cmp_inner(&self, other: &Self) -> Ordering {
        match (self, other) {
            (AnyKind::MethodReturn { target: a }, AnyKind::MethodReturn { target: b }) => a.cmp(b),
            (
                AnyKind::EntryPointArg { index: ia, method_sig: ma, stmt_sig: sa },
                AnyKind::EntryPointArg { index: ib, method_sig: mb, stmt_sig: sb },
            ) => ia.cmp(ib).then_with(|| ma.cmp(mb)).then_with(|| sa.cmp(sb)),
            (AnyKind::Number { ty: a }, AnyKind::Number { ty: b }) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Wildcard leaf with provenance
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnyLeaf {
    pub kind: AnyKind,
    /// Statement (and through it the method) that produced the value
    pub source: Option<StmtSig>,
}

impl AnyLeaf {
    pub fn new(kind: AnyKind, source: Option<StmtSig>) -> Self {
        Self { kind, source }
    }

    fn source_text(&self) -> String {
        match (&self.source, &self.kind) {
            (Some(stmt), _) => stmt.method_sig().to_string(),
            (None, AnyKind::EntryPointArg { method_sig: Some(sig), .. }) => sig.clone(),
            (None, _) => "null".to_string(),
        }
    }

    fn stmt_text(&self) -> String {
        match (&self.source, &self.kind) {
            (Some(stmt), _) => stmt.signature(),
            (None, AnyKind::EntryPointArg { stmt_sig: Some(sig), .. }) => sig.clone(),
            (None, _) => "null".to_string(),
        }
    }

    fn data_segment(&self) -> String {
        let tag = self.kind.tag();
        let source = self.source_text();
        let stmt = self.stmt_text();
        match &self.kind {
            AnyKind::MethodReturn { target } => {
                let target = target.as_ref().map_or("null".to_string(), |t| t.to_string());
                format!("[TYPE={tag}, SOURCE={source}, TARGET={target}, STMT={stmt}]")
            }
            AnyKind::EntryPointArg { index, .. } => {
                format!("[TYPE={tag}, SOURCE={source}, INDEX={index}, STMT={stmt}]")
            }
            AnyKind::ParentPath | AnyKind::ChildPath => format!("[{tag}]"),
            _ => format!("[TYPE={tag}, SOURCE={source}, STMT={stmt}]"),
        }
    }
}

impl Render for AnyLeaf {
    fn render(&self, form: Form) -> String {
        let number = matches!(self.kind, AnyKind::Number { .. });
        match form {
            Form::Regex if self.kind.is_numeric() => "\\d+".to_string(),
            Form::Regex => ".*".to_string(),
            Form::SuperSimple if number => NUM_IND.to_string(),
            Form::SuperSimple => format!("{SEP}{ANY_IND}{SEP}"),
            Form::Simple if number => format!("{SEP}{NUM_IND}[{}]{SEP}", self.kind.tag()),
            Form::Simple => format!("{SEP}{ANY_IND}[{}]{SEP}", self.kind.tag()),
            Form::Full if number => format!("{SEP}{NUM_IND}{}{SEP}", self.data_segment()),
            Form::Full => format!("{SEP}{ANY_IND}{}{SEP}", self.data_segment()),
        }
    }
}

impl Ord for AnyLeaf {
    fn cmp(&self, other: &Self) -> Ordering {
        let by_kind = self.kind.type_name().cmp(other.kind.type_name());
        if by_kind != Ordering::Equal {
            return by_kind;
        }
        // absent sources sort first
        self.source
            .cmp(&other.source)
            .then_with(|| self.kind.cmp_inner(&other.kind))
    }
}

impl PartialOrd for AnyLeaf {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
