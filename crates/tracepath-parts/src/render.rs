//! String renderings of parts
//!
//! Every part has four renderings:
//! - full: every provenance field, the canonical form used in store dumps
//! - simple: kind tags only
//! - super-simple: one token per wildcard kind
//! - regex: a pattern matching the concrete paths the expression may produce
//!
//! Leaf renderings are cached on first use. Branch renderings are cached per graph
//! generation, so any rewiring through the mutation API drops them.

use crate::part::Part;
use crate::{NodeId, PartError, PartGraph, PartId, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;

/// Separator framing symbolic tokens inside a rendering
pub const SEP: &str = "`";

const APPEND_DIV: &str = " + ";
const OR_DIV: &str = " | ";
const LOOP_IND: &str = "LOOP";
const NORM_IND: &str = "NORM";
const SYSVAR_IND: &str = "SYSVAR";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Form {
    Full,
    Simple,
    SuperSimple,
    Regex,
}

/// Rendering of a self-contained value
pub trait Render {
    fn render(&self, form: Form) -> String;
}

/// Lazily filled renderings of one immutable leaf
#[derive(Debug, Clone, Default)]
pub(crate) struct RenderCache {
    full: OnceLock<String>,
    simple: OnceLock<String>,
    super_simple: OnceLock<String>,
    regex: OnceLock<String>,
}

impl RenderCache {
    fn slot(&self, form: Form) -> &OnceLock<String> {
        match form {
            Form::Full => &self.full,
            Form::Simple => &self.simple,
            Form::SuperSimple => &self.super_simple,
            Form::Regex => &self.regex,
        }
    }

    pub(crate) fn get_or_render(&self, form: Form, render: impl FnOnce() -> String) -> String {
        self.slot(form).get_or_init(render).clone()
    }
}

/// Renderings of branch parts keyed by part and form
///
/// Entries belong to one graph generation. Cloning a graph starts an empty cache.
#[derive(Debug, Default)]
pub(crate) struct BranchCache {
    entries: Mutex<BranchEntries>,
}

#[derive(Debug, Default)]
struct BranchEntries {
    generation: u64,
    renderings: HashMap<(PartId, Form), String>,
}

impl Clone for BranchCache {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl BranchCache {
    fn get(&self, generation: u64, id: PartId, form: Form) -> Option<String> {
        let entries = self.entries.lock();
        if entries.generation != generation {
            return None;
        }
        entries.renderings.get(&(id, form)).cloned()
    }

    fn insert(&self, generation: u64, id: PartId, form: Form, rendered: &str) {
        let mut entries = self.entries.lock();
        if entries.generation != generation {
            entries.renderings.clear();
            entries.generation = generation;
        }
        entries.renderings.insert((id, form), rendered.to_string());
    }
}

impl PartGraph {
    /// Render the part in the requested form
    ///
    /// Asking a loop for its regex form is a usage error. Loops nested below sequences,
    /// alternations and normalize parts are skipped instead.
    pub fn render(&self, id: PartId, form: Form) -> Result<String> {
        self.check_part(id)?;
        self.render_inner(id, form)
    }

    pub fn to_full_string(&self, id: PartId) -> Result<String> {
        self.render(id, Form::Full)
    }

    pub fn to_simple_string(&self, id: PartId) -> Result<String> {
        self.render(id, Form::Simple)
    }

    pub fn to_super_simple_string(&self, id: PartId) -> Result<String> {
        self.render(id, Form::SuperSimple)
    }

    pub fn to_regex_string(&self, id: PartId) -> Result<String> {
        self.render(id, Form::Regex)
    }

    /// Compile the regex rendering into a whole-string matcher
    pub fn matcher(&self, id: PartId) -> Result<regex_lite::Regex> {
        let pattern = self.to_regex_string(id)?;
        Ok(regex_lite::Regex::new(&format!("^(?:{pattern})$"))?)
    }

    fn render_inner(&self, id: PartId, form: Form) -> Result<String> {
        if let Part::Leaf(leaf) = &self.parts[id.index()] {
            return Ok(leaf.cache.get_or_render(form, || leaf.leaf.render(form)));
        }
        // the lock is released before recursing into children
        if let Some(hit) = self.branch_renderings.get(self.generation, id, form) {
            return Ok(hit);
        }
        let rendered = self.render_branch(id, form)?;
        self.branch_renderings.insert(self.generation, id, form, &rendered);
        Ok(rendered)
    }

    fn render_branch(&self, id: PartId, form: Form) -> Result<String> {
        match &self.parts[id.index()] {
            Part::Leaf(leaf) => Ok(leaf.cache.get_or_render(form, || leaf.leaf.render(form))),
            Part::Append(append) => {
                if form == Form::Regex {
                    let mut out = String::new();
                    for child in self.non_loop_children(&append.children) {
                        out.push_str(&self.render_inner(child, form)?);
                    }
                    return Ok(out);
                }
                let rendered = append
                    .children
                    .iter()
                    .map(|n| self.render_inner(self.nodes[n.index()], form))
                    .collect::<Result<Vec<_>>>()?;
                Ok(format!("{{{}}}", rendered.join(APPEND_DIV)))
            }
            Part::Or(or) => {
                if form == Form::Regex {
                    let mut alternatives = BTreeSet::new();
                    for child in self.non_loop_children(&or.children) {
                        alternatives.insert(self.render_inner(child, form)?);
                    }
                    if alternatives.is_empty() {
                        return Ok(String::new());
                    }
                    let joined: Vec<String> = alternatives.into_iter().collect();
                    return Ok(format!("(?:{})", joined.join("|")));
                }
                let rendered = or
                    .children
                    .iter()
                    .map(|n| self.render_inner(self.nodes[n.index()], form))
                    .collect::<Result<BTreeSet<_>>>()?;
                let joined: Vec<String> = rendered.into_iter().collect();
                Ok(format!("({})", joined.join(OR_DIV)))
            }
            Part::Loop(lp) => match form {
                Form::Regex => Err(PartError::Unsupported {
                    operation: "regex rendering",
                    kind: "loop",
                }),
                Form::SuperSimple => Ok(format!("{SEP}{LOOP_IND}{SEP}")),
                Form::Simple => Ok(format!("{SEP}{LOOP_IND}[{}]{SEP}", lp.id)),
                Form::Full => {
                    let hash = lp.start.map_or("null".to_string(), |n| n.0.to_string());
                    Ok(format!("{SEP}{LOOP_IND}[ID={}, PARTHASH={hash}]{SEP}", lp.id))
                }
            },
            Part::Normalize(norm) => {
                let child = norm.child.map(|n| self.nodes[n.index()]);
                if form == Form::Regex {
                    return match child {
                        Some(c) if !self.parts[c.index()].is_loop() => self.render_inner(c, form),
                        _ => Ok(String::new()),
                    };
                }
                let inner = match child {
                    Some(c) => self.render_inner(c, form)?,
                    None => String::new(),
                };
                Ok(format!("{NORM_IND}[{inner}]"))
            }
            Part::SysVar(sys) => match form {
                Form::Regex => Ok(".*".to_string()),
                Form::SuperSimple => Ok(format!("{SEP}{SYSVAR_IND}{SEP}")),
                Form::Simple | Form::Full => {
                    let inner = match sys.child.map(|n| self.nodes[n.index()]) {
                        Some(c) => self.render_inner(c, form)?,
                        None => String::new(),
                    };
                    Ok(format!("{SYSVAR_IND}[{inner}]"))
                }
            },
        }
    }

    fn non_loop_children<'a>(
        &'a self,
        children: &'a [NodeId],
    ) -> impl Iterator<Item = PartId> + 'a {
        children
            .iter()
            .map(|n| self.nodes[n.index()])
            .filter(|p| !self.parts[p.index()].is_loop())
    }
}
