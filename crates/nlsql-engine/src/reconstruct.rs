//! Rebuilds a capture tree from a surviving run by walking its parent chain
//! backward.
//!
//! Grounded on the reference engine's `ValueMaterializer`: a stack of
//! in-progress builders driven by a flat effect stream, here driven by the
//! [`RunKind`]-tagged run chain instead of an explicit effect log.

use nlsql_core::TokenIndex;

use crate::matcher::Matcher;
use crate::nfa::TransitionLabel;
use crate::run::{RunId, RunKind};

/// Inclusive token index range covered by a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: TokenIndex,
    pub end: TokenIndex,
}

impl Span {
    pub fn overlaps(&self, other: &Span) -> bool {
        self.end >= other.start && other.end >= self.start
    }

    pub fn len(&self) -> u32 {
        self.end - self.start + 1
    }
}

/// One matched primitive leaf: which primitive matched, and at which token.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenElem {
    pub primitive_name: &'static str,
    pub token_index: TokenIndex,
}

/// An element of a reconstructed [`Structure`]: either a leaf token match or
/// a nested named capture.
#[derive(Debug, Clone, PartialEq)]
pub enum StructureElem {
    Token(TokenElem),
    Nested(Structure),
}

/// A named capture tree: the reconstructed shape of one `Ref` invocation (or
/// the top-level pattern itself).
#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub name: String,
    pub elements: Vec<StructureElem>,
}

impl Structure {
    /// A deterministic, indented tree dump — one name or token per line —
    /// used for snapshot testing in place of a derived `Debug` rendering.
    pub fn snapshot(&self) -> String {
        let mut out = String::new();
        self.write_snapshot(&mut out, 0);
        out
    }

    fn write_snapshot(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&self.name);
        out.push('\n');
        for elem in &self.elements {
            match elem {
                StructureElem::Token(t) => {
                    out.push_str(&"  ".repeat(depth + 1));
                    out.push_str(&format!("Token {}@{}\n", t.primitive_name, t.token_index));
                }
                StructureElem::Nested(child) => child.write_snapshot(out, depth + 1),
            }
        }
    }
}

struct Builder {
    name: String,
    elements: Vec<StructureElem>,
}

impl Builder {
    fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), elements: Vec::new() }
    }

    fn finish(mut self) -> Structure {
        self.elements.reverse();
        Structure { name: self.name, elements: self.elements }
    }
}

/// Walks `run`'s parent chain back to its root, rebuilding the capture tree
/// rooted at `pattern_name` and the token span it covers.
pub fn reconstruct(matcher: &Matcher, run: RunId, pattern_name: &str) -> (Span, Structure) {
    let runs = matcher.runs();
    let mut stack = vec![Builder::new(pattern_name)];
    let mut min_index: Option<TokenIndex> = None;
    let mut max_index: Option<TokenIndex> = None;

    let mut current = Some(run);
    while let Some(run_id) = current {
        let node = runs.get(run_id);
        match node.kind {
            RunKind::RefClose => {
                let TransitionLabel::Ref(name) = &node_ref_label(matcher, run_id) else {
                    unreachable!("RefClose run must carry a Ref transition")
                };
                stack.push(Builder::new(name.clone()));
            }
            RunKind::Token => {
                let index = node.token.expect("Token run always carries a token index");
                let primitive_name = primitive_name_of(matcher, run_id);
                min_index = Some(min_index.map_or(index, |m| m.min(index)));
                max_index = Some(max_index.map_or(index, |m| m.max(index)));
                stack.last_mut().expect("root builder always present").elements.push(StructureElem::Token(TokenElem {
                    primitive_name,
                    token_index: index,
                }));
            }
            RunKind::RefOpen => {
                let finished = stack.pop().expect("RefOpen must close a builder pushed by its RefClose");
                let child = finished.finish();
                stack.last_mut().expect("root builder always present").elements.push(StructureElem::Nested(child));
            }
        }
        current = node.parent;
    }

    let root = stack.pop().expect("exactly one builder remains at the root").finish();
    let span = Span {
        start: min_index.unwrap_or(0),
        end: max_index.unwrap_or(0),
    };
    (span, root)
}

fn node_ref_label(matcher: &Matcher, run_id: RunId) -> TransitionLabel {
    let node = matcher.runs().get(run_id);
    matcher.grammar().graph.transition(node.transition).label.clone()
}

fn primitive_name_of(matcher: &Matcher, run_id: RunId) -> &'static str {
    let node = matcher.runs().get(run_id);
    match &matcher.grammar().graph.transition(node.transition).label {
        TransitionLabel::Primitive(p) => p.name(),
        other => unreachable!("Token run must carry a Primitive transition, found {other:?}"),
    }
}
