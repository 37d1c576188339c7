//! The Pattern value tree: the composite description that the compiler turns
//! into an NFA fragment.
//!
//! A `Pattern` is a named, composite description that compiles to exactly one
//! NFA fragment with one entry state and a set of accept-transitions. Patterns
//! may be cyclic via recursive `Ref`s, but only through the `Ref` indirection —
//! `compile` never inlines a `Ref`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::primitive::Primitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Quantifier {
    /// `?` — zero or one.
    Optional,
    /// `*` — zero or more.
    Star,
    /// `+` — one or more.
    Plus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Pattern {
    Atom(Primitive),
    /// Reference to another named pattern by name; capture-producing, never inlined.
    Ref(String),
    Sequence(Vec<Pattern>),
    /// Non-empty set of alternatives; at least one must match.
    Alternation(Vec<Pattern>),
    Quantified(Box<Pattern>, Quantifier),
}

impl Pattern {
    pub fn seq(patterns: impl IntoIterator<Item = Pattern>) -> Pattern {
        Pattern::Sequence(patterns.into_iter().collect())
    }

    pub fn alt(patterns: impl IntoIterator<Item = Pattern>) -> Pattern {
        let alts: Vec<_> = patterns.into_iter().collect();
        assert!(!alts.is_empty(), "Alternation must have at least one alternative");
        Pattern::Alternation(alts)
    }

    pub fn opt(self) -> Pattern {
        Pattern::Quantified(Box::new(self), Quantifier::Optional)
    }

    pub fn star(self) -> Pattern {
        Pattern::Quantified(Box::new(self), Quantifier::Star)
    }

    pub fn plus(self) -> Pattern {
        Pattern::Quantified(Box::new(self), Quantifier::Plus)
    }

    pub fn reference(name: impl Into<String>) -> Pattern {
        Pattern::Ref(name.into())
    }

    pub fn atom(p: Primitive) -> Pattern {
        Pattern::Atom(p)
    }
}

/// Ordered map of named pattern definitions handed to [`crate::compile::compile`].
///
/// Ordering matters: it is the order definitions are assigned internal state
/// ids in, which downstream debug dumps rely on for determinism.
pub type Definitions = IndexMap<String, Pattern>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_methods_compose() {
        let p = Pattern::seq([
            Pattern::atom(Primitive::TableToken).opt(),
            Pattern::reference("columnExpr").plus(),
        ]);
        match p {
            Pattern::Sequence(xs) => assert_eq!(xs.len(), 2),
            _ => panic!("expected sequence"),
        }
    }

    #[test]
    #[should_panic(expected = "at least one alternative")]
    fn alternation_requires_non_empty() {
        let _ = Pattern::alt(Vec::<Pattern>::new());
    }
}
