//! Tokens produced by the external morphological analyzer.
//!
//! The core never constructs these itself beyond classifying `kind`; whitespace-only
//! words are discarded by the caller before a `Token` is built.

use serde::{Deserialize, Serialize};

/// Monotonic ordinal position of a token in the input stream.
pub type TokenIndex = u32;

/// Coarse classification of a token. Tables and columns are assigned by
/// consulting the catalog index; numbers and text are assigned by the
/// morphology-to-catalog classifier in [`crate::catalog::Catalog::classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Table,
    Column,
    Number,
    Text,
}

/// A single word from the input question, tagged by the morphological analyzer
/// and classified against the catalog. Immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
    /// Canonical dictionary form. May be empty if the analyzer could not lemmatize.
    pub lemma: String,
    /// Opaque grammar tag, forwarded for diagnostics only. Never parsed by the core.
    pub grammar: String,
    pub index: TokenIndex,
}

impl Token {
    pub fn new(
        text: impl Into<String>,
        kind: TokenKind,
        lemma: impl Into<String>,
        grammar: impl Into<String>,
        index: TokenIndex,
    ) -> Self {
        Self {
            text: text.into(),
            kind,
            lemma: lemma.into(),
            grammar: grammar.into(),
            index,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let tok = Token::new("сотрудников", TokenKind::Table, "сотрудник", "NOUN,anim,masc,Plur,Gen", 1);
        let json = serde_json::to_string(&tok).unwrap();
        let back: Token = serde_json::from_str(&json).unwrap();
        assert_eq!(tok, back);
    }
}
