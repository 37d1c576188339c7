//! Primitives: named predicates over a single token.
//!
//! A primitive is pure and stateless, closed over a small set of variants
//! rather than a boxed closure — this keeps primitives `Clone`/`PartialEq`,
//! which the overlap resolver's structural equality and the capture tree's
//! debug dump both need.

use nlsql_core::{Token, TokenKind};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Primitive {
    /// Matches any token classified as a table.
    TableToken,
    /// Matches any token classified as a column.
    ColumnToken,
    /// Matches any token classified as a number.
    NumberToken,
    /// Matches any token classified as text (non-table, non-column, non-number).
    TextToken,
    /// Matches a token whose lemma equals exactly the given string.
    LemmaIs(String),
    /// Matches a token whose lemma is one of the given strings.
    LemmaOneOf(Vec<String>),
    /// Matches a token whose lemma contains the given substring (stem match,
    /// e.g. `"сортиров"` matching both `сортировать` and `отсортировать`).
    LemmaContains(String),
    /// Matches any token whatsoever.
    Any,
}

impl Primitive {
    /// Evaluate this primitive against a token. Pure, no side effects.
    pub fn test(&self, token: &Token) -> bool {
        match self {
            Primitive::TableToken => token.kind == TokenKind::Table,
            Primitive::ColumnToken => token.kind == TokenKind::Column,
            Primitive::NumberToken => token.kind == TokenKind::Number,
            Primitive::TextToken => token.kind == TokenKind::Text,
            Primitive::LemmaIs(lemma) => token.lemma == *lemma,
            Primitive::LemmaOneOf(lemmas) => lemmas.iter().any(|l| l == &token.lemma),
            Primitive::LemmaContains(substr) => token.lemma.contains(substr.as_str()),
            Primitive::Any => true,
        }
    }

    /// Stable debug name, used in capture dumps.
    pub fn name(&self) -> &'static str {
        match self {
            Primitive::TableToken => "table",
            Primitive::ColumnToken => "column",
            Primitive::NumberToken => "number",
            Primitive::TextToken => "text",
            Primitive::LemmaIs(_) => "lemmaIs",
            Primitive::LemmaOneOf(_) => "lemmaOneOf",
            Primitive::LemmaContains(_) => "lemmaContains",
            Primitive::Any => "any",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tok(kind: TokenKind, lemma: &str) -> Token {
        Token::new(lemma, kind, lemma, "", 0)
    }

    #[test]
    fn kind_primitives_match_classification() {
        assert!(Primitive::TableToken.test(&tok(TokenKind::Table, "сотрудник")));
        assert!(!Primitive::TableToken.test(&tok(TokenKind::Column, "зарплата")));
    }

    #[test]
    fn lemma_is_matches_exact_lemma_only() {
        let p = Primitive::LemmaIs("и".into());
        assert!(p.test(&tok(TokenKind::Text, "и")));
        assert!(!p.test(&tok(TokenKind::Text, "или")));
    }

    #[test]
    fn lemma_one_of_matches_any_member() {
        let p = Primitive::LemmaOneOf(vec!["и".into(), "или".into(), ",".into()]);
        assert!(p.test(&tok(TokenKind::Text, "или")));
        assert!(!p.test(&tok(TokenKind::Text, "но")));
    }

    #[test]
    fn lemma_contains_matches_a_shared_stem() {
        let p = Primitive::LemmaContains("сортиров".into());
        assert!(p.test(&tok(TokenKind::Text, "сортировать")));
        assert!(p.test(&tok(TokenKind::Text, "отсортировать")));
        assert!(!p.test(&tok(TokenKind::Text, "по")));
    }
}
