//! Pattern definitions for the Russian query grammar the engine matches
//! against a tokenized question.
//!
//! Each top-level entry (`select_expr`, `where_expr`, `group_by_expr`,
//! `order_by_expr`) is matched independently with its own [`Matcher`], the
//! way the structure parser expects per-pattern `(currentRuns, finalRuns)`
//! isolation.
//!
//! [`Matcher`]: nlsql_engine::Matcher

use nlsql_engine::{Definitions, Pattern, Primitive};

pub const SELECT_EXPR: &str = "select_expr";
pub const WHERE_EXPR: &str = "where_expr";
pub const GROUP_BY_EXPR: &str = "group_by_expr";
pub const ORDER_BY_EXPR: &str = "order_by_expr";

pub const TOP_LEVEL_PATTERNS: &[&str] = &[SELECT_EXPR, WHERE_EXPR, GROUP_BY_EXPR, ORDER_BY_EXPR];

const DISPLAY_VERB: &[&str] = &["вывести", "выводить", "показать", "выбрать"];
const GROUP_PREPOSITION: &str = "по";
const WHERE_PREPOSITION: &[&str] = &["с", "у"];
const SORT_PREPOSITION: &str = "по";
/// Lemma stem shared by `сортировать`/`отсортировать`/etc.; required to lead
/// `order_by_expr` so a bare `"по <column>"` cannot also be read as
/// `group_by_expr` (both would otherwise share the same optional `"по"`
/// preposition over an identical span).
const SORT_VERB_STEM: &str = "сортиров";

/// Builds the full set of named pattern definitions. Build this once per
/// process and compile it once; the resulting [`nlsql_engine::CompiledGrammar`]
/// is immutable and shared across every parse.
pub fn definitions() -> Definitions {
    let mut defs = Definitions::new();

    defs.insert("connector".into(), connector());
    defs.insert("comparator".into(), comparator());
    defs.insert("aggregate_function".into(), aggregate_function());
    defs.insert("op".into(), op());
    defs.insert("literal".into(), literal());
    defs.insert("string".into(), string());
    defs.insert("column_base".into(), column_base());
    defs.insert("column_expr".into(), column_expr());
    defs.insert("list_of_columns".into(), list_of_columns());
    defs.insert("is_null_marker".into(), Pattern::atom(Primitive::LemmaIs("отсутствовать".into())));
    defs.insert("condition".into(), condition());
    defs.insert("desc".into(), Pattern::atom(Primitive::LemmaIs("убывание".into())));
    defs.insert("asc".into(), Pattern::atom(Primitive::LemmaIs("возрастание".into())));
    defs.insert("sort_column".into(), sort_column());

    defs.insert(SELECT_EXPR.into(), select_expr());
    defs.insert(WHERE_EXPR.into(), where_expr());
    defs.insert(GROUP_BY_EXPR.into(), group_by_expr());
    defs.insert(ORDER_BY_EXPR.into(), order_by_expr());

    defs
}

fn connector() -> Pattern {
    Pattern::alt([
        Pattern::atom(Primitive::LemmaIs("и".into())),
        Pattern::atom(Primitive::LemmaIs("или".into())),
        Pattern::atom(Primitive::LemmaIs(",".into())),
    ])
}

/// `gt | lt | eq | ge | le`, the latter two modeled as dedicated two-token
/// idioms (`не менее` / `не более`) rather than compositions of `not` with
/// `lt`/`gt`, so the condition's `negated` flag stays reserved for an
/// explicit standalone negation.
fn comparator() -> Pattern {
    Pattern::alt([
        Pattern::atom(Primitive::LemmaIs("больше".into())),
        Pattern::atom(Primitive::LemmaIs("меньше".into())),
        Pattern::atom(Primitive::LemmaIs("равно".into())),
        Pattern::seq([
            Pattern::atom(Primitive::LemmaIs("не".into())),
            Pattern::atom(Primitive::LemmaIs("менее".into())),
        ]),
        Pattern::seq([
            Pattern::atom(Primitive::LemmaIs("не".into())),
            Pattern::atom(Primitive::LemmaIs("более".into())),
        ]),
    ])
}

fn aggregate_function() -> Pattern {
    Pattern::alt([
        Pattern::atom(Primitive::LemmaIs("средний".into())),
        Pattern::atom(Primitive::LemmaIs("сумма".into())),
        Pattern::atom(Primitive::LemmaIs("количество".into())),
        Pattern::atom(Primitive::LemmaIs("минимальный".into())),
        Pattern::atom(Primitive::LemmaIs("максимальный".into())),
    ])
}

/// An operator prefix attachable to a `column_expr`'s base: a comparator, a
/// standalone negation, or an aggregate-function adjective.
fn op() -> Pattern {
    Pattern::alt([
        Pattern::reference("comparator"),
        Pattern::atom(Primitive::LemmaIs("не".into())),
        Pattern::reference("aggregate_function"),
    ])
}

fn literal() -> Pattern {
    Pattern::atom(Primitive::NumberToken)
}

/// A run of text tokens making up a quoted string literal. The quote marks
/// themselves are not modeled as distinct tokens here; the morphological
/// analyzer is assumed to hand the core the already-segmented inner words.
fn string() -> Pattern {
    Pattern::atom(Primitive::TextToken).plus()
}

fn column_base() -> Pattern {
    Pattern::alt([
        Pattern::reference("literal"),
        Pattern::reference("string"),
        Pattern::atom(Primitive::ColumnToken),
        Pattern::atom(Primitive::TableToken),
    ])
}

/// `columnExpr = [op*, base]`, operators wrapping right-to-associate.
fn column_expr() -> Pattern {
    Pattern::seq([Pattern::reference("op").star(), Pattern::reference("column_base")])
}

/// A comma/`и`/`или`-separated list of columns, optionally trailed by a bare
/// table token that disambiguates preceding polysemous column lemmas.
fn list_of_columns() -> Pattern {
    Pattern::seq([
        Pattern::reference("column_expr"),
        Pattern::seq([Pattern::reference("connector"), Pattern::reference("column_expr")]).star(),
        Pattern::atom(Primitive::TableToken).opt(),
    ])
}

fn select_expr() -> Pattern {
    Pattern::seq([
        Pattern::atom(Primitive::LemmaOneOf(DISPLAY_VERB.iter().map(|s| s.to_string()).collect())).opt(),
        Pattern::alt([Pattern::reference("list_of_columns"), Pattern::atom(Primitive::TableToken)]),
    ])
}

/// `base test` where `test` is either a comparator applied to a `column_expr`
/// operand, or a standalone `is_null` marker; `not` may prefix the whole
/// condition.
fn condition() -> Pattern {
    Pattern::alt([
        Pattern::seq([
            Pattern::atom(Primitive::LemmaIs("не".into())).opt(),
            Pattern::reference("column_expr"),
            Pattern::reference("comparator"),
            Pattern::reference("column_expr"),
        ]),
        Pattern::seq([
            Pattern::atom(Primitive::LemmaIs("не".into())).opt(),
            Pattern::reference("column_expr"),
            Pattern::reference("is_null_marker"),
        ]),
    ])
}

fn where_expr() -> Pattern {
    Pattern::seq([
        Pattern::atom(Primitive::LemmaOneOf(WHERE_PREPOSITION.iter().map(|s| s.to_string()).collect())).opt(),
        Pattern::reference("condition"),
        Pattern::seq([Pattern::reference("connector"), Pattern::reference("condition")]).star(),
    ])
}

fn group_by_expr() -> Pattern {
    Pattern::seq([
        Pattern::atom(Primitive::LemmaIs(GROUP_PREPOSITION.into())).opt(),
        Pattern::reference("column_expr"),
        Pattern::seq([Pattern::reference("connector"), Pattern::reference("column_expr")]).star(),
    ])
}

/// An optional `"по"` preposition, a `column_expr`, then an optional
/// `desc`/`asc` Structure; absent or trailing `asc` means ascending.
fn sort_column() -> Pattern {
    Pattern::seq([
        Pattern::atom(Primitive::LemmaIs(SORT_PREPOSITION.into())).opt(),
        Pattern::reference("column_expr"),
        Pattern::alt([Pattern::reference("desc"), Pattern::reference("asc")]).opt(),
    ])
}

/// A required sort-verb token (`отсортировать`/`сортировать`/...) leads the
/// pattern; this is what keeps `order_by_expr` from matching the same bare
/// `"по <column>"` span `group_by_expr` matches.
fn order_by_expr() -> Pattern {
    Pattern::seq([
        Pattern::atom(Primitive::LemmaContains(SORT_VERB_STEM.into())),
        Pattern::reference("sort_column"),
        Pattern::seq([Pattern::reference("connector"), Pattern::reference("sort_column")]).star(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlsql_core::{Token, TokenKind};
    use nlsql_engine::{compile, reconstruct, Matcher};

    #[test]
    fn all_top_level_patterns_compile() {
        let grammar = compile(&definitions());
        for name in TOP_LEVEL_PATTERNS {
            assert!(grammar.fragment(name).is_some(), "missing compiled fragment for {name}");
        }
    }

    /// Span lengths of every final run of `pattern_name` over `tokens`,
    /// matching what the overlap resolver (`SPEC_FULL.md` §4.4) compares.
    fn spans(pattern_name: &str, tokens: &[Token]) -> Vec<u32> {
        let grammar = compile(&definitions());
        let mut matcher = Matcher::new(&grammar, pattern_name);
        for token in tokens {
            matcher.feed(token.index, token);
        }
        matcher.finish();
        matcher
            .final_runs()
            .iter()
            .map(|&run| reconstruct(&matcher, run, pattern_name).0.len())
            .collect()
    }

    /// A bare `"по <column>"` (no sort verb anywhere) must only ever be read
    /// as `group_by_expr` — `order_by_expr` now requires a leading sort-verb
    /// token the tokens never supply, so it must not match at all.
    #[test]
    fn negative_order_by_and_group_by_no_longer_collide() {
        let tokens = vec![
            Token::new("по", TokenKind::Text, "по", "", 0),
            Token::new("названию", TokenKind::Column, "название", "", 1),
        ];
        assert_eq!(spans(GROUP_BY_EXPR, &tokens), vec![2]);
        assert!(spans(ORDER_BY_EXPR, &tokens).is_empty());
    }

    /// With a leading sort verb, `order_by_expr` matches the whole phrase
    /// (span length 3); `group_by_expr` can still match the trailing `"по
    /// <column>"` on its own (span length 2, since the matcher seeds a fresh
    /// attempt at every token), but strictly shorter — the overlap resolver
    /// keeps the longer `order_by_expr` reading over this one.
    #[test]
    fn sort_verb_makes_order_by_strictly_longer_than_group_by() {
        let tokens = vec![
            Token::new("отсортировать", TokenKind::Text, "отсортировать", "", 0),
            Token::new("по", TokenKind::Text, "по", "", 1),
            Token::new("названию", TokenKind::Column, "название", "", 2),
        ];
        assert_eq!(spans(ORDER_BY_EXPR, &tokens), vec![3]);
        assert_eq!(spans(GROUP_BY_EXPR, &tokens), vec![2]);
    }
}
