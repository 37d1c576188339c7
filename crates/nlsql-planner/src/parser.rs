//! Structure parser: lifts reconstructed capture trees into the populated
//! [`QueryIntent`].

use nlsql_core::{Catalog, DomainError, Token, TokenKind};
use nlsql_engine::{compile, reconstruct, resolve_overlaps, Capture, Matcher, NoopTracer, Structure, StructureElem, Tracer};

use crate::grammar::{self, GROUP_BY_EXPR, ORDER_BY_EXPR, SELECT_EXPR, WHERE_EXPR};
use crate::intent::{ClauseItem, ColumnExpr, CompareOp, Condition, ConditionTest, OrderItem, QueryIntent};

/// Matches every top-level pattern against `tokens`, resolves overlaps, and
/// dispatches each survivor into the intent tree.
pub fn parse(tokens: &[Token], catalog: &Catalog) -> Result<QueryIntent, DomainError> {
    parse_traced(tokens, catalog, &mut NoopTracer)
}

/// Same as [`parse`], reporting every match-engine transition/accept event to `tracer`.
pub fn parse_traced(tokens: &[Token], catalog: &Catalog, tracer: &mut dyn Tracer) -> Result<QueryIntent, DomainError> {
    let defs = grammar::definitions();
    let compiled = compile(&defs);

    let mut captures = Vec::new();
    for &pattern_name in grammar::TOP_LEVEL_PATTERNS {
        let mut matcher = Matcher::new(&compiled, pattern_name);
        for token in tokens {
            matcher.feed_with(token.index, token, tracer);
        }
        matcher.finish_with(tracer);
        for &run in matcher.final_runs() {
            let (span, structure) = reconstruct(&matcher, run, pattern_name);
            captures.push(Capture { span, structure });
        }
    }

    let survivors = resolve_overlaps(captures);

    let mut intent = QueryIntent::default();
    for capture in &survivors {
        match capture.structure.name.as_str() {
            SELECT_EXPR => parse_select(&capture.structure, tokens, catalog, &mut intent)?,
            WHERE_EXPR => parse_where(&capture.structure, tokens, catalog, &mut intent)?,
            GROUP_BY_EXPR => parse_group_by(&capture.structure, tokens, catalog, &mut intent)?,
            ORDER_BY_EXPR => parse_order_by(&capture.structure, tokens, catalog, &mut intent)?,
            _ => {}
        }
    }

    if intent.tables_used.is_empty() {
        return Err(DomainError::EmptyQuery);
    }
    Ok(intent)
}

fn use_table(tables_used: &mut Vec<String>, table: &str) {
    if !tables_used.iter().any(|t| t == table) {
        tables_used.push(table.to_string());
    }
}

fn resolve_table_name(catalog: &Catalog, lemma: &str) -> String {
    catalog
        .candidates(lemma)
        .iter()
        .find_map(|c| c.as_table())
        .map(|t| t.name.clone())
        .unwrap_or_else(|| lemma.to_string())
}

fn parse_select(structure: &Structure, tokens: &[Token], catalog: &Catalog, intent: &mut QueryIntent) -> Result<(), DomainError> {
    for elem in &structure.elements {
        match elem {
            StructureElem::Token(t) => {
                let token = &tokens[t.token_index as usize];
                if token.kind == TokenKind::Table {
                    let table = resolve_table_name(catalog, &token.lemma);
                    intent.use_table(&table);
                }
            }
            StructureElem::Nested(s) if s.name == "list_of_columns" => {
                parse_list_of_columns(s, tokens, catalog, intent)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn parse_list_of_columns(s: &Structure, tokens: &[Token], catalog: &Catalog, intent: &mut QueryIntent) -> Result<(), DomainError> {
    let disambiguator = match s.elements.last() {
        Some(StructureElem::Token(t)) if tokens[t.token_index as usize].kind == TokenKind::Table => {
            Some(resolve_table_name(catalog, &tokens[t.token_index as usize].lemma))
        }
        _ => None,
    };
    for elem in &s.elements {
        if let StructureElem::Nested(col) = elem {
            if col.name == "column_expr" {
                let expr = resolve_column_expr(col, tokens, catalog, disambiguator.as_deref(), &mut intent.tables_used)?;
                intent.select.push(expr);
            }
        }
    }
    if let Some(table) = disambiguator {
        intent.use_table(&table);
    }
    Ok(())
}

fn parse_where(structure: &Structure, tokens: &[Token], catalog: &Catalog, intent: &mut QueryIntent) -> Result<(), DomainError> {
    let mut pending_connector: Option<String> = None;
    for elem in &structure.elements {
        match elem {
            StructureElem::Nested(ns) if ns.name == "connector" => {
                pending_connector = Some(connector_lemma(ns, tokens));
            }
            StructureElem::Nested(ns) if ns.name == "condition" => {
                let condition = parse_condition(ns, tokens, catalog, &mut intent.tables_used)?;
                let routes_to_having = condition_has_aggregate(&condition);
                let target = if routes_to_having { &mut intent.having } else { &mut intent.where_ };
                let connector = pending_connector.take();
                if !target.is_empty() {
                    if let Some(connector) = connector {
                        target.push(ClauseItem::Connector(connector));
                    }
                }
                target.push(ClauseItem::Condition(condition));
            }
            _ => {}
        }
    }
    Ok(())
}

fn condition_has_aggregate(condition: &Condition) -> bool {
    if condition.left.contains_aggregate() {
        return true;
    }
    matches!(&condition.test, ConditionTest::Compare(_, right) if right.contains_aggregate())
}

fn parse_group_by(structure: &Structure, tokens: &[Token], catalog: &Catalog, intent: &mut QueryIntent) -> Result<(), DomainError> {
    for elem in &structure.elements {
        if let StructureElem::Nested(ns) = elem {
            if ns.name == "column_expr" {
                let expr = resolve_column_expr(ns, tokens, catalog, None, &mut intent.tables_used)?;
                intent.group_by.push(expr);
            }
        }
    }
    Ok(())
}

fn parse_order_by(structure: &Structure, tokens: &[Token], catalog: &Catalog, intent: &mut QueryIntent) -> Result<(), DomainError> {
    for elem in &structure.elements {
        if let StructureElem::Nested(ns) = elem {
            if ns.name == "sort_column" {
                let (column_struct, desc) = sort_column_parts(ns);
                let column = resolve_column_expr(column_struct, tokens, catalog, None, &mut intent.tables_used)?;
                intent.order_by.push(OrderItem { column, desc });
            }
        }
    }
    Ok(())
}

fn sort_column_parts(s: &Structure) -> (&Structure, bool) {
    let mut column = None;
    let mut desc = false;
    for elem in &s.elements {
        match elem {
            StructureElem::Nested(ns) if ns.name == "column_expr" => column = Some(ns),
            StructureElem::Nested(ns) if ns.name == "desc" => desc = true,
            StructureElem::Nested(ns) if ns.name == "asc" => desc = false,
            _ => {}
        }
    }
    (column.expect("sort_column always carries exactly one column_expr"), desc)
}

fn parse_condition(s: &Structure, tokens: &[Token], catalog: &Catalog, tables_used: &mut Vec<String>) -> Result<Condition, DomainError> {
    let mut negated = false;
    let mut exprs: Vec<&Structure> = Vec::new();
    let mut cmp: Option<&Structure> = None;
    let mut is_null = false;
    for elem in &s.elements {
        match elem {
            StructureElem::Token(t) => {
                if tokens[t.token_index as usize].lemma == "не" {
                    negated = true;
                }
            }
            StructureElem::Nested(ns) if ns.name == "column_expr" => exprs.push(ns),
            StructureElem::Nested(ns) if ns.name == "comparator" => cmp = Some(ns),
            StructureElem::Nested(ns) if ns.name == "is_null_marker" => is_null = true,
            _ => {}
        }
    }
    let left = resolve_column_expr(exprs[0], tokens, catalog, None, tables_used)?;

    if is_null {
        return Ok(Condition { left, test: ConditionTest::IsNull, negated });
    }

    let right = resolve_column_expr(exprs[1], tokens, catalog, None, tables_used)?;
    let compare_op = match comparator_name(cmp.expect("comparator condition always carries a comparator"), tokens).as_str() {
        "GT" => CompareOp::Gt,
        "LT" => CompareOp::Lt,
        "EQ" => CompareOp::Eq,
        "GE" => CompareOp::Ge,
        "LE" => CompareOp::Le,
        other => unreachable!("comparator always resolves to a known operator, got {other}"),
    };
    Ok(Condition { left, test: ConditionTest::Compare(compare_op, right), negated })
}

fn connector_lemma(s: &Structure, tokens: &[Token]) -> String {
    s.elements
        .iter()
        .find_map(|e| match e {
            StructureElem::Token(t) => Some(tokens[t.token_index as usize].lemma.clone()),
            _ => None,
        })
        .expect("connector always carries one token")
}

fn comparator_name(s: &Structure, tokens: &[Token]) -> String {
    let lemmas: Vec<&str> = s
        .elements
        .iter()
        .filter_map(|e| match e {
            StructureElem::Token(t) => Some(tokens[t.token_index as usize].lemma.as_str()),
            _ => None,
        })
        .collect();
    match lemmas.as_slice() {
        ["больше"] => "GT".to_string(),
        ["меньше"] => "LT".to_string(),
        ["равно"] => "EQ".to_string(),
        ["не", "менее"] => "GE".to_string(),
        ["не", "более"] => "LE".to_string(),
        other => unreachable!("unrecognized comparator lemma sequence {other:?}"),
    }
}

fn aggregate_name(s: &Structure, tokens: &[Token]) -> String {
    let lemma = s
        .elements
        .iter()
        .find_map(|e| match e {
            StructureElem::Token(t) => Some(tokens[t.token_index as usize].lemma.as_str()),
            _ => None,
        })
        .expect("aggregate_function always carries one token");
    match lemma {
        "средний" => "AVG".to_string(),
        "сумма" => "SUM".to_string(),
        "количество" => "COUNT".to_string(),
        "минимальный" => "MIN".to_string(),
        "максимальный" => "MAX".to_string(),
        other => unreachable!("unrecognized aggregate function lemma {other}"),
    }
}

fn resolve_op_name(op_struct: &Structure, tokens: &[Token]) -> String {
    for elem in &op_struct.elements {
        match elem {
            StructureElem::Nested(s) if s.name == "comparator" => return comparator_name(s, tokens),
            StructureElem::Nested(s) if s.name == "aggregate_function" => return aggregate_name(s, tokens),
            StructureElem::Token(t) => {
                if tokens[t.token_index as usize].lemma == "не" {
                    return "NOT".to_string();
                }
            }
            _ => {}
        }
    }
    unreachable!("op structure always resolves to a comparator, aggregate function, or negation")
}

fn resolve_column_expr(
    structure: &Structure,
    tokens: &[Token],
    catalog: &Catalog,
    disambiguator: Option<&str>,
    tables_used: &mut Vec<String>,
) -> Result<ColumnExpr, DomainError> {
    let mut ops = Vec::new();
    let mut base_struct = None;
    for elem in &structure.elements {
        match elem {
            StructureElem::Nested(s) if s.name == "op" => ops.push(s),
            StructureElem::Nested(s) if s.name == "column_base" => base_struct = Some(s),
            _ => {}
        }
    }
    let base_struct = base_struct.expect("column_expr always carries a column_base");
    let mut expr = resolve_column_base(base_struct, tokens, catalog, disambiguator, tables_used)?;
    for op_struct in ops.into_iter().rev() {
        let name = resolve_op_name(op_struct, tokens);
        expr = ColumnExpr::Operator { name, target: Box::new(expr) };
    }
    Ok(expr)
}

fn resolve_column_base(
    structure: &Structure,
    tokens: &[Token],
    catalog: &Catalog,
    disambiguator: Option<&str>,
    tables_used: &mut Vec<String>,
) -> Result<ColumnExpr, DomainError> {
    for elem in &structure.elements {
        match elem {
            StructureElem::Nested(s) if s.name == "literal" => return Ok(resolve_literal(s, tokens)),
            StructureElem::Nested(s) if s.name == "string" => return Ok(resolve_string(s, tokens)),
            StructureElem::Token(t) => {
                let token = &tokens[t.token_index as usize];
                return match token.kind {
                    TokenKind::Column => resolve_column(catalog, &token.lemma, disambiguator, tables_used),
                    TokenKind::Table => {
                        let table = resolve_table_name(catalog, &token.lemma);
                        use_table(tables_used, &table);
                        Ok(ColumnExpr::TableStar { table })
                    }
                    other => unreachable!("column_base token must be a column or table, got {other:?}"),
                };
            }
            _ => {}
        }
    }
    unreachable!("column_base always carries exactly one element")
}

fn resolve_literal(s: &Structure, tokens: &[Token]) -> ColumnExpr {
    let index = s
        .elements
        .iter()
        .find_map(|e| match e {
            StructureElem::Token(t) => Some(t.token_index),
            _ => None,
        })
        .expect("literal always carries one number token");
    ColumnExpr::Number(tokens[index as usize].text.clone())
}

fn resolve_string(s: &Structure, tokens: &[Token]) -> ColumnExpr {
    let text = s
        .elements
        .iter()
        .filter_map(|e| match e {
            StructureElem::Token(t) => Some(tokens[t.token_index as usize].text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ");
    ColumnExpr::String(text)
}

fn resolve_column(catalog: &Catalog, lemma: &str, disambiguator: Option<&str>, tables_used: &mut Vec<String>) -> Result<ColumnExpr, DomainError> {
    let candidates: Vec<_> = catalog.candidates(lemma).iter().filter_map(|c| c.as_column()).collect();

    if candidates.len() == 1 {
        let col = candidates[0];
        use_table(tables_used, &col.table);
        return Ok(ColumnExpr::Column { table: col.table.clone(), name: col.name.clone() });
    }

    if let Some(table) = disambiguator {
        return match candidates.iter().find(|c| c.table == table) {
            Some(col) => {
                use_table(tables_used, &col.table);
                Ok(ColumnExpr::Column { table: col.table.clone(), name: col.name.clone() })
            }
            None => Err(DomainError::ColumnNotInTable { table: table.to_string(), column: lemma.to_string() }),
        };
    }

    match candidates.iter().find(|c| tables_used.iter().any(|t| t == &c.table)) {
        Some(col) => {
            use_table(tables_used, &col.table);
            Ok(ColumnExpr::Column { table: col.table.clone(), name: col.name.clone() })
        }
        None => Err(DomainError::AmbiguousColumn { column: lemma.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nlsql_core::{ColumnObject, RawForeignKeyRow, StaticCatalog, TableObject};
    use std::collections::HashMap;

    fn fixture_catalog() -> Catalog {
        Catalog::build(&StaticCatalog {
            tables: vec![
                TableObject { schema: "hr".into(), name: "employees".into(), lemmas: vec!["сотрудник".into()] },
                TableObject { schema: "hr".into(), name: "departments".into(), lemmas: vec!["отдел".into()] },
            ],
            columns: vec![
                ColumnObject { schema: "hr".into(), table: "employees".into(), name: "last_name".into(), lemmas: vec!["фамилия".into()] },
                ColumnObject { schema: "hr".into(), table: "employees".into(), name: "first_name".into(), lemmas: vec!["имя".into()] },
                ColumnObject { schema: "hr".into(), table: "employees".into(), name: "salary".into(), lemmas: vec!["зарплата".into()] },
                ColumnObject { schema: "hr".into(), table: "departments".into(), name: "dept_name".into(), lemmas: vec!["название".into()] },
                ColumnObject { schema: "hr".into(), table: "employees".into(), name: "emp_id".into(), lemmas: vec!["идентификатор".into()] },
                ColumnObject { schema: "hr".into(), table: "departments".into(), name: "dept_id".into(), lemmas: vec!["идентификатор".into()] },
            ],
            foreign_keys: vec![RawForeignKeyRow {
                ref_name: "fk_emp_dept".into(),
                owner_l: "hr".into(),
                table_l: "employees".into(),
                column_l: "dept_id".into(),
                owner_r: "hr".into(),
                table_r: "departments".into(),
                column_r: "dept_id".into(),
                position: 1,
            }],
            primary_keys: HashMap::new(),
        })
    }

    fn tok(text: &str, kind: TokenKind, lemma: &str, index: u32) -> Token {
        Token::new(text, kind, lemma, "", index)
    }

    #[test]
    fn bare_table_select_yields_no_select_columns() {
        let catalog = fixture_catalog();
        let tokens = vec![
            tok("выведи", TokenKind::Text, "вывести", 0),
            tok("сотрудников", TokenKind::Table, "сотрудник", 1),
        ];
        let intent = parse(&tokens, &catalog).unwrap();
        assert_eq!(intent.tables_used, vec!["employees".to_string()]);
        assert!(intent.select.is_empty());
    }

    #[test]
    fn unambiguous_columns_resolve_without_a_disambiguator() {
        let catalog = fixture_catalog();
        let tokens = vec![
            tok("выведи", TokenKind::Text, "вывести", 0),
            tok("фамилию", TokenKind::Column, "фамилия", 1),
            tok(",", TokenKind::Text, ",", 2),
            tok("имя", TokenKind::Column, "имя", 3),
            tok("и", TokenKind::Text, "и", 4),
            tok("зарплату", TokenKind::Column, "зарплата", 5),
        ];
        let intent = parse(&tokens, &catalog).unwrap();
        assert_eq!(intent.select.len(), 3);
        assert_eq!(intent.tables_used, vec!["employees".to_string()]);
    }

    #[test]
    fn polysemous_column_without_context_is_ambiguous() {
        let catalog = fixture_catalog();
        let tokens = vec![tok("идентификатор", TokenKind::Column, "идентификатор", 0)];
        let err = parse(&tokens, &catalog).unwrap_err();
        assert_eq!(err, DomainError::AmbiguousColumn { column: "идентификатор".into() });
    }

    #[test]
    fn trailing_table_token_disambiguates_polysemous_columns() {
        let catalog = fixture_catalog();
        let tokens = vec![
            tok("идентификатор", TokenKind::Column, "идентификатор", 0),
            tok("отделов", TokenKind::Table, "отдел", 1),
        ];
        let intent = parse(&tokens, &catalog).unwrap();
        assert_eq!(intent.select, vec![ColumnExpr::Column { table: "departments".into(), name: "dept_id".into() }]);
    }

    #[test]
    fn where_condition_with_comparator_routes_to_where() {
        let catalog = fixture_catalog();
        let tokens = vec![
            tok("зарплата", TokenKind::Column, "зарплата", 0),
            tok("больше", TokenKind::Text, "больше", 1),
            tok("10000", TokenKind::Number, "10000", 2),
        ];
        let intent = parse(&tokens, &catalog).unwrap();
        assert_eq!(intent.where_.len(), 1);
        assert!(intent.having.is_empty());
    }

    #[test]
    fn aggregate_operand_routes_condition_to_having() {
        let catalog = fixture_catalog();
        let tokens = vec![
            tok("зарплата", TokenKind::Column, "зарплата", 0),
            tok("больше", TokenKind::Text, "больше", 1),
            tok("средней", TokenKind::Text, "средний", 2),
            tok("зарплаты", TokenKind::Column, "зарплата", 3),
        ];
        let intent = parse(&tokens, &catalog).unwrap();
        assert_eq!(intent.having.len(), 1);
        assert!(intent.where_.is_empty());
    }

    #[test]
    fn is_null_marker_routes_to_an_is_null_condition_test() {
        let catalog = fixture_catalog();
        let tokens = vec![
            tok("зарплата", TokenKind::Column, "зарплата", 0),
            tok("отсутствует", TokenKind::Text, "отсутствовать", 1),
        ];
        let intent = parse(&tokens, &catalog).unwrap();
        assert_eq!(intent.where_.len(), 1);
        match &intent.where_[0] {
            ClauseItem::Condition(c) => {
                assert_eq!(c.test, ConditionTest::IsNull);
                assert!(!c.negated);
            }
            other => panic!("expected a condition, got {other:?}"),
        }
    }

    #[test]
    fn parse_traced_reports_transition_and_accept_events_for_every_top_level_pattern() {
        use nlsql_engine::PrintTracer;

        let catalog = fixture_catalog();
        let tokens = vec![
            tok("выведи", TokenKind::Text, "вывести", 0),
            tok("сотрудников", TokenKind::Table, "сотрудник", 1),
        ];
        let mut tracer = PrintTracer::new();
        let intent = parse_traced(&tokens, &catalog, &mut tracer).unwrap();
        assert_eq!(intent.tables_used, vec!["employees".to_string()]);
        assert!(tracer.lines().iter().any(|l| l.starts_with("feed ")));
        assert!(tracer.lines().iter().any(|l| l.starts_with("accept run")));
    }
}
