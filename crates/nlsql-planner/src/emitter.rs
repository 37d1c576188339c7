//! Renders a populated [`QueryIntent`] into canonical Oracle-syntax SQL.

use nlsql_core::{Catalog, DomainError};

use crate::intent::{ClauseItem, ColumnExpr, CompareOp, Condition, ConditionTest, QueryIntent};
use crate::planner::{plan_from, AliasedTable, FromPlan, JoinClause};

pub fn translate(intent: &QueryIntent, catalog: &Catalog) -> Result<String, DomainError> {
    let plan = plan_from(intent, catalog)?;
    let mut out = String::new();

    out.push_str("SELECT ");
    out.push_str(&render_select_list(intent, &plan));
    out.push('\n');

    out.push_str("FROM ");
    out.push_str(&render_table_ref(&plan.root));
    out.push('\n');
    for join in &plan.joins {
        out.push_str("  ");
        out.push_str(&render_join(join));
        out.push('\n');
    }

    if !intent.where_.is_empty() {
        push_clause(&mut out, "WHERE", &intent.where_, &plan);
    }

    if !intent.group_by.is_empty() {
        out.push_str("GROUP BY ");
        out.push_str(&join_exprs(&intent.group_by, &plan));
        out.push('\n');
    }

    if !intent.having.is_empty() {
        push_clause(&mut out, "HAVING", &intent.having, &plan);
    }

    if !intent.order_by.is_empty() {
        let items: Vec<String> = intent
            .order_by
            .iter()
            .map(|o| {
                let col = render_column_expr(&o.column, &plan);
                if o.desc { format!("{col} DESC") } else { col }
            })
            .collect();
        out.push_str("ORDER BY ");
        out.push_str(&items.join(", "));
        out.push('\n');
    }

    out.truncate(out.trim_end_matches('\n').len());
    Ok(out)
}

fn render_select_list(intent: &QueryIntent, plan: &FromPlan) -> String {
    if intent.select.is_empty() {
        "*".to_string()
    } else {
        join_exprs(&intent.select, plan)
    }
}

fn join_exprs(exprs: &[ColumnExpr], plan: &FromPlan) -> String {
    exprs.iter().map(|e| render_column_expr(e, plan)).collect::<Vec<_>>().join(", ")
}

fn quote_alias(alias: &str) -> String {
    format!("\"{alias}\"")
}

fn render_table_ref(table: &AliasedTable) -> String {
    if table.alias.is_empty() {
        table.table.clone()
    } else {
        format!("{} {}", table.table, quote_alias(&table.alias))
    }
}

fn render_join(join: &JoinClause) -> String {
    let on = join
        .conditions
        .iter()
        .map(|c| format!("{}.{} = {}.{}", quote_alias(&c.left_alias), c.left_column, quote_alias(&c.right_alias), c.right_column))
        .collect::<Vec<_>>()
        .join(" AND ");
    format!("JOIN {} ON {on}", render_table_ref(&join.table))
}

fn render_column_expr(expr: &ColumnExpr, plan: &FromPlan) -> String {
    match expr {
        ColumnExpr::Column { table, name } => match plan.alias_of(table) {
            Some(alias) if !alias.is_empty() => format!("{}.{name}", quote_alias(alias)),
            _ => name.clone(),
        },
        ColumnExpr::TableStar { table } => match plan.alias_of(table) {
            Some(alias) if !alias.is_empty() => format!("{}.*", quote_alias(alias)),
            _ => format!("{table}.*"),
        },
        ColumnExpr::Number(n) => n.clone(),
        ColumnExpr::String(s) => format!("'{s}'"),
        ColumnExpr::Operator { name, target } => {
            let inner = render_column_expr(target, plan);
            if name == "NOT" { format!("NOT {inner}") } else { format!("{name}({inner})") }
        }
    }
}

fn render_condition(condition: &Condition, plan: &FromPlan) -> String {
    let left = render_column_expr(&condition.left, plan);
    match &condition.test {
        ConditionTest::Compare(op, right) => {
            let sym = compare_symbol(*op);
            let body = format!("{left} {sym} {}", render_column_expr(right, plan));
            if condition.negated { format!("NOT {body}") } else { body }
        }
        ConditionTest::IsNull => {
            let suffix = if condition.negated { "NOT NULL" } else { "NULL" };
            format!("{left} IS {suffix}")
        }
    }
}

fn compare_symbol(op: CompareOp) -> &'static str {
    match op {
        CompareOp::Gt => ">",
        CompareOp::Lt => "<",
        CompareOp::Eq => "=",
        CompareOp::Ge => ">=",
        CompareOp::Le => "<=",
    }
}

/// Renders a WHERE/HAVING clause list onto `out`, one condition per
/// continuation line, connectors folded onto the line of the condition they precede.
fn push_clause(out: &mut String, keyword: &str, items: &[ClauseItem], plan: &FromPlan) {
    let mut lines: Vec<String> = Vec::new();
    let mut pending_connector: Option<&str> = None;
    for item in items {
        match item {
            ClauseItem::Connector(lemma) => pending_connector = Some(connector_keyword(lemma)),
            ClauseItem::Condition(condition) => {
                let rendered = render_condition(condition, plan);
                match pending_connector.take() {
                    Some(keyword) => lines.push(format!("{keyword} {rendered}")),
                    None => lines.push(rendered),
                }
            }
        }
    }

    out.push_str(keyword);
    out.push(' ');
    out.push_str(&lines[0]);
    out.push('\n');
    for line in &lines[1..] {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
}

fn connector_keyword(lemma: &str) -> &'static str {
    match lemma {
        "или" => "OR",
        _ => "AND",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::OrderItem;
    use nlsql_core::{RawForeignKeyRow, StaticCatalog, TableObject};

    fn catalog_with_fk() -> Catalog {
        Catalog::build(&StaticCatalog {
            tables: vec![
                TableObject { schema: "hr".into(), name: "employees".into(), lemmas: vec!["сотрудник".into()] },
                TableObject { schema: "hr".into(), name: "departments".into(), lemmas: vec!["отдел".into()] },
            ],
            columns: vec![],
            foreign_keys: vec![RawForeignKeyRow {
                ref_name: "fk_emp_dept".into(),
                owner_l: "hr".into(),
                table_l: "employees".into(),
                column_l: "dept_id".into(),
                owner_r: "hr".into(),
                table_r: "departments".into(),
                column_r: "id".into(),
                position: 1,
            }],
            primary_keys: Default::default(),
        })
    }

    #[test]
    fn single_table_select_star_has_no_alias() {
        let catalog = Catalog::build(&StaticCatalog {
            tables: vec![TableObject { schema: "hr".into(), name: "employees".into(), lemmas: vec!["сотрудник".into()] }],
            columns: vec![],
            foreign_keys: vec![],
            primary_keys: Default::default(),
        });
        let intent = QueryIntent { tables_used: vec!["employees".into()], ..Default::default() };
        let sql = translate(&intent, &catalog).unwrap();
        assert_eq!(sql, "SELECT *\nFROM employees");
    }

    #[test]
    fn two_table_query_renders_join_with_quoted_aliases() {
        let catalog = catalog_with_fk();
        let intent = QueryIntent {
            tables_used: vec!["employees".into(), "departments".into()],
            select: vec![ColumnExpr::Column { table: "employees".into(), name: "name".into() }],
            ..Default::default()
        };
        let sql = translate(&intent, &catalog).unwrap();
        assert!(sql.contains("FROM employees \"t-1\""));
        assert!(sql.contains("JOIN departments \"t-2\" ON \"t-1\".dept_id = \"t-2\".id"));
        assert!(sql.contains("SELECT \"t-1\".name"));
    }

    #[test]
    fn where_clause_with_connector_renders_on_continuation_line() {
        let catalog = catalog_with_fk();
        let intent = QueryIntent {
            tables_used: vec!["employees".into()],
            where_: vec![
                ClauseItem::Condition(Condition {
                    left: ColumnExpr::Column { table: "employees".into(), name: "salary".into() },
                    test: ConditionTest::Compare(CompareOp::Gt, ColumnExpr::Number("1000".into())),
                    negated: false,
                }),
                ClauseItem::Connector("и".into()),
                ClauseItem::Condition(Condition {
                    left: ColumnExpr::Column { table: "employees".into(), name: "age".into() },
                    test: ConditionTest::Compare(CompareOp::Lt, ColumnExpr::Number("40".into())),
                    negated: false,
                }),
            ],
            ..Default::default()
        };
        let sql = translate(&intent, &catalog).unwrap();
        assert!(sql.contains("WHERE salary > 1000\n  AND age < 40"));
    }

    #[test]
    fn order_by_desc_suffixes_column() {
        let catalog = catalog_with_fk();
        let intent = QueryIntent {
            tables_used: vec!["employees".into()],
            order_by: vec![OrderItem { column: ColumnExpr::Column { table: "employees".into(), name: "salary".into() }, desc: true }],
            ..Default::default()
        };
        let sql = translate(&intent, &catalog).unwrap();
        assert!(sql.ends_with("ORDER BY salary DESC"));
    }

    #[test]
    fn is_null_condition_renders_without_a_right_operand() {
        let catalog = catalog_with_fk();
        let intent = QueryIntent {
            tables_used: vec!["employees".into()],
            where_: vec![ClauseItem::Condition(Condition {
                left: ColumnExpr::Column { table: "employees".into(), name: "manager_id".into() },
                test: ConditionTest::IsNull,
                negated: true,
            })],
            ..Default::default()
        };
        let sql = translate(&intent, &catalog).unwrap();
        assert!(sql.contains("WHERE manager_id IS NOT NULL"));
    }

    #[test]
    fn unjoinable_tables_propagate_the_planner_error() {
        let catalog = Catalog::build(&StaticCatalog::default());
        let intent = QueryIntent { tables_used: vec!["a".into(), "b".into()], ..Default::default() };
        assert_eq!(translate(&intent, &catalog).unwrap_err(), DomainError::Unjoinable);
    }

    /// A full rendering exercising every clause in fixed order (scenario 5/6's
    /// shape, extended with ORDER BY): SELECT, FROM+JOIN, WHERE, GROUP BY,
    /// HAVING, ORDER BY.
    #[test]
    fn full_query_renders_every_clause_in_fixed_order() {
        let catalog = catalog_with_fk();
        let intent = QueryIntent {
            tables_used: vec!["employees".into(), "departments".into()],
            select: vec![
                ColumnExpr::Column { table: "employees".into(), name: "last_name".into() },
                ColumnExpr::Column { table: "departments".into(), name: "id".into() },
            ],
            where_: vec![ClauseItem::Condition(Condition {
                left: ColumnExpr::Column { table: "employees".into(), name: "salary".into() },
                test: ConditionTest::Compare(CompareOp::Gt, ColumnExpr::Number("10000".into())),
                negated: false,
            })],
            group_by: vec![ColumnExpr::Column { table: "departments".into(), name: "id".into() }],
            having: vec![ClauseItem::Condition(Condition {
                left: ColumnExpr::Operator {
                    name: "AVG".into(),
                    target: Box::new(ColumnExpr::Column { table: "employees".into(), name: "salary".into() }),
                },
                test: ConditionTest::Compare(CompareOp::Gt, ColumnExpr::Number("5000".into())),
                negated: false,
            })],
            order_by: vec![OrderItem { column: ColumnExpr::Column { table: "employees".into(), name: "last_name".into() }, desc: true }],
        };
        let sql = translate(&intent, &catalog).unwrap();
        insta::assert_snapshot!(sql, @r###"
SELECT "t-1".last_name, "t-2".id
FROM employees "t-1"
  JOIN departments "t-2" ON "t-1".dept_id = "t-2".id
WHERE "t-1".salary > 10000
GROUP BY "t-2".id
HAVING AVG("t-1".salary) > 5000
ORDER BY "t-1".last_name DESC
"###);
    }
}
