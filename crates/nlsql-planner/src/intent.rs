//! The query-intent tree populated by the structure parser and consumed by
//! the join planner and SQL emitter.

use serde::Serialize;

/// A column reference, literal, table-star, or an operator wrapping another
/// `ColumnExpr` — the recursive value every `selectExpr`/`groupByExpr`/
/// `orderByExpr` element and every condition operand reduces to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ColumnExpr {
    Column { table: String, name: String },
    TableStar { table: String },
    Number(String),
    String(String),
    /// An upper-cased operator name (`GT`, `NOT`, `AVG`, …) wrapping another expression.
    Operator { name: String, target: Box<ColumnExpr> },
}

impl ColumnExpr {
    /// True if this expression or any of its operator-wrapped descendants
    /// names an aggregate function — the signal that routes a condition to
    /// HAVING instead of WHERE.
    pub fn contains_aggregate(&self) -> bool {
        match self {
            ColumnExpr::Operator { name, target } => is_aggregate_name(name) || target.contains_aggregate(),
            _ => false,
        }
    }
}

pub fn is_aggregate_name(name: &str) -> bool {
    matches!(name, "AVG" | "SUM" | "COUNT" | "MIN" | "MAX")
}

/// A single WHERE/HAVING predicate: a left operand, how it's tested, and
/// whether the whole test is negated.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    pub left: ColumnExpr,
    pub test: ConditionTest,
    pub negated: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CompareOp {
    Gt,
    Lt,
    Eq,
    Ge,
    Le,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum ConditionTest {
    Compare(CompareOp, ColumnExpr),
    IsNull,
}

/// One element of a WHERE/HAVING clause list: either a condition, or the
/// connector token preceding every condition after the first.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ClauseItem {
    Condition(Condition),
    Connector(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub column: ColumnExpr,
    pub desc: bool,
}

/// The populated intent tree: everything the join planner and SQL emitter
/// need, independent of how it was parsed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryIntent {
    /// Tables referenced by the query, in first-mention order, deduplicated.
    pub tables_used: Vec<String>,
    pub select: Vec<ColumnExpr>,
    #[serde(rename = "where")]
    pub where_: Vec<ClauseItem>,
    pub having: Vec<ClauseItem>,
    pub group_by: Vec<ColumnExpr>,
    pub order_by: Vec<OrderItem>,
}

impl QueryIntent {
    pub fn use_table(&mut self, table: &str) {
        if !self.tables_used.iter().any(|t| t == table) {
            self.tables_used.push(table.to_string());
        }
    }
}
