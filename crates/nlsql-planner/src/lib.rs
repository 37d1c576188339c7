//! Structure parser, join planner and SQL emitter for the Russian
//! query grammar: turns tokenized input plus a catalog into SQL.

pub mod emitter;
pub mod grammar;
pub mod intent;
pub mod parser;
pub mod planner;

pub use emitter::translate;
pub use intent::{ClauseItem, ColumnExpr, CompareOp, Condition, ConditionTest, OrderItem, QueryIntent};
pub use nlsql_engine::{NoopTracer, PrintTracer, Tracer};
pub use parser::{parse, parse_traced};
pub use planner::{plan_from, AliasedTable, FromPlan, JoinClause, JoinCondition};
