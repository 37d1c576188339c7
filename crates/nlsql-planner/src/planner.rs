//! Join planner: turns `tablesUsed` into an aliased FROM clause by walking
//! precomputed FK shortest paths.

use indexmap::IndexMap;
use nlsql_core::{Catalog, DomainError};

use crate::intent::QueryIntent;

#[derive(Debug, Clone, PartialEq)]
pub struct AliasedTable {
    pub table: String,
    /// Empty for the single-table case; `"t-1"`, `"t-2"`, … otherwise.
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinCondition {
    pub left_alias: String,
    pub left_column: String,
    pub right_alias: String,
    pub right_column: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub table: AliasedTable,
    pub conditions: Vec<JoinCondition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FromPlan {
    pub root: AliasedTable,
    pub joins: Vec<JoinClause>,
}

impl FromPlan {
    pub fn alias_of(&self, table: &str) -> Option<&str> {
        if self.root.table == table {
            return Some(self.root.alias.as_str());
        }
        self.joins.iter().find(|j| j.table.table == table).map(|j| j.table.alias.as_str())
    }
}

fn alias_for(index: usize) -> String {
    format!("t-{index}")
}

/// Builds the FROM plan for `intent.tables_used`, choosing the shortest FK
/// path (either direction) from the already-added set at each step.
pub fn plan_from(intent: &QueryIntent, catalog: &Catalog) -> Result<FromPlan, DomainError> {
    let tables = &intent.tables_used;
    if tables.is_empty() {
        return Err(DomainError::EmptyQuery);
    }
    if tables.len() == 1 {
        return Ok(FromPlan { root: AliasedTable { table: tables[0].clone(), alias: String::new() }, joins: vec![] });
    }

    let t0 = tables[0].clone();
    let mut aliases: IndexMap<String, String> = IndexMap::new();
    aliases.insert(t0.clone(), alias_for(1));
    let mut next_index = 2;
    let mut joins: Vec<JoinClause> = Vec::new();
    let mut remaining: Vec<String> = tables[1..].to_vec();

    while !remaining.is_empty() {
        let added: Vec<String> = aliases.keys().cloned().collect();
        let mut best: Option<Candidate> = None;
        for (ri, candidate) in remaining.iter().enumerate() {
            for (ai, base) in added.iter().enumerate() {
                if let Some(path) = catalog.shortest_paths.get(base, candidate) {
                    consider_candidate(&mut best, ri, candidate, path.to_vec(), true, ai, tables);
                }
                if let Some(path) = catalog.shortest_paths.get(candidate, base) {
                    consider_candidate(&mut best, ri, candidate, path.to_vec(), false, ai, tables);
                }
            }
        }
        let Some(Candidate { ri, path, forward, ai, .. }) = best else {
            return Err(DomainError::Unjoinable);
        };

        let mut hop_from = added[ai].clone();
        for hop in &path {
            let fk = if forward {
                catalog.fk_graph.edge_between(&hop_from, hop)
            } else {
                catalog.fk_graph.edge_between(hop, &hop_from)
            }
            .expect("a chosen shortest-path hop always has a backing FK edge");

            let alias = aliases.entry(hop.clone()).or_insert_with(|| {
                let a = alias_for(next_index);
                next_index += 1;
                a
            });
            let alias = alias.clone();
            let hop_from_alias = aliases.get(&hop_from).expect("hop source is aliased before its join is emitted").clone();

            let conditions = fk
                .columns
                .iter()
                .map(|(left_col, right_col)| {
                    if forward {
                        JoinCondition {
                            left_alias: hop_from_alias.clone(),
                            left_column: left_col.clone(),
                            right_alias: alias.clone(),
                            right_column: right_col.clone(),
                        }
                    } else {
                        JoinCondition {
                            left_alias: alias.clone(),
                            left_column: left_col.clone(),
                            right_alias: hop_from_alias.clone(),
                            right_column: right_col.clone(),
                        }
                    }
                })
                .collect();

            joins.push(JoinClause { table: AliasedTable { table: hop.clone(), alias }, conditions });
            hop_from = hop.clone();
        }
        remaining.remove(ri);
    }

    Ok(FromPlan { root: AliasedTable { table: t0.clone(), alias: aliases.get(&t0).unwrap().clone() }, joins })
}

struct Candidate {
    ri: usize,
    path: Vec<String>,
    forward: bool,
    ai: usize,
    rank: usize,
}

/// Keeps the shortest path; ties broken by the *candidate table being added*'s
/// position in the intent tree's table order — not the path's own last hop,
/// which for a reverse-direction path is the already-added base table, not
/// the candidate.
fn consider_candidate(
    best: &mut Option<Candidate>,
    ri: usize,
    candidate: &str,
    path: Vec<String>,
    forward: bool,
    ai: usize,
    tables_used: &[String],
) {
    let rank = tables_used.iter().position(|t| t == candidate).unwrap_or(usize::MAX);
    let replace = match best {
        None => true,
        Some(current) => path.len() < current.path.len() || (path.len() == current.path.len() && rank < current.rank),
    };
    if replace {
        *best = Some(Candidate { ri, path, forward, ai, rank });
    }
}
