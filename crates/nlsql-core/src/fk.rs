//! Foreign-key graph and precomputed shortest-paths table.
//!
//! Grounded on the reference architecture's own graph-analysis pass (which
//! folds a flat edge list into an indexed adjacency structure before running
//! any traversal over it). FK adjacency is sorted by constraint name rather
//! than provider declaration order, so tie-breaking between equally-short
//! join paths is deterministic regardless of provider row order.

use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::RawForeignKeyRow;

/// A single foreign-key constraint, directed `table_l -> table_r`, carrying
/// every column pair it constrains (ordered by `position`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub owner_l: String,
    pub table_l: String,
    pub owner_r: String,
    pub table_r: String,
    /// `(column_l, column_r)` pairs, ordered by declared `position`.
    pub columns: Vec<(String, String)>,
}

/// Directed multi-edge graph over table names.
#[derive(Debug, Clone, Default)]
pub struct FkGraph {
    /// Adjacency keyed by source table, edges sorted by constraint name so
    /// "first FK when several connect the same pair" is deterministic and
    /// independent of the provider's row order.
    edges: IndexMap<String, Vec<ForeignKey>>,
}

impl FkGraph {
    pub fn build(rows: &[RawForeignKeyRow]) -> Self {
        let mut grouped: IndexMap<String, (ForeignKey, Vec<u32>)> = IndexMap::new();
        for row in rows {
            let (fk, positions) = grouped.entry(row.ref_name.clone()).or_insert_with(|| {
                (
                    ForeignKey {
                        name: row.ref_name.clone(),
                        owner_l: row.owner_l.clone(),
                        table_l: row.table_l.clone(),
                        owner_r: row.owner_r.clone(),
                        table_r: row.table_r.clone(),
                        columns: Vec::new(),
                    },
                    Vec::new(),
                )
            });
            fk.columns.push((row.column_l.clone(), row.column_r.clone()));
            positions.push(row.position);
        }
        let grouped: IndexMap<String, ForeignKey> = grouped
            .into_iter()
            .map(|(name, (mut fk, positions))| {
                let mut paired: Vec<(u32, (String, String))> =
                    positions.into_iter().zip(fk.columns.drain(..)).collect();
                paired.sort_by_key(|(pos, _)| *pos);
                fk.columns = paired.into_iter().map(|(_, cols)| cols).collect();
                (name, fk)
            })
            .collect();

        let mut edges: IndexMap<String, Vec<ForeignKey>> = IndexMap::new();
        for fk in grouped.into_values() {
            edges.entry(fk.table_l.clone()).or_default().push(fk);
        }
        for list in edges.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }

        Self { edges }
    }

    /// Outgoing foreign keys from `table`, in deterministic (constraint-name) order.
    pub fn outgoing(&self, table: &str) -> &[ForeignKey] {
        self.edges.get(table).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The first (by constraint name) foreign key directed `from -> to`, if any.
    pub fn edge_between(&self, from: &str, to: &str) -> Option<&ForeignKey> {
        self.outgoing(from).iter().find(|fk| fk.table_r == to)
    }

    /// All tables appearing as an edge endpoint, insertion order.
    pub fn tables(&self) -> impl Iterator<Item = &str> {
        self.edges.keys().map(String::as_str)
    }
}

/// Precomputed `(src, dst) -> [intermediate tables..., dst]` shortest directed
/// paths, BFS'd once per source table over [`FkGraph`] edges.
#[derive(Debug, Clone, Default)]
pub struct ShortestPaths {
    paths: HashMap<(String, String), Vec<String>>,
}

impl ShortestPaths {
    pub fn build(graph: &FkGraph) -> Self {
        let mut paths = HashMap::new();
        let mut all_tables: Vec<String> = graph.tables().map(String::from).collect();
        for list in graph.edges.values() {
            for fk in list {
                if !all_tables.contains(&fk.table_r) {
                    all_tables.push(fk.table_r.clone());
                }
            }
        }
        all_tables.sort();

        for src in &all_tables {
            bfs_from(graph, src, &mut paths);
        }
        Self { paths }
    }

    /// The shortest directed path `src -> dst` (exclusive of src, inclusive of dst),
    /// or `None` if unreachable.
    pub fn get(&self, src: &str, dst: &str) -> Option<&[String]> {
        self.paths.get(&(src.to_string(), dst.to_string())).map(Vec::as_slice)
    }
}

fn bfs_from(graph: &FkGraph, src: &str, out: &mut HashMap<(String, String), Vec<String>>) {
    let mut queue: VecDeque<String> = VecDeque::new();
    let mut path_to: HashMap<String, Vec<String>> = HashMap::new();
    queue.push_back(src.to_string());
    path_to.insert(src.to_string(), Vec::new());

    while let Some(current) = queue.pop_front() {
        let current_path = path_to.get(&current).cloned().unwrap_or_default();
        for fk in graph.outgoing(&current) {
            if path_to.contains_key(&fk.table_r) {
                continue;
            }
            let mut next_path = current_path.clone();
            next_path.push(fk.table_r.clone());
            out.insert((src.to_string(), fk.table_r.clone()), next_path.clone());
            path_to.insert(fk.table_r.clone(), next_path);
            queue.push_back(fk.table_r.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, l: &str, lc: &str, r: &str, rc: &str, pos: u32) -> RawForeignKeyRow {
        RawForeignKeyRow {
            ref_name: name.into(),
            owner_l: "hr".into(),
            table_l: l.into(),
            column_l: lc.into(),
            owner_r: "hr".into(),
            table_r: r.into(),
            column_r: rc.into(),
            position: pos,
        }
    }

    #[test]
    fn groups_multi_column_fk_rows() {
        let rows = vec![
            row("fk_emp_dept", "employees", "dept_id", "departments", "id", 0),
            row("fk_emp_dept", "employees", "loc_id", "departments", "loc_id", 1),
        ];
        let graph = FkGraph::build(&rows);
        let fks = graph.outgoing("employees");
        assert_eq!(fks.len(), 1);
        assert_eq!(fks[0].columns.len(), 2);
    }

    #[test]
    fn multi_column_fk_columns_order_by_position_not_row_order() {
        let rows = vec![
            row("fk_emp_dept", "employees", "loc_id", "departments", "loc_id", 1),
            row("fk_emp_dept", "employees", "dept_id", "departments", "id", 0),
        ];
        let graph = FkGraph::build(&rows);
        let fks = graph.outgoing("employees");
        assert_eq!(fks[0].columns, vec![("dept_id".to_string(), "id".to_string()), ("loc_id".to_string(), "loc_id".to_string())]);
    }

    #[test]
    fn shortest_paths_follow_fk_direction_only() {
        let rows = vec![row("fk_emp_dept", "employees", "dept_id", "departments", "id", 0)];
        let graph = FkGraph::build(&rows);
        let sp = ShortestPaths::build(&graph);
        assert_eq!(sp.get("employees", "departments"), Some(&["departments".to_string()][..]));
        assert_eq!(sp.get("departments", "employees"), None);
    }

    #[test]
    fn multi_hop_path_orders_intermediates() {
        let rows = vec![
            row("fk_a_b", "a", "b_id", "b", "id", 0),
            row("fk_b_c", "b", "c_id", "c", "id", 0),
        ];
        let graph = FkGraph::build(&rows);
        let sp = ShortestPaths::build(&graph);
        assert_eq!(sp.get("a", "c"), Some(&["b".to_string(), "c".to_string()][..]));
    }

    #[test]
    fn multiple_fks_between_same_pair_break_ties_by_name() {
        let rows = vec![
            row("fk_zz", "employees", "backup_dept_id", "departments", "id", 0),
            row("fk_aa", "employees", "dept_id", "departments", "id", 0),
        ];
        let graph = FkGraph::build(&rows);
        let edge = graph.edge_between("employees", "departments").unwrap();
        assert_eq!(edge.name, "fk_aa");
    }
}
