//! Catalog objects and the lemma → object index.
//!
//! The catalog is a value threaded through constructors, never a lazily-initialized
//! global: it is built once from a [`CatalogProvider`] and handed read-only to
//! the engine, structure parser and join planner.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::token::TokenKind;

/// A table in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableObject {
    pub schema: String,
    pub name: String,
    /// Russian lemma synonyms that resolve to this table.
    pub lemmas: Vec<String>,
}

/// A column in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnObject {
    pub schema: String,
    pub table: String,
    pub name: String,
    pub lemmas: Vec<String>,
}

/// A catalog object: a table or a column. Lemma lookups are uniformly
/// "candidate list" shaped (singleton or longer) so call sites never need
/// to special-case arity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CatalogObject {
    Table(TableObject),
    Column(ColumnObject),
}

impl CatalogObject {
    pub fn as_table(&self) -> Option<&TableObject> {
        match self {
            CatalogObject::Table(t) => Some(t),
            CatalogObject::Column(_) => None,
        }
    }

    pub fn as_column(&self) -> Option<&ColumnObject> {
        match self {
            CatalogObject::Column(c) => Some(c),
            CatalogObject::Table(_) => None,
        }
    }
}

/// Raw catalog shape as handed over by the (external) catalog provider.
///
/// Foreign keys are flattened per column-pair, each row carrying its own
/// `position` within the constraint — the same shape a JDBC/`information_schema`
/// foreign key query returns one row per column pair. [`Catalog::build`] folds
/// rows sharing a `ref_name` back into a single [`crate::fk::ForeignKey`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawForeignKeyRow {
    pub ref_name: String,
    pub owner_l: String,
    pub table_l: String,
    pub column_l: String,
    pub owner_r: String,
    pub table_r: String,
    pub column_r: String,
    pub position: u32,
}

/// Provider interface for the catalog: the external collaborator that supplies
/// table/column metadata and foreign-key constraints.
pub trait CatalogProvider {
    fn tables(&self) -> &[TableObject];
    fn columns(&self) -> &[ColumnObject];
    fn foreign_key_rows(&self) -> &[RawForeignKeyRow];
    fn primary_keys(&self) -> &HashMap<String, Vec<String>>;
}

/// A catalog provider backed by a plain in-memory/deserialized fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticCatalog {
    pub tables: Vec<TableObject>,
    pub columns: Vec<ColumnObject>,
    pub foreign_keys: Vec<RawForeignKeyRow>,
    #[serde(default)]
    pub primary_keys: HashMap<String, Vec<String>>,
}

impl CatalogProvider for StaticCatalog {
    fn tables(&self) -> &[TableObject] {
        &self.tables
    }
    fn columns(&self) -> &[ColumnObject] {
        &self.columns
    }
    fn foreign_key_rows(&self) -> &[RawForeignKeyRow] {
        &self.foreign_keys
    }
    fn primary_keys(&self) -> &HashMap<String, Vec<String>> {
        &self.primary_keys
    }
}

/// Lemma → catalog-object index, plus the FK graph and shortest-paths table
/// built once from the same provider.
#[derive(Debug, Clone)]
pub struct Catalog {
    lemma_index: HashMap<String, Vec<CatalogObject>>,
    pub fk_graph: crate::fk::FkGraph,
    pub shortest_paths: crate::fk::ShortestPaths,
    tables_by_name: HashMap<String, TableObject>,
}

impl Catalog {
    /// Build the catalog index, FK graph and shortest-paths table once from a provider.
    pub fn build(provider: &impl CatalogProvider) -> Self {
        let mut lemma_index: HashMap<String, Vec<CatalogObject>> = HashMap::new();
        let mut tables_by_name = HashMap::new();

        for table in provider.tables() {
            tables_by_name.insert(table.name.clone(), table.clone());
            for lemma in &table.lemmas {
                lemma_index
                    .entry(lemma.clone())
                    .or_default()
                    .push(CatalogObject::Table(table.clone()));
            }
        }
        for column in provider.columns() {
            for lemma in &column.lemmas {
                lemma_index
                    .entry(lemma.clone())
                    .or_default()
                    .push(CatalogObject::Column(column.clone()));
            }
        }

        let fk_graph = crate::fk::FkGraph::build(provider.foreign_key_rows());
        let shortest_paths = crate::fk::ShortestPaths::build(&fk_graph);

        Self {
            lemma_index,
            fk_graph,
            shortest_paths,
            tables_by_name,
        }
    }

    /// Candidates for a lemma, in catalog-declaration order. Empty if unknown.
    pub fn candidates(&self, lemma: &str) -> &[CatalogObject] {
        self.lemma_index.get(lemma).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn table(&self, name: &str) -> Option<&TableObject> {
        self.tables_by_name.get(name)
    }

    /// Classify a word against the catalog: `Table`/`Column` if its lemma resolves
    /// uniquely into that kind's object family, else numeric-vs-text on the raw text.
    pub fn classify(&self, lemma: &str, raw_text: &str) -> TokenKind {
        let candidates = self.candidates(lemma);
        if !candidates.is_empty() {
            if candidates.iter().all(|c| matches!(c, CatalogObject::Table(_))) {
                return TokenKind::Table;
            }
            if candidates.iter().all(|c| matches!(c, CatalogObject::Column(_))) {
                return TokenKind::Column;
            }
        }
        if raw_text.replace(['.', ','], "").chars().all(|c| c.is_ascii_digit()) && !raw_text.is_empty() {
            TokenKind::Number
        } else {
            TokenKind::Text
        }
    }
}
