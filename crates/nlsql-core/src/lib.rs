//! Shared data model for the Russian NL-to-SQL core.
//!
//! This crate has no notion of matching or SQL; it only defines the vocabulary
//! that [`nlsql-engine`](../nlsql_engine/index.html) and
//! [`nlsql-planner`](../nlsql_planner/index.html) build on: tokens, catalog
//! objects, the FK graph, and the error hierarchy they all raise into.

pub mod catalog;
pub mod error;
pub mod executor;
pub mod fk;
pub mod token;

pub use catalog::{Catalog, CatalogObject, CatalogProvider, ColumnObject, RawForeignKeyRow, StaticCatalog, TableObject};
pub use error::DomainError;
pub use executor::SqlExecutor;
pub use fk::{FkGraph, ForeignKey, ShortestPaths};
pub use token::{Token, TokenIndex, TokenKind};
