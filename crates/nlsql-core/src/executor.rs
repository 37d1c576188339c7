//! Stub seam for the database driver, an explicitly out-of-scope collaborator.
//!
//! The core never executes SQL itself — it only emits a rendered statement
//! (see [`crate::error::DomainError::DatabaseFailure`]). This trait exists so
//! the host's error-mapping story (arbitrary database exceptions become
//! `DatabaseFailure`) is visible at a type level; no implementation ships
//! here.

use crate::error::DomainError;

/// Executes a rendered SQL statement against a live database and returns a
/// header row plus data rows. Implemented by the host service, never by
/// this crate.
pub trait SqlExecutor {
    fn execute(&self, sql: &str) -> Result<(Vec<String>, Vec<Vec<String>>), DomainError>;
}
