//! The core's typed error hierarchy.
//!
//! Every failure the core itself can raise is a variant here.
//! `DatabaseFailure` is kept as a variant purely so the host's error-mapping story
//! is total even though this crate never constructs it.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Запрос не содержит ни столбцов, ни таблиц!")]
    EmptyQuery,

    #[error("Столбец \"{column}\" упоминается неоднозначно, уточните таблицу")]
    AmbiguousColumn { column: String },

    #[error("Таблица \"{table}\" не содержит столбец \"{column}\"")]
    ColumnNotInTable { table: String, column: String },

    #[error("Невозможно соединить таблицы из запроса!")]
    Unjoinable,

    #[error("Ошибка базы данных: {message}")]
    DatabaseFailure { message: String },
}
