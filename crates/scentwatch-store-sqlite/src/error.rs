//! Error type for `scentwatch-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date parse error: {0}")]
  DateParse(String),

  /// The sink was asked to write to a table outside the pipeline schema.
  #[error("unknown destination table: {0:?}")]
  UnknownTable(String),

  #[error("row has {got} values but table {table} expects {expected}")]
  ColumnMismatch {
    table:    String,
    expected: usize,
    got:      usize,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
