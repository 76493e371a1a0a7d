//! Error types for `scentwatch-core`.

use thiserror::Error;

/// A boxed error from an external collaborator (fetcher or store backend).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, Error)]
pub enum Error {
  /// Network or HTTP failure while talking to an external source.
  #[error("fetch error: {0}")]
  Fetch(#[source] BoxError),

  /// The source answered, but not in a shape we understand.
  #[error("parse error: {0}")]
  Parse(String),

  /// The store failed while reading rows or properties.
  #[error("store error: {0}")]
  Store(#[source] BoxError),

  /// The sink rejected an append. Always raised before the watermark moves.
  #[error("write of {rows} rows to {table} failed: {source}")]
  StoreWrite {
    table:  &'static str,
    rows:   usize,
    #[source]
    source: BoxError,
  },

  #[error("invalid watermark value: {0:?}")]
  InvalidWatermark(String),
}

impl Error {
  pub fn fetch(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Fetch(Box::new(err))
  }

  pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(err))
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
