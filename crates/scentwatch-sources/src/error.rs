//! Error type for `scentwatch-sources`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  /// The response arrived but did not contain what we expected.
  #[error("unexpected response: {0}")]
  Parse(String),

  #[error("invalid fetcher configuration: {0}")]
  Config(String),
}

/// Network trouble is a fetch error; anything about the payload is a parse
/// error. Both abort the step before the watermark moves.
impl From<Error> for scentwatch_core::Error {
  fn from(err: Error) -> Self {
    match err {
      Error::Http(e) => Self::fetch(e),
      Error::Config(msg) => Self::fetch(Error::Config(msg)),
      Error::Json(e) => Self::Parse(e.to_string()),
      Error::Parse(msg) => Self::Parse(msg),
    }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
