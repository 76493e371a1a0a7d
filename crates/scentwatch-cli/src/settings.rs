//! Pipeline configuration, layered from an optional TOML file and
//! `SCENTWATCH_*` environment variables.

use std::{
  path::{Path, PathBuf},
  time::Duration,
};

use anyhow::Context as _;
use scentwatch_core::watermark::keys;
use scentwatch_sources::{HttpConfig, covid, reviews};
use serde::Deserialize;

/// Runtime configuration, deserialised from `scentwatch.toml`.
///
/// Every field has a default, so an absent file is fine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
  /// Location of the SQLite file holding all tables and watermarks.
  pub store_path:                PathBuf,
  pub covid_url:                 String,
  /// Review page URL with a `{page}` placeholder.
  pub reviews_url:               String,
  pub max_review_pages:          u32,
  pub user_agent:                String,
  pub accept_language:           String,
  pub http_timeout_secs:         u64,
  pub covid_watermark_key:       String,
  pub reviews_watermark_key:     String,
  pub transform_watermark_key:   String,
  pub correlation_watermark_key: String,
}

impl Default for PipelineConfig {
  fn default() -> Self {
    let http = HttpConfig::default();
    Self {
      store_path:                PathBuf::from("scentwatch.db"),
      covid_url:                 covid::DEFAULT_URL.to_owned(),
      reviews_url:               reviews::DEFAULT_URL_TEMPLATE.to_owned(),
      max_review_pages:          500,
      user_agent:                http.user_agent,
      accept_language:           http.accept_language,
      http_timeout_secs:         http.timeout.as_secs(),
      covid_watermark_key:       keys::COVID.to_owned(),
      reviews_watermark_key:     keys::REVIEWS.to_owned(),
      transform_watermark_key:   keys::TRANSFORM.to_owned(),
      correlation_watermark_key: keys::CORRELATION.to_owned(),
    }
  }
}

impl PipelineConfig {
  /// Read `path` (if it exists), then overlay `SCENTWATCH_*` variables.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let settings = config::Config::builder()
      .add_source(config::File::from(path).required(false))
      .add_source(config::Environment::with_prefix("SCENTWATCH"))
      .build()
      .context("failed to read config file")?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise PipelineConfig")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn http(&self) -> HttpConfig {
    HttpConfig {
      user_agent:      self.user_agent.clone(),
      accept_language: self.accept_language.clone(),
      timeout:         Duration::from_secs(self.http_timeout_secs),
    }
  }
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  #[test]
  fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = PipelineConfig::load(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(cfg.correlation_watermark_key, "last_date");
    assert_eq!(cfg.transform_watermark_key, "last_date_amazon_transformed");
    assert_eq!(cfg.max_review_pages, 500);
    assert!(cfg.reviews_url.contains("{page}"));
  }

  #[test]
  fn file_values_override_defaults() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(file, "store_path = \"/tmp/pipeline.db\"\nmax_review_pages = 3").unwrap();
    let cfg = PipelineConfig::load(file.path()).unwrap();
    assert_eq!(cfg.store_path, PathBuf::from("/tmp/pipeline.db"));
    assert_eq!(cfg.max_review_pages, 3);
    assert_eq!(cfg.covid_url, covid::DEFAULT_URL);
  }

  #[test]
  fn tilde_is_expanded() {
    let home = std::env::var("HOME").unwrap_or_default();
    if home.is_empty() {
      return;
    }
    assert_eq!(expand_tilde(Path::new("~/x.db")), PathBuf::from(home).join("x.db"));
    assert_eq!(expand_tilde(Path::new("/abs/x.db")), PathBuf::from("/abs/x.db"));
  }
}
