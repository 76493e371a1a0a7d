//! Concrete fetchers for the scentwatch pipeline.
//!
//! - [`CovidApiClient`] pulls the cumulative US case history from a JSON API.
//! - [`ReviewScraper`] walks a product's critical-review pages, newest first,
//!   until it reaches reviews the pipeline has already seen.
//!
//! Both implement [`scentwatch_core::source::Source`]. HTML and JSON
//! extraction are pure functions so they can be tested offline against
//! captured fixtures.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
#![allow(async_fn_in_trait)]

pub mod covid;
pub mod error;
pub mod html;
pub mod reviews;

pub use covid::CovidApiClient;
pub use error::{Error, Result};
pub use reviews::{HttpPageFetcher, PageFetcher, ReviewScraper, StopReason};

use std::time::Duration;

/// HTTP settings shared by both fetchers.
#[derive(Debug, Clone)]
pub struct HttpConfig {
  pub user_agent:      String,
  pub accept_language: String,
  pub timeout:         Duration,
}

impl Default for HttpConfig {
  fn default() -> Self {
    Self {
      user_agent:      "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
                        Chrome/90.0.4430.212 Safari/537.36"
        .to_owned(),
      accept_language: "en-US, en;q=0.5".to_owned(),
      timeout:         Duration::from_secs(30),
    }
  }
}

impl HttpConfig {
  pub(crate) fn client(&self) -> Result<reqwest::Client> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
      reqwest::header::ACCEPT_LANGUAGE,
      reqwest::header::HeaderValue::from_str(&self.accept_language)
        .map_err(|e| Error::Config(format!("accept_language: {e}")))?,
    );
    Ok(
      reqwest::Client::builder()
        .user_agent(&self.user_agent)
        .default_headers(headers)
        .timeout(self.timeout)
        .build()?,
    )
  }
}
