//! The `Source` trait: an external fetcher that produces dated rows.

use std::future::Future;

use crate::{Result, record::TabularRow, watermark::Watermark};

/// An external data source (API client, scraper).
///
/// `fetch` may return rows at or before `watermark`; the loader filters them.
/// Sources that paginate use the watermark only to decide when to stop.
/// Network failures surface as [`crate::Error::Fetch`], malformed responses
/// as [`crate::Error::Parse`]. Retries, if any, are the source's business.
pub trait Source: Send + Sync {
  type Row: TabularRow + Send + 'static;

  /// Short name used in logs.
  fn name(&self) -> &'static str;

  fn fetch(
    &self,
    watermark: Watermark,
  ) -> impl Future<Output = Result<Vec<Self::Row>>> + Send + '_;
}
