//! The `PipelineStore` trait: the relational tables and the watermark
//! property bag, as seen by the pipeline steps.
//!
//! The trait is implemented by storage backends (e.g. `scentwatch-store-sqlite`).
//! Pipeline steps depend on this abstraction, not on any concrete backend.

use std::future::Future;

use crate::{
  record::{DailyCaseRecord, RawReview, TabularBatch, TransformedReviewRecord, WeeklyCorrelationRecord},
  watermark::Watermark,
};

/// Abstraction over the pipeline's persistent state.
///
/// All table writes are append-only: there is no update or delete. Properties
/// are plain string key/value pairs scoped to the pipeline.
pub trait PipelineStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Properties ────────────────────────────────────────────────────────

  /// Read a property. Returns `None` if it has never been written.
  fn get_property<'a>(
    &'a self,
    key: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  /// Create or overwrite a property.
  fn set_property<'a>(
    &'a self,
    key: &'a str,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  // ── Ingestion sink ────────────────────────────────────────────────────

  /// Append every row of `batch` to `batch.table`. Returns the number of
  /// rows written. Either the whole batch lands or none of it does.
  fn send_tabular(
    &self,
    batch: TabularBatch,
  ) -> impl Future<Output = Result<usize, Self::Error>> + Send + '_;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// COVID rows with `obs_date` strictly after `after`, in insertion order.
  fn covid_cases_after(
    &self,
    after: Watermark,
  ) -> impl Future<Output = Result<Vec<DailyCaseRecord>, Self::Error>> + Send + '_;

  /// Raw reviews with `date` strictly after `after`, ordered by date.
  fn reviews_after(
    &self,
    after: Watermark,
  ) -> impl Future<Output = Result<Vec<RawReview>, Self::Error>> + Send + '_;

  /// Transformed review rows with `date` strictly after `after`.
  fn transformed_reviews_after(
    &self,
    after: Watermark,
  ) -> impl Future<Output = Result<Vec<TransformedReviewRecord>, Self::Error>> + Send + '_;

  /// The whole weekly correlation table, ordered by week.
  fn weekly_correlation(
    &self,
  ) -> impl Future<Output = Result<Vec<WeeklyCorrelationRecord>, Self::Error>> + Send + '_;
}

// ─── Watermark helpers ───────────────────────────────────────────────────────

/// Read the watermark stored under `key`, defaulting to
/// [`Watermark::INITIAL`] on first run.
pub async fn read_watermark<S: PipelineStore>(store: &S, key: &str) -> crate::Result<Watermark> {
  let raw = store.get_property(key).await.map_err(crate::Error::store)?;
  Watermark::from_property(raw.as_deref())
}

/// Persist `watermark` under `key`. Call only after the rows it covers have
/// been written.
pub async fn commit_watermark<S: PipelineStore>(
  store: &S,
  key: &str,
  watermark: Watermark,
) -> crate::Result<()> {
  store
    .set_property(key, watermark.to_string())
    .await
    .map_err(crate::Error::store)
}

/// Send `batch`, mapping a rejection to [`crate::Error::StoreWrite`] with the
/// attempted row count.
pub async fn append<S: PipelineStore>(store: &S, batch: TabularBatch) -> crate::Result<usize> {
  let table = batch.table;
  let rows = batch.len();
  store
    .send_tabular(batch)
    .await
    .map_err(|e| crate::Error::StoreWrite { table, rows, source: Box::new(e) })
}
