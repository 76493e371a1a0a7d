//! The incremental loader: fetch what is newer than the watermark, append it,
//! then advance the watermark.
//!
//! The commit boundary is explicit and two-phase: rows are written first, the
//! watermark second. A failure between the two leaves the watermark stale,
//! which only means the next run re-fetches; it never skips data.

use tracing::info;

use crate::{
  Result,
  record::{TabularBatch, TabularRow},
  report::StepReport,
  source::Source,
  store::{PipelineStore, append, commit_watermark, read_watermark},
  watermark::Watermark,
};

/// Keep only rows strictly newer than `watermark`, preserving source order.
pub fn filter_new<R: TabularRow>(rows: Vec<R>, watermark: Watermark) -> Vec<R> {
  rows.into_iter().filter(|r| watermark.admits(r.date())).collect()
}

/// Run one incremental load of `source` into its destination table, gated by
/// the watermark stored under `watermark_key`.
///
/// An empty result performs no write and leaves the watermark untouched.
pub async fn run_incremental_load<S, Src>(
  store: &S,
  source: &Src,
  watermark_key: &str,
) -> Result<StepReport>
where
  S: PipelineStore,
  Src: Source,
{
  let step = source.name();
  let table = <Src::Row as TabularRow>::TABLE;
  let watermark = read_watermark(store, watermark_key).await?;
  info!(step, %watermark, "starting incremental load");

  let fetched = source.fetch(watermark).await?;
  let fetched_count = fetched.len();
  let rows = filter_new(fetched, watermark);

  let Some(newest) = rows.iter().map(|r| r.date()).max() else {
    info!(step, fetched = fetched_count, "No new records to ingest.");
    return Ok(StepReport::skipped(step, table, watermark));
  };

  let inserted = append(store, TabularBatch::from_rows(&rows)).await?;

  let advanced = watermark.advance(newest);
  commit_watermark(store, watermark_key, advanced).await?;

  info!(
    step,
    rows = inserted,
    watermark = %advanced,
    "Success! {inserted} rows were inserted in table {table}."
  );

  Ok(StepReport {
    step,
    table,
    rows_inserted: inserted,
    watermark_before: watermark,
    watermark_after: advanced,
  })
}
