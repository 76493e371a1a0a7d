//! Review text transformer: flag "no scent" complaints and count reviews per
//! day.

use std::{collections::BTreeMap, sync::LazyLock};

use regex::Regex;
use tracing::info;

use crate::{
  Result,
  record::{RawReview, TabularBatch, TabularRow, TransformedReviewRecord},
  report::StepReport,
  store::{PipelineStore, append, commit_watermark, read_watermark},
  watermark::Watermark,
};

pub const STEP: &str = "transform-reviews";

/// Substring match, case-insensitive: "fragrance-free" and "smelled" count.
pub const NO_SCENT_PATTERN: &str = "(?i)scent|smell|fragrance";

static NO_SCENT: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(NO_SCENT_PATTERN).expect("no-scent pattern is valid"));

/// `true` when a review mentions scent, smell or fragrance.
pub fn is_no_scent(review_text: &str) -> bool { NO_SCENT.is_match(review_text) }

/// Aggregate the reviews newer than `watermark` into one row per date.
///
/// `num_negative_reviews` counts every review on the date (the scraper only
/// collects critical reviews). `num_no_scent_reviews` counts flagged reviews
/// and is `None` when there are none. Rows come out in ascending date order
/// regardless of input order.
///
/// Returns the rows and the new watermark; the watermark is `None` when
/// there is nothing new, so the caller can leave the stored value alone.
pub fn transform(
  raw_reviews: &[RawReview],
  watermark: Watermark,
) -> (Vec<TransformedReviewRecord>, Option<Watermark>) {
  let mut per_day: BTreeMap<_, (i64, i64)> = BTreeMap::new();

  for review in raw_reviews.iter().filter(|r| watermark.admits(r.date)) {
    let (total, flagged) = per_day.entry(review.date).or_default();
    *total += 1;
    if is_no_scent(&review.review_text) {
      *flagged += 1;
    }
  }

  let records: Vec<_> = per_day
    .into_iter()
    .map(|(date, (total, flagged))| TransformedReviewRecord {
      date,
      num_negative_reviews: total,
      num_no_scent_reviews: (flagged > 0).then_some(flagged),
    })
    .collect();

  let new_watermark = records.last().map(|r| watermark.advance(r.date));
  (records, new_watermark)
}

/// Read new raw reviews from the store, transform them and append the result.
pub async fn run_transform<S: PipelineStore>(store: &S, watermark_key: &str) -> Result<StepReport> {
  let table = TransformedReviewRecord::TABLE;
  let watermark = read_watermark(store, watermark_key).await?;
  info!(step = STEP, %watermark, "starting review transform");

  let raw = store.reviews_after(watermark).await.map_err(crate::Error::store)?;
  let (records, new_watermark) = transform(&raw, watermark);

  let Some(new_watermark) = new_watermark else {
    info!(step = STEP, "No new records to ingest.");
    return Ok(StepReport::skipped(STEP, table, watermark));
  };

  let inserted = append(store, TabularBatch::from_rows(&records)).await?;
  commit_watermark(store, watermark_key, new_watermark).await?;

  info!(
    step = STEP,
    rows = inserted,
    reviews = raw.len(),
    watermark = %new_watermark,
    "Success! {inserted} rows were inserted in {table} table."
  );

  Ok(StepReport {
    step: STEP,
    table,
    rows_inserted: inserted,
    watermark_before: watermark,
    watermark_after: new_watermark,
  })
}
