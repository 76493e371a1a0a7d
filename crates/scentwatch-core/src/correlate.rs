//! Correlation engine: merge the review and COVID series, turn cumulative
//! case counts into daily counts, bucket into weeks and compute an
//! expanding-window correlation per week.
//!
//! Two behaviours here look like mistakes and are not:
//!
//! - The daily delta looks *ahead*: a day's value is its own cumulative
//!   count minus the next row's, so a rising series yields negative daily
//!   counts, and the last day is 0.
//! - Weeks look *forward*: dates are shifted back 6 days before being
//!   bucketed into Monday-labelled weeks, so the bucket labelled Monday `M`
//!   holds the calendar days `M..=M+6`.
//!
//! Rewriting either into a trailing window changes every stored coefficient.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Days, NaiveDate};
use tracing::info;

use crate::{
  Result,
  record::{DailyCaseRecord, TabularBatch, TabularRow, TransformedReviewRecord, WeeklyCorrelationRecord},
  report::StepReport,
  stats::pearson,
  store::{PipelineStore, append, commit_watermark, read_watermark},
};

pub const STEP: &str = "correlate";

/// Days subtracted from each date before weekly bucketing.
pub const WEEK_SHIFT_DAYS: u64 = 6;

// ─── Merge & delta ───────────────────────────────────────────────────────────

/// One row of the merged daily series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergedDay {
  pub date:                 NaiveDate,
  pub num_no_scent_reviews: i64,
  pub cumulative_cases:     i64,
  pub daily_cases:          i64,
}

/// Right-join `reviews` onto `covid` by date and compute daily case deltas.
///
/// Every COVID date is kept; a date with no review row gets a no-scent count
/// of 0, as does a review row whose count is null. If a date has several
/// review rows the COVID row is repeated once per match.
///
/// COVID rows are ordered by date (stably) before the delta is taken:
/// `daily[i] = cumulative[i] - cumulative[i + 1]`, and the final row, having
/// no successor, gets 0.
pub fn merge(reviews: &[TransformedReviewRecord], covid: &[DailyCaseRecord]) -> Vec<MergedDay> {
  let mut by_date: HashMap<NaiveDate, Vec<i64>> = HashMap::new();
  for r in reviews {
    by_date
      .entry(r.date)
      .or_default()
      .push(r.num_no_scent_reviews.unwrap_or(0));
  }

  let mut covid: Vec<&DailyCaseRecord> = covid.iter().collect();
  covid.sort_by_key(|c| c.obs_date);

  let mut merged = Vec::with_capacity(covid.len());
  for c in covid {
    let counts = by_date.get(&c.obs_date).map(Vec::as_slice).unwrap_or(&[0]);
    for &n in counts {
      merged.push(MergedDay {
        date:                 c.obs_date,
        num_no_scent_reviews: n,
        cumulative_cases:     c.cumulative_cases,
        daily_cases:          0,
      });
    }
  }

  for i in 0..merged.len().saturating_sub(1) {
    merged[i].daily_cases = merged[i].cumulative_cases - merged[i + 1].cumulative_cases;
  }

  merged
}

// ─── Weekly resample ─────────────────────────────────────────────────────────

/// Label of the weekly bucket that `date` falls in.
///
/// The date is shifted back [`WEEK_SHIFT_DAYS`] days and rounded up to the
/// next Monday (or kept, if it already is one). Net effect: the Monday that
/// starts `date`'s own Monday-to-Sunday week.
pub fn week_label(date: NaiveDate) -> NaiveDate {
  let effective = date - Days::new(WEEK_SHIFT_DAYS);
  let to_monday = (7 - effective.weekday().num_days_from_monday()) % 7;
  effective + Days::new(u64::from(to_monday))
}

/// Bucket the merged series into weeks and attach an expanding correlation.
///
/// Output is sorted by week and contiguous: weeks inside the range with no
/// data appear with zero sums. `correlation_coeff[i]` is the Pearson
/// coefficient of rows `0..i` (exclusive of row `i`); it is `None` for
/// `i == 0`, for `i == 1` (a single point) and whenever a column is constant
/// over the window.
pub fn weekly_correlate(merged: &[MergedDay]) -> Vec<WeeklyCorrelationRecord> {
  let mut buckets: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
  for day in merged {
    let (scent, cases) = buckets.entry(week_label(day.date)).or_default();
    *scent += day.num_no_scent_reviews;
    *cases += day.daily_cases;
  }

  let (Some(&first), Some(&last)) = (buckets.keys().next(), buckets.keys().next_back()) else {
    return Vec::new();
  };

  let mut weeks = Vec::new();
  let mut week = first;
  while week <= last {
    let (scent, cases) = buckets.get(&week).copied().unwrap_or_default();
    weeks.push((week, scent, cases));
    week = week + Days::new(7);
  }

  let scent: Vec<f64> = weeks.iter().map(|w| w.1 as f64).collect();
  let cases: Vec<f64> = weeks.iter().map(|w| w.2 as f64).collect();

  weeks
    .iter()
    .enumerate()
    .map(|(i, &(week_start, num_no_scent_reviews, number_of_covid_cases_weekly))| {
      WeeklyCorrelationRecord {
        week_start,
        num_no_scent_reviews,
        number_of_covid_cases_weekly,
        correlation_coeff: pearson(&scent[..i], &cases[..i]),
      }
    })
    .collect()
}

// ─── Step ────────────────────────────────────────────────────────────────────

/// Recompute the weekly correlation table over everything newer than the
/// watermark and append it.
///
/// The watermark then moves to the newest COVID date read, whether or not
/// that produced rows. With no new COVID rows there is nothing to move to,
/// and the stored value is left as is.
pub async fn run_correlation<S: PipelineStore>(store: &S, watermark_key: &str) -> Result<StepReport> {
  let table = WeeklyCorrelationRecord::TABLE;
  let watermark = read_watermark(store, watermark_key).await?;
  info!(step = STEP, %watermark, "starting weekly correlation");

  let reviews = store
    .transformed_reviews_after(watermark)
    .await
    .map_err(crate::Error::store)?;
  let covid = store.covid_cases_after(watermark).await.map_err(crate::Error::store)?;

  let Some(newest_covid) = covid.iter().map(|c| c.obs_date).max() else {
    info!(step = STEP, reviews = reviews.len(), "No new COVID records; nothing to correlate.");
    return Ok(StepReport::skipped(STEP, table, watermark));
  };

  let merged = merge(&reviews, &covid);
  let weekly = weekly_correlate(&merged);

  let inserted = if weekly.is_empty() {
    0
  } else {
    append(store, TabularBatch::from_rows(&weekly)).await?
  };

  let advanced = watermark.advance(newest_covid);
  commit_watermark(store, watermark_key, advanced).await?;

  info!(
    step = STEP,
    rows = inserted,
    days = merged.len(),
    watermark = %advanced,
    "Success! {inserted} rows were inserted."
  );

  Ok(StepReport {
    step: STEP,
    table,
    rows_inserted: inserted,
    watermark_before: watermark,
    watermark_after: advanced,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap() }

  fn covid(d: &str, n: i64) -> DailyCaseRecord {
    DailyCaseRecord { obs_date: date(d), cumulative_cases: n }
  }

  fn reviews(d: &str, scent: Option<i64>) -> TransformedReviewRecord {
    TransformedReviewRecord { date: date(d), num_negative_reviews: 1, num_no_scent_reviews: scent }
  }

  fn day(d: &str, scent: i64, daily: i64) -> MergedDay {
    MergedDay { date: date(d), num_no_scent_reviews: scent, cumulative_cases: 0, daily_cases: daily }
  }

  // ── merge ──

  #[test]
  fn delta_looks_ahead_and_last_day_is_zero() {
    let merged = merge(&[], &[covid("2021-01-01", 100), covid("2021-01-02", 150), covid("2021-01-03", 150)]);
    let deltas: Vec<_> = merged.iter().map(|m| m.daily_cases).collect();
    assert_eq!(deltas, vec![-50, 0, 0]);
  }

  #[test]
  fn delta_is_taken_in_date_order_not_source_order() {
    let merged = merge(&[], &[covid("2021-01-03", 175), covid("2021-01-01", 100), covid("2021-01-02", 150)]);
    let pairs: Vec<_> = merged.iter().map(|m| (m.date, m.daily_cases)).collect();
    assert_eq!(pairs, vec![(date("2021-01-01"), -50), (date("2021-01-02"), -25), (date("2021-01-03"), 0)]);
  }

  #[test]
  fn right_join_keeps_every_covid_date_and_fills_zero() {
    let merged = merge(
      &[reviews("2021-01-02", Some(3)), reviews("2021-01-03", None), reviews("2021-01-09", Some(7))],
      &[covid("2021-01-01", 10), covid("2021-01-02", 20), covid("2021-01-03", 30)],
    );
    let scent: Vec<_> = merged.iter().map(|m| m.num_no_scent_reviews).collect();
    assert_eq!(scent, vec![0, 3, 0]);
    assert_eq!(merged.len(), 3, "review-only dates are dropped");
  }

  #[test]
  fn empty_covid_means_empty_merge() {
    assert!(merge(&[reviews("2021-01-02", Some(3))], &[]).is_empty());
  }

  // ── week labels ──

  #[test]
  fn monday_record_opens_its_own_week() {
    let monday = date("2021-01-04");
    assert_eq!(monday - Days::new(WEEK_SHIFT_DAYS), date("2020-12-29"));
    assert_eq!(week_label(monday), monday);
  }

  #[test]
  fn bucket_spans_monday_through_sunday_forward() {
    for d in ["2021-01-04", "2021-01-05", "2021-01-07", "2021-01-10"] {
      assert_eq!(week_label(date(d)), date("2021-01-04"), "{d}");
    }
    assert_eq!(week_label(date("2021-01-03")), date("2020-12-28"));
    assert_eq!(week_label(date("2021-01-11")), date("2021-01-11"));
  }

  // ── weekly correlate ──

  #[test]
  fn sums_per_week_and_fills_gaps() {
    let merged = vec![
      day("2021-01-04", 1, 10),
      day("2021-01-10", 2, 20),
      day("2021-01-18", 4, 40),
    ];
    let weekly = weekly_correlate(&merged);
    let rows: Vec<_> = weekly
      .iter()
      .map(|w| (w.week_start, w.num_no_scent_reviews, w.number_of_covid_cases_weekly))
      .collect();
    assert_eq!(rows, vec![
      (date("2021-01-04"), 3, 30),
      (date("2021-01-11"), 0, 0),
      (date("2021-01-18"), 4, 40),
    ]);
  }

  #[test]
  fn expanding_correlation_excludes_current_row() {
    let merged = vec![
      day("2021-01-04", 1, 2),
      day("2021-01-11", 2, 1),
      day("2021-01-18", 3, 4),
      day("2021-01-25", 4, 3),
    ];
    let weekly = weekly_correlate(&merged);
    assert_eq!(weekly.len(), 4);
    assert_eq!(weekly[0].correlation_coeff, None);
    assert_eq!(weekly[1].correlation_coeff, None, "a single point has no correlation");
    assert_eq!(weekly[2].correlation_coeff, pearson(&[1.0, 2.0], &[2.0, 1.0]));
    assert_eq!(weekly[3].correlation_coeff, pearson(&[1.0, 2.0, 3.0], &[2.0, 1.0, 4.0]));
    let r3 = weekly[3].correlation_coeff.unwrap();
    assert!((r3 - 0.654_653_670_707_977_1).abs() < 1e-9, "got {r3}");
  }

  #[test]
  fn empty_input_produces_no_weeks() {
    assert!(weekly_correlate(&[]).is_empty());
  }
}
