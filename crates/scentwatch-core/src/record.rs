//! Row types for the four pipeline tables, plus the tabular encoding used to
//! hand them to the ingestion sink.
//!
//! Every table is append-only. A row type knows its destination table, its
//! fixed column order and how to render itself as a list of [`Cell`]s; the
//! store backend never needs to know the concrete type.

use chrono::NaiveDate;

use crate::watermark::DATE_FORMAT;

// ─── Table names ─────────────────────────────────────────────────────────────

pub mod tables {
  pub const COVID_DAILY:         &str = "covid_cases_usa_daily";
  pub const REVIEWS:             &str = "yankee_candle_reviews";
  pub const REVIEWS_TRANSFORMED: &str = "yankee_candle_reviews_transformed";
  pub const WEEKLY_CORRELATION:  &str = "weekly_correlation";
}

// ─── Tabular encoding ────────────────────────────────────────────────────────

/// A single value in a row handed to the sink.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
  Null,
  Integer(i64),
  Real(f64),
  Text(String),
}

impl Cell {
  pub fn date(date: NaiveDate) -> Self { Self::Text(date.format(DATE_FORMAT).to_string()) }
}

impl From<Option<i64>> for Cell {
  fn from(v: Option<i64>) -> Self { v.map_or(Self::Null, Self::Integer) }
}

impl From<Option<f64>> for Cell {
  fn from(v: Option<f64>) -> Self { v.map_or(Self::Null, Self::Real) }
}

/// A row that can be appended to a named destination table.
pub trait TabularRow {
  /// Destination table name.
  const TABLE: &'static str;
  /// Column names, in the fixed order [`TabularRow::cells`] produces.
  const COLUMNS: &'static [&'static str];

  /// The date that watermarks gate on.
  fn date(&self) -> NaiveDate;

  fn cells(&self) -> Vec<Cell>;
}

/// A ready-to-send batch: destination table, column names and row values.
#[derive(Debug, Clone)]
pub struct TabularBatch {
  pub table:   &'static str,
  pub columns: &'static [&'static str],
  pub rows:    Vec<Vec<Cell>>,
}

impl TabularBatch {
  pub fn from_rows<R: TabularRow>(rows: &[R]) -> Self {
    Self {
      table:   R::TABLE,
      columns: R::COLUMNS,
      rows:    rows.iter().map(R::cells).collect(),
    }
  }

  pub fn len(&self) -> usize { self.rows.len() }

  pub fn is_empty(&self) -> bool { self.rows.is_empty() }
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One day of the COVID source: cumulative confirmed cases up to `obs_date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyCaseRecord {
  pub obs_date:         NaiveDate,
  pub cumulative_cases: i64,
}

impl TabularRow for DailyCaseRecord {
  const TABLE: &'static str = tables::COVID_DAILY;
  const COLUMNS: &'static [&'static str] = &["obs_date", "number_of_cases"];

  fn date(&self) -> NaiveDate { self.obs_date }

  fn cells(&self) -> Vec<Cell> {
    vec![Cell::date(self.obs_date), Cell::Integer(self.cumulative_cases)]
  }
}

/// A scraped critical review. Several reviews may share a date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReview {
  pub date:        NaiveDate,
  pub review_text: String,
}

impl TabularRow for RawReview {
  const TABLE: &'static str = tables::REVIEWS;
  const COLUMNS: &'static [&'static str] = &["date", "review"];

  fn date(&self) -> NaiveDate { self.date }

  fn cells(&self) -> Vec<Cell> {
    vec![Cell::date(self.date), Cell::Text(self.review_text.clone())]
  }
}

/// Per-day review counts.
///
/// `num_no_scent_reviews` is `None` (not zero) when no review that day
/// mentioned scent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformedReviewRecord {
  pub date:                 NaiveDate,
  pub num_negative_reviews: i64,
  pub num_no_scent_reviews: Option<i64>,
}

impl TabularRow for TransformedReviewRecord {
  const TABLE: &'static str = tables::REVIEWS_TRANSFORMED;
  const COLUMNS: &'static [&'static str] =
    &["date", "num_negative_reviews", "num_no_scent_reviews"];

  fn date(&self) -> NaiveDate { self.date }

  fn cells(&self) -> Vec<Cell> {
    vec![
      Cell::date(self.date),
      Cell::Integer(self.num_negative_reviews),
      self.num_no_scent_reviews.into(),
    ]
  }
}

/// One week of the correlation table.
///
/// `week_start` is a Monday and labels the forward-looking window
/// `week_start..=week_start + 6 days`.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklyCorrelationRecord {
  pub week_start:                   NaiveDate,
  pub num_no_scent_reviews:         i64,
  pub number_of_covid_cases_weekly: i64,
  /// `None` for the first week and whenever the window is degenerate.
  pub correlation_coeff:            Option<f64>,
}

impl TabularRow for WeeklyCorrelationRecord {
  const TABLE: &'static str = tables::WEEKLY_CORRELATION;
  const COLUMNS: &'static [&'static str] = &[
    "date",
    "num_no_scent_reviews",
    "number_of_covid_cases_weekly",
    "correlation_coeff",
  ];

  fn date(&self) -> NaiveDate { self.week_start }

  fn cells(&self) -> Vec<Cell> {
    vec![
      Cell::date(self.week_start),
      Cell::Integer(self.num_no_scent_reviews),
      Cell::Integer(self.number_of_covid_cases_weekly),
      self.correlation_coeff.into(),
    ]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn transformed_null_count_becomes_null_cell() {
    let row = TransformedReviewRecord {
      date:                 NaiveDate::from_ymd_opt(2021, 5, 2).unwrap(),
      num_negative_reviews: 4,
      num_no_scent_reviews: None,
    };
    assert_eq!(
      row.cells(),
      vec![Cell::Text("2021-05-02".into()), Cell::Integer(4), Cell::Null]
    );
  }

  #[test]
  fn batch_carries_table_and_columns() {
    let rows = vec![DailyCaseRecord {
      obs_date:         NaiveDate::from_ymd_opt(2020, 3, 1).unwrap(),
      cumulative_cases: 75,
    }];
    let batch = TabularBatch::from_rows(&rows);
    assert_eq!(batch.table, "covid_cases_usa_daily");
    assert_eq!(batch.columns, &["obs_date", "number_of_cases"]);
    assert_eq!(batch.len(), 1);
  }
}
