//! Encoding and decoding helpers between pipeline types and the plain
//! representations stored in SQLite columns.
//!
//! Dates are stored as `YYYY-MM-DD` text, which sorts and compares correctly
//! as a string; watermark filters rely on that.

use chrono::NaiveDate;
use rusqlite::types::Value;
use scentwatch_core::{
  record::{Cell, DailyCaseRecord, RawReview, TransformedReviewRecord, WeeklyCorrelationRecord},
  watermark::DATE_FORMAT,
};

use crate::{Error, Result};

// ─── Dates ───────────────────────────────────────────────────────────────────

pub fn decode_date(s: &str) -> Result<NaiveDate> {
  // Tolerate a trailing time component, e.g. "2022-02-06T00:00:00".
  let day = s.get(..10).unwrap_or(s);
  NaiveDate::parse_from_str(day, DATE_FORMAT).map_err(|e| Error::DateParse(format!("{s:?}: {e}")))
}

// ─── Cells ───────────────────────────────────────────────────────────────────

pub fn encode_cell(cell: Cell) -> Value {
  match cell {
    Cell::Null => Value::Null,
    Cell::Integer(i) => Value::Integer(i),
    Cell::Real(f) if f.is_nan() => Value::Null,
    Cell::Real(f) => Value::Real(f),
    Cell::Text(s) => Value::Text(s),
  }
}

// ─── Raw rows ────────────────────────────────────────────────────────────────

/// Row as read from `covid_cases_usa_daily`, before date decoding.
pub struct RawCovid {
  pub obs_date:        String,
  pub number_of_cases: i64,
}

impl RawCovid {
  pub fn into_record(self) -> Result<DailyCaseRecord> {
    Ok(DailyCaseRecord {
      obs_date:         decode_date(&self.obs_date)?,
      cumulative_cases: self.number_of_cases,
    })
  }
}

pub struct RawReviewRow {
  pub date:   String,
  pub review: String,
}

impl RawReviewRow {
  pub fn into_record(self) -> Result<RawReview> {
    Ok(RawReview { date: decode_date(&self.date)?, review_text: self.review })
  }
}

pub struct RawTransformed {
  pub date:                 String,
  pub num_negative_reviews: i64,
  pub num_no_scent_reviews: Option<i64>,
}

impl RawTransformed {
  pub fn into_record(self) -> Result<TransformedReviewRecord> {
    Ok(TransformedReviewRecord {
      date:                 decode_date(&self.date)?,
      num_negative_reviews: self.num_negative_reviews,
      num_no_scent_reviews: self.num_no_scent_reviews,
    })
  }
}

pub struct RawWeekly {
  pub date:                         String,
  pub num_no_scent_reviews:         i64,
  pub number_of_covid_cases_weekly: i64,
  pub correlation_coeff:            Option<f64>,
}

impl RawWeekly {
  pub fn into_record(self) -> Result<WeeklyCorrelationRecord> {
    Ok(WeeklyCorrelationRecord {
      week_start:                   decode_date(&self.date)?,
      num_no_scent_reviews:         self.num_no_scent_reviews,
      number_of_covid_cases_weekly: self.number_of_covid_cases_weekly,
      correlation_coeff:            self.correlation_coeff,
    })
  }
}
