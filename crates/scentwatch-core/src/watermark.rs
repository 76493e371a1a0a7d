//! Watermarks: the per-dataset "last processed date" cursor.
//!
//! A watermark is persisted as a `YYYY-MM-DD` string in the pipeline's
//! property bag. Every step reads its watermark at start, only looks at rows
//! strictly newer than it, and writes it back after a successful append.

use std::{fmt, str::FromStr};

use chrono::NaiveDate;

use crate::{Error, Result};

/// Storage format for watermark values and every date column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Property keys used by the default pipeline wiring.
pub mod keys {
  pub const COVID:       &str = "last_date_covid";
  pub const REVIEWS:     &str = "last_date_reviews";
  pub const TRANSFORM:   &str = "last_date_amazon_transformed";
  pub const CORRELATION: &str = "last_date";
}

/// The latest successfully processed date for one dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Watermark(NaiveDate);

impl Watermark {
  /// Value used when a dataset has never been processed: `2020-01-01`.
  pub const INITIAL: Watermark = match NaiveDate::from_ymd_opt(2020, 1, 1) {
    Some(d) => Watermark(d),
    None => unreachable!(),
  };

  pub fn new(date: NaiveDate) -> Self { Self(date) }

  pub fn date(self) -> NaiveDate { self.0 }

  /// Parse a stored property value, falling back to [`Watermark::INITIAL`]
  /// when the property has never been written.
  pub fn from_property(value: Option<&str>) -> Result<Self> {
    value.map_or(Ok(Self::INITIAL), str::parse)
  }

  /// `true` when `date` is strictly newer than this watermark.
  pub fn admits(self, date: NaiveDate) -> bool { date > self.0 }

  /// Move forward to `candidate`; never moves backwards.
  #[must_use]
  pub fn advance(self, candidate: NaiveDate) -> Self { Self(self.0.max(candidate)) }
}

impl Default for Watermark {
  fn default() -> Self { Self::INITIAL }
}

impl fmt::Display for Watermark {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.format(DATE_FORMAT))
  }
}

impl FromStr for Watermark {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
      .map(Self)
      .map_err(|_| Error::InvalidWatermark(s.to_owned()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn date(s: &str) -> NaiveDate { NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap() }

  #[test]
  fn missing_property_starts_at_2020() {
    let wm = Watermark::from_property(None).unwrap();
    assert_eq!(wm.to_string(), "2020-01-01");
  }

  #[test]
  fn stored_property_round_trips() {
    let wm = Watermark::from_property(Some("2021-03-14")).unwrap();
    assert_eq!(wm.date(), date("2021-03-14"));
    assert_eq!(wm.to_string(), "2021-03-14");
  }

  #[test]
  fn garbage_property_is_rejected() {
    let err = Watermark::from_property(Some("yesterday")).unwrap_err();
    assert!(matches!(err, Error::InvalidWatermark(v) if v == "yesterday"));
  }

  #[test]
  fn admits_is_strict() {
    let wm = Watermark::new(date("2021-01-10"));
    assert!(!wm.admits(date("2021-01-09")));
    assert!(!wm.admits(date("2021-01-10")));
    assert!(wm.admits(date("2021-01-11")));
  }

  #[test]
  fn advance_never_moves_backwards() {
    let wm = Watermark::new(date("2021-01-10"));
    assert_eq!(wm.advance(date("2021-01-05")), wm);
    assert_eq!(wm.advance(date("2021-02-01")).date(), date("2021-02-01"));
  }
}
