//! Client for the COVID-19 case history API.
//!
//! The endpoint answers with cumulative confirmed cases per day for one
//! country:
//!
//! ```json
//! { "All": { "country": "US", "dates": { "2022-02-14": 77890000, ... } } }
//! ```

use std::collections::BTreeMap;

use chrono::NaiveDate;
use scentwatch_core::{record::DailyCaseRecord, source::Source, watermark::{DATE_FORMAT, Watermark}};
use serde::Deserialize;
use tracing::debug;

use crate::{Error, HttpConfig, Result};

pub const DEFAULT_URL: &str = "https://covid-api.mmediagroup.fr/v1/history?country=US&status=confirmed";

#[derive(Deserialize)]
struct HistoryResponse {
  #[serde(rename = "All")]
  all: HistoryBody,
}

#[derive(Deserialize)]
struct HistoryBody {
  dates: BTreeMap<String, i64>,
}

/// Parse a history response body into daily records, in the order the
/// response map yields them.
pub fn parse_history(body: &str) -> Result<Vec<DailyCaseRecord>> {
  let response: HistoryResponse = serde_json::from_str(body)?;
  response
    .all
    .dates
    .into_iter()
    .map(|(date, cases)| {
      let obs_date = NaiveDate::parse_from_str(&date, DATE_FORMAT)
        .map_err(|e| Error::Parse(format!("history date {date:?}: {e}")))?;
      Ok(DailyCaseRecord { obs_date, cumulative_cases: cases })
    })
    .collect()
}

/// Fetches the full case history on every call; the loader filters it
/// against the watermark.
#[derive(Clone)]
pub struct CovidApiClient {
  client: reqwest::Client,
  url:    String,
}

impl CovidApiClient {
  pub fn new(url: impl Into<String>, http: &HttpConfig) -> Result<Self> {
    Ok(Self { client: http.client()?, url: url.into() })
  }

  pub async fn fetch_history(&self) -> Result<Vec<DailyCaseRecord>> {
    let body = self
      .client
      .get(&self.url)
      .send()
      .await?
      .error_for_status()?
      .text()
      .await?;
    let records = parse_history(&body)?;
    debug!(url = %self.url, days = records.len(), "fetched covid history");
    Ok(records)
  }
}

impl Source for CovidApiClient {
  type Row = DailyCaseRecord;

  fn name(&self) -> &'static str { "ingest-covid" }

  async fn fetch(&self, _watermark: Watermark) -> scentwatch_core::Result<Vec<DailyCaseRecord>> {
    Ok(self.fetch_history().await?)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_history_payload() {
    let body = r#"{
      "All": {
        "country": "US",
        "population": 324459463,
        "dates": { "2020-01-23": 1, "2020-01-22": 1, "2020-01-24": 2 }
      }
    }"#;
    let records = parse_history(body).unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2], DailyCaseRecord {
      obs_date:         NaiveDate::from_ymd_opt(2020, 1, 24).unwrap(),
      cumulative_cases: 2,
    });
  }

  #[test]
  fn missing_dates_is_a_json_error() {
    let err = parse_history(r#"{"All": {"country": "US"}}"#).unwrap_err();
    assert!(matches!(err, Error::Json(_)));
    let core: scentwatch_core::Error = err.into();
    assert!(matches!(core, scentwatch_core::Error::Parse(_)));
  }

  #[test]
  fn bad_date_key_is_a_parse_error() {
    let err = parse_history(r#"{"All": {"dates": {"Jan 22": 1}}}"#).unwrap_err();
    assert!(matches!(err, Error::Parse(_)));
  }
}
