//! [`SqliteStore`]: the SQLite implementation of [`PipelineStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use scentwatch_core::{
  record::{DailyCaseRecord, RawReview, TabularBatch, TransformedReviewRecord, WeeklyCorrelationRecord},
  store::PipelineStore,
  watermark::Watermark,
};
use tracing::debug;

use crate::{
  Error, Result,
  encode::{RawCovid, RawReviewRow, RawTransformed, RawWeekly, encode_cell},
  schema::{DATA_TABLES, SCHEMA},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// The pipeline's tables and properties, backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Number of rows currently in `table`.
  pub async fn count_rows(&self, table: &str) -> Result<usize> {
    let table = known_table(table)?;
    let count: i64 = self
      .conn
      .call(move |conn| Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?))
      .await?;
    Ok(usize::try_from(count).unwrap_or_default())
  }
}

fn known_table(table: &str) -> Result<&'static str> {
  DATA_TABLES
    .iter()
    .copied()
    .find(|t| *t == table)
    .ok_or_else(|| Error::UnknownTable(table.to_owned()))
}

// ─── PipelineStore impl ──────────────────────────────────────────────────────

impl PipelineStore for SqliteStore {
  type Error = Error;

  // ── Properties ────────────────────────────────────────────────────────────

  async fn get_property(&self, key: &str) -> Result<Option<String>> {
    let key = key.to_owned();
    Ok(
      self
        .conn
        .call(move |conn| {
          Ok(
            conn
              .query_row("SELECT value FROM properties WHERE key = ?1", rusqlite::params![key], |r| {
                r.get(0)
              })
              .optional()?,
          )
        })
        .await?,
    )
  }

  async fn set_property(&self, key: &str, value: String) -> Result<()> {
    let key = key.to_owned();
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO properties (key, value) VALUES (?1, ?2)
           ON CONFLICT(key) DO UPDATE SET value = excluded.value",
          rusqlite::params![key, value],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Ingestion sink ────────────────────────────────────────────────────────

  async fn send_tabular(&self, batch: TabularBatch) -> Result<usize> {
    let table = known_table(batch.table)?;
    let width = batch.columns.len();
    if let Some(bad) = batch.rows.iter().find(|r| r.len() != width) {
      return Err(Error::ColumnMismatch { table: table.to_owned(), expected: width, got: bad.len() });
    }

    let placeholders = (1..=width).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ");
    let sql = format!("INSERT INTO {table} ({}) VALUES ({placeholders})", batch.columns.join(", "));
    let rows = batch.rows;

    let written = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut written: usize = 0;
        {
          let mut stmt = tx.prepare(&sql)?;
          for row in rows {
            stmt.execute(rusqlite::params_from_iter(row.into_iter().map(encode_cell)))?;
            written += 1;
          }
        }
        tx.commit()?;
        Ok(written)
      })
      .await?;

    debug!(table, rows = written, "appended batch");
    Ok(written)
  }

  // ── Reads ─────────────────────────────────────────────────────────────────

  async fn covid_cases_after(&self, after: Watermark) -> Result<Vec<DailyCaseRecord>> {
    let after = after.to_string();
    let raws: Vec<RawCovid> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT obs_date, number_of_cases FROM covid_cases_usa_daily
           WHERE obs_date > ?1
           ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![after], |row| {
            Ok(RawCovid { obs_date: row.get(0)?, number_of_cases: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCovid::into_record).collect()
  }

  async fn reviews_after(&self, after: Watermark) -> Result<Vec<RawReview>> {
    let after = after.to_string();
    let raws: Vec<RawReviewRow> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT date, review FROM yankee_candle_reviews
           WHERE date > ?1
           ORDER BY date, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![after], |row| {
            Ok(RawReviewRow { date: row.get(0)?, review: row.get(1)? })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawReviewRow::into_record).collect()
  }

  async fn transformed_reviews_after(&self, after: Watermark) -> Result<Vec<TransformedReviewRecord>> {
    let after = after.to_string();
    let raws: Vec<RawTransformed> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT date, num_negative_reviews, num_no_scent_reviews
           FROM yankee_candle_reviews_transformed
           WHERE date > ?1
           ORDER BY date, rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![after], |row| {
            Ok(RawTransformed {
              date:                 row.get(0)?,
              num_negative_reviews: row.get(1)?,
              num_no_scent_reviews: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTransformed::into_record).collect()
  }

  async fn weekly_correlation(&self) -> Result<Vec<WeeklyCorrelationRecord>> {
    let raws: Vec<RawWeekly> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT date, num_no_scent_reviews, number_of_covid_cases_weekly, correlation_coeff
           FROM weekly_correlation
           ORDER BY date, rowid",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(RawWeekly {
              date:                         row.get(0)?,
              num_no_scent_reviews:         row.get(1)?,
              number_of_covid_cases_weekly: row.get(2)?,
              correlation_coeff:            row.get(3)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawWeekly::into_record).collect()
  }
}
