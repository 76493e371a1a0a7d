//! SQL schema for the scentwatch SQLite store.
//!
//! Executed once at connection startup. Column order in each data table is
//! fixed; the pipeline's row types emit values in exactly this order.

use scentwatch_core::record::tables;

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Pipeline-scoped key/value bag. Holds the per-dataset watermarks.
CREATE TABLE IF NOT EXISTS properties (
    key   TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- The data tables are strictly append-only.
-- No UPDATE or DELETE is ever issued against them.
CREATE TABLE IF NOT EXISTS covid_cases_usa_daily (
    obs_date        TEXT    NOT NULL,   -- YYYY-MM-DD
    number_of_cases INTEGER NOT NULL    -- cumulative confirmed cases
);

CREATE TABLE IF NOT EXISTS yankee_candle_reviews (
    date   TEXT NOT NULL,
    review TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS yankee_candle_reviews_transformed (
    date                 TEXT    NOT NULL,
    num_negative_reviews INTEGER NOT NULL,
    num_no_scent_reviews INTEGER            -- NULL when no review matched
);

CREATE TABLE IF NOT EXISTS weekly_correlation (
    date                         TEXT    NOT NULL,   -- Monday opening the week
    num_no_scent_reviews         INTEGER NOT NULL,
    number_of_covid_cases_weekly INTEGER NOT NULL,
    correlation_coeff            REAL                -- NULL when undefined
);

CREATE INDEX IF NOT EXISTS covid_date_idx       ON covid_cases_usa_daily(obs_date);
CREATE INDEX IF NOT EXISTS reviews_date_idx     ON yankee_candle_reviews(date);
CREATE INDEX IF NOT EXISTS transformed_date_idx ON yankee_candle_reviews_transformed(date);
CREATE INDEX IF NOT EXISTS weekly_date_idx      ON weekly_correlation(date);

PRAGMA user_version = 1;
";

/// Tables the ingestion sink may append to.
pub const DATA_TABLES: &[&str] = &[
  tables::COVID_DAILY,
  tables::REVIEWS,
  tables::REVIEWS_TRANSFORMED,
  tables::WEEKLY_CORRELATION,
];
