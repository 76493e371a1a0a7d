//! Tolerant extraction of reviews from a product review page.
//!
//! A page carries two parallel lists: review bodies in
//! `<div class="a-row a-spacing-small review-data">` blocks and date strings
//! such as "Reviewed in the United States on February 14, 2022" in
//! `<span class="… review-date">` elements. The page header repeats two
//! "top review" dates before the list proper; those are dropped.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use scentwatch_core::record::RawReview;
use tracing::warn;

use crate::{Error, Result};

/// Dates shown in the page header ahead of the review list.
const HEADER_DATES: usize = 2;

/// Placeholder text left behind by media-only reviews.
const MEDIA_PLACEHOLDER: &str = "The media could not be loaded.";

static REVIEW_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?is)<div[^>]*class="a-row a-spacing-small review-data"[^>]*>(.*?)</div>"#)
    .expect("review block pattern is valid")
});

static DATE_SPAN: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r#"(?is)<span[^>]*class="[^"]*\breview-date\b[^"]*"[^>]*>(.*?)</span>"#)
    .expect("review date pattern is valid")
});

static TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("tag pattern is valid"));

static MONTH_DAY_YEAR: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"([A-Za-z]+)\s+(\d{1,2}),\s*(\d{4})").expect("date pattern is valid")
});

/// Strip tags, decode the common entities and collapse whitespace.
pub fn text_content(fragment: &str) -> String {
  let stripped = TAG.replace_all(fragment, " ");
  let decoded = stripped
    .replace("&nbsp;", " ")
    .replace("&quot;", "\"")
    .replace("&#39;", "'")
    .replace("&apos;", "'")
    .replace("&lt;", "<")
    .replace("&gt;", ">")
    .replace("&amp;", "&");
  decoded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Pull the calendar date out of free text like
/// "Reviewed in the United States on February 14, 2022".
pub fn parse_review_date(text: &str) -> Result<NaiveDate> {
  let caps = MONTH_DAY_YEAR
    .captures(text)
    .ok_or_else(|| Error::Parse(format!("no date in {text:?}")))?;
  let normalised = format!("{} {} {}", &caps[1], &caps[2], &caps[3]);
  NaiveDate::parse_from_str(&normalised, "%B %d %Y")
    .or_else(|_| NaiveDate::parse_from_str(&normalised, "%b %d %Y"))
    .map_err(|e| Error::Parse(format!("review date {text:?}: {e}")))
}

/// Review bodies on the page, in page order, minus empty and media-only
/// entries.
pub fn extract_review_texts(html: &str) -> Vec<String> {
  REVIEW_BLOCK
    .captures_iter(html)
    .map(|c| text_content(&c[1]))
    .filter(|t| !t.is_empty() && t != MEDIA_PLACEHOLDER)
    .collect()
}

/// Review date strings on the page, header dates excluded.
pub fn extract_review_dates(html: &str) -> Vec<String> {
  DATE_SPAN
    .captures_iter(html)
    .map(|c| text_content(&c[1]))
    .skip(HEADER_DATES)
    .filter(|t| !t.is_empty())
    .collect()
}

/// Pair a page's dates with its reviews.
///
/// When there are more dates than review bodies (photo-only reviews), the
/// surplus trailing dates are dropped. A date string that does not parse is
/// a parse error.
pub fn parse_review_page(html: &str) -> Result<Vec<RawReview>> {
  let texts = extract_review_texts(html);
  let dates = extract_review_dates(html);

  if texts.len() > dates.len() {
    warn!(reviews = texts.len(), dates = dates.len(), "page has reviews without dates");
  }

  dates
    .iter()
    .zip(texts)
    .map(|(date, review_text)| Ok(RawReview { date: parse_review_date(date)?, review_text }))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;

  fn page(dates: &[&str], reviews: &[&str]) -> String {
    let mut html = String::from("<html><body>");
    for d in dates {
      html.push_str(&format!(r#"<span data-hook="review-date" class="a-size-base a-color-secondary review-date">{d}</span>"#));
    }
    for r in reviews {
      html.push_str(&format!(
        r#"<div class="a-row a-spacing-small review-data"><span data-hook="review-body" class="a-size-base review-text"><span>{r}</span></span></div>"#
      ));
    }
    html.push_str("</body></html>");
    html
  }

  fn date(y: i32, m: u32, d: u32) -> NaiveDate { NaiveDate::from_ymd_opt(y, m, d).unwrap() }

  #[test]
  fn parses_reviewed_on_text() {
    assert_eq!(
      parse_review_date("Reviewed in the United States on February 14, 2022").unwrap(),
      date(2022, 2, 14)
    );
    assert_eq!(parse_review_date("Reviewed on Dec 3, 2021").unwrap(), date(2021, 12, 3));
    assert!(parse_review_date("Reviewed recently").is_err());
  }

  #[test]
  fn text_content_strips_markup() {
    assert_eq!(
      text_content("<span>\n  No smell &amp; the jar   cracked&#39;\n</span>"),
      "No smell & the jar cracked'"
    );
  }

  #[test]
  fn header_dates_are_skipped_and_pairs_line_up() {
    let html = page(
      &[
        "Reviewed in the United States on March 1, 2022",
        "Reviewed in the United States on January 5, 2021",
        "Reviewed in the United States on February 14, 2022",
        "Reviewed in the United States on February 10, 2022",
      ],
      &["Smells like nothing", "Arrived broken"],
    );
    let reviews = parse_review_page(&html).unwrap();
    assert_eq!(reviews, vec![
      RawReview { date: date(2022, 2, 14), review_text: "Smells like nothing".into() },
      RawReview { date: date(2022, 2, 10), review_text: "Arrived broken".into() },
    ]);
  }

  #[test]
  fn media_only_reviews_drop_surplus_dates() {
    let html = page(
      &["h1 on May 1, 2022", "h2 on May 1, 2022", "on April 3, 2022", "on April 2, 2022", "on April 1, 2022"],
      &["no scent", "The media could not be loaded.", "  "],
    );
    let reviews = parse_review_page(&html).unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].date, date(2022, 4, 3));
  }

  #[test]
  fn empty_header_date_still_counts_towards_the_skip() {
    let html = page(
      &["", "Reviewed on May 2, 2022", "Reviewed on April 30, 2022", "  ", "Reviewed on April 29, 2022"],
      &["no scent", "cracked"],
    );
    assert_eq!(extract_review_dates(&html), vec!["Reviewed on April 30, 2022", "Reviewed on April 29, 2022"]);
    let reviews = parse_review_page(&html).unwrap();
    assert_eq!(reviews[0].date, date(2022, 4, 30));
    assert_eq!(reviews[1].date, date(2022, 4, 29));
  }

  #[test]
  fn page_without_reviews_is_empty() {
    assert!(parse_review_page("<html><body>Sorry, no reviews</body></html>").unwrap().is_empty());
  }
}
