//! Plain-text rendering of the weekly correlation table.

use std::fmt::Write as _;

use scentwatch_core::record::WeeklyCorrelationRecord;

fn coeff(c: Option<f64>) -> String { c.map_or_else(|| "-".to_owned(), |c| format!("{c:.3}")) }

/// The current (latest week's) coefficient, then every week newest first.
pub fn render(weeks: &[WeeklyCorrelationRecord]) -> String {
  let mut out = String::new();

  let Some(latest) = weeks.iter().max_by_key(|w| w.week_start) else {
    out.push_str("weekly_correlation is empty; run the pipeline first.\n");
    return out;
  };

  let _ = writeln!(out, "Current correlation coefficient: {}", coeff(latest.correlation_coeff));
  let _ = writeln!(out);
  let _ = writeln!(out, "{:<10}  {:>9}  {:>12}  {:>11}", "week", "no-scent", "covid weekly", "coefficient");

  let mut sorted: Vec<_> = weeks.iter().collect();
  sorted.sort_by(|a, b| b.week_start.cmp(&a.week_start));
  for w in sorted {
    let _ = writeln!(
      out,
      "{:<10}  {:>9}  {:>12}  {:>11}",
      w.week_start.format("%Y-%m-%d"),
      w.num_no_scent_reviews,
      w.number_of_covid_cases_weekly,
      coeff(w.correlation_coeff),
    );
  }
  out
}
