//! Outcome of a single pipeline step.

use std::fmt;

use crate::watermark::Watermark;

/// What a step did: where it wrote, how much, and how its watermark moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
  pub step:             &'static str,
  pub table:            &'static str,
  pub rows_inserted:    usize,
  pub watermark_before: Watermark,
  pub watermark_after:  Watermark,
}

impl StepReport {
  /// A step that found nothing newer than its watermark.
  pub fn skipped(step: &'static str, table: &'static str, watermark: Watermark) -> Self {
    Self {
      step,
      table,
      rows_inserted: 0,
      watermark_before: watermark,
      watermark_after: watermark,
    }
  }

  pub fn advanced(&self) -> bool { self.watermark_after > self.watermark_before }
}

impl fmt::Display for StepReport {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}: {} rows were inserted in table {} (watermark {} -> {})",
      self.step, self.rows_inserted, self.table, self.watermark_before, self.watermark_after
    )
  }
}
