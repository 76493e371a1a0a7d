//! Pearson correlation.

/// Pearson correlation coefficient of two equal-length samples.
///
/// Returns `None` when it is undefined: fewer than two points, mismatched
/// lengths, or zero variance in either sample.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
  let n = xs.len();
  if n < 2 || n != ys.len() {
    return None;
  }

  let n_f = n as f64;
  let mean_x = xs.iter().sum::<f64>() / n_f;
  let mean_y = ys.iter().sum::<f64>() / n_f;

  let (mut cov, mut var_x, mut var_y) = (0.0, 0.0, 0.0);
  for (x, y) in xs.iter().zip(ys) {
    let dx = x - mean_x;
    let dy = y - mean_y;
    cov += dx * dy;
    var_x += dx * dx;
    var_y += dy * dy;
  }

  if var_x == 0.0 || var_y == 0.0 {
    return None;
  }

  // Clamp away rounding noise just outside [-1, 1].
  Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}
