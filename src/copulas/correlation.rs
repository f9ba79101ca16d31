//! # Correlation
//!
//! $$
//! \tau_b=\frac{n_c-n_d}{\sqrt{(n_0-n_1)(n_0-n_2)}}
//! $$
//!
use std::cmp::Ordering;

use ndarray::Array1;

use super::error::CopulaError;
use super::error::CopulaResult;

/// Kendall's tau-b of two equally long samples.
pub fn kendall_tau(u: &Array1<f64>, v: &Array1<f64>) -> CopulaResult<f64> {
  if u.len() != v.len() {
    return Err(CopulaError::DimensionMismatch {
      u: u.len(),
      v: v.len(),
    });
  }

  if u.len() < 2 {
    return Err(CopulaError::InsufficientData {
      required: 2,
      provided: u.len(),
    });
  }

  let (tau, ..) = kendalls::tau_b_with_comparator(&u.to_vec(), &v.to_vec(), |a, b| {
    a.partial_cmp(b).unwrap_or(Ordering::Greater)
  })
  .map_err(|err| CopulaError::Correlation(err.to_string()))?;

  Ok(tau)
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn tau_b_accounts_for_ties() {
    // 4 concordant, 1 discordant, one pair tied in v
    let u = array![0.1, 0.2, 0.3, 0.4];
    let v = array![0.5, 0.6, 0.5, 0.8];
    let tau = kendall_tau(&u, &v).unwrap();
    assert_abs_diff_eq!(tau, 3.0 / 30f64.sqrt(), epsilon = 1e-12);
  }

  #[test]
  fn perfectly_discordant_is_minus_one() {
    let u = array![0.1, 0.2, 0.3];
    let v = array![0.9, 0.5, 0.2];
    assert_abs_diff_eq!(kendall_tau(&u, &v).unwrap(), -1.0, epsilon = 1e-12);
  }

  #[test]
  fn rejects_short_and_mismatched_input() {
    assert_eq!(
      kendall_tau(&array![0.1], &array![0.2]),
      Err(CopulaError::InsufficientData {
        required: 2,
        provided: 1
      })
    );
    assert_eq!(
      kendall_tau(&array![0.1, 0.2], &array![0.2]),
      Err(CopulaError::DimensionMismatch { u: 2, v: 1 })
    );
  }
}
