//! # Empirical
//!
//! $$
//! C_n(u,v)=\frac{1}{n}\sum_{i=1}^n \mathbf 1\{U_i\le u,\,V_i\le v\},\qquad
//! L(z)=\frac{C_n(z,z)}{z^2}
//! $$
//!
use std::cmp::Ordering;

use ndarray::stack;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::ArrayView1;
use ndarray::Axis;
use ndarray::Zip;

use super::error::CopulaError;
use super::error::CopulaResult;

/// Ranks scaled to the open unit interval, `rank / (n + 1)`, ties share their average rank.
pub fn pseudo_observations(x: &Array1<f64>) -> Array1<f64> {
  let n = x.len();
  let mut order: Vec<usize> = (0..n).collect();
  order.sort_by(|&a, &b| x[a].partial_cmp(&x[b]).unwrap_or(Ordering::Equal));

  let mut ranks = Array1::<f64>::zeros(n);
  let mut start = 0;
  while start < n {
    let mut end = start + 1;
    while end < n && x[order[end]] == x[order[start]] {
      end += 1;
    }
    // 1-based ranks start+1..=end share their mean
    let rank = (start + 1 + end) as f64 / 2.0;
    for &i in &order[start..end] {
      ranks[i] = rank;
    }
    start = end;
  }

  ranks / (n + 1) as f64
}

/// Empirical lower and upper tail-dependence statistics on a threshold grid.
///
/// Thresholds whose joint count is zero are dropped, so each statistic stays
/// aligned with its own threshold subset. `z = 0` (lower) and `z = 1` (upper)
/// are dropped as well since the normaliser vanishes there.
#[derive(Debug, Clone, PartialEq)]
pub struct TailProfile {
  pub lower_thresholds: Array1<f64>,
  /// $P(U \le z, V \le z) / z^2$
  pub lower: Array1<f64>,
  pub upper_thresholds: Array1<f64>,
  /// $P(U \ge z, V \ge z) / (1 - z)^2$
  pub upper: Array1<f64>,
}

pub fn tail_profile(u: &Array1<f64>, v: &Array1<f64>, grid_points: usize) -> CopulaResult<TailProfile> {
  if u.len() != v.len() {
    return Err(CopulaError::DimensionMismatch {
      u: u.len(),
      v: v.len(),
    });
  }
  if u.is_empty() {
    return Err(CopulaError::InsufficientData {
      required: 1,
      provided: 0,
    });
  }

  let n = u.len() as f64;
  let base = Array1::linspace(0.0, 1.0, grid_points);
  let (mut z_left, mut left_stat) = (Vec::new(), Vec::new());
  let (mut z_right, mut right_stat) = (Vec::new(), Vec::new());

  for &z in base.iter() {
    let left = Zip::from(u)
      .and(v)
      .fold(0usize, |acc, &a, &b| acc + usize::from(a <= z && b <= z)) as f64
      / n;
    let right = Zip::from(u)
      .and(v)
      .fold(0usize, |acc, &a, &b| acc + usize::from(a >= z && b >= z)) as f64
      / n;

    if left > 0.0 && z > 0.0 {
      z_left.push(z);
      left_stat.push(left / (z * z));
    }
    if right > 0.0 && z < 1.0 {
      z_right.push(z);
      right_stat.push(right / ((1.0 - z) * (1.0 - z)));
    }
  }

  Ok(TailProfile {
    lower_thresholds: Array1::from(z_left),
    lower: Array1::from(left_stat),
    upper_thresholds: Array1::from(z_right),
    upper: Array1::from(right_stat),
  })
}

/// Empirical copula of two raw series, built from their pseudo-observations.
#[derive(Clone, Debug)]
pub struct EmpiricalCopula2D {
  /// The rank-transformed data (N x 2), each row in (0,1)^2
  pub rank_data: Array2<f64>,
}

impl EmpiricalCopula2D {
  pub fn new_from_two_series(x: &Array1<f64>, y: &Array1<f64>) -> CopulaResult<Self> {
    if x.len() != y.len() {
      return Err(CopulaError::DimensionMismatch {
        u: x.len(),
        v: y.len(),
      });
    }

    let rank_data = stack![Axis(1), pseudo_observations(x), pseudo_observations(y)];
    Ok(Self { rank_data })
  }

  pub fn u(&self) -> ArrayView1<'_, f64> {
    self.rank_data.column(0)
  }

  pub fn v(&self) -> ArrayView1<'_, f64> {
    self.rank_data.column(1)
  }

  /// $C_n(u, v)$
  pub fn cdf(&self, u: f64, v: f64) -> f64 {
    let n = self.rank_data.nrows();
    if n == 0 {
      return 0.0;
    }

    let hits = self
      .rank_data
      .rows()
      .into_iter()
      .filter(|row| row[0] <= u && row[1] <= v)
      .count();
    hits as f64 / n as f64
  }

  pub fn tail_profile(&self, grid_points: usize) -> CopulaResult<TailProfile> {
    tail_profile(&self.u().to_owned(), &self.v().to_owned(), grid_points)
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  #[test]
  fn concordant_data_gives_inverse_threshold_profile() {
    let n = 1000;
    let u = Array1::from_iter((0..n).map(|i| (i as f64 + 0.5) / n as f64));
    let profile = tail_profile(&u, &u, 50).unwrap();

    assert_eq!(profile.lower.len(), profile.lower_thresholds.len());
    for (&z, &stat) in profile.lower_thresholds.iter().zip(profile.lower.iter()) {
      assert!(z > 0.0);
      // P(U <= z) is within 1/n of z, so L(z) ~ 1/z
      assert!((stat * z * z - z).abs() <= 1.0 / n as f64 + 1e-12, "z = {z}");
    }
    for (&z, &stat) in profile.upper_thresholds.iter().zip(profile.upper.iter()) {
      let w = 1.0 - z;
      assert!((stat * w * w - w).abs() <= 1.0 / n as f64 + 1e-12, "z = {z}");
    }
  }

  #[test]
  fn empty_joint_counts_are_dropped() {
    let u = array![0.1, 0.2, 0.3, 0.4];
    let v = array![0.2, 0.15, 0.3, 0.5];
    let profile = tail_profile(&u, &v, 50).unwrap();

    // no pair lies jointly below 0.2 or jointly above 0.4
    assert!(profile.lower_thresholds.iter().all(|&z| z >= 0.2));
    assert!(profile.upper_thresholds.iter().all(|&z| z <= 0.4));
    assert_eq!(profile.upper.len(), profile.upper_thresholds.len());
    assert!(profile.lower.iter().chain(profile.upper.iter()).all(|s| s.is_finite()));
  }

  #[test]
  fn pseudo_observations_average_ties() {
    let x = array![3.0, 1.0, 2.0, 2.0];
    let p = pseudo_observations(&x);
    assert_eq!(p, array![4.0, 1.0, 2.5, 2.5] / 5.0);
  }

  #[test]
  fn empirical_copula_counts_joint_exceedances() {
    let x = array![1.0, 2.0, 3.0, 4.0];
    let y = array![10.0, 30.0, 20.0, 40.0];
    let emp = EmpiricalCopula2D::new_from_two_series(&x, &y).unwrap();
    assert_abs_diff_eq!(emp.cdf(0.5, 0.5), 0.25);
    assert_abs_diff_eq!(emp.cdf(0.6, 0.6), 0.75);
    assert_abs_diff_eq!(emp.cdf(1.0, 1.0), 1.0);
  }
}
