//! # Selection
//!
//! $$
//! \mathrm{cost}_k=\sum_z\left(L(z)-\frac{C_k(z,z)}{z^2}\right)^2
//! +\sum_z\left(R(z)-\frac{1-2z+C_k(z,z)}{(1-z)^2}\right)^2
//! $$
//!
use impl_new_derive::ImplNew;
use ndarray::Array1;

use super::bivariate::Copula;
use super::bivariate::CopulaType;
use super::bivariate::TAIL_GRID_POINTS;
use super::empirical::tail_profile;
use super::empirical::TailProfile;
use super::error::CopulaError;
use super::error::CopulaResult;

/// Families compared by the selector, in index order.
pub const CANDIDATES: [CopulaType; 3] = [CopulaType::Clayton, CopulaType::Frank, CopulaType::Gumbel];

const FRANK_INDEX: usize = 1;

/// Direction of the tail-profile cost comparison.
///
/// `Largest` is the default, which reproduces the published selection rule: it
/// picks the family whose profile deviates the *most* from the empirical one.
/// `Smallest` is the usual best-fit reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CostCriterion {
  #[default]
  Largest,
  Smallest,
}

impl CostCriterion {
  /// Index of the winning cost; ties go to the earliest candidate.
  ///
  /// Returns `None` for an empty slice or when any cost is NaN or infinite.
  pub fn pick(self, costs: &[f64]) -> Option<usize> {
    if costs.is_empty() || costs.iter().any(|c| !c.is_finite()) {
      return None;
    }

    let mut best = 0;
    for (i, &cost) in costs.iter().enumerate().skip(1) {
      let better = match self {
        CostCriterion::Largest => cost > costs[best],
        CostCriterion::Smallest => cost < costs[best],
      };
      if better {
        best = i;
      }
    }
    Some(best)
  }
}

#[derive(ImplNew, Debug, Clone, Copy)]
pub struct SelectionConfig {
  /// Number of evenly spaced thresholds in [0, 1].
  pub grid_points: usize,
  pub criterion: CostCriterion,
}

impl Default for SelectionConfig {
  fn default() -> Self {
    Self {
      grid_points: TAIL_GRID_POINTS,
      criterion: CostCriterion::default(),
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectionResult {
  pub r#type: CopulaType,
  /// Position of `r#type` in [`CANDIDATES`].
  pub index: usize,
  pub theta: f64,
  /// Combined lower + upper cost per candidate, empty when the tau guard fired.
  pub costs: Vec<f64>,
}

fn squared_deviation(empirical: &Array1<f64>, model: &Array1<f64>) -> f64 {
  (empirical - model).mapv(|d| d * d).sum()
}

/// Lower and upper tail costs of one fitted family against the empirical profile.
fn tail_costs(copula: &Copula, profile: &TailProfile) -> CopulaResult<(f64, f64)> {
  let zl = &profile.lower_thresholds;
  let lower_model = copula.fitted_cdf(zl, zl)? / zl.powi(2);

  let zr = &profile.upper_thresholds;
  let c = copula.fitted_cdf(zr, zr)?;
  let upper_model = (1.0 - 2.0 * zr + &c) / (1.0 - zr).powi(2);

  Ok((
    squared_deviation(&profile.lower, &lower_model),
    squared_deviation(&profile.upper, &upper_model),
  ))
}

pub fn select_copula(u: &Array1<f64>, v: &Array1<f64>) -> CopulaResult<SelectionResult> {
  select_copula_with(u, v, &SelectionConfig::default())
}

pub fn select_copula_with(
  u: &Array1<f64>,
  v: &Array1<f64>,
  config: &SelectionConfig,
) -> CopulaResult<SelectionResult> {
  let fitted = CANDIDATES
    .iter()
    .map(|&r#type| Copula::new(u.clone(), v.clone(), r#type))
    .collect::<CopulaResult<Vec<_>>>()?;

  // every candidate was built with a family, so theta is always present
  let thetas: Vec<f64> = fitted.iter().map(|c| c.theta().unwrap_or(f64::NAN)).collect();

  let tau = fitted[0].tau();
  if tau <= 0.0 {
    tracing::warn!(tau, "no positive dependence, falling back to frank");
    return Ok(SelectionResult {
      r#type: CopulaType::Frank,
      index: FRANK_INDEX,
      theta: thetas[FRANK_INDEX],
      costs: Vec::new(),
    });
  }

  let profile = tail_profile(u, v, config.grid_points)?;
  let mut costs = Vec::with_capacity(CANDIDATES.len());
  for copula in &fitted {
    let (lower, upper) = tail_costs(copula, &profile)?;
    tracing::debug!(family = %copula.r#type(), lower, upper, "tail profile cost");
    let cost = lower + upper;
    if !cost.is_finite() {
      return Err(CopulaError::NonFiniteCost {
        family: copula.r#type(),
        cost,
      });
    }
    costs.push(cost);
  }

  let index = config
    .criterion
    .pick(&costs)
    .ok_or_else(|| CopulaError::Optimizer("no finite tail-profile cost to compare".into()))?;
  tracing::debug!(family = %CANDIDATES[index], criterion = ?config.criterion, "copula selected");

  Ok(SelectionResult {
    r#type: CANDIDATES[index],
    index,
    theta: thetas[index],
    costs,
  })
}

#[cfg(test)]
mod tests {
  use ndarray::array;
  use rand::rngs::StdRng;
  use rand::SeedableRng;
  use tracing_test::traced_test;

  use super::*;
  use crate::copulas::bivariate::cdf;
  use crate::copulas::bivariate::TAU_SENTINEL;
  use crate::copulas::samples::sample;

  #[test]
  fn picks_a_valid_family_for_small_sample() {
    let u = array![0.1, 0.2, 0.3, 0.4];
    let v = array![0.2, 0.15, 0.3, 0.5];
    let res = select_copula(&u, &v).unwrap();

    assert!(CANDIDATES.contains(&res.r#type));
    assert_eq!(CANDIDATES[res.index], res.r#type);
    assert!(res.theta.is_finite());
    res
      .r#type
      .with_family(|family| family.check_theta(res.theta))
      .unwrap();

    assert_eq!(res.costs.len(), 3);
    assert!(res.costs.iter().all(|c| *c <= res.costs[res.index]));
  }

  #[test]
  #[traced_test]
  fn negative_dependence_falls_back_to_frank() {
    let u = array![0.1, 0.2, 0.3, 0.4];
    let v = array![0.4, 0.1, 0.3, 0.2];
    let res = select_copula(&u, &v).unwrap();

    assert_eq!(res.r#type, CopulaType::Frank);
    assert_eq!(res.index, FRANK_INDEX);
    assert!(res.theta < 0.0);
    assert!(res.costs.is_empty());
    assert!(logs_contain("falling back to frank"));
  }

  #[test]
  fn smallest_cost_recovers_lower_tail_family() {
    let mut rng = StdRng::seed_from_u64(7);
    let data = sample(CopulaType::Clayton, 5.0, 2000, &mut rng).unwrap();
    let (u, v) = (data.column(0).to_owned(), data.column(1).to_owned());

    let config = SelectionConfig::new(50, CostCriterion::Smallest);
    let res = select_copula_with(&u, &v, &config).unwrap();
    assert_eq!(res.r#type, CopulaType::Clayton);
    assert!(res.costs[0] < res.costs[2]);
  }

  #[test]
  fn criterion_direction() {
    let costs = [2.0, 5.0, 5.0, 1.0];
    assert_eq!(CostCriterion::Largest.pick(&costs), Some(1));
    assert_eq!(CostCriterion::Smallest.pick(&costs), Some(3));
  }

  #[test]
  fn non_finite_costs_are_never_picked() {
    for criterion in [CostCriterion::Largest, CostCriterion::Smallest] {
      assert_eq!(criterion.pick(&[f64::NAN, 1.0, 2.0]), None);
      assert_eq!(criterion.pick(&[1.0, f64::INFINITY, 2.0]), None);
      assert_eq!(criterion.pick(&[]), None);
    }
  }

  #[test]
  fn comonotonic_data_selects_an_evaluable_family() {
    let u = Array1::linspace(0.05, 0.95, 19);
    for criterion in [CostCriterion::Largest, CostCriterion::Smallest] {
      let res = select_copula_with(&u, &u, &SelectionConfig::new(50, criterion)).unwrap();
      assert_eq!(res.theta, TAU_SENTINEL);
      assert!(res.costs.iter().all(|c| c.is_finite()), "{:?}", res.costs);

      let c = cdf(res.r#type, &u, &u, res.theta).unwrap();
      for (&ci, &ui) in c.iter().zip(u.iter()) {
        assert!(ci <= ui + 1e-12 && ci > ui - 1e-2, "{} C({ui}, {ui}) = {ci}", res.r#type);
      }
    }
  }
}
