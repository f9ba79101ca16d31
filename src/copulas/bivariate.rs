//! # Bivariate
//!
//! $$
//! H(x,y)=C_\theta\left(F(x),G(y)\right),\qquad \theta=\theta(\tau)
//! $$
//!
use std::fmt;
use std::str::FromStr;

use ndarray::Array1;
use ndarray::ArrayView1;

use super::correlation::kendall_tau;
use super::empirical::tail_profile;
use super::empirical::TailProfile;
use super::error::CopulaError;
use super::error::CopulaResult;
use super::selection::select_copula;
use super::selection::SelectionResult;
use crate::traits::BivariateExt;

pub mod clayton;
pub mod frank;
pub mod gaussian;
pub mod gumbel;

use clayton::Clayton;
use frank::Frank;
use gaussian::Gaussian;
use gumbel::Gumbel;

/// Finite stand-in for theta in the comonotonic limit `tau == 1`.
pub const TAU_SENTINEL: f64 = 10000.0;

/// Grid size of the empirical tail profile.
pub const TAIL_GRID_POINTS: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CopulaType {
  Clayton,
  Frank,
  Gumbel,
  Gaussian,
  Unspecified,
}

impl CopulaType {
  /// Runs `f` against the evaluator of this family.
  pub fn with_family<T>(
    self,
    f: impl FnOnce(&dyn BivariateExt) -> CopulaResult<T>,
  ) -> CopulaResult<T> {
    match self {
      CopulaType::Clayton => f(&Clayton),
      CopulaType::Frank => f(&Frank::default()),
      CopulaType::Gumbel => f(&Gumbel),
      CopulaType::Gaussian => f(&Gaussian::default()),
      CopulaType::Unspecified => Err(CopulaError::UnsupportedFamily(self.to_string())),
    }
  }
}

impl fmt::Display for CopulaType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      CopulaType::Clayton => "clayton",
      CopulaType::Frank => "frank",
      CopulaType::Gumbel => "gumbel",
      CopulaType::Gaussian => "gaussian",
      CopulaType::Unspecified => "unspecified",
    };
    f.write_str(name)
  }
}

impl FromStr for CopulaType {
  type Err = CopulaError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "clayton" => Ok(CopulaType::Clayton),
      "frank" => Ok(CopulaType::Frank),
      "gumbel" => Ok(CopulaType::Gumbel),
      "gaussian" => Ok(CopulaType::Gaussian),
      _ => Err(CopulaError::UnsupportedFamily(s.to_string())),
    }
  }
}

/// Stateless copula CDF for `(family, theta)`.
pub fn cdf(
  r#type: CopulaType,
  u: &Array1<f64>,
  v: &Array1<f64>,
  theta: f64,
) -> CopulaResult<Array1<f64>> {
  r#type.with_family(|family| family.cdf(u, v, theta))
}

/// Stateless $\partial C / \partial u$ for `(family, theta)`.
pub fn partial_derivative(
  r#type: CopulaType,
  u: &Array1<f64>,
  v: &Array1<f64>,
  theta: f64,
) -> CopulaResult<Array1<f64>> {
  r#type.with_family(|family| family.partial_derivative(u, v, theta))
}

pub fn pdf(
  r#type: CopulaType,
  u: &Array1<f64>,
  v: &Array1<f64>,
  theta: f64,
) -> CopulaResult<Array1<f64>> {
  r#type.with_family(|family| family.pdf(u, v, theta))
}

/// CDF evaluator bound to a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdfEvaluator {
  r#type: CopulaType,
}

impl CdfEvaluator {
  pub fn new(r#type: CopulaType) -> CopulaResult<Self> {
    if r#type == CopulaType::Unspecified {
      return Err(CopulaError::UnsupportedFamily(r#type.to_string()));
    }

    Ok(Self { r#type })
  }

  pub fn r#type(&self) -> CopulaType {
    self.r#type
  }

  pub fn evaluate(
    &self,
    u: &Array1<f64>,
    v: &Array1<f64>,
    theta: f64,
  ) -> CopulaResult<Array1<f64>> {
    cdf(self.r#type, u, v, theta)
  }
}

/// Conditional-distribution evaluator bound to a family, see [`Copula::derivative`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DerivativeEvaluator {
  r#type: CopulaType,
}

impl DerivativeEvaluator {
  pub fn new(r#type: CopulaType) -> CopulaResult<Self> {
    if r#type == CopulaType::Unspecified {
      return Err(CopulaError::UnsupportedFamily(r#type.to_string()));
    }

    Ok(Self { r#type })
  }

  pub fn r#type(&self) -> CopulaType {
    self.r#type
  }

  pub fn evaluate(
    &self,
    u: &Array1<f64>,
    v: &Array1<f64>,
    theta: f64,
  ) -> CopulaResult<Array1<f64>> {
    partial_derivative(self.r#type, u, v, theta)
  }
}

/// A bivariate copula fitted to pseudo-observations.
///
/// Kendall's tau is computed on construction; when a family is given theta is
/// estimated from it (unless supplied) and the CDF evaluator is bound. Nothing
/// is mutated afterwards.
#[derive(Debug, Clone)]
pub struct Copula {
  u: Array1<f64>,
  v: Array1<f64>,
  tau: f64,
  r#type: CopulaType,
  theta: Option<f64>,
  cdf: Option<CdfEvaluator>,
}

impl Copula {
  pub fn new(u: Array1<f64>, v: Array1<f64>, r#type: CopulaType) -> CopulaResult<Self> {
    Self::build(u, v, r#type, None)
  }

  /// Uses `theta` as given instead of estimating it; domain checks happen on evaluation.
  pub fn with_theta(
    u: Array1<f64>,
    v: Array1<f64>,
    r#type: CopulaType,
    theta: f64,
  ) -> CopulaResult<Self> {
    Self::build(u, v, r#type, Some(theta))
  }

  pub fn from_name(u: Array1<f64>, v: Array1<f64>, name: &str) -> CopulaResult<Self> {
    Self::new(u, v, name.parse()?)
  }

  fn build(
    u: Array1<f64>,
    v: Array1<f64>,
    r#type: CopulaType,
    theta: Option<f64>,
  ) -> CopulaResult<Self> {
    let tau = kendall_tau(&u, &v)?;

    let (theta, cdf) = match r#type {
      CopulaType::Unspecified => (theta, None),
      _ => {
        let theta = match theta {
          Some(theta) => theta,
          None => r#type.with_family(|family| family.compute_theta(tau))?,
        };
        (Some(theta), Some(CdfEvaluator::new(r#type)?))
      }
    };

    tracing::debug!(family = %r#type, n = u.len(), tau, ?theta, "copula constructed");

    Ok(Self {
      u,
      v,
      tau,
      r#type,
      theta,
      cdf,
    })
  }

  pub fn u(&self) -> ArrayView1<'_, f64> {
    self.u.view()
  }

  pub fn v(&self) -> ArrayView1<'_, f64> {
    self.v.view()
  }

  pub fn len(&self) -> usize {
    self.u.len()
  }

  pub fn is_empty(&self) -> bool {
    self.u.is_empty()
  }

  pub fn tau(&self) -> f64 {
    self.tau
  }

  pub fn theta(&self) -> Option<f64> {
    self.theta
  }

  pub fn r#type(&self) -> CopulaType {
    self.r#type
  }

  fn require_theta(&self) -> CopulaResult<f64> {
    self
      .theta
      .ok_or_else(|| CopulaError::UnsupportedFamily(self.r#type.to_string()))
  }

  /// The bound CDF evaluator, absent for an unspecified family.
  pub fn cdf_evaluator(&self) -> Option<&CdfEvaluator> {
    self.cdf.as_ref()
  }

  pub fn cdf(&self, u: &Array1<f64>, v: &Array1<f64>, theta: f64) -> CopulaResult<Array1<f64>> {
    self
      .cdf
      .as_ref()
      .ok_or_else(|| CopulaError::UnsupportedFamily(self.r#type.to_string()))?
      .evaluate(u, v, theta)
  }

  /// CDF at the fitted theta.
  pub fn fitted_cdf(&self, u: &Array1<f64>, v: &Array1<f64>) -> CopulaResult<Array1<f64>> {
    self.cdf(u, v, self.require_theta()?)
  }

  /// Builds the derivative evaluator on request.
  pub fn derivative(&self) -> CopulaResult<DerivativeEvaluator> {
    DerivativeEvaluator::new(self.r#type)
  }

  pub fn pdf(&self, u: &Array1<f64>, v: &Array1<f64>) -> CopulaResult<Array1<f64>> {
    pdf(self.r#type, u, v, self.require_theta()?)
  }

  /// Theoretical `(lambda_L, lambda_U)` at the fitted theta.
  pub fn tail_dependence(&self) -> CopulaResult<(f64, f64)> {
    let theta = self.require_theta()?;
    self
      .r#type
      .with_family(|family| family.tail_dependence(theta))
  }

  /// Empirical tail profile over the default 50-point grid.
  pub fn compute_empirical(u: &Array1<f64>, v: &Array1<f64>) -> CopulaResult<TailProfile> {
    tail_profile(u, v, TAIL_GRID_POINTS)
  }

  /// Picks the best family among Clayton, Frank and Gumbel with the default settings.
  pub fn select_copula(u: &Array1<f64>, v: &Array1<f64>) -> CopulaResult<SelectionResult> {
    select_copula(u, v)
  }
}

#[cfg(test)]
mod tests {
  use approx::assert_abs_diff_eq;
  use ndarray::array;

  use super::*;

  fn scenario() -> (Array1<f64>, Array1<f64>) {
    (array![0.1, 0.2, 0.3, 0.4], array![0.5, 0.6, 0.5, 0.8])
  }

  #[test]
  fn clayton_end_to_end() {
    let (u, v) = scenario();
    let copula = Copula::new(u.clone(), v.clone(), CopulaType::Clayton).unwrap();

    let tau = kendall_tau(&u, &v).unwrap();
    assert_eq!(copula.tau(), tau);
    assert_abs_diff_eq!(copula.theta().unwrap(), 2.0 * tau / (1.0 - tau), epsilon = 1e-12);

    let (cu, cv) = (array![0.0, 0.1, 0.2], array![0.0, 0.1, 0.8]);
    let out = copula.cdf(&cu, &cv, copula.theta().unwrap()).unwrap();
    assert_eq!(out.len(), 3);
    for i in 0..3 {
      assert!(out[i] >= 0.0 && out[i] <= cu[i].min(cv[i]) + 1e-12);
    }
  }

  #[test]
  fn string_keyed_construction() {
    let (u, v) = scenario();
    let copula = Copula::from_name(u.clone(), v.clone(), "Gumbel").unwrap();
    assert_eq!(copula.r#type(), CopulaType::Gumbel);

    assert_eq!(
      Copula::from_name(u, v, "student").unwrap_err(),
      CopulaError::UnsupportedFamily("student".into())
    );
  }

  #[test]
  fn sentinel_for_comonotonic_data() {
    let u = array![0.1, 0.2, 0.3, 0.4];
    for family in [CopulaType::Clayton, CopulaType::Gumbel] {
      let copula = Copula::new(u.clone(), u.clone(), family).unwrap();
      assert_eq!(copula.tau(), 1.0);
      assert_eq!(copula.theta(), Some(TAU_SENTINEL));
    }
  }

  #[test]
  fn unspecified_family_has_no_evaluators() {
    let (u, v) = scenario();
    let copula = Copula::new(u.clone(), v.clone(), CopulaType::Unspecified).unwrap();
    assert!(copula.theta().is_none());
    assert!(copula.cdf_evaluator().is_none());
    assert!(matches!(
      copula.cdf(&u, &v, 1.0),
      Err(CopulaError::UnsupportedFamily(_))
    ));
    assert!(matches!(
      copula.derivative(),
      Err(CopulaError::UnsupportedFamily(_))
    ));
  }

  #[test]
  fn supplied_theta_is_kept() {
    let (u, v) = scenario();
    let copula = Copula::with_theta(u, v, CopulaType::Frank, 3.5).unwrap();
    assert_eq!(copula.theta(), Some(3.5));
  }

  #[test]
  fn mismatched_lengths_fail_at_construction() {
    let err = Copula::new(array![0.1, 0.2, 0.3], array![0.1, 0.2], CopulaType::Clayton);
    assert_eq!(err.unwrap_err(), CopulaError::DimensionMismatch { u: 3, v: 2 });
  }

  #[test]
  fn domain_errors_are_raised_by_the_evaluator() {
    let x = array![0.1];
    assert!(matches!(
      cdf(CopulaType::Clayton, &x, &x, -1.0),
      Err(CopulaError::InvalidParameter { .. })
    ));
    assert!(matches!(
      cdf(CopulaType::Frank, &x, &x, -1.0),
      Err(CopulaError::InvalidParameter { .. })
    ));
    assert!(matches!(
      cdf(CopulaType::Gumbel, &x, &x, 0.5),
      Err(CopulaError::InvalidParameter { .. })
    ));
    assert!(matches!(
      partial_derivative(CopulaType::Gumbel, &x, &x, 0.5),
      Err(CopulaError::InvalidParameter { .. })
    ));
  }

  #[test]
  fn independence_property() {
    let u = array![0.05, 0.3, 0.5, 0.75, 1.0];
    let v = array![0.9, 0.4, 0.5, 0.2, 0.6];
    let expected = &u * &v;
    for (family, theta) in [
      (CopulaType::Clayton, 0.0),
      (CopulaType::Frank, 0.0),
      (CopulaType::Gumbel, 1.0),
      (CopulaType::Gaussian, 0.0),
    ] {
      assert_eq!(cdf(family, &u, &v, theta).unwrap(), expected, "{family}");
    }
  }

  #[test]
  fn frechet_bounds_and_monotonicity() {
    let grid = Array1::linspace(0.0, 1.0, 21);
    for (family, theta) in [
      (CopulaType::Clayton, 0.7),
      (CopulaType::Clayton, 6.0),
      (CopulaType::Clayton, TAU_SENTINEL),
      (CopulaType::Frank, 0.5),
      (CopulaType::Frank, 12.0),
      (CopulaType::Frank, 80.0),
      (CopulaType::Frank, TAU_SENTINEL),
      (CopulaType::Gumbel, 1.3),
      (CopulaType::Gumbel, 5.0),
      (CopulaType::Gumbel, 3000.0),
      (CopulaType::Gumbel, TAU_SENTINEL),
      (CopulaType::Gaussian, 0.8),
      (CopulaType::Gaussian, -0.6),
    ] {
      for &v in grid.iter() {
        let vs = Array1::from_elem(grid.len(), v);
        let c = cdf(family, &grid, &vs, theta).unwrap();
        for (i, &u) in grid.iter().enumerate() {
          let lower = (u + v - 1.0).max(0.0);
          assert!(
            c[i] >= lower - 1e-9 && c[i] <= u.min(v) + 1e-9,
            "{family}({theta}) C({u}, {v}) = {}",
            c[i]
          );
          if i > 0 {
            assert!(
              c[i] >= c[i - 1] - 1e-12,
              "{family}({theta}) not monotone at u = {u}"
            );
          }
        }
      }
    }
  }

  #[test]
  fn derivatives_are_conditional_probabilities_at_the_sentinel() {
    let grid = Array1::linspace(0.05, 0.95, 19);
    for family in [CopulaType::Clayton, CopulaType::Frank, CopulaType::Gumbel] {
      for &v in grid.iter() {
        let vs = Array1::from_elem(grid.len(), v);
        let du = partial_derivative(family, &grid, &vs, TAU_SENTINEL).unwrap();
        assert!(
          du.iter().all(|d| (0.0..=1.0 + 1e-12).contains(d)),
          "{family} dC/du(., {v}) = {du}"
        );
      }
    }
  }

  #[test]
  fn derivative_is_built_lazily_and_bound_to_family() {
    let (u, v) = scenario();
    let copula = Copula::new(u, v, CopulaType::Gumbel).unwrap();
    let theta = copula.theta().unwrap();
    let du = copula.derivative().unwrap();
    assert_eq!(du.r#type(), CopulaType::Gumbel);

    let out = du.evaluate(&array![0.3, 0.6], &array![0.4, 0.2], theta).unwrap();
    assert!(out.iter().all(|d| (0.0..=1.0).contains(d)));
  }

  #[test]
  fn tail_dependence_at_fitted_theta() {
    let (u, v) = scenario();
    let copula = Copula::new(u, v, CopulaType::Clayton).unwrap();
    let (lower, upper) = copula.tail_dependence().unwrap();
    assert!(lower > 0.0 && lower < 1.0);
    assert_eq!(upper, 0.0);
  }
}
