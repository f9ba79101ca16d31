//! # Traits
//!
//! $$
//! C_\theta:[0,1]^2\to[0,1],\qquad h_\theta(v\mid u)=\partial_u C_\theta(u,v)
//! $$
//!
use ndarray::Array1;
use roots::find_root_brent;
use roots::SimpleConvergency;

use crate::copulas::bivariate::CopulaType;
use crate::copulas::error::CopulaError;
use crate::copulas::error::CopulaResult;

/// Contract shared by every bivariate copula family.
///
/// Implementors are stateless with respect to data: theta is always passed in,
/// so one instance serves any number of fitted copulas.
pub trait BivariateExt {
  fn r#type(&self) -> CopulaType;

  /// Closed admissible interval for theta.
  fn theta_bounds(&self) -> (f64, f64);

  /// Theta at which the family collapses to the independence copula `uv`.
  fn independence_theta(&self) -> f64;

  fn check_theta(&self, theta: f64) -> CopulaResult<()> {
    let (lower, upper) = self.theta_bounds();

    if !(lower..=upper).contains(&theta) {
      return Err(CopulaError::InvalidParameter {
        family: self.r#type(),
        theta,
        lower,
        upper,
      });
    }

    Ok(())
  }

  /// Validates pair lengths and theta before any elementwise evaluation.
  fn check_inputs(&self, u: &Array1<f64>, v: &Array1<f64>, theta: f64) -> CopulaResult<()> {
    if u.len() != v.len() {
      return Err(CopulaError::DimensionMismatch {
        u: u.len(),
        v: v.len(),
      });
    }

    self.check_theta(theta)
  }

  /// Inverts Kendall's tau into the family parameter.
  fn compute_theta(&self, tau: f64) -> CopulaResult<f64>;

  /// Kendall's tau implied by theta.
  fn tau_from_theta(&self, theta: f64) -> CopulaResult<f64>;

  /// Theoretical `(lambda_L, lambda_U)` tail-dependence coefficients.
  fn tail_dependence(&self, theta: f64) -> CopulaResult<(f64, f64)>;

  fn cdf(&self, u: &Array1<f64>, v: &Array1<f64>, theta: f64) -> CopulaResult<Array1<f64>>;

  fn pdf(&self, u: &Array1<f64>, v: &Array1<f64>, theta: f64) -> CopulaResult<Array1<f64>>;

  /// $\partial C / \partial u$, the conditional distribution of V given U = u.
  fn partial_derivative(
    &self,
    u: &Array1<f64>,
    v: &Array1<f64>,
    theta: f64,
  ) -> CopulaResult<Array1<f64>>;

  /// Solves `h(v | u) = w` for v.
  fn percent_point(&self, w: f64, u: f64, theta: f64) -> CopulaResult<f64> {
    self.check_theta(theta)?;

    let lower = 1e-12;
    let upper = 1.0 - 1e-12;
    let u = Array1::from_elem(1, u);
    let h = |v: f64| {
      self
        .partial_derivative(&u, &Array1::from_elem(1, v), theta)
        .map(|d| d[0] - w)
        .unwrap_or(f64::NAN)
    };

    if h(lower) >= 0.0 {
      return Ok(lower);
    }
    if h(upper) <= 0.0 {
      return Ok(upper);
    }

    let mut convergency = SimpleConvergency {
      eps: 1e-12,
      max_iter: 100,
    };

    find_root_brent(lower, upper, h, &mut convergency)
      .map_err(|err| CopulaError::RootFinding(format!("{err:?}")))
  }
}
