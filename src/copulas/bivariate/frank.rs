//! # Frank
//!
//! $$
//! C_\theta(u,v)=-\frac{1}{\theta}\ln\left(1+\frac{(e^{-\theta u}-1)(e^{-\theta v}-1)}{e^{-\theta}-1}\right)
//! $$
//!
use argmin::core::CostFunction;
use argmin::core::Executor;
use argmin::core::State;
use argmin::solver::neldermead::NelderMead;
use gauss_quad::GaussLegendre;
use impl_new_derive::ImplNew;
use ndarray::Array1;
use ndarray::Zip;

use super::CopulaType;
use super::TAU_SENTINEL;
use crate::copulas::error::CopulaError;
use crate::copulas::error::CopulaResult;
use crate::traits::BivariateExt;

/// Settings of the Debye-function inversion used to estimate theta.
#[derive(ImplNew, Debug, Clone, Copy)]
pub struct FrankConfig {
  /// Starting point of the simplex search, in `alpha = -theta` space.
  pub initial_guess: f64,
  pub max_iters: u64,
  /// Nelder-Mead stops once the std. dev. of the simplex costs drops below this.
  pub sd_tolerance: f64,
  /// Gauss-Legendre nodes per quadrature panel.
  pub quadrature_nodes: usize,
}

impl Default for FrankConfig {
  fn default() -> Self {
    Self {
      initial_guess: -5.0,
      max_iters: 500,
      sd_tolerance: 1e-16,
      quadrature_nodes: 32,
    }
  }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Frank {
  pub config: FrankConfig,
}

impl Frank {
  pub fn new(config: FrankConfig) -> Self {
    Self { config }
  }

  fn quadrature(&self) -> CopulaResult<GaussLegendre> {
    GaussLegendre::new(self.config.quadrature_nodes)
      .map_err(|err| CopulaError::Quadrature(format!("{err:?}")))
  }
}

/// $g(z) = e^{-\theta z} - 1$
fn g(theta: f64, z: f64) -> f64 {
  (-theta * z).exp_m1()
}

/// $e^{\theta m}\left(e^{-\theta u} + e^{-\theta v} - e^{-\theta(u+v)} - e^{-\theta}\right)$ with
/// $m = \min(u, v)$, written as a sum of two non-negative terms so it neither
/// overflows nor cancels for large theta.
fn scaled_joint(u: f64, v: f64, theta: f64) -> f64 {
  let (lo, hi) = (u.min(v), u.max(v));
  -(-theta * (hi - lo)).exp() * g(theta, lo) - g(theta, 1.0 - lo)
}

/// First-order Debye function $D_1(x) = \frac{1}{x}\int_0^x \frac{t}{e^t-1}\,dt$.
///
/// The integral runs from machine epsilon and is split into panels of width
/// at most 8 so the rule stays accurate for large |x|.
pub fn debye1(x: f64, quad: &GaussLegendre) -> f64 {
  if x.abs() < 1e-10 {
    return 1.0;
  }

  let integrand = |t: f64| {
    if t.abs() < 1e-12 {
      1.0
    } else {
      t / t.exp_m1()
    }
  };

  let panels = (x.abs() / 8.0).ceil().max(1.0) as usize;
  let width = (x - f64::EPSILON) / panels as f64;
  let integral: f64 = (0..panels)
    .map(|k| {
      let a = f64::EPSILON + k as f64 * width;
      quad.integrate(a, a + width, integrand)
    })
    .sum();

  integral / x
}

/// Squared gap between `(1 - tau) / 4` and the Debye expression at `alpha = -theta`.
pub fn frank_objective(tau: f64, alpha: f64, quad: &GaussLegendre) -> f64 {
  let target = (1.0 - tau) / 4.0;

  // D_1(x) ~ 1 - x/4 near zero
  if alpha.abs() < 1e-10 {
    return (target - 0.25).powi(2);
  }

  (target - (debye1(-alpha, quad) - 1.0) / alpha).powi(2)
}

struct DebyeProblem {
  tau: f64,
  quad: GaussLegendre,
}

impl CostFunction for DebyeProblem {
  type Param = Vec<f64>;
  type Output = f64;

  fn cost(&self, alpha: &Self::Param) -> Result<Self::Output, argmin::core::Error> {
    let cost = frank_objective(self.tau, alpha[0], &self.quad);
    Ok(if cost.is_finite() { cost } else { f64::MAX })
  }
}

impl BivariateExt for Frank {
  fn r#type(&self) -> CopulaType {
    CopulaType::Frank
  }

  fn theta_bounds(&self) -> (f64, f64) {
    (0.0, f64::INFINITY)
  }

  fn independence_theta(&self) -> f64 {
    0.0
  }

  fn compute_theta(&self, tau: f64) -> CopulaResult<f64> {
    if tau.abs() == 1.0 {
      tracing::warn!(tau, "|tau| == 1, using comonotonic sentinel for frank");
      return Ok(tau * TAU_SENTINEL);
    }

    let x0 = self.config.initial_guess;
    let problem = DebyeProblem {
      tau,
      quad: self.quadrature()?,
    };
    let solver = NelderMead::new(vec![vec![x0], vec![x0 * 1.05]])
      .with_sd_tolerance(self.config.sd_tolerance)
      .map_err(|err| CopulaError::Optimizer(err.to_string()))?;

    let res = Executor::new(problem, solver)
      .configure(|state| state.max_iters(self.config.max_iters))
      .run()
      .map_err(|err| CopulaError::Optimizer(err.to_string()))?;

    let alpha = res
      .state()
      .get_best_param()
      .and_then(|p| p.first().copied())
      .ok_or_else(|| CopulaError::Optimizer("no best parameter".into()))?;

    tracing::debug!(
      tau,
      theta = -alpha,
      iters = res.state().get_iter(),
      "frank theta estimated"
    );

    Ok(-alpha)
  }

  fn tau_from_theta(&self, theta: f64) -> CopulaResult<f64> {
    if theta == 0.0 {
      return Ok(0.0);
    }

    let quad = self.quadrature()?;
    Ok(1.0 - 4.0 / theta * (1.0 - debye1(theta, &quad)))
  }

  fn tail_dependence(&self, theta: f64) -> CopulaResult<(f64, f64)> {
    self.check_theta(theta)?;
    Ok((0.0, 0.0))
  }

  fn cdf(&self, u: &Array1<f64>, v: &Array1<f64>, theta: f64) -> CopulaResult<Array1<f64>> {
    self.check_inputs(u, v, theta)?;

    if theta == 0.0 {
      return Ok(u * v);
    }

    let g1 = g(theta, 1.0);
    let out = Zip::from(u).and(v).map_collect(|&u, &v| {
      if theta < 1.0 {
        -(g(theta, u) * g(theta, v) / g1).ln_1p() / theta
      } else {
        let m = u.min(v);
        (m - (scaled_joint(u, v, theta) / -g1).ln() / theta).clamp(0.0, m)
      }
    });
    Ok(out)
  }

  fn pdf(&self, u: &Array1<f64>, v: &Array1<f64>, theta: f64) -> CopulaResult<Array1<f64>> {
    self.check_inputs(u, v, theta)?;

    if theta == 0.0 {
      return Ok(Array1::ones(u.len()));
    }

    let g1 = g(theta, 1.0);
    let out = Zip::from(u).and(v).map_collect(|&u, &v| {
      let s = scaled_joint(u, v, theta);
      -theta * g1 * (-theta * (u - v).abs()).exp() / (s * s)
    });
    Ok(out)
  }

  fn partial_derivative(
    &self,
    u: &Array1<f64>,
    v: &Array1<f64>,
    theta: f64,
  ) -> CopulaResult<Array1<f64>> {
    self.check_inputs(u, v, theta)?;

    if theta == 0.0 {
      return Ok(v.to_owned());
    }

    let out = Zip::from(u).and(v).map_collect(|&u, &v| {
      -g(theta, v) * (-theta * (u - u.min(v))).exp() / scaled_joint(u, v, theta)
    });
    Ok(out)
  }
}
