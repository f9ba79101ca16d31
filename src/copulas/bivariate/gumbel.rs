//! # Gumbel
//!
//! $$
//! C_\theta(u,v)=\exp\left(-\left((-\ln u)^\theta+(-\ln v)^\theta\right)^{1/\theta}\right)
//! $$
//!
use ndarray::Array1;
use ndarray::Zip;

use super::CopulaType;
use super::TAU_SENTINEL;
use crate::copulas::error::CopulaResult;
use crate::traits::BivariateExt;

#[derive(Debug, Clone, Copy, Default)]
pub struct Gumbel;

impl Gumbel {
  pub fn new() -> Self {
    Self
  }
}

/// $\left(x^\theta + y^\theta\right)^{1/\theta}$ with the larger argument factored out, so the
/// powers stay in range for any theta.
fn generator_norm(x: f64, y: f64, theta: f64) -> f64 {
  let (hi, lo) = (x.max(y), x.min(y));
  if hi == 0.0 {
    return 0.0;
  }

  hi * ((lo / hi).powf(theta).ln_1p() / theta).exp()
}

fn gumbel_cdf(u: f64, v: f64, theta: f64) -> f64 {
  if u <= 0.0 || v <= 0.0 {
    return 0.0;
  }

  (-generator_norm(-u.ln(), -v.ln(), theta)).exp()
}

impl BivariateExt for Gumbel {
  fn r#type(&self) -> CopulaType {
    CopulaType::Gumbel
  }

  fn theta_bounds(&self) -> (f64, f64) {
    (1.0, f64::INFINITY)
  }

  fn independence_theta(&self) -> f64 {
    1.0
  }

  fn compute_theta(&self, tau: f64) -> CopulaResult<f64> {
    if tau == 1.0 {
      tracing::warn!("tau == 1, using comonotonic sentinel for gumbel");
      return Ok(TAU_SENTINEL);
    }

    Ok(1.0 / (1.0 - tau))
  }

  fn tau_from_theta(&self, theta: f64) -> CopulaResult<f64> {
    self.check_theta(theta)?;
    Ok(1.0 - 1.0 / theta)
  }

  fn tail_dependence(&self, theta: f64) -> CopulaResult<(f64, f64)> {
    self.check_theta(theta)?;
    Ok((0.0, 2.0 - 2f64.powf(1.0 / theta)))
  }

  fn cdf(&self, u: &Array1<f64>, v: &Array1<f64>, theta: f64) -> CopulaResult<Array1<f64>> {
    self.check_inputs(u, v, theta)?;

    if theta == 1.0 {
      return Ok(u * v);
    }

    Ok(Zip::from(u).and(v).map_collect(|&u, &v| gumbel_cdf(u, v, theta)))
  }

  fn pdf(&self, u: &Array1<f64>, v: &Array1<f64>, theta: f64) -> CopulaResult<Array1<f64>> {
    self.check_inputs(u, v, theta)?;

    if theta == 1.0 {
      return Ok(Array1::ones(u.len()));
    }

    let out = Zip::from(u).and(v).map_collect(|&u, &v| {
      let (lu, lv) = (-u.ln(), -v.ln());
      let a = generator_norm(lu, lv, theta);
      let b = (lu / a * lv / a).powf(theta - 1.0);
      let d = 1.0 + (theta - 1.0) / a;
      (-a).exp() * b * d / (u * v)
    });

    Ok(out)
  }

  /// Composes the stateless CDF with the generator derivative. No auxiliary copula is built.
  fn partial_derivative(
    &self,
    u: &Array1<f64>,
    v: &Array1<f64>,
    theta: f64,
  ) -> CopulaResult<Array1<f64>> {
    self.check_inputs(u, v, theta)?;

    if theta == 1.0 {
      return Ok(v.to_owned());
    }

    let p1 = self.cdf(u, v, theta)?;
    let out = Zip::from(&p1).and(u).and(v).map_collect(|&c, &u, &v| {
      if u <= 0.0 || v <= 0.0 {
        return 0.0;
      }
      let (lu, lv) = (-u.ln(), -v.ln());
      let a = generator_norm(lu, lv, theta);
      if a == 0.0 {
        return 1.0;
      }
      c * (lu / a).powf(theta - 1.0) / u
    });

    Ok(out)
  }
}
