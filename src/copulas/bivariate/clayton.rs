//! # Clayton
//!
//! $$
//! C_\theta(u,v)=\max\left(u^{-\theta}+v^{-\theta}-1,0\right)^{-1/\theta}
//! $$
//!
use ndarray::Array1;
use ndarray::Zip;

use super::CopulaType;
use super::TAU_SENTINEL;
use crate::copulas::error::CopulaResult;
use crate::traits::BivariateExt;

#[derive(Debug, Clone, Copy, Default)]
pub struct Clayton;

impl Clayton {
  pub fn new() -> Self {
    Self
  }
}

/// $\ln(e^x - 1)$ for $x \ge 0$.
fn ln_exp_m1(x: f64) -> f64 {
  if x > 1.0 {
    x + (-(-x).exp()).ln_1p()
  } else {
    x.exp_m1().ln()
  }
}

/// $\ln(1 + e^x)$
fn softplus(x: f64) -> f64 {
  x.max(0.0) + (-x.abs()).exp().ln_1p()
}

/// $\ln\left(u^{-\theta} + v^{-\theta} - 1\right)$, evaluated without forming the powers.
fn log_generator_sum(u: f64, v: f64, theta: f64) -> f64 {
  let (a, b) = (-theta * u.ln(), -theta * v.ln());
  let m = a.max(b);
  if m < 50.0 {
    (a.exp_m1() + b.exp_m1()).ln_1p()
  } else {
    m + ((a - m).exp() + (b - m).exp() - (-m).exp()).ln()
  }
}

impl BivariateExt for Clayton {
  fn r#type(&self) -> CopulaType {
    CopulaType::Clayton
  }

  fn theta_bounds(&self) -> (f64, f64) {
    (0.0, f64::INFINITY)
  }

  fn independence_theta(&self) -> f64 {
    0.0
  }

  fn compute_theta(&self, tau: f64) -> CopulaResult<f64> {
    if tau == 1.0 {
      tracing::warn!("tau == 1, using comonotonic sentinel for clayton");
      return Ok(TAU_SENTINEL);
    }

    Ok(2.0 * tau / (1.0 - tau))
  }

  fn tau_from_theta(&self, theta: f64) -> CopulaResult<f64> {
    self.check_theta(theta)?;
    Ok(theta / (theta + 2.0))
  }

  fn tail_dependence(&self, theta: f64) -> CopulaResult<(f64, f64)> {
    self.check_theta(theta)?;

    if theta == 0.0 {
      return Ok((0.0, 0.0));
    }

    Ok((2f64.powf(-1.0 / theta), 0.0))
  }

  fn cdf(&self, u: &Array1<f64>, v: &Array1<f64>, theta: f64) -> CopulaResult<Array1<f64>> {
    self.check_inputs(u, v, theta)?;

    if theta == 0.0 {
      return Ok(u * v);
    }

    let cdfs = Zip::from(u).and(v).map_collect(|&u, &v| {
      if u > 0.0 && v > 0.0 {
        (-log_generator_sum(u, v, theta) / theta).exp().min(u.min(v))
      } else {
        0.0
      }
    });

    Ok(cdfs)
  }

  fn pdf(&self, u: &Array1<f64>, v: &Array1<f64>, theta: f64) -> CopulaResult<Array1<f64>> {
    self.check_inputs(u, v, theta)?;

    if theta == 0.0 {
      return Ok(Array1::ones(u.len()));
    }

    let c = -(2.0 * theta + 1.0) / theta;
    let out = Zip::from(u).and(v).map_collect(|&u, &v| {
      if u <= 0.0 || v <= 0.0 {
        return 0.0;
      }
      let log_pdf = (theta + 1.0).ln() - (theta + 1.0) * (u.ln() + v.ln())
        + c * log_generator_sum(u, v, theta);
      log_pdf.exp()
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

    let h = Zip::from(u).and(v).map_collect(|&u, &v| {
      if v <= 0.0 {
        return 0.0;
      }
      let s = theta * u.ln() + ln_exp_m1(-theta * v.ln());
      (-(1.0 + theta) / theta * softplus(s)).exp()
    });

    Ok(h)
  }

  /// Closed-form inverse of the conditional distribution.
  fn percent_point(&self, w: f64, u: f64, theta: f64) -> CopulaResult<f64> {
    self.check_theta(theta)?;

    if theta == 0.0 {
      return Ok(w);
    }

    let log_a = ln_exp_m1(-theta / (1.0 + theta) * w.ln());
    Ok((-softplus(log_a - theta * u.ln()) / theta).exp())
  }
}
