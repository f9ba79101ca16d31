//! # Gaussian
//!
//! $$
//! c_\Sigma(u)=\frac{1}{\sqrt{\det\Sigma}}\exp\left(-\tfrac12\,x^\top(\Sigma^{-1}-I)\,x\right),\quad x=\Phi^{-1}(u)
//! $$
//!
use std::f64::consts::FRAC_2_PI;
use std::f64::consts::PI;

use gauss_quad::GaussLegendre;
use nalgebra::DMatrix;
use nalgebra::DVector;
use ndarray::array;
use ndarray::Array1;
use ndarray::Array2;
use ndarray::Axis;
use ndarray::Zip;
use statrs::distribution::ContinuousCDF;
use statrs::distribution::Normal;

use super::CopulaType;
use crate::copulas::error::CopulaError;
use crate::copulas::error::CopulaResult;
use crate::traits::BivariateExt;

const CLAMP_EPS: f64 = 1e-12;

fn std_normal() -> CopulaResult<Normal> {
  Normal::new(0.0, 1.0).map_err(|err| CopulaError::Distribution(err.to_string()))
}

/// Gaussian copula density for an arbitrary correlation matrix.
///
/// Keeps the lower Cholesky factor `L` of the correlation so every evaluation is
/// one triangular solve: $x^\top\Sigma^{-1}x = \lVert L^{-1}x\rVert^2$.
#[derive(Debug, Clone)]
pub struct GaussianDensity {
  dim: usize,
  chol_lower: DMatrix<f64>,
  log_sqrt_det: f64,
}

impl GaussianDensity {
  pub fn new(corr: &Array2<f64>) -> CopulaResult<Self> {
    let d = corr.nrows();
    if d != corr.ncols() {
      return Err(CopulaError::LinearAlgebra(
        "correlation matrix must be square".into(),
      ));
    }

    let corr_na = DMatrix::from_row_slice(d, d, &corr.iter().copied().collect::<Vec<_>>());
    let chol = corr_na.cholesky().ok_or_else(|| {
      CopulaError::LinearAlgebra("correlation matrix is not positive definite".into())
    })?;
    let chol_lower = chol.l();
    let log_sqrt_det: f64 = chol_lower.diagonal().iter().map(|l| l.ln()).sum();

    Ok(Self {
      dim: d,
      chol_lower,
      log_sqrt_det,
    })
  }

  pub fn dim(&self) -> usize {
    self.dim
  }

  /// Density at each row of `u`.
  pub fn evaluate(&self, u: &Array2<f64>) -> CopulaResult<Array1<f64>> {
    if u.ncols() != self.dim {
      return Err(CopulaError::LinearAlgebra(format!(
        "expected {} columns, got {}",
        self.dim,
        u.ncols()
      )));
    }

    let std_norm = std_normal()?;
    let mut out = Array1::<f64>::zeros(u.nrows());

    for (i, row) in u.axis_iter(Axis(0)).enumerate() {
      let x = DVector::from_iterator(
        self.dim,
        row
          .iter()
          .map(|&p| std_norm.inverse_cdf(p.clamp(CLAMP_EPS, 1.0 - CLAMP_EPS))),
      );
      let z = self
        .chol_lower
        .solve_lower_triangular(&x)
        .ok_or_else(|| CopulaError::LinearAlgebra("triangular solve failed".into()))?;
      out[i] = (-0.5 * (z.norm_squared() - x.norm_squared()) - self.log_sqrt_det).exp();
    }

    Ok(out)
  }
}

pub fn gaussian_density(corr: &Array2<f64>, u: &Array2<f64>) -> CopulaResult<Array1<f64>> {
  GaussianDensity::new(corr)?.evaluate(u)
}

/// Bivariate Gaussian copula, theta is the correlation rho.
#[derive(Debug, Clone, Copy)]
pub struct Gaussian {
  /// Gauss-Legendre nodes for the bivariate normal CDF integral.
  pub quadrature_nodes: usize,
}

impl Default for Gaussian {
  fn default() -> Self {
    Self {
      quadrature_nodes: 32,
    }
  }
}

impl Gaussian {
  pub fn new(quadrature_nodes: usize) -> Self {
    Self { quadrature_nodes }
  }

  /// $\Phi_2(x,y;\rho)=\Phi(x)\Phi(y)+\frac{1}{2\pi}\int_0^{\arcsin\rho}
  /// \exp\left(-\frac{x^2+y^2-2xy\sin t}{2\cos^2 t}\right)dt$
  fn bivariate_normal_cdf(
    x: f64,
    y: f64,
    rho: f64,
    quad: &GaussLegendre,
    std_norm: &Normal,
  ) -> f64 {
    let base = std_norm.cdf(x) * std_norm.cdf(y);
    let integral = quad.integrate(0.0, rho.asin(), |t| {
      let (s, c) = t.sin_cos();
      (-(x * x + y * y - 2.0 * x * y * s) / (2.0 * c * c)).exp()
    });
    base + integral / (2.0 * PI)
  }
}

impl BivariateExt for Gaussian {
  fn r#type(&self) -> CopulaType {
    CopulaType::Gaussian
  }

  fn theta_bounds(&self) -> (f64, f64) {
    (-1.0, 1.0)
  }

  fn independence_theta(&self) -> f64 {
    0.0
  }

  fn compute_theta(&self, tau: f64) -> CopulaResult<f64> {
    Ok((PI * 0.5 * tau).sin())
  }

  fn tau_from_theta(&self, theta: f64) -> CopulaResult<f64> {
    self.check_theta(theta)?;
    Ok(FRAC_2_PI * theta.asin())
  }

  fn tail_dependence(&self, theta: f64) -> CopulaResult<(f64, f64)> {
    self.check_theta(theta)?;

    if theta == 1.0 {
      return Ok((1.0, 1.0));
    }

    Ok((0.0, 0.0))
  }

  fn cdf(&self, u: &Array1<f64>, v: &Array1<f64>, theta: f64) -> CopulaResult<Array1<f64>> {
    self.check_inputs(u, v, theta)?;

    if theta == 0.0 {
      return Ok(u * v);
    }
    if theta == 1.0 {
      return Ok(Zip::from(u).and(v).map_collect(|&u, &v| u.min(v)));
    }
    if theta == -1.0 {
      return Ok(Zip::from(u).and(v).map_collect(|&u, &v| (u + v - 1.0).max(0.0)));
    }

    let std_norm = std_normal()?;
    let quad = GaussLegendre::new(self.quadrature_nodes)
      .map_err(|err| CopulaError::Quadrature(format!("{err:?}")))?;

    let out = Zip::from(u).and(v).map_collect(|&u, &v| {
      if u <= 0.0 || v <= 0.0 {
        0.0
      } else if u >= 1.0 {
        v
      } else if v >= 1.0 {
        u
      } else {
        let (x, y) = (std_norm.inverse_cdf(u), std_norm.inverse_cdf(v));
        Self::bivariate_normal_cdf(x, y, theta, &quad, &std_norm).clamp(0.0, u.min(v))
      }
    });

    Ok(out)
  }

  fn pdf(&self, u: &Array1<f64>, v: &Array1<f64>, theta: f64) -> CopulaResult<Array1<f64>> {
    self.check_inputs(u, v, theta)?;

    let corr = array![[1.0, theta], [theta, 1.0]];
    let uv = ndarray::stack(Axis(1), &[u.view(), v.view()])
      .map_err(|err| CopulaError::LinearAlgebra(err.to_string()))?;
    gaussian_density(&corr, &uv)
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

    let scale = (1.0 - theta * theta).sqrt();
    if scale == 0.0 {
      // degenerate comonotonic / countermonotonic limits
      return Ok(Zip::from(u).and(v).map_collect(|&u, &v| {
        let hit = if theta > 0.0 { u < v } else { u + v > 1.0 };
        if hit {
          1.0
        } else {
          0.0
        }
      }));
    }

    let std_norm = std_normal()?;
    let out = Zip::from(u).and(v).map_collect(|&u, &v| {
      let x = std_norm.inverse_cdf(u.clamp(CLAMP_EPS, 1.0 - CLAMP_EPS));
      let y = std_norm.inverse_cdf(v.clamp(CLAMP_EPS, 1.0 - CLAMP_EPS));
      std_norm.cdf((y - theta * x) / scale)
    });

    Ok(out)
  }

  /// $v = \Phi\left(\rho x + \sqrt{1-\rho^2}\,\Phi^{-1}(w)\right)$
  fn percent_point(&self, w: f64, u: f64, theta: f64) -> CopulaResult<f64> {
    self.check_theta(theta)?;

    let std_norm = std_normal()?;
    let x = std_norm.inverse_cdf(u.clamp(CLAMP_EPS, 1.0 - CLAMP_EPS));
    let z = std_norm.inverse_cdf(w.clamp(CLAMP_EPS, 1.0 - CLAMP_EPS));
    Ok(std_norm.cdf(theta * x + (1.0 - theta * theta).sqrt() * z))
  }
}
