//! # Samples
//!
//! $$
//! U\sim\mathcal U(0,1),\quad W\sim\mathcal U(0,1),\quad V=h_\theta^{-1}(W\mid U)
//! $$
//!
use ndarray::Array2;
use rand::Rng;
use rand_distr::Distribution;
use rand_distr::Uniform;

use super::bivariate::CopulaType;
use super::error::CopulaResult;

/// Draws `n` pairs from `(family, theta)` by conditional inversion.
pub fn sample<R: Rng + ?Sized>(
  r#type: CopulaType,
  theta: f64,
  n: usize,
  rng: &mut R,
) -> CopulaResult<Array2<f64>> {
  r#type.with_family(|family| {
    family.check_theta(theta)?;

    let uniform = Uniform::new(0.0_f64, 1.0);
    let mut data = Array2::<f64>::zeros((n, 2));

    for i in 0..n {
      let u = uniform.sample(rng).max(f64::MIN_POSITIVE);
      let w = uniform.sample(rng);
      data[[i, 0]] = u;
      data[[i, 1]] = family.percent_point(w, u, theta)?;
    }

    Ok(data)
  })
}
