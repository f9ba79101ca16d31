use anyhow::Context;
use anyhow::Result;
use bivariate_copulas::copulas::bivariate::Copula;
use bivariate_copulas::copulas::bivariate::CopulaType;
use ndarray::array;

fn main() -> Result<()> {
  let u = array![0.1, 0.2, 0.3, 0.4];
  let v = array![0.5, 0.6, 0.5, 0.8];

  for (r#type, cu, cv) in [
    (CopulaType::Clayton, array![0.0, 0.1, 0.2], array![0.0, 0.1, 0.8]),
    (CopulaType::Frank, array![0.0, 0.1, 0.2], array![0.0, 0.1, 0.2]),
    (CopulaType::Gumbel, array![0.0, 0.1, 0.2], array![0.0, 0.1, 0.8]),
  ] {
    let copula = Copula::new(u.clone(), v.clone(), r#type)
      .with_context(|| format!("fitting {}", r#type))?;
    let theta = copula.theta().context("theta was not estimated")?;
    println!("{}: tau = {:.4}, theta = {:.4}", r#type, copula.tau(), theta);
    println!("  C(u, v) = {}", copula.cdf(&cu, &cv, theta)?);
  }

  let u = array![0.1, 0.2, 0.3, 0.4];
  let v = array![0.2, 0.15, 0.3, 0.5];
  let selection = Copula::select_copula(&u, &v)?;
  println!(
    "selected {} (index {}) with theta = {:.4}",
    selection.r#type, selection.index, selection.theta
  );

  Ok(())
}
