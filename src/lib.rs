//! # bivariate-copulas
//!
//! $$
//! \theta=\theta(\tau),\qquad C_\theta(u,v),\qquad \partial_u C_\theta(u,v)
//! $$
//!
//! Tau-inversion estimation, CDF / conditional-distribution evaluation and
//! tail-profile family selection for the Clayton, Frank, Gumbel and Gaussian
//! copulas.
//!
pub mod copulas;
pub mod traits;

pub use copulas::bivariate::Copula;
pub use copulas::bivariate::CopulaType;
pub use copulas::error::CopulaError;
pub use copulas::error::CopulaResult;
pub use copulas::selection::select_copula;
pub use copulas::selection::SelectionResult;
