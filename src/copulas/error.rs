//! # Error
//!
//! $$
//! \theta\notin\Theta_{\text{family}}\ \Rightarrow\ \text{InvalidParameter}
//! $$
//!
use thiserror::Error;

use super::bivariate::CopulaType;

pub type CopulaResult<T> = Result<T, CopulaError>;

/// Failures surfaced by estimation, evaluation and selection.
///
/// Every variant is fatal for the call that produced it; nothing is retried
/// internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CopulaError {
  /// Family has no evaluator (e.g. an unknown name or an unspecified family).
  #[error("Unsupported copula family: {0}")]
  UnsupportedFamily(String),

  /// Theta outside the family's admissible domain.
  #[error("Theta {theta} is invalid for the {family} copula: must lie in [{lower}, {upper}]")]
  InvalidParameter {
    family: CopulaType,
    theta: f64,
    lower: f64,
    upper: f64,
  },

  #[error("U and V must have the same length: got {u} and {v}")]
  DimensionMismatch { u: usize, v: usize },

  #[error("Insufficient data: need at least {required} observations, got {provided}")]
  InsufficientData { required: usize, provided: usize },

  #[error("Kendall's tau could not be computed: {0}")]
  Correlation(String),

  #[error("Quadrature rule could not be built: {0}")]
  Quadrature(String),

  #[error("Optimizer failed: {0}")]
  Optimizer(String),

  #[error("Root search failed: {0}")]
  RootFinding(String),

  #[error("Distribution could not be built: {0}")]
  Distribution(String),

  #[error("Linear algebra failure: {0}")]
  LinearAlgebra(String),

  /// A candidate's tail-profile cost came out as NaN or infinite.
  #[error("Tail-profile cost of the {family} copula is not finite: {cost}")]
  NonFiniteCost { family: CopulaType, cost: f64 },
}
