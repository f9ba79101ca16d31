//! # Copulas
//!
//! $$
//! C(u,v)=\mathbb P\left(U\le u,\,V\le v\right),\qquad U,V\sim\mathcal U(0,1)
//! $$
//!
pub mod bivariate;
pub mod correlation;
pub mod empirical;
pub mod error;
pub mod samples;
pub mod selection;
