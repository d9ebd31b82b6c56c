//! Multivariate Gaussian components.
//!
//! A [`GaussianComponent`] owns a mean vector and a covariance in one of two
//! shapes, diagonal or full (see [`Covariance`]). Every covariance setter
//! recomputes the inverse, determinant and normalisation constants used by
//! [`GaussianComponent::probability`].
//!
//! # Example
//!
//! ```rust
//! use voice_codebook::gaussian::GaussianComponent;
//!
//! // Standard normal in two dimensions, diagonal covariance
//! let component = GaussianComponent::from_parts(&[0.0, 0.0], &[vec![1.0, 1.0]]);
//! assert!(component.is_diagonal());
//!
//! let p = component.probability(&[0.0, 0.0]);
//! assert!((p - 1.0 / (2.0 * std::f64::consts::PI)).abs() < 1e-12);
//! ```
//!
//! # Sub-range extraction
//!
//! [`GaussianComponent::set_mean_range`] and
//! [`GaussianComponent::set_covariance_range`] copy a slice of a larger source
//! and shorten requests that run past its end. The `try_` variants return
//! [`CodebookError::RangeViolation`](crate::CodebookError::RangeViolation)
//! instead.

pub mod cluster;
pub mod component;
pub mod covariance;

pub use cluster::Cluster;
pub use component::GaussianComponent;
pub use covariance::Covariance;
