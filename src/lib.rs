//! # voice-codebook
//!
//! Gaussian codebook components for statistical voice conversion.
//!
//! ## Features
//!
//! - **Gaussian components**: diagonal or full covariance, cached inverse,
//!   determinant and normalisation constants, density evaluation
//! - **Codebook files**: fixed byte-order binary records compatible with
//!   codebooks produced by other tools
//! - **Transform configuration**: codebook file, mapper parameters and the
//!   context-based preselection switch, loadable from JSON
//! - **Audio buffering** (`audio` feature): in-memory or temporary-file audio
//!   destinations convertible to PCM streams and WAV files
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! voice-codebook = "2026.2"
//! ```
//!
//! ```rust
//! use std::io::Cursor;
//! use voice_codebook::{
//!     gaussian::{Cluster, GaussianComponent},
//!     stream::{ByteOrder, EndianReader, EndianWriter},
//! };
//!
//! let cluster = Cluster::diagonal(vec![0.0, 1.0], vec![1.0, 2.0]);
//! let component = GaussianComponent::from_cluster(&cluster);
//!
//! let mut writer = EndianWriter::new(Vec::new(), ByteOrder::Big);
//! component.write(&mut writer)?;
//!
//! let mut reader = EndianReader::new(Cursor::new(writer.into_inner()), ByteOrder::Big);
//! let restored = GaussianComponent::read(&mut reader)?;
//! assert_eq!(restored.probability(&[0.0, 1.0]), component.probability(&[0.0, 1.0]));
//! # Ok::<(), voice_codebook::CodebookError>(())
//! ```
//!
//! ## Concurrency
//!
//! Components and codebooks do no internal locking. Build or load them on one
//! thread, then share them read-only (for example behind an `Arc`); density
//! evaluation and the getters never mutate.

#[cfg(feature = "audio")]
pub mod audio;
pub mod codebook;
pub mod error;
pub mod gaussian;
pub mod numeric;
pub mod stream;

pub use codebook::{Codebook, CodebookTransformerParams};
pub use error::{CodebookError, RangeTarget, Result};
pub use gaussian::{Cluster, Covariance, GaussianComponent};
