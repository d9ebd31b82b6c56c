//! Weighted codebook storage and transformation parameters.
//!
//! A [`Codebook`] holds the Gaussian components trained offline. The
//! [`CodebookTransformerParams`] name the codebook file and decide whether the
//! mapper evaluates every component or only a contextual neighbourhood of
//! [`CodebookTransformerParams::total_context_neighbours`] entries around each
//! unit. Choosing those neighbours is up to the mapper.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use voice_codebook::codebook::{Codebook, CodebookTransformerParams};
//! use voice_codebook::stream::ByteOrder;
//!
//! let params = CodebookTransformerParams::from_json_file(Path::new("transform.json"))?;
//! let codebook = Codebook::load(&params.codebook_file, 64, ByteOrder::Big)?;
//!
//! let frame = vec![0.0; codebook.get(0).map_or(0, |c| c.dimension())];
//! let densities = match params.context_neighbours() {
//!     Some(n) => codebook.probabilities_for(&frame, &(0..n).collect::<Vec<_>>()),
//!     None => codebook.probabilities(&frame).into_iter().enumerate().collect(),
//! };
//! println!("{} candidates evaluated", densities.len());
//! # Ok::<(), voice_codebook::CodebookError>(())
//! ```

pub mod container;
pub mod params;

pub use container::Codebook;
pub use params::{
    BaselineTransformerParams, BaselineTransformerParamsBuilder, CodebookTransformerParams,
    CodebookTransformerParamsBuilder, DistanceMeasure, MapperParams, MapperParamsBuilder,
    WeightingMethod,
};
