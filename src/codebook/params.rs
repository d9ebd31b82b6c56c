use std::path::{Path, PathBuf};

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::{CodebookError, Result};

/// Distance used by the mapper to rank codebook entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMeasure {
    Euclidean,
    Mahalanobis,
    #[default]
    InverseHarmonic,
}

/// How the mapper turns distances of the best matches into weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightingMethod {
    #[default]
    ExponentialHalfWindow,
    InverseDistance,
    Gaussian,
}

/// Settings shared by every transformer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
#[builder(default, setter(into), build_fn(error = "CodebookError"))]
pub struct BaselineTransformerParams {
    /// Folder holding the input utterances.
    pub input_folder: PathBuf,
    /// Root folder for transformed output.
    pub output_base_folder: PathBuf,
    /// Map source features to target features (false maps the other way).
    pub is_source_to_target: bool,
    pub is_display_processing_frame_count: bool,
    pub is_fixed_rate_vocal_tract_conversion: bool,
}

impl Default for BaselineTransformerParams {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::new(),
            output_base_folder: PathBuf::new(),
            is_source_to_target: true,
            is_display_processing_frame_count: false,
            is_fixed_rate_vocal_tract_conversion: false,
        }
    }
}

/// Parameters of the weighted codebook mapper.
///
/// The defaults are this crate's own starting point and not values taken
/// from any reference configuration. Set every field explicitly when
/// matching the output of another toolkit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Builder)]
#[serde(default)]
#[builder(default, build_fn(error = "CodebookError"))]
pub struct MapperParams {
    /// Number of closest codebook entries combined per input frame. Defaults to 15.
    pub num_best_matches: usize,
    /// Steepness of the weighting curve. Larger values favour the best match.
    /// Defaults to 1.0.
    pub weighting_steepness: f64,
    /// Defaults to [`DistanceMeasure::InverseHarmonic`].
    pub distance_measure: DistanceMeasure,
    /// Defaults to [`WeightingMethod::ExponentialHalfWindow`].
    pub weighting_method: WeightingMethod,
}

impl Default for MapperParams {
    fn default() -> Self {
        Self {
            num_best_matches: 15,
            weighting_steepness: 1.0,
            distance_measure: DistanceMeasure::default(),
            weighting_method: WeightingMethod::default(),
        }
    }
}

/// Configuration of a weighted codebook transformation.
///
/// Cloning deep-copies the nested [`MapperParams`]; copies share no state.
///
/// ```rust
/// use voice_codebook::codebook::CodebookTransformerParamsBuilder;
///
/// let params = CodebookTransformerParamsBuilder::default()
///     .codebook_file("voices/f2m.codebook")
///     .is_context_based_preselection(true)
///     .total_context_neighbours(5usize)
///     .build()?;
/// assert_eq!(params.context_neighbours(), Some(5));
/// # Ok::<(), voice_codebook::CodebookError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, Builder)]
#[serde(default)]
#[builder(default, setter(into), build_fn(error = "CodebookError"))]
pub struct CodebookTransformerParams {
    pub baseline: BaselineTransformerParams,
    /// Codebook file holding the persisted Gaussian components.
    pub codebook_file: PathBuf,
    pub mapper_params: MapperParams,
    /// Restrict candidates to a contextual neighbourhood of each unit.
    pub is_context_based_preselection: bool,
    /// Neighbourhood size, only meaningful with context-based preselection.
    pub total_context_neighbours: usize,
}

impl CodebookTransformerParams {
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| CodebookError::Config(format!("Failed to parse JSON: {e}")))
    }

    /// Load parameters from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        log::info!("Loading codebook transformer parameters from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| CodebookError::Config(format!("Failed to serialize JSON: {e}")))
    }

    /// Neighbourhood size when context-based preselection is enabled.
    pub fn context_neighbours(&self) -> Option<usize> {
        self.is_context_based_preselection
            .then_some(self.total_context_neighbours)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = CodebookTransformerParams::default();
        assert_eq!(params.codebook_file, PathBuf::new());
        assert!(!params.is_context_based_preselection);
        assert_eq!(params.total_context_neighbours, 0);
        assert_eq!(params.context_neighbours(), None);
        assert!(params.baseline.is_source_to_target);
        assert_eq!(params.mapper_params.num_best_matches, 15);
    }

    #[test]
    fn test_mapper_defaults() {
        let mapper = MapperParams::default();
        assert_eq!(mapper.num_best_matches, 15);
        assert_eq!(mapper.weighting_steepness, 1.0);
        assert_eq!(mapper.distance_measure, DistanceMeasure::InverseHarmonic);
        assert_eq!(mapper.weighting_method, WeightingMethod::ExponentialHalfWindow);
        assert_eq!(MapperParamsBuilder::default().build().unwrap(), mapper);
    }

    #[test]
    fn test_clone_is_deep() {
        let original = CodebookTransformerParams::default();
        let mut copy = original.clone();
        copy.mapper_params.num_best_matches = 3;
        copy.mapper_params.weighting_method = WeightingMethod::Gaussian;
        assert_eq!(original.mapper_params.num_best_matches, 15);
        assert_eq!(
            original.mapper_params.weighting_method,
            WeightingMethod::ExponentialHalfWindow
        );
    }

    #[test]
    fn test_switch_gates_neighbours() {
        let mut params = CodebookTransformerParams {
            total_context_neighbours: 4,
            ..Default::default()
        };
        assert_eq!(params.context_neighbours(), None);
        params.is_context_based_preselection = true;
        assert_eq!(params.context_neighbours(), Some(4));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{
            "codebook_file": "f2m.codebook",
            "is_context_based_preselection": true,
            "total_context_neighbours": 7,
            "mapper_params": { "distance_measure": "euclidean" }
        }"#;
        let params = CodebookTransformerParams::from_json_str(json).unwrap();
        assert_eq!(params.codebook_file, PathBuf::from("f2m.codebook"));
        assert_eq!(params.context_neighbours(), Some(7));
        assert_eq!(params.mapper_params.distance_measure, DistanceMeasure::Euclidean);
        assert_eq!(params.mapper_params.num_best_matches, 15);
        assert!(params.baseline.is_source_to_target);
    }

    #[test]
    fn test_json_round_trip() {
        let params = CodebookTransformerParamsBuilder::default()
            .codebook_file("a.codebook")
            .mapper_params(
                MapperParamsBuilder::default()
                    .num_best_matches(4usize)
                    .weighting_steepness(2.5)
                    .build()
                    .unwrap(),
            )
            .build()
            .unwrap();
        let json = params.to_json_string().unwrap();
        assert_eq!(CodebookTransformerParams::from_json_str(&json).unwrap(), params);
    }

    #[test]
    fn test_rejects_bad_json() {
        let err = CodebookTransformerParams::from_json_str(r#"{"total_context_neighbours": -1}"#)
            .unwrap_err();
        assert!(matches!(err, CodebookError::Config(_)));
    }
}
