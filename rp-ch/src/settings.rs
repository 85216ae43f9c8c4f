//! Preprocessor configuration.
use std::path::Path;

use anyhow::{
    Context,
    Result,
};
use serde::{
    Deserialize,
    Serialize,
};

use crate::errors::ContractionError;

/// Tuning knobs of the contraction. Read-only once preprocessing has started.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreprocessorSettings {
    /// Maximum number of edges a witness path may have. 0 disables the witness search.
    pub search_space_hop_limit: u32,
    /// Radius (in hops) of the neighbourhood in which a vertex must have the lowest priority to
    /// be contracted in the current round. Must be at least 1.
    pub k_neighborhood: u32,
    /// Weight of shortcuts added / edges removed in the priority.
    pub edge_quotient_factor: f64,
    /// Weight of the hierarchy depth in the priority.
    pub hierarchy_depths_factor: f64,
    /// Weight of input edges added / input edges removed in the priority.
    pub original_edge_quotient_factor: f64,
    /// Number of worker threads.
    pub num_threads: usize,
    /// Number of vertices a worker takes from the round's batch source at a time.
    pub batch_size: usize,
}

impl Default for PreprocessorSettings {
    fn default() -> Self {
        Self {
            search_space_hop_limit: 5,
            k_neighborhood: 2,
            edge_quotient_factor: 2.0,
            hierarchy_depths_factor: 1.0,
            original_edge_quotient_factor: 1.0,
            num_threads: rayon::current_num_threads(),
            batch_size: 32,
        }
    }
}

impl PreprocessorSettings {
    /// Loads settings from a YAML file; missing fields take their defaults.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
        let settings: Self =
            serde_yaml::from_reader(file).with_context(|| format!("parsing settings from {}", path.display()))?;
        Ok(settings)
    }

    /// Rejects settings the contraction cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.num_threads == 0 {
            return Err(ContractionError::invalid_settings("num_threads must be at least 1"));
        }
        if self.k_neighborhood == 0 {
            return Err(ContractionError::invalid_settings(
                "k_neighborhood must be at least 1, otherwise adjacent vertices share a round",
            ));
        }
        if self.batch_size == 0 {
            return Err(ContractionError::invalid_settings("batch_size must be at least 1"));
        }
        for (name, factor) in [
            ("edge_quotient_factor", self.edge_quotient_factor),
            ("hierarchy_depths_factor", self.hierarchy_depths_factor),
            ("original_edge_quotient_factor", self.original_edge_quotient_factor),
        ] {
            if !factor.is_finite() || factor < 0.0 {
                return Err(ContractionError::invalid_settings(format!(
                    "{name} must be a finite non-negative number, got {factor}"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        PreprocessorSettings::default().validate().unwrap();
    }

    #[rstest]
    #[case::no_threads(PreprocessorSettings { num_threads: 0, ..Default::default() })]
    #[case::no_neighborhood(PreprocessorSettings { k_neighborhood: 0, ..Default::default() })]
    #[case::no_batch(PreprocessorSettings { batch_size: 0, ..Default::default() })]
    #[case::negative_factor(PreprocessorSettings { edge_quotient_factor: -1.0, ..Default::default() })]
    #[case::nan_factor(PreprocessorSettings { original_edge_quotient_factor: f64::NAN, ..Default::default() })]
    fn test_invalid_settings(#[case] settings: PreprocessorSettings) {
        let err = settings.validate().unwrap_err();
        assert!(matches!(err.downcast_ref::<ContractionError>(), Some(ContractionError::InvalidSettings(_))));
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let settings: PreprocessorSettings = serde_yaml::from_str("search_space_hop_limit: 7\nnum_threads: 3\n").unwrap();
        assert_eq!(settings.search_space_hop_limit, 7);
        assert_eq!(settings.num_threads, 3);
        assert_eq!(settings.k_neighborhood, 2);
    }

    #[test]
    fn test_unknown_yaml_field_is_rejected() {
        assert!(serde_yaml::from_str::<PreprocessorSettings>("hop_limit: 7\n").is_err());
    }

    #[test]
    fn test_negative_hop_limit_is_rejected() {
        assert!(serde_yaml::from_str::<PreprocessorSettings>("search_space_hop_limit: -1\n").is_err());
    }
}
