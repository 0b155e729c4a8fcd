//! Model Bundle Artifact

use crate::model::{ModelSpec, ScoringModel};
use crate::InferenceError;
use data_validator::{StandardScaler, ValidationError};
use feature_engine::{
    AgeBins, CustomerRecord, FeatureEngineer, FeatureFrame, LabelEncoder, COLUMNS,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::Path;
use tracing::{debug, info, warn};

/// Number of AgeGroup labels the model was trained with
const AGE_GROUPS: usize = 5;

/// Source name reported for bundles parsed from a string
const IN_MEMORY: &str = "<memory>";

/// Provenance recorded alongside the fitted artifacts
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BundleMetadata {
    /// Artifact version label
    #[serde(default)]
    pub version: Option<String>,
    /// Offline evaluation metrics, e.g. `roc_auc`
    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}

/// On-disk layout of the bundle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleFile {
    pub model: ModelSpec,
    pub scaler: StandardScaler,
    pub le_geo: LabelEncoder,
    pub feature_names: Vec<String>,
    /// Fixed AgeGroup edges from training
    #[serde(default)]
    pub age_bins: Option<AgeBins>,
    #[serde(default)]
    pub metadata: BundleMetadata,
}

/// Loaded, validated bundle. Immutable once built.
#[derive(Debug)]
pub struct ModelBundle {
    engineer: FeatureEngineer,
    scaler: StandardScaler,
    feature_names: Vec<String>,
    model: ScoringModel,
    metadata: BundleMetadata,
}

impl ModelBundle {
    /// Read and validate a bundle from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, InferenceError> {
        let path = path.as_ref();
        info!(path = %path.display(), "Loading model bundle");

        let raw = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => InferenceError::ArtifactMissing(path.to_path_buf()),
            _ => InferenceError::ArtifactCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;
        let file: BundleFile =
            serde_json::from_str(&raw).map_err(|e| InferenceError::ArtifactCorrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;

        let bundle = Self::from_file(file, path)?;

        info!(
            path = %path.display(),
            features = bundle.feature_count(),
            version = bundle.metadata.version.as_deref().unwrap_or("unversioned"),
            "Model bundle loaded"
        );
        Ok(bundle)
    }

    /// Parse a bundle held in memory. ONNX paths resolve against the working directory.
    pub fn from_json(json: &str) -> Result<Self, InferenceError> {
        let source = Path::new(IN_MEMORY);
        let file: BundleFile =
            serde_json::from_str(json).map_err(|e| InferenceError::ArtifactCorrupt {
                path: source.to_path_buf(),
                reason: e.to_string(),
            })?;
        Self::from_file(file, source)
    }

    /// Validate parsed artifacts and assemble the bundle.
    ///
    /// `source` is the bundle file; errors name it and ONNX paths resolve
    /// against its directory.
    pub fn from_file(file: BundleFile, source: &Path) -> Result<Self, InferenceError> {
        let BundleFile {
            model,
            scaler,
            le_geo,
            feature_names,
            age_bins,
            metadata,
        } = file;

        check_feature_names(&feature_names)?;

        scaler.check().map_err(|e| corrupt(source, "scaler", e))?;
        if scaler.width() != feature_names.len() {
            return Err(InferenceError::SchemaMismatch(format!(
                "scaler was fitted on {} features but feature_names lists {}",
                scaler.width(),
                feature_names.len()
            )));
        }

        if le_geo.classes().is_empty() || !le_geo.is_well_formed() {
            return Err(InferenceError::ArtifactCorrupt {
                path: source.to_path_buf(),
                reason: "le_geo classes must be non-empty, sorted and unique".to_string(),
            });
        }

        let age_bins = match age_bins {
            Some(bins) => {
                bins.check()?;
                bins
            }
            None => {
                warn!("Bundle has no age_bins, using equal-width edges over the training age range");
                AgeBins::training_default()
            }
        };
        if age_bins.len() != AGE_GROUPS {
            return Err(InferenceError::SchemaMismatch(format!(
                "age_bins defines {} groups, model expects {AGE_GROUPS}",
                age_bins.len()
            )));
        }

        let model = ScoringModel::from_spec(model, source, feature_names.len())?;
        if model.input_width() != feature_names.len() {
            return Err(InferenceError::SchemaMismatch(format!(
                "model expects {} inputs but feature_names lists {}",
                model.input_width(),
                feature_names.len()
            )));
        }

        Ok(Self {
            engineer: FeatureEngineer::new(le_geo, age_bins),
            scaler,
            feature_names,
            model,
            metadata,
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn feature_count(&self) -> usize {
        self.feature_names.len()
    }

    pub fn metadata(&self) -> &BundleMetadata {
        &self.metadata
    }

    pub fn engineer(&self) -> &FeatureEngineer {
        &self.engineer
    }

    pub fn scaler(&self) -> &StandardScaler {
        &self.scaler
    }

    pub fn model(&self) -> &ScoringModel {
        &self.model
    }

    /// Engineered and encoded columns, missing cells filled
    pub fn frame(&self, record: &CustomerRecord) -> Result<FeatureFrame, InferenceError> {
        Ok(self.engineer.frame(record)?)
    }

    /// Unscaled model input in `feature_names` order
    pub fn feature_vector(&self, record: &CustomerRecord) -> Result<Vec<f64>, InferenceError> {
        let frame = self.frame(record)?;
        Ok(frame.select(&self.feature_names)?)
    }

    /// Model input after the fitted scaler
    pub fn scaled_vector(&self, record: &CustomerRecord) -> Result<Vec<f64>, InferenceError> {
        let features = self.feature_vector(record)?;
        self.scaler.transform(&features).map_err(|e| match e {
            ValidationError::DimensionMismatch { expected, actual } => {
                InferenceError::InvalidInputShape { expected, actual }
            }
            other => InferenceError::InferenceFailed(other.to_string()),
        })
    }

    /// Churn probability for one record
    pub fn score(&self, record: &CustomerRecord) -> Result<f64, InferenceError> {
        let scaled = self.scaled_vector(record)?;
        let probability = self.model.predict(&scaled)?;

        if !(0.0..=1.0).contains(&probability) {
            warn!(probability, "Model output outside [0, 1]");
            return Err(InferenceError::OutOfRangeProbability(probability));
        }

        debug!(probability, "Scored customer record");
        Ok(probability)
    }
}

fn corrupt(source: &Path, what: &str, err: ValidationError) -> InferenceError {
    InferenceError::ArtifactCorrupt {
        path: source.to_path_buf(),
        reason: format!("{what}: {err}"),
    }
}

/// Every listed feature must be producible, and listed once
fn check_feature_names(names: &[String]) -> Result<(), InferenceError> {
    if names.is_empty() {
        return Err(InferenceError::SchemaMismatch(
            "feature_names is empty".to_string(),
        ));
    }

    let unknown: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|name| !COLUMNS.contains(name))
        .collect();
    if !unknown.is_empty() {
        return Err(InferenceError::SchemaMismatch(format!(
            "features not produced by feature engineering: {unknown:?}"
        )));
    }

    let mut seen = HashSet::new();
    if let Some(dup) = names.iter().find(|name| !seen.insert(name.as_str())) {
        return Err(InferenceError::SchemaMismatch(format!(
            "feature {dup:?} listed more than once"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Activation, DenseLayer};

    /// Logistic unit over Age and InactiveHighBalance
    fn bundle_file(age_weight: f64, bias: f64, activation: Activation) -> BundleFile {
        BundleFile {
            model: ModelSpec::Dense {
                layers: vec![DenseLayer {
                    weights: vec![vec![age_weight, 0.0]],
                    bias: vec![bias],
                    activation,
                }],
            },
            scaler: StandardScaler::new(vec![40.0, 0.0], vec![10.0, 1.0]).unwrap(),
            le_geo: LabelEncoder::fit(["France", "Germany", "Spain"]),
            feature_names: vec!["Age".to_string(), "InactiveHighBalance".to_string()],
            age_bins: Some(AgeBins::training_default()),
            metadata: BundleMetadata::default(),
        }
    }

    fn bundle(age_weight: f64) -> ModelBundle {
        let file = bundle_file(age_weight, 0.0, Activation::Sigmoid);
        ModelBundle::from_file(file, Path::new("churn_bundle.json")).unwrap()
    }

    #[test]
    fn test_feature_vector_order() {
        let record = CustomerRecord {
            is_active_member: 0,
            balance: 150_000.0,
            ..Default::default()
        };
        let b = bundle(1.0);
        assert_eq!(b.feature_vector(&record).unwrap(), vec![42.0, 1.0]);
        let scaled = b.scaled_vector(&record).unwrap();
        assert!((scaled[0] - 0.2).abs() < 1e-12);
        assert_eq!(scaled[1], 1.0);
    }

    #[test]
    fn test_score_logistic() {
        let p = bundle(0.0).score(&CustomerRecord::default()).unwrap();
        assert_eq!(p, 0.5);

        let p = bundle(1.0).score(&CustomerRecord::default()).unwrap();
        let expected = 1.0 / (1.0 + (-0.2f64).exp());
        assert!((p - expected).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_geography() {
        let record = CustomerRecord {
            geography: "Italy".to_string(),
            ..Default::default()
        };
        let err = bundle(1.0).score(&record).unwrap_err();
        assert_eq!(err.kind(), "unknown_category");
        assert!(err.is_input_error());
    }

    #[test]
    fn test_out_of_range_output_flagged() {
        let file = bundle_file(0.0, 2.0, Activation::Linear);
        let b = ModelBundle::from_file(file, Path::new("churn_bundle.json")).unwrap();
        let err = b.score(&CustomerRecord::default()).unwrap_err();
        assert!(matches!(err, InferenceError::OutOfRangeProbability(p) if p == 2.0));
    }

    #[test]
    fn test_unknown_feature_name_rejected_at_load() {
        let mut file = bundle_file(1.0, 0.0, Activation::Sigmoid);
        file.feature_names[1] = "Surname".to_string();
        let err = ModelBundle::from_file(file, Path::new("churn_bundle.json")).unwrap_err();
        assert_eq!(err.kind(), "schema_mismatch");
    }

    #[test]
    fn test_duplicate_feature_name_rejected() {
        let mut file = bundle_file(1.0, 0.0, Activation::Sigmoid);
        file.feature_names[1] = "Age".to_string();
        assert!(matches!(
            ModelBundle::from_file(file, Path::new("churn_bundle.json")),
            Err(InferenceError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_scaler_width_mismatch_rejected() {
        let mut file = bundle_file(1.0, 0.0, Activation::Sigmoid);
        file.scaler = StandardScaler::new(vec![0.0; 3], vec![1.0; 3]).unwrap();
        assert!(matches!(
            ModelBundle::from_file(file, Path::new("churn_bundle.json")),
            Err(InferenceError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_model_width_mismatch_rejected() {
        let mut file = bundle_file(1.0, 0.0, Activation::Sigmoid);
        file.model = ModelSpec::Dense {
            layers: vec![DenseLayer {
                weights: vec![vec![1.0, 1.0, 1.0]],
                bias: vec![0.0],
                activation: Activation::Sigmoid,
            }],
        };
        assert!(matches!(
            ModelBundle::from_file(file, Path::new("churn_bundle.json")),
            Err(InferenceError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_missing_age_bins_uses_training_default() {
        let mut file = bundle_file(1.0, 0.0, Activation::Sigmoid);
        file.age_bins = None;
        let b = ModelBundle::from_file(file, Path::new("churn_bundle.json")).unwrap();
        assert_eq!(b.engineer().age_bins(), &AgeBins::training_default());
    }

    #[test]
    fn test_wrong_age_group_count_rejected() {
        let mut file = bundle_file(1.0, 0.0, Activation::Sigmoid);
        file.age_bins = Some(AgeBins::from_edges(vec![18.0, 50.0, 92.0]).unwrap());
        assert!(matches!(
            ModelBundle::from_file(file, Path::new("churn_bundle.json")),
            Err(InferenceError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_through_loader() {
        let json = serde_json::to_string(&bundle_file(1.0, 0.0, Activation::Sigmoid)).unwrap();
        let b = ModelBundle::from_json(&json).unwrap();
        assert_eq!(b.feature_count(), 2);
    }

    #[test]
    fn test_corrupt_json() {
        let err = ModelBundle::from_json("{ not json").unwrap_err();
        assert!(matches!(err, InferenceError::ArtifactCorrupt { .. }));
        assert_eq!(err.kind(), "artifact_missing");
    }

    #[test]
    fn test_corrupt_artifact_names_bundle_file() {
        let mut file = bundle_file(1.0, 0.0, Activation::Sigmoid);
        file.le_geo = LabelEncoder::fit(Vec::<String>::new());
        let source = Path::new("/models/churn_bundle.json");
        match ModelBundle::from_file(file, source).unwrap_err() {
            InferenceError::ArtifactCorrupt { path, .. } => assert_eq!(path.as_path(), source),
            other => panic!("expected ArtifactCorrupt, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = ModelBundle::load("/nonexistent/churn_bundle.json").unwrap_err();
        assert!(matches!(err, InferenceError::ArtifactMissing(_)));
    }
}
