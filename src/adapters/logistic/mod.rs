//! Logistic adapter: `Classifier` backed by a JSON-exported logistic model.
//!
//! The training pipeline exports standardization parameters and coefficients
//! for the numeric columns, and one weight per category for the categorical
//! columns. Inference is a dot product followed by a sigmoid.
//!
//! # Integrity
//!
//! When a `manifest.json` sits next to the model, it must bind the model
//! file by SHA-256. A missing binding or a digest mismatch refuses the load.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::{PredictionRecord, FEATURE_NAMES};
use crate::ports::{Classifier, ClassifierError};

/// Model file looked up when the configured path is a directory.
pub const MODEL_FILE: &str = "model.json";

/// Optional digest manifest next to the model file.
pub const MANIFEST_FILE: &str = "manifest.json";

const SUPPORTED_FORMAT_VERSION: u32 = 1;

/// Columns encoded one-hot by the training pipeline.
const CATEGORICAL_FEATURES: [&str; 2] = ["gender", "smoking_history"];

/// Errors raised while loading a model artifact.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Model artifact not found at {0:?}")]
    NotFound(PathBuf),

    #[error("Failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed model artifact: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid model artifact: {0}")]
    Invalid(String),

    #[error("manifest.json does not bind {0}")]
    Unbound(String),

    #[error("Digest mismatch for {file}: expected {expected}, got {actual}")]
    DigestMismatch {
        file: String,
        expected: String,
        actual: String,
    },
}

fn default_threshold() -> f64 {
    0.5
}

/// Standardized numeric column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericFeature {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
    pub coefficient: f64,
}

/// One-hot encoded column: a weight per known category.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoricalFeature {
    pub name: String,
    pub coefficients: BTreeMap<String, f64>,
}

/// Model parameters as exported by the training pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedLogisticModel {
    pub format_version: u32,
    pub feature_names: Vec<String>,
    pub intercept: f64,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    pub numeric: Vec<NumericFeature>,
    pub categorical: Vec<CategoricalFeature>,
}

/// Digest manifest: file name to lowercase hex SHA-256.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelManifest {
    pub version: u32,
    pub files: BTreeMap<String, String>,
}

/// Lowercase hex SHA-256 of `bytes`.
#[must_use]
pub fn sha256_hex(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

// Constant-time compare for ASCII strings (used for SHA-256 hex digests).
fn constant_time_eq_str(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes().iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

fn read_bytes(path: &Path) -> Result<Vec<u8>, ModelError> {
    fs::read(path).map_err(|source| ModelError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Check `model_bytes` against the manifest in `dir`, if there is one.
fn verify_manifest(dir: &Path, file_name: &str, model_bytes: &[u8]) -> Result<bool, ModelError> {
    let manifest_path = dir.join(MANIFEST_FILE);
    if !manifest_path.exists() {
        return Ok(false);
    }

    let manifest: ModelManifest = serde_json::from_slice(&read_bytes(&manifest_path)?)?;
    let expected = manifest
        .files
        .get(file_name)
        .ok_or_else(|| ModelError::Unbound(file_name.to_string()))?;

    let actual = sha256_hex(model_bytes);
    if !constant_time_eq_str(&expected.to_ascii_lowercase(), &actual) {
        return Err(ModelError::DigestMismatch {
            file: file_name.to_string(),
            expected: expected.clone(),
            actual,
        });
    }
    Ok(true)
}

/// Bind `file_name` by the digest of `model_bytes` in the manifest in `dir`.
///
/// Other bindings already in the manifest are kept. A manifest that cannot
/// be parsed is left untouched and reported. Returns the manifest path.
///
/// # Errors
/// Returns error if the existing manifest is unreadable or malformed, or if
/// the manifest cannot be written.
pub fn bind_in_manifest(
    dir: &Path,
    file_name: &str,
    model_bytes: &[u8],
) -> Result<PathBuf, ModelError> {
    let manifest_path = dir.join(MANIFEST_FILE);

    let mut manifest = if manifest_path.exists() {
        serde_json::from_slice::<ModelManifest>(&read_bytes(&manifest_path)?)?
    } else {
        ModelManifest {
            version: 1,
            files: BTreeMap::new(),
        }
    };
    manifest
        .files
        .insert(file_name.to_string(), sha256_hex(model_bytes));

    let bytes = serde_json::to_vec_pretty(&manifest)?;
    fs::write(&manifest_path, bytes).map_err(|source| ModelError::Io {
        path: manifest_path.clone(),
        source,
    })?;
    Ok(manifest_path)
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Logistic classifier loaded from an exported artifact.
#[derive(Debug, Clone)]
pub struct LogisticModel {
    model: ExportedLogisticModel,
    source: Option<PathBuf>,
}

impl LogisticModel {
    /// Load a model from a file, or from `model.json` inside a directory.
    ///
    /// # Errors
    /// Returns error if the artifact is missing, unreadable, not bound by its
    /// manifest, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let model_path = if path.is_dir() {
            path.join(MODEL_FILE)
        } else {
            path.to_path_buf()
        };
        if !model_path.is_file() {
            return Err(ModelError::NotFound(model_path));
        }

        let dir = model_path.parent().unwrap_or_else(|| Path::new("."));
        let file_name = model_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(MODEL_FILE)
            .to_string();

        let bytes = read_bytes(&model_path)?;
        let verified = verify_manifest(dir, &file_name, &bytes)?;
        if !verified {
            tracing::warn!(
                "No {} next to {:?}; loading without digest check",
                MANIFEST_FILE,
                model_path
            );
        }

        let exported: ExportedLogisticModel = serde_json::from_slice(&bytes)?;
        let mut model = Self::from_exported(exported)?;
        model.source = Some(model_path.clone());

        tracing::info!(
            "Loaded model from {:?} (features={}, threshold={}, digest_verified={})",
            model_path,
            model.feature_count(),
            model.threshold(),
            verified
        );
        Ok(model)
    }

    /// Build a classifier from already-parsed parameters.
    ///
    /// # Errors
    /// Returns `ModelError::Invalid` if the parameters do not describe the
    /// eight record columns exactly once with finite values.
    pub fn from_exported(model: ExportedLogisticModel) -> Result<Self, ModelError> {
        Self::validate(&model)?;
        Ok(Self {
            model,
            source: None,
        })
    }

    fn validate(model: &ExportedLogisticModel) -> Result<(), ModelError> {
        let invalid = |msg: String| Err(ModelError::Invalid(msg));

        if model.format_version != SUPPORTED_FORMAT_VERSION {
            return invalid(format!(
                "format_version {} not supported (expected {SUPPORTED_FORMAT_VERSION})",
                model.format_version
            ));
        }

        let expected: BTreeSet<&str> = FEATURE_NAMES.iter().copied().collect();
        let declared: BTreeSet<&str> = model.feature_names.iter().map(String::as_str).collect();
        if declared != expected || model.feature_names.len() != FEATURE_NAMES.len() {
            return invalid(format!(
                "feature_names must be exactly {:?}, got {:?}",
                FEATURE_NAMES, model.feature_names
            ));
        }

        let mut covered = BTreeSet::new();
        for feature in &model.numeric {
            if CATEGORICAL_FEATURES.contains(&feature.name.as_str()) {
                return invalid(format!("{} is categorical, not numeric", feature.name));
            }
            if !feature.mean.is_finite() || !feature.coefficient.is_finite() {
                return invalid(format!("{} has non-finite parameters", feature.name));
            }
            if !(feature.scale.is_finite() && feature.scale > 0.0) {
                return invalid(format!("{} scale must be > 0", feature.name));
            }
            if !covered.insert(feature.name.as_str()) {
                return invalid(format!("{} described twice", feature.name));
            }
        }
        for feature in &model.categorical {
            if !CATEGORICAL_FEATURES.contains(&feature.name.as_str()) {
                return invalid(format!("{} is numeric, not categorical", feature.name));
            }
            if feature.coefficients.is_empty() {
                return invalid(format!("{} has no categories", feature.name));
            }
            if feature.coefficients.values().any(|w| !w.is_finite()) {
                return invalid(format!("{} has non-finite weights", feature.name));
            }
            if !covered.insert(feature.name.as_str()) {
                return invalid(format!("{} described twice", feature.name));
            }
        }
        if covered != expected {
            let missing: Vec<_> = expected.difference(&covered).collect();
            return invalid(format!("no parameters for {missing:?}"));
        }

        if !model.intercept.is_finite() {
            return invalid("intercept must be finite".into());
        }
        if !(model.threshold > 0.0 && model.threshold < 1.0) {
            return invalid(format!("threshold {} must lie in (0, 1)", model.threshold));
        }
        Ok(())
    }

    /// Number of input columns.
    #[must_use]
    pub fn feature_count(&self) -> usize {
        self.model.feature_names.len()
    }

    /// Decision threshold on the positive-class probability.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.model.threshold
    }

    /// Where the model was loaded from, if it came from disk.
    #[must_use]
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Linear score before the sigmoid.
    fn decision(&self, record: &PredictionRecord) -> Result<f64, ClassifierError> {
        let mut z = self.model.intercept;

        for feature in &self.model.numeric {
            let x = record
                .numeric(&feature.name)
                .ok_or_else(|| ClassifierError::MissingFeature(feature.name.clone()))?;
            z += feature.coefficient * (x - feature.mean) / feature.scale;
        }

        for feature in &self.model.categorical {
            let value = record
                .category(&feature.name)
                .ok_or_else(|| ClassifierError::MissingFeature(feature.name.clone()))?;
            let weight = feature.coefficients.get(value).ok_or_else(|| {
                ClassifierError::UnknownCategory {
                    feature: feature.name.clone(),
                    value: value.to_string(),
                }
            })?;
            z += weight;
        }

        if !z.is_finite() {
            return Err(ClassifierError::Inference(
                "decision value is not finite".into(),
            ));
        }
        Ok(z)
    }
}

impl Classifier for LogisticModel {
    fn predict_proba(&self, record: &PredictionRecord) -> Result<[f64; 2], ClassifierError> {
        let p = sigmoid(self.decision(record)?);
        Ok([1.0 - p, p])
    }

    fn predict(&self, record: &PredictionRecord) -> Result<u8, ClassifierError> {
        let [_, p] = self.predict_proba(record)?;
        Ok(u8::from(p >= self.model.threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Gender, SmokingHistory};
    use tempfile::tempdir;

    fn exported_model() -> ExportedLogisticModel {
        let numeric = |name: &str, mean: f64, scale: f64, coefficient: f64| NumericFeature {
            name: name.into(),
            mean,
            scale,
            coefficient,
        };
        ExportedLogisticModel {
            format_version: 1,
            feature_names: FEATURE_NAMES.iter().map(|s| (*s).to_string()).collect(),
            intercept: -4.0,
            threshold: 0.5,
            numeric: vec![
                numeric("hypertension", 0.0, 1.0, 0.5),
                numeric("heart_disease", 0.0, 1.0, 0.5),
                numeric("age", 40.0, 20.0, 1.0),
                numeric("bmi", 27.0, 6.0, 0.5),
                numeric("HbA1c_level", 5.5, 1.0, 2.0),
                numeric("blood_glucose_level", 140.0, 40.0, 1.5),
            ],
            categorical: vec![
                CategoricalFeature {
                    name: "gender".into(),
                    coefficients: [("Female".to_string(), 0.0), ("Male".to_string(), 0.3)]
                        .into_iter()
                        .collect(),
                },
                CategoricalFeature {
                    name: "smoking_history".into(),
                    coefficients: ["never", "former", "current", "not current", "ever"]
                        .iter()
                        .map(|c| ((*c).to_string(), 0.1))
                        .collect(),
                },
            ],
        }
    }

    fn record(age: u32, hba1c: f64, glucose: f64) -> PredictionRecord {
        PredictionRecord {
            gender: Gender::Female,
            smoking_history: SmokingHistory::Never,
            hypertension: 0,
            heart_disease: 0,
            age,
            bmi: 22.0,
            hba1c_level: hba1c,
            blood_glucose_level: glucose,
        }
    }

    fn write_model(dir: &Path) -> Vec<u8> {
        let bytes = serde_json::to_vec_pretty(&exported_model()).expect("serialize model");
        fs::write(dir.join(MODEL_FILE), &bytes).expect("write model");
        bytes
    }

    fn write_manifest(dir: &Path, files: &[(&str, String)]) {
        let manifest = ModelManifest {
            version: 1,
            files: files
                .iter()
                .map(|(name, digest)| ((*name).to_string(), digest.clone()))
                .collect(),
        };
        fs::write(
            dir.join(MANIFEST_FILE),
            serde_json::to_vec(&manifest).expect("serialize manifest"),
        )
        .expect("write manifest");
    }

    #[test]
    fn test_load_from_directory_with_manifest() {
        let dir = tempdir().expect("tempdir");
        let bytes = write_model(dir.path());
        write_manifest(dir.path(), &[(MODEL_FILE, sha256_hex(&bytes))]);

        let model = LogisticModel::load(dir.path()).expect("load");
        assert_eq!(model.feature_count(), 8);
        assert_eq!(model.source(), Some(dir.path().join(MODEL_FILE).as_path()));
    }

    #[test]
    fn test_load_from_file_without_manifest() {
        let dir = tempdir().expect("tempdir");
        write_model(dir.path());
        assert!(LogisticModel::load(&dir.path().join(MODEL_FILE)).is_ok());
    }

    #[test]
    fn test_load_fails_on_digest_mismatch() {
        let dir = tempdir().expect("tempdir");
        write_model(dir.path());
        write_manifest(dir.path(), &[(MODEL_FILE, sha256_hex(b"something else"))]);

        assert!(matches!(
            LogisticModel::load(dir.path()),
            Err(ModelError::DigestMismatch { .. })
        ));
    }

    #[test]
    fn test_load_fails_if_manifest_does_not_bind_model() {
        let dir = tempdir().expect("tempdir");
        write_model(dir.path());
        write_manifest(dir.path(), &[("other.json", sha256_hex(b"x"))]);

        assert!(matches!(
            LogisticModel::load(dir.path()),
            Err(ModelError::Unbound(_))
        ));
    }

    #[test]
    fn test_load_fails_when_missing_or_corrupt() {
        let dir = tempdir().expect("tempdir");
        assert!(matches!(
            LogisticModel::load(dir.path()),
            Err(ModelError::NotFound(_))
        ));

        fs::write(dir.path().join(MODEL_FILE), b"{ not json").expect("write");
        assert!(matches!(
            LogisticModel::load(dir.path()),
            Err(ModelError::Parse(_))
        ));
    }

    #[test]
    fn test_rejects_incomplete_parameters() {
        let mut model = exported_model();
        model.numeric.retain(|f| f.name != "bmi");
        assert!(matches!(
            LogisticModel::from_exported(model),
            Err(ModelError::Invalid(_))
        ));

        let mut model = exported_model();
        model.numeric[0].scale = 0.0;
        assert!(LogisticModel::from_exported(model).is_err());

        let mut model = exported_model();
        model.threshold = 1.0;
        assert!(LogisticModel::from_exported(model).is_err());

        let mut model = exported_model();
        model.feature_names.push("insulin".into());
        assert!(LogisticModel::from_exported(model).is_err());
    }

    #[test]
    fn test_probabilities_form_a_distribution() {
        let model = LogisticModel::from_exported(exported_model()).expect("valid");
        for (age, hba1c, glucose) in [(30, 5.5, 100.0), (85, 9.0, 280.0), (0, 3.0, 50.0)] {
            let [p0, p1] = model.predict_proba(&record(age, hba1c, glucose)).expect("score");
            assert!((0.0..=1.0).contains(&p1));
            assert!((p0 + p1 - 1.0).abs() < 1e-12);
            let label = model.predict(&record(age, hba1c, glucose)).expect("label");
            assert_eq!(label, u8::from(p1 >= 0.5));
        }
    }

    #[test]
    fn test_risk_increases_with_glycemic_markers() {
        let model = LogisticModel::from_exported(exported_model()).expect("valid");
        let [_, low] = model.predict_proba(&record(30, 5.5, 100.0)).expect("score");
        let [_, high] = model.predict_proba(&record(30, 9.0, 250.0)).expect("score");
        assert!(high > low);
        assert_eq!(model.predict(&record(30, 5.5, 100.0)), Ok(0));
        assert_eq!(model.predict(&record(30, 9.0, 250.0)), Ok(1));
    }

    #[test]
    fn test_unknown_category_is_an_inference_failure() {
        let model = LogisticModel::from_exported(exported_model()).expect("valid");
        let mut r = record(30, 5.5, 100.0);
        r.smoking_history = SmokingHistory::NoInfo;

        assert!(matches!(
            model.predict_proba(&r),
            Err(ClassifierError::UnknownCategory { .. })
        ));
    }

    #[test]
    fn test_bundled_model_loads() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("models");
        let model = LogisticModel::load(&dir).expect("bundled model");
        let [_, p] = model.predict_proba(&record(30, 5.5, 100.0)).expect("score");
        assert!(p < 0.5);
    }

    #[test]
    fn test_bind_keeps_existing_entries() {
        let dir = tempdir().expect("tempdir");
        let bytes = write_model(dir.path());
        let other = sha256_hex(b"calibration table");
        write_manifest(
            dir.path(),
            &[
                ("calibration.json", other.clone()),
                (MODEL_FILE, sha256_hex(b"previous model")),
            ],
        );

        let path = bind_in_manifest(dir.path(), MODEL_FILE, &bytes).expect("bind");

        let manifest: ModelManifest =
            serde_json::from_slice(&fs::read(path).expect("read")).expect("parse");
        assert_eq!(manifest.files.len(), 2);
        assert_eq!(manifest.files.get("calibration.json"), Some(&other));
        assert_eq!(manifest.files.get(MODEL_FILE), Some(&sha256_hex(&bytes)));
        assert!(LogisticModel::load(dir.path()).is_ok());
    }

    #[test]
    fn test_bind_creates_manifest_when_absent() {
        let dir = tempdir().expect("tempdir");
        let bytes = write_model(dir.path());

        bind_in_manifest(dir.path(), MODEL_FILE, &bytes).expect("bind");
        assert!(LogisticModel::load(dir.path()).is_ok());
    }

    #[test]
    fn test_bind_leaves_corrupt_manifest_alone() {
        let dir = tempdir().expect("tempdir");
        let bytes = write_model(dir.path());
        fs::write(dir.path().join(MANIFEST_FILE), b"{ not json").expect("write");

        assert!(matches!(
            bind_in_manifest(dir.path(), MODEL_FILE, &bytes),
            Err(ModelError::Parse(_))
        ));
        assert_eq!(
            fs::read(dir.path().join(MANIFEST_FILE)).expect("read"),
            b"{ not json"
        );
    }
}
