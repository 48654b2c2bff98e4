//! Batch classification against the on-disk model artifact.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use nfe_model::{
    FeatureContract, FeatureRow, LabelTable, MODEL_ERROR_LABEL, PREDICTION_ERROR_LABEL,
};
use sha2::{Digest, Sha256};

use crate::decision::{DecisionRule, classify};
use crate::encode::encode_rows;
use crate::error::{InferenceError, ModelError};
use crate::lightgbm::Booster;

#[derive(Debug)]
struct CachedModel {
    fingerprint: String,
    booster: Arc<Booster>,
}

/// Classifies batches of feature rows into tax-category labels.
///
/// The artifact is read on every call and fingerprinted; a changed file is
/// picked up on the next call while an unchanged one reuses the parsed
/// model. Failures never escape: a model that cannot be loaded labels every
/// row [`MODEL_ERROR_LABEL`], and a model that fails to evaluate labels
/// every row [`PREDICTION_ERROR_LABEL`].
#[derive(Debug)]
pub struct InferenceAdapter {
    model_path: PathBuf,
    contract: FeatureContract,
    labels: LabelTable,
    rule: DecisionRule,
    cache: Mutex<Option<CachedModel>>,
}

impl InferenceAdapter {
    pub fn new(
        model_path: impl Into<PathBuf>,
        contract: FeatureContract,
        labels: LabelTable,
        rule: DecisionRule,
    ) -> Self {
        Self {
            model_path: model_path.into(),
            contract,
            labels,
            rule,
            cache: Mutex::new(None),
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn rule(&self) -> DecisionRule {
        self.rule
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// One label per row, in input order.
    pub fn predict(&self, rows: &[FeatureRow]) -> Vec<String> {
        if rows.is_empty() {
            return Vec::new();
        }

        let booster = match self.load_model() {
            Ok(booster) => booster,
            Err(error) => {
                tracing::error!(
                    path = %self.model_path.display(),
                    %error,
                    "Failed to load model"
                );
                return vec![MODEL_ERROR_LABEL.to_string(); rows.len()];
            }
        };

        match self.classify_rows(&booster, rows) {
            Ok(indices) => indices
                .into_iter()
                .map(|idx| self.labels.label_for(idx))
                .collect(),
            Err(error) => {
                tracing::error!(rows = rows.len(), %error, "Prediction failed");
                vec![PREDICTION_ERROR_LABEL.to_string(); rows.len()]
            }
        }
    }

    /// Class indices for `rows` using an already loaded model.
    pub fn classify_rows(
        &self,
        booster: &Booster,
        rows: &[FeatureRow],
    ) -> Result<Vec<usize>, InferenceError> {
        let matrix = encode_rows(rows, self.contract, booster.pandas_categorical())?;
        let probabilities = booster.predict(&matrix)?;
        tracing::debug!(
            rows = probabilities.len(),
            ndim = probabilities.ndim(),
            ?probabilities,
            "Computed class probabilities"
        );
        classify(&probabilities, self.rule)
    }

    /// Reads the artifact and returns the parsed model, reusing the cached
    /// one when the content fingerprint is unchanged.
    pub fn load_model(&self) -> Result<Arc<Booster>, ModelError> {
        let bytes = fs::read(&self.model_path).map_err(|source| ModelError::Read {
            path: self.model_path.clone(),
            source,
        })?;
        let fingerprint = hex::encode(Sha256::digest(&bytes));

        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(cached) = cache.as_ref()
            && cached.fingerprint == fingerprint
        {
            return Ok(Arc::clone(&cached.booster));
        }

        let booster = Booster::from_bytes(&bytes, &self.model_path)?;
        check_schema(&booster, self.contract)?;

        tracing::info!(
            path = %self.model_path.display(),
            fingerprint = &fingerprint[..12],
            trees = booster.trees().len(),
            classes = booster.num_class(),
            "Loaded model"
        );
        let booster = Arc::new(booster);
        *cache = Some(CachedModel {
            fingerprint,
            booster: Arc::clone(&booster),
        });
        Ok(booster)
    }
}

/// The model must be trained on exactly the contract features, in order.
fn check_schema(booster: &Booster, contract: FeatureContract) -> Result<(), ModelError> {
    if booster.feature_names().iter().map(String::as_str).eq(contract.names()) {
        return Ok(());
    }
    Err(ModelError::FeatureMismatch {
        expected: contract.names().collect::<Vec<_>>().join(" "),
        found: booster.feature_names().join(" "),
    })
}
