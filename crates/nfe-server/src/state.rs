//! Application context shared with every request handler.

use std::sync::Arc;

use nfe_infer::InferenceAdapter;
use nfe_ingest::DataStore;
use nfe_model::{FeatureContract, LabelTable};

use crate::config::ServerConfig;

/// Read-only state built once at startup.
///
/// Cloning is cheap; every clone shares the same store and adapter.
#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Arc<DataStore>,
    pub adapter: Arc<InferenceAdapter>,
    pub contract: FeatureContract,
}

impl AppState {
    pub fn new(store: DataStore, adapter: InferenceAdapter) -> Self {
        let contract = store.contract();
        Self {
            store: Arc::new(store),
            adapter: Arc::new(adapter),
            contract,
        }
    }

    /// Loads the dataset and prepares the adapter from `config`.
    ///
    /// A dataset that cannot be loaded leaves the store empty; searches then
    /// report the data as unavailable. The model is only read on prediction.
    pub fn from_config(config: &ServerConfig) -> Self {
        let contract = FeatureContract::standard();
        let store = DataStore::load_or_empty(&config.data_path, contract);
        if store.is_empty() {
            tracing::warn!(
                path = %config.data_path.display(),
                "Invoice dataset is empty; searches will fail until it is fixed"
            );
        }
        let adapter = InferenceAdapter::new(
            config.model_path.clone(),
            contract,
            LabelTable::tax_categories(),
            config.decision_rule,
        );
        Self::new(store, adapter)
    }
}
