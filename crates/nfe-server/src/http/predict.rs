//! Batch prediction endpoint.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use nfe_model::{EditableRow, FeatureRow, PredictionResult, correlate};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::state::AppState;

pub const EMPTY_BATCH_MESSAGE: &str = "Nenhum dado enviado para predição.";

/// Body of `POST /predict`.
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    pub data: Vec<Map<String, Value>>,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

pub(crate) async fn predict_handler(
    State(state): State<AppState>,
    Json(request): Json<PredictRequest>,
) -> Response {
    // An empty batch is answered in-band, not as an HTTP failure.
    if request.data.is_empty() {
        return error_response(StatusCode::OK, EMPTY_BATCH_MESSAGE);
    }

    let rows = match state.contract.validate_batch(&request.data) {
        Ok(rows) => rows,
        Err(error) => {
            tracing::info!(%error, "Prediction request rejected");
            return error_response(StatusCode::UNPROCESSABLE_ENTITY, error.to_string());
        }
    };
    tracing::info!(rows = rows.len(), "Prediction requested");
    for row in &rows {
        tracing::trace!(key = %row.key, features = ?row.features.values(), "Row submitted");
    }

    match run_inference(&state, rows).await {
        Ok(result) => Json(json!({ "predictions": result })).into_response(),
        Err(message) => {
            tracing::error!(%message, "Prediction failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, message)
        }
    }
}

/// Evaluates the model off the async runtime and maps labels back to keys.
async fn run_inference(state: &AppState, rows: Vec<EditableRow>) -> Result<PredictionResult, String> {
    let adapter = state.adapter.clone();
    let (rows, labels) = tokio::task::spawn_blocking(move || {
        let features: Vec<FeatureRow> = rows.iter().map(|row| row.features.clone()).collect();
        let labels = adapter.predict(&features);
        (rows, labels)
    })
    .await
    .map_err(|error| format!("prediction task failed: {error}"))?;

    correlate(&rows, labels).map_err(|error| error.to_string())
}
