//! HTTP routes.

mod health;
mod pages;
mod predict;

use axum::Router;
use axum::routing::{get, post};

use crate::state::AppState;

pub use pages::{DATA_UNAVAILABLE_MESSAGE, SearchForm, parse_seq_nfe};
pub use predict::{EMPTY_BATCH_MESSAGE, PredictRequest};

/// All routes, with `state` injected into the handlers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::home_handler))
        .route(
            "/search",
            get(pages::search_handler).post(pages::search_handler),
        )
        .route("/predict", post(predict::predict_handler))
        .route("/health", get(health::health_handler))
        .with_state(state)
}
