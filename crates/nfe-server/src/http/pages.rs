//! Search form and editable-rows pages.

use axum::Form;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use serde::Deserialize;

use crate::state::AppState;
use crate::views;

pub const DATA_UNAVAILABLE_MESSAGE: &str =
    "Dados não carregados. Verifique o console do servidor.";

/// Submitted search form; also read from the query string on `GET`.
#[derive(Debug, Deserialize)]
pub struct SearchForm {
    pub seq_nfe: String,
}

/// Parses a submitted identifier; surrounding whitespace is ignored.
pub fn parse_seq_nfe(raw: &str) -> Option<i64> {
    raw.trim().parse().ok()
}

pub(crate) async fn home_handler() -> Html<String> {
    Html(views::search_form(None))
}

pub(crate) async fn search_handler(
    State(state): State<AppState>,
    Form(form): Form<SearchForm>,
) -> (StatusCode, Html<String>) {
    if state.store.is_empty() {
        tracing::error!(seq_nfe = %form.seq_nfe, "Search rejected: no dataset loaded");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(views::error_page(DATA_UNAVAILABLE_MESSAGE)),
        );
    }

    let Some(identifier) = parse_seq_nfe(&form.seq_nfe) else {
        tracing::info!(seq_nfe = %form.seq_nfe, "Search rejected: identifier is not an integer");
        let message = format!(
            "O valor '{}' não é um número válido para SEQ_NFE.",
            form.seq_nfe
        );
        return (
            StatusCode::BAD_REQUEST,
            Html(views::search_form(Some(&message))),
        );
    };

    let records = match state.store.lookup(identifier) {
        Ok(records) => records,
        Err(error) => {
            tracing::error!(identifier, %error, "Lookup failed");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html(views::error_page(DATA_UNAVAILABLE_MESSAGE)),
            );
        }
    };
    tracing::info!(identifier, matches = records.len(), "Search");

    if records.is_empty() {
        let message = format!("Nenhuma nota encontrada com SEQ_NFE = {identifier}.");
        return (
            StatusCode::NOT_FOUND,
            Html(views::search_form(Some(&message))),
        );
    }

    (
        StatusCode::OK,
        Html(views::editable_rows(&form.seq_nfe, state.contract, &records)),
    )
}
