//! Web front end for invoice tax classification.
//!
//! Serves a search form over the invoice dataset, an editable table of the
//! matching rows, and a JSON endpoint that classifies edited rows with the
//! tree model.
//!
//! # Routes
//!
//! | Method      | Path       | Response                                  |
//! |-------------|------------|-------------------------------------------|
//! | `GET`       | `/`        | Search form                               |
//! | `GET`/`POST`| `/search`  | Editable rows for one `SEQ_NFE`           |
//! | `POST`      | `/predict` | `{"predictions": {key: label}}`           |
//! | `GET`       | `/health`  | `{"status": "ok", "records": n}`          |

pub mod config;
pub mod http;
pub mod logging;
pub mod state;
pub mod views;

pub use config::{ConfigError, ConfigOverrides, ServerConfig};
pub use http::build_router;
pub use state::AppState;
