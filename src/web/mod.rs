//! HTTP surface.
//!
//! REST routes and the JSON-RPC endpoint are both generated from the static
//! route table in [`routes`], so method names, verbs and paths live in one
//! place.

pub mod rest;
pub mod routes;
pub mod rpc;

use crate::core::{Contact, ContactError, StoreError};
use crate::service::{BulkFailure, BulkInsertOutcome, ContactService};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

pub use rest::build_router;
pub use routes::{API_NAME, API_VERSION, ApiMethod, HttpVerb, ROUTES, RouteSpec};

#[derive(Clone)]
pub struct AppState {
    pub service: ContactService,
}

impl AppState {
    pub fn new(service: ContactService) -> Self {
        Self { service }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug)]
pub enum WebError {
    Contact(ContactError),
    Input(String),
    Internal(String),
}

impl From<ContactError> for WebError {
    fn from(err: ContactError) -> Self {
        WebError::Contact(err)
    }
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::Contact(err) => status_for(err),
            WebError::Input(_) => StatusCode::BAD_REQUEST,
            WebError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            WebError::Contact(err) => err.code(),
            WebError::Input(_) => "invalid_argument",
            WebError::Internal(_) => "internal",
        }
    }

    pub fn message(&self) -> String {
        match self {
            WebError::Contact(err) => err.to_string(),
            WebError::Input(msg) | WebError::Internal(msg) => msg.clone(),
        }
    }
}

fn status_for(err: &ContactError) -> StatusCode {
    match err {
        ContactError::Validation(_) => StatusCode::BAD_REQUEST,
        ContactError::NotFound(_) => StatusCode::NOT_FOUND,
        ContactError::BatchItemFailed { source, .. } => status_for(source),
        ContactError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
        ContactError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
        ContactError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.message(), "request failed");
        }

        let body = Json(ErrorResponse {
            error: self.message(),
            code: self.code().to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, WebError>;

/// Query parameters of `listContacts`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub page_token: Option<String>,
}

/// Response body of `insertContacts`.
///
/// `failures` is only present when a continue-on-error batch had failures.
#[derive(Debug, Serialize, Deserialize)]
pub struct BulkInsertResponse {
    pub items: Vec<Contact>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<BulkFailure>,
}

impl From<BulkInsertOutcome> for BulkInsertResponse {
    fn from(outcome: BulkInsertOutcome) -> Self {
        Self {
            items: outcome.items,
            failures: outcome.failures,
        }
    }
}
