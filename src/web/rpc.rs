//! JSON-RPC style dispatch over the same route table as REST.
//!
//! Request: `{"jsonrpc": "2.0", "id": 1, "method": "contacts.getContact", "params": {"id": "5"}}`.
//! The HTTP status is always 200; failures travel in the `error` member with
//! the status code REST would have used.

use super::routes::{self, ApiMethod};
use super::{AppState, BulkInsertResponse, ListParams, Result, WebError};
use crate::core::{Contact, ContactError, ContactId, ContactList};
use crate::service::ContactService;
use axum::{Json, extract::State, extract::rejection::JsonRejection};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::debug;

#[derive(Debug, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: JsonValue,
    pub method: String,
    #[serde(default)]
    pub params: JsonValue,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcError {
    pub code: u16,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub id: JsonValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct IdParams {
    id: ContactId,
}

pub async fn dispatch(
    State(state): State<AppState>,
    payload: std::result::Result<Json<RpcRequest>, JsonRejection>,
) -> Result<Json<RpcResponse>> {
    let Json(request) = payload.map_err(|rejection| WebError::Input(rejection.body_text()))?;
    debug!(method = %request.method, "rpc call");

    let outcome = match (request.jsonrpc.as_deref(), routes::find(&request.method)) {
        (Some(version), _) if version != "2.0" => Err(WebError::Input(format!(
            "unsupported jsonrpc version '{version}'"
        ))),
        (_, Some(route)) => invoke(&state.service, route.method, request.params).await,
        (_, None) => Err(WebError::Contact(ContactError::NotFound(format!(
            "unknown method '{}'",
            request.method
        )))),
    };

    let response = match outcome {
        Ok(result) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id,
            result: Some(result),
            error: None,
        },
        Err(err) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            id: request.id,
            result: None,
            error: Some(RpcError {
                code: err.status().as_u16(),
                message: err.message(),
            }),
        },
    };
    Ok(Json(response))
}

/// Runs one API method with JSON params and returns its JSON result.
pub async fn invoke(service: &ContactService, method: ApiMethod, params: JsonValue) -> Result<JsonValue> {
    match method {
        ApiMethod::InsertContact => to_json(service.insert(params_as::<Contact>(params)?).await?),
        ApiMethod::UpdateContact => to_json(service.update(params_as::<Contact>(params)?).await?),
        ApiMethod::DeleteContact => {
            let IdParams { id } = params_as(params)?;
            to_json(service.delete(id).await?)
        }
        ApiMethod::GetContact => {
            let IdParams { id } = params_as(params)?;
            to_json(service.get(id).await?)
        }
        ApiMethod::ListContacts => {
            let ListParams { limit, page_token } = params_as(params)?;
            to_json(service.list(limit, page_token.as_deref()).await?)
        }
        ApiMethod::InsertContacts => {
            let ContactList { items } = params_as(params)?;
            let outcome = service.insert_many(items).await?;
            to_json(BulkInsertResponse::from(outcome))
        }
    }
}

fn params_as<T: DeserializeOwned>(params: JsonValue) -> Result<T> {
    let params = match params {
        JsonValue::Null => JsonValue::Object(Default::default()),
        other => other,
    };
    serde_json::from_value(params).map_err(|err| WebError::Input(format!("invalid params: {err}")))
}

fn to_json<T: Serialize>(value: T) -> Result<JsonValue> {
    serde_json::to_value(value).map_err(|err| WebError::Internal(err.to_string()))
}
