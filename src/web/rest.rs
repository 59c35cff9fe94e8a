use super::routes::{API_NAME, API_VERSION, ApiMethod, ROUTES, RouteSpec};
use super::{AppState, BulkInsertResponse, ListParams, Result, WebError, rpc};
use crate::core::{Contact, ContactId, ContactList, ContactPage};
use axum::{
    Json, Router,
    extract::{Path, Query, State, rejection::JsonRejection, rejection::QueryRejection},
    routing::{MethodRouter, get, on, post},
};
use serde::Serialize;
use std::collections::BTreeMap;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct DiscoveryResponse {
    name: &'static str,
    version: &'static str,
    methods: &'static [RouteSpec],
}

/// Builds the application router.
///
/// API routes come from [`ROUTES`] and are mounted under `base_path`
/// (empty or `/` mounts them at the root). `/health` always sits at the root.
pub fn build_router(state: AppState, base_path: &str) -> Router {
    // Routes sharing a path (GET and POST /contacts) merge into one entry.
    let mut by_path: BTreeMap<String, MethodRouter<AppState>> = BTreeMap::new();
    for route in ROUTES {
        let handler = method_router(route);
        let merged = match by_path.remove(&route.router_path()) {
            Some(existing) => existing.merge(handler),
            None => handler,
        };
        by_path.insert(route.router_path(), merged);
    }

    let mut api = Router::new()
        .route("/rpc", post(rpc::dispatch))
        .route("/discovery", get(discovery));
    for (path, handler) in by_path {
        api = api.route(&path, handler);
    }

    let root = Router::new().route("/health", get(health));
    let base_path = base_path.trim_end_matches('/');
    let router = if base_path.is_empty() {
        root.merge(api)
    } else {
        root.nest(base_path, api)
    };

    router
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_headers(Any)
                .allow_methods(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn method_router(route: &RouteSpec) -> MethodRouter<AppState> {
    let filter = route.http_method.filter();
    match route.method {
        ApiMethod::InsertContact => on(filter, insert_contact),
        ApiMethod::UpdateContact => on(filter, update_contact),
        ApiMethod::DeleteContact => on(filter, delete_contact),
        ApiMethod::GetContact => on(filter, get_contact),
        ApiMethod::ListContacts => on(filter, list_contacts),
        ApiMethod::InsertContacts => on(filter, insert_contacts),
    }
}

fn json_body<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| WebError::Input(rejection.body_text()))
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn discovery() -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: API_NAME,
        version: API_VERSION,
        methods: ROUTES,
    })
}

async fn insert_contact(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Contact>, JsonRejection>,
) -> Result<Json<Contact>> {
    let contact = state.service.insert(json_body(payload)?).await?;
    Ok(Json(contact))
}

async fn update_contact(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Contact>, JsonRejection>,
) -> Result<Json<Contact>> {
    let contact = state.service.update(json_body(payload)?).await?;
    Ok(Json(contact))
}

async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Contact>> {
    let id = id.parse::<ContactId>()?;
    let contact = state.service.delete(id).await?;
    Ok(Json(contact))
}

async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Contact>> {
    let id = id.parse::<ContactId>()?;
    let contact = state.service.get(id).await?;
    Ok(Json(contact))
}

async fn list_contacts(
    State(state): State<AppState>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<ContactPage>> {
    let Query(params) = params.map_err(|rejection| WebError::Input(rejection.body_text()))?;
    let page = state
        .service
        .list(params.limit, params.page_token.as_deref())
        .await?;
    Ok(Json(page))
}

async fn insert_contacts(
    State(state): State<AppState>,
    payload: std::result::Result<Json<ContactList>, JsonRejection>,
) -> Result<Json<BulkInsertResponse>> {
    let ContactList { items } = json_body(payload)?;
    let outcome = state.service.insert_many(items).await?;
    Ok(Json(outcome.into()))
}
