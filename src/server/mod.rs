//! HTTP server mode for `crewdesk`.
//!
//! This module exposes the collections over a small HTTP+JSON API in
//! the shape the dashboard's request layer expects:
//!
//! - `GET /api/<collection>` – list query (`keyword`, categorical
//!   filters, `startTime`/`endTime`, `sorter`, `current`, `pageSize`),
//!   answered with `{ data, total, success, pageSize, current }`.
//! - `POST /api/<collection>` – `{ method: "post"|"update"|"delete", ... }`;
//!   a body without `method` creates a record.
//! - `GET|PUT|DELETE /api/<collection>/<id>` – single-record access.
//! - `GET /collections` – collection descriptions.
//! - `GET /health` – simple health check endpoint.
//!
//! The server is intentionally thin: it performs JSON
//! (de)serialization, delegates to the query engine and mutation
//! layer, and converts errors into JSON HTTP responses.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::clock;
use crate::error::{MutationError, StoreError};
use crate::models::{
    HealthResponse, ListResponse, MutationMethod, MutationRequest, MutationResponse, Record,
};
use crate::mutation;
use crate::query;
use crate::schema::CollectionInfo;
use crate::store::{Collection, Registry};

/// Shared state handed to every handler.
pub struct AppState {
    registry: Registry,
}

impl AppState {
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn collection(&self, name: &str) -> Result<&Collection, ApiError> {
        self.registry
            .get(name)
            .ok_or_else(|| ApiError::not_found(format!("unknown collection: {name}")))
    }
}

type SharedState = Arc<AppState>;

/// Error type used by HTTP handlers to map internal failures into
/// JSON error responses.
#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::internal(err.to_string())
    }
}

impl From<MutationError> for ApiError {
    fn from(err: MutationError) -> Self {
        if err.is_client_error() {
            ApiError::bad_request(err.to_string())
        } else {
            ApiError::internal(err.to_string())
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(status = %self.status, message = %self.message, "request failed");
        }
        let body = Json(MutationResponse::failure(self.message));
        (self.status, body).into_response()
    }
}

/// Build the Axum router for the crewdesk HTTP API.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/collections", get(collections))
        .route("/api/:collection", get(list).post(mutate))
        .route(
            "/api/:collection/:id",
            get(get_record).put(put_record).delete(delete_record),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Run the HTTP server bound to the provided socket address.
///
/// This is used by the CLI `crewdesk serve` subcommand.
pub async fn run(addr: SocketAddr, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve_with_listener(listener, state).await
}

/// Run the HTTP server using an existing `TcpListener`.
pub async fn serve_with_listener(listener: TcpListener, state: AppState) -> Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, "crewdesk listening");
    }
    let app = router(Arc::new(state));
    axum::serve(listener, app).await?;
    Ok(())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

async fn collections(State(state): State<SharedState>) -> Json<Vec<CollectionInfo>> {
    Json(
        state
            .registry
            .iter()
            .map(|c| c.schema().describe())
            .collect(),
    )
}

async fn list(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Query(raw): Query<HashMap<String, String>>,
) -> Result<Json<ListResponse>, ApiError> {
    let collection = state.collection(&name)?;
    let response = query::run_list(collection, &raw)?;
    Ok(Json(response))
}

async fn mutate(
    State(state): State<SharedState>,
    Path(name): Path<String>,
    Json(request): Json<MutationRequest>,
) -> Result<Json<MutationResponse>, ApiError> {
    let collection = state.collection(&name)?;
    let response = mutation::apply(collection, request, clock::now())?;
    Ok(Json(response))
}

async fn get_record(
    State(state): State<SharedState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<MutationResponse>, ApiError> {
    let collection = state.collection(&name)?;
    match collection.store().get(&id)? {
        Some(record) => Ok(Json(MutationResponse::with_data(Some(record)))),
        None => Err(ApiError::not_found(format!("no record with id {id}"))),
    }
}

async fn put_record(
    State(state): State<SharedState>,
    Path((name, id)): Path<(String, String)>,
    Json(fields): Json<Record>,
) -> Result<Json<MutationResponse>, ApiError> {
    let collection = state.collection(&name)?;
    let updated = mutation::update(collection, &id, &fields, clock::now())?;
    Ok(Json(MutationResponse::with_data(updated)))
}

async fn delete_record(
    State(state): State<SharedState>,
    Path((name, id)): Path<(String, String)>,
) -> Result<Json<MutationResponse>, ApiError> {
    let collection = state.collection(&name)?;
    let mut request = MutationRequest::new(MutationMethod::Delete);
    request.id = Some(id.into());
    let response = mutation::apply(collection, request, clock::now())?;
    Ok(Json(response))
}
