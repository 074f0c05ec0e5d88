use crate::api::AppState;
use crate::error::{AppError, Result};
use crate::metrics::gather_metrics;
use crate::search::{FieldClassifier, SearchRequest};
use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::Value;

/// Health check endpoint
pub async fn health_check() -> Result<Json<HealthResponse>> {
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Prometheus text exposition
pub async fn metrics() -> Result<String> {
    Ok(gather_metrics()?)
}

/// Compile a submitted search form into the engine's search body
pub async fn compile_query(
    State(state): State<AppState>,
    Json(form): Json<Value>,
) -> Result<Json<CompiledQueryResponse>> {
    let request = SearchRequest::from_json(form).map_err(|e| {
        tracing::warn!(error = %e, "rejected search form");
        AppError::from(e)
    })?;

    let compiled = state.compiler.compile_request(&request).map_err(|e| {
        tracing::warn!(error = %e, "search form failed to compile");
        AppError::from(e)
    })?;

    Ok(Json(CompiledQueryResponse {
        index: state.index.clone(),
        fingerprint: compiled.fingerprint(),
        aggregation: compiled.is_aggregation(),
        body: compiled.to_json(),
    }))
}

#[derive(Debug, Serialize)]
pub struct CompiledQueryResponse {
    pub index: String,
    pub fingerprint: String,
    pub aggregation: bool,
    pub body: Value,
}

/// Compile a form plus `aggregatedTerms` into a bare query for update/delete-by-query
pub async fn compile_bulk_query(
    State(state): State<AppState>,
    Json(form): Json<Value>,
) -> Result<Json<BulkQueryResponse>> {
    let request = SearchRequest::from_json(form).map_err(|e| {
        tracing::warn!(error = %e, "rejected bulk action form");
        AppError::from(e)
    })?;
    let query = state
        .compiler
        .compile_bulk_action(&request.form, &request.pagination, &request.sort)
        .map_err(|e| {
            tracing::warn!(error = %e, "bulk action form failed to compile");
            AppError::from(e)
        })?;

    Ok(Json(BulkQueryResponse {
        index: state.index.clone(),
        query: query.to_json(),
    }))
}

#[derive(Debug, Serialize)]
pub struct BulkQueryResponse {
    pub index: String,
    pub query: Value,
}

/// List the searchable fields and how each is compiled
pub async fn list_fields() -> Json<Vec<FieldResponse>> {
    Json(
        FieldClassifier::entries()
            .map(|(name, spec)| FieldResponse {
                name: name.to_string(),
                kind: spec.kind.name().to_string(),
                constraint: spec.constraint.map(|c| c.name().to_string()),
            })
            .collect(),
    )
}

#[derive(Debug, Serialize)]
pub struct FieldResponse {
    pub name: String,
    pub kind: String,
    pub constraint: Option<String>,
}
