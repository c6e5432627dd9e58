// ==============================================================================
// handlers.rs - API Request Handlers
// ==============================================================================
// Description: HTTP request handlers for the annotation endpoint
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;
use vep_annotator::{AnnotationError, AnnotationRecord};

use crate::{models::ErrorResponse, state::AppState};

/// Annotate variants. Served for GET on every path.
///
/// Every `q` parameter is a variant token; all other parameters override
/// annotator options.
pub async fn annotate(
    State(state): State<AppState>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<AnnotationRecord>>, AppError> {
    let request_id = Uuid::new_v4();
    run_annotation(state, query)
        .instrument(info_span!("annotate", %request_id))
        .await
}

async fn run_annotation(
    state: AppState,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Result<Json<Vec<AnnotationRecord>>, AppError> {
    let Query(params) = query.map_err(|e| AppError::InvalidQueryString(e.body_text()))?;
    info!("Received annotation request with {} parameters", params.len());

    let records = state.annotator().annotate_query(&params).await?;

    info!("Returning {} annotation records", records.len());
    Ok(Json(records))
}

/// Application error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("invalid query string: {0}")]
    InvalidQueryString(String),

    #[error(transparent)]
    Annotation(#[from] AnnotationError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Annotation(e) if e.is_execution_error() => {
                error!("Annotation request failed: {}", e)
            }
            other => warn!("Rejected annotation request: {}", other),
        }

        // Every request-level failure is reported as 404
        let body = Json(ErrorResponse::new(self.to_string()));
        (StatusCode::NOT_FOUND, body).into_response()
    }
}
