//! Ingest handler
//!
//! Accepts a raw CSV document as the request body and runs it through
//! the ingestion pipeline.

use crate::AppState;
use axum::extract::{Query, State};
use axum::Json;
use salespulse_common::db::Repository;
use salespulse_common::errors::Result;
use salespulse_ingestion::{IngestMode, IngestReport, IngestionPipeline};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestParams {
    /// Failure policy override: `strict` (default) or `best_effort`
    pub mode: Option<IngestMode>,
}

/// Ingest a CSV batch posted as the request body
pub async fn ingest(
    State(state): State<AppState>,
    Query(params): Query<IngestParams>,
    body: String,
) -> Result<Json<IngestReport>> {
    let mode = params.mode.unwrap_or(if state.config.ingestion.best_effort {
        IngestMode::BestEffort
    } else {
        IngestMode::Strict
    });

    let pipeline = IngestionPipeline::new(Repository::new(state.db.clone()))
        .with_delimiter(state.config.ingestion.delimiter as u8);

    let report = pipeline.ingest(body.as_bytes(), mode).await?;

    tracing::info!(
        records = report.records_ingested,
        failures = report.failures.len(),
        "Ingest request completed"
    );

    Ok(Json(report))
}
