use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::multipart::MultipartRejection;
use axum::extract::{ConnectInfo, Multipart, State};
use axum::http::Extensions;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};

use crate::config::{EXPORT_CONTENT_DISPOSITION, UPLOAD_FIELD};
use crate::models::PriceStats;
use crate::server::error::AppError;
use crate::server::state::AppState;
use crate::LedgerError;

const SKIPPED_ROWS_HEADER: HeaderName = HeaderName::from_static("x-skipped-rows");

/// POST /api/v0/prices
///
/// Accepts a multipart form whose `file` field is a zip archive with a CSV
/// price list, records it, and answers with aggregates over the whole ledger.
pub async fn ingest_prices(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PriceStats>, AppError> {
    let mut multipart = multipart?;
    let upload = read_upload(&mut multipart).await?;
    log::info!("POST upload of {} bytes", upload.len());

    let report = state.ledger.ingest_archive(upload).await?;
    for skipped in &report.skipped {
        log::warn!("Skipped line {}: {}", skipped.position, skipped.reason);
    }

    Ok(Json(report.stats))
}

/// GET /api/v0/prices
///
/// Returns the whole ledger, ordered by id, as `data.csv` inside a zip.
pub async fn export_prices(
    State(state): State<Arc<AppState>>,
    extensions: Extensions,
) -> Result<Response, AppError> {
    // Peer info is only present when served through `server::serve`.
    match extensions.get::<ConnectInfo<SocketAddr>>() {
        Some(ConnectInfo(peer)) => log::info!("GET request from {}", peer),
        None => log::info!("GET request from unknown peer"),
    }

    let export = state.ledger.export().await?;
    if !export.skipped.is_empty() {
        log::warn!(
            "Export omitted {} unreadable row(s) out of {}",
            export.skipped.len(),
            export.rows + export.skipped.len()
        );
    }

    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, HeaderValue::from_static("application/zip")),
            (
                CONTENT_DISPOSITION,
                HeaderValue::from_static(EXPORT_CONTENT_DISPOSITION),
            ),
            (SKIPPED_ROWS_HEADER, HeaderValue::from(export.skipped.len())),
        ],
        export.archive,
    )
        .into_response())
}

/// Any other method on the prices route.
pub async fn method_not_allowed(method: Method) -> AppError {
    log::info!("Rejected {} request", method);
    AppError::method_not_allowed()
}

/// Pull the archive bytes out of the `file` field, ignoring other fields.
async fn read_upload(multipart: &mut Multipart) -> Result<Vec<u8>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            return Ok(field.bytes().await?.to_vec());
        }
    }
    Err(LedgerError::BadUpload(format!("missing form field '{UPLOAD_FIELD}'")).into())
}
