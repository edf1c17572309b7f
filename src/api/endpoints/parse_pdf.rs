//! `POST /api/parse-pdf`: upload a lab report, get its test results back.
//!
//! Lifecycle of one request:
//! `received → validated → rasterized → (per page: requested → parsed|failed)
//! → aggregated → responded`. Nothing survives the response.

use axum::body::Bytes;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::Json;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::types::{AppState, ParseResponse};
use crate::pipeline::validate::validate_upload;

/// Multipart field carrying the PDF.
pub const FILE_FIELD: &str = "file";

/// The uploaded file, held in memory.
#[derive(Debug)]
struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Bytes,
}

pub async fn parse_pdf(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<ParseResponse>, ApiError> {
    let span = info_span!("parse_pdf", request_id = %Uuid::new_v4());

    async move {
        let mut multipart = multipart.map_err(|rejection| {
            debug!(%rejection, "Request is not multipart");
            ApiError::MissingFile
        })?;

        let upload = read_file_field(&mut multipart)
            .await?
            .ok_or(ApiError::MissingFile)?;

        info!(
            file_name = upload.file_name.as_deref().unwrap_or("<none>"),
            content_type = upload.content_type.as_deref().unwrap_or("<none>"),
            size = upload.bytes.len(),
            "Received file"
        );

        validate_upload(&upload.bytes)?;

        let extraction = state.extractor.extract(&upload.bytes).await?;
        Ok(Json(ParseResponse::new(upload.bytes.len(), extraction)))
    }
    .instrument(span)
    .await
}

/// Return the first field named [`FILE_FIELD`]; other fields are skipped.
async fn read_file_field(multipart: &mut Multipart) -> Result<Option<Upload>, ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| ApiError::Multipart {
        status: e.status(),
        message: e.body_text(),
    })? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field.file_name().map(str::to_owned);
        let content_type = field.content_type().map(str::to_owned);
        let bytes = field.bytes().await.map_err(|e| ApiError::Multipart {
            status: e.status(),
            message: e.body_text(),
        })?;

        return Ok(Some(Upload {
            file_name,
            content_type,
            bytes,
        }));
    }

    Ok(None)
}
