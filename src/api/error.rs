//! API error types with structured JSON responses.
//!
//! Client mistakes (no file, not a PDF, nothing rendered) answer `400` with
//! `{error, details?}`. Anything else answers `500` with
//! `{success: false, error, details}`, where `details` is the error's source
//! chain when it has one.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::{LabParseError, ValidationError};

/// `400` body.
#[derive(Debug, Serialize)]
pub struct ClientErrorBody {
    pub error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

/// Structured detail explaining which expectation failed.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorDetails {
    #[serde(rename_all = "camelCase")]
    Size {
        size: usize,
        minimum_size: usize,
        message: &'static str,
    },
    #[serde(rename_all = "camelCase")]
    Magic {
        magic_number: String,
        expected_magic_number: &'static str,
        message: &'static str,
    },
    Message { message: String },
}

/// `500` body.
#[derive(Debug, Serialize)]
pub struct ServerErrorBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("No file uploaded")]
    MissingFile,

    #[error("Failed to read upload: {message}")]
    Multipart { status: StatusCode, message: String },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Pipeline(#[from] LabParseError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingFile => client_error("No file uploaded", None),

            ApiError::Multipart { status, message } => (
                status,
                Json(ClientErrorBody {
                    error: "Failed to read uploaded file",
                    details: Some(ErrorDetails::Message { message }),
                }),
            )
                .into_response(),

            ApiError::Validation(ValidationError::TooSmall { size, minimum }) => client_error(
                "File too small to be a valid PDF",
                Some(ErrorDetails::Size {
                    size,
                    minimum_size: minimum,
                    message: "PDF files should be at least 1KB in size",
                }),
            ),

            ApiError::Validation(ValidationError::BadMagic { found, expected }) => client_error(
                "Invalid PDF file format",
                Some(ErrorDetails::Magic {
                    magic_number: found,
                    expected_magic_number: expected,
                    message: "The file does not appear to be a valid PDF",
                }),
            ),

            ApiError::Pipeline(LabParseError::NoPagesRendered) => client_error(
                "Failed to convert PDF to images",
                Some(ErrorDetails::Message {
                    message: "The PDF could not be converted to images. \
                              Please ensure it is a valid PDF file."
                        .to_string(),
                }),
            ),

            ApiError::Pipeline(err) => {
                let details = source_chain(&err);
                tracing::error!(error = %err, details = ?details, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ServerErrorBody {
                        success: false,
                        error: err.to_string(),
                        details,
                    }),
                )
                    .into_response()
            }
        }
    }
}

fn client_error(error: &'static str, details: Option<ErrorDetails>) -> Response {
    tracing::warn!(error, "Rejected upload");
    (StatusCode::BAD_REQUEST, Json(ClientErrorBody { error, details })).into_response()
}

/// Render the `source()` chain below `err`, outermost first.
fn source_chain(err: &dyn std::error::Error) -> Option<String> {
    let mut parts = Vec::new();
    let mut current = err.source();
    while let Some(cause) = current {
        parts.push(cause.to_string());
        current = cause.source();
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(": "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn missing_file_returns_400_without_details() {
        let response = ApiError::MissingFile.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "No file uploaded");
        assert!(json.get("details").is_none());
    }

    #[tokio::test]
    async fn too_small_reports_size_and_minimum() {
        let err: ApiError = ValidationError::TooSmall {
            size: 10,
            minimum: 1024,
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["details"]["size"], 10);
        assert_eq!(json["details"]["minimumSize"], 1024);
    }

    #[tokio::test]
    async fn bad_magic_reports_found_and_expected() {
        let err: ApiError = ValidationError::BadMagic {
            found: "GIF8".into(),
            expected: "%PDF",
        }
        .into();
        let json = body_json(err.into_response()).await;
        assert_eq!(json["error"], "Invalid PDF file format");
        assert_eq!(json["details"]["magicNumber"], "GIF8");
        assert_eq!(json["details"]["expectedMagicNumber"], "%PDF");
    }

    #[tokio::test]
    async fn no_pages_is_a_client_error() {
        let response = ApiError::from(LabParseError::NoPagesRendered).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Failed to convert PDF to images");
    }

    #[tokio::test]
    async fn pipeline_failure_returns_500_with_chain() {
        let err = LabParseError::TempStorage {
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("temporary storage"));
        assert_eq!(json["details"], "disk full");
    }

    #[tokio::test]
    async fn corrupt_pdf_returns_500() {
        let err = LabParseError::CorruptPdf {
            detail: "bad xref".into(),
        };
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn multipart_error_keeps_status() {
        let response = ApiError::Multipart {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            message: "length limit exceeded".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
