//! Shared state and response bodies for the HTTP layer.

use std::sync::Arc;

use serde::Serialize;

use crate::extract::LabReportExtractor;
use crate::output::Extraction;
use crate::record::LabTestRecord;

/// Shared context for every route. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<LabReportExtractor>,
}

impl AppState {
    pub fn new(extractor: LabReportExtractor) -> Self {
        Self {
            extractor: Arc::new(extractor),
        }
    }
}

/// `200` body of `POST /api/parse-pdf`.
#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub success: bool,
    pub data: Vec<LabTestRecord>,
    pub debug: DebugInfo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    pub file_info: FileInfo,
    pub stats: DebugStats,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    /// Upload size in bytes.
    pub size: usize,
    pub pages: usize,
    pub total_results: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugStats {
    pub failed_pages: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
}

impl ParseResponse {
    pub fn new(upload_size: usize, extraction: Extraction) -> Self {
        let stats = extraction.stats;
        Self {
            success: true,
            debug: DebugInfo {
                file_info: FileInfo {
                    size: upload_size,
                    pages: stats.total_pages,
                    total_results: extraction.records.len(),
                },
                stats: DebugStats {
                    failed_pages: stats.failed_pages,
                    input_tokens: stats.input_tokens,
                    output_tokens: stats.output_tokens,
                    duration_ms: stats.total_duration_ms,
                },
            },
            data: extraction.records,
        }
    }
}

/// `GET /health` body.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}
