//! Result types produced by the extraction pipeline.

use crate::error::PageError;
use crate::record::LabTestRecord;
use serde::{Deserialize, Serialize};

/// Outcome of sending one page to the vision model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResult {
    /// 1-indexed page number.
    pub page_num: usize,
    /// Empty when `error` is set.
    pub records: Vec<LabTestRecord>,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub duration_ms: u64,
    /// Retry attempts used (0 = first call answered).
    pub retries: u32,
    pub error: Option<PageError>,
}

/// Records from every page, concatenated in page order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Extraction {
    pub records: Vec<LabTestRecord>,
    pub stats: ExtractionStats,
}

/// Aggregate counters for one extraction. Never names individual pages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages produced by the rasteriser.
    pub total_pages: usize,
    /// Pages that contributed no records because of an error.
    pub failed_pages: usize,
    pub total_results: usize,
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub render_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}
