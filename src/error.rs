//! Error types for the lab-report-parser library.
//!
//! Errors are split by how far they are allowed to travel:
//!
//! * [`ValidationError`]: the upload itself is unacceptable (too small, not a
//!   PDF). Reported to the client as `400` with the expected vs. actual value.
//!
//! * [`LabParseError`] (**fatal**): the request cannot proceed at all
//!   (corrupt PDF, pdfium unavailable, zero pages rendered). Returned as
//!   `Err(LabParseError)` from [`crate::extract::LabReportExtractor::extract`].
//!
//! * [`PageError`] (**non-fatal**): a single page failed (model error,
//!   timeout, unparseable reply). Stored in [`crate::output::PageResult`]; the
//!   page contributes zero records and the request carries on.

use thiserror::Error;

/// Reasons an uploaded buffer is rejected before any rendering happens.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Fewer bytes than the smallest plausible PDF.
    #[error("File too small to be a valid PDF ({size} bytes, minimum {minimum})")]
    TooSmall { size: usize, minimum: usize },

    /// The first four bytes are not `%PDF`.
    #[error("Invalid PDF file format (magic number {found:?}, expected {expected:?})")]
    BadMagic {
        found: String,
        expected: &'static str,
    },
}

/// All fatal errors returned by the extraction pipeline.
///
/// Page-level failures use [`PageError`] and never surface here.
#[derive(Debug, Error)]
pub enum LabParseError {
    // ── PDF errors ────────────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF is corrupt: {detail}")]
    CorruptPdf { detail: String },

    /// PDF requires a password; uploads are never decrypted.
    #[error("PDF is encrypted and requires a password")]
    PasswordRequired,

    /// pdfium-render returned an error for a specific page.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RasterisationFailed { page: usize, detail: String },

    /// The rasterizer ran to completion but produced no page images.
    #[error("Failed to convert PDF to images")]
    NoPagesRendered,

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not stage the upload in its temporary directory.
    #[error("Failed to stage upload in temporary storage: {source}")]
    TempStorage {
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Pdfium binding errors ─────────────────────────────────────────────
    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH to the directory containing libpdfium, or install it system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single page.
///
/// Logged and counted; the page contributes zero records.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum PageError {
    /// The vision model call failed after retries.
    #[error("Page {page}: model call failed after {retries} retries: {detail}")]
    ModelFailed {
        page: usize,
        retries: u32,
        detail: String,
    },

    /// The vision model call timed out.
    #[error("Page {page}: model call timed out after {secs}s")]
    Timeout { page: usize, secs: u64 },

    /// The model replied, but the reply held no usable JSON array.
    #[error("Page {page}: {reason}")]
    Unparseable { page: usize, reason: String },
}

/// Failure reported by a [`crate::pipeline::llm::VisionModel`] backend.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ModelError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_small_display() {
        let e = ValidationError::TooSmall {
            size: 12,
            minimum: 1024,
        };
        let msg = e.to_string();
        assert!(msg.contains("12 bytes"), "got: {msg}");
        assert!(msg.contains("1024"), "got: {msg}");
    }

    #[test]
    fn bad_magic_display() {
        let e = ValidationError::BadMagic {
            found: "PK\u{3}\u{4}".into(),
            expected: "%PDF",
        };
        assert!(e.to_string().contains("%PDF"));
    }

    #[test]
    fn page_error_display_names_page() {
        let e = PageError::Unparseable {
            page: 3,
            reason: "No JSON array found in response".into(),
        };
        assert!(e.to_string().starts_with("Page 3:"));
    }

    #[test]
    fn timeout_display() {
        let e = PageError::Timeout { page: 2, secs: 30 };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn temp_storage_keeps_source() {
        use std::error::Error as _;
        let e = LabParseError::TempStorage {
            source: std::io::Error::new(std::io::ErrorKind::Other, "disk full"),
        };
        assert!(e.source().is_some());
    }
}
