//! End-to-end tests against real pdfium and a live LLM provider.
//!
//! These read `./test_cases/lab_report.pdf` and call the configured
//! provider. They are gated behind the `E2E_ENABLED` environment variable so
//! they do not run in CI unless explicitly requested.
//!
//! Run with:
//!   E2E_ENABLED=1 PDFIUM_LIB_PATH=. cargo test --test e2e -- --nocapture

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use lab_report_parser::api::{self, AppState};
use lab_report_parser::pipeline::render::{PageRasterizer, PdfiumRasterizer};
use lab_report_parser::{ExtractionConfig, LabParseError, LabReportExtractor, ServerConfig};
use std::path::PathBuf;
use tower::ServiceExt;

// ── Test helpers ─────────────────────────────────────────────────────────────

fn test_cases_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("test_cases")
}

fn config() -> ExtractionConfig {
    let mut builder = ExtractionConfig::builder().max_retries(2);
    if let Ok(dir) = std::env::var("PDFIUM_LIB_PATH") {
        builder = builder.pdfium_lib_path(dir);
    }
    builder.build().expect("valid config")
}

/// Skip this test if E2E_ENABLED is not set *or* no PDF file at `path`.
macro_rules! e2e_skip_unless_ready {
    ($path:expr) => {{
        if std::env::var("E2E_ENABLED").is_err() {
            println!("SKIP: set E2E_ENABLED=1 to run e2e tests");
            return;
        }
        let p: PathBuf = $path;
        if !p.exists() {
            println!("SKIP: test file not found: {}", p.display());
            return;
        }
        std::fs::read(&p).expect("readable test PDF")
    }};
}

// ── Rendering (pdfium only, no LLM) ──────────────────────────────────────────

#[tokio::test]
async fn test_rasterise_lab_report() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("lab_report.pdf"));

    let rasterizer = PdfiumRasterizer::new(&config());
    let pages = rasterizer
        .rasterize(&pdf)
        .await
        .expect("rasterisation should succeed");

    assert!(!pages.is_empty(), "Expected at least one page");
    for (i, page) in pages.iter().enumerate() {
        assert_eq!(page.page_num, i + 1, "Pages must come back in order");
        assert!(!page.image.data.is_empty(), "Page {} image is empty", i + 1);
    }
    println!("Rendered {} pages", pages.len());
}

#[tokio::test]
async fn test_rasterise_garbage_after_magic_is_corrupt() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP");
        return;
    }

    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.resize(4096, b'#');

    let rasterizer = PdfiumRasterizer::new(&config());
    let err = rasterizer.rasterize(&bytes).await.unwrap_err();
    assert!(
        matches!(err, LabParseError::CorruptPdf { .. }),
        "Expected CorruptPdf, got {err:?}"
    );
}

// ── Extraction (needs LLM API) ──────────────────────────────────────────────

#[tokio::test]
async fn test_extract_lab_report() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("lab_report.pdf"));

    let extractor = LabReportExtractor::from_config(config()).expect("pipeline should initialise");
    let out = extractor.extract(&pdf).await.expect("extraction should succeed");

    assert_eq!(out.stats.failed_pages, 0, "No pages should fail");
    assert!(!out.records.is_empty(), "A lab report should yield results");
    assert!(
        out.records.iter().any(|r| r.test.is_some()),
        "At least one record should name its test"
    );

    println!(
        "{} results from {} pages, {} in / {} out tokens",
        out.stats.total_results,
        out.stats.total_pages,
        out.stats.input_tokens,
        out.stats.output_tokens
    );
    println!("{}", serde_json::to_string_pretty(&out.records).unwrap());
}

#[tokio::test]
async fn test_upload_lab_report_over_http() {
    let pdf = e2e_skip_unless_ready!(test_cases_dir().join("lab_report.pdf"));

    let extractor = LabReportExtractor::from_config(config()).expect("pipeline should initialise");
    let app = api::router(AppState::new(extractor), &ServerConfig::default());

    let boundary = "e2e-boundary";
    let mut body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
         filename=\"lab_report.pdf\"\r\nContent-Type: application/pdf\r\n\r\n"
    )
    .into_bytes();
    body.extend_from_slice(&pdf);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/parse-pdf")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["debug"]["fileInfo"]["size"], pdf.len());
    assert_eq!(
        json["debug"]["fileInfo"]["totalResults"],
        json["data"].as_array().unwrap().len()
    );
}
