//! # lab-report-parser
//!
//! Extract structured lab test results from PDF lab reports using a
//! vision-capable LLM.
//!
//! Each page is rasterised into a PNG and shown to the model together with a
//! fixed instruction prompt. The model answers with a JSON array of test
//! records; arrays from all pages are concatenated in page order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload
//!  │
//!  ├─ 1. Validate  size ≥ 1 KiB and `%PDF` magic
//!  ├─ 2. Render    rasterise pages via pdfium (spawn_blocking)
//!  ├─ 3. Encode    PNG → base64 ImageData
//!  ├─ 4. Model     one vision call per page, strictly in page order
//!  ├─ 5. Parse     first `[` … last `]` as a JSON array of records
//!  └─ 6. Respond   concatenated records + file info
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lab_report_parser::{api, ExtractionConfig, LabReportExtractor, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / …
//!     let extractor = LabReportExtractor::from_config(ExtractionConfig::default())?;
//!     let server = ServerConfig::default();
//!     let app = api::router(api::AppState::new(extractor), &server);
//!     let listener = tokio::net::TcpListener::bind(server.socket_addr()).await?;
//!     api::serve(listener, app, async {
//!         let _ = tokio::signal::ctrl_c().await;
//!     })
//!     .await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `lab-report-server` binary (clap + anyhow + tracing-subscriber) |

// ── Modules ──────────────────────────────────────────────────────────────

pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod record;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder, ServerConfig};
pub use error::{LabParseError, ModelError, PageError, ValidationError};
pub use extract::LabReportExtractor;
pub use output::{Extraction, ExtractionStats, PageResult};
pub use record::{LabStatus, LabTestRecord};
