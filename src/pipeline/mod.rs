//! Pipeline stages for lab report extraction.
//!
//! Each submodule implements one step.
//!
//! ## Data Flow
//!
//! ```text
//! validate ──▶ render ──▶ encode ──▶ llm ──▶ response
//! (magic)      (pdfium)   (base64)   (VLM)   (JSON array)
//! ```
//!
//! 1. [`validate`]: reject uploads that cannot be a PDF before any work
//! 2. [`render`]: rasterise every page; runs in `spawn_blocking` because
//!    pdfium is not async-safe
//! 3. [`encode`]: PNG-encode and base64-wrap each page image
//! 4. [`llm`]: one vision call per page with optional retry/timeout;
//!    the only stage with network I/O
//! 5. [`response`]: cut the JSON array out of the model's reply

pub mod encode;
pub mod llm;
pub mod render;
pub mod response;
pub mod validate;
