//! PDF rasterisation: turn an uploaded PDF into ordered page images.
//!
//! The [`PageRasterizer`] trait is the seam the HTTP layer depends on; the
//! production backend is [`PdfiumRasterizer`].
//!
//! ## Why spawn_blocking?
//!
//! `pdfium-render` wraps the pdfium C++ library, which is blocking and keeps
//! thread-local state. Rendering runs on tokio's blocking pool so the async
//! workers keep serving other requests.
//!
//! ## Temporary storage
//!
//! The upload is written into a per-request [`TempDir`] whose name carries a
//! millisecond timestamp plus a random suffix, so concurrent requests never
//! collide. The directory is owned by the blocking task and removed when it
//! finishes, whether rendering succeeded, failed or panicked.

use crate::config::ExtractionConfig;
use crate::error::LabParseError;
use crate::pipeline::encode;
use edgequake_llm::ImageData;
use futures::future::{BoxFuture, FutureExt};
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// File name of the staged upload inside its temp dir.
const STAGED_FILE_NAME: &str = "report.pdf";

/// One rendered page, ready for the vision model.
#[derive(Debug, Clone)]
pub struct PageImage {
    /// 1-indexed page number in the source PDF.
    pub page_num: usize,
    pub image: ImageData,
}

/// Converts PDF bytes into page images in document order.
pub trait PageRasterizer: Send + Sync {
    fn rasterize<'a>(&'a self, pdf: &'a [u8])
        -> BoxFuture<'a, Result<Vec<PageImage>, LabParseError>>;
}

/// Rasteriser backed by Google PDFium.
///
/// Holds only configuration; a fresh `Pdfium` binding is made per request
/// because the upstream handle is not `Send`. The OS caches the `dlopen`.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    lib_path: Option<PathBuf>,
    max_pixels: u32,
}

impl PdfiumRasterizer {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            lib_path: config.pdfium_lib_path.clone(),
            max_pixels: config.max_rendered_pixels,
        }
    }

    /// Bind to pdfium once and release it, so a missing library is reported
    /// at startup instead of on the first upload.
    pub fn verify_binding(&self) -> Result<(), LabParseError> {
        bind_pdfium(self.lib_path.as_deref()).map(|_| ())
    }

    async fn render(&self, pdf: &[u8]) -> Result<Vec<PageImage>, LabParseError> {
        let staged = StagedPdf::write(pdf).await?;
        let lib_path = self.lib_path.clone();
        let max_pixels = self.max_pixels;

        tokio::task::spawn_blocking(move || {
            let result = render_pages_blocking(staged.path(), lib_path.as_deref(), max_pixels);
            drop(staged);
            result
        })
        .await
        .map_err(|e| LabParseError::Internal(format!("Render task panicked: {}", e)))?
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize<'a>(
        &'a self,
        pdf: &'a [u8],
    ) -> BoxFuture<'a, Result<Vec<PageImage>, LabParseError>> {
        self.render(pdf).boxed()
    }
}

/// An upload written to its own temporary directory.
///
/// Dropping it deletes the directory and everything in it.
pub(crate) struct StagedPdf {
    dir: TempDir,
    path: PathBuf,
}

impl StagedPdf {
    pub(crate) async fn write(bytes: &[u8]) -> Result<Self, LabParseError> {
        let prefix = format!("lab_upload_{}_", chrono::Utc::now().timestamp_millis());
        let dir = tempfile::Builder::new()
            .prefix(&prefix)
            .tempdir()
            .map_err(|source| LabParseError::TempStorage { source })?;
        let path = dir.path().join(STAGED_FILE_NAME);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| LabParseError::TempStorage { source })?;

        debug!(path = %path.display(), bytes = bytes.len(), "Staged upload");
        Ok(Self { dir, path })
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub(crate) fn dir(&self) -> &Path {
        self.dir.path()
    }
}

/// Bind to the pdfium shared library.
///
/// Discovery order:
/// 1. the configured directory (`PDFIUM_LIB_PATH`), exclusively when set
/// 2. the working directory
/// 3. system library search paths
fn bind_pdfium(lib_dir: Option<&Path>) -> Result<Pdfium, LabParseError> {
    if let Some(dir) = lib_dir {
        let lib = Pdfium::pdfium_platform_library_name_at_path(dir.to_string_lossy().as_ref());
        let bindings = Pdfium::bind_to_library(&lib).map_err(|e| {
            LabParseError::PdfiumBindingFailed(format!("{}: {}", lib.display(), e))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    let local = Pdfium::pdfium_platform_library_name_at_path("./");
    let bindings = Pdfium::bind_to_library(&local)
        .or_else(|_| Pdfium::bind_to_system_library())
        .map_err(|e| LabParseError::PdfiumBindingFailed(e.to_string()))?;
    Ok(Pdfium::new(bindings))
}

/// Map PDF load errors, singling out encrypted documents.
fn map_load_error(e: PdfiumError) -> LabParseError {
    let detail = format!("{:?}", e);
    let lower = detail.to_lowercase();
    if lower.contains("password") || lower.contains("encrypt") {
        LabParseError::PasswordRequired
    } else {
        LabParseError::CorruptPdf { detail }
    }
}

/// Blocking implementation of page rendering and encoding.
fn render_pages_blocking(
    pdf_path: &Path,
    lib_dir: Option<&Path>,
    max_pixels: u32,
) -> Result<Vec<PageImage>, LabParseError> {
    let pdfium = bind_pdfium(lib_dir)?;
    let document = pdfium
        .load_pdf_from_file(pdf_path, None)
        .map_err(map_load_error)?;

    let pages = document.pages();
    info!("PDF loaded: {} pages", pages.len());

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut results = Vec::new();

    for (idx, page) in pages.iter().enumerate() {
        let page_num = idx + 1;
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| LabParseError::RasterisationFailed {
                page: page_num,
                detail: format!("{:?}", e),
            })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            page_num,
            image.width(),
            image.height()
        );

        results.push(encode_rendered(page_num, &image)?);
    }

    Ok(results)
}

/// Encode one rendered page. A page that cannot be encoded fails the whole
/// document, like a page that cannot be rendered.
fn encode_rendered(page_num: usize, image: &DynamicImage) -> Result<PageImage, LabParseError> {
    let data = encode::encode_page(image).map_err(|e| LabParseError::RasterisationFailed {
        page: page_num,
        detail: e.to_string(),
    })?;
    Ok(PageImage {
        page_num,
        image: data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn staged_upload_is_removed_on_drop() {
        let staged = StagedPdf::write(b"%PDF-1.7 test").await.unwrap();
        let dir = staged.dir().to_path_buf();
        let file = staged.path().to_path_buf();

        assert_eq!(std::fs::read(&file).unwrap(), b"%PDF-1.7 test");
        assert!(dir
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with("lab_upload_")));

        drop(staged);
        assert!(!file.exists());
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn concurrent_stages_use_distinct_dirs() {
        let a = StagedPdf::write(b"a").await.unwrap();
        let b = StagedPdf::write(b"b").await.unwrap();
        assert_ne!(a.dir(), b.dir());
    }

    #[test]
    fn encoded_page_keeps_its_number() {
        let image = DynamicImage::new_rgba8(4, 4);
        let page = encode_rendered(2, &image).unwrap();
        assert_eq!(page.page_num, 2);
        assert_eq!(page.image.mime_type, "image/png");
    }

    #[test]
    fn unencodable_page_is_fatal() {
        // PNG has no representation for a zero-area image.
        let image = DynamicImage::new_rgba8(0, 0);
        match encode_rendered(3, &image) {
            Err(LabParseError::RasterisationFailed { page, .. }) => assert_eq!(page, 3),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn bad_explicit_lib_path_reports_binding_failure() {
        let missing = tempfile::tempdir().unwrap();
        let rasterizer = PdfiumRasterizer {
            lib_path: Some(missing.path().to_path_buf()),
            max_pixels: 2000,
        };
        assert!(matches!(
            rasterizer.verify_binding(),
            Err(LabParseError::PdfiumBindingFailed(_))
        ));
    }
}
