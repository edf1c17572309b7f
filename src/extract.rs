//! Request-level coordinator: PDF bytes in, lab test records out.
//!
//! [`LabReportExtractor`] is built once at startup with its rasterizer and
//! vision model and shared by every request. Pages are sent to the model
//! strictly one at a time, in page order.

use crate::config::ExtractionConfig;
use crate::error::LabParseError;
use crate::output::{Extraction, ExtractionStats, PageResult};
use crate::pipeline::llm::{self, LlmVisionModel, VisionModel};
use crate::pipeline::render::{PageImage, PageRasterizer, PdfiumRasterizer};
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Runs the rasterise → model → parse → aggregate pipeline.
pub struct LabReportExtractor {
    rasterizer: Arc<dyn PageRasterizer>,
    model: Arc<dyn VisionModel>,
    config: ExtractionConfig,
}

impl LabReportExtractor {
    /// Assemble an extractor from explicit collaborators.
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        model: Arc<dyn VisionModel>,
        config: ExtractionConfig,
    ) -> Self {
        Self {
            rasterizer,
            model,
            config,
        }
    }

    /// Production wiring: pdfium rasteriser plus the provider resolved from
    /// `config` and the environment.
    ///
    /// Fails when pdfium cannot be bound or no provider is configured, so
    /// the service refuses to start rather than failing every upload.
    pub fn from_config(config: ExtractionConfig) -> Result<Self, LabParseError> {
        let rasterizer = PdfiumRasterizer::new(&config);
        rasterizer.verify_binding()?;

        let provider = resolve_provider(&config)?;
        info!(
            provider = config.provider_name.as_deref().unwrap_or("auto"),
            model = config.model_or_default(),
            "Vision model ready"
        );
        let model = LlmVisionModel::new(provider, &config);

        Ok(Self::new(Arc::new(rasterizer), Arc::new(model), config))
    }

    /// Extract every lab test record from an already validated PDF.
    ///
    /// # Returns
    /// `Ok(Extraction)` whenever at least one page was rendered, even if
    /// every page then failed at the model (check `stats.failed_pages`).
    ///
    /// # Errors
    /// - [`LabParseError::NoPagesRendered`] when the rasteriser yields nothing
    /// - any rasteriser error (corrupt PDF, pdfium unavailable, …)
    pub async fn extract(&self, pdf: &[u8]) -> Result<Extraction, LabParseError> {
        let total_start = Instant::now();

        // ── Step 1: Rasterise pages ──────────────────────────────────────
        let render_start = Instant::now();
        let pages = self.rasterizer.rasterize(pdf).await?;
        let render_duration_ms = render_start.elapsed().as_millis() as u64;
        info!(
            "Converted PDF to {} images in {}ms",
            pages.len(),
            render_duration_ms
        );

        if pages.is_empty() {
            return Err(LabParseError::NoPagesRendered);
        }
        let total_pages = pages.len();

        // ── Step 2: Send each page to the model ──────────────────────────
        let llm_start = Instant::now();
        let results = self.process_sequential(pages).await;
        let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

        // ── Step 3: Aggregate ────────────────────────────────────────────
        let failed_pages = results.iter().filter(|p| p.error.is_some()).count();
        let input_tokens = results.iter().map(|p| p.input_tokens).sum();
        let output_tokens = results.iter().map(|p| p.output_tokens).sum();
        let records: Vec<_> = results.into_iter().flat_map(|p| p.records).collect();

        if failed_pages == total_pages {
            warn!("Every page failed; returning an empty result set");
        }

        let stats = ExtractionStats {
            total_pages,
            failed_pages,
            total_results: records.len(),
            input_tokens,
            output_tokens,
            render_duration_ms,
            llm_duration_ms,
            total_duration_ms: total_start.elapsed().as_millis() as u64,
        };

        info!(
            "Extraction complete: {} test results from {}/{} pages, {}ms total",
            stats.total_results,
            total_pages - failed_pages,
            total_pages,
            stats.total_duration_ms
        );

        Ok(Extraction { records, stats })
    }

    /// One model call at a time; each page waits for the previous one.
    async fn process_sequential(&self, pages: Vec<PageImage>) -> Vec<PageResult> {
        let total = pages.len();
        let mut results = Vec::with_capacity(total);

        for page in pages {
            info!("Processing page {}/{}", page.page_num, total);
            let result = llm::process_page(self.model.as_ref(), page, &self.config).await;
            results.push(result);
        }

        results
    }
}

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, LabParseError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        LabParseError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider** (`config.provider_name`) with `config.model`; the
///    factory reads that provider's API key from the environment.
/// 3. **OpenAI** when `OPENAI_API_KEY` is set.
/// 4. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, LabParseError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, config.model_or_default());
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_vision_provider("openai", config.model_or_default());
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| LabParseError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or pass --provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
