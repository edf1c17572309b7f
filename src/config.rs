//! Configuration types for the extraction pipeline and the HTTP listener.
//!
//! [`ExtractionConfig`] controls rendering and the vision-model call and is
//! built through [`ExtractionConfigBuilder`]. [`ServerConfig`] only concerns
//! the socket and request limits.

use crate::error::LabParseError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 4000;

/// Default vision model.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Upper bound accepted for [`ExtractionConfig::max_retries`].
pub const MAX_RETRIES: u32 = 10;

/// Configuration for the PDF → records pipeline.
///
/// # Example
/// ```rust
/// use lab_report_parser::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .model("gpt-4o-mini")
///     .max_tokens(2048)
///     .build()
///     .unwrap();
/// assert_eq!(config.max_tokens, 2048);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Maximum rendered image dimension (width or height) in pixels. Default: 2000.
    ///
    /// Lab reports are mostly dense tables of small print; 2000 px on the
    /// long edge keeps reference ranges legible while staying well under
    /// provider image-size limits.
    pub max_rendered_pixels: u32,

    /// Directory holding the pdfium shared library. If None, the working
    /// directory and then the system library path are searched.
    pub pdfium_lib_path: Option<PathBuf>,

    /// LLM model identifier. If None, [`DEFAULT_MODEL`].
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "gemini").
    /// If None along with `provider`, the environment decides.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. None leaves the provider default in place.
    pub temperature: Option<f32>,

    /// Maximum tokens the model may generate per page. Default: 4096.
    pub max_tokens: usize,

    /// Retry attempts on a failed model call. Default: 0.
    ///
    /// A failed page is terminal unless this is raised. Unparseable replies
    /// are never retried.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call timeout in seconds. None defers to the provider's own timeout.
    pub api_timeout_secs: Option<u64>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_rendered_pixels: 2000,
            pdfium_lib_path: None,
            model: None,
            provider_name: None,
            provider: None,
            temperature: None,
            max_tokens: 4096,
            max_retries: 0,
            retry_backoff_ms: 500,
            api_timeout_secs: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model to request, falling back to [`DEFAULT_MODEL`].
    pub fn model_or_default(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n.min(MAX_RETRIES);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, LabParseError> {
        let c = &self.config;
        if c.max_tokens == 0 {
            return Err(LabParseError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(LabParseError::InvalidConfig(
                "api timeout must be ≥ 1s".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Listener settings for the HTTP service.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    /// Default: [`DEFAULT_PORT`].
    pub port: u16,
    /// Upper bound on the multipart request body. Default: 50 MiB.
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_PORT,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
