//! HTTP server binary for lab-report-parser.
//!
//! A thin shim over the library crate that maps CLI flags and environment
//! variables to `ExtractionConfig` / `ServerConfig` and serves the router.

use anyhow::{Context, Result};
use clap::Parser;
use lab_report_parser::config::{DEFAULT_MODEL, DEFAULT_PORT, MAX_RETRIES};
use lab_report_parser::{api, ExtractionConfig, LabReportExtractor, ServerConfig};
use std::io;
use std::net::IpAddr;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const AFTER_HELP: &str = r#"ENDPOINTS:
  POST /api/parse-pdf   multipart/form-data with a PDF in the `file` field
  GET  /health          liveness probe, returns {"status":"ok"}

EXAMPLES:
  # Serve on the default port with OpenAI (reads OPENAI_API_KEY)
  lab-report-server

  # Anthropic on port 8080
  lab-report-server --provider anthropic --model claude-sonnet-4-20250514 --port 8080

  # Upload a report
  curl -F file=@report.pdf http://localhost:4000/api/parse-pdf

PDFIUM:
  pdfium is looked up in PDFIUM_LIB_PATH, then the working directory, then
  the system library path. The server refuses to start without it.
"#;

/// Extract lab test results from PDF reports with a vision LLM.
#[derive(Parser, Debug)]
#[command(
    name = "lab-report-server",
    version,
    about = "Extract lab test results from PDF reports with a vision LLM",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Address to bind.
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: IpAddr,

    /// Port to listen on.
    #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(
        long,
        env = "LAB_PARSER_PROVIDER",
        long_help = "LLM provider. Auto-detected from API key env vars if not set.\n\
          Supported: openai, anthropic, gemini, azure, ollama, or any OpenAI-compatible URL."
    )]
    provider: Option<String>,

    /// Vision model ID.
    #[arg(long, env = "LAB_PARSER_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Max LLM output tokens per page.
    #[arg(long, env = "LAB_PARSER_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0). Provider default when unset.
    #[arg(long, env = "LAB_PARSER_TEMPERATURE")]
    temperature: Option<f32>,

    /// Retries per page on a failed model call.
    #[arg(long, env = "LAB_PARSER_MAX_RETRIES", default_value_t = 0,
          value_parser = clap::value_parser!(u32).range(0..=MAX_RETRIES as i64))]
    max_retries: u32,

    /// Per-page LLM call timeout in seconds.
    #[arg(long, env = "LAB_PARSER_API_TIMEOUT")]
    api_timeout: Option<u64>,

    /// Longest rendered page edge in pixels.
    #[arg(long, env = "LAB_PARSER_MAX_PIXELS", default_value_t = 2000,
          value_parser = clap::value_parser!(u32).range(200..=8000))]
    max_pixels: u32,

    /// Largest accepted request body in MiB.
    #[arg(long, env = "LAB_PARSER_MAX_UPLOAD_MB", default_value_t = 50,
          value_parser = clap::value_parser!(u64).range(1..=1024))]
    max_upload_mb: u64,

    /// Directory containing the pdfium shared library.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs, including raw model replies.
    #[arg(short, long, env = "LAB_PARSER_VERBOSE")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, env = "LAB_PARSER_QUIET")]
    quiet: bool,
}

impl Cli {
    fn extraction_config(&self) -> Result<ExtractionConfig> {
        let mut builder = ExtractionConfig::builder()
            .model(self.model.clone())
            .max_tokens(self.max_tokens)
            .max_retries(self.max_retries)
            .max_rendered_pixels(self.max_pixels);

        if let Some(ref provider) = self.provider {
            builder = builder.provider_name(provider.clone());
        }
        if let Some(t) = self.temperature {
            builder = builder.temperature(t);
        }
        if let Some(secs) = self.api_timeout {
            builder = builder.api_timeout_secs(secs);
        }
        if let Some(ref path) = self.pdfium_lib_path {
            builder = builder.pdfium_lib_path(path.clone());
        }

        builder.build().context("Invalid extraction settings")
    }

    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            host: self.host,
            port: self.port,
            max_upload_bytes: (self.max_upload_mb as usize) * 1024 * 1024,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.quiet {
        "error"
    } else if cli.verbose {
        "debug"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build the pipeline ───────────────────────────────────────────────
    let config = cli.extraction_config()?;
    let extractor = LabReportExtractor::from_config(config)
        .context("Failed to initialise the extraction pipeline")?;

    // ── Serve ────────────────────────────────────────────────────────────
    let server = cli.server_config();
    let app = api::router(api::AppState::new(extractor), &server);
    let addr = server.socket_addr();
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    api::serve(listener, app, shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
