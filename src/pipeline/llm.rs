//! Vision-model interaction: send one page with the fixed prompt pair and
//! turn the reply into records.
//!
//! [`VisionModel`] is the seam; [`LlmVisionModel`] is the production
//! implementation over any `edgequake_llm` provider. [`process_page`] never
//! returns an error: a failing page yields a [`PageResult`] with `error` set
//! and no records, so the caller can carry on with the next page.
//!
//! ## Retry Strategy
//!
//! Retries are off by default (`max_retries = 0`). When enabled they apply to
//! transport failures and timeouts only, with exponential backoff
//! (`retry_backoff_ms * 2^attempt`). A reply that arrives but cannot be
//! parsed is final: asking again costs another full image upload.

use crate::config::ExtractionConfig;
use crate::error::{ModelError, PageError};
use crate::output::PageResult;
use crate::pipeline::render::PageImage;
use crate::pipeline::response::parse_model_response;
use crate::prompts::{SYSTEM_PROMPT, USER_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use futures::future::{BoxFuture, FutureExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, timeout, Duration};
use tracing::{debug, info, warn};

/// Text reply from a vision model plus token accounting.
#[derive(Debug, Clone, Default)]
pub struct VisionReply {
    pub content: String,
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// A multimodal model that reads one image under a system and a user instruction.
pub trait VisionModel: Send + Sync {
    fn complete_page<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        image: ImageData,
    ) -> BoxFuture<'a, Result<VisionReply, ModelError>>;
}

/// [`VisionModel`] over an `edgequake_llm` provider, built once at startup.
pub struct LlmVisionModel {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
}

impl LlmVisionModel {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ExtractionConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
        }
    }

    async fn chat(
        &self,
        system: &str,
        user: &str,
        image: ImageData,
    ) -> Result<VisionReply, ModelError> {
        let messages = vec![
            ChatMessage::system(system),
            ChatMessage::user_with_images(user, vec![image]),
        ];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| ModelError(e.to_string()))?;

        Ok(VisionReply {
            content: response.content,
            input_tokens: response.prompt_tokens as u64,
            output_tokens: response.completion_tokens as u64,
        })
    }
}

impl VisionModel for LlmVisionModel {
    fn complete_page<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        image: ImageData,
    ) -> BoxFuture<'a, Result<VisionReply, ModelError>> {
        self.chat(system, user, image).boxed()
    }
}

/// Extract the records from a single page.
///
/// The request contains the system prompt and one user message carrying the
/// user prompt plus the page image.
pub async fn process_page(
    model: &dyn VisionModel,
    page: PageImage,
    config: &ExtractionConfig,
) -> PageResult {
    let start = Instant::now();
    let page_num = page.page_num;
    let mut last_err: Option<PageError> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = backoff_ms(config.retry_backoff_ms, attempt);
            warn!(
                "Page {}: retry {}/{} after {}ms",
                page_num, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        let call = model.complete_page(SYSTEM_PROMPT, USER_PROMPT, page.image.clone());
        let outcome = match config.api_timeout_secs {
            Some(secs) => match timeout(Duration::from_secs(secs), call).await {
                Ok(result) => result,
                Err(_) => {
                    warn!("Page {}: attempt {} timed out after {}s", page_num, attempt + 1, secs);
                    last_err = Some(PageError::Timeout {
                        page: page_num,
                        secs,
                    });
                    continue;
                }
            },
            None => call.await,
        };

        match outcome {
            Ok(reply) => {
                debug!(
                    "Page {}: {} input tokens, {} output tokens, raw reply:\n{}",
                    page_num, reply.input_tokens, reply.output_tokens, reply.content
                );

                let (records, error) = match parse_model_response(&reply.content) {
                    Ok(records) => {
                        info!("Page {}: parsed {} test results", page_num, records.len());
                        (records, None)
                    }
                    Err(e) => {
                        warn!("Page {}: failed to parse reply: {}", page_num, e);
                        (
                            Vec::new(),
                            Some(PageError::Unparseable {
                                page: page_num,
                                reason: e.to_string(),
                            }),
                        )
                    }
                };

                return PageResult {
                    page_num,
                    records,
                    input_tokens: reply.input_tokens,
                    output_tokens: reply.output_tokens,
                    duration_ms: start.elapsed().as_millis() as u64,
                    retries: attempt,
                    error,
                };
            }
            Err(e) => {
                warn!("Page {}: attempt {} failed: {}", page_num, attempt + 1, e);
                last_err = Some(PageError::ModelFailed {
                    page: page_num,
                    retries: attempt,
                    detail: e.to_string(),
                });
            }
        }
    }

    // All attempts exhausted
    let error = last_err.unwrap_or_else(|| PageError::ModelFailed {
        page: page_num,
        retries: config.max_retries,
        detail: "Unknown error".to_string(),
    });

    PageResult {
        page_num,
        records: Vec::new(),
        input_tokens: 0,
        output_tokens: 0,
        duration_ms: start.elapsed().as_millis() as u64,
        retries: config.max_retries,
        error: Some(error),
    }
}

/// Delay before retry `attempt` (1-based): `base * 2^(attempt-1)`, saturating.
fn backoff_ms(base: u64, attempt: u32) -> u64 {
    2u64
        .checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| base.checked_mul(factor))
        .unwrap_or(u64::MAX)
}

/// Build `CompletionOptions` from the extraction config.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: config.temperature,
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
