use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::debug;

use crate::core::config::QueryForgeConfig;
use crate::core::error::Result;
use crate::llm::embeddings::{EmbeddingError, EmbeddingProvider};
use crate::llm::factory::{EmbeddingProviderFactory, LlmProviderFactory};
use crate::llm::providers::base::{LlmProvider, LlmProviderError, ResponseFormat};

const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_EMBEDDING_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_MAX_CONCURRENT_LLM_CALLS: usize = 3;


/// Why a stage fell back to its deterministic default. Never leaves the
/// pipeline.
#[derive(Error, Debug)]
pub enum StageError {
    #[error("{0} service not configured")]
    Unavailable(&'static str),

    #[error("LLM call failed: {0}")]
    Llm(#[from] LlmProviderError),

    #[error("Embedding call failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("{service} call timed out after {after:?}")]
    Timeout { service: &'static str, after: Duration },

    #[error("Unusable model output: {0}")]
    Parse(String),
}


/// Whole-call budget for a provider whose HTTP client is bounded by
/// `per_attempt`. With fallback enabled a call may spend one full attempt on
/// the primary before the fallback gets its own.
pub fn call_budget(per_attempt: Duration, fallback_enabled: bool) -> Duration {
    if fallback_enabled {
        per_attempt * 2
    } else {
        per_attempt
    }
}


/// Shared handle on the external services, with per-call timeouts. Cloning is
/// cheap; a gateway without services is valid and makes every stage fall back.
#[derive(Clone)]
pub struct ServiceGateway {
    llm: Option<Arc<dyn LlmProvider>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    llm_timeout: Duration,
    embedding_timeout: Duration,
    max_concurrent_llm_calls: usize,
}

impl ServiceGateway {
    pub fn new(
        llm: Option<Arc<dyn LlmProvider>>,
        embedder: Option<Arc<dyn EmbeddingProvider>>,
    ) -> Self {
        Self {
            llm,
            embedder,
            llm_timeout: DEFAULT_LLM_TIMEOUT,
            embedding_timeout: DEFAULT_EMBEDDING_TIMEOUT,
            max_concurrent_llm_calls: DEFAULT_MAX_CONCURRENT_LLM_CALLS,
        }
    }


    pub fn offline() -> Self {
        Self::new(None, None)
    }


    pub fn from_config(config: &QueryForgeConfig) -> Result<Self> {
        let llm = LlmProviderFactory::from_config(config)?;
        let embedder: Arc<dyn EmbeddingProvider> =
            Arc::new(EmbeddingProviderFactory::from_config(config)?);

        Ok(Self::new(Some(llm), Some(embedder))
            .with_timeouts(
                call_budget(config.llm_timeout(), config.llm_fallback_enabled),
                call_budget(config.embedding_timeout(), config.embedding_fallback_enabled),
            )
            .with_max_concurrent_llm_calls(config.max_concurrent_llm_calls))
    }

    pub fn with_timeouts(mut self, llm: Duration, embedding: Duration) -> Self {
        self.llm_timeout = llm;
        self.embedding_timeout = embedding;
        self
    }

    pub fn with_max_concurrent_llm_calls(mut self, max: usize) -> Self {
        self.max_concurrent_llm_calls = max.max(1);
        self
    }

    pub fn llm_timeout(&self) -> Duration {
        self.llm_timeout
    }

    pub fn embedding_timeout(&self) -> Duration {
        self.embedding_timeout
    }

    pub fn max_concurrent_llm_calls(&self) -> usize {
        self.max_concurrent_llm_calls
    }

    pub fn has_llm(&self) -> bool {
        self.llm.is_some()
    }

    pub fn has_embedder(&self) -> bool {
        self.embedder.is_some()
    }


    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        format: ResponseFormat,
    ) -> std::result::Result<String, StageError> {
        let llm = self.llm.as_ref().ok_or(StageError::Unavailable("LLM"))?;

        let (content, metadata) = timeout(
            self.llm_timeout,
            llm.generate(system_prompt, user_prompt, format),
        )
        .await
        .map_err(|_| StageError::Timeout {
            service: "LLM",
            after: self.llm_timeout,
        })??;

        debug!(
            "LLM completion from {}/{} ({} chars, fallback_used={})",
            metadata.provider,
            metadata.model,
            content.len(),
            metadata.fallback_used
        );
        Ok(content)
    }


    pub async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, StageError> {
        let embedder = self
            .embedder
            .as_ref()
            .ok_or(StageError::Unavailable("embedding"))?;

        let vector = timeout(self.embedding_timeout, embedder.embed(text))
            .await
            .map_err(|_| StageError::Timeout {
                service: "embedding",
                after: self.embedding_timeout,
            })??;

        if vector.is_empty() {
            return Err(StageError::Parse("empty embedding vector".to_string()));
        }
        Ok(vector)
    }
}

impl std::fmt::Debug for ServiceGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceGateway")
            .field("llm", &self.llm.as_ref().map(|l| l.model_name().to_string()))
            .field("embedder", &self.embedder.as_ref().map(|e| e.model_name().to_string()))
            .field("llm_timeout", &self.llm_timeout)
            .field("embedding_timeout", &self.embedding_timeout)
            .field("max_concurrent_llm_calls", &self.max_concurrent_llm_calls)
            .finish()
    }
}
