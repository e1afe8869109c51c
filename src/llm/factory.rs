use std::sync::Arc;
use std::time::Duration;

use super::embeddings::{EmbeddingGenerator, EmbeddingSettings};
use super::providers::base::LlmProvider;
use super::providers::fallback::LlmProviderWithFallback;
use super::providers::ollama::OllamaProvider;
use super::providers::openai::OpenAiCompatProvider;
use crate::core::config::QueryForgeConfig;
use crate::core::error::{QueryForgeError, Result};
use crate::DEFAULT_OLLAMA_URL;


pub struct LlmProviderFactory;

impl LlmProviderFactory {

    pub fn create(
        provider: &str,
        model: &str,
        api_key: Option<&str>,
        base_url: Option<&str>,
        temperature: f64,
        timeout: Duration,
    ) -> Result<Arc<dyn LlmProvider>> {
        let provider: Arc<dyn LlmProvider> = match provider.to_lowercase().as_str() {
            "ollama" => Arc::new(
                OllamaProvider::new(
                    base_url.unwrap_or(DEFAULT_OLLAMA_URL),
                    model,
                    temperature,
                    timeout,
                )
                .map_err(|e| QueryForgeError::LlmProvider(e.to_string()))?,
            ),
            "openai" => Arc::new(
                OpenAiCompatProvider::new(
                    api_key.map(String::from),
                    base_url.map(String::from),
                    model,
                    temperature,
                    timeout,
                )
                .map_err(|e| QueryForgeError::LlmProvider(e.to_string()))?,
            ),
            other => {
                return Err(QueryForgeError::Config(format!(
                    "Unknown LLM provider: {other}. Supported: ollama, openai"
                )));
            }
        };
        Ok(provider)
    }


    pub fn from_config(config: &QueryForgeConfig) -> Result<Arc<dyn LlmProvider>> {
        let primary = Self::create(
            &config.llm_provider,
            &config.llm_model,
            config.llm_api_key.as_deref(),
            config.llm_base_url.as_deref(),
            config.llm_temperature,
            config.llm_timeout(),
        )?;

        if !config.llm_fallback_enabled {
            return Ok(primary);
        }

        let fallback = Self::create(
            "ollama",
            &config.llm_fallback_model,
            None,
            Some(&config.llm_fallback_url),
            config.llm_temperature,
            config.llm_timeout(),
        )?;
        Ok(Arc::new(LlmProviderWithFallback::new(primary, fallback)))
    }
}


pub struct EmbeddingProviderFactory;

impl EmbeddingProviderFactory {

    pub fn from_config(config: &QueryForgeConfig) -> Result<EmbeddingGenerator> {
        EmbeddingGenerator::new(EmbeddingSettings {
            provider: config.embedding_provider.clone(),
            url: config.embedding_url.clone(),
            model: config.embedding_model.clone(),
            api_key: config.embedding_api_key.clone(),
            timeout: config.embedding_timeout(),
            cache_size: config.embedding_cache_size,
            cache_ttl_secs: config.embedding_cache_ttl_secs,
            fallback_enabled: config.embedding_fallback_enabled,
            fallback_url: config.embedding_fallback_url.clone(),
            fallback_model: config.embedding_fallback_model.clone(),
        })
        .map_err(|e| QueryForgeError::Embedding(e.to_string()))
    }
}
