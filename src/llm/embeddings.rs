use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use crate::core::cache::{CacheStats, EmbeddingCache};


#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Empty text")]
    EmptyText,

    #[error("Provider not implemented: {0}")]
    NotImplemented(String),

    #[error("Both primary and fallback failed: primary={0}, fallback={1}")]
    BothFailed(String, String),
}


#[async_trait]
pub trait EmbeddingProvider: Send + Sync {

    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;


    fn model_name(&self) -> &str;
}


#[derive(Serialize)]
struct OllamaEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct OllamaEmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Serialize)]
struct OpenAIEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingResponse {
    data: Vec<OpenAIEmbeddingData>,
}

#[derive(Deserialize)]
struct OpenAIEmbeddingData {
    embedding: Vec<f32>,
}


#[derive(Debug, Clone)]
pub struct EmbeddingSettings {
    pub provider: String,
    pub url: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub cache_size: usize,
    pub cache_ttl_secs: u64,
    pub fallback_enabled: bool,
    pub fallback_url: String,
    pub fallback_model: String,
}


pub struct EmbeddingGenerator {
    provider: String,
    url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
    cache: EmbeddingCache,

    fallback_enabled: bool,
    fallback_url: String,
    fallback_model: String,
    using_fallback: AtomicBool,
    fallback_count: AtomicUsize,
}

impl EmbeddingGenerator {

    pub fn new(settings: EmbeddingSettings) -> Result<Self, EmbeddingError> {
        let provider = settings.provider.to_lowercase();
        if provider != "ollama" && provider != "openai" {
            return Err(EmbeddingError::NotImplemented(provider));
        }

        info!(
            "EmbeddingGenerator initialized: provider={}, model={}, cache={}",
            provider, settings.model, settings.cache_size
        );

        Ok(Self {
            provider,
            url: settings.url.trim_end_matches('/').to_string(),
            model: settings.model,
            api_key: settings.api_key,
            client: Client::builder().timeout(settings.timeout).build()?,
            cache: EmbeddingCache::new(settings.cache_size, settings.cache_ttl_secs),
            fallback_enabled: settings.fallback_enabled,
            fallback_url: settings.fallback_url.trim_end_matches('/').to_string(),
            fallback_model: settings.fallback_model,
            using_fallback: AtomicBool::new(false),
            fallback_count: AtomicUsize::new(0),
        })
    }


    pub async fn generate(&self, text: &str, use_cache: bool) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::EmptyText);
        }

        if use_cache {
            if let Some(cached) = self.cache.get(&self.model, text) {
                debug!("Embedding cache HIT for: {}...", crate::safe_truncate(text, 50));
                return Ok(cached);
            }
        }

        let result = match self.provider.as_str() {
            "ollama" => self.generate_ollama(&self.url, &self.model, text).await,
            _ => self.generate_openai(text).await,
        };

        match result {
            Ok(embedding) => {
                if use_cache {
                    self.cache.set(&self.model, text, embedding.clone());
                }
                self.using_fallback.store(false, Ordering::SeqCst);
                Ok(embedding)
            }
            Err(e) if self.fallback_enabled => {
                debug!("Primary embedding provider unavailable, trying fallback: {}", e);
                self.fallback_to_ollama(text, use_cache, &e).await
            }
            Err(e) => Err(e),
        }
    }

    async fn generate_ollama(
        &self,
        url: &str,
        model: &str,
        text: &str,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let response = self
            .client
            .post(format!("{}/api/embeddings", url))
            .json(&OllamaEmbeddingRequest { model, prompt: text })
            .send()
            .await?
            .error_for_status()?
            .json::<OllamaEmbeddingResponse>()
            .await?;

        if response.embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse("Empty embedding vector".to_string()));
        }
        Ok(response.embedding)
    }

    async fn generate_openai(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbeddingError::InvalidResponse("API key required".to_string()))?;

        let response = self
            .client
            .post(format!("{}/embeddings", self.url))
            .bearer_auth(api_key)
            .json(&OpenAIEmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await?
            .error_for_status()?
            .json::<OpenAIEmbeddingResponse>()
            .await?;

        response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|e| !e.is_empty())
            .ok_or_else(|| EmbeddingError::InvalidResponse("No embedding in response".to_string()))
    }

    async fn fallback_to_ollama(
        &self,
        text: &str,
        use_cache: bool,
        original_error: &EmbeddingError,
    ) -> Result<Vec<f32>, EmbeddingError> {
        info!(
            "Using fallback Ollama ({}/{}) - primary unavailable",
            self.fallback_url, self.fallback_model
        );

        let embedding = self
            .generate_ollama(&self.fallback_url, &self.fallback_model, text)
            .await
            .map_err(|e| EmbeddingError::BothFailed(original_error.to_string(), e.to_string()))?;

        if use_cache {
            self.cache.set(&self.model, text, embedding.clone());
        }

        self.using_fallback.store(true, Ordering::SeqCst);
        let total = self.fallback_count.fetch_add(1, Ordering::SeqCst) + 1;

        info!(
            "Fallback successful! dims={}, total_fallbacks={}",
            embedding.len(),
            total
        );

        Ok(embedding)
    }


    pub fn is_using_fallback(&self) -> bool {
        self.using_fallback.load(Ordering::SeqCst)
    }


    pub fn fallback_count(&self) -> usize {
        self.fallback_count.load(Ordering::SeqCst)
    }


    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }


    pub fn clear_cache(&self) {
        self.cache.clear();
        info!("Embedding cache cleared");
    }


    pub fn provider(&self) -> &str {
        &self.provider
    }
}

#[async_trait]
impl EmbeddingProvider for EmbeddingGenerator {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.generate(text, true).await
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(provider: &str) -> EmbeddingSettings {
        EmbeddingSettings {
            provider: provider.to_string(),
            url: "http://127.0.0.1:9".to_string(),
            model: "nomic-embed-text".to_string(),
            api_key: None,
            timeout: Duration::from_millis(200),
            cache_size: 4,
            cache_ttl_secs: 60,
            fallback_enabled: false,
            fallback_url: "http://127.0.0.1:9".to_string(),
            fallback_model: "nomic-embed-text".to_string(),
        }
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = EmbeddingGenerator::new(settings("word2vec")).err().unwrap();
        assert!(matches!(err, EmbeddingError::NotImplemented(ref p) if p == "word2vec"));
    }

    #[test]
    fn test_empty_text_rejected_without_io() {
        let generator = EmbeddingGenerator::new(settings("ollama")).unwrap();
        let result = tokio_test::block_on(generator.embed("   "));
        assert!(matches!(result, Err(EmbeddingError::EmptyText)));
        assert_eq!(generator.cache_stats().misses, 0);
    }

    #[tokio::test]
    async fn test_openai_requires_api_key() {
        let generator = EmbeddingGenerator::new(settings("OpenAI")).unwrap();
        assert_eq!(generator.provider(), "openai");
        let err = generator.embed("hello").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidResponse(_)));
    }
}
