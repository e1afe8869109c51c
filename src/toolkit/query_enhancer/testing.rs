use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::embeddings::{EmbeddingError, EmbeddingProvider};
use crate::llm::providers::base::{LlmMetadata, LlmProvider, LlmProviderError, ResponseFormat};

use super::gateway::ServiceGateway;

type Responder = Box<dyn Fn(&str, &str) -> Result<String, String> + Send + Sync>;


pub struct ScriptedLlm {
    responder: Responder,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedLlm {
    pub fn replying<F>(responder: F) -> Self
    where
        F: Fn(&str, &str) -> Result<String, String> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self::replying(|_, _| Err("service unavailable".to_string()))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlm {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _format: ResponseFormat,
    ) -> Result<(String, LlmMetadata), LlmProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let reply = (self.responder)(system_prompt, user_prompt);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        reply
            .map(|content| {
                (
                    content,
                    LlmMetadata {
                        provider: "scripted".to_string(),
                        model: "scripted".to_string(),
                        ..Default::default()
                    },
                )
            })
            .map_err(LlmProviderError::Provider)
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}


pub struct StaticEmbedder {
    vector: Option<Vec<f32>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StaticEmbedder {
    pub fn new(vector: Vec<f32>) -> Self {
        Self {
            vector: Some(vector),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            vector: None,
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for StaticEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.vector
            .clone()
            .ok_or_else(|| EmbeddingError::InvalidResponse("embedding service down".to_string()))
    }

    fn model_name(&self) -> &str {
        "static"
    }
}


pub fn gateway(
    llm: Option<&Arc<ScriptedLlm>>,
    embedder: Option<&Arc<StaticEmbedder>>,
) -> ServiceGateway {
    let llm = llm.map(|l| Arc::clone(l) as Arc<dyn LlmProvider>);
    let embedder = embedder.map(|e| Arc::clone(e) as Arc<dyn EmbeddingProvider>);
    ServiceGateway::new(llm, embedder)
        .with_timeouts(Duration::from_millis(200), Duration::from_millis(200))
}
