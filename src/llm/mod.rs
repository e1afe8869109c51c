pub mod embeddings;
pub mod factory;
pub mod json;
pub mod providers;

pub use embeddings::{EmbeddingError, EmbeddingGenerator, EmbeddingProvider, EmbeddingSettings};
pub use factory::{EmbeddingProviderFactory, LlmProviderFactory};
pub use providers::{LlmMetadata, LlmProvider, LlmProviderError, ResponseFormat};
