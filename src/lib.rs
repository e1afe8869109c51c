pub mod core;
pub mod llm;
pub mod toolkit;
pub mod utils;

pub use utils::{safe_truncate, safe_truncate_ellipsis};


pub use core::config::QueryForgeConfig;
pub use core::error::{QueryForgeError, Result};
pub use core::modes::{EnhancementMode, ModeConfig};
pub use llm::embeddings::EmbeddingGenerator;
pub use toolkit::query_enhancer::{
    enhance_for_retrieval, ClassificationResult, ConversationTurn, EnhancementReport,
    IntentLabel, QueryClassifier, QueryEnhancer, QueryExpansion, ServiceGateway,
};


pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";


pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";


pub const DEFAULT_LLM_MODEL: &str = "llama3.1:8b";


pub const DEFAULT_CACHE_SIZE: usize = 1000;


pub const DEFAULT_CACHE_TTL: u64 = 300;
