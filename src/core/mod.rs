pub mod cache;
pub mod config;
pub mod error;
pub mod modes;

pub use cache::{CacheStats, EmbeddingCache};
pub use config::QueryForgeConfig;
pub use error::{QueryForgeError, Result};
pub use modes::{EnhancementMode, ModeConfig};
