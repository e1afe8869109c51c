use thiserror::Error;


#[derive(Error, Debug)]
pub enum QueryForgeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown enhancement mode: {0} (expected speed, balanced or quality)")]
    UnknownMode(String),

    #[error("LLM provider error: {0}")]
    LlmProvider(String),

    #[error("Embedding generation error: {0}")]
    Embedding(String),
}

impl From<::config::ConfigError> for QueryForgeError {
    fn from(e: ::config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}


pub type Result<T> = std::result::Result<T, QueryForgeError>;
