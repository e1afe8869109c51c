pub mod classifier;
pub mod expander;
pub mod gateway;
pub mod intent;
pub mod models;
pub mod orchestrator;
pub mod patterns;
pub mod prompts;
pub mod refiner;
pub mod terms;

#[cfg(test)]
pub(crate) mod testing;

pub use classifier::{QueryClassifier, QuerySignals};
pub use expander::SemanticExpander;
pub use gateway::{ServiceGateway, StageError};
pub use intent::{classify_by_keywords, IntentClassifier};
pub use models::{
    ClassificationResult, ClassificationStats, ContextRefinement, ConversationTurn,
    EnhancementPath, EnhancementReport, IntentLabel, IntentResult, IntentSource, QueryExpansion,
    TimeSensitivity, TurnRole,
};
pub use orchestrator::{enhance_for_retrieval, QueryEnhancer, FAST_PATH_CONFIDENCE};
pub use refiner::ContextRefiner;
