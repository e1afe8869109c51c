pub mod query_enhancer;


pub use query_enhancer::{
    enhance_for_retrieval, ConversationTurn, EnhancementReport, QueryClassifier, QueryEnhancer,
    QueryExpansion, ServiceGateway,
};
