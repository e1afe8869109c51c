use std::time::Instant;

use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use super::classifier::QueryClassifier;
use super::expander::SemanticExpander;
use super::gateway::ServiceGateway;
use super::intent::IntentClassifier;
use super::models::{
    recent_turns, ClassificationResult, ContextRefinement, ConversationTurn, EnhancementPath,
    EnhancementReport, IntentLabel, QueryExpansion,
};
use super::refiner::ContextRefiner;
use super::terms::{context_terms, semantic_terms};
use crate::core::error::Result;
use crate::core::modes::{EnhancementMode, ModeConfig};
use crate::utils::{eq_ignore_case, safe_truncate};

pub const FAST_PATH_CONFIDENCE: f64 = 0.9;


/// Entry point of the pipeline: rule-based gate first, then intent, semantic
/// expansion and context refinement when the gate asks for it. Every method is
/// total; service trouble only makes the result shallower.
pub struct QueryEnhancer {
    mode: EnhancementMode,
    config: ModeConfig,
    classifier: QueryClassifier,
    intent: IntentClassifier,
    expander: SemanticExpander,
    refiner: ContextRefiner,
}

impl QueryEnhancer {
    pub fn new(gateway: ServiceGateway, mode: EnhancementMode) -> Self {
        Self::with_config(gateway, mode, mode.config())
    }

    pub fn with_config(gateway: ServiceGateway, mode: EnhancementMode, config: ModeConfig) -> Self {
        info!(
            "QueryEnhancer initialized: mode={}, llm={}, embeddings={}",
            mode,
            gateway.has_llm(),
            gateway.has_embedder()
        );
        Self {
            mode,
            config,
            classifier: QueryClassifier::new(),
            intent: IntentClassifier::new(gateway.clone(), &config),
            expander: SemanticExpander::new(gateway.clone(), config),
            refiner: ContextRefiner::new(gateway, config),
        }
    }

    pub fn mode(&self) -> EnhancementMode {
        self.mode
    }

    pub fn config(&self) -> &ModeConfig {
        &self.config
    }


    pub fn classify(&self, query: &str) -> ClassificationResult {
        self.classifier.classify(query)
    }


    /// Service-free result with the same shape as the full pipeline's.
    pub fn fast_enhance(&self, query: &str) -> QueryExpansion {
        let expanded_queries = vec![query.to_string()];
        QueryExpansion {
            original_query: query.to_string(),
            semantic_terms: semantic_terms(&expanded_queries),
            expanded_queries,
            context_terms: Vec::new(),
            intent: IntentLabel::Factual,
            confidence: FAST_PATH_CONFIDENCE,
        }
    }


    pub async fn enhance_query(&self, query: &str, history: &[ConversationTurn]) -> QueryExpansion {
        self.run_full(query, history).await.0
    }

    async fn run_full(
        &self,
        query: &str,
        history: &[ConversationTurn],
    ) -> (QueryExpansion, ContextRefinement) {
        let intent = self.intent.classify(query, history).await;
        debug!("Intent: {} ({:.2}, {:?})", intent.intent, intent.confidence, intent.source);

        let mut expanded_queries = self.expander.expand(query).await;

        let refinement = self.refiner.refine(query, history, intent.intent).await;
        let refined = refinement.refined_query.as_str();
        if expanded_queries.len() < self.config.max_expanded_queries
            && !expanded_queries.iter().any(|q| eq_ignore_case(q, refined))
        {
            expanded_queries.push(refined.to_string());
        }

        let consulted = recent_turns(history, self.config.context_analysis_depth);
        let expansion = QueryExpansion {
            original_query: query.to_string(),
            semantic_terms: semantic_terms(&expanded_queries),
            context_terms: context_terms(consulted),
            expanded_queries,
            intent: intent.intent,
            confidence: intent.confidence,
        };
        (expansion, refinement)
    }


    /// Classifies, then takes the fast or full path. Speed mode always takes
    /// the fast path.
    pub async fn enhance(&self, query: &str, history: &[ConversationTurn]) -> EnhancementReport {
        let request_id = Uuid::new_v4();
        let span = info_span!("enhance", %request_id, mode = %self.mode);
        self.run_adaptive(request_id, query, history)
            .instrument(span)
            .await
    }

    async fn run_adaptive(
        &self,
        request_id: Uuid,
        query: &str,
        history: &[ConversationTurn],
    ) -> EnhancementReport {
        let start = Instant::now();
        let classification = self.classifier.classify(query);

        let (path, expansion, refinement) =
            if self.mode.is_fast_only() || !classification.needs_enhancement {
                (EnhancementPath::Fast, self.fast_enhance(query), None)
            } else {
                let (expansion, refinement) = self.run_full(query, history).await;
                (EnhancementPath::Full, expansion, Some(refinement))
            };

        let elapsed_ms = start.elapsed().as_millis() as u64;
        info!(
            "Enhanced '{}' via {:?} path: {} quer(ies), intent={} in {}ms",
            safe_truncate(query, 60),
            path,
            expansion.expanded_queries.len(),
            expansion.intent,
            elapsed_ms
        );

        EnhancementReport {
            request_id,
            mode: self.mode,
            path,
            classification,
            expansion,
            refinement,
            elapsed_ms,
        }
    }
}


/// Boundary used by retrieval. Fails only when `mode_tag` is not a known mode.
pub async fn enhance_for_retrieval(
    gateway: &ServiceGateway,
    query: &str,
    history: &[ConversationTurn],
    mode_tag: &str,
) -> Result<QueryExpansion> {
    let mode = EnhancementMode::parse(mode_tag)?;
    let report = QueryEnhancer::new(gateway.clone(), mode)
        .enhance(query, history)
        .await;
    Ok(report.expansion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::QueryForgeError;
    use crate::toolkit::query_enhancer::prompts::{
        ALTERNATIVE_QUERY_SYSTEM_PROMPT, INTENT_SYSTEM_PROMPT, REFINEMENT_SYSTEM_PROMPT,
        RELATED_TERMS_SYSTEM_PROMPT,
    };
    use crate::toolkit::query_enhancer::testing::{gateway, ScriptedLlm, StaticEmbedder};
    use std::sync::Arc;
    use strum::IntoEnumIterator;

    fn pipeline_llm() -> Arc<ScriptedLlm> {
        Arc::new(ScriptedLlm::replying(|system, user| match system {
            INTENT_SYSTEM_PROMPT => {
                Ok(r#"{"intent": "explanatory", "confidence": 0.85, "reasoning": "asks how"}"#.to_string())
            }
            RELATED_TERMS_SYSTEM_PROMPT => Ok("work stealing\nscheduler".to_string()),
            ALTERNATIVE_QUERY_SYSTEM_PROMPT => {
                let term = user.split('"').nth(1).unwrap_or_default();
                Ok(format!("tokio {term} internals"))
            }
            REFINEMENT_SYSTEM_PROMPT => Ok(
                r#"{"refined_query": "how does the tokio runtime schedule async tasks",
                    "focus_areas": ["scheduler"], "time_sensitivity": "low"}"#
                    .to_string(),
            ),
            other => Err(format!("unexpected prompt {other}")),
        }))
    }

    fn history() -> Vec<ConversationTurn> {
        vec![
            ConversationTurn::user("I'm learning tokio"),
            ConversationTurn::assistant("Tokio is an async runtime for Rust."),
        ]
    }

    #[tokio::test]
    async fn test_factual_question_takes_fast_path() {
        let llm = Arc::new(ScriptedLlm::failing());
        let enhancer = QueryEnhancer::new(gateway(Some(&llm), None), EnhancementMode::Balanced);
        let query = "What is the capital of France?";

        assert!(!enhancer.classify(query).needs_enhancement);

        let report = enhancer.enhance(query, &[]).await;
        assert_eq!(report.path, EnhancementPath::Fast);
        assert_eq!(report.expansion.expanded_queries, vec![query]);
        assert_eq!(report.expansion.intent, IntentLabel::Factual);
        assert_eq!(report.expansion.confidence, FAST_PATH_CONFIDENCE);
        assert!(report.refinement.is_none());
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_comparative_query_takes_full_path() {
        let enhancer = QueryEnhancer::new(ServiceGateway::offline(), EnhancementMode::Balanced);
        let query = "iPhone vs Android";

        let classification = enhancer.classify(query);
        assert!(classification.needs_enhancement);
        assert!(classification.reason.contains("comparative"));

        let report = enhancer.enhance(query, &[]).await;
        assert_eq!(report.path, EnhancementPath::Full);
        assert_eq!(report.expansion.intent, IntentLabel::Comparative);
        assert_eq!(report.expansion.expanded_queries, vec![query]);
        assert!(report.refinement.is_some_and(|r| r.is_passthrough(query)));
    }

    #[tokio::test]
    async fn test_empty_query_never_fails() {
        let enhancer = QueryEnhancer::new(ServiceGateway::offline(), EnhancementMode::Quality);

        let classification = enhancer.classify("");
        assert!(classification.needs_enhancement);
        assert_eq!(classification.confidence, 0.9);
        assert!(classification.reason.contains("insufficient length"));

        let expansion = enhancer.enhance_query("", &[]).await;
        assert_eq!(expansion.expanded_queries, vec![""]);
        assert!(expansion.semantic_terms.is_empty());
        assert!(expansion.context_terms.is_empty());
    }

    #[tokio::test]
    async fn test_speed_mode_always_fast() {
        let llm = pipeline_llm();
        let emb = Arc::new(StaticEmbedder::new(vec![0.1]));
        let enhancer = QueryEnhancer::new(gateway(Some(&llm), Some(&emb)), EnhancementMode::Speed);

        let report = enhancer.enhance("iPhone vs Android", &history()).await;
        assert!(report.classification.needs_enhancement);
        assert_eq!(report.path, EnhancementPath::Fast);
        assert_eq!(report.expansion.expanded_queries, vec!["iPhone vs Android"]);
        assert_eq!(report.expansion.semantic_terms, vec!["iphone", "android"]);
        assert_eq!(llm.calls(), 0);
        assert_eq!(emb.calls(), 0);
    }

    #[tokio::test]
    async fn test_full_pipeline_assembles_every_stage() {
        let llm = pipeline_llm();
        let emb = Arc::new(StaticEmbedder::new(vec![0.1, 0.2]));
        let enhancer = QueryEnhancer::new(gateway(Some(&llm), Some(&emb)), EnhancementMode::Quality);

        let query = "how does it schedule tasks?";
        let expansion = enhancer.enhance_query(query, &history()).await;

        assert_eq!(
            expansion.expanded_queries,
            vec![
                query,
                "tokio work stealing internals",
                "tokio scheduler internals",
                "how does the tokio runtime schedule async tasks",
            ]
        );
        assert_eq!(expansion.intent, IntentLabel::Explanatory);
        assert!((expansion.confidence - 0.85).abs() < 1e-9);
        assert_eq!(
            expansion.semantic_terms,
            vec!["schedule", "tasks", "tokio", "work", "stealing", "internals", "scheduler", "runtime", "async"]
        );
        assert_eq!(expansion.context_terms, vec!["learning", "tokio", "async", "runtime", "rust"]);
        assert_eq!(llm.calls(), 5);
        assert_eq!(emb.calls(), 1);
    }

    #[tokio::test]
    async fn test_refined_query_never_exceeds_cap() {
        let llm = pipeline_llm();
        let emb = Arc::new(StaticEmbedder::new(vec![0.1, 0.2]));
        let enhancer = QueryEnhancer::new(gateway(Some(&llm), Some(&emb)), EnhancementMode::Balanced);

        let expansion = enhancer.enhance_query("how does it schedule tasks?", &history()).await;
        assert_eq!(expansion.expanded_queries.len(), 3);
        assert_eq!(expansion.expanded_queries[0], "how does it schedule tasks?");
    }

    #[tokio::test]
    async fn test_failing_services_still_produce_expansion() {
        let llm = Arc::new(ScriptedLlm::failing());
        let emb = Arc::new(StaticEmbedder::failing());

        for mode in EnhancementMode::iter() {
            let enhancer = QueryEnhancer::new(gateway(Some(&llm), Some(&emb)), mode);
            for query in ["", "a", "iPhone vs Android", "why should I learn rust in 2024 instead of go"] {
                let expansion = enhancer.enhance_query(query, &history()).await;
                assert_eq!(expansion.expanded_queries, vec![query]);
                assert!((0.0..=1.0).contains(&expansion.confidence));
            }
        }
    }

    #[tokio::test]
    async fn test_report_carries_request_metadata() {
        let enhancer = QueryEnhancer::new(ServiceGateway::offline(), EnhancementMode::Quality);
        let first = enhancer.enhance("compare rust and go for web services", &[]).await;
        let second = enhancer.enhance("compare rust and go for web services", &[]).await;

        assert_ne!(first.request_id, second.request_id);
        assert_eq!(first.mode, EnhancementMode::Quality);

        let json = serde_json::to_value(&first).unwrap();
        assert_eq!(json["mode"], "quality");
        assert_eq!(json["path"], "full");
    }

    #[tokio::test]
    async fn test_concurrent_requests_are_independent() {
        let llm = pipeline_llm();
        let emb = Arc::new(StaticEmbedder::new(vec![0.3]));
        let gw = gateway(Some(&llm), Some(&emb));
        let enhancer = QueryEnhancer::new(gw, EnhancementMode::Balanced);

        let queries = ["iPhone vs Android", "best rust web framework", "What is the capital of France?"];
        let reports =
            futures::future::join_all(queries.iter().map(|q| enhancer.enhance(q, &[]))).await;

        for (query, report) in queries.iter().zip(&reports) {
            assert_eq!(report.expansion.expanded_queries[0], *query);
        }
    }

    #[tokio::test]
    async fn test_enhance_for_retrieval_validates_mode() {
        let gw = ServiceGateway::offline();

        let err = enhance_for_retrieval(&gw, "q", &[], "turbo").await.unwrap_err();
        assert!(matches!(err, QueryForgeError::UnknownMode(_)));

        let expansion = enhance_for_retrieval(&gw, "iPhone vs Android", &[], "QUALITY")
            .await
            .unwrap();
        assert_eq!(expansion.intent, IntentLabel::Comparative);
        assert_eq!(expansion.original_query, "iPhone vs Android");
    }
}
