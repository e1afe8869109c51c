use serde::Deserialize;
use tracing::{debug, info, warn};

use super::gateway::{ServiceGateway, StageError};
use super::models::{recent_turns, ConversationTurn, IntentLabel, IntentResult, IntentSource};
use super::patterns::{contains_phrase, padded, INTENT_KEYWORDS};
use super::prompts::{build_intent_prompt, INTENT_SYSTEM_PROMPT};
use crate::core::modes::ModeConfig;
use crate::llm::json::parse_json_reply;
use crate::llm::providers::base::ResponseFormat;
use crate::utils::normalize_for_matching;

const KEYWORD_SCORE_WEIGHT: f64 = 0.3;


#[derive(Debug, Deserialize)]
struct IntentReply {
    intent: String,
    confidence: f64,
    #[serde(default)]
    reasoning: String,
}


/// Deterministic, service-free intent scoring. Each category scores one
/// point per keyword present; ties go to the earlier category.
pub fn classify_by_keywords(query: &str) -> IntentResult {
    let text = padded(&normalize_for_matching(query));

    let mut best = (IntentLabel::Factual, 0usize);
    for (label, keywords) in INTENT_KEYWORDS.iter() {
        let score = keywords.iter().filter(|k| contains_phrase(&text, k)).count();
        if score > best.1 {
            best = (*label, score);
        }
    }

    let (intent, score) = best;
    IntentResult {
        intent,
        confidence: (score as f64 * KEYWORD_SCORE_WEIGHT).min(1.0),
        reasoning: format!("keyword fallback matched {score} {intent} keyword(s)"),
        source: IntentSource::Keywords,
    }
}


pub struct IntentClassifier {
    gateway: ServiceGateway,
    threshold: f64,
    history_window: usize,
}

impl IntentClassifier {
    pub fn new(gateway: ServiceGateway, config: &ModeConfig) -> Self {
        Self {
            gateway,
            threshold: config.intent_classification_threshold,
            history_window: config.context_analysis_depth,
        }
    }


    pub async fn classify(&self, query: &str, history: &[ConversationTurn]) -> IntentResult {
        match self.classify_with_model(query, history).await {
            Ok(result) => self.apply_threshold(query, result),
            Err(e) => {
                warn!("Intent classification fell back to keywords: {}", e);
                classify_by_keywords(query)
            }
        }
    }

    async fn classify_with_model(
        &self,
        query: &str,
        history: &[ConversationTurn],
    ) -> Result<IntentResult, StageError> {
        let prompt = build_intent_prompt(query, recent_turns(history, self.history_window));
        let response = self
            .gateway
            .complete(INTENT_SYSTEM_PROMPT, &prompt, ResponseFormat::Json)
            .await?;

        let reply: IntentReply = parse_json_reply(&response)
            .map_err(|e| StageError::Parse(format!("intent reply: {e}")))?;

        let intent = reply
            .intent
            .trim()
            .parse::<IntentLabel>()
            .map_err(|_| StageError::Parse(format!("unknown intent label '{}'", reply.intent)))?;

        if !reply.confidence.is_finite() {
            return Err(StageError::Parse("non-finite intent confidence".to_string()));
        }

        Ok(IntentResult {
            intent,
            confidence: reply.confidence.clamp(0.0, 1.0),
            reasoning: reply.reasoning,
            source: IntentSource::Model,
        })
    }

    /// Low-confidence model verdicts yield to stronger keyword evidence.
    fn apply_threshold(&self, query: &str, model: IntentResult) -> IntentResult {
        if model.confidence >= self.threshold {
            info!("Intent classified: {} ({:.2})", model.intent, model.confidence);
            return model;
        }

        let keywords = classify_by_keywords(query);
        if keywords.confidence > model.confidence {
            debug!(
                "Model intent {} ({:.2}) below threshold {:.2}, keyword verdict {} ({:.2}) wins",
                model.intent, model.confidence, self.threshold, keywords.intent, keywords.confidence
            );
            keywords
        } else {
            model
        }
    }
}
