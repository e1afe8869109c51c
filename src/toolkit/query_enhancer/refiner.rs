use serde::Deserialize;
use tracing::{debug, info, warn};

use super::gateway::{ServiceGateway, StageError};
use super::models::{
    recent_turns, ContextRefinement, ConversationTurn, IntentLabel, TimeSensitivity,
};
use super::prompts::{build_refinement_prompt, REFINEMENT_SYSTEM_PROMPT};
use crate::core::modes::ModeConfig;
use crate::llm::json::parse_json_reply;
use crate::llm::providers::base::ResponseFormat;
use crate::utils::safe_truncate;

const MAX_LIST_ITEMS: usize = 10;


#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RefinementReply {
    refined_query: String,
    focus_areas: Vec<String>,
    exclusion_terms: Vec<String>,
    time_sensitivity: String,
    source_preferences: Vec<String>,
}


pub struct ContextRefiner {
    gateway: ServiceGateway,
    config: ModeConfig,
}

impl ContextRefiner {
    pub fn new(gateway: ServiceGateway, config: ModeConfig) -> Self {
        Self { gateway, config }
    }


    /// Rewrites the query against recent history. Returns the passthrough
    /// record when refinement is disabled, history is empty, or the model
    /// call fails.
    pub async fn refine(
        &self,
        query: &str,
        history: &[ConversationTurn],
        intent: IntentLabel,
    ) -> ContextRefinement {
        if !self.config.enable_context_refinement || history.is_empty() {
            debug!("Context refinement skipped (no history or disabled)");
            return ContextRefinement::passthrough(query);
        }

        let turns = recent_turns(history, self.config.context_analysis_depth);
        match self.try_refine(query, turns, intent).await {
            Ok(refinement) => {
                info!(
                    "Refined query '{}' -> '{}'",
                    safe_truncate(query, 60),
                    safe_truncate(&refinement.refined_query, 60)
                );
                refinement
            }
            Err(e) => {
                warn!("Context refinement failed, passing query through: {}", e);
                ContextRefinement::passthrough(query)
            }
        }
    }

    async fn try_refine(
        &self,
        query: &str,
        turns: &[ConversationTurn],
        intent: IntentLabel,
    ) -> Result<ContextRefinement, StageError> {
        let prompt = build_refinement_prompt(query, turns, intent);
        let response = self
            .gateway
            .complete(REFINEMENT_SYSTEM_PROMPT, &prompt, ResponseFormat::Json)
            .await?;

        let reply: RefinementReply = parse_json_reply(&response)
            .map_err(|e| StageError::Parse(format!("refinement reply: {e}")))?;

        let refined_query = match reply.refined_query.trim() {
            "" => query.to_string(),
            refined => refined.to_string(),
        };

        let time_sensitivity = reply
            .time_sensitivity
            .trim()
            .parse::<TimeSensitivity>()
            .unwrap_or_default();

        Ok(ContextRefinement {
            refined_query,
            focus_areas: clean_list(reply.focus_areas),
            exclusion_terms: clean_list(reply.exclusion_terms),
            time_sensitivity,
            source_preferences: clean_list(reply.source_preferences),
        })
    }
}


fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for item in items {
        let item = item.trim();
        if item.is_empty() || out.iter().any(|o| o.eq_ignore_ascii_case(item)) {
            continue;
        }
        out.push(item.to_string());
        if out.len() == MAX_LIST_ITEMS {
            break;
        }
    }
    out
}
