use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use super::error::{QueryForgeError, Result};


#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EnhancementMode {

    Speed,

    #[default]
    Balanced,

    Quality,
}

impl EnhancementMode {
    /// Parses a caller-supplied mode tag. Unknown tags are rejected rather
    /// than mapped to a default mode.
    pub fn parse(tag: &str) -> Result<Self> {
        tag.trim()
            .parse::<Self>()
            .map_err(|_| QueryForgeError::UnknownMode(tag.to_string()))
    }


    #[must_use]
    pub fn config(&self) -> ModeConfig {
        match self {
            Self::Speed => ModeConfig {
                max_expanded_queries: 1,
                expansion_depth: 0,
                context_analysis_depth: 1,
                intent_classification_threshold: 0.8,
                enable_semantic_expansion: false,
                enable_context_refinement: false,
            },
            Self::Balanced => ModeConfig {
                max_expanded_queries: 3,
                expansion_depth: 1,
                context_analysis_depth: 3,
                intent_classification_threshold: 0.7,
                enable_semantic_expansion: true,
                enable_context_refinement: true,
            },
            Self::Quality => ModeConfig {
                max_expanded_queries: 5,
                expansion_depth: 2,
                context_analysis_depth: 5,
                intent_classification_threshold: 0.6,
                enable_semantic_expansion: true,
                enable_context_refinement: true,
            },
        }
    }


    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Speed => "Fastest response, rule-based classification only",
            Self::Balanced => "Moderate expansion with recent conversation context",
            Self::Quality => "Broad expansion and deep context analysis, slowest",
        }
    }


    #[must_use]
    pub fn is_fast_only(&self) -> bool {
        matches!(self, Self::Speed)
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModeConfig {

    pub max_expanded_queries: usize,

    pub expansion_depth: usize,

    pub context_analysis_depth: usize,

    pub intent_classification_threshold: f64,

    pub enable_semantic_expansion: bool,

    pub enable_context_refinement: bool,
}

impl ModeConfig {
    /// Number of related terms to request from the model, always in 10..=15.
    #[must_use]
    pub fn related_term_count(&self) -> usize {
        (10 + 5 * self.expansion_depth.saturating_sub(1)).clamp(10, 15)
    }
}

impl Default for ModeConfig {
    fn default() -> Self {
        EnhancementMode::default().config()
    }
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatencyEstimate {

    pub llm_calls: usize,

    pub embedding_calls: usize,

    pub cost_tier: String,

    pub mode: String,
}


/// Upper bound on external calls a full enhancement makes in the given mode.
#[must_use]
pub fn estimate_service_calls(mode: EnhancementMode) -> LatencyEstimate {
    let config = mode.config();

    let intent_calls = usize::from(!mode.is_fast_only());
    let (expansion_calls, embedding_calls) = if config.enable_semantic_expansion {
        (1 + config.max_expanded_queries.saturating_sub(1), 1)
    } else {
        (0, 0)
    };
    let refinement_calls = usize::from(config.enable_context_refinement);

    let llm_calls = intent_calls + expansion_calls + refinement_calls;

    let tier = match llm_calls {
        0 => "none",
        1..=3 => "low",
        4..=6 => "medium",
        _ => "high",
    };

    LatencyEstimate {
        llm_calls,
        embedding_calls,
        cost_tier: tier.to_string(),
        mode: mode.to_string(),
    }
}
