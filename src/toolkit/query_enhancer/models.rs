use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::core::modes::EnhancementMode;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TurnRole {
    User,
    Assistant,
    System,
}


/// One prior exchange fragment. History slices are chronological, the last
/// element being the most recent turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl ConversationTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            content: content.into(),
            timestamp: None,
        }
    }
}


/// The last `depth` turns of `history`.
pub fn recent_turns(history: &[ConversationTurn], depth: usize) -> &[ConversationTurn] {
    &history[history.len().saturating_sub(depth)..]
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub needs_enhancement: bool,
    pub confidence: f64,
    pub reason: String,
}

impl ClassificationResult {
    pub fn enhance(confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            needs_enhancement: true,
            confidence,
            reason: reason.into(),
        }
    }

    pub fn fast_path(confidence: f64, reason: impl Into<String>) -> Self {
        Self {
            needs_enhancement: false,
            confidence,
            reason: reason.into(),
        }
    }
}


#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassificationStats {
    pub total: usize,
    pub simple: usize,
    pub complex: usize,
    pub average_confidence: f64,
}


/// Ties in keyword scoring resolve to the earliest variant in declaration order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IntentLabel {
    #[default]
    Factual,
    Instructional,
    Opinion,
    Comparative,
    Explanatory,
    News,
    Academic,
    Commercial,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntentSource {
    Model,
    Keywords,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentResult {
    pub intent: IntentLabel,
    pub confidence: f64,
    pub reasoning: String,
    pub source: IntentSource,
}


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum TimeSensitivity {
    #[default]
    Low,
    Medium,
    High,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextRefinement {
    pub refined_query: String,
    pub focus_areas: Vec<String>,
    pub exclusion_terms: Vec<String>,
    pub time_sensitivity: TimeSensitivity,
    pub source_preferences: Vec<String>,
}

impl ContextRefinement {
    /// The zero-cost result used when refinement is skipped or fails.
    pub fn passthrough(query: &str) -> Self {
        Self {
            refined_query: query.to_string(),
            focus_areas: Vec::new(),
            exclusion_terms: Vec::new(),
            time_sensitivity: TimeSensitivity::Low,
            source_preferences: Vec::new(),
        }
    }

    pub fn is_passthrough(&self, query: &str) -> bool {
        self.refined_query == query
            && self.focus_areas.is_empty()
            && self.exclusion_terms.is_empty()
            && self.source_preferences.is_empty()
    }
}


/// Handed to retrieval. `expanded_queries[0]` is always the original query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryExpansion {
    pub original_query: String,
    pub expanded_queries: Vec<String>,
    pub semantic_terms: Vec<String>,
    pub context_terms: Vec<String>,
    pub intent: IntentLabel,
    pub confidence: f64,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnhancementPath {
    Fast,
    Full,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhancementReport {
    pub request_id: Uuid,
    pub mode: EnhancementMode,
    pub path: EnhancementPath,
    pub classification: ClassificationResult,
    pub expansion: QueryExpansion,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refinement: Option<ContextRefinement>,
    pub elapsed_ms: u64,
}
