use serde::{Deserialize, Serialize};
use tracing::debug;

use super::models::{ClassificationResult, ClassificationStats};
use super::patterns::{
    COMPARATIVE_PATTERNS, COMPLEX_KEYWORDS, FACTUAL_INDICATORS, OPINION_PATTERNS,
    RESEARCH_PATTERNS, SIMPLE_QUESTION_PATTERN, contains_any, padded,
};
use crate::utils::normalize_for_matching;

const MIN_QUERY_CHARS: usize = 3;
const SHORT_QUERY_MAX_WORDS: usize = 8;
const LONG_QUERY_MIN_WORDS: usize = 16;


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySignals {
    pub simple_question: bool,
    pub complex_keyword: bool,
    pub short: bool,
    pub long: bool,
    pub factual_indicator: bool,
    pub comparative: bool,
    pub opinion: bool,
    pub research: bool,
}

impl QuerySignals {
    fn has_complexity_pattern(&self) -> bool {
        self.comparative || self.opinion || self.research
    }

    fn complexity_reasons(&self) -> Vec<&'static str> {
        [
            (self.complex_keyword, "complex keywords"),
            (self.comparative, "comparative pattern"),
            (self.opinion, "opinion pattern"),
            (self.research, "research pattern"),
            (self.long, "long query"),
        ]
        .into_iter()
        .filter_map(|(hit, label)| hit.then_some(label))
        .collect()
    }
}


/// Rule-based gate deciding whether a query deserves the enhancement
/// pipeline. Pure and allocation-light; never calls external services.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryClassifier;

impl QueryClassifier {
    pub fn new() -> Self {
        Self
    }


    pub fn signals(&self, query: &str) -> QuerySignals {
        let normalized = normalize_for_matching(query);
        let text = padded(&normalized);
        let words = normalized.split_whitespace().count();

        QuerySignals {
            simple_question: SIMPLE_QUESTION_PATTERN.is_match(&normalized),
            complex_keyword: contains_any(&text, COMPLEX_KEYWORDS),
            short: words <= SHORT_QUERY_MAX_WORDS,
            long: words >= LONG_QUERY_MIN_WORDS,
            factual_indicator: contains_any(&text, FACTUAL_INDICATORS),
            comparative: contains_any(&text, COMPARATIVE_PATTERNS),
            opinion: contains_any(&text, OPINION_PATTERNS),
            research: contains_any(&text, RESEARCH_PATTERNS),
        }
    }


    pub fn classify(&self, query: &str) -> ClassificationResult {
        let trimmed = query.trim().to_lowercase();

        if trimmed.chars().count() < MIN_QUERY_CHARS {
            debug!("Query below {} chars, defaulting to enhancement", MIN_QUERY_CHARS);
            return ClassificationResult::enhance(
                0.9,
                "Query too short to classify (insufficient length), default to enhancement",
            );
        }

        let s = self.signals(&trimmed);
        let result = if s.simple_question
            && s.short
            && s.factual_indicator
            && !s.complex_keyword
            && !s.has_complexity_pattern()
        {
            ClassificationResult::fast_path(0.9, "Simple factual question")
        } else if s.complex_keyword || s.has_complexity_pattern() || s.long {
            ClassificationResult::enhance(
                0.8,
                format!("Complex query: {}", s.complexity_reasons().join(", ")),
            )
        } else if s.simple_question && !s.factual_indicator {
            ClassificationResult::enhance(0.6, "Question form without factual grounding is ambiguous")
        } else if s.short && !s.complex_keyword {
            ClassificationResult::fast_path(0.7, "Short query without complexity indicators")
        } else {
            ClassificationResult::enhance(0.5, "No decisive signal, default to enhancement for safety")
        };

        debug!(
            "Classified '{}': needs_enhancement={}, confidence={}, signals={:?}",
            crate::safe_truncate(query, 60),
            result.needs_enhancement,
            result.confidence,
            s
        );
        result
    }


    pub fn needs_enhancement(&self, query: &str) -> bool {
        self.classify(query).needs_enhancement
    }


    pub fn stats<S: AsRef<str>>(&self, queries: &[S]) -> ClassificationStats {
        if queries.is_empty() {
            return ClassificationStats::default();
        }

        let mut stats = ClassificationStats {
            total: queries.len(),
            ..Default::default()
        };
        let mut confidence_sum = 0.0;

        for query in queries {
            let result = self.classify(query.as_ref());
            if result.needs_enhancement {
                stats.complex += 1;
            } else {
                stats.simple += 1;
            }
            confidence_sum += result.confidence;
        }

        stats.average_confidence = confidence_sum / stats.total as f64;
        stats
    }
}
