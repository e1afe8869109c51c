use std::collections::HashSet;

use lazy_static::lazy_static;
use regex::Regex;

use super::models::IntentLabel;

// All phrase lists are matched against text produced by
// `utils::normalize_for_matching`, on word boundaries.

lazy_static! {
    pub static ref SIMPLE_QUESTION_PATTERN: Regex = Regex::new(
        r"^(?:(?:what|who|when|where|which)(?:'s|\s+(?:is|are|was|were|did|does|do))\b|how\s+(?:many|much|old|tall|far|long|big)\b)"
    )
    .expect("simple question regex is valid");
}


pub const COMPLEX_KEYWORDS: &[&str] = &[
    "compare", "comparison", "contrast", "difference", "differences", "versus",
    "analyze", "analyse", "analysis", "evaluate", "evaluation", "assess",
    "pros and cons", "advantages", "disadvantages", "tradeoffs", "trade offs",
    "impact", "implications", "consequences", "effect of", "effects of",
    "opinion", "recommend", "recommendation", "best way", "should",
    "trend", "trends", "evolution", "future of", "over time", "forecast",
    "why", "explain", "relationship between",
];


pub const FACTUAL_INDICATORS: &[&str] = &[
    "capital", "population", "currency", "language", "located", "location",
    "author", "wrote", "written", "inventor", "invented", "founded", "founder",
    "president", "prime minister", "king", "queen", "ceo", "leader", "mayor",
    "born", "died", "birthday", "age",
    "height", "tall", "weight", "distance", "area", "length", "size",
    "temperature", "boiling point", "melting point", "speed of light",
    "date", "year", "when", "definition", "meaning", "formula", "symbol",
];


pub const COMPARATIVE_PATTERNS: &[&str] = &[
    "vs", "versus", "better than", "worse than", "compared to",
    "compared with", "difference between", "which is better", "or better",
    "similar to", "alternative to", "alternatives to",
];


pub const OPINION_PATTERNS: &[&str] = &[
    "do you think", "what do you think", "should i", "would you",
    "in your opinion", "is it worth", "worth it", "your thoughts",
    "do you recommend", "would you recommend", "is it good", "is it bad",
];


pub const RESEARCH_PATTERNS: &[&str] = &[
    "based on", "studies indicate", "studies show", "research shows",
    "research suggests", "according to", "evidence for", "evidence that",
    "literature on", "peer reviewed", "meta analysis", "systematic review",
];


lazy_static! {
    /// Keyword sets for the offline intent fallback, in tie-break order.
    pub static ref INTENT_KEYWORDS: Vec<(IntentLabel, Vec<&'static str>)> = vec![
        (IntentLabel::Factual, vec![
            "what is", "who is", "who was", "when did", "where is", "capital",
            "population", "define", "definition", "fact", "facts",
        ]),
        (IntentLabel::Instructional, vec![
            "how to", "how do i", "how can i", "steps", "guide", "tutorial",
            "install", "setup", "set up", "configure",
        ]),
        (IntentLabel::Opinion, vec![
            "should i", "do you think", "opinion", "best", "recommend",
            "worth", "favorite", "prefer",
        ]),
        (IntentLabel::Comparative, vec![
            "vs", "versus", "compare", "comparison", "difference between",
            "better than", "worse than", "compared to",
        ]),
        (IntentLabel::Explanatory, vec![
            "why", "explain", "how does", "how do", "reason", "cause", "causes",
            "works",
        ]),
        (IntentLabel::News, vec![
            "latest", "news", "today", "recent", "recently", "breaking",
            "this week", "announced", "update",
        ]),
        (IntentLabel::Academic, vec![
            "research", "study", "studies", "paper", "papers", "theory",
            "journal", "thesis", "peer reviewed", "scientific",
        ]),
        (IntentLabel::Commercial, vec![
            "buy", "price", "cost", "cheap", "deal", "discount", "purchase",
            "shop", "sale",
        ]),
    ];
}


pub const STOP_WORDS: &[&str] = &[
    "about", "above", "after", "again", "against", "also", "been", "before",
    "being", "below", "between", "both", "could", "does", "doing", "down",
    "during", "each", "from", "further", "have", "having", "here", "hers",
    "herself", "himself", "into", "itself", "just", "more", "most", "myself",
    "once", "only", "other", "ought", "ours", "ourselves", "over", "same",
    "should", "some", "such", "than", "that", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through",
    "under", "until", "very", "were", "what", "when", "where", "which", "while",
    "whom", "with", "would", "your", "yours", "yourself", "yourselves", "tell",
    "please", "know", "like", "want", "need", "thanks", "thank",
];

lazy_static! {
    static ref STOP_WORD_SET: HashSet<&'static str> = STOP_WORDS.iter().copied().collect();
}


pub fn is_stop_word(token: &str) -> bool {
    STOP_WORD_SET.contains(token)
}


/// Pads normalized text with spaces so `contains_phrase` matches whole words.
pub fn padded(normalized: &str) -> String {
    format!(" {normalized} ")
}


pub fn contains_phrase(padded_text: &str, phrase: &str) -> bool {
    padded_text.contains(&format!(" {phrase} "))
}


pub fn matching_phrases<'a>(padded_text: &str, phrases: &'a [&'a str]) -> Vec<&'a str> {
    phrases
        .iter()
        .copied()
        .filter(|p| contains_phrase(padded_text, p))
        .collect()
}


pub fn contains_any(padded_text: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| contains_phrase(padded_text, p))
}
