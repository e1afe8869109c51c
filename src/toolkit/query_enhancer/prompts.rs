use strum::IntoEnumIterator;

use super::models::{ConversationTurn, IntentLabel};
use crate::utils::safe_truncate_ellipsis;

const MAX_TURN_CHARS: usize = 500;


pub const INTENT_SYSTEM_PROMPT: &str = "You classify the intent behind search queries. \
Always respond with a single valid JSON object and nothing else.";

pub const RELATED_TERMS_SYSTEM_PROMPT: &str = "You suggest search vocabulary. \
Respond with one term or short phrase per line, no numbering, no commentary.";

pub const ALTERNATIVE_QUERY_SYSTEM_PROMPT: &str = "You rewrite search queries. \
Respond with exactly one rewritten query on a single line and nothing else.";

pub const REFINEMENT_SYSTEM_PROMPT: &str = "You refine search queries using the conversation so far. \
Always respond with a single valid JSON object and nothing else.";


fn intent_catalogue() -> String {
    IntentLabel::iter()
        .map(|label| format!("- {}: {}", label, describe_intent(label)))
        .collect::<Vec<_>>()
        .join("\n")
}

fn describe_intent(label: IntentLabel) -> &'static str {
    match label {
        IntentLabel::Factual => "a specific fact, name, number or date",
        IntentLabel::Instructional => "steps or a procedure to accomplish something",
        IntentLabel::Opinion => "recommendations, judgements or subjective views",
        IntentLabel::Comparative => "how two or more options differ",
        IntentLabel::Explanatory => "why or how something works",
        IntentLabel::News => "recent events or current developments",
        IntentLabel::Academic => "scholarly research, studies or theory",
        IntentLabel::Commercial => "buying, prices, products or deals",
    }
}


pub fn format_history(turns: &[ConversationTurn]) -> String {
    if turns.is_empty() {
        return "(no prior conversation)".to_string();
    }
    turns
        .iter()
        .map(|t| format!("{}: {}", t.role, safe_truncate_ellipsis(t.content.trim(), MAX_TURN_CHARS)))
        .collect::<Vec<_>>()
        .join("\n")
}


pub fn build_intent_prompt(query: &str, history: &[ConversationTurn]) -> String {
    format!(
        r#"Classify the intent of the search query into exactly ONE category.

**Categories:**
{catalogue}

**Recent conversation:**
{history}

**Query:**
"{query}"

**Response Format (JSON):**
{{
  "intent": "one of the category names above",
  "confidence": 0.0-1.0,
  "reasoning": "one sentence"
}}"#,
        catalogue = intent_catalogue(),
        history = format_history(history),
    )
}


pub fn build_related_terms_prompt(query: &str, count: usize) -> String {
    format!(
        r#"List {count} terms or short phrases that are semantically related to the search query below:
synonyms, closely related concepts, and domain vocabulary a relevant document would use.

Query: "{query}"

One per line."#
    )
}


pub fn build_alternative_query_prompt(query: &str, term: &str) -> String {
    format!(
        r#"Rewrite the search query so that it naturally incorporates the term "{term}"
while keeping the original meaning and intent.

Original query: "{query}"

Rewritten query:"#
    )
}


pub fn build_refinement_prompt(
    query: &str,
    history: &[ConversationTurn],
    intent: IntentLabel,
) -> String {
    format!(
        r#"Refine the search query using the recent conversation. Resolve pronouns and implicit
references, keep the user's intent, and do not invent new requirements.

**Recent conversation:**
{history}

**Current query:**
"{query}"

**Detected intent:** {intent}

**Response Format (JSON):**
{{
  "refined_query": "self-contained version of the query",
  "focus_areas": ["aspects the user cares about"],
  "exclusion_terms": ["topics to avoid"],
  "time_sensitivity": "low|medium|high",
  "source_preferences": ["preferred kinds of sources"]
}}"#,
        history = format_history(history),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_prompt_names_every_category() {
        let prompt = build_intent_prompt("iPhone vs Android", &[]);
        for label in IntentLabel::iter() {
            assert!(prompt.contains(&format!("- {label}:")), "missing {label}");
        }
        assert!(prompt.contains("\"iPhone vs Android\""));
        assert!(prompt.contains("(no prior conversation)"));
    }

    #[test]
    fn test_history_is_role_tagged_and_truncated() {
        let turns = vec![
            ConversationTurn::user("Tell me about Rust"),
            ConversationTurn::assistant("x".repeat(2000)),
        ];
        let formatted = format_history(&turns);
        assert!(formatted.starts_with("user: Tell me about Rust\nassistant: "));
        assert!(formatted.ends_with("..."));
        assert!(formatted.len() < 600);
    }

    #[test]
    fn test_refinement_prompt_carries_intent() {
        let prompt = build_refinement_prompt("what about it?", &[ConversationTurn::user("tokio")], IntentLabel::Explanatory);
        assert!(prompt.contains("**Detected intent:** explanatory"));
        assert!(prompt.contains("user: tokio"));
    }
}
