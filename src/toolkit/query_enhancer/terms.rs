use super::models::ConversationTurn;
use super::patterns::is_stop_word;
use crate::utils::tokenize;

pub const SEMANTIC_TERM_CAP: usize = 10;
pub const CONTEXT_TERM_CAP: usize = 8;

const MIN_TERM_CHARS: usize = 4;


/// Distinct content words across `texts` in first-seen order, skipping short
/// tokens and stop words.
pub fn extract_terms<'a, I>(texts: I, cap: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut terms: Vec<String> = Vec::new();

    for text in texts {
        for token in tokenize(text) {
            if terms.len() == cap {
                return terms;
            }
            if token.chars().count() < MIN_TERM_CHARS || is_stop_word(&token) {
                continue;
            }
            if !terms.contains(&token) {
                terms.push(token);
            }
        }
    }

    terms
}


pub fn semantic_terms(expanded_queries: &[String]) -> Vec<String> {
    extract_terms(expanded_queries.iter().map(String::as_str), SEMANTIC_TERM_CAP)
}


pub fn context_terms(turns: &[ConversationTurn]) -> Vec<String> {
    extract_terms(turns.iter().map(|t| t.content.as_str()), CONTEXT_TERM_CAP)
}
