use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use super::gateway::{ServiceGateway, StageError};
use super::prompts::{
    build_alternative_query_prompt, build_related_terms_prompt, ALTERNATIVE_QUERY_SYSTEM_PROMPT,
    RELATED_TERMS_SYSTEM_PROMPT,
};
use crate::core::modes::ModeConfig;
use crate::llm::providers::base::ResponseFormat;
use crate::utils::eq_ignore_case;

const MAX_TERM_CHARS: usize = 80;


/// Best-effort generation of alternative phrasings. Output always starts with
/// the original query and never exceeds the mode's cap.
pub struct SemanticExpander {
    gateway: ServiceGateway,
    config: ModeConfig,
}

impl SemanticExpander {
    pub fn new(gateway: ServiceGateway, config: ModeConfig) -> Self {
        Self { gateway, config }
    }


    pub async fn expand(&self, query: &str) -> Vec<String> {
        if !self.config.enable_semantic_expansion || self.config.max_expanded_queries <= 1 {
            debug!("Semantic expansion disabled, returning original query");
            return vec![query.to_string()];
        }

        match self.try_expand(query).await {
            Ok(expanded) => {
                info!(
                    "Expanded query into {} variant(s) (cap {})",
                    expanded.len(),
                    self.config.max_expanded_queries
                );
                expanded
            }
            Err(e) => {
                warn!("Semantic expansion aborted, using original query: {}", e);
                vec![query.to_string()]
            }
        }
    }

    async fn try_expand(&self, query: &str) -> Result<Vec<String>, StageError> {
        let vector = self.gateway.embed(query).await?;
        debug!("Query embedding available ({} dims)", vector.len());

        let prompt = build_related_terms_prompt(query, self.config.related_term_count());
        let response = self
            .gateway
            .complete(RELATED_TERMS_SYSTEM_PROMPT, &prompt, ResponseFormat::Text)
            .await?;

        let terms = parse_related_terms(&response, query, self.config.related_term_count());
        if terms.is_empty() {
            return Err(StageError::Parse("no related terms in reply".to_string()));
        }
        debug!("Related terms: {:?}", terms);

        let wanted = self.config.max_expanded_queries - 1;
        let alternatives: Vec<String> = stream::iter(terms.into_iter().take(wanted))
            .map(|term| async move { self.generate_alternative(query, &term).await })
            .buffered(self.gateway.max_concurrent_llm_calls())
            .try_collect()
            .await?;

        let mut expanded = vec![query.to_string()];
        for alternative in alternatives {
            if !expanded.iter().any(|q| eq_ignore_case(q, &alternative)) {
                expanded.push(alternative);
            }
        }
        expanded.truncate(self.config.max_expanded_queries);
        Ok(expanded)
    }

    async fn generate_alternative(&self, query: &str, term: &str) -> Result<String, StageError> {
        let prompt = build_alternative_query_prompt(query, term);
        let response = self
            .gateway
            .complete(ALTERNATIVE_QUERY_SYSTEM_PROMPT, &prompt, ResponseFormat::Text)
            .await?;

        clean_alternative(&response)
            .ok_or_else(|| StageError::Parse(format!("empty rewrite for term '{term}'")))
    }
}


fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();
    let line = line.trim_start_matches(['-', '*', '•', '>']).trim_start();

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(stripped) = rest.strip_prefix(['.', ')', ':']) {
            return stripped.trim_start();
        }
    }
    line
}

fn strip_quotes(text: &str) -> &str {
    text.trim()
        .trim_matches(|c| c == '"' || c == '\'' || c == '`' || c == '“' || c == '”')
        .trim()
}


fn has_list_marker(line: &str) -> bool {
    let trimmed = line.trim();
    strip_list_marker(trimmed).len() != trimmed.len()
}


/// Parses a newline-delimited term list, dropping list markers, duplicates
/// and echoes of the query itself. Section headers ("Synonyms:") are skipped,
/// and so is an unmarked opening line when the rest of the reply is a marked
/// list, since that line is the model's preamble.
pub fn parse_related_terms(response: &str, query: &str, limit: usize) -> Vec<String> {
    let lines: Vec<&str> = response.lines().filter(|l| !l.trim().is_empty()).collect();
    let preamble = match lines.split_first() {
        Some((first, rest)) => !has_list_marker(first) && rest.iter().any(|l| has_list_marker(l)),
        None => false,
    };

    let mut terms: Vec<String> = Vec::new();
    for line in lines.into_iter().skip(usize::from(preamble)) {
        let stripped = strip_list_marker(line);
        if stripped.ends_with(':') {
            continue;
        }

        let term = strip_quotes(stripped.trim_end_matches([',', ';', '.']))
            .trim_end_matches([',', ';', '.']);
        if term.is_empty() || term.chars().count() > MAX_TERM_CHARS || eq_ignore_case(term, query) {
            continue;
        }
        if terms.iter().any(|t| eq_ignore_case(t, term)) {
            continue;
        }
        terms.push(term.to_string());
        if terms.len() == limit {
            break;
        }
    }

    terms
}


/// First non-empty line of the reply with any "Rewritten query:" label and
/// surrounding quotes removed.
pub fn clean_alternative(response: &str) -> Option<String> {
    let line = response.lines().map(str::trim).find(|l| !l.is_empty())?;
    let line = match line.split_once(':') {
        Some((label, rest)) if label.to_lowercase().contains("query") => rest,
        _ => line,
    };
    let cleaned = strip_quotes(line);
    (!cleaned.is_empty()).then(|| cleaned.to_string())
}
