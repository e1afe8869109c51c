#[inline]
pub fn safe_truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}


#[inline]
pub fn safe_truncate_ellipsis(s: &str, max_chars: usize) -> String {
    if s.chars().count() > max_chars {
        format!("{}...", s.chars().take(max_chars).collect::<String>())
    } else {
        s.to_string()
    }
}


/// Lowercases and replaces everything except letters, digits and in-word
/// apostrophes with single spaces, so phrase lookups can match on word
/// boundaries. Apostrophes used as quotes are dropped.
pub fn normalize_for_matching(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '\'' {
                c
            } else {
                ' '
            }
        })
        .flat_map(char::to_lowercase)
        .collect();

    mapped
        .split_whitespace()
        .map(|word| word.trim_matches('\''))
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}


pub fn tokenize(text: &str) -> Vec<String> {
    normalize_for_matching(text)
        .split_whitespace()
        .map(str::to_string)
        .collect()
}


pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_truncate_multibyte() {
        assert_eq!(safe_truncate("Привет мир", 6), "Привет");
        assert_eq!(safe_truncate("hi", 10), "hi");
    }

    #[test]
    fn test_safe_truncate_ellipsis() {
        assert_eq!(safe_truncate_ellipsis("hello world", 5), "hello...");
        assert_eq!(safe_truncate_ellipsis("hi", 10), "hi");
    }

    #[test]
    fn test_normalize_for_matching() {
        assert_eq!(
            normalize_for_matching("  What is the Capital of France?  "),
            "what is the capital of france"
        );
        assert_eq!(normalize_for_matching("iPhone-vs-Android!!"), "iphone vs android");
        assert_eq!(normalize_for_matching("What's new?"), "what's new");
        assert_eq!(
            normalize_for_matching("the novel 'Better Than Ever' ' x"),
            "the novel better than ever x"
        );
        assert_eq!(normalize_for_matching(""), "");
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(tokenize("Rust's 'async' runtime, 2024"), vec!["rust's", "async", "runtime", "2024"]);
        assert!(tokenize("?!").is_empty());
    }

    #[test]
    fn test_eq_ignore_case() {
        assert!(eq_ignore_case(" Rust Async ", "rust async"));
        assert!(!eq_ignore_case("rust", "rusty"));
    }
}
