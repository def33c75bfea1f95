use once_cell::sync::Lazy;
use std::collections::HashSet;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    HashSet::from([
        "the", "and", "for", "with", "from", "that", "this", "what", "where", "how", "when",
        "which", "who", "why", "are", "was", "were", "been",
    ])
});

#[must_use]
pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word.to_lowercase().as_str())
}

/// Lowercased query words worth matching literally: longer than two characters,
/// not a stop word, first occurrence only.
pub fn extract_keywords(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .split_whitespace()
        .map(str::to_lowercase)
        .filter(|word| word.chars().count() > 2)
        .filter(|word| !is_stop_word(word))
        .filter(|word| seen.insert(word.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_keywords() {
        assert_eq!(
            extract_keywords("How does the Parser handle a token stream"),
            vec!["does", "parser", "handle", "token", "stream"]
        );
    }

    #[test]
    fn test_extract_keywords_dedupes_and_skips_short_words() {
        assert_eq!(
            extract_keywords("  id  of   USER user by  user_id "),
            vec!["user", "user_id"]
        );
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("what is it").is_empty());
    }

    #[test]
    fn test_is_stop_word() {
        assert!(is_stop_word("Where"));
        assert!(!is_stop_word("parser"));
    }
}
