use proptest::prelude::*;
use recall_search::{extract_keywords, CodeTokenizer};

proptest! {
    #[test]
    fn tokens_are_unique_and_lowercase(ident in "[a-zA-Z][a-zA-Z0-9_]{0,30}", is_query in any::<bool>()) {
        let tokens = CodeTokenizer::new().tokenize(&ident, is_query).into_vec();
        let mut deduped = tokens.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), tokens.len());
        prop_assert!(tokens.iter().all(|t| t.chars().all(|c| !c.is_uppercase())));
    }

    #[test]
    fn whole_identifier_is_first_token(ident in "[a-z][a-zA-Z]{0,20}") {
        let tokens = CodeTokenizer::new().tokenize(&ident, false);
        prop_assert_eq!(tokens.iter().next().cloned(), Some(ident.to_lowercase()));
    }

    #[test]
    fn query_variations_start_with_the_query(words in prop::collection::vec("[a-z]{2,8}", 1..4)) {
        let query = words.join(" ");
        let variations = CodeTokenizer::new().generate_query_variations(&query);
        prop_assert_eq!(variations.first(), Some(&query));
    }

    #[test]
    fn keywords_are_long_lowercase_and_unique(query in "[A-Za-z ]{0,60}") {
        let keywords = extract_keywords(&query);
        let mut deduped = keywords.clone();
        deduped.sort();
        deduped.dedup();
        prop_assert_eq!(deduped.len(), keywords.len());
        prop_assert!(keywords.iter().all(|k| k.len() > 2 && *k == k.to_lowercase()));
    }
}
