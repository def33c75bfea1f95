use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};

/// Common programming abbreviations and their expansions
static ABBREVIATIONS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    HashMap::from([
        ("impl", &["implementation", "implement"][..]),
        ("repo", &["repository"][..]),
        ("ctrl", &["controller", "control"][..]),
        ("mgr", &["manager", "manage"][..]),
        ("svc", &["service"][..]),
        ("util", &["utility", "utilities"][..]),
        ("config", &["configuration", "configure"][..]),
        (
            "auth",
            &["authentication", "authorization", "authenticate", "authorize"][..],
        ),
        ("db", &["database"][..]),
        ("conn", &["connection", "connect"][..]),
        ("msg", &["message"][..]),
        ("btn", &["button"][..]),
        ("val", &["value", "validation", "validate"][..]),
        ("max", &["maximum"][..]),
        ("min", &["minimum"][..]),
        ("avg", &["average"][..]),
        ("cnt", &["count", "counter"][..]),
        ("idx", &["index"][..]),
        ("ref", &["reference"][..]),
        ("req", &["request", "require", "required"][..]),
        ("res", &["response", "result", "resource"][..]),
        ("err", &["error"][..]),
        ("exc", &["exception"][..]),
        ("init", &["initialize", "initial"][..]),
        ("calc", &["calculate", "calculation"][..]),
        ("exec", &["execute", "execution"][..]),
        ("proc", &["process", "procedure"][..]),
        ("async", &["asynchronous"][..]),
        ("sync", &["synchronous", "synchronize"][..]),
    ])
});

/// Common programming verbs and their synonyms
static VERB_SYNONYMS: Lazy<HashMap<&'static str, &'static [&'static str]>> = Lazy::new(|| {
    HashMap::from([
        (
            "get",
            &["fetch", "retrieve", "find", "load", "read", "obtain"][..],
        ),
        ("set", &["update", "assign", "store", "save", "write", "put"][..]),
        (
            "add",
            &["insert", "append", "push", "create", "plus", "increment"][..],
        ),
        (
            "remove",
            &["delete", "drop", "pop", "clear", "minus", "decrement"][..],
        ),
        ("check", &["verify", "validate", "test", "ensure", "confirm"][..]),
        ("init", &["initialize", "setup", "create", "start", "begin"][..]),
        ("calc", &["calculate", "compute", "derive", "determine"][..]),
        (
            "send",
            &["dispatch", "emit", "publish", "broadcast", "transmit"][..],
        ),
        (
            "receive",
            &["accept", "handle", "consume", "listen", "subscribe"][..],
        ),
        (
            "convert",
            &["transform", "parse", "format", "serialize", "map"][..],
        ),
    ])
});

/// Insertion-ordered set of distinct, non-empty tokens
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenSet {
    tokens: Vec<String>,
    seen: HashSet<String>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token; empty strings and duplicates are ignored
    pub fn insert(&mut self, token: impl Into<String>) -> bool {
        let token = token.into();
        if token.is_empty() || self.seen.contains(&token) {
            return false;
        }
        self.seen.insert(token.clone());
        self.tokens.push(token);
        true
    }

    #[must_use]
    pub fn contains(&self, token: &str) -> bool {
        self.seen.contains(token)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.tokens.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        &self.tokens
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        self.tokens
    }

    /// Tokens joined by `separator`
    #[must_use]
    pub fn join(&self, separator: &str) -> String {
        self.tokens.join(separator)
    }
}

impl<S: Into<String>> Extend<S> for TokenSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for token in iter {
            self.insert(token);
        }
    }
}

impl<S: Into<String>> FromIterator<S> for TokenSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl IntoIterator for TokenSet {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.into_iter()
    }
}

impl<'a> IntoIterator for &'a TokenSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.tokens.iter()
    }
}

/// Tokenizer that understands code naming conventions
/// (dotted paths, snake_case, kebab-case, camelCase).
#[derive(Debug, Clone, Copy, Default)]
pub struct CodeTokenizer;

impl CodeTokenizer {
    pub const fn new() -> Self {
        Self
    }

    /// Split an identifier or query into lowercase tokens plus their expansions.
    ///
    /// With `is_query`, multi-part input also yields recombined spellings
    /// (`add_score` → `addscore`, `scoreadd`, ...).
    pub fn tokenize(&self, text: &str, is_query: bool) -> TokenSet {
        let mut tokens = TokenSet::new();
        if text.trim().is_empty() {
            return tokens;
        }

        tokens.insert(text.trim().to_lowercase());

        let parts: Vec<String> = split_by_conventions(text)
            .into_iter()
            .map(str::to_lowercase)
            .collect();
        tokens.extend(parts.iter().cloned());

        for part in &parts {
            if let Some(expansions) = Self::abbreviation(part) {
                tokens.extend(expansions.iter().copied());
            }
            if let Some(synonyms) = Self::verb_synonyms(part) {
                tokens.extend(synonyms.iter().copied());
            }
            tokens.insert(simple_stem(part));
        }

        if is_query && parts.len() > 1 {
            tokens.extend(combined_variations(&parts));
        }

        tokens
    }

    /// Candidate identifier spellings for a space-separated query
    /// (`"add score"` → `addScore`, `AddScore`, `add_score`, `scoreAdd`, `addToScore`, ...).
    pub fn generate_query_variations(&self, query: &str) -> Vec<String> {
        let mut variations = TokenSet::new();
        variations.insert(query);

        let words: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        if words.len() > 1 {
            variations.insert(camel_case(&words));
            variations.insert(words.iter().map(|w| capitalize(w)).collect::<String>());
            variations.insert(words.join("_"));

            let reversed: Vec<String> = words.iter().rev().cloned().collect();
            variations.insert(camel_case(&reversed));

            if let [first, second] = words.as_slice() {
                variations.insert(format!("{first}To{}", capitalize(second)));
                variations.insert(format!("{first}{}s", capitalize(second)));
                variations.insert(format!("{first}ing{}", capitalize(second)));
                variations.insert(format!("{second}{}er", capitalize(first)));
            }
        }

        variations.into_vec()
    }

    /// Tokens for identifier-like words found in `content`, first occurrence first,
    /// stopping once `cap` tokens are collected.
    pub fn identifier_tokens(&self, content: &str, cap: usize) -> TokenSet {
        let mut tokens = TokenSet::new();
        let mut visited = HashSet::new();

        for word in identifiers(content) {
            if tokens.len() >= cap {
                break;
            }
            if !visited.insert(word) {
                continue;
            }
            for token in self.tokenize(word, false) {
                if tokens.len() >= cap {
                    break;
                }
                tokens.insert(token);
            }
        }

        tokens
    }

    pub fn abbreviation(word: &str) -> Option<&'static [&'static str]> {
        ABBREVIATIONS.get(word).copied()
    }

    pub fn verb_synonyms(word: &str) -> Option<&'static [&'static str]> {
        VERB_SYNONYMS.get(word).copied()
    }
}

/// Dots, then underscores, then hyphens, then camelCase boundaries.
fn split_by_conventions(text: &str) -> Vec<&str> {
    let parts: Vec<&str> = text
        .split('.')
        .flat_map(|part| part.split('_'))
        .flat_map(|part| part.split('-'))
        .flat_map(split_camel_case)
        .filter(|part| !part.is_empty())
        .collect();

    if parts.is_empty() {
        vec![text]
    } else {
        parts
    }
}

/// Boundaries sit between a lowercase and an uppercase letter, and before the last
/// capital of an acronym that starts a new word: `HTTPServer` → `HTTP`, `Server`.
fn split_camel_case(word: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = word.char_indices().collect();
    let mut parts = Vec::new();
    let mut start = 0;

    for i in 1..chars.len() {
        let prev = chars[i - 1].1;
        let cur = chars[i].1;
        let next_is_lower = chars.get(i + 1).is_some_and(|(_, c)| c.is_ascii_lowercase());

        let boundary = (prev.is_ascii_lowercase() && cur.is_ascii_uppercase())
            || (prev.is_ascii_uppercase() && cur.is_ascii_uppercase() && next_is_lower);

        if boundary {
            let at = chars[i].0;
            parts.push(&word[start..at]);
            start = at;
        }
    }

    parts.push(&word[start..]);
    parts
}

/// Strip one common suffix from words longer than three characters.
fn simple_stem(word: &str) -> String {
    let len = word.chars().count();
    if len <= 3 {
        return word.to_string();
    }

    if len > 5 {
        if let Some(stem) = word.strip_suffix("ing") {
            return stem.to_string();
        }
    }
    if len > 4 {
        if let Some(stem) = word.strip_suffix("ed").or_else(|| word.strip_suffix("er")) {
            return stem.to_string();
        }
    }
    if !word.ends_with("ss") {
        if let Some(stem) = word.strip_suffix('s') {
            return stem.to_string();
        }
    }

    word.to_string()
}

fn combined_variations(parts: &[String]) -> Vec<String> {
    match parts {
        [first, second] => vec![
            format!("{first}{second}"),
            format!("{first}_{second}"),
            format!("{second}{first}"),
            format!("{second}_{first}"),
        ],
        _ => vec![parts.concat(), parts.join("_")],
    }
}

fn camel_case(words: &[String]) -> String {
    let mut out = String::new();
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(word);
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Identifier-like words: a letter or `_` followed by letters, digits, `_`;
/// at least three characters long.
fn identifiers(content: &str) -> impl Iterator<Item = &str> {
    content
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|word| word.len() >= 3)
        .filter(|word| {
            word.chars()
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_')
        })
}
