//! Keyword tokenization shared by the topic index and the topic mapper.

use std::collections::BTreeSet;

const STOPWORDS: &[&str] = &[
    "about", "after", "all", "also", "and", "any", "are", "because", "been", "before", "being",
    "between", "both", "but", "can", "could", "does", "each", "for", "from", "had", "has", "have",
    "how", "into", "its", "just", "like", "more", "most", "need", "needs", "not", "now", "off",
    "only", "other", "our", "out", "over", "same", "should", "some", "such", "than", "that", "the",
    "their", "them", "then", "there", "these", "they", "this", "those", "through", "too", "use",
    "used", "using", "very", "want", "was", "way", "were", "what", "when", "where", "which",
    "while", "who", "why", "will", "with", "without", "would", "you", "your",
];

/// Lowercase, split on non-alphanumerics, drop short tokens and stopwords,
/// and fold simple plurals. Order and duplicates are preserved.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 3)
        .map(|t| t.to_lowercase())
        .filter(|t| !STOPWORDS.contains(&t.as_str()))
        .map(|t| fold_plural(&t))
        .collect()
}

/// Distinct tokens of `text`, sorted.
pub fn token_set(text: &str) -> BTreeSet<String> {
    tokenize(text).into_iter().collect()
}

fn fold_plural(token: &str) -> String {
    if token.len() > 4 {
        if let Some(stem) = token.strip_suffix("ies") {
            return format!("{stem}y");
        }
        if token.ends_with('s') && !token.ends_with("ss") && !token.ends_with("us") {
            return token[..token.len() - 1].to_string();
        }
    }
    token.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokenize_drops_noise() {
        let t = tokenize("Users need to switch between customer organizations without re-logging in");
        assert_eq!(t, vec!["user", "switch", "customer", "organization", "logging"]);
    }

    #[test]
    fn plural_folding() {
        assert_eq!(tokenize("toggles policies access status"), vec!["toggle", "policy", "access", "status"]);
        // short tokens are kept verbatim
        assert_eq!(tokenize("apis"), vec!["apis"]);
    }

    #[test]
    fn token_set_dedupes() {
        let s = token_set("Tenant tenants TENANT");
        assert_eq!(s.len(), 1);
        assert!(s.contains("tenant"));
    }
}
