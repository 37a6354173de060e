use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use codex_core::{Result, TopicKind, View};

use crate::markdown;
use crate::store::DocumentStore;
use crate::tokens;

/// A facet or experience as seen by the topic mapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Topic {
    pub name: String,
    pub kind: TopicKind,
    /// First prose paragraph of the README, falling back to its title.
    pub description: String,
    /// Declared keywords (README `Keywords:` line) plus configured aliases.
    pub keywords: Vec<String>,
    /// Topics linked from "Related ..." sections, in first-seen order.
    pub related: Vec<String>,
}

impl Topic {
    /// Tokens of the topic name, e.g. `multi-tenancy-ux` → multi, tenancy.
    pub fn name_tokens(&self) -> BTreeSet<String> {
        tokens::token_set(&self.name.replace('-', " "))
    }

    pub fn keyword_tokens(&self) -> BTreeSet<String> {
        tokens::token_set(&self.keywords.join(" "))
    }

    pub fn description_tokens(&self) -> BTreeSet<String> {
        tokens::token_set(&self.description)
    }
}

/// The fixed topic index: every topic in the store plus the cross-reference
/// graph between them, kept as an adjacency list keyed by topic name.
#[derive(Debug, Clone, Default)]
pub struct TopicIndex {
    topics: BTreeMap<String, Topic>,
}

impl TopicIndex {
    /// Build the index from the store. `aliases` maps topic names to extra
    /// keywords; entries for unknown topics are ignored.
    pub fn build(store: &DocumentStore, aliases: &BTreeMap<String, Vec<String>>) -> Result<Self> {
        let mut topics = BTreeMap::new();

        for (name, kind) in store.topics() {
            let mut description = String::new();
            let mut keywords = Vec::new();
            let mut related = Vec::new();

            if let Some(readme) = store.document(name, View::Readme)? {
                let sections = markdown::sections(&readme.content);
                description = sections
                    .iter()
                    .flat_map(|s| s.paragraphs.iter())
                    .find(|p| parse_keywords(p).is_none())
                    .cloned()
                    .or_else(|| sections.iter().find(|s| s.level == 1).map(|s| s.title.clone()))
                    .unwrap_or_default();
                for p in sections.iter().flat_map(|s| s.paragraphs.iter()) {
                    if let Some(kw) = parse_keywords(p) {
                        keywords.extend(kw);
                    }
                }
            }

            for doc in store.documents(name)? {
                for section in markdown::sections(&doc.content) {
                    if !section.title.to_lowercase().starts_with("related") {
                        continue;
                    }
                    for link in &section.links {
                        if let Some(target) = topic_from_link(&link.dest) {
                            if target != name && !related.contains(&target) {
                                related.push(target);
                            }
                        }
                    }
                }
            }

            if let Some(extra) = aliases.get(name) {
                keywords.extend(extra.iter().cloned());
            }

            topics.insert(
                name.to_string(),
                Topic {
                    name: name.to_string(),
                    kind,
                    description,
                    keywords,
                    related,
                },
            );
        }

        // Drop links that point outside the index.
        let known: BTreeSet<String> = topics.keys().cloned().collect();
        for topic in topics.values_mut() {
            topic.related.retain(|r| {
                let keep = known.contains(r);
                if !keep {
                    debug!(topic = %topic.name, target = %r, "related link to unknown topic ignored");
                }
                keep
            });
        }

        Ok(Self { topics })
    }

    /// Build directly from topic records (for tests and embedding).
    pub fn from_topics(list: impl IntoIterator<Item = Topic>) -> Self {
        Self {
            topics: list.into_iter().map(|t| (t.name.clone(), t)).collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Topic> {
        self.topics.get(name)
    }

    /// All topics, sorted by name.
    pub fn topics(&self) -> impl Iterator<Item = &Topic> {
        self.topics.values()
    }

    /// Outgoing edges of the related-topic graph.
    pub fn related(&self, name: &str) -> &[String] {
        self.topics.get(name).map(|t| t.related.as_slice()).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}

/// `Keywords: a, b, c` (optionally bold) declared in a README paragraph.
fn parse_keywords(paragraph: &str) -> Option<Vec<String>> {
    let lower = paragraph.to_lowercase();
    let rest = lower.strip_prefix("keywords:")?;
    Some(
        rest.split(',')
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect(),
    )
}

/// Topic name addressed by a relative link such as `../authentication/`,
/// `../../facets/api-design/README.md` or `../caching/options.md#redis`.
pub(crate) fn topic_from_link(dest: &str) -> Option<String> {
    if dest.contains("://") || dest.starts_with('#') || dest.starts_with("mailto:") {
        return None;
    }
    let path = dest.split('#').next().unwrap_or(dest);
    let mut segments: Vec<&str> = path
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();
    if segments.last().is_some_and(|s| s.ends_with(".md")) {
        segments.pop();
    }
    segments.last().map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_from_link_variants() {
        assert_eq!(topic_from_link("../authentication/").as_deref(), Some("authentication"));
        assert_eq!(
            topic_from_link("../../facets/api-design/README.md").as_deref(),
            Some("api-design")
        );
        assert_eq!(topic_from_link("../caching/options.md#redis").as_deref(), Some("caching"));
        assert_eq!(topic_from_link("https://example.com/x"), None);
        assert_eq!(topic_from_link("#local"), None);
    }

    #[test]
    fn keywords_line() {
        assert_eq!(
            parse_keywords("Keywords: tenant, organization switch").unwrap(),
            vec!["tenant", "organization switch"]
        );
        assert!(parse_keywords("Just prose.").is_none());
    }

    #[test]
    fn name_tokens_split_on_dashes() {
        let t = Topic {
            name: "multi-tenancy-ux".into(),
            kind: TopicKind::Experience,
            description: String::new(),
            keywords: vec![],
            related: vec![],
        };
        let tokens = t.name_tokens();
        assert!(tokens.contains("multi"));
        assert!(tokens.contains("tenancy"));
    }
}
