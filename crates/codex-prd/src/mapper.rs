use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, info};

use codex_config::MatchingConfig;
use codex_core::{CodexError, Result, TopicKind};
use codex_corpus::tokens;
use codex_corpus::{Topic, TopicIndex};

use crate::brief::OpportunityBrief;

const NAME_WEIGHT: u32 = 3;
const KEYWORD_WEIGHT: u32 = 2;
const DESCRIPTION_WEIGHT: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Relevance {
    High,
    Medium,
    /// Not matched directly; linked from a primary match.
    Related,
}

impl fmt::Display for Relevance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Relevance::High => write!(f, "high"),
            Relevance::Medium => write!(f, "medium"),
            Relevance::Related => write!(f, "related"),
        }
    }
}

/// A topic selected for extraction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicMatch {
    pub topic: String,
    pub kind: TopicKind,
    pub score: u32,
    pub relevance: Relevance,
    /// Primary match that linked this topic in (related matches only).
    pub via: Option<String>,
    /// Brief tokens that contributed to the score.
    pub matched_terms: Vec<String>,
}

impl TopicMatch {
    pub fn is_primary(&self) -> bool {
        self.relevance != Relevance::Related
    }
}

struct Scored<'a> {
    topic: &'a Topic,
    score: u32,
    terms: Vec<String>,
}

/// Ranks topics in the index against a brief.
///
/// Pure: the same brief text and index always yield the same list.
pub struct TopicMapper<'a> {
    index: &'a TopicIndex,
    threshold: f64,
    max_topics: usize,
    second_order: bool,
}

impl<'a> TopicMapper<'a> {
    pub fn new(index: &'a TopicIndex, config: &MatchingConfig) -> Self {
        Self {
            index,
            threshold: config.threshold,
            max_topics: config.max_topics,
            second_order: config.second_order,
        }
    }

    /// Score one topic against a set of brief tokens. Each token counts once,
    /// at its highest weight.
    pub fn score_topic(topic: &Topic, brief_tokens: &BTreeSet<String>) -> (u32, Vec<String>) {
        let name = topic.name_tokens();
        let keywords = topic.keyword_tokens();
        let description = topic.description_tokens();

        let mut score = 0;
        let mut terms = Vec::new();
        for token in brief_tokens {
            let weight = if name.contains(token) {
                NAME_WEIGHT
            } else if keywords.contains(token) {
                KEYWORD_WEIGHT
            } else if description.contains(token) {
                DESCRIPTION_WEIGHT
            } else {
                continue;
            };
            score += weight;
            terms.push(token.clone());
        }
        (score, terms)
    }

    /// Ranked topics for free text: primary matches first, then related
    /// topics. Possibly empty.
    pub fn rank_text(&self, text: &str) -> Vec<TopicMatch> {
        let brief_tokens = tokens::token_set(text);
        debug!(tokens = ?brief_tokens, "scoring brief");

        let mut scored: Vec<Scored<'_>> = self
            .index
            .topics()
            .map(|topic| {
                let (score, terms) = Self::score_topic(topic, &brief_tokens);
                Scored { topic, score, terms }
            })
            .collect();

        let (mut pending, rest): (Vec<_>, Vec<_>) = scored
            .drain(..)
            .partition(|s| s.score > 0 && f64::from(s.score) >= self.threshold);

        // Greedy: highest score first; among equal scores prefer a topic an
        // already-selected topic links to, then the lower name.
        let mut primary: Vec<Scored<'_>> = Vec::with_capacity(pending.len());
        while let Some(best) = pending.iter().map(|s| s.score).max() {
            let pick = pending
                .iter()
                .enumerate()
                .filter(|(_, s)| s.score == best)
                .min_by_key(|(_, s)| {
                    let linked = primary
                        .iter()
                        .any(|p| p.topic.related.iter().any(|r| r == &s.topic.name));
                    (!linked, s.topic.name.as_str())
                })
                .map(|(i, _)| i);
            match pick {
                Some(i) => primary.push(pending.remove(i)),
                None => break,
            }
        }

        let mut out: Vec<TopicMatch> = primary
            .iter()
            .map(|s| TopicMatch {
                topic: s.topic.name.clone(),
                kind: s.topic.kind,
                score: s.score,
                relevance: if f64::from(s.score) >= 2.0 * self.threshold {
                    Relevance::High
                } else {
                    Relevance::Medium
                },
                via: None,
                matched_terms: s.terms.clone(),
            })
            .collect();

        if self.second_order {
            for p in &primary {
                let mut related: Vec<&String> = self.index.related(&p.topic.name).iter().collect();
                related.sort();
                for name in related {
                    if out.iter().any(|m| &m.topic == name) {
                        continue;
                    }
                    let Some(topic) = self.index.get(name) else {
                        continue;
                    };
                    let (score, terms) = rest
                        .iter()
                        .find(|s| &s.topic.name == name)
                        .map(|s| (s.score, s.terms.clone()))
                        .unwrap_or_default();
                    out.push(TopicMatch {
                        topic: topic.name.clone(),
                        kind: topic.kind,
                        score,
                        relevance: Relevance::Related,
                        via: Some(p.topic.name.clone()),
                        matched_terms: terms,
                    });
                }
            }
        }

        out.truncate(self.max_topics);
        out
    }

    /// Ranked topics for a brief (problem statement plus hypothesis).
    pub fn rank(&self, brief: &OpportunityBrief) -> Vec<TopicMatch> {
        self.rank_text(&brief.matching_text())
    }

    /// Like [`rank`](Self::rank), but fails with `NoMatchFound` when no topic
    /// clears the threshold.
    pub fn map(&self, brief: &OpportunityBrief) -> Result<Vec<TopicMatch>> {
        let matches = self.rank(brief);
        if !matches.iter().any(TopicMatch::is_primary) {
            info!(threshold = self.threshold, "no topic matched the brief");
            return Err(CodexError::NoMatchFound {
                threshold: self.threshold,
            });
        }
        info!(
            topics = ?matches.iter().map(|m| m.topic.as_str()).collect::<Vec<_>>(),
            "mapped brief to topics"
        );
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(name: &str, description: &str, keywords: &[&str], related: &[&str]) -> Topic {
        Topic {
            name: name.into(),
            kind: TopicKind::Facet,
            description: description.into(),
            keywords: keywords.iter().map(|s| s.to_string()).collect(),
            related: related.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn index() -> TopicIndex {
        TopicIndex::from_topics([
            topic("caching", "Storing computed results close to the reader.", &["redis", "cdn"], &["observability"]),
            topic("feature-toggles", "Turning features on and off at runtime.", &["flag", "rollout"], &["testing-strategy"]),
            topic("observability", "Logs, metrics and traces.", &[], &[]),
            topic("testing-strategy", "How features are tested before release.", &[], &[]),
        ])
    }

    #[test]
    fn weights_apply_once_per_token() {
        let idx = index();
        let t = idx.get("feature-toggles").unwrap();
        let (score, terms) = TopicMapper::score_topic(t, &tokens::token_set("feature flag rollout"));
        // feature (name) + flag (keyword) + rollout (keyword)
        assert_eq!(score, 3 + 2 + 2);
        assert_eq!(terms, vec!["feature", "flag", "rollout"]);
    }

    #[test]
    fn rank_orders_and_labels() {
        let idx = index();
        let mapper = TopicMapper::new(&idx, &MatchingConfig::default());
        let matches = mapper.rank_text("Roll out a new feature behind a flag, served from redis");

        assert_eq!(matches[0].topic, "feature-toggles");
        assert_eq!(matches[0].relevance, Relevance::High);
        assert_eq!(matches[1].topic, "caching");
        assert_eq!(matches[1].relevance, Relevance::Medium);
        // Related topics follow, attributed to the match that linked them.
        assert_eq!(matches[2].topic, "testing-strategy");
        assert_eq!(matches[2].via.as_deref(), Some("feature-toggles"));
        assert_eq!(matches[3].topic, "observability");
        assert_eq!(matches[3].relevance, Relevance::Related);
    }

    #[test]
    fn second_order_can_be_disabled() {
        let idx = index();
        let config = MatchingConfig {
            second_order: false,
            ..MatchingConfig::default()
        };
        let matches = TopicMapper::new(&idx, &config).rank_text("feature flag");
        assert_eq!(matches.len(), 1);
    }

    #[test]
    fn tie_prefers_linked_topic() {
        let idx = TopicIndex::from_topics([
            topic("alpha", "widgets", &[], &["zulu"]),
            topic("mike", "gadgets", &[], &[]),
            topic("zulu", "gadgets", &[], &[]),
        ]);
        let config = MatchingConfig {
            threshold: 1.0,
            second_order: false,
            ..MatchingConfig::default()
        };
        let mapper = TopicMapper::new(&idx, &config);
        let names: Vec<_> = mapper
            .rank_text("widgets gadgets widget")
            .into_iter()
            .map(|m| m.topic)
            .collect();
        assert_eq!(names, vec!["alpha", "zulu", "mike"]);
    }

    #[test]
    fn truncates_to_max_topics() {
        let idx = index();
        let config = MatchingConfig {
            max_topics: 2,
            ..MatchingConfig::default()
        };
        let matches = TopicMapper::new(&idx, &config).rank_text("feature flag redis cdn");
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn map_fails_without_primary_match() {
        let idx = index();
        let mapper = TopicMapper::new(&idx, &MatchingConfig::default());
        let brief = OpportunityBrief {
            problem_statement: "Quarterly payroll export for accountants".into(),
            ..OpportunityBrief::default()
        };
        assert!(mapper.rank(&brief).is_empty());
        assert!(matches!(mapper.map(&brief), Err(CodexError::NoMatchFound { .. })));
    }
}
