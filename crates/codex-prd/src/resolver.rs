use serde::Serialize;
use tracing::{debug, warn};

use codex_core::{CodexError, DocumentRef, Result, View};
use codex_corpus::{DecisionType, DocumentStore, RegistryKind, StandardEntry, StandardsRegistry};

use crate::fragment::{ExtractedFragment, FragmentKind, Note};
use crate::mapper::TopicMatch;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum DecisionStatus {
    /// A binding Standard already covers the facet.
    AlreadyDecided { standard: StandardEntry },
    /// Still to be made. Links the options document, plus any advisory guidance.
    Open {
        options: DocumentRef,
        guidance: Option<StandardEntry>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDecision {
    pub fragment: ExtractedFragment,
    pub status: DecisionStatus,
}

impl ResolvedDecision {
    pub fn is_open(&self) -> bool {
        matches!(self.status, DecisionStatus::Open { .. })
    }
}

#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Decision fragments in extraction order, each with its status.
    pub decisions: Vec<ResolvedDecision>,
    /// Standards-map entries for matched topics, as fragments citing the registry.
    pub standard_refs: Vec<ExtractedFragment>,
    /// Binding standards for matched topics.
    pub standards: Vec<StandardEntry>,
    /// Deprecated-registry entries for matched topics.
    pub deprecated: Vec<StandardEntry>,
    pub notes: Vec<Note>,
}

impl Resolution {
    pub fn open(&self) -> impl Iterator<Item = &ResolvedDecision> {
        self.decisions.iter().filter(|d| d.is_open())
    }

    pub fn already_decided(&self) -> impl Iterator<Item = &ResolvedDecision> {
        self.decisions.iter().filter(|d| !d.is_open())
    }
}

/// Checks decisions against the standards registry.
pub struct StandardsResolver<'a> {
    registry: &'a StandardsRegistry,
    store: &'a DocumentStore,
}

impl<'a> StandardsResolver<'a> {
    pub fn new(registry: &'a StandardsRegistry, store: &'a DocumentStore) -> Self {
        Self { registry, store }
    }

    /// Partition `decisions` into already-decided and open, and collect the
    /// registry entries that apply to the matched topics.
    pub fn resolve(&self, decisions: &[ExtractedFragment], matches: &[TopicMatch]) -> Result<Resolution> {
        let mut out = Resolution::default();

        let mut facets: Vec<&str> = Vec::new();
        for facet in matches
            .iter()
            .map(|m| m.topic.as_str())
            .chain(decisions.iter().map(ExtractedFragment::topic))
        {
            if !facets.contains(&facet) {
                facets.push(facet);
            }
        }

        for facet in &facets {
            let (standard, guidance) = self.binding(facet);
            if standard.is_some() && guidance.is_some() {
                let conflict = CodexError::ConflictingStandard {
                    facet: facet.to_string(),
                };
                warn!(facet, "standard and guidance both present; standard applies");
                out.notes.extend(Note::from_error(&conflict));
            }
            if let Some(s) = standard {
                out.standards.push(s.clone());
            }

            for entry in self.registry.for_facet(facet) {
                match entry.registry {
                    RegistryKind::StandardsMap => {
                        let mut text = entry.description.clone();
                        if let Some(ref adr) = entry.adr_link {
                            text.push_str(&format!(" (ADR: {adr})"));
                        }
                        out.standard_refs.push(ExtractedFragment::new(
                            entry.source.clone(),
                            FragmentKind::StandardRef,
                            format!("{} ({})", entry.facet, entry.decision_type),
                            text,
                        )?);
                    }
                    RegistryKind::Deprecated => out.deprecated.push(entry.clone()),
                }
            }
        }

        for fragment in decisions.iter().filter(|f| f.kind() == FragmentKind::Decision) {
            let (standard, guidance) = self.binding(fragment.topic());
            let status = match standard {
                Some(s) => DecisionStatus::AlreadyDecided { standard: s.clone() },
                None => DecisionStatus::Open {
                    options: self.options_ref(fragment)?,
                    guidance: guidance.cloned(),
                },
            };
            debug!(
                facet = fragment.topic(),
                option = fragment.heading(),
                open = matches!(status, DecisionStatus::Open { .. }),
                "resolved decision"
            );
            out.decisions.push(ResolvedDecision {
                fragment: fragment.clone(),
                status,
            });
        }

        Ok(out)
    }

    /// First Standard and first Guidance entry in the standards map for `facet`.
    fn binding(&self, facet: &str) -> (Option<&'a StandardEntry>, Option<&'a StandardEntry>) {
        let registry = self.registry;
        let in_map = || {
            registry
                .entries()
                .iter()
                .filter(move |e| e.facet == facet && e.registry == RegistryKind::StandardsMap)
        };
        (
            in_map().find(|e| e.decision_type == DecisionType::Standard),
            in_map().find(|e| e.decision_type == DecisionType::Guidance),
        )
    }

    /// The topic's options document, wherever the decision itself came from.
    fn options_ref(&self, fragment: &ExtractedFragment) -> Result<DocumentRef> {
        match self.store.reference(fragment.topic(), View::Options) {
            Ok(r) => Ok(r),
            Err(CodexError::TopicNotFound(_)) => Ok(fragment.source().clone()),
            Err(e) => Err(e),
        }
    }
}
