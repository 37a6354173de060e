use chrono::NaiveDate;
use tracing::{info, warn};

use codex_config::{CodexConfig, MatchingConfig, SinkKind};
use codex_core::{CodexError, Result};
use codex_corpus::{Corpus, StandardsRegistry};

use crate::brief::OpportunityBrief;
use crate::composer::{ComposeInput, TemplateComposer};
use crate::draft::PrdDraft;
use crate::extractor::{Extraction, Extractor};
use crate::fragment::{FragmentKind, Note};
use crate::mapper::{TopicMapper, TopicMatch};
use crate::persist::{DeliveryReport, PersistenceAdapter};
use crate::resolver::{Resolution, StandardsResolver};
use crate::review::{AcceptedPrd, NoMatchChoice, ReviewLoop, Reviewer};

/// Result of identifying scope: the brief as finally accepted and the topics
/// it maps to.
#[derive(Debug, Clone)]
pub struct Scope {
    pub brief: OpportunityBrief,
    pub matches: Vec<TopicMatch>,
    pub notes: Vec<Note>,
}

/// Everything read out of the corpus for one scope.
#[derive(Debug, Clone, Default)]
pub struct Grounding {
    pub extraction: Extraction,
    pub resolution: Resolution,
}

/// The PRD workflow over one corpus.
///
/// Phases run strictly in order: scope, grounding, composition, review,
/// delivery. Only delivery has side effects.
pub struct PrdWorkflow {
    corpus: Corpus,
    registry: StandardsRegistry,
    matching: MatchingConfig,
    composer: TemplateComposer,
}

impl PrdWorkflow {
    /// Open the corpus and registries named by `config`.
    pub fn open(config: &CodexConfig) -> Result<Self> {
        let corpus = Corpus::open(&config.corpus.root, &config.matching.aliases)?;
        let registry = StandardsRegistry::load(
            &corpus.store,
            &config.corpus.standards_map,
            &config.corpus.deprecated,
        )?;
        info!(
            root = %config.corpus.root.display(),
            topics = corpus.index.len(),
            standards = registry.entries().len(),
            "corpus opened"
        );
        Ok(Self::new(corpus, registry, config))
    }

    pub fn new(corpus: Corpus, registry: StandardsRegistry, config: &CodexConfig) -> Self {
        Self {
            corpus,
            registry,
            matching: config.matching.clone(),
            composer: TemplateComposer::new(&config.compose),
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn registry(&self) -> &StandardsRegistry {
        &self.registry
    }

    pub fn mapper(&self) -> TopicMapper<'_> {
        TopicMapper::new(&self.corpus.index, &self.matching)
    }

    /// Map the brief to topics. With no match the reviewer decides whether
    /// to proceed ungrounded, refine the brief, or stop.
    pub fn identify_scope<R>(&self, mut brief: OpportunityBrief, reviewer: &mut R) -> Result<Scope>
    where
        R: Reviewer + ?Sized,
    {
        loop {
            match self.mapper().map(&brief) {
                Ok(matches) => {
                    return Ok(Scope {
                        brief,
                        matches,
                        notes: Vec::new(),
                    });
                }
                Err(err @ CodexError::NoMatchFound { .. }) => match reviewer.on_no_match(&brief)? {
                    NoMatchChoice::Proceed => {
                        warn!("proceeding without documentation grounding");
                        return Ok(Scope {
                            brief,
                            matches: Vec::new(),
                            notes: Note::from_error(&err).into_iter().collect(),
                        });
                    }
                    NoMatchChoice::Refine(refined) => brief = refined,
                    NoMatchChoice::Abort => {
                        return Err(CodexError::Abandoned("identifying scope".into()));
                    }
                },
                Err(err) => return Err(err),
            }
        }
    }

    /// Extract fragments from the matched topics and resolve decisions
    /// against the standards registry.
    pub fn ground(&self, scope: &Scope) -> Result<Grounding> {
        let extraction = Extractor::new(&self.corpus.store).extract(&scope.matches)?;
        let decisions: Vec<_> = extraction.of_kind(FragmentKind::Decision).cloned().collect();
        let resolution =
            StandardsResolver::new(&self.registry, &self.corpus.store).resolve(&decisions, &scope.matches)?;
        info!(
            fragments = extraction.fragments.len(),
            open_decisions = resolution.open().count(),
            decided = resolution.already_decided().count(),
            "grounding complete"
        );
        Ok(Grounding { extraction, resolution })
    }

    pub fn compose(&self, scope: &Scope, grounding: &Grounding, date: NaiveDate) -> Result<PrdDraft> {
        self.composer.compose(&ComposeInput {
            brief: &scope.brief,
            matches: &scope.matches,
            extraction: &grounding.extraction,
            resolution: &grounding.resolution,
            notes: &scope.notes,
            date,
        })
    }

    /// Scope, ground, compose and review. Nothing is written.
    pub fn draft<R>(&self, brief: OpportunityBrief, reviewer: &mut R, date: NaiveDate) -> Result<(Scope, AcceptedPrd)>
    where
        R: Reviewer + ?Sized,
    {
        let scope = self.identify_scope(brief, reviewer)?;
        let grounding = self.ground(&scope)?;
        let first = self.compose(&scope, &grounding, date)?;
        let accepted = ReviewLoop::new(first).run(reviewer, || self.compose(&scope, &grounding, date))?;
        Ok((scope, accepted))
    }

    /// Deliver to `sink`. On a failed write the reviewer may pick another
    /// sink; the same write is never retried without being asked.
    pub async fn deliver<R>(
        &self,
        accepted: &AcceptedPrd,
        scope: &Scope,
        adapter: &PersistenceAdapter,
        mut sink: SinkKind,
        reviewer: &mut R,
    ) -> Result<DeliveryReport>
    where
        R: Reviewer + ?Sized,
    {
        let slug = scope.brief.slug();
        loop {
            match adapter.deliver(accepted, &slug, sink).await {
                Ok(report) => return Ok(report),
                Err(err @ CodexError::DeliveryFailed { .. }) => {
                    warn!(sink = %sink, error = %err, "delivery failed");
                    match reviewer.choose_sink(sink, &err)? {
                        Some(next) => sink = next,
                        None => return Err(err),
                    }
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// The whole workflow for one brief.
    pub async fn run<R>(
        &self,
        brief: OpportunityBrief,
        reviewer: &mut R,
        adapter: &PersistenceAdapter,
        sink: SinkKind,
        date: NaiveDate,
    ) -> Result<DeliveryReport>
    where
        R: Reviewer + ?Sized,
    {
        let (scope, accepted) = self.draft(brief, reviewer, date)?;
        self.deliver(&accepted, &scope, adapter, sink, reviewer).await
    }
}
