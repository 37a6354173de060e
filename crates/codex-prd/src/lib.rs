//! # codex-prd
//!
//! Turns an Opportunity Brief into a Product Requirements Document grounded
//! in the codex. The deterministic phases (topic mapping, extraction,
//! standards resolution, composition) are plain functions of their input;
//! the human steps (scope confirmation, review, sink choice) go through the
//! [`Reviewer`] trait.

pub mod brief;
pub mod composer;
pub mod draft;
pub mod extractor;
pub mod fragment;
pub mod mapper;
pub mod persist;
pub mod resolver;
pub mod review;
pub mod workflow;

pub use brief::{BriefSource, OpportunityBrief};
pub use composer::{ComposeInput, RiskClass, TemplateComposer};
pub use draft::{Feedback, FeedbackMode, PrdDraft, Section};
pub use extractor::{Extraction, Extractor};
pub use fragment::{ExtractedFragment, FragmentKind, Note, NoteKind};
pub use mapper::{Relevance, TopicMapper, TopicMatch};
pub use persist::{
    ClipboardSink, DeliveryReport, Deliverable, DisplaySink, FileSink, PersistenceAdapter, Sink, WikiSink,
};
pub use resolver::{DecisionStatus, Resolution, ResolvedDecision, StandardsResolver};
pub use review::{AcceptedPrd, NoMatchChoice, ReviewDecision, ReviewLoop, ReviewState, Reviewer};
pub use workflow::{Grounding, PrdWorkflow, Scope};
