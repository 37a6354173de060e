use thiserror::Error;

/// Unified error type for the Codex tooling.
///
/// Most workflow errors are recoverable: callers degrade to a placeholder,
/// a fallback sink, or a re-prompt instead of aborting the session.
#[derive(Error, Debug)]
pub enum CodexError {
    // ── Workflow errors ────────────────────────────────────────
    #[error("no topic matched the brief (threshold {threshold})")]
    NoMatchFound { threshold: f64 },

    #[error("missing section: {document}: {section}")]
    MissingSection { document: String, section: String },

    #[error("conflicting standards for '{facet}': Standard and Guidance both exist, Standard applies")]
    ConflictingStandard { facet: String },

    #[error("brief could not be loaded from {origin}: {reason}")]
    BriefUnloadable { origin: String, reason: String },

    #[error("fragment has no traceable source document: {0}")]
    UntracedFragment(String),

    #[error("review abandoned while {0}")]
    Abandoned(String),

    // ── Persistence errors ─────────────────────────────────────
    #[error("sink unavailable: {sink}: {reason}")]
    SinkUnavailable { sink: String, reason: String },

    #[error("delivery failed: {sink}: {reason}")]
    DeliveryFailed { sink: String, reason: String },

    // ── Corpus errors ──────────────────────────────────────────
    #[error("corpus error: {0}")]
    Corpus(String),

    #[error("topic not found: {0}")]
    TopicNotFound(String),

    #[error("skill error: {0}")]
    Skill(String),

    // ── Config errors ──────────────────────────────────────────
    #[error("config error: {0}")]
    Config(String),

    // ── Generic wrappers ───────────────────────────────────────
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CodexError {
    /// Whether the workflow can continue after this error by degrading
    /// (placeholder, fallback sink, or re-prompt).
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CodexError::NoMatchFound { .. }
                | CodexError::MissingSection { .. }
                | CodexError::ConflictingStandard { .. }
                | CodexError::BriefUnloadable { .. }
                | CodexError::SinkUnavailable { .. }
                | CodexError::DeliveryFailed { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, CodexError>;
