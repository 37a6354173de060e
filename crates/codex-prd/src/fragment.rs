use serde::Serialize;
use std::fmt;

use codex_core::{CodexError, DocumentRef, Result};

/// What a fragment contributes to the PRD.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FragmentKind {
    Risk,
    Decision,
    Metric,
    StandardRef,
    DesignNote,
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FragmentKind::Risk => "risk",
            FragmentKind::Decision => "decision",
            FragmentKind::Metric => "metric",
            FragmentKind::StandardRef => "standard-ref",
            FragmentKind::DesignNote => "design-note",
        };
        f.write_str(s)
    }
}

/// A piece of corpus text lifted into the PRD.
///
/// Always carries the document it came from; a fragment without a traceable
/// source cannot be constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractedFragment {
    source: DocumentRef,
    kind: FragmentKind,
    heading: String,
    text: String,
}

impl ExtractedFragment {
    pub fn new(
        source: DocumentRef,
        kind: FragmentKind,
        heading: impl Into<String>,
        text: impl Into<String>,
    ) -> Result<Self> {
        let heading = heading.into();
        if !source.is_traceable() {
            return Err(CodexError::UntracedFragment(format!("{kind} '{heading}'")));
        }
        Ok(Self {
            source,
            kind,
            heading,
            text: text.into(),
        })
    }

    pub fn source(&self) -> &DocumentRef {
        &self.source
    }

    pub fn kind(&self) -> FragmentKind {
        self.kind
    }

    /// Topic the fragment was extracted for.
    pub fn topic(&self) -> &str {
        &self.source.topic
    }

    pub fn heading(&self) -> &str {
        &self.heading
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// `heading: text`, or just the heading when there is no body.
    pub fn summary(&self) -> String {
        if self.text.is_empty() {
            self.heading.clone()
        } else {
            format!("{}: {}", self.heading, self.text)
        }
    }
}

/// Why a note was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteKind {
    NoMatch,
    MissingSection,
    ConflictingStandard,
}

/// A degraded path taken during drafting. Notes surface in the draft's
/// Open Questions so nothing is dropped silently.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Note {
    pub kind: NoteKind,
    pub message: String,
}

impl Note {
    /// Note for a recoverable workflow error. Other errors yield `None`.
    pub fn from_error(err: &CodexError) -> Option<Note> {
        let kind = match err {
            CodexError::NoMatchFound { .. } => NoteKind::NoMatch,
            CodexError::MissingSection { .. } => NoteKind::MissingSection,
            CodexError::ConflictingStandard { .. } => NoteKind::ConflictingStandard,
            _ => return None,
        };
        Some(Note {
            kind,
            message: err.to_string(),
        })
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex_core::{TopicKind, View};

    #[test]
    fn fragment_requires_traceable_source() {
        let ok = ExtractedFragment::new(
            DocumentRef::for_view(TopicKind::Facet, "caching", View::Gotchas),
            FragmentKind::Risk,
            "Stale reads",
            "",
        )
        .unwrap();
        assert_eq!(ok.topic(), "caching");
        assert_eq!(ok.summary(), "Stale reads");

        let untraced = DocumentRef {
            path: String::new(),
            topic: "caching".into(),
            view: View::Gotchas,
        };
        let err = ExtractedFragment::new(untraced, FragmentKind::Risk, "Stale reads", "").unwrap_err();
        assert!(matches!(err, CodexError::UntracedFragment(_)));
    }

    #[test]
    fn notes_only_for_workflow_errors() {
        let note = Note::from_error(&CodexError::ConflictingStandard { facet: "auth".into() }).unwrap();
        assert_eq!(note.kind, NoteKind::ConflictingStandard);
        assert!(note.message.contains("auth"));
        assert!(Note::from_error(&CodexError::Config("x".into())).is_none());
    }
}
