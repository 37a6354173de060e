use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CodexError;

// ── Topics ─────────────────────────────────────────────────────

/// The two kinds of topic-scoped documentation units in the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TopicKind {
    /// A technical topic, e.g. `feature-toggles`, `authentication`.
    Facet,
    /// A user-journey topic, e.g. `multi-tenancy-ux`.
    Experience,
}

impl TopicKind {
    pub const ALL: [TopicKind; 2] = [TopicKind::Facet, TopicKind::Experience];

    /// Directory under the corpus root holding topics of this kind.
    pub fn dir_name(self) -> &'static str {
        match self {
            TopicKind::Facet => "facets",
            TopicKind::Experience => "experiences",
        }
    }
}

impl fmt::Display for TopicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopicKind::Facet => write!(f, "facet"),
            TopicKind::Experience => write!(f, "experience"),
        }
    }
}

// ── Views ──────────────────────────────────────────────────────

/// A sub-view of a topic. Each view lives in its own markdown file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum View {
    Readme,
    Architecture,
    Testing,
    BestPractices,
    Gotchas,
    Options,
    Product,
}

impl View {
    pub const ALL: [View; 7] = [
        View::Readme,
        View::Architecture,
        View::Testing,
        View::BestPractices,
        View::Gotchas,
        View::Options,
        View::Product,
    ];

    /// File name of this view inside a topic directory.
    pub fn file_name(self) -> &'static str {
        match self {
            View::Readme => "README.md",
            View::Architecture => "architecture.md",
            View::Testing => "testing.md",
            View::BestPractices => "best-practices.md",
            View::Gotchas => "gotchas.md",
            View::Options => "options.md",
            View::Product => "product.md",
        }
    }

    /// Inverse of [`View::file_name`].
    pub fn from_file_name(name: &str) -> Option<View> {
        View::ALL.into_iter().find(|v| v.file_name() == name)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            View::Readme => "readme",
            View::Architecture => "architecture",
            View::Testing => "testing",
            View::BestPractices => "best-practices",
            View::Gotchas => "gotchas",
            View::Options => "options",
            View::Product => "product",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = CodexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        View::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| CodexError::Corpus(format!("unknown view '{s}'")))
    }
}

// ── Documents ──────────────────────────────────────────────────

/// A weak reference to a corpus document: enough to cite it, not to own it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Corpus-relative path with `/` separators, e.g. `facets/feature-toggles/options.md`.
    pub path: String,
    /// Topic name the document belongs to (registry documents use their file stem).
    pub topic: String,
    pub view: View,
}

impl DocumentRef {
    /// Reference for a topic view laid out as `<kind dir>/<topic>/<view file>`.
    pub fn for_view(kind: TopicKind, topic: &str, view: View) -> Self {
        Self {
            path: format!("{}/{}/{}", kind.dir_name(), topic, view.file_name()),
            topic: topic.to_string(),
            view,
        }
    }

    /// A reference is traceable when it names a concrete document.
    pub fn is_traceable(&self) -> bool {
        !self.path.trim().is_empty() && !self.topic.trim().is_empty()
    }
}

impl fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// A unit of the corpus. Immutable once loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub reference: DocumentRef,
    pub content: String,
}

impl Document {
    pub fn new(reference: DocumentRef, content: impl Into<String>) -> Self {
        Self {
            reference,
            content: content.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.reference.path
    }

    pub fn topic(&self) -> &str {
        &self.reference.topic
    }

    pub fn view(&self) -> View {
        self.reference.view
    }
}

/// Lowercase, dash-separated slug used for topic keys and file names.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
