//! # codex-corpus
//!
//! Read-only access to the Engineering Codex: the markdown documents laid
//! out as `facets/<topic>/<view>.md` and `experiences/<topic>/<view>.md`,
//! the topic index with its "Related ..." cross-reference graph, the
//! standards registries and internal link validation.
//!
//! Nothing in this crate writes to the corpus.

pub mod index;
pub mod links;
pub mod markdown;
pub mod standards;
pub mod store;
pub mod tokens;

use std::collections::BTreeMap;
use std::path::Path;

pub use index::{Topic, TopicIndex};
pub use links::{LinkIssue, LinkReport, LinkValidator};
pub use standards::{DecisionType, RegistryKind, StandardEntry, StandardsRegistry};
pub use store::DocumentStore;

/// A document store together with its topic index.
pub struct Corpus {
    pub store: DocumentStore,
    pub index: TopicIndex,
}

impl Corpus {
    /// Open the corpus at `root` and build its topic index.
    pub fn open(root: &Path, aliases: &BTreeMap<String, Vec<String>>) -> codex_core::Result<Self> {
        let store = DocumentStore::open(root)?;
        let index = TopicIndex::build(&store, aliases)?;
        Ok(Self { store, index })
    }
}
