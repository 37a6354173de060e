use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use codex_core::{CodexError, Document, DocumentRef, Result, TopicKind, View};

/// Read-only access to the corpus directory layout:
/// `<root>/facets/<topic>/<view>.md` and `<root>/experiences/<topic>/<view>.md`.
pub struct DocumentStore {
    root: PathBuf,
    topics: BTreeMap<String, TopicKind>,
}

impl DocumentStore {
    /// Scan the topic directories under `root`.
    pub fn open(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(CodexError::Corpus(format!(
                "corpus root {} is not a directory",
                root.display()
            )));
        }

        let mut topics = BTreeMap::new();
        for kind in TopicKind::ALL {
            let dir = root.join(kind.dir_name());
            if !dir.is_dir() {
                debug!(?dir, "topic directory does not exist, skipping");
                continue;
            }

            let mut names = Vec::new();
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                if !entry.path().is_dir() {
                    continue;
                }
                if let Some(name) = entry.file_name().to_str() {
                    if !name.starts_with('.') {
                        names.push(name.to_string());
                    }
                }
            }
            names.sort();

            for name in names {
                if let Some(existing) = topics.get(&name) {
                    warn!(topic = %name, kept = %existing, "topic name defined twice, keeping first");
                    continue;
                }
                topics.insert(name, kind);
            }
        }

        info!(root = ?root, topics = topics.len(), "opened corpus");
        Ok(Self {
            root: root.to_path_buf(),
            topics,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Topic names with their kind, sorted by name.
    pub fn topics(&self) -> impl Iterator<Item = (&str, TopicKind)> {
        self.topics.iter().map(|(n, k)| (n.as_str(), *k))
    }

    pub fn kind_of(&self, topic: &str) -> Option<TopicKind> {
        self.topics.get(topic).copied()
    }

    /// Reference to a topic view, whether or not the file exists.
    pub fn reference(&self, topic: &str, view: View) -> Result<DocumentRef> {
        let kind = self
            .kind_of(topic)
            .ok_or_else(|| CodexError::TopicNotFound(topic.to_string()))?;
        Ok(DocumentRef::for_view(kind, topic, view))
    }

    /// Load one view of a topic. A missing view file is `Ok(None)`.
    pub fn document(&self, topic: &str, view: View) -> Result<Option<Document>> {
        let reference = self.reference(topic, view)?;
        let path = self.root.join(&reference.path);
        if !path.is_file() {
            debug!(path = %reference.path, "view not present");
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)?;
        Ok(Some(Document::new(reference, content)))
    }

    /// Load every existing view of a topic, in [`View::ALL`] order.
    pub fn documents(&self, topic: &str) -> Result<Vec<Document>> {
        let mut docs = Vec::new();
        for view in View::ALL {
            if let Some(doc) = self.document(topic, view)? {
                docs.push(doc);
            }
        }
        Ok(docs)
    }

    /// Load a registry document (e.g. `standards-map.md`) outside the topic
    /// layout. `path` may be absolute or relative to the root.
    pub fn registry_document(&self, path: &Path) -> Result<Option<Document>> {
        let full = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };
        if !full.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&full)?;
        let rel = full
            .strip_prefix(&self.root)
            .unwrap_or(&full)
            .to_string_lossy()
            .replace('\\', "/");
        let stem = full
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        Ok(Some(Document::new(
            DocumentRef {
                path: rel,
                topic: stem,
                view: View::Readme,
            },
            content,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, content: &str) {
        let p = root.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(p, content).unwrap();
    }

    #[test]
    fn open_lists_topics_of_both_kinds() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "facets/feature-toggles/README.md", "# Feature Toggles");
        write(dir.path(), "facets/authentication/README.md", "# Auth");
        write(dir.path(), "experiences/multi-tenancy-ux/README.md", "# Multi-tenancy UX");
        write(dir.path(), "facets/stray.md", "not a topic");

        let store = DocumentStore::open(dir.path()).unwrap();
        let topics: Vec<_> = store.topics().collect();
        assert_eq!(
            topics,
            vec![
                ("authentication", TopicKind::Facet),
                ("feature-toggles", TopicKind::Facet),
                ("multi-tenancy-ux", TopicKind::Experience),
            ]
        );
    }

    #[test]
    fn missing_view_is_none() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "facets/feature-toggles/README.md", "# Feature Toggles");
        let store = DocumentStore::open(dir.path()).unwrap();

        assert!(store.document("feature-toggles", View::Gotchas).unwrap().is_none());
        let readme = store.document("feature-toggles", View::Readme).unwrap().unwrap();
        assert_eq!(readme.path(), "facets/feature-toggles/README.md");
        assert_eq!(store.documents("feature-toggles").unwrap().len(), 1);
    }

    #[test]
    fn unknown_topic_errors() {
        let dir = tempfile::tempdir().unwrap();
        let store = DocumentStore::open(dir.path()).unwrap();
        assert!(matches!(
            store.document("nope", View::Readme),
            Err(CodexError::TopicNotFound(_))
        ));
    }

    #[test]
    fn missing_root_errors() {
        assert!(DocumentStore::open(Path::new("/nonexistent/codex/root")).is_err());
    }

    #[test]
    fn registry_document_relative_path() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "standards-map.md", "# Standards");
        let store = DocumentStore::open(dir.path()).unwrap();
        let doc = store
            .registry_document(Path::new("standards-map.md"))
            .unwrap()
            .unwrap();
        assert_eq!(doc.path(), "standards-map.md");
        assert_eq!(doc.topic(), "standards-map");
        assert!(store.registry_document(Path::new("deprecated.md")).unwrap().is_none());
    }
}
