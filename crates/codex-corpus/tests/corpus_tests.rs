#[cfg(test)]
mod tests {
    use codex_core::{TopicKind, View};
    use codex_corpus::{Corpus, DecisionType, StandardsRegistry};
    use std::collections::BTreeMap;
    use std::path::Path;

    fn write(root: &Path, rel: &str, content: &str) {
        let p = root.join(rel);
        std::fs::create_dir_all(p.parent().unwrap()).unwrap();
        std::fs::write(p, content).unwrap();
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        write(
            root,
            "facets/authentication/README.md",
            "# Authentication\n\nHow users sign in, sessions and tokens.\n\n## Related Facets\n\n- [API Design](../api-design/)\n- [Nowhere](../not-a-topic/)\n",
        );
        write(
            root,
            "facets/api-design/README.md",
            "# API Design\n\nConventions for HTTP APIs.\n",
        );
        write(
            root,
            "experiences/multi-tenancy-ux/README.md",
            "# Multi-tenancy UX\n\n**Keywords:** tenant, workspace\n\nUsers who belong to several organizations and switch between them.\n\n## Related Facets\n\n- [Authentication](../../facets/authentication/README.md)\n",
        );
        write(
            root,
            "standards-map.md",
            "# Standards\n\n| Facet | Type | Decision |\n|---|---|---|\n| Authentication | Standard | OIDC |\n",
        );
        dir
    }

    // ── Index ──────────────────────────────────────────────────

    #[test]
    fn test_index_descriptions_and_keywords() {
        let dir = fixture();
        let mut aliases = BTreeMap::new();
        aliases.insert("multi-tenancy-ux".to_string(), vec!["org switcher".to_string()]);
        let corpus = Corpus::open(dir.path(), &aliases).unwrap();

        let mt = corpus.index.get("multi-tenancy-ux").unwrap();
        assert_eq!(mt.kind, TopicKind::Experience);
        assert_eq!(
            mt.description,
            "Users who belong to several organizations and switch between them."
        );
        assert_eq!(mt.keywords, vec!["tenant", "workspace", "org switcher"]);
    }

    #[test]
    fn test_related_graph_drops_unknown_targets() {
        let dir = fixture();
        let corpus = Corpus::open(dir.path(), &BTreeMap::new()).unwrap();
        assert_eq!(corpus.index.related("authentication"), ["api-design".to_string()]);
        assert_eq!(corpus.index.related("multi-tenancy-ux"), ["authentication".to_string()]);
        assert!(corpus.index.related("api-design").is_empty());
        assert!(corpus.index.related("unknown").is_empty());
        assert_eq!(corpus.index.len(), 3);
    }

    // ── Store + registry ───────────────────────────────────────

    #[test]
    fn test_registry_loads_with_missing_deprecated() {
        let dir = fixture();
        let corpus = Corpus::open(dir.path(), &BTreeMap::new()).unwrap();
        let reg = StandardsRegistry::load(
            &corpus.store,
            Path::new("standards-map.md"),
            Path::new("deprecated.md"),
        )
        .unwrap();
        assert_eq!(reg.entries().len(), 1);
        let e = &reg.entries()[0];
        assert_eq!(e.facet, "authentication");
        assert_eq!(e.decision_type, DecisionType::Standard);
        assert_eq!(e.source.path, "standards-map.md");
    }

    #[test]
    fn test_store_reference_for_options() {
        let dir = fixture();
        let corpus = Corpus::open(dir.path(), &BTreeMap::new()).unwrap();
        let r = corpus.store.reference("authentication", View::Options).unwrap();
        assert_eq!(r.path, "facets/authentication/options.md");
    }
}
