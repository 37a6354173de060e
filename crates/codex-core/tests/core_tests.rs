#[cfg(test)]
mod tests {
    use codex_core::*;

    // ── View tests ─────────────────────────────────────────────

    #[test]
    fn test_view_file_names_roundtrip() {
        for view in View::ALL {
            assert_eq!(View::from_file_name(view.file_name()), Some(view));
        }
        assert_eq!(View::from_file_name("notes.md"), None);
    }

    #[test]
    fn test_view_parse() {
        assert_eq!("best-practices".parse::<View>().unwrap(), View::BestPractices);
        assert!("gossip".parse::<View>().is_err());
    }

    #[test]
    fn test_view_serde_kebab_case() {
        let json = serde_json::to_string(&View::BestPractices).unwrap();
        assert_eq!(json, "\"best-practices\"");
    }

    // ── DocumentRef tests ──────────────────────────────────────

    #[test]
    fn test_document_ref_for_view() {
        let r = DocumentRef::for_view(TopicKind::Facet, "feature-toggles", View::Options);
        assert_eq!(r.path, "facets/feature-toggles/options.md");
        assert_eq!(r.topic, "feature-toggles");
        assert!(r.is_traceable());

        let e = DocumentRef::for_view(TopicKind::Experience, "multi-tenancy-ux", View::Product);
        assert_eq!(e.path, "experiences/multi-tenancy-ux/product.md");
    }

    #[test]
    fn test_document_ref_untraceable() {
        let r = DocumentRef {
            path: "  ".into(),
            topic: "x".into(),
            view: View::Readme,
        };
        assert!(!r.is_traceable());
    }

    #[test]
    fn test_document_accessors() {
        let doc = Document::new(
            DocumentRef::for_view(TopicKind::Facet, "api-design", View::Gotchas),
            "# Gotchas",
        );
        assert_eq!(doc.topic(), "api-design");
        assert_eq!(doc.view(), View::Gotchas);
        assert_eq!(doc.path(), "facets/api-design/gotchas.md");
    }

    // ── slugify ────────────────────────────────────────────────

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Org Switcher v2!"), "org-switcher-v2");
        assert_eq!(slugify("  Feature   Toggles "), "feature-toggles");
        assert_eq!(slugify("---"), "");
    }

    // ── Error tests ────────────────────────────────────────────

    #[test]
    fn test_error_display() {
        let err = CodexError::SinkUnavailable {
            sink: "wiki".into(),
            reason: "not configured".into(),
        };
        let s = err.to_string();
        assert!(s.contains("wiki"));
        assert!(s.contains("not configured"));
    }

    #[test]
    fn test_error_recoverability() {
        assert!(CodexError::NoMatchFound { threshold: 2.0 }.is_recoverable());
        assert!(
            CodexError::BriefUnloadable {
                origin: "brief.md".into(),
                reason: "missing".into()
            }
            .is_recoverable()
        );
        assert!(!CodexError::Config("bad".into()).is_recoverable());
        assert!(!CodexError::Abandoned("under review".into()).is_recoverable());
    }

    #[test]
    fn test_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CodexError = io.into();
        assert!(matches!(err, CodexError::Io(_)));
    }
}
