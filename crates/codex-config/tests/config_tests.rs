#[cfg(test)]
mod tests {
    use codex_config::ConfigLoader;
    use codex_config::schema::*;
    use std::io::Write;

    // ── Default tests ──────────────────────────────────────────

    #[test]
    fn test_matching_config_defaults() {
        let config = MatchingConfig::default();
        assert_eq!(config.threshold, 2.0);
        assert_eq!(config.max_topics, 8);
        assert!(config.second_order);
        assert!(config.aliases.is_empty());
    }

    #[test]
    fn test_corpus_config_defaults() {
        let config = CorpusConfig::default();
        assert_eq!(config.root, std::path::PathBuf::from("."));
        assert_eq!(config.standards_map_path(), std::path::PathBuf::from("./standards-map.md"));
        assert_eq!(config.skills_path(), std::path::PathBuf::from("./skills"));
    }

    #[test]
    fn test_output_and_logging_defaults() {
        let config = CodexConfig::default();
        assert_eq!(config.output.default_sink, SinkKind::File);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
        assert!(!config.wiki.is_configured());
    }

    // ── Sink parsing ───────────────────────────────────────────

    #[test]
    fn test_sink_kind_parse_aliases() {
        assert_eq!("external-wiki-page".parse::<SinkKind>().unwrap(), SinkKind::Wiki);
        assert_eq!("display-only".parse::<SinkKind>().unwrap(), SinkKind::Display);
        assert_eq!("FILE".parse::<SinkKind>().unwrap(), SinkKind::File);
        assert!("fax".parse::<SinkKind>().is_err());
    }

    // ── TOML tests ─────────────────────────────────────────────

    #[test]
    fn test_config_toml_roundtrip() {
        let config = CodexConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let restored: CodexConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(restored.matching.threshold, config.matching.threshold);
        assert_eq!(restored.output.default_sink, config.output.default_sink);
    }

    #[test]
    fn test_partial_toml_applies_defaults() {
        let toml_str = r#"
[matching]
threshold = 3.5

[matching.aliases]
multi-tenancy-ux = ["tenant", "workspace"]

[output]
default_sink = "display"
"#;
        let config: CodexConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.matching.threshold, 3.5);
        assert_eq!(config.matching.max_topics, 8);
        assert_eq!(config.matching.aliases["multi-tenancy-ux"], vec!["tenant", "workspace"]);
        assert_eq!(config.output.default_sink, SinkKind::Display);
        assert_eq!(config.logging.format, "pretty");
    }

    // ── Validation ─────────────────────────────────────────────

    #[test]
    fn test_validate_rejects_non_positive_threshold() {
        let mut config = CodexConfig::default();
        config.matching.threshold = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.contains("matching.threshold"));
    }

    #[test]
    fn test_validate_rejects_bad_wiki_url() {
        let mut config = CodexConfig::default();
        config.wiki.base_url = Some("not a url".into());
        assert!(config.validate().unwrap_err().contains("wiki.base_url"));
    }

    #[test]
    fn test_validate_warns_on_partial_wiki() {
        let mut config = CodexConfig::default();
        config.wiki.base_url = Some("https://wiki.example.com".into());
        let warnings = config.validate().unwrap();
        assert!(warnings.iter().any(|w| w.field == "wiki"));
    }

    #[test]
    fn test_wiki_is_configured() {
        let wiki = WikiConfig {
            base_url: Some("https://wiki.example.com".into()),
            space: Some("ENG".into()),
            parent_page_id: None,
            token: Some("t0k3n".into()),
        };
        assert!(wiki.is_configured());
    }

    // ── ConfigLoader tests ─────────────────────────────────────

    #[test]
    fn test_config_loader_with_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("codex.toml");
        let mut f = std::fs::File::create(&config_path).unwrap();
        writeln!(
            f,
            r#"
[corpus]
root = "codex"

[matching]
max_topics = 4
second_order = false

[logging]
format = "json"
"#
        )
        .unwrap();

        let loader = ConfigLoader::load(Some(config_path.as_path())).unwrap();
        let config = loader.get();
        assert_eq!(config.corpus.root, dir.path().join("codex"));
        assert_eq!(config.matching.max_topics, 4);
        assert!(!config.matching.second_order);
        assert_eq!(config.logging.format, "json");
        assert_eq!(loader.path(), config_path.as_path());
    }

    #[test]
    fn test_config_loader_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loader = ConfigLoader::load(Some(dir.path().join("absent.toml").as_path())).unwrap();
        assert_eq!(loader.get().matching.threshold, 2.0);
    }

    #[test]
    fn test_config_loader_invalid_toml_errors() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("codex.toml");
        std::fs::write(&config_path, "[matching\nthreshold = ").unwrap();
        assert!(ConfigLoader::load(Some(config_path.as_path())).is_err());
    }

    #[test]
    fn test_unknown_log_level_falls_back_to_info() {
        let mut config = CodexConfig::default();
        config.logging.level = "loud".into();
        assert_eq!(config.logging.effective_level(), "info");
        let warnings = config.validate().unwrap();
        assert!(warnings.iter().any(|w| w.field == "logging.level"));

        config.logging.level = "debug".into();
        assert_eq!(config.logging.effective_level(), "debug");
    }

    // ── JSON roundtrip ─────────────────────────────────────────

    #[test]
    fn test_config_json_roundtrip() {
        let config = CodexConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let restored: CodexConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.corpus.standards_map, config.corpus.standards_map);
    }
}
