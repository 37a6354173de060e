use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::schema::CodexConfig;

/// Loads the Codex configuration.
pub struct ConfigLoader {
    config: CodexConfig,
    config_path: PathBuf,
}

impl ConfigLoader {
    /// Resolve the config path: explicit path > CODEX_CONFIG env > ./codex.toml > ~/.codex/codex.toml
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(p) = explicit {
            return p.to_path_buf();
        }
        if let Ok(p) = std::env::var("CODEX_CONFIG") {
            return PathBuf::from(p);
        }
        let local = PathBuf::from("codex.toml");
        if local.exists() {
            return local;
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".codex")
            .join("codex.toml")
    }

    /// Load the config from disk, falling back to defaults.
    pub fn load(path: Option<&Path>) -> codex_core::Result<Self> {
        let config_path = Self::resolve_path(path);
        let config = if config_path.exists() {
            info!(?config_path, "loading configuration");
            let raw = std::fs::read_to_string(&config_path)?;
            Self::parse(&raw, &config_path)?
        } else {
            debug!(?config_path, "config file not found, using defaults");
            CodexConfig::default()
        };

        let config = Self::apply_env_overrides(config);

        match config.validate() {
            Ok(warnings) => {
                for w in &warnings {
                    warn!("{}", w);
                }
            }
            Err(e) => {
                return Err(codex_core::CodexError::Config(e));
            }
        }

        Ok(Self {
            config,
            config_path,
        })
    }

    /// Parse TOML text. Relative `corpus.root` is resolved against the
    /// directory containing the config file.
    pub fn parse(raw: &str, config_path: &Path) -> codex_core::Result<CodexConfig> {
        let mut config = toml::from_str::<CodexConfig>(raw).map_err(|e| {
            codex_core::CodexError::Config(format!(
                "failed to parse {}: {}",
                config_path.display(),
                e
            ))
        })?;
        if config.corpus.root.is_relative() {
            if let Some(dir) = config_path.parent().filter(|d| !d.as_os_str().is_empty()) {
                config.corpus.root = dir.join(&config.corpus.root);
            }
        }
        Ok(config)
    }

    /// Get a snapshot of the loaded config.
    pub fn get(&self) -> CodexConfig {
        self.config.clone()
    }

    /// Path the config was resolved from (may not exist).
    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Apply env var overrides (CODEX_CORPUS_ROOT, CODEX_LOG_LEVEL, CODEX_WIKI_TOKEN).
    fn apply_env_overrides(mut config: CodexConfig) -> CodexConfig {
        if let Ok(v) = std::env::var("CODEX_CORPUS_ROOT") {
            config.corpus.root = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("CODEX_LOG_LEVEL") {
            config.logging.level = v;
        }
        // Token: config file takes priority, env is the fallback.
        if config.wiki.token.is_none() {
            if let Ok(v) = std::env::var("CODEX_WIKI_TOKEN") {
                config.wiki.token = Some(v);
            }
        }
        config
    }
}
