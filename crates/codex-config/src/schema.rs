use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Root configuration, mapped to `codex.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CodexConfig {
    pub corpus: CorpusConfig,
    pub matching: MatchingConfig,
    pub compose: ComposeConfig,
    pub output: OutputConfig,
    pub wiki: WikiConfig,
    pub logging: LoggingConfig,
}

// ── Corpus ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorpusConfig {
    /// Root directory of the codex (contains `facets/`, `experiences/`, ...).
    pub root: PathBuf,
    /// Standards registry, relative to `root` unless absolute.
    pub standards_map: PathBuf,
    /// Deprecated-approaches registry, relative to `root` unless absolute.
    pub deprecated: PathBuf,
    /// Skill templates directory, relative to `root` unless absolute.
    pub skills_dir: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            standards_map: PathBuf::from("standards-map.md"),
            deprecated: PathBuf::from("deprecated.md"),
            skills_dir: PathBuf::from("skills"),
        }
    }
}

impl CorpusConfig {
    /// Resolve a corpus-relative path against `root`.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    pub fn standards_map_path(&self) -> PathBuf {
        self.resolve(&self.standards_map)
    }

    pub fn deprecated_path(&self) -> PathBuf {
        self.resolve(&self.deprecated)
    }

    pub fn skills_path(&self) -> PathBuf {
        self.resolve(&self.skills_dir)
    }
}

// ── Matching ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Minimum score for a topic to count as a primary match.
    pub threshold: f64,
    /// Maximum number of topics (primary + related) handed to extraction.
    pub max_topics: usize,
    /// Include topics linked from primary matches ("Related Facets").
    pub second_order: bool,
    /// Extra keywords per topic name, merged with keywords declared in the corpus.
    pub aliases: BTreeMap<String, Vec<String>>,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: 2.0,
            max_topics: 8,
            second_order: true,
            aliases: BTreeMap::new(),
        }
    }
}

// ── Compose ────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComposeConfig {
    /// Terms that classify a risk as Technical, in addition to the built-in list.
    pub technical_keywords: Vec<String>,
    /// Author recorded in the PRD metadata.
    pub author: Option<String>,
}

// ── Output ─────────────────────────────────────────────────────

/// Where an accepted PRD is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkKind {
    File,
    Clipboard,
    Wiki,
    Display,
}

impl SinkKind {
    pub const ALL: [SinkKind; 4] = [
        SinkKind::File,
        SinkKind::Clipboard,
        SinkKind::Wiki,
        SinkKind::Display,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SinkKind::File => "file",
            SinkKind::Clipboard => "clipboard",
            SinkKind::Wiki => "wiki",
            SinkKind::Display => "display",
        }
    }
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "file" => Ok(SinkKind::File),
            "clipboard" => Ok(SinkKind::Clipboard),
            "wiki" | "external-wiki-page" | "confluence" => Ok(SinkKind::Wiki),
            "display" | "display-only" | "stdout" => Ok(SinkKind::Display),
            other => Err(format!("unknown sink '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Sink used when `--sink` is not given.
    pub default_sink: SinkKind,
    /// Directory for the file sink.
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_sink: SinkKind::File,
            dir: PathBuf::from("."),
        }
    }
}

// ── Wiki ───────────────────────────────────────────────────────

/// Optional external wiki integration (Confluence-style REST API).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WikiConfig {
    /// Base URL, e.g. "https://wiki.example.com".
    pub base_url: Option<String>,
    /// Space key pages are created in.
    pub space: Option<String>,
    /// Parent page id (optional).
    pub parent_page_id: Option<String>,
    /// Bearer token. Falls back to `CODEX_WIKI_TOKEN`.
    pub token: Option<String>,
}

impl WikiConfig {
    /// The integration is usable only when URL, space and token are all set.
    pub fn is_configured(&self) -> bool {
        self.base_url.as_deref().is_some_and(|u| !u.is_empty())
            && self.space.as_deref().is_some_and(|s| !s.is_empty())
            && self.token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

// ── Logging ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// "pretty" or "json".
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: "pretty".into(),
        }
    }
}

/// Levels accepted in `logging.level` and `--log-level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl LoggingConfig {
    /// The configured level, or "info" when it is not one of [`LOG_LEVELS`].
    pub fn effective_level(&self) -> &str {
        if LOG_LEVELS.contains(&self.level.as_str()) {
            &self.level
        } else {
            "info"
        }
    }
}

// ── Validation ─────────────────────────────────────────────────

/// A single config validation issue.
#[derive(Debug)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub severity: WarningSeverity,
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let icon = match self.severity {
            WarningSeverity::Error => "❌",
            WarningSeverity::Warning => "⚠️ ",
            WarningSeverity::Info => "💡",
        };
        write!(f, "{} {}: {}", icon, self.field, self.message)?;
        if let Some(ref h) = self.hint {
            write!(f, "\n   ↳ {}", h)?;
        }
        Ok(())
    }
}

impl CodexConfig {
    /// Validate the config and return a list of warnings/errors.
    /// Returns `Err` with all messages joined if any severity is Error.
    pub fn validate(&self) -> Result<Vec<ConfigWarning>, String> {
        let mut warnings = Vec::new();

        // ── Corpus root ───
        if !self.corpus.root.exists() {
            warnings.push(ConfigWarning {
                field: "corpus.root".into(),
                message: format!("{} does not exist", self.corpus.root.display()),
                severity: WarningSeverity::Warning,
                hint: Some("Point corpus.root at the codex checkout or set CODEX_CORPUS_ROOT".into()),
            });
        } else if !self.corpus.standards_map_path().exists() {
            warnings.push(ConfigWarning {
                field: "corpus.standards_map".into(),
                message: "standards registry not found; every decision will be treated as open".into(),
                severity: WarningSeverity::Info,
                hint: None,
            });
        }

        // ── Threshold ───
        if self.matching.threshold.is_nan() || self.matching.threshold <= 0.0 {
            warnings.push(ConfigWarning {
                field: "matching.threshold".into(),
                message: format!("threshold {} must be positive", self.matching.threshold),
                severity: WarningSeverity::Error,
                hint: Some("A name-token hit scores 3, a keyword 2, a description word 1. Default: 2".into()),
            });
        }

        // ── Max topics ───
        if self.matching.max_topics == 0 {
            warnings.push(ConfigWarning {
                field: "matching.max_topics".into(),
                message: "max_topics is 0, so no topic could ever ground a PRD".into(),
                severity: WarningSeverity::Error,
                hint: Some("Set to e.g. 8".into()),
            });
        }

        // ── Wiki ───
        if let Some(ref base) = self.wiki.base_url {
            if url::Url::parse(base).is_err() {
                warnings.push(ConfigWarning {
                    field: "wiki.base_url".into(),
                    message: format!("'{}' is not a valid URL", base),
                    severity: WarningSeverity::Error,
                    hint: Some("Use e.g. 'https://wiki.example.com'".into()),
                });
            } else if !self.wiki.is_configured() {
                warnings.push(ConfigWarning {
                    field: "wiki".into(),
                    message: "base_url is set but space or token is missing; wiki delivery falls back to display".into(),
                    severity: WarningSeverity::Warning,
                    hint: Some("Set wiki.space and wiki.token (or CODEX_WIKI_TOKEN)".into()),
                });
            }
        }
        if self.output.default_sink == SinkKind::Wiki && !self.wiki.is_configured() {
            warnings.push(ConfigWarning {
                field: "output.default_sink".into(),
                message: "default sink is wiki but the wiki integration is not configured".into(),
                severity: WarningSeverity::Warning,
                hint: Some("Configure [wiki] or choose file, clipboard or display".into()),
            });
        }

        // ── Logging ───
        let logging_checks = [
            ("logging.format", self.logging.format.as_str(), &["pretty", "json"][..]),
            ("logging.level", self.logging.level.as_str(), &LOG_LEVELS[..]),
        ];
        for (field, value, allowed) in logging_checks {
            if !allowed.contains(&value) {
                warnings.push(ConfigWarning {
                    field: field.into(),
                    message: format!("'{value}' is not recognised, using the default"),
                    severity: WarningSeverity::Warning,
                    hint: Some(format!("One of: {}", allowed.join(", "))),
                });
            }
        }

        let errors: Vec<String> = warnings
            .iter()
            .filter(|w| w.severity == WarningSeverity::Error)
            .map(|w| format!("{}: {}", w.field, w.message))
            .collect();

        if !errors.is_empty() {
            return Err(format!("Configuration errors:\n  • {}", errors.join("\n  • ")));
        }

        Ok(warnings)
    }
}
