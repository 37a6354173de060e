//! # codex-config
//!
//! Configuration for the Codex tooling. Reads `codex.toml`, then applies
//! environment variable overrides. The file only locates the corpus, tunes
//! topic matching and configures output sinks; the PRD workflow itself keeps
//! no state between runs.

pub mod loader;
pub mod schema;

pub use loader::ConfigLoader;
pub use schema::CodexConfig;
pub use schema::{
    ComposeConfig, CorpusConfig, LoggingConfig, MatchingConfig, OutputConfig, WikiConfig,
};
pub use schema::{ConfigWarning, LOG_LEVELS, SinkKind, WarningSeverity};
