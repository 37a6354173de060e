use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use codex_config::{ConfigLoader, LOG_LEVELS, SinkKind};

mod generate;
mod links;
mod skills;
mod topics;

/// 📚 Codex — Engineering Codex tooling
#[derive(Parser)]
#[command(name = "codex", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to codex.toml config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level override (e.g. debug, info, warn, error)
    #[arg(short, long, global = true, value_parser = LOG_LEVELS)]
    log_level: Option<String>,

    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Suppress all log output (errors only)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a PRD from an Opportunity Brief
    Generate {
        /// Brief file path or http(s) URL (prompts for the brief when omitted)
        #[arg(short, long)]
        brief: Option<String>,
        /// Brief text given inline
        #[arg(long, conflicts_with = "brief")]
        text: Option<String>,
        /// Where to deliver the accepted PRD: file, clipboard, wiki, display
        #[arg(short, long)]
        sink: Option<SinkKind>,
        /// Accept the first draft without prompting
        #[arg(short, long)]
        yes: bool,
        /// Date recorded in the PRD metadata (default: today)
        #[arg(long)]
        date: Option<chrono::NaiveDate>,
    },
    /// Show the codex topics a text maps to
    Topics {
        /// Problem statement or any free text
        text: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate internal links in the codex markdown
    Links {
        /// Directory to scan, relative to the corpus root (default: whole corpus)
        dir: Option<PathBuf>,
    },
    /// Browse skill templates
    Skill {
        #[command(subcommand)]
        action: SkillAction,
    },
    /// Show current configuration
    Config {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Audit configuration and corpus layout
    Doctor,
    /// Show version and build info
    Version,
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum SkillAction {
    /// List available skills
    List,
    /// Show details of a skill
    Show { name: String },
}

impl Cli {
    pub async fn run(self) -> codex_core::Result<()> {
        // Load config first so we can use it for log format
        let config_loader = ConfigLoader::load(self.config.as_deref())?;
        let config = config_loader.get();

        // Resolve log level: --verbose > --quiet > --log-level > config
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            self.log_level
                .as_deref()
                .unwrap_or_else(|| config.logging.effective_level())
        };

        // Logs go to stderr; stdout carries the PRD when displayed.
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
        if config.logging.format == "json" {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .with_target(true)
                .init();
        } else {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }

        match self.command {
            Commands::Generate {
                brief,
                text,
                sink,
                yes,
                date,
            } => {
                let options = generate::GenerateOptions {
                    brief,
                    text,
                    sink,
                    yes,
                    date,
                };
                generate::cmd_generate(config, options).await
            }
            Commands::Topics { text, json } => topics::cmd_topics(config, &text, json),
            Commands::Links { dir } => links::cmd_links(config, dir),
            Commands::Skill { action } => skills::cmd_skill(config, action),
            Commands::Config { json } => Self::cmd_config(config, json),
            Commands::Doctor => Self::cmd_doctor(config, config_loader.path()),
            Commands::Version => Self::cmd_version(),
            Commands::Completions { shell } => Self::cmd_completions(shell),
        }
    }

    fn cmd_config(config: codex_config::CodexConfig, json: bool) -> codex_core::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(&config)?);
        } else {
            println!(
                "{}",
                toml::to_string_pretty(&config).map_err(|e| codex_core::CodexError::Config(e.to_string()))?
            );
        }
        Ok(())
    }

    fn cmd_doctor(config: codex_config::CodexConfig, config_path: &std::path::Path) -> codex_core::Result<()> {
        println!("🩺 Codex Doctor — Configuration Audit");
        println!();
        if config_path.exists() {
            println!("  Config: {}", config_path.display());
        } else {
            println!("  Config: {} (not found, using defaults)", config_path.display());
        }
        println!();

        let warnings = match config.validate() {
            Ok(w) => w,
            Err(e) => {
                println!("{e}");
                return Ok(());
            }
        };

        let mut warn_count = 0;
        let mut info_count = 0;
        for w in &warnings {
            println!("  {w}");
            match w.severity {
                codex_config::WarningSeverity::Warning => warn_count += 1,
                codex_config::WarningSeverity::Info => info_count += 1,
                _ => {}
            }
        }

        // Corpus checks beyond config validation
        let mut topic_count = 0;
        match codex_corpus::Corpus::open(&config.corpus.root, &config.matching.aliases) {
            Ok(corpus) => {
                topic_count = corpus.index.len();
                if corpus.index.is_empty() {
                    println!("  ⚠️  corpus: no facets/ or experiences/ topics under {}", config.corpus.root.display());
                    warn_count += 1;
                }
            }
            Err(e) => {
                println!("  ❌ corpus: {e}");
                warn_count += 1;
            }
        }

        println!();
        println!(
            "  {topic_count} topics indexed, {warn_count} warning(s), {info_count} suggestion(s)"
        );
        if warn_count == 0 {
            println!("  ✅ Ready to generate PRDs");
        }
        Ok(())
    }

    fn cmd_version() -> codex_core::Result<()> {
        println!("📚 Codex v{}", env!("CARGO_PKG_VERSION"));
        println!("   Rust edition: 2024");
        println!("   Target: {}", std::env::consts::ARCH);
        println!("   OS: {}", std::env::consts::OS);
        #[cfg(debug_assertions)]
        println!("   Profile: debug");
        #[cfg(not(debug_assertions))]
        println!("   Profile: release");
        Ok(())
    }

    fn cmd_completions(shell: Shell) -> codex_core::Result<()> {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "codex", &mut std::io::stdout());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_generate_flags() {
        let cli = Cli::try_parse_from([
            "codex", "generate", "--brief", "brief.md", "--sink", "external-wiki-page", "--yes", "--date", "2026-10-16",
        ])
        .unwrap();
        match cli.command {
            Commands::Generate {
                brief, sink, yes, date, ..
            } => {
                assert_eq!(brief.as_deref(), Some("brief.md"));
                assert_eq!(sink, Some(SinkKind::Wiki));
                assert!(yes);
                assert_eq!(date, chrono::NaiveDate::from_ymd_opt(2026, 10, 16));
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn brief_and_text_conflict() {
        assert!(Cli::try_parse_from(["codex", "generate", "--brief", "a.md", "--text", "x"]).is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["codex", "topics", "feature flags", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Topics { .. }));
    }

    #[test]
    fn log_level_must_be_known() {
        assert!(Cli::try_parse_from(["codex", "--log-level", "loud", "version"]).is_err());
        let cli = Cli::try_parse_from(["codex", "--log-level", "warn", "version"]).unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("warn"));
    }
}
