//! # codex-cli
//!
//! Command-line interface for the Engineering Codex tooling.
//!
//! ## Commands
//!
//! - `codex generate` — Turn an Opportunity Brief into a reviewed PRD
//! - `codex topics` — Show which codex topics a text maps to
//! - `codex links` — Validate internal markdown links in the codex
//! - `codex skill` — List and show skill templates
//! - `codex config` — Show the effective configuration
//! - `codex doctor` — Audit the configuration

pub mod commands;

pub use commands::Cli;
