//! # codex-skills
//!
//! The codex ships assistant "skills": directories containing a `SKILL.md`
//! file (Markdown with YAML frontmatter) that walk an assistant through a
//! multi-phase workflow such as `generate-prd`.
//!
//! ## SKILL.md Format
//!
//! ```markdown
//! ---
//! name: generate-prd
//! description: Turn an Opportunity Brief into a PRD
//! version: 1.0.0
//! tags: [product, prd]
//! ---
//!
//! # Generate PRD
//!
//! ## Phase 1: Gather the Opportunity Brief
//! ...
//! ## Phase 2: Identify Technical Scope
//! ...
//! ```
//!
//! This crate only catalogs skills; the `generate-prd` workflow itself is
//! implemented natively by `codex-prd`.

pub mod definition;
pub mod registry;

pub use definition::{SkillDefinition, SkillPhase};
pub use registry::SkillRegistry;
