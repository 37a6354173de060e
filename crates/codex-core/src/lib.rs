//! # codex-core
//!
//! Shared vocabulary for the Engineering Codex tooling: the unified error
//! type and the document addressing types (topics, views, document
//! references) used by every other crate in the workspace.

pub mod error;
pub mod types;

pub use error::{CodexError, Result};
pub use types::*;
