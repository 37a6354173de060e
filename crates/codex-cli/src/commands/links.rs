use std::path::PathBuf;

use codex_config::CodexConfig;
use codex_core::CodexError;
use codex_corpus::LinkValidator;

pub(super) fn cmd_links(config: CodexConfig, dir: Option<PathBuf>) -> codex_core::Result<()> {
    let root = &config.corpus.root;
    let mut validator = LinkValidator::new(root);
    let report = validator.validate_tree(dir.as_deref())?;

    println!(
        "Scanned {} files, checked {} internal links.",
        report.files_scanned, report.links_checked
    );
    if report.is_clean() {
        println!("✅ All internal links are valid.");
        return Ok(());
    }

    println!("\n\x1b[1mBroken links ({}):\x1b[0m\n", report.issues.len());
    for issue in &report.issues {
        println!("  \x1b[90m{}:{}\x1b[0m  {}", issue.file, issue.line, issue.link);
        println!("    \x1b[31m{}\x1b[0m", issue.issue);
    }
    Err(CodexError::Corpus(format!(
        "{} broken link(s) under {}",
        report.issues.len(),
        root.display()
    )))
}
