//! Internal link validation across the corpus.
//!
//! Checks relative file links, directory links and `#anchor` references
//! (GitHub-style heading slugs). External links are not fetched.

use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;
use tracing::debug;

use codex_core::{CodexError, Result};

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]*)\]\(([^)]+)\)").expect("valid link regex"));
static HEADING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#{1,6}\s+(.+)$").expect("valid heading regex"));
static STRONG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("valid regex"));
static CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`(.+?)`").expect("valid regex"));
static INLINE_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("valid regex"));
static NON_SLUG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").expect("valid regex"));
static SPACES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

const EXTERNAL_PREFIXES: [&str; 3] = ["http://", "https://", "mailto:"];

/// One broken link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkIssue {
    /// File containing the link, relative to the corpus root.
    pub file: String,
    pub line: usize,
    pub link: String,
    pub issue: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LinkReport {
    pub files_scanned: usize,
    pub links_checked: usize,
    pub issues: Vec<LinkIssue>,
}

impl LinkReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// GitHub-style anchor slug for a heading.
pub fn slugify_heading(heading: &str) -> String {
    let h = heading.trim();
    let h = STRONG.replace_all(h, "$1");
    let h = EMPHASIS.replace_all(&h, "$1");
    let h = CODE.replace_all(&h, "$1");
    let h = INLINE_LINK.replace_all(&h, "$1");
    let h = h.to_lowercase();
    let h = NON_SLUG.replace_all(&h, "");
    let h = SPACES.replace_all(&h, "-");
    h.trim_matches('-').to_string()
}

/// Anchors defined by the headings of a markdown text. Repeated headings get
/// `-1`, `-2`, ... suffixes the way GitHub renders them.
pub fn anchors(content: &str) -> BTreeSet<String> {
    let mut out = BTreeSet::new();
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut in_fence = false;
    for line in content.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
            continue;
        }
        if in_fence {
            continue;
        }
        if let Some(caps) = HEADING_PATTERN.captures(line) {
            let slug = slugify_heading(&caps[1]);
            if slug.is_empty() {
                continue;
            }
            let n = seen.entry(slug.clone()).or_insert(0);
            if *n == 0 {
                out.insert(slug);
            } else {
                out.insert(format!("{slug}-{n}"));
            }
            *n += 1;
        }
    }
    out
}

/// Validates links of markdown files below a corpus root.
pub struct LinkValidator {
    root: PathBuf,
    anchor_cache: HashMap<PathBuf, BTreeSet<String>>,
}

impl LinkValidator {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            anchor_cache: HashMap::new(),
        }
    }

    /// Validate every `.md` file under `scan_dir` (the whole root when `None`).
    pub fn validate_tree(&mut self, scan_dir: Option<&Path>) -> Result<LinkReport> {
        let dir = match scan_dir {
            Some(d) if d.is_absolute() => d.to_path_buf(),
            Some(d) => self.root.join(d),
            None => self.root.clone(),
        };
        if !dir.exists() {
            return Err(CodexError::Corpus(format!("directory '{}' not found", dir.display())));
        }

        let mut files = Vec::new();
        collect_markdown(&dir, &mut files)?;
        files.sort();

        let mut report = LinkReport::default();
        for file in &files {
            let Ok(content) = std::fs::read_to_string(file) else {
                debug!(?file, "unreadable file skipped");
                continue;
            };
            report.files_scanned += 1;
            report.links_checked += LINK_PATTERN
                .captures_iter(&content)
                .filter(|c| !is_external(&c[2]))
                .count();
            report.issues.extend(self.validate_file(file, &content));
        }
        Ok(report)
    }

    /// Validate the links of one file.
    pub fn validate_file(&mut self, file: &Path, content: &str) -> Vec<LinkIssue> {
        let mut issues = Vec::new();
        let rel = self.relative(file);
        let parent = file.parent().unwrap_or(Path::new("."));
        let mut in_fence = false;

        for (idx, line) in content.lines().enumerate() {
            if line.trim_start().starts_with("```") {
                in_fence = !in_fence;
                continue;
            }
            if in_fence {
                continue;
            }

            for caps in LINK_PATTERN.captures_iter(line) {
                let target = caps[2].trim();
                if is_external(target) {
                    continue;
                }
                let mut issue = |text: String| {
                    issues.push(LinkIssue {
                        file: rel.clone(),
                        line: idx + 1,
                        link: target.to_string(),
                        issue: text,
                    })
                };

                if let Some(anchor) = target.strip_prefix('#') {
                    if !anchors(content).contains(anchor) {
                        issue("Anchor not found in file".into());
                    }
                    continue;
                }

                let (file_part, anchor_part) = match target.split_once('#') {
                    Some((f, a)) => (f, Some(a)),
                    None => (target, None),
                };
                let resolved = normalize(&parent.join(file_part));

                if !resolved.exists() {
                    let kind = if file_part.ends_with('/') { "Directory" } else { "File" };
                    issue(format!("{kind} not found{}", suggestion(&resolved)));
                    continue;
                }

                if let Some(anchor) = anchor_part {
                    if resolved.is_file() && !self.anchors_of(&resolved).contains(anchor) {
                        issue(format!("Anchor `#{anchor}` not found in target file"));
                    }
                }
            }
        }
        issues
    }

    fn anchors_of(&mut self, path: &Path) -> &BTreeSet<String> {
        self.anchor_cache.entry(path.to_path_buf()).or_insert_with(|| {
            std::fs::read_to_string(path)
                .map(|c| anchors(&c))
                .unwrap_or_default()
        })
    }

    fn relative(&self, file: &Path) -> String {
        file.strip_prefix(&self.root)
            .unwrap_or(file)
            .to_string_lossy()
            .replace('\\', "/")
    }
}

fn is_external(target: &str) -> bool {
    EXTERNAL_PREFIXES.iter().any(|p| target.starts_with(p))
}

fn collect_markdown(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    if dir.is_file() {
        if dir.extension().is_some_and(|e| e == "md") {
            out.push(dir.to_path_buf());
        }
        return Ok(());
    }
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.file_name().is_some_and(|n| n == ".git") {
            continue;
        }
        if path.is_dir() {
            collect_markdown(&path, out)?;
        } else if path.extension().is_some_and(|e| e == "md") {
            out.push(path);
        }
    }
    Ok(())
}

/// Lexically resolve `.` and `..` components.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for comp in path.components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// " (did you mean `x`?)" when a sibling name overlaps the missing one.
fn suggestion(missing: &Path) -> String {
    let (Some(parent), Some(name)) = (missing.parent(), missing.file_name()) else {
        return String::new();
    };
    let name = name.to_string_lossy();
    let Ok(entries) = std::fs::read_dir(parent) else {
        return String::new();
    };
    let mut siblings: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    siblings.sort();
    siblings
        .into_iter()
        .find(|sib| sib.contains(name.as_ref()) || name.contains(sib.as_str()))
        .map(|sib| format!(" (did you mean `{sib}`?)"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_slugs() {
        assert_eq!(slugify_heading("Stale **Toggles**"), "stale-toggles");
        assert_eq!(slugify_heading("Use `flagd` (v2)!"), "use-flagd-v2");
        assert_eq!(slugify_heading("[Linked](x.md) Heading"), "linked-heading");
    }

    #[test]
    fn duplicate_headings_get_suffixes() {
        let a = anchors("# Notes\n## Notes\n```\n# not-a-heading\n```\n");
        assert!(a.contains("notes"));
        assert!(a.contains("notes-1"));
        assert!(!a.contains("not-a-heading"));
    }

    #[test]
    fn normalize_parent_dirs() {
        assert_eq!(normalize(Path::new("/a/b/../c/./d.md")), PathBuf::from("/a/c/d.md"));
    }

    #[test]
    fn validates_links_in_tree() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        std::fs::create_dir_all(root.join("facets/caching")).unwrap();
        std::fs::write(root.join("facets/caching/options.md"), "# Options\n## Redis\n").unwrap();
        std::fs::write(
            root.join("facets/caching/README.md"),
            "# Caching\n\n\
             [ok](options.md#redis)\n\
             [bad anchor](options.md#memcached)\n\
             [missing](options)\n\
             [dir](../caching/)\n\
             [self](#caching)\n\
             [self missing](#nope)\n\
             [web](https://example.com/missing)\n\
             ```\n[in code](nowhere.md)\n```\n",
        )
        .unwrap();

        let mut v = LinkValidator::new(root);
        let report = v.validate_tree(None).unwrap();
        assert_eq!(report.files_scanned, 2);
        assert_eq!(report.links_checked, 7);

        let issues: Vec<_> = report.issues.iter().map(|i| (i.line, i.issue.as_str())).collect();
        assert_eq!(
            issues,
            vec![
                (4, "Anchor `#memcached` not found in target file"),
                (5, "File not found (did you mean `options.md`?)"),
                (8, "Anchor not found in file"),
            ]
        );
        assert_eq!(report.issues[0].file, "facets/caching/README.md");
        assert!(!report.is_clean());
    }

    #[test]
    fn missing_scan_dir_errors() {
        let dir = tempfile::tempdir().unwrap();
        let mut v = LinkValidator::new(dir.path());
        assert!(v.validate_tree(Some(Path::new("nowhere"))).is_err());
    }
}
