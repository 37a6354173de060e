use serde::Serialize;
use std::path::{Path, PathBuf};

use codex_core::{CodexError, Result};
use codex_corpus::markdown;

/// One `## Phase N: Title` step of a skill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkillPhase {
    pub number: u32,
    pub title: String,
}

/// A skill definition parsed from a SKILL.md file.
#[derive(Debug, Clone, Serialize)]
pub struct SkillDefinition {
    /// Skill name (from frontmatter).
    pub name: String,
    /// Short description.
    pub description: String,
    pub version: String,
    pub tags: Vec<String>,
    pub author: Option<String>,
    /// Phases in document order.
    pub phases: Vec<SkillPhase>,
    /// The Markdown body after the frontmatter.
    #[serde(skip)]
    pub body: String,
    #[serde(skip)]
    pub file_path: PathBuf,
}

fn default_version() -> String {
    "1.0.0".into()
}

impl SkillDefinition {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| CodexError::Skill(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content, path.to_path_buf())
    }

    /// Parse SKILL.md content.
    pub fn parse(content: &str, file_path: PathBuf) -> Result<Self> {
        let (frontmatter, body) = split_frontmatter(content)?;

        let mut def = parse_frontmatter(&frontmatter);
        def.phases = parse_phases(&body);
        def.body = body;
        def.file_path = file_path;

        if def.name.is_empty() {
            return Err(CodexError::Skill("skill name is empty".into()));
        }
        if def.description.is_empty() {
            return Err(CodexError::Skill(format!(
                "skill '{}' has no description",
                def.name
            )));
        }

        Ok(def)
    }
}

/// Split a SKILL.md file into YAML frontmatter and Markdown body.
fn split_frontmatter(content: &str) -> Result<(String, String)> {
    let trimmed = content.trim();
    let Some(after_first) = trimmed.strip_prefix("---") else {
        return Err(CodexError::Skill(
            "SKILL.md must start with YAML frontmatter (---)".into(),
        ));
    };

    let end_pos = after_first
        .find("\n---")
        .ok_or_else(|| CodexError::Skill("SKILL.md: missing closing --- for frontmatter".into()))?;

    let frontmatter = after_first[..end_pos].trim().to_string();
    let body = after_first[end_pos + 4..].trim().to_string();
    Ok((frontmatter, body))
}

/// Simple `key: value` frontmatter parsing. Unknown keys are ignored.
fn parse_frontmatter(yaml: &str) -> SkillDefinition {
    let mut def = SkillDefinition {
        name: String::new(),
        description: String::new(),
        version: default_version(),
        tags: Vec::new(),
        author: None,
        phases: Vec::new(),
        body: String::new(),
        file_path: PathBuf::new(),
    };

    for line in yaml.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "name" => def.name = unquote(value),
            "description" => def.description = unquote(value),
            "version" => def.version = unquote(value),
            "author" => def.author = Some(unquote(value)),
            "tags" => {
                let inner = value.trim_start_matches('[').trim_end_matches(']');
                def.tags = inner
                    .split(',')
                    .map(|t| unquote(t.trim()))
                    .filter(|t| !t.is_empty())
                    .collect();
            }
            _ => {}
        }
    }
    def
}

/// `Phase 3: Extract Decisions` / `Phase 3 - Extract Decisions` headings.
fn parse_phases(body: &str) -> Vec<SkillPhase> {
    markdown::sections(body)
        .into_iter()
        .filter_map(|s| {
            let rest = s.title.strip_prefix("Phase ")?;
            let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
            let number = digits.parse().ok()?;
            let title = rest[digits.len()..]
                .trim_start_matches([':', '-', '.', ' ', '—'])
                .trim()
                .to_string();
            Some(SkillPhase { number, title })
        })
        .collect()
}

fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2
        && ((s.starts_with('"') && s.ends_with('"')) || (s.starts_with('\'') && s.ends_with('\'')))
    {
        s[1..s.len() - 1].to_string()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRD_SKILL: &str = r#"---
name: generate-prd
description: "Generate a PRD from an Opportunity Brief"
version: 2.1.0
tags: [product, prd]
author: Product Engineering
---

# Generate PRD

## Phase 1: Gather Input
Ask for the brief.

## Phase 2 - Identify Technical Scope
Use the topic map.

## Notes
Not a phase.
"#;

    #[test]
    fn parse_skill_with_phases() {
        let def = SkillDefinition::parse(PRD_SKILL, PathBuf::from("/skills/generate-prd/SKILL.md")).unwrap();
        assert_eq!(def.name, "generate-prd");
        assert_eq!(def.description, "Generate a PRD from an Opportunity Brief");
        assert_eq!(def.version, "2.1.0");
        assert_eq!(def.tags, vec!["product", "prd"]);
        assert_eq!(def.author.as_deref(), Some("Product Engineering"));
        assert_eq!(
            def.phases,
            vec![
                SkillPhase { number: 1, title: "Gather Input".into() },
                SkillPhase { number: 2, title: "Identify Technical Scope".into() },
            ]
        );
        assert!(def.body.starts_with("# Generate PRD"));
    }

    #[test]
    fn minimal_skill_defaults() {
        let def = SkillDefinition::parse("---\nname: m\ndescription: d\n---\n\nBody.", PathBuf::new()).unwrap();
        assert_eq!(def.version, "1.0.0");
        assert!(def.phases.is_empty());
        assert_eq!(def.body, "Body.");
    }

    #[test]
    fn missing_frontmatter_errors() {
        assert!(SkillDefinition::parse("# No frontmatter", PathBuf::new()).is_err());
        assert!(SkillDefinition::parse("---\nname: x\n", PathBuf::new()).is_err());
    }

    #[test]
    fn missing_name_or_description_errors() {
        assert!(SkillDefinition::parse("---\ndescription: d\n---\nB", PathBuf::new()).is_err());
        assert!(SkillDefinition::parse("---\nname: n\n---\nB", PathBuf::new()).is_err());
    }

    #[test]
    fn unquote_single_char_is_kept() {
        assert_eq!(unquote("\""), "\"");
        assert_eq!(unquote("'x'"), "x");
    }
}
