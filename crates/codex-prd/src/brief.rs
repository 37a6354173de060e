use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, info};

use codex_core::{CodexError, Result, slugify};
use codex_corpus::markdown;

/// The workflow's input. Lives only for one PRD-generation run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpportunityBrief {
    /// Feature name, when the brief states one.
    pub title: Option<String>,
    #[serde(alias = "problemStatement")]
    pub problem_statement: String,
    pub hypothesis: String,
    #[serde(alias = "roiProjection")]
    pub roi_projection: String,
    #[serde(alias = "targetUsers")]
    pub target_users: String,
    #[serde(alias = "strategicAlignment")]
    pub strategic_alignment: String,
    /// Where the brief was loaded from (file path, URL or "inline").
    #[serde(skip)]
    pub origin: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Problem,
    Hypothesis,
    Roi,
    TargetUsers,
    Strategy,
}

impl Field {
    /// Classify a heading or `Key:` label.
    fn from_label(label: &str) -> Option<Field> {
        let l = label.trim().trim_matches('*').trim().to_lowercase();
        let has_word = |w: &str| l.split(|c: char| !c.is_alphanumeric()).any(|t| t == w);
        if has_word("roi") || l.contains("return on investment") || l.contains("projection") {
            Some(Field::Roi)
        } else if l.contains("hypothes") {
            Some(Field::Hypothesis)
        } else if l.contains("strateg") || l.contains("alignment") {
            Some(Field::Strategy)
        } else if l.contains("target user") || l == "users" || l.contains("audience") || l.contains("persona") {
            Some(Field::TargetUsers)
        } else if l.contains("problem") {
            Some(Field::Problem)
        } else {
            None
        }
    }
}

impl OpportunityBrief {
    /// Parse a brief from free-form text.
    ///
    /// Accepts a JSON object with the field names, markdown with one heading
    /// per field, `Field: value` lines, or plain prose (taken as the problem
    /// statement). Fails only when nothing usable is present.
    pub fn parse(text: &str) -> std::result::Result<Self, String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err("brief is empty".into());
        }

        if trimmed.starts_with('{') {
            return serde_json::from_str::<OpportunityBrief>(trimmed)
                .map_err(|e| format!("invalid JSON brief: {e}"))
                .and_then(|b| {
                    if b.problem_statement.trim().is_empty() {
                        Err("JSON brief has no problem_statement".into())
                    } else {
                        Ok(b)
                    }
                });
        }

        let mut brief = OpportunityBrief::default();
        let mut found_any = false;

        // `Field: value` lines.
        for line in trimmed.lines() {
            let line = line.trim().trim_start_matches(['-', '*', ' ']);
            let Some((label, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim().trim_start_matches('*').trim();
            if value.is_empty() || label.len() > 40 {
                continue;
            }
            if let Some(field) = Field::from_label(label) {
                if brief.get(field).is_empty() {
                    brief.set(field, value.to_string());
                    found_any = true;
                }
            }
        }

        // One heading per field; deeper headings belong to the field above them.
        let sections = markdown::sections(trimmed);
        let mut current: Option<(Field, u8)> = None;
        let mut collected: Vec<(Field, Vec<String>)> = Vec::new();
        for section in &sections {
            if section.level == 1 && brief.title.is_none() {
                brief.title = feature_title(&section.title);
            }
            if let Some((_, level)) = current {
                if section.level <= level {
                    current = None;
                }
            }
            if current.is_none() {
                if let Some(field) = Field::from_label(&section.title) {
                    current = Some((field, section.level));
                    collected.push((field, Vec::new()));
                }
            }
            if let (Some(_), Some((_, lines))) = (current, collected.last_mut()) {
                lines.extend(section.paragraphs.iter().filter(|p| !is_label_line(p)).cloned());
                lines.extend(section.items.iter().map(|i| format!("- {i}")));
            }
        }
        for (field, lines) in collected {
            let text = lines.join("\n");
            if !text.trim().is_empty() && brief.get(field).is_empty() {
                brief.set(field, text);
                found_any = true;
            }
        }

        if !found_any {
            // Plain prose: the whole text is the problem statement.
            let body: Vec<String> = sections
                .iter()
                .flat_map(|s| s.paragraphs.iter().chain(s.items.iter()))
                .cloned()
                .collect();
            brief.problem_statement = if body.is_empty() {
                trimmed.to_string()
            } else {
                body.join("\n")
            };
        }

        if brief.problem_statement.trim().is_empty() {
            return Err("brief has no problem statement".into());
        }
        Ok(brief)
    }

    fn get(&self, field: Field) -> &str {
        match field {
            Field::Problem => &self.problem_statement,
            Field::Hypothesis => &self.hypothesis,
            Field::Roi => &self.roi_projection,
            Field::TargetUsers => &self.target_users,
            Field::Strategy => &self.strategic_alignment,
        }
    }

    fn set(&mut self, field: Field, value: String) {
        match field {
            Field::Problem => self.problem_statement = value,
            Field::Hypothesis => self.hypothesis = value,
            Field::Roi => self.roi_projection = value,
            Field::TargetUsers => self.target_users = value,
            Field::Strategy => self.strategic_alignment = value,
        }
    }

    /// Text the topic mapper scores: problem statement plus hypothesis.
    pub fn matching_text(&self) -> String {
        format!("{}\n{}", self.problem_statement, self.hypothesis)
    }

    /// Feature name: the stated title, else the first words of the problem.
    pub fn feature_name(&self) -> String {
        if let Some(ref t) = self.title {
            if !t.trim().is_empty() {
                return t.trim().to_string();
            }
        }
        let words: Vec<&str> = self.problem_statement.split_whitespace().take(6).collect();
        if words.is_empty() {
            "Untitled Feature".into()
        } else {
            words.join(" ").trim_end_matches(['.', ',', ';', ':']).to_string()
        }
    }

    /// Slug used for output file names.
    pub fn slug(&self) -> String {
        let s = slugify(&self.feature_name());
        if s.is_empty() { "untitled".into() } else { s }
    }

    /// Target user groups, one per list item, line, or comma/semicolon-separated entry.
    pub fn target_user_groups(&self) -> Vec<String> {
        self.target_users
            .lines()
            .flat_map(|l| l.split([',', ';']))
            .map(|g| g.trim().trim_start_matches(['-', '*']).trim().trim_end_matches('.').to_string())
            .filter(|g| !g.is_empty())
            .collect()
    }
}

/// `Opportunity Brief: Org Switcher` → `Org Switcher`. A bare
/// "Opportunity Brief" heading names nothing.
fn feature_title(heading: &str) -> Option<String> {
    let h = heading.trim();
    let lower = h.to_lowercase();
    let rest = match lower.strip_prefix("opportunity brief") {
        Some(_) => h
            .get("opportunity brief".len()..)
            .unwrap_or("")
            .trim_start_matches([':', '-', ' ', '—'])
            .trim(),
        None => h,
    };
    (!rest.is_empty()).then(|| rest.to_string())
}

fn is_label_line(paragraph: &str) -> bool {
    paragraph
        .split_once(':')
        .is_some_and(|(label, _)| label.len() <= 40 && Field::from_label(label).is_some())
}

/// Where a brief comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BriefSource {
    File(PathBuf),
    Url(String),
    Text(String),
}

impl BriefSource {
    /// Interpret a CLI reference: `http(s)://` is a URL, anything else a path.
    pub fn from_reference(reference: &str) -> Self {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            BriefSource::Url(reference.to_string())
        } else {
            BriefSource::File(PathBuf::from(reference))
        }
    }
}

impl fmt::Display for BriefSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BriefSource::File(p) => write!(f, "{}", p.display()),
            BriefSource::Url(u) => f.write_str(u),
            BriefSource::Text(_) => f.write_str("inline"),
        }
    }
}

/// Load and parse a brief. Every failure is `BriefUnloadable`, so the caller
/// can re-prompt for the content directly.
pub async fn load(source: &BriefSource) -> Result<OpportunityBrief> {
    let origin = source.to_string();
    let unloadable = |reason: String| CodexError::BriefUnloadable {
        origin: origin.clone(),
        reason,
    };

    let text = match source {
        BriefSource::Text(t) => t.clone(),
        BriefSource::File(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(|e| unloadable(e.to_string()))?,
        BriefSource::Url(url) => {
            debug!(%url, "fetching brief");
            let resp = reqwest::get(url.as_str())
                .await
                .map_err(|e| unloadable(e.to_string()))?;
            if !resp.status().is_success() {
                return Err(unloadable(format!("server returned {}", resp.status())));
            }
            resp.text().await.map_err(|e| unloadable(e.to_string()))?
        }
    };

    let mut brief = OpportunityBrief::parse(&text).map_err(unloadable)?;
    brief.origin = Some(origin.clone());
    info!(origin = %origin, feature = %brief.feature_name(), "loaded opportunity brief");
    Ok(brief)
}
