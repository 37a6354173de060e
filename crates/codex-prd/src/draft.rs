use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use codex_core::slugify;

/// PRD sections, in the only order they are ever rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Section {
    Metadata,
    ProblemAlignment,
    ExpectedOutcomes,
    SuccessMetrics,
    UserStories,
    TechnicalRequirements,
    Risks,
    SignificantDecisions,
    DesignArtifacts,
    Timeline,
    OpenQuestions,
    References,
}

impl Section {
    pub const ALL: [Section; 12] = [
        Section::Metadata,
        Section::ProblemAlignment,
        Section::ExpectedOutcomes,
        Section::SuccessMetrics,
        Section::UserStories,
        Section::TechnicalRequirements,
        Section::Risks,
        Section::SignificantDecisions,
        Section::DesignArtifacts,
        Section::Timeline,
        Section::OpenQuestions,
        Section::References,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Section::Metadata => "Metadata",
            Section::ProblemAlignment => "Problem Alignment",
            Section::ExpectedOutcomes => "Expected Outcomes",
            Section::SuccessMetrics => "Success Metrics",
            Section::UserStories => "User Stories",
            Section::TechnicalRequirements => "Technical Requirements",
            Section::Risks => "Risks",
            Section::SignificantDecisions => "Significant Decisions",
            Section::DesignArtifacts => "Design Artifacts",
            Section::Timeline => "Timeline",
            Section::OpenQuestions => "Open Questions",
            Section::References => "References",
        }
    }

    /// Rendered in place of empty content.
    pub fn placeholder(self) -> &'static str {
        match self {
            Section::Metadata => "_No metadata recorded._",
            Section::ProblemAlignment => "_No problem statement provided._",
            Section::ExpectedOutcomes => "_No expected outcomes stated in the brief._",
            Section::SuccessMetrics => {
                "_No success metrics found in the referenced documentation. Define them with the team._"
            }
            Section::UserStories => "_No target users given in the brief. Add user stories during review._",
            Section::TechnicalRequirements => {
                "_No technical requirements derived from the referenced documentation._"
            }
            Section::Risks => "_No risks identified._",
            Section::SignificantDecisions => "_No significant decisions identified._",
            Section::DesignArtifacts => "_To be added: wireframes, flows and diagrams._",
            Section::Timeline => "_To be defined with the delivery team._",
            Section::OpenQuestions => "_No open questions._",
            Section::References => "_No reference documents were consulted._",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

impl FromStr for Section {
    type Err = String;

    /// Accepts the title in any case or as a slug ("risks", "open-questions"),
    /// or the 1-based position.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = slugify(s);
        if let Ok(n) = key.parse::<usize>() {
            return n
                .checked_sub(1)
                .and_then(|i| Section::ALL.get(i).copied())
                .ok_or_else(|| format!("no section number {n}"));
        }
        Section::ALL
            .into_iter()
            .find(|sec| slugify(sec.title()) == key)
            .ok_or_else(|| format!("unknown section '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackMode {
    Replace,
    Append,
}

/// A human's change to one section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    pub section: Section,
    pub text: String,
    pub mode: FeedbackMode,
}

impl Feedback {
    pub fn replace(section: Section, text: impl Into<String>) -> Self {
        Self {
            section,
            text: text.into(),
            mode: FeedbackMode::Replace,
        }
    }

    pub fn append(section: Section, text: impl Into<String>) -> Self {
        Self {
            section,
            text: text.into(),
            mode: FeedbackMode::Append,
        }
    }
}

/// The PRD under construction: a title and the twelve sections, always all
/// present and always in [`Section::ALL`] order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrdDraft {
    title: String,
    sections: Vec<(Section, String)>,
}

impl PrdDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            sections: Section::ALL.iter().map(|s| (*s, String::new())).collect(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Raw content of a section; empty when it renders as a placeholder.
    pub fn section(&self, section: Section) -> &str {
        self.sections
            .iter()
            .find(|(s, _)| *s == section)
            .map(|(_, c)| c.as_str())
            .unwrap_or_default()
    }

    /// Content as rendered: the placeholder when empty.
    pub fn rendered_section(&self, section: Section) -> &str {
        let content = self.section(section);
        if content.trim().is_empty() {
            section.placeholder()
        } else {
            content
        }
    }

    pub fn section_order(&self) -> Vec<Section> {
        self.sections.iter().map(|(s, _)| *s).collect()
    }

    pub fn set(&mut self, section: Section, content: impl Into<String>) {
        if let Some((_, c)) = self.sections.iter_mut().find(|(s, _)| *s == section) {
            *c = content.into();
        }
    }

    pub fn apply(&mut self, feedback: &Feedback) {
        match feedback.mode {
            FeedbackMode::Replace => self.set(feedback.section, feedback.text.clone()),
            FeedbackMode::Append => {
                let existing = self.section(feedback.section).trim_end();
                let merged = if existing.is_empty() {
                    feedback.text.clone()
                } else {
                    format!("{existing}\n\n{}", feedback.text)
                };
                self.set(feedback.section, merged);
            }
        }
    }

    /// Markdown rendering: `# PRD: <title>` followed by numbered sections.
    pub fn render(&self) -> String {
        let mut out = format!("# PRD: {}\n", self.title);
        for (i, (section, _)) in self.sections.iter().enumerate() {
            out.push_str(&format!(
                "\n## {}. {}\n\n{}\n",
                i + 1,
                section.title(),
                self.rendered_section(*section).trim_end()
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_draft_has_every_section_in_order() {
        let d = PrdDraft::new("Org Switcher");
        assert_eq!(d.section_order(), Section::ALL.to_vec());
        let rendered = d.render();
        assert!(rendered.starts_with("# PRD: Org Switcher\n"));
        assert!(rendered.contains("## 7. Risks\n\n_No risks identified._\n"));
        assert!(rendered.contains("## 12. References\n"));
    }

    #[test]
    fn feedback_replace_and_append() {
        let mut d = PrdDraft::new("x");
        d.apply(&Feedback::append(Section::Timeline, "Q3 beta"));
        assert_eq!(d.section(Section::Timeline), "Q3 beta");
        d.apply(&Feedback::append(Section::Timeline, "Q4 GA"));
        assert_eq!(d.section(Section::Timeline), "Q3 beta\n\nQ4 GA");
        d.apply(&Feedback::replace(Section::Timeline, "TBD"));
        assert_eq!(d.section(Section::Timeline), "TBD");
        d.apply(&Feedback::replace(Section::Timeline, ""));
        assert_eq!(d.rendered_section(Section::Timeline), Section::Timeline.placeholder());
        assert_eq!(d.section_order(), Section::ALL.to_vec());
    }

    #[test]
    fn section_from_str() {
        assert_eq!("Open Questions".parse::<Section>().unwrap(), Section::OpenQuestions);
        assert_eq!("risks".parse::<Section>().unwrap(), Section::Risks);
        assert_eq!("success-metrics".parse::<Section>().unwrap(), Section::SuccessMetrics);
        assert_eq!("12".parse::<Section>().unwrap(), Section::References);
        assert!("0".parse::<Section>().is_err());
        assert!("appendix".parse::<Section>().is_err());
    }
}
