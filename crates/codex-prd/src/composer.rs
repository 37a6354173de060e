use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt::Write as _;
use tracing::debug;

use codex_config::ComposeConfig;
use codex_core::Result;

use crate::brief::OpportunityBrief;
use crate::draft::{PrdDraft, Section};
use crate::extractor::Extraction;
use crate::fragment::{ExtractedFragment, FragmentKind, Note};
use crate::mapper::{Relevance, TopicMatch};
use crate::resolver::{DecisionStatus, Resolution};

/// Terms that mark a risk as technical. Matched against word starts, so
/// "scal" covers scaling and scalability.
const TECHNICAL_TERMS: &[&str] = &[
    "architect",
    "performance",
    "latency",
    "throughput",
    "scal",
    "security",
    "vulnerab",
    "auth",
    "encrypt",
    "injection",
    "database",
    "migration",
    "schema",
    "cache",
    "caching",
    "concurren",
    "race condition",
    "memory",
    "deadlock",
    "api",
    "infrastructure",
    "deploy",
    "network",
    "timeout",
    "consistency",
    "replication",
    "dependenc",
    "token",
    "secret",
    "cpu",
    "storage",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskClass {
    Technical,
    Product,
}

/// Everything one composition reads. Borrowed, so the review loop can
/// recompose from the same inputs.
#[derive(Debug, Clone, Copy)]
pub struct ComposeInput<'a> {
    pub brief: &'a OpportunityBrief,
    pub matches: &'a [TopicMatch],
    pub extraction: &'a Extraction,
    pub resolution: &'a Resolution,
    /// Notes raised before extraction, e.g. a confirmed no-match.
    pub notes: &'a [Note],
    pub date: NaiveDate,
}

/// Fills the fixed PRD template. Deterministic in its input.
#[derive(Debug, Clone, Default)]
pub struct TemplateComposer {
    technical_terms: Vec<String>,
    author: Option<String>,
}

impl TemplateComposer {
    pub fn new(config: &ComposeConfig) -> Self {
        let mut technical_terms: Vec<String> = TECHNICAL_TERMS.iter().map(|t| t.to_string()).collect();
        technical_terms.extend(
            config
                .technical_keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty()),
        );
        Self {
            technical_terms,
            author: config.author.clone(),
        }
    }

    pub fn classify_risk(&self, text: &str) -> RiskClass {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()).collect();
        let technical = self.technical_terms.iter().any(|term| {
            if term.contains(' ') {
                lower.contains(term.as_str())
            } else {
                words.iter().any(|w| w.starts_with(term.as_str()))
            }
        });
        if technical {
            RiskClass::Technical
        } else {
            RiskClass::Product
        }
    }

    pub fn compose(&self, input: &ComposeInput<'_>) -> Result<PrdDraft> {
        let mut draft = PrdDraft::new(input.brief.feature_name());

        draft.set(Section::Metadata, self.metadata(input));
        draft.set(Section::ProblemAlignment, problem_alignment(input.brief));
        draft.set(Section::ExpectedOutcomes, expected_outcomes(input.brief));
        draft.set(
            Section::SuccessMetrics,
            bullets(input.extraction.of_kind(FragmentKind::Metric)),
        );
        draft.set(Section::UserStories, user_stories(input.brief));
        draft.set(Section::TechnicalRequirements, technical_requirements(input));
        draft.set(Section::Risks, self.risks(input.extraction));
        draft.set(Section::SignificantDecisions, significant_decisions(input.resolution));
        draft.set(Section::OpenQuestions, open_questions(input));
        draft.set(Section::References, references(input));

        debug!(
            title = draft.title(),
            fragments = input.extraction.fragments.len(),
            decisions = input.resolution.decisions.len(),
            "composed draft"
        );
        Ok(draft)
    }

    fn metadata(&self, input: &ComposeInput<'_>) -> String {
        let topics: Vec<String> = input
            .matches
            .iter()
            .map(|m| match (&m.relevance, &m.via) {
                (Relevance::Related, Some(via)) => format!("{} (related via {via})", m.topic),
                (r, _) => format!("{} ({r})", m.topic),
            })
            .collect();
        let topics = if topics.is_empty() {
            "_none matched_".to_string()
        } else {
            topics.join(", ")
        };

        let mut out = String::from("| Field | Value |\n|---|---|\n");
        let rows = [
            ("Feature", input.brief.feature_name()),
            ("Status", "Draft".to_string()),
            ("Date", input.date.format("%Y-%m-%d").to_string()),
            ("Author", self.author.clone().unwrap_or_else(|| "_TBD_".into())),
            ("Brief", input.brief.origin.clone().unwrap_or_else(|| "inline".into())),
            ("Topics", topics),
        ];
        for (field, value) in rows {
            let _ = writeln!(out, "| {field} | {} |", value.replace('|', "\\|"));
        }
        out
    }

    fn risks(&self, extraction: &Extraction) -> String {
        let (mut technical, mut product) = (Vec::new(), Vec::new());
        for risk in extraction.of_kind(FragmentKind::Risk) {
            match self.classify_risk(&risk.summary()) {
                RiskClass::Technical => technical.push(risk),
                RiskClass::Product => product.push(risk),
            }
        }
        if technical.is_empty() && product.is_empty() {
            return String::new();
        }
        let mut out = String::new();
        for (heading, group) in [("Technical Risks", technical), ("Product Risks", product)] {
            let body = bullets(group.into_iter());
            let body = if body.is_empty() { "_None identified._\n".to_string() } else { body };
            let _ = write!(out, "### {heading}\n\n{body}\n");
        }
        out
    }
}

fn cited(fragment: &ExtractedFragment) -> String {
    format!("- {} _(source: `{}`)_", fragment.summary(), fragment.source())
}

fn bullets<'a>(fragments: impl Iterator<Item = &'a ExtractedFragment>) -> String {
    let mut out = String::new();
    for f in fragments {
        let _ = writeln!(out, "{}", cited(f));
    }
    out
}

fn field_or_gap(value: &str) -> &str {
    if value.trim().is_empty() {
        "_Not provided in the brief._"
    } else {
        value.trim()
    }
}

fn problem_alignment(brief: &OpportunityBrief) -> String {
    format!(
        "### Problem Statement\n\n{}\n\n### Hypothesis\n\n{}\n\n### Strategic Alignment\n\n{}\n",
        field_or_gap(&brief.problem_statement),
        field_or_gap(&brief.hypothesis),
        field_or_gap(&brief.strategic_alignment),
    )
}

fn expected_outcomes(brief: &OpportunityBrief) -> String {
    if brief.roi_projection.trim().is_empty() {
        return String::new();
    }
    format!("### ROI Projection\n\n{}\n", brief.roi_projection.trim())
}

fn user_stories(brief: &OpportunityBrief) -> String {
    let mut out = String::new();
    for group in brief.target_user_groups() {
        let _ = writeln!(out, "- As a {group}, I want _<capability>_ so that _<benefit>_.");
    }
    out
}

fn technical_requirements(input: &ComposeInput<'_>) -> String {
    let notes = bullets(input.extraction.of_kind(FragmentKind::DesignNote));
    let standards = bullets(input.resolution.standard_refs.iter());
    let mut out = String::new();
    if !notes.is_empty() {
        let _ = write!(out, "### Design Considerations\n\n{notes}\n");
    }
    if !standards.is_empty() {
        let _ = write!(out, "### Applicable Standards\n\n{standards}\n");
    }
    out
}

/// Decisions grouped by facet, in first-seen order.
fn significant_decisions(resolution: &Resolution) -> String {
    let mut needed = String::new();
    let mut facets: Vec<&str> = Vec::new();
    for d in resolution.open() {
        if !facets.contains(&d.fragment.topic()) {
            facets.push(d.fragment.topic());
        }
    }
    for facet in facets {
        let group: Vec<_> = resolution.open().filter(|d| d.fragment.topic() == facet).collect();
        let options: Vec<&str> = group.iter().map(|d| d.fragment.heading()).collect();
        let _ = write!(needed, "- **{facet}**: choose between {}.", options.join(", "));
        if let Some(DecisionStatus::Open { options: doc, guidance }) = group.first().map(|d| &d.status) {
            let _ = write!(needed, " See [{}]({}).", doc.path, doc.path);
            if let Some(g) = guidance {
                let _ = write!(needed, " Guidance: {}.", g.description.trim_end_matches('.'));
            }
        }
        needed.push('\n');
    }

    let mut made = String::new();
    for standard in &resolution.standards {
        let _ = write!(made, "- **{}** ({}): {}", standard.facet, standard.decision_type, standard.description);
        if let Some(ref adr) = standard.adr_link {
            let _ = write!(made, " (ADR: {adr})");
        }
        let covered: Vec<&str> = resolution
            .already_decided()
            .filter(|d| d.fragment.topic() == standard.facet)
            .map(|d| d.fragment.heading())
            .collect();
        if !covered.is_empty() {
            let _ = write!(made, ". Options not needed: {}", covered.join(", "));
        }
        made.push('\n');
    }
    for entry in &resolution.deprecated {
        let _ = writeln!(made, "- **{}**: Deprecated: {}", entry.facet, entry.description);
    }

    let mut out = String::new();
    if !needed.is_empty() {
        let _ = write!(out, "### Decisions Needed\n\n{needed}\n");
    }
    if !made.is_empty() {
        let _ = write!(out, "### Decisions Already Made\n\n{made}\n");
    }
    for note in &resolution.notes {
        let _ = writeln!(out, "> Note: {note}");
    }
    out
}

fn open_questions(input: &ComposeInput<'_>) -> String {
    let mut out = String::new();
    let mut seen: Vec<&str> = Vec::new();
    for d in input.resolution.open() {
        if seen.contains(&d.fragment.topic()) {
            continue;
        }
        seen.push(d.fragment.topic());
        if let DecisionStatus::Open { options, .. } = &d.status {
            let _ = writeln!(
                out,
                "- Which option should **{}** use? See [{}]({}).",
                d.fragment.topic(),
                options.path,
                options.path
            );
        }
    }
    for note in input
        .notes
        .iter()
        .chain(&input.resolution.notes)
        .chain(&input.extraction.notes)
    {
        let _ = writeln!(out, "- ⚠️ {note}");
    }
    out
}

/// Every distinct document cited anywhere in the draft, sorted.
fn references(input: &ComposeInput<'_>) -> String {
    let mut paths: BTreeSet<&str> = BTreeSet::new();
    paths.extend(input.extraction.fragments.iter().map(|f| f.source().path.as_str()));
    paths.extend(input.resolution.standard_refs.iter().map(|f| f.source().path.as_str()));
    paths.extend(input.resolution.deprecated.iter().map(|e| e.source.path.as_str()));
    for d in &input.resolution.decisions {
        if let DecisionStatus::Open { options, .. } = &d.status {
            paths.insert(options.path.as_str());
        }
    }
    let mut out = String::new();
    for p in paths {
        let _ = writeln!(out, "- [{p}]({p})");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex_core::{DocumentRef, TopicKind, View};

    fn risk(heading: &str, text: &str) -> ExtractedFragment {
        ExtractedFragment::new(
            DocumentRef::for_view(TopicKind::Facet, "caching", View::Gotchas),
            FragmentKind::Risk,
            heading,
            text,
        )
        .unwrap()
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn classify_risk_by_word_start() {
        let c = TemplateComposer::new(&ComposeConfig::default());
        assert_eq!(c.classify_risk("Scalability limits under load"), RiskClass::Technical);
        assert_eq!(c.classify_risk("Race condition on invalidation"), RiskClass::Technical);
        assert_eq!(c.classify_risk("Users confused by rapid changes"), RiskClass::Product);

        let c = TemplateComposer::new(&ComposeConfig {
            technical_keywords: vec!["Invalidation".into()],
            author: None,
        });
        assert_eq!(c.classify_risk("Invalidation storms"), RiskClass::Technical);
    }

    #[test]
    fn empty_inputs_render_placeholders() {
        let brief = OpportunityBrief {
            problem_statement: "Tenants collide".into(),
            ..OpportunityBrief::default()
        };
        let extraction = Extraction::default();
        let resolution = Resolution::default();
        let draft = TemplateComposer::default()
            .compose(&ComposeInput {
                brief: &brief,
                matches: &[],
                extraction: &extraction,
                resolution: &resolution,
                notes: &[],
                date: date(),
            })
            .unwrap();
        assert_eq!(draft.section_order(), Section::ALL.to_vec());
        assert_eq!(draft.rendered_section(Section::Risks), Section::Risks.placeholder());
        assert!(draft.section(Section::Metadata).contains("| Date | 2026-03-14 |"));
        assert!(draft.section(Section::Metadata).contains("| Author | _TBD_ |"));
        assert!(draft.section(Section::ProblemAlignment).contains("Tenants collide"));
    }

    #[test]
    fn risks_split_and_cited() {
        let brief = OpportunityBrief {
            problem_statement: "p".into(),
            ..OpportunityBrief::default()
        };
        let extraction = Extraction {
            fragments: vec![risk("Cache stampede", "Cold starts hammer the database."), risk("Confusing UX", "")],
            notes: Vec::new(),
        };
        let resolution = Resolution::default();
        let input = ComposeInput {
            brief: &brief,
            matches: &[],
            extraction: &extraction,
            resolution: &resolution,
            notes: &[],
            date: date(),
        };
        let draft = TemplateComposer::new(&ComposeConfig::default()).compose(&input).unwrap();
        let risks = draft.section(Section::Risks);
        let technical = risks.find("### Technical Risks").unwrap();
        let product = risks.find("### Product Risks").unwrap();
        let stampede = risks.find("Cache stampede").unwrap();
        let ux = risks.find("Confusing UX").unwrap();
        assert!(technical < stampede && stampede < product && product < ux);
        assert!(risks.contains("_(source: `facets/caching/gotchas.md`)_"));
        assert!(draft.section(Section::References).contains("[facets/caching/gotchas.md](facets/caching/gotchas.md)"));

        // Same input, same text.
        let again = TemplateComposer::new(&ComposeConfig::default()).compose(&input).unwrap();
        assert_eq!(draft.render(), again.render());
    }
}
