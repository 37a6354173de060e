use tracing::debug;

use codex_core::{CodexError, Document, Result, View};
use codex_corpus::DocumentStore;
use codex_corpus::markdown::{self, Section};

use crate::fragment::{ExtractedFragment, FragmentKind, Note};
use crate::mapper::TopicMatch;

/// Views read per topic, in output order, and the fragment kind each yields.
pub const EXTRACTION_PLAN: [(View, FragmentKind); 4] = [
    (View::Architecture, FragmentKind::DesignNote),
    (View::Gotchas, FragmentKind::Risk),
    (View::Options, FragmentKind::Decision),
    (View::Product, FragmentKind::Metric),
];

/// `##` headings in options.md that describe the document rather than an option.
const STRUCTURAL_HEADINGS: &[&str] = &[
    "overview",
    "related",
    "recommendation",
    "references",
    "summary",
    "see also",
    "decision criteria",
    "evaluation criteria",
];

const METRIC_MARKERS: &[&str] = &["metric", "kpi", "measur"];

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub fragments: Vec<ExtractedFragment>,
    pub notes: Vec<Note>,
}

impl Extraction {
    pub fn of_kind(&self, kind: FragmentKind) -> impl Iterator<Item = &ExtractedFragment> {
        self.fragments.iter().filter(move |f| f.kind() == kind)
    }
}

/// Pulls risks, decisions, metrics and design notes out of the matched
/// topics' views.
pub struct Extractor<'a> {
    store: &'a DocumentStore,
}

impl<'a> Extractor<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// Extract from every planned view of every matched topic. Output order is
    /// topic order, then view order, then document order.
    pub fn extract(&self, matches: &[TopicMatch]) -> Result<Extraction> {
        let mut out = Extraction::default();
        for m in matches {
            for (view, kind) in EXTRACTION_PLAN {
                match self.store.document(&m.topic, view)? {
                    Some(doc) => {
                        let found = extract_document(&doc, kind)?;
                        debug!(document = %doc.path(), kind = %kind, count = found.len(), "extracted");
                        out.fragments.extend(found);
                    }
                    None => {
                        let reference = self.store.reference(&m.topic, view)?;
                        debug!(document = %reference, "view not present");
                        let missing = CodexError::MissingSection {
                            document: reference.path,
                            section: "entire document".into(),
                        };
                        out.notes.extend(Note::from_error(&missing));
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Fragments of `kind` found in one document. A document without the
/// expected sections yields nothing.
pub fn extract_document(doc: &Document, kind: FragmentKind) -> Result<Vec<ExtractedFragment>> {
    let sections = markdown::sections(&doc.content);
    let fragment = |heading: &str, text: &str| {
        ExtractedFragment::new(doc.reference.clone(), kind, heading, text)
    };

    match kind {
        FragmentKind::Risk | FragmentKind::DesignNote => sections
            .iter()
            .filter(|s| s.level == 2)
            .map(|s| fragment(&s.title, s.summary().unwrap_or_default()))
            .collect(),
        FragmentKind::Decision => option_sections(&sections)
            .into_iter()
            .map(|s| fragment(&s.title, s.summary().unwrap_or_default()))
            .collect(),
        FragmentKind::Metric => {
            let mut out = Vec::new();
            let mut i = 0;
            while i < sections.len() {
                let s = &sections[i];
                if !is_metric_heading(&s.title) {
                    i += 1;
                    continue;
                }
                let nested: Vec<&Section> = descendants(&sections, i).collect();
                i += 1 + nested.len();
                for section in std::iter::once(s).chain(nested) {
                    for item in &section.items {
                        out.push(fragment(item, "")?);
                    }
                    for table in &section.tables {
                        for row in &table.rows {
                            let Some((first, rest)) = row.split_first() else {
                                continue;
                            };
                            let detail: Vec<&str> = rest
                                .iter()
                                .map(|c| c.text.as_str())
                                .filter(|t| !t.is_empty())
                                .collect();
                            out.push(fragment(&first.text, &detail.join("; "))?);
                        }
                    }
                }
            }
            Ok(out)
        }
        FragmentKind::StandardRef => Ok(Vec::new()),
    }
}

/// Children of "Options" headings below the title; else every
/// non-structural `##` heading.
fn option_sections(sections: &[Section]) -> Vec<&Section> {
    let parents: Vec<usize> = sections
        .iter()
        .enumerate()
        .filter(|(_, s)| {
            let t = s.title.to_lowercase();
            s.level >= 2 && (t == "options" || t.starts_with("options ") || t.ends_with(" options"))
        })
        .map(|(i, _)| i)
        .collect();

    if !parents.is_empty() {
        return parents
            .into_iter()
            .flat_map(|p| markdown::children(sections, p))
            .map(|i| &sections[i])
            .collect();
    }

    sections
        .iter()
        .filter(|s| s.level == 2)
        .filter(|s| {
            let t = s.title.to_lowercase();
            !STRUCTURAL_HEADINGS.iter().any(|h| t.starts_with(h))
        })
        .collect()
}

fn is_metric_heading(title: &str) -> bool {
    let t = title.to_lowercase();
    METRIC_MARKERS.iter().any(|m| t.contains(m))
}

/// Sections nested under `sections[parent]`, at any depth.
fn descendants(sections: &[Section], parent: usize) -> impl Iterator<Item = &Section> {
    let level = sections[parent].level;
    sections[parent + 1..].iter().take_while(move |s| s.level > level)
}
