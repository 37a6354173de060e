use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use codex_core::{DocumentRef, Result, slugify};

use crate::index::topic_from_link;
use crate::markdown::{self, Cell, Table};
use crate::store::DocumentStore;

/// Classification of a prior organizational decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum DecisionType {
    /// Binding.
    Standard,
    /// Advisory.
    Guidance,
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecisionType::Standard => write!(f, "Standard"),
            DecisionType::Guidance => write!(f, "Guidance"),
        }
    }
}

/// Which registry document an entry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RegistryKind {
    StandardsMap,
    Deprecated,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StandardEntry {
    pub facet: String,
    pub decision_type: DecisionType,
    pub description: String,
    pub adr_link: Option<String>,
    pub registry: RegistryKind,
    /// Registry document the row was read from.
    pub source: DocumentRef,
}

/// The "already decided" registry: `standards-map.md` plus `deprecated.md`.
///
/// Both are markdown tables keyed by facet. Column roles are detected from
/// header names; a table without a type column takes its type from the
/// enclosing heading ("Guidance" headings hold guidance, anything else is
/// binding).
#[derive(Debug, Clone, Default)]
pub struct StandardsRegistry {
    entries: Vec<StandardEntry>,
}

impl StandardsRegistry {
    /// Load both registries. Missing files yield an empty registry.
    pub fn load(store: &DocumentStore, standards_map: &Path, deprecated: &Path) -> Result<Self> {
        let mut entries = Vec::new();
        for (path, kind) in [
            (standards_map, RegistryKind::StandardsMap),
            (deprecated, RegistryKind::Deprecated),
        ] {
            match store.registry_document(path)? {
                Some(doc) => {
                    let parsed = Self::parse(&doc.content, kind, &doc.reference);
                    info!(path = %doc.reference.path, entries = parsed.len(), "loaded registry");
                    entries.extend(parsed);
                }
                None => debug!(?path, "registry not present"),
            }
        }
        Ok(Self { entries })
    }

    pub fn from_entries(entries: Vec<StandardEntry>) -> Self {
        Self { entries }
    }

    /// Parse every facet-keyed table in a registry document.
    pub fn parse(content: &str, registry: RegistryKind, source: &DocumentRef) -> Vec<StandardEntry> {
        let mut out = Vec::new();
        for section in markdown::sections(content) {
            let heading = section.title.to_lowercase();
            let section_default = if heading.contains("guidance") {
                DecisionType::Guidance
            } else {
                DecisionType::Standard
            };
            for table in &section.tables {
                out.extend(parse_table(table, section_default, registry, source));
            }
        }
        out
    }

    pub fn entries(&self) -> &[StandardEntry] {
        &self.entries
    }

    /// All entries for a facet, in registry order.
    pub fn for_facet<'a>(&'a self, facet: &'a str) -> impl Iterator<Item = &'a StandardEntry> + 'a {
        self.entries.iter().filter(move |e| e.facet == facet)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct Columns {
    facet: usize,
    kind: Option<usize>,
    description: Option<usize>,
    adr: Option<usize>,
}

fn detect_columns(header: &[Cell]) -> Option<Columns> {
    let names: Vec<String> = header.iter().map(|c| c.text.to_lowercase()).collect();
    let find = |keys: &[&str], skip: &[Option<usize>]| {
        names
            .iter()
            .enumerate()
            .find(|(i, n)| !skip.contains(&Some(*i)) && keys.iter().any(|k| n.contains(k)))
            .map(|(i, _)| i)
    };

    let facet = find(&["facet", "topic", "area", "experience"], &[])?;
    let kind = find(&["type", "status", "classification"], &[Some(facet)]);
    let adr = find(&["adr", "link", "reference"], &[Some(facet), kind]);
    let description = find(
        &["description", "decision", "standard", "summary", "approach", "recommend", "replacement", "deprecated"],
        &[Some(facet), kind, adr],
    );
    Some(Columns {
        facet,
        kind,
        description,
        adr,
    })
}

fn parse_table(
    table: &Table,
    section_default: DecisionType,
    registry: RegistryKind,
    source: &DocumentRef,
) -> Vec<StandardEntry> {
    let Some(cols) = detect_columns(&table.header) else {
        return Vec::new();
    };

    let mut out = Vec::new();
    for row in &table.rows {
        let Some(facet_cell) = row.get(cols.facet) else {
            continue;
        };
        let facet = facet_key(facet_cell);
        if facet.is_empty() {
            continue;
        }

        let decision_type = match cols.kind.and_then(|i| row.get(i)) {
            Some(cell) => match classify(&cell.text) {
                Some(t) => t,
                None => {
                    debug!(facet = %facet, value = %cell.text, "unrecognized decision type, row skipped");
                    continue;
                }
            },
            None => section_default,
        };

        let description = cols
            .description
            .and_then(|i| row.get(i))
            .map(|c| c.text.clone())
            .unwrap_or_default();
        let adr_link = cols.adr.and_then(|i| row.get(i)).and_then(|c| {
            c.link
                .clone()
                .or_else(|| (!c.text.is_empty() && c.text != "-").then(|| c.text.clone()))
        });

        out.push(StandardEntry {
            facet,
            decision_type,
            description,
            adr_link,
            registry,
            source: source.clone(),
        });
    }
    out
}

fn classify(value: &str) -> Option<DecisionType> {
    let v = value.to_lowercase();
    if v.contains("guid") || v.contains("recommend") {
        Some(DecisionType::Guidance)
    } else if v.contains("standard") || v.contains("deprecat") || v.contains("required") || v.contains("mandatory") {
        Some(DecisionType::Standard)
    } else {
        None
    }
}

/// Facet key from a cell: the topic directory of its link when present,
/// otherwise the slug of its text.
fn facet_key(cell: &Cell) -> String {
    cell.link
        .as_deref()
        .and_then(topic_from_link)
        .unwrap_or_else(|| slugify(&cell.text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use codex_core::View;

    fn source() -> DocumentRef {
        DocumentRef {
            path: "standards-map.md".into(),
            topic: "standards-map".into(),
            view: View::Readme,
        }
    }

    const MAP: &str = r#"# Standards Map

| Facet | Type | Decision | ADR |
|-------|------|----------|-----|
| [Authentication](facets/authentication/) | Standard | OIDC via the shared identity provider | [ADR-012](adrs/012.md) |
| API Design | Guidance | Prefer REST with JSON:API conventions | - |
| Caching | Unknown | ??? | - |

## Guidance

| Facet | Recommendation |
|-------|----------------|
| [Feature Toggles](facets/feature-toggles/README.md) | Use the platform toggle service |
"#;

    #[test]
    fn parses_typed_table() {
        let entries = StandardsRegistry::parse(MAP, RegistryKind::StandardsMap, &source());
        assert_eq!(entries.len(), 3);

        let auth = &entries[0];
        assert_eq!(auth.facet, "authentication");
        assert_eq!(auth.decision_type, DecisionType::Standard);
        assert_eq!(auth.description, "OIDC via the shared identity provider");
        assert_eq!(auth.adr_link.as_deref(), Some("adrs/012.md"));

        let api = &entries[1];
        assert_eq!(api.facet, "api-design");
        assert_eq!(api.decision_type, DecisionType::Guidance);
        assert_eq!(api.adr_link, None);
    }

    #[test]
    fn untyped_table_takes_heading_type() {
        let entries = StandardsRegistry::parse(MAP, RegistryKind::StandardsMap, &source());
        let toggles = entries.iter().find(|e| e.facet == "feature-toggles").unwrap();
        assert_eq!(toggles.decision_type, DecisionType::Guidance);
        assert_eq!(toggles.description, "Use the platform toggle service");
    }

    #[test]
    fn deprecated_table_defaults_to_standard() {
        let doc = "# Deprecated\n\n| Facet | Deprecated Approach | Replacement |\n|---|---|---|\n| Caching | Memcached sidecars | Shared Redis |\n";
        let entries = StandardsRegistry::parse(doc, RegistryKind::Deprecated, &source());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].facet, "caching");
        assert_eq!(entries[0].decision_type, DecisionType::Standard);
        assert_eq!(entries[0].registry, RegistryKind::Deprecated);
        assert_eq!(entries[0].description, "Memcached sidecars");
    }

    #[test]
    fn table_without_facet_column_is_ignored() {
        let doc = "| Name | Value |\n|---|---|\n| a | b |\n";
        assert!(StandardsRegistry::parse(doc, RegistryKind::StandardsMap, &source()).is_empty());
    }

    #[test]
    fn for_facet_filters() {
        let reg = StandardsRegistry::from_entries(StandardsRegistry::parse(
            MAP,
            RegistryKind::StandardsMap,
            &source(),
        ));
        assert_eq!(reg.for_facet("authentication").count(), 1);
        assert_eq!(reg.for_facet("nope").count(), 0);
    }
}
