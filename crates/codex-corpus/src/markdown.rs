//! Heading-level structure of a markdown document.
//!
//! The corpus views follow a fixed heading grammar, so extraction works on a
//! flat list of sections in document order rather than on free text.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

/// A markdown link: visible text and destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub text: String,
    pub dest: String,
}

/// One table cell: plain text plus the first link inside it, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<Cell>,
    pub rows: Vec<Vec<Cell>>,
}

/// Content between one heading and the next heading of any level.
///
/// Text before the first heading is collected into a level-0 section with an
/// empty title.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Section {
    pub level: u8,
    pub title: String,
    pub paragraphs: Vec<String>,
    /// Top-level list items; nested item text is folded into its parent.
    pub items: Vec<String>,
    pub tables: Vec<Table>,
    pub links: Vec<Link>,
}

impl Section {
    fn new(level: u8) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    fn is_empty(&self) -> bool {
        self.title.is_empty()
            && self.paragraphs.is_empty()
            && self.items.is_empty()
            && self.tables.is_empty()
            && self.links.is_empty()
    }

    /// First paragraph of the section body, if any.
    pub fn summary(&self) -> Option<&str> {
        self.paragraphs.first().map(String::as_str)
    }
}

/// Parse `content` into a flat list of sections in document order.
pub fn sections(content: &str) -> Vec<Section> {
    let mut out = Vec::new();
    let mut current = Section::new(0);

    let mut in_heading = false;
    let mut in_paragraph = false;
    let mut in_code = false;
    let mut item_depth = 0usize;
    let mut item_buf = String::new();
    let mut para_buf = String::new();

    let mut table: Option<Table> = None;
    let mut row: Vec<Cell> = Vec::new();
    let mut cell: Option<Cell> = None;
    let mut in_table_head = false;

    let mut link: Option<Link> = None;

    for event in Parser::new_ext(content, Options::ENABLE_TABLES) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                let finished = std::mem::replace(&mut current, Section::new(level as u8));
                if !finished.is_empty() {
                    out.push(finished);
                }
                in_heading = true;
            }
            Event::End(TagEnd::Heading(_)) => {
                current.title = current.title.trim().to_string();
                in_heading = false;
            }
            Event::Start(Tag::Paragraph) => {
                in_paragraph = true;
            }
            Event::End(TagEnd::Paragraph) => {
                in_paragraph = false;
                if item_depth > 0 {
                    item_buf.push(' ');
                } else {
                    let text = collapse(&para_buf);
                    if !text.is_empty() {
                        current.paragraphs.push(text);
                    }
                }
                para_buf.clear();
            }
            Event::Start(Tag::Item) => {
                if item_depth > 0 {
                    item_buf.push(' ');
                }
                item_depth += 1;
            }
            Event::End(TagEnd::Item) => {
                item_depth = item_depth.saturating_sub(1);
                if item_depth == 0 {
                    let text = collapse(&item_buf);
                    if !text.is_empty() {
                        current.items.push(text);
                    }
                    item_buf.clear();
                }
            }
            Event::Start(Tag::CodeBlock(_)) => in_code = true,
            Event::End(TagEnd::CodeBlock) => in_code = false,
            Event::Start(Tag::Table(_)) => table = Some(Table::default()),
            Event::End(TagEnd::Table) => {
                if let Some(t) = table.take() {
                    current.tables.push(t);
                }
            }
            Event::Start(Tag::TableHead) => in_table_head = true,
            Event::End(TagEnd::TableHead) => {
                if let Some(ref mut t) = table {
                    t.header = std::mem::take(&mut row);
                }
                in_table_head = false;
            }
            Event::Start(Tag::TableRow) => row.clear(),
            Event::End(TagEnd::TableRow) => {
                if let Some(ref mut t) = table {
                    if !in_table_head {
                        t.rows.push(std::mem::take(&mut row));
                    }
                }
            }
            Event::Start(Tag::TableCell) => cell = Some(Cell::default()),
            Event::End(TagEnd::TableCell) => {
                if let Some(mut c) = cell.take() {
                    c.text = collapse(&c.text);
                    row.push(c);
                }
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                link = Some(Link {
                    text: String::new(),
                    dest: dest_url.to_string(),
                });
                if let Some(ref mut c) = cell {
                    if c.link.is_none() {
                        c.link = Some(dest_url.to_string());
                    }
                }
            }
            Event::End(TagEnd::Link) => {
                if let Some(mut l) = link.take() {
                    l.text = collapse(&l.text);
                    current.links.push(l);
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if in_code {
                    continue;
                }
                if let Some(ref mut l) = link {
                    l.text.push_str(&text);
                }
                if in_heading {
                    current.title.push_str(&text);
                } else if let Some(ref mut c) = cell {
                    c.text.push_str(&text);
                } else if item_depth > 0 {
                    item_buf.push_str(&text);
                } else if in_paragraph {
                    para_buf.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if in_heading {
                    current.title.push(' ');
                } else if item_depth > 0 {
                    item_buf.push(' ');
                } else if in_paragraph {
                    para_buf.push(' ');
                }
            }
            _ => {}
        }
    }

    if !current.is_empty() {
        out.push(current);
    }
    out
}

/// Indices of the direct children of `sections[parent]`: the following
/// sections one level deeper, up to the next heading at the parent's level
/// or shallower.
pub fn children(sections: &[Section], parent: usize) -> Vec<usize> {
    let Some(p) = sections.get(parent) else {
        return Vec::new();
    };
    let mut out = Vec::new();
    let mut child_level: Option<u8> = None;
    for (i, s) in sections.iter().enumerate().skip(parent + 1) {
        if s.level <= p.level {
            break;
        }
        let level = *child_level.get_or_insert(s.level);
        if s.level == level {
            out.push(i);
        }
    }
    out
}

/// Collapse runs of whitespace and trim.
fn collapse(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"# Feature Toggles

Preamble paragraph.

## Stale toggles

Toggles that are never removed pile up.

Second paragraph.

## Options

### LaunchDarkly

Hosted service.

### Unleash

- self-hosted
- open source
  - nested detail

## Related Facets

- [Deployment](../deployment/README.md)

```bash
# not a heading
```
"#;

    #[test]
    fn sections_in_document_order() {
        let s = sections(DOC);
        let titles: Vec<_> = s.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(
            titles,
            vec!["Feature Toggles", "Stale toggles", "Options", "LaunchDarkly", "Unleash", "Related Facets"]
        );
        assert_eq!(s[0].level, 1);
        assert_eq!(s[0].summary(), Some("Preamble paragraph."));
        assert_eq!(s[1].paragraphs.len(), 2);
    }

    #[test]
    fn nested_items_fold_into_parent() {
        let s = sections(DOC);
        let unleash = s.iter().find(|s| s.title == "Unleash").unwrap();
        assert_eq!(unleash.items, vec!["self-hosted", "open source nested detail"]);
    }

    #[test]
    fn links_are_collected() {
        let s = sections(DOC);
        let related = s.iter().find(|s| s.title == "Related Facets").unwrap();
        assert_eq!(related.links.len(), 1);
        assert_eq!(related.links[0].text, "Deployment");
        assert_eq!(related.links[0].dest, "../deployment/README.md");
    }

    #[test]
    fn children_stop_at_sibling() {
        let s = sections(DOC);
        let options = s.iter().position(|s| s.title == "Options").unwrap();
        let kids: Vec<_> = children(&s, options).into_iter().map(|i| s[i].title.as_str()).collect();
        assert_eq!(kids, vec!["LaunchDarkly", "Unleash"]);
    }

    #[test]
    fn tables_with_links() {
        let doc = "## Standards\n\n| Facet | Type | ADR |\n|---|---|---|\n| [Auth](facets/authentication/) | Standard | [ADR-7](adr/7.md) |\n";
        let s = sections(doc);
        let t = &s[0].tables[0];
        assert_eq!(t.header.len(), 3);
        assert_eq!(t.header[1].text, "Type");
        assert_eq!(t.rows.len(), 1);
        assert_eq!(t.rows[0][0].text, "Auth");
        assert_eq!(t.rows[0][0].link.as_deref(), Some("facets/authentication/"));
        assert_eq!(t.rows[0][2].link.as_deref(), Some("adr/7.md"));
    }

    #[test]
    fn empty_document_has_no_sections() {
        assert!(sections("").is_empty());
    }
}
