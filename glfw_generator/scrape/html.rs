////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

//! A minimal DOM over Doxygen's XHTML output.
//!
//! All knowledge about how Doxygen lays out its pages (table classes, the anchor/heading/memitem
//! sequence of detailed descriptions) lives in [`Page`]'s query methods.

use xml::reader::{EventReader, ParserConfig, XmlEvent};

use crate::error::{Error, Result};
use crate::registry::DocBlock;

pub type NodeId = usize;

const DOCUMENT: NodeId = 0;

/// HTML entities Doxygen emits that XML does not define.
const HTML_ENTITIES: &[(&str, &str)] = &[
    ("nbsp", "\u{a0}"),
    ("copy", "\u{a9}"),
    ("ndash", "\u{2013}"),
    ("mdash", "\u{2014}"),
    ("hellip", "\u{2026}"),
    ("rarr", "\u{2192}"),
    ("larr", "\u{2190}"),
    ("lsquo", "\u{2018}"),
    ("rsquo", "\u{2019}"),
    ("ldquo", "\u{201c}"),
    ("rdquo", "\u{201d}"),
];

#[derive(Debug)]
enum NodeData {
    Element { tag: String, attributes: Vec<(String, String)> },
    Text(String),
}

#[derive(Debug)]
struct Node {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// One parsed documentation page.
#[derive(Debug)]
pub struct Page {
    name: String,
    nodes: Vec<Node>,
}

/// Turns nbsp and line breaks into spaces, collapses runs of spaces and trims.
pub fn normalize_text(text: &str) -> String {
    text.split(|c: char| c == ' ' || c == '\u{a0}' || c == '\n' || c == '\r' || c == '\t')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl Page {
    pub fn parse(name: &str, source: &str) -> Result<Page> {
        let mut config = ParserConfig::new()
            .trim_whitespace(false)
            .whitespace_to_characters(true)
            .cdata_to_characters(true)
            .coalesce_characters(true)
            .ignore_comments(true);
        for (entity, value) in HTML_ENTITIES {
            config = config.add_entity(*entity, *value);
        }

        let mut page = Page {
            name: name.to_string(),
            nodes: vec![Node {
                data: NodeData::Element {
                    tag: String::new(),
                    attributes: Vec::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
        };
        let mut open = vec![DOCUMENT];

        for event in EventReader::new_with_config(source.as_bytes(), config) {
            let event = event.map_err(|e| Error::Markup {
                page: name.to_string(),
                message: e.to_string(),
            })?;

            match event {
                XmlEvent::StartElement { name, attributes, .. } => {
                    let attributes = attributes.into_iter().map(|a| (a.name.local_name, a.value)).collect();
                    let parent = open.last().copied().unwrap_or(DOCUMENT);
                    let id = page.push(parent, NodeData::Element {
                        tag: name.local_name,
                        attributes,
                    });
                    open.push(id);
                },
                XmlEvent::EndElement { .. } => {
                    if open.len() > 1 {
                        open.pop();
                    }
                },
                XmlEvent::Characters(text) => {
                    let parent = open.last().copied().unwrap_or(DOCUMENT);
                    if parent != DOCUMENT {
                        page.push(parent, NodeData::Text(text));
                    }
                },
                _ => {},
            }
        }

        Ok(page)
    }

    fn push(&mut self, parent: NodeId, data: NodeData) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            data,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.nodes[node].data {
            NodeData::Element { tag, .. } => Some(tag),
            NodeData::Text(_) => None,
        }
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        match &self.nodes[node].data {
            NodeData::Element { attributes, .. } => {
                attributes.iter().find(|(key, _)| key == name).map(|(_, value)| value.as_str())
            },
            NodeData::Text(_) => None,
        }
    }

    pub fn has_attributes(&self, node: NodeId) -> bool {
        match &self.nodes[node].data {
            NodeData::Element { attributes, .. } => !attributes.is_empty(),
            NodeData::Text(_) => false,
        }
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.attr(node, "class").map_or(false, |c| c.split_whitespace().any(|c| c == class))
    }

    /// The concatenated text of `node` and everything below it, unnormalized.
    pub fn text(&self, node: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node, &mut out);
        out
    }

    fn collect_text(&self, node: NodeId, out: &mut String) {
        match &self.nodes[node].data {
            NodeData::Text(text) => out.push_str(text),
            NodeData::Element { .. } => {
                for &child in &self.nodes[node].children {
                    self.collect_text(child, out);
                }
            },
        }
    }

    /// All nodes below `node` in document order.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[node].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id].children.iter().rev());
        }
        out
    }

    pub fn descendants_named(&self, node: NodeId, tag: &str) -> Vec<NodeId> {
        self.descendants(node).into_iter().filter(|&id| self.tag(id) == Some(tag)).collect()
    }

    /// The next sibling element, skipping whitespace. A non-blank text node in between ends the
    /// search.
    pub fn next_element_sibling(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes[node].parent?;
        let siblings = &self.nodes[parent].children;
        let index = siblings.iter().position(|&id| id == node)?;
        for &sibling in &siblings[index + 1..] {
            match &self.nodes[sibling].data {
                NodeData::Element { .. } => return Some(sibling),
                NodeData::Text(text) if text.trim().is_empty() => continue,
                NodeData::Text(_) => return None,
            }
        }
        None
    }

    /// The `memberdecls` table whose first row mentions `heading`.
    pub fn find_table_by_heading(&self, heading: &str) -> Result<NodeId> {
        self.descendants_named(DOCUMENT, "table")
            .into_iter()
            .filter(|&table| self.has_class(table, "memberdecls"))
            .find(|&table| {
                self.descendants_named(table, "tr")
                    .first()
                    .map_or(false, |&row| self.text(row).contains(heading))
            })
            .ok_or_else(|| Error::structure(&self.name, format!("no member table headed `{}`", heading)))
    }

    pub fn rows_of(&self, table: NodeId) -> Vec<NodeId> {
        self.descendants_named(table, "tr")
    }

    pub fn cells_of(&self, row: NodeId) -> Vec<NodeId> {
        self.descendants_named(row, "td")
    }

    /// Finds the `memdoc` container describing `anchor`.
    ///
    /// Doxygen writes `<a name=anchor/>`, then a heading whose first link points back at the
    /// anchor, then the `memitem` div holding the prototype and the `memdoc` div.
    pub fn detailed_doc_for(&self, anchor: &str) -> Result<NodeId> {
        let target = self
            .descendants_named(DOCUMENT, "a")
            .into_iter()
            .find(|&a| self.attr(a, "name") == Some(anchor) || self.attr(a, "id") == Some(anchor))
            .ok_or_else(|| Error::structure(&self.name, format!("no anchor `{}`", anchor)))?;

        let heading = self
            .next_element_sibling(target)
            .ok_or_else(|| Error::structure(&self.name, format!("nothing follows anchor `{}`", anchor)))?;

        let self_link = self.descendants_named(heading, "a").into_iter().next().ok_or_else(|| {
            Error::structure(&self.name, format!("the heading after anchor `{}` has no link", anchor))
        })?;
        let href = self.attr(self_link, "href").unwrap_or("");
        if href.strip_prefix('#') != Some(anchor) {
            return Err(Error::structure(
                &self.name,
                format!("the heading after anchor `{}` links to `{}` instead of itself", anchor, href),
            ));
        }

        let item = self.next_element_sibling(heading).ok_or_else(|| {
            Error::structure(&self.name, format!("no member item after the heading of `{}`", anchor))
        })?;

        self.descendants_named(item, "div")
            .into_iter()
            .find(|&div| self.has_class(div, "memdoc"))
            .ok_or_else(|| Error::structure(&self.name, format!("no memdoc for `{}`", anchor)))
    }

    /// Flattens a `memdoc` container into paragraphs and code listings.
    pub fn doc_blocks(&self, container: NodeId) -> Vec<DocBlock> {
        let mut blocks = Vec::new();
        for &child in &self.nodes[container].children {
            match self.tag(child) {
                None => push_paragraph(&mut blocks, &self.text(child)),
                Some("div") if self.has_class(child, "fragment") => blocks.push(DocBlock::Code(self.code_lines(child))),
                Some("pre") => blocks.push(DocBlock::Code(split_code(&self.text(child)))),
                Some("ul") | Some("ol") => {
                    for item in self.descendants_named(child, "li") {
                        push_paragraph(&mut blocks, &format!("- {}", normalize_text(&self.text(item))));
                    }
                },
                Some("dl") => {
                    let title = self.descendants_named(child, "dt").first().map(|&dt| normalize_text(&self.text(dt)));
                    let body = self
                        .descendants_named(child, "dd")
                        .iter()
                        .map(|&dd| normalize_text(&self.text(dd)))
                        .collect::<Vec<_>>()
                        .join(" ");
                    match title {
                        Some(title) if !title.is_empty() => push_paragraph(&mut blocks, &format!("{}: {}", title, body)),
                        _ => push_paragraph(&mut blocks, &body),
                    }
                },
                Some(_) => push_paragraph(&mut blocks, &self.text(child)),
            }
        }
        blocks
    }

    fn code_lines(&self, fragment: NodeId) -> Vec<String> {
        let lines: Vec<String> = self
            .descendants_named(fragment, "div")
            .into_iter()
            .filter(|&div| self.has_class(div, "line"))
            .map(|line| self.text(line).replace('\u{a0}', " ").trim_end().to_string())
            .collect();
        if lines.is_empty() {
            split_code(&self.text(fragment))
        } else {
            lines
        }
    }
}

fn push_paragraph(blocks: &mut Vec<DocBlock>, text: &str) {
    let text = normalize_text(text);
    if !text.is_empty() {
        blocks.push(DocBlock::Paragraph(text));
    }
}

fn split_code(text: &str) -> Vec<String> {
    text.replace('\u{a0}', " ")
        .trim_matches('\n')
        .lines()
        .map(|line| line.trim_end().to_string())
        .collect()
}
