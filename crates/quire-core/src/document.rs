//! The finalized document root.
//!
//! A [`Document`] is produced once by the assembly pipeline and is read-only
//! afterwards. It carries the optional header, the effective attribute set,
//! the block tree, the collected footnotes and, when requested, the table of
//! contents built from the section tree.

use log::trace;
use serde::Serialize;

use crate::{
    attribute::Attributes,
    element::{Element, Section},
    inline::{InlineContent, InlineElement},
};

/// An author line entry (`Full Name <email>`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Author {
    pub full_name: String,
    pub email: Option<String>,
}

/// A revision line (`v1.0, 2024-01-01: remark`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Revision {
    pub number: Option<String>,
    pub date: Option<String>,
    pub remark: Option<String>,
}

/// Document header: the level-0 title and the lines directly below it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Header {
    pub title: InlineContent,
    pub id: Option<String>,
    pub authors: Vec<Author>,
    pub revision: Option<Revision>,
}

/// A footnote collected from the body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Footnote {
    /// Sequential id, starting at 1, in order of first definition.
    pub id: u32,
    pub label: Option<String>,
    pub content: Vec<InlineElement>,
}

/// One entry of the table of contents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TocEntry {
    pub id: Option<String>,
    pub level: usize,
    pub title: String,
    pub children: Vec<TocEntry>,
}

/// Section outline, limited to the configured depth.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableOfContents {
    pub entries: Vec<TocEntry>,
}

impl TableOfContents {
    /// Build the outline of `elements`, descending into sections up to
    /// `max_level`.
    pub fn from_elements(elements: &[Element], max_level: usize) -> Self {
        let entries = collect_entries(elements, max_level);
        trace!(entries = entries.len(), max_level = max_level; "Built table of contents");
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn collect_entries(elements: &[Element], max_level: usize) -> Vec<TocEntry> {
    elements
        .iter()
        .filter_map(|element| match element {
            Element::Section(section) if section.level <= max_level => {
                Some(toc_entry(section, max_level))
            }
            _ => None,
        })
        .collect()
}

fn toc_entry(section: &Section, max_level: usize) -> TocEntry {
    TocEntry {
        id: section.id.clone(),
        level: section.level,
        title: section.title.plain_text(),
        children: collect_entries(&section.elements, max_level),
    }
}

/// The assembled document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    header: Option<Header>,
    attributes: Attributes,
    elements: Vec<Element>,
    footnotes: Vec<Footnote>,
    table_of_contents: Option<TableOfContents>,
}

impl Document {
    pub fn new(
        header: Option<Header>,
        attributes: Attributes,
        elements: Vec<Element>,
        footnotes: Vec<Footnote>,
        table_of_contents: Option<TableOfContents>,
    ) -> Self {
        Self {
            header,
            attributes,
            elements,
            footnotes,
            table_of_contents,
        }
    }

    pub fn header(&self) -> Option<&Header> {
        self.header.as_ref()
    }

    /// The effective attributes after resolution, overrides applied.
    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }

    /// Top-level blocks.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Footnotes in order of first definition.
    pub fn footnotes(&self) -> &[Footnote] {
        &self.footnotes
    }

    /// Section outline, present when the `toc` attribute is set.
    pub fn table_of_contents(&self) -> Option<&TableOfContents> {
        self.table_of_contents.as_ref()
    }

    /// Document title text, if the document has a header.
    pub fn title(&self) -> Option<String> {
        self.header.as_ref().map(|header| header.title.plain_text())
    }
}
