//! Section nesting.
//!
//! Section headings arrive as flat, empty [`Section`] elements. This stage
//! moves the blocks that follow a heading into it and nests sections by
//! level using a stack of open sections. A level-0 heading at the very top
//! is the document title and is returned separately.

use std::collections::HashSet;

use log::{debug, trace};

use quire_core::{
    attribute::Attributes,
    element::{Element, Section},
};

use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode, Result};

/// Result of section nesting.
#[derive(Debug, Default)]
pub(crate) struct Outline {
    /// The leading level-0 section, without body.
    pub(crate) header: Option<Section>,
    /// Blocks before the first section heading.
    pub(crate) preamble: Vec<Element>,
    /// Top-level sections.
    pub(crate) sections: Vec<Element>,
}

pub(crate) struct SectionBuilder<'a> {
    attributes: &'a Attributes,
    max_depth: usize,
    diagnostics: &'a mut DiagnosticCollector,
    ids: HashSet<String>,
}

impl<'a> SectionBuilder<'a> {
    pub(crate) fn new(
        attributes: &'a Attributes,
        max_depth: usize,
        diagnostics: &'a mut DiagnosticCollector,
    ) -> Self {
        Self {
            attributes,
            max_depth,
            diagnostics,
            ids: HashSet::new(),
        }
    }

    pub(crate) fn build(mut self, elements: Vec<Element>) -> Result<Outline> {
        let mut outline = Outline::default();
        let mut stack: Vec<Section> = Vec::new();
        let mut elements = elements.into_iter().peekable();

        let titled = matches!(
            elements.peek(),
            Some(Element::Section(section)) if section.level == 0
        );
        if titled {
            if let Some(Element::Section(mut header)) = elements.next() {
                header.id = header.attributes.id.clone();
                if let Some(id) = &header.id {
                    self.ids.insert(id.clone());
                }
                outline.header = Some(header);
            }
        }

        let book = self.attributes.text("doctype") == Some("book");
        for element in elements {
            let Element::Section(mut section) = element else {
                match stack.last_mut() {
                    Some(open) => open.elements.push(element),
                    None => outline.preamble.push(element),
                }
                continue;
            };

            if section.level == 0 && !book {
                self.diagnostics.emit(
                    Diagnostic::warning("level-0 section in a document that is not a book")
                        .with_code(ErrorCode::E304)
                        .with_label(section.span, "only books may contain parts")
                        .with_help("use `==` for a top-level section or set `:doctype: book`"),
                );
            }

            while stack.last().is_some_and(|open| open.level >= section.level) {
                close_section(&mut stack, &mut outline.sections);
            }

            let parent = stack.last().map_or(0, |open| open.level);
            if section.level > parent + 1 {
                self.diagnostics.emit(
                    Diagnostic::warning(format!(
                        "section level jumps from {parent} to {}",
                        section.level
                    ))
                    .with_code(ErrorCode::E303)
                    .with_label(section.span, "heading is nested under the previous section")
                    .with_help(format!(
                        "use a level {} heading (`{}`)",
                        parent + 1,
                        "=".repeat(parent + 2)
                    )),
                );
            }

            if stack.len() + 1 > self.max_depth {
                return Err(Diagnostic::error("sections are nested too deeply")
                    .with_code(ErrorCode::E200)
                    .with_label(
                        section.span,
                        format!("exceeds the maximum depth of {}", self.max_depth),
                    )
                    .with_help("reduce section nesting or raise the maximum nesting depth"));
            }

            section.id = self.section_id(&section);
            trace!(level = section.level, id:? = section.id; "Section opened");
            stack.push(section);
        }

        while !stack.is_empty() {
            close_section(&mut stack, &mut outline.sections);
        }

        debug!(
            header = outline.header.is_some(),
            preamble = outline.preamble.len(),
            sections = outline.sections.len();
            "Built section tree"
        );
        Ok(outline)
    }

    /// Explicit id, or an id generated from the title when `sectids` is set.
    fn section_id(&mut self, section: &Section) -> Option<String> {
        if let Some(id) = &section.attributes.id {
            self.ids.insert(id.clone());
            return Some(id.clone());
        }
        if !self.attributes.is_set("sectids") {
            return None;
        }

        let prefix = self.attributes.text("idprefix").unwrap_or_default();
        let separator = self.attributes.text("idseparator").unwrap_or_default();
        let base = format!("{prefix}{}", normalize(&section.title.plain_text(), separator));

        let mut id = base.clone();
        let mut counter = 2;
        while self.ids.contains(&id) {
            id = format!("{base}_{counter}");
            counter += 1;
        }
        self.ids.insert(id.clone());
        Some(id)
    }
}

fn close_section(stack: &mut Vec<Section>, root: &mut Vec<Element>) {
    let Some(section) = stack.pop() else {
        return;
    };
    match stack.last_mut() {
        Some(parent) => parent.elements.push(Element::Section(section)),
        None => root.push(Element::Section(section)),
    }
}

/// Lowercase `title`, replacing runs of other characters with `separator`.
fn normalize(title: &str, separator: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending = false;
    for c in title.chars() {
        if c.is_alphanumeric() {
            if pending && !out.is_empty() {
                out.push_str(separator);
            }
            pending = false;
            out.extend(c.to_lowercase());
        } else {
            pending = true;
        }
    }
    out
}
